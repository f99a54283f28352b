//! The staleness state of a dependency node.
//!
//! States only ever move up: once a file is known to need recompilation no
//! later observation in the same run can make it clean again. All transitions
//! live in [`StaleState::on`].

use std::fmt;

/// How stale a file is, as far as this run knows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StaleState {
    /// Same timestamp and content as recorded.
    #[default]
    Unchanged,
    /// Timestamp moved but the content is known to be identical.
    TimestampOnly,
    /// Unchanged itself, but something it includes is dirty.
    DirtyViaInclude,
    /// Timestamp moved and something it includes is dirty.
    TimestampOnlyViaInclude,
    /// The file itself changed.
    Dirty,
    /// The file could not be read.
    Missing,
}

/// An observation fed to [`StaleState::on`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaleEvent {
    /// The file's own content changed.
    Dirty,
    /// An included file is dirty.
    DirtyViaInclude,
    /// The file's timestamp moved.
    TimestampChanged,
    /// The file is absent or unreadable.
    Missing,
}

impl StaleState {
    /// Every state, in declaration order.
    pub const ALL: [StaleState; 6] = [
        StaleState::Unchanged,
        StaleState::TimestampOnly,
        StaleState::DirtyViaInclude,
        StaleState::TimestampOnlyViaInclude,
        StaleState::Dirty,
        StaleState::Missing,
    ];

    /// Applies an event and returns the resulting state.
    pub fn on(self, event: StaleEvent) -> StaleState {
        use StaleEvent as E;
        use StaleState as S;
        match (self, event) {
            (_, E::Dirty) => S::Dirty,

            (S::Unchanged, E::DirtyViaInclude) => S::DirtyViaInclude,
            (S::TimestampOnly, E::DirtyViaInclude) => S::TimestampOnlyViaInclude,

            (S::Unchanged, E::TimestampChanged) => S::TimestampOnly,
            (S::DirtyViaInclude, E::TimestampChanged) => S::TimestampOnlyViaInclude,

            (S::Unchanged, E::Missing) => S::Missing,

            (state, _) => state,
        }
    }

    /// Position in the staleness order. Transitions never lower it.
    pub fn rank(self) -> u8 {
        match self {
            StaleState::Unchanged => 0,
            StaleState::TimestampOnly | StaleState::DirtyViaInclude | StaleState::Missing => 1,
            StaleState::TimestampOnlyViaInclude | StaleState::Dirty => 2,
        }
    }

    /// The character used for this state in the snapshot.
    pub fn as_char(self) -> char {
        match self {
            StaleState::Unchanged => ' ',
            StaleState::TimestampOnly => '^',
            StaleState::DirtyViaInclude => '&',
            StaleState::TimestampOnlyViaInclude => '$',
            StaleState::Dirty => '!',
            StaleState::Missing => '?',
        }
    }

    /// Parses a snapshot state character.
    pub fn from_char(c: char) -> Option<StaleState> {
        StaleState::ALL.into_iter().find(|s| s.as_char() == c)
    }

    /// The file's own content changed.
    pub fn is_dirty_itself(self) -> bool {
        self == StaleState::Dirty
    }

    /// The file or something it includes changed; its dependents must rebuild.
    pub fn is_dirty_or_via_include(self) -> bool {
        matches!(
            self,
            StaleState::Dirty | StaleState::DirtyViaInclude | StaleState::TimestampOnlyViaInclude
        )
    }

    /// The file's snapshot record differs from what was loaded.
    pub fn must_rewrite_snapshot(self) -> bool {
        self != StaleState::Unchanged
    }
}

impl fmt::Display for StaleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StaleState::Unchanged => "unchanged",
            StaleState::TimestampOnly => "timestamp only",
            StaleState::DirtyViaInclude => "dirty via include",
            StaleState::TimestampOnlyViaInclude => "timestamp only, dirty via include",
            StaleState::Dirty => "dirty",
            StaleState::Missing => "missing",
        };
        f.write_str(name)
    }
}
