//! Configuration types deserialized from `depcheck.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Default location of the dependency snapshot, relative to the project.
pub const DEFAULT_SNAPSHOT_PATH: &str = ".depcheck/deps.txt";

/// The top-level project configuration parsed from `depcheck.toml`.
///
/// All paths are kept as written; [`resolve_config`](crate::resolve_config)
/// turns them into absolute paths.
#[derive(Debug, Deserialize)]
pub struct DepcheckConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Declared source roots, in classification priority order.
    #[serde(default)]
    pub sources: Vec<SourceRootConfig>,
    /// Header search directories.
    #[serde(default)]
    pub includes: IncludeConfig,
    /// Where compiled objects live.
    #[serde(default)]
    pub objects: ObjectConfig,
    /// Optional mirror tree used to detect content-identical sources.
    #[serde(default)]
    pub mirror: Option<MirrorConfig>,
    /// Where the dependency snapshot is stored.
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    /// Which files are treated as compilation units.
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Core project metadata.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// A declared source root.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SourceRootConfig {
    /// Directory of the root.
    pub dir: String,
    /// Logical prefix for files below `dir`.
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Header search configuration.
#[derive(Debug, Default, Deserialize)]
pub struct IncludeConfig {
    /// Include directories searched in order.
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Object file layout.
#[derive(Debug, Deserialize)]
pub struct ObjectConfig {
    /// One directory per build flavour (e.g. debug and release).
    ///
    /// Accepts either a single string or a list of strings.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub dirs: Vec<String>,
    /// Object file extension without the dot.
    #[serde(default = "default_object_extension")]
    pub extension: String,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            extension: default_object_extension(),
        }
    }
}

fn default_object_extension() -> String {
    "o".to_string()
}

/// Mirror tree configuration.
#[derive(Debug, Deserialize)]
pub struct MirrorConfig {
    /// Root of the mirror tree.
    pub dir: String,
}

/// Snapshot file configuration.
#[derive(Debug, Deserialize)]
pub struct SnapshotConfig {
    /// Path of the snapshot file.
    #[serde(default = "default_snapshot_path")]
    pub path: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> String {
    DEFAULT_SNAPSHOT_PATH.to_string()
}

/// Source discovery configuration.
#[derive(Debug, Deserialize)]
pub struct ScanConfig {
    /// File extensions (without the dot) of compilation units.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["c", "cc", "cpp", "cxx"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows both `dirs = "build/obj"` and `dirs = ["build/debug", "build/release"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    const MINIMAL: &str = r#"
[project]
name = "engine"

[[sources]]
dir = "src"
"#;

    #[test]
    fn object_dirs_single_string() {
        let toml = format!("{MINIMAL}\n[objects]\ndirs = \"build/obj\"\n");
        let config = load_config_from_str(&toml).unwrap();
        assert_eq!(config.objects.dirs, vec!["build/obj"]);
        assert_eq!(config.objects.extension, "o");
    }

    #[test]
    fn object_dirs_list() {
        let toml = format!(
            "{MINIMAL}\n[objects]\ndirs = [\"build/debug\", \"build/release\"]\nextension = \"obj\"\n"
        );
        let config = load_config_from_str(&toml).unwrap();
        assert_eq!(config.objects.dirs, vec!["build/debug", "build/release"]);
        assert_eq!(config.objects.extension, "obj");
    }

    #[test]
    fn source_root_prefix_optional() {
        let toml = r#"
[project]
name = "engine"

[[sources]]
dir = "src"
prefix = "engine"

[[sources]]
dir = "tools"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].prefix.as_deref(), Some("engine"));
        assert!(config.sources[1].prefix.is_none());
    }

    #[test]
    fn defaults() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.snapshot.path, DEFAULT_SNAPSHOT_PATH);
        assert_eq!(config.scan.extensions, vec!["c", "cc", "cpp", "cxx"]);
        assert!(config.mirror.is_none());
        assert!(config.includes.paths.is_empty());
        assert!(config.objects.dirs.is_empty());
    }
}
