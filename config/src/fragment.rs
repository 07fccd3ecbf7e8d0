//! # Fragment Loading
//!
//! Reads one on-disk configuration layer into the JSON data model.
//!
//! Supports automatic format detection based on file extension (JSON,
//! YAML or TOML — the latter two normalize into `serde_json::Value` so the
//! merge engine and validator see a single representation).
//!
//! Fragments are re-read on every call by design: caching lives solely in
//! [`crate::cache::ConfigResolver`], so a fragment can never go stale
//! independently of the resolver's cache.

use errors::ConfigError;
use serde_json::Value;
use std::path::Path;

/// Load one configuration fragment from disk.
///
/// The format is detected from the file extension. Parse failures are
/// wrapped with the offending path and the underlying parser's message;
/// raw parser errors never reach the caller.
pub fn load_fragment(path: &Path) -> Result<Value, ConfigError> {
    let contents = read_layer(path)?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "json" => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string()
        }),
        "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string()
        }),
        "toml" => {
            let value: toml::Value = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string()
            })?;
            serde_json::to_value(value).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string()
            })
        }
        other => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            reason: format!("unsupported configuration format '{other}'")
        })
    }
}

fn read_layer(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::LayerNotFound {
                path: path.to_path_buf(),
                hints: Vec::new()
            }
        } else {
            ConfigError::Parse {
                path: path.to_path_buf(),
                reason: format!("IO error: {e}")
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_json_fragment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"jira": {"project": "ACME"}}"#).unwrap();

        let fragment = load_fragment(&path).unwrap();
        assert_eq!(fragment["jira"]["project"], json!("ACME"));
    }

    #[test]
    fn test_load_yaml_fragment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "jira:\n  project: ACME\n  team_members: []\n").unwrap();

        let fragment = load_fragment(&path).unwrap();
        assert_eq!(fragment["jira"]["project"], json!("ACME"));
        assert_eq!(fragment["jira"]["team_members"], json!([]));
    }

    #[test]
    fn test_load_toml_fragment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[jira]\nproject = \"ACME\"\n").unwrap();

        let fragment = load_fragment(&path).unwrap();
        assert_eq!(fragment["jira"]["project"], json!("ACME"));
    }

    #[test]
    fn test_parse_error_carries_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_fragment(&path).unwrap_err();
        match err {
            ConfigError::Parse { path: p, reason } => {
                assert_eq!(p, path);
                assert!(!reason.is_empty());
            }
            other => panic!("expected Parse error, got {other:?}")
        }
    }

    #[test]
    fn test_missing_fragment() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = load_fragment(&path).unwrap_err();
        assert!(matches!(err, ConfigError::LayerNotFound { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "key=value").unwrap();

        let err = load_fragment(&path).unwrap_err();
        match err {
            ConfigError::Parse { reason, .. } => assert!(reason.contains("unsupported")),
            other => panic!("expected Parse error, got {other:?}")
        }
    }

    #[test]
    fn test_fragment_reread_is_not_cached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"jira": {"project": "ACME"}}"#).unwrap();
        let first = load_fragment(&path).unwrap();

        fs::write(&path, r#"{"jira": {"project": "GLOBEX"}}"#).unwrap();
        let second = load_fragment(&path).unwrap();

        assert_eq!(first["jira"]["project"], json!("ACME"));
        assert_eq!(second["jira"]["project"], json!("GLOBEX"));
    }
}
