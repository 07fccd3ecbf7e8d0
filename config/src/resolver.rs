//! # Source Resolution
//!
//! Decides, from environment signals, whether to operate in legacy
//! single-file mode or hierarchical tenant/report-mode mode, and computes
//! the concrete fragment paths for the loader.
//!
//! # Signals
//! - `REPKIT_TENANT`: tenant identifier (hierarchical mode)
//! - `REPKIT_REPORT_MODE`: one of `daily`/`jira`/`transcripts`/`combined`
//! - `REPKIT_CONFIG_PATH`: legacy single-file override
//! - `REPKIT_CONFIG_ROOT`: hierarchical config root (default `configs`)
//!
//! Hierarchical mode is selected only when both tenant and report mode are
//! supplied; everything else falls back to legacy mode. Signals are read
//! once at resolution time, never polled.

use crate::schema::ReportMode;
use errors::ConfigError;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Default hierarchical configuration root.
pub const DEFAULT_CONFIG_ROOT: &str = "configs";

/// Conventional legacy configuration filename, resolved against the
/// working directory.
pub const LEGACY_CONFIG_FILE: &str = "report.config.json";

/// Fragment extensions probed in order when computing hierarchical paths.
pub const FRAGMENT_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml"];

/// Environment-style inputs driving source resolution.
///
/// Constructed explicitly in tests; [`ResolverSignals::from_env`] is the
/// production entry point.
#[derive(Debug, Clone)]
pub struct ResolverSignals {
    pub tenant: Option<String>,
    pub report_mode: Option<String>,

    /// Legacy single-file override.
    pub config_path: Option<PathBuf>,

    /// Root directory of the hierarchical layout.
    pub config_root: PathBuf
}

impl Default for ResolverSignals {
    fn default() -> Self {
        Self {
            tenant: None,
            report_mode: None,
            config_path: None,
            config_root: PathBuf::from(DEFAULT_CONFIG_ROOT)
        }
    }
}

impl ResolverSignals {
    /// Read the `REPKIT_*` signals from the process environment, once.
    pub fn from_env() -> Self {
        Self {
            tenant: env::var("REPKIT_TENANT").ok().filter(|t| !t.is_empty()),
            report_mode: env::var("REPKIT_REPORT_MODE").ok().filter(|m| !m.is_empty()),
            config_path: env::var("REPKIT_CONFIG_PATH").ok().map(PathBuf::from),
            config_root: env::var("REPKIT_CONFIG_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_ROOT))
        }
    }
}

/// A resolved configuration source: where the fragments live and in what
/// mode they combine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Single-file mode: one fragment, no merge.
    Legacy { path: PathBuf },

    /// Tenant/report-mode layering: optional shared defaults, required
    /// tenant base, required report-mode override.
    Hierarchical {
        tenant: String,
        mode: ReportMode,
        defaults: Option<PathBuf>,
        base: PathBuf,
        override_layer: PathBuf
    }
}

impl ConfigSource {
    /// Cache key for this source: `"legacy"` or `"<tenant>-<mode>"`.
    pub fn key(&self) -> String {
        match self {
            ConfigSource::Legacy { .. } => "legacy".to_string(),
            ConfigSource::Hierarchical { tenant, mode, .. } => format!("{tenant}-{mode}")
        }
    }

    /// Human-readable description of the concrete path(s), for downstream
    /// error context.
    pub fn describe(&self) -> String {
        match self {
            ConfigSource::Legacy { path } => path.display().to_string(),
            ConfigSource::Hierarchical {
                defaults,
                base,
                override_layer,
                ..
            } => {
                let mut parts = Vec::new();
                match defaults {
                    Some(path) => parts.push(path.display().to_string()),
                    None => parts.push("(no shared defaults)".to_string())
                }
                parts.push(base.display().to_string());
                parts.push(override_layer.display().to_string());
                parts.join(" -> ")
            }
        }
    }
}

/// Resolve the configuration source for the given signals.
pub fn resolve_source(signals: &ResolverSignals) -> Result<ConfigSource, ConfigError> {
    match (&signals.tenant, &signals.report_mode) {
        (Some(tenant), Some(mode)) => resolve_hierarchical(signals, tenant, mode),
        (Some(tenant), None) => {
            warn!(tenant, "REPKIT_TENANT set without REPKIT_REPORT_MODE, using legacy mode");
            resolve_legacy(signals)
        }
        (None, Some(mode)) => {
            warn!(mode, "REPKIT_REPORT_MODE set without REPKIT_TENANT, using legacy mode");
            resolve_legacy(signals)
        }
        (None, None) => resolve_legacy(signals)
    }
}

fn resolve_legacy(signals: &ResolverSignals) -> Result<ConfigSource, ConfigError> {
    let path = signals
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(LEGACY_CONFIG_FILE));

    if !path.is_file() {
        return Err(ConfigError::LayerNotFound {
            hints: vec![
                format!("Create {LEGACY_CONFIG_FILE} in the working directory"),
                format!("Copy report.config.example.json to {LEGACY_CONFIG_FILE}"),
                "Set REPKIT_CONFIG_PATH to the configuration file's location".to_string(),
            ],
            path
        });
    }

    Ok(ConfigSource::Legacy { path })
}

fn resolve_hierarchical(
    signals: &ResolverSignals,
    tenant: &str,
    mode: &str,
) -> Result<ConfigSource, ConfigError> {
    let mode = ReportMode::from_str(mode).map_err(|_| ConfigError::InvalidReportMode {
        value: mode.to_string(),
        allowed: ReportMode::allowed()
    })?;

    let tenant_dir = signals.config_root.join(tenant);
    if !tenant_dir.is_dir() {
        return Err(ConfigError::UnknownTenant {
            tenant: tenant.to_string(),
            available: list_tenants(&signals.config_root)
        });
    }

    // Absent shared defaults are not an error: treated as an empty layer.
    let defaults = find_fragment(&signals.config_root.join("shared"), "defaults");

    let base = find_fragment(&tenant_dir, "config").ok_or_else(|| ConfigError::LayerNotFound {
        path: tenant_dir.join("config.json"),
        hints: vec![format!(
            "Create {}/config.json with the tenant's base configuration",
            tenant_dir.display()
        )]
    })?;

    let override_stem = format!("config.{mode}");
    let override_layer =
        find_fragment(&tenant_dir, &override_stem).ok_or_else(|| ConfigError::LayerNotFound {
            path: tenant_dir.join(format!("{override_stem}.json")),
            hints: vec![format!(
                "Create {}/{override_stem}.json with the {mode} report overrides",
                tenant_dir.display()
            )]
        })?;

    Ok(ConfigSource::Hierarchical {
        tenant: tenant.to_string(),
        mode,
        defaults,
        base,
        override_layer
    })
}

/// Probe for `<dir>/<stem>.<ext>` across the supported extensions.
fn find_fragment(dir: &Path, stem: &str) -> Option<PathBuf> {
    FRAGMENT_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Tenant directories that exist under the config root, for unknown-tenant
/// error messages. The `shared` directory holds defaults, not a tenant.
fn list_tenants(root: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    let mut tenants: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name != "shared")
        .collect();
    tenants.sort();
    tenants
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    fn hierarchical_signals(root: &Path, tenant: &str, mode: &str) -> ResolverSignals {
        ResolverSignals {
            tenant: Some(tenant.to_string()),
            report_mode: Some(mode.to_string()),
            config_path: None,
            config_root: root.to_path_buf()
        }
    }

    fn write_tenant(root: &Path, tenant: &str, mode: &str) {
        let dir = root.join(tenant);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.json"), "{}").unwrap();
        fs::write(dir.join(format!("config.{mode}.json")), "{}").unwrap();
    }

    #[test]
    fn test_hierarchical_paths() {
        let root = tempdir().unwrap();
        write_tenant(root.path(), "acme", "jira");
        fs::create_dir_all(root.path().join("shared")).unwrap();
        fs::write(root.path().join("shared/defaults.json"), "{}").unwrap();

        let source = resolve_source(&hierarchical_signals(root.path(), "acme", "jira")).unwrap();
        match source {
            ConfigSource::Hierarchical {
                tenant,
                mode,
                defaults,
                base,
                override_layer
            } => {
                assert_eq!(tenant, "acme");
                assert_eq!(mode, ReportMode::Jira);
                assert_eq!(defaults, Some(root.path().join("shared/defaults.json")));
                assert_eq!(base, root.path().join("acme/config.json"));
                assert_eq!(override_layer, root.path().join("acme/config.jira.json"));
            }
            other => panic!("expected hierarchical source, got {other:?}")
        }
    }

    #[test]
    fn test_missing_shared_defaults_is_not_an_error() {
        let root = tempdir().unwrap();
        write_tenant(root.path(), "acme", "daily");

        let source = resolve_source(&hierarchical_signals(root.path(), "acme", "daily")).unwrap();
        match source {
            ConfigSource::Hierarchical { defaults, .. } => assert!(defaults.is_none()),
            other => panic!("expected hierarchical source, got {other:?}")
        }
    }

    #[test]
    fn test_unknown_tenant_lists_existing() {
        let root = tempdir().unwrap();
        write_tenant(root.path(), "acme", "jira");
        write_tenant(root.path(), "initech", "jira");
        fs::create_dir_all(root.path().join("shared")).unwrap();

        let err = resolve_source(&hierarchical_signals(root.path(), "globex", "jira")).unwrap_err();
        match err {
            ConfigError::UnknownTenant { tenant, available } => {
                assert_eq!(tenant, "globex");
                assert_eq!(available, vec!["acme".to_string(), "initech".to_string()]);
            }
            other => panic!("expected UnknownTenant, got {other:?}")
        }
    }

    #[test]
    fn test_invalid_report_mode_lists_allowed() {
        let root = tempdir().unwrap();
        write_tenant(root.path(), "acme", "jira");

        let err = resolve_source(&hierarchical_signals(root.path(), "acme", "annual")).unwrap_err();
        match err {
            ConfigError::InvalidReportMode { value, allowed } => {
                assert_eq!(value, "annual");
                assert_eq!(allowed.join(","), "daily,jira,transcripts,combined");
            }
            other => panic!("expected InvalidReportMode, got {other:?}")
        }
    }

    #[test]
    fn test_missing_base_layer() {
        let root = tempdir().unwrap();
        fs::create_dir_all(root.path().join("acme")).unwrap();

        let err = resolve_source(&hierarchical_signals(root.path(), "acme", "jira")).unwrap_err();
        assert!(matches!(err, ConfigError::LayerNotFound { .. }));
        assert!(!err.hints().is_empty());
    }

    #[test]
    fn test_missing_override_layer() {
        let root = tempdir().unwrap();
        let dir = root.path().join("acme");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.json"), "{}").unwrap();

        let err = resolve_source(&hierarchical_signals(root.path(), "acme", "combined")).unwrap_err();
        match err {
            ConfigError::LayerNotFound { path, .. } => {
                assert!(path.to_string_lossy().contains("config.combined"));
            }
            other => panic!("expected LayerNotFound, got {other:?}")
        }
    }

    #[test]
    fn test_extension_probing_prefers_json_then_yaml() {
        let root = tempdir().unwrap();
        let dir = root.path().join("acme");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yaml"), "{}").unwrap();
        fs::write(dir.join("config.daily.toml"), "").unwrap();

        let source = resolve_source(&hierarchical_signals(root.path(), "acme", "daily")).unwrap();
        match source {
            ConfigSource::Hierarchical {
                base,
                override_layer,
                ..
            } => {
                assert_eq!(base, dir.join("config.yaml"));
                assert_eq!(override_layer, dir.join("config.daily.toml"));
            }
            other => panic!("expected hierarchical source, got {other:?}")
        }
    }

    #[test]
    fn test_legacy_override_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        fs::write(&path, "{}").unwrap();

        let signals = ResolverSignals {
            config_path: Some(path.clone()),
            ..ResolverSignals::default()
        };
        let source = resolve_source(&signals).unwrap();
        assert_eq!(source, ConfigSource::Legacy { path });
        assert_eq!(source.key(), "legacy");
    }

    #[test]
    fn test_legacy_missing_file_has_remediation_hints() {
        let dir = tempdir().unwrap();
        let signals = ResolverSignals {
            config_path: Some(dir.path().join("missing.json")),
            ..ResolverSignals::default()
        };
        let err = resolve_source(&signals).unwrap_err();
        assert!(matches!(err, ConfigError::LayerNotFound { .. }));
        assert_eq!(err.hints().len(), 3);
    }

    #[test]
    fn test_tenant_without_mode_falls_back_to_legacy() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.config.json");
        fs::write(&path, "{}").unwrap();

        let signals = ResolverSignals {
            tenant: Some("acme".to_string()),
            config_path: Some(path.clone()),
            ..ResolverSignals::default()
        };
        assert_eq!(resolve_source(&signals).unwrap(), ConfigSource::Legacy { path });
    }

    #[test]
    fn test_source_key_and_description() {
        let source = ConfigSource::Hierarchical {
            tenant: "acme".to_string(),
            mode: ReportMode::Combined,
            defaults: None,
            base: PathBuf::from("configs/acme/config.json"),
            override_layer: PathBuf::from("configs/acme/config.combined.json")
        };
        assert_eq!(source.key(), "acme-combined");
        let description = source.describe();
        assert!(description.contains("(no shared defaults)"));
        assert!(description.contains("config.combined.json"));
    }

    #[test]
    #[serial]
    fn test_signals_from_env() {
        unsafe {
            env::set_var("REPKIT_TENANT", "acme");
            env::set_var("REPKIT_REPORT_MODE", "jira");
            env::set_var("REPKIT_CONFIG_ROOT", "/tmp/configs");
            env::remove_var("REPKIT_CONFIG_PATH");
        }

        let signals = ResolverSignals::from_env();

        unsafe {
            env::remove_var("REPKIT_TENANT");
            env::remove_var("REPKIT_REPORT_MODE");
            env::remove_var("REPKIT_CONFIG_ROOT");
        }

        assert_eq!(signals.tenant.as_deref(), Some("acme"));
        assert_eq!(signals.report_mode.as_deref(), Some("jira"));
        assert_eq!(signals.config_root, PathBuf::from("/tmp/configs"));
        assert!(signals.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_signals_from_env_defaults() {
        unsafe {
            env::remove_var("REPKIT_TENANT");
            env::remove_var("REPKIT_REPORT_MODE");
            env::remove_var("REPKIT_CONFIG_PATH");
            env::remove_var("REPKIT_CONFIG_ROOT");
        }

        let signals = ResolverSignals::from_env();
        assert!(signals.tenant.is_none());
        assert!(signals.report_mode.is_none());
        assert_eq!(signals.config_root, PathBuf::from(DEFAULT_CONFIG_ROOT));
    }
}
