use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

pub fn unique_tenant_id() -> String {
    unique_id("test-tenant")
}

/// A temporary hierarchical configuration tree.
///
/// Fragments are written as JSON under `root()`, in the
/// `<tenant>/config[.<mode>]` layout the resolver expects.
pub struct ConfigTreeFixture {
    dir: TempDir
}

impl ConfigTreeFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap_or_else(|e| panic!("temp config root: {e}"))
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_shared_defaults(&self, fragment: &Value) -> PathBuf {
        self.write("shared/defaults.json", fragment)
    }

    pub fn write_tenant_base(&self, tenant: &str, fragment: &Value) -> PathBuf {
        self.write(&format!("{tenant}/config.json"), fragment)
    }

    pub fn write_tenant_override(&self, tenant: &str, mode: &str, fragment: &Value) -> PathBuf {
        self.write(&format!("{tenant}/config.{mode}.json"), fragment)
    }

    fn write(&self, relative: &str, fragment: &Value) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create {}: {e}", parent.display()));
        }
        let rendered = serde_json::to_string_pretty(fragment)
            .unwrap_or_else(|e| panic!("render fragment: {e}"));
        fs::write(&path, rendered).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
        tracing::debug!(path = %path.display(), "fixture fragment written");
        path
    }
}

impl Default for ConfigTreeFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A temporary legacy single-file configuration.
pub struct LegacyConfigFixture {
    dir: TempDir,
    path: PathBuf
}

impl LegacyConfigFixture {
    pub fn new(fragment: &Value) -> Self {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("temp config dir: {e}"));
        let path = dir.path().join("report.config.json");
        let rendered = serde_json::to_string_pretty(fragment)
            .unwrap_or_else(|e| panic!("render fragment: {e}"));
        fs::write(&path, rendered).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn overwrite(&self, fragment: &Value) {
        let rendered = serde_json::to_string_pretty(fragment)
            .unwrap_or_else(|e| panic!("render fragment: {e}"));
        fs::write(&self.path, rendered)
            .unwrap_or_else(|e| panic!("write {}: {e}", self.path.display()));
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// A minimal valid Jira section.
pub fn jira_section() -> Value {
    json!({
        "project": "ACME",
        "start_date": "2025-01-01",
        "end_date": "2025-01-31"
    })
}

/// A minimal valid daily-reports section.
pub fn daily_reports_section() -> Value {
    json!({
        "query": {
            "client_project_id": 42,
            "report_date_start": "2025-01-01",
            "report_date_end": "2025-01-31"
        }
    })
}

/// A minimal valid transcripts section.
pub fn transcripts_section() -> Value {
    json!({
        "folder_ids": ["abcdefghijkl_0001"],
        "serviceAccountKeyFile": "sa.json",
        "downloadDir": "downloads"
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids_do_not_repeat() {
        assert_ne!(unique_tenant_id(), unique_tenant_id());
    }

    #[test]
    fn test_tree_fixture_layout() {
        let tree = ConfigTreeFixture::new();
        let base = tree.write_tenant_base("acme", &json!({"jira": jira_section()}));
        let over = tree.write_tenant_override("acme", "jira", &json!({}));
        assert!(base.ends_with("acme/config.json"));
        assert!(over.ends_with("acme/config.jira.json"));
        assert!(base.is_file());
        assert!(over.is_file());
    }

    #[test]
    fn test_legacy_fixture_overwrite() {
        let legacy = LegacyConfigFixture::new(&json!({"jira": jira_section()}));
        legacy.overwrite(&json!({}));
        let contents = fs::read_to_string(legacy.path()).unwrap();
        assert_eq!(contents.trim(), "{}");
    }
}
