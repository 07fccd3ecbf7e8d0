//! # Configuration Structures
//!
//! This module defines the validated configuration tree handed to the
//! reporting connectors (daily-report extraction, Jira export, transcript
//! download).
//!
//! All configuration structures:
//! - Use `serde` for serialization/deserialization, with rename attributes
//!   mapping the on-disk camelCase keys onto Rust names
//! - Apply declared defaults for optional fields at deserialization time
//! - Are immutable once produced by the validator
//!
//! Shape and cross-field checks live in [`crate::validate`]; by the time a
//! value deserializes into these types it has already passed both passes.

use chrono::NaiveDate;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumIter, EnumString};

/// The fixed enumeration of report generation modes.
///
/// Doubles as the `reportType` discriminator inside a configuration tree
/// and as the override-layer suffix in hierarchical mode
/// (`configs/<tenant>/config.<mode>.<ext>`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportMode {
    /// Daily-report extraction from the reporting database
    Daily,

    /// Jira issue export
    Jira,

    /// Meeting-transcript download from Drive
    Transcripts,

    /// Combined team report bundling all three sources
    Combined
}

impl ReportMode {
    /// The allowed identifiers, for error messages.
    pub fn allowed() -> Vec<String> {
        use strum::IntoEnumIterator;
        ReportMode::iter().map(|mode| mode.to_string()).collect()
    }
}

/// Root of the validated configuration tree.
///
/// Up to three independently optional sections; the validator guarantees
/// at least one is present.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ValidatedConfig {
    /// Report type discriminator, one of the fixed mode enumeration
    #[serde(default, rename = "reportType", skip_serializing_if = "Option::is_none")]
    pub report_type: Option<ReportMode>,

    /// Daily-report database extraction
    #[serde(default, rename = "dailyReports", skip_serializing_if = "Option::is_none")]
    pub daily_reports: Option<DailyReportsConfig>,

    /// Jira issue export
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraConfig>,

    /// Meeting-transcript download
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcripts: Option<TranscriptsConfig>
}

impl ValidatedConfig {
    /// True when at least one connector section is configured.
    pub fn has_any_section(&self) -> bool {
        self.daily_reports.is_some() || self.jira.is_some() || self.transcripts.is_some()
    }
}

/// Daily-report extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyReportsConfig {
    /// Query parameters for the reporting database
    pub query: DailyReportsQuery
}

/// Query parameters for daily-report extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyReportsQuery {
    /// Client project to extract reports for
    pub client_project_id: u64,

    /// Which employees to include (defaults to all)
    #[serde(default)]
    pub employee_id: EmployeeSelector,

    /// Inclusive start of the report date range
    pub report_date_start: NaiveDate,

    /// Inclusive end of the report date range
    pub report_date_end: NaiveDate,

    /// Per-employee project reassignments
    #[serde(default, rename = "employeeProjectOverrides")]
    pub employee_project_overrides: Vec<EmployeeProjectOverride>
}

/// Employee selection for daily-report queries.
///
/// On disk this field is polymorphic: an empty string means "all
/// employees"; a positive integer, a positive-integer string, a
/// comma-separated positive-integer string, or a non-empty array of
/// positive integers all select specific employees. Any other shape is
/// rejected by the structural pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EmployeeSelector {
    /// All employees on the project
    #[default]
    All,

    /// A specific set of employee ids
    Ids(Vec<u64>)
}

impl EmployeeSelector {
    pub fn is_all(&self) -> bool {
        matches!(self, EmployeeSelector::All)
    }

    /// The selected ids, or `None` when all employees are selected.
    pub fn ids(&self) -> Option<&[u64]> {
        match self {
            EmployeeSelector::All => None,
            EmployeeSelector::Ids(ids) => Some(ids)
        }
    }
}

impl Serialize for EmployeeSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EmployeeSelector::All => serializer.serialize_str(""),
            EmployeeSelector::Ids(ids) => ids.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for EmployeeSelector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        parse_employee_selector(&value).map_err(DeError::custom)
    }
}

/// Parse the polymorphic employee-id shapes into a selector.
///
/// Shared by the structural pass (which reports a violation instead of a
/// serde error) and by deserialization.
pub(crate) fn parse_employee_selector(value: &serde_json::Value) -> Result<EmployeeSelector, String> {
    match value {
        serde_json::Value::String(s) if s.is_empty() => Ok(EmployeeSelector::All),
        serde_json::Value::String(s) => {
            let mut ids = Vec::new();
            for part in s.split(',') {
                let id: u64 = part
                    .trim()
                    .parse()
                    .map_err(|_| format!("'{part}' is not a positive integer"))?;
                if id == 0 {
                    return Err("employee ids must be positive".to_string());
                }
                ids.push(id);
            }
            Ok(EmployeeSelector::Ids(ids))
        }
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(id) if id > 0 => Ok(EmployeeSelector::Ids(vec![id])),
            _ => Err(format!("{n} is not a positive integer"))
        },
        serde_json::Value::Array(items) => {
            if items.is_empty() {
                return Err("employee id array must not be empty".to_string());
            }
            let mut ids = Vec::new();
            for item in items {
                match item.as_u64() {
                    Some(id) if id > 0 => ids.push(id),
                    _ => return Err(format!("{item} is not a positive integer"))
                }
            }
            Ok(EmployeeSelector::Ids(ids))
        }
        other => Err(format!(
            "expected empty string, positive integer, integer string or integer array, got {other}"
        ))
    }
}

/// Reassigns one employee to a different set of client projects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeProjectOverride {
    pub employee_id: u64,

    /// A single project id or a non-empty array of project ids
    #[serde(deserialize_with = "one_or_many_u64")]
    pub client_project_ids: Vec<u64>
}

/// Jira issue export configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JiraConfig {
    /// Jira project key
    pub project: String,

    /// Inclusive start of the export range
    pub start_date: NaiveDate,

    /// Inclusive end of the export range
    pub end_date: NaiveDate,

    /// Jira instance host, domain only (no protocol prefix)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Team members to restrict the export to
    #[serde(default)]
    pub team_members: Vec<String>
}

/// Meeting-transcript download configuration.
///
/// `folder_ids` is the normalized union of the on-disk `folder_ids` and
/// `folderId` spellings; the validator enforces that exactly one of the
/// two was supplied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "TranscriptsDe")]
pub struct TranscriptsConfig {
    /// Drive folders to download transcripts from
    pub folder_ids: Vec<String>,

    /// Path to the Drive service-account key file
    #[serde(rename = "serviceAccountKeyFile")]
    pub service_account_key_file: String,

    /// Directory transcripts are downloaded into
    #[serde(rename = "downloadDir")]
    pub download_dir: String,

    /// Strip unsafe characters from downloaded filenames
    #[serde(rename = "sanitizeFilenames")]
    pub sanitize_filenames: bool,

    /// Mirror the Drive folder structure under the download directory
    #[serde(rename = "organizeByFolder")]
    pub organize_by_folder: bool,

    /// Convert downloaded transcripts to Markdown
    #[serde(rename = "convertToMarkdown")]
    pub convert_to_markdown: bool,

    /// Output directory for Markdown conversion, required when
    /// `convert_to_markdown` is set
    #[serde(rename = "markdownOutputDir", skip_serializing_if = "Option::is_none")]
    pub markdown_output_dir: Option<String>,

    /// Optional date window for transcript selection
    #[serde(rename = "dateFilter", skip_serializing_if = "Option::is_none")]
    pub date_filter: Option<TranscriptDateFilter>,

    /// Team members used by attendance filtering
    #[serde(rename = "teamMembers")]
    pub team_members: Vec<String>,

    /// Only keep transcripts attended by configured team members
    #[serde(rename = "filterByTeamMembers")]
    pub filter_by_team_members: bool,

    /// Minimum number of configured team members that must attend
    #[serde(rename = "minimumTeamMembersRequired")]
    pub minimum_team_members_required: usize,

    /// Folders whose transcripts belong to multiple projects; must be a
    /// subset of `folder_ids`
    #[serde(rename = "multiProjectFolders")]
    pub multi_project_folders: Vec<String>
}

fn default_sanitize_filenames() -> bool {
    true
}

fn default_minimum_team_members() -> usize {
    1
}

/// Deserialization mirror carrying both on-disk folder spellings before
/// normalization.
#[derive(Debug, Deserialize)]
struct TranscriptsDe {
    #[serde(default)]
    folder_ids: Vec<String>,

    #[serde(default, rename = "folderId", deserialize_with = "opt_one_or_many_string")]
    folder_id: Option<Vec<String>>,

    #[serde(rename = "serviceAccountKeyFile")]
    service_account_key_file: String,

    #[serde(rename = "downloadDir")]
    download_dir: String,

    #[serde(default = "default_sanitize_filenames", rename = "sanitizeFilenames")]
    sanitize_filenames: bool,

    #[serde(default, rename = "organizeByFolder")]
    organize_by_folder: bool,

    #[serde(default, rename = "convertToMarkdown")]
    convert_to_markdown: bool,

    #[serde(default, rename = "markdownOutputDir")]
    markdown_output_dir: Option<String>,

    #[serde(default, rename = "dateFilter")]
    date_filter: Option<TranscriptDateFilter>,

    #[serde(default, rename = "teamMembers")]
    team_members: Vec<String>,

    #[serde(default, rename = "filterByTeamMembers")]
    filter_by_team_members: bool,

    #[serde(
        default = "default_minimum_team_members",
        rename = "minimumTeamMembersRequired"
    )]
    minimum_team_members_required: usize,

    #[serde(default, rename = "multiProjectFolders")]
    multi_project_folders: Vec<String>
}

impl From<TranscriptsDe> for TranscriptsConfig {
    fn from(de: TranscriptsDe) -> Self {
        let mut folder_ids = de.folder_ids;
        for id in de.folder_id.unwrap_or_default() {
            if !folder_ids.contains(&id) {
                folder_ids.push(id);
            }
        }
        TranscriptsConfig {
            folder_ids,
            service_account_key_file: de.service_account_key_file,
            download_dir: de.download_dir,
            sanitize_filenames: de.sanitize_filenames,
            organize_by_folder: de.organize_by_folder,
            convert_to_markdown: de.convert_to_markdown,
            markdown_output_dir: de.markdown_output_dir,
            date_filter: de.date_filter,
            team_members: de.team_members,
            filter_by_team_members: de.filter_by_team_members,
            minimum_team_members_required: de.minimum_team_members_required,
            multi_project_folders: de.multi_project_folders
        }
    }
}

/// Date window for transcript selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptDateFilter {
    #[serde(rename = "startDate")]
    pub start_date: NaiveDate,

    #[serde(rename = "endDate")]
    pub end_date: NaiveDate,

    /// Whether the window is applied; ordering is only enforced when set
    #[serde(default = "default_date_filter_enabled")]
    pub enabled: bool
}

fn default_date_filter_enabled() -> bool {
    true
}

fn one_or_many_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(id) if id > 0 => Ok(vec![id]),
            _ => Err(DeError::custom(format!("{n} is not a positive integer")))
        },
        serde_json::Value::Array(items) if !items.is_empty() => {
            let mut ids = Vec::new();
            for item in items {
                match item.as_u64() {
                    Some(id) if id > 0 => ids.push(id),
                    _ => return Err(DeError::custom(format!("{item} is not a positive integer")))
                }
            }
            Ok(ids)
        }
        other => Err(DeError::custom(format!(
            "expected positive integer or non-empty integer array, got {other}"
        )))
    }
}

fn opt_one_or_many_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(id) => Ok(Some(vec![id])),
        serde_json::Value::Array(items) => {
            let mut ids = Vec::new();
            for item in items {
                match item {
                    serde_json::Value::String(id) => ids.push(id),
                    other => {
                        return Err(DeError::custom(format!("expected folder id string, got {other}")));
                    }
                }
            }
            Ok(Some(ids))
        }
        other => Err(DeError::custom(format!(
            "expected folder id string or array, got {other}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_mode_round_trip() {
        use std::str::FromStr;
        for name in ["daily", "jira", "transcripts", "combined"] {
            let mode = ReportMode::from_str(name).unwrap();
            assert_eq!(mode.to_string(), name);
        }
        assert!(ReportMode::from_str("annual").is_err());
        assert_eq!(ReportMode::allowed().len(), 4);
    }

    #[test]
    fn test_employee_selector_shapes() {
        assert_eq!(parse_employee_selector(&json!("")), Ok(EmployeeSelector::All));
        assert_eq!(
            parse_employee_selector(&json!(123)),
            Ok(EmployeeSelector::Ids(vec![123]))
        );
        assert_eq!(
            parse_employee_selector(&json!("123")),
            Ok(EmployeeSelector::Ids(vec![123]))
        );
        assert_eq!(
            parse_employee_selector(&json!("123,456")),
            Ok(EmployeeSelector::Ids(vec![123, 456]))
        );
        assert_eq!(
            parse_employee_selector(&json!([123, 456])),
            Ok(EmployeeSelector::Ids(vec![123, 456]))
        );
    }

    #[test]
    fn test_employee_selector_rejects_bad_shapes() {
        assert!(parse_employee_selector(&json!([])).is_err());
        assert!(parse_employee_selector(&json!({})).is_err());
        assert!(parse_employee_selector(&json!(0)).is_err());
        assert!(parse_employee_selector(&json!(-5)).is_err());
        assert!(parse_employee_selector(&json!("12,abc")).is_err());
        assert!(parse_employee_selector(&json!(true)).is_err());
    }

    #[test]
    fn test_transcripts_folder_union() {
        let config: TranscriptsConfig = serde_json::from_value(json!({
            "folderId": ["abcdefghij-folder-1", "abcdefghij-folder-2"],
            "serviceAccountKeyFile": "sa.json",
            "downloadDir": "downloads"
        }))
        .unwrap();
        assert_eq!(
            config.folder_ids,
            vec!["abcdefghij-folder-1", "abcdefghij-folder-2"]
        );
        assert!(config.sanitize_filenames);
        assert!(!config.organize_by_folder);
        assert!(!config.convert_to_markdown);
        assert_eq!(config.minimum_team_members_required, 1);
    }

    #[test]
    fn test_transcripts_single_folder_id_string() {
        let config: TranscriptsConfig = serde_json::from_value(json!({
            "folderId": "abcdefghij-folder-1",
            "serviceAccountKeyFile": "sa.json",
            "downloadDir": "downloads"
        }))
        .unwrap();
        assert_eq!(config.folder_ids, vec!["abcdefghij-folder-1"]);
    }

    #[test]
    fn test_daily_reports_defaults() {
        let config: DailyReportsConfig = serde_json::from_value(json!({
            "query": {
                "client_project_id": 42,
                "report_date_start": "2025-01-01",
                "report_date_end": "2025-01-31"
            }
        }))
        .unwrap();
        assert!(config.query.employee_id.is_all());
        assert!(config.query.employee_project_overrides.is_empty());
    }

    #[test]
    fn test_employee_project_override_single_id() {
        let over: EmployeeProjectOverride = serde_json::from_value(json!({
            "employee_id": 7,
            "client_project_ids": 42
        }))
        .unwrap();
        assert_eq!(over.client_project_ids, vec![42]);
    }

    #[test]
    fn test_date_filter_enabled_default() {
        let filter: TranscriptDateFilter = serde_json::from_value(json!({
            "startDate": "2025-02-01",
            "endDate": "2025-02-28"
        }))
        .unwrap();
        assert!(filter.enabled);
    }

    #[test]
    fn test_jira_team_members_default_empty() {
        let config: JiraConfig = serde_json::from_value(json!({
            "project": "ACME",
            "start_date": "2025-01-01",
            "end_date": "2025-01-31"
        }))
        .unwrap();
        assert!(config.team_members.is_empty());
        assert!(config.host.is_none());
    }
}
