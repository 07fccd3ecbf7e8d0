//! # Schema & Cross-Field Validation
//!
//! Checks a merged configuration tree against the declared field table and
//! a set of named cross-field predicates, then normalizes it into the
//! typed [`ValidatedConfig`].
//!
//! # Responsibilities
//! - Structural pass: presence, type and shape of every declared field,
//!   including the employee-id polymorphism, the Jira-host domain grammar
//!   and the Drive folder-id grammar
//! - Cross-field pass: independently evaluated named predicates, run only
//!   once the structural pass is clean
//! - Violation aggregation: one failed call surfaces every problem, each
//!   tagged with its dotted field path
//!
//! A non-Atlassian-looking Jira host is logged as a warning, never a
//! violation.

use crate::schema::{ReportMode, ValidatedConfig, parse_employee_selector};
use chrono::NaiveDate;
use errors::{ConfigError, Violation};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Bare domain grammar: dot-separated alphanumeric labels, hyphens only in
/// the interior of a label, at least two labels.
static HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("host pattern")
});

/// Drive-style folder id: URL-safe characters, 10-64 long.
static FOLDER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{10,64}$").expect("folder id pattern"));

/// Validate a merged configuration tree.
///
/// Runs the structural pass over the whole declared field table first,
/// then — only when that pass found nothing — the cross-field predicates,
/// each evaluated independently. Every accumulated violation is returned
/// in one [`ConfigError::Validation`]; success yields the normalized
/// config with defaults applied.
pub fn validate(merged: &Value) -> Result<ValidatedConfig, ConfigError> {
    let mut violations = structural_pass(merged);
    if violations.is_empty() {
        violations = cross_field_pass(merged);
    }
    if !violations.is_empty() {
        return Err(ConfigError::Validation { violations });
    }
    normalize(merged)
}

fn normalize(merged: &Value) -> Result<ValidatedConfig, ConfigError> {
    serde_json::from_value(merged.clone()).map_err(|e| ConfigError::Normalize {
        reason: e.to_string()
    })
}

// ---------------------------------------------------------------------------
// Structural pass
// ---------------------------------------------------------------------------

/// Declared shape of a single field.
#[derive(Debug, Clone, Copy)]
enum FieldRule {
    RequiredPositiveInt,
    RequiredNonEmptyString,
    RequiredDate,
    OptionalBool,
    OptionalString,
    OptionalStringArray,
    OptionalPositiveInt
}

const DAILY_QUERY_FIELDS: &[(&str, FieldRule)] = &[
    ("client_project_id", FieldRule::RequiredPositiveInt),
    ("report_date_start", FieldRule::RequiredDate),
    ("report_date_end", FieldRule::RequiredDate),
];

const JIRA_FIELDS: &[(&str, FieldRule)] = &[
    ("project", FieldRule::RequiredNonEmptyString),
    ("start_date", FieldRule::RequiredDate),
    ("end_date", FieldRule::RequiredDate),
    ("team_members", FieldRule::OptionalStringArray),
];

const TRANSCRIPT_FIELDS: &[(&str, FieldRule)] = &[
    ("serviceAccountKeyFile", FieldRule::RequiredNonEmptyString),
    ("downloadDir", FieldRule::RequiredNonEmptyString),
    ("sanitizeFilenames", FieldRule::OptionalBool),
    ("organizeByFolder", FieldRule::OptionalBool),
    ("convertToMarkdown", FieldRule::OptionalBool),
    ("markdownOutputDir", FieldRule::OptionalString),
    ("teamMembers", FieldRule::OptionalStringArray),
    ("filterByTeamMembers", FieldRule::OptionalBool),
    ("minimumTeamMembersRequired", FieldRule::OptionalPositiveInt),
];

const DATE_FILTER_FIELDS: &[(&str, FieldRule)] = &[
    ("startDate", FieldRule::RequiredDate),
    ("endDate", FieldRule::RequiredDate),
    ("enabled", FieldRule::OptionalBool),
];

fn structural_pass(root: &Value) -> Vec<Violation> {
    let mut violations = Vec::new();
    let Some(root_map) = root.as_object() else {
        violations.push(Violation::new("", "configuration root must be an object"));
        return violations;
    };

    if let Some(value) = root_map.get("reportType") {
        if !value.is_string() {
            violations.push(Violation::new("reportType", "must be a string"));
        }
    }
    if let Some(section) = root_map.get("dailyReports") {
        check_daily_reports(section, &mut violations);
    }
    if let Some(section) = root_map.get("jira") {
        check_jira(section, &mut violations);
    }
    if let Some(section) = root_map.get("transcripts") {
        check_transcripts(section, &mut violations);
    }
    violations
}

fn check_table(
    obj: &Map<String, Value>,
    section_path: &str,
    table: &[(&str, FieldRule)],
    violations: &mut Vec<Violation>,
) {
    for (key, rule) in table {
        check_field(obj.get(*key), *rule, &format!("{section_path}.{key}"), violations);
    }
}

fn check_field(value: Option<&Value>, rule: FieldRule, path: &str, violations: &mut Vec<Violation>) {
    match rule {
        FieldRule::RequiredPositiveInt => match value {
            None => violations.push(Violation::new(path, "required")),
            Some(v) if v.as_u64().is_some_and(|n| n > 0) => {}
            Some(_) => violations.push(Violation::new(path, "must be a positive integer"))
        },
        FieldRule::RequiredNonEmptyString => match value {
            None => violations.push(Violation::new(path, "required")),
            Some(Value::String(s)) if !s.is_empty() => {}
            Some(_) => violations.push(Violation::new(path, "must be a non-empty string"))
        },
        FieldRule::RequiredDate => match value {
            None => violations.push(Violation::new(path, "required")),
            Some(v) if parse_date(v).is_some() => {}
            Some(_) => violations.push(Violation::new(path, "must be an ISO date (YYYY-MM-DD)"))
        },
        FieldRule::OptionalBool => {
            if let Some(v) = value {
                if !v.is_boolean() {
                    violations.push(Violation::new(path, "must be a boolean"));
                }
            }
        }
        FieldRule::OptionalString => {
            if let Some(v) = value {
                if !v.is_string() {
                    violations.push(Violation::new(path, "must be a string"));
                }
            }
        }
        FieldRule::OptionalStringArray => {
            if let Some(v) = value {
                match v.as_array() {
                    Some(items) if items.iter().all(Value::is_string) => {}
                    _ => violations.push(Violation::new(path, "must be an array of strings"))
                }
            }
        }
        FieldRule::OptionalPositiveInt => {
            if let Some(v) = value {
                if !v.as_u64().is_some_and(|n| n > 0) {
                    violations.push(Violation::new(path, "must be a positive integer"));
                }
            }
        }
    }
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn check_daily_reports(section: &Value, violations: &mut Vec<Violation>) {
    let Some(section_map) = section.as_object() else {
        violations.push(Violation::new("dailyReports", "must be an object"));
        return;
    };

    let Some(query) = section_map.get("query") else {
        violations.push(Violation::new("dailyReports.query", "required"));
        return;
    };
    let Some(query_map) = query.as_object() else {
        violations.push(Violation::new("dailyReports.query", "must be an object"));
        return;
    };

    check_table(query_map, "dailyReports.query", DAILY_QUERY_FIELDS, violations);

    if let Some(value) = query_map.get("employee_id") {
        if let Err(reason) = parse_employee_selector(value) {
            violations.push(Violation::new("dailyReports.query.employee_id", reason));
        }
    }

    if let Some(overrides) = query_map.get("employeeProjectOverrides") {
        check_employee_overrides(overrides, violations);
    }
}

fn check_employee_overrides(overrides: &Value, violations: &mut Vec<Violation>) {
    let path = "dailyReports.query.employeeProjectOverrides";
    let Some(items) = overrides.as_array() else {
        violations.push(Violation::new(path, "must be an array"));
        return;
    };

    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{index}]");
        let Some(item_map) = item.as_object() else {
            violations.push(Violation::new(&item_path, "must be an object"));
            continue;
        };

        check_field(
            item_map.get("employee_id"),
            FieldRule::RequiredPositiveInt,
            &format!("{item_path}.employee_id"),
            violations,
        );

        let ids_path = format!("{item_path}.client_project_ids");
        match item_map.get("client_project_ids") {
            None => violations.push(Violation::new(&ids_path, "required")),
            Some(v) if v.as_u64().is_some_and(|n| n > 0) => {}
            Some(Value::Array(ids)) if !ids.is_empty() => {
                if !ids.iter().all(|id| id.as_u64().is_some_and(|n| n > 0)) {
                    violations.push(Violation::new(&ids_path, "must contain positive integers"));
                }
            }
            Some(_) => violations.push(Violation::new(
                &ids_path,
                "must be a positive integer or a non-empty array of positive integers",
            ))
        }
    }
}

fn check_jira(section: &Value, violations: &mut Vec<Violation>) {
    let Some(section_map) = section.as_object() else {
        violations.push(Violation::new("jira", "must be an object"));
        return;
    };

    check_table(section_map, "jira", JIRA_FIELDS, violations);

    if let Some(host_value) = section_map.get("host") {
        let Some(host) = host_value.as_str() else {
            violations.push(Violation::new("jira.host", "must be a string"));
            return;
        };
        if host.contains("://") {
            violations.push(Violation::new(
                "jira.host",
                "must not include a protocol prefix (domain only)",
            ));
        } else if !HOST_RE.is_match(host) {
            violations.push(Violation::new("jira.host", "must be a bare domain name"));
        } else if !host.ends_with(".atlassian.net") {
            // Non-fatal: self-hosted instances exist.
            warn!(host, "jira.host does not look like an Atlassian cloud domain");
        }
    }
}

fn check_transcripts(section: &Value, violations: &mut Vec<Violation>) {
    let Some(section_map) = section.as_object() else {
        violations.push(Violation::new("transcripts", "must be an object"));
        return;
    };

    check_table(section_map, "transcripts", TRANSCRIPT_FIELDS, violations);

    if let Some(folders) = section_map.get("folder_ids") {
        match folders.as_array() {
            Some(items) if items.is_empty() => {
                violations.push(Violation::new("transcripts.folder_ids", "must not be empty"));
            }
            Some(items) => check_folder_id_list(items, "transcripts.folder_ids", violations),
            None => violations.push(Violation::new("transcripts.folder_ids", "must be an array"))
        }
    }

    if let Some(folder) = section_map.get("folderId") {
        match folder {
            Value::String(id) => check_folder_id(id, "transcripts.folderId", violations),
            Value::Array(items) if !items.is_empty() => {
                check_folder_id_list(items, "transcripts.folderId", violations);
            }
            _ => violations.push(Violation::new(
                "transcripts.folderId",
                "must be a folder id or a non-empty array of folder ids",
            ))
        }
    }

    if let Some(folders) = section_map.get("multiProjectFolders") {
        match folders.as_array() {
            Some(items) => check_folder_id_list(items, "transcripts.multiProjectFolders", violations),
            None => violations.push(Violation::new(
                "transcripts.multiProjectFolders",
                "must be an array",
            ))
        }
    }

    if let Some(filter) = section_map.get("dateFilter") {
        match filter.as_object() {
            Some(filter_map) => {
                check_table(filter_map, "transcripts.dateFilter", DATE_FILTER_FIELDS, violations);
            }
            None => violations.push(Violation::new("transcripts.dateFilter", "must be an object"))
        }
    }
}

fn check_folder_id_list(items: &[Value], path: &str, violations: &mut Vec<Violation>) {
    for item in items {
        match item.as_str() {
            Some(id) => check_folder_id(id, path, violations),
            None => violations.push(Violation::new(path, "must contain folder id strings"))
        }
    }
}

fn check_folder_id(id: &str, path: &str, violations: &mut Vec<Violation>) {
    if !FOLDER_ID_RE.is_match(id) {
        violations.push(Violation::new(path, format!("'{id}' is not a valid folder id")));
    }
}

// ---------------------------------------------------------------------------
// Cross-field pass
// ---------------------------------------------------------------------------

type Predicate = fn(&Map<String, Value>) -> Vec<Violation>;

/// Named cross-field predicates, each evaluated independently so a single
/// run reports every failure.
const CROSS_FIELD_PREDICATES: &[(&str, Predicate)] = &[
    ("section_presence", check_section_presence),
    ("daily_reports_date_order", check_daily_date_order),
    ("jira_date_order", check_jira_date_order),
    ("transcript_filter_date_order", check_transcript_filter_date_order),
    ("folder_source_exclusivity", check_folder_exclusivity),
    ("markdown_output_dir", check_markdown_output_dir),
    ("team_member_filter", check_team_member_filter),
    ("multi_project_subset", check_multi_project_subset),
    ("report_type_enumeration", check_report_type),
];

fn cross_field_pass(root: &Value) -> Vec<Violation> {
    let Some(root_map) = root.as_object() else {
        // Unreachable after a clean structural pass.
        return vec![Violation::new("", "configuration root must be an object")];
    };

    let mut violations = Vec::new();
    for (name, predicate) in CROSS_FIELD_PREDICATES {
        let mut found = predicate(root_map);
        if !found.is_empty() {
            debug!(predicate = name, count = found.len(), "cross-field predicate failed");
            violations.append(&mut found);
        }
    }
    violations
}

fn check_section_presence(root: &Map<String, Value>) -> Vec<Violation> {
    let present = ["dailyReports", "jira", "transcripts"]
        .iter()
        .any(|key| root.contains_key(*key));
    if present {
        Vec::new()
    } else {
        vec![Violation::new(
            "",
            "at least one of dailyReports, jira or transcripts must be configured",
        )]
    }
}

fn check_daily_date_order(root: &Map<String, Value>) -> Vec<Violation> {
    let Some(query) = root.get("dailyReports").and_then(|s| s.get("query")) else {
        return Vec::new();
    };
    date_order_violation(query, "report_date_start", "report_date_end", "dailyReports.query")
}

fn check_jira_date_order(root: &Map<String, Value>) -> Vec<Violation> {
    let Some(section) = root.get("jira") else {
        return Vec::new();
    };
    date_order_violation(section, "start_date", "end_date", "jira")
}

fn check_transcript_filter_date_order(root: &Map<String, Value>) -> Vec<Violation> {
    let Some(filter) = root.get("transcripts").and_then(|s| s.get("dateFilter")) else {
        return Vec::new();
    };
    let enabled = filter.get("enabled").and_then(Value::as_bool).unwrap_or(true);
    if !enabled {
        return Vec::new();
    }
    date_order_violation(filter, "startDate", "endDate", "transcripts.dateFilter")
}

fn date_order_violation(
    section: &Value,
    start_key: &str,
    end_key: &str,
    path_prefix: &str,
) -> Vec<Violation> {
    match (
        section.get(start_key).and_then(parse_date),
        section.get(end_key).and_then(parse_date),
    ) {
        (Some(start), Some(end)) if start > end => vec![Violation::new(
            format!("{path_prefix}.{start_key}"),
            format!("must not be after {end_key} ({start} > {end})"),
        )],
        _ => Vec::new()
    }
}

fn check_folder_exclusivity(root: &Map<String, Value>) -> Vec<Violation> {
    let Some(section) = root.get("transcripts") else {
        return Vec::new();
    };
    let has_plural = section.get("folder_ids").is_some();
    let has_single = section.get("folderId").is_some();
    match (has_plural, has_single) {
        (false, false) => vec![Violation::new(
            "transcripts",
            "exactly one of folder_ids or folderId must be supplied",
        )],
        (true, true) => vec![Violation::new(
            "transcripts",
            "folder_ids and folderId are mutually exclusive; supply exactly one",
        )],
        _ => Vec::new()
    }
}

fn check_markdown_output_dir(root: &Map<String, Value>) -> Vec<Violation> {
    let Some(section) = root.get("transcripts") else {
        return Vec::new();
    };
    let convert = section
        .get("convertToMarkdown")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !convert {
        return Vec::new();
    }
    let has_dir = section
        .get("markdownOutputDir")
        .and_then(Value::as_str)
        .is_some_and(|dir| !dir.is_empty());
    if has_dir {
        Vec::new()
    } else {
        vec![Violation::new(
            "transcripts.markdownOutputDir",
            "required when convertToMarkdown is enabled",
        )]
    }
}

fn check_team_member_filter(root: &Map<String, Value>) -> Vec<Violation> {
    let Some(section) = root.get("transcripts") else {
        return Vec::new();
    };
    let filtering = section
        .get("filterByTeamMembers")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !filtering {
        return Vec::new();
    }

    let mut violations = Vec::new();
    let member_count = section
        .get("teamMembers")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    if member_count == 0 {
        violations.push(Violation::new(
            "transcripts.teamMembers",
            "must not be empty when filterByTeamMembers is enabled",
        ));
    }

    let minimum = section
        .get("minimumTeamMembersRequired")
        .and_then(Value::as_u64)
        .unwrap_or(1) as usize;
    if member_count > 0 && minimum > member_count {
        violations.push(Violation::new(
            "transcripts.minimumTeamMembersRequired",
            format!("must not exceed the {member_count} configured team member(s)"),
        ));
    }
    violations
}

fn check_multi_project_subset(root: &Map<String, Value>) -> Vec<Violation> {
    let Some(section) = root.get("transcripts") else {
        return Vec::new();
    };
    let Some(multi) = section.get("multiProjectFolders").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut known: HashSet<&str> = HashSet::new();
    if let Some(ids) = section.get("folder_ids").and_then(Value::as_array) {
        known.extend(ids.iter().filter_map(Value::as_str));
    }
    match section.get("folderId") {
        Some(Value::String(id)) => {
            known.insert(id);
        }
        Some(Value::Array(ids)) => known.extend(ids.iter().filter_map(Value::as_str)),
        _ => {}
    }

    multi
        .iter()
        .filter_map(Value::as_str)
        .filter(|id| !known.contains(id))
        .map(|id| {
            Violation::new(
                "transcripts.multiProjectFolders",
                format!("'{id}' is not in the configured folder set"),
            )
        })
        .collect()
}

fn check_report_type(root: &Map<String, Value>) -> Vec<Violation> {
    let Some(value) = root.get("reportType").and_then(Value::as_str) else {
        return Vec::new();
    };
    if ReportMode::from_str(value).is_ok() {
        Vec::new()
    } else {
        vec![Violation::new(
            "reportType",
            format!("must be one of: {}", ReportMode::allowed().join(", ")),
        )]
    }
}
