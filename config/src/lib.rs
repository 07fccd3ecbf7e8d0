//! # Configuration System
//!
//! Hierarchical configuration resolution for the reporting toolkit.
//!
//! This crate provides:
//! - Source resolution from `REPKIT_*` environment signals (legacy
//!   single-file mode or tenant/report-mode hierarchical mode)
//! - Fragment loading with format detection (JSON/YAML/TOML)
//! - Deterministic deep merging of layered fragments
//! - Two-pass validation (structural, then cross-field) with aggregated
//!   violations
//! - A caching resolver handing out immutable, validated configurations
//!
//! # Best Practices
//!
//! - One failed resolution surfaces every violation at once
//! - Failures are never cached; a corrected fragment is picked up on the
//!   next call
//! - Thread-safe resolution and caching

pub mod cache;
pub mod fragment;
pub mod merge;
pub mod resolver;
pub mod schema;
pub mod validate;

pub use cache::ConfigResolver;
pub use errors::{ConfigError, Violation};
pub use fragment::load_fragment;
pub use merge::{deep_merge, merge_layers};
pub use resolver::{
    ConfigSource, DEFAULT_CONFIG_ROOT, LEGACY_CONFIG_FILE, ResolverSignals, resolve_source,
};
pub use schema::{
    DailyReportsConfig, DailyReportsQuery, EmployeeProjectOverride, EmployeeSelector, JiraConfig,
    ReportMode, TranscriptDateFilter, TranscriptsConfig, ValidatedConfig,
};
pub use validate::validate;
