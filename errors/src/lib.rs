//! # Repkit Errors
//!
//! Error handling for the repkit configuration engine.
//!
//! Everything that can go wrong between "read environment signals" and
//! "hand a validated config to a connector" is reported through the single
//! [`ConfigError`] kind, so callers need exactly one handling path: print
//! the report, exit non-zero. Each variant carries the distinguishing
//! context (offending path, field paths, violated enumeration).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single validation failure, tagged with the dotted path of the field
/// it refers to (e.g. `transcripts.dateFilter.startDate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted field path into the configuration tree.
    pub path: String,

    /// Human-readable description of what is wrong with the field.
    pub message: String
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into()
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Configuration errors.
///
/// Covers file/layer lookup, parsing, structural and cross-field
/// validation, and invalid tenant/report-mode identifiers. Validation
/// failures always carry every violation found in a single pass, never
/// just the first, so one edit-and-rerun cycle can fix a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration layer does not exist on disk.
    #[error("Configuration layer not found: {path}")]
    LayerNotFound {
        path: PathBuf,
        /// Remediation steps shown to the user.
        hints: Vec<String>
    },

    /// A configuration layer exists but could not be parsed.
    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Structural or cross-field validation failed.
    #[error("Configuration validation failed with {n} violation(s)", n = .violations.len())]
    Validation { violations: Vec<Violation> },

    /// The tenant identifier matches no directory under the config root.
    #[error("Unknown tenant '{tenant}': no such directory (existing tenants: {tenants})",
            tenants = .available.join(", "))]
    UnknownTenant {
        tenant: String,
        /// Tenant directories that do exist, to guide correction.
        available: Vec<String>
    },

    /// The report-mode identifier is not in the fixed enumeration.
    #[error("Invalid report mode '{value}' (allowed: {modes})", modes = .allowed.join(", "))]
    InvalidReportMode { value: String, allowed: Vec<String> },

    /// The merged tree passed validation but could not be normalized into
    /// the typed configuration. Indicates a gap between the structural
    /// field table and the schema types.
    #[error("Failed to normalize validated configuration: {reason}")]
    Normalize { reason: String }
}

impl ConfigError {
    /// Field-level violations, empty for non-validation failures.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ConfigError::Validation { violations } => violations,
            _ => &[]
        }
    }

    /// Resolution-step remediation hints, empty when none apply.
    pub fn hints(&self) -> &[String] {
        match self {
            ConfigError::LayerNotFound { hints, .. } => hints,
            _ => &[]
        }
    }

    /// Full multi-line report: summary, then one line per violation and
    /// per hint. This is what a CLI prints before terminating.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        for violation in self.violations() {
            out.push_str("\n  - ");
            out.push_str(&violation.to_string());
        }
        for hint in self.hints() {
            out.push_str("\n  hint: ");
            out.push_str(hint);
        }
        out
    }
}
