pub mod paths;
pub mod show;
pub mod validate;

use clap::{Args, Parser, Subcommand};
use config::ResolverSignals;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "repkit",
    author,
    version,
    about = "repkit - reporting configuration toolkit",
    long_about = "Resolves, validates and inspects reporting configurations.\n\nSources are picked \
                  from REPKIT_TENANT / REPKIT_REPORT_MODE (hierarchical mode) or \
                  REPKIT_CONFIG_PATH (legacy single file); flags override the environment."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Resolve and validate the configuration, reporting every violation")]
    Validate(validate::ValidateArgs),

    #[command(about = "Print the resolved, validated configuration as JSON")]
    Show(show::ShowArgs),

    #[command(about = "Print the fragment layers the configuration resolves from")]
    Paths(paths::PathsArgs),
}

/// Source-selection flags shared by every subcommand. Each flag overrides
/// the matching `REPKIT_*` environment signal.
#[derive(Args)]
pub struct SignalArgs {
    #[arg(long, help = "Tenant identifier (overrides REPKIT_TENANT)")]
    pub tenant: Option<String>,

    #[arg(
        long,
        help = "Report mode: daily, jira, transcripts or combined (overrides REPKIT_REPORT_MODE)"
    )]
    pub mode: Option<String>,

    #[arg(long, help = "Legacy configuration file (overrides REPKIT_CONFIG_PATH)")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Hierarchical configuration root (overrides REPKIT_CONFIG_ROOT)")]
    pub root: Option<PathBuf>
}

impl SignalArgs {
    pub fn signals(&self) -> ResolverSignals {
        let mut signals = ResolverSignals::from_env();
        if self.tenant.is_some() {
            signals.tenant = self.tenant.clone();
        }
        if self.mode.is_some() {
            signals.report_mode = self.mode.clone();
        }
        if self.config.is_some() {
            signals.config_path = self.config.clone();
        }
        if let Some(root) = &self.root {
            signals.config_root = root.clone();
        }
        signals
    }
}

/// Print the details anyhow's final error line leaves out: individual
/// violations and remediation hints.
pub(crate) fn report_failure(err: &errors::ConfigError) {
    if let errors::ConfigError::Validation { violations } = err {
        for violation in violations {
            crate::output::error(&violation.to_string());
        }
    }
    for hint in err.hints() {
        crate::output::hint(hint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
