use anyhow::Result;
use clap::Args;
use config::ConfigResolver;

use crate::commands::{SignalArgs, report_failure};
use crate::output;

#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub signals: SignalArgs
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let resolver = ConfigResolver::new(args.signals.signals());
    match resolver.resolve() {
        Ok(config) => {
            let mut sections = Vec::new();
            if config.daily_reports.is_some() {
                sections.push("dailyReports");
            }
            if config.jira.is_some() {
                sections.push("jira");
            }
            if config.transcripts.is_some() {
                sections.push("transcripts");
            }
            output::success(&format!("configuration is valid ({})", sections.join(", ")));
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.into())
        }
    }
}
