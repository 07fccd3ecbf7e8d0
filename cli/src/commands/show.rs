use anyhow::Result;
use clap::Args;
use config::ConfigResolver;

use crate::commands::{SignalArgs, report_failure};

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub signals: SignalArgs
}

pub fn run(args: ShowArgs) -> Result<()> {
    let resolver = ConfigResolver::new(args.signals.signals());
    match resolver.resolve() {
        Ok(config) => {
            println!("{}", serde_json::to_string_pretty(&*config)?);
            Ok(())
        }
        Err(err) => {
            report_failure(&err);
            Err(err.into())
        }
    }
}
