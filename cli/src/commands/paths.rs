use anyhow::Result;
use clap::Args;
use config::{ConfigSource, resolve_source};

use crate::commands::{SignalArgs, report_failure};
use crate::output;

#[derive(Args)]
pub struct PathsArgs {
    #[command(flatten)]
    pub signals: SignalArgs
}

pub fn run(args: PathsArgs) -> Result<()> {
    let signals = args.signals.signals();
    let source = resolve_source(&signals).map_err(|err| {
        report_failure(&err);
        err
    })?;

    output::header("Configuration layers");
    match &source {
        ConfigSource::Legacy { path } => {
            println!("  legacy:   {}", path.display());
        }
        ConfigSource::Hierarchical {
            defaults,
            base,
            override_layer,
            ..
        } => {
            match defaults {
                Some(path) => println!("  defaults: {}", path.display()),
                None => println!("  defaults: (none)")
            }
            println!("  base:     {}", base.display());
            println!("  override: {}", override_layer.display());
        }
    }
    println!("  cache key: {}", source.key());
    Ok(())
}
