use std::path::PathBuf;

use clap::Subcommand;
use mindguard_core::ReportOutcome;
use tracing::info;

use crate::common::{self, CliResult};

#[derive(Subcommand)]
pub enum ReportAction {
    /// Run a single report cycle now
    Once {
        /// JSON file of usage samples
        #[arg(long)]
        samples: Option<PathBuf>,
    },
    /// Report periodically until interrupted with Ctrl-C
    Run {
        /// JSON file of usage samples
        #[arg(long)]
        samples: Option<PathBuf>,
    },
}

pub fn run(action: ReportAction) -> CliResult {
    let runtime = tokio::runtime::Runtime::new()?;

    match action {
        ReportAction::Once { samples } => {
            let control = common::open_control(common::samples_platform(samples))?;
            let outcome = runtime.block_on(control.report_now());
            println!("{}", describe(&outcome));
            if let ReportOutcome::Failed(reason) = outcome {
                return Err(format!("report failed: {reason}").into());
            }
        }
        ReportAction::Run { samples } => {
            let control = common::open_control(common::samples_platform(samples))?;
            runtime.block_on(async {
                control.start_usage_reporting()?;
                tokio::signal::ctrl_c().await?;
                info!("Interrupted");
                control.stop_usage_reporting();
                Ok::<(), Box<dyn std::error::Error>>(())
            })?;
        }
    }
    Ok(())
}

fn describe(outcome: &ReportOutcome) -> String {
    match outcome {
        ReportOutcome::Sent { minutes } => format!("sent: {minutes} min"),
        ReportOutcome::SkippedUnauthenticated { minutes } => {
            format!("skipped: no auth token ({minutes} min)")
        }
        ReportOutcome::SkippedUnavailable => "skipped: usage statistics unavailable".to_string(),
        ReportOutcome::Failed(reason) => format!("failed: {reason}"),
    }
}
