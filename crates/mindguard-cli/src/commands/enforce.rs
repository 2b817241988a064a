use std::path::PathBuf;
use std::time::Duration;

use clap::Subcommand;

use crate::common::{self, CliResult};
use crate::platform::{EventInput, HeadlessPlatform};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Subcommand)]
pub enum EnforceAction {
    /// Feed foreground events through the engine and print interventions.
    ///
    /// Each line is a package id or a JSON event. Reads stdin unless --file
    /// is given; stops at end of input or on Ctrl-C.
    Replay {
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print engine counters as JSON when done
        #[arg(long)]
        stats: bool,
    },
}

pub fn run(action: EnforceAction) -> CliResult {
    match action {
        EnforceAction::Replay { file, stats } => {
            let events = match file {
                Some(path) => EventInput::File(path),
                None => EventInput::Stdin,
            };
            let control = common::open_control(HeadlessPlatform {
                events,
                ..HeadlessPlatform::default()
            })?;

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(async {
                control.start_enforcement()?;
                let interrupted = tokio::signal::ctrl_c();
                tokio::pin!(interrupted);
                let mut poll = tokio::time::interval(POLL_INTERVAL);
                loop {
                    tokio::select! {
                        _ = &mut interrupted => break,
                        _ = poll.tick() => {
                            if !control.is_enforcement_running() {
                                break;
                            }
                        }
                    }
                }
                control.stop_enforcement();
                Ok::<(), Box<dyn std::error::Error>>(())
            })?;

            if stats {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&control.enforcement_stats())?
                );
            }
        }
    }
    Ok(())
}
