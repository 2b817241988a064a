use std::path::PathBuf;

use clap::Subcommand;

use crate::common::{self, CliResult};

#[derive(Subcommand)]
pub enum UsageAction {
    /// Per-app foreground time, most used first
    Stats {
        /// Whole days to look back; values below 1 mean 1
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        days: f64,
        /// JSON file of usage samples
        #[arg(long)]
        samples: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: UsageAction) -> CliResult {
    match action {
        UsageAction::Stats {
            days,
            samples,
            json,
        } => {
            let control = common::open_control(common::samples_platform(samples))?;
            let stats = control.get_usage_stats(days)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            if stats.is_empty() {
                println!("No usage recorded.");
                return Ok(());
            }
            for entry in stats {
                println!(
                    "{:<24} {:>6} min  {}",
                    entry.display_name,
                    mindguard_core::usage::total_minutes(entry.total_foreground_ms),
                    entry.package_id
                );
            }
        }
    }
    Ok(())
}
