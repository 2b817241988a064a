use clap::Subcommand;
use mindguard_core::ValidationError;

use crate::common::{self, CliResult};

#[derive(Subcommand)]
pub enum BlockAction {
    /// Block an app by package id or display name
    Add {
        /// Package id (e.g. "com.instagram.android") or display name (e.g. "Instagram")
        app: String,
    },
    /// Unblock an app; removing an absent entry is not an error
    Remove {
        app: String,
    },
    /// List blocked entries
    List {
        /// Output as JSON array
        #[arg(long)]
        json: bool,
    },
    /// Check whether a package would be blocked
    Check {
        app: String,
    },
}

pub fn run(action: BlockAction) -> CliResult {
    let control = common::open_basic()?;

    match action {
        BlockAction::Add { app } => {
            let app = app_argument(&app)?;
            control.block_app(app)?;
            println!("blocked: {app}");
        }
        BlockAction::Remove { app } => {
            let app = app_argument(&app)?;
            control.unblock_app(app)?;
            println!("unblocked: {app}");
        }
        BlockAction::List { json } => {
            let blocked = control.get_blocked_apps();
            if json {
                println!("{}", serde_json::to_string_pretty(&blocked)?);
            } else if blocked.is_empty() {
                println!("No blocked apps.");
            } else {
                for app in blocked {
                    println!("{app}");
                }
            }
        }
        BlockAction::Check { app } => {
            let app = app_argument(&app)?;
            let name = control.resolver().resolve(app);
            if control.is_blocked(app) {
                println!("{name}: blocked");
            } else {
                println!("{name}: allowed");
            }
        }
    }
    Ok(())
}

/// Shell arguments often carry stray whitespace; the store keeps ids verbatim.
fn app_argument(raw: &str) -> Result<&str, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyAppId);
    }
    Ok(trimmed)
}
