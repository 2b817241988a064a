use clap::{Subcommand, ValueEnum};

use crate::common::{self, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum PermissionKind {
    Blocking,
    Usage,
}

#[derive(Subcommand)]
pub enum PermissionsAction {
    /// Show which permissions are granted
    Status,
    /// Open the settings screen that grants a permission
    Open {
        #[arg(value_enum)]
        kind: PermissionKind,
    },
}

pub fn run(action: PermissionsAction) -> CliResult {
    let control = common::open_basic()?;

    match action {
        PermissionsAction::Status => {
            println!("blocking: {}", granted(control.has_blocking_permission()));
            println!("usage access: {}", granted(control.has_usage_access_permission()));
        }
        PermissionsAction::Open { kind } => match kind {
            PermissionKind::Blocking => control.open_blocking_permission_settings()?,
            PermissionKind::Usage => control.open_usage_access_settings()?,
        },
    }
    Ok(())
}

fn granted(yes: bool) -> &'static str {
    if yes {
        "granted"
    } else {
        "not granted"
    }
}
