use clap::Subcommand;

use crate::common::{self, CliResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store the bearer token used for reports
    SetToken {
        token: String,
    },
    /// Remove the stored token
    ClearToken,
    /// Override the reporting base URL; an empty value restores the default
    SetBaseUrl {
        url: String,
    },
    /// Show whether a token is stored and which base URL is used
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: AuthAction) -> CliResult {
    let control = common::open_basic()?;

    match action {
        AuthAction::SetToken { token } => {
            control.set_auth_token(&token)?;
            println!("ok");
        }
        AuthAction::ClearToken => {
            control.clear_auth_token()?;
            println!("token cleared");
        }
        AuthAction::SetBaseUrl { url } => {
            control.set_base_url(&url)?;
            println!("base url: {}", control.credentials().base_url);
        }
        AuthAction::Status { json } => {
            let credentials = control.credentials();
            if json {
                let status = serde_json::json!({
                    "authenticated": credentials.is_authenticated(),
                    "baseUrl": credentials.base_url,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                let state = if credentials.is_authenticated() {
                    "authenticated"
                } else {
                    "not authenticated"
                };
                println!("{state}");
                println!("base url: {}", credentials.base_url);
            }
        }
    }
    Ok(())
}
