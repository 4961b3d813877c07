//! Subcommand handlers.

use std::process::ExitCode;

use raidassist_common::auth::SessionStatus;
use raidassist_common::ErrorClassification;
use raidassist_domain::AuthError;
use raidassist_infra::bootstrap::AuthRuntime;
use raidassist_infra::config::AuthSettings;
use tracing::error;

use crate::Command;

pub async fn run(command: Command, settings: &AuthSettings) -> anyhow::Result<ExitCode> {
    let runtime = AuthRuntime::from_settings(settings)?;

    match command {
        Command::CheckConfig => Ok(check_config(&runtime)),
        Command::Token => {
            let result = runtime.provider().get_access_token().await;
            Ok(report(result.map(|token| println!("{token}"))))
        }
        Command::Login => {
            let result = runtime.login().await;
            Ok(report(result.map(|_| println!("Logged in to Bungie.net."))))
        }
        Command::Logout => {
            runtime.provider().logout().await;
            println!("Logged out.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Status { json } => {
            let status = runtime.status().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status, runtime.is_test_mode());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn check_config(runtime: &AuthRuntime) -> ExitCode {
    println!("{}", runtime.config_message());
    if runtime.provider().is_configured() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report(result: Result<(), AuthError>) -> ExitCode {
    let Err(e) = result else {
        return ExitCode::SUCCESS;
    };

    error!(error = %e, severity = %e.severity(), "command_failed");
    eprintln!("error: {e}");
    if let Some(delay) = e.retry_after() {
        eprintln!("This looks temporary; try again in {} s.", delay.as_secs());
    } else if matches!(e, AuthError::ConfigInvalid(_)) {
        eprintln!("Check BUNGIE_API_KEY, BUNGIE_CLIENT_ID and BUNGIE_REDIRECT_URI.");
    } else if e.requires_user_action() {
        eprintln!("Run `raidassist-auth login` to sign in again.");
    }
    ExitCode::FAILURE
}

fn print_status(status: &SessionStatus, test_mode: bool) {
    if test_mode {
        println!("mode:          test");
    }
    println!("state:         {}", status.state);
    match status.seconds_until_expiry {
        Some(secs) if secs > 0 => println!("expires in:    {}", format_duration(secs)),
        Some(_) => println!("expires in:    expired"),
        None => println!("expires in:    -"),
    }
    println!("refresh token: {}", if status.has_refresh_token { "yes" } else { "no" });
    if let Some(membership_id) = &status.membership_id {
        println!("membership id: {membership_id}");
    }
}

fn format_duration(secs: i64) -> String {
    let (hours, rest) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
