//! Beacon - Demo Entry Point
//!
//! Wires the coordination core together the way a host application
//! would: one storage, one coordinator, one executor, all constructed
//! here and passed down explicitly. The binary then runs a single
//! command against the configured API.
//!
//! Usage: `beacon <get PATH | login | logout | expire-token>` with the
//! provider and API endpoints supplied through `BEACON_*` environment
//! variables.

mod config;
mod console_redirect;

use beacon_application::{ApiExecutor, AuthCoordinator, AuthStateStore};
use beacon_infrastructure::{FileStateStorage, OidcAuthClient, ReqwestHttpClient, SystemClock};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::console_redirect::ConsoleRedirect;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let command = std::env::args().nth(1).unwrap_or_else(|| "get".to_string());
    let path = std::env::args().nth(2).unwrap_or_else(|| "/me".to_string());

    // Dependency wiring: every component receives its collaborators
    // explicitly; nothing is reachable through a global.
    let storage = FileStateStorage::in_data_dir("beacon");
    let store = AuthStateStore::new(storage);
    let auth = OidcAuthClient::new(config.oidc.clone(), ConsoleRedirect::new());
    let coordinator = AuthCoordinator::load(auth, store, SystemClock::new()).await;
    let http = ReqwestHttpClient::new(&config.user_agent)?;
    let executor = ApiExecutor::new(http, coordinator, config.api_base_url, config.client_id);
    tracing::debug!(%command, "components wired, running command");

    match command.as_str() {
        "get" => match executor.get(&path).await {
            Ok(response) => println!("{}", response.body_text()),
            Err(error) if error.is_login_required() => {
                eprintln!("not signed in; run `beacon login` first");
                std::process::exit(1);
            }
            Err(error) => return Err(Box::new(error) as Box<dyn std::error::Error>),
        },
        "login" => {
            executor.force_login().await?;
            println!("signed in");
        }
        "logout" => {
            executor.force_logout().await?;
            println!("signed out");
        }
        "expire-token" => {
            executor.simulate_expired_access_token().await;
            println!("access token dropped; next call will refresh");
        }
        other => {
            eprintln!("unknown command '{other}'; expected get, login, logout or expire-token");
            std::process::exit(2);
        }
    }

    Ok(())
}
