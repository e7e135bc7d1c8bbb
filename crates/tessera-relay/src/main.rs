//! tessera-relay: command-line front end for building and inspecting price
//! payloads.
//!
//! ```text
//! tessera-relay payload               fetch, sign and print a payload
//! tessera-relay inspect <hex>         decode augmented calldata
//! tessera-relay address <hex-key>     print the identity of a key
//! ```

mod commands;
mod config;

use tracing::{debug, error, info};

use crate::config::RelayConfig;

const USAGE: &str = "usage: tessera-relay <payload | inspect <hex-calldata> | address <hex-key>>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = RelayConfig::config_path();
    let config = RelayConfig::load_from(&config_path)?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tessera={}", config.logging.level).parse()?),
        )
        .init();

    if config_path.exists() {
        debug!(path = %config_path.display(), "configuration loaded");
    } else {
        debug!(path = %config_path.display(), "no configuration file, using defaults");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["payload"] => {
            info!(
                connector = ?config.connector.kind,
                strategy = %config.injector.strategy,
                "building payload"
            );
            match commands::payload(&config).await {
                Ok(hex) => println!("{hex}"),
                Err(e) => {
                    error!("payload failed: {e:#}");
                    return Err(e);
                }
            }
        }
        ["inspect", calldata] => {
            let report = commands::inspect_now(&config, calldata)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        ["address", key] => {
            println!("{}", commands::address(key)?);
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
    Ok(())
}
