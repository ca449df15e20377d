//! Command-line access to the relay: await tasks, submit sponsored calls
//! and check which chains are relayed.

use clap::{Parser, Subcommand};
use payflow_relay::{RelayConfig, RelayRouter, RelayTaskWaiter, SponsoredCallRequest, WaitConfig};
use payflow_types::{RelayError, TransactionHash};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", env = "PAYFLOW_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wait for a relay task and print its transaction hash
    Wait {
        task_id: String,
        #[arg(long)]
        chain_id: u64,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Submit a sponsored call, optionally waiting for it to execute
    Submit {
        #[arg(long)]
        chain_id: u64,
        #[arg(long)]
        target: String,
        #[arg(long)]
        data: String,
        #[arg(long)]
        wait: bool,
        #[command(flatten)]
        wait_args: WaitArgs,
    },
    /// Report whether a chain is served by the relay
    Supported { chain_id: u64 },
}

#[derive(clap::Args, Debug)]
struct WaitArgs {
    #[arg(long, env = "RELAY_POLL_MS")]
    poll_interval_ms: Option<u64>,
    #[arg(long, env = "RELAY_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
}

impl WaitArgs {
    fn resolve(&self, defaults: WaitConfig) -> WaitConfig {
        WaitConfig::new(
            self.poll_interval_ms.unwrap_or(defaults.poll_ms),
            self.timeout_ms.unwrap_or(defaults.timeout_ms),
        )
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    use tracing_subscriber::{fmt, EnvFilter};
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = RelayConfig::from_env()?;
    let router = RelayRouter::from_config(&config)?;

    match args.command {
        Command::Wait { task_id, chain_id, wait } => {
            let waiter = waiter(&router, chain_id)?;
            let outcome = waiter
                .await_completion_with(&task_id, wait.resolve(config.wait))
                .await;
            let hash = report(outcome)?;
            println!("{}", hash);
        }
        Command::Submit { chain_id, target, data, wait, wait_args } => {
            let client = router.require_client(chain_id)?;
            let request = SponsoredCallRequest::new(chain_id, target, &data)?;
            let task_id = client.sponsored_call(&request).await?;
            tracing::info!(%task_id, chain_id, "Submitted sponsored call");

            if wait {
                let waiter = RelayTaskWaiter::new(client, wait_args.resolve(config.wait));
                let hash = report(waiter.await_completion(&task_id).await)?;
                println!("{}", hash);
            } else {
                println!("{}", task_id);
            }
        }
        Command::Supported { chain_id } => {
            let supported = router.is_relay_supported(Some(chain_id));
            println!("{}", supported);
            if supported {
                println!("sponsored transactions: {}", router.sponsored_count());
            }
        }
    }

    Ok(())
}

fn waiter(router: &RelayRouter, chain_id: u64) -> Result<RelayTaskWaiter, RelayError> {
    router
        .waiter_for_chain(chain_id)
        .ok_or(RelayError::UnsupportedChain(chain_id))
}

/// Log a wait outcome the way users should see it.
fn report(outcome: Result<TransactionHash, RelayError>) -> Result<TransactionHash, RelayError> {
    match &outcome {
        Ok(hash) if !payflow_types::is_tx_hash(hash) => {
            tracing::warn!(%hash, "Relay returned an unexpected transaction hash format");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "{}", e.failure_kind().notification()),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_wait_flags_override_config() {
        let args = Args::try_parse_from([
            "payflow-relay",
            "wait",
            "0xtask",
            "--chain-id",
            "8453",
            "--poll-interval-ms",
            "500",
        ])
        .unwrap();

        match args.command {
            Command::Wait { task_id, chain_id, wait } => {
                assert_eq!(task_id, "0xtask");
                assert_eq!(chain_id, 8453);
                let resolved = wait.resolve(WaitConfig::default());
                assert_eq!(resolved, WaitConfig::new(500, 60_000));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
