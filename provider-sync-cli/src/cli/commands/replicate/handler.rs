//! Replicate command handler

use anyhow::{Context, Result};
use colored::*;

use crate::api::ArmClient;
use crate::cli::{Cli, TerminalOperator};
use crate::config::Config;
use crate::replication::{self, ReplicationOutcome, validate_request};

/// Run one replication from parsed arguments
///
/// Input validation and configuration both happen before the first
/// network call.
pub async fn handle_replicate_command(args: Cli) -> Result<ReplicationOutcome> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let request = validate_request(
        &args.source_subscription_id,
        &args.destination_subscription_id,
        args.strategy.as_deref(),
    )?;

    let config = Config::from_env().context("Invalid configuration")?;
    let client = ArmClient::new(&config)?;

    if args.verbose {
        println!(
            "Using {} cloud ({}) with {} credentials, strategy {}",
            format!("{:?}", config.cloud).cyan(),
            config.cloud.resource_manager().dimmed(),
            config.credentials.kind(),
            request.strategy.to_string().bright_green().bold()
        );
    }

    let mut operator = TerminalOperator::new();
    let outcome = replication::run(&client, &mut operator, &request).await?;

    log::info!("Replication finished: {:?}", outcome);
    Ok(outcome)
}
