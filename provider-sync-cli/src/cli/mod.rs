//! Command-line surface

pub mod commands;
pub mod operator;

use clap::Parser;

use crate::replication::ReplicationOutcome;

pub use operator::TerminalOperator;

/// Applied, nothing to do, or declined by the operator
pub const EXIT_SUCCESS: i32 = 0;
/// Validation or runtime failure
pub const EXIT_FAILURE: i32 = 1;
/// Wrong arguments
pub const EXIT_USAGE: i32 = 2;

const STRATEGIES_HELP: &str = "\
Strategies:
    There are two strategies that can be used to update the destination. The default
    strategy is \"echo\" as it results in the smallest, safest changeset.

    echo
        Registrations that are active on the source subscription will be activated on
        the destination subscription. Registrations that are inactive on the source are
        not marked inactive on the destination, only new registrations are made.
    sync
        The state of registrations on the source subscription is replicated exactly to
        the destination. If a provider is active on the destination but inactive on the
        source, it will be unregistered from the destination.

Environment:
    ARM_ENVIRONMENT      'usgovernment' targets Azure US Government, otherwise public cloud
    AZURE_TENANT_ID, AZURE_CLIENT_ID, AZURE_CLIENT_SECRET
                         Service principal credentials; when unset the Azure CLI login is used
    PROVIDER_SYNC_HTTP_TIMEOUT_SECS
                         Per-request timeout (default 60)";

/// Update an Azure subscription's registered resource providers from another subscription
#[derive(Parser, Debug)]
#[command(name = "provider-sync", version, after_long_help = STRATEGIES_HELP)]
pub struct Cli {
    /// Subscription used to decide what to change on the destination
    pub source_subscription_id: String,

    /// Subscription to update from the source's provider registrations
    pub destination_subscription_id: String,

    /// Replication strategy, "echo" or "sync" (default: echo)
    pub strategy: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Log requests and replication steps
    #[arg(short, long)]
    pub verbose: bool,
}

/// Exit code for an argument parsing result that did not yield a `Cli`
///
/// `--help` and `--version` come back as errors but are not failures.
pub fn usage_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS }
}

/// Exit code for a finished run
pub fn exit_code(result: &anyhow::Result<ReplicationOutcome>) -> i32 {
    match result {
        Ok(_) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}
