use clap::Parser;
use colored::*;

use provider_sync::cli::commands::replicate::handle_replicate_command;
use provider_sync::cli::{Cli, exit_code, usage_exit_code};
use provider_sync::replication::ReplicationError;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "warn,provider_sync=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            std::process::exit(usage_exit_code(&err));
        }
    };

    init_logging(args.verbose);

    let result = handle_replicate_command(args).await;
    if let Err(err) = &result {
        eprintln!("{} {:#}", "Failure:".red().bold(), err);
        if err
            .downcast_ref::<ReplicationError>()
            .is_some_and(ReplicationError::is_validation)
        {
            eprintln!("Run with --help for usage.");
        }
    }
    std::process::exit(exit_code(&result));
}
