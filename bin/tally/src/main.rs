use clap::Parser;
use tally::{
    cli::{log_level, Cli, Commands},
    run::{run_rewards, run_summary},
};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Derive the log level from the verbosity flag if not set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", log_level(cli.verbosity()));
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Rewards(cmd) => run_rewards(cmd),
        Commands::Summary(cmd) => run_summary(cmd),
    };

    if let Err(err) = result {
        error!("{err:?}");
        std::process::exit(1);
    }
}
