use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = tls_bootstrap::cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .init();

    cli.run()
}
