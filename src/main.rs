use anyhow::Result;
use audit_forecast::cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("audit_forecast=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
