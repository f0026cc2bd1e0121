use cellmap::{AppConfig, CliArgs, LoggingConfig, init_logging};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    init_logging(logging_config)?;

    let cli = CliArgs::parse();
    let config = AppConfig::from_args(cli)?;

    cellmap::run(config)
}
