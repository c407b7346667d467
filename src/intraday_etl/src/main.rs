use clap::Parser;
use intraday_etl::{
    cli::{
        commands::{Cli, execute},
        logging::{LogConfig, init_logging},
    },
    config::Settings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // API_KEY may come from a .env file next to the working directory
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::from_path(&cli.config)?;

    init_logging(&LogConfig::from_verbosity(cli.verbose).with_log_file(settings.log_file.clone()))?;

    execute(cli.command, &settings).await
}
