mod cli;

use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use banter_model::ChatSession;
use banter_tui::App;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Some(Commands::ShowConfig) = &cli.command {
        let config = load_config(&cli)?;
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let config = load_config(&cli)?;
    let provider = banter_model::from_config(&config.model)?;
    let session = ChatSession::new(provider, Some(config.chat.system_prompt.clone()));

    let app = App::new(config, session);
    let terminal = ratatui::init();
    let result = app.run(terminal).await;
    ratatui::restore();
    result
}

fn load_config(cli: &Cli) -> anyhow::Result<banter_config::Config> {
    let mut config = banter_config::load(cli.config.as_deref())?;
    if let Some(model) = &cli.model {
        config.model.name = model.clone();
    }
    if let Some(provider) = &cli.provider {
        config.model.provider = provider.clone();
    }
    if cli.ascii {
        config.tui.ascii = true;
    }
    Ok(config)
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so a redirect like `2>banter.log` captures them
    // without corrupting the chat screen.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
