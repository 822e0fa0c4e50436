use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ticketrelay")]
#[command(about = "Slack shortcut to Zoho Projects ticket relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Write a default config file (left untouched if one exists).
    Init {
        /// Config file path (default: TICKETRELAY_CONFIG_PATH or ~/.ticketrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the Slack webhook gateway until Ctrl+C or SIGTERM.
    Serve {
        /// Config file path (default: TICKETRELAY_CONFIG_PATH or ~/.ticketrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 8787)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Summarize TEXT with the configured backend and print the title and description.
    Summarize {
        /// Config file path (default: TICKETRELAY_CONFIG_PATH or ~/.ticketrelay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Message text to summarize.
        text: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("ticketrelay {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Init { config }) => run_init(config),
        Some(Commands::Serve { config, port }) => run_serve(config, port).await,
        Some(Commands::Summarize { config, text }) => run_summarize(config, text).await,
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };
    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    if lib::config::write_default_config(&path)? {
        println!("wrote default config to {}", path.display());
    } else {
        println!("config already exists at {}", path.display());
    }
    Ok(())
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

async fn run_summarize(config_path: Option<PathBuf>, text: String) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let http = config.http.build_client()?;
    let generator = lib::relay::build_generator(&config, http);
    let summary = lib::summarize::Summarizer::new(generator)
        .summarize(&text)
        .await;
    println!("TITLE: {}", summary.title);
    println!("DESCRIPTION:\n{}", summary.description);
    Ok(())
}
