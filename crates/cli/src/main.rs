use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    pesan_config::PesanConfig,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "pesan", about = "Pesan: send WhatsApp messages over HTTP", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file to load instead of the standard locations.
    #[arg(long, global = true, env = "PESAN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway (default).
    Serve {
        #[arg(long)]
        bind: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the effective configuration as TOML and exit.
    CheckConfig,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// An explicit path must load; otherwise fall back to discovery.
fn resolve_config(path: Option<&Path>) -> anyhow::Result<PesanConfig> {
    match path {
        Some(path) => {
            let mut config = pesan_config::load_config(path)?;
            pesan_config::apply_env_overrides(&mut config, |name| std::env::var(name).ok());
            Ok(config)
        },
        None => Ok(pesan_config::discover_and_load()),
    }
}

/// Command-line flags win over file and environment.
fn apply_serve_flags(config: &mut PesanConfig, bind: Option<String>, port: Option<u16>) {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let mut config = resolve_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Serve {
        bind: None,
        port: None,
    }) {
        Commands::Serve { bind, port } => {
            info!(version = env!("CARGO_PKG_VERSION"), "pesan starting");
            apply_serve_flags(&mut config, bind, port);
            match pesan_gateway::start_gateway(config).await? {
                Some(reason) => warn!(%reason, "gateway stopped, exiting for restart"),
                None => info!("gateway stopped"),
            }
            Ok(())
        },
        Commands::CheckConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        },
    }
}
