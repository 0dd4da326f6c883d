use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geminichat::domain::{DEFAULT_MODEL, DEFAULT_SYSTEM_INSTRUCTION};
use geminichat::{
    serve, AskController, Commands, Container, ContainerConfig, HarmBlockThreshold, ModelConfig,
};

#[derive(Parser)]
#[command(name = "geminichat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, default_value = DEFAULT_MODEL)]
    model: String,

    #[arg(long, global = true, default_value = DEFAULT_SYSTEM_INSTRUCTION)]
    system_instruction: String,

    /// Threshold for all four safety categories (none, only_high, medium, low)
    #[arg(long, global = true, default_value = "block_none")]
    safety_threshold: HarmBlockThreshold,

    /// Reply with an offline echo instead of calling the API
    #[arg(long, global = true)]
    mock: bool,

    /// Check the model against the API at startup
    #[arg(long, global = true)]
    verify_model: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn container_config(&self) -> ContainerConfig {
        let model_config = ModelConfig::new(self.model.as_str())
            .with_system_instruction(self.system_instruction.as_str())
            .with_uniform_threshold(self.safety_threshold);

        let mut config = ContainerConfig::new(model_config);
        config.mock = self.mock;
        config.verify_model = self.verify_model;
        if let Commands::Serve {
            session_ttl_secs, ..
        } = &self.command
        {
            config.session_ttl = Duration::from_secs(*session_ttl_secs);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(cli.container_config()).await;

    match cli.command {
        Commands::Serve { port, public, .. } => {
            let ip = if public {
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            } else {
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            };
            info!(
                "Starting chat server for model {} (session ttl {}s)",
                container.model(),
                container.session_ttl().as_secs()
            );
            serve(Arc::new(container), SocketAddr::new(ip, port)).await?;
        }

        Commands::Ask { message } => {
            let mut stdout = std::io::stdout();
            AskController::new(&container).ask(&message, &mut stdout).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["geminichat", "serve"]).unwrap();
        let config = cli.container_config();
        assert_eq!(config.model_config.model(), "gemini-1.5-flash");
        assert_eq!(config.session_ttl, Duration::from_secs(1800));
        assert!(!config.mock);
        assert!(matches!(
            cli.command,
            Commands::Serve {
                port: 7860,
                public: false,
                ..
            }
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "geminichat",
            "ask",
            "hello",
            "--mock",
            "--safety-threshold",
            "medium",
        ])
        .unwrap();
        let config = cli.container_config();
        assert!(config.mock);
        assert!(config
            .model_config
            .safety_settings()
            .iter()
            .all(|s| s.threshold == HarmBlockThreshold::BlockMediumAndAbove));
    }

    #[test]
    fn unknown_threshold_is_rejected() {
        let res = Cli::try_parse_from(["geminichat", "--safety-threshold", "strict", "serve"]);
        assert!(res.is_err());
    }
}
