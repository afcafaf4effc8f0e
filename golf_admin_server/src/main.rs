use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use golf_admin_server::commands;
use golf_admin_server::config::read_config;
use golf_admin_server::state::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "golf_admin_server")]
#[command(about = "Back-office API for the golf federation")]
struct Cli {
    #[command(subcommand)]
    command: Option<ServerCommand>,
}

#[derive(Subcommand)]
enum ServerCommand {
    /// Runs the HTTP API (default)
    Serve,
    #[command(flatten)]
    Admin(commands::Command),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = read_config();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.logging_config.clone()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(config).await?;

    match cli.command.unwrap_or(ServerCommand::Serve) {
        ServerCommand::Serve => {
            let app = golf_admin_server::app_with_state(state).await;
            info!(%addr, "Listening");
            axum::Server::bind(&addr)
                .serve(app.into_make_service())
                .await?;
        },
        ServerCommand::Admin(command) => {
            command.run(state).await?;
        }
    }
    Ok(())
}
