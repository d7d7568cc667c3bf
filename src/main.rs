use anyhow::Result;
use serenity::{model::gateway::GatewayIntents, Client};
use songbird::SerenityInit;
use tracing::{error, info, warn};

mod audio;
mod bot;
mod config;
mod error;
mod sources;

use crate::bot::RuinaBot;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ruina_bot=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    info!("🎵 Iniciando Ruina Bot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("{}", config.summary());

    // Solo voz y comandos slash
    let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_VOICE_STATES;

    let token = config.discord_token.clone();
    let application_id = config.discord_application_id()?;
    let handler = RuinaBot::new(config);

    let mut client = Client::builder(&token, intents)
        .application_id(application_id)
        .event_handler(handler)
        .register_songbird()
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("No se pudo escuchar Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Señal de shutdown recibida, cerrando...");
        shard_manager.shutdown_all().await;
    });

    info!("🚀 Bot iniciado exitosamente");
    if let Err(why) = client.start().await {
        error!("Error al ejecutar cliente: {:?}", why);
        return Err(why.into());
    }

    Ok(())
}

/// Verifies the external tools songbird inputs rely on.
async fn health_check() -> Result<()> {
    let mut missing = Vec::new();

    for (tool, flag) in [("yt-dlp", "--version"), ("ffmpeg", "-version")] {
        let ok = async_process::Command::new(tool)
            .arg(flag)
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false);
        if !ok {
            missing.push(tool);
        }
    }

    if missing.is_empty() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Missing dependencies: {}", missing.join(", "));
    }
}
