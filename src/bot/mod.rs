//! # Bot Module
//!
//! Discord-facing half of the bot: slash command registration, the
//! interaction dispatcher and the glue between commands and each guild's
//! playback session.
//!
//! The [`RuinaBot`] struct implements Serenity's [`EventHandler`] and owns:
//!
//! - the per-guild playback sessions ([`SessionRegistry`])
//! - the one-shot effect registry ([`SoundEffects`])
//! - the local sound library and the HTTP client used by audio inputs

use anyhow::Result;
use serenity::{
    all::{ChannelId, Context, EventHandler, GuildId, Interaction, Ready, VoiceState},
    async_trait,
};
use songbird::Call;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub mod commands;
pub mod handlers;
pub mod picker;

use crate::{
    audio::{connection::{self, SongbirdConnection}, effects::SoundEffects, registry::SessionRegistry},
    config::Config,
    error::VoiceError,
    sources::SoundLibrary,
};

pub struct RuinaBot {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub effects: SoundEffects,
    pub sounds: SoundLibrary,
    /// Shared by yt-dlp and HTTP inputs.
    pub http: reqwest::Client,
}

impl RuinaBot {
    pub fn new(config: Config) -> Self {
        let sessions = Arc::new(SessionRegistry::new(config.idle_disconnect));
        let sounds = SoundLibrary::new(config.sounds_dir.clone());

        Self {
            config: Arc::new(config),
            sessions,
            effects: SoundEffects::new(),
            sounds,
            http: reqwest::Client::new(),
        }
    }

    /// Registers slash commands globally, or for a single guild when
    /// `GUILD_ID` is configured.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);
                if !ctx.cache.guilds().contains(&guild_id) {
                    warn!("⚠️ El bot no está en la guild especificada: {}", guild_id);
                    return Ok(());
                }

                commands::register_guild_commands(ctx, guild_id).await?;
                info!("✅ Comandos de guild registrados para: {}", guild_id);
            }
            None => {
                commands::register_global_commands(ctx).await?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }

    /// Joins `channel_id` and hands the connection to the guild's session.
    ///
    /// When the session is already connected to that channel and the call
    /// is still live there, the existing call is reused without rejoining.
    pub async fn connect(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<Mutex<Call>>, VoiceError> {
        let manager = songbird::get(ctx)
            .await
            .ok_or(VoiceError::SongbirdMissing)?;

        let session = self.sessions.session(guild_id);
        let mut session = session.lock().await;

        let target = crate::audio::transport::ConnectionId::new(guild_id, channel_id);
        if session.connection_id() == Some(target) {
            if let Some(call) = manager.get(guild_id) {
                if connection::serves(&*call.lock().await, channel_id) {
                    debug!("🔊 Reutilizando conexión {}", target);
                    return Ok(call);
                }
                // Kicked or dropped: rejoin, the driver reports Ready again.
                info!("🔁 Conexión {} caída, reconectando", target);
            }
        }

        let connection = SongbirdConnection::join(manager, guild_id, channel_id).await?;
        let call = connection.call();
        session.start_connection(connection).await;
        Ok(call)
    }
}

#[async_trait]
impl EventHandler for RuinaBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }
    }

    /// Runs slash commands. Failures are logged and reported back to the
    /// caller as an ephemeral message.
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            if let Err(e) = handlers::handle_command(&ctx, &command, self).await {
                error!("Error manejando comando /{}: {:?}", command.data.name, e);
                handlers::report_error(&ctx, &command, &e).await;
            }
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        if new.user_id != ctx.cache.current_user().id {
            return;
        }

        let Some(guild_id) = new.guild_id else {
            return;
        };

        match (old.and_then(|state| state.channel_id), new.channel_id) {
            (Some(_), None) => info!("🔌 Bot desconectado en guild {}", guild_id),
            (Some(from), Some(to)) if from != to => {
                info!("🔀 Bot movido de {} a {} en guild {}", from, to, guild_id)
            }
            (None, Some(to)) => debug!("🔊 Bot entró a {} en guild {}", to, guild_id),
            _ => {}
        }
    }
}
