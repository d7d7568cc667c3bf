use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    events::CoreEvent, Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{
    player::SongbirdSink,
    transport::{ConnectionEvent, ConnectionId, EventSender, SessionEvent, VoiceConnection},
};
use crate::error::VoiceError;

/// A songbird call joined to one voice channel.
pub struct SongbirdConnection {
    id: ConnectionId,
    manager: Arc<Songbird>,
    call: Arc<Mutex<Call>>,
}

impl SongbirdConnection {
    /// Joins `channel_id`. Songbird keeps one call per guild, so joining a
    /// new channel in the same guild moves the existing call.
    pub async fn join(
        manager: Arc<Songbird>,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Self, VoiceError> {
        let call = manager.join(guild_id, channel_id).await?;
        info!("🔊 Conectado al canal {} en guild {}", channel_id, guild_id);

        Ok(Self {
            id: ConnectionId::new(guild_id, channel_id),
            manager,
            call,
        })
    }

    pub fn call(&self) -> Arc<Mutex<Call>> {
        self.call.clone()
    }
}

/// Whether `call` is connected and sitting in `channel`.
pub fn serves(call: &Call, channel: ChannelId) -> bool {
    call.current_connection().is_some()
        && call
            .current_channel()
            .is_some_and(|current| current.0.get() == channel.get())
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    type Sink = SongbirdSink;

    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn register(&self, events: EventSender) {
        let mut call = self.call.lock().await;

        for (core, kind) in [
            (CoreEvent::DriverConnect, ConnectionState::Ready),
            (CoreEvent::DriverReconnect, ConnectionState::Ready),
            (CoreEvent::DriverDisconnect, ConnectionState::Disconnected),
        ] {
            call.add_global_event(
                Event::Core(core),
                ConnectionEventForwarder {
                    id: self.id,
                    kind,
                    events: events.clone(),
                },
            );
        }

        if call.current_connection().is_some() {
            let _ = events.send(SessionEvent::Connection(ConnectionEvent::Ready(self.id)));
        }
    }

    async fn subscribe(&self, sink: &SongbirdSink) {
        sink.attach(self.call.clone()).await;
    }

    async fn destroy(&self) {
        let still_ours = {
            let mut call = self.call.lock().await;
            call.remove_all_global_events();
            call.current_channel()
                .is_some_and(|channel| channel.0.get() == self.id.channel.get())
        };

        // The call was moved to another channel by a newer connection.
        if !still_ours {
            debug!("Conexión {} ya reemplazada, sin salir del canal", self.id);
            return;
        }

        match self.manager.remove(self.id.guild).await {
            Ok(()) => info!("👋 Desconectado del canal de voz en guild {}", self.id.guild),
            Err(e) => warn!("Error al salir del canal {}: {:?}", self.id, e),
        }
    }
}

#[derive(Clone, Copy)]
enum ConnectionState {
    Ready,
    Disconnected,
}

struct ConnectionEventForwarder {
    id: ConnectionId,
    kind: ConnectionState,
    events: EventSender,
}

#[async_trait]
impl VoiceEventHandler for ConnectionEventForwarder {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let event = match (self.kind, ctx) {
            (ConnectionState::Ready, _) => ConnectionEvent::Ready(self.id),
            (ConnectionState::Disconnected, EventContext::DriverDisconnect(data)) => {
                warn!("🔌 Driver desconectado en {}: {:?}", self.id, data.reason);
                ConnectionEvent::Disconnected(self.id)
            }
            (ConnectionState::Disconnected, _) => ConnectionEvent::Disconnected(self.id),
        };

        let _ = self.events.send(SessionEvent::Connection(event));
        None
    }
}
