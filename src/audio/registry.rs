use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::{sync::Arc, time::Duration};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use super::{
    connection::SongbirdConnection,
    player::SongbirdSink,
    session::PlaybackSession,
    transport::{EventReceiver, VoiceConnection},
};

pub type SharedSession<C = SongbirdConnection> = Arc<Mutex<PlaybackSession<C>>>;

/// One playback session per guild, created on first use and kept for the
/// process lifetime.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, SharedSession>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_timeout,
        }
    }

    /// Returns the guild's session, spawning it and its event loop if it
    /// does not exist yet.
    pub fn session(&self, guild_id: GuildId) -> SharedSession {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                let (tx, rx) = mpsc::unbounded_channel();
                let sink = SongbirdSink::new(tx.clone());
                let session = Arc::new(Mutex::new(PlaybackSession::new(
                    sink,
                    tx,
                    self.idle_timeout,
                )));
                tokio::spawn(drive(guild_id, session.clone(), rx));
                info!("🎛️ Sesión de reproducción creada para guild {}", guild_id);
                session
            })
            .clone()
    }

    /// Returns the guild's session only if one was already created.
    pub fn existing(&self, guild_id: GuildId) -> Option<SharedSession> {
        self.sessions.get(&guild_id).map(|s| s.clone())
    }
}

/// Feeds sink, connection and timer events into the session one at a time.
pub async fn drive<C: VoiceConnection>(
    guild_id: GuildId,
    session: SharedSession<C>,
    mut events: EventReceiver,
) {
    while let Some(event) = events.recv().await {
        debug!("📨 Evento de sesión en guild {}: {:?}", guild_id, event);
        session.lock().await.handle_event(event).await;
    }
    debug!("Bucle de eventos terminado para guild {}", guild_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        testing::{conn, Journal, Op, Recorder, TestConnection},
        transport::{SessionEvent, SinkEvent},
    };
    use pretty_assertions::assert_eq;

    #[tokio::test(start_paused = true)]
    async fn event_loop_advances_queue_and_disconnects() {
        let (tx, rx) = mpsc::unbounded_channel();
        let journal = Journal::default();
        let session: SharedSession<TestConnection> = Arc::new(Mutex::new(PlaybackSession::new(
            journal.sink(),
            tx.clone(),
            Duration::from_secs(60),
        )));
        let guild = GuildId::new(1);
        tokio::spawn(drive(guild, session.clone(), rx));

        let a = conn(1, 10);
        let track = Recorder::new();
        {
            let mut s = session.lock().await;
            s.start_connection(journal.connection(a)).await;
            s.start_playing("Track1", track.factory()).await;
        }

        let finished = track.last_id().unwrap();
        tx.send(SessionEvent::Sink(SinkEvent::Idle(finished))).unwrap();
        tokio::time::sleep(Duration::from_secs(61)).await;

        let s = session.lock().await;
        assert!(s.queue().is_empty());
        assert!(!s.is_connected());
        assert_eq!(journal.ops().last(), Some(&Op::Destroy(a)));
    }

    #[tokio::test]
    async fn sessions_are_per_guild() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let first = registry.session(GuildId::new(1));
        let again = registry.session(GuildId::new(1));
        let other = registry.session(GuildId::new(2));

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        let existing = registry.existing(GuildId::new(2)).unwrap();
        assert!(Arc::ptr_eq(&existing, &other));
        assert!(registry.existing(GuildId::new(3)).is_none());
    }
}
