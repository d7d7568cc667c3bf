use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use songbird::{
    tracks::{Track, TrackHandle},
    Call, Event, EventContext, EventHandler as VoiceEventHandler, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::resource::AudioResource;

/// Live handles keyed by track uuid.
#[derive(Debug)]
struct LiveEffects<H> {
    tracks: Vec<(u128, H)>,
}

impl<H> Default for LiveEffects<H> {
    fn default() -> Self {
        Self { tracks: Vec::new() }
    }
}

impl<H> LiveEffects<H> {
    fn insert(&mut self, key: u128, handle: H) {
        self.tracks.push((key, handle));
    }

    /// Returns whether `key` was still live.
    fn forget(&mut self, key: u128) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|(k, _)| *k != key);
        self.tracks.len() != before
    }

    fn drain(&mut self) -> Vec<H> {
        self.tracks.drain(..).map(|(_, handle)| handle).collect()
    }
}

type SharedLive = Arc<SyncMutex<LiveEffects<TrackHandle>>>;

/// Fire-and-forget sound effects.
///
/// Effects play on a guild's call next to the queue track without going
/// through the play queue or the session's state machine. Live effects are
/// tracked so they can all be stopped at once.
#[derive(Clone, Default)]
pub struct SoundEffects {
    live: SharedLive,
}

impl SoundEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plays `resource` once on `call`.
    pub async fn play(&self, call: &Arc<Mutex<Call>>, name: &str, resource: AudioResource) {
        let (id, input, volume) = resource.into_parts();
        let mut track = Track::new(input);
        if let Some(volume) = volume {
            track = track.volume(volume);
        }

        let handle = call.lock().await.play(track);
        info!("🔔 Efecto {} iniciado (recurso {})", name, id);
        self.live.lock().insert(handle.uuid().as_u128(), handle.clone());

        for (event, failed) in [(TrackEvent::End, false), (TrackEvent::Error, true)] {
            let cleanup = EffectCleanup {
                live: self.live.clone(),
                name: name.to_string(),
                failed,
            };
            if let Err(e) = handle.add_event(Event::Track(event), cleanup) {
                error!("Error al agregar event handler: {:?}", e);
            }
        }
    }

    /// Stops every live effect and returns how many were stopped.
    pub fn stop_all(&self) -> usize {
        let handles = self.live.lock().drain();
        let count = handles.len();
        for handle in handles {
            let _ = handle.stop();
        }
        info!("⏹️ {} efectos detenidos", count);
        count
    }
}

/// Drops finished or failed effects from the live set.
struct EffectCleanup {
    live: SharedLive,
    name: String,
    failed: bool,
}

#[async_trait]
impl VoiceEventHandler for EffectCleanup {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            let mut live = self.live.lock();
            for (state, handle) in *tracks {
                if self.failed {
                    error!("❌ Error reproduciendo efecto {}: {:?}", self.name, state.playing);
                }
                live.forget(handle.uuid().as_u128());
            }
        }
        debug!("🔔 Efecto {} terminado", self.name);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn failed_effects_leave_the_live_set() {
        let mut live = LiveEffects::default();
        live.insert(1, "Angela_Laugh");
        live.insert(2, "Roland_Sigh");

        assert!(live.forget(1));
        assert!(!live.forget(1));
        assert_eq!(live.drain(), vec!["Roland_Sigh"]);
        assert!(live.drain().is_empty());
    }
}
