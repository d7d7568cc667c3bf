use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use songbird::{
    tracks::{Track, TrackHandle},
    Call, Event, EventContext, EventHandler as VoiceEventHandler, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use super::{
    resource::{AudioResource, ResourceId},
    transport::{AudioSink, EventSender, SessionEvent, SinkEvent},
};

#[derive(Default)]
struct SinkState {
    call: Option<Arc<Mutex<Call>>>,
    current: Option<(ResourceId, TrackHandle)>,
    /// Resource handed over while no call was attached.
    pending: Option<AudioResource>,
}

/// Songbird-backed output sink of one session.
///
/// Owns at most one queue track at a time on the attached call. With no
/// call attached, playback pauses (`AutoPaused`) and resumes as soon as a
/// connection subscribes again.
pub struct SongbirdSink {
    events: EventSender,
    state: SyncMutex<SinkState>,
}

impl SongbirdSink {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            state: SyncMutex::new(SinkState::default()),
        }
    }

    /// Binds the sink to `call`, resuming a paused or pending resource.
    pub async fn attach(&self, call: Arc<Mutex<Call>>) {
        let (pending, paused) = {
            let mut state = self.state.lock();
            state.call = Some(call);
            (
                state.pending.take(),
                state.current.as_ref().map(|(_, handle)| handle.clone()),
            )
        };

        if let Some(handle) = paused {
            debug!("▶️ Reanudando pista tras reconectar");
            if let Err(e) = handle.play() {
                warn!("No se pudo reanudar la pista: {:?}", e);
            }
        }

        if let Some(resource) = pending {
            self.play(resource).await;
        }
    }

    fn emit(&self, event: SinkEvent) {
        let _ = self.events.send(SessionEvent::Sink(event));
    }
}

#[async_trait]
impl AudioSink for SongbirdSink {
    async fn play(&self, resource: AudioResource) {
        let call = self.state.lock().call.clone();
        let Some(call) = call else {
            let id = resource.id();
            let previous = {
                let mut state = self.state.lock();
                state.pending = Some(resource);
                state.current.take()
            };
            if let Some((_, handle)) = previous {
                let _ = handle.stop();
            }
            debug!("⏸️ Sin conexión suscrita, recurso {} en espera", id);
            self.emit(SinkEvent::AutoPaused(id));
            return;
        };

        let previous = self.state.lock().current.take();
        if let Some((_, handle)) = previous {
            let _ = handle.stop();
        }

        let (id, input, volume) = resource.into_parts();
        let mut track = Track::new(input);
        if let Some(volume) = volume {
            track = track.volume(volume);
        }

        let handle = {
            let mut call = call.lock().await;
            call.play(track)
        };

        for event in [
            TrackEvent::Preparing,
            TrackEvent::Play,
            TrackEvent::Pause,
            TrackEvent::End,
            TrackEvent::Error,
        ] {
            let forwarder = TrackEventForwarder {
                resource: id,
                event,
                events: self.events.clone(),
            };
            if let Err(e) = handle.add_event(Event::Track(event), forwarder) {
                error!("Error al agregar event handler: {:?}", e);
            }
        }

        self.state.lock().current = Some((id, handle));
    }

    async fn stop(&self) {
        let current = {
            let mut state = self.state.lock();
            state.pending = None;
            state.current.take()
        };
        if let Some((id, handle)) = current {
            debug!("⏹️ Deteniendo recurso {}", id);
            // Fails harmlessly when the track already ended.
            let _ = handle.stop();
        }
    }

    async fn detach(&self) {
        let current = {
            let mut state = self.state.lock();
            state.call = None;
            state.current.as_ref().map(|(id, handle)| (*id, handle.clone()))
        };
        if let Some((id, handle)) = current {
            if handle.pause().is_ok() {
                self.emit(SinkEvent::AutoPaused(id));
            }
        }
    }
}

/// Translates songbird track events into [`SinkEvent`]s for one resource.
struct TrackEventForwarder {
    resource: ResourceId,
    event: TrackEvent,
    events: EventSender,
}

#[async_trait]
impl VoiceEventHandler for TrackEventForwarder {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let resource = self.resource;
        let event = match self.event {
            TrackEvent::Preparing => SinkEvent::Buffering(resource),
            TrackEvent::Play => SinkEvent::Playing(resource),
            TrackEvent::Pause => SinkEvent::Paused(resource),
            TrackEvent::End => SinkEvent::Idle(resource),
            TrackEvent::Error => {
                let message = match ctx {
                    EventContext::Track(tracks) => tracks
                        .iter()
                        .map(|(state, _)| format!("{:?}", state.playing))
                        .collect::<Vec<_>>()
                        .join(", "),
                    _ => "error desconocido".to_string(),
                };
                SinkEvent::Error { resource, message }
            }
            _ => return None,
        };

        let _ = self.events.send(SessionEvent::Sink(event));
        None
    }
}
