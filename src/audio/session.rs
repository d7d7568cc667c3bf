use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{
    queue::{AudioItem, PlayQueue},
    resource::{ResourceFactory, ResourceId},
    timer::DisconnectTimer,
    transport::{
        AudioSink, ConnectionEvent, ConnectionId, EventSender, SessionEvent, SinkEvent,
        VoiceConnection,
    },
};

/// Observable state of the session's sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Idle,
    Buffering,
    Playing,
    Paused,
    AutoPaused,
}

/// Voice playback state of one guild: the connection, the queue, the
/// sink driving the queue head and the idle-disconnect timer.
///
/// All mutation goes through `&mut self`, either from command handlers or
/// from [`PlaybackSession::handle_event`], so transitions never
/// interleave.
pub struct PlaybackSession<C: VoiceConnection> {
    connection: Option<C>,
    sink: C::Sink,
    queue: PlayQueue,
    status: PlayerStatus,
    in_flight: Option<ResourceId>,
    timer: DisconnectTimer,
    events: EventSender,
}

impl<C: VoiceConnection> PlaybackSession<C> {
    pub fn new(sink: C::Sink, events: EventSender, idle_timeout: Duration) -> Self {
        Self {
            connection: None,
            sink,
            queue: PlayQueue::new(),
            status: PlayerStatus::Idle,
            in_flight: None,
            timer: DisconnectTimer::new(idle_timeout),
            events,
        }
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.connection.as_ref().map(VoiceConnection::id)
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Resource currently handed to the sink.
    pub fn in_flight(&self) -> Option<ResourceId> {
        self.in_flight
    }

    pub fn idle_timer_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    /// Live queue access for skip/loop style edits. Call
    /// [`PlaybackSession::play_queued`] afterwards if the head changed.
    pub fn queue_mut(&mut self) -> &mut PlayQueue {
        &mut self.queue
    }

    /// Adopts `connection` as the session's only connection.
    ///
    /// A different connection already in place is destroyed first. The sink
    /// is attached once the new connection reports ready.
    pub async fn start_connection(&mut self, connection: C) {
        let id = connection.id();
        if self.connection_id() == Some(id) {
            debug!("🔊 Conexión {} ya activa", id);
            return;
        }

        if let Some(previous) = self.connection.take() {
            info!("🔌 Destruyendo conexión existente {}", previous.id());
            self.sink.detach().await;
            previous.destroy().await;
        }

        connection.register(self.events.clone()).await;
        self.connection = Some(connection);
        info!("🔊 Conexión {} registrada", id);

        if self.in_flight.is_none() && self.queue.is_empty() {
            self.timer.refresh(&self.events);
        }
    }

    /// Replaces the whole queue with a single item and plays it now.
    pub async fn start_playing(&mut self, name: impl Into<String>, factory: ResourceFactory) {
        self.queue.clear();
        self.queue.push(AudioItem::new(name, factory));
        self.play_head().await;
    }

    /// Appends an item without touching what is audible.
    pub fn enqueue_audio(&mut self, name: impl Into<String>, factory: ResourceFactory) {
        self.queue.push(AudioItem::new(name, factory));
    }

    /// Empties the queue and silences the sink.
    pub async fn stop_playing(&mut self) {
        self.queue.clear();
        self.halt().await;
        info!("⏹️ Reproducción detenida");
        if self.connection.is_some() {
            self.timer.refresh(&self.events);
        }
    }

    /// Stops the sink and restarts it on the current head.
    pub async fn play_queued(&mut self) {
        self.halt().await;
        if self.queue.is_empty() {
            warn!("📭 Cola vacía, nada que reproducir");
            self.timer.refresh(&self.events);
            return;
        }
        self.play_head().await;
    }

    /// Drops the head and moves on to the next item. Returns the name of
    /// the skipped item.
    pub async fn skip(&mut self) -> Option<String> {
        let skipped = self.queue.shift()?;
        info!("⏭️ Saltando {}", skipped.name());
        self.play_queued().await;
        Some(skipped.name().to_string())
    }

    /// Toggles looping on the head. Returns its name and the new flag.
    pub fn toggle_loop(&mut self) -> Option<(String, bool)> {
        let head = self.queue.head_mut()?;
        let looping = head.toggle_loop();
        info!(
            "{} {}",
            if looping { "🔂 Repitiendo" } else { "➡️ Ya no se repite" },
            head.name()
        );
        Some((head.name().to_string(), looping))
    }

    /// Dispatches one event from the sink, the connection or the timer.
    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Sink(event) => self.on_sink_event(event).await,
            SessionEvent::Connection(event) => self.on_connection_event(event).await,
            SessionEvent::IdleTimeout(generation) => self.on_idle_timeout(generation).await,
        }
    }

    async fn on_sink_event(&mut self, event: SinkEvent) {
        match event {
            SinkEvent::Idle(resource) => self.on_idle(resource).await,
            SinkEvent::Error { resource, message } => {
                error!("❌ Error del reproductor en {}: {}", resource, message);
                if self.in_flight == Some(resource) {
                    self.in_flight = None;
                    self.status = PlayerStatus::Idle;
                }
            }
            SinkEvent::Buffering(resource) => {
                self.observe(resource, PlayerStatus::Buffering, "cargando")
            }
            SinkEvent::Playing(resource) => {
                self.observe(resource, PlayerStatus::Playing, "reproduciendo")
            }
            SinkEvent::Paused(resource) => self.observe(resource, PlayerStatus::Paused, "en pausa"),
            SinkEvent::AutoPaused(resource) => {
                self.observe(resource, PlayerStatus::AutoPaused, "en pausa automática")
            }
        }
    }

    fn observe(&mut self, resource: ResourceId, status: PlayerStatus, label: &str) {
        if self.in_flight == Some(resource) {
            debug!("🎧 Reproductor {}", label);
            self.status = status;
        }
    }

    /// Idle transition: advance or loop the head, then feed the sink again.
    async fn on_idle(&mut self, finished: ResourceId) {
        if self.in_flight != Some(finished) {
            debug!("Evento idle obsoleto para {}", finished);
            return;
        }
        self.in_flight = None;
        self.status = PlayerStatus::Idle;

        let Some(head) = self.queue.head_mut() else {
            debug!("📭 Cola vacía al quedar inactivo");
            self.timer.refresh(&self.events);
            return;
        };

        if head.is_looping() {
            head.rebind();
        } else {
            self.queue.shift();
            self.timer.refresh(&self.events);
        }

        self.sink.stop().await;

        if self.queue.is_empty() {
            debug!("🎧 El reproductor no tiene nada que reproducir");
        } else {
            self.play_head().await;
        }
    }

    async fn on_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Ready(id) => {
                match &self.connection {
                    Some(connection) if connection.id() == id => {
                        debug!("✅ Conexión {} lista", id);
                        connection.subscribe(&self.sink).await;
                    }
                    _ => {
                        debug!("Evento ready obsoleto para {}", id);
                        return;
                    }
                }

                // A disconnect halted the sink; pick the head back up.
                if self.in_flight.is_none() {
                    if self.queue.is_empty() {
                        self.timer.refresh(&self.events);
                    } else {
                        info!("▶️ Reanudando la cola tras reconectar {}", id);
                        self.play_head().await;
                    }
                }
            }
            ConnectionEvent::Disconnected(id) => {
                if self.connection_id() == Some(id) {
                    warn!("🔌 Conexión {} desconectada", id);
                    self.halt().await;
                    self.sink.detach().await;
                } else {
                    debug!("Evento de desconexión obsoleto para {}", id);
                }
            }
        }
    }

    async fn on_idle_timeout(&mut self, generation: u64) {
        if !self.timer.fire(generation) {
            debug!("Temporizador de inactividad obsoleto ({})", generation);
            return;
        }
        if let Some(connection) = self.connection.take() {
            info!(
                "👋 Desconectando {} tras {} de inactividad",
                connection.id(),
                humantime::format_duration(self.timer.threshold())
            );
            self.sink.detach().await;
            connection.destroy().await;
        }
    }

    /// Feeds the head's resource to the sink.
    async fn play_head(&mut self) {
        let queued = self.queue.len();
        let Some(head) = self.queue.head_mut() else {
            return;
        };
        let resource = head.take_resource();
        info!(
            "🎵 Reproduciendo {} ({} en cola) recurso {}",
            head.name(),
            queued,
            resource.id()
        );

        self.timer.cancel();
        self.in_flight = Some(resource.id());
        self.status = PlayerStatus::Buffering;
        self.sink.play(resource).await;
    }

    async fn halt(&mut self) {
        self.sink.stop().await;
        self.in_flight = None;
        self.status = PlayerStatus::Idle;
    }
}
