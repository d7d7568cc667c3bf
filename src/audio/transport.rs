use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::fmt;
use tokio::sync::mpsc;

use super::resource::{AudioResource, ResourceId};

/// A voice connection is identified by the channel it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    pub guild: GuildId,
    pub channel: ChannelId,
}

impl ConnectionId {
    pub fn new(guild: GuildId, channel: ChannelId) -> Self {
        Self { guild, channel }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.guild, self.channel)
    }
}

/// Status reported by the output sink for a given resource.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Buffering(ResourceId),
    Playing(ResourceId),
    Paused(ResourceId),
    /// Playback paused because no connection is attached.
    AutoPaused(ResourceId),
    /// The resource finished or was stopped.
    Idle(ResourceId),
    Error { resource: ResourceId, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionEvent {
    Ready(ConnectionId),
    Disconnected(ConnectionId),
}

/// Everything a session reacts to besides direct calls from commands.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Sink(SinkEvent),
    Connection(ConnectionEvent),
    /// The idle-disconnect timer of the given generation elapsed.
    IdleTimeout(u64),
}

pub type EventSender = mpsc::UnboundedSender<SessionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEvent>;

/// The long-lived audio output driver of a session.
#[async_trait]
pub trait AudioSink: Send + Sync + 'static {
    /// Starts streaming `resource`, replacing whatever was playing.
    async fn play(&self, resource: AudioResource);

    /// Stops the current resource, if any.
    async fn stop(&self);

    /// Forgets the attached connection. Playback in flight is paused, not
    /// stopped, until a connection subscribes again.
    async fn detach(&self);
}

/// A live link to one voice channel.
#[async_trait]
pub trait VoiceConnection: Send + Sync + 'static {
    type Sink: AudioSink;

    fn id(&self) -> ConnectionId;

    /// Routes this connection's `Ready`/`Disconnected` transitions to
    /// `events`. A connection that is already up reports `Ready` at once.
    async fn register(&self, events: EventSender);

    /// Attaches the sink so its output reaches this channel.
    async fn subscribe(&self, sink: &Self::Sink);

    async fn destroy(&self);
}
