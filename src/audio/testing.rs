//! In-memory sink and connection that record every call in a shared
//! journal, so session behavior can be checked without a voice gateway.

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use super::{
    resource::{AudioResource, ResourceFactory, ResourceId},
    transport::{AudioSink, ConnectionId, EventSender, VoiceConnection},
};

static SILENCE: [u8; 0] = [];

#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Play(ResourceId),
    Stop,
    Detach,
    Register(ConnectionId),
    Subscribe(ConnectionId),
    Destroy(ConnectionId),
}

#[derive(Default)]
struct JournalState {
    ops: Vec<Op>,
    attached: Option<ConnectionId>,
}

#[derive(Clone, Default)]
pub struct Journal {
    state: Arc<Mutex<JournalState>>,
}

impl Journal {
    pub fn sink(&self) -> TestSink {
        TestSink {
            journal: self.clone(),
        }
    }

    pub fn connection(&self, id: ConnectionId) -> TestConnection {
        TestConnection {
            id,
            journal: self.clone(),
        }
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.lock().ops.clone()
    }

    pub fn played(&self) -> Vec<ResourceId> {
        self.state
            .lock()
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Play(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Connection the sink is currently subscribed to.
    pub fn attached(&self) -> Option<ConnectionId> {
        self.state.lock().attached
    }

    pub fn clear(&self) {
        self.state.lock().ops.clear();
    }

    fn record(&self, op: Op) {
        self.state.lock().ops.push(op);
    }
}

pub struct TestSink {
    journal: Journal,
}

#[async_trait]
impl AudioSink for TestSink {
    async fn play(&self, resource: AudioResource) {
        self.journal.record(Op::Play(resource.id()));
    }

    async fn stop(&self) {
        self.journal.record(Op::Stop);
    }

    async fn detach(&self) {
        self.journal.state.lock().attached = None;
        self.journal.record(Op::Detach);
    }
}

pub struct TestConnection {
    id: ConnectionId,
    journal: Journal,
}

#[async_trait]
impl VoiceConnection for TestConnection {
    type Sink = TestSink;

    fn id(&self) -> ConnectionId {
        self.id
    }

    async fn register(&self, _events: EventSender) {
        self.journal.record(Op::Register(self.id));
    }

    async fn subscribe(&self, sink: &TestSink) {
        let mut state = sink.journal.state.lock();
        assert!(
            state.attached.is_none(),
            "sink subscribed to two connections at once"
        );
        state.attached = Some(self.id);
        state.ops.push(Op::Subscribe(self.id));
    }

    async fn destroy(&self) {
        self.journal.record(Op::Destroy(self.id));
    }
}

/// Factory that counts its invocations and remembers the last handle.
#[derive(Clone, Default)]
pub struct Recorder {
    calls: Arc<AtomicUsize>,
    last: Arc<Mutex<Option<ResourceId>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> ResourceFactory {
        let recorder = self.clone();
        ResourceFactory::new(move || {
            let resource = AudioResource::new(&SILENCE[..]);
            recorder.calls.fetch_add(1, Ordering::SeqCst);
            *recorder.last.lock() = Some(resource.id());
            resource
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_id(&self) -> Option<ResourceId> {
        *self.last.lock()
    }
}

pub fn conn(guild: u64, channel: u64) -> ConnectionId {
    ConnectionId::new(GuildId::new(guild), ChannelId::new(channel))
}
