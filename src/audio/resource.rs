use songbird::input::Input;
use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one produced resource. Sink events carry it so the session
/// can tell the in-flight resource apart from ones it already stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A playable payload that can be handed to a sink exactly once.
///
/// There is no `Clone`: playing moves the resource into the sink, so
/// replaying an item means asking its [`ResourceFactory`] for a new one.
pub struct AudioResource {
    id: ResourceId,
    input: Input,
    volume: Option<f32>,
}

impl AudioResource {
    pub fn new(input: impl Into<Input>) -> Self {
        Self {
            id: ResourceId(NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)),
            input: input.into(),
            volume: None,
        }
    }

    /// Fixed inline attenuation, used for library sounds and effects.
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume.clamp(0.0, 2.0));
        self
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Consumes the handle.
    pub fn into_parts(self) -> (ResourceId, Input, Option<f32>) {
        (self.id, self.input, self.volume)
    }
}

impl fmt::Debug for AudioResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioResource")
            .field("id", &self.id)
            .field("volume", &self.volume)
            .finish_non_exhaustive()
    }
}

/// Produces a fresh [`AudioResource`] on every call.
///
/// Factories capture only a description of their source (a path, a URL)
/// and must be safe to call any number of times.
#[derive(Clone)]
pub struct ResourceFactory(Arc<dyn Fn() -> AudioResource + Send + Sync>);

impl ResourceFactory {
    pub fn new<F>(create: F) -> Self
    where
        F: Fn() -> AudioResource + Send + Sync + 'static,
    {
        Self(Arc::new(create))
    }

    pub fn create(&self) -> AudioResource {
        (self.0)()
    }
}

impl fmt::Debug for ResourceFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResourceFactory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    static SILENCE: [u8; 0] = [];

    #[test]
    fn factory_yields_independent_handles() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory = ResourceFactory::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            AudioResource::new(&SILENCE[..])
        });

        let first = factory.create();
        let second = factory.clone().create();

        assert_ne!(first.id(), second.id());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn volume_is_clamped() {
        let (_, _, volume) = AudioResource::new(&SILENCE[..]).with_volume(5.0).into_parts();
        assert_eq!(volume, Some(2.0));

        let (_, _, volume) = AudioResource::new(&SILENCE[..]).with_volume(0.2).into_parts();
        assert_eq!(volume, Some(0.2));
    }
}
