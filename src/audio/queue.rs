use std::collections::VecDeque;
use tracing::{debug, info};

use super::resource::{AudioResource, ResourceFactory};

/// One playable entry of the queue.
#[derive(Debug)]
pub struct AudioItem {
    name: String,
    looping: bool,
    resource: Option<AudioResource>,
    factory: ResourceFactory,
}

impl AudioItem {
    /// Builds the item and binds its first resource right away.
    pub fn new(name: impl Into<String>, factory: ResourceFactory) -> Self {
        let resource = factory.create();
        Self {
            name: name.into(),
            looping: false,
            resource: Some(resource),
            factory,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Flips the loop flag and returns the new value.
    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    /// Whether a bound resource is still waiting to be played.
    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    /// Replaces the bound resource with a freshly produced one.
    pub fn rebind(&mut self) {
        self.resource = Some(self.factory.create());
    }

    /// Hands out the bound resource, producing a new one if it was
    /// already consumed.
    pub fn take_resource(&mut self) -> AudioResource {
        match self.resource.take() {
            Some(resource) => resource,
            None => {
                debug!("♻️ Regenerando recurso para {}", self.name);
                self.factory.create()
            }
        }
    }
}

/// Ordered playback queue. The head is the item currently playing (or the
/// one that played most recently); everything behind it is pending.
#[derive(Debug, Default)]
pub struct PlayQueue {
    items: VecDeque<AudioItem>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: AudioItem) {
        info!("➕ Agregado a la cola: {}", item.name());
        self.items.push_back(item);
    }

    /// Removes the head.
    pub fn shift(&mut self) -> Option<AudioItem> {
        self.items.pop_front()
    }

    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            info!("🗑️ Cola limpiada ({} elementos)", self.items.len());
        }
        self.items.clear();
    }

    pub fn head(&self) -> Option<&AudioItem> {
        self.items.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut AudioItem> {
        self.items.front_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(AudioItem::name).collect()
    }

    /// One line per entry, `**1:** name (looping)`.
    pub fn listing(&self) -> Vec<String> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                format!(
                    "**{}:** {}{}",
                    i + 1,
                    item.name(),
                    if item.is_looping() { " (looping)" } else { "" }
                )
            })
            .collect()
    }
}
