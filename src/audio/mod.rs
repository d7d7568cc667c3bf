//! # Audio Module
//!
//! Voice playback for the bot: one playback session per guild, each made
//! of a connection, a play queue, a sink and an idle-disconnect timer.
//!
//! ## Architecture
//!
//! ### [`session`] - Playback Session
//! - Owns the guild's only voice connection and replaces it on demand
//! - Drives the sink through `Idle`/`Buffering`/`Playing`/`Paused`/`AutoPaused`
//! - Advances or loops the queue head when the sink goes idle
//!
//! ### [`queue`] - Play Queue
//! - Ordered audio items; the head is what the sink is consuming
//! - Per-item loop flag, toggled from commands
//!
//! ### [`resource`] - Resources and factories
//! - Single-use playable handles, consumed by the sink
//! - Factories that rebuild a handle for loops and restarts
//!
//! ### [`player`] / [`connection`] - Songbird adapters
//! - [`player::SongbirdSink`] plays the queue head on the guild's call
//! - [`connection::SongbirdConnection`] reports `Ready`/`Disconnected`
//!
//! ### [`effects`] - One-shot sound effects
//! - Fire-and-forget tracks outside the queue
//!
//! ## Event flow
//!
//! Songbird track and driver events, as well as idle-timer expirations,
//! are forwarded as [`transport::SessionEvent`]s into a per-guild channel.
//! [`registry::drive`] applies them to the session one at a time, so queue
//! advancement never races with commands.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! # use ruina_bot::audio::{registry::SessionRegistry, resource::{AudioResource, ResourceFactory}};
//! # use serenity::all::GuildId;
//! # async fn example(registry: &SessionRegistry) {
//! let session = registry.session(GuildId::new(123456789));
//! let mut session = session.lock().await;
//!
//! session
//!     .start_playing("intro", ResourceFactory::new(|| {
//!         AudioResource::new(songbird::input::File::new("assets/sounds/intro.ogg"))
//!     }))
//!     .await;
//! session.toggle_loop();
//! # }
//! ```

pub mod connection;
pub mod effects;
pub mod player;
pub mod queue;
pub mod registry;
pub mod resource;
pub mod session;
pub mod timer;
pub mod transport;

#[cfg(test)]
pub mod testing;
