//! Moovie Core Engine
//!
//! Handles caption parsing and synchronization, playback state derivation,
//! and the session wiring that connects them to a media host.

pub mod captions;
pub mod events;
pub mod playback;
pub mod session;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
