/// GroupIn participant: composes envelopes, keeps the local timeline and
/// membership view, and talks to the relay over a WebSocket.
pub mod address;
pub mod config;
pub mod session;
pub mod timeline;
pub mod transport;

pub use session::{Session, SessionError, SessionUpdate};
pub use timeline::{Timeline, TimelineEntry};
