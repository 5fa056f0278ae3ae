/// GroupIn gateway: the broadcast relay and the identity registry behind it.
///
/// The relay never decrypts or rewrites envelopes. It assigns each socket a
/// short numeric identity, republishes every envelope to every socket, and
/// publishes the full membership set whenever someone joins or leaves.
pub mod connection;
pub mod dispatcher;
pub mod registry;
pub mod router;

pub use dispatcher::Dispatcher;
pub use registry::{ClockIdentities, IdentityRegistry, IdentitySource, RandomIdentities, RegistryError};
pub use router::router;
