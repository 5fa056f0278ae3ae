use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::info;

use groupin_types::events::ServerEvent;
use groupin_types::models::{Envelope, ParticipantId};

use crate::registry::{IdentityRegistry, RegistryError};

/// Capacity of the fan-out channel. A subscriber that falls further behind
/// than this loses the oldest events.
const BROADCAST_CAPACITY: usize = 1024;

/// Manages all connected clients and broadcasts events.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Broadcast channel for gateway events — all connected clients receive all events
    broadcast_tx: broadcast::Sender<ServerEvent>,

    /// Sole writer of the membership set. Transport handlers go through
    /// `join`/`leave`, never through the registry directly.
    registry: RwLock<IdentityRegistry>,
}

impl Dispatcher {
    pub fn new(registry: IdentityRegistry) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                registry: RwLock::new(registry),
            }),
        }
    }

    /// Subscribe to gateway events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all connected clients.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    /// Republish an envelope, unchanged, to every subscriber.
    pub fn relay(&self, envelope: Envelope) {
        self.broadcast(ServerEvent::Message(envelope));
    }

    /// Issue a new identity and broadcast the full membership set.
    ///
    /// The snapshot is sent while the registry lock is held, so snapshots
    /// reach subscribers in the order the changes happened.
    pub async fn join(&self) -> Result<ParticipantId, RegistryError> {
        let mut registry = self.inner.registry.write().await;
        let id = registry.join()?;
        info!("#{} joined ({} online)", id, registry.len());
        self.broadcast(ServerEvent::UserIds(registry.current_members().to_vec()));
        Ok(id)
    }

    /// Remove an identity and broadcast the full membership set.
    /// Unknown identities are ignored and nothing is broadcast.
    pub async fn leave(&self, id: ParticipantId) {
        let mut registry = self.inner.registry.write().await;
        if registry.leave(id) {
            info!("#{} left ({} online)", id, registry.len());
            self.broadcast(ServerEvent::UserIds(registry.current_members().to_vec()));
        }
    }

    /// Current membership snapshot.
    pub async fn current_members(&self) -> Vec<ParticipantId> {
        self.inner.registry.read().await.current_members().to_vec()
    }
}
