use anyhow::{Context, Result, anyhow};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use groupin_types::events::{ClientCommand, ServerEvent};
use groupin_types::models::Envelope;

/// Outgoing half of a relay connection. Sending only queues the envelope,
/// so composing never waits on the network.
#[derive(Clone)]
pub struct RelaySender {
    tx: mpsc::UnboundedSender<ClientCommand>,
}

impl RelaySender {
    pub fn send(&self, envelope: Envelope) -> Result<()> {
        self.tx
            .send(ClientCommand::Message(envelope))
            .map_err(|_| anyhow!("relay connection closed"))
    }
}

/// Connect to the relay at `url`. Returns the sender and a stream of
/// server events in arrival order; the stream ends when the socket closes.
pub async fn connect(url: &str) -> Result<(RelaySender, mpsc::UnboundedReceiver<ServerEvent>)> {
    let (ws, _) = connect_async(url)
        .await
        .with_context(|| format!("connecting to {url}"))?;
    info!("Connected to relay at {}", url);

    let (mut sink, mut stream) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ClientCommand>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<ServerEvent>();

    tokio::spawn(async move {
        while let Some(cmd) = out_rx.recv().await {
            let text = match serde_json::to_string(&cmd) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to serialize command: {}", e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::text(text)).await {
                warn!("Relay send failed: {}", e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    tokio::spawn(async move {
        while let Some(msg) = stream.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("Relay receive failed: {}", e);
                    break;
                }
            };
            match msg {
                Message::Text(text) => match serde_json::from_str::<ServerEvent>(text.as_str()) {
                    Ok(event) => {
                        if in_tx.send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring malformed event: {}", e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
        info!("Relay connection closed");
    });

    Ok((RelaySender { tx: out_tx }, in_rx))
}
