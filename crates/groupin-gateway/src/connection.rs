use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use groupin_types::events::{ClientCommand, ServerEvent};
use groupin_types::models::ParticipantId;

use crate::dispatcher::Dispatcher;

/// Server sends a Ping every `heartbeat`; after 2 consecutive missed Pongs
/// the connection is dropped.
const MAX_MISSED_HEARTBEATS: u8 = 2;

/// Handle a single WebSocket connection for its whole lifetime:
/// join, relay both ways, leave.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, heartbeat: Duration) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before joining so the joiner sees its own membership snapshot.
    let mut broadcast_rx = dispatcher.subscribe();

    let participant_id = match dispatcher.join().await {
        Ok(id) => id,
        Err(e) => {
            warn!("Rejecting connection: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    info!("#{} connected to gateway", participant_id);

    // Tell the joiner who it is before anything queued on the broadcast.
    let ready = ServerEvent::Ready { participant_id };
    if !send_event(&mut sender, &ready).await {
        dispatcher.leave(participant_id).await;
        return;
    }

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward broadcasts -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(heartbeat);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = broadcast_rx.recv() => {
                    let event = match result {
                        Ok(event) => event,
                        Err(RecvError::Lagged(n)) => {
                            warn!("#{} lagged by {} events", participant_id, n);
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };

                    if !send_event(&mut sender, &event).await {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= MAX_MISSED_HEARTBEATS {
                            warn!("#{} heartbeat timeout (missed {} pongs), dropping connection", participant_id, missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let dispatcher_recv = dispatcher.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientCommand>(&text) {
                    Ok(cmd) => handle_command(&dispatcher_recv, participant_id, cmd),
                    Err(e) => {
                        warn!(
                            "#{} bad command: {} -- raw: {}",
                            participant_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.leave(participant_id).await;
    info!("#{} disconnected from gateway", participant_id);
}

fn handle_command(dispatcher: &Dispatcher, participant_id: ParticipantId, cmd: ClientCommand) {
    match cmd {
        ClientCommand::Message(envelope) => {
            // Identity claims are not authenticated; the envelope is relayed as sent.
            if envelope.sender_identity != participant_id {
                warn!(
                    "#{} sent an envelope claiming sender #{}",
                    participant_id, envelope.sender_identity
                );
            }
            info!(
                "Message received from #{} ({}, encrypted: {}, {} recipients)",
                participant_id,
                envelope.display_name,
                envelope.encrypted,
                envelope.recipients().len()
            );
            debug!("#{} body: {:?}", participant_id, envelope.body);
            dispatcher.relay(envelope);
        }
    }
}

/// Serialize and send one event. Returns false once the socket is gone.
async fn send_event(sender: &mut SplitSink<WebSocket, Message>, event: &ServerEvent) -> bool {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            return true;
        }
    };
    sender.send(Message::Text(text.into())).await.is_ok()
}
