use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use warp::ws::WebSocket;

use crate::registry::{Connection, ConnectionRegistry};
use crate::relay::{Relay, Session};
use crate::store::{MemoryStore, MessageStore};

/// Shared state handed to every route.
#[derive(Clone)]
pub struct Server {
    relay: Relay,
    store: Arc<dyn MessageStore>,
}

impl Server {
    pub fn new(registry: ConnectionRegistry, store: Arc<dyn MessageStore>) -> Self {
        Server {
            relay: Relay::new(registry),
            store,
        }
    }

    /// Fresh registry and an in-memory store.
    pub fn in_memory() -> Self {
        Self::new(ConnectionRegistry::new(), Arc::new(MemoryStore::new()))
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn store(&self) -> Arc<dyn MessageStore> {
        Arc::clone(&self.store)
    }

    /// Drives one WebSocket until it closes. Frames from this socket are
    /// handled strictly in arrival order.
    pub async fn handle_connection(&self, ws: WebSocket) {
        let (mut ws_tx, mut ws_rx) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = Session::new(Connection::new(tx));
        let connection_id = session.connection().id();
        log::info!("Connection {} opened", connection_id);

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = ws_tx.send(message).await {
                    log::error!("Failed to send WebSocket message on {}: {}", connection_id, e);
                    break;
                }
            }
        });

        while let Some(result) = ws_rx.next().await {
            match result {
                Ok(msg) => {
                    if msg.is_close() {
                        break;
                    }
                    if let Ok(text) = msg.to_str() {
                        self.relay.on_text(&mut session, text).await;
                    }
                }
                Err(e) => {
                    self.relay.on_error(&session, &e);
                    break;
                }
            }
        }

        // The writer task exits once the last sender handle is dropped.
        self.relay.on_close(&session).await;
        log::info!("Connection {} closed", connection_id);
    }
}
