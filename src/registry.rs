use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;
use warp::ws::Message;

use crate::messages::ServerMessage;

#[derive(Clone, Debug)]
pub struct Connection {
    id: Uuid,
    tx: mpsc::UnboundedSender<Message>,
}

impl Connection {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Connection {
            id: Uuid::new_v4(),
            tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    pub fn send(&self, message: &ServerMessage) -> bool {
        match message.to_json() {
            Ok(text) => self.tx.send(Message::text(text)).is_ok(),
            Err(e) => {
                log::error!("Failed to encode frame for {}: {}", self.id, e);
                false
            }
        }
    }
}

/// Live mapping from user id to the one connection that currently answers
/// for it. Last registration wins.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<String, Connection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, user_id: String, connection: Connection) {
        let mut connections = self.connections.write().await;
        if let Some(previous) = connections.insert(user_id.clone(), connection) {
            log::debug!(
                "User {} re-registered, connection {} orphaned",
                user_id,
                previous.id()
            );
        }
    }

    pub async fn lookup(&self, user_id: &str) -> Option<Connection> {
        let connections = self.connections.read().await;
        connections
            .get(user_id)
            .filter(|connection| connection.is_open())
            .cloned()
    }

    pub async fn remove(&self, user_id: &str) {
        let mut connections = self.connections.write().await;
        connections.remove(user_id);
    }

    // Only removes the entry this connection still owns.
    pub async fn remove_connection(&self, user_id: &str, connection_id: Uuid) -> bool {
        let mut connections = self.connections.write().await;
        match connections.get(user_id) {
            Some(connection) if connection.id() == connection_id => {
                connections.remove(user_id);
                true
            }
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> (Connection, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::new(tx), rx)
    }

    #[tokio::test]
    async fn lookup_finds_registered_connection() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connection();
        registry.register("u1".into(), conn.clone()).await;

        assert_eq!(registry.lookup("u1").await.map(|c| c.id()), Some(conn.id()));
        assert!(registry.lookup("u2").await.is_none());
    }

    #[tokio::test]
    async fn second_registration_replaces_first() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = connection();
        let (second, _rx2) = connection();
        registry.register("u1".into(), first.clone()).await;
        registry.register("u1".into(), second.clone()).await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.lookup("u1").await.map(|c| c.id()), Some(second.id()));
        // The orphan is not closed by the registry.
        assert!(first.is_open());
    }

    #[tokio::test]
    async fn lookup_skips_closed_connection() {
        let registry = ConnectionRegistry::new();
        let (conn, rx) = connection();
        registry.register("u1".into(), conn).await;
        drop(rx);

        assert!(registry.lookup("u1").await.is_none());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = connection();
        registry.register("u1".into(), conn).await;

        registry.remove("u1").await;
        registry.remove("u1").await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn remove_connection_ignores_stale_owner() {
        let registry = ConnectionRegistry::new();
        let (first, _rx1) = connection();
        let (second, _rx2) = connection();
        registry.register("u1".into(), first.clone()).await;
        registry.register("u1".into(), second.clone()).await;

        assert!(!registry.remove_connection("u1", first.id()).await);
        assert!(registry.lookup("u1").await.is_some());
        assert!(registry.remove_connection("u1", second.id()).await);
        assert!(registry.lookup("u1").await.is_none());
    }

    #[tokio::test]
    async fn registries_are_independent() {
        let a = ConnectionRegistry::new();
        let b = ConnectionRegistry::new();
        let (conn, _rx) = connection();
        a.register("u1".into(), conn).await;

        assert!(b.lookup("u1").await.is_none());
    }
}
