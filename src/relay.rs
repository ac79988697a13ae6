use chrono::Utc;

use crate::messages::{ClientMessage, ServerMessage};
use crate::registry::{Connection, ConnectionRegistry};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Connected,
    Registered { user_id: String },
}

#[derive(Debug)]
pub struct Session {
    connection: Connection,
    state: SessionState,
}

impl Session {
    pub fn new(connection: Connection) -> Self {
        Session {
            connection,
            state: SessionState::Connected,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Registered { user_id } => Some(user_id),
            SessionState::Connected => None,
        }
    }
}

/// Routes chat frames between live connections. Best effort: one attempt,
/// no queueing, no persistence.
#[derive(Clone)]
pub struct Relay {
    registry: ConnectionRegistry,
}

impl Relay {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Relay { registry }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub async fn on_text(&self, session: &mut Session, text: &str) {
        match ClientMessage::parse(text) {
            Ok(frame) => self.on_frame(session, frame).await,
            Err(e) => log::warn!(
                "Dropping frame from connection {}: {}",
                session.connection.id(),
                e
            ),
        }
    }

    pub async fn on_frame(&self, session: &mut Session, frame: ClientMessage) {
        match frame {
            ClientMessage::Register { user_id } => self.register(session, user_id).await,
            ClientMessage::ChatMessage {
                receiver_id,
                content,
                sender_name,
            } => {
                self.relay_chat(session, &receiver_id, content, sender_name)
                    .await;
            }
        }
    }

    async fn register(&self, session: &mut Session, user_id: String) {
        if let SessionState::Registered { user_id: previous } = &session.state {
            if *previous != user_id {
                self.registry
                    .remove_connection(previous, session.connection.id())
                    .await;
            }
        }

        log::info!(
            "Connection {} registered as {}",
            session.connection.id(),
            user_id
        );
        self.registry
            .register(user_id.clone(), session.connection.clone())
            .await;
        session.state = SessionState::Registered { user_id };
    }

    async fn relay_chat(
        &self,
        session: &Session,
        receiver_id: &str,
        content: String,
        sender_name: String,
    ) {
        match self.registry.lookup(receiver_id).await {
            Some(target) => {
                let frame = ServerMessage::chat(
                    content,
                    session.user_id().map(str::to_string),
                    sender_name,
                    Utc::now(),
                );
                if !target.send(&frame) {
                    log::debug!("Recipient {} went away mid-send", receiver_id);
                }
            }
            None => log::debug!("Recipient {} not connected, not forwarding", receiver_id),
        }

        session.connection.send(&ServerMessage::sent());
    }

    pub async fn on_close(&self, session: &Session) {
        if let Some(user_id) = session.user_id() {
            if self
                .registry
                .remove_connection(user_id, session.connection.id())
                .await
            {
                log::info!("User {} disconnected", user_id);
            }
        }
    }

    pub fn on_error(&self, session: &Session, err: &dyn std::error::Error) {
        log::error!(
            "WebSocket error on connection {}: {}",
            session.connection.id(),
            err
        );
    }
}
