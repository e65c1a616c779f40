//! Chat Hub
//!
//! The serialized owner of the live connection set. All mutation goes
//! through a single spawned task that consumes commands from a bounded
//! queue, so register/unregister/broadcast never race on the set and no
//! locks are needed. Handlers hold a cloneable [`ChatHub`] handle.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::domain::ChatMessage;
use crate::infrastructure::metrics;

/// A live connection as the hub sees it: an opaque ID plus the channel
/// feeding that connection's writer task. The hub never touches the
/// socket itself; dropping the sender ends the writer task, which closes
/// the transport exactly once.
#[derive(Debug)]
pub struct Connection {
    pub id: Uuid,
    pub sender: mpsc::UnboundedSender<ChatMessage>,
}

impl Connection {
    pub fn new(sender: mpsc::UnboundedSender<ChatMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
        }
    }
}

/// Commands processed one at a time by the owner task.
enum HubCommand {
    Register(Connection),
    Unregister(Uuid),
    Broadcast(ChatMessage),
    Count(oneshot::Sender<usize>),
}

/// Handle to the hub owner task.
///
/// The command queue is bounded; producers wait when it fills rather than
/// dropping broadcasts.
#[derive(Clone)]
pub struct ChatHub {
    commands: mpsc::Sender<HubCommand>,
}

impl ChatHub {
    /// Spawn the owner task and return a handle to it.
    pub fn new(command_buffer: usize) -> Self {
        let (commands, rx) = mpsc::channel(command_buffer);
        tokio::spawn(run(rx));
        Self { commands }
    }

    /// Add a connection to the live set. Called exactly once per
    /// authenticated connection.
    pub async fn register(&self, connection: Connection) {
        let _ = self.commands.send(HubCommand::Register(connection)).await;
    }

    /// Remove a connection from the live set if present. Safe to call for
    /// a connection the hub has already pruned.
    pub async fn unregister(&self, connection_id: Uuid) {
        let _ = self
            .commands
            .send(HubCommand::Unregister(connection_id))
            .await;
    }

    /// Fan a message out to every live connection. A connection whose
    /// delivery fails is pruned immediately; the rest still receive the
    /// message.
    pub async fn broadcast(&self, message: ChatMessage) {
        let _ = self.commands.send(HubCommand::Broadcast(message)).await;
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        let (reply, response) = oneshot::channel();
        if self.commands.send(HubCommand::Count(reply)).await.is_err() {
            return 0;
        }
        response.await.unwrap_or(0)
    }
}

/// Owner loop. Exclusive owner of the live set; exits when the last
/// handle is dropped.
async fn run(mut commands: mpsc::Receiver<HubCommand>) {
    let mut connections: HashMap<Uuid, mpsc::UnboundedSender<ChatMessage>> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Register(connection) => {
                tracing::info!(connection_id = %connection.id, "Connection registered");
                connections.insert(connection.id, connection.sender);
                metrics::WEBSOCKET_CONNECTIONS_ACTIVE.set(connections.len() as i64);
            }

            HubCommand::Unregister(connection_id) => {
                if connections.remove(&connection_id).is_some() {
                    tracing::info!(%connection_id, "Connection unregistered");
                    metrics::WEBSOCKET_CONNECTIONS_ACTIVE.set(connections.len() as i64);
                }
            }

            HubCommand::Broadcast(message) => {
                metrics::MESSAGES_BROADCAST_TOTAL.inc();

                // Iteration order across connections is unspecified; order
                // per connection follows command-queue order.
                let mut dead = Vec::new();
                for (connection_id, sender) in &connections {
                    if sender.send(message.clone()).is_err() {
                        dead.push(*connection_id);
                    }
                }

                // Lazy cleanup: a failed delivery is the signal that the
                // peer is gone. No retry for that connection.
                for connection_id in dead {
                    connections.remove(&connection_id);
                    metrics::CONNECTIONS_PRUNED_TOTAL.inc();
                    tracing::debug!(%connection_id, "Pruned dead connection during broadcast");
                }
                metrics::WEBSOCKET_CONNECTIONS_ACTIVE.set(connections.len() as i64);
            }

            HubCommand::Count(reply) => {
                let _ = reply.send(connections.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn message(id: i64, content: &str) -> ChatMessage {
        ChatMessage {
            id,
            user_id: 42,
            username: "alice".into(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    fn attach(hub_capacity: usize) -> (ChatHub, Vec<mpsc::UnboundedReceiver<ChatMessage>>) {
        let hub = ChatHub::new(hub_capacity);
        (hub, Vec::new())
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_registered_connections() {
        let (hub, mut receivers) = attach(16);
        for _ in 0..3 {
            let (tx, rx) = mpsc::unbounded_channel();
            hub.register(Connection::new(tx)).await;
            receivers.push(rx);
        }

        hub.broadcast(message(1, "hi")).await;

        for rx in &mut receivers {
            let delivered = rx.recv().await.unwrap();
            assert_eq!(delivered.content, "hi");
            // Exactly once: nothing else is pending.
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_broadcast_order_is_preserved_per_connection() {
        let (hub, _) = attach(16);
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register(Connection::new(tx)).await;

        hub.broadcast(message(1, "first")).await;
        hub.broadcast(message(2, "second")).await;
        hub.broadcast(message(3, "third")).await;

        assert_eq!(rx.recv().await.unwrap().content, "first");
        assert_eq!(rx.recv().await.unwrap().content, "second");
        assert_eq!(rx.recv().await.unwrap().content, "third");
    }

    #[tokio::test]
    async fn test_dead_connection_is_pruned_on_broadcast() {
        let (hub, _) = attach(16);

        let (live_tx, mut live_rx) = mpsc::unbounded_channel();
        hub.register(Connection::new(live_tx)).await;

        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        hub.register(Connection::new(dead_tx)).await;
        drop(dead_rx); // Transport already closed when broadcast arrives.

        assert_eq!(hub.connection_count().await, 2);

        hub.broadcast(message(1, "hi")).await;
        assert_eq!(live_rx.recv().await.unwrap().content, "hi");

        // The failed delivery pruned the dead connection.
        assert_eq!(hub.connection_count().await, 1);

        // Subsequent broadcasts go only to the survivor.
        hub.broadcast(message(2, "again")).await;
        assert_eq!(live_rx.recv().await.unwrap().content, "again");
        assert_eq!(hub.connection_count().await, 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_abort_fanout_to_others() {
        let (hub, mut receivers) = attach(16);

        // Interleave dead and live connections so pruning happens mid-fanout
        // regardless of iteration order.
        for i in 0..6 {
            let (tx, rx) = mpsc::unbounded_channel();
            hub.register(Connection::new(tx)).await;
            if i % 2 == 0 {
                drop(rx);
            } else {
                receivers.push(rx);
            }
        }

        hub.broadcast(message(1, "hi")).await;

        for rx in &mut receivers {
            assert_eq!(rx.recv().await.unwrap().content, "hi");
        }
        assert_eq!(hub.connection_count().await, 3);
    }

    #[tokio::test]
    async fn test_unregister_removes_connection() {
        let (hub, _) = attach(16);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let connection = Connection::new(tx);
        let connection_id = connection.id;
        hub.register(connection).await;
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(connection_id).await;
        assert_eq!(hub.connection_count().await, 0);

        hub.broadcast(message(1, "hi")).await;
        assert_eq!(hub.connection_count().await, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_double_unregister_is_harmless() {
        let (hub, _) = attach(16);
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = Connection::new(tx);
        let connection_id = connection.id;
        hub.register(connection).await;

        hub.unregister(connection_id).await;
        hub.unregister(connection_id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_with_no_connections_is_a_noop() {
        let (hub, _) = attach(16);
        hub.broadcast(message(1, "into the void")).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_registers_then_broadcast_reach_both() {
        let (hub, _) = attach(16);

        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        let hub_a = hub.clone();
        let hub_b = hub.clone();
        let register_a = tokio::spawn(async move { hub_a.register(Connection::new(tx_a)).await });
        let register_b = tokio::spawn(async move { hub_b.register(Connection::new(tx_b)).await });
        register_a.await.unwrap();
        register_b.await.unwrap();

        hub.broadcast(message(1, "hi")).await;

        assert_eq!(rx_a.recv().await.unwrap().content, "hi");
        assert_eq!(rx_b.recv().await.unwrap().content, "hi");
    }
}
