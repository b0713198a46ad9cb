/// Connection registry for notification sockets
///
/// Maps each authenticated user to the single socket currently receiving their
/// unread-count pushes. A newer socket for the same user replaces the older one,
/// and the older socket is closed.
use super::messages::Outbound;
use crate::error::Result;
use crate::metrics;
use crate::models::UserId;
use crate::services::NotificationStore;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{
    self,
    error::{TryRecvError, TrySendError},
};
use tokio::sync::RwLock;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Distinguishes successive sockets of the same user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sending half of a socket's outbox. Dropping the last handle closes the socket.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbox: mpsc::Sender<Outbound>,
    latest: Arc<AtomicI64>,
}

impl ConnectionHandle {
    /// Creates a handle and the outbox the session drains
    pub fn channel(capacity: usize) -> (Self, Outbox) {
        let (outbox, rx) = mpsc::channel(capacity.max(1));
        let latest = Arc::new(AtomicI64::new(0));
        (
            Self {
                id: ConnectionId::next(),
                outbox,
                latest: latest.clone(),
            },
            Outbox { rx, latest },
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

/// Receiving half of a socket's outbox.
///
/// Each queued frame carries the most recent count pushed to the connection,
/// so a push that found the queue full still reaches the client through the
/// frames already waiting.
#[derive(Debug)]
pub struct Outbox {
    rx: mpsc::Receiver<Outbound>,
    latest: Arc<AtomicI64>,
}

impl Outbox {
    pub async fn recv(&mut self) -> Option<Outbound> {
        let frame = self.rx.recv().await?;
        Some(refresh(frame, &self.latest))
    }

    pub fn try_recv(&mut self) -> std::result::Result<Outbound, TryRecvError> {
        let frame = self.rx.try_recv()?;
        Ok(refresh(frame, &self.latest))
    }

    /// Stream of frames ending when every sender is dropped
    pub fn into_stream(self) -> impl Stream<Item = Outbound> + Unpin + 'static {
        let latest = self.latest;
        ReceiverStream::new(self.rx).map(move |frame| refresh(frame, &latest))
    }
}

fn refresh(frame: Outbound, latest: &AtomicI64) -> Outbound {
    match frame {
        Outbound::UnreadCount(_) => Outbound::UnreadCount(latest.load(Ordering::Acquire)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Enqueued on the user's socket
    Delivered,
    /// No live socket for the user
    Offline,
    /// The socket's outbox was full; the count rides on a frame already queued
    Dropped,
}

impl PushOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushOutcome::Delivered => "delivered",
            PushOutcome::Offline => "offline",
            PushOutcome::Dropped => "dropped",
        }
    }
}

/// Per-outcome tally of a fan-out push
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutSummary {
    pub delivered: usize,
    pub offline: usize,
    pub dropped: usize,
    /// Users whose count could not be read from the store
    pub failed: usize,
}

impl FanOutSummary {
    fn record(&mut self, outcome: PushOutcome) {
        match outcome {
            PushOutcome::Delivered => self.delivered += 1,
            PushOutcome::Offline => self.offline += 1,
            PushOutcome::Dropped => self.dropped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.delivered + self.offline + self.dropped + self.failed
    }
}

#[derive(Clone)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<UserId, ConnectionHandle>>>,
    store: Arc<dyn NotificationStore>,
}

impl ConnectionRegistry {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            store,
        }
    }

    /// Installs `handle` as the user's socket and sends it the current unread count.
    ///
    /// A previously registered socket for the same user is closed. The handle
    /// stays registered even when reading the initial count fails.
    pub async fn register(&self, user_id: UserId, handle: ConnectionHandle) -> Result<PushOutcome> {
        let connection_id = handle.id;
        let previous = {
            let mut connections = self.connections.write().await;
            let previous = connections.insert(user_id, handle.clone());
            metrics::set_ws_sessions(connections.len());
            previous
        };

        if let Some(previous) = previous {
            tracing::info!(
                user_id,
                old_connection = %previous.id,
                new_connection = %connection_id,
                "replacing notification socket"
            );
            drop(previous);
        } else {
            tracing::debug!(user_id, connection = %connection_id, "notification socket registered");
        }

        let count = self.store.unread_count(user_id).await?;
        Ok(self.deliver(user_id, &handle, count).await)
    }

    /// Removes the user's entry whatever socket it belongs to
    pub async fn unregister(&self, user_id: UserId) {
        let mut connections = self.connections.write().await;
        if connections.remove(&user_id).is_some() {
            tracing::debug!(user_id, "notification socket unregistered");
        }
        metrics::set_ws_sessions(connections.len());
    }

    /// Removes the user's entry only if it still belongs to `connection_id`.
    ///
    /// Returns false when the socket was already replaced or removed.
    pub async fn unregister_connection(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.write().await;
        let owned = connections
            .get(&user_id)
            .map(|handle| handle.id == connection_id)
            .unwrap_or(false);
        if owned {
            connections.remove(&user_id);
            metrics::set_ws_sessions(connections.len());
            tracing::debug!(user_id, connection = %connection_id, "notification socket unregistered");
        }
        owned
    }

    /// Reads the user's unread count and enqueues it on their socket.
    ///
    /// Only a store failure is an error; an absent or closed socket is `Offline`.
    pub async fn push_unread_count(&self, user_id: UserId) -> Result<PushOutcome> {
        let handle = self.connections.read().await.get(&user_id).cloned();

        let Some(handle) = handle else {
            tracing::debug!(user_id, "user not connected, unread count not pushed");
            metrics::record_push(PushOutcome::Offline.as_str());
            return Ok(PushOutcome::Offline);
        };

        let count = self.store.unread_count(user_id).await?;
        Ok(self.deliver(user_id, &handle, count).await)
    }

    /// Pushes to every distinct user in `user_ids` concurrently
    pub async fn push_unread_count_to_many<I>(&self, user_ids: I) -> FanOutSummary
    where
        I: IntoIterator<Item = UserId>,
    {
        let mut seen = HashSet::new();
        let targets: Vec<UserId> = user_ids.into_iter().filter(|id| seen.insert(*id)).collect();

        let results = join_all(targets.iter().map(|id| self.push_unread_count(*id))).await;

        let mut summary = FanOutSummary::default();
        for (user_id, result) in targets.iter().zip(results) {
            match result {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    tracing::error!(user_id = *user_id, error = %e, "unread count lookup failed");
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    pub async fn is_connected(&self, user_id: UserId) -> bool {
        self.connections.read().await.contains_key(&user_id)
    }

    pub async fn connected_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn connected_user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.connections.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Drops every handle, closing all sockets. Returns how many were open.
    pub async fn close_all(&self) -> usize {
        let mut connections = self.connections.write().await;
        let closed = connections.len();
        connections.clear();
        metrics::set_ws_sessions(0);
        closed
    }

    async fn deliver(&self, user_id: UserId, handle: &ConnectionHandle, count: i64) -> PushOutcome {
        handle.latest.store(count, Ordering::Release);
        let outcome = match handle.outbox.try_send(Outbound::UnreadCount(count)) {
            Ok(()) => {
                tracing::debug!(user_id, count, "unread count pushed");
                PushOutcome::Delivered
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(user_id, connection = %handle.id, count, "outbox full, count left to queued frames");
                PushOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(user_id, connection = %handle.id, "socket already closed");
                self.unregister_connection(user_id, handle.id).await;
                PushOutcome::Offline
            }
        };
        metrics::record_push(outcome.as_str());
        outcome
    }
}
