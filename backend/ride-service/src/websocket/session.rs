use super::messages::{InboundFrame, Outbound};
use super::registry::{ConnectionHandle, ConnectionId, ConnectionRegistry, Outbox};
use crate::config::WebSocketConfig;
use crate::models::UserId;
use crate::services::NotificationStore;
use actix::{Actor, ActorContext, ActorFutureExt, AsyncContext, StreamHandler, WrapFuture};
use actix_web_actors::ws;
use std::sync::Arc;
use std::time::Instant;

/// One authenticated notification socket.
///
/// The session registers itself once the actor is running, so a client that
/// drops during the upgrade never leaves an entry behind. Pushes arrive through
/// the outbox; when the registry drops the sending half the socket is closed.
pub struct WsSession {
    user_id: UserId,
    connection_id: ConnectionId,
    registry: ConnectionRegistry,
    store: Arc<dyn NotificationStore>,
    config: WebSocketConfig,
    hb: Instant,
    handle: Option<ConnectionHandle>,
    outbox: Option<Outbox>,
}

impl WsSession {
    pub fn new(
        user_id: UserId,
        registry: ConnectionRegistry,
        store: Arc<dyn NotificationStore>,
        config: WebSocketConfig,
    ) -> Self {
        let (handle, outbox) = ConnectionHandle::channel(config.outbox_capacity);
        Self {
            user_id,
            connection_id: handle.id(),
            registry,
            store,
            config,
            hb: Instant::now(),
            handle: Some(handle),
            outbox: Some(outbox),
        }
    }

    /// Installs this socket in the registry; the initial count is queued on success
    fn register(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let registry = self.registry.clone();
        let user_id = self.user_id;

        // Frames wait until the entry exists, so stopped() always runs after it
        ctx.wait(
            async move { registry.register(user_id, handle).await }
                .into_actor(self)
                .map(|result, act, _ctx| {
                    if let Err(e) = result {
                        tracing::error!(user_id = act.user_id, error = %e, "initial unread count lookup failed");
                    }
                }),
        );
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let timeout = self.config.client_timeout();
        ctx.run_interval(self.config.heartbeat_interval(), move |act, ctx| {
            if Instant::now().duration_since(act.hb) > timeout {
                tracing::warn!(user_id = act.user_id, "websocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_frame(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        match InboundFrame::parse(text) {
            Ok(InboundFrame::GetNumber { id }) => {
                // Goes to the target's socket, not this one
                let registry = self.registry.clone();
                actix::spawn(async move {
                    if let Err(e) = registry.push_unread_count(id).await {
                        tracing::warn!(target_user = id, error = %e, "get_number push failed");
                    }
                });
            }
            Ok(InboundFrame::ReadMessages) => {
                let store = self.store.clone();
                let user_id = self.user_id;
                ctx.spawn(
                    async move { store.unread_count(user_id).await }
                        .into_actor(self)
                        .map(|result, act, ctx| match result {
                            Ok(count) => ctx.text(Outbound::UnreadCount(count).into_text()),
                            Err(e) => {
                                tracing::warn!(user_id = act.user_id, error = %e, "unread count lookup failed")
                            }
                        }),
                );
            }
            Ok(InboundFrame::Unrecognized(kind)) => {
                tracing::warn!(user_id = self.user_id, kind = %kind, "unrecognized frame kind");
            }
            Err(e) => {
                tracing::warn!(user_id = self.user_id, error = %e, "failed to parse frame");
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            user_id = self.user_id,
            connection = %self.connection_id,
            "notification socket opened"
        );

        self.hb(ctx);

        if let Some(outbox) = self.outbox.take() {
            ctx.add_stream(outbox.into_stream());
        }
        self.register(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            user_id = self.user_id,
            connection = %self.connection_id,
            "notification socket closed"
        );

        let registry = self.registry.clone();
        let user_id = self.user_id;
        let connection_id = self.connection_id;
        actix::spawn(async move {
            registry.unregister_connection(user_id, connection_id).await;
        });
    }
}

// Registry pushes
impl StreamHandler<Outbound> for WsSession {
    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        ctx.text(msg.into_text());
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            user_id = self.user_id,
            connection = %self.connection_id,
            "registry released socket"
        );
        ctx.close(Some(ws::CloseReason {
            code: ws::CloseCode::Normal,
            description: Some("released".into()),
        }));
        ctx.stop();
    }
}

// Client frames
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                self.handle_frame(&text, ctx);
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!(user_id = self.user_id, "binary frames not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!(user_id = self.user_id, ?reason, "close frame received");
                ctx.close(reason);
                ctx.stop();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(user_id = self.user_id, error = %e, "websocket protocol error");
                ctx.stop();
            }
        }
    }
}
