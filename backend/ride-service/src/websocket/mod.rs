pub mod messages;
pub mod registry;
pub mod session;

pub use messages::{FrameError, InboundFrame, Outbound};
pub use registry::{
    ConnectionHandle, ConnectionId, ConnectionRegistry, FanOutSummary, Outbox, PushOutcome,
};
pub use session::WsSession;
