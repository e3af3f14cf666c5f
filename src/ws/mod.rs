pub mod autosave;
pub mod connctx;
pub mod registry;
pub mod room;
pub mod session;

pub use connctx::ConnCtx;
pub use registry::{RoomRegistry, RoomSettings};
pub use room::{BackgroundError, JoinResult, RoomStats};
pub use session::{ConnectionId, CursorState, Outbound, Session};
