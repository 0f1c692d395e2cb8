//! Interactive placement for casework modeling
//!
//! This crate drives modal tools over a [`cw_core::Scene`]:
//! - Wall drawing with angle snap, typed lengths and loop closing
//! - Cabinet and appliance runs that fill or snap into wall gaps
//! - Door and window openings that cut their wall
//! - Timer-driven style updates across many cabinets
//!
//! Tools consume [`InputEvent`]s and report a [`ModalStatus`]. Objects a tool
//! creates stay pending until commit so a cancel removes them again.

pub mod actions;
pub mod bulk;
pub mod cabinet;
pub mod event;
pub mod gap;
pub mod opening;
pub mod pending;
pub mod session;
pub mod status;
pub mod target;
pub mod typing;
pub mod wall_draw;

// Re-exports for convenience
pub use actions::{ActionContext, dispatch_action, process_pending_actions};
pub use bulk::{BulkState, BulkStyleJob};
pub use cabinet::{CabinetPlacement, PlacementParams, PlacementState, RunAnchor, RunLayout};
pub use event::{InputEvent, Key, ModalStatus, Pointer, SurfaceHit};
pub use gap::{Interval, PlacementGap, auto_quantity, find_placement_gap, occupied_intervals};
pub use opening::{OpeningLayout, OpeningPlacement};
pub use pending::PendingObjects;
pub use session::{ActiveTool, Session, SessionAction, SharedSession, create_shared_session};
pub use status::{Severity, StatusMessage};
pub use target::{SideDetector, WallTarget, resolve_wall_target};
pub use typing::{TypedInput, TypingOutcome, TypingTarget};
pub use wall_draw::{DrawState, WallDrawing};
