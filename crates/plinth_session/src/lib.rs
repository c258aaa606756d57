//! Plinth session - load lifecycle and scene placement.
//!
//! This crate drives one asset load at a time on behalf of a host
//! application: a pick/load/place state machine with a background worker
//! thread, and a placement controller that swaps the loaded model into the
//! host's live scene without a visible flash-to-empty.
//!
//! The host supplies two collaborators: a file picker (it calls
//! [`LoadSession::pick_completed`] with the chosen path) and a
//! [`LiveScene`] implementation the placement controller inserts into.

pub mod placement;
pub mod session;

pub use placement::{LiveScene, PlacementController};
pub use session::{LoadSession, SessionError, SessionState};
