//! FocusBubble Core - Shared types, session state machine, configuration, and error handling

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod limits;
pub mod session;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::*;
pub use constants::*;
pub use error::{Error, Result};
pub use limits::{checked_end, duration_from_minutes, ensure_storable};
pub use session::{Session, SessionState, SessionStatus};
pub use types::*;
