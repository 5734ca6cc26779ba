// Preload engine: tiered loading, deadline races, fallbacks and the session ledger.

pub mod cache;
pub mod error;
pub mod fallback;
pub mod loader;
pub mod outcome;
pub mod race;
pub mod session;
pub mod stats;

pub use error::LoadError;
pub use loader::{Claim, PriorityLoader};
pub use outcome::{LoadOutcome, LoadStatus, Payload};
pub use race::TimeoutRace;
pub use session::{LoadSession, SessionState};
