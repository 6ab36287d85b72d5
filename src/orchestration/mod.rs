//! Session orchestration: inputs, recomputation and playback wiring.

pub mod session;

pub use session::{
    RecomputeOutcome, Session, SessionError, SessionSettings, SessionUpdate,
};
