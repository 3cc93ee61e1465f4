//! pusher-app - State machine and orchestration for Pusher
//!
//! Implements the controller as a pure reducer over [`AppState`] and
//! [`Event`], a set of state-gated feedback loops that call the simulator
//! provider, and the [`Engine`] that serializes every event through the
//! reducer and republishes the result. Also owns configuration loading and
//! signal handling.

pub mod config;
pub mod engine;
pub mod engine_event;
pub mod event;
pub mod feedback;
pub mod handler;
pub mod selection;
pub mod signals;
pub mod state;

// Re-export primary types
pub use config::Settings;
pub use engine::{Engine, EngineHandle};
pub use engine_event::EngineEvent;
pub use event::Event;
pub use feedback::{Feedback, StateSnapshot};
pub use handler::reduce;
pub use state::AppState;
