//! Foreground-app enforcement.
//!
//! ```text
//! Idle -> (Detected) -> Intervening -> Idle
//! ```
//!
//! Detection is transient: on a foreground change naming a blocked package
//! the engine issues the home action and, unless a prompt is already up for
//! that package, presents the blocking prompt.

mod engine;
mod prompt;

pub use engine::{Decision, EnforcementEngine, EnforcementState, EnforcementStats};
pub use prompt::BlockPrompt;
