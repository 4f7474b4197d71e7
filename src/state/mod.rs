pub mod capabilities;
pub mod session;

pub use capabilities::Capabilities;
pub use session::{LoginOutcome, SessionState, SessionStore};
