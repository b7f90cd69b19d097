// Quiz engine shared by the TUI binary and the integration tests.
// Nothing here touches the terminal except `runtime`'s event reader.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod drill;
pub mod error;
pub mod progress;
pub mod question;
pub mod review;
pub mod runtime;
pub mod session;
pub mod store;
pub mod timer;

pub use error::{StoreError, ValidationError};
pub use question::{OperatorFilter, Question, Tier};
pub use session::Session;
