pub mod config;
pub mod error;
pub mod session;

pub use config::AppConfig;
pub use error::{HuddleError, HuddleResult};
pub use session::SessionContext;
