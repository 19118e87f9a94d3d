pub mod client;
pub mod types;

pub use client::{BackendClient, RequestDirection};
pub use types::*;
