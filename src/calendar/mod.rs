pub mod event;
pub mod reconcile;

pub use event::{CalendarEvent, EventKey, DEFAULT_COLOR, DEFAULT_TEXT_COLOR};
pub use reconcile::{apply_remote_batch, delete, merge};
