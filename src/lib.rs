pub mod backend;
pub mod calendar;
pub mod cli;
pub mod core;
pub mod friends;
pub mod hangouts;
pub mod notify;
