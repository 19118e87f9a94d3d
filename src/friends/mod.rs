pub mod directory;

pub use directory::{FriendSnapshot, FriendshipDirectory};
