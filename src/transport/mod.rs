pub mod link;

pub use link::{SendStatus, Transport, MAX_PAYLOAD};
