pub mod feed;
pub mod lifecycle;

pub use feed::{pump, EventSource, JsonLinesFeed};
pub use lifecycle::{Engine, EngineHandle};
