// miniseq-core/src/types/mod.rs

pub mod click;
pub mod config;
pub mod event;
pub mod message;
pub mod time;
pub mod track;

pub use click::ClickGenerator;
pub use config::SeqConfig;
pub use event::{Message, TimedEvent};
pub use time::{tick_seconds, TimeBase};
pub use track::Track;
