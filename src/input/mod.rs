//! Input event queue from renderer to client

pub mod event;
pub mod queue;

#[cfg(test)]
mod tests;

pub use event::{InputEvent, InputKind};
pub use queue::{Drain, InputConsumer, InputProducer};
