#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

//! The message queue: a durable, at-least-once FIFO handoff between ingress
//! and the dispatcher, backed by AMQP with manual acknowledgment.

pub mod config;
pub mod item;
pub mod queue;

pub use config::QueueConfig;
pub use item::QueueItem;
pub use queue::{AmqpQueue, ConsumeHandler, MessageQueue, Result};
