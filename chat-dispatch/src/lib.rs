#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

//! The dispatch pipeline: ingress, the consume-path dispatcher, and delivery
//! acknowledgment, each with their compensating rollback on partial failure.

pub mod delivery_ack;
pub mod dispatcher;
pub mod ingress;
pub mod sink;

pub use delivery_ack::DeliveryAck;
pub use dispatcher::Dispatcher;
pub use ingress::{Accepted, Ingress};
pub use sink::SessionSink;
