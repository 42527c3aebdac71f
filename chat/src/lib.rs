#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

//! The chat binary's composition root: configuration and the top-level
//! [`controller::Chat`] that wires every subsystem crate together.

pub mod config;
pub mod controller;
