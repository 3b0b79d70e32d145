//! # Game World
//!
//! The "world bible" crate for hackterm - the static node graph with its files
//! and entry gates, plus the mutable player state. This crate is the single
//! source of truth for game data and contains no command handling or I/O.

pub mod state;
pub mod world;

pub use state::*;
pub use world::*;
