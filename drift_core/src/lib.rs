//! # Drift Core
//!
//! The engine behind hackterm. This crate interfaces with `game_world`,
//! executes script effects against player state, decodes ciphers, persists
//! state to an injected save target, and dispatches player commands.
//!
//! ## Core Components
//!
//! - **effects**: declarative script effect table and its interpreter
//! - **cipher**: rot13/base64 decoding and sigil flag unlocking
//! - **persist**: flat JSON save/load with all-or-nothing load semantics
//! - **command**: command parsing and the session dispatch loop
//! - **render**: paragraph-wrapping output renderer
//!
//! ## Design Philosophy
//!
//! - **State-Driven**: every command is a function of the world definition and
//!   the current player state; there is no hidden engine state
//! - **Recoverable**: every failure is folded into a one-line reply at the
//!   command boundary; only `quit` or end-of-input ends a session

pub mod cipher;
pub mod command;
pub mod effects;
pub mod persist;
pub mod render;

pub use cipher::*;
pub use command::*;
pub use effects::*;
pub use persist::*;
pub use render::*;
