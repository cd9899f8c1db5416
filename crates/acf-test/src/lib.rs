//! Shared test utilities for the Agent Conversation Fabric workspace.
//!
//! This crate provides fixtures, in-memory store wiring, and mock
//! implementations used across multiple `acf-*` crates as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! acf-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use acf_test::{test_session_key, test_turn_store, ManualClock};
//!
//! let clock = std::sync::Arc::new(ManualClock::epoch());
//! let store = test_turn_store();
//! let session_key = test_session_key();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod clock;
pub mod fixtures;
pub mod mocks;
pub mod stores;

pub mod prelude;

pub use clock::ManualClock;
pub use fixtures::*;
pub use mocks::*;
pub use stores::*;
