//! Core types and utilities for keyward.
//!
//! This crate provides the foundational types used throughout the keyward token-trust stack:
//!
//! - **Identifiers**: Strongly-typed IDs for signing keys and OAuth2 clients
//! - **Clocks**: An injectable wall clock so time-based checks can be tested deterministically
//!
//! # Example
//!
//! ```
//! use keyward_core::{Clock, ClientId, KeyId, ManualClock};
//!
//! let kid: KeyId = "superapp-key-1".parse().unwrap();
//! let client_id = ClientId::new("payslip-viewer").unwrap();
//!
//! let clock = ManualClock::new(1_700_000_000);
//! clock.advance(60);
//! assert_eq!(clock.now(), 1_700_000_060);
//! # let _ = (kid, client_id);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod ids;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ids::{ClientId, IdError, KeyId};
