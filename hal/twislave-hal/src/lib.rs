//! TWI Slave Hardware Abstraction Layer
//!
//! This crate defines the register-level abstraction the slave driver is
//! written against. Chip-specific HALs implement [`TwiPeripheral`] for
//! their TWI block; host tests implement it with a simulated bus.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (twislave-firmware, etc.)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  twislave-core (protocol state machine) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  twislave-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ twislave-hal- │       │  simulated    │
//! │  atmega328p   │       │  bus (tests)  │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod twi;

pub use twi::{control, SlaveConfig, TwiPeripheral, STATUS_MASK};
