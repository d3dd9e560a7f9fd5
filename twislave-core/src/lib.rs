//! Interrupt-driven TWI slave driver
//!
//! This crate contains everything between the TWI interrupt vector and
//! the application:
//!
//! - Bus control actions (the control-register patterns the driver writes)
//! - Transfer buffer shared between caller and interrupt context
//! - Callback bridge for per-byte application handlers
//! - Protocol state machine run once per bus event
//! - [`TwiSlave`], the shared handle that owns all of the above
//!
//! Register access goes through [`twislave_hal::TwiPeripheral`], so the
//! same driver runs against real hardware and the simulated bus in
//! [`sim`].

#![no_std]
#![deny(unsafe_code)]

// Must come first so the logging macros are visible to the other modules.
#[macro_use]
mod fmt;

pub mod buffer;
pub mod callback;
pub mod control;
pub mod controller;
pub mod error;
pub mod slave;
pub mod status;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use buffer::TransferBuffer;
pub use callback::{CallbackBridge, Consumer, NoCallback, Producer};
pub use control::{BusAction, Response};
pub use controller::Controller;
pub use error::{Error, SUCCESS};
pub use slave::{Forever, SpinLimit, TwiSlave, WaitPolicy};
pub use status::{Phase, Status};
pub use twislave_hal::{SlaveConfig, TwiPeripheral};

/// Default transfer buffer capacity in bytes
pub const DEFAULT_CAPACITY: usize = 256;
