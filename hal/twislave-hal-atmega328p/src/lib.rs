//! ATmega328P-specific HAL for the TWI slave driver
//!
//! This crate implements [`twislave_hal::TwiPeripheral`] over the
//! ATmega328P TWI block using `avr-device` register access. It is the only
//! crate in the workspace that touches hardware registers directly.
//!
//! # Usage
//!
//! ```ignore
//! let dp = avr_device::atmega328p::Peripherals::take().unwrap();
//! let twi = Atmega328pTwi::new(dp.TWI);
//! SLAVE.initialize(twi, SlaveConfig::new(0x42), None, None)?;
//! ```
//!
//! SDA/SCL (PC4/PC5) need no pin setup; enabling the peripheral takes
//! them over. The bus needs external pull-ups.

#![no_std]

pub mod twi;

pub use twi::Atmega328pTwi;
