//! TWI peripheral abstractions
//!
//! The TWI block is driven entirely through four registers: control,
//! status, data and own-address. The driver never needs more than that.

/// Bits of the TWI control register
pub mod control {
    /// Interrupt flag; writing 1 clears it and releases the clock line
    pub const TWINT: u8 = 1 << 7;
    /// Enable acknowledge generation
    pub const TWEA: u8 = 1 << 6;
    /// Start condition request
    pub const TWSTA: u8 = 1 << 5;
    /// Stop condition request (recovers from bus errors in slave mode)
    pub const TWSTO: u8 = 1 << 4;
    /// Write collision flag
    pub const TWWC: u8 = 1 << 3;
    /// Peripheral enable
    pub const TWEN: u8 = 1 << 2;
    /// Interrupt enable
    pub const TWIE: u8 = 1 << 0;
}

/// Mask applied to the status register; the low bits hold the prescaler
pub const STATUS_MASK: u8 = 0xF8;

/// Register access to a TWI peripheral
///
/// Implementations only move bytes in and out of registers. All protocol
/// decisions are made by the driver.
pub trait TwiPeripheral {
    /// Raw status register value (prescaler bits included)
    fn status(&self) -> u8;

    /// Current control register value
    fn control(&self) -> u8;

    /// Write the control register
    fn set_control(&mut self, value: u8);

    /// Read the data register
    fn data(&self) -> u8;

    /// Write the data register
    fn set_data(&mut self, byte: u8);

    /// Write the own-address register
    fn set_address(&mut self, value: u8);

    /// Clear control and address registers
    ///
    /// Implementations with a writable status register (prescaler bits)
    /// override this to clear it too.
    fn reset(&mut self) {
        self.set_control(0);
        self.set_address(0);
    }

    /// Globally enable interrupts so the TWI vector can fire
    fn enable_interrupts(&mut self) {}

    /// Status code with the prescaler bits masked off
    fn status_code(&self) -> u8 {
        self.status() & STATUS_MASK
    }

    /// Interrupt-driven mode is armed
    ///
    /// The interrupt enable bit doubles as the busy indicator: it is set
    /// by every Connect and cleared by Disconnect.
    fn interrupt_enabled(&self) -> bool {
        self.control() & control::TWIE != 0
    }
}

/// Slave addressing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlaveConfig {
    /// 7-bit slave address
    pub address: u8,
    /// Respond to the general-call (broadcast) address
    pub general_call: bool,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            address: 0x08, // lowest non-reserved address
            general_call: false,
        }
    }
}

impl SlaveConfig {
    /// Highest valid 7-bit address
    pub const MAX_ADDRESS: u8 = 0x7F;

    /// Configuration for the given 7-bit address, general call disabled
    pub const fn new(address: u8) -> Self {
        Self {
            address,
            general_call: false,
        }
    }

    /// Enable or disable general-call response
    pub const fn with_general_call(mut self, enabled: bool) -> Self {
        self.general_call = enabled;
        self
    }

    /// Check the address fits in 7 bits and is not the general-call address
    pub const fn is_valid(&self) -> bool {
        self.address != 0 && self.address <= Self::MAX_ADDRESS
    }

    /// Own-address register value
    ///
    /// Address in bits 7..1, general-call recognition in bit 0.
    pub const fn address_register(&self) -> u8 {
        (self.address << 1) | self.general_call as u8
    }
}
