//! TWI register access for the ATmega328P

use avr_device::atmega328p::TWI;
use twislave_hal::TwiPeripheral;

/// The ATmega328P TWI block
pub struct Atmega328pTwi {
    twi: TWI,
}

impl Atmega328pTwi {
    /// Take ownership of the TWI registers
    pub fn new(twi: TWI) -> Self {
        Self { twi }
    }

    /// Give the registers back
    pub fn release(self) -> TWI {
        self.twi
    }
}

impl TwiPeripheral for Atmega328pTwi {
    fn status(&self) -> u8 {
        self.twi.twsr.read().bits()
    }

    fn control(&self) -> u8 {
        self.twi.twcr.read().bits()
    }

    fn set_control(&mut self, value: u8) {
        self.twi.twcr.write(|w| unsafe { w.bits(value) });
    }

    fn data(&self) -> u8 {
        self.twi.twdr.read().bits()
    }

    fn set_data(&mut self, byte: u8) {
        self.twi.twdr.write(|w| unsafe { w.bits(byte) });
    }

    fn set_address(&mut self, value: u8) {
        self.twi.twar.write(|w| unsafe { w.bits(value) });
    }

    fn reset(&mut self) {
        self.twi.twsr.write(|w| unsafe { w.bits(0) });
        self.twi.twcr.write(|w| unsafe { w.bits(0) });
        self.twi.twar.write(|w| unsafe { w.bits(0) });
    }

    fn enable_interrupts(&mut self) {
        // SAFETY: driver state is guarded by critical sections, so the TWI
        // vector may fire from here on.
        unsafe { avr_device::interrupt::enable() };
    }
}
