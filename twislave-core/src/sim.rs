//! Simulated TWI peripheral and bus master
//!
//! [`SimBus`] stands in for the peripheral registers and records every
//! control register write. [`SimMaster`] plays the other end of the wire:
//! it produces the status code sequence the hardware would report for a
//! master read, write or arbitration loss, running the slave's interrupt
//! handler after each one, and reports what it saw on the bus.

use core::cell::{Cell, RefCell};

use heapless::Vec;
use twislave_hal::control::{TWEA, TWEN, TWIE};
use twislave_hal::TwiPeripheral;

use crate::callback::{Consumer, Producer};
use crate::slave::TwiSlave;
use crate::status::Status;

/// Number of control register writes kept by [`SimBus`]
pub const WRITE_LOG: usize = 64;

/// Largest transfer [`SimMaster`] records
pub const MAX_TRANSFER: usize = 512;

/// General-call (broadcast) address
pub const GENERAL_CALL: u8 = 0x00;

/// Simulated TWI register file
#[derive(Debug, Default)]
pub struct SimBus {
    control: Cell<u8>,
    status: Cell<u8>,
    data: Cell<u8>,
    address: Cell<u8>,
    global_interrupts: Cell<bool>,
    writes: RefCell<Vec<u8, WRITE_LOG>>,
}

impl SimBus {
    /// Registers at their reset values
    pub const fn new() -> Self {
        Self {
            control: Cell::new(0),
            status: Cell::new(0),
            data: Cell::new(0),
            address: Cell::new(0),
            global_interrupts: Cell::new(false),
            writes: RefCell::new(Vec::new()),
        }
    }

    /// Control register
    pub fn control(&self) -> u8 {
        self.control.get()
    }

    /// Data register
    pub fn data(&self) -> u8 {
        self.data.get()
    }

    /// Own-address register
    pub fn address(&self) -> u8 {
        self.address.get()
    }

    /// Global interrupt enable
    pub fn global_interrupts(&self) -> bool {
        self.global_interrupts.get()
    }

    /// Interrupt-driven mode is armed
    pub fn is_armed(&self) -> bool {
        self.control.get() & TWIE != 0
    }

    /// Control register writes, oldest first
    pub fn control_writes(&self) -> Vec<u8, WRITE_LOG> {
        self.writes.borrow().clone()
    }

    /// Present a status code to the next interrupt
    pub fn post(&self, status: Status) {
        self.status.set(status.code());
    }

    /// Place a byte in the data register as if shifted in from the wire
    pub fn load(&self, byte: u8) {
        self.data.set(byte);
    }

    fn record(&self, value: u8) {
        let mut writes = self.writes.borrow_mut();
        if writes.is_full() {
            writes.remove(0);
        }
        writes.push(value).ok();
        self.control.set(value);
    }

    fn answers(&self, address: u8, read: bool) -> bool {
        let control = self.control.get();
        if control & TWEN == 0 || control & TWEA == 0 {
            return false;
        }
        let own = self.address.get();
        if address == GENERAL_CALL {
            !read && own & 1 != 0
        } else {
            own >> 1 == address
        }
    }
}

impl TwiPeripheral for &SimBus {
    fn status(&self) -> u8 {
        self.status.get()
    }

    fn control(&self) -> u8 {
        self.control.get()
    }

    fn set_control(&mut self, value: u8) {
        self.record(value);
    }

    fn data(&self) -> u8 {
        self.data.get()
    }

    fn set_data(&mut self, byte: u8) {
        self.data.set(byte);
    }

    fn set_address(&mut self, value: u8) {
        self.address.set(value);
    }

    fn reset(&mut self) {
        self.record(0);
        self.status.set(0);
        self.address.set(0);
    }

    fn enable_interrupts(&mut self) {
        self.global_interrupts.set(true);
    }
}

/// Something that services TWI interrupts
pub trait Responder {
    /// Run the interrupt handler once
    fn service(&self);
}

impl<P, C, D, const N: usize> Responder for TwiSlave<P, C, D, N>
where
    P: TwiPeripheral,
    C: Consumer,
    D: Producer,
{
    fn service(&self) {
        self.on_interrupt();
    }
}

/// Failures seen from the master side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Nobody acknowledged the address
    AddressNack,
    /// The slave left interrupt mode while still addressed, so the
    /// event that would have followed was never serviced
    Stalled(Status),
    /// Transfer longer than [`MAX_TRANSFER`]
    Overflow,
}

/// Simulated bus master
pub struct SimMaster<'a> {
    bus: &'a SimBus,
}

impl<'a> SimMaster<'a> {
    /// Master attached to `bus`
    pub fn new(bus: &'a SimBus) -> Self {
        Self { bus }
    }

    fn raise(&self, slave: &impl Responder, status: Status) -> Result<(), SimError> {
        if !self.bus.is_armed() {
            return Err(SimError::Stalled(status));
        }
        self.bus.post(status);
        slave.service();
        Ok(())
    }

    /// Address the slave for reading and clock out `count` bytes
    ///
    /// The master acknowledges every byte but the last. Once the slave
    /// stops driving the line the master reads idle-high `0xFF` bytes.
    pub fn read(
        &self,
        slave: &impl Responder,
        address: u8,
        count: usize,
    ) -> Result<Vec<u8, MAX_TRANSFER>, SimError> {
        let mut out = Vec::new();
        if count == 0 {
            return Ok(out);
        }
        if address == GENERAL_CALL || !self.bus.answers(address, true) {
            return Err(SimError::AddressNack);
        }
        self.raise(slave, Status::StSlaAck)?;

        let mut addressed = true;
        for i in 0..count {
            let byte = if addressed { self.bus.data() } else { 0xFF };
            out.push(byte).map_err(|_| SimError::Overflow)?;
            if !addressed {
                continue;
            }

            let status = if i + 1 == count {
                Status::StDataNack
            } else if self.bus.control() & TWEA != 0 {
                Status::StDataAck
            } else {
                addressed = false;
                Status::StLastData
            };
            self.raise(slave, status)?;
        }
        Ok(out)
    }

    /// Address the slave for writing, send `bytes`, then a stop condition
    ///
    /// Returns how many bytes the slave acknowledged. A NACKed byte ends
    /// the transfer.
    pub fn write(
        &self,
        slave: &impl Responder,
        address: u8,
        bytes: &[u8],
    ) -> Result<usize, SimError> {
        let general = address == GENERAL_CALL;
        if !self.bus.answers(address, false) {
            return Err(SimError::AddressNack);
        }
        let start = if general {
            Status::SrGcallAck
        } else {
            Status::SrSlaAck
        };
        self.raise(slave, start)?;

        let mut accepted = 0;
        for &byte in bytes {
            let ack = self.bus.control() & TWEA != 0;
            self.bus.load(byte);
            let status = match (ack, general) {
                (true, false) => Status::SrDataAck,
                (true, true) => Status::SrGcallDataAck,
                (false, false) => Status::SrDataNack,
                (false, true) => Status::SrGcallDataNack,
            };
            self.raise(slave, status)?;
            if !ack {
                return Ok(accepted);
            }
            accepted += 1;
        }

        if self.bus.is_armed() {
            self.raise(slave, Status::SrStop)?;
        }
        Ok(accepted)
    }

    /// Report an arbitration-loss status to the slave
    pub fn lose_arbitration(&self, slave: &impl Responder, status: Status) -> Result<(), SimError> {
        self.raise(slave, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::BusAction;

    #[test]
    fn test_control_writes_are_logged() {
        let bus = SimBus::new();
        let mut regs = &bus;
        regs.set_control(BusAction::Listen.bits());
        regs.set_control(BusAction::Connect.bits());
        assert_eq!(
            &bus.control_writes()[..],
            &[BusAction::Listen.bits(), BusAction::Connect.bits()]
        );
        assert!(bus.is_armed());
    }

    #[test]
    fn test_log_keeps_newest() {
        let bus = SimBus::new();
        let mut regs = &bus;
        for i in 0..(WRITE_LOG as u8 + 3) {
            regs.set_control(i);
        }
        let writes = bus.control_writes();
        assert_eq!(writes.len(), WRITE_LOG);
        assert_eq!(writes[0], 3);
    }

    #[test]
    fn test_address_matching() {
        let bus = SimBus::new();
        let mut regs = &bus;
        regs.set_address(0x42 << 1);
        regs.set_control(BusAction::Listen.bits());
        assert!(bus.answers(0x42, true));
        assert!(!bus.answers(0x43, false));
        assert!(!bus.answers(GENERAL_CALL, false));

        regs.set_address((0x42 << 1) | 1);
        assert!(bus.answers(GENERAL_CALL, false));
        assert!(!bus.answers(GENERAL_CALL, true));

        regs.set_control(BusAction::Refuse.bits());
        assert!(!bus.answers(0x42, true));
    }
}
