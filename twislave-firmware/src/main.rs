//! TWI slave echo firmware
//!
//! Answers at address 0x42. Each transaction pair is a master write of
//! `FRAME_LEN` bytes followed by a master read that returns the same
//! bytes, each incremented by one.

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use avr_device::atmega328p::Peripherals;
use panic_halt as _;

use twislave_core::{NoCallback, SlaveConfig, TwiSlave};
use twislave_hal_atmega328p::Atmega328pTwi;

/// Own address on the bus
const ADDRESS: u8 = 0x42;

/// Bytes per echo frame
const FRAME_LEN: usize = 4;

/// Buffer capacity; one frame is all the echo ever holds
const CAPACITY: usize = 32;

static SLAVE: TwiSlave<Atmega328pTwi, NoCallback, NoCallback, CAPACITY> = TwiSlave::new();

#[avr_device::entry]
fn main() -> ! {
    let Some(dp) = Peripherals::take() else {
        halt();
    };

    // Power reduction keeps the TWI clock gated until cleared
    dp.CPU.prr.modify(|_, w| w.prtwi().clear_bit());

    let config = SlaveConfig::new(ADDRESS);
    if SLAVE
        .initialize(Atmega328pTwi::new(dp.TWI), config, None, None)
        .is_err()
    {
        halt();
    }

    let mut frame = [0u8; FRAME_LEN];
    loop {
        if SLAVE.receive(&mut frame, FRAME_LEN).is_err() {
            // Short write; wait for the next one
            continue;
        }

        for byte in frame.iter_mut() {
            *byte = byte.wrapping_add(1);
        }

        if SLAVE.send(&frame, FRAME_LEN).is_ok() {
            while SLAVE.is_busy() {}
        }
    }
}

fn halt() -> ! {
    loop {
        avr_device::asm::sleep();
    }
}

#[avr_device::interrupt(atmega328p)]
fn TWI() {
    SLAVE.on_interrupt();
}
