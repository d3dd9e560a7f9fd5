//! Bus control actions
//!
//! Every decision the driver makes ends in exactly one write to the TWI
//! control register. [`BusAction`] names those writes; [`Response`] is
//! what a callback returns to pick one of them.

use twislave_hal::control::{TWEA, TWEN, TWIE, TWINT, TWSTO};

/// A control register pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusAction {
    /// Answer the own address, no interrupts (used at initialization)
    Listen,
    /// Enter the interrupt-driven cycle and release the clock
    Connect,
    /// Leave interrupt-driven mode, ending the transaction
    Disconnect,
    /// Phase completed, keep servicing interrupts
    Finished,
    /// Keep servicing interrupts with the stop/reset request bit set
    Stretch,
    /// Acknowledge the next byte
    Acknowledge,
    /// Refuse (NACK) the next byte
    Refuse,
    /// Final byte loaded for transmission; expect the master's NACK
    LastByte,
}

impl BusAction {
    /// Control register value for this action
    pub const fn bits(self) -> u8 {
        match self {
            BusAction::Listen => TWEA | TWEN,
            BusAction::Connect | BusAction::Finished | BusAction::Acknowledge => {
                TWEA | TWINT | TWEN | TWIE
            }
            // Acknowledge-enable stays set so the address still matches.
            BusAction::Disconnect => TWEA | TWINT | TWEN,
            BusAction::Stretch => TWEA | TWINT | TWEN | TWIE | TWSTO,
            BusAction::Refuse | BusAction::LastByte => TWINT | TWEN | TWIE,
        }
    }

    /// Whether the busy indicator is set after this action
    pub const fn keeps_busy(self) -> bool {
        self.bits() & TWIE != 0
    }
}

/// Per-byte verdict returned by a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Continue the transfer
    Acknowledge,
    /// NACK the next byte
    Refuse,
    /// End the transaction
    Disconnect,
    /// Phase done but stay connected for further interrupts
    Finish,
    /// Hold off with the stop/reset request bit
    Stretch,
}

impl Response {
    /// Decode an integer response code
    ///
    /// `0` refuses, `-1` disconnects, `-2` finishes; everything else
    /// acknowledges.
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Response::Refuse,
            -1 => Response::Disconnect,
            -2 => Response::Finish,
            _ => Response::Acknowledge,
        }
    }

    /// The control register write this response selects
    pub const fn action(self) -> BusAction {
        match self {
            Response::Acknowledge => BusAction::Acknowledge,
            Response::Refuse => BusAction::Refuse,
            Response::Disconnect => BusAction::Disconnect,
            Response::Finish => BusAction::Finished,
            Response::Stretch => BusAction::Stretch,
        }
    }
}

impl From<i32> for Response {
    fn from(code: i32) -> Self {
        Response::from_code(code)
    }
}
