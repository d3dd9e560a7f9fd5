//! TWI slave status codes and transaction phases
//!
//! The hardware reports one status code per bus event. Many codes share
//! the same handling, so the interrupt handler first collapses them into
//! a [`Phase`].

use twislave_hal::STATUS_MASK;

/// Slave-mode status codes (status register with the prescaler masked)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    /// Own address + W received, ACK returned
    SrSlaAck = 0x60,
    /// Arbitration lost as master; own address + W received, ACK returned
    SrArbLostSlaAck = 0x68,
    /// General call received, ACK returned
    SrGcallAck = 0x70,
    /// Arbitration lost as master; general call received, ACK returned
    SrArbLostGcallAck = 0x78,
    /// Data received after own address, ACK returned
    SrDataAck = 0x80,
    /// Data received after own address, NACK returned
    SrDataNack = 0x88,
    /// Data received after general call, ACK returned
    SrGcallDataAck = 0x90,
    /// Data received after general call, NACK returned
    SrGcallDataNack = 0x98,
    /// Stop or repeated start while addressed as receiver
    SrStop = 0xA0,
    /// Own address + R received, ACK returned
    StSlaAck = 0xA8,
    /// Arbitration lost as master; own address + R received, ACK returned
    StArbLostSlaAck = 0xB0,
    /// Data transmitted, ACK received
    StDataAck = 0xB8,
    /// Data transmitted, NACK received
    StDataNack = 0xC0,
    /// Last data byte transmitted (acknowledge-enable cleared), ACK received
    StLastData = 0xC8,
    /// No relevant state information
    NoInfo = 0xF8,
    /// Illegal start or stop condition
    BusError = 0x00,
}

impl Status {
    /// Decode a raw status register value
    pub fn from_register(value: u8) -> Option<Self> {
        use Status::*;

        let status = match value & STATUS_MASK {
            0x60 => SrSlaAck,
            0x68 => SrArbLostSlaAck,
            0x70 => SrGcallAck,
            0x78 => SrArbLostGcallAck,
            0x80 => SrDataAck,
            0x88 => SrDataNack,
            0x90 => SrGcallDataAck,
            0x98 => SrGcallDataNack,
            0xA0 => SrStop,
            0xA8 => StSlaAck,
            0xB0 => StArbLostSlaAck,
            0xB8 => StDataAck,
            0xC0 => StDataNack,
            0xC8 => StLastData,
            0xF8 => NoInfo,
            0x00 => BusError,
            _ => return None,
        };
        Some(status)
    }

    /// Raw status code
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// What a bus event means for the current transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Addressed as receiver (own address or general call)
    ReceiveStart,
    /// A data byte arrived and was acknowledged
    ReceiveByte,
    /// Addressed as transmitter; first byte requested
    TransmitStart,
    /// Master acknowledged the previous byte and wants another
    TransmitByte,
    /// Master stopped reading
    TransmitEnd,
    /// Received byte NACKed, or stop while receiving
    ReceiveEnd,
    /// Lost arbitration and got addressed while doing so
    ArbitrationLost,
    /// Anything else; left alone
    Unrecognized,
}

impl Phase {
    /// Phase for a raw status register value
    pub fn decode(value: u8) -> Self {
        Status::from_register(value).map_or(Phase::Unrecognized, Phase::from)
    }
}

impl From<Status> for Phase {
    fn from(status: Status) -> Self {
        use Status::*;

        match status {
            SrSlaAck | SrGcallAck => Phase::ReceiveStart,
            SrDataAck | SrGcallDataAck => Phase::ReceiveByte,
            StSlaAck => Phase::TransmitStart,
            StDataAck => Phase::TransmitByte,
            StLastData | StDataNack => Phase::TransmitEnd,
            SrDataNack | SrGcallDataNack | SrStop => Phase::ReceiveEnd,
            StArbLostSlaAck | SrArbLostSlaAck | SrArbLostGcallAck => Phase::ArbitrationLost,
            NoInfo | BusError => Phase::Unrecognized,
        }
    }
}
