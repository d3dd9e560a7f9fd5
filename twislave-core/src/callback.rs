//! Callback bridge
//!
//! Optional per-byte handlers that replace the transfer buffer while
//! handler mode is enabled. Any `FnMut(u8) -> Response` is a
//! [`Consumer`] and any `FnMut(&mut u8) -> Response` is a [`Producer`].

use crate::control::Response;

/// Handles bytes written by the master
pub trait Consumer {
    /// Called once per received byte
    fn consume(&mut self, byte: u8) -> Response;
}

/// Supplies bytes read by the master
pub trait Producer {
    /// Called once per byte to transmit; write the byte through `byte`
    fn produce(&mut self, byte: &mut u8) -> Response;
}

impl<F: FnMut(u8) -> Response> Consumer for F {
    fn consume(&mut self, byte: u8) -> Response {
        self(byte)
    }
}

impl<F: FnMut(&mut u8) -> Response> Producer for F {
    fn produce(&mut self, byte: &mut u8) -> Response {
        self(byte)
    }
}

/// Placeholder handler type for drivers without callbacks
///
/// Uninhabited, so `Option<NoCallback>` is always `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoCallback {}

impl Consumer for NoCallback {
    fn consume(&mut self, _byte: u8) -> Response {
        match *self {}
    }
}

impl Producer for NoCallback {
    fn produce(&mut self, _byte: &mut u8) -> Response {
        match *self {}
    }
}

/// Registered handlers plus the handler-mode flag
#[derive(Debug)]
pub struct CallbackBridge<C, D> {
    consumer: Option<C>,
    producer: Option<D>,
    enabled: bool,
}

impl<C: Consumer, D: Producer> CallbackBridge<C, D> {
    /// Install handlers; handler mode starts disabled
    pub fn new(consumer: Option<C>, producer: Option<D>) -> Self {
        Self {
            consumer,
            producer,
            enabled: false,
        }
    }

    /// Turn handler mode on or off
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Handler mode flag
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Consumer to use for the current byte, if handler mode governs it
    pub fn consumer(&mut self) -> Option<&mut C> {
        if self.enabled {
            self.consumer.as_mut()
        } else {
            None
        }
    }

    /// Producer to use for the current byte, if handler mode governs it
    pub fn producer(&mut self) -> Option<&mut D> {
        if self.enabled {
            self.producer.as_mut()
        } else {
            None
        }
    }
}
