//! Shared driver handle
//!
//! [`TwiSlave`] is meant to live in a `static`: the interrupt vector calls
//! [`TwiSlave::on_interrupt`] and the main line calls everything else.
//! Each operation holds a critical section only while it touches driver
//! state. Blocking receive polls the busy indicator between critical
//! sections, so the interrupt handler runs while the caller waits.

use core::cell::RefCell;

use critical_section::Mutex;
use twislave_hal::{SlaveConfig, TwiPeripheral};

use crate::callback::{Consumer, NoCallback, Producer};
use crate::controller::Controller;
use crate::error::Error;
use crate::DEFAULT_CAPACITY;

/// Decides whether a blocking receive keeps spinning
pub trait WaitPolicy {
    /// Called once per poll of the busy indicator; `false` gives up
    fn keep_waiting(&mut self) -> bool;
}

/// Wait until the transfer completes, however long that takes
#[derive(Debug, Clone, Copy, Default)]
pub struct Forever;

impl WaitPolicy for Forever {
    fn keep_waiting(&mut self) -> bool {
        true
    }
}

/// Give up after a fixed number of polls
#[derive(Debug, Clone, Copy)]
pub struct SpinLimit(pub u32);

impl WaitPolicy for SpinLimit {
    fn keep_waiting(&mut self) -> bool {
        if self.0 == 0 {
            false
        } else {
            self.0 -= 1;
            true
        }
    }
}

impl<F: FnMut() -> bool> WaitPolicy for F {
    fn keep_waiting(&mut self) -> bool {
        self()
    }
}

/// TWI slave driver shared between caller and interrupt context
///
/// `N` is the transfer buffer capacity. `C` and `D` are the consumer and
/// producer callback types; use [`NoCallback`] when there are none.
///
/// Callbacks run inside the interrupt handler's critical section and must
/// not call back into the driver.
pub struct TwiSlave<P, C = NoCallback, D = NoCallback, const N: usize = DEFAULT_CAPACITY> {
    inner: Mutex<RefCell<Option<Controller<P, C, D, N>>>>,
}

impl<P, C, D, const N: usize> Default for TwiSlave<P, C, D, N>
where
    P: TwiPeripheral,
    C: Consumer,
    D: Producer,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, C, D, const N: usize> TwiSlave<P, C, D, N>
where
    P: TwiPeripheral,
    C: Consumer,
    D: Producer,
{
    /// Uninitialized driver, suitable for a `static`
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Controller<P, C, D, N>) -> R) -> Result<R, Error> {
        critical_section::with(|cs| {
            let mut inner = self.inner.borrow_ref_mut(cs);
            inner.as_mut().map(f).ok_or(Error::NotInitialized)
        })
    }

    /// Take ownership of the peripheral and start listening
    ///
    /// Programs the own-address register, installs the callbacks, zeroes
    /// the buffer, issues Listen and enables interrupts globally. Call
    /// once; a second call replaces the driver state.
    pub fn initialize(
        &self,
        peripheral: P,
        config: SlaveConfig,
        consumer: Option<C>,
        producer: Option<D>,
    ) -> Result<(), Error> {
        let controller = Controller::new(peripheral, config, consumer, producer)?;
        critical_section::with(|cs| {
            self.inner.borrow_ref_mut(cs).replace(controller);
        });
        Ok(())
    }

    /// Queue `size` bytes of `data` for the next master read
    ///
    /// Returns as soon as the bytes are copied; the interrupt handler
    /// transmits them.
    pub fn send(&self, data: &[u8], size: usize) -> Result<(), Error> {
        self.with(|c| c.arm_send(data, size))?
    }

    /// Receive `size` bytes from the next master write into `data`
    ///
    /// Blocks until the master finishes, with no timeout. Use
    /// [`Self::receive_with`] to bound the wait.
    pub fn receive(&self, data: &mut [u8], size: usize) -> Result<(), Error> {
        self.receive_with(data, size, Forever)
    }

    /// Receive, consulting `wait` on every poll of the busy indicator
    ///
    /// When the policy gives up while the bus is still busy the driver
    /// disconnects and `Timeout` is returned. A transfer that finished
    /// since the last poll is still delivered.
    pub fn receive_with<W: WaitPolicy>(
        &self,
        data: &mut [u8],
        size: usize,
        mut wait: W,
    ) -> Result<(), Error> {
        self.with(|c| c.arm_receive(data.len(), size))??;

        while self.is_busy() {
            if wait.keep_waiting() {
                continue;
            }
            // The interrupt may have completed the transfer since the poll
            let timed_out = self.with(|c| {
                let busy = c.is_busy();
                if busy {
                    c.disconnect();
                }
                busy
            })?;
            if timed_out {
                debug!("twi: receive timed out");
                return Err(Error::Timeout);
            }
            break;
        }

        self.with(|c| c.finish_receive(&mut data[..size]))?
    }

    /// Route byte events through the registered callbacks
    pub fn begin_handler_transaction(&self) -> Result<(), Error> {
        self.with(|c| c.begin_handler_transaction())
    }

    /// Return to buffer mode and disconnect
    pub fn stop_handler_transaction(&self) -> Result<(), Error> {
        self.with(|c| c.stop_handler_transaction())
    }

    /// A transaction is in progress
    pub fn is_busy(&self) -> bool {
        self.with(|c| c.is_busy()).unwrap_or(false)
    }

    /// Most recent status code seen by the interrupt handler
    pub fn last_status(&self) -> u8 {
        self.with(|c| c.last_status()).unwrap_or(0)
    }

    /// Status code of the last arbitration loss, 0 if none on the latest event
    pub fn last_error(&self) -> u8 {
        self.with(|c| c.last_error()).unwrap_or(0)
    }

    /// Handler mode flag
    pub fn handler_enabled(&self) -> bool {
        self.with(|c| c.handler_enabled()).unwrap_or(false)
    }

    /// Bytes moved so far in the current transfer, in either direction
    pub fn transferred(&self) -> usize {
        self.with(|c| c.buffer().index()).unwrap_or(0)
    }

    /// TWI interrupt entry point
    ///
    /// Does nothing before [`Self::initialize`].
    pub fn on_interrupt(&self) {
        let _ = self.with(|c| c.on_interrupt());
    }
}
