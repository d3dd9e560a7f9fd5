//! Protocol state machine
//!
//! [`Controller`] owns the peripheral, the transfer buffer and the
//! callback bridge. Caller-context operations arm a transfer and hand the
//! bus to the interrupt handler with a Connect; from then on only
//! [`Controller::on_interrupt`] moves the buffer cursor, until it writes
//! Disconnect.
//!
//! The controller itself is not shared. [`crate::TwiSlave`] wraps it for
//! use from both contexts.

use twislave_hal::{SlaveConfig, TwiPeripheral};

use crate::buffer::TransferBuffer;
use crate::callback::{CallbackBridge, Consumer, Producer};
use crate::control::BusAction;
use crate::error::Error;
use crate::status::Phase;

/// Driver state for one TWI peripheral
pub struct Controller<P, C, D, const N: usize> {
    peripheral: P,
    config: SlaveConfig,
    last_status: u8,
    last_error: u8,
    buffer: TransferBuffer<N>,
    callbacks: CallbackBridge<C, D>,
}

impl<P, C, D, const N: usize> Controller<P, C, D, N>
where
    P: TwiPeripheral,
    C: Consumer,
    D: Producer,
{
    /// Program the slave address and start listening
    ///
    /// Clears the peripheral registers, writes the own-address register,
    /// zeroes the buffer, issues Listen and enables interrupts globally.
    pub fn new(
        mut peripheral: P,
        config: SlaveConfig,
        consumer: Option<C>,
        producer: Option<D>,
    ) -> Result<Self, Error> {
        if !config.is_valid() {
            debug!("twi: rejected slave address {=u8:#x}", config.address);
            return Err(Error::InvalidArgument);
        }

        peripheral.reset();
        peripheral.set_address(config.address_register());

        let mut controller = Self {
            peripheral,
            config,
            last_status: 0,
            last_error: 0,
            buffer: TransferBuffer::new(),
            callbacks: CallbackBridge::new(consumer, producer),
        };
        controller.apply(BusAction::Listen);
        controller.peripheral.enable_interrupts();

        debug!(
            "twi: listening on {=u8:#x}, general call {=bool}",
            config.address,
            config.general_call
        );
        Ok(controller)
    }

    fn apply(&mut self, action: BusAction) {
        self.peripheral.set_control(action.bits());
    }

    /// Addressing configuration
    pub fn config(&self) -> &SlaveConfig {
        &self.config
    }

    /// Access the underlying peripheral
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    /// Transfer buffer state
    pub fn buffer(&self) -> &TransferBuffer<N> {
        &self.buffer
    }

    /// A transaction is in progress
    pub fn is_busy(&self) -> bool {
        self.peripheral.interrupt_enabled()
    }

    /// Most recent status code seen by the interrupt handler
    pub fn last_status(&self) -> u8 {
        self.last_status
    }

    /// Status code of the last bus fault, 0 if the latest event was clean
    pub fn last_error(&self) -> u8 {
        self.last_error
    }

    /// Handler mode flag
    pub fn handler_enabled(&self) -> bool {
        self.callbacks.is_enabled()
    }

    fn check_request(&self, available: usize, size: usize) -> Result<(), Error> {
        if self.is_busy() {
            return Err(Error::Busy);
        }
        if available < size {
            return Err(Error::InvalidArgument);
        }
        if size > N {
            return Err(Error::TooLarge);
        }
        Ok(())
    }

    /// Load `size` bytes of `data` for the next master read and connect
    pub fn arm_send(&mut self, data: &[u8], size: usize) -> Result<(), Error> {
        if let Err(e) = self.check_request(data.len(), size) {
            debug!("twi: send of {=usize} bytes rejected", size);
            return Err(e);
        }
        self.buffer.load(&data[..size])?;
        self.apply(BusAction::Connect);
        Ok(())
    }

    /// Expect `size` bytes from the next master write and connect
    ///
    /// `available` is the length of the caller's destination.
    pub fn arm_receive(&mut self, available: usize, size: usize) -> Result<(), Error> {
        if let Err(e) = self.check_request(available, size) {
            debug!("twi: receive of {=usize} bytes rejected", size);
            return Err(e);
        }
        self.buffer.expect(size)?;
        self.apply(BusAction::Connect);
        Ok(())
    }

    /// Copy a completed receive into `data`
    ///
    /// Only meaningful once the bus has gone idle after [`Self::arm_receive`].
    pub fn finish_receive(&self, data: &mut [u8]) -> Result<(), Error> {
        if !self.buffer.is_complete() {
            debug!(
                "twi: receive incomplete, {=usize} of {=usize} bytes",
                self.buffer.index(),
                self.buffer.size()
            );
            return Err(Error::ProtocolError);
        }
        let filled = self.buffer.filled();
        data[..filled.len()].copy_from_slice(filled);
        Ok(())
    }

    /// Route byte events through the callbacks and connect
    pub fn begin_handler_transaction(&mut self) {
        self.callbacks.set_enabled(true);
        self.apply(BusAction::Connect);
    }

    /// Return to buffer mode and disconnect
    pub fn stop_handler_transaction(&mut self) {
        self.callbacks.set_enabled(false);
        self.apply(BusAction::Disconnect);
    }

    /// Drop out of interrupt-driven mode without touching the buffer
    pub fn disconnect(&mut self) {
        self.apply(BusAction::Disconnect);
    }

    /// Service one bus event
    ///
    /// Must be called from the TWI interrupt vector. Never blocks.
    pub fn on_interrupt(&mut self) {
        let status = self.peripheral.status_code();
        self.last_status = status;
        self.last_error = 0;

        let phase = Phase::decode(status);
        trace!("twi: status {=u8:#x} -> {}", status, phase);

        match phase {
            Phase::ReceiveStart => {
                self.buffer.rewind();
                self.apply(BusAction::Acknowledge);
            }
            Phase::ReceiveByte => self.receive_byte(),
            Phase::TransmitStart => {
                self.buffer.rewind();
                self.transmit_byte();
            }
            Phase::TransmitByte => self.transmit_byte(),
            Phase::TransmitEnd | Phase::ReceiveEnd => self.apply(BusAction::Disconnect),
            Phase::ArbitrationLost => {
                warn!("twi: arbitration lost, status {=u8:#x}", status);
                self.last_error = status;
                self.apply(BusAction::Disconnect);
            }
            Phase::Unrecognized => {}
        }
    }

    fn receive_byte(&mut self) {
        let byte = self.peripheral.data();
        let action = if let Some(consumer) = self.callbacks.consumer() {
            consumer.consume(byte).action()
        } else if self.buffer.push(byte) {
            BusAction::Acknowledge
        } else {
            BusAction::Disconnect
        };
        self.apply(action);
    }

    fn transmit_byte(&mut self) {
        let action = if let Some(producer) = self.callbacks.producer() {
            let mut byte = 0;
            let response = producer.produce(&mut byte);
            self.peripheral.set_data(byte);
            response.action()
        } else if let Some(byte) = self.buffer.pop() {
            self.peripheral.set_data(byte);
            if self.buffer.remaining() == 0 {
                BusAction::LastByte
            } else {
                BusAction::Acknowledge
            }
        } else {
            BusAction::Disconnect
        };
        self.apply(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::NoCallback;
    use crate::control::Response;
    use crate::sim::SimBus;
    use crate::status::Status;

    type Buffered<'a> = Controller<&'a SimBus, NoCallback, NoCallback, 8>;

    fn buffered(bus: &SimBus) -> Buffered<'_> {
        Controller::new(bus, SlaveConfig::new(0x42), None, None).unwrap()
    }

    fn event<C: Consumer, D: Producer, const N: usize>(
        controller: &mut Controller<&SimBus, C, D, N>,
        bus: &SimBus,
        status: Status,
    ) {
        bus.post(status);
        controller.on_interrupt();
    }

    #[test]
    fn test_initialize_programs_registers() {
        let bus = SimBus::new();
        let controller = buffered(&bus);
        assert_eq!(bus.address(), 0x84);
        assert_eq!(bus.control(), BusAction::Listen.bits());
        assert!(bus.global_interrupts());
        assert!(!controller.is_busy());
        assert_eq!(controller.last_status(), 0);
        assert_eq!(controller.buffer().size(), 0);
    }

    #[test]
    fn test_initialize_with_general_call() {
        let bus = SimBus::new();
        let config = SlaveConfig::new(0x10).with_general_call(true);
        let _c: Buffered<'_> = Controller::new(&bus, config, None, None).unwrap();
        assert_eq!(bus.address(), 0x21);
    }

    #[test]
    fn test_initialize_rejects_bad_address() {
        let bus = SimBus::new();
        let result: Result<Buffered<'_>, _> =
            Controller::new(&bus, SlaveConfig::new(0x80), None, None);
        assert!(matches!(result, Err(Error::InvalidArgument)));
        assert_eq!(bus.control_writes().len(), 0);
    }

    #[test]
    fn test_arm_send_connects() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_send(&[1, 2, 3], 3).unwrap();
        assert!(c.is_busy());
        assert_eq!(bus.control(), BusAction::Connect.bits());
        assert_eq!(c.buffer().size(), 3);
        assert_eq!(c.buffer().index(), 0);
    }

    #[test]
    fn test_arm_send_checks_in_order() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        // Absent data wins over oversize
        assert_eq!(c.arm_send(&[], 9), Err(Error::InvalidArgument));
        assert_eq!(c.arm_send(&[0; 9], 9), Err(Error::TooLarge));
        assert!(!c.is_busy());

        c.arm_send(&[1], 1).unwrap();
        assert_eq!(c.arm_send(&[0; 9], 9), Err(Error::Busy));
        assert_eq!(c.arm_receive(1, 1), Err(Error::Busy));
    }

    #[test]
    fn test_send_uses_only_size_bytes() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_send(&[5, 6, 7, 8], 2).unwrap();
        assert_eq!(c.buffer().size(), 2);
    }

    #[test]
    fn test_transmit_sequence() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_send(&[0xA1, 0xB2], 2).unwrap();

        event(&mut c, &bus, Status::StSlaAck);
        assert_eq!(bus.data(), 0xA1);
        assert_eq!(bus.control(), BusAction::Acknowledge.bits());

        event(&mut c, &bus, Status::StDataAck);
        assert_eq!(bus.data(), 0xB2);
        assert_eq!(bus.control(), BusAction::LastByte.bits());

        event(&mut c, &bus, Status::StDataNack);
        assert_eq!(bus.control(), BusAction::Disconnect.bits());
        assert!(!c.is_busy());
    }

    #[test]
    fn test_transmit_start_rewinds() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_send(&[1, 2, 3], 3).unwrap();
        event(&mut c, &bus, Status::StSlaAck);
        event(&mut c, &bus, Status::StDataAck);
        // Repeated start: master reads again from the top
        event(&mut c, &bus, Status::StSlaAck);
        assert_eq!(bus.data(), 1);
        assert_eq!(c.buffer().index(), 1);
    }

    #[test]
    fn test_transmit_past_end_disconnects() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_send(&[], 0).unwrap();
        event(&mut c, &bus, Status::StSlaAck);
        assert_eq!(bus.control(), BusAction::Disconnect.bits());
    }

    #[test]
    fn test_receive_sequence() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_receive(2, 2).unwrap();

        event(&mut c, &bus, Status::SrSlaAck);
        assert_eq!(bus.control(), BusAction::Acknowledge.bits());

        bus.load(0x10);
        event(&mut c, &bus, Status::SrDataAck);
        bus.load(0x20);
        event(&mut c, &bus, Status::SrDataAck);
        assert_eq!(c.buffer().index(), 2);
        assert_eq!(bus.control(), BusAction::Acknowledge.bits());

        event(&mut c, &bus, Status::SrStop);
        assert!(!c.is_busy());

        let mut out = [0u8; 2];
        c.finish_receive(&mut out).unwrap();
        assert_eq!(out, [0x10, 0x20]);
    }

    #[test]
    fn test_receive_overflow_disconnects() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_receive(1, 1).unwrap();
        event(&mut c, &bus, Status::SrSlaAck);
        bus.load(1);
        event(&mut c, &bus, Status::SrDataAck);
        bus.load(2);
        event(&mut c, &bus, Status::SrDataAck);
        assert_eq!(bus.control(), BusAction::Disconnect.bits());
        assert_eq!(c.buffer().filled(), &[1]);
    }

    #[test]
    fn test_short_receive_is_protocol_error() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_receive(3, 3).unwrap();
        event(&mut c, &bus, Status::SrGcallAck);
        bus.load(9);
        event(&mut c, &bus, Status::SrGcallDataAck);
        event(&mut c, &bus, Status::SrStop);
        let mut out = [0u8; 3];
        assert_eq!(c.finish_receive(&mut out), Err(Error::ProtocolError));
        assert_eq!(out, [0, 0, 0]);
    }

    #[test]
    fn test_receive_end_codes_disconnect() {
        for status in [Status::SrDataNack, Status::SrGcallDataNack, Status::SrStop] {
            let bus = SimBus::new();
            let mut c = buffered(&bus);
            c.arm_receive(4, 4).unwrap();
            event(&mut c, &bus, status);
            assert!(!c.is_busy());
        }
    }

    #[test]
    fn test_arbitration_loss_recorded() {
        for status in [
            Status::StArbLostSlaAck,
            Status::SrArbLostSlaAck,
            Status::SrArbLostGcallAck,
        ] {
            let bus = SimBus::new();
            let mut c = buffered(&bus);
            c.arm_send(&[1], 1).unwrap();
            event(&mut c, &bus, status);
            assert_eq!(c.last_error(), status.code());
            assert_eq!(c.last_status(), status.code());
            assert!(!c.is_busy());
        }
    }

    #[test]
    fn test_last_error_cleared_on_next_event() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_send(&[1], 1).unwrap();
        event(&mut c, &bus, Status::StArbLostSlaAck);
        assert_ne!(c.last_error(), 0);
        c.arm_send(&[1], 1).unwrap();
        event(&mut c, &bus, Status::StSlaAck);
        assert_eq!(c.last_error(), 0);
    }

    #[test]
    fn test_unrecognized_status_is_ignored() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_send(&[1, 2], 2).unwrap();
        let writes = bus.control_writes().len();
        event(&mut c, &bus, Status::NoInfo);
        event(&mut c, &bus, Status::BusError);
        assert_eq!(bus.control_writes().len(), writes);
        assert_eq!(c.last_status(), 0x00);
        assert!(c.is_busy());
        assert_eq!(c.buffer().index(), 0);
    }

    #[test]
    fn test_stop_handler_is_idempotent() {
        let bus = SimBus::new();
        let mut c = buffered(&bus);
        c.arm_send(&[4, 5], 2).unwrap();
        event(&mut c, &bus, Status::StSlaAck);
        event(&mut c, &bus, Status::StDataAck);
        event(&mut c, &bus, Status::StDataNack);

        c.stop_handler_transaction();
        c.stop_handler_transaction();
        assert!(!c.handler_enabled());
        assert!(!c.is_busy());
        assert_eq!(bus.control(), BusAction::Disconnect.bits());
        assert_eq!(c.buffer().size(), 2);
        assert_eq!(c.buffer().index(), 2);
    }

    #[test]
    fn test_consumer_steers_acknowledge() {
        let bus = SimBus::new();
        let mut seen = heapless::Vec::<u8, 8>::new();
        {
            let consumer = |b: u8| {
                seen.push(b).ok();
                if b == 0xFF {
                    Response::Refuse
                } else {
                    Response::Acknowledge
                }
            };
            let mut c: Controller<&SimBus, _, NoCallback, 8> =
                Controller::new(&bus, SlaveConfig::new(0x42), Some(consumer), None).unwrap();
            c.begin_handler_transaction();
            assert!(c.is_busy());

            event(&mut c, &bus, Status::SrSlaAck);
            bus.load(0x01);
            event(&mut c, &bus, Status::SrDataAck);
            assert_eq!(bus.control(), BusAction::Acknowledge.bits());
            bus.load(0xFF);
            event(&mut c, &bus, Status::SrDataAck);
            assert_eq!(bus.control(), BusAction::Refuse.bits());
            // Buffer untouched in handler mode
            assert_eq!(c.buffer().index(), 0);
        }
        assert_eq!(&seen[..], &[0x01, 0xFF]);
    }

    #[test]
    fn test_producer_response_codes() {
        let bus = SimBus::new();
        let mut next = 0u8;
        let producer = |b: &mut u8| {
            next += 1;
            *b = next;
            match next {
                1 => Response::Acknowledge,
                2 => Response::Finish,
                3 => Response::Stretch,
                _ => Response::Disconnect,
            }
        };
        let mut c: Controller<&SimBus, NoCallback, _, 8> =
            Controller::new(&bus, SlaveConfig::new(0x42), None, Some(producer)).unwrap();
        c.begin_handler_transaction();

        event(&mut c, &bus, Status::StSlaAck);
        assert_eq!((bus.data(), bus.control()), (1, BusAction::Acknowledge.bits()));
        event(&mut c, &bus, Status::StDataAck);
        assert_eq!((bus.data(), bus.control()), (2, BusAction::Finished.bits()));
        event(&mut c, &bus, Status::StDataAck);
        assert_eq!((bus.data(), bus.control()), (3, BusAction::Stretch.bits()));
        event(&mut c, &bus, Status::StDataAck);
        assert_eq!((bus.data(), bus.control()), (4, BusAction::Disconnect.bits()));
    }

    #[test]
    fn test_handler_mode_without_producer_uses_buffer() {
        let bus = SimBus::new();
        let consumer = |_b: u8| Response::Acknowledge;
        let mut c: Controller<&SimBus, _, NoCallback, 8> =
            Controller::new(&bus, SlaveConfig::new(0x42), Some(consumer), None).unwrap();
        c.arm_send(&[0x77], 1).unwrap();
        c.begin_handler_transaction();
        event(&mut c, &bus, Status::StSlaAck);
        assert_eq!(bus.data(), 0x77);
        assert_eq!(bus.control(), BusAction::LastByte.bits());
    }
}
