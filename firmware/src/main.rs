//! UART driven USB keypad.
//!
//! Every byte received on LPUART2 is echoed back with a one line report of
//! what it mapped to, and mapped bytes are typed on the host as keypad
//! keystrokes through a boot protocol HID keyboard.

#![no_std]
#![no_main]

use teensy4_panic as _;

#[rtic::app(device = teensy4_bsp, peripherals = true)]
mod app {
    use heapless::spsc::{Consumer, Producer, Queue};
    use rtic_monotonics::rtic_time::embedded_hal::digital::OutputPin;
    use rtic_monotonics::systick::prelude::*;
    use teensy4_bsp::{self as bsp, board};

    use bsp::hal::{
        lpuart,
        usbd::{gpt, BusAdapter, EndpointMemory, EndpointState, Speed},
    };

    use usb_device::{
        bus::{UsbBus, UsbBusAllocator},
        class::UsbClass,
        device::{UsbDevice, UsbDeviceBuilder, UsbDeviceState, UsbVidPid},
        endpoint::EndpointAddress,
        UsbError,
    };
    use usbd_hid::{
        descriptor::{KeyboardReport, SerializedDescriptor as _},
        hid_class::HIDClass,
    };

    use uart_hid_shared::{Bridge, Error, LineConfig, Parity, ReportSink, SerialOut};

    systick_monotonic!(Mono, 1_000);

    /// Change me if you want to play with a full-speed USB device.
    const SPEED: Speed = Speed::High;
    /// https://pid.codes/1209/C00B/
    const VID_PID: UsbVidPid = UsbVidPid(0x1209, 0xC00B);
    const PRODUCT: &str = "uart-hid-bridge";
    /// The USB GPT timer that paces the bridge loop.
    const GPT_INSTANCE: gpt::Instance = gpt::Instance::Gpt0;
    /// One bridge iteration per tick.
    const BRIDGE_TICK_MS: u32 = 1;

    #[cfg(not(feature = "baud-115200"))]
    const LINE: LineConfig = LineConfig::CANONICAL;
    #[cfg(feature = "baud-115200")]
    const LINE: LineConfig = LineConfig::FAST;

    // board::lpuart only does 8N1
    const _: () = assert!(
        matches!(LINE.parity, Parity::None) && LINE.data_bits == 8 && LINE.stop_bits == 1
    );

    /// Received bytes waiting for the bridge loop.
    const RX_CAPACITY: usize = 64;
    /// Echo and diagnostic bytes waiting for the transmitter. A diagnostic
    /// line is 55 bytes, so this holds a burst of nine.
    const TX_CAPACITY: usize = 512;

    /// This allocation is shared across all USB endpoints. It needs to be large
    /// enough to hold the maximum packet size for *all* endpoints. If you start
    /// noticing panics, check to make sure that this is large enough for all endpoints.
    static EP_MEMORY: EndpointMemory<1024> = EndpointMemory::new();
    /// This manages the endpoints. It's large enough to hold the maximum number
    /// of endpoints; we're not using all the endpoints in this example.
    static EP_STATE: EndpointState = EndpointState::max_endpoints();

    type Bus = BusAdapter;

    #[local]
    struct Local {
        class: HIDClass<'static, Bus>,
        device: UsbDevice<'static, Bus>,
        led: board::Led,
        lpuart2: board::Lpuart2,
        rx_producer: Producer<'static, u8, RX_CAPACITY>,
        rx_consumer: Consumer<'static, u8, RX_CAPACITY>,
        tx_producer: Producer<'static, u8, TX_CAPACITY>,
        tx_consumer: Consumer<'static, u8, TX_CAPACITY>,
    }

    #[shared]
    struct Shared {}

    #[init(local = [
        bus: Option<UsbBusAllocator<Bus>> = None,
        rx_queue: Queue<u8, RX_CAPACITY> = Queue::new(),
        tx_queue: Queue<u8, TX_CAPACITY> = Queue::new(),
    ])]
    fn init(ctx: init::Context) -> (Shared, Local) {
        let board::Resources {
            usb: usbd,
            pins,
            lpuart2,
            mut gpio2,
            ..
        } = board::t41(ctx.device);
        let led = board::led(&mut gpio2, pins.p13);

        Mono::start(ctx.core.SYST, board::ARM_FREQUENCY);

        let mut lpuart2: board::Lpuart2 = board::lpuart(lpuart2, pins.p14, pins.p15, LINE.baud);
        lpuart2.disable(|lpuart2| {
            lpuart2.disable_fifo(lpuart::Direction::Tx);
            lpuart2.disable_fifo(lpuart::Direction::Rx);
            lpuart2.set_interrupts(lpuart::Interrupts::RECEIVE_FULL);
            lpuart2.set_parity(None);
        });

        let bus = BusAdapter::with_speed(usbd, &EP_MEMORY, &EP_STATE, SPEED);
        bus.set_interrupts(true);
        bus.gpt_mut(GPT_INSTANCE, |gpt| {
            gpt.stop();
            gpt.clear_elapsed();
            gpt.set_interrupt_enabled(true);
            gpt.set_mode(gpt::Mode::Repeat);
            gpt.set_load(BRIDGE_TICK_MS * 1000);
            gpt.reset();
            gpt.run();
        });

        let bus = ctx.local.bus.insert(UsbBusAllocator::new(bus));
        // Note that "4" correlates to a 1ms polling interval. Since this is a high speed
        // device, bInterval is computed differently.
        let class = HIDClass::new(bus, KeyboardReport::desc(), 4);
        let device = UsbDeviceBuilder::new(bus, VID_PID)
            .strings(&[usb_device::device::StringDescriptors::default().product(PRODUCT)])
            .unwrap()
            .max_packet_size_0(64)
            .unwrap()
            .build();

        let (rx_producer, rx_consumer) = ctx.local.rx_queue.split();
        let (tx_producer, tx_consumer) = ctx.local.tx_queue.split();

        log::info!("bridge up, serial {}", LINE);

        (
            Shared {},
            Local {
                class,
                device,
                led,
                lpuart2,
                rx_producer,
                rx_consumer,
                tx_producer,
                tx_consumer,
            },
        )
    }

    /// Tracks whether the last pushed report is still waiting for the host.
    ///
    /// The HID class owns the only non-control IN endpoint, so any IN
    /// completion off endpoint 0 is its report going out.
    pub struct InFlight {
        busy: bool,
    }

    impl InFlight {
        const fn new() -> Self {
            Self { busy: false }
        }
    }

    impl<B: UsbBus> UsbClass<B> for InFlight {
        fn reset(&mut self) {
            self.busy = false;
        }

        fn endpoint_in_complete(&mut self, addr: EndpointAddress) {
            if addr.index() != 0 {
                self.busy = false;
            }
        }
    }

    /// The HID IN endpoint as the sequencer sees it.
    struct UsbKeyboard<'a> {
        class: &'a HIDClass<'static, Bus>,
        in_flight: &'a mut InFlight,
        configured: bool,
    }

    impl ReportSink for UsbKeyboard<'_> {
        fn is_ready(&self) -> bool {
            self.configured && !self.in_flight.busy
        }

        fn submit(&mut self, report: &KeyboardReport) -> uart_hid_shared::Result<()> {
            if !self.configured {
                return Err(Error::NotReady);
            }

            match self.class.push_input(report) {
                Ok(_) => {
                    self.in_flight.busy = true;
                    Ok(())
                }
                Err(UsbError::WouldBlock) => {
                    self.in_flight.busy = true;
                    Err(Error::WouldBlock)
                }
                Err(_) => Err(Error::Transport),
            }
        }
    }

    /// Feeds the transmit queue drained by the LPUART2 interrupt.
    struct UartTx<'a> {
        queue: &'a mut Producer<'static, u8, TX_CAPACITY>,
        dropped: usize,
    }

    impl SerialOut for UartTx<'_> {
        fn write_bytes(&mut self, bytes: &[u8]) {
            for &byte in bytes {
                if self.queue.enqueue(byte).is_err() {
                    self.dropped += 1;
                }
            }
        }
    }

    #[task(binds = USB_OTG1, local = [device, class, led, rx_consumer, tx_producer, configured: bool = false, in_flight: InFlight = InFlight::new(), bridge: Bridge = Bridge::new()], priority = 2)]
    fn usb1(ctx: usb1::Context) {
        let usb1::LocalResources {
            class,
            device,
            led,
            rx_consumer,
            tx_producer,
            configured,
            in_flight,
            bridge,
            ..
        } = ctx.local;

        device.poll(&mut [class, in_flight]);

        if device.state() == UsbDeviceState::Configured {
            if !*configured {
                device.bus().configure();
                log::info!("configured by host");
            }
            *configured = true;
        } else {
            *configured = false;
            in_flight.busy = false;
        }

        let elapsed = device.bus().gpt_mut(GPT_INSTANCE, |gpt| {
            let elapsed = gpt.is_elapsed();
            while gpt.is_elapsed() {
                gpt.clear_elapsed();
            }
            elapsed
        });

        if !elapsed {
            return;
        }

        let now = Mono::now().ticks();

        // everything received since the last tick goes in before the step
        let mut tx = UartTx {
            queue: tx_producer,
            dropped: 0,
        };
        let mut wrote = false;
        while let Some(byte) = rx_consumer.dequeue() {
            bridge.on_byte(byte, now, &mut tx);
            wrote = true;
        }
        if tx.dropped > 0 {
            log::warn!("transmit queue full, dropped {} bytes", tx.dropped);
        }
        if wrote {
            rtic::pend(bsp::Interrupt::LPUART2);
        }

        bridge.poll(
            now,
            UsbKeyboard {
                class,
                in_flight,
                configured: *configured,
            },
        );

        if bridge.sequencer().is_key_down() {
            led.set_high().ok();
        } else {
            led.set_low().ok();
        }
    }

    #[task(binds = LPUART2, local = [lpuart2, rx_producer, tx_consumer, tx_armed: bool = false], priority = 3)]
    fn lpuart2_interrupt(ctx: lpuart2_interrupt::Context) {
        use lpuart::Status;
        let lpuart2_interrupt::LocalResources {
            lpuart2,
            rx_producer,
            tx_consumer,
            tx_armed,
            ..
        } = ctx.local;

        let status = lpuart2.status();
        lpuart2.clear_status(Status::W1C);

        if status.contains(Status::RECEIVE_FULL) {
            loop {
                let data = lpuart2.read_data();
                if data.flags().contains(lpuart::ReadFlags::RXEMPT) {
                    break;
                }

                let byte = u8::from(data);
                if rx_producer.enqueue(byte).is_err() {
                    log::warn!("receive queue full, dropping {:#04x}", byte);
                }
            }
        }

        // no FIFO, so at most one byte fits per transmit-empty
        if lpuart2.status().contains(Status::TRANSMIT_EMPTY) {
            if let Some(byte) = tx_consumer.dequeue() {
                lpuart2.write_byte(byte);
            }
        }

        let pending = tx_consumer.ready();
        if pending != *tx_armed {
            let interrupts = if pending {
                lpuart::Interrupts::RECEIVE_FULL | lpuart::Interrupts::TRANSMIT_EMPTY
            } else {
                lpuart::Interrupts::RECEIVE_FULL
            };
            lpuart2.disable(|lpuart2| lpuart2.set_interrupts(interrupts));
            *tx_armed = pending;
        }
    }
}
