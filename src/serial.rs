//! COM1 serial port and the `log` backend that writes to it.

use core::fmt::Write;

use lazy_static::lazy_static;
use log::{Log, Metadata, Record};
use spin::Mutex;
use x86_64::instructions::port::Port;

use crate::config::{LOG_LEVEL, SERIAL_PORT};
use crate::interrupts;

pub struct SerialPort {
    data: Port<u8>,
    int_en: Port<u8>,
    fifo_ctrl: Port<u8>,
    line_ctrl: Port<u8>,
    modem_ctrl: Port<u8>,
    line_sts: Port<u8>,
}

impl SerialPort {
    /// # Safety
    /// `base` must be the I/O base of a 16550-compatible UART.
    pub const unsafe fn new(base: u16) -> SerialPort {
        SerialPort {
            data: Port::new(base),
            int_en: Port::new(base + 1),
            fifo_ctrl: Port::new(base + 2),
            line_ctrl: Port::new(base + 3),
            modem_ctrl: Port::new(base + 4),
            line_sts: Port::new(base + 5),
        }
    }

    /// 38400 baud, 8N1, FIFO on. UART interrupts stay off; output is polled.
    pub fn init(&mut self) {
        unsafe {
            self.int_en.write(0x00);
            self.line_ctrl.write(0x80);
            self.data.write(0x03);
            self.int_en.write(0x00);
            self.line_ctrl.write(0x03);
            self.fifo_ctrl.write(0xC7);
            self.modem_ctrl.write(0x0B);
        }
    }

    fn wait_for_tx_empty(&mut self) {
        unsafe { while (self.line_sts.read() & 0x20) == 0 {} }
    }

    pub fn send(&mut self, byte: u8) {
        self.wait_for_tx_empty();
        unsafe { self.data.write(byte) };
    }
}

impl Write for SerialPort {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.send(b'\r');
            }
            self.send(byte);
        }
        Ok(())
    }
}

lazy_static! {
    pub static ref SERIAL1: Mutex<SerialPort> = {
        let mut port = unsafe { SerialPort::new(SERIAL_PORT) };
        port.init();
        Mutex::new(port)
    };
}

/// Writes every record as `[LEVEL] message`.
pub struct SerialLogger;

impl Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= LOG_LEVEL
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // The timer handler logs through SERIAL1 too.
        interrupts::without_interrupts(|| {
            let _ = writeln!(SERIAL1.lock(), "[{}] {}", record.level(), record.args());
        });
    }

    fn flush(&self) {}
}

static LOGGER: SerialLogger = SerialLogger;

/// Bring up COM1 and install the serial logger.
pub fn init() {
    lazy_static::initialize(&SERIAL1);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LOG_LEVEL);
    }
}
