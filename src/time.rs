//! Kernel time source.

use core::sync::atomic::{AtomicU64, Ordering};

/// Source of file timestamps. Successive calls never go backwards.
pub trait Clock {
    fn now(&self) -> u64;
}

/// Timer interrupts seen since boot.
static TICKS: AtomicU64 = AtomicU64::new(0);

/// Clock backed by the timer interrupt counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickClock;

impl Clock for TickClock {
    fn now(&self) -> u64 {
        ticks()
    }
}

/// Record one timer interrupt. Called from the IRQ0 handler.
pub fn on_timer_tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

pub fn ticks() -> u64 {
    TICKS.load(Ordering::Relaxed)
}

/// Program PIT channel 0 as a rate generator at `hz`.
#[cfg(target_os = "none")]
pub fn init_pit(hz: u32) {
    use x86_64::instructions::port::Port;

    let divisor = (1_193_182 / hz) as u16;
    unsafe {
        let mut command = Port::<u8>::new(0x43);
        let mut channel0 = Port::<u8>::new(0x40);

        // channel 0, lobyte/hibyte, mode 2, binary
        command.write(0x34);
        channel0.write((divisor & 0xFF) as u8);
        channel0.write((divisor >> 8) as u8);
    }
    log::info!("PIT programmed at {} Hz.", hz);
}
