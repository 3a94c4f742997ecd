//! Interrupt routing.
//!
//! [`handle_interrupt`] is the single entry from hardware into the kernel:
//! the timer vector drives the scheduler, the syscall vector goes to the
//! syscall dispatcher, and every other vector is ignored. The IDT glue in
//! [`idt`] and [`trap`] only exists on bare metal.

#[cfg(target_os = "none")]
pub mod gdt;
#[cfg(target_os = "none")]
pub mod idt;
#[cfg(target_os = "none")]
pub mod trap;

use crate::config::PIC_1_OFFSET;
use crate::kernel::Kernel;
use crate::scheduler::Pid;
use crate::syscalls::{self, SyscallArgs};
use crate::time::Clock;

pub use crate::config::SYSCALL_VECTOR;

/// PIT interrupts arrive on IRQ0.
pub const TIMER_VECTOR: u8 = PIC_1_OFFSET;

/// Registers a trap reads its arguments from and writes its result to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub rax: u64,
    pub rdi: u64,
    pub rsi: u64,
    pub rdx: u64,
}

impl TrapFrame {
    pub const fn syscall(number: u64, arg0: u64, arg1: u64, arg2: u64) -> Self {
        TrapFrame {
            rax: number,
            rdi: arg0,
            rsi: arg1,
            rdx: arg2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptOutcome {
    /// Timer tick; carries the process now on the CPU.
    Scheduled(Option<Pid>),
    /// Syscall; carries the value written back to RAX.
    Syscall(i64),
    Ignored,
}

/// Route one interrupt.
///
/// # Safety
/// For the syscall vector, `frame` carries user arguments that are handed
/// to [`syscalls::dispatch`] and must satisfy its contract.
pub unsafe fn handle_interrupt<C: Clock, const F: usize, const M: usize>(
    kernel: &mut Kernel<C, F, M>,
    vector: u8,
    frame: &mut TrapFrame,
) -> InterruptOutcome {
    match vector {
        TIMER_VECTOR => match kernel.tick() {
            Ok(current) => InterruptOutcome::Scheduled(current),
            Err(err) => {
                log::error!("timer: scheduler tick failed: {}", err);
                InterruptOutcome::Scheduled(kernel.current())
            }
        },
        SYSCALL_VECTOR => {
            let args = SyscallArgs::new(frame.rdi, frame.rsi, frame.rdx);
            let result = syscalls::dispatch(kernel, frame.rax, args);
            frame.rax = result as u64;
            InterruptOutcome::Syscall(result)
        }
        _ => InterruptOutcome::Ignored,
    }
}

/// Load the GDT and IDT and remap the PICs.
#[cfg(target_os = "none")]
pub fn init() {
    gdt::init();
    idt::init();
    unsafe { idt::PICS.lock().initialize() };
    log::info!("interrupts: IDT loaded, PICs remapped to {}", PIC_1_OFFSET);
}

// Interrupt flag. On bare metal this is RFLAGS.IF; hosted builds keep a
// per-thread stand-in so locking code behaves the same under test.

#[cfg(target_os = "none")]
pub use x86_64::instructions::interrupts::{are_enabled, disable, enable, without_interrupts};

#[cfg(not(target_os = "none"))]
mod emulated {
    use std::cell::Cell;

    std::thread_local! {
        static ENABLED: Cell<bool> = const { Cell::new(true) };
    }

    pub fn are_enabled() -> bool {
        ENABLED.with(Cell::get)
    }

    pub fn enable() {
        ENABLED.with(|flag| flag.set(true));
    }

    pub fn disable() {
        ENABLED.with(|flag| flag.set(false));
    }

    pub fn without_interrupts<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let saved = are_enabled();
        disable();
        let ret = f();
        if saved {
            enable();
        }
        ret
    }
}

#[cfg(not(target_os = "none"))]
pub use emulated::{are_enabled, disable, enable, without_interrupts};
