#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", feature(abi_x86_interrupt))]

pub mod config;
pub mod error;
pub mod fs;
pub mod interrupts;
pub mod kernel;
pub mod memory;
pub mod scheduler;
#[cfg(target_os = "none")]
pub mod serial;
pub mod sync;
pub mod syscalls;
pub mod time;

pub use error::{KernelError, KernelResult, Resource};
pub use kernel::Kernel;

#[cfg(target_os = "none")]
use sync::IrqMutex;
#[cfg(target_os = "none")]
use time::TickClock;

/// The one kernel instance. Every access masks interrupts.
#[cfg(target_os = "none")]
pub static KERNEL: IrqMutex<Kernel<TickClock>> = IrqMutex::new(Kernel::new(TickClock));

/// Entered from the boot stub in long mode with the multiboot2 info
/// pointer in RDI.
#[cfg(target_os = "none")]
#[no_mangle]
pub extern "C" fn _start(multiboot_info_addr: usize) -> ! {
    use x86_64::PhysAddr;

    serial::init();
    log::info!("minikern starting");
    interrupts::init();

    let pool_base = memory::find_frame_pool(multiboot_info_addr).unwrap_or_else(|| {
        log::warn!("no usable memory map, frame pool placed at the default base");
        PhysAddr::new(config::FRAME_POOL_MIN_ADDR)
    });
    KERNEL.lock().init(pool_base);

    time::init_pit(config::PIT_FREQUENCY_HZ);
    interrupts::enable();
    log::info!("minikern running");

    loop {
        x86_64::instructions::hlt();
    }
}

#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    interrupts::disable();
    log::error!("{}", info);
    loop {
        x86_64::instructions::hlt();
    }
}
