//! Kernel configuration constants.
//!
//! Compile-time limits for the frame pool, the process and inode tables,
//! and the hardware wiring used by the bare-metal build.

use log::LevelFilter;

/// Size of one physical page frame (4 KiB).
pub const PAGE_SIZE: u64 = 4096;

/// Number of frames in the physical frame pool.
pub const NUM_FRAMES: usize = 1024;

/// Maximum number of live processes.
pub const MAX_PROCESSES: usize = 64;

/// Number of records in the inode table.
pub const MAX_FILES: usize = 1024;

/// Direct block references per inode.
pub const DIRECT_BLOCKS: usize = 12;

/// Longest file name accepted by `create_file`, in bytes.
pub const MAX_NAME_LEN: usize = 32;

/// Mode bits used by the CREATE_FILE syscall (rw-r--r--).
pub const DEFAULT_FILE_MODE: u16 = 0o644;

/// Master PIC vector offset; IRQ0 (the PIT) lands here.
pub const PIC_1_OFFSET: u8 = 32;
/// Slave PIC vector offset.
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

/// Software interrupt used for system calls.
pub const SYSCALL_VECTOR: u8 = 0x80;

/// Timer interrupt frequency programmed into the PIT.
pub const PIT_FREQUENCY_HZ: u32 = 100;

/// COM1, used for kernel log output.
pub const SERIAL_PORT: u16 = 0x3F8;

/// Maximum level forwarded to the serial logger.
pub const LOG_LEVEL: LevelFilter = if cfg!(debug_assertions) {
    LevelFilter::Debug
} else {
    LevelFilter::Info
};

/// The frame pool is never placed below this physical address, which keeps
/// it clear of the kernel image and the legacy low-memory areas.
pub const FRAME_POOL_MIN_ADDR: u64 = 16 * 1024 * 1024;
