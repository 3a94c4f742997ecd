pub mod frame_allocator;

pub use frame_allocator::{FrameAllocator, FrameId};

#[cfg(target_os = "none")]
use x86_64::PhysAddr;

/// Pick the physical base of the frame pool from the multiboot2 memory map:
/// the first available area that can hold the whole pool above
/// `FRAME_POOL_MIN_ADDR`.
#[cfg(target_os = "none")]
pub fn find_frame_pool(multiboot_info_addr: usize) -> Option<PhysAddr> {
    use crate::config::{FRAME_POOL_MIN_ADDR, NUM_FRAMES, PAGE_SIZE};
    use multiboot2::{BootInformation, BootInformationHeader, MemoryAreaType};

    let boot_info = match unsafe {
        BootInformation::load(multiboot_info_addr as *const BootInformationHeader)
    } {
        Ok(info) => info,
        Err(err) => {
            log::error!("Failed to load Multiboot2 info: {:?}", err);
            return None;
        }
    };
    let memory_map = boot_info.memory_map_tag()?;
    let pool_bytes = NUM_FRAMES as u64 * PAGE_SIZE;

    memory_map
        .memory_areas()
        .iter()
        .filter(|area| matches!(MemoryAreaType::from(area.typ()), MemoryAreaType::Available))
        .find_map(|area| {
            let start = PhysAddr::new(area.start_address().max(FRAME_POOL_MIN_ADDR)).align_up(PAGE_SIZE);
            let end = area.end_address();
            (start.as_u64() < end && end - start.as_u64() >= pool_bytes).then_some(start)
        })
}
