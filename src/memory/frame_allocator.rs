use core::fmt;

use x86_64::PhysAddr;

use crate::config::{NUM_FRAMES, PAGE_SIZE};
use crate::error::{KernelError, KernelResult, Resource};

/// Identity of one frame in the pool (its index, `0..N`).
///
/// Only the allocator hands these out; the physical location of a frame is
/// looked up through [`FrameAllocator::frame_address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(u32);

impl FrameId {
    pub(crate) const fn new(number: u32) -> Self {
        FrameId(number)
    }

    pub const fn number(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Free,
    Allocated,
}

/// First-fit allocator over a fixed pool of `N` physical frames.
///
/// Frames are handed out lowest index first, which keeps allocation order
/// reproducible. The per-frame state is the only record of ownership.
pub struct FrameAllocator<const N: usize = NUM_FRAMES> {
    frames: [FrameState; N],
    free_count: usize,
    /// Physical address of frame 0.
    base: u64,
}

impl<const N: usize> FrameAllocator<N> {
    /// Create a pool with every frame free, based at physical address 0.
    pub const fn new() -> Self {
        FrameAllocator {
            frames: [FrameState::Free; N],
            free_count: N,
            base: 0,
        }
    }

    /// Mark every frame free and place the pool at `base`.
    pub fn init(&mut self, base: PhysAddr) {
        debug_assert!(base.is_aligned(PAGE_SIZE));
        self.frames = [FrameState::Free; N];
        self.free_count = N;
        self.base = base.as_u64();
    }

    /// Allocate the lowest-numbered free frame.
    pub fn allocate(&mut self) -> KernelResult<FrameId> {
        let index = self
            .frames
            .iter()
            .position(|state| *state == FrameState::Free)
            .ok_or(KernelError::ResourceExhausted(Resource::Frames))?;

        self.frames[index] = FrameState::Allocated;
        self.free_count -= 1;
        Ok(FrameId::new(index as u32))
    }

    /// Return a frame to the pool.
    ///
    /// Releasing a frame that is already free is accepted and changes
    /// nothing; it is not a way to detect double frees.
    pub fn release(&mut self, frame: FrameId) -> KernelResult<()> {
        let state = self
            .frames
            .get_mut(frame.index())
            .ok_or(KernelError::InvalidArgument)?;

        match *state {
            FrameState::Allocated => {
                *state = FrameState::Free;
                self.free_count += 1;
            }
            FrameState::Free => log::warn!("release of already free {}", frame),
        }
        Ok(())
    }

    pub fn is_allocated(&self, frame: FrameId) -> bool {
        matches!(self.frames.get(frame.index()), Some(FrameState::Allocated))
    }

    /// Physical start address of `frame`.
    pub fn frame_address(&self, frame: FrameId) -> KernelResult<PhysAddr> {
        if frame.index() >= N {
            return Err(KernelError::InvalidArgument);
        }
        Ok(PhysAddr::new(self.base + frame.number() as u64 * PAGE_SIZE))
    }

    /// Turn a raw frame number coming from outside the kernel into an id.
    pub fn frame_id(&self, number: u64) -> KernelResult<FrameId> {
        if number < N as u64 {
            Ok(FrameId::new(number as u32))
        } else {
            Err(KernelError::InvalidArgument)
        }
    }

    pub fn free_frames(&self) -> usize {
        self.free_count
    }

    pub const fn total_frames(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for FrameAllocator<N> {
    fn default() -> Self {
        Self::new()
    }
}
