//! Process registry: the owner of every live process descriptor.

use crate::config::{MAX_PROCESSES, PAGE_SIZE};
use crate::error::{KernelError, KernelResult, Resource};
use crate::memory::FrameAllocator;

use super::context::Context;
use super::task::{Pid, Process, ProcessState};

/// Hands out process ids in strictly increasing order, starting at 1.
/// Running out of ids is an error; the counter never wraps.
pub struct PidGenerator {
    next: u32,
}

impl PidGenerator {
    pub const fn new() -> Self {
        PidGenerator { next: 1 }
    }

    /// The id the next successful `advance` will hand out.
    pub fn peek(&self) -> KernelResult<Pid> {
        if self.next == u32::MAX {
            Err(KernelError::ResourceExhausted(Resource::ProcessIds))
        } else {
            Ok(Pid(self.next))
        }
    }

    pub fn advance(&mut self) -> KernelResult<Pid> {
        let pid = self.peek()?;
        self.next += 1;
        Ok(pid)
    }
}

impl Default for PidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed table of process descriptors.
pub struct ProcessTable {
    slots: [Option<Process>; MAX_PROCESSES],
    pids: PidGenerator,
}

impl ProcessTable {
    pub const fn new() -> Self {
        ProcessTable {
            slots: [None; MAX_PROCESSES],
            pids: PidGenerator::new(),
        }
    }

    /// Create a READY process whose stack is a fresh frame from `frames`.
    ///
    /// Either everything happens or nothing does: on failure no slot is
    /// taken, no frame is held and no pid is consumed.
    pub fn spawn<const N: usize>(
        &mut self,
        entry: u64,
        frames: &mut FrameAllocator<N>,
    ) -> KernelResult<Pid> {
        let pid = self.pids.peek()?;
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(KernelError::ResourceExhausted(Resource::ProcessSlots))?;

        let stack = frames.allocate()?;
        let stack_top = match frames.frame_address(stack) {
            Ok(base) => base.as_u64() + PAGE_SIZE,
            Err(err) => {
                frames.release(stack)?;
                return Err(err);
            }
        };

        self.pids.advance()?;
        self.slots[slot] = Some(Process {
            pid,
            state: ProcessState::Ready,
            context: Context::new(entry, stack_top),
            stack,
        });
        Ok(pid)
    }

    /// Drop a descriptor from the table and hand it back to the caller.
    pub fn remove(&mut self, pid: Pid) -> Option<Process> {
        self.slots
            .iter_mut()
            .find(|slot| matches!(slot, Some(p) if p.pid == pid))
            .and_then(Option::take)
    }

    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.iter().find(|p| p.pid == pid)
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.slots.iter_mut().flatten().find(|p| p.pid == pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.slots.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        MAX_PROCESSES
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x86_64::PhysAddr;

    #[test]
    fn spawn_sets_up_a_ready_descriptor() {
        let mut frames = FrameAllocator::<4>::new();
        frames.init(PhysAddr::new(0x20_0000));
        let mut table = ProcessTable::new();

        let pid = table.spawn(0xdead_0000, &mut frames).unwrap();
        let process = table.get(pid).unwrap();
        assert_eq!(process.state, ProcessState::Ready);
        assert_eq!(process.context.rip, 0xdead_0000);
        assert_eq!(process.context.rsp, 0x20_0000 + PAGE_SIZE);
        assert!(frames.is_allocated(process.stack));
    }

    #[test]
    fn pids_strictly_increase_even_after_removal() {
        let mut frames = FrameAllocator::<8>::new();
        let mut table = ProcessTable::new();
        let a = table.spawn(0, &mut frames).unwrap();
        let b = table.spawn(0, &mut frames).unwrap();
        table.remove(a).unwrap();
        let c = table.spawn(0, &mut frames).unwrap();
        assert!(a < b && b < c);
        assert!(table.get(a).is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn frame_exhaustion_leaves_no_trace() {
        let mut frames = FrameAllocator::<1>::new();
        let mut table = ProcessTable::new();
        let first = table.spawn(0, &mut frames).unwrap();
        assert_eq!(
            table.spawn(0, &mut frames),
            Err(KernelError::ResourceExhausted(Resource::Frames))
        );
        assert_eq!(table.len(), 1);

        // The failed attempt did not burn a pid.
        let stack = table.remove(first).unwrap().stack;
        frames.release(stack).unwrap();
        assert_eq!(table.spawn(0, &mut frames), Ok(Pid(first.0 + 1)));
    }

    #[test]
    fn full_table_keeps_the_frame_free() {
        let mut frames = FrameAllocator::<{ MAX_PROCESSES + 1 }>::new();
        let mut table = ProcessTable::new();
        for _ in 0..MAX_PROCESSES {
            table.spawn(0, &mut frames).unwrap();
        }
        assert_eq!(
            table.spawn(0, &mut frames),
            Err(KernelError::ResourceExhausted(Resource::ProcessSlots))
        );
        assert_eq!(frames.free_frames(), 1);
    }

    #[test]
    fn pid_generator_refuses_to_wrap() {
        let mut pids = PidGenerator { next: u32::MAX - 1 };
        assert_eq!(pids.advance(), Ok(Pid(u32::MAX - 1)));
        assert_eq!(
            pids.advance(),
            Err(KernelError::ResourceExhausted(Resource::ProcessIds))
        );
    }
}
