//! The kernel context: one value owning every kernel table.
//!
//! Each public method is one indivisible kernel operation. On bare metal
//! the single instance sits behind an [`IrqMutex`](crate::sync::IrqMutex),
//! so every method runs with interrupts masked.

use x86_64::PhysAddr;

use crate::config::{MAX_FILES, NUM_FRAMES};
use crate::error::{KernelError, KernelResult};
use crate::fs::{Inode, InodeTable, Permissions};
use crate::memory::{FrameAllocator, FrameId};
use crate::scheduler::{Pid, Process, ProcessState, ProcessTable, Scheduler};
use crate::time::Clock;

pub struct Kernel<C: Clock, const FRAMES: usize = NUM_FRAMES, const FILES: usize = MAX_FILES> {
    frames: FrameAllocator<FRAMES>,
    processes: ProcessTable,
    scheduler: Scheduler,
    files: InodeTable<FILES>,
    clock: C,
}

impl<C: Clock, const FRAMES: usize, const FILES: usize> Kernel<C, FRAMES, FILES> {
    /// A kernel with every table empty and the frame pool at address 0.
    pub const fn new(clock: C) -> Self {
        Kernel {
            frames: FrameAllocator::new(),
            processes: ProcessTable::new(),
            scheduler: Scheduler::new(),
            files: InodeTable::new(),
            clock,
        }
    }

    /// Kernel-init: reset every table and place the frame pool at `pool_base`.
    pub fn init(&mut self, pool_base: PhysAddr) {
        self.frames.init(pool_base);
        self.processes = ProcessTable::new();
        self.scheduler.reset();
        self.files.clear();
        log::info!(
            "kernel: {} frames at {:#x}, {} process slots, {} inodes",
            self.frames.total_frames(),
            pool_base.as_u64(),
            self.processes.capacity(),
            self.files.capacity()
        );
    }

    // ── Processes ─────────────────────────────────────────────

    /// Create a process entering at `entry` and append it to the ready queue.
    pub fn create_process(&mut self, entry: u64) -> KernelResult<Pid> {
        let pid = self.processes.spawn(entry, &mut self.frames)?;
        if let Err(err) = self.scheduler.enqueue(pid) {
            if let Some(process) = self.processes.remove(pid) {
                self.frames.release(process.stack)?;
            }
            return Err(err);
        }
        log::debug!("kernel: created PID {} at {:#x}", pid, entry);
        Ok(pid)
    }

    /// Terminate `pid`: take it out of scheduling, free its stack frame and
    /// its registry slot. The pid is never handed out again.
    pub fn terminate(&mut self, pid: Pid) -> KernelResult<()> {
        let process = self.processes.get_mut(pid).ok_or(KernelError::InvalidArgument)?;
        if process.state == ProcessState::Ready {
            self.scheduler.dequeue(pid);
        }
        process.state = ProcessState::Terminated;
        // Covers a blocked process that still holds the CPU, too.
        if self.scheduler.current() == Some(pid) {
            self.scheduler.clear_current();
        }

        if let Some(process) = self.processes.remove(pid) {
            self.frames.release(process.stack)?;
        }
        log::debug!("kernel: PID {} terminated", pid);
        Ok(())
    }

    /// Move `pid` to BLOCKED. A blocked current process keeps the CPU until
    /// the next tick, which will not requeue it.
    pub fn block(&mut self, pid: Pid) -> KernelResult<()> {
        let process = self.processes.get_mut(pid).ok_or(KernelError::InvalidArgument)?;
        match process.state {
            ProcessState::Ready => {
                self.scheduler.dequeue(pid);
            }
            ProcessState::Running => {}
            ProcessState::Blocked | ProcessState::Terminated => {
                return Err(KernelError::InvalidArgument)
            }
        }
        process.state = ProcessState::Blocked;
        Ok(())
    }

    /// Make a BLOCKED process runnable again. It rejoins the tail of the
    /// ready queue, unless it never left the CPU, in which case it simply
    /// resumes RUNNING.
    pub fn wake(&mut self, pid: Pid) -> KernelResult<()> {
        let process = self.processes.get_mut(pid).ok_or(KernelError::InvalidArgument)?;
        if process.state != ProcessState::Blocked {
            return Err(KernelError::InvalidArgument);
        }
        if self.scheduler.current() == Some(pid) {
            process.state = ProcessState::Running;
        } else {
            self.scheduler.enqueue(pid)?;
            process.state = ProcessState::Ready;
        }
        Ok(())
    }

    /// Timer tick: rotate the ready queue. Returns the process now on the CPU.
    pub fn tick(&mut self) -> KernelResult<Option<Pid>> {
        self.scheduler.tick(&mut self.processes)
    }

    pub fn current(&self) -> Option<Pid> {
        self.scheduler.current()
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(pid)
    }

    /// Ready queue contents, head first.
    pub fn ready_pids(&self) -> impl Iterator<Item = Pid> + '_ {
        self.scheduler.ready_queue().iter()
    }

    // ── Frames ────────────────────────────────────────────────

    pub fn allocate_frame(&mut self) -> KernelResult<FrameId> {
        let frame = self.frames.allocate();
        if frame.is_err() {
            log::warn!("kernel: frame pool exhausted");
        }
        frame
    }

    /// Release a frame by number. Frames backing a live process stack are
    /// refused; they go back to the pool when the process terminates.
    pub fn release_frame(&mut self, number: u64) -> KernelResult<()> {
        let frame = self.frames.frame_id(number)?;
        if self.processes.iter().any(|p| p.stack == frame) {
            return Err(KernelError::InvalidArgument);
        }
        self.frames.release(frame)
    }

    // ── Files ─────────────────────────────────────────────────

    pub fn create_file(&mut self, name: &str, permissions: Permissions) -> KernelResult<usize> {
        let now = self.clock.now();
        self.files.create(name, permissions, now)
    }

    pub fn file(&self, slot: usize) -> Option<&Inode> {
        self.files.get(slot)
    }

    // ── Read-only views ───────────────────────────────────────

    pub fn frames(&self) -> &FrameAllocator<FRAMES> {
        &self.frames
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn files(&self) -> &InodeTable<FILES> {
        &self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Resource;
    use core::cell::Cell;

    struct StepClock(Cell<u64>);

    impl Clock for StepClock {
        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 10);
            t
        }
    }

    type SmallKernel = Kernel<StepClock, 4, 4>;

    fn kernel() -> SmallKernel {
        let mut k = SmallKernel::new(StepClock(Cell::new(100)));
        k.init(PhysAddr::new(0x40_0000));
        k
    }

    #[test]
    fn create_process_queues_at_the_tail() {
        let mut k = kernel();
        let a = k.create_process(0x1000).unwrap();
        let b = k.create_process(0x2000).unwrap();
        assert_eq!(k.ready_pids().collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(k.frames().free_frames(), 2);
        assert_eq!(k.current(), None);
    }

    #[test]
    fn create_process_fails_cleanly_when_frames_run_out() {
        let mut k = kernel();
        for _ in 0..4 {
            k.create_process(0).unwrap();
        }
        assert_eq!(
            k.create_process(0),
            Err(KernelError::ResourceExhausted(Resource::Frames))
        );
        assert_eq!(k.processes().len(), 4);
        assert_eq!(k.ready_pids().count(), 4);
    }

    #[test]
    fn terminate_running_process_reclaims_its_frame() {
        let mut k = kernel();
        let a = k.create_process(0).unwrap();
        let b = k.create_process(0).unwrap();
        assert_eq!(k.tick(), Ok(Some(a)));
        let stack = k.process(a).unwrap().stack;

        k.terminate(a).unwrap();
        assert!(!k.frames().is_allocated(stack));
        assert!(k.process(a).is_none());
        assert_eq!(k.current(), None);
        assert_eq!(k.tick(), Ok(Some(b)));
        // a is gone for good
        assert_eq!(k.tick(), Ok(Some(b)));
        assert_eq!(k.terminate(a), Err(KernelError::InvalidArgument));
    }

    #[test]
    fn terminate_ready_process_leaves_the_queue() {
        let mut k = kernel();
        let a = k.create_process(0).unwrap();
        let b = k.create_process(0).unwrap();
        let c = k.create_process(0).unwrap();
        k.terminate(b).unwrap();
        assert_eq!(k.ready_pids().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(k.frames().free_frames(), 2);
    }

    #[test]
    fn blocked_process_skips_turns_until_woken() {
        let mut k = kernel();
        let a = k.create_process(0).unwrap();
        let b = k.create_process(0).unwrap();
        let c = k.create_process(0).unwrap();

        k.block(b).unwrap();
        assert_eq!(k.tick(), Ok(Some(a)));
        assert_eq!(k.tick(), Ok(Some(c)));
        assert_eq!(k.tick(), Ok(Some(a)));

        k.wake(b).unwrap();
        assert_eq!(k.ready_pids().collect::<Vec<_>>(), vec![c, b]);
        assert_eq!(k.tick(), Ok(Some(c)));
        assert_eq!(k.tick(), Ok(Some(b)));
    }

    #[test]
    fn blocking_the_current_process() {
        let mut k = kernel();
        let a = k.create_process(0).unwrap();
        let b = k.create_process(0).unwrap();
        k.tick().unwrap();

        k.block(a).unwrap();
        assert_eq!(k.current(), Some(a));
        assert_eq!(k.tick(), Ok(Some(b)));
        assert!(k.ready_pids().next().is_none());

        k.wake(a).unwrap();
        assert_eq!(k.process(a).unwrap().state, ProcessState::Ready);
        assert_eq!(k.tick(), Ok(Some(a)));
    }

    #[test]
    fn woken_before_the_next_tick_keeps_running() {
        let mut k = kernel();
        let a = k.create_process(0).unwrap();
        k.tick().unwrap();
        k.block(a).unwrap();
        k.wake(a).unwrap();
        assert_eq!(k.process(a).unwrap().state, ProcessState::Running);
        assert!(k.ready_pids().next().is_none());
        assert_eq!(k.block(a), Ok(()));
        assert_eq!(k.block(a), Err(KernelError::InvalidArgument));
    }

    #[test]
    fn stack_frames_cannot_be_released_directly() {
        let mut k = kernel();
        let a = k.create_process(0).unwrap();
        let stack = k.process(a).unwrap().stack;
        assert_eq!(
            k.release_frame(stack.number() as u64),
            Err(KernelError::InvalidArgument)
        );
        let loose = k.allocate_frame().unwrap();
        assert_eq!(k.release_frame(loose.number() as u64), Ok(()));
        assert_eq!(k.release_frame(4), Err(KernelError::InvalidArgument));
    }

    #[test]
    fn files_are_stamped_by_the_clock() {
        let mut k = kernel();
        let perms = Permissions::from_mode(0o600);
        let first = k.create_file("a.txt", perms).unwrap();
        let second = k.create_file("b.txt", perms).unwrap();
        assert!(k.file(first).unwrap().created <= k.file(second).unwrap().created);
        assert_eq!(k.files().occupied(), 2);
    }

    #[test]
    fn init_resets_every_table() {
        let mut k = kernel();
        k.create_process(0).unwrap();
        k.tick().unwrap();
        k.create_file("x", Permissions::from_mode(0o644)).unwrap();
        k.init(PhysAddr::new(0));
        assert_eq!(k.frames().free_frames(), 4);
        assert!(k.processes().is_empty());
        assert_eq!(k.current(), None);
        assert_eq!(k.files().occupied(), 0);
    }
}
