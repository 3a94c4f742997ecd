pub mod context;
pub mod queue;
pub mod registry;
pub mod task;

pub use context::Context;
pub use queue::ReadyQueue;
pub use registry::{PidGenerator, ProcessTable};
pub use task::{Pid, Process, ProcessState};

use crate::error::{KernelError, KernelResult};

/// Round-robin scheduler state: the ready queue plus the process currently
/// on the CPU. Descriptors themselves live in the [`ProcessTable`].
pub struct Scheduler {
    ready_queue: ReadyQueue,
    current: Option<Pid>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Scheduler {
            ready_queue: ReadyQueue::new(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    pub fn ready_queue(&self) -> &ReadyQueue {
        &self.ready_queue
    }

    /// Append a READY process to the tail of the queue.
    pub fn enqueue(&mut self, pid: Pid) -> KernelResult<()> {
        self.ready_queue.push_back(pid)
    }

    /// Take a process out of the ready queue (it was blocked or killed).
    pub fn dequeue(&mut self, pid: Pid) -> bool {
        self.ready_queue.remove(pid)
    }

    /// Forget the current process without requeueing it.
    pub fn clear_current(&mut self) {
        self.current = None;
    }

    /// One timer tick.
    ///
    /// With an empty ready queue nothing changes. Otherwise the current
    /// process goes to the tail if it is still RUNNING, and the head of the
    /// queue becomes RUNNING. Returns the process on the CPU afterwards.
    pub fn tick(&mut self, processes: &mut ProcessTable) -> KernelResult<Option<Pid>> {
        if self.ready_queue.is_empty() {
            return Ok(self.current);
        }

        // Popping before requeueing leaves the same order as appending
        // first, and guarantees the push below has room.
        let next = self
            .ready_queue
            .pop_front()
            .ok_or(KernelError::InvalidArgument)?;

        if let Some(prev) = self.current.take() {
            if let Some(process) = processes.get_mut(prev) {
                if process.state == ProcessState::Running {
                    process.state = ProcessState::Ready;
                    self.ready_queue.push_back(prev)?;
                }
            }
        }

        let process = processes.get_mut(next).ok_or(KernelError::InvalidArgument)?;
        debug_assert_eq!(process.state, ProcessState::Ready);
        process.state = ProcessState::Running;
        self.current = Some(next);

        log::trace!("scheduler: switching CPU to PID {}", next);
        Ok(self.current)
    }

    pub fn reset(&mut self) {
        self.ready_queue.clear();
        self.current = None;
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
