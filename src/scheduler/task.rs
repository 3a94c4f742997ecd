use core::fmt;

use super::context::Context;
use crate::memory::FrameId;

/// Unique process identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Ready,
    Running,
    Blocked,
    Terminated,
}

/// Process control block.
#[derive(Debug, Clone, Copy)]
pub struct Process {
    pub pid: Pid,
    pub state: ProcessState,
    pub context: Context,
    /// Frame backing the stack. Owned by the frame allocator; the kernel
    /// releases it when the process terminates.
    pub stack: FrameId,
}
