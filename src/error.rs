use core::fmt;

/// A fixed kernel table that can run out of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Frames,
    ProcessSlots,
    ProcessIds,
    ReadyQueue,
    Inodes,
}

/// Kernel error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// No free entry left in the named table.
    ResourceExhausted(Resource),
    /// Out-of-range identity, unknown opcode or unknown process.
    InvalidArgument,
}

impl KernelError {
    /// Value a syscall returns to the caller when it fails.
    pub const SYSCALL_FAILURE: i64 = -1;
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Resource::Frames => write!(f, "page frames"),
            Resource::ProcessSlots => write!(f, "process slots"),
            Resource::ProcessIds => write!(f, "process ids"),
            Resource::ReadyQueue => write!(f, "ready queue entries"),
            Resource::Inodes => write!(f, "inodes"),
        }
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KernelError::ResourceExhausted(what) => write!(f, "Out of {}", what),
            KernelError::InvalidArgument => write!(f, "Invalid argument"),
        }
    }
}

pub type KernelResult<T> = Result<T, KernelError>;
