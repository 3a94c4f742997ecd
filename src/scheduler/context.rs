/// Execution context saved in a process descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct Context {
    pub rsp: u64,
    pub rip: u64,
}

impl Context {
    /// Create the initial context for a fresh process.
    /// `entry` = first instruction, `stack_top` = one past the highest stack byte.
    pub const fn new(entry: u64, stack_top: u64) -> Self {
        Context {
            rsp: stack_top,
            rip: entry,
        }
    }
}
