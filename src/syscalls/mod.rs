use crate::config::{DEFAULT_FILE_MODE, MAX_NAME_LEN};
use crate::error::{KernelError, KernelResult};
use crate::fs::Permissions;
use crate::kernel::Kernel;
use crate::time::Clock;

/// Syscall numbers (passed in RAX).
pub const SYS_CREATE_PROCESS: u64 = 0;
pub const SYS_ALLOCATE_PAGE: u64 = 1;
pub const SYS_CREATE_FILE: u64 = 2;
pub const SYS_RELEASE_PAGE: u64 = 3;
pub const SYS_EXIT: u64 = 4;
pub const SYS_GETPID: u64 = 5;

/// Raw syscall arguments: rdi, rsi, rdx.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyscallArgs {
    pub arg0: u64,
    pub arg1: u64,
    pub arg2: u64,
}

impl SyscallArgs {
    pub const fn new(arg0: u64, arg1: u64, arg2: u64) -> Self {
        SyscallArgs { arg0, arg1, arg2 }
    }
}

/// A decoded system call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall<'a> {
    CreateProcess { entry: u64 },
    AllocatePage,
    CreateFile { name: &'a str },
    ReleasePage { frame: u64 },
    Exit,
    GetPid,
}

impl<'a> Syscall<'a> {
    /// Decode a syscall number and its raw arguments.
    ///
    /// # Safety
    /// For `SYS_CREATE_FILE`, `arg0` must point to `arg1` readable bytes that
    /// stay valid for `'a`. Null pointers and bad lengths are rejected before
    /// any read.
    pub unsafe fn decode(number: u64, args: SyscallArgs) -> KernelResult<Self> {
        match number {
            SYS_CREATE_PROCESS => Ok(Syscall::CreateProcess { entry: args.arg0 }),
            SYS_ALLOCATE_PAGE => Ok(Syscall::AllocatePage),
            SYS_CREATE_FILE => {
                let name = read_name(args.arg0, args.arg1)?;
                Ok(Syscall::CreateFile { name })
            }
            SYS_RELEASE_PAGE => Ok(Syscall::ReleasePage { frame: args.arg0 }),
            SYS_EXIT => Ok(Syscall::Exit),
            SYS_GETPID => Ok(Syscall::GetPid),
            _ => {
                log::warn!("syscall: unknown number {}", number);
                Err(KernelError::InvalidArgument)
            }
        }
    }
}

/// Borrow a file name passed as (pointer, length).
unsafe fn read_name<'a>(ptr: u64, len: u64) -> KernelResult<&'a str> {
    if ptr == 0 || len == 0 || len > MAX_NAME_LEN as u64 {
        return Err(KernelError::InvalidArgument);
    }
    let bytes = core::slice::from_raw_parts(ptr as *const u8, len as usize);
    core::str::from_utf8(bytes).map_err(|_| KernelError::InvalidArgument)
}

/// Run a decoded syscall against the kernel.
pub fn execute<C: Clock, const F: usize, const M: usize>(
    kernel: &mut Kernel<C, F, M>,
    call: Syscall<'_>,
) -> KernelResult<u64> {
    match call {
        Syscall::CreateProcess { entry } => kernel.create_process(entry).map(|pid| pid.0 as u64),
        Syscall::AllocatePage => kernel.allocate_frame().map(|frame| frame.number() as u64),
        Syscall::CreateFile { name } => kernel
            .create_file(name, Permissions::from_mode(DEFAULT_FILE_MODE))
            .map(|slot| slot as u64),
        Syscall::ReleasePage { frame } => kernel.release_frame(frame).map(|()| 0),
        Syscall::Exit => {
            let pid = kernel.current().ok_or(KernelError::InvalidArgument)?;
            kernel.terminate(pid)?;
            Ok(0)
        }
        Syscall::GetPid => kernel
            .current()
            .map(|pid| pid.0 as u64)
            .ok_or(KernelError::InvalidArgument),
    }
}

/// Central syscall dispatcher. Returns the value placed in RAX: the
/// result on success, -1 on any failure.
///
/// # Safety
/// Same contract as [`Syscall::decode`].
pub unsafe fn dispatch<C: Clock, const F: usize, const M: usize>(
    kernel: &mut Kernel<C, F, M>,
    number: u64,
    args: SyscallArgs,
) -> i64 {
    match Syscall::decode(number, args).and_then(|call| execute(kernel, call)) {
        Ok(value) => value as i64,
        Err(err) => {
            log::debug!("syscall {} failed: {}", number, err);
            KernelError::SYSCALL_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TickClock;
    use x86_64::PhysAddr;

    fn kernel() -> Kernel<TickClock, 2, 2> {
        let mut k = Kernel::new(TickClock);
        k.init(PhysAddr::new(0));
        k
    }

    fn name_args(name: &str) -> SyscallArgs {
        SyscallArgs::new(name.as_ptr() as u64, name.len() as u64, 0)
    }

    #[test]
    fn unknown_number_is_rejected() {
        let mut k = kernel();
        assert_eq!(unsafe { dispatch(&mut k, 99, SyscallArgs::default()) }, -1);
        assert_eq!(
            unsafe { Syscall::decode(42, SyscallArgs::default()) },
            Err(KernelError::InvalidArgument)
        );
    }

    #[test]
    fn create_file_reads_the_name() {
        let mut k = kernel();
        let slot = unsafe { dispatch(&mut k, SYS_CREATE_FILE, name_args("motd")) };
        assert_eq!(slot, 0);
        let inode = k.file(0).unwrap();
        assert_eq!(inode.name(), "motd");
        assert_eq!(inode.permissions.mode(), DEFAULT_FILE_MODE);

        assert_eq!(unsafe { dispatch(&mut k, SYS_CREATE_FILE, name_args("b")) }, 1);
        assert_eq!(unsafe { dispatch(&mut k, SYS_CREATE_FILE, name_args("c")) }, -1);
    }

    #[test]
    fn bad_name_arguments_fail_before_reading() {
        let mut k = kernel();
        let null = SyscallArgs::new(0, 4, 0);
        assert_eq!(unsafe { dispatch(&mut k, SYS_CREATE_FILE, null) }, -1);
        let bytes = [0xffu8, 0xfe];
        let not_utf8 = SyscallArgs::new(bytes.as_ptr() as u64, 2, 0);
        assert_eq!(unsafe { dispatch(&mut k, SYS_CREATE_FILE, not_utf8) }, -1);
        assert_eq!(k.files().occupied(), 0);
    }

    #[test]
    fn page_syscalls_round_trip_frame_numbers() {
        let mut k = kernel();
        let none = SyscallArgs::default();
        assert_eq!(unsafe { dispatch(&mut k, SYS_ALLOCATE_PAGE, none) }, 0);
        assert_eq!(unsafe { dispatch(&mut k, SYS_ALLOCATE_PAGE, none) }, 1);
        assert_eq!(unsafe { dispatch(&mut k, SYS_ALLOCATE_PAGE, none) }, -1);

        let release_zero = SyscallArgs::new(0, 0, 0);
        assert_eq!(unsafe { dispatch(&mut k, SYS_RELEASE_PAGE, release_zero) }, 0);
        assert_eq!(unsafe { dispatch(&mut k, SYS_ALLOCATE_PAGE, none) }, 0);

        let out_of_range = SyscallArgs::new(2, 0, 0);
        assert_eq!(unsafe { dispatch(&mut k, SYS_RELEASE_PAGE, out_of_range) }, -1);
    }

    #[test]
    fn getpid_and_exit_act_on_the_current_process() {
        let mut k = kernel();
        assert_eq!(execute(&mut k, Syscall::GetPid), Err(KernelError::InvalidArgument));
        assert_eq!(execute(&mut k, Syscall::Exit), Err(KernelError::InvalidArgument));

        let pid = execute(&mut k, Syscall::CreateProcess { entry: 0x4000 }).unwrap();
        k.tick().unwrap();
        assert_eq!(execute(&mut k, Syscall::GetPid), Ok(pid));
        assert_eq!(execute(&mut k, Syscall::Exit), Ok(0));
        assert_eq!(k.current(), None);
        assert_eq!(k.frames().free_frames(), 2);
    }
}
