//! `int 0x80` entry.
//!
//! Convention: RAX = syscall number, RDI/RSI/RDX = arguments.
//! The result comes back in RAX; every other register is preserved.

use core::arch::naked_asm;

use super::{handle_interrupt, TrapFrame, SYSCALL_VECTOR};

#[unsafe(naked)]
pub extern "C" fn syscall_entry() {
    naked_asm!(
        "push r15",
        "push r14",
        "push r13",
        "push r12",
        "push r11",
        "push r10",
        "push r9",
        "push r8",
        "push rbp",
        "push rdx",
        "push rsi",
        "push rdi",
        "push rbx",
        "push rcx",
        // 5 qwords from the CPU plus 14 pushed here: realign to 16 bytes.
        "sub rsp, 8",
        // syscall_trap(number, arg0, arg1, arg2)
        "mov rcx, rdx",
        "mov rdx, rsi",
        "mov rsi, rdi",
        "mov rdi, rax",
        "call {trap}",
        "add rsp, 8",
        "pop rcx",
        "pop rbx",
        "pop rdi",
        "pop rsi",
        "pop rdx",
        "pop rbp",
        "pop r8",
        "pop r9",
        "pop r10",
        "pop r11",
        "pop r12",
        "pop r13",
        "pop r14",
        "pop r15",
        "iretq",
        trap = sym syscall_trap,
    );
}

extern "C" fn syscall_trap(number: u64, arg0: u64, arg1: u64, arg2: u64) -> u64 {
    let mut frame = TrapFrame::syscall(number, arg0, arg1, arg2);
    let mut kernel = crate::KERNEL.lock();
    // SAFETY: user arguments are validated by the syscall decoder.
    unsafe { handle_interrupt(&mut *kernel, SYSCALL_VECTOR, &mut frame) };
    frame.rax
}
