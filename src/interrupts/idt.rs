use lazy_static::lazy_static;
use pic8259::ChainedPics;
use spin::Mutex;
use x86_64::structures::idt::{InterruptDescriptorTable, InterruptStackFrame, PageFaultErrorCode};
use x86_64::{PrivilegeLevel, VirtAddr};

use super::{gdt, handle_interrupt, trap, TrapFrame, SYSCALL_VECTOR, TIMER_VECTOR};
use crate::config::{PIC_1_OFFSET, PIC_2_OFFSET};
use crate::time;

pub static PICS: Mutex<ChainedPics> =
    Mutex::new(unsafe { ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET) });

lazy_static! {
    static ref IDT: InterruptDescriptorTable = {
        let mut idt = InterruptDescriptorTable::new();
        idt.breakpoint.set_handler_fn(breakpoint_handler);
        unsafe {
            idt.double_fault
                .set_handler_fn(double_fault_handler)
                .set_stack_index(gdt::DOUBLE_FAULT_IST_INDEX);
        }
        idt.page_fault.set_handler_fn(page_fault_handler);
        idt.general_protection_fault
            .set_handler_fn(general_protection_fault_handler);
        idt[TIMER_VECTOR as usize].set_handler_fn(timer_interrupt_handler);
        unsafe {
            idt[SYSCALL_VECTOR as usize]
                .set_handler_addr(VirtAddr::new(trap::syscall_entry as usize as u64))
                .set_privilege_level(PrivilegeLevel::Ring3);
        }
        idt
    };
}

pub fn init() {
    IDT.load();
}

extern "x86-interrupt" fn breakpoint_handler(stack_frame: InterruptStackFrame) {
    log::warn!("EXCEPTION: BREAKPOINT\n{:#?}", stack_frame);
}

extern "x86-interrupt" fn double_fault_handler(
    stack_frame: InterruptStackFrame,
    _error_code: u64,
) -> ! {
    panic!("EXCEPTION: DOUBLE FAULT\n{:#?}", stack_frame);
}

extern "x86-interrupt" fn page_fault_handler(
    stack_frame: InterruptStackFrame,
    error_code: PageFaultErrorCode,
) {
    use x86_64::registers::control::Cr2;
    log::error!("EXCEPTION: PAGE FAULT at {:?} ({:?})", Cr2::read(), error_code);
    panic!("EXCEPTION: PAGE FAULT\n{:#?}", stack_frame);
}

extern "x86-interrupt" fn general_protection_fault_handler(
    stack_frame: InterruptStackFrame,
    error_code: u64,
) {
    panic!(
        "EXCEPTION: GENERAL PROTECTION FAULT\nError Code: {error_code}\n{:#?}",
        stack_frame
    );
}

extern "x86-interrupt" fn timer_interrupt_handler(_stack_frame: InterruptStackFrame) {
    time::on_timer_tick();
    {
        let mut kernel = crate::KERNEL.lock();
        let mut frame = TrapFrame::default();
        // SAFETY: the timer vector reads nothing from the frame.
        unsafe { handle_interrupt(&mut *kernel, TIMER_VECTOR, &mut frame) };
    }
    unsafe {
        PICS.lock().notify_end_of_interrupt(TIMER_VECTOR);
    }
}
