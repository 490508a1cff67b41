//! Software interrupt control. `INT_B` raises a pending interrupt directly on the PIC;
//! `MI_B`/`UMI_B` mask and unmask by number; `IND`/`INE` gate whether the CPU's fetch loop
//! ever looks at the PIC at all; `WFI` blocks the calling thread until something is
//! deliverable.

use crate::Cpu;
use emu_pic::Pic;

pub(crate) fn int_b(pic: &Pic, interrupt: u8) {
    pic.trigger(interrupt);
}

pub(crate) fn mi_b(pic: &Pic, interrupt: u8) {
    pic.mask(interrupt);
}

pub(crate) fn umi_b(pic: &Pic, interrupt: u8) {
    pic.unmask(interrupt);
}

pub(crate) fn ind(cpu: &mut Cpu) {
    cpu.interrupts_enabled = false;
}

pub(crate) fn ine(cpu: &mut Cpu) {
    cpu.interrupts_enabled = true;
}

pub(crate) fn wfi(pic: &Pic) {
    pic.wait_for_interrupt();
}
