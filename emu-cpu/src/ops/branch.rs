//! Compare and jump. `CMP` updates flags from a subtraction whose result is otherwise
//! discarded. The conditional jumps only fetch their target word when the branch is
//! actually taken — on an untaken branch, PC is left exactly where the main loop's fetch
//! already advanced it (the word immediately after the opcode), so the unused operand word
//! is skipped without being read.

use crate::Cpu;
use emu_bus::Bus;

pub(crate) fn cmp_rr(cpu: &mut Cpu, ra: u8, rb: u8) {
    let Some(a) = cpu.register_get(ra) else { return };
    let Some(b) = cpu.register_get(rb) else { return };
    cpu.update_flags((a as i32).wrapping_sub(b as i32));
}

pub(crate) fn cmp_rw(cpu: &mut Cpu, bus: &Bus, r: u8) {
    let Some(a) = cpu.register_get(r) else { return };
    let Some(w) = cpu.fetch(bus) else { return };
    cpu.update_flags((a as i32).wrapping_sub(w as i32));
}

fn conditional_jump(cpu: &mut Cpu, bus: &Bus, taken: bool, relative: bool) {
    let pc_after_opcode = cpu.pc();
    if taken {
        let Some(target) = cpu.fetch(bus) else { return };
        cpu.pc = if relative { cpu.cs.wrapping_add(target) } else { target };
    } else {
        cpu.pc = pc_after_opcode;
    }
}

pub(crate) fn jeq_s(cpu: &mut Cpu, bus: &Bus) {
    let taken = cpu.zero_flag();
    conditional_jump(cpu, bus, taken, true);
}

pub(crate) fn jeq_a(cpu: &mut Cpu, bus: &Bus) {
    let taken = cpu.zero_flag();
    conditional_jump(cpu, bus, taken, false);
}

pub(crate) fn jne_s(cpu: &mut Cpu, bus: &Bus) {
    let taken = !cpu.zero_flag();
    conditional_jump(cpu, bus, taken, true);
}

pub(crate) fn jne_a(cpu: &mut Cpu, bus: &Bus) {
    let taken = !cpu.zero_flag();
    conditional_jump(cpu, bus, taken, false);
}

pub(crate) fn jmp_s(cpu: &mut Cpu, bus: &Bus) {
    conditional_jump(cpu, bus, true, true);
}

pub(crate) fn jmp_a(cpu: &mut Cpu, bus: &Bus) {
    conditional_jump(cpu, bus, true, false);
}
