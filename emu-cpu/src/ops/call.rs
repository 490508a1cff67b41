//! Calls push the return address after fetching the call target, so the return address is
//! always the instruction immediately following the call's own operand — `RET`/`IRET` need
//! no special-casing to land there.

use crate::Cpu;
use emu_bus::Bus;

pub(crate) fn call_s(cpu: &mut Cpu, bus: &Bus) {
    let Some(offset) = cpu.fetch(bus) else { return };
    let return_address = cpu.pc();
    if !cpu.push(bus, return_address) {
        return;
    }
    cpu.pc = cpu.cs.wrapping_add(offset);
}

pub(crate) fn call_a(cpu: &mut Cpu, bus: &Bus) {
    let Some(target) = cpu.fetch(bus) else { return };
    let return_address = cpu.pc();
    if !cpu.push(bus, return_address) {
        return;
    }
    cpu.pc = target;
}

pub(crate) fn call_r(cpu: &mut Cpu, bus: &Bus, r: u8) {
    let Some(target) = cpu.register_get(r) else { return };
    let return_address = cpu.pc();
    if !cpu.push(bus, return_address) {
        return;
    }
    cpu.pc = target;
}

pub(crate) fn ret(cpu: &mut Cpu, bus: &Bus) {
    let Some(address) = cpu.pop(bus) else { return };
    cpu.pc = address;
}

pub(crate) fn iret(cpu: &mut Cpu, bus: &Bus) {
    let Some(address) = cpu.pop(bus) else { return };
    cpu.pc = address;
    cpu.interrupts_enabled = true;
}
