//! Register loads/moves and memory load/store. `LOAD_RRW` reads the base register first,
//! then fetches the trailing immediate offset word — the offset always follows the opcode
//! word in the instruction stream.

use crate::Cpu;
use emu_bus::Bus;

pub(crate) fn mov_rw(cpu: &mut Cpu, bus: &Bus, r: u8) {
    let Some(value) = cpu.fetch(bus) else { return };
    cpu.register_set(r, value);
}

pub(crate) fn mov_rr(cpu: &mut Cpu, ra: u8, rb: u8) {
    let Some(value) = cpu.register_get(rb) else { return };
    cpu.register_set(ra, value);
}

/// `Ra = MEM[Rb]`.
pub(crate) fn load_rr(cpu: &mut Cpu, bus: &Bus, ra: u8, rb: u8) {
    let Some(address) = cpu.register_get(rb) else { return };
    let Some(value) = cpu.bus_read(bus, address) else { return };
    cpu.register_set(ra, value);
}

/// `Ra = MEM[Rb + imm]`.
pub(crate) fn load_rrw(cpu: &mut Cpu, bus: &Bus, ra: u8, rb: u8) {
    let Some(base) = cpu.register_get(rb) else { return };
    let Some(offset) = cpu.fetch(bus) else { return };
    let Some(value) = cpu.bus_read(bus, base.wrapping_add(offset)) else { return };
    cpu.register_set(ra, value);
}

/// `MEM[Ra] = Rb`.
pub(crate) fn stor_rr(cpu: &mut Cpu, bus: &Bus, ra: u8, rb: u8) {
    let Some(address) = cpu.register_get(ra) else { return };
    let Some(value) = cpu.register_get(rb) else { return };
    cpu.bus_write(bus, address, value);
}
