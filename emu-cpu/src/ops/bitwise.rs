//! Bitwise register operations. Flags follow the same write path as arithmetic: any
//! register write updates Z and N.

use crate::Cpu;
use emu_bus::Bus;

pub(crate) fn and_rr(cpu: &mut Cpu, ra: u8, rb: u8, rc: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(c) = cpu.register_get(rc) else { return };
    cpu.register_set(ra, b & c);
}

pub(crate) fn and_rw(cpu: &mut Cpu, bus: &Bus, ra: u8, rb: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(w) = cpu.fetch(bus) else { return };
    cpu.register_set(ra, b & w);
}

pub(crate) fn or_rr(cpu: &mut Cpu, ra: u8, rb: u8, rc: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(c) = cpu.register_get(rc) else { return };
    cpu.register_set(ra, b | c);
}

pub(crate) fn or_rw(cpu: &mut Cpu, bus: &Bus, ra: u8, rb: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(w) = cpu.fetch(bus) else { return };
    cpu.register_set(ra, b | w);
}

pub(crate) fn xor_rr(cpu: &mut Cpu, ra: u8, rb: u8, rc: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(c) = cpu.register_get(rc) else { return };
    cpu.register_set(ra, b ^ c);
}

pub(crate) fn xor_rw(cpu: &mut Cpu, bus: &Bus, ra: u8, rb: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(w) = cpu.fetch(bus) else { return };
    cpu.register_set(ra, b ^ w);
}
