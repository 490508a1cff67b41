//! Signed, wrapping arithmetic. There is no carry or overflow flag — wraparound on
//! overflow is the intended behavior, not an unfinished feature.

use crate::Cpu;
use emu_bus::Bus;

pub(crate) fn add_rr(cpu: &mut Cpu, ra: u8, rb: u8, rc: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(c) = cpu.register_get(rc) else { return };
    cpu.register_set(ra, (b as i32).wrapping_add(c as i32) as u32);
}

pub(crate) fn add_rw(cpu: &mut Cpu, bus: &Bus, ra: u8, rb: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(w) = cpu.fetch(bus) else { return };
    cpu.register_set(ra, (b as i32).wrapping_add(w as i32) as u32);
}

pub(crate) fn sub_rr(cpu: &mut Cpu, ra: u8, rb: u8, rc: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(c) = cpu.register_get(rc) else { return };
    cpu.register_set(ra, (b as i32).wrapping_sub(c as i32) as u32);
}

pub(crate) fn sub_rw(cpu: &mut Cpu, bus: &Bus, ra: u8, rb: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(w) = cpu.fetch(bus) else { return };
    cpu.register_set(ra, (b as i32).wrapping_sub(w as i32) as u32);
}

pub(crate) fn mul_rr(cpu: &mut Cpu, ra: u8, rb: u8, rc: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(c) = cpu.register_get(rc) else { return };
    cpu.register_set(ra, (b as i32).wrapping_mul(c as i32) as u32);
}

pub(crate) fn mul_rw(cpu: &mut Cpu, bus: &Bus, ra: u8, rb: u8) {
    let Some(b) = cpu.register_get(rb) else { return };
    let Some(w) = cpu.fetch(bus) else { return };
    cpu.register_set(ra, (b as i32).wrapping_mul(w as i32) as u32);
}

pub(crate) fn inc_r(cpu: &mut Cpu, r: u8) {
    let Some(v) = cpu.register_get(r) else { return };
    cpu.register_set(r, (v as i32).wrapping_add(1) as u32);
}

pub(crate) fn dec_r(cpu: &mut Cpu, r: u8) {
    let Some(v) = cpu.register_get(r) else { return };
    cpu.register_set(r, (v as i32).wrapping_sub(1) as u32);
}
