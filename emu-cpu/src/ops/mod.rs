//! Instruction bodies, grouped the way the instruction set itself is grouped in spec form:
//! stack, data movement, arithmetic, bitwise, compare/branch, call/return, interrupt
//! control, and debug toggles. `execute` is the single dispatch point the main loop calls.

mod arith;
mod bitwise;
mod branch;
mod call;
mod control;
mod data;
mod interrupt;
mod stack;

use crate::{Cpu, Opcode};
use emu_bus::Bus;
use emu_pic::Pic;

#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(cpu: &mut Cpu, op: Opcode, b1: u8, b2: u8, b3: u8, bus: &Bus, pic: &Pic) {
    match op {
        Opcode::Nop => control::nop(),
        Opcode::Halt => control::halt(cpu),
        Opcode::Panic => control::panic(cpu),

        Opcode::PushR => stack::push_r(cpu, bus, b1),
        Opcode::PushW => stack::push_w(cpu, bus),
        Opcode::Pusha => stack::pusha(cpu, bus),
        Opcode::PushRr => stack::push_rr(cpu, bus, b1, b2),
        Opcode::PushRrr => stack::push_rrr(cpu, bus, b1, b2, b3),
        Opcode::PopR => stack::pop_r(cpu, bus, b1),
        Opcode::Popa => stack::popa(cpu, bus),
        Opcode::PopRr => stack::pop_rr(cpu, bus, b1, b2),
        Opcode::PopRrr => stack::pop_rrr(cpu, bus, b1, b2, b3),

        Opcode::MovRw => data::mov_rw(cpu, bus, b1),
        Opcode::MovRr => data::mov_rr(cpu, b1, b2),
        Opcode::LoadRr => data::load_rr(cpu, bus, b1, b2),
        Opcode::LoadRrw => data::load_rrw(cpu, bus, b1, b2),
        Opcode::StorRr => data::stor_rr(cpu, bus, b1, b2),

        Opcode::AddRr => arith::add_rr(cpu, b1, b2, b3),
        Opcode::AddRw => arith::add_rw(cpu, bus, b1, b2),
        Opcode::SubRr => arith::sub_rr(cpu, b1, b2, b3),
        Opcode::SubRw => arith::sub_rw(cpu, bus, b1, b2),
        Opcode::MulRr => arith::mul_rr(cpu, b1, b2, b3),
        Opcode::MulRw => arith::mul_rw(cpu, bus, b1, b2),
        Opcode::IncR => arith::inc_r(cpu, b1),
        Opcode::DecR => arith::dec_r(cpu, b1),

        Opcode::AndRr => bitwise::and_rr(cpu, b1, b2, b3),
        Opcode::AndRw => bitwise::and_rw(cpu, bus, b1, b2),
        Opcode::OrRr => bitwise::or_rr(cpu, b1, b2, b3),
        Opcode::OrRw => bitwise::or_rw(cpu, bus, b1, b2),
        Opcode::XorRr => bitwise::xor_rr(cpu, b1, b2, b3),
        Opcode::XorRw => bitwise::xor_rw(cpu, bus, b1, b2),

        Opcode::CmpRr => branch::cmp_rr(cpu, b1, b2),
        Opcode::CmpRw => branch::cmp_rw(cpu, bus, b1),
        Opcode::JeqS => branch::jeq_s(cpu, bus),
        Opcode::JeqA => branch::jeq_a(cpu, bus),
        Opcode::JneS => branch::jne_s(cpu, bus),
        Opcode::JneA => branch::jne_a(cpu, bus),
        Opcode::JmpS => branch::jmp_s(cpu, bus),
        Opcode::JmpA => branch::jmp_a(cpu, bus),

        Opcode::CallS => call::call_s(cpu, bus),
        Opcode::CallA => call::call_a(cpu, bus),
        Opcode::CallR => call::call_r(cpu, bus, b1),
        Opcode::Ret => call::ret(cpu, bus),
        Opcode::Iret => call::iret(cpu, bus),

        Opcode::IntB => interrupt::int_b(pic, b1),
        Opcode::MiB => interrupt::mi_b(pic, b1),
        Opcode::UmiB => interrupt::umi_b(pic, b1),
        Opcode::Ind => interrupt::ind(cpu),
        Opcode::Ine => interrupt::ine(cpu),
        Opcode::Wfi => interrupt::wfi(pic),

        Opcode::Xbm => control::xbm(cpu),
        Opcode::Xbrk => control::xbrk(cpu),
        Opcode::Xdbg => control::xdbg(cpu),
        Opcode::Xpse => control::xpse(cpu),
        Opcode::Xpsd => control::xpsd(cpu),
    }
}
