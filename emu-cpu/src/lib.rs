//! Register file, flags, fetch-decode-execute loop, and interrupt entry for the synthetic
//! CPU. Instruction bodies live in [`ops`]; opcode identity and decoding live in
//! [`opcode`].

mod debugger;
mod opcode;
mod ops;

pub use debugger::{Debugger, DebuggerAction};
pub use opcode::Opcode;

use emu_bus::Bus;
use emu_pic::Pic;
use emu_region::WORD_SIZE;
use thiserror::Error;
use tracing::{debug, warn};

/// `PC = SP = CS = STACK_SIZE` on reset; the bottom of the address space up to this point
/// is the call stack.
pub const STACK_SIZE: u32 = 1024 * WORD_SIZE;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PanicKind {
    #[error("cannot read memory")]
    CannotReadMemory,
    #[error("cannot write memory")]
    CannotWriteMemory,
    #[error("unimplemented opcode {0:#04x}")]
    UnimplementedOpcode(u8),
    #[error("invalid register {0}")]
    InvalidRegister(u8),
    #[error("explicit panic instruction")]
    Panic,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CpuConfigError {
    #[error("register count must be in 1..=255, got {0}")]
    InvalidRegisterCount(u8),
}

/// The CPU's mutable state. Owned exclusively by whichever thread drives `step`/`run` — no
/// other thread ever reads or writes this struct directly.
pub struct Cpu {
    registers: Vec<u32>,
    register_count: u8,

    pc: u32,
    sp: u32,
    cs: u32,
    bp: u32,
    ir: u8,
    idt: u32,

    zero: bool,
    negative: bool,
    interrupts_enabled: bool,

    running: bool,
    panic: Option<PanicKind>,

    print_op: bool,
    step_count: u64,
    trap: bool,
    debugger: Option<Box<dyn Debugger>>,
}

impl Cpu {
    /// `idt_base` is the bus address of the interrupt descriptor table; handler addresses
    /// are read from `idt_base + interrupt_number * word_size`.
    pub fn new(register_count: u8, idt_base: u32) -> Result<Self, CpuConfigError> {
        if register_count == 0 {
            return Err(CpuConfigError::InvalidRegisterCount(register_count));
        }
        let mut cpu = Self {
            registers: vec![0; register_count as usize],
            register_count,
            pc: 0,
            sp: 0,
            cs: 0,
            bp: 0,
            ir: 0,
            idt: idt_base,
            zero: false,
            negative: false,
            interrupts_enabled: false,
            running: false,
            panic: None,
            print_op: false,
            step_count: 0,
            trap: false,
            debugger: None,
        };
        cpu.reset();
        Ok(cpu)
    }

    pub fn with_debugger(mut self, debugger: Box<dyn Debugger>) -> Self {
        self.debugger = Some(debugger);
        self
    }

    pub fn reset(&mut self) {
        self.registers.iter_mut().for_each(|r| *r = 0);
        self.pc = STACK_SIZE;
        self.sp = STACK_SIZE;
        self.cs = STACK_SIZE;
        self.bp = 0;
        self.ir = 0;
        self.zero = false;
        self.negative = false;
        self.interrupts_enabled = false;
        self.running = false;
        self.panic = None;
        self.print_op = false;
        self.step_count = 0;
        self.trap = false;
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn set_register(&mut self, r: u8, value: u32) {
        if let Some(slot) = self.registers.get_mut(r as usize) {
            *slot = value;
        }
    }

    /// Runs until `Running` is cleared (by `HALT`, a fault, or an explicit `stop`).
    pub fn run(&mut self, bus: &Bus, pic: &Pic) {
        self.running = true;
        while self.running {
            self.step(bus, pic);
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Marks the CPU as running without entering `run`'s own loop, for callers that drive
    /// `step` themselves (e.g. to interleave an external stop signal).
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn step(&mut self, bus: &Bus, pic: &Pic) {
        if !self.running || self.panic.is_some() {
            return;
        }

        self.maybe_enter_interrupt(bus, pic);
        if self.panic.is_some() {
            self.running = false;
            return;
        }

        if self.trap {
            self.trap = self.run_debugger_trap(bus);
        }

        let Some(word) = self.fetch(bus) else {
            self.running = false;
            return;
        };

        let (opcode_byte, b1, b2, b3) = decode_operand_bytes(word);
        let Some(op) = Opcode::decode(opcode_byte) else {
            warn!(opcode = opcode_byte, "unimplemented opcode");
            self.panic = Some(PanicKind::UnimplementedOpcode(opcode_byte));
            self.running = false;
            return;
        };

        ops::execute(self, op, b1, b2, b3, bus, pic);
        self.step_count += 1;

        if self.panic.is_some() {
            self.running = false;
        }
    }

    fn maybe_enter_interrupt(&mut self, bus: &Bus, pic: &Pic) {
        if !self.interrupts_enabled || !pic.any_deliverable() {
            return;
        }

        self.interrupts_enabled = false;
        let ir = pic.next_deliverable();
        pic.reset(ir);
        self.ir = ir;
        debug!(interrupt = ir, "entering interrupt handler");

        if !self.push(bus, self.pc) {
            return;
        }
        let handler_slot = self.idt.wrapping_add(u32::from(ir) * WORD_SIZE);
        match bus.read_word(handler_slot) {
            Ok(addr) => self.pc = addr,
            Err(_) => self.panic = Some(PanicKind::CannotReadMemory),
        }
    }

    fn run_debugger_trap(&mut self, bus: &Bus) -> bool {
        let Some(mut debugger) = self.debugger.take() else {
            return false;
        };
        let action = debugger.on_trap(self, bus);
        self.debugger = Some(debugger);
        matches!(action, DebuggerAction::Step)
    }

    fn fetch(&mut self, bus: &Bus) -> Option<u32> {
        match bus.read_word(self.pc) {
            Ok(word) => {
                self.pc = self.pc.wrapping_add(WORD_SIZE);
                Some(word)
            }
            Err(_) => {
                self.panic = Some(PanicKind::CannotReadMemory);
                None
            }
        }
    }

    fn bus_write(&mut self, bus: &Bus, address: u32, value: u32) -> bool {
        match bus.write_word(address, value) {
            Ok(()) => true,
            Err(_) => {
                self.panic = Some(PanicKind::CannotWriteMemory);
                false
            }
        }
    }

    fn bus_read(&mut self, bus: &Bus, address: u32) -> Option<u32> {
        match bus.read_word(address) {
            Ok(value) => Some(value),
            Err(_) => {
                self.panic = Some(PanicKind::CannotReadMemory);
                None
            }
        }
    }

    fn push(&mut self, bus: &Bus, value: u32) -> bool {
        self.sp = self.sp.wrapping_sub(WORD_SIZE);
        self.bus_write(bus, self.sp, value)
    }

    fn pop(&mut self, bus: &Bus) -> Option<u32> {
        let value = self.bus_read(bus, self.sp)?;
        self.sp = self.sp.wrapping_add(WORD_SIZE);
        Some(value)
    }

    fn register_get(&mut self, r: u8) -> Option<u32> {
        if r >= self.register_count {
            self.panic = Some(PanicKind::InvalidRegister(r));
            return None;
        }
        Some(self.registers[r as usize])
    }

    fn register_set(&mut self, r: u8, value: u32) -> bool {
        if r >= self.register_count {
            self.panic = Some(PanicKind::InvalidRegister(r));
            return false;
        }
        self.registers[r as usize] = value;
        self.update_flags(value as i32);
        true
    }

    fn update_flags(&mut self, signed_value: i32) {
        self.zero = signed_value == 0;
        self.negative = signed_value < 0;
    }

    pub fn registers(&self) -> &[u32] {
        &self.registers
    }

    pub fn register_count(&self) -> u8 {
        self.register_count
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn sp(&self) -> u32 {
        self.sp
    }

    pub fn cs(&self) -> u32 {
        self.cs
    }

    pub fn bp(&self) -> u32 {
        self.bp
    }

    pub fn ir(&self) -> u8 {
        self.ir
    }

    pub fn idt(&self) -> u32 {
        self.idt
    }

    pub fn zero_flag(&self) -> bool {
        self.zero
    }

    pub fn negative_flag(&self) -> bool {
        self.negative
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn panic(&self) -> Option<PanicKind> {
        self.panic
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn print_op_enabled(&self) -> bool {
        self.print_op
    }
}

/// Splits a fetched word into its opcode byte and three operand bytes, most significant
/// byte first (the word is logically big-endian: storage is host order, but operand
/// extraction is always done with shifts so it never depends on the host's native
/// endianness).
fn decode_operand_bytes(word: u32) -> (u8, u8, u8, u8) {
    (
        (word >> 24) as u8,
        (word >> 16) as u8,
        (word >> 8) as u8,
        word as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_bus::Bus;
    use emu_pic::Pic;
    use emu_region::{AccessMode, Region};

    fn test_cpu(ram_size: u32) -> (Cpu, Bus, std::sync::Arc<Pic>) {
        let mut bus = Bus::new();
        bus.attach(0, Region::new(STACK_SIZE + ram_size, AccessMode::ReadWrite), "ram")
            .unwrap();
        let cpu = Cpu::new(4, 0xF000_0000).unwrap();
        (cpu, bus, Pic::new())
    }

    fn word(opcode: u8, b1: u8, b2: u8, b3: u8) -> u32 {
        (u32::from(opcode) << 24) | (u32::from(b1) << 16) | (u32::from(b2) << 8) | u32::from(b3)
    }

    fn write_program(bus: &Bus, words: &[u32]) {
        for (i, w) in words.iter().enumerate() {
            bus.write_word(STACK_SIZE + (i as u32) * WORD_SIZE, *w).unwrap();
        }
    }

    #[test]
    fn reset_sets_documented_initial_state() {
        let (mut cpu, _bus, _pic) = test_cpu(256);
        cpu.set_register(0, 42);
        cpu.reset();
        assert_eq!(cpu.registers(), &[0, 0, 0, 0]);
        assert_eq!(cpu.pc(), STACK_SIZE);
        assert_eq!(cpu.sp(), STACK_SIZE);
        assert_eq!(cpu.cs(), STACK_SIZE);
        assert!(!cpu.zero_flag());
        assert!(!cpu.negative_flag());
        assert!(!cpu.interrupts_enabled());
        assert!(!cpu.is_running());
        assert_eq!(cpu.panic(), None);
    }

    #[test]
    fn smoke_halt_increments_step_count_once() {
        let (mut cpu, bus, pic) = test_cpu(64);
        write_program(&bus, &[word(Opcode::Halt as u8, 0, 0, 0)]);
        cpu.set_pc(STACK_SIZE);
        cpu.run(&bus, &pic);
        assert_eq!(cpu.panic(), None);
        assert!(!cpu.is_running());
        assert_eq!(cpu.step_count(), 1);
    }

    #[test]
    fn invalid_register_count_is_rejected() {
        assert_eq!(
            Cpu::new(0, 0),
            Err(CpuConfigError::InvalidRegisterCount(0))
        );
    }
}
