use emu_cpu::Cpu;
use emu_machine::Machine;
use serde::Serialize;

/// A deterministic, diffable snapshot of machine state: CPU registers/flags/PC/SP, RAM
/// contents, and PIC pending/mask bitsets. Used only for `--print-json`; never
/// round-tripped back into a running machine.
#[derive(Debug, Serialize)]
pub struct VmSnapshot {
    pub registers: Vec<u32>,
    pub pc: u32,
    pub sp: u32,
    pub cs: u32,
    pub bp: u32,
    pub ir: u8,
    pub idt: u32,
    pub zero_flag: bool,
    pub negative_flag: bool,
    pub interrupts_enabled: bool,
    pub step_count: u64,
    pub panic: Option<String>,
    pub ram: Vec<u32>,
    pub pic_pending: Vec<u32>,
    pub pic_mask: Vec<u32>,
}

impl VmSnapshot {
    pub fn capture(cpu: &Cpu, machine: &Machine) -> Self {
        Self {
            registers: cpu.registers().to_vec(),
            pc: cpu.pc(),
            sp: cpu.sp(),
            cs: cpu.cs(),
            bp: cpu.bp(),
            ir: cpu.ir(),
            idt: cpu.idt(),
            zero_flag: cpu.zero_flag(),
            negative_flag: cpu.negative_flag(),
            interrupts_enabled: cpu.interrupts_enabled(),
            step_count: cpu.step_count(),
            panic: cpu.panic().map(|p| p.to_string()),
            ram: machine.ram_words(),
            pic_pending: machine.pic().pending_words().to_vec(),
            pic_mask: machine.pic().mask_words().to_vec(),
        }
    }
}
