//! Pluggable single-step debugger hook. The CPU itself never parses commands or prints
//! anything — it only calls into a `Debugger` when the trap flag is set, before executing
//! the next instruction.

use crate::Cpu;
use emu_bus::Bus;

pub enum DebuggerAction {
    /// Clear the trap flag and run freely.
    Continue,
    /// Leave the trap flag set so the debugger is re-entered before the following
    /// instruction too.
    Step,
}

/// Implemented by whatever drives interactive or scripted single-stepping. `emu-cli`
/// supplies a line-oriented implementation (help/continue/step/quit/print-register/
/// print-memory); tests can supply a scripted one.
pub trait Debugger: Send {
    fn on_trap(&mut self, cpu: &Cpu, bus: &Bus) -> DebuggerAction;
}
