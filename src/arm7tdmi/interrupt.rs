use log::{debug, trace};

use super::registers::ExceptionMode;
use super::Cpu;

pub const IRQ_VECTOR: u32 = 0x18;

/// Interrupt and halt state owned by the I/O side (IE, IF, IME and HALTCNT). The core only reads
/// the masks; it clears `halted`/`stopped` when an enabled interrupt is raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InterruptLines {
    pub enable: u16,
    pub pending: u16,
    pub master_enable: bool,
    pub halted: bool,
    pub stopped: bool,
}

impl InterruptLines {
    pub fn raised(&self) -> u16 {
        self.enable & self.pending
    }
}

impl Cpu {
    /// Enters the IRQ handler if an enabled interrupt is pending and CPSR allows it. Returns
    /// whether the exception was taken.
    pub fn maybe_dispatch(&mut self, lines: &mut InterruptLines) -> bool {
        if self.regs.cpsr().irq_disabled() {
            return false;
        }
        let raised = lines.raised();
        if raised == 0 {
            return false;
        }
        if lines.halted || lines.stopped {
            debug!("wake up on interrupts 0x{:04x}", raised);
            lines.halted = false;
            lines.stopped = false;
        }
        if !lines.master_enable {
            return false;
        }
        let ret = self.regs.pc().wrapping_add(4);
        trace!(
            "IRQ {} at pc 0x{:08x}, return to 0x{:08x}",
            raised.trailing_zeros(),
            self.regs.pc(),
            ret
        );
        self.enter_exception(ExceptionMode::IRQ, IRQ_VECTOR, ret);
        true
    }
}
