pub mod alu;
pub mod asm;
pub mod decode;
mod exec_arm;
mod exec_thumb;
pub mod interrupt;
pub mod op;
pub mod op_raw_arm;
pub mod op_raw_thumb;
pub mod registers;

use std::fmt;

use log::{error, log_enabled, trace, warn, Level};

use self::decode::{decode_arm, decode_thumb};
use self::interrupt::InterruptLines;
use self::op::{ArmInstr, Cond, ThumbInstr};
use self::registers::{ExceptionMode, Mode, Psr, Registers};
use crate::bus::Bus;
use crate::error::CpuError;

// Stack pointers left behind by the BIOS boot sequence.
const SP_USR: u32 = 0x0300_7f00;
const SP_IRQ: u32 = 0x0300_7fa0;
const SP_SVC: u32 = 0x0300_7fe0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boot {
    /// Power-on reset: PC at 0 in supervisor mode.
    #[default]
    Bios,
    /// State the BIOS hands over to the cartridge entry point.
    SkipBios { entry: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuConfig {
    /// Latch a fault on undefined and coprocessor opcodes instead of skipping them.
    pub strict_unimplemented: bool,
    /// Latch a fault when invalid mode bits are written to CPSR.
    pub fatal_invalid_mode: bool,
    pub boot: Boot,
}

impl Default for CpuConfig {
    fn default() -> Self {
        CpuConfig {
            strict_unimplemented: cfg!(feature = "strict"),
            fatal_invalid_mode: cfg!(debug_assertions),
            boot: Boot::Bios,
        }
    }
}

/// A decoded instruction waiting for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instr {
    Arm(ArmInstr),
    Thumb(ThumbInstr),
}

// ARM7TDMI
pub struct Cpu {
    regs: Registers,
    pending: Option<Instr>,
    opcode: u32,
    delay: u32,
    fault: Option<CpuError>,
    redirected: bool, // the executing instruction wrote PC
    config: CpuConfig,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::with_config(CpuConfig::default())
    }

    pub fn with_config(config: CpuConfig) -> Self {
        let mut cpu = Cpu {
            regs: Registers::new(),
            pending: None,
            opcode: 0,
            delay: 0,
            fault: None,
            redirected: false,
            config,
        };
        cpu.reset();
        cpu
    }

    /// Applies the configured boot state and clears any latched fault.
    pub fn reset(&mut self) {
        self.regs = Registers::new();
        self.pending = None;
        self.opcode = 0;
        self.delay = 0;
        self.fault = None;
        self.redirected = false;
        if let Boot::SkipBios { entry } = self.config.boot {
            self.regs.set_mode(Mode::IRQ);
            self.regs.write(13, SP_IRQ);
            self.regs.set_mode(Mode::Supervisor);
            self.regs.write(13, SP_SVC);
            self.regs.set_mode(Mode::System);
            self.regs.write(13, SP_USR);
            self.regs.set_cpsr_bit(Psr::I, false);
            self.regs.set_cpsr_bit(Psr::F, false);
            self.regs.set_pc(entry);
        }
    }

    /// Advances the core by one cycle.
    pub fn step(&mut self, bus: &mut impl Bus, lines: &mut InterruptLines) {
        if self.fault.is_some() {
            return;
        }
        if self.delay > 0 {
            self.delay -= 1;
            return;
        }
        if (lines.halted || lines.stopped) && !self.maybe_dispatch(lines) {
            return;
        }
        if self.pending.is_none() && !self.decode(bus) {
            return;
        }
        self.execute(bus);
        if self.fault.is_some() {
            // Nothing runs after a fault.
            self.delay = 0;
            return;
        }
        self.maybe_dispatch(lines);
        self.decode(bus);
    }

    /// Fetches and decodes the instruction at PC. A failed ARM condition skips it.
    fn decode(&mut self, bus: &mut impl Bus) -> bool {
        let pc = self.regs.pc();
        if self.is_thumb() {
            let opcode = bus.read16(pc & !1);
            self.opcode = opcode as u32;
            self.pending = Some(Instr::Thumb(decode_thumb(opcode)));
            return true;
        }
        let opcode = bus.read32(pc & !3);
        self.opcode = opcode;
        if !Cond::from_field(opcode >> 28).evaluate(self.regs.cpsr()) {
            trace!("SKIP 0x{:08x}: {:08x}", pc, opcode);
            self.regs.set_pc(pc.wrapping_add(4));
            self.pending = None;
            return false;
        }
        self.pending = Some(Instr::Arm(decode_arm(opcode)));
        true
    }

    fn execute(&mut self, bus: &mut impl Bus) {
        let instr = match self.pending.take() {
            Some(instr) => instr,
            None => return,
        };
        if log_enabled!(Level::Trace) {
            self.trace_instr(instr);
        }
        self.redirected = false;
        let width = match instr {
            Instr::Arm(op) => {
                self.execute_arm(bus, op);
                4
            }
            Instr::Thumb(op) => {
                self.execute_thumb(bus, op);
                2
            }
        };
        if !self.redirected {
            self.regs.set_pc(self.regs.pc().wrapping_add(width));
        }
        #[cfg(feature = "trace_cpu")]
        trace!("\n{}", self);
    }

    fn trace_instr(&self, instr: Instr) {
        let pc = self.regs.pc();
        match instr {
            Instr::Arm(_) => trace!(
                "ARM 0x{:08x}: {:08x} {}",
                pc,
                self.opcode,
                asm::disassemble_arm(self.opcode, pc)
            ),
            Instr::Thumb(_) => trace!(
                "THB 0x{:08x}: {:04x}     {}",
                pc,
                self.opcode,
                asm::disassemble_thumb(self.opcode as u16, pc)
            ),
        }
    }

    // Register 15 as an operand: the address of the executing instruction plus the prefetch lead.
    fn operand(&self, index: usize) -> u32 {
        if index == 15 {
            self.regs.pc().wrapping_add(if self.is_thumb() { 4 } else { 8 })
        } else {
            self.regs.read(index)
        }
    }

    // Writes to register 15 branch.
    fn write_reg(&mut self, index: usize, value: u32) {
        if index == 15 {
            self.jump(value);
        } else {
            self.regs.write(index, value);
        }
    }

    fn jump(&mut self, addr: u32) {
        let addr = if self.is_thumb() { addr & !1 } else { addr & !3 };
        self.regs.set_pc(addr);
        self.pending = None;
        self.redirected = true;
    }

    fn write_cpsr(&mut self, psr: Psr) {
        if let Err(err) = self.regs.set_cpsr(psr) {
            error!("{}", err);
            if self.config.fatal_invalid_mode {
                self.fault = Some(err);
            }
        }
    }

    // Exception return: CPSR comes back from the SPSR of the current mode.
    fn restore_cpsr(&mut self) {
        let spsr = self.regs.spsr();
        self.write_cpsr(spsr);
    }

    fn enter_exception(&mut self, bank: ExceptionMode, vector: u32, return_addr: u32) {
        let cpsr = self.regs.cpsr();
        self.regs.set_spsr_of(bank, cpsr);
        self.regs.set_mode(bank.into());
        self.regs.set_cpsr_bit(Psr::I, true);
        self.regs.set_cpsr_bit(Psr::T, false);
        self.regs.write(14, return_addr);
        self.jump(vector);
    }

    fn unimplemented(&mut self) {
        let err = CpuError::Unimplemented {
            opcode: self.opcode,
            pc: self.regs.pc(),
            thumb: self.is_thumb(),
        };
        if self.config.strict_unimplemented {
            error!("{}", err);
            self.fault = Some(err);
            self.redirected = true;
        } else {
            warn!("{}", err);
        }
    }

    pub fn reg(&self, index: usize) -> u32 {
        self.regs.read(index)
    }

    /// Writing R15 discards the staged instruction.
    pub fn set_reg(&mut self, index: usize, value: u32) {
        self.write_reg(index, value);
    }

    pub fn cpsr(&self) -> Psr {
        self.regs.cpsr()
    }

    pub fn spsr(&self) -> Psr {
        self.regs.spsr()
    }

    pub fn set_spsr(&mut self, psr: Psr) {
        self.regs.set_spsr(psr);
    }

    pub fn mode(&self) -> Mode {
        self.regs.mode()
    }

    pub fn is_thumb(&self) -> bool {
        self.regs.cpsr().thumb()
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn pending(&self) -> Option<Instr> {
        self.pending
    }

    pub fn opcode(&self) -> u32 {
        self.opcode
    }

    /// Set once the core has stopped for good.
    pub fn fault(&self) -> Option<&CpuError> {
        self.fault.as_ref()
    }

    pub fn config(&self) -> &CpuConfig {
        &self.config
    }
}

impl fmt::Display for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.regs)?;
        write!(f, "delay {} opcode {:08x}", self.delay, self.opcode)?;
        if let Some(err) = &self.fault {
            write!(f, " fault: {}", err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bus::tests::Ram;

    /// `b .`, parked at jump targets so the next fetch is a real instruction.
    pub const B_SELF: u32 = 0xeaff_fffe;

    pub fn arm_cpu(program: &[u32]) -> (Cpu, Ram) {
        let mut ram = Ram::new(0x1_0000);
        ram.load_arm(0, program);
        let cpu = Cpu::with_config(CpuConfig {
            strict_unimplemented: false,
            fatal_invalid_mode: false,
            boot: Boot::SkipBios { entry: 0 },
        });
        (cpu, ram)
    }

    pub fn thumb_cpu(program: &[u16]) -> (Cpu, Ram) {
        let (mut cpu, mut ram) = arm_cpu(&[]);
        ram.load_thumb(0, program);
        cpu.regs.set_cpsr_bit(Psr::T, true);
        (cpu, ram)
    }

    /// Executes `count` instructions, running out any delay cycles first.
    pub fn run(cpu: &mut Cpu, ram: &mut Ram, count: usize) {
        let mut lines = InterruptLines::default();
        for _ in 0..count {
            while cpu.delay() > 0 {
                cpu.step(ram, &mut lines);
            }
            cpu.step(ram, &mut lines);
        }
    }

    #[test]
    fn skip_bios_state() {
        let cpu = Cpu::with_config(CpuConfig {
            boot: Boot::SkipBios { entry: 0x0800_0000 },
            ..CpuConfig::default()
        });
        assert_eq!(cpu.cpsr(), Psr(0x1f));
        assert_eq!(cpu.mode(), Mode::System);
        assert_eq!(cpu.reg(15), 0x0800_0000);
        assert_eq!(cpu.reg(13), SP_USR);
        assert_eq!(cpu.regs.spsr_of(ExceptionMode::IRQ), Psr(0));
        let mut regs = cpu.regs.clone();
        regs.set_mode(Mode::IRQ);
        assert_eq!(regs.read(13), SP_IRQ);
        regs.set_mode(Mode::Supervisor);
        assert_eq!(regs.read(13), SP_SVC);
    }

    #[test]
    fn bios_boot_state() {
        let cpu = Cpu::new();
        assert_eq!(cpu.cpsr(), Psr(0xd3));
        assert_eq!(cpu.reg(15), 0);
        assert_eq!(cpu.pending(), None);
        assert_eq!(cpu.fault(), None);
    }

    #[test]
    fn step_stages_next_instruction() {
        // mov r0, 5; add r0, r0, 3
        let (mut cpu, mut ram) = arm_cpu(&[0xe3a0_0005, 0xe280_0003]);
        let mut lines = InterruptLines::default();
        cpu.step(&mut ram, &mut lines);
        assert_eq!(cpu.reg(0), 5);
        assert_eq!(cpu.reg(15), 4);
        assert_eq!(cpu.opcode(), 0xe280_0003);
        assert!(matches!(cpu.pending(), Some(Instr::Arm(ArmInstr::DataProc { .. }))));
        cpu.step(&mut ram, &mut lines);
        assert_eq!(cpu.reg(0), 8);
    }

    #[test]
    fn delay_holds_dispatch() {
        // ldr r0, [r1]; mov r2, 1
        let (mut cpu, mut ram) = arm_cpu(&[0xe591_0000, 0xe3a0_2001]);
        cpu.set_reg(1, 0x100);
        ram.load_arm(0x100, &[0xcafe]);
        let mut lines = InterruptLines::default();
        cpu.step(&mut ram, &mut lines);
        assert_eq!(cpu.reg(0), 0xcafe);
        assert_eq!(cpu.delay(), 3);
        for _ in 0..3 {
            cpu.step(&mut ram, &mut lines);
            assert_eq!(cpu.reg(2), 0);
        }
        assert_eq!(cpu.delay(), 0);
        cpu.step(&mut ram, &mut lines);
        assert_eq!(cpu.reg(2), 1);
    }

    #[test]
    fn failed_condition_skips() {
        // movs r0, 0; movne r1, 1; moveq r2, 2
        let (mut cpu, mut ram) = arm_cpu(&[0xe3b0_0000, 0x13a0_1001, 0x03a0_2002]);
        run(&mut cpu, &mut ram, 2);
        assert_eq!(cpu.reg(1), 0);
        assert_eq!(cpu.reg(2), 2);
        assert_eq!(cpu.reg(15), 12);
    }

    #[test]
    fn first_fetch_condition_failure_takes_a_cycle() {
        // moveq r1, 1; mov r2, 2
        let (mut cpu, mut ram) = arm_cpu(&[0x03a0_1001, 0xe3a0_2002]);
        let mut lines = InterruptLines::default();
        cpu.step(&mut ram, &mut lines);
        assert_eq!(cpu.reg(15), 4);
        assert_eq!(cpu.pending(), None);
        assert_eq!(cpu.reg(1), 0);
        cpu.step(&mut ram, &mut lines);
        assert_eq!(cpu.reg(2), 2);
    }

    #[test]
    fn set_pc_discards_staged_instruction() {
        let (mut cpu, mut ram) = arm_cpu(&[0xe3a0_0005, 0xe3a0_0007]);
        ram.load_arm(0x40, &[0xe3a0_1009]);
        let mut lines = InterruptLines::default();
        cpu.step(&mut ram, &mut lines);
        assert!(cpu.pending().is_some());
        cpu.set_reg(15, 0x42);
        assert_eq!(cpu.pending(), None);
        assert_eq!(cpu.reg(15), 0x40);
        cpu.step(&mut ram, &mut lines);
        assert_eq!(cpu.reg(0), 5);
        assert_eq!(cpu.reg(1), 9);
    }

    #[test]
    fn halted_core_waits_for_interrupt() {
        let (mut cpu, mut ram) = arm_cpu(&[0xe3a0_0005]);
        ram.load_arm(0x18, &[0xe3a0_1001]);
        let mut lines = InterruptLines {
            halted: true,
            master_enable: true,
            ..InterruptLines::default()
        };
        cpu.step(&mut ram, &mut lines);
        cpu.step(&mut ram, &mut lines);
        assert_eq!(cpu.reg(0), 0);
        assert_eq!(cpu.reg(15), 0);

        lines.enable = 0x0001;
        lines.pending = 0x0001;
        cpu.step(&mut ram, &mut lines);
        assert!(!lines.halted);
        assert_eq!(cpu.mode(), Mode::IRQ);
        assert_eq!(cpu.reg(1), 1);
        assert_eq!(cpu.reg(0), 0);
    }

    #[test]
    fn irq_after_instruction() {
        // mov r0, 5; mov r0, 6
        let (mut cpu, mut ram) = arm_cpu(&[0xe3a0_0005, 0xe3a0_0006]);
        ram.load_arm(0x18, &[0xe3a0_1001]);
        let mut lines = InterruptLines {
            enable: 0x0001,
            pending: 0x0001,
            master_enable: true,
            ..InterruptLines::default()
        };
        cpu.step(&mut ram, &mut lines);
        assert_eq!(cpu.reg(0), 5);
        assert_eq!(cpu.mode(), Mode::IRQ);
        assert_eq!(cpu.reg(14), 8);
        assert_eq!(cpu.reg(15), 0x18);
        assert_eq!(cpu.opcode(), 0xe3a0_1001);
    }

    #[test]
    fn strict_unimplemented_latches_fault() {
        let (mut cpu, mut ram) = arm_cpu(&[0xe7f0_00f0, 0xe3a0_0005]);
        cpu.config.strict_unimplemented = true;
        run(&mut cpu, &mut ram, 3);
        assert_eq!(
            cpu.fault(),
            Some(&CpuError::Unimplemented { opcode: 0xe7f0_00f0, pc: 0, thumb: false })
        );
        assert_eq!(cpu.reg(0), 0);
        assert_eq!(cpu.reg(15), 0);
        cpu.reset();
        assert_eq!(cpu.fault(), None);
    }

    #[test]
    fn lenient_unimplemented_advances() {
        // undefined; mcr p15; mov r0, 5; b .
        let (mut cpu, mut ram) = arm_cpu(&[0xe7f0_00f0, 0xee01_0f10, 0xe3a0_0005, B_SELF]);
        run(&mut cpu, &mut ram, 3);
        assert_eq!(cpu.fault(), None);
        assert_eq!(cpu.reg(0), 5);
        assert_eq!(cpu.reg(15), 12);
        assert!(matches!(cpu.pending(), Some(Instr::Arm(ArmInstr::Branch { link: false }))));
    }

    #[test]
    fn invalid_mode_fault() {
        // msr cpsr_c, 0x05
        let (mut cpu, mut ram) = arm_cpu(&[0xe321_f005, 0xe3a0_0005]);
        cpu.config.fatal_invalid_mode = true;
        run(&mut cpu, &mut ram, 2);
        assert_eq!(cpu.fault(), Some(&CpuError::InvalidMode { bits: 0x05, pc: 0 }));
        assert_eq!(cpu.reg(0), 0);
        assert_eq!(cpu.mode(), Mode::System);

        let (mut cpu, mut ram) = arm_cpu(&[0xe321_f005, 0xe3a0_0005]);
        run(&mut cpu, &mut ram, 2);
        assert_eq!(cpu.fault(), None);
        assert_eq!(cpu.reg(0), 5);
        assert_eq!(cpu.mode(), Mode::System);
    }

    #[test]
    fn fault_leaves_no_delay() {
        // msr cpsr_c, 0x05 owes a cycle when it faults
        let (mut cpu, mut ram) = arm_cpu(&[0xe321_f005]);
        cpu.config.fatal_invalid_mode = true;
        let mut lines = InterruptLines::default();
        cpu.step(&mut ram, &mut lines);
        assert!(cpu.fault().is_some());
        assert_eq!(cpu.delay(), 0);
        for _ in 0..100 {
            cpu.step(&mut ram, &mut lines);
        }
        assert_eq!(cpu.delay(), 0);

        // strict unimplemented opcode
        let (mut cpu, mut ram) = arm_cpu(&[0xee01_0f10]);
        cpu.config.strict_unimplemented = true;
        run(&mut cpu, &mut ram, 10);
        assert!(cpu.fault().is_some());
        assert_eq!(cpu.delay(), 0);
    }

    #[test]
    fn display_dumps_registers() {
        let (cpu, _) = arm_cpu(&[]);
        let dump = format!("{}", cpu);
        assert!(dump.contains("CPSR 0000001f [nzcv ift sys]"));
        assert!(dump.contains("R13  03007f00"));
    }
}
