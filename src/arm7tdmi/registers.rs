use std::fmt;

use enum_map::{Enum, EnumMap};
use log::debug;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

use crate::error::CpuError;

/// Supervisor mode, ARM state, IRQ and FIQ masked.
pub const RESET_CPSR: u32 = 0xd3;

// CPU Mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum Mode {
    User = 0x10,
    FIQ = 0x11,
    IRQ = 0x12,
    Supervisor = 0x13,
    Abort = 0x17,
    Undefined = 0x1b,
    System = 0x1f,
}

impl Mode {
    pub fn from_bits(bits: u32) -> Option<Mode> {
        Mode::from_u32(bits & Psr::MODE)
    }

    /// Exception modes own a saved status word and a private r13/r14.
    pub fn exception(self) -> Option<ExceptionMode> {
        match self {
            Mode::FIQ => Some(ExceptionMode::FIQ),
            Mode::IRQ => Some(ExceptionMode::IRQ),
            Mode::Supervisor => Some(ExceptionMode::Supervisor),
            Mode::Abort => Some(ExceptionMode::Abort),
            Mode::Undefined => Some(ExceptionMode::Undefined),
            Mode::User | Mode::System => None,
        }
    }

    pub fn is_privileged(self) -> bool {
        self != Mode::User
    }

    fn as_str<'a>(&self) -> &'a str {
        match self {
            Mode::User => "usr",
            Mode::FIQ => "fiq",
            Mode::IRQ => "irq",
            Mode::Supervisor => "svc",
            Mode::Abort => "abt",
            Mode::Undefined => "und",
            Mode::System => "sys",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum ExceptionMode {
    FIQ,
    Supervisor,
    Abort,
    IRQ,
    Undefined,
}

impl From<ExceptionMode> for Mode {
    fn from(mode: ExceptionMode) -> Mode {
        match mode {
            ExceptionMode::FIQ => Mode::FIQ,
            ExceptionMode::Supervisor => Mode::Supervisor,
            ExceptionMode::Abort => Mode::Abort,
            ExceptionMode::IRQ => Mode::IRQ,
            ExceptionMode::Undefined => Mode::Undefined,
        }
    }
}

/// Program Status Register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Psr(pub u32);

impl Psr {
    pub const N: u32 = 1 << 31;
    pub const Z: u32 = 1 << 30;
    pub const C: u32 = 1 << 29;
    pub const V: u32 = 1 << 28;
    pub const Q: u32 = 1 << 27;
    pub const I: u32 = 1 << 7;
    pub const F: u32 = 1 << 6;
    pub const T: u32 = 1 << 5;
    pub const MODE: u32 = 0x1f;

    pub fn n(self) -> bool { self.0 & Psr::N != 0 }
    pub fn z(self) -> bool { self.0 & Psr::Z != 0 }
    pub fn c(self) -> bool { self.0 & Psr::C != 0 }
    pub fn v(self) -> bool { self.0 & Psr::V != 0 }
    pub fn irq_disabled(self) -> bool { self.0 & Psr::I != 0 }
    pub fn fiq_disabled(self) -> bool { self.0 & Psr::F != 0 }
    pub fn thumb(self) -> bool { self.0 & Psr::T != 0 }

    pub fn set(&mut self, bit: u32, value: bool) {
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    /// N and Z follow `value`.
    pub fn set_nz(&mut self, value: u32) {
        self.set(Psr::N, value & (1 << 31) != 0);
        self.set(Psr::Z, value == 0);
    }

    pub fn mode_bits(self) -> u32 {
        self.0 & Psr::MODE
    }

    pub fn mode(self) -> Option<Mode> {
        Mode::from_bits(self.0)
    }

    pub fn with_mode(self, mode: Mode) -> Psr {
        Psr((self.0 & !Psr::MODE) | mode as u32)
    }
}

impl fmt::Display for Psr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c.to_ascii_uppercase() } else { c };
        write!(
            f,
            "{}{}{}{} {}{}{} ",
            flag(self.n(), 'n'),
            flag(self.z(), 'z'),
            flag(self.c(), 'c'),
            flag(self.v(), 'v'),
            flag(self.irq_disabled(), 'i'),
            flag(self.fiq_disabled(), 'f'),
            flag(self.thumb(), 't'),
        )?;
        match self.mode() {
            Some(mode) => write!(f, "{}", mode),
            None => write!(f, "?{:02x}", self.mode_bits()),
        }
    }
}

// Storage location a logical register index resolves to in the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Shared,
    Fiq(usize),
    Banked(ExceptionMode, usize),
}

/// ARM7TDMI register file: the shared registers, the per-mode shadows and the status words.
#[derive(Debug, Clone, PartialEq)]
pub struct Registers {
    shared: [u32; 16],
    fiq: [u32; 5],                            // r8-r12 in FIQ mode
    banked: EnumMap<ExceptionMode, [u32; 2]>, // r13-r14 per exception mode
    spsr: EnumMap<ExceptionMode, Psr>,
    cpsr: Psr,
    mode: Mode,
    map: [Slot; 16],
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    pub fn new() -> Self {
        let mut regs = Registers {
            shared: [0; 16],
            fiq: [0; 5],
            banked: EnumMap::default(),
            spsr: EnumMap::default(),
            cpsr: Psr(RESET_CPSR),
            mode: Mode::Supervisor,
            map: [Slot::Shared; 16],
        };
        regs.remap();
        regs
    }

    fn remap(&mut self) {
        let exception = self.mode.exception();
        for (i, slot) in self.map.iter_mut().enumerate() {
            *slot = match (self.mode, exception, i) {
                (Mode::FIQ, _, 8..=12) => Slot::Fiq(i - 8),
                (_, Some(bank), 13..=14) => Slot::Banked(bank, i - 13),
                _ => Slot::Shared,
            };
        }
    }

    pub fn read(&self, index: usize) -> u32 {
        match self.map[index] {
            Slot::Shared => self.shared[index],
            Slot::Fiq(i) => self.fiq[i],
            Slot::Banked(bank, i) => self.banked[bank][i],
        }
    }

    pub fn write(&mut self, index: usize, value: u32) {
        match self.map[index] {
            Slot::Shared => self.shared[index] = value,
            Slot::Fiq(i) => self.fiq[i] = value,
            Slot::Banked(bank, i) => self.banked[bank][i] = value,
        }
    }

    /// User bank view, used by block transfers with the S bit set.
    pub fn read_user(&self, index: usize) -> u32 {
        self.shared[index]
    }

    pub fn write_user(&mut self, index: usize, value: u32) {
        self.shared[index] = value;
    }

    pub fn pc(&self) -> u32 {
        self.shared[15]
    }

    pub fn set_pc(&mut self, value: u32) {
        self.shared[15] = value;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches the mode bits of CPSR and re-resolves the banked registers.
    pub fn set_mode(&mut self, mode: Mode) {
        self.cpsr = self.cpsr.with_mode(mode);
        self.mode = mode;
        self.remap();
    }

    pub fn cpsr(&self) -> Psr {
        self.cpsr
    }

    /// Writes the whole CPSR. Invalid mode bits are stored but leave the bank mapping of the
    /// last valid mode in place.
    pub fn set_cpsr(&mut self, psr: Psr) -> Result<(), CpuError> {
        self.cpsr = psr;
        match psr.mode() {
            Some(mode) => {
                self.mode = mode;
                self.remap();
                Ok(())
            }
            None => Err(CpuError::InvalidMode {
                bits: psr.mode_bits(),
                pc: self.pc(),
            }),
        }
    }

    /// Updates flag or control bits that never include the mode field.
    pub fn set_cpsr_bit(&mut self, bit: u32, value: bool) {
        debug_assert_eq!(bit & Psr::MODE, 0);
        self.cpsr.set(bit, value);
    }

    pub fn set_nz(&mut self, value: u32) {
        self.cpsr.set_nz(value);
    }

    /// SPSR of the current mode. USR and SYS have none and observe CPSR instead.
    pub fn spsr(&self) -> Psr {
        match self.mode.exception() {
            Some(bank) => self.spsr[bank],
            None => {
                debug!("spsr read in {} mode, returning cpsr", self.mode);
                self.cpsr
            }
        }
    }

    pub fn set_spsr(&mut self, psr: Psr) {
        match self.mode.exception() {
            Some(bank) => self.spsr[bank] = psr,
            None => debug!("spsr write of 0x{:08x} ignored in {} mode", psr.0, self.mode),
        }
    }

    pub fn spsr_of(&self, bank: ExceptionMode) -> Psr {
        self.spsr[bank]
    }

    pub fn set_spsr_of(&mut self, bank: ExceptionMode, psr: Psr) {
        self.spsr[bank] = psr;
    }
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "     Sys/User FIQ      Supervis Abort    IRQ      Undefined")?;
        for i in 0..8 {
            writeln!(f, "R{:<2}  {:08x}", i, self.shared[i])?;
        }
        for i in 8..13 {
            writeln!(f, "R{:<2}  {:08x} {:08x}", i, self.shared[i], self.fiq[i - 8])?;
        }
        for i in 13..15 {
            write!(f, "R{:<2}  {:08x}", i, self.shared[i])?;
            for (_, bank) in self.banked.iter() {
                write!(f, " {:08x}", bank[i - 13])?;
            }
            writeln!(f)?;
        }
        writeln!(f, "R15  {:08x}", self.shared[15])?;
        writeln!(f, "CPSR {:08x} [{}]", self.cpsr.0, self.cpsr)?;
        write!(f, "SPSR")?;
        for (_, spsr) in self.spsr.iter() {
            write!(f, " {:08x}", spsr.0)?;
        }
        writeln!(f)
    }
}
