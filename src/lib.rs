//! ARM7TDMI processor core: register banks, ARM/Thumb decode tables generated at build time,
//! instruction executors, interrupt delivery and a cycle stepper driven by an external bus.

pub mod arm7tdmi;
pub mod bus;
pub mod error;

pub use arm7tdmi::alu::{add_with_carry, rotate_immediate, shift_immediate, shift_register};
pub use arm7tdmi::asm::{disassemble_arm, disassemble_thumb, Assembly};
pub use arm7tdmi::interrupt::InterruptLines;
pub use arm7tdmi::op::{
    AluOp, ArmInstr, Cond, HalfKind, HiRegOp, Indexing, Offset, Operand2, ShiftType, ThumbAluOp,
    ThumbInstr,
};
pub use arm7tdmi::registers::{ExceptionMode, Mode, Psr, Registers};
pub use arm7tdmi::{Boot, Cpu, CpuConfig, Instr};
pub use bus::Bus;
pub use error::CpuError;
