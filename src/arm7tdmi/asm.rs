use std::fmt;

use super::decode::{decode_arm, decode_thumb};
use super::op::{
    AluOp, ArmInstr, Cond, HalfKind, HiRegOp, Indexing, Offset, Operand2, ShiftType, ThumbAluOp,
    ThumbInstr,
};
use super::op_raw_arm as arm;
use super::op_raw_thumb as thumb;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRegFields {
    pub f: bool,
    pub s: bool,
    pub x: bool,
    pub c: bool,
}

impl StatusRegFields {
    fn from_field(field: u8) -> Self {
        StatusRegFields {
            f: field & 0b1000 != 0,
            s: field & 0b0100 != 0,
            x: field & 0b0010 != 0,
            c: field & 0b0001 != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReg {
    Spsr,
    Cpsr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    StatusReg(StatusReg, Option<StatusRegFields>),
    Reg(u8),
    Val(u32),
    Offset(u32), // absolute branch target
    Shift(Box<Arg>, ShiftType, Box<Arg>),
    Negative(Box<Arg>),
    WriteBack(Box<Arg>),
    Address(Args),
    RegList(u16, bool), // bool: user bank
    Coproc(u8),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Arg::Negative(arg) => write!(f, "-{}", arg),
            Arg::Reg(reg) => write!(f, "r{}", reg),
            Arg::StatusReg(sr, fields) => {
                match sr {
                    StatusReg::Spsr => write!(f, "spsr")?,
                    StatusReg::Cpsr => write!(f, "cpsr")?,
                }
                if let Some(fields) = fields {
                    write!(
                        f,
                        "_{}{}{}{}",
                        if fields.f { "f" } else { "" },
                        if fields.s { "s" } else { "" },
                        if fields.x { "x" } else { "" },
                        if fields.c { "c" } else { "" },
                    )?;
                }
                Ok(())
            }
            Arg::Val(val) => {
                if *val <= 64 {
                    write!(f, "{}", val)
                } else {
                    write!(f, "0x{:x}", val)
                }
            }
            Arg::Offset(off) => write!(f, "0x{:08x}", off),
            Arg::Shift(arg0, st, arg) => {
                write!(f, "{}", arg0)?;
                match **arg {
                    Arg::Val(0) => match st {
                        ShiftType::LSL => Ok(()),
                        ShiftType::LSR => write!(f, ", lsr 32"),
                        ShiftType::ASR => write!(f, ", asr 32"),
                        ShiftType::ROR => write!(f, ", rrx"),
                    },
                    _ => write!(f, ", {} {}", st, arg),
                }
            }
            Arg::Address(args) => write!(f, "[{}]", args),
            Arg::WriteBack(arg) => write!(f, "{}!", arg),
            Arg::RegList(list, user) => {
                let mut regs = Args::new(&[]);
                for i in (0..16u8).filter(|i| list & (1u16 << i) != 0) {
                    regs.push(Arg::Reg(i));
                }
                write!(f, "{{{}}}", regs)?;
                if *user {
                    write!(f, " ^")?;
                }
                Ok(())
            }
            Arg::Coproc(cpn) => write!(f, "p{}", cpn),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    v: Vec<Arg>,
}

impl Args {
    pub fn new(args: &[Arg]) -> Self {
        Args { v: args.to_vec() }
    }

    pub fn push(&mut self, arg: Arg) {
        self.v.push(arg);
    }

    pub fn extend(&mut self, args: &[Arg]) {
        self.v.extend_from_slice(args);
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, arg) in self.v.iter().enumerate() {
            let arg = arg.to_string();
            if i != 0 && !arg.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        Ok(())
    }
}

/// One disassembled instruction: `pre` + `mnemonic` + `mode` suffixes + condition, then the
/// argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    cond: Cond,
    pre: &'static str,
    mnemonic: &'static str,
    mode: Vec<&'static str>,
    args: Args,
}

impl Assembly {
    pub fn new(
        pre: &'static str,
        mnemonic: &'static str,
        mode: Vec<&'static str>,
        args: Args,
    ) -> Self {
        Assembly {
            cond: Cond::AL,
            pre,
            mnemonic,
            mode,
            args,
        }
    }

    fn with_cond(mut self, cond: Cond) -> Self {
        self.cond = cond;
        self
    }

    pub fn cond(&self) -> Cond {
        self.cond
    }

    pub fn args(&self) -> &Args {
        &self.args
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.pre, self.mnemonic)?;
        self.mode.iter().try_for_each(|m| write!(f, "{}", m))?;
        write!(f, "{}", self.cond)?;
        if !self.args.is_empty() {
            write!(f, " {}", self.args)?;
        }
        Ok(())
    }
}

fn suffix(set: bool, mode: &'static str) -> Vec<&'static str> {
    if set {
        vec![mode]
    } else {
        vec![]
    }
}

fn load_store(load: bool) -> &'static str {
    if load {
        "ldr"
    } else {
        "str"
    }
}

fn half_mode(kind: HalfKind) -> Vec<&'static str> {
    match kind {
        HalfKind::Half => vec!["h"],
        HalfKind::SignedByte => vec!["s", "b"],
        HalfKind::SignedHalf => vec!["s", "h"],
    }
}

fn status_reg(spsr: bool) -> StatusReg {
    if spsr {
        StatusReg::Spsr
    } else {
        StatusReg::Cpsr
    }
}

fn shifted(rm: u8, kind: ShiftType, amount: Arg) -> Arg {
    Arg::Shift(Box::new(Arg::Reg(rm)), kind, Box::new(amount))
}

fn address(rn: u8, offset: Arg) -> Arg {
    Arg::Address(Args::new(&[Arg::Reg(rn), offset]))
}

// Destination and addressing of a single transfer, pre or post indexed.
fn transfer_args(rd: u8, rn: u8, offset: Arg, index: Indexing) -> Args {
    let offset = if index.up {
        offset
    } else {
        Arg::Negative(Box::new(offset))
    };
    let mut args = Args::new(&[Arg::Reg(rd)]);
    if index.pre {
        let addr = address(rn, offset);
        args.push(if index.writeback {
            Arg::WriteBack(Box::new(addr))
        } else {
            addr
        });
    } else {
        args.extend(&[Arg::Address(Args::new(&[Arg::Reg(rn)])), offset]);
    }
    args
}

fn data_proc(opcode: u32, op: AluOp, s: bool, operand: Operand2) -> Assembly {
    let (rn, rd, op2) = match operand {
        Operand2::Immediate => {
            let raw = arm::OpRawDataProcC::new(opcode);
            (raw.rn, raw.rd, Arg::Val(raw.value()))
        }
        Operand2::ShiftImm(kind) => {
            let raw = arm::OpRawDataProcA::new(opcode);
            (raw.rn, raw.rd, shifted(raw.rm, kind, Arg::Val(raw.shift as u32)))
        }
        Operand2::ShiftReg(kind) => {
            let raw = arm::OpRawDataProcB::new(opcode);
            (raw.rn, raw.rd, shifted(raw.rm, kind, Arg::Reg(raw.rs)))
        }
    };
    // Test ops always set flags; "p" marks the CPSR restoring form.
    let mode = if op.writes_result() {
        suffix(s, "s")
    } else {
        suffix(rd == 15, "p")
    };
    let mut args = match op {
        AluOp::TST | AluOp::TEQ | AluOp::CMP | AluOp::CMN => Args::new(&[Arg::Reg(rn)]),
        AluOp::MOV | AluOp::MVN => Args::new(&[Arg::Reg(rd)]),
        _ => Args::new(&[Arg::Reg(rd), Arg::Reg(rn)]),
    };
    args.push(op2);
    Assembly::new("", op.as_str(), mode, args)
}

fn coprocessor(opcode: u32) -> Assembly {
    let (mnemonic, cpn) = if (opcode >> 25) & 0b111 == 0b110 {
        let raw = arm::OpRawCoDataTrans::new(opcode);
        (if raw.l { "ldc" } else { "stc" }, raw.cpn)
    } else if opcode & (1 << 4) == 0 {
        ("cdp", arm::OpRawCoDataOp::new(opcode).cpn)
    } else {
        let raw = arm::OpRawCoRegTrans::new(opcode);
        (if raw.l { "mrc" } else { "mcr" }, raw.cpn)
    };
    Assembly::new("", mnemonic, vec![], Args::new(&[Arg::Coproc(cpn)]))
}

fn undefined(opcode: u32) -> Assembly {
    let args = if opcode & 0x0e00_0010 == 0x0600_0010 {
        let raw = arm::OpRawUndefined::new(opcode);
        Args::new(&[Arg::Val(raw.ignored), Arg::Val(raw.xxx as u32)])
    } else {
        Args::new(&[Arg::Val(opcode & 0x0fff_ffff)])
    };
    Assembly::new("", "undefined", vec![], args)
}

/// Disassembles an ARM opcode located at `pc`.
pub fn disassemble_arm(opcode: u32, pc: u32) -> Assembly {
    let asm = match decode_arm(opcode) {
        ArmInstr::DataProc { op, s, operand } => data_proc(opcode, op, s, operand),
        ArmInstr::Multiply { accumulate, s } => {
            let raw = arm::OpRawMultiply::new(opcode);
            let mut args = Args::new(&[Arg::Reg(raw.rd), Arg::Reg(raw.rm), Arg::Reg(raw.rs)]);
            if accumulate {
                args.push(Arg::Reg(raw.rn));
            }
            let mnemonic = if accumulate { "mla" } else { "mul" };
            Assembly::new("", mnemonic, suffix(s, "s"), args)
        }
        ArmInstr::MultiplyLong { signed, accumulate, s } => {
            let raw = arm::OpRawMultiplyLong::new(opcode);
            let mut mode = vec!["l"];
            mode.extend(suffix(s, "s"));
            let args = Args::new(&[
                Arg::Reg(raw.rd_lo),
                Arg::Reg(raw.rd_hi),
                Arg::Reg(raw.rm),
                Arg::Reg(raw.rs),
            ]);
            let pre = if signed { "s" } else { "u" };
            Assembly::new(pre, if accumulate { "mla" } else { "mul" }, mode, args)
        }
        ArmInstr::Swap { byte } => {
            let raw = arm::OpRawSwap::new(opcode);
            let args = Args::new(&[
                Arg::Reg(raw.rd),
                Arg::Reg(raw.rm),
                Arg::Address(Args::new(&[Arg::Reg(raw.rn)])),
            ]);
            Assembly::new("", "swp", suffix(byte, "b"), args)
        }
        ArmInstr::BranchExchange => {
            let raw = arm::OpRawBranchExchange::new(opcode);
            Assembly::new("", "bx", vec![], Args::new(&[Arg::Reg(raw.rn)]))
        }
        ArmInstr::Mrs { spsr } => {
            let raw = arm::OpRawPsrReg::new(opcode);
            let args = Args::new(&[Arg::Reg(raw.rd), Arg::StatusReg(status_reg(spsr), None)]);
            Assembly::new("", "mrs", vec![], args)
        }
        ArmInstr::Msr { spsr, immediate } => {
            let (field, src) = if immediate {
                let raw = arm::OpRawPsrImm::new(opcode);
                (raw.field, Arg::Val(raw.value()))
            } else {
                let raw = arm::OpRawPsrReg::new(opcode);
                (raw.field, Arg::Reg(raw.rm))
            };
            let fields = StatusRegFields::from_field(field);
            let args = Args::new(&[Arg::StatusReg(status_reg(spsr), Some(fields)), src]);
            Assembly::new("", "msr", vec![], args)
        }
        ArmInstr::Transfer { load, byte, index, offset } => {
            let (rn, rd, offset) = match offset {
                Offset::Immediate => {
                    let raw = arm::OpRawTransImm::new(opcode);
                    (raw.rn, raw.rd, Arg::Val(raw.offset as u32))
                }
                Offset::Register(kind) => {
                    let raw = arm::OpRawTransReg::new(opcode);
                    (raw.rn, raw.rd, shifted(raw.rm, kind, Arg::Val(raw.shift as u32)))
                }
            };
            let mut mode = suffix(byte, "b");
            mode.extend(suffix(!index.pre && index.writeback, "t"));
            Assembly::new("", load_store(load), mode, transfer_args(rd, rn, offset, index))
        }
        ArmInstr::TransferHalf { load, kind, index, immediate } => {
            let raw = arm::OpRawTransHalf::new(opcode);
            let offset = if immediate {
                Arg::Val(raw.immediate())
            } else {
                Arg::Reg(raw.offset_l)
            };
            let args = transfer_args(raw.rd, raw.rn, offset, index);
            Assembly::new("", load_store(load), half_mode(kind), args)
        }
        ArmInstr::TransferBlock { load, user, index } => {
            let raw = arm::OpRawBlockTrans::new(opcode);
            let mode = match (index.pre, index.up) {
                (false, false) => "da",
                (false, true) => "",
                (true, false) => "db",
                (true, true) => "ib",
            };
            let mut base = Arg::Reg(raw.rn);
            if index.writeback {
                base = Arg::WriteBack(Box::new(base));
            }
            let args = Args::new(&[base, Arg::RegList(raw.register_list, user)]);
            Assembly::new("", if load { "ldm" } else { "stm" }, vec![mode], args)
        }
        ArmInstr::Branch { link } => {
            let raw = arm::OpRawBranchOff::new(opcode);
            let target = pc.wrapping_add(8).wrapping_add(raw.offset() as u32);
            Assembly::new("", "b", suffix(link, "l"), Args::new(&[Arg::Offset(target)]))
        }
        ArmInstr::SoftwareInterrupt => {
            let raw = arm::OpRawSwi::new(opcode);
            Assembly::new("", "swi", vec![], Args::new(&[Arg::Val(raw.comment)]))
        }
        ArmInstr::Coprocessor => coprocessor(opcode),
        ArmInstr::Undefined => undefined(opcode),
    };
    asm.with_cond(Cond::from_field(opcode >> 28))
}

/// Disassembles a Thumb opcode located at `pc`. The two halves of BL are shown separately.
pub fn disassemble_thumb(opcode: u16, pc: u32) -> Assembly {
    let branch_base = pc.wrapping_add(4);
    match decode_thumb(opcode) {
        ThumbInstr::MoveShifted { kind } => {
            let raw = thumb::OpRawShifted::new(opcode);
            let mut args = Args::new(&[Arg::Reg(raw.rd), Arg::Reg(raw.rs)]);
            let mnemonic = match (kind, raw.offset) {
                (ShiftType::LSL, 0) => "mov",
                (kind, 0) => {
                    args.push(Arg::Val(32));
                    kind.as_str()
                }
                (kind, offset) => {
                    args.push(Arg::Val(offset as u32));
                    kind.as_str()
                }
            };
            Assembly::new("", mnemonic, vec!["s"], args)
        }
        ThumbInstr::AddSub { sub, immediate } => {
            let raw = thumb::OpRawAddSub::new(opcode);
            let op2 = if immediate {
                Arg::Val(raw.rn as u32)
            } else {
                Arg::Reg(raw.rn)
            };
            let args = Args::new(&[Arg::Reg(raw.rd), Arg::Reg(raw.rs), op2]);
            Assembly::new("", if sub { "sub" } else { "add" }, vec!["s"], args)
        }
        ThumbInstr::Immediate { op } => {
            let raw = thumb::OpRawImm::new(opcode);
            let args = Args::new(&[Arg::Reg(raw.rd), Arg::Val(raw.offset as u32)]);
            Assembly::new("", op.as_str(), suffix(op.writes_result(), "s"), args)
        }
        ThumbInstr::Alu { op } => {
            let raw = thumb::OpRawAluOp::new(opcode);
            let test = matches!(op, ThumbAluOp::TST | ThumbAluOp::CMP | ThumbAluOp::CMN);
            let args = Args::new(&[Arg::Reg(raw.rd), Arg::Reg(raw.rs)]);
            Assembly::new("", op.as_str(), suffix(!test, "s"), args)
        }
        ThumbInstr::HiReg { op } => {
            let raw = thumb::OpRawHiRegBx::new(opcode);
            let (rd, rs) = (Arg::Reg(raw.rd() as u8), Arg::Reg(raw.rs() as u8));
            let (mnemonic, args) = match op {
                HiRegOp::ADD => ("add", Args::new(&[rd, rs])),
                HiRegOp::CMP => ("cmp", Args::new(&[rd, rs])),
                HiRegOp::MOV => ("mov", Args::new(&[rd, rs])),
                HiRegOp::BX => ("bx", Args::new(&[rs])),
            };
            Assembly::new("", mnemonic, vec![], args)
        }
        ThumbInstr::LoadPcRelative => {
            let raw = thumb::OpRawLdrPc::new(opcode);
            let args = Args::new(&[Arg::Reg(raw.rd), address(15, Arg::Val(raw.nn as u32 * 4))]);
            Assembly::new("", "ldr", vec![], args)
        }
        ThumbInstr::TransferReg { load, byte } => {
            let raw = thumb::OpRawLdrStr::new(opcode);
            let args = Args::new(&[Arg::Reg(raw.rd), address(raw.rb, Arg::Reg(raw.ro))]);
            Assembly::new("", load_store(load), suffix(byte, "b"), args)
        }
        ThumbInstr::TransferRegHalf { load, kind } => {
            let raw = thumb::OpRawXHSbSh::new(opcode);
            let args = Args::new(&[Arg::Reg(raw.rd), address(raw.rb, Arg::Reg(raw.ro))]);
            Assembly::new("", load_store(load), half_mode(kind), args)
        }
        ThumbInstr::TransferImm { load, byte } => {
            let raw = thumb::OpRawXB::new(opcode);
            let offset = if byte { raw.offset as u32 } else { raw.offset as u32 * 4 };
            let args = Args::new(&[Arg::Reg(raw.rd), address(raw.rb, Arg::Val(offset))]);
            Assembly::new("", load_store(load), suffix(byte, "b"), args)
        }
        ThumbInstr::TransferHalfImm { load } => {
            let raw = thumb::OpRawXH::new(opcode);
            let offset = Arg::Val(raw.offset as u32 * 2);
            let args = Args::new(&[Arg::Reg(raw.rd), address(raw.rb, offset)]);
            Assembly::new("", load_store(load), vec!["h"], args)
        }
        ThumbInstr::TransferSp { load } => {
            let raw = thumb::OpRawXSp::new(opcode);
            let args = Args::new(&[Arg::Reg(raw.rd), address(13, Arg::Val(raw.nn as u32 * 4))]);
            Assembly::new("", load_store(load), vec![], args)
        }
        ThumbInstr::LoadAddress { sp } => {
            let raw = thumb::OpRawAddPcSp::new(opcode);
            let base = if sp { 13 } else { 15 };
            let args = Args::new(&[
                Arg::Reg(raw.rd),
                Arg::Reg(base),
                Arg::Val(raw.nn as u32 * 4),
            ]);
            Assembly::new("", "add", vec![], args)
        }
        ThumbInstr::AdjustSp { negative } => {
            let raw = thumb::OpRawAddSpNn::new(opcode);
            let mut offset = Arg::Val(raw.nn as u32 * 4);
            if negative {
                offset = Arg::Negative(Box::new(offset));
            }
            Assembly::new("", "add", vec![], Args::new(&[Arg::Reg(13), offset]))
        }
        ThumbInstr::PushPop { pop, extra } => {
            let raw = thumb::OpRawPushPop::new(opcode);
            let (mnemonic, extra_reg) = if pop { ("pop", 15) } else { ("push", 14) };
            let list = raw.rlist as u16 | (extra as u16) << extra_reg;
            Assembly::new("", mnemonic, vec![], Args::new(&[Arg::RegList(list, false)]))
        }
        ThumbInstr::TransferBlock { load } => {
            let raw = thumb::OpRawStmLdm::new(opcode);
            let args = Args::new(&[
                Arg::WriteBack(Box::new(Arg::Reg(raw.rb))),
                Arg::RegList(raw.rlist as u16, false),
            ]);
            Assembly::new("", if load { "ldm" } else { "stm" }, vec!["ia"], args)
        }
        ThumbInstr::CondBranch { cond } => {
            let raw = thumb::OpRawBranchCond::new(opcode);
            let target = branch_base.wrapping_add(raw.offset() as u32);
            Assembly::new("", "b", vec![], Args::new(&[Arg::Offset(target)])).with_cond(cond)
        }
        ThumbInstr::SoftwareInterrupt => {
            let raw = thumb::OpRawSwi::new(opcode);
            Assembly::new("", "swi", vec![], Args::new(&[Arg::Val(raw.comment as u32)]))
        }
        ThumbInstr::Branch => {
            let raw = thumb::OpRawBranch::new(opcode);
            let target = branch_base.wrapping_add(raw.offset() as u32);
            Assembly::new("", "b", vec![], Args::new(&[Arg::Offset(target)]))
        }
        ThumbInstr::LongBranch { high: false } => {
            let raw = thumb::OpRawBranchLink::new(opcode);
            let lr = branch_base.wrapping_add(raw.offset_high() as u32);
            Assembly::new("", "bl", vec![".hi"], Args::new(&[Arg::Offset(lr)]))
        }
        ThumbInstr::LongBranch { high: true } => {
            let raw = thumb::OpRawBranchLink::new(opcode);
            let args = Args::new(&[Arg::Reg(14), Arg::Val(raw.offset_low())]);
            Assembly::new("", "bl", vec![".lo"], args)
        }
        ThumbInstr::Undefined => Assembly::new("", "undefined", vec![], Args::new(&[])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_asm() {
        let pc = 0x12345678;
        #[rustfmt::skip]
        let cases = [
            // Cond
            (0b0000_0001001011111111111100_0_1_0011,      "bxeq r3 ", "BX"),
            (0b0001_0001001011111111111100_0_1_0011,      "bxne r3 ", "BX"),
            (0b0010_0001001011111111111100_0_1_0011,      "bxcs r3 ", "BX"),
            (0b0011_0001001011111111111100_0_1_0011,      "bxcc r3 ", "BX"),
            (0b0100_0001001011111111111100_0_1_0011,      "bxmi r3 ", "BX"),
            (0b0101_0001001011111111111100_0_1_0011,      "bxpl r3 ", "BX"),
            (0b0110_0001001011111111111100_0_1_0011,      "bxvs r3 ", "BX"),
            (0b0111_0001001011111111111100_0_1_0011,      "bxvc r3 ", "BX"),
            (0b1000_0001001011111111111100_0_1_0011,      "bxhi r3 ", "BX"),
            (0b1001_0001001011111111111100_0_1_0011,      "bxls r3 ", "BX"),
            (0b1010_0001001011111111111100_0_1_0011,      "bxge r3 ", "BX"),
            (0b1011_0001001011111111111100_0_1_0011,      "bxlt r3 ", "BX"),
            (0b1100_0001001011111111111100_0_1_0011,      "bxgt r3 ", "BX"),
            (0b1101_0001001011111111111100_0_1_0011,      "bxle r3 ", "BX"),
            (0b1110_0001001011111111111100_0_1_0011,      "bx r3   ", "BX"),
            //          L Offset
            (0b1110_101_0_000000000100011000101000,       "b 0x12356f20 ", "B, BL"),
            (0b1110_101_1_100000000001000000101100,       "bl 0x10349730", "B, BL"),
            //           Ignored
            (0b1110_1111_101010101010101010101010,        "swi 0xaaaaaa", "SWI"),
            //             A S Rd   Rn   Rs        Rm
            (0b1110_000000_0_0_0011_0100_0101_1001_0110,  "mul r3, r6, r5     ", "Multiply"),
            (0b1110_000000_0_1_0011_0100_0101_1001_0110,  "muls r3, r6, r5    ", "Multiply"),
            (0b1110_000000_1_0_0011_0100_0101_1001_0110,  "mla r3, r6, r5, r4 ", "Multiply"),
            (0b1110_000000_1_1_0011_0100_0101_1001_0110,  "mlas r3, r6, r5, r4", "Multiply"),
            //            U A S RdHi RdLo Rs        Rm
            (0b1110_00001_0_0_0_0011_0100_0101_1001_0110, "umull r4, r3, r6, r5 ", "MulLong"),
            (0b1110_00001_0_0_1_0011_0100_0101_1001_0110, "umulls r4, r3, r6, r5", "MulLong"),
            (0b1110_00001_0_1_0_0011_0100_0101_1001_0110, "umlal r4, r3, r6, r5 ", "MulLong"),
            (0b1110_00001_0_1_1_0011_0100_0101_1001_0110, "umlals r4, r3, r6, r5", "MulLong"),
            (0b1110_00001_1_0_0_0011_0100_0101_1001_0110, "smull r4, r3, r6, r5 ", "MulLong"),
            (0b1110_00001_1_0_1_0011_0100_0101_1001_0110, "smulls r4, r3, r6, r5", "MulLong"),
            (0b1110_00001_1_1_0_0011_0100_0101_1001_0110, "smlal r4, r3, r6, r5 ", "MulLong"),
            (0b1110_00001_1_1_1_0011_0100_0101_1001_0110, "smlals r4, r3, r6, r5", "MulLong"),
            //            P L   Fiel Rd            Rm
            (0b1110_00010_0_0_0_1111_0011_00000000_0100,  "mrs r3, cpsr   ", "PSR Reg"),
            (0b1110_00010_1_0_0_1111_0011_00000000_0100,  "mrs r3, spsr   ", "PSR Reg"),
            (0b1110_00010_0_1_0_1010_1111_00000000_0011,  "msr cpsr_fx, r3", "PSR Reg"),
            (0b1110_00010_1_1_0_0101_1111_00000000_0100,  "msr spsr_sc, r4", "PSR Reg"),
            //            P    Fiel      Shif Imm
            (0b1110_00110_0_10_0001_1111_0000_00000000,   "msr cpsr_c, 0            ", "PSR Imm"),
            (0b1110_00110_0_10_0010_1111_0001_00000001,   "msr cpsr_x, 0x40000000   ", "PSR Imm"),
            (0b1110_00110_0_10_1111_1111_0001_01000001,   "msr cpsr_fsxc, 0x40000010", "PSR Imm"),
            (0b1110_00110_1_10_0100_1111_0011_00000010,   "msr spsr_s, 0x8000000    ", "PSR Imm"),
            (0b1110_00110_1_10_1000_1111_0010_00000110,   "msr spsr_f, 0x60000000   ", "PSR Imm"),
            (0b1110_00110_1_10_0110_1111_0101_01010010,   "msr spsr_sx, 0x14800000  ", "PSR Imm"),
            (0b1110_00110_1_10_0101_1111_1010_11000010,   "msr spsr_sc, 0xc2000     ", "PSR Imm"),
            //          Op   S Rn   Rd   Shift St   Rm
            (0b1110_000_0000_0_0011_0100_00000_00_0_0101,  "and r4, r3, r5         ", "DataProc shift imm"),
            (0b1110_000_0001_1_0011_0100_00000_01_0_0101,  "eors r4, r3, r5, lsr 32", "DataProc shift imm"),
            (0b1110_000_0010_0_0011_0100_00000_10_0_0101,  "sub r4, r3, r5, asr 32 ", "DataProc shift imm"),
            (0b1110_000_0011_1_0011_0100_00000_11_0_0101,  "rsbs r4, r3, r5, rrx   ", "DataProc shift imm"),
            (0b1110_000_0100_0_0011_0100_00001_00_0_0101,  "add r4, r3, r5, lsl 1  ", "DataProc shift imm"),
            (0b1110_000_0101_1_0011_0100_00010_01_0_0101,  "adcs r4, r3, r5, lsr 2 ", "DataProc shift imm"),
            (0b1110_000_0110_0_0011_0100_00011_10_0_0101,  "sbc r4, r3, r5, asr 3  ", "DataProc shift imm"),
            (0b1110_000_0111_0_0011_0100_10100_11_0_0101,  "rsc r4, r3, r5, ror 20 ", "DataProc shift imm"),
            (0b1110_000_1000_1_0011_0000_00101_00_0_0101,  "tst r3, r5, lsl 5      ", "DataProc shift imm"),
            (0b1110_000_1001_1_0011_1111_00110_01_0_0101,  "teqp r3, r5, lsr 6     ", "DataProc shift imm"),
            (0b1110_000_1010_1_0011_0000_10111_10_0_0101,  "cmp r3, r5, asr 23     ", "DataProc shift imm"),
            (0b1110_000_1011_1_0011_1111_01000_11_0_0101,  "cmnp r3, r5, ror 8     ", "DataProc shift imm"),
            (0b1110_000_1100_0_0011_0100_01001_00_0_0101,  "orr r4, r3, r5, lsl 9  ", "DataProc shift imm"),
            (0b1110_000_1101_1_0000_0100_11010_01_0_0101,  "movs r4, r5, lsr 26    ", "DataProc shift imm"),
            (0b1110_000_1110_0_0011_0100_01101_10_0_0101,  "bic r4, r3, r5, asr 13 ", "DataProc shift imm"),
            (0b1110_000_1111_1_0000_0100_11101_11_0_0101,  "mvns r4, r5, ror 29    ", "DataProc shift imm"),
            //          Op   S Rn   Rd   Rs     St   Rm
            (0b1110_000_0000_0_0011_0100_0000_0_00_1_0101, "and r4, r3, r5, lsl r0 ", "DataProc shift reg"),
            (0b1110_000_0001_1_0011_0100_0000_0_01_1_0101, "eors r4, r3, r5, lsr r0", "DataProc shift reg"),
            (0b1110_000_0010_0_0011_0100_0000_0_10_1_0101, "sub r4, r3, r5, asr r0 ", "DataProc shift reg"),
            (0b1110_000_0011_1_0011_0100_0000_0_11_1_0101, "rsbs r4, r3, r5, ror r0", "DataProc shift reg"),
            (0b1110_000_0100_0_0011_0100_0000_0_00_1_0101, "add r4, r3, r5, lsl r0 ", "DataProc shift reg"),
            (0b1110_000_0101_1_0011_0100_0001_0_01_1_0101, "adcs r4, r3, r5, lsr r1", "DataProc shift reg"),
            (0b1110_000_0110_0_0011_0100_0001_0_10_1_0101, "sbc r4, r3, r5, asr r1 ", "DataProc shift reg"),
            (0b1110_000_0111_0_0011_0100_1010_0_11_1_0101, "rsc r4, r3, r5, ror r10", "DataProc shift reg"),
            //          Op   S Rn   Rd   Shift Imm
            (0b1110_001_0000_0_0011_0100_0000_00000001,   "and r4, r3, 1          ", "DataProc imm"),
            (0b1110_001_0001_1_0011_0100_0001_00000101,   "eors r4, r3, 0x40000001", "DataProc imm"),
            (0b1110_001_0010_0_0011_0100_0010_00000111,   "sub r4, r3, 0x70000000 ", "DataProc imm"),
            (0b1110_001_0011_1_0011_0100_0011_00010101,   "rsbs r4, r3, 0x54000000", "DataProc imm"),
            (0b1110_001_0100_0_0011_0100_0100_00110101,   "add r4, r3, 0x35000000 ", "DataProc imm"),
            (0b1110_001_0101_1_0011_0100_0101_00111111,   "adcs r4, r3, 0xfc00000 ", "DataProc imm"),
            (0b1110_001_0110_0_0011_0100_0111_11000000,   "sbc r4, r3, 0x3000000  ", "DataProc imm"),
            (0b1110_001_0111_0_0011_0100_1010_11110101,   "rsc r4, r3, 0xf5000    ", "DataProc imm"),
            //          P U B W L Rn   Rd   Offset
            (0b1110_010_0_0_0_0_0_0100_0101_000000000011,  "str r5, [r4], -3     ", "Trans imm"),
            (0b1110_010_0_1_0_1_0_0100_0101_000000000111,  "strt r5, [r4], 7     ", "Trans imm"),
            (0b1110_010_1_1_0_0_0_0100_0101_000000011001,  "str r5, [r4, 25]     ", "Trans imm"),
            (0b1110_010_1_1_1_1_0_0100_0101_000011000010,  "strb r5, [r4, 0xc2]! ", "Trans imm"),
            (0b1110_010_1_1_0_1_1_0100_0101_001010010100,  "ldr r5, [r4, 0x294]! ", "Trans imm"),
            (0b1110_010_0_1_1_1_1_0100_0101_000011011011,  "ldrbt r5, [r4], 0xdb ", "Trans imm"),
            (0b1110_010_1_0_0_0_1_0100_0101_100000000000,  "ldr r5, [r4, -0x800] ", "Trans imm"),
            (0b1110_010_0_0_1_0_1_0100_0101_100111001001,  "ldrb r5, [r4], -0x9c9", "Trans imm"),
            //          P U B W L Rn   Rd   Shift St   Rm
            (0b1110_011_0_0_0_0_0_0100_0101_00000_00_0_0110, "str r5, [r4], -r6         ", "Trans reg"),
            (0b1110_011_0_1_0_1_0_0100_0101_00001_01_0_0110, "strt r5, [r4], r6, lsr 1  ", "Trans reg"),
            (0b1110_011_1_1_0_0_0_0100_0101_00010_10_0_0110, "str r5, [r4, r6, asr 2]   ", "Trans reg"),
            (0b1110_011_1_1_1_1_0_0100_0101_00110_11_0_0110, "strb r5, [r4, r6, ror 6]! ", "Trans reg"),
            (0b1110_011_1_1_0_1_1_0100_0101_01001_00_0_0110, "ldr r5, [r4, r6, lsl 9]!  ", "Trans reg"),
            (0b1110_011_0_1_1_1_1_0100_0101_10100_01_0_0110, "ldrbt r5, [r4], r6, lsr 20", "Trans reg"),
            (0b1110_011_1_0_0_0_1_0100_0101_01010_10_0_0110, "ldr r5, [r4, -r6, asr 10] ", "Trans reg"),
            (0b1110_011_0_0_1_0_1_0100_0101_00100_11_0_0110, "ldrb r5, [r4], -r6, ror 4 ", "Trans reg"),
            //          P U   W L Rn   Rd   OffH   S H   OffL
            (0b1110_000_0_0_1_0_0_0100_0101_0000_1_0_1_1_0000, "strh r5, [r4], -0   ", "Trans half imm"),
            (0b1110_000_0_1_1_0_0_0100_0101_0000_1_0_1_1_0011, "strh r5, [r4], 3    ", "Trans half imm"),
            (0b1110_000_1_0_1_0_0_0100_0101_0001_1_0_1_1_0011, "strh r5, [r4, -19]  ", "Trans half imm"),
            (0b1110_000_1_1_1_0_0_0100_0101_0010_1_0_1_1_0111, "strh r5, [r4, 39]   ", "Trans half imm"),
            (0b1110_000_0_0_1_0_1_0100_0101_0100_1_0_1_1_1000, "ldrh r5, [r4], -0x48", "Trans half imm"),
            (0b1110_000_0_1_1_0_1_0100_0101_0010_1_1_0_1_0111, "ldrsb r5, [r4], 39  ", "Trans half imm"),
            (0b1110_000_1_0_1_0_1_0100_0101_0000_1_1_1_1_0011, "ldrsh r5, [r4, -3]  ", "Trans half imm"),
            (0b1110_000_1_1_1_0_1_0100_0101_1100_1_0_1_1_1100, "ldrh r5, [r4, 0xcc] ", "Trans half imm"),
            //          P U   W L Rn   Rd         S H   Rm
            (0b1110_000_0_0_0_0_0_0100_0101_00001_0_1_1_0110,  "strh r5, [r4], -r6 ", "Trans half reg"),
            (0b1110_000_0_1_0_0_0_0100_0101_00001_0_1_1_0110,  "strh r5, [r4], r6  ", "Trans half reg"),
            (0b1110_000_1_0_0_0_0_0100_0101_00001_0_1_1_0110,  "strh r5, [r4, -r6] ", "Trans half reg"),
            (0b1110_000_1_1_0_1_0_0100_0101_00001_0_1_1_0110,  "strh r5, [r4, r6]! ", "Trans half reg"),
            (0b1110_000_0_0_0_0_1_0100_0101_00001_0_1_1_0110,  "ldrh r5, [r4], -r6 ", "Trans half reg"),
            (0b1110_000_0_1_0_0_1_0100_0101_00001_1_0_1_0110,  "ldrsb r5, [r4], r6 ", "Trans half reg"),
            (0b1110_000_1_0_0_0_1_0100_0101_00001_1_1_1_0110,  "ldrsh r5, [r4, -r6]", "Trans half reg"),
            (0b1110_000_1_1_0_1_1_0100_0101_00001_0_1_1_0110,  "ldrh r5, [r4, r6]! ", "Trans half reg"),
            //          Xxx                    Yyy
            (0b1110_011_00000000000000000000_1_0000,       "undefined 0, 0", "Undefined"),
            //            B    Rn   Rd            Rm
            (0b1110_00010_0_00_0011_0100_00001001_0101,    "swp r4, r5, [r3] ", "Swap"),
            (0b1110_00010_1_00_0011_0100_00001001_0101,    "swpb r4, r5, [r3]", "Swap"),
            //          P U S W L Rn   RegisterList
            (0b1110_100_0_0_0_0_0_0100_0000000000000001,  "stmda r4, {r0}                        ", "Block"),
            (0b1110_100_0_0_0_1_0_0100_0000000000000011,  "stmda r4!, {r0, r1}                   ", "Block"),
            (0b1110_100_0_0_1_0_0_0100_0000000000000101,  "stmda r4, {r0, r2} ^                  ", "Block"),
            (0b1110_100_0_0_1_1_0_0100_0000000000010110,  "stmda r4!, {r1, r2, r4} ^             ", "Block"),
            (0b1110_100_0_1_0_0_0_0100_0000000011011001,  "stm r4, {r0, r3, r4, r6, r7}          ", "Block"),
            (0b1110_100_0_1_0_1_0_0100_0001000100000101,  "stm r4!, {r0, r2, r8, r12}            ", "Block"),
            (0b1110_100_0_1_1_0_0_0100_0100010001000000,  "stm r4, {r6, r10, r14} ^              ", "Block"),
            (0b1110_100_0_1_1_1_0_0100_0001001001001010,  "stm r4!, {r1, r3, r6, r9, r12} ^      ", "Block"),
            (0b1110_100_1_0_0_0_0_0100_0100000011000010,  "stmdb r4, {r1, r6, r7, r14}           ", "Block"),
            (0b1110_100_1_0_0_1_0_0100_0001010010000010,  "stmdb r4!, {r1, r7, r10, r12}         ", "Block"),
            (0b1110_100_1_0_1_0_0_0100_0101001100001000,  "stmdb r4, {r3, r8, r9, r12, r14} ^    ", "Block"),
            (0b1110_100_1_0_1_1_0_0100_0000000100000000,  "stmdb r4!, {r8} ^                     ", "Block"),
            (0b1110_100_1_1_0_0_0_0100_0000010101010010,  "stmib r4, {r1, r4, r6, r8, r10}       ", "Block"),
            (0b1110_100_1_1_0_1_0_0100_0000001100001000,  "stmib r4!, {r3, r8, r9}               ", "Block"),
            (0b1110_100_1_1_1_0_0_0100_0000000000000010,  "stmib r4, {r1} ^                      ", "Block"),
            (0b1110_100_1_1_1_1_0_0100_0001010100110000,  "stmib r4!, {r4, r5, r8, r10, r12} ^   ", "Block"),
            (0b1110_100_0_0_0_0_1_0100_0000100101010000,  "ldmda r4, {r4, r6, r8, r11}           ", "Block"),
            (0b1110_100_0_0_0_1_1_0100_0001000010100000,  "ldmda r4!, {r5, r7, r12}              ", "Block"),
            (0b1110_100_0_0_1_0_1_0100_0100000110111000,  "ldmda r4, {r3, r4, r5, r7, r8, r14} ^ ", "Block"),
            (0b1110_100_0_0_1_1_1_0100_0001010001000010,  "ldmda r4!, {r1, r6, r10, r12} ^       ", "Block"),
            (0b1110_100_0_1_0_0_1_0100_0000000101010000,  "ldm r4, {r4, r6, r8}                  ", "Block"),
            (0b1110_100_0_1_0_1_1_0100_0001010000101011,  "ldm r4!, {r0, r1, r3, r5, r10, r12}   ", "Block"),
            (0b1110_100_0_1_1_0_1_0100_1111111111111111,
                "ldm r4, {r0, r1, r2, r3, r4, r5, r6, r7, r8, r9, r10, r11, r12, r13, r14, r15} ^", "Block"),
            (0b1110_100_0_1_1_1_1_0100_0001000100010000,  "ldm r4!, {r4, r8, r12} ^              ", "Block"),
            // Coprocessor and ARMv5
            (0xee01_0f10,                                 "mcr p15      ", "Coprocessor"),
            (0xee11_0f10,                                 "mrc p15      ", "Coprocessor"),
            (0xee01_0e00,                                 "cdp p14      ", "Coprocessor"),
            (0xed90_1200,                                 "ldc p2       ", "Coprocessor"),
            (0xe12f_ff33,                                 "undefined 0x12fff33", "BLX (ARMv5)"),
        ];
        for (opcode, expected, desc) in cases.iter() {
            let asm = disassemble_arm(*opcode, pc);
            assert_eq!(asm.to_string(), expected.trim_end(), "{:08x} {}", opcode, desc);
        }
    }

    #[test]
    fn thumb_asm() {
        let pc = 0x12345678;
        #[rustfmt::skip]
        let cases = [
            //     Op Off   Rs  Rd
            (0b000_00_00001_001_010, "lsls r2, r1, 1 ", "Shifted"),
            (0b000_00_00000_001_010, "movs r2, r1    ", "Shifted"),
            (0b000_01_00110_001_010, "lsrs r2, r1, 6 ", "Shifted"),
            (0b000_01_00000_001_010, "lsrs r2, r1, 32", "Shifted"),
            (0b000_10_11001_001_010, "asrs r2, r1, 25", "Shifted"),
            (0b000_10_00000_001_010, "asrs r2, r1, 32", "Shifted"),
            //       I O Rn  Rs  Rd
            (0b00011_0_0_011_001_010, "adds r2, r1, r3", "ADD/SUB"),
            (0b00011_0_1_011_001_010, "subs r2, r1, r3", "ADD/SUB"),
            (0b00011_1_0_001_001_010, "adds r2, r1, 1 ", "ADD/SUB"),
            (0b00011_1_1_110_001_010, "subs r2, r1, 6 ", "ADD/SUB"),
            (0b00011_1_0_000_001_010, "adds r2, r1, 0 ", "ADD/SUB"),
            (0b00011_1_1_000_001_010, "subs r2, r1, 0 ", "ADD/SUB"),
            (0b00011_1_0_101_010_010, "adds r2, r2, 5 ", "ADD/SUB"),
            (0b00011_1_1_101_010_010, "subs r2, r2, 5 ", "ADD/SUB"),
            //     Op Rd  Offset
            (0b001_00_010_00000011, "movs r2, 3   ", "Immediate"),
            (0b001_01_010_00010100, "cmp r2, 20   ", "Immediate"),
            (0b001_10_010_10001000, "adds r2, 0x88", "Immediate"),
            (0b001_11_010_10010110, "subs r2, 0x96", "Immediate"),
            (0x4248, "negs r0, r1        ", "ALU"),
            (0x4208, "tst r0, r1         ", "ALU"),
            (0x4348, "muls r0, r1        ", "ALU"),
            (0x41c8, "rors r0, r1        ", "ALU"),
            (0x4770, "bx r14             ", "Hi register"),
            (0x46c0, "mov r8, r8         ", "Hi register"),
            (0x4478, "add r0, r15        ", "Hi register"),
            (0x4580, "cmp r8, r0         ", "Hi register"),
            (0x4801, "ldr r0, [r15, 4]   ", "PC relative"),
            (0x5c08, "ldrb r0, [r1, r0]  ", "Register offset"),
            (0x5308, "strh r0, [r1, r4]  ", "Register offset"),
            (0x5e08, "ldrsh r0, [r1, r0] ", "Register offset"),
            (0x5608, "ldrsb r0, [r1, r0] ", "Register offset"),
            (0x6048, "str r0, [r1, 4]    ", "Immediate offset"),
            (0x7848, "ldrb r0, [r1, 1]   ", "Immediate offset"),
            (0x8848, "ldrh r0, [r1, 2]   ", "Immediate offset"),
            (0x9001, "str r0, [r13, 4]   ", "SP relative"),
            (0xa001, "add r0, r15, 4     ", "Load address"),
            (0xa902, "add r1, r13, 8     ", "Load address"),
            (0xb081, "add r13, -4        ", "SP adjust"),
            (0xb002, "add r13, 8         ", "SP adjust"),
            (0xb500, "push {r14}         ", "PUSH/POP"),
            (0xbd0c, "pop {r2, r3, r15}  ", "PUSH/POP"),
            (0xc803, "ldmia r0!, {r0, r1}", "LDM/STM"),
            (0xd0fe, "beq 0x12345678     ", "Conditional branch"),
            (0xdcfe, "bgt 0x12345678     ", "Conditional branch"),
            (0xdf05, "swi 5              ", "SWI"),
            (0xe7fe, "b 0x12345678       ", "Branch"),
            (0xf7ff, "bl.hi 0x1234467c   ", "BL first half"),
            (0xfffe, "bl.lo r14, 0xffc   ", "BL second half"),
            (0xbe00, "undefined          ", "BKPT (ARMv5)"),
        ];
        for (opcode, expected, desc) in cases.iter() {
            let asm = disassemble_thumb(*opcode, pc);
            assert_eq!(asm.to_string(), expected.trim_end(), "{:04x} {}", opcode, desc);
        }
    }

    #[test]
    fn arm_condition_is_kept() {
        let asm = disassemble_arm(0x03a0_1001, 0);
        assert_eq!(asm.cond(), Cond::EQ);
        assert_eq!(asm.to_string(), "moveq r1, 1");
        assert_eq!(asm.args(), &Args::new(&[Arg::Reg(1), Arg::Val(1)]));
    }
}
