use super::alu;
use super::exec_arm::{
    load_half, load_signed_byte, load_signed_half, load_word, multiplier_cycles, SWI_VECTOR,
};
use super::op::{AluOp, HalfKind, HiRegOp, Indexing, ShiftType, ThumbAluOp, ThumbInstr};
use super::op_raw_thumb::*;
use super::registers::{ExceptionMode, Psr};
use super::Cpu;
use crate::bus::Bus;

const PUSH: Indexing = Indexing { pre: true, up: false, writeback: true };
const POP: Indexing = Indexing { pre: false, up: true, writeback: true };

// Word-aligned PC as seen by PC-relative loads and ADD Rd, PC.
fn aligned_pc(pc: u32) -> u32 {
    pc.wrapping_add(4) & !3
}

impl Cpu {
    pub(super) fn execute_thumb(&mut self, bus: &mut impl Bus, instr: ThumbInstr) {
        self.delay = 0;
        match instr {
            ThumbInstr::MoveShifted { kind } => {
                let raw = OpRawShifted::new(self.opcode as u16);
                let carry = self.regs.cpsr().c();
                let value = self.regs.read(raw.rs as usize);
                let (value, carry) = alu::shift_immediate(kind, value, raw.offset as u32, carry);
                self.regs.set_nz(value);
                self.regs.set_cpsr_bit(Psr::C, carry);
                self.regs.write(raw.rd as usize, value);
            }
            ThumbInstr::AddSub { sub, immediate } => {
                let raw = OpRawAddSub::new(self.opcode as u16);
                let op2 = if immediate {
                    raw.rn as u32
                } else {
                    self.regs.read(raw.rn as usize)
                };
                let op = if sub { AluOp::SUB } else { AluOp::ADD };
                self.alu_op(op, raw.rd as usize, self.regs.read(raw.rs as usize), op2);
            }
            ThumbInstr::Immediate { op } => {
                let raw = OpRawImm::new(self.opcode as u16);
                let rd = raw.rd as usize;
                self.alu_op(op, rd, self.regs.read(rd), raw.offset as u32);
            }
            ThumbInstr::Alu { op } => self.thumb_alu(op),
            ThumbInstr::HiReg { op } => self.hi_reg(op),
            ThumbInstr::LoadPcRelative => {
                let raw = OpRawLdrPc::new(self.opcode as u16);
                let addr = aligned_pc(self.regs.pc()).wrapping_add(raw.nn as u32 * 4);
                let value = bus.read32(addr);
                self.load_into(raw.rd as usize, value);
            }
            ThumbInstr::TransferReg { load, byte } => {
                let raw = OpRawLdrStr::new(self.opcode as u16);
                let addr = self.register_offset(raw.rb, raw.ro);
                self.transfer_word(bus, raw.rd as usize, addr, load, byte);
            }
            ThumbInstr::TransferRegHalf { load, kind } => {
                let raw = OpRawXHSbSh::new(self.opcode as u16);
                let addr = self.register_offset(raw.rb, raw.ro);
                self.transfer_half_thumb(bus, raw.rd as usize, addr, load, kind);
            }
            ThumbInstr::TransferImm { load, byte } => {
                let raw = OpRawXB::new(self.opcode as u16);
                let offset = if byte { raw.offset as u32 } else { raw.offset as u32 * 4 };
                let addr = self.regs.read(raw.rb as usize).wrapping_add(offset);
                self.transfer_word(bus, raw.rd as usize, addr, load, byte);
            }
            ThumbInstr::TransferHalfImm { load } => {
                let raw = OpRawXH::new(self.opcode as u16);
                let addr = self.regs.read(raw.rb as usize).wrapping_add(raw.offset as u32 * 2);
                self.transfer_half_thumb(bus, raw.rd as usize, addr, load, HalfKind::Half);
            }
            ThumbInstr::TransferSp { load } => {
                let raw = OpRawXSp::new(self.opcode as u16);
                let addr = self.regs.read(13).wrapping_add(raw.nn as u32 * 4);
                self.transfer_word(bus, raw.rd as usize, addr, load, false);
            }
            ThumbInstr::LoadAddress { sp } => {
                let raw = OpRawAddPcSp::new(self.opcode as u16);
                let base = if sp {
                    self.regs.read(13)
                } else {
                    aligned_pc(self.regs.pc())
                };
                self.regs.write(raw.rd as usize, base.wrapping_add(raw.nn as u32 * 4));
            }
            ThumbInstr::AdjustSp { negative } => {
                let raw = OpRawAddSpNn::new(self.opcode as u16);
                let offset = raw.nn as u32 * 4;
                let sp = self.regs.read(13);
                let sp = if negative {
                    sp.wrapping_sub(offset)
                } else {
                    sp.wrapping_add(offset)
                };
                self.regs.write(13, sp);
            }
            ThumbInstr::PushPop { pop, extra } => {
                let raw = OpRawPushPop::new(self.opcode as u16);
                let mut list = raw.rlist as u16;
                self.delay = if pop {
                    list |= (extra as u16) << 15;
                    self.transfer_block(bus, 13, list, true, POP, false)
                } else {
                    list |= (extra as u16) << 14;
                    self.transfer_block(bus, 13, list, false, PUSH, false)
                };
            }
            ThumbInstr::TransferBlock { load } => {
                let raw = OpRawStmLdm::new(self.opcode as u16);
                self.delay =
                    self.transfer_block(bus, raw.rb as usize, raw.rlist as u16, load, POP, false);
            }
            ThumbInstr::CondBranch { cond } => {
                if cond.evaluate(self.regs.cpsr()) {
                    let raw = OpRawBranchCond::new(self.opcode as u16);
                    let target = self.operand(15).wrapping_add(raw.offset() as u32);
                    self.jump(target);
                    self.delay = 2;
                }
            }
            ThumbInstr::SoftwareInterrupt => {
                let ret = self.regs.pc().wrapping_add(2);
                self.enter_exception(ExceptionMode::Supervisor, SWI_VECTOR, ret);
                self.delay = 2;
            }
            ThumbInstr::Branch => {
                let raw = OpRawBranch::new(self.opcode as u16);
                let target = self.operand(15).wrapping_add(raw.offset() as u32);
                self.jump(target);
                self.delay = 2;
            }
            ThumbInstr::LongBranch { high: false } => {
                let raw = OpRawBranchLink::new(self.opcode as u16);
                let lr = self.operand(15).wrapping_add(raw.offset_high() as u32);
                self.regs.write(14, lr);
            }
            ThumbInstr::LongBranch { high: true } => {
                let raw = OpRawBranchLink::new(self.opcode as u16);
                let target = self.regs.read(14).wrapping_add(raw.offset_low());
                self.regs.write(14, self.regs.pc().wrapping_add(2) | 1);
                self.jump(target);
                self.delay = 3;
            }
            ThumbInstr::Undefined => self.unimplemented(),
        }
    }

    // Flag-setting ALU op on low registers.
    fn alu_op(&mut self, op: AluOp, rd: usize, rn: u32, op2: u32) {
        let carry = self.regs.cpsr().c();
        let out = alu::execute(op, rn, op2, carry, carry);
        self.set_flags(out);
        if op.writes_result() {
            self.regs.write(rd, out.value);
        }
    }

    fn thumb_alu(&mut self, op: ThumbAluOp) {
        let raw = OpRawAluOp::new(self.opcode as u16);
        let rd = raw.rd as usize;
        let (dst, src) = (self.regs.read(rd), self.regs.read(raw.rs as usize));
        let shift = match op {
            ThumbAluOp::LSL => Some(ShiftType::LSL),
            ThumbAluOp::LSR => Some(ShiftType::LSR),
            ThumbAluOp::ASR => Some(ShiftType::ASR),
            ThumbAluOp::ROR => Some(ShiftType::ROR),
            _ => None,
        };
        if let Some(kind) = shift {
            let (value, carry) = alu::shift_register(kind, dst, src & 0xff, self.regs.cpsr().c());
            self.regs.set_nz(value);
            self.regs.set_cpsr_bit(Psr::C, carry);
            self.regs.write(rd, value);
            self.delay = 1;
            return;
        }
        match op {
            ThumbAluOp::AND => self.alu_op(AluOp::AND, rd, dst, src),
            ThumbAluOp::EOR => self.alu_op(AluOp::EOR, rd, dst, src),
            ThumbAluOp::ADC => self.alu_op(AluOp::ADC, rd, dst, src),
            ThumbAluOp::SBC => self.alu_op(AluOp::SBC, rd, dst, src),
            ThumbAluOp::TST => self.alu_op(AluOp::TST, rd, dst, src),
            ThumbAluOp::NEG => self.alu_op(AluOp::RSB, rd, src, 0),
            ThumbAluOp::CMP => self.alu_op(AluOp::CMP, rd, dst, src),
            ThumbAluOp::CMN => self.alu_op(AluOp::CMN, rd, dst, src),
            ThumbAluOp::ORR => self.alu_op(AluOp::ORR, rd, dst, src),
            ThumbAluOp::BIC => self.alu_op(AluOp::BIC, rd, dst, src),
            ThumbAluOp::MVN => self.alu_op(AluOp::MVN, rd, dst, src),
            ThumbAluOp::MUL => {
                let value = dst.wrapping_mul(src);
                self.regs.set_nz(value);
                self.regs.set_cpsr_bit(Psr::C, false);
                self.regs.set_cpsr_bit(Psr::V, false);
                self.regs.write(rd, value);
                self.delay = multiplier_cycles(src, true);
            }
            ThumbAluOp::LSL | ThumbAluOp::LSR | ThumbAluOp::ASR | ThumbAluOp::ROR => {}
        }
    }

    // Only CMP sets flags. R15 reads as PC + 4 and writing it branches.
    fn hi_reg(&mut self, op: HiRegOp) {
        let raw = OpRawHiRegBx::new(self.opcode as u16);
        let (rd, rs) = (raw.rd(), raw.rs());
        let src = self.operand(rs);
        match op {
            HiRegOp::ADD => self.write_reg(rd, self.operand(rd).wrapping_add(src)),
            HiRegOp::CMP => {
                let carry = self.regs.cpsr().c();
                let out = alu::execute(AluOp::CMP, self.operand(rd), src, carry, carry);
                self.set_flags(out);
            }
            HiRegOp::MOV => self.write_reg(rd, src),
            HiRegOp::BX => {
                self.regs.set_cpsr_bit(Psr::T, src & 1 != 0);
                self.jump(src);
            }
        }
        if self.redirected {
            self.delay = 2;
        }
    }

    fn register_offset(&self, rb: u8, ro: u8) -> u32 {
        self.regs.read(rb as usize).wrapping_add(self.regs.read(ro as usize))
    }

    fn load_into(&mut self, rd: usize, value: u32) {
        self.regs.write(rd, value);
        self.delay = 3;
    }

    fn transfer_word(
        &mut self,
        bus: &mut impl Bus,
        rd: usize,
        addr: u32,
        load: bool,
        byte: bool,
    ) {
        match (load, byte) {
            (true, false) => self.load_into(rd, load_word(bus, addr)),
            (true, true) => self.load_into(rd, bus.read8(addr) as u32),
            (false, false) => {
                bus.write32(addr & !3, self.store_value(rd));
                self.delay = 2;
            }
            (false, true) => {
                bus.write8(addr, self.store_value(rd) as u8);
                self.delay = 2;
            }
        }
    }

    fn transfer_half_thumb(
        &mut self,
        bus: &mut impl Bus,
        rd: usize,
        addr: u32,
        load: bool,
        kind: HalfKind,
    ) {
        if !load {
            bus.write16(addr & !1, self.store_value(rd) as u16);
            self.delay = 2;
            return;
        }
        let value = match kind {
            HalfKind::Half => load_half(bus, addr),
            HalfKind::SignedByte => load_signed_byte(bus, addr),
            HalfKind::SignedHalf => load_signed_half(bus, addr),
        };
        self.load_into(rd, value);
    }
}
