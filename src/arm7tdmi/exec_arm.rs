use super::alu::{self, AluOutput};
use super::op::{AluOp, ArmInstr, HalfKind, Indexing, Offset, Operand2};
use super::op_raw_arm::*;
use super::registers::{ExceptionMode, Psr};
use super::Cpu;
use crate::bus::Bus;

pub(super) const SWI_VECTOR: u32 = 0x08;

/// Word load from a possibly unaligned address: the aligned word rotated so the addressed byte
/// lands in bits 0..7.
pub(super) fn load_word(bus: &mut impl Bus, addr: u32) -> u32 {
    bus.read32(addr & !3).rotate_right((addr & 3) * 8)
}

pub(super) fn load_half(bus: &mut impl Bus, addr: u32) -> u32 {
    (bus.read16(addr & !1) as u32).rotate_right((addr & 1) * 8)
}

pub(super) fn load_signed_byte(bus: &mut impl Bus, addr: u32) -> u32 {
    bus.read8(addr) as i8 as i32 as u32
}

// An odd address loads the sign extended byte instead.
pub(super) fn load_signed_half(bus: &mut impl Bus, addr: u32) -> u32 {
    if addr & 1 != 0 {
        load_signed_byte(bus, addr)
    } else {
        bus.read16(addr) as i16 as i32 as u32
    }
}

// Early termination of the multiplier: one cycle per significant byte of Rs.
pub(super) fn multiplier_cycles(rs: u32, signed: bool) -> u32 {
    (1..4)
        .find(|&m| {
            let upper = rs >> (8 * m);
            upper == 0 || (signed && upper == u32::MAX >> (8 * m))
        })
        .unwrap_or(4)
}

impl Cpu {
    pub(super) fn execute_arm(&mut self, bus: &mut impl Bus, instr: ArmInstr) {
        match instr {
            ArmInstr::DataProc { op, s, operand } => self.data_proc(op, s, operand),
            ArmInstr::Multiply { accumulate, s } => self.multiply(accumulate, s),
            ArmInstr::MultiplyLong { signed, accumulate, s } => {
                self.multiply_long(signed, accumulate, s)
            }
            ArmInstr::Swap { byte } => self.swap(bus, byte),
            ArmInstr::BranchExchange => {
                let raw = OpRawBranchExchange::new(self.opcode);
                let target = self.operand(raw.rn as usize);
                self.regs.set_cpsr_bit(Psr::T, target & 1 != 0);
                self.jump(target);
                self.delay = 2;
            }
            ArmInstr::Mrs { spsr } => {
                let raw = OpRawPsrReg::new(self.opcode);
                let psr = if spsr { self.regs.spsr() } else { self.regs.cpsr() };
                self.write_reg(raw.rd as usize, psr.0);
                self.delay = 1;
            }
            ArmInstr::Msr { spsr, immediate } => self.msr(spsr, immediate),
            ArmInstr::Transfer { load, byte, index, offset } => {
                self.transfer(bus, load, byte, index, offset)
            }
            ArmInstr::TransferHalf { load, kind, index, immediate } => {
                self.transfer_half(bus, load, kind, index, immediate)
            }
            ArmInstr::TransferBlock { load, user, index } => {
                let raw = OpRawBlockTrans::new(self.opcode);
                self.delay =
                    self.transfer_block(bus, raw.rn as usize, raw.register_list, load, index, user);
            }
            ArmInstr::Branch { link } => {
                let raw = OpRawBranchOff::new(self.opcode);
                let pc = self.regs.pc();
                if link {
                    self.regs.write(14, pc.wrapping_add(4));
                }
                self.jump(pc.wrapping_add(8).wrapping_add(raw.offset() as u32));
                self.delay = if link { 3 } else { 2 };
            }
            ArmInstr::SoftwareInterrupt => {
                let ret = self.regs.pc().wrapping_add(4);
                self.enter_exception(ExceptionMode::Supervisor, SWI_VECTOR, ret);
                self.delay = 2;
            }
            ArmInstr::Coprocessor | ArmInstr::Undefined => {
                self.unimplemented();
                self.delay = 0;
            }
        }
    }

    // Register operand of a register-shifted data processing op, where the extra cycle moves
    // R15 one more word ahead.
    fn operand_late(&self, index: usize) -> u32 {
        let value = self.operand(index);
        if index == 15 {
            value.wrapping_add(4)
        } else {
            value
        }
    }

    /// Stored value of R15: PC + 12 in ARM state, PC + 6 in Thumb state.
    pub(super) fn store_value(&self, index: usize) -> u32 {
        if index == 15 {
            self.operand(15).wrapping_add(if self.is_thumb() { 2 } else { 4 })
        } else {
            self.regs.read(index)
        }
    }

    /// N and Z from the result, C from the ALU, V only for arithmetic ops.
    pub(super) fn set_flags(&mut self, out: AluOutput) {
        self.regs.set_nz(out.value);
        self.regs.set_cpsr_bit(Psr::C, out.carry);
        if let Some(overflow) = out.overflow {
            self.regs.set_cpsr_bit(Psr::V, overflow);
        }
    }

    fn data_proc(&mut self, op: AluOp, s: bool, operand: Operand2) {
        let carry = self.regs.cpsr().c();
        let (rn, rd, (op2, shifter_carry)) = match operand {
            Operand2::Immediate => {
                let raw = OpRawDataProcC::new(self.opcode);
                self.delay = 0;
                (
                    self.operand(raw.rn as usize),
                    raw.rd as usize,
                    alu::rotate_immediate(raw.immediate as u32, raw.shift as u32, carry),
                )
            }
            Operand2::ShiftImm(kind) => {
                let raw = OpRawDataProcA::new(self.opcode);
                let rm = self.operand(raw.rm as usize);
                self.delay = 0;
                (
                    self.operand(raw.rn as usize),
                    raw.rd as usize,
                    alu::shift_immediate(kind, rm, raw.shift as u32, carry),
                )
            }
            Operand2::ShiftReg(kind) => {
                let raw = OpRawDataProcB::new(self.opcode);
                let amount = self.regs.read(raw.rs as usize) & 0xff;
                let rm = self.operand_late(raw.rm as usize);
                self.delay = 1;
                (
                    self.operand_late(raw.rn as usize),
                    raw.rd as usize,
                    alu::shift_register(kind, rm, amount, carry),
                )
            }
        };
        let out = alu::execute(op, rn, op2, shifter_carry, carry);
        if s && rd == 15 {
            self.restore_cpsr();
        } else if s {
            self.set_flags(out);
        }
        if op.writes_result() {
            self.write_reg(rd, out.value);
        }
    }

    fn multiply(&mut self, accumulate: bool, s: bool) {
        let raw = OpRawMultiply::new(self.opcode);
        let rs = self.regs.read(raw.rs as usize);
        let mut value = self.regs.read(raw.rm as usize).wrapping_mul(rs);
        if accumulate {
            value = value.wrapping_add(self.regs.read(raw.rn as usize));
        }
        self.write_reg(raw.rd as usize, value);
        if s {
            self.regs.set_nz(value);
            self.regs.set_cpsr_bit(Psr::C, false);
            self.regs.set_cpsr_bit(Psr::V, false);
        }
        self.delay = multiplier_cycles(rs, true) + accumulate as u32;
    }

    fn multiply_long(&mut self, signed: bool, accumulate: bool, s: bool) {
        let raw = OpRawMultiplyLong::new(self.opcode);
        let (rd_hi, rd_lo) = (raw.rd_hi as usize, raw.rd_lo as usize);
        let rs = self.regs.read(raw.rs as usize);
        let rm = self.regs.read(raw.rm as usize);
        let mut value = if signed {
            (rm as i32 as i64).wrapping_mul(rs as i32 as i64) as u64
        } else {
            (rm as u64) * (rs as u64)
        };
        if accumulate {
            let acc = ((self.regs.read(rd_hi) as u64) << 32) | self.regs.read(rd_lo) as u64;
            value = value.wrapping_add(acc);
        }
        self.write_reg(rd_lo, value as u32);
        self.write_reg(rd_hi, (value >> 32) as u32);
        if s {
            self.regs.set_cpsr_bit(Psr::N, value & (1 << 63) != 0);
            self.regs.set_cpsr_bit(Psr::Z, value == 0);
            self.regs.set_cpsr_bit(Psr::C, false);
            self.regs.set_cpsr_bit(Psr::V, false);
        }
        self.delay = multiplier_cycles(rs, signed) + accumulate as u32 + 1;
    }

    fn swap(&mut self, bus: &mut impl Bus, byte: bool) {
        let raw = OpRawSwap::new(self.opcode);
        let addr = self.regs.read(raw.rn as usize);
        let source = self.regs.read(raw.rm as usize);
        let old = if byte {
            let old = bus.read8(addr) as u32;
            bus.write8(addr, source as u8);
            old
        } else {
            let old = load_word(bus, addr);
            bus.write32(addr & !3, source);
            old
        };
        self.write_reg(raw.rd as usize, old);
        self.delay = 3;
    }

    fn msr(&mut self, spsr: bool, immediate: bool) {
        let privileged = self.regs.mode().is_privileged();
        let (value, mut mask, control) = if immediate {
            let raw = OpRawPsrImm::new(self.opcode);
            (raw.value(), raw.mask(privileged), raw.field & 1 != 0)
        } else {
            let raw = OpRawPsrReg::new(self.opcode);
            (self.regs.read(raw.rm as usize), raw.mask(privileged), raw.field & 1 != 0)
        };
        if spsr {
            if control && privileged {
                mask |= Psr::T;
            }
            let old = self.regs.spsr();
            self.regs.set_spsr(Psr((old.0 & !mask) | (value & mask)));
        } else {
            let old = self.regs.cpsr();
            self.write_cpsr(Psr((old.0 & !mask) | (value & mask)));
        }
        self.delay = 1;
    }

    // Offset addressing shared by the word/byte and halfword transfers. Returns the transfer
    // address and the address written back to the base, if any.
    fn address(&self, rn: usize, offset: u32, index: Indexing) -> (u32, Option<u32>) {
        let base = self.operand(rn);
        let moved = if index.up {
            base.wrapping_add(offset)
        } else {
            base.wrapping_sub(offset)
        };
        match (index.pre, index.writeback) {
            (true, false) => (moved, None),
            (true, true) => (moved, Some(moved)),
            (false, _) => (base, Some(moved)),
        }
    }

    fn transfer(
        &mut self,
        bus: &mut impl Bus,
        load: bool,
        byte: bool,
        index: Indexing,
        offset: Offset,
    ) {
        let (rn, rd, offset) = match offset {
            Offset::Immediate => {
                let raw = OpRawTransImm::new(self.opcode);
                (raw.rn as usize, raw.rd as usize, raw.offset as u32)
            }
            Offset::Register(kind) => {
                let raw = OpRawTransReg::new(self.opcode);
                let rm = self.operand(raw.rm as usize);
                let (value, _) =
                    alu::shift_immediate(kind, rm, raw.shift as u32, self.regs.cpsr().c());
                (raw.rn as usize, raw.rd as usize, value)
            }
        };
        let (addr, writeback) = self.address(rn, offset, index);
        if load {
            let value = if byte {
                bus.read8(addr) as u32
            } else {
                load_word(bus, addr)
            };
            self.finish_load(rn, rd, value, writeback);
        } else {
            let value = self.store_value(rd);
            if byte {
                bus.write8(addr, value as u8);
            } else {
                bus.write32(addr & !3, value);
            }
            if let Some(base) = writeback {
                self.write_reg(rn, base);
            }
            self.delay = 2;
        }
    }

    fn transfer_half(
        &mut self,
        bus: &mut impl Bus,
        load: bool,
        kind: HalfKind,
        index: Indexing,
        immediate: bool,
    ) {
        let raw = OpRawTransHalf::new(self.opcode);
        let (rn, rd) = (raw.rn as usize, raw.rd as usize);
        let offset = if immediate {
            raw.immediate()
        } else {
            self.operand(raw.offset_l as usize)
        };
        let (addr, writeback) = self.address(rn, offset, index);
        if load {
            let value = match kind {
                HalfKind::Half => load_half(bus, addr),
                HalfKind::SignedByte => load_signed_byte(bus, addr),
                HalfKind::SignedHalf => load_signed_half(bus, addr),
            };
            self.finish_load(rn, rd, value, writeback);
        } else {
            let value = self.store_value(rd);
            bus.write16(addr & !1, value as u16);
            if let Some(base) = writeback {
                self.write_reg(rn, base);
            }
            self.delay = 2;
        }
    }

    // The loaded value wins over the written back base.
    fn finish_load(&mut self, rn: usize, rd: usize, value: u32, writeback: Option<u32>) {
        if let Some(base) = writeback {
            if rn != rd {
                self.write_reg(rn, base);
            }
        }
        self.write_reg(rd, value);
        self.delay = if rd == 15 { 4 } else { 3 };
    }

    /// Load/store multiple, shared with the Thumb PUSH/POP and LDMIA/STMIA forms. Returns the
    /// cycle delay. An empty list transfers R15 alone and moves the base by 0x40.
    pub(super) fn transfer_block(
        &mut self,
        bus: &mut impl Bus,
        rn: usize,
        list: u16,
        load: bool,
        index: Indexing,
        user: bool,
    ) -> u32 {
        let base = self.regs.read(rn);
        let (list, size) = match list {
            0 => (1 << 15, 0x40),
            list => (list, list.count_ones() * 4),
        };
        let start = match (index.pre, index.up) {
            (false, true) => base,
            (true, true) => base.wrapping_add(4),
            (false, false) => base.wrapping_sub(size).wrapping_add(4),
            (true, false) => base.wrapping_sub(size),
        };
        let end = if index.up {
            base.wrapping_add(size)
        } else {
            base.wrapping_sub(size)
        };
        let loads_pc = load && list & (1 << 15) != 0;
        let user_bank = user && !loads_pc;
        let first = list.trailing_zeros() as usize;

        let mut addr = start;
        let mut pc = None;
        for i in (0..16).filter(|i| list & (1 << i) != 0) {
            if load {
                let value = bus.read32(addr & !3);
                if i == 15 {
                    pc = Some(value);
                } else if user_bank {
                    self.regs.write_user(i, value);
                } else {
                    self.regs.write(i, value);
                }
            } else {
                let value = if i == rn && index.writeback && i != first {
                    end
                } else if user_bank && i != 15 {
                    self.regs.read_user(i)
                } else {
                    self.store_value(i)
                };
                bus.write32(addr & !3, value);
            }
            addr = addr.wrapping_add(4);
        }

        if index.writeback && !(load && list & (1 << rn) != 0) {
            self.regs.write(rn, end);
        }
        if let Some(target) = pc {
            if user {
                self.restore_cpsr();
            }
            self.jump(target);
        }

        1 + list.count_ones() + load as u32 + if loads_pc { 2 } else { 0 }
    }
}
