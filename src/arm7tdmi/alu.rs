use super::op::{AluOp, ShiftType};

// Barrel shifter. Every function returns the shifted value and the shifter carry out.

/// Shift by a 5 bit amount encoded in the instruction. An amount of 0 selects the special forms:
/// LSL #0 passes the value through, LSR #0 and ASR #0 shift by 32, ROR #0 is RRX.
pub fn shift_immediate(kind: ShiftType, value: u32, amount: u32, carry: bool) -> (u32, bool) {
    let amount = amount & 0x1f;
    match (kind, amount) {
        (ShiftType::LSL, 0) => (value, carry),
        (ShiftType::LSR, 0) => (0, value & (1 << 31) != 0),
        (ShiftType::ASR, 0) => (((value as i32) >> 31) as u32, value & (1 << 31) != 0),
        (ShiftType::ROR, 0) => (((carry as u32) << 31) | (value >> 1), value & 1 != 0),
        (kind, amount) => shift(kind, value, amount),
    }
}

/// Shift by the bottom byte of a register. An amount of 0 leaves value and carry untouched.
pub fn shift_register(kind: ShiftType, value: u32, amount: u32, carry: bool) -> (u32, bool) {
    let amount = amount & 0xff;
    if amount == 0 {
        return (value, carry);
    }
    match kind {
        ShiftType::LSL | ShiftType::LSR if amount > 32 => (0, false),
        ShiftType::LSL if amount == 32 => (0, value & 1 != 0),
        ShiftType::LSR if amount == 32 => (0, value & (1 << 31) != 0),
        ShiftType::ASR if amount >= 32 => {
            (((value as i32) >> 31) as u32, value & (1 << 31) != 0)
        }
        ShiftType::ROR if amount & 0x1f == 0 => (value, value & (1 << 31) != 0),
        ShiftType::ROR => shift(kind, value, amount & 0x1f),
        kind => shift(kind, value, amount),
    }
}

// 1..=31
fn shift(kind: ShiftType, value: u32, amount: u32) -> (u32, bool) {
    match kind {
        ShiftType::LSL => (value << amount, (value >> (32 - amount)) & 1 != 0),
        ShiftType::LSR => (value >> amount, (value >> (amount - 1)) & 1 != 0),
        ShiftType::ASR => (
            ((value as i32) >> amount) as u32,
            (value >> (amount - 1)) & 1 != 0,
        ),
        ShiftType::ROR => (
            value.rotate_right(amount),
            (value >> (amount - 1)) & 1 != 0,
        ),
    }
}

/// 8 bit immediate rotated right by twice the 4 bit `rotate` field. A zero rotation keeps the
/// carry flag.
pub fn rotate_immediate(immediate: u32, rotate: u32, carry: bool) -> (u32, bool) {
    let rotate = (rotate & 0xf) * 2;
    if rotate == 0 {
        (immediate, carry)
    } else {
        let value = immediate.rotate_right(rotate);
        (value, value & (1 << 31) != 0)
    }
}

/// `a + b + carry` as the 33 bit ARM adder computes it: (result, carry out, signed overflow).
/// Subtraction is `add_with_carry(a, !b, true)`, so C=1 means no borrow.
pub fn add_with_carry(a: u32, b: u32, carry: bool) -> (u32, bool, bool) {
    let sum = a as u64 + b as u64 + carry as u64;
    let result = sum as u32;
    let overflow = (!(a ^ b) & (a ^ result)) & (1 << 31) != 0;
    (result, sum > 0xffff_ffff, overflow)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutput {
    pub value: u32,
    pub carry: bool,
    pub overflow: Option<bool>, // None for logical ops, which keep V
}

/// Evaluates `op` on `rn` and the second operand. `shifter_carry` is the carry out of the barrel
/// shifter and `carry` the current C flag.
pub fn execute(op: AluOp, rn: u32, op2: u32, shifter_carry: bool, carry: bool) -> AluOutput {
    if op.is_logical() {
        let value = match op {
            AluOp::AND | AluOp::TST => rn & op2,
            AluOp::EOR | AluOp::TEQ => rn ^ op2,
            AluOp::ORR => rn | op2,
            AluOp::BIC => rn & !op2,
            AluOp::MVN => !op2,
            _ => op2, // MOV
        };
        return AluOutput {
            value,
            carry: shifter_carry,
            overflow: None,
        };
    }
    let (value, carry, overflow) = match op {
        AluOp::SUB | AluOp::CMP => add_with_carry(rn, !op2, true),
        AluOp::RSB => add_with_carry(op2, !rn, true),
        AluOp::ADC => add_with_carry(rn, op2, carry),
        AluOp::SBC => add_with_carry(rn, !op2, carry),
        AluOp::RSC => add_with_carry(op2, !rn, carry),
        _ => add_with_carry(rn, op2, false), // ADD, CMN
    };
    AluOutput {
        value,
        carry,
        overflow: Some(overflow),
    }
}
