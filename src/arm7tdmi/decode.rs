use super::op::{
    AluOp, ArmInstr, Cond, HalfKind, HiRegOp, Indexing, Offset, Operand2, ShiftType, ThumbAluOp,
    ThumbInstr,
};

// ARM_TABLE, indexed by opcode bits 27..20 and 7..4
include!(concat!(env!("OUT_DIR"), "/arm_table.rs"));
// THUMB_TABLE, indexed by opcode bits 15..6
include!(concat!(env!("OUT_DIR"), "/thumb_table.rs"));

pub fn arm_index(opcode: u32) -> usize {
    (((opcode >> 16) & 0xff0) | ((opcode >> 4) & 0xf)) as usize
}

pub fn thumb_index(opcode: u16) -> usize {
    (opcode >> 6) as usize
}

pub fn decode_arm(opcode: u32) -> ArmInstr {
    ARM_TABLE[arm_index(opcode)]
}

pub fn decode_thumb(opcode: u16) -> ThumbInstr {
    THUMB_TABLE[thumb_index(opcode)]
}
