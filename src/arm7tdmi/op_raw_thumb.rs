// Operand field extractors for Thumb opcodes, one struct per instruction format.
include!(concat!(env!("OUT_DIR"), "/op_raw_thumb.rs"));

impl OpRawHiRegBx {
    pub fn rd(&self) -> usize {
        ((self.d as usize) << 3) | self.rd as usize
    }

    pub fn rs(&self) -> usize {
        ((self.s as usize) << 3) | self.rs as usize
    }
}

impl OpRawBranchCond {
    /// Signed byte offset from PC + 4.
    pub fn offset(&self) -> i32 {
        (self.offset as i8 as i32) * 2
    }
}

impl OpRawBranch {
    /// Signed byte offset from PC + 4.
    pub fn offset(&self) -> i32 {
        (((self.offset as u32) << 21) as i32) >> 20
    }
}

impl OpRawBranchLink {
    /// Upper part of the target, added to PC + 4 by the first half.
    pub fn offset_high(&self) -> i32 {
        (((self.offset as u32) << 21) as i32) >> 9
    }

    /// Lower part of the target, added to LR by the second half.
    pub fn offset_low(&self) -> u32 {
        (self.offset as u32) << 1
    }
}
