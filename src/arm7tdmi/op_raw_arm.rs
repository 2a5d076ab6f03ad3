// Operand field extractors for ARM opcodes, one struct per instruction family.
include!(concat!(env!("OUT_DIR"), "/op_raw_arm.rs"));

// Field mask bits of MSR, in the order f s x c.
const PSR_FIELD_MASKS: [(u8, u32); 4] = [
    (0b1000, 0xff00_0000),
    (0b0100, 0x00ff_0000),
    (0b0010, 0x0000_ff00),
    (0b0001, 0x0000_00df),
];

fn psr_field_mask(field: u8, privileged: bool) -> u32 {
    PSR_FIELD_MASKS
        .iter()
        .filter(|(bit, _)| field & bit != 0)
        .filter(|(bit, _)| privileged || *bit == 0b1000)
        .fold(0, |mask, (_, bits)| mask | bits)
}

impl OpRawBranchOff {
    /// Signed byte offset from PC + 8.
    pub fn offset(&self) -> i32 {
        ((self.offset << 8) as i32) >> 6
    }
}

impl OpRawDataProcC {
    pub fn value(&self) -> u32 {
        (self.immediate as u32).rotate_right(self.shift as u32 * 2)
    }
}

impl OpRawPsrImm {
    pub fn value(&self) -> u32 {
        (self.immediate as u32).rotate_right(self.shift as u32 * 2)
    }

    pub fn mask(&self, privileged: bool) -> u32 {
        psr_field_mask(self.field, privileged)
    }
}

impl OpRawPsrReg {
    pub fn mask(&self, privileged: bool) -> u32 {
        psr_field_mask(self.field, privileged)
    }
}

impl OpRawTransHalf {
    pub fn immediate(&self) -> u32 {
        ((self.offset_h as u32) << 4) | self.offset_l as u32
    }
}
