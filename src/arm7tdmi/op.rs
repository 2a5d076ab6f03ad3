use std::fmt;

use super::registers::Psr;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Cond {
    EQ = 0b0000, // Z=1 (equal)
    NE = 0b0001, // Z=0 (not equal)
    CS = 0b0010, // C=1 (unsigned higher or same)
    CC = 0b0011, // C=0 (unsigned lower)
    MI = 0b0100, // N=1 (negative)
    PL = 0b0101, // N=0 (positive or zero)
    VS = 0b0110, // V=1 (overflow)
    VC = 0b0111, // V=0 (no overflow)
    HI = 0b1000, // C=1 and Z=0 (unsigned higher)
    LS = 0b1001, // C=0 or Z=1 (unsigned lower or same)
    GE = 0b1010, // N=V (greater or equal, >=)
    LT = 0b1011, // N!=V (less than, <)
    GT = 0b1100, // Z=0 and N=V (greater than, >)
    LE = 0b1101, // Z=1 or N!=V(less or equal, <=)
    AL = 0b1110, // always
    NV = 0b1111, // never on ARMv4
}

const CONDS: [Cond; 16] = [
    Cond::EQ, Cond::NE, Cond::CS, Cond::CC, Cond::MI, Cond::PL, Cond::VS, Cond::VC,
    Cond::HI, Cond::LS, Cond::GE, Cond::LT, Cond::GT, Cond::LE, Cond::AL, Cond::NV,
];

impl Cond {
    /// Condition from the low 4 bits of `field`.
    pub fn from_field(field: u32) -> Cond {
        CONDS[(field & 0xf) as usize]
    }

    pub fn evaluate(self, flags: Psr) -> bool {
        let (n, z, c, v) = (flags.n(), flags.z(), flags.c(), flags.v());
        match self {
            Cond::EQ => z,
            Cond::NE => !z,
            Cond::CS => c,
            Cond::CC => !c,
            Cond::MI => n,
            Cond::PL => !n,
            Cond::VS => v,
            Cond::VC => !v,
            Cond::HI => c && !z,
            Cond::LS => !c || z,
            Cond::GE => n == v,
            Cond::LT => n != v,
            Cond::GT => !z && n == v,
            Cond::LE => z || n != v,
            Cond::AL => true,
            Cond::NV => false,
        }
    }

    pub fn as_str<'a>(&self) -> &'a str {
        match self {
            Cond::EQ => "eq",
            Cond::NE => "ne",
            Cond::CS => "cs",
            Cond::CC => "cc",
            Cond::MI => "mi",
            Cond::PL => "pl",
            Cond::VS => "vs",
            Cond::VC => "vc",
            Cond::HI => "hi",
            Cond::LS => "ls",
            Cond::GE => "ge",
            Cond::LT => "lt",
            Cond::GT => "gt",
            Cond::LE => "le",
            Cond::AL => "",
            Cond::NV => "nv",
        }
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AluOp {
    AND = 0b0000, // AND logical;        Rd = Rn AND Op2
    EOR = 0b0001, // XOR logical;        Rd = Rn XOR Op2
    SUB = 0b0010, // substract;          Rd = Rn - Op2
    RSB = 0b0011, // substract reversed; Rd = Op2 - Rn
    ADD = 0b0100, // add;                Rd = Rn + Op2
    ADC = 0b0101, // add with carry;     Rd = Rn + Op2 + Cy
    SBC = 0b0110, // sub with carry;     Rd = Rn - Op2 + Cy - 1
    RSC = 0b0111, // sub cy. reversed;   Rd = Op2 - Rn + Cy - 1
    TST = 0b1000, // test;                _ = Rn AND Op2
    TEQ = 0b1001, // test exclusive;      _ = Rn XOR Op2
    CMP = 0b1010, // compare;             _ = Rn - Op2
    CMN = 0b1011, // compare neg.;        _ = Rn + Op2
    ORR = 0b1100, // OR logical;         Rd = Rn OR Op2
    MOV = 0b1101, // move;               Rd = Op2
    BIC = 0b1110, // bit clear;          Rd = Rn AND NOT Op2
    MVN = 0b1111, // not;                Rd = NOT Op2
}

impl AluOp {
    /// Logical ops take carry from the shifter and leave V alone.
    pub fn is_logical(self) -> bool {
        matches!(
            self,
            AluOp::AND
                | AluOp::EOR
                | AluOp::TST
                | AluOp::TEQ
                | AluOp::ORR
                | AluOp::MOV
                | AluOp::BIC
                | AluOp::MVN
        )
    }

    pub fn writes_result(self) -> bool {
        !matches!(self, AluOp::TST | AluOp::TEQ | AluOp::CMP | AluOp::CMN)
    }

    pub fn as_str<'a>(&self) -> &'a str {
        match self {
            AluOp::AND => "and",
            AluOp::EOR => "eor",
            AluOp::SUB => "sub",
            AluOp::RSB => "rsb",
            AluOp::ADD => "add",
            AluOp::ADC => "adc",
            AluOp::SBC => "sbc",
            AluOp::RSC => "rsc",
            AluOp::TST => "tst",
            AluOp::TEQ => "teq",
            AluOp::CMP => "cmp",
            AluOp::CMN => "cmn",
            AluOp::ORR => "orr",
            AluOp::MOV => "mov",
            AluOp::BIC => "bic",
            AluOp::MVN => "mvn",
        }
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShiftType {
    LSL = 0,
    LSR = 1,
    ASR = 2,
    ROR = 3,
}

impl ShiftType {
    pub fn as_str<'a>(&self) -> &'a str {
        match self {
            ShiftType::LSL => "lsl",
            ShiftType::LSR => "lsr",
            ShiftType::ASR => "asr",
            ShiftType::ROR => "ror",
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Thumb format 4 opcodes
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ThumbAluOp {
    AND = 0x0, // Rd = Rd AND Rs
    EOR = 0x1, // Rd = Rd XOR Rs
    LSL = 0x2, // Rd = Rd << (Rs AND 0FFh)
    LSR = 0x3, // Rd = Rd >> (Rs AND 0FFh)
    ASR = 0x4, // Rd = Rd SAR (Rs AND 0FFh)
    ADC = 0x5, // Rd = Rd + Rs + Cy
    SBC = 0x6, // Rd = Rd - Rs - NOT Cy
    ROR = 0x7, // Rd = Rd ROR (Rs AND 0FFh)
    TST = 0x8, //  _ = Rd AND Rs
    NEG = 0x9, // Rd = 0 - Rs
    CMP = 0xa, //  _ = Rd - Rs
    CMN = 0xb, //  _ = Rd + Rs
    ORR = 0xc, // Rd = Rd OR Rs
    MUL = 0xd, // Rd = Rd * Rs
    BIC = 0xe, // Rd = Rd AND NOT Rs
    MVN = 0xf, // Rd = NOT Rs
}

impl ThumbAluOp {
    pub fn as_str<'a>(&self) -> &'a str {
        match self {
            ThumbAluOp::AND => "and",
            ThumbAluOp::EOR => "eor",
            ThumbAluOp::LSL => "lsl",
            ThumbAluOp::LSR => "lsr",
            ThumbAluOp::ASR => "asr",
            ThumbAluOp::ADC => "adc",
            ThumbAluOp::SBC => "sbc",
            ThumbAluOp::ROR => "ror",
            ThumbAluOp::TST => "tst",
            ThumbAluOp::NEG => "neg",
            ThumbAluOp::CMP => "cmp",
            ThumbAluOp::CMN => "cmn",
            ThumbAluOp::ORR => "orr",
            ThumbAluOp::MUL => "mul",
            ThumbAluOp::BIC => "bic",
            ThumbAluOp::MVN => "mvn",
        }
    }
}

// Thumb format 5 opcodes
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HiRegOp {
    ADD = 0b00,
    CMP = 0b01,
    MOV = 0b10,
    BX = 0b11,
}

/// Second operand of a data processing instruction.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Operand2 {
    Immediate,            // 8 bit immediate rotated by twice the 4 bit field
    ShiftImm(ShiftType),  // Rm shifted by a 5 bit immediate
    ShiftReg(ShiftType),  // Rm shifted by the bottom byte of Rs
}

/// Offset of a word or byte transfer.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Offset {
    Immediate,
    Register(ShiftType),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Indexing {
    pub pre: bool,       // apply the offset before the transfer
    pub up: bool,        // add the offset
    pub writeback: bool, // write the address into the base (always done when post-indexed)
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum HalfKind {
    Half,
    SignedByte,
    SignedHalf,
}

/// ARM instruction families, parameterized by everything the dispatch bucket fixes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ArmInstr {
    DataProc { op: AluOp, s: bool, operand: Operand2 },
    Multiply { accumulate: bool, s: bool },
    MultiplyLong { signed: bool, accumulate: bool, s: bool },
    Swap { byte: bool },
    BranchExchange,
    Mrs { spsr: bool },
    Msr { spsr: bool, immediate: bool },
    Transfer { load: bool, byte: bool, index: Indexing, offset: Offset },
    TransferHalf { load: bool, kind: HalfKind, index: Indexing, immediate: bool },
    TransferBlock { load: bool, user: bool, index: Indexing },
    Branch { link: bool },
    SoftwareInterrupt,
    Coprocessor,
    Undefined,
}

/// Thumb instruction families, parameterized by everything the dispatch bucket fixes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ThumbInstr {
    MoveShifted { kind: ShiftType },
    AddSub { sub: bool, immediate: bool },
    Immediate { op: AluOp }, // MOV, CMP, ADD or SUB with an 8 bit immediate
    Alu { op: ThumbAluOp },
    HiReg { op: HiRegOp },
    LoadPcRelative,
    TransferReg { load: bool, byte: bool },
    TransferRegHalf { load: bool, kind: HalfKind },
    TransferImm { load: bool, byte: bool },
    TransferHalfImm { load: bool },
    TransferSp { load: bool },
    LoadAddress { sp: bool },
    AdjustSp { negative: bool },
    PushPop { pop: bool, extra: bool }, // extra: LR on push, PC on pop
    TransferBlock { load: bool },
    CondBranch { cond: Cond },
    SoftwareInterrupt,
    Branch,
    LongBranch { high: bool },
    Undefined,
}
