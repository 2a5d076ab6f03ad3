// build.rs

use std::collections::HashMap;
use std::env;
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::Path;

extern crate inflector;
use inflector::Inflector;

#[macro_use]
extern crate maplit;

#[derive(Debug)]
enum State {
    ARM,
    Thumb,
}

impl State {
    fn inst_len(&self) -> usize {
        match self {
            State::ARM => 32,
            State::Thumb => 16,
        }
    }

    // Opcode bits that select a dispatch bucket.
    fn window(&self) -> u32 {
        match self {
            State::ARM => 0x0ff0_00f0,
            State::Thumb => 0xffc0,
        }
    }

    fn table_len(&self) -> usize {
        match self {
            State::ARM => 0x1000,
            State::Thumb => 0x400,
        }
    }

    fn index_to_inst(&self, idx: usize) -> u32 {
        let idx = idx as u32;
        match self {
            State::ARM => ((idx >> 4) << 20) | ((idx & 0xf) << 4),
            State::Thumb => idx << 6,
        }
    }
}

#[derive(Debug)]
struct Param {
    name: String,
    start: usize,
    end: usize,
}

enum ParamType {
    Bool,
    U8,
    U16,
    U32,
}

impl Param {
    fn typ(&self) -> ParamType {
        let len = self.end - self.start;
        if len == 0 {
            ParamType::Bool
        } else if len > 15 {
            ParamType::U32
        } else if len > 7 {
            ParamType::U16
        } else {
            ParamType::U8
        }
    }

    fn mask(&self) -> u32 {
        (((1u64 << (self.end - self.start + 1)) - 1) << self.start) as u32
    }
}

type Fields = HashMap<String, u32>;
type Variant = fn(&Fields) -> String;

struct Op {
    value: u32,
    mask: u32,
    params: Vec<Param>,
    priority: u8, // lower priorities are matched before higher ones in ambiguous buckets
    variant: Variant,
}

fn op(desc: &'static str, priority: u8, variant: Variant) -> (&'static str, u8, Variant) {
    (desc, priority, variant)
}

fn parse_op(state: &State, name: &str, desc: &str, priority: u8, variant: Variant) -> Op {
    let inst_len = state.inst_len();
    if desc.len() != inst_len * 2 + 1 {
        panic!("op {} is not {} bits wide: {}", name, inst_len, desc);
    }
    let elems: Vec<&str> = desc.split_at(1).1.split('|').collect();
    let mut params: Vec<Param> = Vec::new();
    let (mut value, mut mask) = (0u32, 0u32);
    let mut is_param = true;
    let mut param_end = 1;
    let mut elem_idx = 0;
    for (i, c) in desc.chars().skip(1).enumerate() {
        if i % 2 == 1 && c == '|' {
            if is_param {
                params.push(Param {
                    name: elems[elem_idx].replace('_', "").to_snake_case(),
                    start: (inst_len - 1) - (i - 1) / 2,
                    end: (inst_len - 1) - param_end / 2,
                })
            }
            elem_idx += 1;
            param_end = i + 1;
            is_param = true;
        } else if i % 2 == 0 {
            let bit = 1 << ((inst_len - 1) - i / 2);
            if c == '0' || c == '1' {
                mask |= bit;
                if c == '1' {
                    value |= bit;
                }
                is_param = false;
            }
        }
    }
    Op {
        value,
        mask,
        params,
        priority,
        variant,
    }
}

fn parse_ops(state: &State, ops_desc: &HashMap<&str, (&str, u8, Variant)>) -> Vec<(String, Op)> {
    let mut ops: Vec<(String, Op)> = ops_desc
        .iter()
        .map(|(name, (desc, priority, variant))| {
            (name.to_string(), parse_op(state, name, desc, *priority, *variant))
        })
        .collect();
    ops.sort_by(|a, b| a.0.cmp(&b.0));
    ops
}

fn gen_op_raw(f: &mut File, state: &State, ops: &[(String, Op)]) -> Result<(), io::Error> {
    let inst_type = format!("u{}", state.inst_len());
    for (op_name, op) in ops {
        let struct_name = format!("op_raw_{}", op_name).to_pascal_case();
        writeln!(f, "#[derive(Debug, Clone, Copy, PartialEq, Eq)]")?;
        writeln!(f, "pub struct {} {{", struct_name)?;
        writeln!(f, "    pub inst_bin: {},", inst_type)?;
        for param in &op.params {
            writeln!(
                f,
                "    pub {}: {},",
                param.name,
                match param.typ() {
                    ParamType::Bool => "bool",
                    ParamType::U32 => "u32",
                    ParamType::U16 => "u16",
                    ParamType::U8 => "u8",
                }
            )?;
        }
        writeln!(f, "}}\n")?;

        let max_len = op.params.iter().map(|p| p.name.len()).max().unwrap_or(0).max("inst_bin".len());
        writeln!(f, "impl {} {{", struct_name)?;
        writeln!(f, "    pub fn new(v: {}) -> Self {{", inst_type)?;
        writeln!(f, "        Self {{")?;
        writeln!(f, "            {0:<max_len$}: v,", "inst_bin", max_len = max_len)?;
        for param in &op.params {
            let mask_bin = match state {
                State::ARM => format!("{:032b}", param.mask()),
                State::Thumb => format!("{:016b}", param.mask()),
            };
            writeln!(
                f,
                "            {0:<max_len$}: ((v & 0b{1}) >> {2:2}) {3},",
                param.name,
                mask_bin,
                param.start,
                match param.typ() {
                    ParamType::Bool => "!= 0",
                    ParamType::U32 => "as u32",
                    ParamType::U16 => "as u16",
                    ParamType::U8 => "as u8",
                },
                max_len = max_len
            )?;
        }
        writeln!(f, "        }}")?;
        writeln!(f, "    }}")?;
        writeln!(f, "}}\n")?;
    }
    Ok(())
}

fn gen_table(
    f: &mut File,
    state: &State,
    ops: &[(String, Op)],
    table: &str,
    variant_type: &str,
) -> Result<(), io::Error> {
    let window = state.window();
    writeln!(f, "pub static {}: [{}; 0x{:x}] = [", table, variant_type, state.table_len())?;
    for idx in 0..state.table_len() {
        let inst = state.index_to_inst(idx);
        let mut matches: Vec<&(String, Op)> = ops
            .iter()
            .filter(|(_, op)| inst & op.mask & window == op.value & window)
            .collect();
        matches.sort_by_key(|(_, op)| op.priority);
        let (op_name, op) = match matches.as_slice() {
            [] => panic!("{:?} bucket 0x{:03x} has no matching op", state, idx),
            [(_, a), (_, b), ..] if a.priority == b.priority => panic!(
                "{:?} bucket 0x{:03x} is ambiguous: {} / {}",
                state, idx, matches[0].0, matches[1].0
            ),
            [first, ..] => (&first.0, &first.1),
        };
        let fields: Fields = op
            .params
            .iter()
            .filter(|p| p.mask() & !window == 0)
            .map(|p| (p.name.clone(), (inst & p.mask()) >> p.start))
            .collect();
        writeln!(f, "    /* 0x{:03x} {:<16} */ {},", idx, op_name, (op.variant)(&fields))?;
    }
    writeln!(f, "];")?;
    Ok(())
}

const ALU_OPS: [&str; 16] = [
    "AND", "EOR", "SUB", "RSB", "ADD", "ADC", "SBC", "RSC",
    "TST", "TEQ", "CMP", "CMN", "ORR", "MOV", "BIC", "MVN",
];
const THUMB_ALU_OPS: [&str; 16] = [
    "AND", "EOR", "LSL", "LSR", "ASR", "ADC", "SBC", "ROR",
    "TST", "NEG", "CMP", "CMN", "ORR", "MUL", "BIC", "MVN",
];
const SHIFT_TYPES: [&str; 4] = ["LSL", "LSR", "ASR", "ROR"];
const HI_REG_OPS: [&str; 4] = ["ADD", "CMP", "MOV", "BX"];
const THUMB_IMM_OPS: [&str; 4] = ["MOV", "CMP", "ADD", "SUB"];
const CONDS: [&str; 16] = [
    "EQ", "NE", "CS", "CC", "MI", "PL", "VS", "VC",
    "HI", "LS", "GE", "LT", "GT", "LE", "AL", "NV",
];

fn flag(f: &Fields, name: &str) -> bool {
    f[name] != 0
}

fn field(f: &Fields, name: &str) -> usize {
    f[name] as usize
}

fn indexing(f: &Fields) -> String {
    format!(
        "Indexing {{ pre: {}, up: {}, writeback: {} }}",
        flag(f, "p"),
        flag(f, "u"),
        flag(f, "w")
    )
}

fn undefined(_: &Fields) -> String {
    "ArmInstr::Undefined".to_string()
}

fn coprocessor(_: &Fields) -> String {
    "ArmInstr::Coprocessor".to_string()
}

fn data_proc(f: &Fields, operand: String) -> String {
    format!(
        "ArmInstr::DataProc {{ op: AluOp::{}, s: {}, operand: {} }}",
        ALU_OPS[field(f, "op")],
        flag(f, "s"),
        operand
    )
}

fn data_proc_a(f: &Fields) -> String {
    data_proc(f, format!("Operand2::ShiftImm(ShiftType::{})", SHIFT_TYPES[field(f, "typ")]))
}

fn data_proc_b(f: &Fields) -> String {
    data_proc(f, format!("Operand2::ShiftReg(ShiftType::{})", SHIFT_TYPES[field(f, "typ")]))
}

fn data_proc_c(f: &Fields) -> String {
    data_proc(f, "Operand2::Immediate".to_string())
}

fn branch_exchange(_: &Fields) -> String {
    "ArmInstr::BranchExchange".to_string()
}

fn multiply(f: &Fields) -> String {
    format!("ArmInstr::Multiply {{ accumulate: {}, s: {} }}", flag(f, "a"), flag(f, "s"))
}

fn multiply_long(f: &Fields) -> String {
    format!(
        "ArmInstr::MultiplyLong {{ signed: {}, accumulate: {}, s: {} }}",
        flag(f, "u"),
        flag(f, "a"),
        flag(f, "s")
    )
}

fn swap(f: &Fields) -> String {
    format!("ArmInstr::Swap {{ byte: {} }}", flag(f, "b"))
}

fn psr_reg(f: &Fields) -> String {
    if flag(f, "l") {
        format!("ArmInstr::Msr {{ spsr: {}, immediate: false }}", flag(f, "p"))
    } else {
        format!("ArmInstr::Mrs {{ spsr: {} }}", flag(f, "p"))
    }
}

fn psr_imm(f: &Fields) -> String {
    format!("ArmInstr::Msr {{ spsr: {}, immediate: true }}", flag(f, "p"))
}

fn trans_half(f: &Fields) -> String {
    let kind = match (flag(f, "l"), flag(f, "s"), flag(f, "h")) {
        (_, false, false) | (false, true, _) => return undefined(f),
        (_, false, true) => "Half",
        (true, true, false) => "SignedByte",
        (true, true, true) => "SignedHalf",
    };
    format!(
        "ArmInstr::TransferHalf {{ load: {}, kind: HalfKind::{}, index: {}, immediate: {} }}",
        flag(f, "l"),
        kind,
        indexing(f),
        flag(f, "i")
    )
}

fn transfer(f: &Fields, offset: String) -> String {
    format!(
        "ArmInstr::Transfer {{ load: {}, byte: {}, index: {}, offset: {} }}",
        flag(f, "l"),
        flag(f, "b"),
        indexing(f),
        offset
    )
}

fn trans_imm(f: &Fields) -> String {
    transfer(f, "Offset::Immediate".to_string())
}

fn trans_reg(f: &Fields) -> String {
    transfer(f, format!("Offset::Register(ShiftType::{})", SHIFT_TYPES[field(f, "typ")]))
}

fn block_trans(f: &Fields) -> String {
    format!(
        "ArmInstr::TransferBlock {{ load: {}, user: {}, index: {} }}",
        flag(f, "l"),
        flag(f, "s"),
        indexing(f)
    )
}

fn branch_off(f: &Fields) -> String {
    format!("ArmInstr::Branch {{ link: {} }}", flag(f, "l"))
}

fn swi(_: &Fields) -> String {
    "ArmInstr::SoftwareInterrupt".to_string()
}

fn thumb_undefined(_: &Fields) -> String {
    "ThumbInstr::Undefined".to_string()
}

fn shifted(f: &Fields) -> String {
    match field(f, "op") {
        3 => thumb_undefined(f),
        op => format!("ThumbInstr::MoveShifted {{ kind: ShiftType::{} }}", SHIFT_TYPES[op]),
    }
}

fn add_sub(f: &Fields) -> String {
    format!("ThumbInstr::AddSub {{ sub: {}, immediate: {} }}", flag(f, "o"), flag(f, "i"))
}

fn imm(f: &Fields) -> String {
    format!("ThumbInstr::Immediate {{ op: AluOp::{} }}", THUMB_IMM_OPS[field(f, "op")])
}

fn alu_op(f: &Fields) -> String {
    format!("ThumbInstr::Alu {{ op: ThumbAluOp::{} }}", THUMB_ALU_OPS[field(f, "op")])
}

fn hi_reg_bx(f: &Fields) -> String {
    format!("ThumbInstr::HiReg {{ op: HiRegOp::{} }}", HI_REG_OPS[field(f, "op")])
}

fn ldr_pc(_: &Fields) -> String {
    "ThumbInstr::LoadPcRelative".to_string()
}

fn ldr_str(f: &Fields) -> String {
    let op = field(f, "op");
    format!("ThumbInstr::TransferReg {{ load: {}, byte: {} }}", op & 0b10 != 0, op & 0b01 != 0)
}

fn x_h_sb_sh(f: &Fields) -> String {
    let (load, kind) = match field(f, "op") {
        0b00 => (false, "Half"),
        0b01 => (true, "SignedByte"),
        0b10 => (true, "Half"),
        _ => (true, "SignedHalf"),
    };
    format!("ThumbInstr::TransferRegHalf {{ load: {}, kind: HalfKind::{} }}", load, kind)
}

fn x_b(f: &Fields) -> String {
    let op = field(f, "op");
    format!("ThumbInstr::TransferImm {{ load: {}, byte: {} }}", op & 0b01 != 0, op & 0b10 != 0)
}

fn x_h(f: &Fields) -> String {
    format!("ThumbInstr::TransferHalfImm {{ load: {} }}", flag(f, "l"))
}

fn x_sp(f: &Fields) -> String {
    format!("ThumbInstr::TransferSp {{ load: {} }}", flag(f, "l"))
}

fn add_pc_sp(f: &Fields) -> String {
    format!("ThumbInstr::LoadAddress {{ sp: {} }}", flag(f, "s"))
}

fn add_sp_nn(f: &Fields) -> String {
    format!("ThumbInstr::AdjustSp {{ negative: {} }}", flag(f, "s"))
}

fn push_pop(f: &Fields) -> String {
    format!("ThumbInstr::PushPop {{ pop: {}, extra: {} }}", flag(f, "l"), flag(f, "r"))
}

fn stm_ldm(f: &Fields) -> String {
    format!("ThumbInstr::TransferBlock {{ load: {} }}", flag(f, "l"))
}

fn branch_cond(f: &Fields) -> String {
    match field(f, "cond") {
        0b1110 => thumb_undefined(f),
        cond => format!("ThumbInstr::CondBranch {{ cond: Cond::{} }}", CONDS[cond]),
    }
}

fn thumb_swi(_: &Fields) -> String {
    "ThumbInstr::SoftwareInterrupt".to_string()
}

fn branch(_: &Fields) -> String {
    "ThumbInstr::Branch".to_string()
}

fn branch_link(f: &Fields) -> String {
    format!("ThumbInstr::LongBranch {{ high: {} }}", flag(f, "h"))
}

#[rustfmt::skip]
fn main() -> Result<(), io::Error> {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    println!("cargo:rerun-if-changed=build.rs");

    let ops_desc = hashmap! {
    //                     |..3 ..................2 ..................1 ..................0|
    //                     |1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0|
    "branch_exchange" => op("|_Cond__|0_0_0_1_0_0_1_0|1_1_1_1_1_1_1_1_1_1_1_1|0_0_0_1|__Rn___|", 0, branch_exchange),
    "multiply"        => op("|_Cond__|0_0_0_0_0_0|A|S|__Rd___|__Rn___|__Rs___|1_0_0_1|__Rm___|", 0, multiply),
    "multiply_long"   => op("|_Cond__|0_0_0_0_1|U|A|S|_RdHi__|_RdLo__|__Rs___|1_0_0_1|__Rm___|", 0, multiply_long),
    "swap"            => op("|_Cond__|0_0_0_1_0|B|0_0|__Rn___|__Rd___|0_0_0_0|1_0_0_1|__Rm___|", 0, swap),
    "psr_reg"         => op("|_Cond__|0_0_0_1_0|P|L|0|_Field_|__Rd___|0_0_0_0|0_0_0_0|__Rm___|", 0, psr_reg),
    "psr_imm"         => op("|_Cond__|0_0_1_1_0|P|1|0|_Field_|1_1_1_1|_Shift_|___Immediate___|", 0, psr_imm),
    "undefined_imm"   => op("|_Cond__|0_0_1_1_0|X|0_0|________________Ignored________________|", 0, undefined),
    "undefined"       => op("|_Cond__|0_1_1|________________Ignored________________|1|__Xxx__|", 0, undefined),
    "trans_half"      => op("|_Cond__|0_0_0|P|U|I|W|L|__Rn___|__Rd___|OffsetH|1|S|H|1|OffsetL|", 1, trans_half),
    "undefined_misc"  => op("|_Cond__|0_0_0_1_0|Op_|0|________________Ignored________________|", 2, undefined),
    "data_proc_a"     => op("|_Cond__|0_0_0|___Op__|S|__Rn___|__Rd___|__Shift__|Typ|0|__Rm___|", 3, data_proc_a),
    "data_proc_b"     => op("|_Cond__|0_0_0|___Op__|S|__Rn___|__Rd___|__Rs___|0|Typ|1|__Rm___|", 3, data_proc_b),
    "data_proc_c"     => op("|_Cond__|0_0_1|___Op__|S|__Rn___|__Rd___|_Shift_|___Immediate___|", 3, data_proc_c),
    "trans_imm"       => op("|_Cond__|0_1_0|P|U|B|W|L|__Rn___|__Rd___|_________Offset________|", 3, trans_imm),
    "trans_reg"       => op("|_Cond__|0_1_1|P|U|B|W|L|__Rn___|__Rd___|__Shift__|Typ|0|__Rm___|", 3, trans_reg),
    "block_trans"     => op("|_Cond__|1_0_0|P|U|S|W|L|__Rn___|__________Register_List________|", 3, block_trans),
    "branch_off"      => op("|_Cond__|1_0_1|L|___________________Offset______________________|", 3, branch_off),
    "co_data_trans"   => op("|_Cond__|1_1_0|P|U|N|W|L|__Rn___|__CRd__|__CPN__|____Offset_____|", 3, coprocessor),
    "co_data_op"      => op("|_Cond__|1_1_1_0|_CPopc_|__CRn__|__CRd__|__CPN__|_CP__|0|__CRm__|", 3, coprocessor),
    "co_reg_trans"    => op("|_Cond__|1_1_1_0|CPopc|L|__CRn__|__Rd___|__CPN__|_CP__|1|__CRm__|", 3, coprocessor),
    "swi"             => op("|_Cond__|1_1_1_1|____________________Comment____________________|", 3, swi),
    };

    let arm_ops = parse_ops(&State::ARM, &ops_desc);
    let mut f = File::create(Path::new(&out_dir).join("op_raw_arm.rs"))?;
    gen_op_raw(&mut f, &State::ARM, &arm_ops)?;
    let mut f = File::create(Path::new(&out_dir).join("arm_table.rs"))?;
    gen_table(&mut f, &State::ARM, &arm_ops, "ARM_TABLE", "ArmInstr")?;

    let ops_desc_thumb = hashmap! {
    //                    |..........1 ..................0|
    //                    |5_4_3_2_1_0_9_8_7_6_5_4_3_2_1_0|
    "shifted"        => op("|0_0_0|Op_|_Offset__|_Rs__|_Rd__|", 1, shifted),        // Shifted (1)
    "add_sub"        => op("|0_0_0_1_1|I|O|_Rn__|_Rs__|_Rd__|", 0, add_sub),        // ADD/SUB (2)
    "imm"            => op("|0_0_1|Op_|_Rd__|____Offset_____|", 1, imm),            // Immedi. (3)
    "alu_op"         => op("|0_1_0_0_0_0|__Op___|_Rs__|_Rd__|", 1, alu_op),         // AluOp (4)
    "hi_reg_bx"      => op("|0_1_0_0_0_1|Op_|D|S|_Rs__|_Rd__|", 1, hi_reg_bx),      // HiReg/BX (5)
    "ldr_pc"         => op("|0_1_0_0_1|_Rd__|______Nn_______|", 1, ldr_pc),         // LDR PC (6)
    "ldr_str"        => op("|0_1_0_1|Op_|0|_Ro__|_Rb__|_Rd__|", 1, ldr_str),        // LDR/STR (7)
    "x_h_sb_sh"      => op("|0_1_0_1|Op_|1|_Ro__|_Rb__|_Rd__|", 1, x_h_sb_sh),      // ""H/SB/SH (8)
    "x_b"            => op("|0_1_1|Op_|_Offset__|_Rb__|_Rd__|", 1, x_b),            // ""{B} (9)
    "x_h"            => op("|1_0_0_0|L|_Offset__|_Rb__|_Rd__|", 1, x_h),            // ""H (10)
    "x_sp"           => op("|1_0_0_1|L|_Rd__|______Nn_______|", 1, x_sp),           // "" SP (11)
    "add_pc_sp"      => op("|1_0_1_0|S|_Rd__|______Nn_______|", 1, add_pc_sp),      // ADD PC/SP (12)
    "add_sp_nn"      => op("|1_0_1_1_0_0_0_0|S|_____Nn______|", 0, add_sp_nn),      // ADD SP,nn (13)
    "push_pop"       => op("|1_0_1_1|L|1_0|R|_____Rlist_____|", 0, push_pop),       // PUSH/POP (14)
    "undefined_misc" => op("|1_0_1_1|________Ignored________|", 1, thumb_undefined),
    "stm_ldm"        => op("|1_1_0_0|L|_Rb__|_____Rlist_____|", 1, stm_ldm),        // STM/LDM (15)
    "branch_cond"    => op("|1_1_0_1|_Cond__|_____Offset____|", 1, branch_cond),    // B{cond} (16)
    "swi"            => op("|1_1_0_1_1_1_1_1|____Comment____|", 0, thumb_swi),      // SWI (17)
    "branch"         => op("|1_1_1_0_0|_______Offset________|", 1, branch),         // B (18)
    "undefined_blx"  => op("|1_1_1_0_1|_______Offset________|", 0, thumb_undefined),
    "branch_link"    => op("|1_1_1_1|H|_______Offset________|", 1, branch_link),    // BL (19)
    };

    let thumb_ops = parse_ops(&State::Thumb, &ops_desc_thumb);
    let mut f = File::create(Path::new(&out_dir).join("op_raw_thumb.rs"))?;
    gen_op_raw(&mut f, &State::Thumb, &thumb_ops)?;
    let mut f = File::create(Path::new(&out_dir).join("thumb_table.rs"))?;
    gen_table(&mut f, &State::Thumb, &thumb_ops, "THUMB_TABLE", "ThumbInstr")
}
