use thiserror::Error;

/// Conditions that stop the core for good. `Cpu::step` never returns them; they are latched
/// and exposed through `Cpu::fault`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("invalid mode bits 0x{bits:02x} written to cpsr at pc 0x{pc:08x}")]
    InvalidMode { bits: u32, pc: u32 },
    #[error("unimplemented {} instruction 0x{opcode:08x} at pc 0x{pc:08x}", isa(.thumb))]
    Unimplemented { opcode: u32, pc: u32, thumb: bool },
}

fn isa(thumb: &bool) -> &'static str {
    if *thumb {
        "thumb"
    } else {
        "arm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = CpuError::InvalidMode { bits: 0x05, pc: 0x0800_0000 };
        assert_eq!(err.to_string(), "invalid mode bits 0x05 written to cpsr at pc 0x08000000");
        let err = CpuError::Unimplemented { opcode: 0xde00, pc: 0x100, thumb: true };
        assert_eq!(err.to_string(), "unimplemented thumb instruction 0x0000de00 at pc 0x00000100");
    }
}
