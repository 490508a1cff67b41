//! Opcode identity. The original source dispatches through a table of function pointers
//! indexed by opcode byte, where a null entry means "unimplemented" and is discovered only
//! at the moment that byte is fetched. Here the opcode space is a closed enum decoded up
//! front, so "unimplemented" is a value (`Opcode::decode` returning `None`) the caller
//! must handle before dispatch, not a null pointer dereference waiting to happen.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Nop = 0x00,
    Halt = 0x01,
    Panic = 0x02,

    PushR = 0x10,
    PushW = 0x11,
    Pusha = 0x12,
    PushRr = 0x13,
    PushRrr = 0x14,
    PopR = 0x15,
    Popa = 0x16,
    PopRr = 0x17,
    PopRrr = 0x18,

    MovRw = 0x20,
    MovRr = 0x21,
    LoadRr = 0x22,
    LoadRrw = 0x23,
    StorRr = 0x24,

    AddRr = 0x30,
    AddRw = 0x31,
    SubRr = 0x32,
    SubRw = 0x33,
    MulRr = 0x34,
    MulRw = 0x35,
    IncR = 0x36,
    DecR = 0x37,

    AndRr = 0x40,
    AndRw = 0x41,
    OrRr = 0x42,
    OrRw = 0x43,
    XorRr = 0x44,
    XorRw = 0x45,

    CmpRr = 0x50,
    CmpRw = 0x51,
    JeqS = 0x52,
    JeqA = 0x53,
    JneS = 0x54,
    JneA = 0x55,
    JmpS = 0x56,
    JmpA = 0x57,

    CallS = 0x60,
    CallA = 0x61,
    CallR = 0x62,
    Ret = 0x63,
    Iret = 0x64,

    IntB = 0x70,
    MiB = 0x71,
    UmiB = 0x72,
    Ind = 0x73,
    Ine = 0x74,
    Wfi = 0x75,

    Xbm = 0x80,
    Xbrk = 0x81,
    Xdbg = 0x82,
    Xpse = 0x83,
    Xpsd = 0x84,
}

impl Opcode {
    pub fn decode(byte: u8) -> Option<Self> {
        use Opcode::*;
        Some(match byte {
            0x00 => Nop,
            0x01 => Halt,
            0x02 => Panic,

            0x10 => PushR,
            0x11 => PushW,
            0x12 => Pusha,
            0x13 => PushRr,
            0x14 => PushRrr,
            0x15 => PopR,
            0x16 => Popa,
            0x17 => PopRr,
            0x18 => PopRrr,

            0x20 => MovRw,
            0x21 => MovRr,
            0x22 => LoadRr,
            0x23 => LoadRrw,
            0x24 => StorRr,

            0x30 => AddRr,
            0x31 => AddRw,
            0x32 => SubRr,
            0x33 => SubRw,
            0x34 => MulRr,
            0x35 => MulRw,
            0x36 => IncR,
            0x37 => DecR,

            0x40 => AndRr,
            0x41 => AndRw,
            0x42 => OrRr,
            0x43 => OrRw,
            0x44 => XorRr,
            0x45 => XorRw,

            0x50 => CmpRr,
            0x51 => CmpRw,
            0x52 => JeqS,
            0x53 => JeqA,
            0x54 => JneS,
            0x55 => JneA,
            0x56 => JmpS,
            0x57 => JmpA,

            0x60 => CallS,
            0x61 => CallA,
            0x62 => CallR,
            0x63 => Ret,
            0x64 => Iret,

            0x70 => IntB,
            0x71 => MiB,
            0x72 => UmiB,
            0x73 => Ind,
            0x74 => Ine,
            0x75 => Wfi,

            0x80 => Xbm,
            0x81 => Xbrk,
            0x82 => Xdbg,
            0x83 => Xpse,
            0x84 => Xpsd,

            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_round_trips_through_its_own_byte() {
        let variants = [
            Opcode::Nop, Opcode::Halt, Opcode::Panic,
            Opcode::PushR, Opcode::PushW, Opcode::Pusha, Opcode::PushRr, Opcode::PushRrr,
            Opcode::PopR, Opcode::Popa, Opcode::PopRr, Opcode::PopRrr,
            Opcode::MovRw, Opcode::MovRr, Opcode::LoadRr, Opcode::LoadRrw,
            Opcode::StorRr,
            Opcode::AddRr, Opcode::AddRw, Opcode::SubRr, Opcode::SubRw,
            Opcode::MulRr, Opcode::MulRw, Opcode::IncR, Opcode::DecR,
            Opcode::AndRr, Opcode::AndRw, Opcode::OrRr, Opcode::OrRw, Opcode::XorRr, Opcode::XorRw,
            Opcode::CmpRr, Opcode::CmpRw, Opcode::JeqS, Opcode::JeqA,
            Opcode::JneS, Opcode::JneA, Opcode::JmpS, Opcode::JmpA,
            Opcode::CallS, Opcode::CallA, Opcode::CallR, Opcode::Ret, Opcode::Iret,
            Opcode::IntB, Opcode::MiB, Opcode::UmiB, Opcode::Ind, Opcode::Ine, Opcode::Wfi,
            Opcode::Xbm, Opcode::Xbrk, Opcode::Xdbg, Opcode::Xpse, Opcode::Xpsd,
        ];
        for v in variants {
            assert_eq!(Opcode::decode(v as u8), Some(v));
        }
    }

    #[test]
    fn unassigned_byte_is_unimplemented() {
        assert_eq!(Opcode::decode(0xFF), None);
    }
}
