use std::fmt;

use crate::constants::{MEMORY_SIZE, PC_START};
use crate::opcode::Opcode;

/// One row of a disassembly listing.
#[derive(Debug, PartialEq, Eq)]
pub struct Line {
    pub address: u16,
    pub opcode: u16,
    pub text: String,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#06X}: {:#06X} {}", self.address, self.opcode, self.text)
    }
}

/// Walks memory from the program start in 2-byte steps, describing each
/// aligned opcode until a sentinel exit opcode or the end of memory.
///
/// Purely descriptive: shares the decoder with the executor but never
/// executes anything.
pub fn listing(memory: &[u8; MEMORY_SIZE]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut address = PC_START as usize;
    while address + 1 < MEMORY_SIZE {
        let raw = u16::from(memory[address]) << 8 | u16::from(memory[address + 1]);
        if raw == 0x0000 || raw == 0x0A00 {
            break;
        }
        lines.push(Line {
            address: address as u16,
            opcode: raw,
            text: describe(Opcode(raw)),
        });
        address += 2;
    }
    lines
}

/// A human-readable description of a single opcode.
pub fn describe(op: Opcode) -> String {
    let (x, y, n, kk, nnn) = (op.x(), op.y(), op.n(), op.kk(), op.nnn());
    match op.nibbles() {
        (0x0, 0x0, 0xE, 0x0) => "[CLS] - Clear display".to_string(),
        (0x0, 0x0, 0xE, 0xE) => "[RET] - Return from subroutine".to_string(),
        (0x1, ..) => format!("[JMP] - Jump to {:#05X}", nnn),
        (0x2, ..) => format!("[CALL] - Call subroutine at {:#05X}", nnn),
        (0x3, ..) => format!("[SE] - Skip next instruction if V{:X} == {:#04X}", x, kk),
        (0x4, ..) => format!("[SNE] - Skip next instruction if V{:X} != {:#04X}", x, kk),
        (0x5, .., 0x0) => format!("[SE] - Skip next instruction if V{:X} == V{:X}", x, y),
        (0x6, ..) => format!("[LD] - Set V{:X} to {:#04X}", x, kk),
        (0x7, ..) => format!("[ADD] - V{:X} += {:#04X}", x, kk),
        (0x8, .., 0x0) => format!("[LD] - V{:X} = V{:X}", x, y),
        (0x8, .., 0x1) => format!("[OR] - V{:X} |= V{:X}", x, y),
        (0x8, .., 0x2) => format!("[AND] - V{:X} &= V{:X}", x, y),
        (0x8, .., 0x3) => format!("[XOR] - V{:X} ^= V{:X}", x, y),
        (0x8, .., 0x4) => format!("[ADD] - V{:X} += V{:X} and set VF on overflow", x, y),
        (0x8, .., 0x5) => format!("[SUB] - V{:X} -= V{:X} and set VF on no borrow", x, y),
        (0x8, .., 0x6) => format!("[SHR] - V{:X} /= 2 and set VF if odd", x),
        (0x8, .., 0x7) => format!("[SUBN] - V{:X} = V{:X} - V{:X} and set VF on no borrow", x, y, x),
        (0x8, .., 0xE) => format!("[SHL] - V{:X} *= 2 and set VF if odd", x),
        (0x9, .., 0x0) => format!("[SNE] - Skip next instruction if V{:X} != V{:X}", x, y),
        (0xA, ..) => format!("[LD] - Set I to {:#05X}", nnn),
        (0xB, ..) => format!("[JMP] - Jump to {:#05X} + V0", nnn),
        (0xC, ..) => format!("[RND] - V{:X} = random byte & {:#04X}", x, kk),
        (0xD, ..) => format!(
            "[DRW] - Draw the {}-byte sprite at I to (V{:X}, V{:X})",
            n, x, y
        ),
        (0xE, .., 0x9, 0xE) => format!("[SKP] - Skip next instruction if key V{:X} is pressed", x),
        (0xE, .., 0xA, 0x1) => format!(
            "[SKNP] - Skip next instruction if key V{:X} is not pressed",
            x
        ),
        (0xF, .., 0x0, 0x7) => format!("[LD] - V{:X} = delay timer", x),
        (0xF, .., 0x0, 0xA) => format!("[LD] - V{:X} = next key press (blocking)", x),
        (0xF, .., 0x1, 0x5) => format!("[LD] - delay timer = V{:X}", x),
        (0xF, .., 0x1, 0x8) => format!("[LD] - sound timer = V{:X}", x),
        (0xF, .., 0x1, 0xE) => format!("[ADD] - I += V{:X}", x),
        (0xF, .., 0x2, 0x9) => format!("[LD] - I = address of the glyph for V{:X}", x),
        (0xF, .., 0x3, 0x3) => format!("[LD] - Store BCD of V{:X} at I to I + 2", x),
        (0xF, .., 0x5, 0x5) => format!("[LD] - Store V0 to V{:X} at I to I + {:#X}", x, x),
        (0xF, .., 0x6, 0x5) => format!("[LD] - Load V0 to V{:X} from I to I + {:#X}", x, x),
        _ => "[N/A] - Instruction not found".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;

    #[test]
    fn test_describes_known_opcodes() {
        assert_eq!(describe(Opcode(0x00E0)), "[CLS] - Clear display");
        assert_eq!(describe(Opcode(0x1ABC)), "[JMP] - Jump to 0xABC");
        assert_eq!(
            describe(Opcode(0x6122)),
            "[LD] - Set V1 to 0x22"
        );
    }

    #[test]
    fn test_describes_unknown_opcodes() {
        assert_eq!(describe(Opcode(0x5121)), "[N/A] - Instruction not found");
        assert_eq!(describe(Opcode(0xF1FF)), "[N/A] - Instruction not found");
    }

    #[test]
    fn test_listing_stops_at_sentinel() {
        let mut state = State::new();
        state.memory[0x200..0x208].copy_from_slice(&[
            0x60, 0x05, // V0 = 5
            0x70, 0x03, // V0 += 3
            0x0A, 0x00, // sentinel exit
            0x60, 0x01, // never reached
        ]);
        let lines = listing(&state.memory);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].address, 0x200);
        assert_eq!(lines[0].opcode, 0x6005);
        assert_eq!(lines[1].address, 0x202);
    }

    #[test]
    fn test_listing_of_untouched_memory_is_empty() {
        let state = State::new();
        // memory past the font is zeroed, so the first word is the sentinel
        assert!(listing(&state.memory).is_empty());
    }

    #[test]
    fn test_line_formats_like_a_listing_row() {
        let line = Line {
            address: 0x200,
            opcode: 0x6005,
            text: describe(Opcode(0x6005)),
        };
        assert_eq!(line.to_string(), "0x0200: 0x6005 [LD] - Set V0 to 0x05");
    }
}
