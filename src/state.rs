use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_SET, MEMORY_SIZE, PC_START};
use crate::stack::Stack;

/// The frame buffer is indexed as [y][x].
pub type FrameBuffer = [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// A snapshot of the machine's internal state.
///
/// ## CPU
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) doubles as the carry/borrow/collision flag and is
///       overwritten as a side effect of arithmetic, shift, and draw
///       instructions
/// - (i) a 16-bit memory address register
/// - (pc) a 16-bit program counter, starting at 0x200
///
/// ## Memory
/// - 4096 bytes of addressable memory; 0x000-0x1FF is reserved for the
///   interpreter and holds the font, programs start at 0x200
/// - a 16-deep stack of return addresses
/// - a 64x32 frame buffer holding the next frame to be drawn; the only
///   mutations are per-cell XOR (sprite draws) and a full clear
///
/// ## Control
/// - `draw_flag` set whenever the frame buffer changed
/// - `halted` set once a sentinel exit opcode executes
/// - `register_needing_key` marks a pending blocking key read; while it is
///   set the CPU does not fetch
///
/// The two countdown timers are deliberately not part of the snapshot: they
/// are shared with the ticker thread and live in [`crate::timer::Timers`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub stack: Stack,
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub halted: bool,
    pub register_needing_key: Option<u8>,
}

impl State {
    pub fn new() -> Self {
        // 0x000-0x04F holds the built-in font
        let mut memory = [0; MEMORY_SIZE];
        memory[0..FONT_SET.len()].copy_from_slice(&FONT_SET);

        State {
            v: [0; 16],
            i: 0,
            pc: PC_START,
            stack: Stack::new(),
            memory,
            frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            draw_flag: false,
            halted: false,
            register_needing_key: None,
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_program_start() {
        assert_eq!(State::new().pc, 0x200);
    }

    #[test]
    fn test_font_is_preloaded() {
        let state = State::new();
        // the 0 glyph
        assert_eq!(state.memory[0..5], [0xF0, 0x90, 0x90, 0x90, 0xF0]);
        // everything past the font is zeroed
        assert!(state.memory[0x50..].iter().all(|&byte| byte == 0));
    }
}
