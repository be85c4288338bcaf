/// Total addressable memory in bytes.
pub const MEMORY_SIZE: usize = 4096;

/// Where ROMs are loaded and where the program counter starts.
pub const PC_START: u16 = 0x200;

/// How many return addresses the call stack can hold.
pub const STACK_DEPTH: usize = 16;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Default instruction rate in instructions per second.
pub const DEFAULT_CLOCK_HZ: u64 = 500;

/// The rate at which the delay and sound timers decay.
pub const TIMER_HZ: u64 = 60;

/// Bytes per built-in font glyph; the glyph for digit d starts at d * 5.
pub const FONT_GLYPH_SIZE: u16 = 5;

/// The built-in hexadecimal font, preloaded at 0x000.
///
/// Each glyph is 5 bytes tall and 4 bits wide with the sprite data in the
/// high nibble of each byte.
#[rustfmt::skip]
pub const FONT_SET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
