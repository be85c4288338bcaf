use std::ops::Range;

use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_GLYPH_SIZE, MEMORY_SIZE};
use crate::error::Error;
use crate::opcode::Opcode;
use crate::state::State;
use crate::timer::Timers;

/// Everything an instruction can touch besides the state snapshot: the
/// pressed-key table and the shared timers.
pub struct Bus<'a> {
    pub pressed_keys: &'a [u8; 16],
    pub timers: &'a Timers,
}

/// An instruction's effect: a new state snapshot, or a terminal error.
pub type Operation = fn(op: Opcode, state: &State, bus: &Bus) -> Result<State, Error>;

/// Bounds-checks a `len`-byte access starting at `start`.
fn span(start: u16, len: usize) -> Result<Range<usize>, Error> {
    let begin = start as usize;
    if begin + len > MEMORY_SIZE {
        return Err(Error::MemoryOutOfBounds(start));
    }
    Ok(begin..begin + len)
}

/// clear the display
pub fn clr(_op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    Ok(State {
        pc: state.pc + 0x2,
        frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        draw_flag: true,
        ..*state
    })
}

/// PC = STACK.pop()
pub fn rts(_op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut stack = state.stack;
    let pc = stack.pop()? + 0x2;
    Ok(State { pc, stack, ..*state })
}

/// sentinel exit: flag the run as finished
pub fn halt(_op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    Ok(State {
        pc: state.pc + 0x2,
        halted: true,
        ..*state
    })
}

/// PC = nnn
pub fn jump(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    Ok(State {
        pc: op.nnn(),
        ..*state
    })
}

/// STACK.push(PC); PC = nnn
pub fn call(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut stack = state.stack;
    stack.push(state.pc)?;
    Ok(State {
        pc: op.nnn(),
        stack,
        ..*state
    })
}

/// if Vx == kk then pc += 2
pub fn ske(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let pc = if state.v[op.x() as usize] == op.kk() {
        state.pc + 0x4
    } else {
        state.pc + 0x2
    };
    Ok(State { pc, ..*state })
}

/// if Vx != kk then pc += 2
pub fn skne(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let pc = if state.v[op.x() as usize] != op.kk() {
        state.pc + 0x4
    } else {
        state.pc + 0x2
    };
    Ok(State { pc, ..*state })
}

/// if Vx == Vy then pc += 2
pub fn skre(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let pc = if state.v[op.x() as usize] == state.v[op.y() as usize] {
        state.pc + 0x4
    } else {
        state.pc + 0x2
    };
    Ok(State { pc, ..*state })
}

/// Vx = kk
pub fn load(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x() as usize] = op.kk();
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx += kk, wrapping; VF untouched
pub fn add(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x() as usize] = v[op.x() as usize].wrapping_add(op.kk());
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx = Vy
pub fn mv(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x() as usize] = v[op.y() as usize];
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx |= Vy
pub fn or(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x() as usize] |= v[op.y() as usize];
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx &= Vy
pub fn and(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x() as usize] &= v[op.y() as usize];
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx ^= Vy
pub fn xor(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x() as usize] ^= v[op.y() as usize];
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// Vx += Vy; VF = overflow
pub fn addr(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let (res, over) = state.v[op.x() as usize].overflowing_add(state.v[op.y() as usize]);
    let mut v = state.v;
    v[0xF] = if over { 0x1 } else { 0x0 };
    v[op.x() as usize] = res;
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// VF = (Vx > Vy); Vx -= Vy, wrapping
pub fn sub(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[0xF] = if v[op.x() as usize] > v[op.y() as usize] {
        0x1
    } else {
        0x0
    };
    v[op.x() as usize] = v[op.x() as usize].wrapping_sub(v[op.y() as usize]);
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// VF = Vx & 1; Vx >>= 1
pub fn shr(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[0xF] = v[op.x() as usize] & 0x1;
    v[op.x() as usize] >>= 1;
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// VF = (Vy > Vx); Vx = Vy - Vx, wrapping
pub fn subn(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[0xF] = if v[op.y() as usize] > v[op.x() as usize] {
        0x1
    } else {
        0x0
    };
    v[op.x() as usize] = v[op.y() as usize].wrapping_sub(v[op.x() as usize]);
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// VF = Vx & 1; Vx <<= 1, wrapping
///
/// The flag is the low bit before the shift: this machine's convention,
/// deliberately not the historical most-significant-bit one.
pub fn shl(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[0xF] = v[op.x() as usize] & 0x1;
    v[op.x() as usize] = v[op.x() as usize].wrapping_shl(1);
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// if Vx != Vy then pc += 2
pub fn skrne(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let pc = if state.v[op.x() as usize] != state.v[op.y() as usize] {
        state.pc + 0x4
    } else {
        state.pc + 0x2
    };
    Ok(State { pc, ..*state })
}

/// I = nnn
pub fn loadi(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    Ok(State {
        pc: state.pc + 0x2,
        i: op.nnn(),
        ..*state
    })
}

/// PC = V0 + nnn
pub fn jumpi(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    Ok(State {
        pc: u16::from(state.v[0x0]) + op.nnn(),
        ..*state
    })
}

/// Vx = rand_byte & kk
pub fn rand(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let rand_byte: u8 = rand::random();
    let mut v = state.v;
    v[op.x() as usize] = rand_byte & op.kk();
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// draw_sprite(x=Vx y=Vy size=n)
///
/// XORs the n sprite bytes at memory[I..I+n) onto the frame buffer at
/// (Vx, Vy), wrapping coordinates modulo the display dimensions. VF is set
/// if any previously-lit cell became unlit. Reading sprite bytes past the
/// end of memory is an error.
pub fn draw(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    let mut frame_buffer = state.frame_buffer;
    let sprite = span(state.i, op.n() as usize)?;

    // collision flag
    v[0xF] = 0x0;

    for (row, sprite_byte) in state.memory[sprite].iter().enumerate() {
        let y = (state.v[op.y() as usize] as usize + row) % DISPLAY_HEIGHT;
        for bit in 0..8 {
            let x = (state.v[op.x() as usize] as usize + bit) % DISPLAY_WIDTH;
            let pixel = (sprite_byte >> (7 - bit)) & 1;
            v[0xF] |= pixel & frame_buffer[y][x];
            frame_buffer[y][x] ^= pixel;
        }
    }

    Ok(State {
        pc: state.pc + 0x2,
        draw_flag: true,
        v,
        frame_buffer,
        ..*state
    })
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: Opcode, state: &State, bus: &Bus) -> Result<State, Error> {
    let pc = if key_pressed(bus, state.v[op.x() as usize]) {
        state.pc + 0x4
    } else {
        state.pc + 0x2
    };
    Ok(State { pc, ..*state })
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: Opcode, state: &State, bus: &Bus) -> Result<State, Error> {
    let pc = if !key_pressed(bus, state.v[op.x() as usize]) {
        state.pc + 0x4
    } else {
        state.pc + 0x2
    };
    Ok(State { pc, ..*state })
}

/// A register can hold any byte but the keypad only has 16 keys; values past
/// the keypad count as not pressed.
fn key_pressed(bus: &Bus, key: u8) -> bool {
    bus.pressed_keys.get(key as usize) == Some(&0x1)
}

/// Vx = DT
pub fn moved(op: Opcode, state: &State, bus: &Bus) -> Result<State, Error> {
    let mut v = state.v;
    v[op.x() as usize] = bus.timers.delay();
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}

/// suspend until a key arrives, then Vx = key
pub fn keyd(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    Ok(State {
        pc: state.pc + 0x2,
        register_needing_key: Some(op.x()),
        ..*state
    })
}

/// DT = Vx
pub fn loads(op: Opcode, state: &State, bus: &Bus) -> Result<State, Error> {
    bus.timers.set_delay(state.v[op.x() as usize]);
    Ok(State {
        pc: state.pc + 0x2,
        ..*state
    })
}

/// ST = Vx
pub fn ld(op: Opcode, state: &State, bus: &Bus) -> Result<State, Error> {
    bus.timers.set_sound(state.v[op.x() as usize]);
    Ok(State {
        pc: state.pc + 0x2,
        ..*state
    })
}

/// I += Vx, wrapping; no flag
pub fn addi(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    Ok(State {
        pc: state.pc + 0x2,
        i: state.i.wrapping_add(u16::from(state.v[op.x() as usize])),
        ..*state
    })
}

/// I = Vx * 5
///
/// Points I at the built-in font glyph for the digit in Vx.
pub fn ldspr(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    Ok(State {
        pc: state.pc + 0x2,
        i: u16::from(state.v[op.x() as usize]) * FONT_GLYPH_SIZE,
        ..*state
    })
}

/// mem[I..I+3) = bcd(Vx)
pub fn bcd(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let digits = [
        state.v[op.x() as usize] / 100 % 10,
        state.v[op.x() as usize] / 10 % 10,
        state.v[op.x() as usize] % 10,
    ];
    let target = span(state.i, digits.len())?;
    let mut memory = state.memory;
    memory[target].copy_from_slice(&digits);
    Ok(State {
        pc: state.pc + 0x2,
        memory,
        ..*state
    })
}

/// mem[I..I+x] = V0..Vx, inclusive of x
pub fn stor(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let count = op.x() as usize + 1;
    let target = span(state.i, count)?;
    let mut memory = state.memory;
    memory[target].copy_from_slice(&state.v[0..count]);
    Ok(State {
        pc: state.pc + 0x2,
        memory,
        ..*state
    })
}

/// V0..Vx = mem[I..I+x], inclusive of x
pub fn read(op: Opcode, state: &State, _bus: &Bus) -> Result<State, Error> {
    let count = op.x() as usize + 1;
    let source = span(state.i, count)?;
    let mut v = state.v;
    v[0..count].copy_from_slice(&state.memory[source]);
    Ok(State {
        pc: state.pc + 0x2,
        v,
        ..*state
    })
}
