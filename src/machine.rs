use std::sync::Arc;

use crate::constants::{MEMORY_SIZE, PC_START};
use crate::disassemble::{self, Line};
use crate::error::Error;
use crate::instruction;
use crate::opcode::Opcode;
use crate::operations::Bus;
use crate::state::{FrameBuffer, State};
use crate::timer::Timers;

/// What a single step of the machine produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// An instruction executed; keep going.
    Running,
    /// A blocking key read is pending; nothing was fetched and nothing will
    /// be until a key press resolves it.
    AwaitingKey,
    /// A sentinel exit opcode executed; the run is over.
    Halted,
}

/// The virtual machine.
///
/// Owns the state snapshot and the pressed-key table outright; the two
/// countdown timers are shared with the ticker thread through an `Arc` and
/// are the only state touched from outside the executing thread.
///
/// Supplies interfaces for:
/// - loading ROMs
/// - pressing and releasing keys
/// - advancing the CPU one fetch/decode/execute step at a time
/// - handing out the frame buffer when it changed
/// - disassembling the loaded program
pub struct Machine {
    state: State,
    pressed_keys: [u8; 16],
    timers: Arc<Timers>,
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            state: State::new(),
            pressed_keys: [0; 16],
            timers: Arc::new(Timers::new()),
        }
    }

    /// Copies a ROM into memory at the program start address.
    ///
    /// # Arguments
    /// * `rom` the raw ROM bytes
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Error> {
        let max = MEMORY_SIZE - PC_START as usize;
        if rom.len() > max {
            return Err(Error::RomTooLarge {
                size: rom.len(),
                max,
            });
        }
        let start = PC_START as usize;
        self.state.memory[start..start + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    /// Advances the CPU by a single fetch/decode/execute step.
    ///
    /// While a blocking key read is pending this fetches nothing and returns
    /// [`Flow::AwaitingKey`]; the pending read resolves through
    /// [`Machine::key_press`].
    ///
    /// An unknown instruction advances the program counter before surfacing
    /// so a caller that logs and continues does not refetch the same word
    /// forever.
    pub fn step(&mut self) -> Result<Flow, Error> {
        if self.state.halted {
            return Ok(Flow::Halted);
        }
        if self.state.register_needing_key.is_some() {
            return Ok(Flow::AwaitingKey);
        }

        let op = self.fetch()?;
        log::trace!(
            "{} v{:02X?} i{:04X} pc{:04X}",
            op,
            self.state.v,
            self.state.i,
            self.state.pc
        );

        match instruction::from_op(op) {
            Ok(operation) => {
                let bus = Bus {
                    pressed_keys: &self.pressed_keys,
                    timers: &self.timers,
                };
                self.state = operation(op, &self.state, &bus)?;
            }
            Err(e) => {
                self.state.pc += 0x2;
                return Err(e);
            }
        }

        if self.state.halted {
            Ok(Flow::Halted)
        } else if self.state.register_needing_key.is_some() {
            Ok(Flow::AwaitingKey)
        } else {
            Ok(Flow::Running)
        }
    }

    /// Set the pressed status of `key`; resolves a pending blocking key read
    /// by binding the key value into the waiting register.
    pub fn key_press(&mut self, key: u8) {
        self.pressed_keys[key as usize] = 0x1;
        if let Some(register) = self.state.register_needing_key {
            self.state.v[register as usize] = key;
            self.state.register_needing_key = None;
        }
    }

    /// Unset the pressed status of `key`.
    pub fn key_release(&mut self, key: u8) {
        self.pressed_keys[key as usize] = 0x0;
    }

    /// Returns the frame buffer if the display changed since the last call,
    /// clearing the draw flag.
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    /// The shared timer pair, for wiring up the ticker thread.
    pub fn timers(&self) -> Arc<Timers> {
        Arc::clone(&self.timers)
    }

    /// A disassembly listing of the loaded program.
    pub fn listing(&self) -> Vec<Line> {
        disassemble::listing(&self.state.memory)
    }

    /// Reads the big-endian opcode at the program counter.
    fn fetch(&self) -> Result<Opcode, Error> {
        let pc = self.state.pc as usize;
        if pc + 1 >= MEMORY_SIZE {
            return Err(Error::MemoryOutOfBounds(self.state.pc));
        }
        let left = u16::from(self.state.memory[pc]);
        let right = u16::from(self.state.memory[pc + 1]);
        Ok(Opcode(left << 8 | right))
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_with(rom: &[u8]) -> Machine {
        let mut machine = Machine::new();
        machine.load_rom(rom).unwrap();
        machine
    }

    #[test]
    fn test_fetch_is_big_endian() {
        let machine = machine_with(&[0xAA, 0xBB]);
        assert_eq!(machine.fetch().unwrap(), Opcode(0xAABB));
    }

    #[test]
    fn test_load_rom_that_fits() {
        let machine = machine_with(&[0x12, 0x34]);
        assert_eq!(machine.state.memory[0x200..0x202], [0x12, 0x34]);
    }

    #[test]
    fn test_load_rom_too_large() {
        let mut machine = Machine::new();
        let rom = vec![0; MEMORY_SIZE - 0x200 + 1];
        assert_eq!(
            machine.load_rom(&rom),
            Err(Error::RomTooLarge {
                size: rom.len(),
                max: MEMORY_SIZE - 0x200,
            })
        );
    }

    #[test]
    fn test_fetch_past_memory_end_errors() {
        let mut machine = Machine::new();
        machine.state.pc = 0xFFF;
        assert_eq!(machine.step(), Err(Error::MemoryOutOfBounds(0xFFF)));
    }

    #[test]
    fn test_unknown_instruction_advances_pc_before_surfacing() {
        let mut machine = machine_with(&[0x51, 0x21]);
        assert_eq!(machine.step(), Err(Error::UnknownInstruction(0x5121)));
        assert_eq!(machine.state.pc, 0x202);
    }

    #[test]
    fn test_sentinel_halts_and_stays_halted() {
        let mut machine = machine_with(&[0x00, 0x00]);
        assert_eq!(machine.step(), Ok(Flow::Halted));
        assert_eq!(machine.state.pc, 0x202);
        assert_eq!(machine.step(), Ok(Flow::Halted));
        assert_eq!(machine.state.pc, 0x202);
    }

    #[test]
    fn test_load_then_add_immediate() {
        // V0 = 5; V0 += 3
        let mut machine = machine_with(&[0x60, 0x05, 0x70, 0x03]);
        assert_eq!(machine.step(), Ok(Flow::Running));
        assert_eq!(machine.step(), Ok(Flow::Running));
        assert_eq!(machine.state.v[0x0], 8);
        assert_eq!(machine.state.pc, 0x204);
        assert_eq!(machine.state.v[0xF], 0x0);
    }

    #[test]
    fn test_clear_then_return_on_empty_stack_fails() {
        let mut machine = machine_with(&[0x00, 0xE0, 0x00, 0xEE]);
        assert_eq!(machine.step(), Ok(Flow::Running));
        assert_eq!(machine.step(), Err(Error::StackUnderflow));
    }

    #[test]
    fn test_font_addressing_end_to_end() {
        // I = 0x2F0; I = glyph address for V0 (= 0x3)
        let mut machine = machine_with(&[0xA2, 0xF0, 0xF0, 0x29]);
        machine.state.v[0x0] = 0x3;
        machine.step().unwrap();
        assert_eq!(machine.state.i, 0x2F0);
        machine.step().unwrap();
        assert_eq!(machine.state.i, 0x3 * 5);
    }

    #[test]
    fn test_key_wait_blocks_stepping_until_a_press() {
        // V1 = key (blocking)
        let mut machine = machine_with(&[0xF1, 0x0A]);
        assert_eq!(machine.step(), Ok(Flow::AwaitingKey));
        let suspended_pc = machine.state.pc;
        // further steps fetch nothing
        assert_eq!(machine.step(), Ok(Flow::AwaitingKey));
        assert_eq!(machine.state.pc, suspended_pc);
        machine.key_press(0xE);
        assert_eq!(machine.state.v[0x1], 0xE);
        assert_eq!(machine.state.register_needing_key, None);
    }

    #[test]
    fn test_take_frame_only_after_a_draw() {
        let mut machine = machine_with(&[0x00, 0xE0]);
        assert_eq!(machine.take_frame(), None);
        machine.step().unwrap();
        assert!(machine.take_frame().is_some());
        // the flag clears once taken
        assert_eq!(machine.take_frame(), None);
    }

    #[test]
    fn test_timer_set_is_visible_through_the_shared_pair() {
        // V0 = 5; DT = V0
        let mut machine = machine_with(&[0x60, 0x05, 0xF0, 0x15]);
        let timers = machine.timers();
        machine.step().unwrap();
        machine.step().unwrap();
        assert_eq!(timers.delay(), 5);
    }
}
