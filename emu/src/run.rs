use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use okto::state::FrameBuffer;
use okto::{Error, Flow, Machine};

/// A key transition forwarded from the event pump.
#[derive(Clone, Copy, Debug)]
pub enum KeyEvent {
    Down(u8),
    Up(u8),
}

/// The clock driver: owns the machine outright and runs it on its own thread
/// at the configured instruction rate.
///
/// Key events arrive one-way over a channel from the event pump; frames leave
/// one-way over a channel to the render loop; the halt flag is the only other
/// shared state and can be raised from either side.
pub struct Runner {
    pub machine: Machine,
    pub keys: Receiver<KeyEvent>,
    pub frames: Sender<FrameBuffer>,
    pub halt: Arc<AtomicBool>,
    pub clock_hz: u64,
    pub key_timeout: Duration,
    pub debug: bool,
}

impl Runner {
    /// Drives fetch/decode/execute until the machine halts, a terminal error
    /// surfaces, or the halt flag is raised.
    pub fn run(mut self) {
        let cycle_time = Duration::from_micros(1_000_000 / self.clock_hz.max(1));
        let mut last_cycle = Instant::now();

        loop {
            // the halt flag can be raised by the event pump at any point, so
            // check it before fetching rather than only after executing
            if self.halt.load(Ordering::SeqCst) {
                break;
            }

            while let Ok(event) = self.keys.try_recv() {
                self.apply(event);
            }

            match self.machine.step() {
                Ok(Flow::Halted) => {
                    log::info!("program halted");
                    break;
                }
                Ok(Flow::AwaitingKey) => {
                    if !self.await_key() {
                        break;
                    }
                    continue;
                }
                Ok(Flow::Running) => {}
                Err(Error::UnknownInstruction(op)) if self.debug => {
                    log::warn!("skipping unknown instruction {:#06X}", op);
                }
                Err(e) => {
                    log::error!("{}", e);
                    break;
                }
            }

            if let Some(frame) = self.machine.take_frame() {
                if self.frames.send(frame).is_err() {
                    break;
                }
            }

            let elapsed = last_cycle.elapsed();
            if cycle_time > elapsed {
                std::thread::sleep(cycle_time - elapsed);
            }
            last_cycle = Instant::now();
        }

        self.halt.store(true, Ordering::SeqCst);
    }

    /// Blocks until a key press resolves the pending read, rechecking the
    /// halt flag at the configured settle interval so an external quit can
    /// always interrupt the wait.
    ///
    /// Returns false when cancelled or when the event pump went away.
    fn await_key(&mut self) -> bool {
        loop {
            if self.halt.load(Ordering::SeqCst) {
                return false;
            }
            match self.keys.recv_timeout(self.key_timeout) {
                Ok(event) => {
                    let resolves = matches!(event, KeyEvent::Down(_));
                    self.apply(event);
                    if resolves {
                        return true;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, event: KeyEvent) {
        match event {
            KeyEvent::Down(key) => self.machine.key_press(key),
            KeyEvent::Up(key) => self.machine.key_release(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn runner_with(rom: &[u8], debug: bool) -> (Runner, Sender<KeyEvent>, Receiver<FrameBuffer>) {
        let mut machine = Machine::new();
        machine.load_rom(rom).unwrap();
        let (key_tx, key_rx) = unbounded();
        let (frame_tx, frame_rx) = unbounded();
        let runner = Runner {
            machine,
            keys: key_rx,
            frames: frame_tx,
            halt: Arc::new(AtomicBool::new(false)),
            clock_hz: 100_000,
            key_timeout: Duration::from_millis(1),
            debug,
        };
        (runner, key_tx, frame_rx)
    }

    #[test]
    fn test_runs_to_the_sentinel_and_raises_halt() {
        // V0 = 5; V0 += 3; exit
        let (runner, _keys, _frames) = runner_with(&[0x60, 0x05, 0x70, 0x03, 0x00, 0x00], false);
        let halt = Arc::clone(&runner.halt);
        runner.run();
        assert!(halt.load(Ordering::SeqCst));
    }

    #[test]
    fn test_stops_on_a_terminal_error() {
        // return with an empty stack
        let (runner, _keys, _frames) = runner_with(&[0x00, 0xEE], false);
        let halt = Arc::clone(&runner.halt);
        runner.run();
        assert!(halt.load(Ordering::SeqCst));
    }

    #[test]
    fn test_debug_mode_skips_unknown_instructions() {
        // an unknown word, then the sentinel
        let (runner, _keys, _frames) = runner_with(&[0x51, 0x21, 0x00, 0x00], true);
        let halt = Arc::clone(&runner.halt);
        runner.run();
        // reaching the sentinel means the unknown word was skipped
        assert!(halt.load(Ordering::SeqCst));
    }

    #[test]
    fn test_key_wait_resolves_from_the_channel() {
        // V1 = key (blocking); exit
        let (runner, keys, _frames) = runner_with(&[0xF1, 0x0A, 0x00, 0x00], false);
        let halt = Arc::clone(&runner.halt);
        // feed presses until the runner halts so one is guaranteed to land
        // after the read suspends
        let feeder_halt = Arc::clone(&halt);
        let feeder = std::thread::spawn(move || {
            while !feeder_halt.load(Ordering::SeqCst) {
                if keys.send(KeyEvent::Down(0xE)).is_err() {
                    break;
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        });
        runner.run();
        assert!(halt.load(Ordering::SeqCst));
        feeder.join().unwrap();
    }

    #[test]
    fn test_key_wait_is_cancellable() {
        // V1 = key (blocking), nothing will ever arrive
        let (runner, _keys, _frames) = runner_with(&[0xF1, 0x0A], false);
        let halt = Arc::clone(&runner.halt);
        let handle = std::thread::spawn(move || runner.run());
        std::thread::sleep(Duration::from_millis(20));
        halt.store(true, Ordering::SeqCst);
        handle.join().unwrap();
    }

    #[test]
    fn test_frames_flow_out_after_a_draw() {
        // clear display (sets the draw flag), then exit
        let (runner, _keys, frames) = runner_with(&[0x00, 0xE0, 0x00, 0x00], false);
        runner.run();
        assert!(frames.try_recv().is_ok());
    }
}
