use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::constants::TIMER_HZ;

/// The delay and sound timers.
///
/// These are the only machine state shared across threads: the executor sets
/// and reads them while the ticker thread decays them at 60Hz. Both sides go
/// through the atomics, so a set racing a decrement resolves to one or the
/// other and never to a torn or lost update.
pub struct Timers {
    delay: AtomicU8,
    sound: AtomicU8,
}

impl Timers {
    pub fn new() -> Self {
        Timers {
            delay: AtomicU8::new(0),
            sound: AtomicU8::new(0),
        }
    }

    pub fn delay(&self) -> u8 {
        self.delay.load(Ordering::SeqCst)
    }

    pub fn sound(&self) -> u8 {
        self.sound.load(Ordering::SeqCst)
    }

    pub fn set_delay(&self, value: u8) {
        self.delay.store(value, Ordering::SeqCst);
    }

    pub fn set_sound(&self, value: u8) {
        self.sound.store(value, Ordering::SeqCst);
    }

    /// One decay step: each nonzero timer drops by one, never below zero.
    pub fn tick(&self) {
        // fetch_update fails only when checked_sub returns None, i.e. the
        // timer is already zero and should stay there
        let _ = self
            .delay
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| t.checked_sub(1));
        let _ = self
            .sound
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| t.checked_sub(1));
    }

    /// Spawns the 60Hz ticker thread; it runs until `halt` is raised.
    pub fn spawn_ticker(self: &Arc<Self>, halt: Arc<AtomicBool>) -> JoinHandle<()> {
        let timers = Arc::clone(self);
        let period = Duration::from_micros(1_000_000 / TIMER_HZ);
        thread::spawn(move || {
            while !halt.load(Ordering::SeqCst) {
                timers.tick();
                thread::sleep(period);
            }
        })
    }
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decays_to_zero_and_stays_there() {
        let timers = Timers::new();
        timers.set_delay(5);
        for _ in 0..5 {
            timers.tick();
        }
        assert_eq!(timers.delay(), 0);
        timers.tick();
        assert_eq!(timers.delay(), 0);
    }

    #[test]
    fn test_timers_decay_independently() {
        let timers = Timers::new();
        timers.set_delay(2);
        timers.set_sound(1);
        timers.tick();
        assert_eq!(timers.delay(), 1);
        assert_eq!(timers.sound(), 0);
    }

    #[test]
    fn test_set_overrides_a_running_countdown() {
        let timers = Timers::new();
        timers.set_delay(3);
        timers.tick();
        timers.set_delay(0xFF);
        assert_eq!(timers.delay(), 0xFF);
    }

    #[test]
    fn test_ticker_stops_when_halt_is_raised() {
        let timers = Arc::new(Timers::new());
        let halt = Arc::new(AtomicBool::new(true));
        let handle = timers.spawn_ticker(Arc::clone(&halt));
        handle.join().unwrap();
    }
}
