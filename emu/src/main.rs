use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use okto::constants::DEFAULT_CLOCK_HZ;
use okto::Machine;
use okto_display::Display;

use crate::keymap::keymap;
use crate::run::{KeyEvent, Runner};

mod keymap;
mod run;

/// A CHIP-8 virtual machine.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Instruction rate in instructions per second
    #[arg(long, default_value_t = DEFAULT_CLOCK_HZ)]
    clockspeed: u64,

    /// Log and skip unknown instructions instead of stopping
    #[arg(long)]
    debug: bool,

    /// How long a blocked key read waits between halt checks, in milliseconds
    #[arg(long, default_value_t = 50)]
    key_timeout: u64,

    /// Print a listing of the ROM instead of running it
    #[arg(long)]
    disassemble: bool,

    /// Path to the ROM file to run
    rom: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut machine = Machine::new();
    let rom = fs::read(&args.rom)
        .with_context(|| format!("unable to read ROM {}", args.rom.display()))?;
    machine.load_rom(&rom)?;
    log::info!("loaded {} byte ROM {}", rom.len(), args.rom.display());

    if args.disassemble {
        for line in machine.listing() {
            println!("{}", line);
        }
        return Ok(());
    }

    // SDL wants the main thread, so the event pump and renderer live here
    // while the machine runs on its own thread
    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let mut display = Display::new(&sdl).map_err(anyhow::Error::msg)?;
    let mut events = sdl.event_pump().map_err(anyhow::Error::msg)?;

    let halt = Arc::new(AtomicBool::new(false));
    let (key_tx, key_rx) = crossbeam_channel::unbounded();
    let (frame_tx, frame_rx) = crossbeam_channel::unbounded();

    let ticker = machine.timers().spawn_ticker(Arc::clone(&halt));
    let runner = Runner {
        machine,
        keys: key_rx,
        frames: frame_tx,
        halt: Arc::clone(&halt),
        clock_hz: args.clockspeed,
        key_timeout: Duration::from_millis(args.key_timeout),
        debug: args.debug,
    };
    let vm = thread::spawn(move || runner.run());

    'event: while !halt.load(Ordering::SeqCst) {
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => {
                    halt.store(true, Ordering::SeqCst);
                    break 'event;
                }
                Event::KeyDown {
                    keycode: Some(key), ..
                } => {
                    if let Some(value) = keymap(key) {
                        if key_tx.send(KeyEvent::Down(value)).is_err() {
                            break 'event;
                        }
                    }
                }
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(value) = keymap(key) {
                        if key_tx.send(KeyEvent::Up(value)).is_err() {
                            break 'event;
                        }
                    }
                }
                _ => continue,
            }
        }

        // render only the newest pending frame
        let mut latest = None;
        while let Ok(frame) = frame_rx.try_recv() {
            latest = Some(frame);
        }
        if let Some(frame) = latest {
            display.render(&frame).map_err(anyhow::Error::msg)?;
        }

        thread::sleep(Duration::from_millis(1000 / 60));
    }

    halt.store(true, Ordering::SeqCst);
    vm.join().expect("machine thread panicked");
    ticker.join().expect("ticker thread panicked");
    Ok(())
}
