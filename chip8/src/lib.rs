//! A CHIP-8 interpreter core. It models the memory, registers, timers,
//! display buffer and keypad of the virtual machine and executes the 35
//! standard instructions at a fixed cycle rate.
//!
//! Windowing, rendering and key mapping are left to the caller: feed key
//! changes in through [`Chip8::update_key_state`], call [`Chip8::step`] from
//! the event loop and paint [`graphics::Buffer`] when it asks for a redraw.

use std::fmt;
use std::time::Instant;

use crate::opcode::Instruction;
use crate::processor::Cpu;

pub mod clock;
pub mod error;
pub mod graphics;
pub mod input;
pub mod memory;
pub mod opcode;
pub mod processor;
pub mod stack;

pub use error::{Error, Result};

/// The [`Bus`] struct contains fields for different components of a computer system
#[derive(Default)]
pub struct Bus {
    /// An instance of the [`clock::Clock`] struct, which schedules cycles and
    /// holds the delay and sound timers.
    pub clock: clock::Clock,

    /// An instance of the [`graphics::Buffer`] struct, which represents the
    /// display buffer of the computer.
    pub graphics: graphics::Buffer,

    /// An instance of the [`input::Input`] struct, which latches the keypad
    /// state written by the host.
    pub input: input::Input,

    /// An instance of the [`memory::Memory`] struct, which represents the
    /// memory of the computer. This is used to store the instructions and
    /// data that the processor needs to execute.
    pub memory: memory::Memory,
}

/// What a call to [`Chip8::step`] or [`Chip8::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// The cycle interval has not elapsed yet; nothing happened.
    Idle,
    /// One instruction was executed and the timers were ticked.
    Executed(Instruction),
    /// The processor is waiting for a key press; no instruction was fetched.
    BlockedOnKey,
    /// A key press ended the wait and was stored in the requested register.
    KeyCommitted(u8),
    /// A stop was requested; the machine no longer advances.
    Stopped,
}

/// The [`Chip8`] struct represents a computer system that uses the Chip-8 virtual machine.
#[derive(Default)]
pub struct Chip8 {
    /// An instance of the [`Cpu`] struct, which represents the CPU of
    /// the system. This is responsible for executing the instructions in
    /// memory.
    pub processor: Cpu,

    /// An instance of the [`Bus`] struct, which represents the different
    /// components of the system. This is used to connect the CPU to the other
    /// components of the system and facilitate communication between them.
    pub bus: Bus,

    /// Address of the instruction that raised a fatal error, if any.
    halted_at: Option<u16>,

    /// Set by the host to stop the machine between ticks.
    stop_requested: bool,
}

impl Chip8 {
    /// Creates a new machine running at the default cycle rate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new machine running at `hz` cycles per second.
    #[must_use]
    pub fn with_cycle_rate(hz: u32) -> Self {
        Self {
            bus: Bus {
                clock: clock::Clock::with_frequency(hz),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Runs one cycle if the cycle interval has elapsed at `now`, otherwise
    /// returns [`Tick::Idle`] without doing any work.
    ///
    /// # Errors
    ///
    /// See [`Chip8::tick`].
    pub fn step(&mut self, now: Instant) -> Result<Tick> {
        if self.stop_requested {
            return Ok(Tick::Stopped);
        }
        if !self.bus.clock.poll(now) {
            return Ok(Tick::Idle);
        }
        self.tick()
    }

    /// Runs every cycle that is due at `now`, one per elapsed deadline, and
    /// returns how many ran. Lets a caller that wakes up less often than the
    /// cycle rate, such as a vsync-bound event loop, keep the configured rate.
    ///
    /// # Errors
    ///
    /// See [`Chip8::tick`]. Cycles run before the error are kept.
    pub fn step_due(&mut self, now: Instant) -> Result<usize> {
        let mut cycles = 0;
        loop {
            match self.step(now)? {
                Tick::Idle | Tick::Stopped => return Ok(cycles),
                _ => cycles += 1,
            }
        }
    }

    /// Runs one cycle now, regardless of the wall clock. In the running phase
    /// this executes one instruction and then ticks the timers; while blocked
    /// on a key press only the key latch is checked.
    ///
    /// # Errors
    ///
    /// Returns the fatal error raised by the instruction, or
    /// [`Error::Halted`] for every tick after one.
    pub fn tick(&mut self) -> Result<Tick> {
        if self.stop_requested {
            return Ok(Tick::Stopped);
        }
        if let Some(address) = self.halted_at {
            return Err(Error::Halted { address });
        }

        match self.processor.cycle(&mut self.bus) {
            Ok(tick) => {
                if matches!(tick, Tick::Executed(_)) && self.bus.clock.tick_timers() {
                    log::info!("Beep!");
                }
                Ok(tick)
            }
            Err(e) => {
                self.halted_at = Some(self.processor.pc);
                log::error!("{e}\n{}", self.dump());
                Err(e)
            }
        }
    }

    /// Loads the given ROM data into memory at `0x200`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RomTooLarge`] if the data does not fit. Memory is
    /// not modified in that case.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<()> {
        self.bus.memory.load_rom(data)
    }

    /// Updates the state of a key on the keypad. Takes in a [`u8`] key index
    /// and whether the key is now pressed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if `key_code` is not in `0x0..=0xF`.
    pub fn update_key_state(&mut self, key_code: u8, pressed: bool) -> Result<()> {
        self.bus.input.update(key_code, pressed).map_err(|e| {
            log::warn!("Ignoring key update: {e}");
            e
        })
    }

    /// Asks the machine to stop. Every later tick returns [`Tick::Stopped`]
    /// until [`Chip8::reset`].
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Whether a fatal error has stopped the interpreter.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    /// Whether the sound timer is running.
    #[must_use]
    pub fn sound_active(&self) -> bool {
        self.bus.clock.sound_timer > 0
    }

    /// Puts the machine back in its power-on state, keeping the cycle rate.
    /// The loaded program is erased.
    pub fn reset(&mut self) {
        let interval = self.bus.clock.interval();
        *self = Self::default();
        self.bus.clock = clock::Clock::with_interval(interval);
    }

    /// Resets the machine and loads `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RomTooLarge`] if the data does not fit. The machine
    /// is reset either way.
    pub fn reset_and_load(&mut self, data: &[u8]) -> Result<()> {
        self.reset();
        self.load_rom(data)
    }

    /// Renders the full machine state: registers, stack, timers, recent
    /// instructions and a hex dump of memory.
    #[must_use]
    pub fn dump(&self) -> Dump<'_> {
        Dump(self)
    }
}

/// The [`fmt::Display`] form of a machine state, returned by [`Chip8::dump`].
pub struct Dump<'a>(&'a Chip8);

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Dump(chip8) = self;
        chip8.processor.dump(f)?;
        writeln!(
            f,
            "DT: {}  ST: {}",
            chip8.bus.clock.delay_timer, chip8.bus.clock.sound_timer
        )?;
        chip8.bus.memory.dump(f)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn machine(program: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::new();
        chip8.load_rom(program).unwrap();
        chip8
    }

    #[test]
    fn step_only_runs_when_interval_elapsed() {
        let mut chip8 = machine(&[0x70, 0x01, 0x70, 0x01, 0x70, 0x01]);
        let start = Instant::now();
        let interval = chip8.bus.clock.interval();
        assert!(matches!(chip8.step(start), Ok(Tick::Executed(_))));
        assert_eq!(chip8.step(start + interval / 2).unwrap(), Tick::Idle);
        assert_eq!(chip8.processor.v[0], 1);
        assert!(matches!(chip8.step(start + interval), Ok(Tick::Executed(_))));
        assert_eq!(chip8.processor.v[0], 2);
    }

    #[test]
    fn timers_tick_once_per_executed_instruction() {
        // LD V0, 3; LD DT, V0; then spin.
        let mut chip8 = machine(&[0x60, 0x03, 0xF0, 0x15, 0x12, 0x04]);
        chip8.tick().unwrap();
        chip8.tick().unwrap();
        assert_eq!(chip8.bus.clock.delay_timer, 2);
        chip8.tick().unwrap();
        chip8.tick().unwrap();
        chip8.tick().unwrap();
        assert_eq!(chip8.bus.clock.delay_timer, 0);
    }

    #[test]
    fn timers_freeze_while_blocked_on_key() {
        // LD V0, 5; LD ST, V0; LD V1, K
        let mut chip8 = machine(&[0x60, 0x05, 0xF0, 0x18, 0xF1, 0x0A]);
        chip8.tick().unwrap();
        chip8.tick().unwrap();
        chip8.tick().unwrap();
        assert_eq!(chip8.bus.clock.sound_timer, 3);
        assert!(chip8.sound_active());
        for _ in 0..10 {
            assert_eq!(chip8.tick().unwrap(), Tick::BlockedOnKey);
        }
        assert_eq!(chip8.bus.clock.sound_timer, 3);
        chip8.update_key_state(0x9, true).unwrap();
        assert_eq!(chip8.tick().unwrap(), Tick::KeyCommitted(0x9));
        assert_eq!(chip8.bus.clock.sound_timer, 3);
        assert_eq!(chip8.processor.v[1], 0x9);
    }

    #[test]
    fn fatal_error_halts_until_reset() {
        let mut chip8 = machine(&[0xFF, 0xFF]);
        assert!(matches!(chip8.tick(), Err(Error::UnknownOpcode { .. })));
        assert!(chip8.is_halted());
        assert!(matches!(
            chip8.tick(),
            Err(Error::Halted { address: 0x200 })
        ));
        assert_eq!(chip8.processor.pc, 0x200);

        chip8.reset_and_load(&[0x00, 0xE0]).unwrap();
        assert!(!chip8.is_halted());
        assert!(matches!(chip8.tick(), Ok(Tick::Executed(Instruction::Cls))));
    }

    #[test]
    fn stop_request_is_observed_between_ticks() {
        let mut chip8 = machine(&[0x12, 0x00]);
        chip8.tick().unwrap();
        chip8.request_stop();
        assert_eq!(chip8.tick().unwrap(), Tick::Stopped);
        assert_eq!(chip8.step(Instant::now()).unwrap(), Tick::Stopped);
        chip8.reset();
        assert_ne!(chip8.tick().unwrap(), Tick::Stopped);
    }

    #[test]
    fn reset_keeps_cycle_rate() {
        let mut chip8 = Chip8::with_cycle_rate(500);
        chip8.processor.v[3] = 7;
        chip8.reset();
        assert_eq!(chip8.bus.clock.interval(), Duration::from_millis(2));
        assert_eq!(chip8.processor.v[3], 0);
        assert_eq!(chip8.processor.pc, 0x200);
    }

    #[test]
    fn invalid_key_is_rejected() {
        let mut chip8 = Chip8::new();
        assert!(matches!(
            chip8.update_key_state(0x10, true),
            Err(Error::InvalidKey(0x10))
        ));
    }

    #[test]
    fn dump_includes_timers_and_memory() {
        let mut chip8 = machine(&[0x00, 0xE0]);
        chip8.bus.clock.sound_timer = 7;
        let dump = chip8.dump().to_string();
        assert!(dump.starts_with("PC: 0x200"));
        assert!(dump.contains("DT: 0  ST: 7"));
        assert!(dump.contains("Program and work memory:"));
        assert!(dump.contains("200: 00 E0"));
    }

    #[test]
    fn step_due_runs_one_cycle_per_elapsed_deadline() {
        // ADD V0, 1 repeated.
        let mut chip8 = Chip8::with_cycle_rate(500);
        chip8.load_rom(&[0x70, 0x01].repeat(32)).unwrap();
        let start = Instant::now();
        assert_eq!(chip8.step_due(start).unwrap(), 1);
        assert_eq!(chip8.step_due(start + Duration::from_millis(20)).unwrap(), 10);
        assert_eq!(chip8.step_due(start + Duration::from_millis(20)).unwrap(), 0);
        assert_eq!(chip8.processor.v[0], 11);
    }

    #[test]
    fn step_due_stops_at_the_first_error() {
        // ADD V0, 1; then an unknown opcode.
        let mut chip8 = Chip8::with_cycle_rate(500);
        chip8.load_rom(&[0x70, 0x01, 0xFF, 0xFF]).unwrap();
        let start = Instant::now();
        chip8.step_due(start).unwrap();
        assert!(chip8.step_due(start + Duration::from_millis(20)).is_err());
        assert!(chip8.is_halted());
        assert_eq!(chip8.processor.v[0], 1);
    }
}
