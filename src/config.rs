//! Frontend settings and command line arguments.

use std::path::PathBuf;

use anyhow::bail;
use egui::Color32;
use serde::{Deserialize, Serialize};

/// Settings that survive restarts through eframe's storage. Emulator state
/// itself is never persisted.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct Config {
    /// Cycles per second. Applied when the machine is reset.
    pub cycle_rate_hz: u32,
    /// Color of lit pixels.
    pub foreground: Color32,
    /// Color of unlit pixels.
    pub background: Color32,
    /// Whether `-d` was passed. Taken from the command line on every run.
    #[serde(skip)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycle_rate_hz: chip8::clock::Clock::DEFAULT_FREQUENCY_HZ,
            foreground: Color32::WHITE,
            background: Color32::BLACK,
            debug: false,
        }
    }
}

/// Parsed command line: `chip8_ui [-d] <rom>`.
#[derive(Debug, PartialEq, Eq)]
pub struct Args {
    /// Trace every executed instruction.
    pub debug: bool,
    /// Path of the program to run.
    pub rom_path: PathBuf,
}

impl Args {
    pub const USAGE: &'static str = "usage: chip8_ui [-d] <rom>";

    /// Parses the arguments that follow the program name.
    ///
    /// # Errors
    ///
    /// Returns an error if no ROM path is given, or if there are unexpected
    /// extra arguments.
    pub fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut debug = false;
        let mut rom_path = None;

        for arg in args {
            match arg.as_str() {
                "-d" | "--debug" => debug = true,
                _ if rom_path.is_none() => rom_path = Some(PathBuf::from(arg)),
                _ => bail!("unexpected argument `{arg}`\n{}", Self::USAGE),
            }
        }

        match rom_path {
            Some(rom_path) => Ok(Self { debug, rom_path }),
            None => bail!("missing ROM path\n{}", Self::USAGE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Args> {
        Args::parse(args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn rom_only() {
        assert_eq!(
            parse(&["pong.ch8"]).unwrap(),
            Args {
                debug: false,
                rom_path: "pong.ch8".into()
            }
        );
    }

    #[test]
    fn debug_flag_before_rom() {
        let args = parse(&["-d", "games/tetris.ch8"]).unwrap();
        assert!(args.debug);
        assert_eq!(args.rom_path, PathBuf::from("games/tetris.ch8"));
    }

    #[test]
    fn missing_rom_is_an_error() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["-d"]).is_err());
    }

    #[test]
    fn extra_argument_is_an_error() {
        let err = parse(&["a.ch8", "b.ch8"]).unwrap_err();
        assert!(err.to_string().contains("b.ch8"));
    }

    #[test]
    fn default_config_runs_at_sixty_hertz() {
        let config = Config::default();
        assert_eq!(config.cycle_rate_hz, 60);
        assert_eq!(config.foreground, Color32::WHITE);
        assert!(!config.debug);
    }
}
