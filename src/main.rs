#![warn(rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use anyhow::Context;
use env_logger::{Builder, Env, Target};

fn main() -> anyhow::Result<()> {
    let args = chip8_ui::Args::parse(std::env::args().skip(1))?;

    // Log to stdout. `RUST_LOG` wins over `-d`.
    let default_filter = if args.debug { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.target(Target::Stdout);
    builder.init();

    let rom = std::fs::read(&args.rom_path)
        .with_context(|| format!("Failed to read ROM from {}", args.rom_path.display()))?;
    log::info!("Loaded {} bytes from {}", rom.len(), args.rom_path.display());

    let native_options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(640.0, 340.0)),
        ..Default::default()
    };
    let debug = args.debug;
    eframe::run_native(
        "Chip8",
        native_options,
        Box::new(move |cc| Box::new(chip8_ui::App::new(cc, rom, debug))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run window: {e}"))
}
