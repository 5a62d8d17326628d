use std::time::Instant;

use chip8::Chip8;
use eframe::egui::{self, Key};

use crate::config::Config;
use crate::gui::{self, Screen};

/// The desktop frontend. Owns the machine, feeds it keyboard state, drives
/// its clock from the repaint loop and paints its display.
pub struct App {
    chip8: Chip8,
    config: Config,
    screen: Screen,
    rom: Vec<u8>,
    paused: bool,
    config_open: bool,
    /// The last error reported by the machine, shown in the status bar.
    status: Option<String>,
}

impl eframe::App for App {
    /// Called by the framework to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.config);
    }

    /// Called each time the UI needs repainting. Runs every machine cycle
    /// that fell due since the last frame, then asks to be woken when the
    /// next one is due.
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        for (key_code, pressed) in gui::key_updates(ctx) {
            // Mapped key codes are always in range; the core logs anything else.
            let _ = self.chip8.update_key_state(key_code, pressed);
        }
        self.handle_shortcuts(ctx, frame);

        let now = Instant::now();
        if !self.paused && !self.chip8.is_halted() {
            self.run_cycles(now);
        }

        if gui::config_window(ctx, &mut self.config_open, &mut self.config) {
            self.screen.invalidate();
        }
        self.screen.sync(ctx, &mut self.chip8.bus.graphics, &self.config);

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status_text());
                if self.config.debug {
                    let cpu = &self.chip8.processor;
                    ui.monospace(format!("PC {:#05X}  I {:#06X}", cpu.pc, cpu.i));
                    if let Some(trace) = cpu.instructions.front() {
                        ui.monospace(trace.instruction.to_string());
                    }
                }
                if self.chip8.sound_active() {
                    ui.label("♪");
                }
            });
        });
        egui::CentralPanel::default()
            .frame(egui::Frame::default().inner_margin(egui::vec2(0.0, 0.0)))
            .show(ctx, |ui| self.screen.show(ui));

        ctx.request_repaint_after(self.chip8.bus.clock.until_next_tick(now));
    }
}

impl App {
    /// Creates a new [`App`] instance running `rom`.
    ///
    /// Called once before the first frame. Restores the [`Config`] saved by
    /// the previous run, if any.
    #[must_use]
    pub fn new(cc: &eframe::CreationContext<'_>, rom: Vec<u8>, debug: bool) -> Self {
        let mut config: Config = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        config.debug = debug;
        Self::with_config(config, rom)
    }

    /// Creates a new [`App`] from an explicit [`Config`].
    #[must_use]
    pub fn with_config(config: Config, rom: Vec<u8>) -> Self {
        let mut app = Self {
            chip8: Chip8::with_cycle_rate(config.cycle_rate_hz),
            config,
            screen: Screen::default(),
            rom,
            paused: false,
            config_open: false,
            status: None,
        };
        app.load();
        app
    }

    /// Loads the ROM into the current machine, recording any error.
    fn load(&mut self) {
        self.status = None;
        if let Err(e) = self.chip8.load_rom(&self.rom) {
            log::error!("Failed to load ROM: {e}");
            self.chip8.request_stop();
            self.status = Some(e.to_string());
        }
    }

    /// Builds a fresh machine with the configured cycle rate and reloads the ROM.
    fn restart(&mut self) {
        self.chip8 = Chip8::with_cycle_rate(self.config.cycle_rate_hz);
        self.paused = false;
        self.load();
        log::info!("Restarted at {} Hz", self.config.cycle_rate_hz);
    }

    /// The repaint rate is bounded by the display refresh, so a frame may
    /// owe the machine several cycles.
    fn run_cycles(&mut self, now: Instant) {
        if let Err(e) = self.chip8.step_due(now) {
            self.status = Some(e.to_string());
        }
    }

    /// `Space` pauses, `Backspace` restarts, `F1` toggles the config window,
    /// `Escape` stops the machine and closes the window.
    fn handle_shortcuts(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (pause, restart, config, quit) = ctx.input(|input| {
            (
                input.key_pressed(Key::Space),
                input.key_pressed(Key::Backspace),
                input.key_pressed(Key::F1),
                input.key_pressed(Key::Escape),
            )
        });
        if pause {
            self.paused = !self.paused;
        }
        if restart {
            self.restart();
        }
        if config {
            self.config_open = !self.config_open;
        }
        if quit {
            self.chip8.request_stop();
            frame.close();
        }
    }

    fn status_text(&self) -> String {
        match &self.status {
            Some(error) => error.clone(),
            None if self.paused => "Paused".to_owned(),
            None if self.chip8.bus.input.waiting() => "Waiting for key".to_owned(),
            None => format!("Running at {} Hz", self.config.cycle_rate_hz),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chip8::Tick;

    use super::*;

    #[test]
    fn oversized_rom_is_reported_and_stops_the_machine() {
        let mut app = App::with_config(Config::default(), vec![0; 4000]);
        assert!(app.status.as_deref().unwrap().contains("too large"));
        app.run_cycles(Instant::now());
        assert_eq!(app.chip8.tick().unwrap(), Tick::Stopped);
    }

    #[test]
    fn unknown_opcode_shows_in_status() {
        let mut app = App::with_config(Config::default(), vec![0xFF, 0xFF]);
        assert!(app.status.is_none());
        app.run_cycles(Instant::now());
        assert!(app.chip8.is_halted());
        assert!(app.status_text().starts_with("Unknown opcode 0xFFFF"));
    }

    #[test]
    fn restart_applies_cycle_rate() {
        let mut app = App::with_config(Config::default(), vec![0x12, 0x00]);
        app.config.cycle_rate_hz = 500;
        app.restart();
        assert_eq!(app.chip8.bus.clock.interval(), Duration::from_millis(2));
        assert_eq!(app.status_text(), "Running at 500 Hz");
    }

    #[test]
    fn rates_above_the_frame_rate_are_honoured() {
        let config = Config {
            cycle_rate_hz: 500,
            ..Config::default()
        };
        // ADD V0, 1 repeated; 17 ms is one frame at 60 Hz.
        let mut app = App::with_config(config, [0x70, 0x01].repeat(64));
        let start = Instant::now();
        app.run_cycles(start);
        app.run_cycles(start + Duration::from_millis(17));
        assert_eq!(app.chip8.processor.v[0], 9);
        app.run_cycles(start + Duration::from_millis(34));
        assert_eq!(app.chip8.processor.v[0], 18);
        assert!(app.status.is_none());
    }
}
