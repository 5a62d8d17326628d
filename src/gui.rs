use chip8::graphics::{Buffer, HEIGHT, WIDTH};
use eframe::egui::{self, Color32, ColorImage, Context, Key, TextureHandle, TextureOptions, Ui};
use egui::{Pos2, Rect};

use crate::config::Config;

/// Key mapping from a standard english keyboard to Chip8 key codes.
pub static KEY_MAP: [(Key, u8); 16] = [
    (Key::Num1, 0x1),
    (Key::Num2, 0x2),
    (Key::Num3, 0x3),
    (Key::Num4, 0xC),
    (Key::Q, 0x4),
    (Key::W, 0x5),
    (Key::E, 0x6),
    (Key::R, 0xD),
    (Key::A, 0x7),
    (Key::S, 0x8),
    (Key::D, 0x9),
    (Key::F, 0xE),
    (Key::Z, 0xA),
    (Key::X, 0x0),
    (Key::C, 0xB),
    (Key::V, 0xF),
];

/// Reads the keyboard and returns the state of every mapped key as
/// `(key_code, pressed)` pairs. Empty while a widget has keyboard focus.
pub fn key_updates(ctx: &Context) -> Vec<(u8, bool)> {
    let mut update = Vec::new();
    if !ctx.wants_keyboard_input() {
        ctx.input(|input| {
            for (key, key_code) in KEY_MAP {
                update.push((key_code, input.keys_down.contains(&key)));
            }
        });
    }
    update
}

/// Converts the display buffer into an image using the configured colors.
#[must_use]
pub fn screen_image(buffer: &Buffer, config: &Config) -> ColorImage {
    ColorImage {
        size: [WIDTH, HEIGHT],
        pixels: buffer
            .pixels()
            .map(|(_, _, on)| {
                if on {
                    config.foreground
                } else {
                    config.background
                }
            })
            .collect(),
    }
}

/// Paints the Chip8 display. The texture is only re-uploaded when the
/// buffer reports a change or the colors change.
#[derive(Default)]
pub struct Screen {
    texture: Option<TextureHandle>,
}

impl Screen {
    /// Takes the buffer's redraw flag and refreshes the texture if needed.
    pub fn sync(&mut self, ctx: &Context, buffer: &mut Buffer, config: &Config) {
        let redraw = buffer.take_redraw();
        if let Some(texture) = &mut self.texture {
            if redraw {
                texture.set(screen_image(buffer, config), TextureOptions::NEAREST);
            }
        } else {
            self.texture = Some(ctx.load_texture(
                "chip8-screen",
                screen_image(buffer, config),
                TextureOptions::NEAREST,
            ));
        }
    }

    /// Forces the next [`Screen::sync`] to rebuild the texture.
    pub fn invalidate(&mut self) {
        self.texture = None;
    }

    /// Draw the Chip8 screen onto a `Ui` object, scaled to the rest of the
    /// available size.
    pub fn show(&self, ui: &mut Ui) {
        egui::Frame::canvas(ui.style()).show(ui, |ui| {
            let sense = egui::Sense::focusable_noninteractive();
            let (rect, _) = ui.allocate_exact_size(ui.available_size(), sense);
            if let Some(texture) = &self.texture {
                let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                ui.painter().image(texture.id(), rect, uv, Color32::WHITE);
            }
        });
    }
}

/// A window for editing the [`Config`]. Returns `true` if anything changed.
pub fn config_window(ctx: &Context, open: &mut bool, config: &mut Config) -> bool {
    let mut changed = false;
    egui::Window::new("Config").open(open).show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.label("Foreground");
            changed |= ui.color_edit_button_srgba(&mut config.foreground).changed();
        });
        ui.horizontal(|ui| {
            ui.label("Background");
            changed |= ui.color_edit_button_srgba(&mut config.background).changed();
        });
        ui.horizontal(|ui| {
            ui.label("Cycle rate (Hz)");
            changed |= ui
                .add(egui::DragValue::new(&mut config.cycle_rate_hz).clamp_range(1..=2000))
                .changed();
        });
        ui.small("The cycle rate applies after a reset.");
    });
    changed
}
