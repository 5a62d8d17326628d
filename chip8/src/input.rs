//! This module provides the input latch for the Chip8 emulator. It keeps
//! track of the state of all 16 keys, the most recently pressed key, and
//! any key press requested by a program through `LD Vx, K`.

use crate::error::{Error, Result};

/// Number of keys on the Chip8 keypad.
pub const KEY_COUNT: usize = 16;

/// A response for a requested key press by the processor.
///
/// Contains the key code of the pressed key and the register where
/// the processor should store it in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyRequestResponse {
    /// The key code of the pressed key.
    pub key_code: u8,
    /// The register where the processor should store the key code.
    pub register: usize,
}

/// Input latch for the [`super::Chip8`].
#[derive(Default)]
pub struct Input {
    /// The current state of all 16 keys.
    state: [bool; KEY_COUNT],
    /// The key that most recently went from released to pressed.
    last_pressed: Option<u8>,
    /// Whether the processor is blocked waiting for a key press.
    waiting: bool,
    /// The register where the processor should store the key code for the next input event.
    request_reg: usize,
    /// Whether a key went down since the current wait started.
    pressed_while_waiting: bool,
}

impl Input {
    /// Creates a new [`Input`] instance with every key released.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the input state of the given key code. A transition to pressed
    /// records the key as the last pressed one and marks a pending key
    /// request as answered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKey`] if `key_code` is not in `0x0..=0xF`.
    pub fn update(&mut self, key_code: u8, pressed: bool) -> Result<()> {
        let key = self
            .state
            .get_mut(usize::from(key_code))
            .ok_or(Error::InvalidKey(key_code))?;
        if *key == pressed {
            return Ok(());
        }
        *key = pressed;

        if pressed {
            self.last_pressed = Some(key_code);
            self.pressed_while_waiting |= self.waiting;
        }
        Ok(())
    }

    /// Starts waiting for a key press to be stored in `register`. Presses
    /// observed before this call do not satisfy the request.
    pub fn request_key_press(&mut self, register: usize) {
        self.waiting = true;
        self.request_reg = register;
        self.pressed_while_waiting = false;
    }

    /// Takes the answer to a pending key request, ending the wait. The answer
    /// is the key pressed most recently, not the first one pressed during the
    /// wait.
    ///
    /// This will be `None` while no key has been pressed since the request.
    pub fn take_request_response(&mut self) -> Option<KeyRequestResponse> {
        if !self.waiting || !self.pressed_while_waiting {
            return None;
        }
        let key_code = self.last_pressed?;
        self.waiting = false;
        self.pressed_while_waiting = false;
        Some(KeyRequestResponse {
            key_code,
            register: self.request_reg,
        })
    }

    /// Returns whether the processor is currently waiting for a key press.
    #[must_use]
    pub fn waiting(&self) -> bool {
        self.waiting
    }

    /// Returns whether the given key is currently pressed. Only the low
    /// nibble of `key_code` is used.
    #[must_use]
    pub fn is_key_pressed(&self, key_code: u8) -> bool {
        self.state[usize::from(key_code & 0x0F)]
    }

    /// The key that most recently transitioned to pressed.
    #[must_use]
    pub fn last_pressed(&self) -> Option<u8> {
        self.last_pressed
    }

    /// The pressed state of every key, indexed by key code.
    #[must_use]
    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_tracks_pressed_state() {
        let mut input = Input::new();
        input.update(0xA, true).unwrap();
        assert!(input.is_key_pressed(0xA));
        assert_eq!(input.last_pressed(), Some(0xA));
        input.update(0xA, false).unwrap();
        assert!(!input.is_key_pressed(0xA));
        assert_eq!(input.last_pressed(), Some(0xA));
    }

    #[test]
    fn out_of_range_key_is_rejected() {
        let mut input = Input::new();
        assert!(matches!(input.update(16, true), Err(Error::InvalidKey(16))));
        assert_eq!(input.keys(), &[false; KEY_COUNT]);
    }

    #[test]
    fn press_before_request_does_not_answer_it() {
        let mut input = Input::new();
        input.update(0x3, true).unwrap();
        input.request_key_press(5);
        assert_eq!(input.take_request_response(), None);
        assert!(input.waiting());

        // Held key repeats are not new presses.
        input.update(0x3, true).unwrap();
        assert_eq!(input.take_request_response(), None);
    }

    #[test]
    fn press_while_waiting_answers_once_with_last_key() {
        let mut input = Input::new();
        input.request_key_press(7);
        input.update(0xB, true).unwrap();
        input.update(0xC, true).unwrap();
        assert_eq!(
            input.take_request_response(),
            Some(KeyRequestResponse {
                key_code: 0xC,
                register: 7
            })
        );
        assert!(!input.waiting());
        assert_eq!(input.take_request_response(), None);
        assert_eq!(input.last_pressed(), Some(0xC));
    }

    #[test]
    fn released_key_still_counts_but_later_press_wins() {
        let mut input = Input::new();
        input.request_key_press(5);
        input.update(0x3, true).unwrap();
        input.update(0x3, false).unwrap();
        input.update(0xB, true).unwrap();
        let response = input.take_request_response().unwrap();
        assert_eq!(response.key_code, 0xB);
        assert_eq!(response.register, 5);
    }
}
