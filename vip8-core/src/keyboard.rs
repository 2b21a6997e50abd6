use std::{io, time::Duration};

use crate::display::Chip8Display;

pub const KEY_COUNT: usize = 16;

/// How long each iteration of a blocking key wait may spend in `update_keystates`.
pub const KEY_WAIT_POLL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState([bool; KEY_COUNT]);

impl KeyState {
    pub fn is_down(&self, key: u8) -> bool {
        self.0.get(key as usize).copied().unwrap_or(false)
    }

    pub fn set(&mut self, key: u8, down: bool) {
        if let Some(slot) = self.0.get_mut(key as usize) {
            *slot = down;
        }
    }

    /// Lowest key whose state differs from `other`.
    pub fn first_difference(&self, other: &KeyState) -> Option<u8> {
        (0..KEY_COUNT as u8).find(|&key| self.is_down(key) != other.is_down(key))
    }
}

pub trait Chip8Keyboard {
    /// Pull pending input, waiting at most `max_duration` for some to arrive.
    fn update_keystates(&mut self, max_duration: Duration) -> io::Result<()>;

    fn is_key_down(&self, key: u8) -> bool;

    fn snapshot(&self) -> KeyState {
        let mut state = KeyState::default();
        for key in 0..KEY_COUNT as u8 {
            state.set(key, self.is_key_down(key));
        }
        state
    }

    /// Block until some key differs from `prior`, presenting `display` on
    /// every iteration. Either a press or a release ends the wait. Returns
    /// `None` if the display asked to quit first.
    fn wait_for_change<D: Chip8Display>(
        &mut self,
        prior: &KeyState,
        display: &mut D,
    ) -> io::Result<Option<u8>>
    where
        Self: Sized,
    {
        loop {
            if let Some(key) = self.snapshot().first_difference(prior) {
                return Ok(Some(key));
            }
            if display.present_and_poll()?.is_some() {
                return Ok(None);
            }
            self.update_keystates(KEY_WAIT_POLL)?;
        }
    }
}

impl Chip8Keyboard for KeyState {
    fn update_keystates(&mut self, _max_duration: Duration) -> io::Result<()> {
        Ok(())
    }

    fn is_key_down(&self, key: u8) -> bool {
        self.is_down(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Framebuffer, Quit};

    #[test]
    fn test_out_of_range_keys_are_up() {
        let mut keys = KeyState::default();
        keys.set(0x20, true);
        assert!(!keys.is_down(0x20));
        assert_eq!(keys, KeyState::default());
    }

    #[test]
    fn test_first_difference_is_lowest_key() {
        let prior = KeyState::default();
        let mut now = prior;
        now.set(0xC, true);
        now.set(0x3, true);
        assert_eq!(now.first_difference(&prior), Some(0x3));
        assert_eq!(prior.first_difference(&prior), None);
    }

    /// Presses then releases keys, one step per `update_keystates` call.
    struct Script {
        state: KeyState,
        steps: Vec<(u8, bool)>,
    }

    impl Chip8Keyboard for Script {
        fn update_keystates(&mut self, _max_duration: Duration) -> io::Result<()> {
            if !self.steps.is_empty() {
                let (key, down) = self.steps.remove(0);
                self.state.set(key, down);
            }
            Ok(())
        }

        fn is_key_down(&self, key: u8) -> bool {
            self.state.is_down(key)
        }
    }

    #[test]
    fn test_wait_sees_press() -> io::Result<()> {
        let mut keypad = Script {
            state: KeyState::default(),
            steps: vec![(0x7, true)],
        };
        let prior = keypad.snapshot();
        let mut display = Framebuffer::default();
        assert_eq!(keypad.wait_for_change(&prior, &mut display)?, Some(0x7));
        Ok(())
    }

    #[test]
    fn test_wait_sees_release() -> io::Result<()> {
        let mut held = KeyState::default();
        held.set(0xA, true);
        let mut keypad = Script {
            state: held,
            steps: vec![(0xA, false)],
        };
        let prior = keypad.snapshot();
        let mut display = Framebuffer::default();
        assert_eq!(keypad.wait_for_change(&prior, &mut display)?, Some(0xA));
        Ok(())
    }

    struct Closing;

    impl Chip8Display for Closing {
        fn clear(&mut self) -> io::Result<()> {
            Ok(())
        }
        fn draw(&mut self, _x: u8, _y: u8, _sprite: &[u8]) -> io::Result<bool> {
            Ok(false)
        }
        fn present_and_poll(&mut self) -> io::Result<Option<Quit>> {
            Ok(Some(Quit))
        }
    }

    #[test]
    fn test_wait_ends_on_quit() -> io::Result<()> {
        let mut keypad = KeyState::default();
        let prior = keypad;
        assert_eq!(keypad.wait_for_change(&prior, &mut Closing)?, None);
        Ok(())
    }
}
