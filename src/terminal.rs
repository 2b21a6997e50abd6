use std::{
    cell::RefCell,
    io::{self, stdout, Stdout, Write},
    rc::Rc,
    time::{Duration, Instant},
};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{self, Stylize},
    terminal,
};
use log::debug;
use vip8_core::{
    keyboard::KEY_WAIT_POLL, Chip8Display, Chip8Keyboard, Framebuffer, KeyState, Quit, KEY_COUNT,
};

/// Left-hand side of a qwerty keyboard onto the COSMAC hex keypad.
const KEYMAP: [(char, u8); KEY_COUNT] = [
    ('x', 0x0),
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('z', 0xA),
    ('c', 0xB),
    ('4', 0xC),
    ('r', 0xD),
    ('f', 0xE),
    ('v', 0xF),
];

/// Without release events a key counts as held this long after its last press.
const KEY_HOLD: Duration = Duration::from_millis(150);

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

fn chip8_key(c: char) -> Option<u8> {
    let c = c.to_ascii_lowercase();
    KEYMAP
        .iter()
        .find(|(mapped, _)| *mapped == c)
        .map(|&(_, key)| key)
}

/// Key state shared by the display (which pumps events while presenting)
/// and the keyboard.
#[derive(Debug, Default)]
struct Input {
    pressed: [Option<Instant>; KEY_COUNT],
    releases_reported: bool,
    quit: bool,
}

impl Input {
    fn record(&mut self, key: KeyEvent) {
        let ctrl_c =
            key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc || ctrl_c {
            self.quit = true;
            return;
        }
        let KeyCode::Char(c) = key.code else {
            return;
        };
        let Some(chip8_key) = chip8_key(c) else {
            debug!("no keypad mapping for {c:?}");
            return;
        };
        self.pressed[chip8_key as usize] = match key.kind {
            KeyEventKind::Release => None,
            _ => Some(Instant::now()),
        };
    }

    fn is_down(&self, key: u8) -> bool {
        match self.pressed.get(key as usize) {
            Some(Some(pressed_at)) => self.releases_reported || pressed_at.elapsed() < KEY_HOLD,
            _ => false,
        }
    }

    /// Lowest key pressed (or repeated) after `since`.
    fn pressed_since(&self, since: Instant) -> Option<u8> {
        (0..KEY_COUNT as u8).find(|&key| {
            matches!(self.pressed[key as usize], Some(pressed_at) if pressed_at >= since)
        })
    }

    fn pump(&mut self, timeout: Duration) -> io::Result<()> {
        let mut wait = timeout;
        while event::poll(wait)? {
            wait = Duration::ZERO;
            if let Event::Key(key) = event::read()? {
                self.record(key);
            }
        }
        Ok(())
    }
}

/// Renders the framebuffer with two block characters per pixel.
pub struct TerminalDisplay {
    stdout: Stdout,
    frame: Framebuffer,
    input: Rc<RefCell<Input>>,
    last_frame: Instant,
}

pub struct TerminalKeyboard {
    input: Rc<RefCell<Input>>,
}

/// Puts the terminal in raw mode on the alternate screen. Everything is
/// restored when the display is dropped.
pub fn open() -> io::Result<(TerminalDisplay, TerminalKeyboard)> {
    terminal::enable_raw_mode()?;
    let input = Rc::new(RefCell::new(Input::default()));
    let mut display = TerminalDisplay {
        stdout: stdout(),
        frame: Framebuffer::default(),
        input: Rc::clone(&input),
        last_frame: Instant::now(),
    };
    execute!(
        display.stdout,
        terminal::EnterAlternateScreen,
        terminal::Clear(terminal::ClearType::All),
        cursor::Hide
    )?;
    if terminal::supports_keyboard_enhancement().unwrap_or(false) {
        execute!(
            display.stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
        input.borrow_mut().releases_reported = true;
    }
    debug!(
        "terminal ready, key releases reported: {}",
        input.borrow().releases_reported
    );
    Ok((display, TerminalKeyboard { input }))
}

impl TerminalDisplay {
    fn render(&mut self) -> io::Result<()> {
        for (row, pixels) in self.frame.rows().enumerate() {
            let line: String = pixels
                .iter()
                .map(|&lit| if lit { "██" } else { "  " })
                .collect();
            queue!(
                self.stdout,
                cursor::MoveTo(0, row as u16),
                style::PrintStyledContent(line.yellow())
            )?;
        }
        self.stdout.flush()
    }
}

impl Chip8Display for TerminalDisplay {
    fn clear(&mut self) -> io::Result<()> {
        self.frame.clear();
        Ok(())
    }

    fn draw(&mut self, x: u8, y: u8, sprite: &[u8]) -> io::Result<bool> {
        Ok(self.frame.draw(x, y, sprite))
    }

    fn present_and_poll(&mut self) -> io::Result<Option<Quit>> {
        {
            let mut input = self.input.borrow_mut();
            input.pump(Duration::ZERO)?;
            if input.quit {
                return Ok(Some(Quit));
            }
        }
        if self.last_frame.elapsed() >= FRAME_INTERVAL && self.frame.take_dirty() {
            self.render()?;
            self.last_frame = Instant::now();
        }
        Ok(None)
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        if self.input.borrow().releases_reported {
            let _ = execute!(self.stdout, PopKeyboardEnhancementFlags);
        }
        let _ = execute!(self.stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Chip8Keyboard for TerminalKeyboard {
    fn update_keystates(&mut self, max_duration: Duration) -> io::Result<()> {
        self.input.borrow_mut().pump(max_duration)
    }

    fn is_key_down(&self, key: u8) -> bool {
        self.input.borrow().is_down(key)
    }

    /// Without release events a hold running out is not a real release, so
    /// only fresh presses end the wait.
    fn wait_for_change<D: Chip8Display>(
        &mut self,
        prior: &KeyState,
        display: &mut D,
    ) -> io::Result<Option<u8>>
    where
        Self: Sized,
    {
        let started = Instant::now();
        loop {
            let changed = if self.input.borrow().releases_reported {
                self.snapshot().first_difference(prior)
            } else {
                self.input.borrow().pressed_since(started)
            };
            if changed.is_some() {
                return Ok(changed);
            }
            if display.present_and_poll()?.is_some() {
                return Ok(None);
            }
            self.update_keystates(KEY_WAIT_POLL)?;
        }
    }
}
