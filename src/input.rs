//! Line based key events.
//!
//! Each line is `+K` to press or `-K` to release key `K`, or `quit` / `esc`
//! to stop the machine. How `K` names a key depends on the `Keymap`.
//! Anything else is logged and skipped.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::context::SharedKeys;

/// How key names in events map onto the 16 keys
#[derive(clap::ValueEnum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Keymap {
    /// A single hex digit, `0`-`F`
    #[default]
    Hex,
    /// Left side of a QWERTY keyboard, laid out like the keypad:
    ///
    /// ```text
    /// 1 2 3 4      1 2 3 C
    /// Q W E R      4 5 6 D
    /// A S D F  =>  7 8 9 E
    /// Z X C V      A 0 B F
    /// ```
    Qwerty,
}

const QWERTY: [char; 16] = [
    'x', '1', '2', '3', 'q', 'w', 'e', 'a', 's', 'd', 'z', 'c', '4', 'r', 'f', 'v',
];

impl Keymap {
    pub fn key(self, name: &str) -> Option<u8> {
        let name = name.trim();
        let mut chars = name.chars();
        let c = chars.next()?.to_ascii_lowercase();
        if chars.next().is_some() {
            return None;
        }
        match self {
            Keymap::Hex => c.to_digit(16).map(|key| key as u8),
            Keymap::Qwerty => QWERTY.iter().position(|&k| k == c).map(|key| key as u8),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Key { key: u8, pressed: bool },
    Quit,
}

/// Hex digit naming one of the 16 keys
pub fn parse_key(s: &str) -> Result<u8, String> {
    Keymap::Hex
        .key(s)
        .ok_or_else(|| format!("`{}` is not a key, expected 0-F", s.trim()))
}

pub fn parse_event(line: &str, keymap: Keymap) -> Option<Event> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("esc") {
        return Some(Event::Quit);
    }
    let pressed = match line.chars().next()? {
        '+' => true,
        '-' => false,
        _ => return None,
    };
    keymap
        .key(&line[1..])
        .map(|key| Event::Key { key, pressed })
}

/// Apply every event from `reader` to `keys` until end of input or a quit
pub fn feed<R: BufRead>(reader: R, keys: &SharedKeys, keymap: Keymap) -> io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_event(&line, keymap) {
            Some(Event::Key { key, pressed }) => {
                debug!("key {:X} {}", key, if pressed { "down" } else { "up" });
                keys.set(key, pressed);
            }
            Some(Event::Quit) => {
                info!("quit requested");
                keys.request_quit();
                break;
            }
            None => warn!("ignoring input line `{}`", line),
        }
    }
    Ok(())
}

/// Read key events from stdin on a background thread
pub fn spawn_stdin_reader(keys: SharedKeys, keymap: Keymap) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("stdin-keys".into())
        .spawn(move || {
            if let Err(err) = feed(io::stdin().lock(), &keys, keymap) {
                warn!("stdin closed: {}", err);
            }
        })
}
