/*
 *   Copyright (c) 2025 The lineedit authors
 *   All rights reserved.
 *
 *   Licensed under the Apache License, Version 2.0 (the "License");
 *   you may not use this file except in compliance with the License.
 *   You may obtain a copy of the License at
 *
 *   http://www.apache.org/licenses/LICENSE-2.0
 *
 *   Unless required by applicable law or agreed to in writing, software
 *   distributed under the License is distributed on an "AS IS" BASIS,
 *   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *   See the License for the specific language governing permissions and
 *   limitations under the License.
 */

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

/// Blocking source of keystrokes for the [`crate::LineEditor::read_line`]
/// path. `None` means the input stream is closed.
pub trait KeyPressReader {
    fn read_key_press(&mut self) -> Option<Event>;
}

#[derive(Debug)]
pub struct CrosstermKeyPressReader;

impl KeyPressReader for CrosstermKeyPressReader {
    fn read_key_press(&mut self) -> Option<Event> {
        crossterm::event::read().ok()
    }
}

/// Replays a fixed sequence of events, then reports the stream as closed.
#[derive(Debug)]
pub struct TestVecKeyPressReader {
    pub key_press_vec: Vec<Event>,
    pub index: usize,
}

impl TestVecKeyPressReader {
    pub fn from_events(key_press_vec: Vec<Event>) -> Self {
        Self {
            key_press_vec,
            index: 0,
        }
    }
}

impl KeyPressReader for TestVecKeyPressReader {
    fn read_key_press(&mut self) -> Option<Event> {
        let event = self.key_press_vec.get(self.index).cloned()?;
        self.index += 1;
        Some(event)
    }
}

/// Incremental decoder for the callback feed path, where an external event
/// loop hands over one raw byte at a time. Multi-byte UTF-8 sequences
/// accumulate until a complete scalar arrives; control bytes map onto the
/// key events the state machine understands.
#[derive(Debug, Default)]
pub struct ByteEventDecoder {
    partial_utf8: Vec<u8>,
}

impl ByteEventDecoder {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Feed one byte. Returns the decoded event, or `None` while a
    /// multi-byte sequence is still incomplete (or the byte has no key
    /// mapping).
    pub fn decode(&mut self, byte: u8) -> Option<Event> {
        if !self.partial_utf8.is_empty() || byte >= 0x80 {
            self.partial_utf8.push(byte);
            return match std::str::from_utf8(&self.partial_utf8) {
                Ok(s) => {
                    let c = s.chars().next();
                    self.partial_utf8.clear();
                    c.map(|c| plain_key(KeyCode::Char(c)))
                }
                // error_len() == None means the sequence is merely
                // incomplete; keep accumulating.
                Err(e) if e.error_len().is_none() => None,
                Err(_) => {
                    tracing::warn!("dropping invalid utf-8 input sequence");
                    self.partial_utf8.clear();
                    None
                }
            };
        }
        decode_ascii_byte(byte)
    }
}

fn plain_key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn control_key(c: char) -> Event {
    Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
}

fn decode_ascii_byte(byte: u8) -> Option<Event> {
    match byte {
        b'\r' | b'\n' => Some(plain_key(KeyCode::Enter)),
        b'\t' => Some(plain_key(KeyCode::Tab)),
        0x7f | 0x08 => Some(plain_key(KeyCode::Backspace)),
        0x01 => Some(control_key('a')),
        0x03 => Some(control_key('c')),
        0x04 => Some(control_key('d')),
        0x05 => Some(control_key('e')),
        0x0b => Some(control_key('k')),
        0x0c => Some(control_key('l')),
        0x15 => Some(control_key('u')),
        0x17 => Some(control_key('w')),
        0x19 => Some(control_key('y')),
        b if b >= 0x20 => Some(plain_key(KeyCode::Char(b as char))),
        // Remaining control bytes (ESC introducers included) have no
        // single-byte key mapping.
        _ => None,
    }
}
