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

use std::io::{self, Write};

use crossterm::{
    cursor,
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{Clear, ClearType::*},
    QueueableCommand,
};
use thiserror::Error;
use unicode_width::UnicodeWidthStr;

use crate::{longest_common_prefix, CompletionEngine, CompletionError, EditBuffer, KillRing,
            SafeHistory};

/// Error returned from the editing paths. Such errors generally require
/// specific procedures to recover from.
#[derive(Debug, Error)]
pub enum ReadlineError {
    /// An internal I/O error occurred.
    #[error(transparent)]
    IO(#[from] io::Error),

    /// A completion generator failed. Only surfaced where completion is
    /// invoked directly; the keystroke path logs it and continues.
    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// [`crate::LineEditor::install_callback`] was called while a callback
    /// session was already installed.
    #[error("a callback session is already installed")]
    AlreadyInstalled,

    /// A callback operation was invoked with no session installed.
    #[error("no callback session is installed")]
    NotInstalled,
}

/// Outcome of an edit session. `Eof` and `Interrupted` are the "no line"
/// outcomes; an accepted empty line is `Line(String::new())`, which is
/// deliberately distinct.
#[derive(Debug, PartialEq, Eq, Clone, strum_macros::Display)]
pub enum ReadlineEvent {
    /// The user entered a line of text.
    Line(String),

    /// The user pressed Ctrl-D on an empty line, or the input stream
    /// closed.
    Eof,

    /// The user pressed Ctrl-C.
    Interrupted,
}

/// One edit session: the buffer being typed, its kill ring, and everything
/// needed to paint the prompt + line onto the terminal, wrap-aware.
///
/// Each keystroke goes through [`Self::apply_event`], which mutates the
/// session and queues a redraw onto the supplied terminal. Redraws are
/// idempotent: the line is always cleared from its start and repainted, so
/// a redundant render cannot corrupt the display.
pub struct LineState {
    pub buffer: EditBuffer,
    pub kill_ring: KillRing,

    pub prompt: String,

    /// Column of the terminal cursor (prompt width + width left of the
    /// buffer cursor).
    pub current_column: u16,

    /// After pressing enter, should we print the line just submitted?
    pub should_print_line_on_enter: bool,

    /// After pressing control_c should we print the line just cancelled?
    pub should_print_line_on_control_c: bool,

    pub last_line_length: usize,
    pub last_line_completed: bool,

    pub term_size: (u16, u16),

    /// Candidates remembered from a completion that inserted (at most) a
    /// common prefix; a second Tab prints them. Any other key clears this.
    pending_candidates: Option<Vec<String>>,
}

impl LineState {
    pub fn new(prompt: String, term_size: (u16, u16)) -> Self {
        let current_column = UnicodeWidthStr::width(prompt.as_str()) as u16;
        Self {
            prompt,
            term_size,
            current_column,
            should_print_line_on_enter: true,
            should_print_line_on_control_c: true,
            buffer: EditBuffer::new(),
            kill_ring: KillRing::new(),
            last_line_length: 0,
            last_line_completed: true,
            pending_candidates: None,
        }
    }

    /// Gets the number of lines wrapped.
    fn line_height(&self, pos: u16) -> u16 { pos / self.term_size.0 }

    /// Move from a position on the line to the start.
    fn move_to_beginning(&self, term: &mut dyn Write, from: u16) -> io::Result<()> {
        let move_up = self.line_height(from.saturating_sub(1));
        term.queue(cursor::MoveToColumn(0))?;
        if move_up != 0 {
            term.queue(cursor::MoveUp(move_up))?;
        }
        Ok(())
    }

    /// Move from the start of the line to some position.
    fn move_from_beginning(&self, term: &mut dyn Write, to: u16) -> io::Result<()> {
        let line_height = self.line_height(to.saturating_sub(1));
        let line_remaining_len = to % self.term_size.0;
        if line_height != 0 {
            term.queue(cursor::MoveDown(line_height))?;
        }
        term.queue(cursor::MoveRight(line_remaining_len))?;

        Ok(())
    }

    fn prompt_width(&self) -> usize { UnicodeWidthStr::width(self.prompt.as_str()) }

    /// Recompute [`Self::current_column`] after any buffer mutation.
    fn update_column(&mut self) {
        self.current_column = (self.prompt_width() + self.buffer.width_up_to_cursor()) as u16;
    }

    fn reset_cursor(&self, term: &mut dyn Write) -> io::Result<()> {
        self.move_to_beginning(term, self.current_column)
    }

    fn set_cursor(&self, term: &mut dyn Write) -> io::Result<()> {
        self.move_from_beginning(term, self.current_column)
    }

    /// Clear current line.
    pub fn clear(&self, term: &mut dyn Write) -> io::Result<()> {
        self.move_to_beginning(term, self.current_column)?;
        term.queue(Clear(FromCursorDown))?;
        Ok(())
    }

    /// Render line.
    pub fn render(&self, term: &mut dyn Write) -> io::Result<()> {
        write!(term, "{}{}", self.prompt, self.buffer.as_str())?;
        let line_len = self.prompt_width() + self.buffer.width();
        self.move_to_beginning(term, line_len as u16)?;
        self.move_from_beginning(term, self.current_column)?;
        Ok(())
    }

    /// Clear line and render.
    pub fn clear_and_render(&self, term: &mut dyn Write) -> io::Result<()> {
        self.clear(term)?;
        self.render(term)?;
        Ok(())
    }

    /// Print concurrent output above the prompt line: clear the line, write
    /// the data (newlines doubling as carriage returns), then re-render the
    /// prompt and buffer underneath.
    pub fn print_data(&mut self, data: &[u8], term: &mut dyn Write) -> Result<(), ReadlineError> {
        self.clear(term)?;

        // If last written data was not newline, restore the cursor
        if !self.last_line_completed {
            term.queue(cursor::MoveUp(1))?
                .queue(cursor::MoveToColumn(0))?
                .queue(cursor::MoveRight(self.last_line_length as u16))?;
        }

        // Write data in a way that newlines also act as carriage returns
        for line in data.split_inclusive(|b| *b == b'\n') {
            term.write_all(line)?;
            term.queue(cursor::MoveToColumn(0))?;
        }

        self.last_line_completed = data.ends_with(b"\n");

        if !self.last_line_completed {
            self.last_line_length += data.len();
            // Make sure that last_line_length wraps around when doing multiple writes
            if self.last_line_length >= self.term_size.0 as usize {
                self.last_line_length %= self.term_size.0 as usize;
                writeln!(term)?;
            }
            writeln!(term)?;
        } else {
            self.last_line_length = 0;
        }

        term.queue(cursor::MoveToColumn(0))?;

        self.render(term)?;
        Ok(())
    }

    pub fn print(&mut self, string: &str, term: &mut dyn Write) -> Result<(), ReadlineError> {
        self.print_data(string.as_bytes(), term)?;
        Ok(())
    }

    fn bell(&self, term: &mut dyn Write) -> io::Result<()> {
        term.write_all(b"\x07")
    }

    /// Move the line out of the session and leave the terminal cursor on a
    /// fresh row, optionally echoing `prompt + line` first.
    fn finish_line(&mut self, term: &mut dyn Write, echo: bool) -> Result<String, ReadlineError> {
        self.clear(term)?;
        let line = self.buffer.take();
        self.update_column();
        if echo {
            write!(term, "{}{}\r\n", self.prompt, line)?;
        }
        Ok(line)
    }

    /// Replace the byte range `[start_byte, end_byte)` of the buffer with
    /// `replacement`, leaving the cursor at its end.
    fn replace_token(
        &mut self,
        term: &mut dyn Write,
        start_byte: usize,
        end_byte: usize,
        replacement: &str,
    ) -> Result<(), ReadlineError> {
        let start = self.buffer.grapheme_index_at_byte(start_byte);
        let end = self.buffer.grapheme_index_at_byte(end_byte);
        self.clear(term)?;
        self.buffer.delete_range(start, end);
        self.buffer.set_cursor(start);
        self.buffer.insert_str(replacement);
        self.update_column();
        self.render(term)?;
        Ok(())
    }

    /// Tab: run the completion protocol against the token under the cursor.
    fn handle_completion_trigger(
        &mut self,
        term: &mut dyn Write,
        completion: &mut CompletionEngine,
    ) -> Result<(), ReadlineError> {
        // Second consecutive Tab: expose the remembered candidate list,
        // buffer untouched.
        if let Some(candidates) = self.pending_candidates.take() {
            let listing = candidates.join("  ");
            self.print(&format!("{listing}\n"), term)?;
            return Ok(());
        }

        let cursor_byte = self.buffer.byte_offset_at(self.buffer.cursor());
        let request = completion.build_request(self.buffer.as_str(), cursor_byte);

        let candidates = match completion.generate(&request) {
            Ok(candidates) => candidates,
            Err(error) => {
                tracing::warn!(%error, "completion generator failed, continuing without candidates");
                self.bell(term)?;
                return Ok(());
            }
        };

        match candidates.len() {
            0 => self.bell(term)?,
            1 => {
                let only = candidates[0].clone();
                self.replace_token(term, request.word_start, request.word_end, &only)?;
            }
            _ => {
                let prefix = longest_common_prefix(&candidates);
                let token_len = request.word_end - request.word_start;
                if prefix.len() > token_len {
                    self.replace_token(term, request.word_start, request.word_end, &prefix)?;
                }
                self.pending_candidates = Some(candidates);
            }
        }
        Ok(())
    }

    /// Dispatch one keystroke. Returns `Ok(Some(event))` when the session
    /// finished (accepted or cancelled), `Ok(None)` for ordinary edits.
    #[allow(clippy::unwrap_in_result)] /* lock().unwrap() on the shared history */
    pub fn apply_event(
        &mut self,
        event: Event,
        term: &mut dyn Write,
        safe_history: &SafeHistory,
        completion: &mut CompletionEngine,
    ) -> Result<Option<ReadlineEvent>, ReadlineError> {
        // Completion cycling only survives back-to-back Tabs.
        if !matches!(
            event,
            Event::Key(KeyEvent {
                code: KeyCode::Tab,
                ..
            })
        ) {
            self.pending_candidates = None;
        }

        match event {
            // Control Keys
            Event::Key(KeyEvent {
                code,
                modifiers: KeyModifiers::CONTROL,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                // End of transmission (CTRL-D): end of input on an empty
                // line, forward delete otherwise.
                KeyCode::Char('d') => {
                    if self.buffer.is_empty() {
                        writeln!(term)?;
                        self.clear(term)?;
                        safe_history.lock().unwrap().reset_navigation();
                        return Ok(Some(ReadlineEvent::Eof));
                    }
                    self.clear(term)?;
                    self.buffer.delete_at_cursor();
                    self.update_column();
                    self.render(term)?;
                }
                // End of text (CTRL-C)
                KeyCode::Char('c') => {
                    let echo = self.should_print_line_on_control_c;
                    self.finish_line(term, echo)?;
                    safe_history.lock().unwrap().reset_navigation();
                    return Ok(Some(ReadlineEvent::Interrupted));
                }
                // Clear all
                KeyCode::Char('l') => {
                    term.queue(Clear(All))?.queue(cursor::MoveTo(0, 0))?;
                    self.clear_and_render(term)?;
                }
                // Kill to start
                KeyCode::Char('u') => {
                    self.clear(term)?;
                    let removed = self.buffer.delete_range(0, self.buffer.cursor());
                    self.kill_ring.set(removed);
                    self.update_column();
                    self.render(term)?;
                }
                // Kill to end
                KeyCode::Char('k') => {
                    self.clear(term)?;
                    let removed = self
                        .buffer
                        .delete_range(self.buffer.cursor(), self.buffer.grapheme_count());
                    self.kill_ring.set(removed);
                    self.update_column();
                    self.render(term)?;
                }
                // Kill previous word
                KeyCode::Char('w') => {
                    self.clear(term)?;
                    let start = self.buffer.prev_word_start();
                    let removed = self.buffer.delete_range(start, self.buffer.cursor());
                    self.kill_ring.set(removed);
                    self.update_column();
                    self.render(term)?;
                }
                // Yank the last kill
                KeyCode::Char('y') => {
                    if let Some(text) = self.kill_ring.yank().map(str::to_string) {
                        self.clear(term)?;
                        self.buffer.insert_str(&text);
                        self.update_column();
                        self.render(term)?;
                    } else {
                        self.bell(term)?;
                    }
                }
                // Move to beginning
                #[cfg(feature = "emacs")]
                KeyCode::Char('a') => {
                    self.reset_cursor(term)?;
                    self.buffer.move_to_start();
                    self.update_column();
                    self.set_cursor(term)?;
                }
                // Move to end
                #[cfg(feature = "emacs")]
                KeyCode::Char('e') => {
                    self.reset_cursor(term)?;
                    self.buffer.move_to_end();
                    self.update_column();
                    self.set_cursor(term)?;
                }
                // Move cursor left to previous word
                KeyCode::Left => {
                    self.reset_cursor(term)?;
                    let target = self.buffer.prev_word_start();
                    self.buffer.set_cursor(target);
                    self.update_column();
                    self.set_cursor(term)?;
                }
                // Move cursor right to next word
                KeyCode::Right => {
                    self.reset_cursor(term)?;
                    let target = self.buffer.next_word_start();
                    self.buffer.set_cursor(target);
                    self.update_column();
                    self.set_cursor(term)?;
                }
                _ => {}
            },
            // Other Modifiers (None, Shift, Control+Alt)
            // All other modifiers must be considered because the match expression cannot
            // match combined KeyModifiers. Control+Alt is used to reach certain special
            // symbols on a lot of international keyboard layouts.
            Event::Key(KeyEvent {
                code,
                modifiers: _,
                kind: KeyEventKind::Press,
                ..
            }) => match code {
                KeyCode::Enter => {
                    let echo = self.should_print_line_on_enter;
                    let line = self.finish_line(term, echo)?;
                    safe_history.lock().unwrap().reset_navigation();
                    return Ok(Some(ReadlineEvent::Line(line)));
                }
                KeyCode::Backspace => {
                    self.clear(term)?;
                    self.buffer.delete_before_cursor();
                    self.update_column();
                    self.render(term)?;
                }
                KeyCode::Delete => {
                    self.clear(term)?;
                    self.buffer.delete_at_cursor();
                    self.update_column();
                    self.render(term)?;
                }
                KeyCode::Left => {
                    self.reset_cursor(term)?;
                    self.buffer.move_cursor(-1);
                    self.update_column();
                    self.set_cursor(term)?;
                }
                KeyCode::Right => {
                    self.reset_cursor(term)?;
                    self.buffer.move_cursor(1);
                    self.update_column();
                    self.set_cursor(term)?;
                }
                KeyCode::Home => {
                    self.reset_cursor(term)?;
                    self.buffer.move_to_start();
                    self.update_column();
                    self.set_cursor(term)?;
                }
                KeyCode::End => {
                    self.reset_cursor(term)?;
                    self.buffer.move_to_end();
                    self.update_column();
                    self.set_cursor(term)?;
                }
                // Recall an older history entry, replacing the line.
                KeyCode::Up => {
                    let recalled = safe_history
                        .lock()
                        .unwrap()
                        .navigate_older(self.buffer.as_str())
                        .map(str::to_string);
                    if let Some(line) = recalled {
                        self.clear(term)?;
                        self.buffer.set_text(&line);
                        self.update_column();
                        self.render(term)?;
                    }
                }
                // Recall a newer history entry (or the pending line), replacing the line.
                KeyCode::Down => {
                    let recalled = safe_history.lock().unwrap().navigate_newer();
                    if let Some(line) = recalled {
                        self.clear(term)?;
                        self.buffer.set_text(&line);
                        self.update_column();
                        self.render(term)?;
                    }
                }
                KeyCode::Tab => {
                    self.handle_completion_trigger(term, completion)?;
                }
                // Add character to line and output
                KeyCode::Char(c) => {
                    self.clear(term)?;
                    self.buffer.insert_char(c);
                    self.update_column();
                    self.render(term)?;
                }
                _ => {}
            },
            Event::Resize(x, y) => {
                self.term_size = (x, y);
                self.clear_and_render(term)?;
            }
            _ => {}
        }
        Ok(None)
    }
}
