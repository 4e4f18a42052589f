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

use std::io::Write;

use crossterm::event::Event;

use crate::{ByteEventDecoder, CompletionEngine, LineState, ReadlineError, ReadlineEvent,
            SafeHistory};

/// Invoked synchronously with the outcome of every finished line in callback
/// mode.
pub type AcceptCallback = dyn FnMut(ReadlineEvent) + Send;

/// One incrementally-driven edit session. An external event loop hands over
/// keystrokes one at a time; each feed advances the state machine exactly
/// one step and returns without blocking. When a line finishes (accept,
/// interrupt, or end of input) the accept callback fires, then the session
/// resets onto a fresh buffer and repaints the prompt, ready for the next
/// line.
pub struct CallbackSession {
    pub line_state: LineState,
    on_accept: Box<AcceptCallback>,
    decoder: ByteEventDecoder,
}

impl std::fmt::Debug for CallbackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackSession")
            .field("prompt", &self.line_state.prompt)
            .finish()
    }
}

impl CallbackSession {
    pub fn new(prompt: String, term_size: (u16, u16), on_accept: Box<AcceptCallback>) -> Self {
        Self {
            line_state: LineState::new(prompt, term_size),
            on_accept,
            decoder: ByteEventDecoder::new(),
        }
    }

    /// Advance the session by one raw input byte. Partial UTF-8 sequences
    /// are held back until complete; bytes with no key mapping are ignored.
    pub fn feed_byte(
        &mut self,
        byte: u8,
        term: &mut dyn Write,
        safe_history: &SafeHistory,
        completion: &mut CompletionEngine,
        auto_add_history: bool,
    ) -> Result<(), ReadlineError> {
        match self.decoder.decode(byte) {
            Some(event) => {
                self.feed_event(event, term, safe_history, completion, auto_add_history)
            }
            None => Ok(()),
        }
    }

    /// Advance the session by one key event.
    #[allow(clippy::unwrap_in_result)] /* lock().unwrap() on the shared history */
    pub fn feed_event(
        &mut self,
        event: Event,
        term: &mut dyn Write,
        safe_history: &SafeHistory,
        completion: &mut CompletionEngine,
        auto_add_history: bool,
    ) -> Result<(), ReadlineError> {
        let maybe_finished = self
            .line_state
            .apply_event(event, term, safe_history, completion)?;

        if let Some(readline_event) = maybe_finished {
            tracing::debug!("callback session finished a line: {}", readline_event);
            if auto_add_history {
                if let ReadlineEvent::Line(line) = &readline_event {
                    safe_history.lock().unwrap().add_entry(line);
                }
            }
            (self.on_accept)(readline_event);

            // The finish handlers leave the buffer empty; repaint the
            // prompt so the next line can be typed right away.
            self.line_state.render(term)?;
        }

        term.flush()?;
        Ok(())
    }

    /// Repaint prompt + buffer without consuming input. Used when external
    /// output has interleaved with the input line.
    pub fn redisplay(&mut self, term: &mut dyn Write) -> Result<(), ReadlineError> {
        self.line_state.clear_and_render(term)?;
        term.flush()?;
        Ok(())
    }
}
