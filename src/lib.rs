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

//! The `lineedit` library reads a line of input from the terminal while the
//! user edits it in place: cursor motion, kill & yank, persistent command
//! history, and programmable tab-completion. It supports two execution
//! models that share one editing engine:
//!
//! 1. A blocking [`LineEditor::read_line`] call that runs the whole edit
//!    session to completion and returns a [`ReadlineEvent`].
//! 2. A callback mode ([`LineEditor::install_callback`]) where an external
//!    event loop feeds keystrokes one at a time via
//!    [`LineEditor::feed_byte`] / [`LineEditor::feed_event`], and a
//!    caller-supplied closure receives each finished line. Feeding never
//!    blocks.
//!
//! # Input editing behavior
//!
//! While entering text, the user can edit and navigate through the current
//! input line with the following key bindings:
//!
//! - Works on all platforms supported by `crossterm`.
//! - Full Unicode support (including grapheme clusters).
//! - Left, Right: Move cursor left/right.
//! - Up, Down: Scroll through input history; Down past the newest entry
//!   restores the line that was being typed before navigation began.
//! - Ctrl-W: Erase the word before the cursor (saved in the kill ring).
//! - Ctrl-U: Erase the input before the cursor (saved in the kill ring).
//! - Ctrl-K: Erase the input after the cursor (saved in the kill ring).
//! - Ctrl-Y: Yank (re-insert) the most recently erased text.
//! - Ctrl-L: Clear the screen.
//! - Ctrl-Left / Ctrl-Right: Move to previous/next word.
//! - Home: Jump to the start of the line.
//!     - When the "emacs" feature (on by default) is enabled, Ctrl-A has
//!       the same effect.
//! - End: Jump to the end of the line.
//!     - When the "emacs" feature (on by default) is enabled, Ctrl-E has
//!       the same effect.
//! - Tab: Trigger completion of the word under the cursor; a second Tab
//!   prints the candidate list.
//! - Ctrl-C: Cancel the line (`Interrupted`).
//! - Ctrl-D: On an empty line, end of input (`Eof`); otherwise delete the
//!   character at the cursor.
//!
//! # How to use this crate
//!
//! ```no_run
//! use lineedit::{LineEditor, ReadlineEvent};
//! use miette::IntoDiagnostic as _;
//!
//! fn main() -> miette::Result<()> {
//!     let mut editor = LineEditor::new();
//!     editor.set_auto_add_history(true);
//!     loop {
//!         match editor.read_line("> ").into_diagnostic()? {
//!             ReadlineEvent::Line(line) => println!("got: {line}"),
//!             ReadlineEvent::Eof | ReadlineEvent::Interrupted => break,
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Completion is supplied by registering a generator closure; it receives a
//! [`CompletionRequest`] (buffer snapshot plus the byte range of the token
//! under the cursor) and returns candidate strings:
//!
//! ```
//! use lineedit::LineEditor;
//!
//! let mut editor = LineEditor::new();
//! editor.register_completion_generator(|request| {
//!     let commands = ["help", "history", "halt"];
//!     Ok(commands
//!         .iter()
//!         .filter(|c| c.starts_with(request.word()))
//!         .map(|c| c.to_string())
//!         .collect())
//! });
//! ```

// Attach sources.
pub mod editor_impl;
pub mod public_api;

#[cfg(test)]
pub mod test_fixtures;

// Re-export the public API.
pub use editor_impl::*;
pub use public_api::*;

// Type aliases.
use std::sync::Arc;

pub type StdMutex<T> = std::sync::Mutex<T>;

pub type SendRawTerminal = dyn std::io::Write + Send;
pub type SafeRawTerminal = Arc<StdMutex<SendRawTerminal>>;

pub type SafeHistory = Arc<StdMutex<History>>;

// Constants.
pub const HISTORY_SIZE_MAX: usize = 1_000;

/// Characters that delimit the token handed to the completion generator.
/// This is the classic readline "basic word break" set: whitespace plus the
/// shell metacharacters.
pub const DEFAULT_WORD_BREAK_CHARS: &[char] = &[
    ' ', '\t', '\n', '"', '\\', '\'', '`', '@', '$', '>', '<', '=', ';', '|', '&', '{', '(',
];
