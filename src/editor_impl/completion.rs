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

use thiserror::Error;

use crate::DEFAULT_WORD_BREAK_CHARS;

/// A completion generator failed. Never fatal: the keystroke path logs it
/// and carries on with an empty candidate list.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("completion generator failed: {0}")]
pub struct CompletionError(pub String);

/// Snapshot handed to the completion generator: the whole line plus the byte
/// range of the token being completed (`word_end` is the cursor; completion
/// acts on the token prefix left of it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub buffer: String,
    pub word_start: usize,
    pub word_end: usize,
}

impl CompletionRequest {
    /// The token under the cursor.
    pub fn word(&self) -> &str { &self.buffer[self.word_start..self.word_end] }
}

/// Caller-supplied candidate producer. Registering a new one replaces the
/// previous one; there is exactly one slot.
pub type CompletionGenerator =
    dyn FnMut(&CompletionRequest) -> Result<Vec<String>, CompletionError> + Send;

pub struct CompletionEngine {
    word_break_chars: Vec<char>,
    generator: Option<Box<CompletionGenerator>>,
}

impl std::fmt::Debug for CompletionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionEngine")
            .field("word_break_chars", &self.word_break_chars)
            .field("generator", &self.generator.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Default for CompletionEngine {
    fn default() -> Self {
        Self {
            word_break_chars: DEFAULT_WORD_BREAK_CHARS.to_vec(),
            generator: None,
        }
    }
}

impl CompletionEngine {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    pub fn set_word_break_chars(&mut self, chars: &[char]) {
        self.word_break_chars = chars.to_vec();
    }

    /// Install `generator`, replacing any previous one.
    pub fn register_generator<F>(&mut self, generator: F)
    where
        F: FnMut(&CompletionRequest) -> Result<Vec<String>, CompletionError> + Send + 'static,
    {
        self.generator = Some(Box::new(generator));
    }

    pub fn has_generator(&self) -> bool { self.generator.is_some() }

    /// Byte range of the token under the cursor: scan left from
    /// `cursor_byte` to the nearest word-break character.
    pub fn word_bounds(&self, buffer: &str, cursor_byte: usize) -> (usize, usize) {
        let start = buffer[..cursor_byte]
            .char_indices()
            .rev()
            .find(|(_, c)| self.word_break_chars.contains(c))
            .map_or(0, |(index, c)| index + c.len_utf8());
        (start, cursor_byte)
    }

    pub fn build_request(&self, buffer: &str, cursor_byte: usize) -> CompletionRequest {
        let (word_start, word_end) = self.word_bounds(buffer, cursor_byte);
        CompletionRequest {
            buffer: buffer.to_string(),
            word_start,
            word_end,
        }
    }

    /// Invoke the registered generator. No generator means no candidates.
    pub fn generate(
        &mut self,
        request: &CompletionRequest,
    ) -> Result<Vec<String>, CompletionError> {
        match self.generator.as_mut() {
            Some(generator) => generator(request),
            None => Ok(Vec::new()),
        }
    }
}

/// Longest common prefix of all candidates, empty when there are none.
pub fn longest_common_prefix(candidates: &[String]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let mut prefix = first.clone();
    for candidate in &candidates[1..] {
        while !candidate.starts_with(&prefix) {
            prefix.pop();
        }
        if prefix.is_empty() {
            break;
        }
    }
    prefix
}
