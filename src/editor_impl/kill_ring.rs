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

/// Holds the most recently killed text. Each kill overwrites the slot; yank
/// inserts a copy and leaves the slot untouched, so repeated yanks paste the
/// same text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct KillRing {
    last_cut: String,
}

impl KillRing {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.last_cut.is_empty() }

    /// Record killed text. Empty kills (a no-op delete at a buffer
    /// boundary) do not clobber the slot.
    pub fn set(&mut self, text: String) {
        if !text.is_empty() {
            self.last_cut = text;
        }
    }

    /// Text to re-insert at the cursor, if any kill happened yet.
    pub fn yank(&self) -> Option<&str> {
        if self.last_cut.is_empty() {
            None
        } else {
            Some(&self.last_cut)
        }
    }
}
