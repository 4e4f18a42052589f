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

use std::{collections::VecDeque, fs, io, path::Path};

use crate::HISTORY_SIZE_MAX;

/// Which way history navigation or search walks: `Older` towards the first
/// line ever entered, `Newer` back towards the line being typed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum HistoryDirection {
    Older,
    Newer,
}

/// Ordered log of accepted lines. Entries are kept newest-first;
/// [`Self::list`] returns them in insertion order.
///
/// Navigation state lives here too: `current_position` is `None` while the
/// user is on the "new editing line", and the line they were typing is
/// snapshotted into `pending_line` on the first step into history so that
/// walking all the way back down restores it.
#[derive(Debug)]
pub struct History {
    pub entries: VecDeque<String>,
    /// Upper bound on `entries`; `0` means unbounded.
    pub max_size: usize,
    /// Skip an entry identical to the newest one.
    pub dedup_consecutive: bool,
    current_position: Option<usize>,
    pending_line: Option<String>,
}

impl Default for History {
    fn default() -> Self {
        Self {
            entries: VecDeque::default(),
            max_size: HISTORY_SIZE_MAX,
            dedup_consecutive: true,
            current_position: None,
            pending_line: None,
        }
    }
}

impl History {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Add an accepted line. Empty lines are never recorded; a line equal to
    /// the newest entry is skipped when `dedup_consecutive` is set. The
    /// oldest entry is evicted once the bound is exceeded.
    pub fn add_entry(&mut self, line: &str) {
        self.reset_navigation();

        if line.is_empty() {
            return;
        }
        if self.dedup_consecutive && self.entries.front().map(String::as_str) == Some(line) {
            return;
        }

        self.push_raw(line.to_string());
    }

    /// Append without the empty/dedup filtering. Used when replaying a
    /// persisted log, so that save → load round-trips exactly; only the
    /// size bound applies.
    fn push_raw(&mut self, line: String) {
        self.entries.push_front(line);
        if self.max_size > 0 && self.entries.len() > self.max_size {
            self.entries.pop_back();
        }
    }

    /// Step towards older entries. The first step away from the new editing
    /// line snapshots `pending_line`. Stepping past the oldest entry is a
    /// no-op returning `None`.
    pub fn navigate_older(&mut self, pending_line: &str) -> Option<&str> {
        match self.current_position {
            Some(index) => {
                if index + 1 < self.entries.len() {
                    self.current_position = Some(index + 1);
                    Some(&self.entries[index + 1])
                } else {
                    None
                }
            }
            None => {
                if self.entries.is_empty() {
                    None
                } else {
                    self.pending_line = Some(pending_line.to_string());
                    self.current_position = Some(0);
                    Some(&self.entries[0])
                }
            }
        }
    }

    /// Step towards newer entries. Stepping past the newest entry lands back
    /// on the new editing line and returns the restored snapshot; stepping
    /// while already there is a no-op returning `None`.
    pub fn navigate_newer(&mut self) -> Option<String> {
        match self.current_position? {
            0 => {
                self.current_position = None;
                Some(self.pending_line.take().unwrap_or_default())
            }
            index => {
                self.current_position = Some(index - 1);
                Some(self.entries[index - 1].clone())
            }
        }
    }

    /// Back to the new editing line, dropping any snapshot.
    pub fn reset_navigation(&mut self) {
        self.current_position = None;
        self.pending_line = None;
    }

    /// Linear substring scan from the current navigation position. A hit
    /// moves the position onto the matching entry.
    pub fn search_substring(
        &mut self,
        pattern: &str,
        direction: HistoryDirection,
    ) -> Option<&str> {
        match direction {
            HistoryDirection::Older => {
                let start = match self.current_position {
                    Some(index) => index + 1,
                    None => 0,
                };
                for index in start..self.entries.len() {
                    if self.entries[index].contains(pattern) {
                        self.current_position = Some(index);
                        return Some(&self.entries[index]);
                    }
                }
                None
            }
            HistoryDirection::Newer => {
                // Nothing is newer than the new editing line.
                let mut index = self.current_position?;
                while index > 0 {
                    index -= 1;
                    if self.entries[index].contains(pattern) {
                        self.current_position = Some(index);
                        return Some(&self.entries[index]);
                    }
                }
                None
            }
        }
    }

    /// Snapshot of all entries in insertion order (oldest first).
    pub fn list(&self) -> Vec<String> {
        self.entries.iter().rev().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.reset_navigation();
    }

    /// Append the entries stored in `path`. The whole file is parsed before
    /// anything is appended, so a read failure leaves the store unchanged.
    /// Malformed lines (a dangling trailing escape) are skipped with a
    /// warning; the count of lines actually appended is returned.
    pub fn load_from_file(&mut self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path)?;

        let mut parsed = Vec::new();
        for (line_number, raw) in content.lines().enumerate() {
            match unescape_history_line(raw) {
                Some(line) => parsed.push(line),
                None => {
                    tracing::warn!(
                        "skipping malformed history line {} in {}",
                        line_number + 1,
                        path.display()
                    );
                }
            }
        }

        let appended = parsed.len();
        for line in parsed {
            self.push_raw(line);
        }
        tracing::debug!("loaded {} history entries from {}", appended, path.display());
        Ok(appended)
    }

    /// Write all entries to `path`, oldest first, one escaped entry per
    /// line.
    pub fn save_to_file(&self, path: &Path) -> io::Result<()> {
        let mut content = String::new();
        for entry in self.entries.iter().rev() {
            content.push_str(&escape_history_line(entry));
            content.push('\n');
        }
        fs::write(path, content)?;
        tracing::debug!(
            "saved {} history entries to {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }
}

/// `\` becomes `\\`, an embedded newline becomes `\n`; everything else is
/// written verbatim.
fn escape_history_line(line: &str) -> String {
    let mut escaped = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Inverse of [`escape_history_line`]. Unknown escape pairs are preserved
/// verbatim so logs written by newer versions still load; `None` only for a
/// dangling `\` at the end of the record.
fn unescape_history_line(raw: &str) -> Option<String> {
    let mut line = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            line.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => line.push('\n'),
            Some('\\') => line.push('\\'),
            Some(other) => {
                line.push('\\');
                line.push(other);
            }
            None => return None,
        }
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_entry() {
        let mut history = History::new();
        history.max_size = 2;
        history.add_entry("test1");
        assert_eq!(history.entries.front(), Some(&"test1".to_string()));

        history.add_entry("");
        assert_eq!(history.entries.len(), 1);

        // Consecutive duplicate is skipped (default policy).
        history.add_entry("test1");
        assert_eq!(history.entries.len(), 1);

        history.add_entry("test2");
        assert_eq!(history.entries.front(), Some(&"test2".to_string()));
        assert_eq!(history.entries.len(), 2);

        // Oldest entry is evicted first.
        history.add_entry("test3");
        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.list(), vec!["test2".to_string(), "test3".to_string()]);
    }

    #[test]
    fn test_defaults() {
        let history = History::new();
        assert_eq!(history.max_size, HISTORY_SIZE_MAX);
        assert!(history.dedup_consecutive);
    }

    #[test]
    fn test_dedup_configurable() {
        let mut history = History::new();
        history.dedup_consecutive = false;
        history.add_entry("same");
        history.add_entry("same");
        assert_eq!(history.entries.len(), 2);
    }

    #[test]
    fn test_unbounded_when_max_size_zero() {
        let mut history = History::new();
        history.max_size = 0;
        for i in 0..2_000 {
            history.add_entry(&format!("line {i}"));
        }
        assert_eq!(history.entries.len(), 2_000);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut history = History::new();
        history.add_entry("first");
        history.add_entry("second");
        history.add_entry("third");
        assert_eq!(
            history.list(),
            vec!["first".to_string(), "second".to_string(), "third".to_string()]
        );
    }

    #[test]
    fn test_navigation_restores_pending_line() {
        let mut history = History::new();
        history.add_entry("one");
        history.add_entry("two");

        assert_eq!(history.navigate_older("draft"), Some("two"));
        assert_eq!(history.navigate_older("ignored"), Some("one"));
        // Past the oldest entry: no-op.
        assert_eq!(history.navigate_older("ignored"), None);

        assert_eq!(history.navigate_newer(), Some("two".to_string()));
        assert_eq!(history.navigate_newer(), Some("draft".to_string()));
        // Already on the new editing line: no-op.
        assert_eq!(history.navigate_newer(), None);
    }

    #[test]
    fn test_navigate_newer_without_prior_older_is_no_op() {
        let mut history = History::new();
        history.add_entry("one");
        assert_eq!(history.navigate_newer(), None);
    }

    #[test]
    fn test_add_entry_resets_navigation() {
        let mut history = History::new();
        history.add_entry("one");
        assert_eq!(history.navigate_older("draft"), Some("one"));
        history.add_entry("two");
        // Navigation starts over from the newest entry.
        assert_eq!(history.navigate_older(""), Some("two"));
    }

    #[test]
    fn test_search_substring() {
        let mut history = History::new();
        history.add_entry("git status");
        history.add_entry("cargo build");
        history.add_entry("git push");

        assert_eq!(
            history.search_substring("git", HistoryDirection::Older),
            Some("git push")
        );
        assert_eq!(
            history.search_substring("git", HistoryDirection::Older),
            Some("git status")
        );
        assert_eq!(history.search_substring("git", HistoryDirection::Older), None);

        // A failed search leaves the cursor on "git status"; scanning back
        // towards newer entries finds "cargo build".
        assert_eq!(
            history.search_substring("cargo", HistoryDirection::Newer),
            Some("cargo build")
        );
        assert_eq!(history.search_substring("zsh", HistoryDirection::Newer), None);
    }

    #[test]
    fn test_search_newer_from_new_line_is_none() {
        let mut history = History::new();
        history.add_entry("anything");
        assert_eq!(history.search_substring("any", HistoryDirection::Newer), None);
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        history.add_entry("one");
        history.clear();
        assert!(history.entries.is_empty());
        assert_eq!(history.navigate_newer(), None);
    }

    #[test]
    fn test_escape_round_trip() {
        for line in ["plain", "has\nnewline", "back\\slash", "", "both\\\nmixed"] {
            let escaped = escape_history_line(line);
            assert!(!escaped.contains('\n'));
            assert_eq!(unescape_history_line(&escaped), Some(line.to_string()));
        }
    }

    #[test]
    fn test_unescape_preserves_unknown_escapes() {
        assert_eq!(unescape_history_line("abc\\xdef"), Some("abc\\xdef".to_string()));
    }

    #[test]
    fn test_unescape_rejects_dangling_escape() {
        assert_eq!(unescape_history_line("broken\\"), None);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");

        let mut history = History::new();
        history.dedup_consecutive = false;
        history.push_raw("simple".into());
        history.push_raw("multi\nline\nentry".into());
        history.push_raw(String::new());
        history.push_raw("trailing\\backslash".into());
        history.save_to_file(&path).unwrap();

        let mut restored = History::new();
        let count = restored.load_from_file(&path).unwrap();
        assert_eq!(count, 4);
        assert_eq!(restored.list(), history.list());
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        std::fs::write(&path, "good one\nbad\\\nanother good\n").unwrap();

        let mut history = History::new();
        let count = history.load_from_file(&path).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            history.list(),
            vec!["good one".to_string(), "another good".to_string()]
        );
    }

    #[test]
    fn test_load_missing_file_leaves_store_unchanged() {
        let mut history = History::new();
        history.add_entry("existing");

        let result = history.load_from_file(Path::new("/nonexistent/history.txt"));
        assert!(result.is_err());
        assert_eq!(history.list(), vec!["existing".to_string()]);
    }

    #[test]
    fn test_load_respects_bound() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        std::fs::write(&path, "a\nb\nc\nd\n").unwrap();

        let mut history = History::new();
        history.max_size = 2;
        let count = history.load_from_file(&path).unwrap();
        assert_eq!(count, 4);
        assert_eq!(history.list(), vec!["c".to_string(), "d".to_string()]);
    }
}
