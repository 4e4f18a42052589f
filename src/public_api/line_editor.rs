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

use std::{io::Write, path::Path, sync::Arc};

use crossterm::{
    event::Event,
    terminal::{self, disable_raw_mode, enable_raw_mode},
};

use crate::{AcceptCallback, CallbackSession, CompletionEngine, CompletionError,
            CompletionRequest, CrosstermKeyPressReader, History, KeyPressReader, LineState,
            ReadlineError, ReadlineEvent, SafeHistory, SafeRawTerminal, StdMutex};

/// The line-editing engine. One instance owns the shared [`History`], the
/// completion generator slot, the output terminal, and the single
/// callback-session slot; every public operation of the crate hangs off it.
///
/// # Blocking vs. callback mode
///
/// [`Self::read_line`] runs an edit session to completion in the calling
/// thread. Alternatively [`Self::install_callback`] opens a persistent
/// session that an external event loop advances with [`Self::feed_byte`] /
/// [`Self::feed_event`]; neither feed call ever blocks, and the installed
/// callback receives each finished line synchronously during the feed.
/// At most one callback session can be installed at a time.
pub struct LineEditor {
    safe_raw_terminal: SafeRawTerminal,
    safe_history: SafeHistory,
    completion: CompletionEngine,
    auto_add_history: bool,
    print_line_on_enter: bool,
    print_line_on_control_c: bool,
    /// Toggle raw mode around interactive sessions. Off when writing to an
    /// injected (non-tty) terminal.
    manage_raw_mode: bool,
    callback_session: Option<CallbackSession>,
}

impl Default for LineEditor {
    fn default() -> Self { Self::new() }
}

impl std::fmt::Debug for LineEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineEditor")
            .field("auto_add_history", &self.auto_add_history)
            .field("manage_raw_mode", &self.manage_raw_mode)
            .field("callback_session", &self.callback_session)
            .finish()
    }
}

impl LineEditor {
    /// An editor writing to `stdout`, managing raw mode itself.
    #[must_use]
    pub fn new() -> Self {
        let safe_raw_terminal: SafeRawTerminal = Arc::new(StdMutex::new(std::io::stdout()));
        let mut editor = Self::with_output(safe_raw_terminal);
        editor.manage_raw_mode = true;
        editor
    }

    /// An editor writing to the supplied terminal. Raw mode is left to the
    /// caller; this is also the dependency-injection seam used by tests.
    pub fn with_output(safe_raw_terminal: SafeRawTerminal) -> Self {
        Self {
            safe_raw_terminal,
            safe_history: Arc::new(StdMutex::new(History::new())),
            completion: CompletionEngine::new(),
            auto_add_history: false,
            print_line_on_enter: true,
            print_line_on_control_c: true,
            manage_raw_mode: false,
            callback_session: None,
        }
    }

    fn new_line_state(&self, prompt: &str) -> LineState {
        let mut line_state = LineState::new(prompt.to_string(), Self::term_size());
        line_state.should_print_line_on_enter = self.print_line_on_enter;
        line_state.should_print_line_on_control_c = self.print_line_on_control_c;
        line_state
    }

    fn term_size() -> (u16, u16) { terminal::size().unwrap_or((80, 24)) }

    // ------------------------------------------------------------------
    // Blocking path.
    // ------------------------------------------------------------------

    /// Read one line, blocking until the user accepts it (`Line`), cancels
    /// it (`Interrupted`), or input ends (`Eof`). A closed input stream
    /// yields `Eof`, never an empty `Line`.
    pub fn read_line(&mut self, prompt: &str) -> Result<ReadlineEvent, ReadlineError> {
        let mut reader = CrosstermKeyPressReader;
        self.read_line_with(prompt, &mut reader)
    }

    /// [`Self::read_line`] with an injected keystroke source.
    pub fn read_line_with(
        &mut self,
        prompt: &str,
        reader: &mut dyn KeyPressReader,
    ) -> Result<ReadlineEvent, ReadlineError> {
        if self.callback_session.is_some() {
            return Err(ReadlineError::AlreadyInstalled);
        }

        if self.manage_raw_mode {
            enable_raw_mode()?;
        }
        let result = self.read_line_loop(prompt, reader);
        if self.manage_raw_mode {
            let _ = disable_raw_mode();
        }
        result
    }

    #[allow(clippy::unwrap_in_result)] /* lock().unwrap() on the output terminal */
    fn read_line_loop(
        &mut self,
        prompt: &str,
        reader: &mut dyn KeyPressReader,
    ) -> Result<ReadlineEvent, ReadlineError> {
        let mut line_state = self.new_line_state(prompt);

        {
            let mut guard = self.safe_raw_terminal.lock().unwrap();
            line_state.render(&mut *guard)?;
            guard.flush()?;
        }

        loop {
            // Block on the next keystroke with the terminal lock released.
            let maybe_event = reader.read_key_press();

            let mut guard = self.safe_raw_terminal.lock().unwrap();
            let Some(event) = maybe_event else {
                guard.flush()?;
                tracing::debug!("input stream closed, ending read with Eof");
                return Ok(ReadlineEvent::Eof);
            };

            let maybe_finished = line_state.apply_event(
                event,
                &mut *guard,
                &self.safe_history,
                &mut self.completion,
            )?;
            guard.flush()?;

            if let Some(readline_event) = maybe_finished {
                if self.auto_add_history {
                    if let ReadlineEvent::Line(line) = &readline_event {
                        self.safe_history.lock().unwrap().add_entry(line);
                    }
                }
                return Ok(readline_event);
            }
        }
    }

    // ------------------------------------------------------------------
    // Callback path.
    // ------------------------------------------------------------------

    /// Install the callback session: render `prompt` and hold the session
    /// until [`Self::remove_callback`]. Fails with `AlreadyInstalled` (the
    /// existing session untouched) if one is active.
    #[allow(clippy::unwrap_in_result)] /* lock().unwrap() on the output terminal */
    pub fn install_callback<F>(&mut self, prompt: &str, on_accept: F) -> Result<(), ReadlineError>
    where
        F: FnMut(ReadlineEvent) + Send + 'static,
    {
        if self.callback_session.is_some() {
            return Err(ReadlineError::AlreadyInstalled);
        }

        if self.manage_raw_mode {
            enable_raw_mode()?;
        }

        let mut session = CallbackSession::new(
            prompt.to_string(),
            Self::term_size(),
            Box::new(on_accept) as Box<AcceptCallback>,
        );
        session.line_state.should_print_line_on_enter = self.print_line_on_enter;
        session.line_state.should_print_line_on_control_c = self.print_line_on_control_c;
        {
            let mut guard = self.safe_raw_terminal.lock().unwrap();
            session.line_state.render(&mut *guard)?;
            guard.flush()?;
        }
        self.callback_session = Some(session);
        tracing::debug!("callback session installed");
        Ok(())
    }

    /// Feed one raw input byte to the installed session. Never blocks.
    #[allow(clippy::unwrap_in_result)] /* lock().unwrap() on the output terminal */
    pub fn feed_byte(&mut self, byte: u8) -> Result<(), ReadlineError> {
        let session = self
            .callback_session
            .as_mut()
            .ok_or(ReadlineError::NotInstalled)?;
        let mut guard = self.safe_raw_terminal.lock().unwrap();
        session.feed_byte(
            byte,
            &mut *guard,
            &self.safe_history,
            &mut self.completion,
            self.auto_add_history,
        )
    }

    /// Feed one key event to the installed session. Never blocks.
    #[allow(clippy::unwrap_in_result)] /* lock().unwrap() on the output terminal */
    pub fn feed_event(&mut self, event: Event) -> Result<(), ReadlineError> {
        let session = self
            .callback_session
            .as_mut()
            .ok_or(ReadlineError::NotInstalled)?;
        let mut guard = self.safe_raw_terminal.lock().unwrap();
        session.feed_event(
            event,
            &mut *guard,
            &self.safe_history,
            &mut self.completion,
            self.auto_add_history,
        )
    }

    /// Tear down the installed session.
    pub fn remove_callback(&mut self) -> Result<(), ReadlineError> {
        if self.callback_session.take().is_none() {
            return Err(ReadlineError::NotInstalled);
        }
        if self.manage_raw_mode {
            disable_raw_mode()?;
        }
        tracing::debug!("callback session removed");
        Ok(())
    }

    /// Repaint the installed session's prompt + buffer without consuming
    /// input; a no-op when no session is installed.
    #[allow(clippy::unwrap_in_result)] /* lock().unwrap() on the output terminal */
    pub fn force_redisplay(&mut self) -> Result<(), ReadlineError> {
        if let Some(session) = self.callback_session.as_mut() {
            let mut guard = self.safe_raw_terminal.lock().unwrap();
            session.redisplay(&mut *guard)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Completion.
    // ------------------------------------------------------------------

    /// Install `generator`, replacing any previous one.
    pub fn register_completion_generator<F>(&mut self, generator: F)
    where
        F: FnMut(&CompletionRequest) -> Result<Vec<String>, CompletionError> + Send + 'static,
    {
        self.completion.register_generator(generator);
    }

    pub fn set_word_break_chars(&mut self, chars: &[char]) {
        self.completion.set_word_break_chars(chars);
    }

    // ------------------------------------------------------------------
    // History.
    // ------------------------------------------------------------------

    /// Handle to the shared history store, e.g. to hand the same history to
    /// another editor instance.
    pub fn history(&self) -> SafeHistory { self.safe_history.clone() }

    pub fn add_history_entry(&mut self, line: &str) {
        self.safe_history.lock().unwrap().add_entry(line);
    }

    pub fn clear_history(&mut self) { self.safe_history.lock().unwrap().clear(); }

    /// All entries, oldest first.
    pub fn history_list(&self) -> Vec<String> { self.safe_history.lock().unwrap().list() }

    /// Append the entries stored at `path`; returns how many were loaded.
    pub fn load_history(&mut self, path: &Path) -> Result<usize, ReadlineError> {
        Ok(self.safe_history.lock().unwrap().load_from_file(path)?)
    }

    pub fn save_history(&self, path: &Path) -> Result<(), ReadlineError> {
        Ok(self.safe_history.lock().unwrap().save_to_file(path)?)
    }

    /// Bound the history (`0` = unbounded), dropping the oldest entries if
    /// it already exceeds the new bound.
    pub fn set_max_history(&mut self, max_size: usize) {
        let mut history = self.safe_history.lock().unwrap();
        history.max_size = max_size;
        if max_size > 0 {
            history.entries.truncate(max_size);
        }
    }

    pub fn set_history_dedup(&mut self, dedup_consecutive: bool) {
        self.safe_history.lock().unwrap().dedup_consecutive = dedup_consecutive;
    }

    /// Opt in to appending every accepted non-empty line to the history.
    pub fn set_auto_add_history(&mut self, auto_add_history: bool) {
        self.auto_add_history = auto_add_history;
    }

    /// Set whether the prompt and input line remain on the screen after the
    /// user presses Enter / Ctrl-C. Both default to `true`. Takes effect for
    /// sessions started afterwards.
    pub fn should_print_line_on(&mut self, enter: bool, control_c: bool) {
        self.print_line_on_enter = enter;
        self.print_line_on_control_c = control_c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_fixtures::StdoutMock, TestVecKeyPressReader};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;

    fn mock_editor() -> (LineEditor, StdoutMock) {
        let stdout_mock = StdoutMock::default();
        let editor = LineEditor::with_output(Arc::new(StdMutex::new(stdout_mock.clone())));
        (editor, stdout_mock)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn events_for(text: &str) -> Vec<Event> {
        let mut events: Vec<Event> = text.chars().map(|c| key(KeyCode::Char(c))).collect();
        events.push(key(KeyCode::Enter));
        events
    }

    #[test]
    fn test_read_line_accepts_typed_text() {
        let (mut editor, stdout_mock) = mock_editor();
        let mut reader = TestVecKeyPressReader::from_events(events_for("abc"));

        let result = editor.read_line_with("> ", &mut reader).unwrap();
        assert_eq!(result, ReadlineEvent::Line("abc".to_string()));

        let output = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        assert!(output.contains("> abc"));
    }

    #[test]
    fn test_read_line_on_closed_input_is_eof_not_empty_line() {
        let (mut editor, _stdout_mock) = mock_editor();
        let mut reader = TestVecKeyPressReader::from_events(Vec::new());

        let result = editor.read_line_with("> ", &mut reader).unwrap();
        assert_eq!(result, ReadlineEvent::Eof);
    }

    #[test]
    fn test_read_line_interrupted() {
        let (mut editor, _stdout_mock) = mock_editor();
        let mut reader = TestVecKeyPressReader::from_events(vec![
            key(KeyCode::Char('x')),
            Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        ]);

        let result = editor.read_line_with("> ", &mut reader).unwrap();
        assert_eq!(result, ReadlineEvent::Interrupted);
    }

    #[test]
    fn test_auto_add_history_records_accepted_lines() {
        let (mut editor, _stdout_mock) = mock_editor();
        editor.set_auto_add_history(true);

        let mut reader = TestVecKeyPressReader::from_events(events_for("first"));
        editor.read_line_with("> ", &mut reader).unwrap();
        let mut reader = TestVecKeyPressReader::from_events(events_for("second"));
        editor.read_line_with("> ", &mut reader).unwrap();

        assert_eq!(
            editor.history_list(),
            vec!["first".to_string(), "second".to_string()]
        );
    }

    #[test]
    fn test_accepted_empty_line_is_not_recorded() {
        let (mut editor, _stdout_mock) = mock_editor();
        editor.set_auto_add_history(true);

        let mut reader = TestVecKeyPressReader::from_events(vec![key(KeyCode::Enter)]);
        let result = editor.read_line_with("> ", &mut reader).unwrap();
        assert_eq!(result, ReadlineEvent::Line(String::new()));
        assert!(editor.history_list().is_empty());
    }

    #[test]
    fn test_manual_history_accessors() {
        let (mut editor, _stdout_mock) = mock_editor();
        editor.add_history_entry("one");
        editor.add_history_entry("two");
        assert_eq!(editor.history_list(), vec!["one".to_string(), "two".to_string()]);

        editor.clear_history();
        assert!(editor.history_list().is_empty());
    }

    #[test]
    fn test_history_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");

        let (mut editor, _stdout_mock) = mock_editor();
        editor.add_history_entry("alpha");
        editor.add_history_entry("beta\nwith newline");
        editor.save_history(&path).unwrap();

        let (mut fresh, _stdout_mock) = mock_editor();
        let count = fresh.load_history(&path).unwrap();
        assert_eq!(count, 2);
        assert_eq!(fresh.history_list(), editor.history_list());
    }

    #[test]
    fn test_load_history_io_error_surfaces() {
        let (mut editor, _stdout_mock) = mock_editor();
        let result = editor.load_history(Path::new("/nonexistent/history.txt"));
        assert!(matches!(result, Err(ReadlineError::IO(_))));
    }

    #[test]
    fn test_set_max_history_truncates_oldest() {
        let (mut editor, _stdout_mock) = mock_editor();
        editor.add_history_entry("one");
        editor.add_history_entry("two");
        editor.add_history_entry("three");

        editor.set_max_history(2);
        assert_eq!(
            editor.history_list(),
            vec!["two".to_string(), "three".to_string()]
        );
    }

    #[test]
    fn test_install_callback_twice_fails_and_keeps_first_session() {
        let (mut editor, _stdout_mock) = mock_editor();
        let accepted = Arc::new(StdMutex::new(Vec::<ReadlineEvent>::new()));

        let sink = accepted.clone();
        editor
            .install_callback("> ", move |event| sink.lock().unwrap().push(event))
            .unwrap();

        let result = editor.install_callback("# ", |_| {});
        assert!(matches!(result, Err(ReadlineError::AlreadyInstalled)));

        // The first session still accepts lines into its own callback.
        for byte in b"ok\r" {
            editor.feed_byte(*byte).unwrap();
        }
        assert_eq!(
            accepted.lock().unwrap().as_slice(),
            &[ReadlineEvent::Line("ok".to_string())]
        );
    }

    #[test]
    fn test_feed_bytes_accepts_line_and_resets_session() {
        let (mut editor, stdout_mock) = mock_editor();
        let accepted = Arc::new(StdMutex::new(Vec::<ReadlineEvent>::new()));

        let sink = accepted.clone();
        editor
            .install_callback("> ", move |event| sink.lock().unwrap().push(event))
            .unwrap();

        for byte in b"hi\r" {
            editor.feed_byte(*byte).unwrap();
        }
        for byte in b"again\r" {
            editor.feed_byte(*byte).unwrap();
        }

        assert_eq!(
            accepted.lock().unwrap().as_slice(),
            &[
                ReadlineEvent::Line("hi".to_string()),
                ReadlineEvent::Line("again".to_string()),
            ]
        );

        // The prompt was re-rendered between the two lines.
        let output = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        assert!(output.contains("> hi"));
        assert!(output.contains("> again"));
    }

    #[test]
    fn test_feed_multi_byte_utf8() {
        let (mut editor, _stdout_mock) = mock_editor();
        let accepted = Arc::new(StdMutex::new(Vec::<ReadlineEvent>::new()));

        let sink = accepted.clone();
        editor
            .install_callback("> ", move |event| sink.lock().unwrap().push(event))
            .unwrap();

        for byte in "héllo\r".bytes() {
            editor.feed_byte(byte).unwrap();
        }
        assert_eq!(
            accepted.lock().unwrap().as_slice(),
            &[ReadlineEvent::Line("héllo".to_string())]
        );
    }

    #[test]
    fn test_feed_ctrl_c_reports_interrupted_and_continues() {
        let (mut editor, _stdout_mock) = mock_editor();
        let accepted = Arc::new(StdMutex::new(Vec::<ReadlineEvent>::new()));

        let sink = accepted.clone();
        editor
            .install_callback("> ", move |event| sink.lock().unwrap().push(event))
            .unwrap();

        for byte in b"abc\x03ok\r" {
            editor.feed_byte(*byte).unwrap();
        }
        assert_eq!(
            accepted.lock().unwrap().as_slice(),
            &[
                ReadlineEvent::Interrupted,
                ReadlineEvent::Line("ok".to_string()),
            ]
        );
    }

    #[test]
    fn test_feed_returns_even_with_failing_generator() {
        let (mut editor, _stdout_mock) = mock_editor();
        editor.register_completion_generator(|_| {
            Err(CompletionError("generator never answers".into()))
        });
        editor.install_callback("> ", |_| {}).unwrap();

        // Tab invokes the generator; the error is logged, not raised, and
        // the call returns immediately.
        assert!(editor.feed_byte(b'\t').is_ok());
        assert!(editor.feed_byte(b'x').is_ok());
    }

    #[test]
    fn test_remove_callback_then_feed_fails() {
        let (mut editor, _stdout_mock) = mock_editor();
        editor.install_callback("> ", |_| {}).unwrap();
        editor.remove_callback().unwrap();

        assert!(matches!(
            editor.feed_byte(b'a'),
            Err(ReadlineError::NotInstalled)
        ));
        assert!(matches!(
            editor.remove_callback(),
            Err(ReadlineError::NotInstalled)
        ));
    }

    #[test]
    fn test_read_line_refused_while_callback_installed() {
        let (mut editor, _stdout_mock) = mock_editor();
        editor.install_callback("> ", |_| {}).unwrap();

        let mut reader = TestVecKeyPressReader::from_events(events_for("x"));
        assert!(matches!(
            editor.read_line_with("> ", &mut reader),
            Err(ReadlineError::AlreadyInstalled)
        ));
    }

    #[test]
    fn test_force_redisplay() {
        let (mut editor, stdout_mock) = mock_editor();
        // Without a session: no-op.
        editor.force_redisplay().unwrap();

        editor.install_callback("> ", |_| {}).unwrap();
        for byte in b"abc" {
            editor.feed_byte(*byte).unwrap();
        }

        let before = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();
        editor.force_redisplay().unwrap();
        let after = stdout_mock.get_copy_of_buffer_as_string_strip_ansi();

        // One more prompt + buffer repaint than before.
        assert_eq!(after.matches("> abc").count(), before.matches("> abc").count() + 1);
    }

    #[test]
    fn test_completion_through_blocking_read() {
        let (mut editor, _stdout_mock) = mock_editor();
        editor.register_completion_generator(|request| {
            let commands = ["status", "stash", "stage"];
            Ok(commands
                .iter()
                .filter(|c| c.starts_with(request.word()))
                .map(|c| c.to_string())
                .collect())
        });

        let mut reader = TestVecKeyPressReader::from_events(vec![
            key(KeyCode::Char('s')),
            key(KeyCode::Char('t')),
            key(KeyCode::Tab),
            key(KeyCode::Enter),
        ]);
        let result = editor.read_line_with("> ", &mut reader).unwrap();
        // The common prefix "sta" was inserted before Enter.
        assert_eq!(result, ReadlineEvent::Line("sta".to_string()));
    }
}
