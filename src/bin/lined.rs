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

//! Demo REPL for the `lineedit` engine: blocking reads with persistent
//! history and tab-completion over the built-in commands.

use clap::Parser;
use lineedit::{tracing_setup, LineEditor, ReadlineEvent, TracingConfig};
use miette::IntoDiagnostic as _;

use crate::clap_config::CLIArgs;

const COMMANDS: &[&str] = &["clear-history", "exit", "help", "history", "quit"];

fn main() -> miette::Result<()> {
    let cli_args = CLIArgs::parse();

    if cli_args.enable_logging {
        tracing_setup::init(TracingConfig::new("lined_log.txt".to_string()))?;
    }

    let mut editor = LineEditor::new();
    editor.set_auto_add_history(true);

    if let Some(path) = &cli_args.history_file {
        match editor.load_history(path) {
            Ok(count) => tracing::info!("loaded {count} history entries"),
            Err(error) => eprintln!("could not load history: {error}"),
        }
    }

    editor.register_completion_generator(|request| {
        Ok(COMMANDS
            .iter()
            .filter(|command| command.starts_with(request.word()))
            .map(|command| command.to_string())
            .collect())
    });

    loop {
        match editor.read_line(&cli_args.prompt).into_diagnostic()? {
            ReadlineEvent::Line(line) => match line.trim() {
                "" => {}
                "exit" | "quit" => break,
                "help" => {
                    println!("commands: {}", COMMANDS.join(", "));
                }
                "history" => {
                    for (index, entry) in editor.history_list().iter().enumerate() {
                        println!("{:>4}  {entry}", index + 1);
                    }
                }
                "clear-history" => editor.clear_history(),
                other => println!("you typed: {other}"),
            },
            ReadlineEvent::Interrupted => continue,
            ReadlineEvent::Eof => break,
        }
    }

    if let Some(path) = &cli_args.history_file {
        editor.save_history(path).into_diagnostic()?;
    }

    Ok(())
}

mod clap_config {
    use std::path::PathBuf;

    use clap::Parser;

    /// More info: <https://docs.rs/clap/latest/clap/_derive/_tutorial/chapter_2/index.html>
    #[derive(Debug, Parser)]
    #[command(bin_name = "lined")]
    #[command(about = "Interactive line-editing demo REPL with history and tab-completion")]
    #[command(version)]
    #[command(next_line_help = true)]
    pub struct CLIArgs {
        #[arg(
            long,
            short = 'p',
            default_value = "lined> ",
            help = "Prompt shown before each input line"
        )]
        pub prompt: String,

        #[arg(
            long,
            short = 'f',
            help = "Load history from, and save it back to, this file"
        )]
        pub history_file: Option<PathBuf>,

        #[arg(
            long,
            short = 'l',
            help = "Log app output to a file named `lined_log.txt` for debugging."
        )]
        pub enable_logging: bool,
    }
}
