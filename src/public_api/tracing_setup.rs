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

use std::{io, path::PathBuf};

use tracing_core::LevelFilter;
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, Layer,
};

/// Where display logging goes. The line being edited owns `stdout`, so the
/// only display choice is `stderr` (or nothing); file logging is configured
/// separately and is the default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayPreference {
    Stderr,
    None,
}

/// Fields:
/// - `level`: [tracing::Level] - The log level to use for tracing.
/// - `tracing_log_file_path_and_prefix`: [String] - The file path and prefix
///   to use for the log file. Eg: `/tmp/lined` or `lined`.
/// - `preferred_display`: [DisplayPreference] - Optional display output next
///   to the log file.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    pub level: tracing::Level,
    pub tracing_log_file_path_and_prefix: String,
    pub preferred_display: DisplayPreference,
}

impl TracingConfig {
    /// The default configuration: `DEBUG` to a log file next to the
    /// binary, nothing on the display.
    pub fn new(tracing_log_file_path_and_prefix: String) -> Self {
        Self {
            level: tracing::Level::DEBUG,
            tracing_log_file_path_and_prefix,
            preferred_display: DisplayPreference::None,
        }
    }

    pub fn get_level_filter(&self) -> LevelFilter {
        tracing_subscriber::filter::LevelFilter::from_level(self.level)
    }
}

type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Avoid gnarly type annotations by using a macro to create the `fmt` layer.
#[macro_export]
macro_rules! create_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_thread_ids(true)
            .with_thread_names(false)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
    };
}

fn try_create_display_layer<S>(
    level_filter: LevelFilter,
    preferred_display: DisplayPreference,
) -> Option<Box<DynLayer<S>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    match preferred_display {
        DisplayPreference::Stderr => Some(Box::new(
            create_fmt!()
                .with_writer(io::stderr)
                .with_filter(level_filter),
        )),
        DisplayPreference::None => None,
    }
}

fn try_create_file_layer<S>(
    level_filter: LevelFilter,
    tracing_log_file_path_and_prefix: &str,
) -> miette::Result<Box<DynLayer<S>>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let file = rolling_file_appender_impl::try_create(tracing_log_file_path_and_prefix)?;
    Ok(Box::new(
        create_fmt!().with_writer(file).with_filter(level_filter),
    ))
}

/// Build the layers and install them on the global subscriber.
pub fn init(tracing_config: TracingConfig) -> miette::Result<()> {
    try_create_layers(tracing_config)
        .map(|layers| tracing_subscriber::registry().with(layers).init())
}

/// Returns the layers. Once you have the layers, you can run the following:
/// `try_create_layers(..).map(|layers| tracing_subscriber::registry().with(layers).init());`
pub fn try_create_layers(
    tracing_config: TracingConfig,
) -> miette::Result<Vec<Box<DynLayer<tracing_subscriber::Registry>>>> {
    let level_filter = tracing_config.get_level_filter();

    let mut layers: Vec<Box<DynLayer<tracing_subscriber::Registry>>> = vec![];

    // Set the level filter first so it applies to every layer added below.
    layers.push(Box::new(level_filter));

    if let Some(layer) =
        try_create_display_layer(level_filter, tracing_config.preferred_display)
    {
        layers.push(layer);
    }

    layers.push(try_create_file_layer(
        level_filter,
        &tracing_config.tracing_log_file_path_and_prefix,
    )?);

    Ok(layers)
}

mod rolling_file_appender_impl {
    use super::*;

    /// Note that if you wrap this up in a non blocking writer, as shown here, it doesn't work:
    /// `tracing_appender::non_blocking(try_create_rolling_file_appender("foo")?);`
    pub fn try_create(
        path_str: &str,
    ) -> miette::Result<tracing_appender::rolling::RollingFileAppender> {
        let path = PathBuf::from(&path_str);

        let parent = path.parent().ok_or_else(|| {
            miette::miette!(
                format!("Can't access current folder {}. It might not exist, or don't have required permissions.", path.display())
            )
        })?;

        let file_stem = path.file_name().ok_or_else(|| {
            miette::miette!(format!(
            "Can't access file name {}. It might not exist, or don't have required permissions.",
            path.display()
        ))
        })?;

        Ok(tracing_appender::rolling::never(parent, file_stem))
    }
}
