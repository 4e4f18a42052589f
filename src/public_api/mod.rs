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

// Attach.
pub mod callback_session;
pub mod line_editor;
pub mod tracing_setup;

// Re-export. The tracing bootstrap functions stay namespaced under
// [`tracing_setup`]; only its config types are lifted to the crate root.
pub use callback_session::*;
pub use line_editor::*;
pub use tracing_setup::{DisplayPreference, TracingConfig};
