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
pub mod completion;
pub mod edit_buffer;
pub mod history;
pub mod keypress_reader;
pub mod kill_ring;
pub mod line_state;

// Re-export.
pub use completion::*;
pub use edit_buffer::*;
pub use history::*;
pub use keypress_reader::*;
pub use kill_ring::*;
pub use line_state::*;
