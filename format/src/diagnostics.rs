// Copyright 2026 the chunker3ds developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use log::warn;

/// Soft inconsistencies observed while loading. These do not abort the
/// load; the only one known so far is the middle index-entry tag
/// deviating from its usual value, which real saves are known to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    IndexTagMismatch {
        entry: usize,
        expected: u16,
        actual: u16,
    },
}

/// Receiver for [`Warning`]s raised during a world load. Passed into
/// the loader explicitly so tests can observe warnings without
/// capturing process output.
pub trait DiagnosticSink {
    fn report(&mut self, warning: Warning);
}

/// Default sink: forwards every warning to the `log` crate.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, warning: Warning) {
        match warning {
            Warning::IndexTagMismatch {
                entry,
                expected,
                actual,
            } => warn!(
                "index entry {}: tag constant is {:#X}, expected {:#X}",
                entry, actual, expected
            ),
        }
    }
}

impl DiagnosticSink for Vec<Warning> {
    fn report(&mut self, warning: Warning) {
        self.push(warning);
    }
}
