// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::execution::agent::ExceptionType;
use crate::heap::indexes::StringIndex;

/// Heap storage of one thrown error.
#[derive(Debug, Clone)]
pub struct ErrorHeapData {
    pub kind: ExceptionType,
    pub message: Option<StringIndex>,
}

impl ErrorHeapData {
    pub fn new(kind: ExceptionType, message: Option<StringIndex>) -> Self {
        Self { kind, message }
    }
}
