// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Heap storage of one interned string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringHeapData {
    data: Box<str>,
}

impl StringHeapData {
    pub fn from_str(data: &str) -> Self {
        Self { data: data.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
