// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::execution::Agent;
use crate::heap::indexes::StringIndex;

/// A property key: either an array index or an interned string.
///
/// Keys that parse as canonical non-negative integer indices are routed to
/// the elements store by the protocol layer; named-property storage never
/// interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    Integer(u32),
    String(StringIndex),
}

impl PropertyKey {
    /// Parse a string into a property key, recognising canonical array
    /// indices: no leading zeros, no sign, value below `u32::MAX`.
    pub fn from_str(agent: &mut Agent, key: &str) -> Self {
        if let Some(index) = parse_array_index(key) {
            return PropertyKey::Integer(index);
        }
        PropertyKey::String(agent.heap.alloc_string(key))
    }

    pub fn from_string_index(index: StringIndex) -> Self {
        PropertyKey::String(index)
    }

    pub fn is_array_index(self) -> bool {
        matches!(self, PropertyKey::Integer(_))
    }

    pub fn as_display_string(self, agent: &Agent) -> String {
        match self {
            PropertyKey::Integer(index) => index.to_string(),
            PropertyKey::String(index) => agent.heap.get_string(index).to_string(),
        }
    }
}

fn parse_array_index(key: &str) -> Option<u32> {
    if key.is_empty() || key.len() > 10 {
        return None;
    }
    if key != "0" && key.starts_with('0') {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = key.parse().ok()?;
    // u32::MAX is not a valid array index; it is the not-found sentinel of
    // array length arithmetic.
    if value >= u32::MAX as u64 {
        return None;
    }
    Some(value as u32)
}
