// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ahash::RandomState;
use hashbrown::HashMap;

use crate::ecmascript::types::{PropertyKey, PropertyValue};
use crate::heap::indexes::PropertyCellIndex;

/// A dictionary-mode property entry. The enumeration index preserves the
/// insertion order lost by hashing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DictionaryEntry {
    pub value: PropertyValue,
    pub enumeration_index: u32,
}

/// A global-object property entry. The value and attributes live in the
/// referenced property cell so call sites can cache a stable handle.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GlobalEntry {
    pub cell: PropertyCellIndex,
    pub enumeration_index: u32,
}

/// Named-property value storage for one object.
///
/// Fast storage is a slot vector parallel to the object's shape keys; a
/// `None` slot is a deleted property awaiting normalization. Dictionary and
/// global storage are self-describing hash tables and ignore the shape's
/// key list entirely.
#[derive(Debug)]
pub(crate) enum PropertyStorage {
    Fast {
        values: Vec<Option<PropertyValue>>,
    },
    Dictionary {
        table: HashMap<PropertyKey, DictionaryEntry, RandomState>,
        next_enumeration_index: u32,
    },
    Global {
        table: HashMap<PropertyKey, GlobalEntry, RandomState>,
        next_enumeration_index: u32,
    },
}

impl PropertyStorage {
    pub fn new_fast() -> Self {
        Self::Fast { values: Vec::new() }
    }

    pub fn new_dictionary() -> Self {
        Self::Dictionary {
            table: HashMap::default(),
            next_enumeration_index: 0,
        }
    }

    pub fn new_global() -> Self {
        Self::Global {
            table: HashMap::default(),
            next_enumeration_index: 0,
        }
    }

    pub fn is_fast(&self) -> bool {
        matches!(self, Self::Fast { .. })
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global { .. })
    }

    /// The number of live fast slots, counting holes. Zero in slow modes.
    pub fn fast_len(&self) -> usize {
        match self {
            Self::Fast { values } => values.len(),
            _ => 0,
        }
    }

    pub fn fast_slot(&self, slot: usize) -> Option<PropertyValue> {
        match self {
            Self::Fast { values } => values.get(slot).copied().flatten(),
            _ => None,
        }
    }

    pub fn fast_slot_mut(&mut self, slot: usize) -> Option<&mut PropertyValue> {
        match self {
            Self::Fast { values } => values.get_mut(slot).and_then(Option::as_mut),
            _ => None,
        }
    }

    pub fn push_fast(&mut self, value: PropertyValue) {
        let Self::Fast { values } = self else {
            unreachable!("push_fast on slow storage");
        };
        values.push(Some(value));
    }

    /// Remove the last fast slot, paired with stepping the owner's shape
    /// back to its parent.
    pub fn pop_fast(&mut self) {
        let Self::Fast { values } = self else {
            unreachable!("pop_fast on slow storage");
        };
        values.pop();
    }

    pub fn take_fast_for_normalize(&mut self) -> Vec<Option<PropertyValue>> {
        let Self::Fast { values } = self else {
            unreachable!("normalize on slow storage");
        };
        std::mem::take(values)
    }

    pub fn replace_fast(&mut self, new_values: Vec<Option<PropertyValue>>) {
        *self = Self::Fast { values: new_values };
    }

    pub fn dictionary_get(&self, key: PropertyKey) -> Option<PropertyValue> {
        match self {
            Self::Dictionary { table, .. } => table.get(&key).map(|entry| entry.value),
            _ => None,
        }
    }

    pub fn dictionary_get_mut(&mut self, key: PropertyKey) -> Option<&mut PropertyValue> {
        match self {
            Self::Dictionary { table, .. } => table.get_mut(&key).map(|entry| &mut entry.value),
            _ => None,
        }
    }

    /// Insert or overwrite a dictionary entry. Overwrites keep the original
    /// enumeration index.
    pub fn dictionary_insert(&mut self, key: PropertyKey, value: PropertyValue) {
        let Self::Dictionary {
            table,
            next_enumeration_index,
        } = self
        else {
            unreachable!("dictionary_insert on non-dictionary storage");
        };
        if let Some(entry) = table.get_mut(&key) {
            entry.value = value;
            return;
        }
        let enumeration_index = *next_enumeration_index;
        *next_enumeration_index += 1;
        table.insert(
            key,
            DictionaryEntry {
                value,
                enumeration_index,
            },
        );
    }

    pub fn dictionary_remove(&mut self, key: PropertyKey) -> bool {
        let Self::Dictionary { table, .. } = self else {
            return false;
        };
        table.remove(&key).is_some()
    }

    pub fn dictionary_len(&self) -> usize {
        match self {
            Self::Dictionary { table, .. } => table.len(),
            _ => 0,
        }
    }

    pub fn global_get(&self, key: PropertyKey) -> Option<PropertyCellIndex> {
        match self {
            Self::Global { table, .. } => table.get(&key).map(|entry| entry.cell),
            _ => None,
        }
    }

    /// Bind a key to a property cell. Rebinding keeps the original
    /// enumeration index, matching redefinition of an existing property.
    pub fn global_insert(&mut self, key: PropertyKey, cell: PropertyCellIndex) {
        let Self::Global {
            table,
            next_enumeration_index,
        } = self
        else {
            unreachable!("global_insert on non-global storage");
        };
        if let Some(entry) = table.get_mut(&key) {
            entry.cell = cell;
            return;
        }
        let enumeration_index = *next_enumeration_index;
        *next_enumeration_index += 1;
        table.insert(
            key,
            GlobalEntry {
                cell,
                enumeration_index,
            },
        );
    }

    pub fn global_remove(&mut self, key: PropertyKey) -> Option<PropertyCellIndex> {
        let Self::Global { table, .. } = self else {
            return None;
        };
        table.remove(&key).map(|entry| entry.cell)
    }

    /// Keys of a slow-mode table in insertion order. Fast-mode keys live in
    /// the shape; callers read them from there.
    pub fn slow_keys_in_order(&self) -> Vec<PropertyKey> {
        let mut keyed: Vec<(u32, PropertyKey)> = match self {
            Self::Fast { .. } => return Vec::new(),
            Self::Dictionary { table, .. } => table
                .iter()
                .map(|(key, entry)| (entry.enumeration_index, *key))
                .collect(),
            Self::Global { table, .. } => table
                .iter()
                .map(|(key, entry)| (entry.enumeration_index, *key))
                .collect(),
        };
        keyed.sort_unstable_by_key(|(index, _)| *index);
        keyed.into_iter().map(|(_, key)| key).collect()
    }
}
