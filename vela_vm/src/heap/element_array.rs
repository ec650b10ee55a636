// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ahash::AHashMap;
use tracing::debug;

use crate::ecmascript::types::Value;

/// Writing further than this many slots past the current capacity converts
/// the store to dictionary backing instead of materialising the gap.
pub const SPARSE_GAP_LIMIT: u32 = 1024;

/// The representation lattice for indexed properties.
///
/// Transitions only ever widen along two axes: the value representation
/// (small integer, double, anything) and packedness (a packed store becomes
/// holey once any index inside the bounds is deleted or left unassigned).
/// Sufficiently sparse stores fall off the lattice into dictionary backing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElementsKind {
    PackedSmi,
    HoleySmi,
    PackedDouble,
    HoleyDouble,
    Packed,
    Holey,
    Dictionary,
}

impl ElementsKind {
    pub fn is_holey(self) -> bool {
        matches!(self, Self::HoleySmi | Self::HoleyDouble | Self::Holey)
    }

    pub fn is_double(self) -> bool {
        matches!(self, Self::PackedDouble | Self::HoleyDouble)
    }

    fn holey_counterpart(self) -> Self {
        match self {
            Self::PackedSmi => Self::HoleySmi,
            Self::PackedDouble => Self::HoleyDouble,
            Self::Packed => Self::Holey,
            other => other,
        }
    }

    /// The width axis of the lattice, ignoring packedness.
    fn width(self) -> ElementsWidth {
        match self {
            Self::PackedSmi | Self::HoleySmi => ElementsWidth::Smi,
            Self::PackedDouble | Self::HoleyDouble => ElementsWidth::Double,
            Self::Packed | Self::Holey | Self::Dictionary => ElementsWidth::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ElementsWidth {
    Smi,
    Double,
    Any,
}

fn required_width(value: Value) -> ElementsWidth {
    match value {
        Value::Integer(_) => ElementsWidth::Smi,
        Value::Float(_) => ElementsWidth::Double,
        _ => ElementsWidth::Any,
    }
}

#[derive(Debug, Clone)]
enum ElementsBacking {
    Smi(Vec<Option<i32>>),
    Double(Vec<Option<f64>>),
    Any(Vec<Option<Value>>),
    Dictionary(AHashMap<u32, Value>),
}

/// The indexed-property store of an object.
///
/// Holes are represented in place; the kind tag must never under-represent
/// the stored values, so every store first widens the backing as needed.
#[derive(Debug, Clone)]
pub struct ElementsStore {
    kind: ElementsKind,
    backing: ElementsBacking,
    length: u32,
}

impl Default for ElementsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementsStore {
    pub fn new() -> Self {
        Self {
            kind: ElementsKind::PackedSmi,
            backing: ElementsBacking::Smi(Vec::new()),
            length: 0,
        }
    }

    pub fn len(&self) -> u32 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn kind(&self) -> ElementsKind {
        self.kind
    }

    pub fn get(&self, index: u32) -> Option<Value> {
        match &self.backing {
            ElementsBacking::Smi(v) => v
                .get(index as usize)
                .copied()
                .flatten()
                .map(Value::Integer),
            ElementsBacking::Double(v) => {
                v.get(index as usize).copied().flatten().map(Value::Float)
            }
            ElementsBacking::Any(v) => v.get(index as usize).copied().flatten(),
            ElementsBacking::Dictionary(map) => map.get(&index).copied(),
        }
    }

    pub fn has(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Store a value at the given index, widening the kind first if the
    /// value cannot be represented in the current backing.
    pub fn set(&mut self, index: u32, value: Value) {
        self.widen_kind_if_needed(value);
        if let ElementsBacking::Dictionary(map) = &mut self.backing {
            map.insert(index, value);
            self.length = self.length.max(index + 1);
            return;
        }
        if index > self.length && index - self.length > SPARSE_GAP_LIMIT {
            self.convert_to_dictionary();
            if let ElementsBacking::Dictionary(map) = &mut self.backing {
                map.insert(index, value);
            }
            self.length = self.length.max(index + 1);
            return;
        }
        if index >= self.length {
            // Appending at exactly `length` keeps the store packed; any gap
            // marks the skipped indices as holes.
            if index > self.length {
                self.transition_kind(self.kind.holey_counterpart());
            }
            self.resize_to(index + 1);
            self.length = index + 1;
        }
        self.store(index, value);
    }

    /// Remove the element at the given index, leaving a hole.
    pub fn delete(&mut self, index: u32) -> bool {
        if index >= self.length {
            return true;
        }
        match &mut self.backing {
            ElementsBacking::Smi(v) => v[index as usize] = None,
            ElementsBacking::Double(v) => v[index as usize] = None,
            ElementsBacking::Any(v) => v[index as usize] = None,
            ElementsBacking::Dictionary(map) => {
                map.remove(&index);
                return true;
            }
        }
        self.transition_kind(self.kind.holey_counterpart());
        true
    }

    /// Own indices in ascending numeric order.
    pub fn own_indices(&self) -> Vec<u32> {
        match &self.backing {
            ElementsBacking::Smi(v) => v
                .iter()
                .enumerate()
                .filter_map(|(i, e)| e.map(|_| i as u32))
                .collect(),
            ElementsBacking::Double(v) => v
                .iter()
                .enumerate()
                .filter_map(|(i, e)| e.map(|_| i as u32))
                .collect(),
            ElementsBacking::Any(v) => v
                .iter()
                .enumerate()
                .filter_map(|(i, e)| e.map(|_| i as u32))
                .collect(),
            ElementsBacking::Dictionary(map) => {
                let mut indices: Vec<u32> = map.keys().copied().collect();
                indices.sort_unstable();
                indices
            }
        }
    }

    /// A repeated index past the current length on a double-kind store is a
    /// strong signal of imminent sequential growth; widen to the mixed kind
    /// up front to avoid a store-then-immediately-rewiden churn on the next
    /// access.
    pub fn transition_for_out_of_bounds_access(&mut self, index: u32) {
        if self.kind.is_double() && index >= self.length {
            let target = if self.kind.is_holey() {
                ElementsKind::Holey
            } else {
                ElementsKind::Packed
            };
            self.transition_kind(target);
        }
    }

    fn widen_kind_if_needed(&mut self, value: Value) {
        let required = required_width(value);
        if required <= self.kind.width() {
            return;
        }
        let target = match (required, self.kind.is_holey()) {
            (ElementsWidth::Double, false) => ElementsKind::PackedDouble,
            (ElementsWidth::Double, true) => ElementsKind::HoleyDouble,
            (ElementsWidth::Any, false) => ElementsKind::Packed,
            (ElementsWidth::Any, true) => ElementsKind::Holey,
            (ElementsWidth::Smi, _) => unreachable!(),
        };
        self.transition_kind(target);
    }

    /// Move to the target kind, converting the backing without losing any
    /// stored value. Transitions only widen; narrowing requests are ignored.
    fn transition_kind(&mut self, target: ElementsKind) {
        if target == self.kind || self.kind == ElementsKind::Dictionary {
            return;
        }
        debug_assert!(target.width() >= self.kind.width());
        debug!(from = ?self.kind, to = ?target, "elements kind transition");
        let backing = std::mem::replace(&mut self.backing, ElementsBacking::Smi(Vec::new()));
        self.backing = match (backing, target.width()) {
            (ElementsBacking::Smi(v), ElementsWidth::Double) => {
                ElementsBacking::Double(v.into_iter().map(|e| e.map(|i| i as f64)).collect())
            }
            (ElementsBacking::Smi(v), ElementsWidth::Any) => {
                ElementsBacking::Any(v.into_iter().map(|e| e.map(Value::Integer)).collect())
            }
            (ElementsBacking::Double(v), ElementsWidth::Any) => {
                ElementsBacking::Any(v.into_iter().map(|e| e.map(Value::Float)).collect())
            }
            (backing, _) => backing,
        };
        self.kind = target;
    }

    fn convert_to_dictionary(&mut self) {
        debug!(from = ?self.kind, length = self.length, "elements to dictionary");
        let mut map = AHashMap::new();
        for index in self.own_indices() {
            let value = self.get(index).unwrap();
            map.insert(index, value);
        }
        self.backing = ElementsBacking::Dictionary(map);
        self.kind = ElementsKind::Dictionary;
    }

    fn resize_to(&mut self, new_len: u32) {
        let new_len = new_len as usize;
        match &mut self.backing {
            ElementsBacking::Smi(v) => v.resize(new_len, None),
            ElementsBacking::Double(v) => v.resize(new_len, None),
            ElementsBacking::Any(v) => v.resize(new_len, None),
            ElementsBacking::Dictionary(_) => {}
        }
    }

    fn store(&mut self, index: u32, value: Value) {
        match (&mut self.backing, value) {
            (ElementsBacking::Smi(v), Value::Integer(i)) => v[index as usize] = Some(i),
            (ElementsBacking::Double(v), Value::Integer(i)) => v[index as usize] = Some(i as f64),
            (ElementsBacking::Double(v), Value::Float(f)) => v[index as usize] = Some(f),
            (ElementsBacking::Any(v), value) => v[index as usize] = Some(value),
            _ => unreachable!("store without a preceding kind widening"),
        }
    }
}
