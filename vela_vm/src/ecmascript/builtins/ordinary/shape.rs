// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::num::NonZeroU32;

use ahash::AHashMap;

use crate::ecmascript::execution::Agent;
use crate::ecmascript::types::{Object, PropertyKey};
use crate::heap::{CreateHeapData, Heap};

/// Handle to an Object Shape.
///
/// A shape describes an object's prototype and its ordered list of named
/// property keys. Objects created and mutated the same way share a shape,
/// so per-object property storage holds only the values.
///
/// Shapes form a transition tree: adding a named key to an object steps its
/// shape to a child shape, and the parent remembers the step so the next
/// object making the same transition lands on the same child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectShape(NonZeroU32);

impl ObjectShape {
    /// The root shape of `{ __proto__: null }` objects. Present in every
    /// heap at the same index.
    pub const NULL: Self = Self(NonZeroU32::MIN);

    fn get_index(self) -> usize {
        self.0.get() as usize - 1
    }

    fn from_index(index: usize) -> Self {
        let value = u32::try_from(index + 1).expect("Shape index overflowed u32");
        // SAFETY: The value is at least 1.
        Self(unsafe { NonZeroU32::new_unchecked(value) })
    }

    pub fn keys(self, agent: &Agent) -> &[PropertyKey] {
        &agent.heap.object_shapes[self.get_index()].keys
    }

    /// The number of named keys this shape describes.
    pub fn len(self, agent: &Agent) -> u32 {
        self.keys(agent).len() as u32
    }

    pub fn is_empty(self, agent: &Agent) -> bool {
        self.keys(agent).is_empty()
    }

    pub fn get_prototype(self, agent: &Agent) -> Option<Object> {
        agent.heap.object_shapes[self.get_index()].prototype
    }

    /// The storage slot of `key`, if this shape contains it.
    pub fn key_slot(self, agent: &Agent, key: PropertyKey) -> Option<usize> {
        self.keys(agent).iter().position(|k| *k == key)
    }

    fn parent(self, agent: &Agent) -> Option<ObjectShape> {
        agent.heap.object_shape_transitions[self.get_index()].parent
    }

    fn get_transition_to(self, agent: &Agent, key: PropertyKey) -> Option<ObjectShape> {
        agent.heap.object_shape_transitions[self.get_index()]
            .table
            .get(&key)
            .copied()
    }

    /// Step to the child shape that appends `key`, creating and registering
    /// it on first use.
    pub fn get_or_create_child_shape(self, agent: &mut Agent, key: PropertyKey) -> ObjectShape {
        if let Some(child) = self.get_transition_to(agent, key) {
            return child;
        }
        let mut keys = self.keys(agent).to_vec();
        keys.push(key);
        let record = ObjectShapeRecord {
            prototype: self.get_prototype(agent),
            keys,
        };
        let child = agent.heap.create((record, Some(self)));
        agent.heap.object_shape_transitions[self.get_index()]
            .table
            .insert(key, child);
        child
    }

    /// The shape one key shorter than this one. Used when the last-added
    /// key is deleted again; any other deletion leaves the transition tree.
    pub fn get_parent_shape_for_pop(
        self,
        agent: &Agent,
        key: PropertyKey,
    ) -> Option<ObjectShape> {
        let keys = self.keys(agent);
        if keys.last() != Some(&key) {
            return None;
        }
        self.parent(agent)
    }

    /// The root shape of objects with the given prototype.
    pub fn get_or_create_shape_for_prototype(
        agent: &mut Agent,
        prototype: Option<Object>,
    ) -> ObjectShape {
        let Some(prototype) = prototype else {
            return Self::NULL;
        };
        if let Some(shape) = agent.heap.prototype_shapes.get(prototype) {
            return shape;
        }
        let record = ObjectShapeRecord {
            prototype: Some(prototype),
            keys: Vec::new(),
        };
        let shape = agent.heap.create((record, None));
        agent.heap.prototype_shapes.insert(prototype, shape);
        shape
    }

    /// An equivalent of this shape under a different prototype: the root
    /// shape of `prototype`, stepped through this shape's keys in order.
    pub fn shape_with_prototype(
        self,
        agent: &mut Agent,
        prototype: Option<Object>,
    ) -> ObjectShape {
        let keys = self.keys(agent).to_vec();
        let mut shape = Self::get_or_create_shape_for_prototype(agent, prototype);
        for key in keys {
            shape = shape.get_or_create_child_shape(agent, key);
        }
        shape
    }
}

/// Data record of an Object Shape.
#[derive(Debug)]
pub struct ObjectShapeRecord {
    pub(crate) prototype: Option<Object>,
    /// Named property keys in property creation order. The position of a
    /// key is its slot in fast property storage.
    pub(crate) keys: Vec<PropertyKey>,
}

impl ObjectShapeRecord {
    /// The root record of null-prototype objects, seeded at heap index 0.
    pub const NULL: Self = Self {
        prototype: None,
        keys: Vec::new(),
    };
}

/// Forward transitions out of one shape, keyed by the added property key.
///
/// Lives parallel to [`ObjectShapeRecord`] in the heap so shape data stays
/// read-only during lookups while transitions mutate.
#[derive(Debug)]
pub struct ObjectShapeTransitionMap {
    pub(crate) parent: Option<ObjectShape>,
    pub(crate) table: AHashMap<PropertyKey, ObjectShape>,
}

impl ObjectShapeTransitionMap {
    /// The transition map of a root shape.
    pub fn root() -> Self {
        Self {
            parent: None,
            table: AHashMap::new(),
        }
    }
}

/// Root shapes by prototype, so same-prototype objects start from a shared
/// shape.
#[derive(Debug)]
pub struct PrototypeShapeTable {
    table: AHashMap<Object, ObjectShape>,
}

impl PrototypeShapeTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: AHashMap::with_capacity(capacity),
        }
    }

    pub fn get(&self, prototype: Object) -> Option<ObjectShape> {
        self.table.get(&prototype).copied()
    }

    pub fn insert(&mut self, prototype: Object, shape: ObjectShape) {
        let previous = self.table.insert(prototype, shape);
        debug_assert!(previous.is_none(), "Re-registered a prototype root shape");
    }
}

impl CreateHeapData<(ObjectShapeRecord, Option<ObjectShape>), ObjectShape> for Heap {
    fn create(&mut self, data: (ObjectShapeRecord, Option<ObjectShape>)) -> ObjectShape {
        let (record, parent) = data;
        self.alloc_counter +=
            core::mem::size_of::<ObjectShapeRecord>() + core::mem::size_of::<ObjectShape>();
        self.object_shapes.push(record);
        self.object_shape_transitions.push(ObjectShapeTransitionMap {
            parent,
            table: AHashMap::new(),
        });
        ObjectShape::from_index(self.object_shapes.len() - 1)
    }
}
