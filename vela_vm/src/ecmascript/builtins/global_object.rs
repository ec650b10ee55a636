// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Global-object property cells.
//!
//! Named properties of the global object live in heap-allocated cells
//! instead of in-object slots. A call site that reads or writes a global
//! repeatedly caches the cell in a [`GlobalSlot`] and skips the name lookup
//! while the cell stays valid.

use tracing::debug;

use crate::ecmascript::abstract_operations::operations_on_objects::{
    get_object_property, set_object_property,
};
use crate::ecmascript::execution::{Agent, ExceptionType, JsResult};
use crate::ecmascript::types::{PropertyKey, PropertyValue, Value};
use crate::heap::indexes::{ObjectIndex, PropertyCellIndex};
use crate::heap::CreateHeapData;

/// Lifecycle of a global property cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyCellState {
    /// The property has been written exactly once. Caches may treat the
    /// value as stable until the cell degrades.
    Constant,
    Mutable,
    /// The property was deleted or redefined; the cell is dead and every
    /// cache holding it must release it.
    Deleted,
}

#[derive(Debug)]
pub struct PropertyCellRecord {
    pub(crate) property: PropertyValue,
    pub(crate) state: PropertyCellState,
    /// Bumped on every cache-visible transition of this cell.
    pub(crate) generation: u32,
}

/// A call site's cached reference to a global property cell.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalSlot {
    cell: Option<PropertyCellIndex>,
    generation: u32,
}

impl GlobalSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_populated(&self) -> bool {
        self.cell.is_some()
    }
}

/// The cell backing `key` on the global object, if the global owns the
/// property.
pub(crate) fn global_cell_for(
    agent: &Agent,
    global: ObjectIndex,
    key: PropertyKey,
) -> Option<PropertyCellIndex> {
    agent.heap[global].storage.global_get(key)
}

/// Install or redefine a global property. Redefinitions that change the
/// property's nature kill the old cell so stale caches miss; plain value
/// writes mutate the live cell in place.
pub(crate) fn global_define_own(
    agent: &mut Agent,
    global: ObjectIndex,
    key: PropertyKey,
    property: PropertyValue,
) {
    if let Some(cell) = global_cell_for(agent, global, key) {
        let record = &agent.heap[cell];
        if record.state != PropertyCellState::Deleted {
            let nature_changed = record.property.is_accessor() != property.is_accessor()
                || record.property.attributes() != property.attributes();
            if !nature_changed {
                global_write_cell(agent, cell, property);
                return;
            }
            debug!(key = %key.as_display_string(agent), "invalidating global property cell");
            let record = &mut agent.heap[cell];
            record.state = PropertyCellState::Deleted;
            record.generation += 1;
        }
    }
    let new_cell = agent.heap.create(PropertyCellRecord {
        property,
        state: PropertyCellState::Constant,
        generation: 0,
    });
    agent.heap[global].storage.global_insert(key, new_cell);
}

/// Write a value into a live cell. A second distinct value degrades a
/// constant cell to mutable and bumps its generation.
pub(crate) fn global_write_cell(
    agent: &mut Agent,
    cell: PropertyCellIndex,
    property: PropertyValue,
) {
    let record = &mut agent.heap[cell];
    debug_assert!(record.state != PropertyCellState::Deleted);
    if record.state == PropertyCellState::Constant && record.property != property {
        record.state = PropertyCellState::Mutable;
        record.generation += 1;
    }
    record.property = property;
}

/// Remove a global own property, killing its cell.
pub(crate) fn global_delete_own(agent: &mut Agent, global: ObjectIndex, key: PropertyKey) -> bool {
    let Some(cell) = agent.heap[global].storage.global_remove(key) else {
        return false;
    };
    let record = &mut agent.heap[cell];
    record.state = PropertyCellState::Deleted;
    record.generation += 1;
    true
}

/// Read a global binding through a cached slot.
///
/// A populated slot whose cell is still live and unchanged in generation
/// short-circuits to the cell value. A dead cell releases the slot before
/// the full lookup repopulates it. Only plain mutable or constant data
/// cells are cached; accessor reads always take the full path.
pub fn load_global_via_slot(
    agent: &mut Agent,
    key: PropertyKey,
    slot: &mut GlobalSlot,
) -> JsResult<Value> {
    if let Some(cell) = slot.cell {
        let record = &agent.heap[cell];
        if record.state != PropertyCellState::Deleted && record.generation == slot.generation {
            if let PropertyValue::Data { value, .. } = record.property {
                return Ok(value);
            }
        }
        // Cell death or a nature change invalidates the cache.
        *slot = GlobalSlot::new();
    }
    let global = agent.realm().global_object;
    let global_index = global
        .get_backing_object(agent)
        .expect("Global object has no backing storage");
    if let Some(cell) = global_cell_for(agent, global_index, key) {
        let record = &agent.heap[cell];
        if record.state != PropertyCellState::Deleted {
            if let PropertyValue::Data { value, .. } = record.property {
                slot.cell = Some(cell);
                slot.generation = record.generation;
                return Ok(value);
            }
        }
    }
    // Accessors, interceptors and inherited bindings take the generic path.
    let value = get_object_property(agent, global.into(), key)?;
    if value == Value::Undefined && !has_global_binding(agent, key)? {
        let message = format!("{} is not defined", key.as_display_string(agent));
        return Err(agent.throw_exception(ExceptionType::ReferenceError, &message));
    }
    Ok(value)
}

/// Write a global binding through a cached slot.
pub fn store_global_via_slot(
    agent: &mut Agent,
    key: PropertyKey,
    value: Value,
    strict: bool,
    slot: &mut GlobalSlot,
) -> JsResult<()> {
    if let Some(cell) = slot.cell {
        let record = &agent.heap[cell];
        if record.state == PropertyCellState::Mutable
            && record.generation == slot.generation
            && matches!(record.property, PropertyValue::Data { attrs, .. } if attrs.is_writable())
        {
            let PropertyValue::Data { attrs, .. } = record.property else {
                unreachable!()
            };
            agent.heap[cell].property = PropertyValue::Data { value, attrs };
            return Ok(());
        }
        *slot = GlobalSlot::new();
    }
    let global = agent.realm().global_object;
    // Strict-mode failures throw inside the protocol; sloppy failures are
    // silent and simply leave the slot unpopulated.
    set_object_property(agent, global.into(), key, value, strict)?;
    // Repopulate from the now-live cell when it is cacheable.
    let global_index = global
        .get_backing_object(agent)
        .expect("Global object has no backing storage");
    if let Some(cell) = global_cell_for(agent, global_index, key) {
        let record = &agent.heap[cell];
        if record.state == PropertyCellState::Mutable
            && matches!(record.property, PropertyValue::Data { .. })
        {
            slot.cell = Some(cell);
            slot.generation = record.generation;
        }
    }
    Ok(())
}

fn has_global_binding(agent: &mut Agent, key: PropertyKey) -> JsResult<bool> {
    let global = agent.realm().global_object;
    crate::ecmascript::abstract_operations::operations_on_objects::has_property(
        agent,
        global,
        key,
    )
}
