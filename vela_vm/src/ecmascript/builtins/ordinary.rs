// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod lookup;
pub mod shape;

use tracing::debug;

use crate::ecmascript::abstract_operations::testing_and_comparison::same_value;
use crate::ecmascript::execution::{Agent, JsResult};
use crate::ecmascript::types::{
    Object, ObjectHeapData, PropertyDescriptor, PropertyKey, PropertyValue, Value,
};
use crate::heap::indexes::ObjectIndex;

use self::lookup::{element_attributes, lookup_own, LookupState};
use self::shape::ObjectShape;

use super::global_object::{global_define_own, global_delete_own};

/// Create an ordinary object with the given prototype.
pub fn ordinary_object_create(agent: &mut Agent, prototype: Option<Object>) -> Object {
    Object::Object(ObjectHeapData::create(agent, prototype))
}

/// 10.1.5.1 OrdinaryGetOwnProperty ( O, P )
/// https://tc39.es/ecma262/#sec-ordinarygetownproperty
pub fn ordinary_get_own_property(
    agent: &Agent,
    object: Object,
    key: PropertyKey,
) -> Option<PropertyDescriptor> {
    match lookup_own(agent, object, key)? {
        LookupState::Data { value, attrs } => Some(PropertyDescriptor::from(PropertyValue::Data {
            value,
            attrs,
        })),
        LookupState::Accessor { get, set, attrs } => {
            Some(PropertyDescriptor::from(PropertyValue::Accessor {
                get,
                set,
                attrs,
            }))
        }
        LookupState::GlobalCell { cell, .. } => {
            Some(PropertyDescriptor::from(agent.heap[cell].property))
        }
        _ => None,
    }
}

/// 10.1.6.1 OrdinaryDefineOwnProperty ( O, P, Desc )
/// https://tc39.es/ecma262/#sec-ordinarydefineownproperty
pub fn ordinary_define_own_property(
    agent: &mut Agent,
    object: Object,
    key: PropertyKey,
    descriptor: PropertyDescriptor,
) -> JsResult<bool> {
    let current = ordinary_get_own_property(agent, object, key);
    let extensible = object.internal_extensible(agent);
    Ok(validate_and_apply_property_descriptor(
        agent,
        Some(object),
        key,
        extensible,
        descriptor,
        current,
    ))
}

/// 10.1.6.3 ValidateAndApplyPropertyDescriptor ( O, P, extensible, Desc,
/// current )
/// https://tc39.es/ecma262/#sec-validateandapplypropertydescriptor
///
/// With `object` None this only validates; with Some it also writes the
/// resulting property.
pub fn validate_and_apply_property_descriptor(
    agent: &mut Agent,
    object: Option<Object>,
    key: PropertyKey,
    extensible: bool,
    descriptor: PropertyDescriptor,
    current: Option<PropertyDescriptor>,
) -> bool {
    let Some(current) = current else {
        // 2. If current is undefined, then
        if !extensible {
            return false;
        }
        let Some(object) = object else {
            return true;
        };
        let mut completed = descriptor;
        completed.complete();
        return write_own_property(agent, object, key, completed.into_property_value());
    };
    // 3. If every field in Desc is absent, return true.
    if descriptor.value.is_none()
        && descriptor.writable.is_none()
        && descriptor.get.is_none()
        && descriptor.set.is_none()
        && descriptor.enumerable.is_none()
        && descriptor.configurable.is_none()
    {
        return true;
    }
    // 4. If current.[[Configurable]] is false, then
    if current.configurable == Some(false) {
        if descriptor.configurable == Some(true) {
            return false;
        }
        if descriptor
            .enumerable
            .is_some_and(|enumerable| Some(enumerable) != current.enumerable)
        {
            return false;
        }
        if descriptor.is_accessor_descriptor() != current.is_accessor_descriptor()
            && !descriptor.is_generic_descriptor()
        {
            return false;
        }
        if current.is_accessor_descriptor() {
            if descriptor.get.is_some_and(|get| Some(get) != current.get)
                || descriptor.set.is_some_and(|set| Some(set) != current.set)
            {
                return false;
            }
        } else if current.writable == Some(false) {
            if descriptor.writable == Some(true) {
                return false;
            }
            if let Some(value) = descriptor.value {
                if !same_value(value, current.value.unwrap_or(Value::Undefined)) {
                    return false;
                }
            }
        }
    }
    let Some(object) = object else {
        return true;
    };
    // 6. Merge Desc into current and store the result.
    let mut merged = current;
    if descriptor.is_data_descriptor() && current.is_accessor_descriptor() {
        merged = PropertyDescriptor {
            enumerable: current.enumerable,
            configurable: current.configurable,
            ..Default::default()
        };
        merged.value = Some(descriptor.value.unwrap_or(Value::Undefined));
        merged.writable = Some(descriptor.writable.unwrap_or(false));
    } else if descriptor.is_accessor_descriptor() && current.is_data_descriptor() {
        merged = PropertyDescriptor {
            enumerable: current.enumerable,
            configurable: current.configurable,
            ..Default::default()
        };
        merged.get = Some(descriptor.get.flatten());
        merged.set = Some(descriptor.set.flatten());
    } else {
        if let Some(value) = descriptor.value {
            merged.value = Some(value);
        }
        if let Some(writable) = descriptor.writable {
            merged.writable = Some(writable);
        }
        if let Some(get) = descriptor.get {
            merged.get = Some(get);
        }
        if let Some(set) = descriptor.set {
            merged.set = Some(set);
        }
    }
    if let Some(enumerable) = descriptor.enumerable {
        merged.enumerable = Some(enumerable);
    }
    if let Some(configurable) = descriptor.configurable {
        merged.configurable = Some(configurable);
    }
    merged.complete();
    write_own_property(agent, object, key, merged.into_property_value())
}

/// Store an own property with exact attributes, transitioning storage mode
/// as needed. Returns false when the requested form cannot be represented,
/// which only happens for indexed properties whose attributes diverge from
/// the store-wide element attributes.
pub(crate) fn write_own_property(
    agent: &mut Agent,
    object: Object,
    key: PropertyKey,
    property: PropertyValue,
) -> bool {
    let backing = object.get_or_create_backing_object(agent);
    if let PropertyKey::Integer(index) = key {
        // Elements carry no per-entry attributes.
        let PropertyValue::Data { value, attrs } = property else {
            return false;
        };
        if attrs != element_attributes(agent.heap[backing].flags) {
            return false;
        }
        let elements = &mut agent.heap[backing].elements;
        elements.transition_for_out_of_bounds_access(index);
        elements.set(index, value);
        return true;
    }
    if let (Object::Function(function), PropertyKey::String(name)) = (object, key) {
        // Rewriting a constructor's `prototype` drops its cached instance
        // shape; the next construction re-resolves the property.
        if agent.heap.get_string(name) == "prototype" {
            agent.heap[function.0].initial_shape = None;
        }
    }
    if agent.heap[backing].storage.is_global() {
        global_define_own(agent, backing, key, property);
        return true;
    }
    if !agent.heap[backing].storage.is_fast() {
        agent.heap[backing].storage.dictionary_insert(key, property);
        return true;
    }
    let shape = agent.heap[backing].shape;
    if let Some(slot) = shape.key_slot(agent, key) {
        *agent.heap[backing]
            .storage
            .fast_slot_mut(slot)
            .expect("Fast slot missing for shape key") = property;
        return true;
    }
    if shape.len(agent) >= agent.options.dictionary_transition_limit {
        normalize_properties(agent, backing);
        agent.heap[backing].storage.dictionary_insert(key, property);
        return true;
    }
    let child = shape.get_or_create_child_shape(agent, key);
    let data = &mut agent.heap[backing];
    data.shape = child;
    data.storage.push_fast(property);
    true
}

/// 10.1.10.1 OrdinaryDelete ( O, P )
/// https://tc39.es/ecma262/#sec-ordinarydelete
pub fn ordinary_delete(agent: &mut Agent, object: Object, key: PropertyKey) -> bool {
    let Some(backing) = object.get_backing_object(agent) else {
        return true;
    };
    if let PropertyKey::Integer(index) = key {
        let flags = agent.heap[backing].flags;
        if !element_attributes(flags).is_configurable() {
            return !agent.heap[backing].elements.has(index);
        }
        agent.heap[backing].elements.delete(index);
        return true;
    }
    let Some(state) = lookup_own(agent, object, key) else {
        return true;
    };
    let configurable = match state {
        LookupState::Data { attrs, .. }
        | LookupState::Accessor { attrs, .. }
        | LookupState::GlobalCell { attrs, .. } => attrs.is_configurable(),
        _ => return true,
    };
    if !configurable {
        return false;
    }
    if agent.heap[backing].storage.is_global() {
        return global_delete_own(agent, backing, key);
    }
    if agent.heap[backing].storage.is_fast() {
        let shape = agent.heap[backing].shape;
        // Only the most recently added key can be dropped while staying
        // fast; any other deletion falls back to dictionary storage.
        if let Some(parent) = shape.get_parent_shape_for_pop(agent, key) {
            let data = &mut agent.heap[backing];
            data.shape = parent;
            data.storage.pop_fast();
            return true;
        }
        normalize_properties(agent, backing);
    }
    agent.heap[backing].storage.dictionary_remove(key)
}

/// 10.1.2.1 OrdinarySetPrototypeOf ( O, V )
/// https://tc39.es/ecma262/#sec-ordinarysetprototypeof
pub fn ordinary_set_prototype_of(
    agent: &mut Agent,
    object: Object,
    prototype: Option<Object>,
) -> bool {
    let current = object.internal_prototype(agent);
    if prototype == current {
        return true;
    }
    if !object.internal_extensible(agent) {
        return false;
    }
    // 8. Repeat, while done is false: reject prototype cycles.
    let mut walked = prototype;
    while let Some(link) = walked {
        if link == object {
            return false;
        }
        walked = link.internal_prototype(agent);
    }
    let backing = object.get_or_create_backing_object(agent);
    let new_shape = if agent.heap[backing].storage.is_fast() {
        let shape = agent.heap[backing].shape;
        shape.shape_with_prototype(agent, prototype)
    } else {
        ObjectShape::get_or_create_shape_for_prototype(agent, prototype)
    };
    agent.heap[backing].shape = new_shape;
    true
}

/// Own property keys in canonical order: integer indices ascending, then
/// named keys in creation order.
pub fn ordinary_own_keys(agent: &Agent, object: Object) -> Vec<PropertyKey> {
    let Some(backing) = object.get_backing_object(agent) else {
        return Vec::new();
    };
    let data = &agent.heap[backing];
    let mut keys: Vec<PropertyKey> = data
        .elements
        .own_indices()
        .into_iter()
        .map(PropertyKey::Integer)
        .collect();
    if data.storage.is_fast() {
        let shape_keys = data.shape.keys(agent);
        for (slot, key) in shape_keys.iter().enumerate() {
            // Pre-allocated but never written fields are not own keys yet.
            match data.storage.fast_slot(slot) {
                Some(PropertyValue::Data { value, .. }) if value == Value::Uninitialized => {}
                Some(_) => keys.push(*key),
                None => {}
            }
        }
    } else {
        keys.extend(data.storage.slow_keys_in_order());
    }
    keys
}

/// Move an object's named properties from shape-addressed fast storage to a
/// self-describing dictionary.
pub(crate) fn normalize_properties(agent: &mut Agent, backing: ObjectIndex) {
    if !agent.heap[backing].storage.is_fast() {
        return;
    }
    let shape = agent.heap[backing].shape;
    let keys = shape.keys(agent).to_vec();
    let prototype = shape.get_prototype(agent);
    let values = agent.heap[backing].storage.take_fast_for_normalize();
    debug!(property_count = keys.len(), "normalizing object to dictionary properties");
    let mut storage = crate::ecmascript::types::property_storage::PropertyStorage::new_dictionary();
    for (key, value) in keys.into_iter().zip(values) {
        let Some(value) = value else {
            continue;
        };
        if matches!(value, PropertyValue::Data { value, .. } if value == Value::Uninitialized) {
            continue;
        }
        storage.dictionary_insert(key, value);
    }
    let root_shape = ObjectShape::get_or_create_shape_for_prototype(agent, prototype);
    let data = &mut agent.heap[backing];
    data.storage = storage;
    data.shape = root_shape;
}

/// The inverse of [`normalize_properties`]: rebuild a shape from a
/// dictionary's insertion order and return to fast storage. Skipped when
/// the property count would immediately re-normalize.
pub(crate) fn migrate_slow_to_fast(agent: &mut Agent, backing: ObjectIndex) {
    let data = &agent.heap[backing];
    if data.storage.is_fast() || data.storage.is_global() {
        return;
    }
    if data.storage.dictionary_len() as u32 > agent.options.dictionary_transition_limit {
        return;
    }
    let keys = data.storage.slow_keys_in_order();
    let prototype = data.shape.get_prototype(agent);
    debug!(property_count = keys.len(), "migrating dictionary object back to fast properties");
    let mut shape = ObjectShape::get_or_create_shape_for_prototype(agent, prototype);
    let mut values = Vec::with_capacity(keys.len());
    for key in keys {
        let value = agent.heap[backing]
            .storage
            .dictionary_get(key)
            .expect("Dictionary key vanished during migration");
        shape = shape.get_or_create_child_shape(agent, key);
        values.push(Some(value));
    }
    let data = &mut agent.heap[backing];
    data.storage.replace_fast(values);
    data.shape = shape;
}
