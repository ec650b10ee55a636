// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The object protocol: every property operation the interpreter performs
//! enters through here and drives a [`LookupIterator`] walk.

use ahash::AHashSet;

use crate::ecmascript::builtins::global_object::global_write_cell;
use crate::ecmascript::builtins::ordinary::lookup::{LookupIterator, LookupState};
use crate::ecmascript::builtins::ordinary::{
    migrate_slow_to_fast, normalize_properties, ordinary_define_own_property, ordinary_delete,
    ordinary_own_keys, ordinary_set_prototype_of,
};
use crate::ecmascript::execution::{Agent, ExceptionType, JsResult};
use crate::ecmascript::types::{
    Function, Object, ObjectFlags, PropertyAttributes, PropertyDescriptor, PropertyKey,
    PropertyValue, Value,
};

use super::function_invocation::call_function;
use super::testing_and_comparison::is_callable;
use super::type_conversion::to_object;
use crate::ecmascript::types::ArgumentsList;

/// Re-exported creation entry point for the protocol's users.
pub use crate::ecmascript::builtins::ordinary::ordinary_object_create;

/// 7.3.2 Get ( O, P ), extended to arbitrary base values.
/// https://tc39.es/ecma262/#sec-get
///
/// A missing property reads as undefined; only a null or undefined base is
/// an error.
pub fn get_object_property(agent: &mut Agent, target: Value, key: PropertyKey) -> JsResult<Value> {
    if target.is_nullish() {
        let message = format!(
            "Cannot read properties of {} (reading '{}')",
            nullish_name(target),
            key.as_display_string(agent)
        );
        return Err(agent.throw_exception(ExceptionType::TypeError, &message));
    }
    let start = match target.as_object() {
        Some(object) => object,
        None => to_object(agent, target)?,
    };
    let mut iterator = LookupIterator::new(agent, target, start, key);
    loop {
        match iterator.state() {
            LookupState::Data { value, .. } => return Ok(value),
            LookupState::GlobalCell { cell, .. } => {
                let PropertyValue::Data { value, .. } = agent.heap[cell].property else {
                    unreachable!("Accessor cell surfaced as GlobalCell");
                };
                return Ok(value);
            }
            LookupState::Accessor { get, .. } => {
                let Some(getter) = get else {
                    return Ok(Value::Undefined);
                };
                // May re-enter the protocol and reshape the holder.
                return call_function(agent, getter, target, ArgumentsList(&[]));
            }
            LookupState::Interceptor => {
                let holder = iterator.holder().expect("Interceptor state without holder");
                let interceptor = holder
                    .named_interceptor(agent)
                    .expect("Interceptor state without interceptor");
                if let Some(value) = (interceptor.getter)(agent, holder, key)? {
                    return Ok(value);
                }
                iterator.next(agent);
            }
            // Reads treat an access-check refusal as absence.
            LookupState::AccessCheck | LookupState::NotFound => return Ok(Value::Undefined),
        }
    }
}

/// 7.3.4 Set ( O, P, V, Throw ), extended to arbitrary base values.
/// https://tc39.es/ecma262/#sec-set-o-p-v-throw
///
/// Prefers an existing data slot, then an inherited setter, then creation
/// of a new own data property. Failures are silent no-ops in sloppy mode
/// and TypeErrors in strict mode.
pub fn set_object_property(
    agent: &mut Agent,
    target: Value,
    key: PropertyKey,
    value: Value,
    strict: bool,
) -> JsResult<bool> {
    if target.is_nullish() {
        let message = format!(
            "Cannot set properties of {} (setting '{}')",
            nullish_name(target),
            key.as_display_string(agent)
        );
        return Err(agent.throw_exception(ExceptionType::TypeError, &message));
    }
    let Some(start) = target.as_object() else {
        // Primitive store targets drop the write; the transient wrapper
        // would be unobservable.
        return set_failed(agent, key, strict);
    };
    let mut iterator = LookupIterator::new(agent, target, start, key);
    loop {
        match iterator.state() {
            LookupState::Data { attrs, .. } => {
                if !attrs.is_writable() {
                    return set_failed(agent, key, strict);
                }
                let holder = iterator.holder().expect("Data state without holder");
                if holder == start {
                    return Ok(update_data_value(agent, holder, key, value, attrs));
                }
                // Inherited writable data property: shadow it on the
                // receiver.
                return create_data_property_checked(agent, start, key, value, strict);
            }
            LookupState::GlobalCell { cell, attrs } => {
                if !attrs.is_writable() {
                    return set_failed(agent, key, strict);
                }
                let holder = iterator.holder().expect("GlobalCell state without holder");
                if holder == start {
                    global_write_cell(agent, cell, PropertyValue::Data { value, attrs });
                    return Ok(true);
                }
                return create_data_property_checked(agent, start, key, value, strict);
            }
            LookupState::Accessor { set, .. } => {
                let Some(setter) = set else {
                    return set_failed(agent, key, strict);
                };
                call_function(agent, setter, target, ArgumentsList(&[value]))?;
                return Ok(true);
            }
            LookupState::Interceptor => {
                let holder = iterator.holder().expect("Interceptor state without holder");
                let interceptor = holder
                    .named_interceptor(agent)
                    .expect("Interceptor state without interceptor");
                if let Some(setter) = interceptor.setter {
                    if let Some(done) = setter(agent, holder, key, value)? {
                        return Ok(done);
                    }
                }
                iterator.next(agent);
            }
            LookupState::AccessCheck => {
                // Writes fail loudly where reads fall back to absence.
                return set_failed(agent, key, strict);
            }
            LookupState::NotFound => {
                return create_data_property_checked(agent, start, key, value, strict);
            }
        }
    }
}

fn set_failed(agent: &mut Agent, key: PropertyKey, strict: bool) -> JsResult<bool> {
    if strict {
        let message = format!(
            "Cannot assign to read only property '{}' of object",
            key.as_display_string(agent)
        );
        return Err(agent.throw_exception(ExceptionType::TypeError, &message));
    }
    Ok(false)
}

/// Overwrite an existing own data property's value, leaving its attributes
/// untouched.
fn update_data_value(
    agent: &mut Agent,
    holder: Object,
    key: PropertyKey,
    value: Value,
    attrs: PropertyAttributes,
) -> bool {
    crate::ecmascript::builtins::ordinary::write_own_property(
        agent,
        holder,
        key,
        PropertyValue::Data { value, attrs },
    )
}

/// Create a new own data property with default attributes, subject to
/// extensibility and element integrity flags.
fn create_data_property_checked(
    agent: &mut Agent,
    object: Object,
    key: PropertyKey,
    value: Value,
    strict: bool,
) -> JsResult<bool> {
    if let PropertyKey::Integer(_) = key {
        let flags = object.flags(agent);
        if flags.intersects(ObjectFlags::SEALED_ELEMENTS | ObjectFlags::FROZEN_ELEMENTS) {
            return set_failed(agent, key, strict);
        }
    }
    if !object.internal_extensible(agent) {
        return set_failed(agent, key, strict);
    }
    if create_data_property(agent, object, key, value) {
        Ok(true)
    } else {
        set_failed(agent, key, strict)
    }
}

/// 7.3.5 CreateDataProperty ( O, P, V )
/// https://tc39.es/ecma262/#sec-createdataproperty
pub fn create_data_property(
    agent: &mut Agent,
    object: Object,
    key: PropertyKey,
    value: Value,
) -> bool {
    crate::ecmascript::builtins::ordinary::write_own_property(
        agent,
        object,
        key,
        PropertyValue::new_data(value),
    )
}

/// 7.3.8 DefinePropertyOrThrow ( O, P, desc ), sans the throw: the unified
/// define entry point, bypassing accessor execution.
pub fn define_own_property(
    agent: &mut Agent,
    object: Object,
    key: PropertyKey,
    descriptor: PropertyDescriptor,
) -> JsResult<bool> {
    if object.needs_access_check(agent) && !agent.may_access(object) {
        return Ok(false);
    }
    ordinary_define_own_property(agent, object, key, descriptor)
}

/// 7.3.10 DeletePropertyOrThrow ( O, P ), with sloppy mode folded in.
pub fn delete_object_property(
    agent: &mut Agent,
    object: Object,
    key: PropertyKey,
    strict: bool,
) -> JsResult<bool> {
    if object.needs_access_check(agent) && !agent.may_access(object) {
        return delete_failed(agent, key, strict);
    }
    if ordinary_delete(agent, object, key) {
        return Ok(true);
    }
    delete_failed(agent, key, strict)
}

fn delete_failed(agent: &mut Agent, key: PropertyKey, strict: bool) -> JsResult<bool> {
    if strict {
        let message = format!(
            "Cannot delete property '{}' of object",
            key.as_display_string(agent)
        );
        return Err(agent.throw_exception(ExceptionType::TypeError, &message));
    }
    Ok(false)
}

/// 7.3.12 HasProperty ( O, P )
/// https://tc39.es/ecma262/#sec-hasproperty
///
/// Never executes accessors; an interceptor answers through its query
/// callback, or counts as present when it has none.
pub fn has_property(agent: &mut Agent, object: Object, key: PropertyKey) -> JsResult<bool> {
    let iterator = LookupIterator::new(agent, object.into(), object, key);
    has_with_iterator(agent, iterator)
}

/// 7.3.13 HasOwnProperty ( O, P ), recursing through hidden prototypes as
/// if their properties were own.
pub fn has_own_property(agent: &mut Agent, object: Object, key: PropertyKey) -> JsResult<bool> {
    let iterator = LookupIterator::new_own(agent, object.into(), object, key);
    has_with_iterator(agent, iterator)
}

fn has_with_iterator(agent: &mut Agent, mut iterator: LookupIterator) -> JsResult<bool> {
    loop {
        match iterator.state() {
            LookupState::Data { .. }
            | LookupState::Accessor { .. }
            | LookupState::GlobalCell { .. } => return Ok(true),
            LookupState::Interceptor => {
                let holder = iterator.holder().expect("Interceptor state without holder");
                let interceptor = holder
                    .named_interceptor(agent)
                    .expect("Interceptor state without interceptor");
                let Some(query) = interceptor.query else {
                    return Ok(true);
                };
                if query(agent, holder, iterator.key()).is_some() {
                    return Ok(true);
                }
                iterator.next(agent);
            }
            LookupState::AccessCheck | LookupState::NotFound => return Ok(false),
        }
    }
}

/// Own keys in canonical order: integer indices ascending, then named keys
/// in creation order, with hidden-prototype keys folded in and duplicates
/// elided. An access-check refusal drops that link's keys and keeps
/// walking.
pub fn own_property_keys(
    agent: &mut Agent,
    object: Object,
    include_prototypes: bool,
) -> Vec<PropertyKey> {
    let mut integer_keys: Vec<u32> = Vec::new();
    let mut named_keys: Vec<PropertyKey> = Vec::new();
    let mut seen: AHashSet<PropertyKey> = AHashSet::new();
    let mut link = Some(object);
    let mut folding_hidden = true;
    while let Some(holder) = link {
        if !(include_prototypes || folding_hidden) {
            break;
        }
        if !holder.needs_access_check(agent) || agent.may_access(holder) {
            let mut keys = ordinary_own_keys(agent, holder);
            if let Some(interceptor) = holder.named_interceptor(agent) {
                if let Some(enumerator) = interceptor.enumerator {
                    keys.extend(enumerator(agent, holder));
                }
            }
            for key in keys {
                if !seen.insert(key) {
                    continue;
                }
                match key {
                    PropertyKey::Integer(index) => integer_keys.push(index),
                    PropertyKey::String(_) => named_keys.push(key),
                }
            }
        }
        link = holder.internal_prototype(agent);
        folding_hidden = link.is_some_and(|next| next.is_hidden_prototype(agent));
    }
    integer_keys.sort_unstable();
    let mut keys: Vec<PropertyKey> = integer_keys
        .into_iter()
        .map(PropertyKey::Integer)
        .collect();
    keys.extend(named_keys);
    keys
}

/// The fixed-shape own-property record handed across the external
/// interface: value and writability for data properties, the accessor pair
/// for accessors, never both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnPropertyRecord {
    pub is_accessor: bool,
    pub value: Option<Value>,
    pub getter: Option<Function>,
    pub setter: Option<Function>,
    pub writable: Option<bool>,
    pub enumerable: bool,
    pub configurable: bool,
}

/// Own-property descriptor query, hidden prototypes included.
pub fn get_own_property_record(
    agent: &mut Agent,
    object: Object,
    key: PropertyKey,
) -> Option<OwnPropertyRecord> {
    let iterator = LookupIterator::new_own(agent, object.into(), object, key);
    let (stored, attrs) = match iterator.state() {
        LookupState::Data { value, attrs } => (PropertyValue::Data { value, attrs }, attrs),
        LookupState::Accessor { get, set, attrs } => {
            (PropertyValue::Accessor { get, set, attrs }, attrs)
        }
        LookupState::GlobalCell { cell, attrs } => (agent.heap[cell].property, attrs),
        _ => return None,
    };
    Some(match stored {
        PropertyValue::Data { value, .. } => OwnPropertyRecord {
            is_accessor: false,
            value: Some(value),
            getter: None,
            setter: None,
            writable: Some(attrs.is_writable()),
            enumerable: attrs.is_enumerable(),
            configurable: attrs.is_configurable(),
        },
        PropertyValue::Accessor { get, set, .. } => OwnPropertyRecord {
            is_accessor: true,
            value: None,
            getter: get,
            setter: set,
            writable: None,
            enumerable: attrs.is_enumerable(),
            configurable: attrs.is_configurable(),
        },
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityLevel {
    Sealed,
    Frozen,
}

/// 7.3.15 SetIntegrityLevel ( O, level )
/// https://tc39.es/ecma262/#sec-setintegritylevel
///
/// Idempotent. Objects whose elements alias external storage cannot be
/// reattributed and are rejected up front.
pub fn set_integrity_level(
    agent: &mut Agent,
    object: Object,
    level: IntegrityLevel,
) -> JsResult<bool> {
    if object.flags(agent).contains(ObjectFlags::ALIASED_ARGUMENTS) {
        return Err(agent.throw_exception(
            ExceptionType::TypeError,
            "Cannot redefine the elements of an arguments object with aliased elements",
        ));
    }
    object.internal_set_extensible(agent, false);
    let Some(backing) = object.get_backing_object(agent) else {
        return Ok(true);
    };
    let freeze = level == IntegrityLevel::Frozen;
    let keys = ordinary_own_keys(agent, object);
    for key in keys {
        if let PropertyKey::Integer(_) = key {
            continue;
        }
        reattribute_own_property(agent, object, key, freeze);
    }
    let element_flags = if freeze {
        ObjectFlags::SEALED_ELEMENTS | ObjectFlags::FROZEN_ELEMENTS
    } else {
        ObjectFlags::SEALED_ELEMENTS
    };
    agent.heap[backing].flags |= element_flags;
    Ok(true)
}

fn reattribute_own_property(agent: &mut Agent, object: Object, key: PropertyKey, freeze: bool) {
    let Some(backing) = object.get_backing_object(agent) else {
        return;
    };
    if agent.heap[backing].storage.is_global() {
        let Some(cell) =
            crate::ecmascript::builtins::global_object::global_cell_for(agent, backing, key)
        else {
            return;
        };
        let mut property = agent.heap[cell].property;
        restrict_attributes(&mut property, freeze);
        global_write_cell(agent, cell, property);
        return;
    }
    if agent.heap[backing].storage.is_fast() {
        let Some(slot) = agent.heap[backing].shape.key_slot(agent, key) else {
            return;
        };
        if let Some(stored) = agent.heap[backing].storage.fast_slot_mut(slot) {
            restrict_attributes(stored, freeze);
        }
        return;
    }
    if let Some(stored) = agent.heap[backing].storage.dictionary_get_mut(key) {
        restrict_attributes(stored, freeze);
    }
}

fn restrict_attributes(stored: &mut PropertyValue, freeze: bool) {
    let mut attrs = stored.attributes() - PropertyAttributes::CONFIGURABLE;
    if freeze && !stored.is_accessor() {
        attrs -= PropertyAttributes::WRITABLE;
    }
    stored.set_attributes(attrs);
}

/// 7.3.16 TestIntegrityLevel ( O, level )
/// https://tc39.es/ecma262/#sec-testintegritylevel
pub fn test_integrity_level(agent: &mut Agent, object: Object, level: IntegrityLevel) -> bool {
    if object.internal_extensible(agent) {
        return false;
    }
    let freeze = level == IntegrityLevel::Frozen;
    let flags = object.flags(agent);
    let elements_ok = if freeze {
        flags.contains(ObjectFlags::FROZEN_ELEMENTS)
    } else {
        flags.contains(ObjectFlags::SEALED_ELEMENTS)
    };
    if !elements_ok {
        let Some(backing) = object.get_backing_object(agent) else {
            return true;
        };
        if !agent.heap[backing].elements.own_indices().is_empty() {
            return false;
        }
    }
    let keys = ordinary_own_keys(agent, object);
    for key in keys {
        if let PropertyKey::Integer(_) = key {
            continue;
        }
        let Some(record) = get_own_property_record(agent, object, key) else {
            continue;
        };
        if record.configurable {
            return false;
        }
        if freeze && record.writable == Some(true) {
            return false;
        }
    }
    true
}

/// 7.3.14 / 10.1.4.1 PreventExtensions and the matching query.
pub fn prevent_extensions(agent: &mut Agent, object: Object) -> bool {
    object.internal_set_extensible(agent, false);
    true
}

pub fn is_extensible(agent: &Agent, object: Object) -> bool {
    object.internal_extensible(agent)
}

/// Pre-transition an object to dictionary properties ahead of a bulk
/// addition, bounding the count so adversarial inputs cannot blow up
/// normalization cost.
pub fn optimize_for_adding_multiple_properties(
    agent: &mut Agent,
    object: Object,
    expected_count: u32,
) -> JsResult<()> {
    if expected_count > agent.options.bulk_property_limit {
        return Err(agent.throw_exception(ExceptionType::RangeError, "Too many properties"));
    }
    let backing = object.get_or_create_backing_object(agent);
    if !agent.heap[backing].storage.is_global() {
        normalize_properties(agent, backing);
    }
    Ok(())
}

/// Undo [`optimize_for_adding_multiple_properties`] once the bulk addition
/// is over, restoring shape-addressed storage where profitable.
pub fn finish_adding_multiple_properties(agent: &mut Agent, object: Object) {
    let Some(backing) = object.get_backing_object(agent) else {
        return;
    };
    migrate_slow_to_fast(agent, backing);
}

/// 7.3.22 OrdinaryHasInstance ( C, O )
/// https://tc39.es/ecma262/#sec-ordinaryhasinstance
pub fn ordinary_has_instance(
    agent: &mut Agent,
    constructor: Value,
    value: Value,
) -> JsResult<bool> {
    if is_callable(constructor).is_none() {
        return Err(agent.throw_exception(
            ExceptionType::TypeError,
            "Right-hand side of 'instanceof' is not callable",
        ));
    }
    let Some(object) = value.as_object() else {
        return Ok(false);
    };
    let prototype_key = PropertyKey::from_str(agent, "prototype");
    let prototype = get_object_property(agent, constructor, prototype_key)?;
    let Some(prototype) = prototype.as_object() else {
        return Err(agent.throw_exception(
            ExceptionType::TypeError,
            "Function has non-object prototype in instanceof check",
        ));
    };
    let mut link = object.internal_prototype(agent);
    while let Some(candidate) = link {
        if candidate == prototype {
            return Ok(true);
        }
        link = candidate.internal_prototype(agent);
    }
    Ok(false)
}

/// The observable prototype: hidden prototypes stay invisible, and an
/// access-check refusal reads as a null prototype.
pub fn get_prototype_of(agent: &Agent, object: Object) -> Option<Object> {
    if object.needs_access_check(agent) && !agent.may_access(object) {
        return None;
    }
    let mut prototype = object.internal_prototype(agent);
    while let Some(candidate) = prototype {
        if !candidate.is_hidden_prototype(agent) {
            return Some(candidate);
        }
        prototype = candidate.internal_prototype(agent);
    }
    None
}

pub fn set_prototype_of(agent: &mut Agent, object: Object, prototype: Option<Object>) -> bool {
    if object.needs_access_check(agent) && !agent.may_access(object) {
        return false;
    }
    ordinary_set_prototype_of(agent, object, prototype)
}

fn nullish_name(value: Value) -> &'static str {
    match value {
        Value::Null => "null",
        _ => "undefined",
    }
}
