// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use vela_vm::ecmascript::builtins::{create_builtin_function, BuiltinFunctionArgs};
use vela_vm::{
    define_own_property, delete_object_property, get_object_property, load_global_via_slot,
    own_property_keys, set_object_property, store_global_via_slot, Agent, ArgumentsList,
    Behaviour, DefaultHostHooks, ExceptionType, GlobalSlot, JsResult, Options, PropertyDescriptor,
    PropertyKey, Value,
};

static HOOKS: DefaultHostHooks = DefaultHostHooks;

fn new_agent() -> Agent {
    Agent::new(Options::default(), &HOOKS)
}

fn define_global(agent: &mut Agent, name: &str, value: Value) -> PropertyKey {
    let global = agent.realm().global_object;
    let key = PropertyKey::from_str(agent, name);
    set_object_property(agent, global.into(), key, value, true).unwrap();
    key
}

#[test]
fn globals_resolve_through_the_object_protocol() {
    let mut agent = new_agent();
    let key = define_global(&mut agent, "answer", Value::Integer(42));
    let global = agent.realm().global_object;
    assert_eq!(
        get_object_property(&mut agent, global.into(), key).unwrap(),
        Value::Integer(42)
    );
    let keys = own_property_keys(&mut agent, global, false);
    assert_eq!(keys, vec![key]);
}

#[test]
fn slot_loads_cache_the_owning_cell() {
    let mut agent = new_agent();
    let key = define_global(&mut agent, "counter", Value::Integer(1));
    let mut slot = GlobalSlot::new();
    assert_eq!(
        load_global_via_slot(&mut agent, key, &mut slot).unwrap(),
        Value::Integer(1)
    );
    assert!(slot.is_populated());
    // Mutations through the protocol stay visible through the cached cell.
    let global = agent.realm().global_object;
    set_object_property(&mut agent, global.into(), key, Value::Integer(2), true).unwrap();
    assert_eq!(
        load_global_via_slot(&mut agent, key, &mut slot).unwrap(),
        Value::Integer(2)
    );
}

#[test]
fn slot_stores_write_through_the_cell() {
    let mut agent = new_agent();
    let key = define_global(&mut agent, "x", Value::Integer(1));
    let mut slot = GlobalSlot::new();
    // First store repopulates the slot; the value must degrade the cell
    // from constant to mutable before caching.
    store_global_via_slot(&mut agent, key, Value::Integer(2), true, &mut slot).unwrap();
    assert!(slot.is_populated());
    store_global_via_slot(&mut agent, key, Value::Integer(3), true, &mut slot).unwrap();
    let global = agent.realm().global_object;
    assert_eq!(
        get_object_property(&mut agent, global.into(), key).unwrap(),
        Value::Integer(3)
    );
}

#[test]
fn deletion_invalidates_cached_cells() {
    let mut agent = new_agent();
    let key = define_global(&mut agent, "ephemeral", Value::Integer(1));
    let mut slot = GlobalSlot::new();
    load_global_via_slot(&mut agent, key, &mut slot).unwrap();
    assert!(slot.is_populated());
    let global = agent.realm().global_object;
    assert!(delete_object_property(&mut agent, global, key, true).unwrap());
    // The stale cell is released and the binding is gone.
    let error = load_global_via_slot(&mut agent, key, &mut slot).unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::ReferenceError));
    assert!(!slot.is_populated());
}

fn global_getter(agent: &mut Agent, _this: Value, _args: ArgumentsList) -> JsResult<Value> {
    let _ = agent;
    Ok(Value::Integer(1000))
}

#[test]
fn redefinition_to_accessor_invalidates_the_cell() {
    let mut agent = new_agent();
    let key = define_global(&mut agent, "reshaped", Value::Integer(1));
    let mut slot = GlobalSlot::new();
    load_global_via_slot(&mut agent, key, &mut slot).unwrap();
    assert!(slot.is_populated());
    let getter = create_builtin_function(
        &mut agent,
        Behaviour::Regular(global_getter),
        BuiltinFunctionArgs::new("get reshaped", 0),
    );
    let global = agent.realm().global_object;
    let descriptor = PropertyDescriptor {
        get: Some(Some(getter)),
        set: Some(None),
        enumerable: Some(true),
        configurable: Some(true),
        ..Default::default()
    };
    assert!(define_own_property(&mut agent, global, key, descriptor).unwrap());
    // The stale data cell misses; resolution falls back to the accessor
    // and must not repopulate the slot.
    assert_eq!(
        load_global_via_slot(&mut agent, key, &mut slot).unwrap(),
        Value::Integer(1000)
    );
    assert!(!slot.is_populated());
}

#[test]
fn undeclared_globals_are_reference_errors() {
    let mut agent = new_agent();
    let key = PropertyKey::from_str(&mut agent, "neverDeclared");
    let mut slot = GlobalSlot::new();
    let error = load_global_via_slot(&mut agent, key, &mut slot).unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::ReferenceError));
}

#[test]
fn global_enumeration_preserves_declaration_order() {
    let mut agent = new_agent();
    let b = define_global(&mut agent, "b", Value::Integer(1));
    let a = define_global(&mut agent, "a", Value::Integer(2));
    let c = define_global(&mut agent, "c", Value::Integer(3));
    let global = agent.realm().global_object;
    assert_eq!(own_property_keys(&mut agent, global, false), vec![b, a, c]);
}
