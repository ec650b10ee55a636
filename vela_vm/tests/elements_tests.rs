// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use vela_vm::heap::element_array::{ElementsKind, SPARSE_GAP_LIMIT};
use vela_vm::{
    delete_object_property, get_object_property, ordinary_object_create, own_property_keys,
    set_object_property, Agent, DefaultHostHooks, Object, Options, PropertyKey, Value,
};

static HOOKS: DefaultHostHooks = DefaultHostHooks;

fn new_agent() -> Agent {
    Agent::new(Options::default(), &HOOKS)
}

fn new_object(agent: &mut Agent) -> Object {
    let prototype = agent.realm().object_prototype;
    ordinary_object_create(agent, Some(prototype))
}

fn set_index(agent: &mut Agent, object: Object, index: u32, value: Value) {
    set_object_property(agent, object.into(), PropertyKey::Integer(index), value, true).unwrap();
}

fn get_index(agent: &mut Agent, object: Object, index: u32) -> Value {
    get_object_property(agent, object.into(), PropertyKey::Integer(index)).unwrap()
}

#[test]
fn kinds_widen_without_losing_values() {
    let mut agent = new_agent();
    let arr = new_object(&mut agent);
    set_index(&mut agent, arr, 0, Value::Integer(1));
    set_index(&mut agent, arr, 1, Value::Integer(2));
    set_index(&mut agent, arr, 2, Value::Integer(3));
    assert_eq!(arr.elements_kind(&agent), ElementsKind::PackedSmi);
    // A fractional store widens to doubles; neighbours survive.
    set_index(&mut agent, arr, 1, Value::Float(1.5));
    assert_eq!(arr.elements_kind(&agent), ElementsKind::PackedDouble);
    assert_eq!(get_index(&mut agent, arr, 0), Value::Integer(1));
    assert_eq!(get_index(&mut agent, arr, 1), Value::Float(1.5));
    assert_eq!(get_index(&mut agent, arr, 2), Value::Integer(3));
    // A string at index 5 widens to the mixed kind and holes 3 and 4.
    let s = agent.heap.alloc_string("s");
    set_index(&mut agent, arr, 5, Value::String(s));
    assert_eq!(arr.elements_kind(&agent), ElementsKind::Holey);
    assert_eq!(get_index(&mut agent, arr, 3), Value::Undefined);
    assert_eq!(get_index(&mut agent, arr, 4), Value::Undefined);
    assert_eq!(get_index(&mut agent, arr, 5), Value::String(s));
    assert_eq!(get_index(&mut agent, arr, 0), Value::Integer(1));
}

#[test]
fn integers_are_representable_in_a_double_store() {
    let mut agent = new_agent();
    let arr = new_object(&mut agent);
    set_index(&mut agent, arr, 0, Value::Float(0.5));
    assert_eq!(arr.elements_kind(&agent), ElementsKind::PackedDouble);
    // In-bounds integer stores stay in the double representation.
    set_index(&mut agent, arr, 0, Value::Integer(7));
    assert_eq!(arr.elements_kind(&agent), ElementsKind::PackedDouble);
    assert_eq!(get_index(&mut agent, arr, 0), Value::Float(7.0));
}

#[test]
fn out_of_bounds_store_on_doubles_widens_proactively() {
    let mut agent = new_agent();
    let arr = new_object(&mut agent);
    set_index(&mut agent, arr, 0, Value::Float(0.5));
    assert_eq!(arr.elements_kind(&agent), ElementsKind::PackedDouble);
    // Growth past the end signals mixed traffic ahead; skip the double
    // detour.
    set_index(&mut agent, arr, 1, Value::Integer(1));
    assert_eq!(arr.elements_kind(&agent), ElementsKind::Packed);
    assert_eq!(get_index(&mut agent, arr, 0), Value::Float(0.5));
    assert_eq!(get_index(&mut agent, arr, 1), Value::Integer(1));
}

#[test]
fn deletion_makes_the_store_holey() {
    let mut agent = new_agent();
    let arr = new_object(&mut agent);
    set_index(&mut agent, arr, 0, Value::Integer(1));
    set_index(&mut agent, arr, 1, Value::Integer(2));
    assert!(delete_object_property(&mut agent, arr, PropertyKey::Integer(0), true).unwrap());
    assert_eq!(arr.elements_kind(&agent), ElementsKind::HoleySmi);
    assert_eq!(get_index(&mut agent, arr, 0), Value::Undefined);
    assert_eq!(get_index(&mut agent, arr, 1), Value::Integer(2));
    let keys = own_property_keys(&mut agent, arr, false);
    assert_eq!(keys, vec![PropertyKey::Integer(1)]);
}

#[test]
fn far_writes_fall_back_to_dictionary_elements() {
    let mut agent = new_agent();
    let arr = new_object(&mut agent);
    set_index(&mut agent, arr, 0, Value::Integer(1));
    set_index(&mut agent, arr, SPARSE_GAP_LIMIT + 10, Value::Integer(2));
    assert_eq!(arr.elements_kind(&agent), ElementsKind::Dictionary);
    assert_eq!(get_index(&mut agent, arr, 0), Value::Integer(1));
    assert_eq!(
        get_index(&mut agent, arr, SPARSE_GAP_LIMIT + 10),
        Value::Integer(2)
    );
    // Enumeration still reports ascending indices.
    let keys = own_property_keys(&mut agent, arr, false);
    assert_eq!(
        keys,
        vec![
            PropertyKey::Integer(0),
            PropertyKey::Integer(SPARSE_GAP_LIMIT + 10),
        ]
    );
}

#[test]
fn holes_resolve_through_the_prototype() {
    let mut agent = new_agent();
    let parent = new_object(&mut agent);
    let arr = new_object(&mut agent);
    vela_vm::set_prototype_of(&mut agent, arr, Some(parent));
    set_index(&mut agent, parent, 1, Value::Integer(99));
    set_index(&mut agent, arr, 0, Value::Integer(1));
    set_index(&mut agent, arr, 2, Value::Integer(3));
    // Index 1 is a hole in arr; the walk continues into the prototype.
    assert_eq!(get_index(&mut agent, arr, 1), Value::Integer(99));
}
