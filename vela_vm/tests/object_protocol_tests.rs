// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use vela_vm::ecmascript::builtins::{create_builtin_function, BuiltinFunctionArgs};
use vela_vm::{
    create_data_property, define_own_property, delete_object_property,
    finish_adding_multiple_properties, get_object_property, get_own_property_record,
    get_prototype_of, has_own_property, has_property, optimize_for_adding_multiple_properties,
    ordinary_object_create, own_property_keys, set_integrity_level, set_object_property,
    set_prototype_of, test_integrity_level, Agent, ArgumentsList, Behaviour, DefaultHostHooks,
    ExceptionType, IntegrityLevel, JsResult, NamedInterceptor, Object, ObjectFlags, Options,
    PropertyDescriptor, PropertyKey, Value,
};

static HOOKS: DefaultHostHooks = DefaultHostHooks;

fn new_agent() -> Agent {
    Agent::new(Options::default(), &HOOKS)
}

fn new_object(agent: &mut Agent) -> Object {
    let prototype = agent.realm().object_prototype;
    ordinary_object_create(agent, Some(prototype))
}

#[test]
fn set_then_get_round_trips() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let key = PropertyKey::from_str(&mut agent, "answer");
    set_object_property(&mut agent, object.into(), key, Value::Integer(42), true).unwrap();
    let result = get_object_property(&mut agent, object.into(), key).unwrap();
    assert_eq!(result, Value::Integer(42));
}

#[test]
fn missing_property_reads_undefined() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let key = PropertyKey::from_str(&mut agent, "missing");
    let result = get_object_property(&mut agent, object.into(), key).unwrap();
    assert_eq!(result, Value::Undefined);
}

#[test]
fn nullish_base_is_a_type_error() {
    let mut agent = new_agent();
    let key = PropertyKey::from_str(&mut agent, "x");
    let error = get_object_property(&mut agent, Value::Null, key).unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::TypeError));
    let error = set_object_property(&mut agent, Value::Undefined, key, Value::Null, false)
        .unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::TypeError));
}

#[test]
fn prototype_chain_precedence_and_shadowing() {
    let mut agent = new_agent();
    let parent = new_object(&mut agent);
    let child = new_object(&mut agent);
    assert!(set_prototype_of(&mut agent, child, Some(parent)));
    let key = PropertyKey::from_str(&mut agent, "x");
    set_object_property(&mut agent, parent.into(), key, Value::Integer(1), true).unwrap();
    assert_eq!(
        get_object_property(&mut agent, child.into(), key).unwrap(),
        Value::Integer(1)
    );
    // Writing through the child shadows; the parent stays untouched.
    set_object_property(&mut agent, child.into(), key, Value::Integer(2), true).unwrap();
    assert_eq!(
        get_object_property(&mut agent, child.into(), key).unwrap(),
        Value::Integer(2)
    );
    assert_eq!(
        get_object_property(&mut agent, parent.into(), key).unwrap(),
        Value::Integer(1)
    );
    assert!(has_property(&mut agent, child, key).unwrap());
    assert!(has_own_property(&mut agent, child, key).unwrap());
}

#[test]
fn inherited_properties_are_not_own() {
    let mut agent = new_agent();
    let parent = new_object(&mut agent);
    let child = new_object(&mut agent);
    set_prototype_of(&mut agent, child, Some(parent));
    let key = PropertyKey::from_str(&mut agent, "inherited");
    set_object_property(&mut agent, parent.into(), key, Value::Boolean(true), true).unwrap();
    assert!(has_property(&mut agent, child, key).unwrap());
    assert!(!has_own_property(&mut agent, child, key).unwrap());
}

fn constant_getter(agent: &mut Agent, _this: Value, _args: ArgumentsList) -> JsResult<Value> {
    let _ = agent;
    Ok(Value::Integer(42))
}

fn recording_setter(agent: &mut Agent, this: Value, args: ArgumentsList) -> JsResult<Value> {
    let key = PropertyKey::from_str(agent, "stored");
    set_object_property(agent, this, key, args.get(0), true)?;
    Ok(Value::Undefined)
}

#[test]
fn accessor_properties_route_through_their_functions() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let getter = create_builtin_function(
        &mut agent,
        Behaviour::Regular(constant_getter),
        BuiltinFunctionArgs::new("get answer", 0),
    );
    let setter = create_builtin_function(
        &mut agent,
        Behaviour::Regular(recording_setter),
        BuiltinFunctionArgs::new("set answer", 1),
    );
    let key = PropertyKey::from_str(&mut agent, "answer");
    let descriptor = PropertyDescriptor {
        get: Some(Some(getter)),
        set: Some(Some(setter)),
        enumerable: Some(true),
        configurable: Some(true),
        ..Default::default()
    };
    assert!(define_own_property(&mut agent, object, key, descriptor).unwrap());
    // The getter's return value wins over any stored value.
    assert_eq!(
        get_object_property(&mut agent, object.into(), key).unwrap(),
        Value::Integer(42)
    );
    set_object_property(&mut agent, object.into(), key, Value::Integer(7), true).unwrap();
    let stored_key = PropertyKey::from_str(&mut agent, "stored");
    assert_eq!(
        get_object_property(&mut agent, object.into(), stored_key).unwrap(),
        Value::Integer(7)
    );
}

#[test]
fn accessor_without_setter_rejects_writes() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let getter = create_builtin_function(
        &mut agent,
        Behaviour::Regular(constant_getter),
        BuiltinFunctionArgs::new("get x", 0),
    );
    let key = PropertyKey::from_str(&mut agent, "x");
    let descriptor = PropertyDescriptor {
        get: Some(Some(getter)),
        set: Some(None),
        enumerable: Some(true),
        configurable: Some(true),
        ..Default::default()
    };
    define_own_property(&mut agent, object, key, descriptor).unwrap();
    assert_eq!(
        set_object_property(&mut agent, object.into(), key, Value::Integer(1), false).unwrap(),
        false
    );
    let error =
        set_object_property(&mut agent, object.into(), key, Value::Integer(1), true).unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::TypeError));
}

#[test]
fn delete_respects_configurability() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let soft = PropertyKey::from_str(&mut agent, "soft");
    let hard = PropertyKey::from_str(&mut agent, "hard");
    set_object_property(&mut agent, object.into(), soft, Value::Integer(1), true).unwrap();
    let descriptor = PropertyDescriptor {
        value: Some(Value::Integer(2)),
        writable: Some(true),
        enumerable: Some(true),
        configurable: Some(false),
        ..Default::default()
    };
    define_own_property(&mut agent, object, hard, descriptor).unwrap();
    assert!(delete_object_property(&mut agent, object, soft, true).unwrap());
    assert!(!has_own_property(&mut agent, object, soft).unwrap());
    assert_eq!(
        delete_object_property(&mut agent, object, hard, false).unwrap(),
        false
    );
    let error = delete_object_property(&mut agent, object, hard, true).unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::TypeError));
}

#[test]
fn non_configurable_data_property_resists_redefinition() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let key = PropertyKey::from_str(&mut agent, "locked");
    let descriptor = PropertyDescriptor {
        value: Some(Value::Integer(1)),
        writable: Some(false),
        enumerable: Some(true),
        configurable: Some(false),
        ..Default::default()
    };
    assert!(define_own_property(&mut agent, object, key, descriptor).unwrap());
    let changed = PropertyDescriptor {
        value: Some(Value::Integer(2)),
        ..Default::default()
    };
    assert!(!define_own_property(&mut agent, object, key, changed).unwrap());
    // Redefining to the same value is allowed.
    let unchanged = PropertyDescriptor {
        value: Some(Value::Integer(1)),
        ..Default::default()
    };
    assert!(define_own_property(&mut agent, object, key, unchanged).unwrap());
}

#[test]
fn own_keys_follow_canonical_order() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let beta = PropertyKey::from_str(&mut agent, "beta");
    let alpha = PropertyKey::from_str(&mut agent, "alpha");
    set_object_property(&mut agent, object.into(), beta, Value::Integer(1), true).unwrap();
    set_object_property(
        &mut agent,
        object.into(),
        PropertyKey::Integer(9),
        Value::Integer(2),
        true,
    )
    .unwrap();
    set_object_property(&mut agent, object.into(), alpha, Value::Integer(3), true).unwrap();
    set_object_property(
        &mut agent,
        object.into(),
        PropertyKey::Integer(1),
        Value::Integer(4),
        true,
    )
    .unwrap();
    let keys = own_property_keys(&mut agent, object, false);
    assert_eq!(
        keys,
        vec![
            PropertyKey::Integer(1),
            PropertyKey::Integer(9),
            beta,
            alpha,
        ]
    );
}

#[test]
fn hidden_prototypes_are_transparent() {
    let mut agent = new_agent();
    let grandparent = new_object(&mut agent);
    let mid = new_object(&mut agent);
    let child = new_object(&mut agent);
    set_prototype_of(&mut agent, mid, Some(grandparent));
    set_prototype_of(&mut agent, child, Some(mid));
    mid.set_flags(&mut agent, ObjectFlags::HIDDEN_PROTOTYPE);
    let y = PropertyKey::from_str(&mut agent, "y");
    let z = PropertyKey::from_str(&mut agent, "z");
    set_object_property(&mut agent, mid.into(), y, Value::Integer(1), true).unwrap();
    set_object_property(&mut agent, grandparent.into(), z, Value::Integer(2), true).unwrap();
    // Own-property queries recurse into the hidden link but stop there.
    assert!(has_own_property(&mut agent, child, y).unwrap());
    assert!(!has_own_property(&mut agent, child, z).unwrap());
    // The hidden link's keys fold into the child's own keys.
    let keys = own_property_keys(&mut agent, child, false);
    assert_eq!(keys, vec![y]);
    // The observable prototype skips the hidden link.
    assert_eq!(get_prototype_of(&agent, child), Some(grandparent));
}

fn fortytwo_interceptor_getter(
    agent: &mut Agent,
    _holder: Object,
    key: PropertyKey,
) -> JsResult<Option<Value>> {
    if key.as_display_string(agent) == "fortytwo" {
        return Ok(Some(Value::Integer(42)));
    }
    Ok(None)
}

fn failing_interceptor_getter(
    agent: &mut Agent,
    _holder: Object,
    _key: PropertyKey,
) -> JsResult<Option<Value>> {
    Err(agent.throw_exception(ExceptionType::RangeError, "interceptor failed"))
}

#[test]
fn interceptor_gets_first_refusal() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    object.set_named_interceptor(
        &mut agent,
        NamedInterceptor {
            getter: fortytwo_interceptor_getter,
            setter: None,
            query: None,
            enumerator: None,
        },
    );
    let plain = PropertyKey::from_str(&mut agent, "plain");
    set_object_property(&mut agent, object.into(), plain, Value::Integer(1), true).unwrap();
    let fortytwo = PropertyKey::from_str(&mut agent, "fortytwo");
    assert_eq!(
        get_object_property(&mut agent, object.into(), fortytwo).unwrap(),
        Value::Integer(42)
    );
    // A declining interceptor falls through to the holder's own storage.
    assert_eq!(
        get_object_property(&mut agent, object.into(), plain).unwrap(),
        Value::Integer(1)
    );
}

#[test]
fn interceptor_errors_are_never_masked_as_not_found() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    object.set_named_interceptor(
        &mut agent,
        NamedInterceptor {
            getter: failing_interceptor_getter,
            setter: None,
            query: None,
            enumerator: None,
        },
    );
    let key = PropertyKey::from_str(&mut agent, "anything");
    let error = get_object_property(&mut agent, object.into(), key).unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::RangeError));
}

fn deny_all(_agent: &Agent, _object: Object) -> bool {
    false
}

#[test]
fn access_checks_hide_reads_and_fail_writes() {
    let mut agent = new_agent();
    agent.set_access_check_callback(deny_all);
    let object = new_object(&mut agent);
    let key = PropertyKey::from_str(&mut agent, "secret");
    set_object_property(&mut agent, object.into(), key, Value::Integer(1), true).unwrap();
    object.set_flags(&mut agent, ObjectFlags::ACCESS_CHECK_NEEDED);
    assert_eq!(
        get_object_property(&mut agent, object.into(), key).unwrap(),
        Value::Undefined
    );
    assert_eq!(
        set_object_property(&mut agent, object.into(), key, Value::Integer(2), false).unwrap(),
        false
    );
    let error =
        set_object_property(&mut agent, object.into(), key, Value::Integer(2), true).unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::TypeError));
    // A checked link contributes no keys but does not fail the walk.
    assert!(own_property_keys(&mut agent, object, false).is_empty());
    assert_eq!(get_prototype_of(&agent, object), None);
}

#[test]
fn freeze_is_idempotent_and_rejects_writes() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let key = PropertyKey::from_str(&mut agent, "x");
    set_object_property(&mut agent, object.into(), key, Value::Integer(1), true).unwrap();
    set_object_property(
        &mut agent,
        object.into(),
        PropertyKey::Integer(0),
        Value::Integer(2),
        true,
    )
    .unwrap();
    assert!(set_integrity_level(&mut agent, object, IntegrityLevel::Frozen).unwrap());
    assert!(test_integrity_level(&mut agent, object, IntegrityLevel::Frozen));
    assert!(test_integrity_level(&mut agent, object, IntegrityLevel::Sealed));
    // Freezing again changes nothing observable.
    assert!(set_integrity_level(&mut agent, object, IntegrityLevel::Frozen).unwrap());
    assert!(test_integrity_level(&mut agent, object, IntegrityLevel::Frozen));
    assert_eq!(
        set_object_property(&mut agent, object.into(), key, Value::Integer(9), false).unwrap(),
        false
    );
    assert_eq!(
        set_object_property(
            &mut agent,
            object.into(),
            PropertyKey::Integer(0),
            Value::Integer(9),
            false
        )
        .unwrap(),
        false
    );
    let extra = PropertyKey::from_str(&mut agent, "extra");
    assert_eq!(
        set_object_property(&mut agent, object.into(), extra, Value::Integer(1), false).unwrap(),
        false
    );
    assert_eq!(
        get_object_property(&mut agent, object.into(), key).unwrap(),
        Value::Integer(1)
    );
}

#[test]
fn seal_keeps_data_writable() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let key = PropertyKey::from_str(&mut agent, "x");
    set_object_property(&mut agent, object.into(), key, Value::Integer(1), true).unwrap();
    set_integrity_level(&mut agent, object, IntegrityLevel::Sealed).unwrap();
    assert!(test_integrity_level(&mut agent, object, IntegrityLevel::Sealed));
    assert!(!test_integrity_level(&mut agent, object, IntegrityLevel::Frozen));
    // Existing data stays writable, deletion and addition are closed.
    assert!(set_object_property(&mut agent, object.into(), key, Value::Integer(5), true).unwrap());
    assert_eq!(
        delete_object_property(&mut agent, object, key, false).unwrap(),
        false
    );
}

#[test]
fn aliased_arguments_cannot_be_frozen() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    object.set_flags(&mut agent, ObjectFlags::ALIASED_ARGUMENTS);
    let error = set_integrity_level(&mut agent, object, IntegrityLevel::Frozen).unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::TypeError));
}

#[test]
fn own_property_record_has_fixed_shape() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let data_key = PropertyKey::from_str(&mut agent, "data");
    set_object_property(&mut agent, object.into(), data_key, Value::Integer(3), true).unwrap();
    let record = get_own_property_record(&mut agent, object, data_key).unwrap();
    assert!(!record.is_accessor);
    assert_eq!(record.value, Some(Value::Integer(3)));
    assert_eq!(record.writable, Some(true));
    assert_eq!(record.getter, None);
    assert_eq!(record.setter, None);
    let getter = create_builtin_function(
        &mut agent,
        Behaviour::Regular(constant_getter),
        BuiltinFunctionArgs::new("get a", 0),
    );
    let accessor_key = PropertyKey::from_str(&mut agent, "accessor");
    let descriptor = PropertyDescriptor {
        get: Some(Some(getter)),
        set: Some(None),
        enumerable: Some(false),
        configurable: Some(true),
        ..Default::default()
    };
    define_own_property(&mut agent, object, accessor_key, descriptor).unwrap();
    let record = get_own_property_record(&mut agent, object, accessor_key).unwrap();
    assert!(record.is_accessor);
    assert_eq!(record.value, None);
    assert_eq!(record.writable, None);
    assert_eq!(record.getter, Some(getter));
    assert_eq!(record.setter, None);
    assert!(!record.enumerable);
    assert!(record.configurable);
    let missing = PropertyKey::from_str(&mut agent, "missing");
    assert!(get_own_property_record(&mut agent, object, missing).is_none());
}

#[test]
fn create_data_property_uses_default_attributes() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let key = PropertyKey::from_str(&mut agent, "fresh");
    assert!(create_data_property(&mut agent, object, key, Value::Boolean(true)));
    let record = get_own_property_record(&mut agent, object, key).unwrap();
    assert_eq!(record.writable, Some(true));
    assert!(record.enumerable);
    assert!(record.configurable);
}

#[test]
fn bulk_property_addition_is_bounded() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let limit = agent.options.bulk_property_limit;
    let error =
        optimize_for_adding_multiple_properties(&mut agent, object, limit + 1).unwrap_err();
    assert_eq!(error.kind(&agent), Some(ExceptionType::RangeError));
    optimize_for_adding_multiple_properties(&mut agent, object, limit).unwrap();
}

#[test]
fn bulk_addition_normalizes_then_migrates_back_to_fast() {
    let mut agent = new_agent();
    let object = new_object(&mut agent);
    let a = PropertyKey::from_str(&mut agent, "a");
    set_object_property(&mut agent, object.into(), a, Value::Integer(1), true).unwrap();
    optimize_for_adding_multiple_properties(&mut agent, object, 3).unwrap();
    // Dictionary mode: the shape no longer describes the properties.
    assert!(object.get_shape(&agent).unwrap().is_empty(&agent));
    let b = PropertyKey::from_str(&mut agent, "b");
    let c = PropertyKey::from_str(&mut agent, "c");
    set_object_property(&mut agent, object.into(), b, Value::Integer(2), true).unwrap();
    set_object_property(&mut agent, object.into(), c, Value::Integer(3), true).unwrap();
    finish_adding_multiple_properties(&mut agent, object);
    // The rebuilt shape carries the keys in insertion order, and the values
    // survive the round trip.
    let shape = object.get_shape(&agent).unwrap();
    assert_eq!(shape.keys(&agent), &[a, b, c]);
    assert_eq!(own_property_keys(&mut agent, object, false), vec![a, b, c]);
    assert_eq!(
        get_object_property(&mut agent, object.into(), a).unwrap(),
        Value::Integer(1)
    );
    assert_eq!(
        get_object_property(&mut agent, object.into(), c).unwrap(),
        Value::Integer(3)
    );
    // Migration rides the shared transition tree: an object that was fast
    // all along with the same history lands on the same shape.
    let twin = new_object(&mut agent);
    set_object_property(&mut agent, twin.into(), a, Value::Integer(1), true).unwrap();
    set_object_property(&mut agent, twin.into(), b, Value::Integer(2), true).unwrap();
    set_object_property(&mut agent, twin.into(), c, Value::Integer(3), true).unwrap();
    assert_eq!(twin.get_shape(&agent), object.get_shape(&agent));
}
