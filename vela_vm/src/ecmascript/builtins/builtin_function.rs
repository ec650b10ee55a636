// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::execution::Agent;
use crate::ecmascript::types::{
    Behaviour, Function, FunctionHeapData, FunctionKind, Object, PropertyAttributes, PropertyKey,
    PropertyValue, Value, DONT_ADAPT_ARGUMENTS,
};
use crate::heap::CreateHeapData;

use super::ordinary::{ordinary_object_create, write_own_property};

/// Parameters of [`create_builtin_function`].
#[derive(Debug, Clone, Copy)]
pub struct BuiltinFunctionArgs<'a> {
    pub name: &'a str,
    /// Declared parameter count; [`DONT_ADAPT_ARGUMENTS`] opts the function
    /// out of argument-count reconciliation.
    pub length: u32,
    pub strict: bool,
}

impl<'a> BuiltinFunctionArgs<'a> {
    pub fn new(name: &'a str, length: u32) -> Self {
        Self {
            name,
            length,
            strict: true,
        }
    }

    pub fn new_sloppy(name: &'a str, length: u32) -> Self {
        Self {
            name,
            length,
            strict: false,
        }
    }

    pub fn new_variadic(name: &'a str) -> Self {
        Self::new(name, DONT_ADAPT_ARGUMENTS)
    }
}

/// 10.3.3 CreateBuiltinFunction ( behaviour, length, name, ... )
/// https://tc39.es/ecma262/#sec-createbuiltinfunction
///
/// The function's backing object carries `name` and `length`, and
/// constructors additionally a `prototype` object cross-linked through
/// `constructor`, so the construction protocol can fetch it like any other
/// property.
pub fn create_builtin_function(
    agent: &mut Agent,
    behaviour: Behaviour,
    args: BuiltinFunctionArgs,
) -> Function {
    let name = agent.heap.alloc_string(args.name);
    let mut data = FunctionHeapData::new(name, args.length, behaviour);
    data.strict = args.strict;
    let function = agent.heap.create(data);
    let function_object = Object::Function(function);
    // Eagerly attach the backing object so every function answers the
    // object protocol.
    function_object.get_or_create_backing_object(agent);
    let name_key = PropertyKey::from_str(agent, "name");
    write_own_property(
        agent,
        function_object,
        name_key,
        PropertyValue::Data {
            value: Value::String(name),
            attrs: PropertyAttributes::CONFIGURABLE,
        },
    );
    let visible_length = if args.length == DONT_ADAPT_ARGUMENTS {
        0
    } else {
        args.length as i32
    };
    let length_key = PropertyKey::from_str(agent, "length");
    write_own_property(
        agent,
        function_object,
        length_key,
        PropertyValue::Data {
            value: Value::Integer(visible_length),
            attrs: PropertyAttributes::CONFIGURABLE,
        },
    );
    if matches!(behaviour, Behaviour::Constructor(_)) {
        let object_prototype = agent.realm().object_prototype;
        let prototype = ordinary_object_create(agent, Some(object_prototype));
        let constructor_key = PropertyKey::from_str(agent, "constructor");
        write_own_property(
            agent,
            prototype,
            constructor_key,
            PropertyValue::Data {
                value: function.into(),
                attrs: PropertyAttributes::WRITABLE | PropertyAttributes::CONFIGURABLE,
            },
        );
        let prototype_key = PropertyKey::from_str(agent, "prototype");
        write_own_property(
            agent,
            function_object,
            prototype_key,
            PropertyValue::Data {
                value: prototype.into(),
                attrs: PropertyAttributes::WRITABLE,
            },
        );
    }
    function
}

/// Wrap a callable in a function proxy: calls route to `call_trap` with the
/// proxy itself appended as a trailing argument.
pub fn create_function_proxy(agent: &mut Agent, call_trap: Function, name: &str) -> Function {
    let name = agent.heap.alloc_string(name);
    let mut data = FunctionHeapData::new(
        name,
        DONT_ADAPT_ARGUMENTS,
        agent.heap[call_trap.0].behaviour,
    );
    data.kind = FunctionKind::Proxy { call_trap };
    let proxy = agent.heap.create(data);
    Object::Function(proxy).get_or_create_backing_object(agent);
    proxy
}
