// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::builtins::ordinary::ordinary_object_create;
use crate::ecmascript::execution::{Agent, ExceptionType, JsResult};
use crate::ecmascript::types::{Object, Value};

/// 7.1.18 ToObject ( argument )
/// https://tc39.es/ecma262/#sec-toobject
///
/// Primitives box into a wrapper object carrying the primitive value.
pub fn to_object(agent: &mut Agent, argument: Value) -> JsResult<Object> {
    match argument {
        Value::Undefined | Value::Null => Err(agent.throw_exception(
            ExceptionType::TypeError,
            "Cannot convert undefined or null to object",
        )),
        Value::Object(_) | Value::Function(_) => {
            Ok(argument.as_object().expect("Object value is not an object"))
        }
        _ => {
            let prototype = agent.realm().object_prototype;
            let wrapper = ordinary_object_create(agent, Some(prototype));
            let backing = wrapper
                .get_backing_object(agent)
                .expect("Ordinary object lacks backing storage");
            agent.heap[backing].primitive_value = Some(argument);
            Ok(wrapper)
        }
    }
}
