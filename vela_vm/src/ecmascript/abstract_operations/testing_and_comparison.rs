// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::execution::Agent;
use crate::ecmascript::types::{Behaviour, Function, Value};

/// 7.2.3 IsCallable ( argument )
/// https://tc39.es/ecma262/#sec-iscallable
pub fn is_callable(argument: Value) -> Option<Function> {
    match argument {
        Value::Function(index) => Some(Function::from_index(index)),
        _ => None,
    }
}

/// 7.2.4 IsConstructor ( argument )
/// https://tc39.es/ecma262/#sec-isconstructor
pub fn is_constructor(agent: &Agent, argument: Value) -> Option<Function> {
    let function = is_callable(argument)?;
    match agent.heap[function.0].behaviour {
        Behaviour::Constructor(_) => Some(function),
        Behaviour::Regular(_) => None,
    }
}

/// 7.2.10 SameValue ( x, y )
/// https://tc39.es/ecma262/#sec-samevalue
pub fn same_value(x: Value, y: Value) -> bool {
    match (x, y) {
        (Value::Integer(x), Value::Float(y)) | (Value::Float(y), Value::Integer(x)) => {
            same_value_number(x as f64, y)
        }
        (Value::Float(x), Value::Float(y)) => same_value_number(x, y),
        _ => x == y,
    }
}

fn same_value_number(x: f64, y: f64) -> bool {
    // NaN equals NaN, positive and negative zero differ.
    x.to_bits() == y.to_bits() || (x.is_nan() && y.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_number_edge_cases() {
        assert!(same_value(Value::Float(f64::NAN), Value::Float(f64::NAN)));
        assert!(!same_value(Value::Float(0.0), Value::Float(-0.0)));
        assert!(same_value(Value::Integer(3), Value::Float(3.0)));
        assert!(same_value(Value::Null, Value::Null));
        assert!(!same_value(Value::Null, Value::Undefined));
    }
}
