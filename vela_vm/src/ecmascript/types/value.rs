// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::heap::indexes::{ErrorIndex, FunctionIndex, ObjectIndex, StringIndex};

use super::{Function, Object};

/// A language value.
///
/// Small integers and floats are kept unboxed; strings, objects, functions
/// and errors are arena handles. `Uninitialized` is the engine-internal
/// hole: it zero-initialises fresh instance fields and marks declared but
/// not-yet-initialised global bindings. It must never be observable through
/// the public protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    Integer(i32),
    Float(f64),
    String(StringIndex),
    Object(ObjectIndex),
    Function(FunctionIndex),
    Error(ErrorIndex),
    Uninitialized,
}

impl Value {
    pub fn is_undefined(self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for the two values that cannot be converted to an object.
    pub fn is_nullish(self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_object(self) -> bool {
        matches!(self, Value::Object(_) | Value::Function(_))
    }

    pub fn as_object(self) -> Option<Object> {
        match self {
            Value::Object(index) => Some(Object::Object(index)),
            Value::Function(index) => Some(Object::Function(Function(index))),
            _ => None,
        }
    }
}

pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Object {
    fn into_value(self) -> Value {
        match self {
            Object::Object(index) => Value::Object(index),
            Object::Function(function) => Value::Function(function.0),
        }
    }
}

impl IntoValue for Function {
    fn into_value(self) -> Value {
        Value::Function(self.0)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        value.into_value()
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        value.into_value()
    }
}
