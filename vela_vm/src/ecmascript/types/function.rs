// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::Deref;

use crate::ecmascript::builtins::ordinary::shape::ObjectShape;
use crate::ecmascript::execution::{Agent, JsResult};
use crate::heap::indexes::{FunctionIndex, ObjectIndex, StringIndex};

use super::{Object, Value};

/// A function whose declared parameter count is not enforced: the callee
/// receives the caller's arguments exactly as pushed.
pub const DONT_ADAPT_ARGUMENTS: u32 = u32::MAX;

/// Handle to a function object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Function(pub(crate) FunctionIndex);

impl Function {
    pub(crate) fn from_index(index: FunctionIndex) -> Self {
        Self(index)
    }

    pub fn name<'a>(self, agent: &'a Agent) -> &'a str {
        let index = agent.heap[self.0].name;
        agent.heap[index].as_str()
    }

    pub fn formal_parameter_count(self, agent: &Agent) -> u32 {
        agent.heap[self.0].formal_parameter_count
    }

    pub fn is_strict(self, agent: &Agent) -> bool {
        agent.heap[self.0].strict
    }

    pub fn is_constructor(self, agent: &Agent) -> bool {
        matches!(agent.heap[self.0].behaviour, Behaviour::Constructor(_))
    }

    pub fn is_function_proxy(self, agent: &Agent) -> bool {
        matches!(agent.heap[self.0].kind, FunctionKind::Proxy { .. })
    }
}

/// Arguments passed to a function call, borrowed from the caller's frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentsList<'a>(pub &'a [Value]);

impl ArgumentsList<'_> {
    /// The argument at `index`, or undefined past the end.
    pub fn get(&self, index: usize) -> Value {
        self.0.get(index).copied().unwrap_or(Value::Undefined)
    }
}

impl Deref for ArgumentsList<'_> {
    type Target = [Value];

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

pub type RegularFn = fn(&mut Agent, Value, ArgumentsList) -> JsResult<Value>;
pub type ConstructorFn = fn(&mut Agent, Object, ArgumentsList, Function) -> JsResult<Value>;

/// The native behaviour backing a function object. Constructors receive
/// their new.target in place of a receiver.
#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    Regular(RegularFn),
    Constructor(ConstructorFn),
}

#[derive(Debug, Clone, Copy)]
pub enum FunctionKind {
    Normal,
    /// A callable proxy: invocations route to the call trap with the proxy
    /// itself appended as a trailing argument.
    Proxy { call_trap: Function },
}

/// In-object slack tracking state for a constructor: the first few
/// instances are measured, then the initial allocation size is shrunk to
/// fit the largest observed property count.
#[derive(Debug, Clone, Copy)]
pub struct SlackTracking {
    /// Constructions left before finalization.
    pub countdown: u32,
    /// Field capacity new instances are allocated with.
    pub capacity: u32,
    /// Largest named-property count seen on a finished instance.
    pub max_observed: u32,
}

#[derive(Debug)]
pub struct FunctionHeapData {
    pub(crate) name: StringIndex,
    /// Declared parameter count, or [`DONT_ADAPT_ARGUMENTS`].
    pub(crate) formal_parameter_count: u32,
    pub(crate) strict: bool,
    pub(crate) behaviour: Behaviour,
    pub(crate) kind: FunctionKind,
    /// The ordinary object holding this function's named properties.
    pub(crate) backing_object: Option<ObjectIndex>,
    /// Root shape for instances this constructor creates.
    pub(crate) initial_shape: Option<ObjectShape>,
    pub(crate) slack_tracking: Option<SlackTracking>,
}

impl FunctionHeapData {
    pub fn new(name: StringIndex, formal_parameter_count: u32, behaviour: Behaviour) -> Self {
        Self {
            name,
            formal_parameter_count,
            strict: true,
            behaviour,
            kind: FunctionKind::Normal,
            backing_object: None,
            initial_shape: None,
            slack_tracking: None,
        }
    }
}
