// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;

use crate::ecmascript::types::{ErrorHeapData, Function, Object, Value};
use crate::heap::{CreateHeapData, Heap};

use super::realm::Realm;

pub type JsResult<T> = Result<T, JsError>;

/// A thrown value. Usually an Error object carrying an [`ExceptionType`],
/// but any value can be thrown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JsError(Value);

impl JsError {
    pub(crate) fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(self) -> Value {
        self.0
    }

    pub fn kind(self, agent: &Agent) -> Option<ExceptionType> {
        match self.0 {
            Value::Error(index) => Some(agent.heap[index].kind),
            _ => None,
        }
    }

    pub fn message<'a>(self, agent: &'a Agent) -> Option<&'a str> {
        match self.0 {
            Value::Error(index) => {
                let message = agent.heap[index].message?;
                Some(agent.heap[message].as_str())
            }
            _ => None,
        }
    }

    /// Stack exhaustion is fatal to the call and unwinds to the nearest
    /// external handler instead of being caught at this layer.
    pub fn is_termination(self, agent: &Agent) -> bool {
        self.kind(agent) == Some(ExceptionType::StackOverflow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    Error,
    RangeError,
    ReferenceError,
    TypeError,
    StackOverflow,
}

/// Agent tuning knobs.
#[derive(Debug, Clone)]
pub struct Options {
    /// Constructions measured before an instance size is finalized.
    pub slack_tracking_count: u32,
    /// Field slots a fresh constructor's instances are padded out to while
    /// slack tracking runs.
    pub initial_slack: u32,
    /// Upper bound on bulk property-addition counts.
    pub bulk_property_limit: u32,
    /// Value slots available to argument materialization before the stack
    /// guard trips.
    pub stack_slot_budget: u32,
    /// Named property count past which fast storage gives way to a
    /// dictionary.
    pub dictionary_transition_limit: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            slack_tracking_count: 7,
            initial_slack: 8,
            bulk_property_limit: 100_000,
            stack_slot_budget: 16_384,
            dictionary_transition_limit: 128,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationKind {
    Call,
    Construct,
}

/// Host-side observation points. Hooks must not alter the semantics of the
/// operations they observe.
pub trait HostHooks: std::fmt::Debug {
    /// Called once per call or construct, before the callee runs.
    fn invocation_hook(&self, _kind: InvocationKind, _function: Function) {}
}

#[derive(Debug)]
pub struct DefaultHostHooks;

impl HostHooks for DefaultHostHooks {}

/// One frame of the execution context stack.
#[derive(Debug)]
pub struct ExecutionContext {
    pub function: Option<Function>,
    /// The synthetic arguments object, materialized when the callee's
    /// arity did not match the call's.
    pub arguments_object: Option<Object>,
}

/// The singular execution agent: owns the heap, the realm, the execution
/// context stack and the host configuration.
#[derive(Debug)]
pub struct Agent {
    pub heap: Heap,
    pub options: Options,
    pub(crate) hooks: &'static dyn HostHooks,
    pub(crate) execution_context_stack: Vec<ExecutionContext>,
    /// Value slots consumed by adapted argument lists currently live on
    /// the stack.
    pub(crate) stack_slots_used: u32,
    realm: Option<Realm>,
    pub(crate) access_check_callback: Option<fn(&Agent, Object) -> bool>,
}

impl Agent {
    pub fn new(options: Options, hooks: &'static dyn HostHooks) -> Self {
        let mut agent = Self {
            heap: Heap::new(),
            options,
            hooks,
            execution_context_stack: Vec::new(),
            stack_slots_used: 0,
            realm: None,
            access_check_callback: None,
        };
        let realm = Realm::initialize(&mut agent);
        agent.realm = Some(realm);
        agent
    }

    pub fn realm(&self) -> &Realm {
        self.realm.as_ref().expect("Agent has no Realm")
    }

    pub fn set_access_check_callback(&mut self, callback: fn(&Agent, Object) -> bool) {
        self.access_check_callback = Some(callback);
    }

    /// Whether the running code may access the given access-checked
    /// object. Unrestricted when the host installed no callback.
    pub fn may_access(&self, object: Object) -> bool {
        match self.access_check_callback {
            Some(callback) => callback(self, object),
            None => true,
        }
    }

    pub fn throw_exception(&mut self, kind: ExceptionType, message: &str) -> JsError {
        debug!(?kind, message, "throwing exception");
        let message = self.heap.alloc_string(message);
        let error = self.heap.create(ErrorHeapData::new(kind, Some(message)));
        JsError::new(Value::Error(error))
    }

    /// Reserve stack slots for an adapted argument list, or fail with the
    /// stack-overflow condition if the budget cannot cover them.
    pub(crate) fn reserve_stack_slots(&mut self, required: u32) -> JsResult<()> {
        let Some(new_used) = self.stack_slots_used.checked_add(required) else {
            return Err(self.throw_exception(
                ExceptionType::StackOverflow,
                "Maximum call stack size exceeded",
            ));
        };
        if new_used > self.options.stack_slot_budget {
            return Err(self.throw_exception(
                ExceptionType::StackOverflow,
                "Maximum call stack size exceeded",
            ));
        }
        self.stack_slots_used = new_used;
        Ok(())
    }

    pub(crate) fn release_stack_slots(&mut self, released: u32) {
        self.stack_slots_used = self.stack_slots_used.saturating_sub(released);
    }

    /// The arguments object of the running execution context, if the call
    /// materialized one.
    pub fn current_arguments_object(&self) -> Option<Object> {
        self.execution_context_stack
            .last()
            .and_then(|context| context.arguments_object)
    }
}
