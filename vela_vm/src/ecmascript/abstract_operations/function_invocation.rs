// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The call boundary: argument-count reconciliation, receiver coercion,
//! the stack guard and function-proxy routing, applied before any callee
//! body runs.

use smallvec::SmallVec;
use tracing::trace;

use crate::ecmascript::builtins::ordinary::ordinary_object_create;
use crate::ecmascript::execution::{
    Agent, ExceptionType, ExecutionContext, InvocationKind, JsResult,
};
use crate::ecmascript::types::{
    ArgumentsList, Behaviour, Function, FunctionKind, Object, ObjectFlags, PropertyKey, Value,
    DONT_ADAPT_ARGUMENTS,
};

use super::operations_on_objects::{create_data_property, get_object_property};
use super::testing_and_comparison::is_callable;
use super::type_conversion::to_object;

/// Every activation charges this many slots on top of its argument slots,
/// so zero-argument recursion still exhausts the budget long before the
/// native stack does.
pub(crate) const FRAME_SLOT_COST: u32 = 32;

/// 7.3.14 Call ( F, V, argumentsList )
/// https://tc39.es/ecma262/#sec-call
pub fn call_function(
    agent: &mut Agent,
    function: Function,
    this_value: Value,
    args: ArgumentsList,
) -> JsResult<Value> {
    agent.hooks.invocation_hook(InvocationKind::Call, function);
    if let FunctionKind::Proxy { call_trap } = agent.heap[function.0].kind {
        // The proxy rides along as an extra trailing argument so the trap
        // can recover it from the generic calling convention.
        let reserved = FRAME_SLOT_COST + args.len() as u32 + 1;
        agent.reserve_stack_slots(reserved)?;
        let mut routed: SmallVec<[Value; 8]> = SmallVec::with_capacity(args.len() + 1);
        routed.extend_from_slice(&args);
        routed.push(function.into());
        let result = call_function(agent, call_trap, this_value, ArgumentsList(&routed));
        agent.release_stack_slots(reserved);
        return result;
    }
    let strict = agent.heap[function.0].strict;
    let receiver = coerce_receiver(agent, this_value, strict)?;
    let formal_count = agent.heap[function.0].formal_parameter_count;
    let needs_adaptation =
        formal_count != DONT_ADAPT_ARGUMENTS && formal_count as usize != args.len();
    let argument_slots = if formal_count == DONT_ADAPT_ARGUMENTS {
        args.len() as u32
    } else {
        (formal_count as usize).max(args.len()) as u32
    };
    // The guard runs before any frame state is materialized, and charges
    // matching-arity calls too so unbounded recursion terminates with a
    // StackOverflow instead of exhausting the native stack.
    let reserved = FRAME_SLOT_COST + argument_slots;
    agent.reserve_stack_slots(reserved)?;
    let result = if needs_adaptation {
        trace!(
            actual = args.len(),
            formal = formal_count,
            "adapting argument count"
        );
        let mut adapted: SmallVec<[Value; 8]> = SmallVec::with_capacity(formal_count as usize);
        adapted.extend(args.iter().copied().take(formal_count as usize));
        while adapted.len() < formal_count as usize {
            adapted.push(Value::Undefined);
        }
        // Truncated extras stay reachable through the arguments object.
        match materialize_arguments_object(agent, args, strict) {
            Ok(arguments_object) => invoke_behaviour(
                agent,
                function,
                receiver,
                ArgumentsList(&adapted),
                Some(arguments_object),
            ),
            Err(error) => Err(error),
        }
    } else {
        invoke_behaviour(agent, function, receiver, args, None)
    };
    agent.release_stack_slots(reserved);
    result
}

/// 7.3.21 Invoke ( V, P [ , argumentsList ] )
/// https://tc39.es/ecma262/#sec-invoke
pub fn invoke(
    agent: &mut Agent,
    target: Value,
    key: PropertyKey,
    args: ArgumentsList,
) -> JsResult<Value> {
    let callee = get_object_property(agent, target, key)?;
    let Some(function) = is_callable(callee) else {
        let message = format!("'{}' is not a function", key.as_display_string(agent));
        return Err(agent.throw_exception(ExceptionType::TypeError, &message));
    };
    call_function(agent, function, target, args)
}

fn invoke_behaviour(
    agent: &mut Agent,
    function: Function,
    receiver: Value,
    args: ArgumentsList,
    arguments_object: Option<Object>,
) -> JsResult<Value> {
    agent.execution_context_stack.push(ExecutionContext {
        function: Some(function),
        arguments_object,
    });
    let result = match agent.heap[function.0].behaviour {
        Behaviour::Regular(body) => body(agent, receiver, args),
        Behaviour::Constructor(_) => {
            let message = format!(
                "Constructor {} cannot be invoked without 'new'",
                function.name(agent)
            );
            Err(agent.throw_exception(ExceptionType::TypeError, &message))
        }
    };
    agent.execution_context_stack.pop();
    result
}

/// Sloppy-mode callees see a usable object receiver: null and undefined
/// become the global proxy and primitives are boxed. Strict callees take
/// the receiver verbatim.
fn coerce_receiver(agent: &mut Agent, this_value: Value, strict: bool) -> JsResult<Value> {
    if strict {
        return Ok(this_value);
    }
    if this_value.is_nullish() {
        return Ok(agent.realm().global_object.into());
    }
    if this_value.is_object() {
        return Ok(this_value);
    }
    let boxed = to_object(agent, this_value)?;
    Ok(boxed.into())
}

/// The synthetic arguments object: actual arguments as elements plus a
/// `length` property. Sloppy-mode objects alias the formal parameter slots
/// and are flagged so integrity operations reject them.
fn materialize_arguments_object(
    agent: &mut Agent,
    args: ArgumentsList,
    strict: bool,
) -> JsResult<Object> {
    let prototype = agent.realm().object_prototype;
    let arguments_object = ordinary_object_create(agent, Some(prototype));
    for (index, argument) in args.iter().enumerate() {
        create_data_property(
            agent,
            arguments_object,
            PropertyKey::Integer(index as u32),
            *argument,
        );
    }
    let length_key = PropertyKey::from_str(agent, "length");
    create_data_property(
        agent,
        arguments_object,
        length_key,
        Value::Integer(args.len() as i32),
    );
    if !strict {
        arguments_object.set_flags(agent, ObjectFlags::ALIASED_ARGUMENTS);
    }
    Ok(arguments_object)
}
