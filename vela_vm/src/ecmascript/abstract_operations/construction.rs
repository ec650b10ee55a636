// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The construction protocol: instance allocation from the new.target's
//! prototype, in-object slack tracking, allocation-site feedback and
//! return-object substitution.

use smallvec::SmallVec;
use tracing::debug;

use crate::ecmascript::builtins::ordinary::shape::ObjectShape;
use crate::ecmascript::execution::{
    Agent, ExceptionType, ExecutionContext, InvocationKind, JsResult,
};
use crate::ecmascript::types::{
    ArgumentsList, Behaviour, Function, Object, ObjectHeapData, PropertyKey, SlackTracking, Value,
};
use crate::heap::indexes::AllocationSiteIndex;
use crate::heap::CreateHeapData;

use super::function_invocation::FRAME_SLOT_COST;
use super::operations_on_objects::get_object_property;
use super::testing_and_comparison::is_constructor;

/// 7.3.15 Construct ( F [ , argumentsList [ , newTarget ] ] )
/// https://tc39.es/ecma262/#sec-construct
///
/// The instance's shape comes from `new_target`'s prototype, not the
/// running constructor's, so a base constructor allocates with a derived
/// class's layout. A constructor body returning an object silently
/// replaces the allocated instance; primitive returns are discarded.
pub fn construct(
    agent: &mut Agent,
    constructor: Function,
    args: ArgumentsList,
    new_target: Option<Function>,
    allocation_site: Option<AllocationSiteIndex>,
) -> JsResult<Object> {
    agent
        .hooks
        .invocation_hook(InvocationKind::Construct, constructor);
    let Some(constructor) = is_constructor(agent, constructor.into()) else {
        return Err(not_a_constructor(agent, constructor));
    };
    let new_target = new_target.unwrap_or(constructor);
    let instance = allocate_instance(agent, new_target, allocation_site)?;
    let Behaviour::Constructor(body) = agent.heap[constructor.0].behaviour else {
        unreachable!("IsConstructor admitted a non-constructor");
    };
    // Constructor frames charge the budget like calls, so recursive
    // construction terminates with a StackOverflow.
    let reserved = FRAME_SLOT_COST + args.len() as u32;
    agent.reserve_stack_slots(reserved)?;
    agent.execution_context_stack.push(ExecutionContext {
        function: Some(constructor),
        arguments_object: None,
    });
    let result = body(agent, instance, args, new_target);
    agent.execution_context_stack.pop();
    agent.release_stack_slots(reserved);
    let result = result?;
    observe_constructed_instance(agent, new_target, instance);
    if let Some(returned) = result.as_object() {
        return Ok(returned);
    }
    Ok(instance)
}

/// Reflect.construct-style indirect construction: the arguments value must
/// be array-like and is spread positionally.
pub fn reflect_construct(
    agent: &mut Agent,
    constructor: Function,
    arguments_value: Value,
    new_target: Option<Function>,
) -> JsResult<Object> {
    let Some(arguments_object) = arguments_value.as_object() else {
        return Err(agent.throw_exception(
            ExceptionType::TypeError,
            "CreateListFromArrayLike called on non-object",
        ));
    };
    let length_key = PropertyKey::from_str(agent, "length");
    let length = get_object_property(agent, arguments_object.into(), length_key)?;
    let length = match length {
        Value::Integer(length) if length >= 0 => length as u32,
        _ => {
            return Err(agent.throw_exception(
                ExceptionType::TypeError,
                "Array-like length is not a non-negative integer",
            ));
        }
    };
    // Guard before the spread list is materialized.
    agent.reserve_stack_slots(length)?;
    let mut spread: SmallVec<[Value; 8]> = SmallVec::with_capacity(length as usize);
    for index in 0..length {
        let argument =
            match get_object_property(agent, arguments_object.into(), PropertyKey::Integer(index))
            {
                Ok(argument) => argument,
                Err(error) => {
                    agent.release_stack_slots(length);
                    return Err(error);
                }
            };
        spread.push(argument);
    }
    let result = construct(
        agent,
        constructor,
        ArgumentsList(&spread),
        new_target,
        None,
    );
    agent.release_stack_slots(length);
    result
}

fn not_a_constructor(
    agent: &mut Agent,
    constructor: Function,
) -> crate::ecmascript::execution::JsError {
    let message = format!("{} is not a constructor", constructor.name(agent));
    agent.throw_exception(ExceptionType::TypeError, &message)
}

/// Allocate an instance from `new_target`'s initial shape, carrying slack
/// while the constructor is still under measurement.
fn allocate_instance(
    agent: &mut Agent,
    new_target: Function,
    allocation_site: Option<AllocationSiteIndex>,
) -> JsResult<Object> {
    let shape = initial_shape(agent, new_target)?;
    let capacity = match agent.heap[new_target.0].slack_tracking {
        Some(tracking) => tracking.capacity,
        None => {
            let tracking = SlackTracking {
                countdown: agent.options.slack_tracking_count,
                capacity: shape.len(agent) + agent.options.initial_slack,
                max_observed: 0,
            };
            agent.heap[new_target.0].slack_tracking = Some(tracking);
            tracking.capacity
        }
    };
    let mut data = ObjectHeapData::new(shape);
    data.field_capacity = capacity;
    // Fresh fields read as the uninitialized sentinel until written.
    data.storage.replace_fast(Vec::with_capacity(capacity as usize));
    if let Some(site) = allocation_site {
        if agent.heap[site].is_collecting() {
            agent.heap[site].record_memento();
            data.allocation_memento = Some(site);
        }
    }
    let Object::Object(index) = agent.heap.create(data) else {
        unreachable!()
    };
    Ok(Object::Object(index))
}

/// Resolve and cache the root shape of instances constructed through
/// `new_target`, derived from its `prototype` property. Writes to that
/// property drop the cache, so a rewritten prototype reaches the next
/// construction.
fn initial_shape(agent: &mut Agent, new_target: Function) -> JsResult<ObjectShape> {
    if let Some(shape) = agent.heap[new_target.0].initial_shape {
        return Ok(shape);
    }
    let prototype_key = PropertyKey::from_str(agent, "prototype");
    let prototype = get_object_property(agent, new_target.into(), prototype_key)?;
    let prototype = match prototype.as_object() {
        Some(prototype) => prototype,
        // A constructor with a clobbered prototype falls back to the
        // intrinsic object prototype.
        None => agent.realm().object_prototype,
    };
    let shape = ObjectShape::get_or_create_shape_for_prototype(agent, Some(prototype));
    agent.heap[new_target.0].initial_shape = Some(shape);
    Ok(shape)
}

/// Record a finished instance's property count and finalize the
/// constructor's instance size once enough constructions have been seen.
fn observe_constructed_instance(agent: &mut Agent, new_target: Function, instance: Object) {
    let Some(backing) = instance.get_backing_object(agent) else {
        return;
    };
    let used = agent.heap[backing].shape.len(agent);
    let Some(tracking) = &mut agent.heap[new_target.0].slack_tracking else {
        return;
    };
    tracking.max_observed = tracking.max_observed.max(used);
    if tracking.countdown == 0 {
        return;
    }
    tracking.countdown -= 1;
    if tracking.countdown == 0 {
        complete_inobject_slack_tracking(agent, new_target);
    }
}

/// Finalize a constructor's instance size: the next instances are
/// allocated at the largest observed property count, with no slack.
pub fn complete_inobject_slack_tracking(agent: &mut Agent, function: Function) {
    let Some(tracking) = &mut agent.heap[function.0].slack_tracking else {
        return;
    };
    tracking.countdown = 0;
    tracking.capacity = tracking.max_observed;
    debug!(
        capacity = tracking.capacity,
        "finalized in-object slack tracking"
    );
}
