// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! An embeddable JavaScript object model: hidden-class property storage,
//! elements-kind tracking, the property lookup machine, global property
//! cells, and the construction and invocation protocols on top of them.

pub mod ecmascript;
pub mod heap;

pub use ecmascript::abstract_operations::construction::{
    complete_inobject_slack_tracking, construct, reflect_construct,
};
pub use ecmascript::abstract_operations::function_invocation::{call_function, invoke};
pub use ecmascript::abstract_operations::operations_on_objects::{
    create_data_property, define_own_property, delete_object_property,
    finish_adding_multiple_properties, get_object_property, get_own_property_record,
    get_prototype_of, has_own_property, has_property, optimize_for_adding_multiple_properties,
    ordinary_has_instance, ordinary_object_create, own_property_keys, prevent_extensions,
    set_integrity_level, set_object_property, set_prototype_of, test_integrity_level,
    IntegrityLevel, OwnPropertyRecord,
};
pub use ecmascript::builtins::global_object::{
    load_global_via_slot, store_global_via_slot, GlobalSlot,
};
pub use ecmascript::builtins::{create_builtin_function, create_function_proxy, BuiltinFunctionArgs};
pub use ecmascript::execution::{
    Agent, DefaultHostHooks, ExceptionType, HostHooks, InvocationKind, JsError, JsResult, Options,
};
pub use ecmascript::types::{
    ArgumentsList, Behaviour, Function, NamedInterceptor, Object, ObjectFlags, PropertyAttributes,
    PropertyDescriptor, PropertyKey, Value, DONT_ADAPT_ARGUMENTS,
};
