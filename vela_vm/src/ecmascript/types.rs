// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod error;
mod function;
mod object;
mod property_descriptor;
mod property_key;
mod string;
mod value;

pub use error::ErrorHeapData;
pub use function::{
    ArgumentsList, Behaviour, ConstructorFn, Function, FunctionHeapData, FunctionKind, RegularFn,
    SlackTracking, DONT_ADAPT_ARGUMENTS,
};
pub use object::{
    NamedInterceptor, Object, ObjectFlags, ObjectHeapData, PropertyAttributes, PropertyValue,
};
pub(crate) use object::property_storage;
pub use property_descriptor::PropertyDescriptor;
pub use property_key::PropertyKey;
pub use string::StringHeapData;
pub use value::{IntoValue, Value};
