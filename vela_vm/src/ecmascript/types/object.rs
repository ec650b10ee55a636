// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub(crate) mod property_storage;

use bitflags::bitflags;

use crate::ecmascript::builtins::ordinary::shape::ObjectShape;
use crate::ecmascript::execution::{Agent, JsResult};
use crate::heap::element_array::ElementsStore;
use crate::heap::indexes::{AllocationSiteIndex, ObjectIndex};

use self::property_storage::PropertyStorage;
use super::{Function, PropertyKey, Value};

bitflags! {
    /// Packed property attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyAttributes: u8 {
        const WRITABLE = 0b001;
        const ENUMERABLE = 0b010;
        const CONFIGURABLE = 0b100;
    }
}

impl PropertyAttributes {
    /// The default attributes of a plain assignment-created property.
    pub const DEFAULT_DATA: Self = Self::all();

    pub fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE)
    }

    pub fn is_enumerable(self) -> bool {
        self.contains(Self::ENUMERABLE)
    }

    pub fn is_configurable(self) -> bool {
        self.contains(Self::CONFIGURABLE)
    }
}

/// One stored property: a data slot or an accessor pair.
///
/// The writable bit is meaningless for accessors and must not be read from
/// them; the accessor constructor never sets it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Data {
        value: Value,
        attrs: PropertyAttributes,
    },
    Accessor {
        get: Option<Function>,
        set: Option<Function>,
        attrs: PropertyAttributes,
    },
}

impl PropertyValue {
    pub fn new_data(value: Value) -> Self {
        Self::Data {
            value,
            attrs: PropertyAttributes::DEFAULT_DATA,
        }
    }

    pub fn is_accessor(self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    pub fn attributes(self) -> PropertyAttributes {
        match self {
            Self::Data { attrs, .. } | Self::Accessor { attrs, .. } => attrs,
        }
    }

    pub(crate) fn set_attributes(&mut self, new_attrs: PropertyAttributes) {
        match self {
            Self::Data { attrs, .. } | Self::Accessor { attrs, .. } => *attrs = new_attrs,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObjectFlags: u8 {
        /// The object is transparent as a prototype-chain link: its own
        /// properties are reported as though they belonged to the object
        /// that hides it.
        const HIDDEN_PROTOTYPE = 0b0000_0001;
        /// Property access must pass the agent's access-check callback.
        const ACCESS_CHECK_NEEDED = 0b0000_0010;
        /// The realm's global object; named properties live in property
        /// cells so call sites can cache stable references.
        const GLOBAL = 0b0000_0100;
        /// The elements backing aliases a call frame's argument slots and
        /// cannot be reattributed by the simple seal/freeze algorithm.
        const ALIASED_ARGUMENTS = 0b0000_1000;
        /// No indexed property may be added or deleted.
        const SEALED_ELEMENTS = 0b0001_0000;
        /// No indexed property may be added, deleted or written.
        const FROZEN_ELEMENTS = 0b0010_0000;
    }
}

/// A named-property interceptor: a set of callbacks given first refusal on
/// property resolution before default storage is consulted.
///
/// A callback returning `Ok(None)` declines, and resolution continues with
/// the holder's own storage. Callback errors propagate unchanged; they are
/// never masked as not-found.
#[derive(Clone, Copy)]
pub struct NamedInterceptor {
    pub getter: fn(&mut Agent, Object, PropertyKey) -> JsResult<Option<Value>>,
    pub setter: Option<fn(&mut Agent, Object, PropertyKey, Value) -> JsResult<Option<bool>>>,
    pub query: Option<fn(&mut Agent, Object, PropertyKey) -> Option<PropertyAttributes>>,
    pub enumerator: Option<fn(&mut Agent, Object) -> Vec<PropertyKey>>,
}

impl std::fmt::Debug for NamedInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedInterceptor").finish_non_exhaustive()
    }
}

/// Handle to an object: an ordinary object or a function with its lazily
/// attached backing object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Object {
    Object(ObjectIndex),
    Function(Function),
}

impl From<ObjectIndex> for Object {
    fn from(value: ObjectIndex) -> Self {
        Object::Object(value)
    }
}

impl From<Function> for Object {
    fn from(value: Function) -> Self {
        Object::Function(value)
    }
}

impl Object {
    /// The ordinary object holding this object's named properties and
    /// elements. Functions carry a separate backing object.
    pub(crate) fn get_backing_object(self, agent: &Agent) -> Option<ObjectIndex> {
        match self {
            Object::Object(index) => Some(index),
            Object::Function(function) => agent.heap[function.0].backing_object,
        }
    }

    pub(crate) fn get_or_create_backing_object(self, agent: &mut Agent) -> ObjectIndex {
        match self {
            Object::Object(index) => index,
            Object::Function(function) => {
                if let Some(index) = agent.heap[function.0].backing_object {
                    return index;
                }
                let prototype = agent.realm().function_prototype;
                let backing = ObjectHeapData::create(agent, Some(prototype));
                agent.heap[function.0].backing_object = Some(backing);
                backing
            }
        }
    }

    /// The shape currently describing this object's named-property layout.
    pub fn get_shape(self, agent: &Agent) -> Option<ObjectShape> {
        let backing = self.get_backing_object(agent)?;
        Some(agent.heap[backing].shape)
    }

    pub fn internal_prototype(self, agent: &Agent) -> Option<Object> {
        let backing = self.get_backing_object(agent)?;
        agent.heap[backing].shape.get_prototype(agent)
    }

    pub fn internal_extensible(self, agent: &Agent) -> bool {
        match self.get_backing_object(agent) {
            Some(backing) => agent.heap[backing].extensible,
            None => true,
        }
    }

    pub fn internal_set_extensible(self, agent: &mut Agent, extensible: bool) {
        let backing = self.get_or_create_backing_object(agent);
        agent.heap[backing].extensible = extensible;
    }

    pub fn flags(self, agent: &Agent) -> ObjectFlags {
        match self.get_backing_object(agent) {
            Some(backing) => agent.heap[backing].flags,
            None => ObjectFlags::empty(),
        }
    }

    pub fn set_flags(self, agent: &mut Agent, flags: ObjectFlags) {
        let backing = self.get_or_create_backing_object(agent);
        agent.heap[backing].flags |= flags;
    }

    pub fn is_hidden_prototype(self, agent: &Agent) -> bool {
        self.flags(agent).contains(ObjectFlags::HIDDEN_PROTOTYPE)
    }

    pub fn is_global(self, agent: &Agent) -> bool {
        self.flags(agent).contains(ObjectFlags::GLOBAL)
    }

    pub fn needs_access_check(self, agent: &Agent) -> bool {
        self.flags(agent).contains(ObjectFlags::ACCESS_CHECK_NEEDED)
    }

    pub fn named_interceptor(self, agent: &Agent) -> Option<NamedInterceptor> {
        let backing = self.get_backing_object(agent)?;
        agent.heap[backing].named_interceptor
    }

    pub fn set_named_interceptor(self, agent: &mut Agent, interceptor: NamedInterceptor) {
        let backing = self.get_or_create_backing_object(agent);
        agent.heap[backing].named_interceptor = Some(interceptor);
    }

    pub fn allocation_memento(self, agent: &Agent) -> Option<AllocationSiteIndex> {
        let backing = self.get_backing_object(agent)?;
        agent.heap[backing].allocation_memento
    }

    /// The current representation kind of this object's indexed
    /// properties.
    pub fn elements_kind(self, agent: &Agent) -> crate::heap::element_array::ElementsKind {
        match self.get_backing_object(agent) {
            Some(backing) => agent.heap[backing].elements.kind(),
            None => crate::heap::element_array::ElementsKind::PackedSmi,
        }
    }

    /// The number of named-property field slots this instance was allocated
    /// with, including any slack.
    pub fn field_capacity(self, agent: &Agent) -> u32 {
        match self.get_backing_object(agent) {
            Some(backing) => agent.heap[backing].field_capacity,
            None => 0,
        }
    }
}

/// Heap data of an ordinary object.
#[derive(Debug)]
pub struct ObjectHeapData {
    /// Shared shape: prototype and the ordered named-property key layout.
    pub(crate) shape: ObjectShape,
    /// Named-property values, parallel to the shape keys in fast mode.
    pub(crate) storage: PropertyStorage,
    /// Indexed properties.
    pub(crate) elements: ElementsStore,
    pub(crate) extensible: bool,
    pub(crate) flags: ObjectFlags,
    pub(crate) named_interceptor: Option<NamedInterceptor>,
    /// The boxed primitive for wrapper objects.
    pub(crate) primitive_value: Option<Value>,
    pub(crate) allocation_memento: Option<AllocationSiteIndex>,
    /// Allocated named-field slots, including construction slack.
    pub(crate) field_capacity: u32,
}

impl ObjectHeapData {
    pub fn new(shape: ObjectShape) -> Self {
        Self {
            shape,
            storage: PropertyStorage::new_fast(),
            elements: ElementsStore::new(),
            extensible: true,
            flags: ObjectFlags::empty(),
            named_interceptor: None,
            primitive_value: None,
            allocation_memento: None,
            field_capacity: 0,
        }
    }

    /// Allocate an ordinary object with the root shape for the given
    /// prototype.
    pub fn create(agent: &mut Agent, prototype: Option<Object>) -> ObjectIndex {
        let shape = ObjectShape::get_or_create_shape_for_prototype(agent, prototype);
        use crate::heap::CreateHeapData;
        let Object::Object(index) = agent.heap.create(Self::new(shape)) else {
            unreachable!()
        };
        index
    }
}
