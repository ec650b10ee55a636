// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{Function, PropertyAttributes, PropertyValue, Value};

/// 6.2.6 The Property Descriptor Specification Type
/// https://tc39.es/ecma262/#sec-property-descriptor-specification-type
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyDescriptor {
    pub value: Option<Value>,
    pub writable: Option<bool>,
    /// The accessor getter; `Some(None)` is an explicitly undefined get.
    pub get: Option<Option<Function>>,
    /// The accessor setter; `Some(None)` is an explicitly undefined set.
    pub set: Option<Option<Function>>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn new_data_descriptor(value: Value) -> Self {
        Self {
            value: Some(value),
            writable: Some(true),
            get: None,
            set: None,
            enumerable: Some(true),
            configurable: Some(true),
        }
    }

    /// 6.2.6.1 IsAccessorDescriptor ( Desc )
    /// https://tc39.es/ecma262/#sec-isaccessordescriptor
    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// 6.2.6.2 IsDataDescriptor ( Desc )
    /// https://tc39.es/ecma262/#sec-isdatadescriptor
    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// 6.2.6.3 IsGenericDescriptor ( Desc )
    /// https://tc39.es/ecma262/#sec-isgenericdescriptor
    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_accessor_descriptor() && !self.is_data_descriptor()
    }

    pub fn is_fully_populated(&self) -> bool {
        if self.enumerable.is_none() || self.configurable.is_none() {
            return false;
        }
        if self.is_accessor_descriptor() {
            self.get.is_some() && self.set.is_some()
        } else {
            self.value.is_some() && self.writable.is_some()
        }
    }

    fn attributes(&self) -> PropertyAttributes {
        let mut attrs = PropertyAttributes::empty();
        if self.writable == Some(true) {
            attrs |= PropertyAttributes::WRITABLE;
        }
        if self.enumerable == Some(true) {
            attrs |= PropertyAttributes::ENUMERABLE;
        }
        if self.configurable == Some(true) {
            attrs |= PropertyAttributes::CONFIGURABLE;
        }
        attrs
    }

    /// The stored form of a fully populated descriptor.
    pub(crate) fn into_property_value(self) -> PropertyValue {
        debug_assert!(self.is_fully_populated());
        if self.is_accessor_descriptor() {
            PropertyValue::Accessor {
                get: self.get.flatten(),
                set: self.set.flatten(),
                attrs: self.attributes(),
            }
        } else {
            PropertyValue::Data {
                value: self.value.unwrap_or(Value::Undefined),
                attrs: self.attributes(),
            }
        }
    }

    /// 6.2.6.6 CompletePropertyDescriptor ( Desc )
    /// https://tc39.es/ecma262/#sec-completepropertydescriptor
    pub fn complete(&mut self) {
        if self.is_generic_descriptor() || self.is_data_descriptor() {
            self.value.get_or_insert(Value::Undefined);
            self.writable.get_or_insert(false);
        } else {
            self.get.get_or_insert(None);
            self.set.get_or_insert(None);
        }
        self.enumerable.get_or_insert(false);
        self.configurable.get_or_insert(false);
    }
}

impl From<PropertyValue> for PropertyDescriptor {
    fn from(stored: PropertyValue) -> Self {
        match stored {
            PropertyValue::Data { value, attrs } => Self {
                value: Some(value),
                writable: Some(attrs.is_writable()),
                get: None,
                set: None,
                enumerable: Some(attrs.is_enumerable()),
                configurable: Some(attrs.is_configurable()),
            },
            PropertyValue::Accessor { get, set, attrs } => Self {
                value: None,
                writable: None,
                get: Some(get),
                set: Some(set),
                enumerable: Some(attrs.is_enumerable()),
                configurable: Some(attrs.is_configurable()),
            },
        }
    }
}
