// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property resolution as an explicit state machine.
//!
//! A [`LookupIterator`] walks one holder at a time from a start object up
//! its prototype chain, pausing whenever resolution needs the caller's
//! involvement: an access check to pass judgement on, or an interceptor to
//! invoke. The caller acts on the paused state and resumes with
//! [`LookupIterator::next`].

use tracing::warn;

use crate::ecmascript::execution::Agent;
use crate::ecmascript::types::{
    Function, Object, ObjectFlags, PropertyAttributes, PropertyKey, PropertyValue, Value,
};
use crate::heap::indexes::PropertyCellIndex;

use crate::ecmascript::builtins::global_object::{global_cell_for, PropertyCellState};

/// Longest prototype chain a lookup will follow before giving up.
pub const MAX_PROTOTYPE_CHAIN: u32 = 128;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookupState {
    /// The current holder requires an access check the agent's callback
    /// refused. Terminal; the operation decides how to fail.
    AccessCheck,
    /// The current holder carries a named interceptor that gets first
    /// refusal. Calling `next` after a declined interceptor re-seeks the
    /// same holder's own storage.
    Interceptor,
    Data {
        value: Value,
        attrs: PropertyAttributes,
    },
    Accessor {
        get: Option<Function>,
        set: Option<Function>,
        attrs: PropertyAttributes,
    },
    /// A global-object property backed by a property cell.
    GlobalCell {
        cell: PropertyCellIndex,
        attrs: PropertyAttributes,
    },
    /// The chain is exhausted. Terminal.
    NotFound,
}

#[derive(Debug)]
pub struct LookupIterator {
    key: PropertyKey,
    /// The original receiver of the operation, which may differ from the
    /// holder when the property was inherited.
    receiver: Value,
    holder: Option<Object>,
    state: LookupState,
    own_only: bool,
    /// Set after the current holder's interceptor declined.
    skip_interceptor: bool,
    hops: u32,
}

impl LookupIterator {
    pub fn new(agent: &mut Agent, receiver: Value, start: Object, key: PropertyKey) -> Self {
        Self::with_mode(agent, receiver, start, key, false)
    }

    /// An own-property lookup. Hidden prototypes stay transparent: their
    /// own properties are reported as the start object's.
    pub fn new_own(agent: &mut Agent, receiver: Value, start: Object, key: PropertyKey) -> Self {
        Self::with_mode(agent, receiver, start, key, true)
    }

    fn with_mode(
        agent: &mut Agent,
        receiver: Value,
        start: Object,
        key: PropertyKey,
        own_only: bool,
    ) -> Self {
        let mut iterator = Self {
            key,
            receiver,
            holder: Some(start),
            state: LookupState::NotFound,
            own_only,
            skip_interceptor: false,
            hops: 0,
        };
        iterator.state = iterator.seek(agent);
        iterator
    }

    pub fn state(&self) -> LookupState {
        self.state
    }

    pub fn key(&self) -> PropertyKey {
        self.key
    }

    pub fn receiver(&self) -> Value {
        self.receiver
    }

    /// The object the current state was found on.
    pub fn holder(&self) -> Option<Object> {
        self.holder
    }

    /// Resume a paused lookup. After a declined interceptor this re-seeks
    /// the same holder; otherwise it moves past the current result to the
    /// next holder in the chain.
    pub fn next(&mut self, agent: &mut Agent) {
        if self.state == LookupState::Interceptor {
            self.skip_interceptor = true;
        } else {
            self.advance_holder(agent);
        }
        self.state = self.seek(agent);
    }

    fn seek(&mut self, agent: &mut Agent) -> LookupState {
        loop {
            let Some(holder) = self.holder else {
                return LookupState::NotFound;
            };
            if holder.needs_access_check(agent) && !agent.may_access(holder) {
                return LookupState::AccessCheck;
            }
            if !self.skip_interceptor && holder.named_interceptor(agent).is_some() {
                return LookupState::Interceptor;
            }
            if let Some(state) = lookup_own(agent, holder, self.key) {
                return state;
            }
            self.advance_holder(agent);
        }
    }

    fn advance_holder(&mut self, agent: &Agent) {
        self.skip_interceptor = false;
        let Some(holder) = self.holder else {
            return;
        };
        let prototype = holder.internal_prototype(agent);
        // An own lookup leaves the start object only through hidden links.
        if self.own_only && !prototype.is_some_and(|p| p.is_hidden_prototype(agent)) {
            self.holder = None;
            return;
        }
        self.hops += 1;
        if self.hops > MAX_PROTOTYPE_CHAIN {
            warn!(hops = self.hops, "prototype chain walk exceeded limit");
            self.holder = None;
            return;
        }
        self.holder = prototype;
    }
}

/// The attributes of an indexed property, derived from the owner's
/// integrity flags.
pub(crate) fn element_attributes(flags: ObjectFlags) -> PropertyAttributes {
    let mut attrs = PropertyAttributes::DEFAULT_DATA;
    if flags.contains(ObjectFlags::SEALED_ELEMENTS) {
        attrs -= PropertyAttributes::CONFIGURABLE;
    }
    if flags.contains(ObjectFlags::FROZEN_ELEMENTS) {
        attrs -= PropertyAttributes::CONFIGURABLE | PropertyAttributes::WRITABLE;
    }
    attrs
}

/// One holder's own storage: elements for integer keys, then the named
/// storage in whichever mode it is in. Uninitialized slots read as absent.
pub(crate) fn lookup_own(agent: &Agent, holder: Object, key: PropertyKey) -> Option<LookupState> {
    let backing = holder.get_backing_object(agent)?;
    if let PropertyKey::Integer(index) = key {
        let data = &agent.heap[backing];
        let value = data.elements.get(index)?;
        return Some(LookupState::Data {
            value,
            attrs: element_attributes(data.flags),
        });
    }
    if agent.heap[backing].storage.is_global() {
        let cell = global_cell_for(agent, backing, key)?;
        let record = &agent.heap[cell];
        if record.state == PropertyCellState::Deleted {
            return None;
        }
        return property_value_state(record.property, record.property.attributes(), Some(cell));
    }
    let stored = if agent.heap[backing].storage.is_fast() {
        let slot = agent.heap[backing].shape.key_slot(agent, key)?;
        agent.heap[backing].storage.fast_slot(slot)?
    } else {
        agent.heap[backing].storage.dictionary_get(key)?
    };
    property_value_state(stored, stored.attributes(), None)
}

fn property_value_state(
    stored: PropertyValue,
    attrs: PropertyAttributes,
    cell: Option<PropertyCellIndex>,
) -> Option<LookupState> {
    match stored {
        PropertyValue::Data { value, .. } => {
            if value == Value::Uninitialized {
                // A hole left by field pre-allocation; the property does
                // not observably exist yet.
                return None;
            }
            Some(match cell {
                Some(cell) => LookupState::GlobalCell { cell, attrs },
                None => LookupState::Data { value, attrs },
            })
        }
        PropertyValue::Accessor { get, set, .. } => {
            Some(LookupState::Accessor { get, set, attrs })
        }
    }
}
