// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::builtins::ordinary::ordinary_object_create;
use crate::ecmascript::types::{Object, ObjectFlags};

use super::agent::Agent;

/// A realm: the global object and the intrinsic prototypes everything in
/// it hangs off.
///
/// The global object also serves as the realm's global proxy; sloppy-mode
/// receiver coercion substitutes it directly.
#[derive(Debug, Clone, Copy)]
pub struct Realm {
    pub global_object: Object,
    pub object_prototype: Object,
    pub function_prototype: Object,
}

impl Realm {
    pub(crate) fn initialize(agent: &mut Agent) -> Self {
        let object_prototype = ordinary_object_create(agent, None);
        let function_prototype = ordinary_object_create(agent, Some(object_prototype));
        let global_object = ordinary_object_create(agent, Some(object_prototype));
        let backing = global_object
            .get_backing_object(agent)
            .expect("Ordinary object lacks backing storage");
        let data = &mut agent.heap[backing];
        data.flags |= ObjectFlags::GLOBAL;
        data.storage =
            crate::ecmascript::types::property_storage::PropertyStorage::new_global();
        Self {
            global_object,
            object_prototype,
            function_prototype,
        }
    }
}
