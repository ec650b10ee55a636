// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod allocation_site;
pub mod element_array;
pub mod indexes;

use std::ops::{Index, IndexMut};

use ahash::AHashMap;

pub use allocation_site::AllocationSiteRecord;

use crate::ecmascript::{
    builtins::ordinary::shape::{ObjectShapeRecord, ObjectShapeTransitionMap, PrototypeShapeTable},
    builtins::global_object::PropertyCellRecord,
    types::{ErrorHeapData, Function, FunctionHeapData, Object, ObjectHeapData, StringHeapData},
};
use indexes::{
    AllocationSiteIndex, ErrorIndex, FunctionIndex, ObjectIndex, PropertyCellIndex, StringIndex,
};

/// Helper trait for creating data into the heap and getting a handle to it.
pub trait CreateHeapData<T, F> {
    /// Allocate the data into the heap, returning a handle.
    fn create(&mut self, data: T) -> F;
}

/// The arena that owns every object-model record.
///
/// Reclamation is the external collector's concern; this heap only grows and
/// counts allocation pressure so a collection can be triggered at the
/// allocation boundary.
#[derive(Debug)]
pub struct Heap {
    pub objects: Vec<Option<ObjectHeapData>>,
    pub functions: Vec<Option<FunctionHeapData>>,
    pub errors: Vec<Option<ErrorHeapData>>,
    pub strings: Vec<Option<StringHeapData>>,
    pub property_cells: Vec<Option<PropertyCellRecord>>,
    pub allocation_sites: Vec<Option<AllocationSiteRecord>>,
    pub object_shapes: Vec<ObjectShapeRecord>,
    pub object_shape_transitions: Vec<ObjectShapeTransitionMap>,
    pub(crate) prototype_shapes: PrototypeShapeTable,
    string_lookup: AHashMap<Box<str>, StringIndex>,
    /// Bytes allocated since the last collection opportunity.
    pub alloc_counter: usize,
}

impl Heap {
    pub fn new() -> Self {
        let mut heap = Self {
            objects: Vec::new(),
            functions: Vec::new(),
            errors: Vec::new(),
            strings: Vec::new(),
            property_cells: Vec::new(),
            allocation_sites: Vec::new(),
            object_shapes: Vec::new(),
            object_shape_transitions: Vec::new(),
            prototype_shapes: PrototypeShapeTable::with_capacity(16),
            string_lookup: AHashMap::new(),
            alloc_counter: 0,
        };
        // Seed the root Object Shape for null-prototype objects; it backs
        // the statically accessible ObjectShape::NULL.
        heap.object_shapes.push(ObjectShapeRecord::NULL);
        heap.object_shape_transitions
            .push(ObjectShapeTransitionMap::root());
        heap
    }

    /// Intern a string, returning the existing handle if the same content
    /// has been allocated before.
    pub fn alloc_string(&mut self, message: &str) -> StringIndex {
        if let Some(index) = self.string_lookup.get(message) {
            return *index;
        }
        self.alloc_counter += core::mem::size_of::<StringHeapData>() + message.len();
        self.strings.push(Some(StringHeapData::from_str(message)));
        let index = StringIndex::last(&self.strings);
        self.string_lookup.insert(message.into(), index);
        index
    }

    pub fn get_string(&self, index: StringIndex) -> &str {
        self[index].as_str()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! impl_heap_index {
    ($index: ty, $data: ty, $field: ident, $label: literal) => {
        impl Index<$index> for Heap {
            type Output = $data;

            fn index(&self, index: $index) -> &Self::Output {
                self.$field
                    .get(index.into_index())
                    .expect(concat!("Invalid ", $label, ": No item at index"))
                    .as_ref()
                    .expect(concat!("Invalid ", $label, ": Found None at index"))
            }
        }

        impl IndexMut<$index> for Heap {
            fn index_mut(&mut self, index: $index) -> &mut Self::Output {
                self.$field
                    .get_mut(index.into_index())
                    .expect(concat!("Invalid ", $label, ": No item at index"))
                    .as_mut()
                    .expect(concat!("Invalid ", $label, ": Found None at index"))
            }
        }
    };
}

impl_heap_index!(ObjectIndex, ObjectHeapData, objects, "ObjectIndex");
impl_heap_index!(FunctionIndex, FunctionHeapData, functions, "FunctionIndex");
impl_heap_index!(ErrorIndex, ErrorHeapData, errors, "ErrorIndex");
impl_heap_index!(StringIndex, StringHeapData, strings, "StringIndex");
impl_heap_index!(
    PropertyCellIndex,
    PropertyCellRecord,
    property_cells,
    "PropertyCellIndex"
);
impl_heap_index!(
    AllocationSiteIndex,
    AllocationSiteRecord,
    allocation_sites,
    "AllocationSiteIndex"
);

impl CreateHeapData<ObjectHeapData, Object> for Heap {
    fn create(&mut self, data: ObjectHeapData) -> Object {
        self.alloc_counter += core::mem::size_of::<ObjectHeapData>();
        self.objects.push(Some(data));
        Object::Object(ObjectIndex::last(&self.objects))
    }
}

impl CreateHeapData<FunctionHeapData, Function> for Heap {
    fn create(&mut self, data: FunctionHeapData) -> Function {
        self.alloc_counter += core::mem::size_of::<FunctionHeapData>();
        self.functions.push(Some(data));
        Function(FunctionIndex::last(&self.functions))
    }
}

impl CreateHeapData<ErrorHeapData, ErrorIndex> for Heap {
    fn create(&mut self, data: ErrorHeapData) -> ErrorIndex {
        self.alloc_counter += core::mem::size_of::<ErrorHeapData>();
        self.errors.push(Some(data));
        ErrorIndex::last(&self.errors)
    }
}

impl CreateHeapData<PropertyCellRecord, PropertyCellIndex> for Heap {
    fn create(&mut self, data: PropertyCellRecord) -> PropertyCellIndex {
        self.alloc_counter += core::mem::size_of::<PropertyCellRecord>();
        self.property_cells.push(Some(data));
        PropertyCellIndex::last(&self.property_cells)
    }
}

impl CreateHeapData<AllocationSiteRecord, AllocationSiteIndex> for Heap {
    fn create(&mut self, data: AllocationSiteRecord) -> AllocationSiteIndex {
        self.alloc_counter += core::mem::size_of::<AllocationSiteRecord>();
        self.allocation_sites.push(Some(data));
        AllocationSiteIndex::last(&self.allocation_sites)
    }
}
