// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Feedback record for one allocation call site.
///
/// Instances constructed while the site is collecting feedback carry a
/// memento back-reference; the count tunes future allocation decisions. The
/// collection window is bounded by the site, not by any instance's lifetime.
#[derive(Debug, Clone)]
pub struct AllocationSiteRecord {
    memento_count: u32,
    collection_active: bool,
}

impl AllocationSiteRecord {
    pub fn new() -> Self {
        Self {
            memento_count: 0,
            collection_active: true,
        }
    }

    pub fn memento_count(&self) -> u32 {
        self.memento_count
    }

    pub fn is_collecting(&self) -> bool {
        self.collection_active
    }

    pub(crate) fn record_memento(&mut self) {
        self.memento_count += 1;
    }

    /// Close the feedback-collection window; further constructions from
    /// this site no longer carry mementos.
    pub fn finish_collection(&mut self) {
        self.collection_active = false;
    }
}

impl Default for AllocationSiteRecord {
    fn default() -> Self {
        Self::new()
    }
}
