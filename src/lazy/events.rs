// Copyright 2024 ndset developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fmt;
use std::sync::{Arc, RwLock};

use log::trace;

use crate::Ix;

/// Sent after a lazy dataset's data or shape changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataEvent {
    pub name: String,
    pub shape: Vec<Ix>,
}

/// Receives [`DataEvent`]s. Closures taking `&DataEvent` are listeners.
pub trait DataListener: Send + Sync {
    fn data_changed(&self, event: &DataEvent);
}

impl<F> DataListener for F
where
    F: Fn(&DataEvent) + Send + Sync,
{
    fn data_changed(&self, event: &DataEvent) {
        self(event)
    }
}

/// The listeners of one dataset. Clones share the list.
#[derive(Clone, Default)]
pub struct ListenerDelegate {
    listeners: Arc<RwLock<Vec<Arc<dyn DataListener>>>>,
}

impl ListenerDelegate {
    pub fn add(&self, listener: Arc<dyn DataListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    /// Remove a listener previously added, compared by identity.
    pub fn remove(&self, listener: &Arc<dyn DataListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    pub fn has_listeners(&self) -> bool {
        !self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_empty()
    }

    pub fn fire(&self, event: &DataEvent) {
        // listeners may add or remove listeners
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        trace!("firing {:?} to {} listeners", event, listeners.len());
        for l in listeners {
            l.data_changed(event);
        }
    }
}

impl fmt::Debug for ListenerDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.listeners.read().unwrap_or_else(|e| e.into_inner()).len();
        f.debug_struct("ListenerDelegate").field("listeners", &n).finish()
    }
}
