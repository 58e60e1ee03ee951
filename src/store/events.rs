//! Bounded history of recent events

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::registry::Record;

/// Recent events keyed by ID, evicting the oldest insertion once full.
///
/// Re-inserting an existing ID replaces the record but keeps its position.
#[derive(Debug, Clone)]
pub struct EventHistory {
    capacity: usize,
    order: VecDeque<String>,
    events: HashMap<String, Arc<Record>>,
}

impl EventHistory {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, order: VecDeque::with_capacity(capacity), events: HashMap::with_capacity(capacity) }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Record>> {
        self.events.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events.contains_key(id)
    }

    /// Insert or replace an event; returns the evicted event, if any.
    pub fn insert(&mut self, id: String, event: Arc<Record>) -> Option<Arc<Record>> {
        if self.events.insert(id.clone(), event).is_some() {
            return None;
        }

        self.order.push_back(id);
        if self.capacity > 0 && self.order.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            return self.events.remove(&oldest);
        }
        None
    }

    /// Events in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.order.iter().filter_map(|id| self.events.get(id))
    }
}
