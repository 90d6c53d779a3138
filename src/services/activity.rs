//! Bounded, newest-first buffer of activity events.

use super::message::{ActivityCategory, ActivityEvent};
use std::collections::VecDeque;
use std::sync::RwLock;

pub const ACTIVITY_CAPACITY: usize = 1000;

pub struct ActivityLog {
    entries: RwLock<VecDeque<ActivityEvent>>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::with_capacity(ACTIVITY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(ACTIVITY_CAPACITY))),
            capacity: capacity.max(1),
        }
    }

    /// Insert at the front, evicting the oldest entry when full.
    pub fn push(&self, event: ActivityEvent) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.len() >= self.capacity {
            entries.pop_back();
        }
        entries.push_front(event);
    }

    /// Newest-first copy, optionally limited and filtered by category.
    pub fn snapshot(&self, limit: Option<usize>, category: Option<ActivityCategory>) -> Vec<ActivityEvent> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|e| category.map_or(true, |c| e.category == c))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}
