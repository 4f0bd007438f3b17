//! Replacement policy: which concrete container stands in for an observed one.
//!
//! Concrete kinds are rebuilt as themselves. Capability markers go through an
//! explicit table so the mapping can be audited and extended per caller.

#![forbid(unsafe_code)]

use std::collections::{HashSet, VecDeque};

use crate::{BoundedQueue, Capability, Container, Kind, Shape};

/// Built-in capability table.
pub const DEFAULT_ENTRIES: &[(Capability, Kind)] = &[
    (Capability::Set, Kind::HashSet),
    (Capability::Sequence, Kind::Vec),
    (Capability::BoundedQueue, Kind::BoundedQueue),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    entries: Vec<(Capability, Kind)>,
}

impl Default for Policy {
    fn default() -> Self {
        Self { entries: DEFAULT_ENTRIES.to_vec() }
    }
}

impl Policy {
    /// A table with no capability entries; only concrete kinds are accepted.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Map `capability` to `kind`, replacing any previous entry.
    pub fn with_entry(mut self, capability: Capability, kind: Kind) -> Self {
        self.entries.retain(|(c, _)| *c != capability);
        self.entries.push((capability, kind));
        self
    }

    pub fn without(mut self, capability: Capability) -> Self {
        self.entries.retain(|(c, _)| *c != capability);
        self
    }

    pub fn entries(&self) -> &[(Capability, Kind)] {
        &self.entries
    }

    pub fn lookup(&self, capability: Capability) -> Option<Kind> {
        self.entries.iter().find(|(c, _)| *c == capability).map(|(_, k)| *k)
    }

    /// Pick the replacement for `container`, or `None` when its kind is not covered.
    pub fn select<T>(&self, container: &Container<T>) -> Option<Replacement> {
        let len = container.len();
        match container.shape() {
            Shape::Concrete(kind) => {
                // a concrete bounded queue keeps the capacity its owner chose
                let capacity = container.bound().map_or(len, |bound| bound.max(len));
                Some(Replacement { kind, capacity })
            }
            Shape::Marker(capability) => self.lookup(capability).map(|kind| Replacement { kind, capacity: len }),
            Shape::Foreign(_) => None,
        }
    }
}

/// A concrete container kind plus the capacity to allocate it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replacement {
    pub kind: Kind,
    pub capacity: usize,
}

impl Replacement {
    /// Allocate an empty container of the selected kind.
    pub fn build<T>(&self) -> Container<T> {
        match self.kind {
            Kind::Vec => Container::Vec(Vec::with_capacity(self.capacity)),
            Kind::VecDeque => Container::VecDeque(VecDeque::with_capacity(self.capacity)),
            Kind::HashSet => Container::HashSet(HashSet::with_capacity(self.capacity)),
            Kind::BoundedQueue => Container::BoundedQueue(BoundedQueue::with_capacity(self.capacity)),
        }
    }
}
