//! Typed containers for decoded fields.
//!
//! A decoder that only knows the capability of a field ("some set") stages its
//! elements as `Container::Staged`; normalization replaces that with a concrete
//! kind whose elements are of the declared type.

#![forbid(unsafe_code)]

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

use serde::{Serialize, Serializer};

use crate::{Capability, Item, Kind, Node, Shape};

/// FIFO queue with a capacity fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { items: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn capacity(&self) -> usize { self.capacity }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn is_full(&self) -> bool { self.items.len() >= self.capacity }

    /// Append at the tail; hands the item back when the queue is full.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        self.items.push_back(item);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for BoundedQueue<T> {
    type Item = T;
    type IntoIter = std::collections::vec_deque::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Container value held by a decoded field.
#[derive(Debug, Clone)]
pub enum Container<T> {
    Vec(Vec<Item<T>>),
    VecDeque(VecDeque<Item<T>>),
    HashSet(HashSet<Item<T>>),
    BoundedQueue(BoundedQueue<Item<T>>),
    /// Only the capability is known; elements are kept in wire order.
    Staged { capability: Capability, items: Vec<Item<T>> },
    /// A container the decoder could not classify.
    Foreign { type_name: &'static str, items: Vec<Item<T>> },
}

impl<T> Default for Container<T> {
    fn default() -> Self {
        Container::Vec(Vec::new())
    }
}

impl<T> Container<T> {
    /// Stage decoded nodes under a capability marker.
    pub fn staged<I>(capability: Capability, nodes: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Container::Staged { capability, items: nodes.into_iter().map(Item::Node).collect() }
    }

    pub fn shape(&self) -> Shape {
        match self {
            Container::Vec(_) => Shape::Concrete(Kind::Vec),
            Container::VecDeque(_) => Shape::Concrete(Kind::VecDeque),
            Container::HashSet(_) => Shape::Concrete(Kind::HashSet),
            Container::BoundedQueue(_) => Shape::Concrete(Kind::BoundedQueue),
            Container::Staged { capability, .. } => Shape::Marker(*capability),
            Container::Foreign { type_name, .. } => Shape::Foreign(*type_name),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Container::Vec(v) => v.len(),
            Container::VecDeque(v) => v.len(),
            Container::HashSet(s) => s.len(),
            Container::BoundedQueue(q) => q.len(),
            Container::Staged { items, .. } | Container::Foreign { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacity of a concrete bounded queue; `None` for every other kind.
    pub fn bound(&self) -> Option<usize> {
        match self {
            Container::BoundedQueue(q) => Some(q.capacity()),
            _ => None,
        }
    }

    /// Elements in the container's natural order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Item<T>> + '_> {
        match self {
            Container::Vec(v) => Box::new(v.iter()),
            Container::VecDeque(v) => Box::new(v.iter()),
            Container::HashSet(s) => Box::new(s.iter()),
            Container::BoundedQueue(q) => Box::new(q.iter()),
            Container::Staged { items, .. } | Container::Foreign { items, .. } => Box::new(items.iter()),
        }
    }

    /// Plain values, skipping elements that are still generic nodes.
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().filter_map(Item::as_value)
    }

    pub fn node_count(&self) -> usize {
        self.iter().filter(|item| item.is_node()).count()
    }

    /// True once no element is a generic node.
    pub fn is_normalized(&self) -> bool {
        self.iter().all(|item| !item.is_node())
    }

    /// Consume into the elements, in the same order `iter` yields them.
    pub fn into_items(self) -> Vec<Item<T>> {
        match self {
            Container::Vec(v) => v,
            Container::VecDeque(v) => v.into_iter().collect(),
            Container::HashSet(s) => s.into_iter().collect(),
            Container::BoundedQueue(q) => q.into_iter().collect(),
            Container::Staged { items, .. } | Container::Foreign { items, .. } => items,
        }
    }
}

impl<T: Hash + Eq> Container<T> {
    /// Add one element at the tail (or into the set).
    ///
    /// Returns false when nothing was stored: a set already held an equal
    /// element, or a bounded queue is full.
    pub fn insert(&mut self, item: Item<T>) -> bool {
        match self {
            Container::Vec(v) => { v.push(item); true }
            Container::VecDeque(v) => { v.push_back(item); true }
            Container::HashSet(s) => s.insert(item),
            Container::BoundedQueue(q) => q.push(item).is_ok(),
            Container::Staged { items, .. } | Container::Foreign { items, .. } => { items.push(item); true }
        }
    }
}

impl<T: Serialize> Serialize for Container<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<T> FromIterator<T> for Container<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Container::Vec(iter.into_iter().map(Item::Value).collect())
    }
}
