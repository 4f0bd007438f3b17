//! Element conversion and container replacement for one field.

#![forbid(unsafe_code)]

use tracing::warn;

use crate::{Container, Element, ElementType, Error, Item, Kind, Policy, Result, Shape};

/// Outcome of remapping one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remapped {
    pub kind: Kind,
    pub converted: usize,
    pub passed_through: usize,
    /// Elements a set replacement absorbed because they converted to an equal value.
    pub collapsed: usize,
}

/// Type-erased view of a container field that can rebuild itself.
pub trait Remap {
    fn shape(&self) -> Shape;
    fn len(&self) -> usize;
    fn node_count(&self) -> usize;
    /// Name of the element type the container is declared with.
    fn element_type(&self) -> &'static str;

    /// Replace the container with a concrete one holding converted elements.
    fn remap(&mut self, field: &'static str, element: ElementType, policy: &Policy) -> Result<Remapped>;
}

impl<T: Element> Remap for Container<T> {
    fn shape(&self) -> Shape {
        Container::shape(self)
    }

    fn len(&self) -> usize {
        Container::len(self)
    }

    fn node_count(&self) -> usize {
        Container::node_count(self)
    }

    fn element_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn remap(&mut self, field: &'static str, element: ElementType, policy: &Policy) -> Result<Remapped> {
        let shape = Container::shape(self);
        let replacement = policy
            .select(self)
            .ok_or(Error::ContainerKindUnsupported { field, shape })?;

        // Convert by reference first; a failure leaves the field as decoded.
        let mut converted: Vec<Option<T>> = Vec::with_capacity(Container::len(self));
        for (index, item) in self.iter().enumerate() {
            match item {
                Item::Node(node) => {
                    if !element.is_resolved() {
                        return Err(Error::UnresolvedElementType { field, index });
                    }
                    let value = node.convert_to::<T>().map_err(|e| e.locate(field, index))?;
                    converted.push(Some(value));
                }
                Item::Value(_) => converted.push(None),
            }
        }

        let original = std::mem::take(self);
        let mut next = replacement.build::<T>();
        let mut out = Remapped { kind: replacement.kind, converted: 0, passed_through: 0, collapsed: 0 };
        for (item, value) in original.into_items().into_iter().zip(converted) {
            let item = match value {
                Some(v) => {
                    out.converted += 1;
                    Item::Value(v)
                }
                None => {
                    out.passed_through += 1;
                    item
                }
            };
            if !next.insert(item) {
                out.collapsed += 1;
            }
        }
        if out.collapsed > 0 {
            warn!(field, collapsed = out.collapsed, kind = ?out.kind, "replacement absorbed equal elements");
        }
        *self = next;
        Ok(out)
    }
}
