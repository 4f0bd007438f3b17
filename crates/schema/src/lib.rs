//! packnorm schema: per-type field descriptor tables and the eligibility filter.
//!
//! Generated result types describe their fields once, through a static table,
//! instead of being walked reflectively on every call. Each descriptor says
//! whether the field is a constant, how to reach its current value, and
//! whether the element type of a container field could be resolved.

#![forbid(unsafe_code)]

use std::fmt;

use packnorm_core::{Container, Element, Error, Remap, Result, Shape};
use smallvec::SmallVec;
use tracing::trace;

pub use packnorm_core::ElementType;

/// Current value of a field, as seen by the normalizer.
pub enum FieldRef<'a> {
    /// A container; mutable so a replacement can be installed.
    Container(&'a mut dyn Remap),
    Scalar,
    /// An optional container that holds nothing.
    Absent,
}

impl fmt::Debug for FieldRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Container(c) => f
                .debug_struct("Container")
                .field("shape", &c.shape())
                .field("len", &c.len())
                .field("element", &c.element_type())
                .finish(),
            FieldRef::Scalar => f.write_str("Scalar"),
            FieldRef::Absent => f.write_str("Absent"),
        }
    }
}

impl<'a, T: Element> From<&'a mut Container<T>> for FieldRef<'a> {
    fn from(c: &'a mut Container<T>) -> Self {
        FieldRef::Container(c)
    }
}

impl<'a, T: Element> From<&'a mut Option<Container<T>>> for FieldRef<'a> {
    fn from(c: &'a mut Option<Container<T>>) -> Self {
        match c {
            Some(c) => FieldRef::Container(c),
            None => FieldRef::Absent,
        }
    }
}

pub type Accessor<R> = for<'a> fn(&'a mut R) -> FieldRef<'a>;

pub enum Access<R> {
    /// Program-wide constant or a field fixed after construction. Never read.
    Constant,
    /// Listed in the table but not reachable from outside the owning type.
    Denied,
    Field(Accessor<R>),
}

pub struct FieldDescriptor<R> {
    name: &'static str,
    element: ElementType,
    access: Access<R>,
}

impl<R> fmt::Debug for FieldDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = match self.access {
            Access::Constant => "constant",
            Access::Denied => "denied",
            Access::Field(_) => "field",
        };
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("element", &self.element)
            .field("access", &access)
            .finish()
    }
}

impl<R> FieldDescriptor<R> {
    pub fn constant(name: &'static str) -> Self {
        Self { name, element: ElementType::Declared, access: Access::Constant }
    }

    pub fn scalar(name: &'static str) -> Self {
        Self { name, element: ElementType::Declared, access: Access::Field(|_| FieldRef::Scalar) }
    }

    /// A field whose container element type is declared.
    pub fn field(name: &'static str, accessor: Accessor<R>) -> Self {
        Self { name, element: ElementType::Declared, access: Access::Field(accessor) }
    }

    /// A field whose container element type could not be resolved.
    pub fn erased(name: &'static str, accessor: Accessor<R>) -> Self {
        Self { name, element: ElementType::Unresolved, access: Access::Field(accessor) }
    }

    pub fn hidden(name: &'static str) -> Self {
        Self { name, element: ElementType::Declared, access: Access::Denied }
    }

    pub fn name(&self) -> &'static str { self.name }
    pub fn element_type(&self) -> ElementType { self.element }
    pub fn is_constant(&self) -> bool { matches!(self.access, Access::Constant) }
}

impl<R: Record> FieldDescriptor<R> {
    /// Reach the field's current value. Constants yield `None`.
    pub fn access<'a>(&self, record: &'a mut R) -> Result<Option<FieldRef<'a>>> {
        match self.access {
            Access::Constant => Ok(None),
            Access::Denied => Err(Error::FieldAccessDenied { record: R::record_name(), field: self.name }),
            Access::Field(get) => Ok(Some(get(record))),
        }
    }

    pub fn classify(&self, record: &mut R) -> Result<Eligibility> {
        let eligibility = match self.access(record)? {
            None => Eligibility::Constant,
            Some(FieldRef::Scalar) => Eligibility::Scalar,
            Some(FieldRef::Absent) => Eligibility::Absent,
            Some(FieldRef::Container(c)) => Eligibility::Candidate {
                shape: c.shape(),
                len: c.len(),
                nodes: c.node_count(),
            },
        };
        trace!(field = self.name, ?eligibility, "classified");
        Ok(eligibility)
    }
}

/// How the normalizer treats one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Constant,
    Scalar,
    Absent,
    Candidate { shape: Shape, len: usize, nodes: usize },
}

/// A decoded result type with a static field table.
pub trait Record: Sized + 'static {
    /// Leaf types carry nothing to normalize and are returned untouched.
    const LEAF: bool = false;

    fn fields() -> &'static [FieldDescriptor<Self>];

    fn record_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Builder for a descriptor table, in declaration order.
pub struct FieldTable<R> {
    fields: Vec<FieldDescriptor<R>>,
}

impl<R> Default for FieldTable<R> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<R> FieldTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(mut self, name: &'static str) -> Self {
        self.fields.push(FieldDescriptor::constant(name));
        self
    }

    pub fn scalar(mut self, name: &'static str) -> Self {
        self.fields.push(FieldDescriptor::scalar(name));
        self
    }

    pub fn field(mut self, name: &'static str, accessor: Accessor<R>) -> Self {
        self.fields.push(FieldDescriptor::field(name, accessor));
        self
    }

    pub fn erased(mut self, name: &'static str, accessor: Accessor<R>) -> Self {
        self.fields.push(FieldDescriptor::erased(name, accessor));
        self
    }

    pub fn hidden(mut self, name: &'static str) -> Self {
        self.fields.push(FieldDescriptor::hidden(name));
        self
    }

    pub fn build(self) -> Vec<FieldDescriptor<R>> {
        self.fields
    }
}

/// Non-constant fields of `R`, in declaration order.
pub fn eligible<R: Record>() -> SmallVec<[&'static FieldDescriptor<R>; 8]> {
    R::fields().iter().filter(|f| !f.is_constant()).collect()
}

pub fn is_uninteresting<R: Record>() -> bool {
    R::LEAF
}

/// Classify every field of `record`, constants included.
pub fn survey<R: Record>(record: &mut R) -> Result<Vec<(&'static str, Eligibility)>> {
    R::fields()
        .iter()
        .map(|f| f.classify(record).map(|e| (f.name(), e)))
        .collect()
}

macro_rules! leaf_records {
    ($($t:ty),* $(,)?) => {
        $(
            impl Record for $t {
                const LEAF: bool = true;

                fn fields() -> &'static [FieldDescriptor<Self>] {
                    &[]
                }
            }
        )*
    };
}

leaf_records!(
    bool, char, (),
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
    String, &'static str, Vec<u8>,
);
