//! Typed per-element attributes.
//!
//! A mesh carries one attribute table per element kind (vertices, edges,
//! faces). Each table holds any number of columns, one value per element
//! slot, and each column is addressed by a typed [`Attribute`] handle:
//!
//! ```
//! use resurface::prelude::*;
//! use nalgebra::Point3;
//!
//! let points = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&points, &[[0, 1, 2]]).unwrap();
//!
//! let weight: VertexAttribute<f64> = mesh.add_attribute(1.0);
//! mesh.set_attr(weight, VertexId::new(2), 4.0);
//! assert_eq!(mesh.attr(weight, VertexId::new(2)), 4.0);
//! assert_eq!(mesh.attribute(weight), &[1.0, 1.0, 4.0]);
//!
//! mesh.remove_attribute(weight);
//! assert!(!mesh.has_attribute(weight));
//! ```
//!
//! Columns grow with the mesh and are compacted together with it by
//! [`HalfEdgeMesh::garbage_collection`]. A handle stays bound to the column it
//! was created for; once that column is removed the handle is stale, even if
//! its slot is later reused.

use std::fmt;
use std::marker::PhantomData;

use downcast_rs::{impl_downcast, DowncastSync};

use super::index::{EdgeId, FaceId, MeshIndex, VertexId};

/// Which element table an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    /// Per-vertex data.
    Vertex,
    /// Per-edge data.
    Edge,
    /// Per-face data.
    Face,
}

/// Marker type naming an element kind at the type level.
pub trait ElementKind: Copy + fmt::Debug + Send + Sync + 'static {
    /// The table this kind selects.
    const TYPE: ElementType;
}

/// Vertex marker.
#[derive(Debug, Clone, Copy)]
pub struct VertexKind;

/// Edge marker.
#[derive(Debug, Clone, Copy)]
pub struct EdgeKind;

/// Face marker.
#[derive(Debug, Clone, Copy)]
pub struct FaceKind;

impl ElementKind for VertexKind {
    const TYPE: ElementType = ElementType::Vertex;
}

impl ElementKind for EdgeKind {
    const TYPE: ElementType = ElementType::Edge;
}

impl ElementKind for FaceKind {
    const TYPE: ElementType = ElementType::Face;
}

/// Element handles that can index an attribute column.
pub trait ElementId<I: MeshIndex>: Copy {
    /// The element kind of this handle.
    type Kind: ElementKind;

    /// Position of the element in its arena.
    fn slot(self) -> usize;
}

impl<I: MeshIndex> ElementId<I> for VertexId<I> {
    type Kind = VertexKind;

    #[inline]
    fn slot(self) -> usize {
        self.index()
    }
}

impl<I: MeshIndex> ElementId<I> for EdgeId<I> {
    type Kind = EdgeKind;

    #[inline]
    fn slot(self) -> usize {
        self.index()
    }
}

impl<I: MeshIndex> ElementId<I> for FaceId<I> {
    type Kind = FaceKind;

    #[inline]
    fn slot(self) -> usize {
        self.index()
    }
}

/// Values that can be stored in an attribute column.
pub trait AttributeValue: Clone + Send + Sync + fmt::Debug + 'static {}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> AttributeValue for T {}

/// Typed handle of an attribute column.
pub struct Attribute<K, T> {
    slot: u32,
    generation: u32,
    _marker: PhantomData<fn() -> (K, T)>,
}

/// Handle of a per-vertex attribute.
pub type VertexAttribute<T> = Attribute<VertexKind, T>;

/// Handle of a per-edge attribute.
pub type EdgeAttribute<T> = Attribute<EdgeKind, T>;

/// Handle of a per-face attribute.
pub type FaceAttribute<T> = Attribute<FaceKind, T>;

impl<K, T> Clone for Attribute<K, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, T> Copy for Attribute<K, T> {}

impl<K, T> PartialEq for Attribute<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.generation == other.generation
    }
}

impl<K, T> Eq for Attribute<K, T> {}

impl<K: ElementKind, T> fmt::Debug for Attribute<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attribute<{:?}, {}>(#{}@{})",
            K::TYPE,
            std::any::type_name::<T>(),
            self.slot,
            self.generation
        )
    }
}

/// Type-erased column storage.
trait Column: DowncastSync + fmt::Debug {
    fn push_default(&mut self);
    fn retain_mask(&mut self, keep: &[bool]);
    fn clone_column(&self) -> Box<dyn Column>;
}
impl_downcast!(sync Column);

#[derive(Debug, Clone)]
struct TypedColumn<T> {
    values: Vec<T>,
    default: T,
}

impl<T: AttributeValue> Column for TypedColumn<T> {
    fn push_default(&mut self) {
        self.values.push(self.default.clone());
    }

    fn retain_mask(&mut self, keep: &[bool]) {
        let mut slot = 0;
        self.values.retain(|_| {
            let kept = keep.get(slot).copied().unwrap_or(false);
            slot += 1;
            kept
        });
    }

    fn clone_column(&self) -> Box<dyn Column> {
        Box::new(self.clone())
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    column: Option<Box<dyn Column>>,
}

impl Clone for Slot {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            column: self.column.as_ref().map(|c| c.clone_column()),
        }
    }
}

/// All attribute columns of one element kind.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeTable {
    slots: Vec<Slot>,
}

impl AttributeTable {
    /// Add a column with `len` copies of `default`.
    pub(crate) fn add<K, T: AttributeValue>(&mut self, default: T, len: usize) -> Attribute<K, T> {
        let column: Box<dyn Column> = Box::new(TypedColumn {
            values: vec![default.clone(); len],
            default,
        });

        let slot = match self.slots.iter().position(|s| s.column.is_none()) {
            Some(free) => {
                let s = &mut self.slots[free];
                s.generation = s.generation.wrapping_add(1);
                s.column = Some(column);
                free
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    column: Some(column),
                });
                self.slots.len() - 1
            }
        };

        Attribute {
            slot: slot as u32,
            generation: self.slots[slot].generation,
            _marker: PhantomData,
        }
    }

    fn live_slot<K, T>(&self, handle: Attribute<K, T>) -> Option<&Slot> {
        self.slots
            .get(handle.slot as usize)
            .filter(|s| s.generation == handle.generation && s.column.is_some())
    }

    pub(crate) fn contains<K, T: AttributeValue>(&self, handle: Attribute<K, T>) -> bool {
        self.get(handle).is_some()
    }

    pub(crate) fn get<K, T: AttributeValue>(&self, handle: Attribute<K, T>) -> Option<&[T]> {
        self.live_slot(handle)
            .and_then(|s| s.column.as_ref())
            .and_then(|c| c.downcast_ref::<TypedColumn<T>>())
            .map(|c| c.values.as_slice())
    }

    pub(crate) fn get_mut<K, T: AttributeValue>(
        &mut self,
        handle: Attribute<K, T>,
    ) -> Option<&mut [T]> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.column
            .as_mut()
            .and_then(|c| c.downcast_mut::<TypedColumn<T>>())
            .map(|c| c.values.as_mut_slice())
    }

    /// Remove a column. Returns `false` if the handle was already stale.
    pub(crate) fn remove<K, T: AttributeValue>(&mut self, handle: Attribute<K, T>) -> bool {
        if !self.contains(handle) {
            return false;
        }
        self.slots[handle.slot as usize].column = None;
        true
    }

    /// Number of live columns.
    pub(crate) fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.column.is_some()).count()
    }

    /// Drop every column, invalidating all handles.
    pub(crate) fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.column = None;
        }
    }

    /// Append one default value to every column.
    pub(crate) fn push_default(&mut self) {
        for column in self.slots.iter_mut().filter_map(|s| s.column.as_mut()) {
            column.push_default();
        }
    }

    /// Keep only the rows whose mask entry is `true`, preserving order.
    pub(crate) fn retain(&mut self, keep: &[bool]) {
        for column in self.slots.iter_mut().filter_map(|s| s.column.as_mut()) {
            column.retain_mask(keep);
        }
    }
}
