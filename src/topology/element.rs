use crate::error::{Result, TopologyError};

use super::link::SlotRole;
use super::vertex::VertexId;
use super::MeshStore;
use crate::math::degenerate::{quad_is_degenerate, triangle_is_collinear};

slotmap::new_key_type! {
    /// Unique identifier for an element in the mesh store.
    pub struct ElementId;
}

slotmap::new_key_type! {
    /// Unique identifier for a parent group in the mesh store.
    pub struct GroupId;
}

/// The four primitive kinds a part is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Line,
    Triangle,
    Quad,
    CondLine,
}

impl ElementKind {
    /// All kinds, in the order batch operations visit them.
    pub const ALL: [Self; 4] = [Self::Line, Self::Triangle, Self::Quad, Self::CondLine];

    /// Number of vertex slots an element of this kind carries.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Line => 2,
            Self::Triangle => 3,
            Self::Quad | Self::CondLine => 4,
        }
    }

    /// Minimum number of distinct vertex positions for the element to be valid.
    #[must_use]
    pub const fn min_distinct(self) -> usize {
        self.arity()
    }

    /// Role of the vertex in `slot`.
    ///
    /// Conditional lines draw between slots 0 and 1; slots 2 and 3 are control points.
    #[must_use]
    pub fn slot_role(self, slot: u8) -> SlotRole {
        match (self, slot) {
            (Self::CondLine, 2..) => SlotRole::Control(slot - 2),
            _ => SlotRole::Drawn(slot),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Triangle => "triangle",
            Self::Quad => "quad",
            Self::CondLine => "conditional line",
        }
    }
}

/// Vertex slots of a primitive, in drawing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Line([VertexId; 2]),
    Triangle([VertexId; 3]),
    Quad([VertexId; 4]),
    /// Two drawn end points followed by two control points.
    CondLine([VertexId; 4]),
}

impl Primitive {
    /// Builds a primitive of `kind` from a slot list.
    ///
    /// # Errors
    ///
    /// Returns an error if `slots` does not match the arity of `kind`.
    pub fn from_slots(kind: ElementKind, slots: &[VertexId]) -> Result<Self> {
        let mismatch = || TopologyError::ArityMismatch {
            kind: kind.name(),
            expected: kind.arity(),
            actual: slots.len(),
        };
        let primitive = match kind {
            ElementKind::Line => Self::Line(slots.try_into().map_err(|_| mismatch())?),
            ElementKind::Triangle => Self::Triangle(slots.try_into().map_err(|_| mismatch())?),
            ElementKind::Quad => Self::Quad(slots.try_into().map_err(|_| mismatch())?),
            ElementKind::CondLine => Self::CondLine(slots.try_into().map_err(|_| mismatch())?),
        };
        Ok(primitive)
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Line(_) => ElementKind::Line,
            Self::Triangle(_) => ElementKind::Triangle,
            Self::Quad(_) => ElementKind::Quad,
            Self::CondLine(_) => ElementKind::CondLine,
        }
    }

    #[must_use]
    pub fn slots(&self) -> &[VertexId] {
        match self {
            Self::Line(s) => s.as_slice(),
            Self::Triangle(s) => s.as_slice(),
            Self::Quad(s) | Self::CondLine(s) => s.as_slice(),
        }
    }
}

/// Color of an element: a palette index with an optional direct RGBA override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub index: u16,
    pub rgba: Option<[u8; 4]>,
}

impl Color {
    /// The palette index that means "inherit the color of the referencing part".
    pub const INHERIT: u16 = 16;

    #[must_use]
    pub const fn indexed(index: u16) -> Self {
        Self { index, rgba: None }
    }

    #[must_use]
    pub const fn direct(index: u16, rgba: [u8; 4]) -> Self {
        Self {
            index,
            rgba: Some(rgba),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::indexed(Self::INHERIT)
    }
}

/// Data associated with a parent group (a named block of the part document).
#[derive(Debug, Clone)]
pub struct GroupData {
    pub name: String,
}

impl GroupData {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A drawing primitive together with the metadata it is rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub primitive: Primitive,
    pub color: Color,
    pub parent: Option<GroupId>,
}

impl Element {
    /// Creates an element with the inherited color and no parent group.
    #[must_use]
    pub fn new(primitive: Primitive) -> Self {
        Self {
            primitive,
            color: Color::default(),
            parent: None,
        }
    }

    #[must_use]
    pub fn line(slots: [VertexId; 2]) -> Self {
        Self::new(Primitive::Line(slots))
    }

    #[must_use]
    pub fn triangle(slots: [VertexId; 3]) -> Self {
        Self::new(Primitive::Triangle(slots))
    }

    #[must_use]
    pub fn quad(slots: [VertexId; 4]) -> Self {
        Self::new(Primitive::Quad(slots))
    }

    #[must_use]
    pub fn cond_line(drawn: [VertexId; 2], control: [VertexId; 2]) -> Self {
        Self::new(Primitive::CondLine([drawn[0], drawn[1], control[0], control[1]]))
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: GroupId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Returns a new element with `primitive` and this element's color and parent.
    #[must_use]
    pub fn derive(&self, primitive: Primitive) -> Self {
        Self {
            primitive,
            color: self.color,
            parent: self.parent,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.primitive.kind()
    }

    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        self.primitive.slots()
    }

    /// Shape-specific collapse test: collinear triangles, and quads squashed
    /// onto a line. Lines and conditional lines have no such test.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced vertex is missing from `store`.
    pub fn is_degenerate(&self, store: &MeshStore, tolerance: f64) -> Result<bool> {
        match &self.primitive {
            Primitive::Triangle([a, b, c]) => Ok(triangle_is_collinear(
                &store.vertex(*a)?.point(),
                &store.vertex(*b)?.point(),
                &store.vertex(*c)?.point(),
                tolerance,
            )),
            Primitive::Quad(slots) => {
                let mut corners = [crate::math::Point3::origin(); 4];
                for (corner, id) in corners.iter_mut().zip(slots) {
                    *corner = store.vertex(*id)?.point();
                }
                Ok(quad_is_degenerate(&corners, tolerance))
            }
            Primitive::Line(_) | Primitive::CondLine(_) => Ok(false),
        }
    }
}
