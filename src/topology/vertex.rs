use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::error::GeometryError;
use crate::math::Point3;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the mesh store.
    pub struct VertexId;
}

/// A point in part space.
///
/// Equality, ordering and hashing are defined over the coordinates, so two
/// vertices stored under different [`VertexId`]s compare equal when they sit
/// at the same position. Coordinates are always finite and `-0.0` is stored
/// as `0.0`, which makes the order total and consistent with equality.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    x: f64,
    y: f64,
    z: f64,
}

impl Vertex {
    /// Creates a vertex from its coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate is NaN or infinite.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self, GeometryError> {
        Ok(Self {
            x: normalize(x, "x")?,
            y: normalize(y, "y")?,
            z: normalize(z, "z")?,
        })
    }

    /// Creates a vertex at `point`.
    ///
    /// # Errors
    ///
    /// Returns an error if any coordinate is NaN or infinite.
    pub fn from_point(point: &Point3) -> Result<Self, GeometryError> {
        Self::new(point.x, point.y, point.z)
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Returns the position as an nalgebra point.
    #[must_use]
    pub fn point(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    fn bits(&self) -> [u64; 3] {
        [self.x.to_bits(), self.y.to_bits(), self.z.to_bits()]
    }
}

fn normalize(value: f64, axis: &'static str) -> Result<f64, GeometryError> {
    if !value.is_finite() {
        return Err(GeometryError::NonFinite { axis });
    }
    // IEEE addition maps -0.0 to +0.0 and leaves every other value alone.
    Ok(value + 0.0)
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

impl PartialOrd for Vertex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Vertex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
            .then_with(|| self.z.total_cmp(&other.z))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn v(x: f64, y: f64, z: f64) -> Vertex {
        Vertex::new(x, y, z).unwrap()
    }

    #[test]
    fn equal_coordinates_are_equal_vertices() {
        assert_eq!(v(1.0, 2.0, 3.0), v(1.0, 2.0, 3.0));
        assert_ne!(v(1.0, 2.0, 3.0), v(1.0, 2.0, 3.5));
    }

    #[test]
    fn negative_zero_is_normalized() {
        let a = v(-0.0, 0.0, -0.0);
        let b = v(0.0, 0.0, 0.0);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert!(a.x().is_sign_positive());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        assert!(matches!(
            Vertex::new(f64::NAN, 0.0, 0.0),
            Err(GeometryError::NonFinite { axis: "x" })
        ));
        assert!(matches!(
            Vertex::new(0.0, 0.0, f64::INFINITY),
            Err(GeometryError::NonFinite { axis: "z" })
        ));
    }

    #[test]
    fn ordering_is_lexicographic() {
        let set: BTreeSet<Vertex> = [
            v(1.0, 0.0, 0.0),
            v(0.0, 5.0, 0.0),
            v(0.0, 1.0, 9.0),
            v(0.0, 1.0, -2.0),
        ]
        .into_iter()
        .collect();
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                v(0.0, 1.0, -2.0),
                v(0.0, 1.0, 9.0),
                v(0.0, 5.0, 0.0),
                v(1.0, 0.0, 0.0),
            ]
        );
    }

    #[test]
    fn point_round_trips_coordinates() {
        let vertex = Vertex::from_point(&Point3::new(0.5, -1.25, 8.0)).unwrap();
        assert_eq!(vertex.point(), Point3::new(0.5, -1.25, 8.0));
    }
}
