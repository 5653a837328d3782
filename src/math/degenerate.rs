//! Shape predicates for primitives whose vertices are pairwise distinct
//! but which still carry no area (or no length).

use super::Point3;

/// Returns `true` if `a`, `b`, `c` lie on a common line.
///
/// The test is scale independent and symmetric in the three corners: twice
/// the triangle's area, `|ab × ac|`, is compared against the squared longest
/// side, i.e. the height over the longest side must be below `tolerance`
/// times that side. Coincident corners count as collinear.
#[must_use]
pub fn triangle_is_collinear(a: &Point3, b: &Point3, c: &Point3, tolerance: f64) -> bool {
    let ab = b - a;
    let ac = c - a;
    let bc = c - b;
    let longest_sq = ab
        .norm_squared()
        .max(ac.norm_squared())
        .max(bc.norm_squared());
    ab.cross(&ac).norm() <= tolerance * longest_sq
}

/// Returns `true` if the quad has collapsed onto a line or a point.
///
/// All four corners have to be collinear; a quad with one straight corner
/// still spans an area and is not degenerate.
#[must_use]
pub fn quad_is_degenerate(corners: &[Point3; 4], tolerance: f64) -> bool {
    let [a, b, c, d] = corners;
    // Anchor the line on the farthest-apart pair so near-coincident
    // corners do not dominate the direction.
    let pairs = [(a, b), (a, c), (a, d), (b, c), (b, d), (c, d)];
    let Some((p, q)) = pairs
        .into_iter()
        .max_by(|(p0, q0), (p1, q1)| (*q0 - *p0).norm().total_cmp(&(*q1 - *p1).norm()))
    else {
        return true;
    };
    corners
        .iter()
        .all(|corner| triangle_is_collinear(p, q, corner, tolerance))
}
