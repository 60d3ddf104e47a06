//! Polygon triangulation
//!
//! Every polygon with `n` corners becomes exactly `n - 2` triangles. The
//! quad and n-gon methods only change which diagonals are cut. Triangles are
//! returned as corner indices into the polygon and keep its winding.

use glam::{Vec2, Vec3};

use crate::settings::{NgonMethod, QuadMethod};

/// Below this doubled area a projected triangle is considered flat
const AREA_EPSILON: f32 = 1e-12;

/// Minimum quality gain for a beauty flip, keeps the flip loop from cycling
const FLIP_EPSILON: f32 = 1e-5;

/// Triangulate one polygon given its corner positions
///
/// Returns `None` when the polygon has no usable plane (all corners
/// collinear or coincident), including zero-area triangles.
pub fn triangulate_polygon(
    points: &[Vec3],
    quad_method: QuadMethod,
    ngon_method: NgonMethod,
) -> Option<Vec<[usize; 3]>> {
    match points.len() {
        0..=2 => None,
        3 => project_to_plane(points).map(|_| vec![[0, 1, 2]]),
        4 => triangulate_quad(points, quad_method),
        _ => triangulate_ngon(points, ngon_method),
    }
}

fn triangulate_quad(points: &[Vec3], method: QuadMethod) -> Option<Vec<[usize; 3]>> {
    const SPLIT_0_2: [[usize; 3]; 2] = [[0, 1, 2], [0, 2, 3]];
    const SPLIT_1_3: [[usize; 3]; 2] = [[0, 1, 3], [1, 2, 3]];

    let projected = project_to_plane(points)?;

    let split = match method {
        QuadMethod::Fixed => SPLIT_0_2,
        QuadMethod::FixedAlternate => SPLIT_1_3,
        QuadMethod::ShortestDiagonal => {
            if points[0].distance_squared(points[2]) <= points[1].distance_squared(points[3]) {
                SPLIT_0_2
            } else {
                SPLIT_1_3
            }
        }
        QuadMethod::Beauty => {
            let a = split_quality(&projected, &SPLIT_0_2);
            let b = split_quality(&projected, &SPLIT_1_3);
            match (a, b) {
                (Some(a), Some(b)) if b > a + FLIP_EPSILON => SPLIT_1_3,
                (None, Some(_)) => SPLIT_1_3,
                _ => SPLIT_0_2,
            }
        }
    };

    Some(split.to_vec())
}

fn triangulate_ngon(points: &[Vec3], method: NgonMethod) -> Option<Vec<[usize; 3]>> {
    let projected = project_to_plane(points)?;
    let mut triangles = ear_clip(&projected);
    if method == NgonMethod::Beauty {
        improve_by_flips(&projected, &mut triangles);
    }
    Some(triangles)
}

/// Project corners onto the polygon plane
///
/// The plane normal comes from Newell's method, and the 2D basis is chosen
/// so the polygon winds counter-clockwise in the projection.
fn project_to_plane(points: &[Vec3]) -> Option<Vec<Vec2>> {
    let mut normal = Vec3::ZERO;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        normal += Vec3::new(
            (p.y - q.y) * (p.z + q.z),
            (p.z - q.z) * (p.x + q.x),
            (p.x - q.x) * (p.y + q.y),
        );
    }
    let normal = normal.try_normalize()?;

    let u = normal.any_orthonormal_vector();
    let v = normal.cross(u);
    Some(points.iter().map(|p| Vec2::new(p.dot(u), p.dot(v))).collect())
}

/// Twice the signed area of a 2D triangle (positive when counter-clockwise)
fn signed_area2(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

/// Shape quality in `[0, 1]`, 1 for an equilateral triangle, negative if flipped
fn triangle_quality(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    let sum_sq = a.distance_squared(b) + b.distance_squared(c) + c.distance_squared(a);
    if sum_sq == 0.0 {
        return 0.0;
    }
    // 4·sqrt(3)·area / Σ|e|², with area = signed_area2 / 2
    2.0 * 3f32.sqrt() * signed_area2(a, b, c) / sum_sq
}

/// Worst triangle quality of a split, `None` if any triangle folds over
fn split_quality(points: &[Vec2], split: &[[usize; 3]]) -> Option<f32> {
    split.iter().try_fold(f32::INFINITY, |worst, &[a, b, c]| {
        let q = triangle_quality(points[a], points[b], points[c]);
        (q > 0.0).then_some(worst.min(q))
    })
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    signed_area2(a, b, p) >= 0.0 && signed_area2(b, c, p) >= 0.0 && signed_area2(c, a, p) >= 0.0
}

/// Ear clipping over a counter-clockwise polygon
///
/// Falls back to clipping the most convex corner when no clean ear exists
/// (self-intersecting or numerically flat input), so the triangle count
/// stays `n - 2`.
fn ear_clip(points: &[Vec2]) -> Vec<[usize; 3]> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len() - 2);

    while remaining.len() > 3 {
        let n = remaining.len();
        let corner = |i: usize| {
            (
                remaining[(i + n - 1) % n],
                remaining[i],
                remaining[(i + 1) % n],
            )
        };

        let ear = (0..n).find(|&i| {
            let (prev, cur, next) = corner(i);
            let (a, b, c) = (points[prev], points[cur], points[next]);
            if signed_area2(a, b, c) <= AREA_EPSILON {
                return false;
            }
            remaining
                .iter()
                .filter(|&&other| other != prev && other != cur && other != next)
                .all(|&other| {
                    let p = points[other];
                    // Corners coinciding with the ear's own corners do not block it
                    p == a || p == b || p == c || !point_in_triangle(p, a, b, c)
                })
        });

        let clip = ear.unwrap_or_else(|| {
            (0..n)
                .max_by(|&i, &j| {
                    let (a0, b0, c0) = corner(i);
                    let (a1, b1, c1) = corner(j);
                    signed_area2(points[a0], points[b0], points[c0])
                        .total_cmp(&signed_area2(points[a1], points[b1], points[c1]))
                })
                .unwrap_or(0)
        });

        let (prev, cur, next) = corner(clip);
        triangles.push([prev, cur, next]);
        remaining.remove(clip);
    }

    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

/// Flip interior diagonals while doing so improves the worse of the two
/// triangles sharing them
fn improve_by_flips(points: &[Vec2], triangles: &mut [[usize; 3]]) {
    let max_passes = points.len() * points.len();

    for _ in 0..max_passes {
        let mut flipped = false;

        for t0 in 0..triangles.len() {
            for t1 in (t0 + 1)..triangles.len() {
                let Some((a, b, c, d)) = shared_diagonal(&triangles[t0], &triangles[t1]) else {
                    continue;
                };

                // Current: (a, b, c) + (a, c, d) sharing a-c. Flipped: (a, b, d) + (b, c, d).
                let current = split_quality(points, &[[a, b, c], [a, c, d]]);
                let candidate = split_quality(points, &[[a, b, d], [b, c, d]]);

                let better = match (current, candidate) {
                    (Some(cur), Some(cand)) => cand > cur + FLIP_EPSILON,
                    (None, Some(_)) => true,
                    _ => false,
                };
                if better {
                    triangles[t0] = [a, b, d];
                    triangles[t1] = [b, c, d];
                    flipped = true;
                }
            }
        }

        if !flipped {
            break;
        }
    }
}

/// If two triangles share an edge, return the quad `(a, b, c, d)` in winding
/// order such that they are `(a, b, c)` and `(a, c, d)`
fn shared_diagonal(t0: &[usize; 3], t1: &[usize; 3]) -> Option<(usize, usize, usize, usize)> {
    for i in 0..3 {
        // Edge (x -> y) in t0 appears as (y -> x) in t1 when both share winding
        let x = t0[i];
        let y = t0[(i + 1) % 3];
        for j in 0..3 {
            if t1[j] == y && t1[(j + 1) % 3] == x {
                let b = t0[(i + 2) % 3];
                let d = t1[(j + 2) % 3];
                // t0 = (y, b, x) rotated, t1 = (x, d, y) rotated
                return Some((y, b, x, d));
            }
        }
    }
    None
}
