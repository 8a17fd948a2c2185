//! Closest-point queries between link segments and shapes.
//!
//! Segment and triangle routines follow Ericson, "Real-Time Collision
//! Detection", chapter 5.

use vibrissa_math::Vec3;

use crate::{Aabb, Proximity, Shape, TriMesh};

const EPS: f64 = 1e-12;

/// Iterations of the golden-section search used for boxes.
const LINE_SEARCH_ITERS: usize = 48;

/// Closest points between segments `p1q1` and `p2q2`.
///
/// Returns `(s, t, c1, c2)` with `c1 = p1 + s (q1 − p1)` and
/// `c2 = p2 + t (q2 − p2)`.
pub fn closest_points_segments(
    p1: &Vec3,
    q1: &Vec3,
    p2: &Vec3,
    q2: &Vec3,
) -> (f64, f64, Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a <= EPS && e <= EPS {
        (0.0, 0.0)
    } else if a <= EPS {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= EPS {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom > EPS {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (s, t, p1 + d1 * s, p2 + d2 * t)
}

/// Closest point on triangle `abc` to `p`.
pub fn closest_point_triangle(p: &Vec3, a: &Vec3, b: &Vec3, c: &Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

/// Closest points between segment `pq` and triangle `abc`.
///
/// Returns `(s, on_segment, on_triangle)`.
pub fn closest_points_segment_triangle(
    p: &Vec3,
    q: &Vec3,
    a: &Vec3,
    b: &Vec3,
    c: &Vec3,
) -> (f64, Vec3, Vec3) {
    let n = (b - a).cross(&(c - a));
    let dp = n.dot(&(p - a));
    let dq = n.dot(&(q - a));

    // Segment crosses the triangle's plane: check the crossing point.
    if dp * dq <= 0.0 && (dp - dq).abs() > EPS {
        let s = dp / (dp - dq);
        let x = p + (q - p) * s;
        if (closest_point_triangle(&x, a, b, c) - x).norm_squared() <= EPS {
            return (s, x, x);
        }
    }

    let mut best = {
        let on_tri = closest_point_triangle(p, a, b, c);
        (0.0, *p, on_tri)
    };
    let mut best_d2 = (best.1 - best.2).norm_squared();

    let mut consider = |s: f64, on_seg: Vec3, on_tri: Vec3| {
        let d2 = (on_seg - on_tri).norm_squared();
        if d2 < best_d2 {
            best_d2 = d2;
            best = (s, on_seg, on_tri);
        }
    };

    consider(1.0, *q, closest_point_triangle(q, a, b, c));
    for (e0, e1) in [(a, b), (b, c), (c, a)] {
        let (s, _, c1, c2) = closest_points_segments(p, q, e0, e1);
        consider(s, c1, c2);
    }

    best
}

/// Closest approach of segment `pq` to `shape`, in the shape's local frame.
///
/// Returns `None` when the segment is farther than `margin` from the
/// surface (or, for meshes, no triangle lies within `margin`).
pub fn segment_proximity(shape: &Shape, p: &Vec3, q: &Vec3, margin: f64) -> Option<Proximity> {
    let result = match shape {
        Shape::Capsule {
            radius,
            half_height,
        } => {
            let top = Vec3::new(0.0, 0.0, *half_height);
            let (s, _, on_seg, on_axis) = closest_points_segments(p, q, &-top, &top);
            let offset = on_seg - on_axis;
            let dist = offset.norm();
            let normal = if dist > EPS {
                offset / dist
            } else {
                fallback_normal(&(q - p), &Vec3::z())
            };
            Proximity {
                distance: dist - radius,
                point: on_seg,
                normal,
                segment_param: s,
            }
        }
        Shape::HalfSpace { normal } => {
            let (dp, dq) = (normal.dot(p), normal.dot(q));
            let (s, point, distance) = if dq < dp { (1.0, *q, dq) } else { (0.0, *p, dp) };
            Proximity {
                distance,
                point,
                normal: *normal,
                segment_param: s,
            }
        }
        Shape::Box { .. } => {
            if let Some(bounds) = shape.local_aabb() {
                if !segment_aabb(p, q).overlaps(&bounds.expanded(margin)) {
                    return None;
                }
            }
            let eval = |s: f64| {
                let x = p + (q - p) * s;
                shape
                    .signed_distance(&x)
                    .map_or(f64::INFINITY, |(d, _)| d)
            };
            let s = golden_section(eval);
            let point = p + (q - p) * s;
            let (distance, normal) = shape.signed_distance(&point)?;
            Proximity {
                distance,
                point,
                normal,
                segment_param: s,
            }
        }
        Shape::TriMesh(mesh) => segment_mesh(mesh, p, q, margin)?,
    };

    (result.distance < margin).then_some(result)
}

fn segment_mesh(mesh: &TriMesh, p: &Vec3, q: &Vec3, margin: f64) -> Option<Proximity> {
    let region = segment_aabb(p, q).expanded(margin);
    let mut best: Option<(f64, f64, Vec3, Vec3, usize)> = None;
    mesh.for_each_candidate(&region, |tri| {
        let [a, b, c] = mesh.triangle(tri);
        let (s, on_seg, on_tri) = closest_points_segment_triangle(p, q, &a, &b, &c);
        let d2 = (on_seg - on_tri).norm_squared();
        if best.map_or(true, |(best_d2, ..)| d2 < best_d2) {
            best = Some((d2, s, on_seg, on_tri, tri));
        }
    });

    let (d2, s, on_seg, on_tri, tri) = best?;
    let dist = d2.sqrt();
    let normal = if dist > EPS {
        (on_seg - on_tri) / dist
    } else {
        // Segment pierces the surface: push back towards the side of its
        // start point.
        let [a, b, c] = mesh.triangle(tri);
        let n = (b - a).cross(&(c - a)).normalize();
        if n.dot(&(p - a)) >= 0.0 {
            n
        } else {
            -n
        }
    };
    Some(Proximity {
        distance: dist,
        point: on_seg,
        normal,
        segment_param: s,
    })
}

fn segment_aabb(p: &Vec3, q: &Vec3) -> Aabb {
    Aabb::new(p.inf(q), p.sup(q))
}

/// Unit vector perpendicular to both `dir` and `axis`.
fn fallback_normal(dir: &Vec3, axis: &Vec3) -> Vec3 {
    let n = dir.cross(axis);
    if n.norm() > EPS {
        n.normalize()
    } else {
        Vec3::x()
    }
}

/// Minimum of a unimodal function on [0, 1].
fn golden_section(f: impl Fn(f64) -> f64) -> f64 {
    const INV_PHI: f64 = 0.618_033_988_749_894_8;
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    let mut x1 = hi - INV_PHI * (hi - lo);
    let mut x2 = lo + INV_PHI * (hi - lo);
    let (mut f1, mut f2) = (f(x1), f(x2));
    for _ in 0..LINE_SEARCH_ITERS {
        if f1 <= f2 {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - INV_PHI * (hi - lo);
            f1 = f(x1);
        } else {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + INV_PHI * (hi - lo);
            f2 = f(x2);
        }
    }
    // The ends are not sampled by the search itself.
    let mid = 0.5 * (lo + hi);
    [0.0, mid, 1.0]
        .into_iter()
        .min_by(|a, b| f(*a).total_cmp(&f(*b)))
        .unwrap_or(mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn test_crossing_segments() {
        let (s, t, c1, c2) = closest_points_segments(
            &Vec3::new(-1.0, 0.0, 0.0),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::new(0.0, -1.0, 1.0),
            &Vec3::new(0.0, 1.0, 1.0),
        );
        assert_relative_eq!(s, 0.5, epsilon = 1e-12);
        assert_relative_eq!(t, 0.5, epsilon = 1e-12);
        assert_relative_eq!((c1 - c2).norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_segments() {
        let (_, _, c1, c2) = closest_points_segments(
            &Vec3::zeros(),
            &Vec3::new(2.0, 0.0, 0.0),
            &Vec3::new(1.0, 3.0, 0.0),
            &Vec3::new(5.0, 3.0, 0.0),
        );
        assert_relative_eq!((c1 - c2).norm(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_triangle_regions() {
        let (a, b, c) = (Vec3::zeros(), Vec3::x(), Vec3::y());
        let inside = closest_point_triangle(&Vec3::new(0.2, 0.2, 1.0), &a, &b, &c);
        assert_relative_eq!(inside, Vec3::new(0.2, 0.2, 0.0), epsilon = 1e-12);
        let vertex = closest_point_triangle(&Vec3::new(-1.0, -1.0, 0.0), &a, &b, &c);
        assert_relative_eq!(vertex, a, epsilon = 1e-12);
        let edge = closest_point_triangle(&Vec3::new(1.0, 1.0, 0.0), &a, &b, &c);
        assert_relative_eq!(edge, Vec3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_segment_pierces_triangle() {
        let (a, b, c) = (Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        let (s, on_seg, on_tri) = closest_points_segment_triangle(
            &Vec3::new(0.5, 0.5, 1.0),
            &Vec3::new(0.5, 0.5, -3.0),
            &a,
            &b,
            &c,
        );
        assert_relative_eq!(s, 0.25, epsilon = 1e-12);
        assert_relative_eq!(on_seg, on_tri, epsilon = 1e-12);
    }

    #[test]
    fn test_segment_above_triangle_edge() {
        let (a, b, c) = (Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        let (_, on_seg, on_tri) = closest_points_segment_triangle(
            &Vec3::new(-1.0, -1.0, 0.5),
            &Vec3::new(3.0, -1.0, 0.5),
            &a,
            &b,
            &c,
        );
        assert_relative_eq!((on_seg - on_tri).norm(), (1.0_f64 + 0.25).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_box_segment_penetration() {
        let shape = Shape::Box {
            half_extents: Vec3::new(1.0, 1.0, 1.0),
        };
        let prox = segment_proximity(
            &shape,
            &Vec3::new(0.0, 3.0, 0.0),
            &Vec3::new(0.0, 0.8, 0.0),
            0.1,
        )
        .unwrap();
        assert_relative_eq!(prox.segment_param, 1.0, epsilon = 1e-12);
        assert_relative_eq!(prox.distance, -0.2, epsilon = 1e-9);
        assert_relative_eq!(prox.normal, Vec3::y(), epsilon = 1e-9);
    }

    #[test]
    fn test_box_far_segment_skipped() {
        let shape = Shape::Box {
            half_extents: Vec3::new(1.0, 1.0, 1.0),
        };
        let (a, b) = (Vec3::new(5.0, 5.0, 5.0), Vec3::new(6.0, 5.0, 5.0));
        assert!(segment_proximity(&shape, &a, &b, 0.1).is_none());
    }

    #[test]
    fn test_box_nearest_endpoint() {
        let shape = Shape::Box {
            half_extents: Vec3::new(1.0, 1.0, 1.0),
        };
        let prox = segment_proximity(
            &shape,
            &Vec3::new(1.05, 0.0, 0.0),
            &Vec3::new(4.0, 0.0, 0.0),
            0.1,
        )
        .unwrap();
        assert_relative_eq!(prox.segment_param, 0.0, epsilon = 1e-9);
        assert_relative_eq!(prox.distance, 0.05, epsilon = 1e-9);
    }

    #[test]
    fn test_half_space() {
        let shape = Shape::HalfSpace { normal: Vec3::z() };
        let prox = segment_proximity(
            &shape,
            &Vec3::new(0.0, 0.0, 1.0),
            &Vec3::new(1.0, 0.0, -0.5),
            0.0,
        )
        .unwrap();
        assert_eq!(prox.segment_param, 1.0);
        assert_relative_eq!(prox.distance, -0.5);
    }

    #[test]
    fn test_capsule_touch() {
        let shape = Shape::Capsule {
            radius: 1.0,
            half_height: 10.0,
        };
        let prox = segment_proximity(
            &shape,
            &Vec3::new(1.5, -2.0, 3.0),
            &Vec3::new(1.5, 2.0, 3.0),
            1.0,
        )
        .unwrap();
        assert_relative_eq!(prox.distance, 0.5, epsilon = 1e-12);
        assert_relative_eq!(prox.normal, Vec3::x(), epsilon = 1e-12);
        assert_relative_eq!(prox.segment_param, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_mesh_proximity() {
        let mesh = TriMesh::new(
            vec![
                Vec3::new(-5.0, -5.0, 0.0),
                Vec3::new(5.0, -5.0, 0.0),
                Vec3::new(5.0, 5.0, 0.0),
                Vec3::new(-5.0, 5.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .unwrap();
        let shape = Shape::TriMesh(Arc::new(mesh));
        let prox = segment_proximity(
            &shape,
            &Vec3::new(0.0, 0.0, 2.0),
            &Vec3::new(1.0, 1.0, 0.05),
            0.1,
        )
        .unwrap();
        assert_relative_eq!(prox.distance, 0.05, epsilon = 1e-12);
        assert_relative_eq!(prox.normal, Vec3::z(), epsilon = 1e-12);
        let (a, b) = (Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(segment_proximity(&shape, &a, &b, 0.1).is_none());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn arb_point() -> impl Strategy<Value = Vec3> {
            (-5.0..5.0_f64, -5.0..5.0_f64, -5.0..5.0_f64).prop_map(|(x, y, z)| Vec3::new(x, y, z))
        }

        proptest! {
            #[test]
            fn segment_closest_points_beat_endpoints(
                p1 in arb_point(), q1 in arb_point(), p2 in arb_point(), q2 in arb_point()
            ) {
                let (s, t, c1, c2) = closest_points_segments(&p1, &q1, &p2, &q2);
                prop_assert!((0.0..=1.0).contains(&s));
                prop_assert!((0.0..=1.0).contains(&t));
                prop_assert!((c1 - (p1 + (q1 - p1) * s)).norm() < 1e-9);
                prop_assert!((c2 - (p2 + (q2 - p2) * t)).norm() < 1e-9);
                let d = (c1 - c2).norm();
                for (a, b) in [(p1, p2), (p1, q2), (q1, p2), (q1, q2)] {
                    prop_assert!(d <= (a - b).norm() + 1e-7);
                }
            }

            #[test]
            fn triangle_closest_point_beats_vertices(
                p in arb_point(), a in arb_point(), b in arb_point(), c in arb_point()
            ) {
                prop_assume!((b - a).cross(&(c - a)).norm() > 1e-2);
                let closest = closest_point_triangle(&p, &a, &b, &c);
                let d = (p - closest).norm();
                for v in [a, b, c] {
                    prop_assert!(d <= (p - v).norm() + 1e-7);
                }
            }
        }
    }
}
