//! Height fields and constant planes
use super::{
    eval_at, is_valid, point, Domain, StripRun, Strips, Topology, VertexSample,
};
use crate::{
    classify::{Axis, AxisSet},
    eval::{Binding, Expression},
};
use log::debug;
use nalgebra::Vector3;

/// Color for a height-field vertex, as a function of its height
///
/// Not clamped; steep surfaces may leave `[0, 1]`.
pub(crate) fn height_color(h: f64) -> Vector3<f32> {
    Vector3::new(
        0.2 + ((h + 5.0) / 20.0) as f32,
        0.4,
        0.7 - ((h + 5.0) / 40.0) as f32,
    )
}

const PLANE_COLOR: Vector3<f32> = Vector3::new(0.8, 0.6, 0.2);

/// Returns the two axes other than `solved`, in `x, y, z` order
fn free_axes(solved: Axis) -> Option<(Axis, Axis)> {
    let mut free = [solved]
        .into_iter()
        .collect::<AxisSet>()
        .complement()
        .iter();
    Some((free.next()?, free.next()?))
}

/// Samples `solved = e(outer, inner)` as one triangle strip per outer row
///
/// The outer axis walks `[min, max)`; each row pairs samples at `u` and
/// `u + step` for every inner value in `[min, max]`.  The solved coordinate
/// is held at zero while evaluating.
pub(crate) fn height_field(
    b: &mut Binding,
    e: &Expression,
    domain: &Domain,
    solved: Axis,
) -> Vec<StripRun> {
    let Some((outer, inner)) = free_axes(solved) else {
        return vec![];
    };
    debug!("height field {solved} = {} over ({outer}, {inner})", e.text());

    let step = domain.step;
    let rows = domain.count_below(step);
    let cols = domain.count_through(step);
    let mut strips = Strips::new(Topology::TriangleStrip);
    let sample = |b: &mut Binding, u: f64, v: f64| {
        let mut p = point(outer, u, inner, v);
        let h = eval_at(b, e, &p);
        p[solved.index()] = h;
        (p, h)
    };
    for i in 0..rows {
        let u = domain.at(i, step);
        for j in 0..cols {
            let v = domain.at(j, step);
            let (p1, h1) = sample(b, u, v);
            let (p2, h2) = sample(b, u + step, v);
            if is_valid(p1, domain) && is_valid(p2, domain) {
                strips.push(VertexSample::new(p1, height_color(h1)));
                strips.push(VertexSample::new(p2, height_color(h2)));
            } else {
                strips.close();
            }
        }
        strips.close();
    }
    strips.finish()
}

/// Emits a single quad at `solved = e`, spanning the domain on the other
/// two axes
///
/// Nothing is emitted if the constant is non-finite or outside the domain.
pub(crate) fn plane(
    b: &mut Binding,
    e: &Expression,
    domain: &Domain,
    solved: Axis,
) -> Vec<StripRun> {
    let c = b.eval_xyz(e, 0.0, 0.0, 0.0);
    let Some((a, d)) = free_axes(solved) else {
        return vec![];
    };
    if !(c.is_finite() && c >= domain.min && c <= domain.max) {
        debug!("plane {solved} = {c} is outside the domain");
        return vec![];
    }
    debug!("plane {solved} = {c}");

    let (lo, hi) = (domain.min, domain.max);
    let vertices = [(lo, lo), (hi, lo), (lo, hi), (hi, hi)]
        .into_iter()
        .map(|(u, v)| {
            let mut p = point(a, u, d, v);
            p[solved.index()] = c;
            VertexSample::new(p, PLANE_COLOR)
        })
        .collect();
    vec![StripRun {
        topology: Topology::TriangleStrip,
        vertices,
    }]
}
