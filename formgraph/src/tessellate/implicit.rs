//! Implicit equations: exact fast paths and point-cloud sampling
use super::{
    curve, is_valid, surface, Domain, StripRun, Topology, VertexSample,
    MAX_CLOUD_STEPS,
};
use crate::{
    classify::{Axis, Split},
    eval::{Binding, Expression},
};
use log::debug;
use nalgebra::Vector3;

/// Exact tessellation of `axis = rhs`, chosen by how many of the other two
/// axes appear in `rhs`
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FastPath {
    /// `rhs` is a constant: a plane perpendicular to the solved axis
    Plane(Axis),
    /// `rhs` depends on one other axis: a curve in a coordinate plane
    Curve {
        /// Axis being solved for
        solved: Axis,
        /// Axis swept along the curve
        free: Axis,
    },
    /// `rhs` depends on both other axes: a height field
    Surface(Axis),
}

impl FastPath {
    /// Picks a fast path, if the equality is of the form `axis = rhs` and
    /// `rhs` does not mention `axis`
    pub fn select(split: &Split) -> Option<Self> {
        let solved = split.solved?;
        if split.rhs_axes.contains(solved) {
            return None;
        }
        let mut others = split.rhs_axes.iter();
        let out = match split.rhs_axes.len() {
            0 => FastPath::Plane(solved),
            1 => FastPath::Curve {
                solved,
                free: others.next()?,
            },
            _ => FastPath::Surface(solved),
        };
        Some(out)
    }

    /// Samples `rhs` along this fast path
    pub(crate) fn tessellate(
        &self,
        b: &mut Binding,
        rhs: &Expression,
        domain: &Domain,
    ) -> Vec<StripRun> {
        match *self {
            FastPath::Plane(solved) => surface::plane(b, rhs, domain, solved),
            FastPath::Curve { solved, free } => {
                curve::plane_curve(b, rhs, domain, solved, free)
            }
            FastPath::Surface(solved) => {
                surface::height_field(b, rhs, domain, solved)
            }
        }
    }
}

/// Samples a scalar field on a coarse grid, keeping points where it is near
/// zero
///
/// The grid spacing is half the domain step, coarsened so that no axis takes
/// more than [`MAX_CLOUD_STEPS`] steps; a point is kept when
/// `|field| < step / 2`.  This is a thresholded approximation, not root
/// finding, so the result is a point cloud rather than a surface.
pub(crate) fn point_cloud(
    b: &mut Binding,
    field: &Expression,
    domain: &Domain,
) -> Vec<StripRun> {
    let size = domain.size();
    let tolerance = domain.step * 0.5;
    let mut step = domain.step * 0.5;
    if size / step > MAX_CLOUD_STEPS as f64 {
        step = size / MAX_CLOUD_STEPS as f64;
    }
    let n = domain.count_through(step);
    debug!(
        "point cloud of {}: {n}^3 samples, tolerance {tolerance}",
        field.text()
    );

    let mut vertices = vec![];
    for i in 0..n {
        let x = domain.at(i, step);
        let c = ((x - domain.min) / size) as f32;
        let color = Vector3::new(1.0 - c * 0.3, 0.7, 0.3 + c * 0.4);
        for j in 0..n {
            let y = domain.at(j, step);
            for k in 0..n {
                let z = domain.at(k, step);
                let p = Vector3::new(x, y, z);
                if b.eval_xyz(field, x, y, z).abs() < tolerance
                    && is_valid(p, domain)
                {
                    vertices.push(VertexSample::new(p, color));
                }
            }
        }
    }
    if vertices.is_empty() {
        vec![]
    } else {
        vec![StripRun {
            topology: Topology::Points,
            vertices,
        }]
    }
}
