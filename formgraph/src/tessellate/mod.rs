//! Tessellation of classified formulas into colored vertex strips
//!
//! A [`Plot`] is a classified formula whose sub-formulas have been compiled.
//! [`Plot::tessellate`] walks a [`Domain`] and produces a [`Geometry`]: an
//! ordered list of [`StripRun`]s, each sharing one [`Topology`].  Samples
//! which fail [`is_valid`] break the current run; a new run starts at the
//! next valid sample, and empty runs are never emitted.
//!
//! ```
//! use formgraph::{classify::classify, eval::Binding, tessellate::*};
//!
//! let mut b = Binding::new();
//! let plot = Plot::compile(&classify("z = x * y"), &b).unwrap();
//! let domain = Domain::new(-1.0, 1.0, 0.5);
//! let g = plot.tessellate(&mut b, &domain, None);
//! assert_eq!(g.runs().len(), 4); // one triangle strip per row
//! assert!(g.vertices().all(|v| is_valid(v.position.cast(), &domain)));
//! ```
mod curve;
mod implicit;
mod surface;

pub use implicit::FastPath;

use crate::{
    classify::{Axis, Classification, Line},
    eval::{Binding, Expression},
    Error,
};
use log::debug;
use nalgebra::Vector3;

/// Absolute margin beyond the domain within which samples are kept
pub const MARGIN: f64 = 5.0;

/// Number of intervals when sweeping a line or a plane curve
pub const LINE_POINTS: usize = 400;

/// Number of intervals when sweeping a user-defined parametric curve
pub const CURVE_POINTS: usize = 2000;

/// Maximum number of steps per axis for point-cloud sampling
pub const MAX_CLOUD_STEPS: usize = 60;

/// Numeric domain shared by every axis
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Domain {
    /// Lower bound, inclusive
    pub min: f64,
    /// Upper bound, inclusive
    pub max: f64,
    /// Grid spacing for grid-sampled plots
    pub step: f64,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            min: -10.0,
            max: 10.0,
            step: 0.5,
        }
    }
}

impl Domain {
    /// Builds a new domain
    ///
    /// No validation is performed here; a degenerate domain produces empty
    /// geometry.
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Returns `max - min`
    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    /// Checks whether this domain can't be sampled
    pub fn is_degenerate(&self) -> bool {
        !(self.min.is_finite()
            && self.max.is_finite()
            && self.step.is_finite()
            && self.min < self.max
            && self.step > 0.0)
    }

    /// Number of grid samples in `[min, max)`
    fn count_below(&self, step: f64) -> usize {
        (self.size() / step - 1e-9).ceil().max(0.0) as usize
    }

    /// Number of grid samples in `[min, max]`
    fn count_through(&self, step: f64) -> usize {
        (self.size() / step + 1e-9).floor().max(0.0) as usize + 1
    }

    /// Returns the `i`'th grid value
    fn at(&self, i: usize, step: f64) -> f64 {
        self.min + i as f64 * step
    }
}

/// Checks whether a sample is finite and within the domain's margin
///
/// Coordinates are checked after narrowing to `f32`, so values which only
/// overflow in single precision are rejected too.
pub fn is_valid(p: Vector3<f64>, domain: &Domain) -> bool {
    let lo = domain.min as f32 - MARGIN as f32;
    let hi = domain.max as f32 + MARGIN as f32;
    p.iter().all(|v| {
        let v = *v as f32;
        v.is_finite() && v >= lo && v <= hi
    })
}

/// Single colored vertex
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VertexSample {
    /// Position in model space
    pub position: Vector3<f32>,
    /// Color, nominally in `[0, 1]` but not clamped
    pub color: Vector3<f32>,
}

impl VertexSample {
    fn new(position: Vector3<f64>, color: Vector3<f32>) -> Self {
        Self {
            position: position.cast(),
            color,
        }
    }
}

/// How a run of vertices should be drawn
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, strum::Display)]
pub enum Topology {
    /// Consecutive vertices are joined by line segments
    LineStrip,
    /// Every three consecutive vertices form a triangle
    TriangleStrip,
    /// Unconnected points
    Points,
}

/// Ordered sequence of vertices sharing one topology
#[derive(Clone, Debug, PartialEq)]
pub struct StripRun {
    /// How the vertices are connected
    pub topology: Topology,
    /// Vertices, in draw order
    pub vertices: Vec<VertexSample>,
}

/// Tessellated output: a list of strip runs
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    runs: Vec<StripRun>,
}

impl Geometry {
    /// Builds empty geometry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the strip runs
    pub fn runs(&self) -> &[StripRun] {
        &self.runs
    }

    /// Checks whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Iterates over every vertex in every run
    pub fn vertices(&self) -> impl Iterator<Item = &VertexSample> {
        self.runs.iter().flat_map(|r| r.vertices.iter())
    }

    /// Returns the total number of vertices
    pub fn vertex_count(&self) -> usize {
        self.runs.iter().map(|r| r.vertices.len()).sum()
    }
}

impl From<Vec<StripRun>> for Geometry {
    fn from(runs: Vec<StripRun>) -> Self {
        debug_assert!(runs.iter().all(|r| !r.vertices.is_empty()));
        Self { runs }
    }
}

/// Accumulates vertices into runs, dropping empty ones
struct Strips {
    topology: Topology,
    runs: Vec<StripRun>,
    current: Vec<VertexSample>,
}

impl Strips {
    fn new(topology: Topology) -> Self {
        Self {
            topology,
            runs: vec![],
            current: vec![],
        }
    }

    fn push(&mut self, v: VertexSample) {
        self.current.push(v);
    }

    /// Ends the current run, if it has any vertices
    fn close(&mut self) {
        if !self.current.is_empty() {
            self.runs.push(StripRun {
                topology: self.topology,
                vertices: std::mem::take(&mut self.current),
            });
        }
    }

    fn finish(mut self) -> Vec<StripRun> {
        self.close();
        self.runs
    }
}

/// Builds a point with `u` on axis `a`, `v` on axis `b`, and zero elsewhere
fn point(a: Axis, u: f64, b: Axis, v: f64) -> Vector3<f64> {
    let mut p = Vector3::zeros();
    p[a.index()] = u;
    p[b.index()] = v;
    p
}

/// Evaluates an expression at a point
fn eval_at(b: &mut Binding, e: &Expression, p: &Vector3<f64>) -> f64 {
    b.eval_xyz(e, p.x, p.y, p.z)
}

////////////////////////////////////////////////////////////////////////////////

/// Compiled line from a chained equality
#[derive(Clone, Debug)]
pub enum LinePlot {
    /// `x = y = z = u`
    AllEqual,
    /// The free axis is swept; tied axes take the value of `expr`
    Tied {
        /// Swept axis
        free: Axis,
        /// Axes set to the expression's value
        tied: [Axis; 2],
        /// Expression in the free axis
        expr: Expression,
    },
}

/// A classified formula with its sub-formulas compiled
#[derive(Clone, Debug)]
pub enum Plot {
    /// Height field `z = f(x, y)`
    Surface(Expression),
    /// Line from a chained equality
    Line(LinePlot),
    /// Zero-set of a scalar field, with an optional exact fast path
    Implicit {
        /// Field which is zero on the surface
        field: Expression,
        /// Fast path and its compiled right-hand side
        fast: Option<(FastPath, Expression)>,
    },
    /// User-defined curve `(x(t), y(t), z(t))`
    Curve(Box<[Expression; 3]>),
}

impl Plot {
    /// Compiles the sub-formulas of a classification
    ///
    /// For implicit equalities, the right-hand side is compiled separately;
    /// if that fails, the fast path is skipped rather than failing the whole
    /// plot.
    pub fn compile(c: &Classification, b: &Binding) -> Result<Self, Error> {
        let out = match c {
            Classification::ExplicitSurface { rhs } => {
                Plot::Surface(b.compile(rhs)?)
            }
            Classification::ParametricLine(Line::AllEqual) => {
                Plot::Line(LinePlot::AllEqual)
            }
            Classification::ParametricLine(Line::Tied { free, tied, expr }) => {
                Plot::Line(LinePlot::Tied {
                    free: *free,
                    tied: *tied,
                    expr: b.compile(expr)?,
                })
            }
            Classification::Implicit { field, split } => {
                let field = b.compile(field)?;
                let fast = split.as_ref().and_then(|s| {
                    let f = FastPath::select(s)?;
                    b.compile(&s.rhs).ok().map(|e| (f, e))
                });
                Plot::Implicit { field, fast }
            }
        };
        Ok(out)
    }

    /// Compiles a user-defined parametric curve
    pub fn curve(exprs: [&str; 3], b: &Binding) -> Result<Self, Error> {
        let [x, y, z] = exprs;
        Ok(Plot::Curve(Box::new([
            b.compile(x)?,
            b.compile(y)?,
            b.compile(z)?,
        ])))
    }

    /// Samples the plot over the given domain
    ///
    /// `t_range` overrides the domain's bounds for the parameter of a
    /// [`Plot::Curve`], and is ignored otherwise.
    pub fn tessellate(
        &self,
        b: &mut Binding,
        domain: &Domain,
        t_range: Option<(f64, f64)>,
    ) -> Geometry {
        if domain.is_degenerate() {
            debug!("skipping degenerate domain {domain:?}");
            return Geometry::new();
        }
        let runs = match self {
            Plot::Surface(e) => surface::height_field(b, e, domain, Axis::Z),
            Plot::Line(line) => curve::line(b, line, domain),
            Plot::Implicit {
                fast: Some((f, rhs)),
                ..
            } => f.tessellate(b, rhs, domain),
            Plot::Implicit { field, fast: None } => {
                implicit::point_cloud(b, field, domain)
            }
            Plot::Curve(exprs) => {
                let range = t_range.unwrap_or((domain.min, domain.max));
                curve::parametric(b, exprs, domain, range)
            }
        };
        runs.into()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::classify::classify;

    #[test]
    fn test_domain_counts() {
        let d = Domain::default();
        assert_eq!(d.count_below(d.step), 40);
        assert_eq!(d.count_through(d.step), 41);

        let d = Domain::new(0.0, 1.0, 0.3);
        assert_eq!(d.count_below(d.step), 4); // 0, 0.3, 0.6, 0.9
        assert_eq!(d.count_through(d.step), 4);

        let d = Domain::new(0.0, 0.3, 0.1);
        assert_eq!(d.count_below(d.step), 3);
        assert_eq!(d.count_through(d.step), 4);
    }

    #[test]
    fn test_degenerate() {
        assert!(Domain::new(1.0, 1.0, 0.5).is_degenerate());
        assert!(Domain::new(2.0, 1.0, 0.5).is_degenerate());
        assert!(Domain::new(0.0, 1.0, 0.0).is_degenerate());
        assert!(Domain::new(0.0, f64::INFINITY, 0.5).is_degenerate());
        assert!(!Domain::default().is_degenerate());

        let mut b = Binding::new();
        let plot = Plot::compile(&classify("x + y"), &b).unwrap();
        let g = plot.tessellate(&mut b, &Domain::new(1.0, -1.0, 0.1), None);
        assert!(g.is_empty());
    }

    #[test]
    fn test_is_valid() {
        let d = Domain::new(-1.0, 1.0, 0.1);
        assert!(is_valid(Vector3::new(0.0, 6.0, -6.0), &d));
        assert!(!is_valid(Vector3::new(0.0, 6.1, 0.0), &d));
        assert!(!is_valid(Vector3::new(f64::NAN, 0.0, 0.0), &d));
        assert!(!is_valid(Vector3::new(0.0, 0.0, f64::INFINITY), &d));

        // Finite in f64, but not in f32
        let d = Domain::new(-1e300, 1e300, 1.0);
        assert!(!is_valid(Vector3::new(1e300, 0.0, 0.0), &d));
    }

    #[test]
    fn test_strips_drop_empty_runs() {
        let mut s = Strips::new(Topology::LineStrip);
        let v = VertexSample::new(Vector3::zeros(), Vector3::zeros());
        s.close();
        s.push(v);
        s.close();
        s.close();
        s.push(v);
        s.push(v);
        let runs = s.finish();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].vertices.len(), 1);
        assert_eq!(runs[1].vertices.len(), 2);
    }

    #[test]
    fn test_fast_path_selection() {
        let b = Binding::new();
        let plot = Plot::compile(&classify("y = x"), &b).unwrap();
        assert!(matches!(
            plot,
            Plot::Implicit {
                fast: Some((FastPath::Curve { .. }, _)),
                ..
            }
        ));
        // Unknown name on the right fails the field too
        assert!(Plot::compile(&classify("y = a"), &b).is_err());
    }
}
