//! Lines and curves, sampled at evenly spaced parameter values
use super::{
    eval_at, is_valid, point, Domain, LinePlot, StripRun, Strips, Topology,
    VertexSample, CURVE_POINTS, LINE_POINTS,
};
use crate::{
    classify::Axis,
    eval::{Binding, Expression},
};
use log::debug;
use nalgebra::Vector3;

/// Sweeps `t` over `[lo, hi]` in `n` intervals (so `n + 1` samples), joining
/// valid points into line strips
///
/// `color` receives the normalized sample index, in `[0, 1]`.
fn sweep<F, C>(
    b: &mut Binding,
    domain: &Domain,
    (lo, hi): (f64, f64),
    n: usize,
    color: C,
    mut f: F,
) -> Vec<StripRun>
where
    F: FnMut(&mut Binding, f64) -> Vector3<f64>,
    C: Fn(f32) -> Vector3<f32>,
{
    let mut strips = Strips::new(Topology::LineStrip);
    for i in 0..=n {
        let frac = i as f64 / n as f64;
        let p = f(b, lo + (hi - lo) * frac);
        if is_valid(p, domain) {
            strips.push(VertexSample::new(p, color(frac as f32)));
        } else {
            strips.close();
        }
    }
    strips.finish()
}

/// Line from a chained equality, swept over the domain
pub(crate) fn line(
    b: &mut Binding,
    line: &LinePlot,
    domain: &Domain,
) -> Vec<StripRun> {
    let color =
        |c: f32| Vector3::new(1.0 - c * 0.5, 0.6 + c * 0.2, 0.2 + c * 0.5);
    let range = (domain.min, domain.max);
    match line {
        LinePlot::AllEqual => {
            debug!("line x = y = z");
            sweep(b, domain, range, LINE_POINTS, color, |_, u| {
                Vector3::new(u, u, u)
            })
        }
        LinePlot::Tied { free, tied, expr } => {
            debug!("line in {free}, tying {} and {}", tied[0], tied[1]);
            sweep(b, domain, range, LINE_POINTS, color, |b, u| {
                let mut p = Vector3::zeros();
                p[free.index()] = u;
                let v = eval_at(b, expr, &p);
                for a in tied {
                    p[a.index()] = v;
                }
                p
            })
        }
    }
}

/// Plane curve `solved = e(free)`, with the third coordinate at zero
pub(crate) fn plane_curve(
    b: &mut Binding,
    e: &Expression,
    domain: &Domain,
    solved: Axis,
    free: Axis,
) -> Vec<StripRun> {
    debug!("plane curve {solved} = {} in {free}", e.text());
    let color =
        |c: f32| Vector3::new(1.0 - c * 0.5, 0.5 + c * 0.3, 0.2 + c * 0.6);
    let range = (domain.min, domain.max);
    sweep(b, domain, range, LINE_POINTS, color, |b, u| {
        let mut p = point(free, u, solved, 0.0);
        p[solved.index()] = eval_at(b, e, &p);
        p
    })
}

/// User-defined curve `(x(t), y(t), z(t))`
pub(crate) fn parametric(
    b: &mut Binding,
    exprs: &[Expression; 3],
    domain: &Domain,
    t_range: (f64, f64),
) -> Vec<StripRun> {
    debug!("parametric curve over t in {t_range:?}");
    let color =
        |c: f32| Vector3::new(1.0 - c * 0.5, 0.3 + c * 0.4, 0.2 + c * 0.6);
    b.sweep_t(|b| {
        sweep(b, domain, t_range, CURVE_POINTS, color, |b, t| {
            Vector3::from(b.eval_t(exprs, t))
        })
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_all_equal() {
        let mut b = Binding::new();
        let domain = Domain::new(-1.0, 1.0, 0.1);
        let runs = line(&mut b, &LinePlot::AllEqual, &domain);
        assert_eq!(runs.len(), 1);
        let v = &runs[0].vertices;
        assert_eq!(v.len(), LINE_POINTS + 1);
        assert!(v.iter().all(|v| v.position.x == v.position.y
            && v.position.y == v.position.z));
        assert_eq!(v[0].position.x, -1.0);
        assert_eq!(v[LINE_POINTS].position.x, 1.0);
        assert_relative_eq!(v[0].color, Vector3::new(1.0, 0.6, 0.2));
        assert_relative_eq!(v[LINE_POINTS].color, Vector3::new(0.5, 0.8, 0.7));
    }

    #[test]
    fn test_tied() {
        let mut b = Binding::new();
        let expr = b.compile("2 y").unwrap();
        let plot = LinePlot::Tied {
            free: Axis::Y,
            tied: [Axis::X, Axis::Z],
            expr,
        };
        let domain = Domain::new(-4.0, 4.0, 0.1);
        let runs = line(&mut b, &plot, &domain);
        // 2y stays within [-9, 9] for every y in the domain
        assert_eq!(runs.len(), 1);
        for v in &runs[0].vertices {
            let p = v.position;
            assert_eq!(p.x, p.z);
            assert_relative_eq!(p.x, 2.0 * p.y);
        }

        // Points with 2y < -13 fall outside the margin
        let domain = Domain::new(-8.0, 0.0, 0.1);
        let runs = line(&mut b, &plot, &domain);
        assert_eq!(runs.len(), 1);
        let v = &runs[0].vertices;
        assert!(v.iter().all(|v| v.position.x >= -13.0));
        assert!(v.len() < LINE_POINTS + 1);
    }

    #[test]
    fn test_plane_curve_gap() {
        let mut b = Binding::new();
        let e = b.compile("1 / x").unwrap();
        let domain = Domain::new(-1.0, 1.0, 0.1);
        let runs = plane_curve(&mut b, &e, &domain, Axis::Y, Axis::X);
        // The pole at x = 0 splits the curve in two
        assert_eq!(runs.len(), 2);
        for v in runs.iter().flat_map(|r| r.vertices.iter()) {
            assert_eq!(v.position.z, 0.0);
            assert!(v.position.y.abs() <= 6.0);
        }
    }

    #[test]
    fn test_parametric() {
        let mut b = Binding::new();
        let exprs = [
            b.compile("cos(t)").unwrap(),
            b.compile("sin(t)").unwrap(),
            b.compile("t").unwrap(),
        ];
        let domain = Domain::new(-1.0, 1.0, 0.1);
        let runs = parametric(&mut b, &exprs, &domain, (0.0, 2.0));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].vertices.len(), CURVE_POINTS + 1);
        let last = runs[0].vertices[CURVE_POINTS].position;
        assert_relative_eq!(
            last,
            Vector3::new(2f32.cos(), 2f32.sin(), 2.0),
            epsilon = 1e-6
        );

        // t > 6 is beyond the margin
        let runs = parametric(&mut b, &exprs, &domain, (0.0, 10.0));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].vertices.len(), 1201);
    }

    #[test]
    fn test_parametric_keeps_t() {
        let mut b = Binding::new();
        b.register_parameter("t", 1.5).unwrap();
        let exprs = [
            b.compile("t").unwrap(),
            b.compile("t").unwrap(),
            b.compile("t").unwrap(),
        ];
        let domain = Domain::new(-1.0, 1.0, 0.1);
        parametric(&mut b, &exprs, &domain, (0.0, 4.0));
        assert_eq!(b.get("t"), Some(1.5));
    }
}
