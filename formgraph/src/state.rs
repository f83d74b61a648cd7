//! Host-owned plotting state
use crate::{
    cache::GeometryCache,
    classify::{classify, Classification},
    context::parse::normalize,
    eval::Binding,
    tessellate::{Domain, Geometry, Plot},
    Error,
};
use log::{info, warn};

/// Formula shown when nothing else has been entered
pub const DEFAULT_FORMULA: &str = "sin(x)*cos(y)";

/// What the user asked to plot
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Source {
    /// A formula, classified before compiling
    Formula(String),
    /// A parametric curve `(x(t), y(t), z(t))`
    Curve([String; 3]),
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Formula(s) => write!(f, "{s}"),
            Source::Curve([x, y, z]) => write!(f, "param {x}, {y}, {z}"),
        }
    }
}

/// Snapshot of a named parameter
#[derive(Clone, Debug, PartialEq)]
pub struct UserParameter {
    /// Name, as used in formulas
    pub name: String,
    /// Current value
    pub value: f64,
    /// Lower bound for interactive adjustment
    pub lower: f64,
    /// Upper bound for interactive adjustment
    pub upper: f64,
}

/// Bounds of a parameter; its value lives in the binding's cell
#[derive(Clone, Debug)]
struct Bounds {
    name: String,
    lower: f64,
    upper: f64,
}

/// Everything needed to turn user input into geometry
///
/// Every setter invalidates the geometry cache.  Compilation happens lazily
/// (in [`refresh`](GraphState::refresh) or [`geometry`](GraphState::geometry))
/// and only when the source differs from the last successfully compiled
/// source.  If compilation fails, nothing is drawn until a later source
/// compiles.
///
/// ```
/// use formgraph::{state::GraphState, tessellate::Topology};
///
/// let mut state = GraphState::new();
/// state.set_formula("z = x * y");
/// state.set_range(-2.0, 2.0).unwrap();
/// let g = state.geometry();
/// assert!(g.runs().iter().all(|r| r.topology == Topology::TriangleStrip));
/// ```
pub struct GraphState {
    source: Source,
    domain: Domain,
    binding: Binding,
    params: Vec<Bounds>,

    classification: Option<Classification>,
    plot: Option<Plot>,
    compiled: Option<Source>,
    stale: bool,

    cache: GeometryCache,
}

impl Default for GraphState {
    fn default() -> Self {
        Self {
            source: Source::Formula(DEFAULT_FORMULA.to_owned()),
            domain: Domain::default(),
            binding: Binding::new(),
            params: vec![],
            classification: None,
            plot: None,
            compiled: None,
            stale: true,
            cache: GeometryCache::new(),
        }
    }
}

impl GraphState {
    /// Builds a state showing [`DEFAULT_FORMULA`] over the default domain
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current source
    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Returns the current domain
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Returns the evaluator binding
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Returns the classification of the last compiled formula
    ///
    /// This is `None` for parametric curves and before anything compiles.
    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    /// Returns the compiled plot, if the source compiled
    pub fn plot(&self) -> Option<&Plot> {
        self.plot.as_ref()
    }

    /// Returns the geometry cache
    pub fn cache(&self) -> &GeometryCache {
        &self.cache
    }

    fn set_source(&mut self, source: Source) {
        if self.plot.is_none() || self.compiled.as_ref() != Some(&source) {
            self.stale = true;
        }
        self.source = source;
        self.cache.invalidate();
    }

    /// Sets the formula to plot
    pub fn set_formula(&mut self, text: &str) {
        self.set_source(Source::Formula(text.trim().to_owned()));
    }

    /// Sets a parametric curve to plot
    pub fn set_curve(&mut self, x: &str, y: &str, z: &str) {
        let c = [x, y, z].map(|s| s.trim().to_owned());
        self.set_source(Source::Curve(c));
    }

    /// Sets the domain bounds, which must be finite with `min < max`
    pub fn set_range(&mut self, min: f64, max: f64) -> Result<(), Error> {
        if !(min.is_finite() && max.is_finite() && min < max) {
            return Err(Error::BadRange(min, max));
        }
        self.domain.min = min;
        self.domain.max = max;
        self.cache.invalidate();
        Ok(())
    }

    /// Sets the grid step, which must be finite and positive
    pub fn set_step(&mut self, step: f64) -> Result<(), Error> {
        if !(step.is_finite() && step > 0.0) {
            return Err(Error::BadStep(step));
        }
        self.domain.step = step;
        self.cache.invalidate();
        Ok(())
    }

    /// Defines a parameter, or redefines an existing one in place
    ///
    /// The parameter's cell is registered with the binding before anything
    /// is recompiled, so a formula which failed because the name was unknown
    /// is retried.
    pub fn define_parameter(
        &mut self,
        name: &str,
        value: f64,
        lower: f64,
        upper: f64,
    ) -> Result<(), Error> {
        let slot = self.binding.register_parameter(name, value)?;
        let name = self
            .binding
            .vars()
            .name(slot)
            .ok_or(Error::BadVar)?
            .to_owned();
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(p) => {
                p.lower = lower;
                p.upper = upper;
            }
            None => {
                self.params.push(Bounds { name, lower, upper });
                if self.plot.is_none() {
                    self.stale = true;
                }
            }
        }
        self.cache.invalidate();
        Ok(())
    }

    /// Changes the value of an existing parameter
    ///
    /// Compiled expressions read the parameter's cell, so nothing is
    /// recompiled; only the geometry is rebuilt.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), Error> {
        if !self.params.iter().any(|p| p.name == normalize(name)) {
            return Err(Error::NoSuchParameter(name.to_owned()));
        }
        self.binding.set(name, value)?;
        self.cache.invalidate();
        Ok(())
    }

    /// Looks up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<UserParameter> {
        self.params
            .iter()
            .find(|p| p.name == normalize(name))
            .map(|p| self.snapshot(p))
    }

    /// Returns every parameter, in definition order
    pub fn parameters(&self) -> Vec<UserParameter> {
        self.params.iter().map(|p| self.snapshot(p)).collect()
    }

    fn snapshot(&self, p: &Bounds) -> UserParameter {
        UserParameter {
            name: p.name.clone(),
            value: self.binding.get(&p.name).unwrap_or(f64::NAN),
            lower: p.lower,
            upper: p.upper,
        }
    }

    /// Compiles the current source, if it has changed since the last
    /// successful compile
    ///
    /// On failure, the previous plot is discarded and the error returned.
    pub fn refresh(&mut self) -> Result<(), Error> {
        if !self.stale {
            return Ok(());
        }
        self.stale = false;
        self.cache.invalidate();

        let r = match &self.source {
            Source::Formula(f) => {
                let c = classify(f);
                Plot::compile(&c, &self.binding).map(|p| (Some(c), p))
            }
            Source::Curve([x, y, z]) => {
                Plot::curve([x, y, z], &self.binding).map(|p| (None, p))
            }
        };
        match r {
            Ok((c, p)) => {
                self.classification = c;
                self.plot = Some(p);
                self.compiled = Some(self.source.clone());
                Ok(())
            }
            Err(e) => {
                warn!("could not compile '{}': {e}", self.source);
                self.classification = None;
                self.plot = None;
                Err(e)
            }
        }
    }

    /// Returns the geometry for the current state, rebuilding it if needed
    pub fn geometry(&mut self) -> &Geometry {
        // Errors are logged in `refresh`; the plot is cleared on failure
        let _ = self.refresh();

        let t_range = self
            .params
            .iter()
            .find(|p| p.name == "t")
            .map(|p| (p.lower, p.upper));
        let Self {
            plot,
            binding,
            domain,
            cache,
            ..
        } = self;
        let Some(plot) = plot else {
            cache.clear();
            return cache.geometry();
        };
        cache.get_or_rebuild(|| {
            let start = std::time::Instant::now();
            let g = plot.tessellate(binding, domain, t_range);
            info!(
                "Built {} vertices in {} runs in {:?}",
                g.vertex_count(),
                g.runs().len(),
                start.elapsed()
            );
            g
        })
    }
}
