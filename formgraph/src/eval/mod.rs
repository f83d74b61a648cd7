//! Formula compilation and evaluation
//!
//! A [`Binding`] owns one set of variable cells ([`Vars`]): `x`, `y`, `z`,
//! `t`, and any user parameters.  Every [`Expression`] it compiles reads
//! those shared cells, so changing a parameter's value is immediately seen
//! by every live expression without recompiling.
//!
//! ```
//! use formgraph::eval::Binding;
//!
//! let mut b = Binding::new();
//! b.register_parameter("a", 2.0).unwrap();
//! let e = b.compile("a * x + y").unwrap();
//! assert_eq!(b.eval_xyz(&e, 3.0, 1.0, 0.0), 7.0);
//!
//! b.set("a", 10.0).unwrap();
//! assert_eq!(b.eval_xyz(&e, 3.0, 1.0, 0.0), 31.0);
//! ```
//!
//! The cells are plain mutable state: evaluation is single-threaded, and a
//! parallel sampler would need one `Binding` per worker.
mod tape;
mod vars;

pub use tape::Expression;
pub use vars::{Slot, Vars};

use crate::{
    context::{
        is_function_name,
        parse::{constant_value, is_identifier, normalize, parse},
        Context,
    },
    Error,
};
use log::debug;

/// Owns the variable cells and compiles formulas against them
#[derive(Clone, Debug, Default)]
pub struct Binding {
    vars: Vars,
    scratch: Vec<f64>,
}

impl Binding {
    /// Builds a binding with only the built-in variables
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the variable cells
    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    /// Adds a named cell to the shared symbol set, or updates its value if
    /// it already exists
    ///
    /// `t` is accepted and aliases the built-in curve parameter.  The
    /// sampling coordinates `x`, `y`, `z`, function names, and constants are
    /// rejected.
    pub fn register_parameter(
        &mut self,
        name: &str,
        value: f64,
    ) -> Result<Slot, Error> {
        if !is_identifier(name) {
            return Err(Error::BadName(name.to_owned()));
        }
        let name = normalize(name);
        if is_function_name(name)
            || constant_value(name).is_some()
            || matches!(name, "x" | "y" | "z")
        {
            return Err(Error::ReservedName(name.to_owned()));
        }
        let slot = self.vars.insert(name, value);
        self.vars.set(slot, value);
        Ok(slot)
    }

    /// Sets the value of an existing variable
    pub fn set(&mut self, name: &str, value: f64) -> Result<(), Error> {
        let slot = self
            .vars
            .slot(normalize(name))
            .ok_or_else(|| Error::NoSuchParameter(name.to_owned()))?;
        self.vars.set(slot, value);
        Ok(())
    }

    /// Reads the value of a variable
    pub fn get(&self, name: &str) -> Option<f64> {
        self.vars.slot(normalize(name)).map(|s| self.vars.get(s))
    }

    /// Compiles `text` against the current set of variables
    ///
    /// Nothing in the binding changes, whether or not compilation succeeds;
    /// it is up to the caller to keep its previous expression on failure.
    pub fn compile(&self, text: &str) -> Result<Expression, Error> {
        let mut ctx = Context::new();
        let root = parse(&mut ctx, text, |v| self.vars.contains(v))?;
        let e = Expression::new(text, &ctx, root, &self.vars)?;
        debug!("compiled '{text}' to {} operations", e.len());
        Ok(e)
    }

    /// Evaluates an expression with the current cell values
    pub fn eval(&mut self, e: &Expression) -> f64 {
        e.eval(self.vars.as_slice(), &mut self.scratch)
    }

    /// Sets the `x`, `y`, `z` cells, then evaluates the expression
    pub fn eval_xyz(&mut self, e: &Expression, x: f64, y: f64, z: f64) -> f64 {
        self.vars.set(Vars::X, x);
        self.vars.set(Vars::Y, y);
        self.vars.set(Vars::Z, z);
        self.eval(e)
    }

    /// Runs `f`, then puts the `t` cell back to its previous value
    ///
    /// A user parameter named `t` shares the cell written by
    /// [`eval_t`](Self::eval_t), so curve sweeps go through here.
    pub fn sweep_t<R, F: FnOnce(&mut Self) -> R>(&mut self, f: F) -> R {
        let saved = self.vars.get(Vars::T);
        let out = f(self);
        self.vars.set(Vars::T, saved);
        out
    }

    /// Sets the `t` cell, then evaluates three expressions as a point
    pub fn eval_t(&mut self, e: &[Expression; 3], t: f64) -> [f64; 3] {
        self.vars.set(Vars::T, t);
        [self.eval(&e[0]), self.eval(&e[1]), self.eval(&e[2])]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_compile_failure_leaves_state() {
        let mut b = Binding::new();
        assert_eq!(
            b.compile("a + x").unwrap_err(),
            Error::UnknownVariable("a".to_owned())
        );
        assert_eq!(b.vars().len(), 4);

        b.register_parameter("a", 1.5).unwrap();
        let e = b.compile("a + x").unwrap();
        assert_eq!(b.eval_xyz(&e, 1.0, 0.0, 0.0), 2.5);
    }

    #[test]
    fn test_reserved_names() {
        let mut b = Binding::new();
        for name in ["sin", "pi", "e", "x", "Y", "max"] {
            assert!(
                matches!(
                    b.register_parameter(name, 0.0),
                    Err(Error::ReservedName(..))
                ),
                "{name} should be reserved"
            );
        }
        for name in ["2a", "a b", ""] {
            assert_eq!(
                b.register_parameter(name, 0.0),
                Err(Error::BadName(name.to_owned()))
            );
        }
    }

    #[test]
    fn test_t_aliases_builtin() {
        let mut b = Binding::new();
        let s = b.register_parameter("t", 4.0).unwrap();
        assert_eq!(s, Vars::T);
        assert_eq!(b.vars().len(), 4);
        assert_eq!(b.get("t"), Some(4.0));
    }

    #[test]
    fn test_parameters_are_case_sensitive() {
        let mut b = Binding::new();
        b.register_parameter("k", 1.0).unwrap();
        b.register_parameter("K", 2.0).unwrap();
        let e = b.compile("k + 10 K").unwrap();
        assert_eq!(b.eval(&e), 21.0);
        assert_eq!(
            b.set("q", 0.0),
            Err(Error::NoSuchParameter("q".to_owned()))
        );
    }

    #[test]
    fn test_eval_t() {
        let mut b = Binding::new();
        let e = [
            b.compile("cos(t)").unwrap(),
            b.compile("sin(t)").unwrap(),
            b.compile("t / 2").unwrap(),
        ];
        let [x, y, z] = b.eval_t(&e, 0.0);
        assert_eq!((x, y, z), (1.0, 0.0, 0.0));
        let [_, _, z] = b.eval_t(&e, 3.0);
        assert_eq!(z, 1.5);
    }

    #[test]
    fn test_sweep_t_restores() {
        let mut b = Binding::new();
        b.register_parameter("t", 1.0).unwrap();
        let e = [
            b.compile("t").unwrap(),
            b.compile("0").unwrap(),
            b.compile("0").unwrap(),
        ];
        let last = b.sweep_t(|b| {
            let mut last = 0.0;
            for i in 0..=6 {
                last = b.eval_t(&e, i as f64)[0];
            }
            last
        });
        assert_eq!(last, 6.0);
        assert_eq!(b.get("t"), Some(1.0));
    }
}
