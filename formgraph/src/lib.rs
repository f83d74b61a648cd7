//! Formgraph turns typed formulas into colored geometry for a 3D graphing
//! calculator.
//!
//! A formula is a line of text like `z = sin(x) * cos(y)`, `x = y = z`, or
//! `x^2 + y^2 + z^2 = 4`.  Turning it into something drawable takes three
//! steps:
//!
//! - **Classification** ([`classify`](crate::classify)) looks at the shape of
//!   the text (where the `=` signs are and which axes appear on each side)
//!   and decides whether it is an explicit surface, a line, or an implicit
//!   equation.
//! - **Compilation** ([`eval`](crate::eval)) parses each sub-formula into a
//!   [`Context`](crate::context::Context), then flattens it into an
//!   [`Expression`](crate::eval::Expression) which reads variables from
//!   shared cells in a [`Binding`](crate::eval::Binding).
//! - **Tessellation** ([`tessellate`](crate::tessellate)) samples the
//!   compiled plot over a [`Domain`](crate::tessellate::Domain), producing
//!   strips of colored vertices.
//!
//! Most users will drive all three through a
//! [`GraphState`](crate::state::GraphState), which remembers the current
//! formula, domain, and parameters, and only rebuilds geometry when one of
//! them changes:
//!
//! ```
//! use formgraph::state::GraphState;
//!
//! let mut state = GraphState::new();
//! state.run_line("var a = 2")?;
//! state.run_line("z = a * sin(x) * cos(y)")?;
//! state.run_line("range -3 3")?;
//! let g = state.geometry();
//! assert!(!g.is_empty());
//! # Ok::<(), formgraph::Error>(())
//! ```
//!
//! Parameters are read through their cells at evaluation time, so changing
//! one rebuilds the geometry without recompiling anything:
//!
//! ```
//! # use formgraph::state::GraphState;
//! # let mut state = GraphState::new();
//! state.run_line("var a = 2")?;
//! state.run_line("z = a * x * y")?;
//! state.geometry();
//! state.set_parameter("a", -1.0)?;
//! assert!(!state.cache().is_valid());
//! state.geometry();
//! assert_eq!(state.cache().rebuilds(), 2);
//! # Ok::<(), formgraph::Error>(())
//! ```
#![warn(missing_docs)]

pub mod cache;
pub mod classify;
pub mod command;
pub mod context;
pub mod eval;
pub mod output;
pub mod state;
pub mod tessellate;

mod error;
pub use error::Error;
