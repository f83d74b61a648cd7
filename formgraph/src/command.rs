//! Line-oriented command interpreter
//!
//! Each line of input is either a command (`var`, `range`, `step`, `param`,
//! `help`) or a formula to plot.  [`GraphState::apply`] runs a command and
//! returns a one-line confirmation suitable for a console.
//!
//! ```
//! use formgraph::{command::Command, state::GraphState};
//!
//! let mut state = GraphState::new();
//! let cmd = Command::parse("var a = 5").unwrap().unwrap();
//! assert_eq!(state.apply(&cmd).unwrap(), "var a = 5.00 [-5.00 to 15.00]");
//!
//! let cmd = Command::parse("z = a * x * y").unwrap().unwrap();
//! assert_eq!(state.apply(&cmd).unwrap(), "OK: z = a * x * y");
//! ```
use crate::{state::GraphState, Error};
use log::debug;

/// Bounds used when a parameter is defined with `from` but without `to`
const DEFAULT_BOUNDS: (f64, f64) = (-10.0, 10.0);

/// Half-width of the bounds around a parameter's value when none are given
const DEFAULT_SPAN: f64 = 10.0;

const VAR_USAGE: &str =
    "var <name> = <value> [<min> <max>] | var <name> = <value> from <min> to <max>";
const RANGE_USAGE: &str = "range <min> <max>";
const STEP_USAGE: &str = "step <size>";
const PARAM_USAGE: &str = "param x(t), y(t), z(t)";

/// Text printed by the `help` command
pub const HELP: &str = "\
Commands:
  <formula>                       plot a formula, e.g. z = sin(x)*cos(y)
  var <name> = <value> [min max]  define or update a parameter
  var <name> = <v> from <a> to <b>
  param x(t), y(t), z(t)          plot a parametric curve
  range <min> <max>               set the domain
  step <size>                     set the grid step
  help                            show this message
Functions: sin cos tan asin acos atan sinh cosh tanh exp log ln log10
           sqrt abs floor ceil pow min max atan2
Constants: pi e";

/// A parsed line of input
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Define or update a parameter
    Var {
        /// Parameter name
        name: String,
        /// Initial value
        value: f64,
        /// Lower bound
        lower: f64,
        /// Upper bound
        upper: f64,
    },
    /// Set the domain bounds
    Range(f64, f64),
    /// Set the grid step
    Step(f64),
    /// Plot a parametric curve; a missing `z` component means a flat curve
    Param {
        /// `x(t)`
        x: String,
        /// `y(t)`
        y: String,
        /// `z(t)`, or `None` for a curve in the `xy` plane
        z: Option<String>,
    },
    /// Print the list of commands
    Help,
    /// Plot a formula
    Formula(String),
}

impl Command {
    /// Parses a line of input
    ///
    /// Returns `Ok(None)` for a blank line.  A recognized command with
    /// malformed arguments is an [`Error::Usage`].
    pub fn parse(line: &str) -> Result<Option<Self>, Error> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let out = if let Some(rest) = line.strip_prefix("var ") {
            parse_var(rest)?
        } else if let Some(rest) = line.strip_prefix("range ") {
            let [a, b] = parse_numbers(rest).ok_or(Error::Usage(RANGE_USAGE))?;
            Command::Range(a, b)
        } else if let Some(rest) = line.strip_prefix("step ") {
            let [s] = parse_numbers(rest).ok_or(Error::Usage(STEP_USAGE))?;
            Command::Step(s)
        } else if let Some(rest) = line.strip_prefix("param ") {
            parse_param(rest)?
        } else if line == "help" {
            Command::Help
        } else {
            Command::Formula(line.to_owned())
        };
        debug!("parsed {out:?}");
        Ok(Some(out))
    }
}

/// Parses exactly `N` whitespace-separated numbers
fn parse_numbers<const N: usize>(s: &str) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    let mut words = s.split_whitespace();
    for o in out.iter_mut() {
        *o = words.next()?.parse().ok()?;
    }
    words.next().is_none().then_some(out)
}

fn parse_var(rest: &str) -> Result<Command, Error> {
    let (name, rhs) = rest.split_once('=').ok_or(Error::Usage(VAR_USAGE))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Usage(VAR_USAGE));
    }

    let (value, lower, upper) = if let Some((v, bounds)) = rhs.split_once(" from ")
    {
        let value = v.trim().parse().map_err(|_| Error::Usage(VAR_USAGE))?;
        let (lower, upper) = bounds
            .split_once(" to ")
            .and_then(|(a, b)| Some((a.trim().parse().ok()?, b.trim().parse().ok()?)))
            .unwrap_or(DEFAULT_BOUNDS);
        (value, lower, upper)
    } else {
        let mut words = rhs.split_whitespace();
        let value: f64 = words
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or(Error::Usage(VAR_USAGE))?;
        let bounds = words.next().zip(words.next()).and_then(|(a, b)| {
            Some((a.parse().ok()?, b.parse().ok()?))
        });
        let (lower, upper) =
            bounds.unwrap_or((value - DEFAULT_SPAN, value + DEFAULT_SPAN));
        (value, lower, upper)
    };
    Ok(Command::Var {
        name: name.to_owned(),
        value,
        lower,
        upper,
    })
}

/// Splits on commas which are not nested inside parentheses
fn split_top_level(s: &str) -> Vec<&str> {
    let mut out = vec![];
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                out.push(s[start..i].trim());
                start = i + 1;
            }
            _ => (),
        }
    }
    out.push(s[start..].trim());
    out
}

fn parse_param(rest: &str) -> Result<Command, Error> {
    let parts = split_top_level(rest);
    match parts.as_slice() {
        [x, y] => Ok(Command::Param {
            x: x.to_string(),
            y: y.to_string(),
            z: None,
        }),
        [x, y, z, ..] => Ok(Command::Param {
            x: x.to_string(),
            y: y.to_string(),
            z: Some(z.to_string()),
        }),
        _ => Err(Error::Usage(PARAM_USAGE)),
    }
}

impl GraphState {
    /// Runs a command, returning a confirmation message
    ///
    /// Formulas and curves are compiled immediately, so that errors are
    /// reported here; the geometry itself is rebuilt lazily.
    pub fn apply(&mut self, cmd: &Command) -> Result<String, Error> {
        match cmd {
            Command::Var {
                name,
                value,
                lower,
                upper,
            } => {
                self.define_parameter(name, *value, *lower, *upper)?;
                Ok(format!(
                    "var {name} = {value:.2} [{lower:.2} to {upper:.2}]"
                ))
            }
            Command::Range(a, b) => {
                self.set_range(*a, *b)?;
                Ok(format!("Range: {a} to {b}"))
            }
            Command::Step(s) => {
                self.set_step(*s)?;
                Ok(format!("Step: {s}"))
            }
            Command::Param { x, y, z } => {
                self.set_curve(x, y, z.as_deref().unwrap_or("0"));
                self.refresh()?;
                Ok(match z {
                    Some(z) => format!("Parametric: x={x}, y={y}, z={z}"),
                    None => format!("Parametric 2D: x={x}, y={y}"),
                })
            }
            Command::Help => Ok(HELP.to_owned()),
            Command::Formula(f) => {
                self.set_formula(f);
                self.refresh()?;
                Ok(format!("OK: {f}"))
            }
        }
    }

    /// Parses and runs a line of input
    ///
    /// Returns `Ok(None)` if the line is blank.
    pub fn run_line(&mut self, line: &str) -> Result<Option<String>, Error> {
        match Command::parse(line)? {
            Some(cmd) => self.apply(&cmd).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(s: &str) -> Command {
        Command::parse(s).unwrap().unwrap()
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse("var a = 5"),
            Command::Var {
                name: "a".to_owned(),
                value: 5.0,
                lower: -5.0,
                upper: 15.0
            }
        );
        assert_eq!(
            parse("var k = 0.5 0 1"),
            Command::Var {
                name: "k".to_owned(),
                value: 0.5,
                lower: 0.0,
                upper: 1.0
            }
        );
        assert_eq!(
            parse("var t = 0 from 0 to 6.28"),
            Command::Var {
                name: "t".to_owned(),
                value: 0.0,
                lower: 0.0,
                upper: 6.28
            }
        );
        // `from` without a usable `to` falls back to the default bounds
        assert_eq!(
            parse("var q = 1 from 2"),
            Command::Var {
                name: "q".to_owned(),
                value: 1.0,
                lower: -10.0,
                upper: 10.0
            }
        );
        assert_eq!(
            Command::parse("var a 5"),
            Err(Error::Usage(VAR_USAGE))
        );
        assert_eq!(
            Command::parse("var = 5"),
            Err(Error::Usage(VAR_USAGE))
        );
        assert_eq!(
            Command::parse("var a = five"),
            Err(Error::Usage(VAR_USAGE))
        );
    }

    #[test]
    fn test_parse_other() {
        assert_eq!(Command::parse("   "), Ok(None));
        assert_eq!(parse("range -5 5"), Command::Range(-5.0, 5.0));
        assert_eq!(parse("step 0.25"), Command::Step(0.25));
        assert_eq!(parse("help"), Command::Help);
        assert_eq!(
            Command::parse("range 1"),
            Err(Error::Usage(RANGE_USAGE))
        );
        assert_eq!(
            Command::parse("step a"),
            Err(Error::Usage(STEP_USAGE))
        );
        // Only exact command words are commands
        assert_eq!(
            parse("variance(x)"),
            Command::Formula("variance(x)".to_owned())
        );
        assert_eq!(
            parse("  z = x + y "),
            Command::Formula("z = x + y".to_owned())
        );
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(
            parse("param cos(t), sin(t), t / 4"),
            Command::Param {
                x: "cos(t)".to_owned(),
                y: "sin(t)".to_owned(),
                z: Some("t / 4".to_owned()),
            }
        );
        assert_eq!(
            parse("param max(t, 1), min(t, 2)"),
            Command::Param {
                x: "max(t, 1)".to_owned(),
                y: "min(t, 2)".to_owned(),
                z: None,
            }
        );
        assert_eq!(
            Command::parse("param t"),
            Err(Error::Usage(PARAM_USAGE))
        );
    }

    #[test]
    fn test_apply() {
        let mut s = GraphState::new();
        assert_eq!(
            s.run_line("var a = 5").unwrap().unwrap(),
            "var a = 5.00 [-5.00 to 15.00]"
        );
        assert_eq!(s.run_line("range -5 5").unwrap().unwrap(), "Range: -5 to 5");
        assert_eq!(s.run_line("step 0.25").unwrap().unwrap(), "Step: 0.25");
        assert_eq!(
            s.run_line("z = a * x * y").unwrap().unwrap(),
            "OK: z = a * x * y"
        );
        assert_eq!(
            s.run_line("param cos(t), sin(t)").unwrap().unwrap(),
            "Parametric 2D: x=cos(t), y=sin(t)"
        );
        assert!(s.run_line("help").unwrap().unwrap().starts_with("Commands:"));

        assert_eq!(s.run_line("range 5 -5"), Err(Error::BadRange(5.0, -5.0)));
        assert_eq!(s.run_line("step -1"), Err(Error::BadStep(-1.0)));
        assert_eq!(
            s.run_line("var sin = 1"),
            Err(Error::ReservedName("sin".to_owned()))
        );
        assert!(s.run_line("z = b * x").is_err());
        assert!(s.plot().is_none());
    }
}
