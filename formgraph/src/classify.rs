//! Formula classification
//!
//! [`classify`] decides which family of equation a formula belongs to, and
//! splits it into the sub-formulas that the tessellator will compile.
//!
//! ```
//! use formgraph::classify::{classify, Classification, EquationKind};
//!
//! let c = classify("z = x + y");
//! assert_eq!(c.kind(), EquationKind::ExplicitSurface);
//! assert_eq!(c, Classification::ExplicitSurface { rhs: "x + y".to_owned() });
//!
//! assert_eq!(classify("x = y = z").kind(), EquationKind::ParametricLine);
//! assert_eq!(classify("x^2 + y^2 = 4").kind(), EquationKind::Implicit);
//! ```
//!
//! Variable detection works on identifier tokens, so `exp(y)` mentions `y`
//! but not `x`.
use crate::context::parse::identifiers;
use log::{debug, warn};
use strum::{EnumIter, IntoEnumIterator};

/// One of the three spatial axes
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    EnumIter,
    strum::Display,
)]
#[strum(serialize_all = "lowercase")]
pub enum Axis {
    /// The `x` axis
    X,
    /// The `y` axis
    Y,
    /// The `z` axis
    Z,
}

impl Axis {
    /// Parses a bare axis name (`x`, `y`, `z`, case-insensitive)
    pub fn from_name(s: &str) -> Option<Self> {
        Axis::iter().find(|a| a.name().eq_ignore_ascii_case(s))
    }

    /// Returns the lower-case variable name for this axis
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    /// Returns the index of this axis in an `(x, y, z)` tuple
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A set of [`Axis`] values
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct AxisSet(u8);

impl AxisSet {
    /// Builds an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the set of axis variables mentioned in `text`
    pub fn mentioned_in(text: &str) -> Self {
        let ids = identifiers(text);
        Axis::iter().filter(|a| ids.contains(a.name())).collect()
    }

    /// Adds an axis to the set
    pub fn insert(&mut self, a: Axis) {
        self.0 |= 1 << a.index();
    }

    /// Checks whether the axis is in the set
    pub fn contains(&self, a: Axis) -> bool {
        self.0 & (1 << a.index()) != 0
    }

    /// Returns the number of axes in the set
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Checks whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the set of axes not in this set
    pub fn complement(&self) -> Self {
        Self(!self.0 & 0b111)
    }

    /// Iterates over axes in `x, y, z` order
    pub fn iter(&self) -> impl Iterator<Item = Axis> + use<> {
        let s = *self;
        Axis::iter().filter(move |a| s.contains(*a))
    }
}

impl FromIterator<Axis> for AxisSet {
    fn from_iter<I: IntoIterator<Item = Axis>>(iter: I) -> Self {
        let mut out = Self::new();
        for a in iter {
            out.insert(a);
        }
        out
    }
}

/// Family of equation, which selects the tessellation routine
#[derive(Copy, Clone, Debug, Eq, PartialEq, strum::Display)]
pub enum EquationKind {
    /// `z = f(x, y)`, or a formula with no `=`
    ExplicitSurface,
    /// A chain of equalities describing a straight or curved line
    ParametricLine,
    /// Anything else, treated as a zero-set
    Implicit,
}

/// A chained equality that describes a line
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Line {
    /// Every part is a bare axis (`x = y = z`), so `x = y = z = u`
    AllEqual,
    /// Two bare axes tied to an expression of the third
    /// (e.g. `x = z = sin(y)`)
    Tied {
        /// Axis swept by the line parameter
        free: Axis,
        /// Axes set to the value of `expr`
        tied: [Axis; 2],
        /// Expression in the free axis
        expr: String,
    },
}

/// An equality with a single `=`, kept in split form for the fast paths
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Split {
    /// Left side, if it's a bare axis name
    pub solved: Option<Axis>,
    /// Right side text
    pub rhs: String,
    /// Axis variables mentioned in the right side
    pub rhs_axes: AxisSet,
}

/// Result of [`classify`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Classification {
    /// Height field `z = rhs(x, y)`
    ExplicitSurface {
        /// Height expression
        rhs: String,
    },
    /// Line from a chained equality
    ParametricLine(Line),
    /// Zero-set of a scalar field
    Implicit {
        /// Field expression, zero where the equality holds
        field: String,
        /// Split form, for single-`=` equalities only
        split: Option<Split>,
    },
}

impl Classification {
    /// Returns the family of this classification
    pub fn kind(&self) -> EquationKind {
        match self {
            Classification::ExplicitSurface { .. } => {
                EquationKind::ExplicitSurface
            }
            Classification::ParametricLine(..) => EquationKind::ParametricLine,
            Classification::Implicit { .. } => EquationKind::Implicit,
        }
    }
}

/// Builds `((p0)-(p1))^2 + ((p1)-(p2))^2 + ...`, which is zero exactly where
/// every part is equal
fn sum_of_squares(parts: &[&str]) -> String {
    parts
        .windows(2)
        .map(|w| format!("(({})-({}))^2", w[0], w[1]))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// Classifies a chain with at least two `=` signs
fn classify_chain(text: &str) -> Classification {
    let parts: Vec<&str> = text
        .split('=')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let axes: Vec<Option<Axis>> =
        parts.iter().map(|p| Axis::from_name(p)).collect();

    if parts.len() >= 2 && axes.iter().all(Option::is_some) {
        debug!("'{text}' is a line with all coordinates equal");
        return Classification::ParametricLine(Line::AllEqual);
    }

    if parts.len() == 3 {
        let bare: Vec<Axis> = axes.iter().flatten().copied().collect();
        let expr = axes.iter().position(Option::is_none).map(|i| parts[i]);
        if let ([a, b], Some(expr)) = (bare.as_slice(), expr) {
            let used: AxisSet = [*a, *b].into_iter().collect();
            let mentioned = AxisSet::mentioned_in(expr);
            let free = used.complement().iter().next();
            if let Some(free) = free.filter(|_| a != b) {
                if mentioned.contains(free)
                    && !mentioned.contains(*a)
                    && !mentioned.contains(*b)
                {
                    debug!("'{text}' is a line in {free}, tying {a} and {b}");
                    return Classification::ParametricLine(Line::Tied {
                        free,
                        tied: [*a, *b],
                        expr: expr.to_owned(),
                    });
                }
            }
        }
    }

    let field = if parts.len() >= 2 {
        sum_of_squares(&parts)
    } else {
        // Nothing to compare; pass the text through and let it fail to
        // compile
        text.to_owned()
    };
    debug!("'{text}' is an implicit chain: {field}");
    Classification::Implicit { field, split: None }
}

/// Classifies a raw formula
///
/// This never fails: empty text is logged and handed back as an explicit
/// surface, and anything ambiguous falls through to a default
/// interpretation.  Whether the result compiles is checked later.
pub fn classify(raw: &str) -> Classification {
    let text = raw.trim();
    if text.is_empty() {
        warn!("cannot classify an empty formula");
        return Classification::ExplicitSurface {
            rhs: String::new(),
        };
    }

    // An `=` at either end is not an equation
    let eq = match text.find('=') {
        Some(i) if i > 0 && i < text.len() - 1 => i,
        _ => {
            debug!("'{text}' is an explicit surface");
            return Classification::ExplicitSurface {
                rhs: text.to_owned(),
            };
        }
    };
    if text.matches('=').count() > 1 {
        return classify_chain(text);
    }

    let left = text[..eq].trim();
    let right = text[eq + 1..].trim();
    let solved = Axis::from_name(left);
    let rhs_axes = AxisSet::mentioned_in(right);

    if solved == Some(Axis::Z)
        && rhs_axes.contains(Axis::X)
        && rhs_axes.contains(Axis::Y)
        && !rhs_axes.contains(Axis::Z)
    {
        debug!("'{text}' is an explicit surface");
        return Classification::ExplicitSurface {
            rhs: right.to_owned(),
        };
    }

    debug!("'{text}' is implicit (solved for {solved:?})");
    Classification::Implicit {
        field: format!("({left}) - ({right})"),
        split: Some(Split {
            solved,
            rhs: right.to_owned(),
            rhs_axes,
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn explicit(s: &str) -> Classification {
        Classification::ExplicitSurface { rhs: s.to_owned() }
    }

    #[test]
    fn test_no_equals() {
        assert_eq!(classify("  sin(x)*cos(y) "), explicit("sin(x)*cos(y)"));
        assert_eq!(classify("x"), explicit("x"));
        assert_eq!(classify("   "), explicit(""));
    }

    #[test]
    fn test_equals_at_ends() {
        assert_eq!(classify("=x"), explicit("=x"));
        assert_eq!(classify("x + y ="), explicit("x + y ="));
        assert_eq!(classify(" = x = y"), explicit("= x = y"));
    }

    #[test]
    fn test_explicit_z() {
        assert_eq!(classify("z=x+y"), explicit("x+y"));
        assert_eq!(classify("Z = X * Y"), explicit("X * Y"));
    }

    #[test]
    fn test_left_var_on_right() {
        let c = classify("y=x+y");
        assert_eq!(
            c,
            Classification::Implicit {
                field: "(y) - (x+y)".to_owned(),
                split: Some(Split {
                    solved: Some(Axis::Y),
                    rhs: "x+y".to_owned(),
                    rhs_axes: [Axis::X, Axis::Y].into_iter().collect(),
                }),
            }
        );
    }

    #[test]
    fn test_single_equals() {
        let Classification::Implicit { field, split } = classify("x = 1")
        else {
            panic!("expected implicit");
        };
        assert_eq!(field, "(x) - (1)");
        let split = split.unwrap();
        assert_eq!(split.solved, Some(Axis::X));
        assert!(split.rhs_axes.is_empty());

        // z = f(x) only is not a full surface
        let Classification::Implicit { split, .. } = classify("z = x^2")
        else {
            panic!("expected implicit");
        };
        let split = split.unwrap();
        assert_eq!(split.solved, Some(Axis::Z));
        assert_eq!(split.rhs_axes.iter().collect::<Vec<_>>(), vec![Axis::X]);

        let Classification::Implicit { split, .. } = classify("x^2 + y^2 = 4")
        else {
            panic!("expected implicit");
        };
        assert_eq!(split.unwrap().solved, None);
    }

    #[test]
    fn test_chain_all_equal() {
        assert_eq!(
            classify("x=y=z"),
            Classification::ParametricLine(Line::AllEqual)
        );
        assert_eq!(
            classify("x = Y"),
            Classification::Implicit {
                field: "(x) - (Y)".to_owned(),
                split: Some(Split {
                    solved: Some(Axis::X),
                    rhs: "Y".to_owned(),
                    rhs_axes: [Axis::Y].into_iter().collect(),
                }),
            }
        );
        // Empty parts are dropped
        assert_eq!(
            classify("x==y"),
            Classification::ParametricLine(Line::AllEqual)
        );
    }

    #[test]
    fn test_chain_tied() {
        assert_eq!(
            classify("x = z = sin(y)"),
            Classification::ParametricLine(Line::Tied {
                free: Axis::Y,
                tied: [Axis::X, Axis::Z],
                expr: "sin(y)".to_owned(),
            })
        );
        assert_eq!(
            classify("2*x = y = z"),
            Classification::ParametricLine(Line::Tied {
                free: Axis::X,
                tied: [Axis::Y, Axis::Z],
                expr: "2*x".to_owned(),
            })
        );
    }

    #[test]
    fn test_chain_implicit() {
        assert_eq!(
            classify("x=y=z=5"),
            Classification::Implicit {
                field: "((x)-(y))^2 + ((y)-(z))^2 + ((z)-(5))^2".to_owned(),
                split: None,
            }
        );
        // The expression mentions a tied axis
        assert_eq!(
            classify("x = y = x + z").kind(),
            EquationKind::Implicit
        );
        // The same bare axis twice
        assert_eq!(
            classify("x = x = sin(y)").kind(),
            EquationKind::Implicit
        );
        // Two expressions
        assert_eq!(
            classify("x = y^2 = z^2").kind(),
            EquationKind::Implicit
        );
    }

    #[test]
    fn test_axis_set() {
        let s = AxisSet::mentioned_in("exp(y) + max(1, z)");
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![Axis::Y, Axis::Z]);
        assert_eq!(s.complement().iter().collect::<Vec<_>>(), vec![Axis::X]);
        assert_eq!(s.len(), 2);
        assert_eq!(Axis::Z.to_string(), "z");
    }
}
