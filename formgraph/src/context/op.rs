use crate::context::{Node, VarNode};
use ordered_float::OrderedFloat;

/// A one-argument math operation
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum UnaryOpcode {
    /// Negation
    Neg,
    /// Absolute value
    Abs,
    /// Square root
    Sqrt,
    /// Multiplies a value by itself
    Square,
    /// Sine
    Sin,
    /// Cosine
    Cos,
    /// Tangent
    Tan,
    /// Arcsine
    Asin,
    /// Arccosine
    Acos,
    /// Arctangent
    Atan,
    /// Hyperbolic sine
    Sinh,
    /// Hyperbolic cosine
    Cosh,
    /// Hyperbolic tangent
    Tanh,
    /// Natural exponent
    Exp,
    /// Natural log (`log` and `ln` in formulas)
    Ln,
    /// Base-10 log
    Log10,
    /// Rounds down
    Floor,
    /// Rounds up
    Ceil,
}

impl UnaryOpcode {
    /// Applies the operation to a single value
    pub fn apply(self, a: f64) -> f64 {
        match self {
            UnaryOpcode::Neg => -a,
            UnaryOpcode::Abs => a.abs(),
            UnaryOpcode::Sqrt => a.sqrt(),
            UnaryOpcode::Square => a * a,
            UnaryOpcode::Sin => a.sin(),
            UnaryOpcode::Cos => a.cos(),
            UnaryOpcode::Tan => a.tan(),
            UnaryOpcode::Asin => a.asin(),
            UnaryOpcode::Acos => a.acos(),
            UnaryOpcode::Atan => a.atan(),
            UnaryOpcode::Sinh => a.sinh(),
            UnaryOpcode::Cosh => a.cosh(),
            UnaryOpcode::Tanh => a.tanh(),
            UnaryOpcode::Exp => a.exp(),
            UnaryOpcode::Ln => a.ln(),
            UnaryOpcode::Log10 => a.log10(),
            UnaryOpcode::Floor => a.floor(),
            UnaryOpcode::Ceil => a.ceil(),
        }
    }

    /// Looks up a unary function by the name used in formulas
    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "abs" => UnaryOpcode::Abs,
            "sqrt" => UnaryOpcode::Sqrt,
            "sin" => UnaryOpcode::Sin,
            "cos" => UnaryOpcode::Cos,
            "tan" => UnaryOpcode::Tan,
            "asin" => UnaryOpcode::Asin,
            "acos" => UnaryOpcode::Acos,
            "atan" => UnaryOpcode::Atan,
            "sinh" => UnaryOpcode::Sinh,
            "cosh" => UnaryOpcode::Cosh,
            "tanh" => UnaryOpcode::Tanh,
            "exp" => UnaryOpcode::Exp,
            "log" | "ln" => UnaryOpcode::Ln,
            "log10" => UnaryOpcode::Log10,
            "floor" => UnaryOpcode::Floor,
            "ceil" => UnaryOpcode::Ceil,
            _ => return None,
        };
        Some(op)
    }
}

/// A two-argument math operation
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum BinaryOpcode {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Remainder, with the sign of the dividend
    Mod,
    /// Exponentiation (`^` or `pow`)
    Pow,
    /// Minimum of two values
    Min,
    /// Maximum of two values
    Max,
    /// Two-argument arctangent, `atan2(y, x)`
    Atan2,
}

impl BinaryOpcode {
    /// Applies the operation to a pair of values
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOpcode::Add => a + b,
            BinaryOpcode::Sub => a - b,
            BinaryOpcode::Mul => a * b,
            BinaryOpcode::Div => a / b,
            BinaryOpcode::Mod => a % b,
            BinaryOpcode::Pow => a.powf(b),
            BinaryOpcode::Min => a.min(b),
            BinaryOpcode::Max => a.max(b),
            BinaryOpcode::Atan2 => a.atan2(b),
        }
    }

    /// Looks up a two-argument function by the name used in formulas
    ///
    /// Infix operators are not included here.
    pub fn from_name(name: &str) -> Option<Self> {
        let op = match name {
            "pow" => BinaryOpcode::Pow,
            "min" => BinaryOpcode::Min,
            "max" => BinaryOpcode::Max,
            "atan2" => BinaryOpcode::Atan2,
            _ => return None,
        };
        Some(op)
    }

    /// Checks whether operand order can be swapped freely
    pub fn is_commutative(self) -> bool {
        matches!(
            self,
            BinaryOpcode::Add
                | BinaryOpcode::Mul
                | BinaryOpcode::Min
                | BinaryOpcode::Max
        )
    }
}

/// Represents an operation in a math expression.
///
/// `Op`s should be constructed by calling functions on
/// [`Context`](crate::context::Context), e.g.
/// [`Context::add`](crate::context::Context::add) will generate an
/// `Op::Binary(BinaryOpcode::Add, .., ..)` node and return an opaque handle.
///
/// Each `Op` is tightly coupled to the [`Context`](crate::context::Context)
/// which generated it, and will not be valid for a different `Context`.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Op {
    /// Reads a named variable
    Var(VarNode),
    /// Constant value
    Const(OrderedFloat<f64>),
    /// Two-argument operation
    Binary(BinaryOpcode, Node, Node),
    /// One-argument operation
    Unary(UnaryOpcode, Node),
}

impl Op {
    /// Iterates over children, producing 0, 1, or 2 values
    pub fn iter_children(&self) -> impl Iterator<Item = Node> {
        let out = match self {
            Op::Binary(_, a, b) => [Some(*a), Some(*b)],
            Op::Unary(_, a) => [Some(*a), None],
            Op::Var(..) | Op::Const(..) => [None, None],
        };
        out.into_iter().flatten()
    }
}

/// Returns true if `name` is a function usable in formulas
pub fn is_function_name(name: &str) -> bool {
    UnaryOpcode::from_name(name).is_some()
        || BinaryOpcode::from_name(name).is_some()
}
