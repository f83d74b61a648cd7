//! Straight-line evaluation tapes
use super::vars::{Slot, Vars};
use crate::{
    context::{indexed::Index, BinaryOpcode, Context, Node, Op, UnaryOpcode},
    Error,
};
use std::collections::HashMap;

/// Single operation in an [`Expression`] tape
///
/// The tape is in SSA form: operation `i` writes register `i`, and arguments
/// always refer to earlier registers.
#[derive(Copy, Clone, Debug, PartialEq)]
enum TapeOp {
    /// Reads a variable cell
    Var(Slot),
    /// Loads a constant
    Const(f64),
    Unary(UnaryOpcode, u32),
    Binary(BinaryOpcode, u32, u32),
}

/// A compiled formula, bound to the cells of a [`Vars`] set
///
/// Evaluation is a pure function of the cell values; the expression holds no
/// other state.  Cloning is cheap enough to keep the last good expression
/// around while a new one is compiled.
#[derive(Clone, Debug, PartialEq)]
pub struct Expression {
    text: String,
    tape: Vec<TapeOp>,
}

impl Expression {
    /// Flattens the graph under `root` into a tape
    pub(crate) fn new(
        text: &str,
        ctx: &Context,
        root: Node,
        vars: &Vars,
    ) -> Result<Self, Error> {
        let mut tape = vec![];
        let mut regs: HashMap<Node, u32> = HashMap::new();
        let reg = |regs: &HashMap<Node, u32>, n: &Node| {
            regs.get(n).copied().ok_or(Error::BadNode)
        };
        for node in ctx.topo_order(root)? {
            let op = match ctx.get_op(node).ok_or(Error::BadNode)? {
                Op::Var(..) => {
                    let name = ctx.var_name(node)?.ok_or(Error::BadVar)?;
                    let slot = vars.slot(name).ok_or_else(|| {
                        Error::UnknownVariable(name.to_owned())
                    })?;
                    TapeOp::Var(slot)
                }
                Op::Const(c) => TapeOp::Const(c.0),
                Op::Unary(op, a) => TapeOp::Unary(*op, reg(&regs, a)?),
                Op::Binary(op, a, b) => {
                    TapeOp::Binary(*op, reg(&regs, a)?, reg(&regs, b)?)
                }
            };
            regs.insert(node, tape.len() as u32);
            tape.push(op);
        }
        Ok(Self {
            text: text.to_owned(),
            tape,
        })
    }

    /// Returns the source text this expression was compiled from
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the number of operations in the tape
    pub fn len(&self) -> usize {
        self.tape.len()
    }

    /// Checks whether the tape is empty (never true for a compiled formula)
    pub fn is_empty(&self) -> bool {
        self.tape.is_empty()
    }

    /// Evaluates the tape against the given cell values
    ///
    /// `scratch` is resized as needed and may be reused across calls.
    pub fn eval(&self, values: &[f64], scratch: &mut Vec<f64>) -> f64 {
        scratch.clear();
        for op in &self.tape {
            let v = match *op {
                TapeOp::Var(s) => {
                    values.get(s.get()).copied().unwrap_or(f64::NAN)
                }
                TapeOp::Const(c) => c,
                TapeOp::Unary(op, a) => op.apply(scratch[a as usize]),
                TapeOp::Binary(op, a, b) => {
                    op.apply(scratch[a as usize], scratch[b as usize])
                }
            };
            scratch.push(v);
        }
        scratch.last().copied().unwrap_or(f64::NAN)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::parse::parse;

    fn compile(text: &str, vars: &Vars) -> Expression {
        let mut ctx = Context::new();
        let root = parse(&mut ctx, text, |v| vars.contains(v)).unwrap();
        Expression::new(text, &ctx, root, vars).unwrap()
    }

    #[test]
    fn test_shared_subexpressions() {
        let vars = Vars::new();
        let e = compile("sin(x) + sin(x)", &vars);
        // x, sin(x), and the sum
        assert_eq!(e.len(), 3);
        assert_eq!(e.text(), "sin(x) + sin(x)");
        let mut scratch = vec![];
        let mut values = vars.as_slice().to_vec();
        values[Vars::X.get()] = 0.5;
        assert_eq!(e.eval(&values, &mut scratch), 2.0 * 0.5f64.sin());
    }

    #[test]
    fn test_unbound_slot_is_nan() {
        let mut vars = Vars::new();
        vars.insert("a", 1.0);
        let e = compile("a + 1", &vars);
        let mut scratch = vec![];
        assert_eq!(e.eval(vars.as_slice(), &mut scratch), 2.0);
        assert!(e.eval(&[0.0; 4], &mut scratch).is_nan());
    }
}
