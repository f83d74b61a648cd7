//! Infrastructure for representing math expressions as graphs
pub(crate) mod indexed;
mod op;
pub mod parse;

use indexed::{define_index, Index, IndexMap, IndexVec};
pub use op::{is_function_name, BinaryOpcode, Op, UnaryOpcode};

use crate::Error;

use std::collections::{BTreeMap, BTreeSet};

use ordered_float::OrderedFloat;

define_index!(Node, "An index in the `Context::ops` map");
define_index!(VarNode, "An index in the `Context::vars` map");

/// A `Context` holds a set of deduplicated constants, variables, and
/// operations.
///
/// It should be used like an arena allocator: it grows over time, then frees
/// all of its contents when dropped.
#[derive(Debug, Default)]
pub struct Context {
    ops: IndexMap<Op, Node>,
    vars: IndexMap<String, VarNode>,
}

impl Context {
    /// Build a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of [`Op`] nodes in the context
    ///
    /// ```
    /// # use formgraph::context::Context;
    /// let mut ctx = Context::new();
    /// let x = ctx.var("x");
    /// assert_eq!(ctx.len(), 1);
    /// let y = ctx.var("y");
    /// assert_eq!(ctx.len(), 2);
    /// ```
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Checks whether the context is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Checks whether the given [`Node`] is valid in this context
    fn check_node(&self, node: Node) -> Result<(), Error> {
        self.get_op(node).ok_or(Error::BadNode).map(|_| ())
    }

    /// Erases the most recently added node from the tree.
    ///
    /// This is only used to delete temporary operation nodes during constant
    /// folding.  Such nodes have no handles (because they are never returned)
    /// and are guaranteed to be unique (because we never store them
    /// persistently).
    fn pop(&mut self) -> Result<(), Error> {
        self.ops.pop().map(|_| ())
    }

    /// Looks up the constant associated with the given node.
    ///
    /// If the node is invalid for this tree, returns an error; if the node is
    /// not a constant, returns `Ok(None)`.
    pub fn const_value(&self, n: Node) -> Result<Option<f64>, Error> {
        match self.get_op(n) {
            Some(Op::Const(c)) => Ok(Some(c.0)),
            Some(_) => Ok(None),
            _ => Err(Error::BadNode),
        }
    }

    /// Looks up the variable name associated with the given node.
    ///
    /// If the node is invalid for this tree, returns an error; if the node is
    /// not an `Op::Var`, returns `Ok(None)`.
    pub fn var_name(&self, n: Node) -> Result<Option<&str>, Error> {
        match self.get_op(n) {
            Some(Op::Var(c)) => self.get_var_by_index(*c).map(Some),
            Some(_) => Ok(None),
            _ => Err(Error::BadNode),
        }
    }

    /// Looks up the variable name associated with the given `VarNode`
    pub fn get_var_by_index(&self, n: VarNode) -> Result<&str, Error> {
        match self.vars.get_by_index(n) {
            Some(c) => Ok(c),
            None => Err(Error::BadVar),
        }
    }

    /// Looks up an operation by `Node` handle
    pub fn get_op(&self, node: Node) -> Option<&Op> {
        self.ops.get_by_index(node)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Primitives

    /// Returns a variable with the provided name.
    ///
    /// If a variable already exists with this name, then it is returned.
    /// ```
    /// # use formgraph::context::Context;
    /// let mut ctx = Context::new();
    /// let a1 = ctx.var("a");
    /// let a2 = ctx.var("a");
    /// assert_eq!(a1, a2);
    /// ```
    pub fn var(&mut self, name: &str) -> Node {
        let v = self.vars.insert(String::from(name));
        self.ops.insert(Op::Var(v))
    }

    /// Returns a node representing the given constant value.
    /// ```
    /// # let mut ctx = formgraph::context::Context::new();
    /// let v = ctx.constant(3.0);
    /// assert_eq!(ctx.const_value(v).unwrap(), Some(3.0));
    /// ```
    pub fn constant(&mut self, f: f64) -> Node {
        self.ops.insert(Op::Const(OrderedFloat(f)))
    }

    ////////////////////////////////////////////////////////////////////////////
    // Helper functions to create nodes with constant folding

    /// Find or create a [`Node`] for the given unary operation, with constant
    /// folding.
    pub fn unary<A: IntoNode>(
        &mut self,
        a: A,
        op: UnaryOpcode,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let op_a = *self.get_op(a).ok_or(Error::BadNode)?;
        let n = self.ops.insert(Op::Unary(op, a));
        let out = if matches!(op_a, Op::Const(_)) {
            let v = self.eval(n, &BTreeMap::new())?;
            self.pop()?; // removes `n`
            self.constant(v)
        } else {
            n
        };
        Ok(out)
    }

    /// Find or create a [`Node`] for the given binary operation, with constant
    /// folding.
    ///
    /// Commutative operations have their arguments sorted to encourage
    /// deduplication.
    pub fn binary<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
        op: BinaryOpcode,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        let (a, b) = if op.is_commutative() {
            (a.min(b), a.max(b))
        } else {
            (a, b)
        };
        let op_a = *self.get_op(a).ok_or(Error::BadNode)?;
        let op_b = *self.get_op(b).ok_or(Error::BadNode)?;

        // This call to `insert` should always insert the node, because we
        // don't permanently store operations in the tree that could be
        // constant-folded (indeed, we pop the node right afterwards)
        let n = self.ops.insert(Op::Binary(op, a, b));
        let out = if matches!((op_a, op_b), (Op::Const(_), Op::Const(_))) {
            let v = self.eval(n, &BTreeMap::new())?;
            self.pop()?; // removes `n`
            self.constant(v)
        } else {
            n
        };
        Ok(out)
    }

    /// Builds an addition node
    /// ```
    /// # use std::collections::BTreeMap;
    /// # fn vars(v: &[f64; 3]) -> BTreeMap<String, f64> {
    /// #     ["x", "y", "z"].into_iter().map(String::from).zip(*v).collect()
    /// # }
    /// # let mut ctx = formgraph::context::Context::new();
    /// let x = ctx.var("x");
    /// let op = ctx.add(x, 1.0).unwrap();
    /// let v = ctx.eval(op, &vars(&[1.0, 0.0, 0.0])).unwrap();
    /// assert_eq!(v, 2.0);
    /// ```
    pub fn add<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        match (self.const_value(a)?, self.const_value(b)?) {
            (Some(zero), _) if zero == 0.0 => Ok(b),
            (_, Some(zero)) if zero == 0.0 => Ok(a),
            _ => self.binary(a, b, BinaryOpcode::Add),
        }
    }

    /// Builds a multiplication node
    ///
    /// `a * a` becomes a square.  A product with zero is kept as a product,
    /// so it is still NaN wherever the other operand is infinite.
    /// ```
    /// # use std::collections::BTreeMap;
    /// # fn vars(v: &[f64; 3]) -> BTreeMap<String, f64> {
    /// #     ["x", "y", "z"].into_iter().map(String::from).zip(*v).collect()
    /// # }
    /// # let mut ctx = formgraph::context::Context::new();
    /// let x = ctx.var("x");
    /// let op = ctx.mul(x, 5.0).unwrap();
    /// let v = ctx.eval(op, &vars(&[2.0, 0.0, 0.0])).unwrap();
    /// assert_eq!(v, 10.0);
    /// ```
    pub fn mul<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        if a == b {
            self.square(a)
        } else {
            match (self.const_value(a)?, self.const_value(b)?) {
                (Some(one), _) if one == 1.0 => Ok(b),
                (_, Some(one)) if one == 1.0 => Ok(a),
                _ => self.binary(a, b, BinaryOpcode::Mul),
            }
        }
    }

    /// Builds a node which performs subtraction.
    /// ```
    /// # use std::collections::BTreeMap;
    /// # fn vars(v: &[f64; 3]) -> BTreeMap<String, f64> {
    /// #     ["x", "y", "z"].into_iter().map(String::from).zip(*v).collect()
    /// # }
    /// # let mut ctx = formgraph::context::Context::new();
    /// let x = ctx.var("x");
    /// let y = ctx.var("y");
    /// let op = ctx.sub(x, y).unwrap();
    /// let v = ctx.eval(op, &vars(&[3.0, 2.0, 0.0])).unwrap();
    /// assert_eq!(v, 1.0);
    /// ```
    pub fn sub<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;

        match (self.const_value(a)?, self.const_value(b)?) {
            (Some(zero), _) if zero == 0.0 => self.neg(b),
            (_, Some(zero)) if zero == 0.0 => Ok(a),
            _ => self.binary(a, b, BinaryOpcode::Sub),
        }
    }

    /// Builds a node which performs division.
    /// ```
    /// # use std::collections::BTreeMap;
    /// # fn vars(v: &[f64; 3]) -> BTreeMap<String, f64> {
    /// #     ["x", "y", "z"].into_iter().map(String::from).zip(*v).collect()
    /// # }
    /// # let mut ctx = formgraph::context::Context::new();
    /// let x = ctx.var("x");
    /// let y = ctx.var("y");
    /// let op = ctx.div(x, y).unwrap();
    /// let v = ctx.eval(op, &vars(&[3.0, 2.0, 0.0])).unwrap();
    /// assert_eq!(v, 1.5);
    /// ```
    pub fn div<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        match self.const_value(b)? {
            Some(one) if one == 1.0 => Ok(a),
            _ => self.binary(a, b, BinaryOpcode::Div),
        }
    }

    /// Builds a node which raises `a` to the power `b`
    ///
    /// Constant exponents of 1 and 2 are simplified.
    /// ```
    /// # use std::collections::BTreeMap;
    /// # fn vars(v: &[f64; 3]) -> BTreeMap<String, f64> {
    /// #     ["x", "y", "z"].into_iter().map(String::from).zip(*v).collect()
    /// # }
    /// # let mut ctx = formgraph::context::Context::new();
    /// let x = ctx.var("x");
    /// let op = ctx.pow(x, 3.0).unwrap();
    /// let v = ctx.eval(op, &vars(&[2.0, 0.0, 0.0])).unwrap();
    /// assert_eq!(v, 8.0);
    /// ```
    pub fn pow<A: IntoNode, B: IntoNode>(
        &mut self,
        a: A,
        b: B,
    ) -> Result<Node, Error> {
        let a = a.into_node(self)?;
        let b = b.into_node(self)?;
        match self.const_value(b)? {
            Some(one) if one == 1.0 => Ok(a),
            Some(two) if two == 2.0 => self.square(a),
            _ => self.binary(a, b, BinaryOpcode::Pow),
        }
    }

    /// Builds a unary negation node
    pub fn neg<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        self.unary(a, UnaryOpcode::Neg)
    }

    /// Builds a node which squares its input
    /// ```
    /// # use std::collections::BTreeMap;
    /// # fn vars(v: &[f64; 3]) -> BTreeMap<String, f64> {
    /// #     ["x", "y", "z"].into_iter().map(String::from).zip(*v).collect()
    /// # }
    /// # let mut ctx = formgraph::context::Context::new();
    /// let x = ctx.var("x");
    /// let op = ctx.square(x).unwrap();
    /// let v = ctx.eval(op, &vars(&[2.0, 0.0, 0.0])).unwrap();
    /// assert_eq!(v, 4.0);
    /// ```
    pub fn square<A: IntoNode>(&mut self, a: A) -> Result<Node, Error> {
        self.unary(a, UnaryOpcode::Square)
    }

    ////////////////////////////////////////////////////////////////////////////

    /// Returns every node reachable from `root`, children before parents
    pub(crate) fn topo_order(&self, root: Node) -> Result<Vec<Node>, Error> {
        self.check_node(root)?;

        // Depth-first recursion on the heap, to protect against stack overflows
        enum Action {
            Down,
            Up,
        }

        let mut out = vec![];
        let mut todo = vec![(Action::Down, root)];
        let mut seen = BTreeSet::new();
        while let Some((action, node)) = todo.pop() {
            match action {
                Action::Down => {
                    if !seen.insert(node) {
                        continue;
                    }
                    todo.push((Action::Up, node));
                    let op = self.get_op(node).ok_or(Error::BadNode)?;
                    todo.extend(op.iter_children().map(|c| (Action::Down, c)));
                }
                Action::Up => out.push(node),
            }
        }
        Ok(out)
    }

    ////////////////////////////////////////////////////////////////////////////
    /// Evaluates the given node with a generic set of variables
    ///
    /// This walks the graph and is slow; it is used for constant folding.
    /// Compile through an [`eval::Binding`](crate::eval::Binding) for
    /// repeated evaluation.
    ///
    /// ```
    /// # use std::collections::BTreeMap;
    /// # fn vars(v: &[f64; 3]) -> BTreeMap<String, f64> {
    /// #     ["x", "y", "z"].into_iter().map(String::from).zip(*v).collect()
    /// # }
    /// # let mut ctx = formgraph::context::Context::new();
    /// let x = ctx.var("x");
    /// let y = ctx.var("y");
    /// let z = ctx.var("z");
    /// let op = ctx.mul(x, y).unwrap();
    /// let op = ctx.div(op, z).unwrap();
    /// let v = ctx.eval(op, &vars(&[3.0, 5.0, 2.0])).unwrap();
    /// assert_eq!(v, 7.5); // (3.0 * 5.0) / 2.0
    /// ```
    pub fn eval(
        &self,
        root: Node,
        vars: &BTreeMap<String, f64>,
    ) -> Result<f64, Error> {
        let mut cache: IndexVec<Option<f64>, Node> =
            vec![None; self.ops.len()].into();
        for node in self.topo_order(root)? {
            let v = match self.get_op(node).ok_or(Error::BadNode)? {
                Op::Var(v) => {
                    let name = self.get_var_by_index(*v)?;
                    *vars
                        .get(name)
                        .ok_or_else(|| Error::UnknownVariable(name.to_owned()))?
                }
                Op::Const(c) => c.0,
                Op::Binary(op, a, b) => {
                    op.apply(Self::cached(&cache, *a)?, Self::cached(&cache, *b)?)
                }
                Op::Unary(op, a) => op.apply(Self::cached(&cache, *a)?),
            };
            cache[node] = Some(v);
        }
        Self::cached(&cache, root)
    }

    fn cached(
        cache: &IndexVec<Option<f64>, Node>,
        node: Node,
    ) -> Result<f64, Error> {
        if node.get() >= cache.len() {
            return Err(Error::BadNode);
        }
        cache[node].ok_or(Error::BadNode)
    }
}

////////////////////////////////////////////////////////////////////////////////
/// Helper trait for things that can be converted into a [`Node`] given a
/// [`Context`].
///
/// This trait allows you to write
/// ```
/// # let mut ctx = formgraph::context::Context::new();
/// let x = ctx.var("x");
/// let sum = ctx.add(x, 1.0).unwrap();
/// ```
/// instead of the more verbose
/// ```
/// # let mut ctx = formgraph::context::Context::new();
/// let x = ctx.var("x");
/// let num = ctx.constant(1.0);
/// let sum = ctx.add(x, num).unwrap();
/// ```
pub trait IntoNode {
    /// Converts the given values into a node
    fn into_node(self, ctx: &mut Context) -> Result<Node, Error>;
}

impl IntoNode for Node {
    fn into_node(self, ctx: &mut Context) -> Result<Node, Error> {
        ctx.check_node(self)?;
        Ok(self)
    }
}

impl IntoNode for f64 {
    fn into_node(self, ctx: &mut Context) -> Result<Node, Error> {
        Ok(ctx.constant(self))
    }
}

////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;

    // This can't be in a doctest, because it uses a private function
    #[test]
    fn test_get_op() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let op_x = ctx.get_op(x).unwrap();
        assert!(matches!(op_x, Op::Var(_)));
    }

    #[test]
    fn test_constant_folding() {
        let mut ctx = Context::new();
        let a = ctx.constant(2.0);
        let b = ctx.pow(a, 3.0).unwrap();
        assert_eq!(ctx.const_value(b).unwrap(), Some(8.0));

        let s = ctx.unary(b, UnaryOpcode::Sqrt).unwrap();
        assert!((ctx.const_value(s).unwrap().unwrap() - 8f64.sqrt()).abs() < 1e-12);

        // 2, 3, 8 and sqrt(8); the temporary ops were popped
        assert_eq!(ctx.len(), 4);
    }

    #[test]
    fn test_mul_by_zero() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let m = ctx.mul(x, 0.0).unwrap();
        assert!(matches!(
            ctx.get_op(m),
            Some(Op::Binary(BinaryOpcode::Mul, _, _))
        ));
        let at = |v: f64| BTreeMap::from([("x".to_owned(), v)]);
        assert_eq!(ctx.eval(m, &at(3.0)), Ok(0.0));
        assert!(ctx.eval(m, &at(f64::INFINITY)).unwrap().is_nan());
    }

    #[test]
    fn test_dedup() {
        let mut ctx = Context::new();
        let x = ctx.var("x");
        let y = ctx.var("y");
        let a = ctx.add(x, y).unwrap();
        let b = ctx.add(y, x).unwrap();
        assert_eq!(a, b);

        let sq = ctx.mul(x, x).unwrap();
        assert!(matches!(
            ctx.get_op(sq),
            Some(Op::Unary(UnaryOpcode::Square, _))
        ));
    }

    #[test]
    fn test_eval_missing_var() {
        let mut ctx = Context::new();
        let a = ctx.var("a");
        assert_eq!(
            ctx.eval(a, &BTreeMap::new()),
            Err(Error::UnknownVariable("a".to_owned()))
        );
    }
}
