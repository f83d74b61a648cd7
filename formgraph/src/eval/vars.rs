use crate::context::indexed::{define_index, Index, IndexMap};

define_index!(Slot, "Index of a storage cell in [`Vars`]");

/// `Vars` contains the mapping of variable names to storage cells, and the
/// current value of each cell.
///
/// The built-in variables `x`, `y`, `z`, and `t` always occupy the first four
/// cells; user parameters are appended after them.  Cells are never removed,
/// so a [`Slot`] stays valid for the lifetime of the `Vars`.
#[derive(Clone, Debug)]
pub struct Vars {
    names: IndexMap<String, Slot>,
    values: Vec<f64>,
}

impl Default for Vars {
    fn default() -> Self {
        let mut out = Self {
            names: IndexMap::default(),
            values: vec![],
        };
        for name in crate::context::parse::BUILTIN_VARS {
            out.insert(name, 0.0);
        }
        out
    }
}

impl Vars {
    /// Cell for the `x` coordinate
    pub const X: Slot = Slot(0);
    /// Cell for the `y` coordinate
    pub const Y: Slot = Slot(1);
    /// Cell for the `z` coordinate
    pub const Z: Slot = Slot(2);
    /// Cell for the curve parameter `t`
    pub const T: Slot = Slot(3);

    /// Builds the default set of cells (`x`, `y`, `z`, `t`, all zero)
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cells
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Checks whether there are no cells (never true in practice)
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks up the cell for the given name
    pub fn slot(&self, name: &str) -> Option<Slot> {
        self.names.get_by_value(name)
    }

    /// Checks whether a cell exists with the given name
    pub fn contains(&self, name: &str) -> bool {
        self.slot(name).is_some()
    }

    /// Returns the cell for `name`, creating it with `value` if it's new
    ///
    /// An existing cell keeps its current value.
    pub fn insert(&mut self, name: &str, value: f64) -> Slot {
        if let Some(s) = self.slot(name) {
            return s;
        }
        let s = self.names.insert(name.to_owned());
        self.values.push(value);
        debug_assert_eq!(s.get() + 1, self.values.len());
        s
    }

    /// Sets a cell's value
    ///
    /// Out-of-range slots (from a different `Vars`) are ignored.
    pub fn set(&mut self, slot: Slot, value: f64) {
        if let Some(v) = self.values.get_mut(slot.get()) {
            *v = value;
        }
    }

    /// Reads a cell's value, returning NaN for an out-of-range slot
    pub fn get(&self, slot: Slot) -> f64 {
        self.values.get(slot.get()).copied().unwrap_or(f64::NAN)
    }

    /// Returns the name of a cell
    pub fn name(&self, slot: Slot) -> Option<&str> {
        self.names.get_by_index(slot).map(String::as_str)
    }

    /// Returns the inner data slice
    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_builtins() {
        let v = Vars::new();
        assert_eq!(v.len(), 4);
        assert_eq!(v.slot("x"), Some(Vars::X));
        assert_eq!(v.slot("y"), Some(Vars::Y));
        assert_eq!(v.slot("z"), Some(Vars::Z));
        assert_eq!(v.slot("t"), Some(Vars::T));
        assert_eq!(v.as_slice(), &[0.0; 4]);
    }

    #[test]
    fn test_insert_keeps_cell() {
        let mut v = Vars::new();
        let a = v.insert("a", 2.0);
        v.set(a, 3.0);
        assert_eq!(v.insert("a", 10.0), a);
        assert_eq!(v.get(a), 3.0);
        assert_eq!(v.name(a), Some("a"));
    }
}
