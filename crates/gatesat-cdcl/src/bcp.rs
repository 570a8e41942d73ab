//! Watched-literal bookkeeping for Boolean Constraint Propagation.

use gatesat_base::Lit;

/// A watched literal entry.
#[derive(Debug, Clone, Copy)]
pub struct Watch {
    /// The clause being watched.
    pub clause_id: usize,
    /// The other watched literal in the clause; if it is already true the
    /// clause needs no further inspection.
    pub blocker: Lit,
}

/// Watch lists, one per literal.
#[derive(Debug, Default)]
pub struct WatchedLiterals {
    watches: Vec<Vec<Watch>>,
}

impl WatchedLiterals {
    /// Creates watch lists for `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        // one list per polarity
        Self {
            watches: vec![Vec::new(); num_vars * 2],
        }
    }

    /// Grows the lists to cover `num_vars` variables.
    pub fn grow(&mut self, num_vars: usize) {
        self.watches.resize(num_vars * 2, Vec::new());
    }

    /// Registers a watch of `clause_id` on `lit`.
    pub fn watch(&mut self, lit: Lit, clause_id: usize, blocker: Lit) {
        self.watches[lit.index()].push(Watch { clause_id, blocker });
    }

    /// Returns the watches on `lit`.
    #[must_use]
    pub fn list(&self, lit: Lit) -> &[Watch] {
        &self.watches[lit.index()]
    }

    /// Returns the mutable watch list on `lit`.
    pub fn list_mut(&mut self, lit: Lit) -> &mut Vec<Watch> {
        &mut self.watches[lit.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatesat_base::Var;

    #[test]
    fn add_and_get() {
        let mut watches = WatchedLiterals::new(10);
        let a = Lit::positive(Var(0));
        let b = Lit::negative(Var(0));

        watches.watch(a, 0, Lit::positive(Var(1)));
        watches.watch(a, 1, Lit::negative(Var(2)));
        watches.watch(b, 2, Lit::positive(Var(3)));

        assert_eq!(watches.list(a).len(), 2);
        assert_eq!(watches.list(a)[0].clause_id, 0);
        assert_eq!(watches.list(b).len(), 1);
        assert_eq!(watches.list(b)[0].clause_id, 2);
    }

    #[test]
    fn grow_preserves_existing() {
        let mut watches = WatchedLiterals::new(2);
        let a = Lit::positive(Var(1));
        watches.watch(a, 7, Lit::positive(Var(0)));

        watches.grow(8);
        assert_eq!(watches.list(a).len(), 1);
        assert!(watches.list(Lit::positive(Var(7))).is_empty());
    }
}
