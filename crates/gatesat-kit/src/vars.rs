//! The two-namespace variable manager.
//!
//! Circuit variables are the ids clients see; CNF variables are the ids the
//! backend sees. Both namespaces are 1-based so the sign bit can carry
//! negation. The map between them is a partial injection, materialized
//! lazily: a CNF id is minted only when the front-end first needs to speak
//! about a circuit variable to the backend.

use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub(crate) struct VarMap {
    next_cv: i32,
    next_nv: i32,
    cv_to_nv: FxHashMap<i32, i32>,
    nv_to_cv: FxHashMap<i32, i32>,
}

impl VarMap {
    pub fn new() -> Self {
        Self {
            next_cv: 1,
            next_nv: 1,
            cv_to_nv: FxHashMap::default(),
            nv_to_cv: FxHashMap::default(),
        }
    }

    /// Mints the next circuit variable.
    pub fn fresh_cv(&mut self) -> i32 {
        let cv = self.next_cv;
        self.next_cv += 1;
        cv
    }

    /// Number of circuit variables minted so far.
    pub fn num_cvs(&self) -> usize {
        (self.next_cv - 1) as usize
    }

    /// Highest CNF variable ever allocated; 0 when none exist.
    pub fn max_nv(&self) -> i32 {
        self.next_nv - 1
    }

    /// Whether the signed id names a minted circuit variable.
    pub fn is_minted(&self, cv: i32) -> bool {
        cv != 0 && (cv.unsigned_abs() as i32) < self.next_cv
    }

    /// Translates a signed circuit id to a signed CNF id, minting the CNF
    /// variable on first contact. Sign is preserved.
    pub fn cnf_of(&mut self, cv: i32) -> i32 {
        debug_assert!(cv != 0);
        let mag = cv.abs();
        let nv = match self.cv_to_nv.get(&mag) {
            Some(&nv) => nv,
            None => {
                let nv = self.next_nv;
                self.next_nv += 1;
                self.cv_to_nv.insert(mag, nv);
                self.nv_to_cv.insert(nv, mag);
                nv
            }
        };
        if cv < 0 {
            -nv
        } else {
            nv
        }
    }

    /// Looks up the CNF id of a positive circuit id without minting.
    /// Returns 0 when the variable was never encoded.
    pub fn peek_cnf_of(&self, cv: i32) -> i32 {
        debug_assert!(cv > 0);
        self.cv_to_nv.get(&cv).copied().unwrap_or(0)
    }

    /// Inverse lookup for a minted positive CNF id.
    pub fn cv_of(&self, nv: i32) -> i32 {
        debug_assert!(nv > 0);
        *self
            .nv_to_cv
            .get(&nv)
            .expect("cnf variable outside the minted range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one() {
        let mut vars = VarMap::new();
        assert_eq!(vars.fresh_cv(), 1);
        assert_eq!(vars.fresh_cv(), 2);
        assert_eq!(vars.num_cvs(), 2);
        assert_eq!(vars.max_nv(), 0);
    }

    #[test]
    fn lazy_minting_preserves_sign() {
        let mut vars = VarMap::new();
        let a = vars.fresh_cv();
        let b = vars.fresh_cv();

        // first contact is through the negated literal of b
        let nb = vars.cnf_of(-b);
        assert_eq!(nb, -1);
        assert_eq!(vars.cnf_of(b), 1);
        assert_eq!(vars.cnf_of(a), 2);
        assert_eq!(vars.cnf_of(-a), -2);
        assert_eq!(vars.max_nv(), 2);
    }

    #[test]
    fn bijection_inverse() {
        let mut vars = VarMap::new();
        let cvs: Vec<i32> = (0..5).map(|_| vars.fresh_cv()).collect();
        for &cv in cvs.iter().rev() {
            let nv = vars.cnf_of(cv);
            assert_eq!(vars.cv_of(nv), cv);
        }
    }

    #[test]
    fn peek_does_not_mint() {
        let mut vars = VarMap::new();
        let a = vars.fresh_cv();
        assert_eq!(vars.peek_cnf_of(a), 0);
        assert_eq!(vars.max_nv(), 0);

        let na = vars.cnf_of(a);
        assert_eq!(vars.peek_cnf_of(a), na);
    }
}
