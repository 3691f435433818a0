//! Register sets over one register class.
//!
//! A [`RegSet`] is a fixed-size bitset indexed by native register index. It
//! carries admissible-register constraints and the used-color scratch set of
//! the size reducer.

use super::register_class::RegIdx;

const WORD_BITS: usize = 64;

/// Bit set for efficiently tracking registers of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegSet {
    /// Number of registers in the class.
    n_regs: usize,
    /// One bit per register, least significant bit first.
    words: Vec<u64>,
}

impl RegSet {
    /// Create empty register set for a class with `n_regs` registers.
    pub fn new(n_regs: usize) -> Self {
        Self {
            n_regs,
            words: vec![0; n_regs.div_ceil(WORD_BITS)],
        }
    }

    /// Create register set with every register of the class marked.
    pub fn full(n_regs: usize) -> Self {
        let mut set = Self::new(n_regs);
        for i in 0..n_regs {
            set.set(i);
        }
        set
    }

    /// Create a set from a list of register indices.
    pub fn from_regs(n_regs: usize, regs: impl IntoIterator<Item = RegIdx>) -> Self {
        let mut set = Self::new(n_regs);
        for reg in regs {
            set.set(reg);
        }
        set
    }

    /// Size of the underlying register class.
    pub fn capacity(&self) -> usize {
        self.n_regs
    }

    /// Check if register is set.
    pub fn contains(&self, reg: RegIdx) -> bool {
        if reg >= self.n_regs {
            return false;
        }
        (self.words[reg / WORD_BITS] & (1u64 << (reg % WORD_BITS))) != 0
    }

    /// Set a register. Out-of-class indices are ignored.
    pub fn set(&mut self, reg: RegIdx) {
        if reg < self.n_regs {
            self.words[reg / WORD_BITS] |= 1u64 << (reg % WORD_BITS);
        }
    }

    /// Clear a register.
    pub fn clear(&mut self, reg: RegIdx) {
        if reg < self.n_regs {
            self.words[reg / WORD_BITS] &= !(1u64 << (reg % WORD_BITS));
        }
    }

    /// Clear all registers.
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Find the lowest register at or above `from` that is not set.
    pub fn next_clear(&self, from: RegIdx) -> Option<RegIdx> {
        (from..self.n_regs).find(|&reg| !self.contains(reg))
    }

    /// Count number of set registers.
    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Iterate over set registers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RegIdx> + '_ {
        (0..self.n_regs).filter(move |&reg| self.contains(reg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regset_operations() {
        let mut set = RegSet::new(70);

        assert!(!set.contains(65));
        set.set(65);
        assert!(set.contains(65));
        set.clear(65);
        assert!(!set.contains(65));

        // Out of class registers are never members.
        set.set(70);
        assert!(!set.contains(70));
        assert_eq!(set.count(), 0);
    }

    #[test]
    fn test_next_clear() {
        let mut set = RegSet::from_regs(4, [0, 1, 3]);
        assert_eq!(set.next_clear(0), Some(2));
        set.set(2);
        assert_eq!(set.next_clear(0), None);
        set.clear_all();
        assert_eq!(set.next_clear(1), Some(1));
    }

    #[test]
    fn test_full_and_iter() {
        let set = RegSet::full(5);
        assert_eq!(set.count(), 5);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(set.capacity(), 5);
    }
}
