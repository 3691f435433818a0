//! Physical registers and register classes.

/// Index of a register within its class.
pub type RegIdx = usize;

/// A physical register of a register class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub name: String,
    pub index: RegIdx,
    /// Excluded from coloring entirely (stack pointer, reserved registers).
    pub ignore: bool,
}

/// A fixed, ordered set of interchangeable physical registers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterClass {
    name: String,
    regs: Vec<Register>,
}

impl RegisterClass {
    /// Create a class from `(name, ignore)` pairs; indices follow the order given.
    pub fn new<S: Into<String>>(name: S, regs: impl IntoIterator<Item = (String, bool)>) -> Self {
        let regs = regs
            .into_iter()
            .enumerate()
            .map(|(index, (name, ignore))| Register { name, index, ignore })
            .collect();
        Self {
            name: name.into(),
            regs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of registers, including ignore registers.
    pub fn n_regs(&self) -> usize {
        self.regs.len()
    }

    pub fn regs(&self) -> &[Register] {
        &self.regs
    }

    pub fn reg(&self, index: RegIdx) -> Option<&Register> {
        self.regs.get(index)
    }

    /// Whether `index` is an ignore register. Unknown indices count as ignored.
    pub fn is_ignore(&self, index: RegIdx) -> bool {
        self.regs.get(index).map_or(true, |r| r.ignore)
    }

    /// Look up a register by name.
    pub fn find(&self, name: &str) -> Option<RegIdx> {
        self.regs.iter().position(|r| r.name == name)
    }

    /// Number of registers available for coloring.
    pub fn n_assignable(&self) -> usize {
        self.regs.iter().filter(|r| !r.ignore).count()
    }
}
