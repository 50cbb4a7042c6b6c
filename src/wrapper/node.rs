use std::fmt;

/// Handle to a wrapper node.
///
/// The handle stays valid while the wrapper is Live. Once the wrapper is
/// forgotten its slot may be reused, but with a new generation, so a stale
/// handle can never observe another wrapper's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WrapperId {
    slot: u32,
    generation: u32,
}

impl WrapperId {
    pub const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    pub const fn slot(self) -> u32 {
        self.slot
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for WrapperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}.{}", self.slot, self.generation)
    }
}

/// Liveness of a wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperState {
    Live,
    Forgotten,
}
