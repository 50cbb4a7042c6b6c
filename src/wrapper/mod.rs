//! Wrapper handles and the identity cache behind them.

pub mod cache;
pub mod node;

pub use cache::{IdentityCache, LiveWrapper, TreeLookup, WrapperEntry};
pub use node::{WrapperId, WrapperState};
