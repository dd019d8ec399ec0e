// core.rs splits responsibilities into submodules for easier maintenance.
pub mod chain;
pub mod difficulty;
pub mod validation;

pub use chain::*;
pub use difficulty::*;
pub use validation::*;
