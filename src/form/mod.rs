//! Dynamic form compilation and live form state.

pub mod compiler;
pub mod state;

pub use compiler::{CompiledForm, FieldRule, FormCompiler};
pub use state::FormState;
