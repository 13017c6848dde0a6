mod builtins;
pub mod context;
pub mod environment;
pub mod evaluator;
pub mod macros;
pub mod object;
pub mod session;

pub use context::{Context, ContextOptions};
pub use environment::Environment;
pub use object::{EvaluationError, Interruption, Object};
pub use session::{RunError, Session};
