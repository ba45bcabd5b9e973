//! The core of Janus: a bidirectional, usage-counting type checker for a
//! small dependently-typed λ-calculus, together with the
//! normalization-by-evaluation kernel it depends on. Every variable carries
//! a multiplicity from the {0, 1, ω} semiring; the checker verifies, along
//! with ordinary dependent types, how often each variable is consumed.

pub mod check;
pub mod common;
pub mod context;
pub mod eval;
pub mod name;
pub mod print;
pub mod quote;
pub mod resource;
pub mod syntax;
pub mod usage;
pub mod value;

pub use common::{Index, Level};
pub use context::{Binding, Context};
pub use name::{Name, Symbol};
pub use resource::{Multiplicity, Relevance};
pub use syntax::{Checkable, Inferable, RcCheckable, RcInferable};
pub use usage::Usage;
pub use value::{Definitions, RcValue, Value};
