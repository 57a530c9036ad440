pub mod context;
pub mod interactive;
pub mod merge;
pub mod session;

pub use context::format_context;
pub use interactive::run_interactive;
pub use merge::{merge_weighted, WeightedHit};
pub use session::{Answer, QuestionAnswerer, RagSession, Retriever};
