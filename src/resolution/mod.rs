//! Chain resolution: linear resolution, reordering search, null guards and
//! the pipeline combining them.

pub mod guard;
pub mod pipeline;
pub mod reorder;
pub mod resolver;

// Re-export commonly used types
pub use guard::{GuardResult, NullGuardAnalyzer};
pub use pipeline::{AnalysisReport, ChainAnalyzer, ChainReport, Verdict, VerdictCounts};
pub use reorder::{ReorderOutcome, ReorderResult, ReorderingSearch};
pub use resolver::{ResolutionFailure, ResolutionResult, TypeCompatibilityResolver};
