//! Search over the catalog.
//!
//! - [`filter`] - The catalog filter language and an in-memory evaluator
//! - [`compiler`] - Entity searches to per-target catalog queries
//! - [`assembler`] - Query execution, merging and paging
//! - [`sequencing`] - Result ordering

pub mod assembler;
pub mod compiler;
pub mod filter;
pub mod sequencing;

pub use assembler::ResultAssembler;
pub use compiler::{
    SearchCompiler, SearchPlan, SearchTarget, SubQuery, DEFAULT_VALUE_FIELDS,
    REFERENCED_TYPE_ATTRIBUTE,
};
pub use filter::{quote_value, AttributeFilter, FilterEvaluator, FilterExpr};
pub use sequencing::{page, sort_instances, Sequenced};
