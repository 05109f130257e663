//! Canonicalization
//!
//! One-shot rewrites of a candidate draft that recover common
//! under-specified shapes before strict construction. Passes run in a fixed
//! order and the whole pipeline is idempotent.

pub mod dedup;
pub mod emits;
pub mod lazy_call;

pub use dedup::deduplicate_main;
pub use emits::{fix_implicit_shorthand, promote_output_accessors};
pub use lazy_call::repair_lazy_calls;

use flowsmith_core::draft::PipelineDraft;

/// Apply all canonicalization passes in order
pub fn canonicalize(mut draft: PipelineDraft) -> PipelineDraft {
    repair_lazy_calls(&mut draft);
    deduplicate_main(&mut draft);
    fix_implicit_shorthand(&mut draft);
    promote_output_accessors(&mut draft);
    draft
}
