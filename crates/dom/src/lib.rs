//! Document snapshots and trigger predicates.
//!
//! The tour runner never observes a live document. The host hands it a
//! [`DocumentSnapshot`] per poll tick and a [`PredicateEvaluator`] turns each
//! trigger expression into a [`MatchSet`]:
//! - [`SelectorEvaluator`] understands a CSS subset plus the text/value
//!   pseudo-classes tour authors rely on (`:contains`, `:containsExact`,
//!   `:propValue`) and the positional filters `:first`, `:last`, `:eq(n)`,
//!   `:nth(n)`
//! - tests can substitute any other evaluator

pub mod errors;
pub mod evaluator;
pub mod geometry;
pub mod selector;
pub mod snapshot;

pub use errors::PredicateError;
pub use evaluator::{MatchSet, PredicateEvaluator, SelectorEvaluator};
pub use geometry::{Insets, Point, Rect, Size};
pub use selector::SelectorList;
pub use snapshot::{DocumentSnapshot, ElementNode, ElementSpec};
