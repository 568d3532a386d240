use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tourguide_core_types::{ElementId, Predicate};
use tracing::debug;

use crate::errors::PredicateError;
use crate::selector::SelectorList;
use crate::snapshot::DocumentSnapshot;

/// Elements matched by a predicate, in document order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchSet {
    elements: Vec<ElementId>,
}

impl MatchSet {
    pub fn new(elements: Vec<ElementId>) -> Self {
        Self { elements }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_satisfied(&self) -> bool {
        !self.elements.is_empty()
    }

    /// The anchor candidate: first match in document order.
    pub fn first(&self) -> Option<&ElementId> {
        self.elements.first()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementId> {
        self.elements.iter()
    }
}

/// Pure function from a snapshot to the elements a predicate selects.
pub trait PredicateEvaluator: Send + Sync {
    fn evaluate(
        &self,
        doc: &DocumentSnapshot,
        predicate: &Predicate,
    ) -> Result<MatchSet, PredicateError>;
}

impl<E> PredicateEvaluator for Arc<E>
where
    E: PredicateEvaluator + ?Sized,
{
    fn evaluate(
        &self,
        doc: &DocumentSnapshot,
        predicate: &Predicate,
    ) -> Result<MatchSet, PredicateError> {
        (**self).evaluate(doc, predicate)
    }
}

/// Default evaluator backed by [`SelectorList`]. Parsed selectors are cached
/// since the same triggers are re-evaluated on every tick.
#[derive(Default)]
pub struct SelectorEvaluator {
    cache: Mutex<HashMap<String, Result<Arc<SelectorList>, PredicateError>>>,
}

impl SelectorEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&self, predicate: &Predicate) -> Result<Arc<SelectorList>, PredicateError> {
        let mut cache = self.cache.lock();
        if let Some(entry) = cache.get(predicate.as_str()) {
            return entry.clone();
        }
        debug!(target: "dom", predicate = %predicate, "compiling selector");
        let compiled = SelectorList::parse(predicate.as_str()).map(Arc::new);
        cache.insert(predicate.as_str().to_string(), compiled.clone());
        compiled
    }

    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}

impl PredicateEvaluator for SelectorEvaluator {
    fn evaluate(
        &self,
        doc: &DocumentSnapshot,
        predicate: &Predicate,
    ) -> Result<MatchSet, PredicateError> {
        let selector = self.compile(predicate)?;
        let elements = selector
            .select(doc)
            .into_iter()
            .filter_map(|pos| doc.node(pos).map(|node| node.id.clone()))
            .collect();
        Ok(MatchSet::new(elements))
    }
}
