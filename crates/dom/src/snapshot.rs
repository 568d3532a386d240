use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tourguide_core_types::ElementId;
use tracing::warn;

use crate::geometry::{Rect, Size};

/// One element of a flattened document, stored in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementNode {
    pub id: ElementId,
    pub tag: String,
    pub dom_id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub value: Option<String>,
    pub parent: Option<usize>,
    pub rect: Option<Rect>,
    pub hidden: bool,
}

impl ElementNode {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match name {
            "id" => self.dom_id.as_deref(),
            "class" => None,
            _ => self.attrs.get(name).map(String::as_str),
        }
    }

    /// Whether the element currently takes part in layout.
    pub fn is_rendered(&self) -> bool {
        !self.hidden && self.rect.is_some()
    }

    /// Text-entry controls are consumed on `change` rather than `mousedown`.
    pub fn is_text_input(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea")
    }
}

/// Nested element description used to author snapshots (scenario files,
/// tests). Flattened into [`ElementNode`]s by [`DocumentSnapshot::from_tree`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSpec {
    pub key: String,
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub value: Option<String>,
    #[serde(default = "default_rect")]
    pub rect: Option<Rect>,
    pub hidden: bool,
    pub children: Vec<ElementSpec>,
}

fn default_rect() -> Option<Rect> {
    Some(Rect::new(0.0, 0.0, 120.0, 32.0))
}

impl ElementSpec {
    pub fn new(key: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
            rect: default_rect(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn at(mut self, rect: Rect) -> Self {
        self.rect = Some(rect);
        self
    }

    pub fn detached(mut self) -> Self {
        self.rect = None;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// Immutable view of the host document at one poll tick.
#[derive(Clone, Debug, Default)]
pub struct DocumentSnapshot {
    url: String,
    viewport: Size,
    elements: Vec<ElementNode>,
    index: HashMap<ElementId, usize>,
}

impl DocumentSnapshot {
    pub fn empty(url: impl Into<String>, viewport: Size) -> Self {
        Self {
            url: url.into(),
            viewport,
            ..Default::default()
        }
    }

    pub fn from_tree(url: impl Into<String>, viewport: Size, roots: Vec<ElementSpec>) -> Self {
        let mut snapshot = Self::empty(url, viewport);
        for root in roots {
            snapshot.flatten(root, None);
        }
        snapshot
    }

    fn flatten(&mut self, spec: ElementSpec, parent: Option<usize>) {
        let position = self.elements.len();
        let mut id = if spec.key.is_empty() {
            ElementId::new(format!("node-{position}"))
        } else {
            ElementId::new(spec.key)
        };
        if self.index.contains_key(&id) {
            let rekeyed = ElementId::new(format!("{}@{position}", id.0));
            warn!(key = %id.0, rekeyed = %rekeyed.0, "duplicate element key");
            id = rekeyed;
        }
        self.index.insert(id.clone(), position);
        self.elements.push(ElementNode {
            id,
            tag: spec.tag.to_ascii_lowercase(),
            dom_id: spec.id,
            classes: spec.classes,
            attrs: spec.attrs,
            text: spec.text,
            value: spec.value,
            parent,
            rect: spec.rect,
            hidden: spec.hidden,
        });
        for child in spec.children {
            self.flatten(child, Some(position));
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[ElementNode] {
        &self.elements
    }

    pub fn node(&self, position: usize) -> Option<&ElementNode> {
        self.elements.get(position)
    }

    pub fn position_of(&self, id: &ElementId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn element(&self, id: &ElementId) -> Option<&ElementNode> {
        self.position_of(id).and_then(|pos| self.elements.get(pos))
    }

    /// Own text of `position` followed by its descendants' text in document
    /// order, as the DOM's `textContent` reads.
    pub fn text_content(&self, position: usize) -> String {
        std::iter::once(position)
            .chain(self.descendants(position))
            .filter_map(|pos| self.elements.get(pos))
            .map(|node| node.text.as_str())
            .collect()
    }

    pub fn ancestors(&self, position: usize) -> Ancestors<'_> {
        let next = self.elements.get(position).and_then(|node| node.parent);
        Ancestors {
            snapshot: self,
            next,
        }
    }

    pub fn is_descendant_of(&self, position: usize, ancestor: usize) -> bool {
        self.ancestors(position).any(|pos| pos == ancestor)
    }

    /// Descendants of `position` in document order. Relies on flattening
    /// being depth-first, so the subtree is a contiguous run.
    pub fn descendants(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        (position + 1..self.elements.len())
            .take_while(move |&pos| self.is_descendant_of(pos, position))
    }
}

pub struct Ancestors<'a> {
    snapshot: &'a DocumentSnapshot,
    next: Option<usize>,
}

impl Iterator for Ancestors<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        self.next = self
            .snapshot
            .elements
            .get(current)
            .and_then(|node| node.parent);
        Some(current)
    }
}
