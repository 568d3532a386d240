use serde::{Deserialize, Serialize};
use tourguide_core_types::{Predicate, StepPosition};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourOptions {
    /// Whether the user may abandon the tour before its last step.
    pub skip_enabled: bool,
    /// Page path the tour belongs to; empty when the tour is not url-bound.
    pub url: String,
}

impl TourOptions {
    pub fn new(skip_enabled: bool, url: impl Into<String>) -> Self {
        Self {
            skip_enabled,
            url: url.into(),
        }
    }

    /// Compare against the path component of `current`, ignoring query and
    /// fragment. Absolute urls and bare paths are both accepted.
    pub fn url_matches(&self, current: &str) -> bool {
        if self.url.is_empty() {
            return false;
        }
        path_of(current) == path_of(&self.url)
    }
}

fn path_of(raw: &str) -> String {
    if let Ok(parsed) = url::Url::parse(raw) {
        return parsed.path().to_string();
    }
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let path = &raw[..end];
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TourStep {
    #[serde(default)]
    pub trigger: Predicate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_trigger: Option<Predicate>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub position: StepPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl TourStep {
    pub fn new(trigger: impl Into<String>) -> Self {
        Self {
            trigger: Predicate::new(trigger),
            ..Default::default()
        }
    }

    pub fn with_extra_trigger(mut self, extra: impl Into<String>) -> Self {
        self.extra_trigger = Some(Predicate::new(extra));
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_position(mut self, position: StepPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }
}

/// A registered tour. Shared as `Arc<TourDefinition>` and never mutated;
/// re-registration swaps the whole value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TourDefinition {
    pub name: String,
    #[serde(default)]
    pub options: TourOptions,
    #[serde(default)]
    pub steps: Vec<TourStep>,
}

impl TourDefinition {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&TourStep> {
        self.steps.get(index)
    }
}
