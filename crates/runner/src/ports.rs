use async_trait::async_trait;
use parking_lot::RwLock;
use tourguide_core_types::GuideError;
use tourguide_dom::DocumentSnapshot;

/// Supplies the document the runner evaluates triggers against.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn snapshot(&self) -> Result<DocumentSnapshot, GuideError>;
}

/// Document replaced wholesale by the host whenever the page changes.
#[derive(Default)]
pub struct SharedDocument {
    current: RwLock<DocumentSnapshot>,
}

impl SharedDocument {
    pub fn new(initial: DocumentSnapshot) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub fn set(&self, snapshot: DocumentSnapshot) {
        *self.current.write() = snapshot;
    }

    pub fn current(&self) -> DocumentSnapshot {
        self.current.read().clone()
    }
}

#[async_trait]
impl DocumentSource for SharedDocument {
    async fn snapshot(&self) -> Result<DocumentSnapshot, GuideError> {
        Ok(self.current())
    }
}
