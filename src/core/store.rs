//! Holds the export of the most recently completed batch.

use crate::core::models::Artifact;
use parking_lot::RwLock;
use std::sync::Arc;

/// Single-slot, last-write-wins holder for the latest [`Artifact`].
///
/// Only one batch's export is retrievable at a time: a new batch replaces
/// the previous export wholesale. Readers get a shared handle to whichever
/// artifact was current when they asked, never a mix of two batches.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    slot: RwLock<Option<Arc<Artifact>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `artifact` and returns the one it replaced.
    pub fn replace(&self, artifact: Artifact) -> Option<Arc<Artifact>> {
        let artifact = Arc::new(artifact);
        let previous = self.slot.write().replace(artifact);
        tracing::debug!(target: "service", "Artifact replaced (had previous: {}).", previous.is_some());
        previous
    }

    /// The current artifact, or `None` if no batch has completed yet.
    pub fn latest(&self) -> Option<Arc<Artifact>> {
        self.slot.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(emails: &[&str]) -> Artifact {
        Artifact::from_emails(emails.iter().copied(), "valid_emails.csv").unwrap()
    }

    #[test]
    fn test_empty_until_first_replace() {
        let store = ArtifactStore::new();
        assert!(store.latest().is_none());
        assert!(store.replace(artifact(&["a@gmail.com"])).is_none());
        assert_eq!(store.latest().unwrap().emails(), vec!["a@gmail.com"]);
    }

    #[test]
    fn test_last_write_wins() {
        let store = ArtifactStore::new();
        store.replace(artifact(&["a@gmail.com"]));
        let held = store.latest().unwrap();

        let previous = store.replace(artifact(&["b@yahoo.com"])).unwrap();
        assert_eq!(previous.emails(), vec!["a@gmail.com"]);
        assert_eq!(store.latest().unwrap().emails(), vec!["b@yahoo.com"]);
        // A reader that grabbed the old artifact keeps a consistent copy.
        assert_eq!(held.emails(), vec!["a@gmail.com"]);
    }
}
