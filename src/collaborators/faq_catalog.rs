//! FAQ catalog contract and an in-memory catalog

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::CollaboratorError;
use crate::value_objects::FaqEntry;

/// Read-only access to the FAQ entries
#[async_trait]
pub trait FaqCatalog: Send + Sync {
    /// All entries in the catalog's natural order. An empty list is not an error.
    async fn list_all(&self) -> Result<Vec<FaqEntry>, CollaboratorError>;
}

/// The entries a new deployment starts with
pub fn default_faqs() -> Vec<FaqEntry> {
    vec![
        FaqEntry::new(
            1,
            "What is your return policy?",
            "You can return any item within 30 days for a full refund.",
        ),
        FaqEntry::new(
            2,
            "What are your business hours?",
            "We are open Monday to Friday, 9am to 6pm.",
        ),
        FaqEntry::new(
            3,
            "Where is your store located?",
            "We're an online-only store, shipping nationwide.",
        ),
    ]
}

/// Catalog kept in memory, in insertion order
#[derive(Debug, Default)]
pub struct InMemoryFaqCatalog {
    entries: RwLock<Vec<FaqEntry>>,
}

impl InMemoryFaqCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<FaqEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Append an entry with the next free id
    pub async fn add(&self, question: impl Into<String>, answer: impl Into<String>) -> FaqEntry {
        let mut entries = self.entries.write().await;
        let id = entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let entry = FaqEntry::new(id, question, answer);
        entries.push(entry.clone());
        entry
    }

    /// Load `defaults` only when the catalog holds nothing. Returns whether it seeded.
    pub async fn seed_if_empty(&self, defaults: Vec<FaqEntry>) -> bool {
        let mut entries = self.entries.write().await;
        if !entries.is_empty() {
            tracing::debug!(count = entries.len(), "FAQ catalog already populated");
            return false;
        }

        tracing::info!(count = defaults.len(), "seeding default FAQs");
        *entries = defaults;
        true
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl FaqCatalog for InMemoryFaqCatalog {
    async fn list_all(&self) -> Result<Vec<FaqEntry>, CollaboratorError> {
        Ok(self.entries.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let catalog = InMemoryFaqCatalog::new();
        assert!(catalog.seed_if_empty(default_faqs()).await);
        assert_eq!(catalog.len().await, 3);

        assert!(!catalog.seed_if_empty(vec![FaqEntry::new(9, "Q", "A")]).await);
        assert_eq!(catalog.list_all().await.unwrap(), default_faqs());
    }

    #[tokio::test]
    async fn test_add_keeps_insertion_order() {
        let catalog = InMemoryFaqCatalog::new();
        catalog.add("First?", "one").await;
        let second = catalog.add("Second?", "two").await;
        assert_eq!(second.id, 2);

        let questions: Vec<String> = catalog
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.question)
            .collect();
        assert_eq!(questions, vec!["First?", "Second?"]);
    }
}
