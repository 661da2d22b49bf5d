use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::logging;
use crate::storage::{Storage, KEY_KNOWLEDGE_BASE};

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub date_added: DateTime<Utc>,
}

/// Partial update for a knowledge item; unset fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeItemPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

/// Flat list of titled text snippets, searched by keyword both from the
/// knowledge view and by the response generator.
pub struct KnowledgeStore {
    storage: Arc<Storage>,
    items: Vec<KnowledgeItem>,
}

impl KnowledgeStore {
    pub fn load(storage: Arc<Storage>) -> Self {
        let items = storage.load(KEY_KNOWLEDGE_BASE, Vec::new());
        Self { storage, items }
    }

    pub fn items(&self) -> &[KnowledgeItem] {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&KnowledgeItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn add(&mut self, title: &str, content: &str, category: Option<&str>) -> Result<KnowledgeItem> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(Error::Validation(
                "Title and content are required".to_string(),
            ));
        }

        let item = KnowledgeItem {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            category: normalize_category(category),
            date_added: Utc::now(),
        };

        logging::log_knowledge(&format!("item added: {}", item.title));
        self.items.push(item.clone());
        self.persist();
        Ok(item)
    }

    pub fn update(&mut self, id: &str, patch: KnowledgeItemPatch) -> Result<()> {
        // Reject bad field values before touching the item
        if matches!(&patch.title, Some(t) if t.trim().is_empty())
            || matches!(&patch.content, Some(c) if c.trim().is_empty())
        {
            return Err(Error::Validation(
                "Title and content are required".to_string(),
            ));
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::KnowledgeItemNotFound(id.to_string()))?;

        if let Some(title) = patch.title {
            item.title = title;
        }
        if let Some(content) = patch.content {
            item.content = content;
        }
        if let Some(category) = patch.category {
            item.category = normalize_category(Some(&category));
        }

        logging::log_knowledge(&format!("item updated: {}", item.title));
        self.persist();
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() == before {
            return Err(Error::KnowledgeItemNotFound(id.to_string()));
        }

        logging::log_knowledge(&format!("item deleted: {}", id));
        self.persist();
        Ok(())
    }

    /// Case-insensitive substring filter over title, content, and category.
    pub fn search(&self, query: &str) -> Vec<&KnowledgeItem> {
        let query = query.to_lowercase();
        self.items
            .iter()
            .filter(|item| {
                item.title.to_lowercase().contains(&query)
                    || item.content.to_lowercase().contains(&query)
                    || item.category.to_lowercase().contains(&query)
            })
            .collect()
    }

    fn persist(&self) {
        self.storage.save_best_effort(KEY_KNOWLEDGE_BASE, &self.items);
    }
}

fn normalize_category(category: Option<&str>) -> String {
    match category {
        Some(c) if !c.trim().is_empty() => c.to_string(),
        _ => DEFAULT_CATEGORY.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> KnowledgeStore {
        KnowledgeStore::load(Arc::new(Storage::open_in_memory().unwrap()))
    }

    #[test]
    fn blank_category_defaults_to_general() {
        let mut store = store();
        let a = store.add("Pricing", "Our plan costs $10/mo", None).unwrap();
        let b = store.add("Hours", "Open 9-5", Some("  ")).unwrap();
        let c = store.add("Support", "Email us", Some("Contact")).unwrap();

        assert_eq!(a.category, DEFAULT_CATEGORY);
        assert_eq!(b.category, DEFAULT_CATEGORY);
        assert_eq!(c.category, "Contact");
    }

    #[test]
    fn blank_title_or_content_is_rejected() {
        let mut store = store();
        assert!(matches!(
            store.add("", "content", None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            store.add("title", "   ", None),
            Err(Error::Validation(_))
        ));
        assert!(store.items().is_empty());
    }

    #[test]
    fn update_applies_only_given_fields() {
        let mut store = store();
        let item = store.add("Pricing", "Our plan costs $10/mo", None).unwrap();

        store
            .update(
                &item.id,
                KnowledgeItemPatch {
                    content: Some("Our plan costs $12/mo".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let updated = store.item(&item.id).unwrap();
        assert_eq!(updated.title, "Pricing");
        assert_eq!(updated.content, "Our plan costs $12/mo");
        assert_eq!(updated.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn update_with_blank_title_leaves_item_unchanged() {
        let mut store = store();
        let item = store.add("Pricing", "Our plan costs $10/mo", None).unwrap();

        let err = store
            .update(
                &item.id,
                KnowledgeItemPatch {
                    title: Some("".to_string()),
                    content: Some("changed".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.item(&item.id).unwrap().content, "Our plan costs $10/mo");
    }

    #[test]
    fn unknown_ids_report_not_found() {
        let mut store = store();
        assert!(matches!(
            store.update("missing", KnowledgeItemPatch::default()),
            Err(Error::KnowledgeItemNotFound(_))
        ));
        assert!(matches!(
            store.delete("missing"),
            Err(Error::KnowledgeItemNotFound(_))
        ));
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let mut store = store();
        store.add("Pricing", "Our plan costs $10/mo", None).unwrap();
        store.add("Travel policy", "Fly economy", Some("HR")).unwrap();

        assert_eq!(store.search("PRICING").len(), 1);
        assert_eq!(store.search("economy").len(), 1);
        assert_eq!(store.search("hr").len(), 1);
        assert_eq!(store.search("").len(), 2);
        assert!(store.search("nothing here").is_empty());
    }

    #[test]
    fn items_survive_reload_from_storage() {
        let storage = Arc::new(Storage::open_in_memory().unwrap());
        {
            let mut store = KnowledgeStore::load(storage.clone());
            store.add("Pricing", "Our plan costs $10/mo", None).unwrap();
        }

        let store = KnowledgeStore::load(storage);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].title, "Pricing");
    }
}
