//! Work item lookup.
//!
//! The dependency engine never owns work items. It asks an [`ItemService`]
//! for effort and status, and resolves each referenced item once per
//! query through an [`ItemTable`]. Items the service cannot produce are
//! flagged and count as zero effort.

use crate::domain::{ItemId, WorkItem, WorkflowState};
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Source of work item data.
///
/// Implementations are expected to be fast and synchronous (in-memory or
/// cached). `Ok(None)` means the item does not exist; `Err` means the
/// lookup itself failed.
pub trait ItemService: Send + Sync {
    /// Look up a single item.
    fn get_item(&self, id: &ItemId) -> Result<Option<WorkItem>>;
}

/// Item service backed by a `HashMap`, preserving insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemService {
    items: HashMap<ItemId, WorkItem>,
    order: Vec<ItemId>,
}

impl InMemoryItemService {
    /// Create an empty service
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item. Returns the previous value.
    pub fn insert(&mut self, item: WorkItem) -> Option<WorkItem> {
        if !self.items.contains_key(&item.id) {
            self.order.push(item.id.clone());
        }
        self.items.insert(item.id.clone(), item)
    }

    /// Remove an item. Edges pointing at it become dangling references.
    pub fn remove(&mut self, id: &ItemId) -> Option<WorkItem> {
        let removed = self.items.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    /// All items in insertion order
    pub fn all(&self) -> impl Iterator<Item = &WorkItem> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the service holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<WorkItem> for InMemoryItemService {
    fn from_iter<I: IntoIterator<Item = WorkItem>>(iter: I) -> Self {
        let mut service = Self::new();
        for item in iter {
            service.insert(item);
        }
        service
    }
}

impl ItemService for InMemoryItemService {
    fn get_item(&self, id: &ItemId) -> Result<Option<WorkItem>> {
        Ok(self.items.get(id).cloned())
    }
}

/// Why an item's data is missing from a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemFlag {
    /// The item service has no such item
    Unknown,

    /// The item service returned an error
    LookupFailed {
        /// Error text from the service
        message: String,
    },
}

impl fmt::Display for ItemFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown item"),
            Self::LookupFailed { message } => write!(f, "lookup failed: {message}"),
        }
    }
}

/// A flagged item, as listed in report summaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedItem {
    /// Item reference
    pub id: ItemId,

    /// What went wrong
    pub flag: ItemFlag,
}

/// Item data as seen by one computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedItem {
    /// Title, if the item was found
    pub title: Option<String>,

    /// Effort used for scheduling (zero when flagged)
    pub effort: u32,

    /// Status, if the item was found
    pub status: Option<WorkflowState>,

    /// Set when the lookup did not produce an item
    pub flag: Option<ItemFlag>,
}

impl ResolvedItem {
    fn found(item: WorkItem) -> Self {
        Self {
            title: Some(item.title),
            effort: item.estimated_effort,
            status: Some(item.status),
            flag: None,
        }
    }

    fn flagged(flag: ItemFlag) -> Self {
        Self {
            title: None,
            effort: 0,
            status: None,
            flag: Some(flag),
        }
    }
}

/// Per-call cache of resolved items.
///
/// Built once per query from the items a computation touches, so the item
/// service is consulted at most once per item.
#[derive(Debug, Clone, Default)]
pub struct ItemTable {
    resolved: HashMap<ItemId, ResolvedItem>,
    flagged: Vec<FlaggedItem>,
}

impl ItemTable {
    /// Resolve every id through `service`, logging unknown items.
    pub fn resolve<'a, I>(service: &dyn ItemService, ids: I) -> Self
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        let mut table = Self::default();
        for id in ids {
            if table.resolved.contains_key(id) {
                continue;
            }

            let resolved = match service.get_item(id) {
                Ok(Some(item)) => ResolvedItem::found(item),
                Ok(None) => {
                    tracing::warn!(item = %id, "Unknown work item; counting effort as 0");
                    ResolvedItem::flagged(ItemFlag::Unknown)
                }
                Err(e) => {
                    tracing::warn!(item = %id, error = %e, "Item lookup failed; counting effort as 0");
                    ResolvedItem::flagged(ItemFlag::LookupFailed {
                        message: e.to_string(),
                    })
                }
            };

            if let Some(flag) = &resolved.flag {
                table.flagged.push(FlaggedItem {
                    id: id.clone(),
                    flag: flag.clone(),
                });
            }
            table.resolved.insert(id.clone(), resolved);
        }
        table
    }

    /// Resolved data for `id`, if it was part of the resolution set
    pub fn get(&self, id: &ItemId) -> Option<&ResolvedItem> {
        self.resolved.get(id)
    }

    /// Effort for `id`; zero for unresolved or flagged items
    pub fn effort(&self, id: &ItemId) -> u32 {
        self.resolved.get(id).map_or(0, |item| item.effort)
    }

    /// Status for `id`, if known
    pub fn status(&self, id: &ItemId) -> Option<WorkflowState> {
        self.resolved.get(id).and_then(|item| item.status)
    }

    /// Items whose lookup did not produce data, in resolution order
    pub fn flagged(&self) -> &[FlaggedItem] {
        &self.flagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct FailingService;

    impl ItemService for FailingService {
        fn get_item(&self, id: &ItemId) -> Result<Option<WorkItem>> {
            Err(Error::Lookup {
                id: id.clone(),
                message: "backend offline".to_string(),
            })
        }
    }

    #[test]
    fn test_in_memory_service_preserves_order() {
        let service: InMemoryItemService = [
            WorkItem::new("b", "B", 1),
            WorkItem::new("a", "A", 2),
            WorkItem::new("b", "B again", 3),
        ]
        .into_iter()
        .collect();

        let ids: Vec<_> = service.all().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(service.len(), 2);
        assert_eq!(
            service.get_item(&ItemId::new("b")).unwrap().unwrap().title,
            "B again"
        );
    }

    #[test]
    fn test_remove_item() {
        let mut service = InMemoryItemService::new();
        service.insert(WorkItem::new("a", "A", 1));
        assert!(service.remove(&ItemId::new("a")).is_some());
        assert!(service.is_empty());
        assert!(service.get_item(&ItemId::new("a")).unwrap().is_none());
    }

    #[test]
    fn test_table_flags_unknown_items() {
        let service: InMemoryItemService = [WorkItem::new("a", "A", 5)].into_iter().collect();
        let ids = [ItemId::new("a"), ItemId::new("ghost"), ItemId::new("a")];
        let table = ItemTable::resolve(&service, &ids);

        assert_eq!(table.effort(&ItemId::new("a")), 5);
        assert_eq!(table.effort(&ItemId::new("ghost")), 0);
        assert_eq!(table.flagged().len(), 1);
        assert_eq!(table.flagged()[0].flag, ItemFlag::Unknown);
        assert_eq!(table.status(&ItemId::new("ghost")), None);
    }

    #[test]
    fn test_table_flags_failed_lookups() {
        let ids = [ItemId::new("x")];
        let table = ItemTable::resolve(&FailingService, &ids);

        assert_eq!(table.effort(&ItemId::new("x")), 0);
        match &table.flagged()[0].flag {
            ItemFlag::LookupFailed { message } => assert!(message.contains("backend offline")),
            other => panic!("unexpected flag: {other:?}"),
        }
    }
}
