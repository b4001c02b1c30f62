//! Material grouping and item search.

use crate::model::item::Item;
use serde::Serialize;
use std::collections::BTreeMap;

/// Label for items without a subcategory.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Items sharing one subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialGroup {
    pub subcategory: String,
    pub total_quantity: u64,
    pub items: Vec<Item>,
}

/// Groups items by subcategory, sorted by subcategory name.
pub fn materials_by_subcategory(items: &[Item]) -> Vec<MaterialGroup> {
    let mut groups: BTreeMap<String, MaterialGroup> = BTreeMap::new();
    for item in items {
        let key = match item.subcategory.trim() {
            "" => UNCATEGORIZED,
            named => named,
        };
        let group = groups
            .entry(key.to_string())
            .or_insert_with(|| MaterialGroup {
                subcategory: key.to_string(),
                total_quantity: 0,
                items: Vec::new(),
            });
        group.total_quantity += u64::from(item.quantity);
        group.items.push(item.clone());
    }
    groups.into_values().collect()
}

/// Case-insensitive keyword match over the descriptive item fields.
///
/// A blank keyword matches every item.
pub fn search_items<'a>(items: &'a [Item], keyword: &str) -> Vec<&'a Item> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| {
            [
                item.name.as_str(),
                item.specification.as_str(),
                item.category.as_str(),
                item.subcategory.as_str(),
                item.description.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}
