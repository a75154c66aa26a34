use serde_json::Value;

use crate::error::Result;
use crate::store::RecordStore;
use crate::types::Category;

/// Appends every record under a deprecated category to its replacement and
/// deletes the old key. Returns whether anything moved.
///
/// The replacement list is written before the old key is removed, so a
/// failed write leaves both lists as they were.
pub fn merge_deprecated_categories(store: &dyn RecordStore) -> Result<bool> {
    let mut merged = false;

    for old in Category::ALL {
        let Some(new) = old.replacement() else {
            continue;
        };
        let Some(old_value) = store.get(old.record_key())? else {
            continue;
        };

        let moved = into_list(old_value, old);
        if !moved.is_empty() {
            let mut target = match store.get(new.record_key())? {
                Some(value) => into_list(value, new),
                None => Vec::new(),
            };
            let count = moved.len();
            target.extend(moved);
            store.set(new.record_key(), &Value::Array(target))?;
            tracing::info!("merged {count} characters from {old} into {new}");
        }

        store.remove(old.record_key())?;
        merged = true;
    }

    Ok(merged)
}

fn into_list(value: Value, category: Category) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            tracing::warn!("{category} list is not an array ({other}), ignoring it");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_merge_moves_records_and_deletes_old_key() {
        let store = MemoryStore::default();
        store
            .set(
                Category::MainAntagonist.record_key(),
                &json!([{"id": "boss"}, {"id": "lieutenant"}]),
            )
            .unwrap();
        store
            .set(Category::Enemies.record_key(), &json!([{"id": "grunt"}]))
            .unwrap();

        assert!(merge_deprecated_categories(&store).unwrap());

        assert_eq!(store.get(Category::MainAntagonist.record_key()).unwrap(), None);
        assert_eq!(
            store.get(Category::Enemies.record_key()).unwrap(),
            Some(json!([{"id": "grunt"}, {"id": "boss"}, {"id": "lieutenant"}]))
        );
    }

    #[test]
    fn test_merge_without_existing_target() {
        let store = MemoryStore::default();
        store
            .set(Category::MainAntagonist.record_key(), &json!([{"id": "boss"}]))
            .unwrap();

        merge_deprecated_categories(&store).unwrap();
        assert_eq!(
            store.get(Category::Enemies.record_key()).unwrap(),
            Some(json!([{"id": "boss"}]))
        );
    }

    #[test]
    fn test_merge_noop_when_nothing_deprecated() {
        let store = MemoryStore::default();
        store
            .set(Category::Enemies.record_key(), &json!([{"id": "grunt"}]))
            .unwrap();

        assert!(!merge_deprecated_categories(&store).unwrap());
        assert_eq!(
            store.get(Category::Enemies.record_key()).unwrap(),
            Some(json!([{"id": "grunt"}]))
        );
    }

    #[test]
    fn test_merge_capacity_failure_keeps_old_key() {
        let store = MemoryStore::new(90);
        store
            .set(Category::MainAntagonist.record_key(), &json!([{"id": "boss"}]))
            .unwrap();
        store
            .set(Category::Enemies.record_key(), &json!([{"id": "grunt"}]))
            .unwrap();

        let result = merge_deprecated_categories(&store);
        assert!(matches!(result, Err(Error::CapacityExceeded)));
        assert_eq!(
            store.get(Category::MainAntagonist.record_key()).unwrap(),
            Some(json!([{"id": "boss"}]))
        );
        assert_eq!(
            store.get(Category::Enemies.record_key()).unwrap(),
            Some(json!([{"id": "grunt"}]))
        );
    }
}
