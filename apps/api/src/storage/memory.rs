use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::user::{User, UserKey};
use crate::patch::assembler::Patch;
use crate::patch::path::{AttrPath, Segment};
use crate::storage::{StorageError, UserStore};

/// In-memory [`UserStore`] that applies patches structurally over the
/// marshalled record. Stands in for DynamoDB in tests and demonstrates the
/// patch contract against a store with no attribute-name restrictions: the
/// clause structure and positional semantics hold, the placeholder layer is
/// just resolved inline.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn fetch_by_key(&self, key: &UserKey) -> Result<User, StorageError> {
        let records = lock_records(&self.records)?;
        let record = records
            .get(&key.user_id)
            .ok_or_else(|| StorageError::NotFound(key.user_id.clone()))?;
        serde_json::from_value(record.clone()).map_err(|err| StorageError::Marshal(err.to_string()))
    }

    async fn create(&self, user: &User) -> Result<(), StorageError> {
        let record =
            serde_json::to_value(user).map_err(|err| StorageError::Marshal(err.to_string()))?;
        let mut records = lock_records(&self.records)?;
        records.insert(user.user_id.clone(), record);
        Ok(())
    }

    async fn apply_patch(&self, key: &UserKey, patch: &Patch) -> Result<(), StorageError> {
        let mut records = lock_records(&self.records)?;
        let record = records
            .get_mut(&key.user_id)
            .ok_or_else(|| StorageError::NotFound(key.user_id.clone()))?;

        for op in &patch.set_ops {
            let path = resolve_path(patch, &op.name)?;
            let value = resolve_value(patch, &op.value)?;
            apply_set(record, &path, value)?;
        }
        // Removes collapse the list, shifting later indices; applying them
        // back-to-front keeps every emitted index valid.
        for op in patch.remove_ops.iter().rev() {
            let path = resolve_path(patch, &op.name)?;
            apply_remove(record, &path)?;
        }
        for op in &patch.add_ops {
            let path = resolve_path(patch, &op.name)?;
            let value = resolve_value(patch, &op.value)?;
            apply_add(record, &path, value)?;
        }
        Ok(())
    }

    async fn delete(&self, key: &UserKey) -> Result<(), StorageError> {
        let mut records = lock_records(&self.records)?;
        records.remove(&key.user_id);
        Ok(())
    }
}

fn lock_records(
    records: &Mutex<HashMap<String, Value>>,
) -> Result<std::sync::MutexGuard<'_, HashMap<String, Value>>, StorageError> {
    records
        .lock()
        .map_err(|_| StorageError::Request("store mutex poisoned".to_string()))
}

fn resolve_path(patch: &Patch, token: &str) -> Result<AttrPath, StorageError> {
    let raw = patch.names.get(token).ok_or_else(|| {
        StorageError::Marshal(format!("patch references unknown name token '{token}'"))
    })?;
    AttrPath::parse(raw).map_err(|err| StorageError::Marshal(err.to_string()))
}

fn resolve_value(patch: &Patch, token: &str) -> Result<Value, StorageError> {
    patch.values.get(token).cloned().ok_or_else(|| {
        StorageError::Marshal(format!("patch references unknown value token '{token}'"))
    })
}

fn navigate<'a>(record: &'a mut Value, segments: &[Segment]) -> Result<&'a mut Value, StorageError> {
    let mut node = record;
    for segment in segments {
        node = match segment {
            Segment::Attr(name) => node
                .get_mut(name.as_str())
                .ok_or_else(|| StorageError::Request(format!("missing attribute '{name}'")))?,
            Segment::Index(idx) => node
                .get_mut(*idx)
                .ok_or_else(|| StorageError::Request(format!("missing list index {idx}")))?,
        };
    }
    Ok(node)
}

fn apply_set(record: &mut Value, path: &AttrPath, value: Value) -> Result<(), StorageError> {
    let (last, head) = path
        .segments()
        .split_last()
        .ok_or_else(|| StorageError::Request("empty set path".to_string()))?;
    let parent = navigate(record, head)?;
    match last {
        Segment::Attr(name) => {
            let fields = parent.as_object_mut().ok_or_else(|| {
                StorageError::Request(format!("'{path}' does not address an object field"))
            })?;
            fields.insert(name.clone(), value);
        }
        Segment::Index(idx) => {
            let items = parent.as_array_mut().ok_or_else(|| {
                StorageError::Request(format!("'{path}' does not address a list element"))
            })?;
            if *idx >= items.len() {
                return Err(StorageError::Request(format!(
                    "set index {idx} out of bounds at '{path}'"
                )));
            }
            items[*idx] = value;
        }
    }
    Ok(())
}

fn apply_remove(record: &mut Value, path: &AttrPath) -> Result<(), StorageError> {
    let (last, head) = path
        .segments()
        .split_last()
        .ok_or_else(|| StorageError::Request("empty remove path".to_string()))?;
    let parent = navigate(record, head)?;
    match last {
        Segment::Attr(name) => {
            let fields = parent.as_object_mut().ok_or_else(|| {
                StorageError::Request(format!("'{path}' does not address an object field"))
            })?;
            fields.remove(name);
        }
        Segment::Index(idx) => {
            let items = parent.as_array_mut().ok_or_else(|| {
                StorageError::Request(format!("'{path}' does not address a list element"))
            })?;
            if *idx >= items.len() {
                return Err(StorageError::Request(format!(
                    "remove index {idx} out of bounds at '{path}'"
                )));
            }
            items.remove(*idx);
        }
    }
    Ok(())
}

/// Applies an Add as a true list append: the addressed index must equal the
/// list's current length. The list attribute is created on first append,
/// since empty collections are omitted from the marshalled record.
fn apply_add(record: &mut Value, path: &AttrPath, value: Value) -> Result<(), StorageError> {
    let Some((Segment::Index(idx), head)) = path.segments().split_last() else {
        return Err(StorageError::Request(format!(
            "add operation at '{path}' is not index-addressed"
        )));
    };
    let (list_attr, grandparents) = head
        .split_last()
        .ok_or_else(|| StorageError::Request(format!("add at '{path}' has no parent list")))?;
    let Segment::Attr(name) = list_attr else {
        return Err(StorageError::Request(format!(
            "add at '{path}' does not extend a named list"
        )));
    };
    let parent = navigate(record, grandparents)?;
    let fields = parent.as_object_mut().ok_or_else(|| {
        StorageError::Request(format!("'{path}' does not address an object field"))
    })?;
    let items = fields
        .entry(name.clone())
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| StorageError::Request(format!("'{name}' is not a list")))?;
    if *idx != items.len() {
        return Err(StorageError::Request(format!(
            "append index {idx} does not match list length {} at '{path}'",
            items.len()
        )));
    }
    items.push(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{Certification, Degree, Experience, Skill};
    use crate::patch::assembler::compile_patch;
    use chrono::{TimeZone, Utc};

    fn sample_user() -> User {
        User {
            user_id: "user1".to_string(),
            email: "user@domain.com".to_string(),
            certifications: vec![Certification {
                name: "Some Cert".to_string(),
                date_achieved: "10-28-2019".to_string(),
                badge_link: "https://example.com".to_string(),
                date_expires: "10-28-2022".to_string(),
            }],
            degrees: vec![Degree {
                degree: "BS".to_string(),
                major: "CS".to_string(),
                school: "University".to_string(),
                start_year: 2017,
                end_year: Some(2021),
            }],
            experience: vec![Experience {
                company: "Co".to_string(),
                job_title: "SRE".to_string(),
                start_month: "May".to_string(),
                start_year: 2020,
                end_month: Some("June".to_string()),
                end_year: Some(2020),
                responsibilities: vec!["foo".to_string(), "bar".to_string()],
            }],
            github: "https://github.com/user".to_string(),
            given_name: "John".to_string(),
            last_updated: None,
            location: "Place, State".to_string(),
            linkedin: "https://www.linkedin.com/in/user".to_string(),
            phone_number: "999-999-9999".to_string(),
            skills: vec![Skill {
                name: "Go".to_string(),
                years_of_experience: Some(2),
            }],
            summary: "My awesome summary".to_string(),
            sur_name: "Doe".to_string(),
        }
    }

    async fn patched(current: User, proposed: &User) -> User {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let store = MemoryStore::new();
        store.create(&current).await.unwrap();
        let key = UserKey {
            user_id: current.user_id.clone(),
        };
        let patch = compile_patch(&current, proposed, now).unwrap();
        store.apply_patch(&key, &patch).await.unwrap();
        store.fetch_by_key(&key).await.unwrap()
    }

    fn assert_matches_proposed(mut applied: User, proposed: &User) {
        assert!(applied.last_updated.is_some());
        applied.last_updated = proposed.last_updated;
        assert_eq!(&applied, proposed);
    }

    #[tokio::test]
    async fn test_create_then_fetch_round_trips() {
        let store = MemoryStore::new();
        let user = sample_user();
        store.create(&user).await.unwrap();
        let fetched = store
            .fetch_by_key(&UserKey {
                user_id: "user1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn test_fetch_missing_key_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .fetch_by_key(&UserKey {
                user_id: "ghost".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_patch_against_missing_record_fails() {
        let store = MemoryStore::new();
        let user = sample_user();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let patch = compile_patch(&user, &user, now).unwrap();
        let err = store
            .apply_patch(
                &UserKey {
                    user_id: "ghost".to_string(),
                },
                &patch,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_scalar_patch_applies() {
        let current = sample_user();
        let mut proposed = current.clone();
        proposed.summary = "Updated summary".to_string();
        proposed.given_name = "Jane".to_string();

        let applied = patched(current, &proposed).await;
        assert_matches_proposed(applied, &proposed);
    }

    #[tokio::test]
    async fn test_collection_growth_patch_applies() {
        let current = sample_user();
        let mut proposed = current.clone();
        proposed.certifications.push(Certification {
            name: "B".to_string(),
            date_achieved: "01-01-2024".to_string(),
            ..Certification::default()
        });
        proposed.skills.push(Skill {
            name: "Rust".to_string(),
            years_of_experience: Some(1),
        });

        let applied = patched(current, &proposed).await;
        assert_matches_proposed(applied, &proposed);
    }

    #[tokio::test]
    async fn test_collection_shrink_patch_applies() {
        let mut current = sample_user();
        current.skills.push(Skill {
            name: "Rust".to_string(),
            years_of_experience: None,
        });
        current.skills.push(Skill {
            name: "Python".to_string(),
            years_of_experience: Some(5),
        });
        let mut proposed = current.clone();
        proposed.skills.truncate(1);
        proposed.certifications.clear();

        let applied = patched(current, &proposed).await;
        assert_matches_proposed(applied, &proposed);
    }

    #[tokio::test]
    async fn test_nested_responsibility_patch_applies() {
        let current = sample_user();
        let mut proposed = current.clone();
        proposed.experience[0].responsibilities =
            vec!["foo".to_string(), "rewritten".to_string(), "baz".to_string()];

        let applied = patched(current, &proposed).await;
        assert_matches_proposed(applied, &proposed);
    }

    #[tokio::test]
    async fn test_append_to_previously_empty_collection() {
        let mut current = sample_user();
        current.degrees.clear();
        let mut proposed = current.clone();
        proposed.degrees.push(Degree {
            degree: "MS".to_string(),
            major: "CS".to_string(),
            school: "University".to_string(),
            start_year: 2022,
            end_year: None,
        });

        let applied = patched(current, &proposed).await;
        assert_matches_proposed(applied, &proposed);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        let user = sample_user();
        store.create(&user).await.unwrap();
        let key = UserKey {
            user_id: "user1".to_string(),
        };
        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(store.fetch_by_key(&key).await.is_err());
    }
}
