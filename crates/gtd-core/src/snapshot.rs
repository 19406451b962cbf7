//! Full-data export and restore
//!
//! An export is an unfiltered copy of both tables. An import replaces the
//! whole data set inside a single store transaction: if any record fails to
//! restore, the previous data stays in place.

use crate::store::Data;
use crate::{Error, Item, Project, Result, Store};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Portable copy of all projects and items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub projects: Vec<Project>,
    pub items: Vec<Item>,
    pub exported_at: DateTime<Utc>,
}

/// Summary of a completed import
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub projects: usize,
    pub items: usize,
    pub next_project_id: u64,
    pub next_item_id: u64,
}

pub fn export(store: &Store) -> Snapshot {
    Snapshot {
        projects: store.projects().into_iter().cloned().collect(),
        items: store.items().into_iter().cloned().collect(),
        exported_at: Utc::now(),
    }
}

/// Replace all data with the contents of a snapshot
///
/// The body must be an object whose `projects` and `items` are arrays,
/// otherwise it is rejected with [`Error::ImportFormat`] before anything is
/// touched. Records keep their ids and creation times; a missing `createdAt`
/// becomes now. Counters only move forward.
pub fn import(store: &mut Store, snapshot: Value) -> Result<ImportReport> {
    let (projects, items) = split(snapshot)?;
    let now = Utc::now();

    let report = store
        .transaction(|data| restore(data, projects, items, now))
        .map_err(|e| match e {
            Error::ImportFailed(_) => e,
            other => Error::ImportFailed(other.to_string()),
        })
        .inspect_err(|e| tracing::warn!(error = %e, "import rolled back"))?;

    tracing::info!(
        projects = report.projects,
        items = report.items,
        "import completed"
    );
    Ok(report)
}

/// Import a file written by [`export`] or by older versions
pub fn import_file(store: &mut Store, path: &std::path::Path) -> Result<ImportReport> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| Error::ImportFormat(format!("not valid JSON: {e}")))?;
    import(store, value)
}

fn split(snapshot: Value) -> Result<(Vec<Value>, Vec<Value>)> {
    let Value::Object(mut body) = snapshot else {
        return Err(Error::ImportFormat("expected an object".into()));
    };

    let projects = match body.remove("projects") {
        Some(Value::Array(projects)) => projects,
        _ => return Err(Error::ImportFormat("projects must be an array".into())),
    };
    let items = match body.remove("items") {
        Some(Value::Array(items)) => items,
        _ => return Err(Error::ImportFormat("items must be an array".into())),
    };

    Ok((projects, items))
}

fn restore(
    data: &mut Data,
    projects: Vec<Value>,
    items: Vec<Value>,
    now: DateTime<Utc>,
) -> Result<ImportReport> {
    data.clear();

    // Projects first: items refer to them
    let project_count = projects.len();
    for (index, raw) in projects.into_iter().enumerate() {
        let project: Project = decode(raw, now)
            .map_err(|e| Error::ImportFailed(format!("project #{index}: {e}")))?;
        data.restore_project(project)?;
    }

    let item_count = items.len();
    for (index, raw) in items.into_iter().enumerate() {
        let item: Item =
            decode(raw, now).map_err(|e| Error::ImportFailed(format!("item #{index}: {e}")))?;

        // Done items may point at projects deleted before the export
        if let Some(project_id) = item.project_id
            && !item.status.is_done()
            && data.project(project_id).is_none()
        {
            return Err(Error::ImportFailed(format!(
                "item {} references missing project {project_id}",
                item.id
            )));
        }
        data.restore_item(item)?;
    }

    data.advance_counters();

    Ok(ImportReport {
        projects: project_count,
        items: item_count,
        next_project_id: data.next_project_id(),
        next_item_id: data.next_item_id(),
    })
}

/// Decode one record, defaulting a missing `createdAt` to `now`
fn decode<T: DeserializeOwned>(mut raw: Value, now: DateTime<Utc>) -> serde_json::Result<T> {
    if let Some(record) = raw.as_object_mut()
        && record.get("createdAt").is_none_or(Value::is_null)
    {
        record.insert("createdAt".into(), Value::String(now.to_rfc3339()));
    }
    serde_json::from_value(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;
    use crate::store::tests::temp_store;
    use crate::{ItemStatus, NewItem, NewProject};
    use serde_json::json;

    fn populate(store: &mut Store) {
        let trip = store.create_project(NewProject::new("Trip")).unwrap();
        let mut flight = NewItem::new("Book flight");
        flight.project_id = Some(trip.id);
        flight.status = Some(ItemStatus::Projects);
        flight.contexts = vec!["@computer".into()];
        flight.due_datetime = Some(Utc::now());
        flight.start_time = Some("09:00".into());
        store.create_item(flight).unwrap();
        store.create_item(NewItem::new("Inbox thought")).unwrap();
    }

    #[test]
    fn test_round_trip_preserves_everything() {
        let (_dir, mut store) = temp_store();
        populate(&mut store);
        let before_projects: Vec<_> = store.projects().into_iter().cloned().collect();
        let before_items: Vec<_> = store.items().into_iter().cloned().collect();

        let snapshot = serde_json::to_value(export(&store)).unwrap();
        store.create_item(NewItem::new("Added after export")).unwrap();
        import(&mut store, snapshot).unwrap();

        let after_projects: Vec<_> = store.projects().into_iter().cloned().collect();
        let after_items: Vec<_> = store.items().into_iter().cloned().collect();
        assert_eq!(after_projects, before_projects);
        assert_eq!(after_items, before_items);
    }

    #[test]
    fn test_empty_export_clears_store_on_import() {
        let (_dir, mut empty) = temp_store();
        let snapshot = serde_json::to_value(export(&empty)).unwrap();
        assert_eq!(snapshot["projects"], json!([]));
        assert_eq!(snapshot["items"], json!([]));
        assert!(snapshot["exportedAt"].is_string());

        populate(&mut empty);
        let next_item = empty.data().next_item_id();
        import(&mut empty, snapshot).unwrap();

        assert!(empty.data().is_empty());
        assert_eq!(empty.data().next_item_id(), next_item);
    }

    #[test]
    fn test_format_errors_leave_data_alone() {
        let (_dir, mut store) = temp_store();
        populate(&mut store);
        let before = store.data().clone();

        for body in [
            json!({"projects": [], "items": {"id": 1}}),
            json!({"projects": "nope", "items": []}),
            json!({"items": []}),
            json!([1, 2, 3]),
        ] {
            let err = import(&mut store, body).unwrap_err();
            assert!(matches!(err, Error::ImportFormat(_)), "{err}");
        }
        assert_eq!(store.data(), &before);
    }

    #[test]
    fn test_bad_record_rolls_back() {
        let (_dir, mut store) = temp_store();
        populate(&mut store);
        let before = store.data().clone();

        let body = json!({
            "projects": [{"id": 1, "name": "Only"}],
            "items": [
                {"id": 1, "title": "Fine", "projectId": 1, "status": "projects"},
                {"id": 2, "status": "inbox"}
            ]
        });
        let err = import(&mut store, body).unwrap_err();
        assert!(matches!(err, Error::ImportFailed(_)));
        assert_eq!(store.data(), &before);
    }

    #[test]
    fn test_dangling_reference_rolls_back() {
        let (_dir, mut store) = temp_store();
        let before = store.data().clone();

        let body = json!({
            "projects": [],
            "items": [{"id": 3, "title": "Ghost step", "projectId": 8, "status": "projects"}]
        });
        assert!(matches!(
            import(&mut store, body),
            Err(Error::ImportFailed(_))
        ));
        assert_eq!(store.data(), &before);
    }

    #[test]
    fn test_duplicate_ids_roll_back() {
        let (_dir, mut store) = temp_store();
        let body = json!({
            "projects": [{"id": 2, "name": "A"}, {"id": 2, "name": "B"}],
            "items": []
        });
        assert!(matches!(
            import(&mut store, body),
            Err(Error::ImportFailed(_))
        ));
        assert!(store.data().is_empty());
    }

    #[test]
    fn test_new_ids_follow_imported_ids() {
        let (_dir, mut store) = temp_store();
        let body = json!({
            "projects": [{"id": 40, "name": "Imported", "status": "active"}],
            "items": [
                {
                    "id": 17,
                    "title": "Old",
                    "projectId": 40,
                    "status": "projects",
                    "createdAt": "2023-01-05T10:00:00"
                },
                {
                    "id": 90,
                    "title": "Done long ago",
                    "projectId": 12,
                    "status": "done",
                    "dueDatetime": "2023-02-01"
                }
            ],
            "exportedAt": "2023-03-01T00:00:00Z"
        });
        let report = import(&mut store, body).unwrap();
        assert_eq!(report.items, 2);

        let project = store.create_project(NewProject::new("Fresh")).unwrap();
        let item = store.create_item(NewItem::new("Fresh")).unwrap();
        assert!(project.id > 40);
        assert!(item.id > 90);

        let old = store.item(17).unwrap();
        assert_eq!(old.created_at.to_rfc3339(), "2023-01-05T10:00:00+00:00");
        assert!(store.item(90).unwrap().due_datetime.is_some());
    }

    #[test]
    fn test_highest_possible_id_is_never_reissued() {
        let (_dir, mut store) = temp_store();
        let body = json!({
            "projects": [{"id": u64::MAX, "name": "Imported project"}],
            "items": [{"id": u64::MAX, "title": "Imported"}]
        });
        import(&mut store, body).unwrap();

        let err = store.create_item(NewItem::new("Fresh")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = store.create_project(NewProject::new("Fresh")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.item(u64::MAX).unwrap().title, "Imported");
        assert_eq!(store.project(u64::MAX).unwrap().name, "Imported project");
    }

    #[test]
    fn test_round_trip_after_cascade_keeps_done_history() {
        let (_dir, mut store) = temp_store();
        let trip = store.create_project(NewProject::new("Trip")).unwrap();
        let mut done = NewItem::new("Renewed passport");
        done.project_id = Some(trip.id);
        done.status = Some(ItemStatus::Done);
        store.create_item(done).unwrap();
        rules::delete_project(&mut store, trip.id).unwrap();

        let snapshot = serde_json::to_value(export(&store)).unwrap();
        import(&mut store, snapshot).unwrap();
        assert_eq!(store.items()[0].project_id, Some(trip.id));
    }

    #[test]
    fn test_import_file_rejects_non_json() {
        let (dir, mut store) = temp_store();
        let path = dir.path().join("backup.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            import_file(&mut store, &path),
            Err(Error::ImportFormat(_))
        ));
    }
}
