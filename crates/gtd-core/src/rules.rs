//! Consistency rules for item and project changes
//!
//! The store knows how to persist records. The policies that span records
//! live here: the project deletion cascade, position renumbering and the
//! derivation of each project's next action.
//!
//! A project's next action is the first item filed under it with status
//! `projects`, ordered by `(position, id)`. Items with status `next` are
//! standalone actions and never count as a project's next action.

use crate::store::Data;
use crate::{Error, Item, ItemPatch, ItemStatus, Project, Result, Store};
use serde::Serialize;

/// Outcome of deleting a project
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    /// The removed project, `None` if it did not exist
    pub project: Option<Project>,
    /// Items sent back to the inbox
    pub reset_items: Vec<u64>,
    /// Done items that keep their project reference as history
    pub kept_done: Vec<u64>,
}

/// Delete a project, returning its open items to the inbox first
///
/// Runs as one transaction: either every affected item is reset and the
/// project is gone, or nothing changes and the error lists the items that
/// could not be reset. Deleting an absent project succeeds.
pub fn delete_project(store: &mut Store, project_id: u64) -> Result<CascadeReport> {
    if store.project(project_id).is_none() {
        return Ok(CascadeReport::default());
    }

    let affected: Vec<u64> = store
        .project_items(project_id)
        .iter()
        .filter(|i| !i.status.is_done())
        .map(|i| i.id)
        .collect();

    let report = store
        .transaction(|data| cascade_delete(data, project_id))
        .map_err(|e| {
            tracing::error!(project = project_id, error = %e, "project delete cascade failed");
            Error::CascadeFailed {
                project_id,
                item_ids: affected,
                reason: e.to_string(),
            }
        })?;

    tracing::info!(
        project = project_id,
        reset = report.reset_items.len(),
        kept_done = report.kept_done.len(),
        "deleted project"
    );
    Ok(report)
}

fn cascade_delete(data: &mut Data, project_id: u64) -> Result<CascadeReport> {
    let mut report = CascadeReport::default();

    for item in data
        .items
        .values_mut()
        .filter(|i| i.project_id == Some(project_id))
    {
        if item.status.is_done() {
            report.kept_done.push(item.id);
        } else {
            item.status = ItemStatus::Inbox;
            item.project_id = None;
            report.reset_items.push(item.id);
        }
    }

    report.project = data.remove_project(project_id);
    Ok(report)
}

/// Move an item to another list
///
/// Any status may follow any other. An item filed under `projects` without a
/// project is accepted but stays orphaned: it is nobody's next action.
pub fn set_status(store: &mut Store, item_id: u64, status: ItemStatus) -> Result<Item> {
    let item = store.update_item(item_id, ItemPatch::status(status))?;
    if item.is_orphaned() {
        tracing::debug!(item = item_id, "item filed under projects without a project");
    }
    Ok(item)
}

/// Move an item to `new_index` within its project's list
///
/// The index is clamped to the list length. Every item in the project gets
/// its zero-based index as its new position. Returns the project's items in
/// their new order.
pub fn reorder(
    store: &mut Store,
    project_id: u64,
    item_id: u64,
    new_index: usize,
) -> Result<Vec<Item>> {
    store.transaction(|data| {
        let mut order = project_order(data, project_id)?;
        let from = order
            .iter()
            .position(|&id| id == item_id)
            .ok_or_else(|| not_in_project(data, item_id, project_id))?;

        order.remove(from);
        order.insert(new_index.min(order.len()), item_id);
        renumber(data, &order)
    })
}

/// Apply an explicit ordering to a project's items
///
/// `ids` lists items of the project in their new order. Items of the project
/// that are not listed keep their relative order after the listed ones.
pub fn apply_order(store: &mut Store, project_id: u64, ids: &[u64]) -> Result<Vec<Item>> {
    store.transaction(|data| {
        let current = project_order(data, project_id)?;

        let mut order = Vec::with_capacity(current.len());
        for &id in ids {
            if !current.contains(&id) {
                return Err(not_in_project(data, id, project_id));
            }
            if order.contains(&id) {
                return Err(Error::Validation(format!("Item {id} listed twice")));
            }
            order.push(id);
        }
        order.extend(current.into_iter().filter(|id| !ids.contains(id)));

        renumber(data, &order)
    })
}

/// Move an item to another project, or out of any project with `None`
///
/// The item goes to the end of the destination list (`max position + 1`, or
/// 0 when the list is empty) and the list it left is renumbered from 0.
pub fn move_to_project(store: &mut Store, item_id: u64, destination: Option<u64>) -> Result<Item> {
    store.transaction(|data| {
        let source = data
            .item(item_id)
            .ok_or_else(|| Error::item_not_found(item_id))?
            .project_id;
        if let Some(project_id) = destination {
            data.ensure_project(project_id)?;
        }
        if source == destination {
            return data.item_mut(item_id).map(|item| item.clone());
        }

        let position = match destination {
            Some(project_id) => append_position(data, project_id)?,
            None => 0,
        };

        let item = data.item_mut(item_id)?;
        item.project_id = destination;
        item.position = position;
        let moved = item.clone();

        if let Some(project_id) = source
            && data.project(project_id).is_some()
        {
            let order: Vec<u64> = data.project_items(project_id).iter().map(|i| i.id).collect();
            renumber(data, &order)?;
        }

        Ok(moved)
    })
}

/// Position just past the end of a project's list
///
/// A list whose last position is `i64::MAX` is renumbered from 0 first.
fn append_position(data: &mut Data, project_id: u64) -> Result<i64> {
    let items = data.project_items(project_id);
    let Some(max) = items.iter().map(|i| i.position).max() else {
        return Ok(0);
    };
    if let Some(next) = max.checked_add(1) {
        return Ok(next);
    }

    let order: Vec<u64> = items.iter().map(|i| i.id).collect();
    tracing::debug!(project = project_id, "positions exhausted, renumbering");
    renumber(data, &order)?;
    Ok(order.len() as i64)
}

fn project_order(data: &Data, project_id: u64) -> Result<Vec<u64>> {
    if data.project(project_id).is_none() {
        return Err(Error::project_not_found(project_id));
    }
    Ok(data
        .project_items(project_id)
        .iter()
        .map(|i| i.id)
        .collect())
}

fn not_in_project(data: &Data, item_id: u64, project_id: u64) -> Error {
    if data.item(item_id).is_none() {
        Error::item_not_found(item_id)
    } else {
        Error::Validation(format!("Item {item_id} is not in project {project_id}"))
    }
}

/// Give each listed item its index as position, returning them in order
fn renumber(data: &mut Data, order: &[u64]) -> Result<Vec<Item>> {
    order
        .iter()
        .enumerate()
        .map(|(index, &id)| {
            let item = data.item_mut(id)?;
            item.position = index as i64;
            Ok(item.clone())
        })
        .collect()
}

/// Whether an item can be the next action of its project
pub fn is_next_action_candidate(item: &Item) -> bool {
    item.status == ItemStatus::Projects && item.project_id.is_some()
}

/// The next action of one project
pub fn next_action_for<'a>(project_id: u64, items: &[&'a Item]) -> Option<&'a Item> {
    items
        .iter()
        .filter(|i| is_next_action_candidate(i) && i.project_id == Some(project_id))
        .min_by_key(|i| i.order_key())
        .copied()
}

/// One next action per active project, in project order
pub fn next_actions<'a>(projects: &[&Project], items: &[&'a Item]) -> Vec<&'a Item> {
    projects
        .iter()
        .filter(|p| p.is_active())
        .filter_map(|p| next_action_for(p.id, items))
        .collect()
}

/// Active projects without a next action
pub fn stuck_projects<'a>(projects: &[&'a Project], items: &[&Item]) -> Vec<&'a Project> {
    projects
        .iter()
        .filter(|p| p.is_active() && next_action_for(p.id, items).is_none())
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::temp_store;
    use crate::{NewItem, NewProject, ProjectPatch, ProjectStatus};

    fn project_item(store: &mut Store, title: &str, project_id: u64, position: i64) -> Item {
        let mut new = NewItem::new(title);
        new.project_id = Some(project_id);
        new.status = Some(ItemStatus::Projects);
        new.position = Some(position);
        store.create_item(new).unwrap()
    }

    fn positions(store: &Store, project_id: u64) -> Vec<(String, i64)> {
        store
            .project_items(project_id)
            .iter()
            .map(|i| (i.title.clone(), i.position))
            .collect()
    }

    #[test]
    fn test_delete_project_returns_items_to_inbox() {
        let (_dir, mut store) = temp_store();
        let trip = store.create_project(NewProject::new("Trip")).unwrap();
        assert_eq!(trip.id, 1);
        let flight = project_item(&mut store, "Book flight", trip.id, 0);

        let report = delete_project(&mut store, trip.id).unwrap();

        let flight = store.item(flight.id).unwrap();
        assert_eq!(flight.status, ItemStatus::Inbox);
        assert_eq!(flight.project_id, None);
        assert_eq!(report.reset_items, vec![flight.id]);
        assert!(store.project(trip.id).is_none());
    }

    #[test]
    fn test_delete_project_keeps_done_history() {
        let (_dir, mut store) = temp_store();
        let trip = store.create_project(NewProject::new("Trip")).unwrap();
        let open = project_item(&mut store, "Pack", trip.id, 0);
        let done = project_item(&mut store, "Renew passport", trip.id, 1);
        set_status(&mut store, done.id, ItemStatus::Done).unwrap();
        let mut waiting = NewItem::new("Visa from embassy");
        waiting.project_id = Some(trip.id);
        waiting.status = Some(ItemStatus::Waiting);
        let waiting = store.create_item(waiting).unwrap();

        let report = delete_project(&mut store, trip.id).unwrap();

        assert_eq!(report.kept_done, vec![done.id]);
        assert_eq!(store.item(done.id).unwrap().project_id, Some(trip.id));
        for id in [open.id, waiting.id] {
            let item = store.item(id).unwrap();
            assert_eq!(item.status, ItemStatus::Inbox);
            assert_eq!(item.project_id, None);
        }
        assert!(
            store
                .items()
                .iter()
                .all(|i| i.status.is_done() || i.project_id != Some(trip.id))
        );
    }

    #[test]
    fn test_failed_cascade_leaves_project_and_items() {
        let (dir, mut store) = temp_store();
        let trip = store.create_project(NewProject::new("Trip")).unwrap();
        let flight = project_item(&mut store, "Book flight", trip.id, 0);
        let hotel = project_item(&mut store, "Book hotel", trip.id, 1);

        // A directory in place of the data file makes every write fail
        let data_path = dir.path().join(".gtd/data.json");
        std::fs::remove_file(&data_path).unwrap();
        std::fs::create_dir(&data_path).unwrap();

        let err = delete_project(&mut store, trip.id).unwrap_err();

        match err {
            Error::CascadeFailed {
                project_id,
                item_ids,
                ..
            } => {
                assert_eq!(project_id, trip.id);
                assert_eq!(item_ids, vec![flight.id, hotel.id]);
            }
            other => panic!("expected CascadeFailed, got {other}"),
        }
        assert!(store.project(trip.id).is_some());
        for id in [flight.id, hotel.id] {
            let item = store.item(id).unwrap();
            assert_eq!(item.project_id, Some(trip.id));
            assert_eq!(item.status, ItemStatus::Projects);
        }
    }

    #[test]
    fn test_delete_absent_project_is_noop() {
        let (_dir, mut store) = temp_store();
        let report = delete_project(&mut store, 42).unwrap();
        assert_eq!(report, CascadeReport::default());
    }

    #[test]
    fn test_orphaned_projects_status_is_accepted() {
        let (_dir, mut store) = temp_store();
        let item = store.create_item(NewItem::new("Loose step")).unwrap();

        let item = set_status(&mut store, item.id, ItemStatus::Projects).unwrap();
        assert!(item.is_orphaned());
        assert!(!is_next_action_candidate(&item));
    }

    #[test]
    fn test_reorder_moves_last_to_front() {
        let (_dir, mut store) = temp_store();
        let project = store.create_project(NewProject::new("Move house")).unwrap();
        project_item(&mut store, "A", project.id, 0);
        project_item(&mut store, "B", project.id, 1);
        let c = project_item(&mut store, "C", project.id, 2);

        let ordered = reorder(&mut store, project.id, c.id, 0).unwrap();

        let titles: Vec<_> = ordered.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
        assert_eq!(
            positions(&store, project.id),
            vec![("C".into(), 0), ("A".into(), 1), ("B".into(), 2)]
        );
    }

    #[test]
    fn test_reorder_clamps_index_and_compacts_gaps() {
        let (_dir, mut store) = temp_store();
        let project = store.create_project(NewProject::new("Taxes")).unwrap();
        let a = project_item(&mut store, "A", project.id, 10);
        project_item(&mut store, "B", project.id, 20);
        project_item(&mut store, "C", project.id, 20);

        reorder(&mut store, project.id, a.id, 99).unwrap();
        assert_eq!(
            positions(&store, project.id),
            vec![("B".into(), 0), ("C".into(), 1), ("A".into(), 2)]
        );
    }

    #[test]
    fn test_reorder_rejects_foreign_item() {
        let (_dir, mut store) = temp_store();
        let project = store.create_project(NewProject::new("P")).unwrap();
        let loose = store.create_item(NewItem::new("Elsewhere")).unwrap();

        let err = reorder(&mut store, project.id, loose.id, 0).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = reorder(&mut store, project.id, 999, 0).unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 999, .. }));
        let err = reorder(&mut store, 77, loose.id, 0).unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 77, .. }));
    }

    #[test]
    fn test_apply_order() {
        let (_dir, mut store) = temp_store();
        let project = store.create_project(NewProject::new("P")).unwrap();
        let a = project_item(&mut store, "A", project.id, 0);
        let b = project_item(&mut store, "B", project.id, 1);
        let c = project_item(&mut store, "C", project.id, 2);

        apply_order(&mut store, project.id, &[c.id, a.id]).unwrap();
        assert_eq!(
            positions(&store, project.id),
            vec![("C".into(), 0), ("A".into(), 1), ("B".into(), 2)]
        );

        let err = apply_order(&mut store, project.id, &[b.id, b.id]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_move_across_projects_appends_and_renumbers_source() {
        let (_dir, mut store) = temp_store();
        let home = store.create_project(NewProject::new("Home")).unwrap();
        let work = store.create_project(NewProject::new("Work")).unwrap();
        project_item(&mut store, "H1", home.id, 0);
        let h2 = project_item(&mut store, "H2", home.id, 1);
        project_item(&mut store, "H3", home.id, 2);
        project_item(&mut store, "W1", work.id, 4);

        let moved = move_to_project(&mut store, h2.id, Some(work.id)).unwrap();

        assert_eq!(moved.project_id, Some(work.id));
        assert_eq!(moved.position, 5);
        assert_eq!(
            positions(&store, home.id),
            vec![("H1".into(), 0), ("H3".into(), 1)]
        );
    }

    #[test]
    fn test_move_after_maximum_position_renumbers_destination() {
        let (_dir, mut store) = temp_store();
        let project = store.create_project(NewProject::new("Garage")).unwrap();
        project_item(&mut store, "Last", project.id, i64::MAX);
        project_item(&mut store, "First", project.id, 3);
        let loose = store.create_item(NewItem::new("Sweep")).unwrap();

        let moved = move_to_project(&mut store, loose.id, Some(project.id)).unwrap();

        assert_eq!(moved.position, 2);
        assert_eq!(
            positions(&store, project.id),
            vec![("First".into(), 0), ("Last".into(), 1), ("Sweep".into(), 2)]
        );
    }

    #[test]
    fn test_move_into_empty_project_and_out() {
        let (_dir, mut store) = temp_store();
        let empty = store.create_project(NewProject::new("Empty")).unwrap();
        let mut new = NewItem::new("Loose");
        new.position = Some(7);
        let item = store.create_item(new).unwrap();

        let moved = move_to_project(&mut store, item.id, Some(empty.id)).unwrap();
        assert_eq!(moved.position, 0);

        let unassigned = move_to_project(&mut store, item.id, None).unwrap();
        assert_eq!(unassigned.project_id, None);
        assert_eq!(unassigned.position, 0);

        let err = move_to_project(&mut store, item.id, Some(404)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_next_action_is_lowest_position() {
        let (_dir, mut store) = temp_store();
        let project = store.create_project(NewProject::new("Trip")).unwrap();
        project_item(&mut store, "Second", project.id, 1);
        let first = project_item(&mut store, "First", project.id, 0);
        let mut standalone = NewItem::new("Standalone");
        standalone.project_id = Some(project.id);
        standalone.status = Some(ItemStatus::Next);
        standalone.position = Some(-1);
        store.create_item(standalone).unwrap();

        let items = store.items();
        let next = next_action_for(project.id, &items).unwrap();
        assert_eq!(next.id, first.id);
    }

    #[test]
    fn test_stuck_projects_skip_inactive() {
        let (_dir, mut store) = temp_store();
        let active = store.create_project(NewProject::new("Active")).unwrap();
        let stuck = store.create_project(NewProject::new("Stuck")).unwrap();
        let archived = store.create_project(NewProject::new("Archived")).unwrap();
        store
            .update_project(
                archived.id,
                ProjectPatch {
                    status: Some(ProjectStatus::Archived),
                    ..ProjectPatch::default()
                },
            )
            .unwrap();
        let step = project_item(&mut store, "Step", active.id, 0);

        let projects = store.projects();
        let items = store.items();
        let stuck_ids: Vec<_> = stuck_projects(&projects, &items).iter().map(|p| p.id).collect();
        assert_eq!(stuck_ids, vec![stuck.id]);

        let next: Vec<_> = next_actions(&projects, &items).iter().map(|i| i.id).collect();
        assert_eq!(next, vec![step.id]);
    }
}
