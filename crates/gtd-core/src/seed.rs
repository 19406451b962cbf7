//! Sample data for a fresh store

use crate::{EnergyLevel, ItemStatus, NewItem, NewProject, Result, Store};
use chrono::Utc;

/// Populate an empty store with a starter project and a few items
///
/// Returns `false` and leaves the store alone if it already holds data.
pub fn seed_if_empty(store: &mut Store) -> Result<bool> {
    if !store.data().is_empty() {
        return Ok(false);
    }

    let now = Utc::now();
    store.transaction(|data| {
        let project = data.create_project(
            NewProject {
                name: "Learn GTD".into(),
                outcome: Some("Master the art of stress-free productivity".into()),
                status: None,
            },
            now,
        )?;

        let items = [
            NewItem {
                notes: Some("Decide if this is actionable. If yes, what's the next action?".into()),
                contexts: vec!["@computer".into()],
                ..NewItem::new("Process this inbox item")
            },
            NewItem {
                status: Some(ItemStatus::Projects),
                project_id: Some(project.id),
                contexts: vec!["@reading".into(), "@home".into()],
                energy_level: Some(EnergyLevel::Medium),
                time_estimate: Some("2h".into()),
                ..NewItem::new("Read 'Getting Things Done'")
            },
            NewItem {
                status: Some(ItemStatus::Next),
                contexts: vec!["@review".into()],
                notes: Some("Empty head, process inbox, review lists.".into()),
                energy_level: Some(EnergyLevel::High),
                ..NewItem::new("Weekly Review")
            },
            NewItem {
                status: Some(ItemStatus::Next),
                contexts: vec!["@errands".into(), "@store".into()],
                energy_level: Some(EnergyLevel::Low),
                ..NewItem::new("Buy replacement batteries")
            },
        ];
        for item in items {
            data.create_item(item, now)?;
        }
        Ok(())
    })?;

    tracing::info!("seeded store with sample data");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules;
    use crate::store::tests::temp_store;

    #[test]
    fn test_seed_only_when_empty() {
        let (_dir, mut store) = temp_store();
        assert!(seed_if_empty(&mut store).unwrap());
        assert_eq!(store.projects().len(), 1);
        assert_eq!(store.items().len(), 4);

        let projects = store.projects();
        let items = store.items();
        assert!(rules::stuck_projects(&projects, &items).is_empty());

        assert!(!seed_if_empty(&mut store).unwrap());
        assert_eq!(store.items().len(), 4);
    }
}
