//! Derived lists over the record store
//!
//! Read-only views used by the review and the engage lists. Nothing here
//! mutates records.

use crate::rules::{next_actions, stuck_projects};
use crate::{Item, ItemStatus, Project};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Group label for actions without a context tag
pub const NO_CONTEXT: &str = "No Context";

/// Items with the given status, keeping input order
pub fn by_status<'a>(items: &[&'a Item], status: ItemStatus) -> Vec<&'a Item> {
    items.iter().filter(|i| i.status == status).copied().collect()
}

/// Items filed under `projects` without a project
pub fn orphaned<'a>(items: &[&'a Item]) -> Vec<&'a Item> {
    items.iter().filter(|i| i.is_orphaned()).copied().collect()
}

/// Everything that can be worked on now: each active project's next
/// action, then the standalone `next` items
pub fn engage_list<'a>(projects: &[&Project], items: &[&'a Item]) -> Vec<&'a Item> {
    let mut list = next_actions(projects, items);
    list.extend(by_status(items, ItemStatus::Next));
    list
}

/// Calendar ("hard landscape") items, by due time then start time
pub fn calendar<'a>(items: &[&'a Item]) -> Vec<&'a Item> {
    let mut dated: Vec<_> = items.iter().filter(|i| i.is_calendar()).copied().collect();
    dated.sort_by(|a, b| {
        a.due_datetime
            .cmp(&b.due_datetime)
            .then_with(|| {
                a.start_time
                    .as_deref()
                    .unwrap_or("")
                    .cmp(b.start_time.as_deref().unwrap_or(""))
            })
            .then_with(|| a.id.cmp(&b.id))
    });
    dated
}

/// Open calendar items due before `now + days`, overdue ones included
pub fn due_within<'a>(items: &[&'a Item], now: DateTime<Utc>, days: u32) -> Vec<&'a Item> {
    let horizon = now + Duration::days(i64::from(days));
    calendar(items)
        .into_iter()
        .filter(|i| i.status.is_open() && i.due_datetime.is_some_and(|due| due < horizon))
        .collect()
}

/// Actions grouped by their first context
#[derive(Debug, Clone, Serialize)]
pub struct ContextGroup<'a> {
    pub context: String,
    pub items: Vec<&'a Item>,
}

/// Group items by first context tag, alphabetically, with
/// [`NO_CONTEXT`] last
pub fn group_by_context<'a>(items: &[&'a Item]) -> Vec<ContextGroup<'a>> {
    let mut tagged: BTreeMap<&str, Vec<&'a Item>> = BTreeMap::new();
    let mut untagged = Vec::new();

    for &item in items {
        match item.primary_context() {
            Some(context) => tagged.entry(context).or_default().push(item),
            None => untagged.push(item),
        }
    }

    let mut groups: Vec<_> = tagged
        .into_iter()
        .map(|(context, items)| ContextGroup {
            context: context.to_string(),
            items,
        })
        .collect();
    if !untagged.is_empty() {
        groups.push(ContextGroup {
            context: NO_CONTEXT.to_string(),
            items: untagged,
        });
    }
    groups
}

/// Counts and lists for the weekly review
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub inbox_count: usize,
    pub waiting_count: usize,
    pub someday_count: usize,
    pub active_projects: usize,
    pub stuck_projects: Vec<Project>,
    pub next_actions: Vec<Item>,
    pub orphaned_items: Vec<Item>,
    pub upcoming: Vec<Item>,
}

impl ReviewSummary {
    /// Nothing left to process
    pub fn is_clear(&self) -> bool {
        self.inbox_count == 0 && self.stuck_projects.is_empty() && self.orphaned_items.is_empty()
    }
}

pub fn review(
    projects: &[&Project],
    items: &[&Item],
    now: DateTime<Utc>,
    upcoming_days: u32,
) -> ReviewSummary {
    ReviewSummary {
        inbox_count: by_status(items, ItemStatus::Inbox).len(),
        waiting_count: by_status(items, ItemStatus::Waiting).len(),
        someday_count: by_status(items, ItemStatus::Someday).len(),
        active_projects: projects.iter().filter(|p| p.is_active()).count(),
        stuck_projects: stuck_projects(projects, items)
            .into_iter()
            .cloned()
            .collect(),
        next_actions: next_actions(projects, items).into_iter().cloned().collect(),
        orphaned_items: orphaned(items).into_iter().cloned().collect(),
        upcoming: due_within(items, now, upcoming_days)
            .into_iter()
            .cloned()
            .collect(),
    }
}
