//! Item data model
//!
//! Everything captured into the system is an item. Its status says which
//! GTD list it currently lives on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::de::{list_or_null, null_as_default, nullable, nullable_timestamp};

/// Item status (the list an item is filed under)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Captured, not yet clarified
    #[default]
    Inbox,
    /// Standalone next action, not tied to a project's sequence
    Next,
    /// Delegated or waiting on someone else
    Waiting,
    Someday,
    Reference,
    /// Step of a project; ordered by `position` within the project
    Projects,
    Done,
    Trash,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 8] = [
        ItemStatus::Inbox,
        ItemStatus::Next,
        ItemStatus::Waiting,
        ItemStatus::Someday,
        ItemStatus::Reference,
        ItemStatus::Projects,
        ItemStatus::Done,
        ItemStatus::Trash,
    ];

    pub fn is_done(&self) -> bool {
        matches!(self, ItemStatus::Done)
    }

    /// Still on some list the user acts on
    pub fn is_open(&self) -> bool {
        !matches!(self, ItemStatus::Done | ItemStatus::Trash)
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inbox" => Ok(ItemStatus::Inbox),
            "next" => Ok(ItemStatus::Next),
            "waiting" | "waiting_for" | "waiting-for" => Ok(ItemStatus::Waiting),
            "someday" => Ok(ItemStatus::Someday),
            "reference" => Ok(ItemStatus::Reference),
            "projects" | "project" => Ok(ItemStatus::Projects),
            "done" => Ok(ItemStatus::Done),
            "trash" => Ok(ItemStatus::Trash),
            _ => Err(crate::Error::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ItemStatus::Inbox => "inbox",
            ItemStatus::Next => "next",
            ItemStatus::Waiting => "waiting",
            ItemStatus::Someday => "someday",
            ItemStatus::Reference => "reference",
            ItemStatus::Projects => "projects",
            ItemStatus::Done => "done",
            ItemStatus::Trash => "trash",
        };
        f.write_str(name)
    }
}

/// How much energy an action takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for EnergyLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(EnergyLevel::Low),
            "medium" | "med" => Ok(EnergyLevel::Medium),
            "high" => Ok(EnergyLevel::High),
            _ => Err(crate::Error::InvalidEnergyLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyLevel::Low => write!(f, "low"),
            EnergyLevel::Medium => write!(f, "medium"),
            EnergyLevel::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Store-assigned identifier, never reused
    pub id: u64,

    pub title: String,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub status: ItemStatus,

    #[serde(default)]
    pub project_id: Option<u64>,

    /// Context tags such as "@home"
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<String>,

    /// Free text like "15m" or "2h"
    #[serde(default)]
    pub time_estimate: Option<String>,

    #[serde(default)]
    pub energy_level: Option<EnergyLevel>,

    /// Time of day paired with `due_datetime`, e.g. "09:00"
    #[serde(default)]
    pub start_time: Option<String>,

    /// Present on calendar ("hard landscape") items
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_opt")]
    pub due_datetime: Option<DateTime<Utc>>,

    /// Order within the project, lower first; ties broken by id
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: i64,

    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Sort key for ordering items inside a project
    pub fn order_key(&self) -> (i64, u64) {
        (self.position, self.id)
    }

    pub fn is_calendar(&self) -> bool {
        self.due_datetime.is_some()
    }

    /// Filed as a project step but not attached to any project
    pub fn is_orphaned(&self) -> bool {
        self.status == ItemStatus::Projects && self.project_id.is_none()
    }

    /// First context tag, used to group action lists
    pub fn primary_context(&self) -> Option<&str> {
        self.contexts.first().map(String::as_str)
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} [{}] {}", self.id, self.status, self.title)
    }
}

/// Fields accepted when creating an item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    #[serde(default)]
    pub title: String,
    pub notes: Option<String>,
    pub status: Option<ItemStatus>,
    pub project_id: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub contexts: Vec<String>,
    pub time_estimate: Option<String>,
    pub energy_level: Option<EnergyLevel>,
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "crate::timestamp::deserialize_opt")]
    pub due_datetime: Option<DateTime<Utc>>,
    pub position: Option<i64>,
}

impl NewItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(crate::Error::Validation("Title is required".into()));
        }
        validate_contexts(&self.contexts)
    }

    pub(crate) fn into_item(self, id: u64, created_at: DateTime<Utc>) -> Item {
        Item {
            id,
            title: self.title,
            notes: self.notes,
            status: self.status.unwrap_or_default(),
            project_id: self.project_id,
            contexts: self.contexts,
            time_estimate: self.time_estimate,
            energy_level: self.energy_level,
            start_time: self.start_time,
            due_datetime: self.due_datetime,
            position: self.position.unwrap_or(0),
            created_at,
        }
    }
}

/// Partial item update
///
/// Absent fields are left alone. For optional fields an explicit `null`
/// clears the value; `contexts: null` empties the list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    pub status: Option<ItemStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub project_id: Option<Option<u64>>,
    #[serde(default, deserialize_with = "list_or_null")]
    pub contexts: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub time_estimate: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub energy_level: Option<Option<EnergyLevel>>,
    #[serde(default, deserialize_with = "nullable")]
    pub start_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub due_datetime: Option<Option<DateTime<Utc>>>,
    pub position: Option<i64>,
}

impl ItemPatch {
    pub fn status(status: ItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(crate::Error::Validation("Title cannot be empty".into()));
        }
        match &self.contexts {
            Some(contexts) => validate_contexts(contexts),
            None => Ok(()),
        }
    }

    pub fn apply(self, item: &mut Item) {
        if let Some(title) = self.title {
            item.title = title;
        }
        if let Some(notes) = self.notes {
            item.notes = notes;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        if let Some(project_id) = self.project_id {
            item.project_id = project_id;
        }
        if let Some(contexts) = self.contexts {
            item.contexts = contexts;
        }
        if let Some(time_estimate) = self.time_estimate {
            item.time_estimate = time_estimate;
        }
        if let Some(energy_level) = self.energy_level {
            item.energy_level = energy_level;
        }
        if let Some(start_time) = self.start_time {
            item.start_time = start_time;
        }
        if let Some(due) = self.due_datetime {
            item.due_datetime = due;
        }
        if let Some(position) = self.position {
            item.position = position;
        }
    }
}

fn validate_contexts(contexts: &[String]) -> crate::Result<()> {
    if contexts.iter().any(|c| c.trim().is_empty()) {
        return Err(crate::Error::Validation("Contexts cannot be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Item {
        NewItem::new("Book flight").into_item(7, Utc::now())
    }

    #[test]
    fn test_new_item_defaults() {
        let item = sample();
        assert_eq!(item.status, ItemStatus::Inbox);
        assert_eq!(item.position, 0);
        assert!(item.contexts.is_empty());
        assert!(item.project_id.is_none());
    }

    #[test]
    fn test_missing_title_fails_validation() {
        let new: NewItem = serde_json::from_str(r#"{"notes":"no title here"}"#).unwrap();
        let err = new.validate().unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
    }

    #[test]
    fn test_unknown_status_is_rejected_by_serde() {
        let result: Result<NewItem, _> =
            serde_json::from_str(r#"{"title":"x","status":"errands"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_camel_case_with_nulls() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["title"], "Book flight");
        assert!(value["projectId"].is_null());
        assert!(value["dueDatetime"].is_null());
        assert_eq!(value["contexts"], serde_json::json!([]));
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_patch_clears_and_keeps_fields() {
        let mut item = sample();
        item.project_id = Some(3);
        item.notes = Some("aisle seat".into());
        item.contexts = vec!["@computer".into()];

        let patch: ItemPatch =
            serde_json::from_str(r#"{"projectId":null,"contexts":null,"status":"projects"}"#)
                .unwrap();
        patch.apply(&mut item);

        assert_eq!(item.project_id, None);
        assert!(item.contexts.is_empty());
        assert_eq!(item.status, ItemStatus::Projects);
        assert_eq!(item.notes.as_deref(), Some("aisle seat"));
        assert!(item.is_orphaned());
    }

    #[test]
    fn test_lenient_record_decoding() {
        let item: Item = serde_json::from_value(serde_json::json!({
            "id": 4,
            "title": "Dentist",
            "position": null,
            "contexts": null,
            "dueDatetime": "2024-03-01T10:00:00",
            "createdAt": "2024-02-01T08:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(item.position, 0);
        assert!(item.contexts.is_empty());
        assert!(item.is_calendar());
        assert_eq!(item.status, ItemStatus::Inbox);
    }

    #[test]
    fn test_status_parse_aliases() {
        assert_eq!("waiting-for".parse::<ItemStatus>().unwrap(), ItemStatus::Waiting);
        assert_eq!("PROJECTS".parse::<ItemStatus>().unwrap(), ItemStatus::Projects);
        assert!("errands".parse::<ItemStatus>().is_err());
    }
}
