//! Project data model
//!
//! A project is any outcome that needs more than one action. Items point at
//! their project through `Item::project_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::de::nullable;

/// Project status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl ProjectStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, ProjectStatus::Active)
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "completed" | "complete" => Ok(ProjectStatus::Completed),
            "archived" => Ok(ProjectStatus::Archived),
            _ => Err(crate::Error::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "active"),
            ProjectStatus::Completed => write!(f, "completed"),
            ProjectStatus::Archived => write!(f, "archived"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Store-assigned identifier, never reused
    pub id: u64,

    pub name: String,

    /// What "done" looks like
    #[serde(default)]
    pub outcome: Option<String>,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} [{}] {}", self.id, self.status, self.name)
    }
}

/// Fields accepted when creating a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[serde(default)]
    pub name: String,
    pub outcome: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl NewProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::Validation("Name is required".into()));
        }
        Ok(())
    }

    pub(crate) fn into_project(self, id: u64, created_at: DateTime<Utc>) -> Project {
        Project {
            id,
            name: self.name,
            outcome: self.outcome,
            status: self.status.unwrap_or_default(),
            created_at,
        }
    }
}

/// Partial project update; absent fields are left alone, `outcome: null` clears it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub outcome: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
}

impl ProjectPatch {
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.as_ref().is_some_and(|name| name.trim().is_empty()) {
            return Err(crate::Error::Validation("Name cannot be empty".into()));
        }
        Ok(())
    }

    pub fn apply(self, project: &mut Project) {
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(outcome) = self.outcome {
            project.outcome = outcome;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_display() {
        let status: ProjectStatus = "Archived".parse().unwrap();
        assert_eq!(status, ProjectStatus::Archived);
        assert_eq!(status.to_string(), "archived");
        assert!("paused".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn test_new_project_requires_name() {
        let err = NewProject::new("   ").validate().unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
        assert!(NewProject::new("Trip").validate().is_ok());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let mut project = NewProject {
            name: "Trip".into(),
            outcome: Some("Booked and packed".into()),
            status: None,
        }
        .into_project(1, Utc::now());

        let untouched: ProjectPatch = serde_json::from_str(r#"{"status":"completed"}"#).unwrap();
        untouched.apply(&mut project);
        assert_eq!(project.outcome.as_deref(), Some("Booked and packed"));
        assert_eq!(project.status, ProjectStatus::Completed);

        let cleared: ProjectPatch = serde_json::from_str(r#"{"outcome":null}"#).unwrap();
        cleared.apply(&mut project);
        assert_eq!(project.outcome, None);
    }
}
