//! JSON-file record store for projects and items
//!
//! The whole data set lives in `.gtd/data.json`. Every mutation runs as a
//! transaction over a working copy: the copy is written to disk (temp file +
//! rename) and only then swapped in, so a failed write leaves both the file
//! and the in-memory state untouched.

use crate::id::IdCounter;
use crate::{
    Config, Entity, Error, Item, ItemPatch, ItemStatus, NewItem, NewProject, Project,
    ProjectPatch, Result,
};
use chrono::{DateTime, Utc};
use records::Keyed;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const GTD_DIR: &str = ".gtd";
const DATA_FILE: &str = "data.json";
const CONFIG_FILE: &str = "config.toml";

/// Records keyed by id, stored on disk as a plain list
mod records {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub trait Keyed {
        fn key(&self) -> u64;
    }

    impl Keyed for crate::Project {
        fn key(&self) -> u64 {
            self.id
        }
    }

    impl Keyed for crate::Item {
        fn key(&self) -> u64 {
            self.id
        }
    }

    pub fn serialize<S, T>(map: &BTreeMap<u64, T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<BTreeMap<u64, T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Keyed,
    {
        let mut map = BTreeMap::new();
        for record in Vec::<T>::deserialize(deserializer)? {
            let key = record.key();
            if map.insert(key, record).is_some() {
                return Err(serde::de::Error::custom(format!("duplicate id {key}")));
            }
        }
        Ok(map)
    }
}

/// The full data set: both tables plus their id counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Data {
    #[serde(default, with = "records")]
    pub(crate) projects: BTreeMap<u64, Project>,

    #[serde(default, with = "records")]
    pub(crate) items: BTreeMap<u64, Item>,

    #[serde(default)]
    pub(crate) next_project_id: IdCounter,

    #[serde(default)]
    pub(crate) next_item_id: IdCounter,
}

impl Data {
    /// Projects ordered by creation time, ties broken by id
    pub fn projects(&self) -> Vec<&Project> {
        let mut projects: Vec<_> = self.projects.values().collect();
        projects.sort_by_key(|p| (p.created_at, p.id));
        projects
    }

    /// Items ordered by creation time, ties broken by id
    pub fn items(&self) -> Vec<&Item> {
        let mut items: Vec<_> = self.items.values().collect();
        items.sort_by_key(|i| (i.created_at, i.id));
        items
    }

    pub fn project(&self, id: u64) -> Option<&Project> {
        self.projects.get(&id)
    }

    pub fn item(&self, id: u64) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Items assigned to a project, in display order
    pub fn project_items(&self, project_id: u64) -> Vec<&Item> {
        let mut items: Vec<_> = self
            .items
            .values()
            .filter(|i| i.project_id == Some(project_id))
            .collect();
        items.sort_by_key(|i| i.order_key());
        items
    }

    pub fn next_project_id(&self) -> u64 {
        self.next_project_id.peek()
    }

    pub fn next_item_id(&self) -> u64 {
        self.next_item_id.peek()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.items.is_empty()
    }

    /// Reject references to projects that do not exist
    pub(crate) fn ensure_project(&self, project_id: u64) -> Result<()> {
        if self.projects.contains_key(&project_id) {
            Ok(())
        } else {
            Err(Error::Validation(format!("Project {project_id} not found")))
        }
    }

    pub(crate) fn create_project(
        &mut self,
        new: NewProject,
        now: DateTime<Utc>,
    ) -> Result<Project> {
        new.validate()?;
        let id = next_id(&mut self.next_project_id, Entity::Project)?;
        insert_new(&mut self.projects, new.into_project(id, now), Entity::Project)
    }

    pub(crate) fn create_item(&mut self, new: NewItem, now: DateTime<Utc>) -> Result<Item> {
        new.validate()?;
        if let Some(project_id) = new.project_id {
            self.ensure_project(project_id)?;
        }
        let id = next_id(&mut self.next_item_id, Entity::Item)?;
        insert_new(&mut self.items, new.into_item(id, now), Entity::Item)
    }

    pub(crate) fn update_project(&mut self, id: u64, patch: ProjectPatch) -> Result<Project> {
        patch.validate()?;
        let project = self
            .projects
            .get_mut(&id)
            .ok_or_else(|| Error::project_not_found(id))?;
        patch.apply(project);
        Ok(project.clone())
    }

    pub(crate) fn update_item(&mut self, id: u64, patch: ItemPatch) -> Result<Item> {
        patch.validate()?;
        if let Some(project_id) = patch.project_id.flatten() {
            self.ensure_project(project_id)?;
        }

        let item = self
            .items
            .get_mut(&id)
            .ok_or_else(|| Error::item_not_found(id))?;
        patch.apply(item);

        // Done items may keep a reference to a deleted project as history.
        // Anything reopened drops that stale reference.
        if item.status != ItemStatus::Done
            && let Some(project_id) = item.project_id
            && !self.projects.contains_key(&project_id)
        {
            tracing::debug!(item = id, project = project_id, "dropping stale project reference");
            item.project_id = None;
        }

        Ok(item.clone())
    }

    pub(crate) fn item_mut(&mut self, id: u64) -> Result<&mut Item> {
        self.items
            .get_mut(&id)
            .ok_or_else(|| Error::item_not_found(id))
    }

    pub(crate) fn remove_item(&mut self, id: u64) -> Option<Item> {
        self.items.remove(&id)
    }

    pub(crate) fn remove_project(&mut self, id: u64) -> Option<Project> {
        self.projects.remove(&id)
    }

    /// Insert a project with its own id (restore path)
    pub(crate) fn restore_project(&mut self, project: Project) -> Result<()> {
        if self.projects.contains_key(&project.id) {
            return Err(Error::ImportFailed(format!("duplicate project id {}", project.id)));
        }
        self.projects.insert(project.id, project);
        Ok(())
    }

    /// Insert an item with its own id (restore path)
    pub(crate) fn restore_item(&mut self, item: Item) -> Result<()> {
        if self.items.contains_key(&item.id) {
            return Err(Error::ImportFailed(format!("duplicate item id {}", item.id)));
        }
        self.items.insert(item.id, item);
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.projects.clear();
    }

    /// Move both counters past the highest stored id
    pub(crate) fn advance_counters(&mut self) {
        if let Some(&max) = self.projects.keys().next_back() {
            self.next_project_id.advance_past(max);
        }
        if let Some(&max) = self.items.keys().next_back() {
            self.next_item_id.advance_past(max);
        }
    }
}

/// File-backed store
pub struct Store {
    root: PathBuf,
    data: Data,
}

impl Store {
    /// Find and open the store for the current directory
    pub fn open() -> Result<Self> {
        let root = Self::find_root()?;
        Self::open_at(root)
    }

    /// Open the store whose `.gtd` directory lives directly under `root`
    pub fn open_at(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(GTD_DIR).exists() {
            return Err(Error::NotInitialized);
        }
        let mut store = Self {
            root,
            data: Data::default(),
        };
        store.load()?;
        tracing::info!(
            path = %store.data_path().display(),
            projects = store.data.projects.len(),
            items = store.data.items.len(),
            "opened store"
        );
        Ok(store)
    }

    /// Initialize a new store under `root`
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let gtd_dir = root.join(GTD_DIR);

        if gtd_dir.exists() {
            return Err(Error::AlreadyInitialized(gtd_dir.display().to_string()));
        }

        fs::create_dir_all(&gtd_dir)?;
        fs::write(gtd_dir.join(CONFIG_FILE), Config::default_with_comments())?;

        let store = Self {
            root,
            data: Data::default(),
        };
        store.persist(&store.data)?;
        Ok(store)
    }

    /// Open the store under `root`, creating it first if needed
    pub fn open_or_init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.join(GTD_DIR).exists() {
            Self::open_at(root)
        } else {
            tracing::info!(root = %root.display(), "initializing new store");
            Self::init(root)
        }
    }

    /// Find the directory containing .gtd, walking up from the current directory
    fn find_root() -> Result<PathBuf> {
        let mut current = std::env::current_dir()?;
        loop {
            if current.join(GTD_DIR).exists() {
                return Ok(current);
            }
            if !current.pop() {
                return Err(Error::NotInitialized);
            }
        }
    }

    /// Path to the .gtd directory
    pub fn gtd_dir(&self) -> PathBuf {
        self.root.join(GTD_DIR)
    }

    /// Path to data.json
    pub fn data_path(&self) -> PathBuf {
        self.gtd_dir().join(DATA_FILE)
    }

    /// Path to config.toml
    pub fn config_path(&self) -> PathBuf {
        self.gtd_dir().join(CONFIG_FILE)
    }

    pub fn config(&self) -> Result<Config> {
        Config::load(&self.config_path())
    }

    fn load(&mut self) -> Result<()> {
        let path = self.data_path();
        if !path.exists() {
            return Ok(());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut data: Data = serde_json::from_reader(reader)?;

        let counters = (data.next_project_id, data.next_item_id);
        data.advance_counters();
        if counters != (data.next_project_id, data.next_item_id) {
            tracing::warn!(
                path = %path.display(),
                "id counters were behind stored records, advanced them"
            );
        }

        self.data = data;
        Ok(())
    }

    /// Write a data set to disk atomically
    fn persist(&self, data: &Data) -> Result<()> {
        let path = self.data_path();
        let tmp = path.with_extension("json.tmp");

        let written =
            write_json(&tmp, data).and_then(|()| fs::rename(&tmp, &path).map_err(Error::from));
        if written.is_err() {
            fs::remove_file(&tmp).ok();
        }
        written
    }

    /// Run `f` against a working copy of the data set
    ///
    /// The copy replaces the current data only if `f` succeeds and the copy
    /// was written to disk. On any error the previous state is kept.
    pub fn transaction<T>(&mut self, f: impl FnOnce(&mut Data) -> Result<T>) -> Result<T> {
        let mut working = self.data.clone();
        let out = f(&mut working)?;
        self.persist(&working)?;
        self.data = working;
        Ok(out)
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn projects(&self) -> Vec<&Project> {
        self.data.projects()
    }

    pub fn items(&self) -> Vec<&Item> {
        self.data.items()
    }

    pub fn project(&self, id: u64) -> Option<&Project> {
        self.data.project(id)
    }

    pub fn item(&self, id: u64) -> Option<&Item> {
        self.data.item(id)
    }

    pub fn project_items(&self, project_id: u64) -> Vec<&Item> {
        self.data.project_items(project_id)
    }

    pub fn create_project(&mut self, new: NewProject) -> Result<Project> {
        let now = Utc::now();
        self.transaction(|data| data.create_project(new, now))
    }

    pub fn create_item(&mut self, new: NewItem) -> Result<Item> {
        let now = Utc::now();
        self.transaction(|data| data.create_item(new, now))
    }

    pub fn update_project(&mut self, id: u64, patch: ProjectPatch) -> Result<Project> {
        self.transaction(|data| data.update_project(id, patch))
    }

    pub fn update_item(&mut self, id: u64, patch: ItemPatch) -> Result<Item> {
        self.transaction(|data| data.update_item(id, patch))
    }

    /// Apply several item updates at once; unknown ids are skipped
    ///
    /// All updates land together or not at all. Returns how many items
    /// were updated.
    pub fn update_items(&mut self, updates: Vec<(u64, ItemPatch)>) -> Result<usize> {
        self.transaction(|data| {
            let mut updated = 0;
            for (id, patch) in updates {
                if data.item(id).is_none() {
                    continue;
                }
                data.update_item(id, patch)?;
                updated += 1;
            }
            Ok(updated)
        })
    }

    /// Remove an item; removing an absent id succeeds
    pub fn delete_item(&mut self, id: u64) -> Result<()> {
        if self.data.item(id).is_none() {
            return Ok(());
        }
        self.transaction(|data| {
            data.remove_item(id);
            Ok(())
        })
    }
}

fn next_id(counter: &mut IdCounter, entity: Entity) -> Result<u64> {
    counter
        .generate()
        .ok_or_else(|| Error::Validation(format!("{entity} ids exhausted")))
}

/// Insert a freshly created record; an id that is already taken is an error
fn insert_new<T: Keyed + Clone>(
    records: &mut BTreeMap<u64, T>,
    record: T,
    entity: Entity,
) -> Result<T> {
    match records.entry(record.key()) {
        Entry::Vacant(slot) => Ok(slot.insert(record).clone()),
        Entry::Occupied(slot) => Err(Error::Validation(format!(
            "{entity} id {} is already taken",
            slot.key()
        ))),
    }
}

fn write_json(path: &Path, data: &Data) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
