//! CLI command implementations

use crate::ItemFields;
use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use gtd_core::{
    Config, Item, ItemPatch, ItemStatus, NewItem, NewProject, Project, ProjectPatch, Store, rules,
    seed, snapshot, timestamp, views,
};

/// Open the store and apply display settings from its config
fn open() -> Result<(Store, Config)> {
    let store = Store::open()?;
    let config = store.config()?;
    if !config.display.colors {
        colored::control::set_override(false);
    }
    Ok((store, config))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn status_label(status: ItemStatus) -> ColoredString {
    let name = status.to_string();
    match status {
        ItemStatus::Inbox => name.white(),
        ItemStatus::Next => name.green(),
        ItemStatus::Waiting => name.yellow(),
        ItemStatus::Someday => name.magenta(),
        ItemStatus::Reference => name.blue(),
        ItemStatus::Projects => name.cyan(),
        ItemStatus::Done | ItemStatus::Trash => name.dimmed(),
    }
}

fn truncate(title: &str, max: usize) -> String {
    if max == 0 || title.chars().count() <= max {
        return title.to_string();
    }
    let cut: String = title.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}

fn format_due(due: DateTime<Utc>, config: &Config) -> String {
    due.format(&config.display.date_format).to_string()
}

fn print_item_line(item: &Item, config: &Config) {
    let mut line = format!(
        "{} [{}] {}",
        format!("#{}", item.id).cyan(),
        status_label(item.status),
        truncate(&item.title, config.display.max_title_length)
    );
    if !item.contexts.is_empty() {
        line.push_str(&format!(" {}", item.contexts.join(" ").blue()));
    }
    if let Some(due) = item.due_datetime {
        line.push_str(&format!(" {}", format!("due {}", format_due(due, config)).yellow()));
    }
    println!("{line}");
}

fn parse_due(raw: &str) -> Result<DateTime<Utc>> {
    timestamp::parse(raw).ok_or_else(|| anyhow!("Invalid date: {raw}"))
}

fn item_not_found(id: u64) -> anyhow::Error {
    anyhow!("Item not found: {id}")
}

fn project_not_found(id: u64) -> anyhow::Error {
    anyhow!("Project not found: {id}")
}

pub fn init(empty: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let mut store = Store::init(cwd)?;
    println!(
        "{} Initialized gtd in {}",
        "✓".green(),
        store.gtd_dir().display()
    );
    if !empty && seed::seed_if_empty(&mut store)? {
        println!("  Added a sample project to get you started");
    }
    Ok(())
}

// Items

pub fn add(title: String, fields: ItemFields, json: bool) -> Result<()> {
    let (mut store, _) = open()?;

    let new = NewItem {
        notes: fields.notes,
        status: fields.status.as_deref().map(str::parse).transpose()?,
        project_id: fields.project,
        contexts: fields.contexts,
        time_estimate: fields.estimate,
        energy_level: fields.energy.as_deref().map(str::parse).transpose()?,
        start_time: fields.start,
        due_datetime: fields.due.as_deref().map(parse_due).transpose()?,
        position: fields.position,
        ..NewItem::new(title)
    };
    let item = store.create_item(new)?;

    if json {
        print_json(&item)?;
    } else {
        println!(
            "{} Captured {} into {}",
            "✓".green(),
            format!("#{}", item.id).cyan(),
            status_label(item.status)
        );
        println!("  Title: {}", item.title);
    }
    Ok(())
}

pub fn list(
    status: Option<String>,
    context: Option<String>,
    group: bool,
    all: bool,
    json: bool,
) -> Result<()> {
    let (store, config) = open()?;
    let mut items = store.items();

    if let Some(ref s) = status {
        let status: ItemStatus = s.parse()?;
        items = views::by_status(&items, status);
    } else if !all {
        items.retain(|i| i.status.is_open());
    }

    if let Some(ref context) = context {
        items.retain(|i| i.contexts.iter().any(|c| c == context));
    }

    if json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("No items found");
        return Ok(());
    }

    if group {
        for group in views::group_by_context(&items) {
            println!("{}", group.context.bold());
            for item in group.items {
                print!("  ");
                print_item_line(item, &config);
            }
        }
    } else {
        for item in items {
            print_item_line(item, &config);
        }
    }
    Ok(())
}

pub fn show(id: u64, json: bool) -> Result<()> {
    let (store, config) = open()?;
    let item = store.item(id).ok_or_else(|| item_not_found(id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
        return Ok(());
    }

    println!("{} {}", format!("#{}", item.id).cyan().bold(), item.title.bold());
    println!();
    println!("Status:   {}", status_label(item.status));
    if let Some(project_id) = item.project_id {
        match store.project(project_id) {
            Some(project) => println!("Project:  {} (#{})", project.name, project.id),
            None => println!("Project:  #{} {}", project_id, "(deleted)".dimmed()),
        }
        println!("Position: {}", item.position);
    }
    if !item.contexts.is_empty() {
        println!("Contexts: {}", item.contexts.join(", "));
    }
    if let Some(ref estimate) = item.time_estimate {
        println!("Estimate: {}", estimate);
    }
    if let Some(energy) = item.energy_level {
        println!("Energy:   {}", energy);
    }
    if let Some(ref start) = item.start_time {
        println!("Starts:   {}", start);
    }
    if let Some(due) = item.due_datetime {
        println!("Due:      {}", format_due(due, &config));
    }
    println!("Created:  {}", item.created_at.format("%Y-%m-%d %H:%M"));

    if let Some(ref notes) = item.notes {
        println!();
        println!("{}", "Notes:".bold());
        println!("{}", notes);
    }
    Ok(())
}

pub fn update(
    id: u64,
    title: Option<String>,
    fields: ItemFields,
    no_project: bool,
    no_due: bool,
    json: bool,
) -> Result<()> {
    let (mut store, _) = open()?;

    let project_id = if no_project {
        Some(None)
    } else {
        fields.project.map(Some)
    };
    let due_datetime = if no_due {
        Some(None)
    } else {
        fields.due.as_deref().map(parse_due).transpose()?.map(Some)
    };

    let patch = ItemPatch {
        title,
        notes: fields.notes.map(Some),
        status: fields.status.as_deref().map(str::parse).transpose()?,
        project_id,
        contexts: (!fields.contexts.is_empty()).then_some(fields.contexts),
        time_estimate: fields.estimate.map(Some),
        energy_level: fields.energy.as_deref().map(str::parse).transpose()?.map(Some),
        start_time: fields.start.map(Some),
        due_datetime,
        position: fields.position,
    };
    let item = store.update_item(id, patch)?;

    if json {
        print_json(&item)?;
    } else {
        println!("{} Updated {}", "✓".green(), format!("#{id}").cyan());
    }
    Ok(())
}

pub fn done(id: u64, json: bool) -> Result<()> {
    let (mut store, _) = open()?;
    let item = rules::set_status(&mut store, id, ItemStatus::Done)?;

    if json {
        print_json(&item)?;
    } else {
        println!("{} Done: {}", "✓".green(), item.title);
    }
    Ok(())
}

pub fn remove(id: u64) -> Result<()> {
    let (mut store, _) = open()?;
    store.delete_item(id)?;
    println!("{} Deleted {}", "✓".green(), format!("#{id}").cyan());
    Ok(())
}

pub fn move_item(id: u64, project: Option<u64>, json: bool) -> Result<()> {
    let (mut store, _) = open()?;
    let item = rules::move_to_project(&mut store, id, project)?;

    if json {
        print_json(&item)?;
    } else {
        match item.project_id {
            Some(project_id) => println!(
                "{} Moved {} to project #{} at position {}",
                "✓".green(),
                format!("#{id}").cyan(),
                project_id,
                item.position
            ),
            None => println!(
                "{} Moved {} out of its project",
                "✓".green(),
                format!("#{id}").cyan()
            ),
        }
    }
    Ok(())
}

pub fn reorder(project_id: u64, id: u64, index: usize, json: bool) -> Result<()> {
    let (mut store, config) = open()?;
    let ordered = rules::reorder(&mut store, project_id, id, index)?;

    if json {
        return print_json(&ordered);
    }
    println!("{} Reordered project #{}", "✓".green(), project_id);
    for item in &ordered {
        print!("  {}. ", item.position);
        print_item_line(item, &config);
    }
    Ok(())
}

// Projects

pub fn project_add(name: String, outcome: Option<String>, json: bool) -> Result<()> {
    let (mut store, _) = open()?;
    let project = store.create_project(NewProject {
        outcome,
        ..NewProject::new(name)
    })?;

    if json {
        print_json(&project)?;
    } else {
        println!(
            "{} Created project {}",
            "✓".green(),
            format!("#{}", project.id).cyan()
        );
        println!("  Name: {}", project.name);
    }
    Ok(())
}

fn print_project_line(project: &Project, next: Option<&Item>, config: &Config) {
    let status = if project.is_active() {
        project.status.to_string().green()
    } else {
        project.status.to_string().dimmed()
    };
    println!(
        "{} [{}] {}",
        format!("P{}", project.id).cyan(),
        status,
        truncate(&project.name, config.display.max_title_length)
    );
    match next {
        Some(item) => println!("    next: {}", item.title),
        None if project.is_active() => println!("    {}", "no next action".red()),
        None => {}
    }
}

pub fn project_list(all: bool, json: bool) -> Result<()> {
    let (store, config) = open()?;
    let mut projects = store.projects();
    if !all {
        projects.retain(|p| p.is_active());
    }

    if json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects found");
        return Ok(());
    }

    let items = store.items();
    for project in projects {
        print_project_line(project, rules::next_action_for(project.id, &items), &config);
    }
    Ok(())
}

pub fn project_show(id: u64, json: bool) -> Result<()> {
    let (store, config) = open()?;
    let project = store.project(id).ok_or_else(|| project_not_found(id))?;
    let items = store.project_items(id);

    if json {
        return print_json(&serde_json::json!({
            "project": project,
            "items": items,
        }));
    }

    println!(
        "{} {}",
        format!("P{}", project.id).cyan().bold(),
        project.name.bold()
    );
    println!("Status:  {}", project.status);
    if let Some(ref outcome) = project.outcome {
        println!("Outcome: {}", outcome);
    }
    println!("Created: {}", project.created_at.format("%Y-%m-%d %H:%M"));
    println!();

    if items.is_empty() {
        println!("No items");
        return Ok(());
    }
    let next = rules::next_action_for(id, &items).map(|i| i.id);
    for item in items {
        let marker = if Some(item.id) == next { "→".green() } else { " ".normal() };
        print!("{} {}. ", marker, item.position);
        print_item_line(item, &config);
    }
    Ok(())
}

pub fn project_update(
    id: u64,
    name: Option<String>,
    outcome: Option<String>,
    status: Option<String>,
    json: bool,
) -> Result<()> {
    let (mut store, _) = open()?;
    let patch = ProjectPatch {
        name,
        outcome: outcome.map(Some),
        status: status.as_deref().map(str::parse).transpose()?,
    };
    let project = store.update_project(id, patch)?;

    if json {
        print_json(&project)?;
    } else {
        println!("{} Updated project {}", "✓".green(), format!("P{id}").cyan());
    }
    Ok(())
}

pub fn project_remove(id: u64, json: bool) -> Result<()> {
    let (mut store, _) = open()?;
    let report = rules::delete_project(&mut store, id)?;

    if json {
        return print_json(&report);
    }
    match report.project {
        Some(project) => {
            println!("{} Deleted project {}", "✓".green(), project.name);
            if !report.reset_items.is_empty() {
                println!(
                    "  {} item(s) returned to the inbox",
                    report.reset_items.len()
                );
            }
        }
        None => println!("No project {}", format!("P{id}").cyan()),
    }
    Ok(())
}

// Review

pub fn next(context: Option<String>, json: bool) -> Result<()> {
    let (store, config) = open()?;
    let projects = store.projects();
    let items = store.items();
    let mut actions = views::engage_list(&projects, &items);

    if let Some(ref context) = context {
        actions.retain(|i| i.contexts.iter().any(|c| c == context));
    }

    if json {
        return print_json(&actions);
    }
    if actions.is_empty() {
        println!("Nothing to do");
        return Ok(());
    }
    for group in views::group_by_context(&actions) {
        println!("{}", group.context.bold());
        for item in group.items {
            print!("  ");
            print_item_line(item, &config);
        }
    }
    Ok(())
}

pub fn review(json: bool) -> Result<()> {
    let (store, config) = open()?;
    let projects = store.projects();
    let items = store.items();
    let summary = views::review(&projects, &items, Utc::now(), config.review.upcoming_days);

    if json {
        return print_json(&summary);
    }

    println!("{}", "Weekly review".bold());
    println!();
    println!("Inbox:           {}", summary.inbox_count);
    println!("Waiting for:     {}", summary.waiting_count);
    println!("Someday/maybe:   {}", summary.someday_count);
    println!("Active projects: {}", summary.active_projects);

    if !summary.stuck_projects.is_empty() {
        println!();
        println!("{}", "Projects without a next action:".red().bold());
        for project in &summary.stuck_projects {
            println!("  {} {}", format!("P{}", project.id).cyan(), project.name);
        }
    }
    if !summary.orphaned_items.is_empty() {
        println!();
        println!("{}", "Project items without a project:".yellow().bold());
        for item in &summary.orphaned_items {
            print!("  ");
            print_item_line(item, &config);
        }
    }
    if !summary.upcoming.is_empty() {
        println!();
        println!(
            "{}",
            format!("Due in the next {} days:", config.review.upcoming_days).bold()
        );
        for item in &summary.upcoming {
            print!("  ");
            print_item_line(item, &config);
        }
    }

    if summary.is_clear() {
        println!();
        println!("{} Inbox empty, every project has a next action", "✓".green());
    }
    Ok(())
}

pub fn calendar(days: Option<u32>, json: bool) -> Result<()> {
    let (store, config) = open()?;
    let items = store.items();
    let dated = match days {
        Some(days) => views::due_within(&items, Utc::now(), days),
        None => views::calendar(&items),
    };

    if json {
        return print_json(&dated);
    }
    if dated.is_empty() {
        println!("No dated items");
        return Ok(());
    }
    for item in dated {
        print_item_line(item, &config);
    }
    Ok(())
}

// System

pub fn export(output: Option<String>) -> Result<()> {
    let (store, _) = open()?;
    let snapshot = snapshot::export(&store);
    let content = serde_json::to_string_pretty(&snapshot)?;

    match output {
        Some(path) => {
            std::fs::write(&path, content).with_context(|| format!("Failed to write {path}"))?;
            eprintln!(
                "{} Exported {} project(s) and {} item(s) to {}",
                "✓".green(),
                snapshot.projects.len(),
                snapshot.items.len(),
                path
            );
        }
        None => println!("{content}"),
    }
    Ok(())
}

pub fn import(path: &str, yes: bool, json: bool) -> Result<()> {
    let (mut store, _) = open()?;
    let path = std::path::Path::new(path);
    if !path.exists() {
        bail!("File not found: {}", path.display());
    }

    if !yes {
        println!(
            "{}",
            "This will replace all projects and items with the contents of the file.".red()
        );
        print!("Continue? [y/N] ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted");
            return Ok(());
        }
    }

    let report = snapshot::import_file(&mut store, path)?;

    if json {
        print_json(&report)?;
    } else {
        println!(
            "{} Imported {} project(s) and {} item(s)",
            "✓".green(),
            report.projects,
            report.items
        );
    }
    Ok(())
}

// Config

pub fn config_show(json: bool) -> Result<()> {
    let (_, config) = open()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", "Current configuration:".bold());
        println!();
        println!("seed_on_empty = {}", config.seed_on_empty);
        println!();
        println!("[server]");
        println!("host = \"{}\"", config.server.host);
        println!("port = {}", config.server.port);
        println!();
        println!("[review]");
        println!("upcoming_days = {}", config.review.upcoming_days);
        println!();
        println!("[display]");
        println!("colors = {}", config.display.colors);
        println!("date_format = \"{}\"", config.display.date_format);
        println!("max_title_length = {}", config.display.max_title_length);
    }
    Ok(())
}

pub fn config_reset() -> Result<()> {
    let (store, _) = open()?;
    std::fs::write(store.config_path(), Config::default_with_comments())?;
    println!("{} Configuration reset to defaults", "✓".green());
    Ok(())
}

pub fn config_path() -> Result<()> {
    let store = Store::open()?;
    println!("{}", store.config_path().display());
    Ok(())
}

pub fn config_get(key: &str, json: bool) -> Result<()> {
    let (_, config) = open()?;
    let config_json = serde_json::to_value(&config)?;

    // "display.colors" -> ["display", "colors"]
    let mut value = &config_json;
    for part in key.split('.') {
        value = value
            .get(part)
            .ok_or_else(|| anyhow!("Config key not found: {key}"))?;
    }

    if json {
        println!("{}", serde_json::to_string(value)?);
    } else {
        match value {
            serde_json::Value::String(s) => println!("{}", s),
            serde_json::Value::Bool(b) => println!("{}", b),
            serde_json::Value::Number(n) => println!("{}", n),
            serde_json::Value::Null => println!("null"),
            _ => println!("{}", serde_json::to_string_pretty(value)?),
        }
    }
    Ok(())
}

pub fn config_set(key: &str, value: &str) -> Result<()> {
    let (store, mut config) = open()?;
    config.set(key, value)?;
    config.save(&store.config_path())?;
    println!("{} Set {} = {}", "✓".green(), key, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long title", 6), "a lon…");
        assert_eq!(truncate("unbounded", 0), "unbounded");
    }

    #[test]
    fn test_parse_due_accepts_dates() {
        assert!(parse_due("2025-03-01").is_ok());
        assert!(parse_due("2025-03-01T09:30:00Z").is_ok());
        assert!(parse_due("next tuesday").is_err());
    }
}
