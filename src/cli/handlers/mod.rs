mod init;
pub use init::cmd_init;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, ConfigError};
use crate::io::file_store::FileStore;
use crate::io::store::{ListOrder, Store};
use crate::model::config::{Config, StoreConfig};
use crate::model::lookup::LookupKind;
use crate::model::todo::{MetaValue, Metadata, Priority, Todo};
use crate::ops::filter::{self, BaseFilter, FilterSpec};
use crate::ops::suggest::{self, Suggestion};
use crate::ops::todo_ops::{self, CreateInput, TodoPatch};
use crate::ops::{OpError, Patch, lookup_ops};
use crate::parse::{format_file, parse_date_token, parse_file};

/// An opened store and the config that came with it
struct Workspace {
    store: FileStore,
    config: Config,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        command,
        json,
        project_dir,
    } = cli;
    let project_dir = project_dir.as_deref();
    let workspace = || open_workspace(project_dir);

    match command {
        // Init and suggest work without an existing store
        Commands::Init(args) => cmd_init(args, project_dir),
        Commands::Suggest(args) => cmd_suggest(args, project_dir, json),

        // Read commands
        Commands::List(args) => cmd_list(&workspace()?, args, json),
        Commands::Show(args) => cmd_show(&workspace()?, args, json),
        Commands::Stats(args) => cmd_stats(&workspace()?, args, json),
        Commands::Export => cmd_export(&workspace()?, json),

        // Write commands
        Commands::Add(args) => cmd_add(&workspace()?, args, json),
        Commands::Done(args) => cmd_done(&workspace()?, args, json),
        Commands::Edit(args) => cmd_edit(&workspace()?, args, json),
        Commands::Set(args) => cmd_set(&workspace()?, args, json),
        Commands::Rm(args) => cmd_rm(&workspace()?, args, json),
        Commands::Import(args) => cmd_import(&workspace()?, args, json),

        // Project / area management
        Commands::Project(cmd) => cmd_lookup(&workspace()?, LookupKind::Project, cmd.action, json),
        Commands::Area(cmd) => cmd_lookup(&workspace()?, LookupKind::Area, cmd.action, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir(project_dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match project_dir {
        Some(dir) => Ok(fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

fn open_workspace(project_dir: Option<&str>) -> Result<Workspace, Box<dyn std::error::Error>> {
    let store_dir = config_io::discover_store_dir(&start_dir(project_dir)?)?;
    let config = config_io::read_config(&store_dir)?;
    let store = FileStore::open(
        &store_dir,
        Duration::from_millis(config.store.lock_timeout_ms),
    );
    tracing::debug!(dir = %store_dir.display(), "opened store");
    Ok(Workspace { store, config })
}

/// Build the view from list/stats flags, falling back to the configured default.
fn view_spec(args: &ViewArgs, config: &Config) -> Result<FilterSpec, Box<dyn std::error::Error>> {
    let base = if args.active {
        BaseFilter::Active
    } else if args.completed {
        BaseFilter::Completed
    } else if args.all {
        BaseFilter::All
    } else {
        config.list.default_filter
    };
    let query = args
        .search
        .as_deref()
        .map(filter::search_regex)
        .transpose()?;
    Ok(FilterSpec {
        base,
        project: args.project.clone(),
        area: args.area.clone(),
        query,
    })
}

fn print_todo(todo: &Todo, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&todo_to_json(todo))?);
    } else {
        println!("{}", format_todo_line(todo, true, 0));
    }
    Ok(())
}

/// Accept `A` or `(A)`, either case.
fn parse_priority(s: &str) -> Result<Priority, String> {
    let letter = s.trim().trim_start_matches('(').trim_end_matches(')');
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Priority::from_letter(c.to_ascii_uppercase())
            .ok_or_else(|| format!("invalid priority '{}' (expected A-D)", s)),
        _ => Err(format!("invalid priority '{}' (expected A-D)", s)),
    }
}

fn parse_date_arg(s: &str) -> Result<DateTime<Utc>, String> {
    parse_date_token(s.trim()).ok_or_else(|| format!("invalid date '{}' (expected YYYY-MM-DD)", s))
}

/// Parse `key=value`. An empty value means "remove this key".
fn parse_meta_arg(s: &str) -> Result<(String, Option<String>), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid metadata '{}' (expected KEY=VALUE)", s))?;
    let key = key.trim();
    if key.is_empty() || key.contains(':') || key.contains(char::is_whitespace) {
        return Err(format!("invalid metadata key '{}'", key));
    }
    let value = value.trim();
    if value.contains(char::is_whitespace) {
        return Err(format!("metadata value for '{}' cannot contain spaces", key));
    }
    let value = if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    };
    Ok((key.to_string(), value))
}

/// `--no-x` clears, `--x value` sets, neither leaves the field alone.
fn flag_patch<T>(value: Option<T>, clear: bool) -> Patch<T> {
    if clear {
        Patch::Clear
    } else {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Unchanged,
        }
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ws: &Workspace, args: ViewArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let spec = view_spec(&args, &ws.config)?;
    let tables = ws.store.load()?;
    let view = filter::filter(&tables.todos, &spec);

    if json {
        let results: Vec<TodoJson> = view.iter().map(todo_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for todo in &view {
            println!(
                "{}",
                format_todo_line(todo, ws.config.list.show_ids, ws.config.list.max_width)
            );
        }
    }
    Ok(())
}

fn cmd_show(ws: &Workspace, args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let tables = ws.store.load()?;
    let todo = todo_ops::find_by_id_prefix(&tables, &args.id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&todo_to_json(&todo))?);
    } else {
        for line in format_todo_detail(&todo) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_stats(ws: &Workspace, args: ViewArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let spec = view_spec(&args, &ws.config)?;
    let tables = ws.store.load()?;
    let view = filter::filter(&tables.todos, &spec);
    let stats = filter::stats(&view, &spec);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", format_stats(&stats));
    }
    Ok(())
}

fn cmd_export(ws: &Workspace, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let todos = ws.store.load()?.list_todos(ListOrder::CreatedAsc)?;
    if json {
        let results: Vec<TodoJson> = todos.iter().map(todo_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_file(&todos));
    }
    Ok(())
}

fn cmd_suggest(
    args: SuggestArgs,
    project_dir: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Outside a store there are simply no known names
    let (projects, areas) = match config_io::discover_store_dir(&start_dir(project_dir)?) {
        Ok(store_dir) => {
            let timeout = Duration::from_millis(StoreConfig::default().lock_timeout_ms);
            let tables = FileStore::open(&store_dir, timeout).load()?;
            (
                lookup_ops::lookup_names(&tables, LookupKind::Project)?,
                lookup_ops::lookup_names(&tables, LookupKind::Area)?,
            )
        }
        Err(ConfigError::NotFound) => (Vec::new(), Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let cursor = args.cursor.unwrap_or(args.text.len());
    let suggestion = suggest::suggest(&args.text, cursor, &projects, &areas);
    if json {
        println!("{}", serde_json::to_string_pretty(&suggestion)?);
        return Ok(());
    }
    match suggestion {
        Suggestion::None => println!("none"),
        Suggestion::Priority { candidates } => println!("priority: {}", candidates.join(" ")),
        Suggestion::Project { query, candidates } => {
            println!("project '{}': {}", query, candidates.join(" "))
        }
        Suggestion::Area { query, candidates } => {
            println!("area '{}': {}", query, candidates.join(" "))
        }
        Suggestion::DateKeyword => println!("due:YYYY-MM-DD"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ws: &Workspace, args: AddArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let todo = ws
        .store
        .transaction(|tx| todo_ops::apply_create(tx, CreateInput::from_line(&args.text)))?;
    if json {
        print_todo(&todo, true)?;
    } else {
        println!("{}", todo.id);
    }
    Ok(())
}

fn cmd_done(ws: &Workspace, args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let todo = ws.store.transaction(|tx| {
        let existing = todo_ops::find_by_id_prefix(&*tx, &args.id)?;
        todo_ops::toggle_completed(tx, &existing.id)
    })?;
    print_todo(&todo, json)
}

fn cmd_edit(ws: &Workspace, args: EditArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let todo = ws.store.transaction(|tx| {
        let existing = todo_ops::find_by_id_prefix(&*tx, &args.id)?;
        todo_ops::apply_text_edit(tx, &existing.id, &args.text)
    })?;
    print_todo(&todo, json)
}

fn cmd_set(ws: &Workspace, args: SetArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let priority = args.priority.as_deref().map(parse_priority).transpose()?;
    let due = args.due.as_deref().map(parse_date_arg).transpose()?;
    let completion_date = args
        .completion_date
        .as_deref()
        .map(parse_date_arg)
        .transpose()?;
    let meta_edits = args
        .meta
        .iter()
        .map(|m| parse_meta_arg(m))
        .collect::<Result<Vec<_>, _>>()?;

    let todo = ws.store.transaction(|tx| {
        let existing = todo_ops::find_by_id_prefix(&*tx, &args.id)?;
        let metadata = if args.no_meta {
            Some(Metadata::new())
        } else if meta_edits.is_empty() {
            None
        } else {
            let mut metadata = existing.metadata.clone();
            for (key, value) in &meta_edits {
                match value {
                    Some(v) => {
                        metadata.insert(key.clone(), MetaValue::from(v.as_str()));
                    }
                    None => {
                        metadata.shift_remove(key);
                    }
                }
            }
            Some(metadata)
        };
        let patch = TodoPatch {
            description: args.description.clone(),
            completed: args.completed,
            completion_date: flag_patch(completion_date, args.no_completion_date),
            priority: flag_patch(priority, args.no_priority),
            due_date: flag_patch(due, args.no_due),
            project_name: flag_patch(args.project.clone(), args.no_project),
            area_name: flag_patch(args.area.clone(), args.no_area),
            metadata,
            raw_text: None,
        };
        todo_ops::apply_update(tx, &existing.id, patch)
    })?;
    print_todo(&todo, json)
}

fn cmd_rm(ws: &Workspace, args: IdArg, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (id, deleted) = ws.store.transaction(|tx| {
        // An unknown id falls through to a no-op delete
        let id = match todo_ops::find_by_id_prefix(&*tx, &args.id) {
            Ok(todo) => todo.id,
            Err(OpError::NotFound(_)) => args.id.clone(),
            Err(e) => return Err(e),
        };
        let deleted = todo_ops::delete_todo(tx, &id)?;
        Ok::<_, OpError>((id, deleted))
    })?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&DeleteJson { id, deleted })?
        );
    } else if deleted {
        println!("deleted {}", id);
    } else {
        println!("no todo matching {}", args.id);
    }
    Ok(())
}

fn cmd_import(ws: &Workspace, args: ImportArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(&args.file)
        .map_err(|e| format!("cannot read {}: {}", args.file, e))?;
    let parsed = parse_file(&content);

    let (imported, skipped) = ws.store.transaction(|tx| {
        let mut imported = 0;
        let mut skipped = 0;
        for todo in parsed {
            let line = todo.raw_text.clone();
            match todo_ops::apply_create(tx, CreateInput::from_todo(todo)) {
                Ok(_) => imported += 1,
                Err(OpError::Validation(reason)) => {
                    tracing::warn!(%line, %reason, "skipped line");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok::<_, OpError>((imported, skipped))
    })?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ImportJson { imported, skipped })?
        );
    } else {
        println!("imported {} todos ({} skipped)", imported, skipped);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Project / area management
// ---------------------------------------------------------------------------

fn cmd_lookup(
    ws: &Workspace,
    kind: LookupKind,
    action: LookupAction,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let sigil = kind.sigil();
    match action {
        LookupAction::List => {
            let names = lookup_ops::lookup_names(&ws.store.load()?, kind)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&LookupListJson { kind, names })?
                );
            } else {
                for name in &names {
                    println!("{}{}", sigil, name);
                }
            }
        }
        LookupAction::Add(arg) => {
            let name = ws
                .store
                .transaction(|tx| lookup_ops::add_lookup(tx, kind, &arg.name))?;
            if json {
                let change = LookupChangeJson {
                    kind,
                    name,
                    renamed_to: None,
                    todos_updated: 0,
                };
                println!("{}", serde_json::to_string_pretty(&change)?);
            } else {
                println!("added {}{}", sigil, name);
            }
        }
        LookupAction::Rename(args) => {
            let updated = ws
                .store
                .transaction(|tx| lookup_ops::rename_lookup(tx, kind, &args.old, &args.new))?;
            let new_name = args.new.trim().to_string();
            if json {
                let change = LookupChangeJson {
                    kind,
                    name: args.old,
                    renamed_to: Some(new_name),
                    todos_updated: updated,
                };
                println!("{}", serde_json::to_string_pretty(&change)?);
            } else {
                println!(
                    "renamed {}{} to {}{} ({} todos updated)",
                    sigil, args.old, sigil, new_name, updated
                );
            }
        }
        LookupAction::Rm(arg) => {
            let detached = ws
                .store
                .transaction(|tx| lookup_ops::delete_lookup(tx, kind, &arg.name))?;
            if json {
                let change = LookupChangeJson {
                    kind,
                    name: arg.name,
                    renamed_to: None,
                    todos_updated: detached,
                };
                println!("{}", serde_json::to_string_pretty(&change)?);
            } else {
                println!("deleted {}{} ({} todos detached)", sigil, arg.name, detached);
            }
        }
    }
    Ok(())
}
