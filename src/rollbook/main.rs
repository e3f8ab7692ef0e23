use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use rollbook::config::{ConfigAction, RollbookConfig, CONFIG_KEYS};
use rollbook::error::{RecordsError, Result};
use rollbook::model::StudentRecord;
use rollbook::notify::{Toast, ToastQueue};
use rollbook::records::RecordStore;
use rollbook::sort::{sort_records, SortDirection, SortField, SortState};
use rollbook::store::fs_backend::FsBackend;
use rollbook::store::RecordTable;
use rollbook::theme::{Theme, ThemeSetting};
use rollbook::transfer::{DirSink, TransferManager};
use rollbook::validation::{validate_form, RawForm};
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

mod args;
use args::{Cli, Commands, ExportFormat, RecordFields};

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

struct AppContext {
    store: RecordStore<Rc<FsBackend>>,
    toasts: ToastQueue,
    backend: Rc<FsBackend>,
    config: RollbookConfig,
    data_dir: PathBuf,
}

/// Returns Ok(false) when the command ran but reported a failure.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut ctx = init_context(&cli)?;

    let outcome = match cli.command {
        Some(Commands::List {
            search,
            sort,
            desc,
            csv,
        }) => handle_list(&mut ctx, search, &sort, desc, csv),
        Some(Commands::Add { fields }) => handle_add(&mut ctx, fields),
        Some(Commands::Edit { id, fields }) => handle_edit(&mut ctx, &id, fields),
        Some(Commands::View { id }) => handle_view(&ctx, &id),
        Some(Commands::Delete { id }) => handle_delete(&mut ctx, &id),
        Some(Commands::Search { query }) => handle_list(&mut ctx, Some(query), "name", false, false),
        Some(Commands::Clear { yes }) => handle_clear(&mut ctx, yes),
        Some(Commands::Export { format, out }) => handle_export(&ctx, format, out),
        Some(Commands::Import { file }) => handle_import(&mut ctx, file),
        Some(Commands::Theme { value }) => handle_theme(&ctx, value),
        Some(Commands::Config { key, value }) => handle_config(&mut ctx, key, value),
        None => handle_list(&mut ctx, None, "name", false, false),
    };

    print_toasts(&ctx.toasts.drain());
    outcome
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rollbook={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => ProjectDirs::from("com", "rollbook", "rollbook")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| RecordsError::Config("Could not determine data dir".to_string()))?,
    };
    let config = RollbookConfig::load(&data_dir)?;

    let backend = Rc::new(FsBackend::new(data_dir.clone()));
    let toasts = ToastQueue::new(config.toast_duration_ms);
    let table = RecordTable::with_key(Rc::clone(&backend), &config.records_key);
    let mut store = RecordStore::new(table, toasts.clone());
    store.load();

    Ok(AppContext {
        store,
        toasts,
        backend,
        config,
        data_dir,
    })
}

fn handle_list(
    ctx: &mut AppContext,
    search: Option<String>,
    sort: &str,
    desc: bool,
    csv: bool,
) -> Result<bool> {
    let field = sort.parse::<SortField>().map_err(RecordsError::Validation)?;
    let direction = if desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };

    if let Some(query) = search {
        ctx.store.search(&query);
    }
    let rows = sort_records(ctx.store.filtered_records(), SortState::new(field, direction));

    if csv {
        return Ok(transfer_manager(ctx, None).export_view_csv(&rows));
    }
    print_records(&rows);
    Ok(true)
}

fn handle_add(ctx: &mut AppContext, fields: RecordFields) -> Result<bool> {
    let raw = raw_form(fields, RawForm::default());
    let form = match validate_form(&raw) {
        Ok(form) => form,
        Err(errors) => {
            print_form_errors(&errors.messages());
            return Ok(false);
        }
    };
    let ok = ctx.store.add(form);
    if ok {
        if let Some(added) = ctx.store.records().last() {
            println!("{}", added.id.dimmed());
        }
    }
    Ok(ok)
}

fn handle_edit(ctx: &mut AppContext, id: &str, fields: RecordFields) -> Result<bool> {
    let existing = resolve_record(ctx, id)?;
    let raw = raw_form(fields, RawForm::from(&existing.to_form()));
    let form = match validate_form(&raw) {
        Ok(form) => form,
        Err(errors) => {
            print_form_errors(&errors.messages());
            return Ok(false);
        }
    };
    Ok(ctx.store.update(&existing.id, form))
}

fn handle_view(ctx: &AppContext, id: &str) -> Result<bool> {
    let record = resolve_record(ctx, id)?;
    print_full_record(&record);
    Ok(true)
}

fn handle_delete(ctx: &mut AppContext, id: &str) -> Result<bool> {
    let record = resolve_record(ctx, id)?;
    Ok(ctx.store.delete(&record.id))
}

fn handle_clear(ctx: &mut AppContext, yes: bool) -> Result<bool> {
    if !yes {
        println!(
            "This deletes all {} student records. Re-run with --yes to confirm.",
            ctx.store.records().len()
        );
        return Ok(false);
    }
    Ok(ctx.store.clear_all())
}

fn handle_export(ctx: &AppContext, format: ExportFormat, out: Option<PathBuf>) -> Result<bool> {
    let transfer = transfer_manager(ctx, out);
    let ok = match format {
        ExportFormat::Json => transfer.export_json(&ctx.store),
        ExportFormat::Csv => transfer.export_csv(&ctx.store),
    };
    Ok(ok)
}

fn handle_import(ctx: &mut AppContext, file: PathBuf) -> Result<bool> {
    let transfer = transfer_manager(ctx, None);
    let max_bytes = ctx.config.max_import_bytes;
    Ok(transfer.import_path(&mut ctx.store, &file, max_bytes))
}

fn handle_theme(ctx: &AppContext, value: Option<String>) -> Result<bool> {
    let setting = ThemeSetting::with_key(Rc::clone(&ctx.backend), &ctx.config.theme_key);
    let theme = match value.as_deref() {
        None => setting.current(),
        Some("toggle") => setting.toggle()?,
        Some(other) => {
            let theme: Theme = other.parse()?;
            setting.set(theme)?;
            theme
        }
    };
    println!("theme = {}", theme);
    Ok(true)
}

fn handle_config(ctx: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<bool> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    match action {
        ConfigAction::ShowAll => {
            for key in CONFIG_KEYS {
                println!("{} = {}", key, ctx.config.get(key)?);
            }
        }
        ConfigAction::ShowKey(key) => println!("{} = {}", key, ctx.config.get(&key)?),
        ConfigAction::Set(key, value) => {
            ctx.config.set(&key, &value)?;
            ctx.config.save(&ctx.data_dir)?;
            println!("{} = {}", key, ctx.config.get(&key)?);
        }
    }
    Ok(true)
}

fn transfer_manager(ctx: &AppContext, out: Option<PathBuf>) -> TransferManager<DirSink> {
    let dir = out
        .or_else(|| ctx.config.export_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    TransferManager::new(DirSink::new(dir), ctx.toasts.clone())
}

/// Finds a record by full id or by a prefix that matches exactly one record.
fn resolve_record(ctx: &AppContext, id: &str) -> Result<StudentRecord> {
    if let Some(record) = ctx.store.get_by_id(id) {
        return Ok(record);
    }
    let mut matches = ctx.store.records().iter().filter(|r| r.id.starts_with(id));
    match (matches.next(), matches.next()) {
        (Some(record), None) if !id.is_empty() => Ok(record.clone()),
        (Some(_), Some(_)) => Err(RecordsError::Validation(format!(
            "Ambiguous id prefix: {}",
            id
        ))),
        _ => Err(RecordsError::RecordNotFound(id.to_string())),
    }
}

fn raw_form(fields: RecordFields, base: RawForm) -> RawForm {
    RawForm {
        name: fields.name.or(base.name),
        branch: fields.branch.or(base.branch),
        class: fields.class.or(base.class),
        roll_no: fields.roll_no.or(base.roll_no),
        honours_degree: fields
            .honours_degree
            .or(base.honours_degree)
            .or_else(|| Some("None".to_string())),
        email: fields.email.or(base.email),
    }
}

fn print_form_errors(messages: &[String]) {
    for message in messages {
        eprintln!("{}", message.red());
    }
}

fn print_toasts(toasts: &[Toast]) {
    for toast in toasts {
        let line = match &toast.description {
            Some(d) if !d.is_empty() => format!("{}: {}", toast.title, d),
            _ => toast.title.clone(),
        };
        if toast.is_error() {
            eprintln!("{}", line.red());
        } else {
            println!("{}", line.green());
        }
    }
}

fn print_full_record(r: &StudentRecord) {
    println!("{}", r.name.bold());
    println!("--------------------------------");
    println!("Id:             {}", r.id);
    println!("Roll No:        {}", r.roll_no);
    println!("Branch:         {}", r.branch);
    println!("Class:          {}", r.class);
    println!("Honours Degree: {}", r.honours_degree);
    println!("Email:          {}", r.email);
    println!("Created:        {}", r.created_at.to_rfc3339());
    println!("Updated:        {}", r.updated_at.to_rfc3339());
}

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const ID_WIDTH: usize = 8;

fn print_records(records: &[StudentRecord]) {
    if records.is_empty() {
        println!("No students found.");
        return;
    }

    for r in records {
        let short_id: String = r.id.chars().take(ID_WIDTH).collect();
        let left = format!(
            "{:<id$}  {:>6}  {:<5} {:<3} ",
            short_id,
            r.roll_no,
            r.branch.as_str(),
            r.class.as_str(),
            id = ID_WIDTH
        );
        let time_ago = format_time_ago(r.updated_at);

        let details = format!("{}  <{}>  {}", r.name, r.email, r.honours_degree);
        let available = LINE_WIDTH.saturating_sub(left.width() + TIME_WIDTH);
        let details = truncate_to_width(&details, available);
        let padding = available.saturating_sub(details.width());

        println!(
            "{}{}{}{}",
            left.dimmed(),
            details,
            " ".repeat(padding),
            time_ago.dimmed()
        );
    }
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
