use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

use appraisal_score::access::Role;
use appraisal_score::config::{self, Config};
use appraisal_score::output;
use appraisal_score::records::{FieldEdit, LineItem};
use appraisal_score::scoring::{
    validate_categories, CategoryConfig, ListError, Outcome, OverrideScore, ScoredList,
};
use appraisal_score::store::{self, AppraisalFile};

const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE: i32 = 1;
const EXIT_REJECTED: i32 = 2;
const EXIT_OVERRIDE: i32 = 3;
const EXIT_CONFIG: i32 = 4;
const EXIT_STORAGE: i32 = 5;

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured categories and their scoring tables
    Categories,
    /// Create an empty appraisal file for a category
    Init {
        file: PathBuf,
        /// Category id (see `categories`)
        #[arg(long)]
        category: String,
        /// Employee the records belong to
        #[arg(long)]
        employee: Option<String>,
    },
    /// Show the records, total and override score
    Show {
        file: PathBuf,
        /// Tab-separated output for scripting
        #[arg(long)]
        tsv: bool,
    },
    /// Edit one field of a row
    Edit {
        file: PathBuf,
        /// Row number (1-based, as shown by `show`)
        row: usize,
        /// A text field key, `co_authors` or `role`
        field: String,
        value: String,
    },
    /// Append a blank row, optionally filling it in
    Add {
        file: PathBuf,
        /// Edits applied to the new row, as field=value
        #[arg(long = "set")]
        set: Vec<String>,
    },
    /// Delete a row
    Delete {
        file: PathBuf,
        /// Row number (1-based, as shown by `show`)
        row: usize,
    },
    /// Record the reviewer's override score
    Override { file: PathBuf, value: String },
}

#[derive(Parser, Debug)]
#[command(name = "appraisal-score")]
#[command(about = "Capped self-appraisal scoring for publication records", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/appraisal-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Acting role: editor, read-only-viewer or override-scorer
    #[arg(short, long, global = true)]
    role: Option<Role>,

    /// Actor identifier, recorded in diagnostics only
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// The host side of one appraisal file: the engine plus whatever it reported upward.
struct Session {
    path: PathBuf,
    file: AppraisalFile,
    list: ScoredList,
    overrides: OverrideScore,
    changed_records: Rc<RefCell<Option<Vec<LineItem>>>>,
    changed_override: Rc<RefCell<Option<String>>>,
}

impl Session {
    fn open(
        path: &Path,
        file: AppraisalFile,
        category: &CategoryConfig,
        role: Role,
        actor: Option<&str>,
    ) -> Self {
        let changed_records = Rc::new(RefCell::new(None));
        let records_sink = Rc::clone(&changed_records);
        let mut list = ScoredList::new(category.clone(), role)
            .with_actor(actor)
            .with_listener(move |records: &[LineItem]| {
                *records_sink.borrow_mut() = Some(records.to_vec());
            });
        list.apply_external_update(file.items.clone());

        let changed_override = Rc::new(RefCell::new(None));
        let override_sink = Rc::clone(&changed_override);
        let overrides = OverrideScore::new(category.max_score, role)
            .with_value(file.override_score.clone())
            .with_listener(move |value: &str| {
                *override_sink.borrow_mut() = Some(value.to_string());
            });

        Self {
            path: path.to_path_buf(),
            file,
            list,
            overrides,
            changed_records,
            changed_override,
        }
    }

    /// Write back whatever the engine notified. Returns whether anything was saved.
    fn save(&mut self) -> anyhow::Result<bool> {
        let records = self.changed_records.borrow_mut().take();
        let override_value = self.changed_override.borrow_mut().take();
        if records.is_none() && override_value.is_none() {
            return Ok(false);
        }
        if let Some(records) = records {
            self.file.items = records;
        }
        if let Some(value) = override_value {
            self.file.override_score = Some(value);
        }
        self.file.touch();
        store::save_appraisal(&self.path, &self.file)?;
        Ok(true)
    }

    fn print(&self, use_colors: bool) {
        println!("{}", output::format_list(&self.list, use_colors));
        if let Some(line) =
            output::format_override(self.overrides.value(), self.list.category().max_score, use_colors)
        {
            println!("{}", line);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "appraisal_score=debug"
    } else {
        "appraisal_score=error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn row_index(row: usize) -> usize {
    match row.checked_sub(1) {
        Some(index) => index,
        None => {
            eprintln!("Row numbers start at 1.");
            std::process::exit(EXIT_USAGE);
        }
    }
}

fn open_session(path: &Path, config: &Config, role: Role, actor: Option<&str>) -> Session {
    let file = match store::load_appraisal(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Storage error: {:#}", e);
            std::process::exit(EXIT_STORAGE);
        }
    };
    let category = match config.category(&file.category) {
        Some(c) => c,
        None => {
            eprintln!(
                "Category '{}' from {} is not configured.",
                file.category,
                path.display()
            );
            std::process::exit(EXIT_CONFIG);
        }
    };
    Session::open(path, file, category, role, actor)
}

fn save_or_exit(session: &mut Session) {
    match session.save() {
        Ok(saved) => tracing::debug!(saved, path = %session.path.display(), "synced appraisal file"),
        Err(e) => {
            eprintln!("Storage error: {:#}", e);
            std::process::exit(EXIT_STORAGE);
        }
    }
}

/// Append a row and fill it in, stopping at the first edit that is not applied.
fn add_with_edits(list: &mut ScoredList, edits: Vec<FieldEdit>) -> Result<Outcome, ListError> {
    let outcome = list.add_row();
    if !outcome.is_applied() {
        return Ok(outcome);
    }
    let index = list.items().len() - 1;
    for edit in edits {
        let result = list.edit_field(index, edit);
        if result != Ok(Outcome::Applied) {
            return result;
        }
    }
    Ok(outcome)
}

/// Report a list operation result and pick the exit code.
fn finish_list_op(session: &mut Session, result: Result<Outcome, ListError>, use_colors: bool) -> i32 {
    // Earlier edits of the same command may have notified even if this one failed
    save_or_exit(session);
    match result {
        Ok(Outcome::Applied) | Ok(Outcome::Unchanged) => {
            session.print(use_colors);
            EXIT_SUCCESS
        }
        Ok(Outcome::Rejected) => {
            session.print(use_colors);
            EXIT_REJECTED
        }
        Ok(Outcome::NotPermitted) => {
            eprintln!("Nothing changed: role {} cannot modify records.", session.list.role());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            EXIT_USAGE
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.map(PathBuf::from);
    let config = match config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate categories at startup
    if let Err(errors) = validate_categories(&config.categories) {
        eprintln!("Category config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let role = cli.role.or(config.default_role).unwrap_or_default();
    let actor = cli.actor.as_deref();
    let use_colors = output::should_use_colors();

    let code = match cli.command {
        Commands::Categories => {
            for category in &config.categories {
                println!("{}", output::format_category_summary(category, use_colors));
            }
            EXIT_SUCCESS
        }
        Commands::Init {
            file,
            category,
            employee,
        } => {
            if config.category(&category).is_none() {
                eprintln!("Unknown category '{}'. See `appraisal-score categories`.", category);
                std::process::exit(EXIT_CONFIG);
            }
            if file.exists() {
                eprintln!("{} already exists.", file.display());
                std::process::exit(EXIT_STORAGE);
            }
            let appraisal = AppraisalFile::new(&category, employee);
            if let Err(e) = store::save_appraisal(&file, &appraisal) {
                eprintln!("Storage error: {:#}", e);
                std::process::exit(EXIT_STORAGE);
            }
            println!("Created {} for category {}", file.display(), category);
            EXIT_SUCCESS
        }
        Commands::Show { file, tsv } => {
            let session = open_session(&file, &config, role, actor);
            if tsv {
                let rows = output::format_tsv(session.list.items(), session.list.category());
                if !rows.is_empty() {
                    println!("{}", rows);
                }
            } else {
                session.print(use_colors);
            }
            EXIT_SUCCESS
        }
        Commands::Edit {
            file,
            row,
            field,
            value,
        } => {
            let index = row_index(row);
            let edit = match FieldEdit::parse(&field, &value) {
                Ok(edit) => edit,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(EXIT_USAGE);
                }
            };
            let mut session = open_session(&file, &config, role, actor);
            let result = session.list.edit_field(index, edit);
            finish_list_op(&mut session, result, use_colors)
        }
        Commands::Add { file, set } => {
            let edits: Vec<FieldEdit> = match set
                .iter()
                .map(|s| FieldEdit::parse_assignment(s))
                .collect::<Result<_, _>>()
            {
                Ok(edits) => edits,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(EXIT_USAGE);
                }
            };
            let mut session = open_session(&file, &config, role, actor);
            let rows_before = session.list.items().len();
            let result = add_with_edits(&mut session.list, edits);
            if result == Ok(Outcome::Unchanged) {
                eprintln!(
                    "Nothing changed: the total already reached {}.",
                    session.list.category().max_score
                );
            }
            if session.list.items().len() > rows_before && session.changed_records.borrow().is_none() {
                eprintln!("Row added; it is saved once one of its fields is edited.");
            }
            finish_list_op(&mut session, result, use_colors)
        }
        Commands::Delete { file, row } => {
            let index = row_index(row);
            let mut session = open_session(&file, &config, role, actor);
            let result = session.list.delete_row(index);
            finish_list_op(&mut session, result, use_colors)
        }
        Commands::Override { file, value } => {
            let mut session = open_session(&file, &config, role, actor);
            match session.overrides.set(&value) {
                Ok(Outcome::NotPermitted) => {
                    eprintln!("Nothing changed: role {} cannot set the override score.", role);
                    EXIT_SUCCESS
                }
                Ok(_) => {
                    save_or_exit(&mut session);
                    session.print(use_colors);
                    EXIT_SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", e);
                    EXIT_OVERRIDE
                }
            }
        }
    };

    std::process::exit(code);
}
