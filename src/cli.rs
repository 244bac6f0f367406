// AMV Notation CLI binary

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use amv_notation_lib::bareme::{parse_bareme, storage::load_bareme_files, Bareme, BaremeRegistry};
use amv_notation_lib::config::AppPaths;
use amv_notation_lib::constants::{BAREMES_FOLDER, PROJECTS_FOLDER};
use amv_notation_lib::notation::NotationStore;
use amv_notation_lib::project::{audit_imported_judge, export_json_file, list_projects};
use amv_notation_lib::results::{AveragePolicy, ResultsOptions, SortMode};
use amv_notation_lib::scoring::format_number;
use amv_notation_lib::NotationSession;

#[derive(Parser)]
#[command(name = "amvnote")]
#[command(about = "AMV Notation - scoring tools for AMV competition judges", long_about = None)]
#[command(version)]
struct Cli {
    /// Application folder (defaults to AMV_NOTATION_HOME, then Documents/AMV Notation)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the multi-judge results table of a project
    Results {
        /// Project file
        project: PathBuf,
        #[arg(long, value_enum, default_value = "folder")]
        sort: SortArg,
        #[arg(long, value_enum, default_value = "all")]
        policy: PolicyArg,
        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report scoring progress and invalid imported scores
    Check {
        /// Project file
        project: PathBuf,
    },

    /// Work with rubrics
    Bareme {
        #[command(subcommand)]
        action: BaremeAction,
    },

    /// Write the ranked results export document
    Export {
        /// Project file
        project: PathBuf,
        /// Output JSON file
        output: PathBuf,
        #[arg(long, value_enum, default_value = "all")]
        policy: PolicyArg,
        /// Rank on one judge's totals (0 = current judge)
        #[arg(long)]
        judge: Option<usize>,
    },

    /// List project files
    Projects {
        /// Folder to scan (defaults to the application projects folder)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum BaremeAction {
    /// Parse a rubric file and print its criteria
    Validate {
        file: PathBuf,
    },
    /// List the official rubric and the custom ones
    List {
        /// Rubrics folder (defaults to the application rubrics folder)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Print the official rubric as JSON
    ShowOfficial,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Folder,
    Score,
}

impl From<SortArg> for SortMode {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Folder => SortMode::Folder,
            SortArg::Score => SortMode::Score,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Every judge counts, missing scores as 0
    All,
    /// Only judges who scored the clip
    Scored,
}

impl From<PolicyArg> for AveragePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::All => AveragePolicy::AllJudges,
            PolicyArg::Scored => AveragePolicy::ScoringJudgesOnly,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = resolve_paths(cli.home)?;

    match cli.command {
        Commands::Results { project, sort, policy, json } => cmd_results(&paths, &project, sort, policy, json),
        Commands::Check { project } => cmd_check(&paths, &project),
        Commands::Bareme { action } => match action {
            BaremeAction::Validate { file } => cmd_bareme_validate(&file),
            BaremeAction::List { dir } => cmd_bareme_list(&paths, dir),
            BaremeAction::ShowOfficial => cmd_bareme_show_official(),
        },
        Commands::Export { project, output, policy, judge } => cmd_export(&paths, &project, &output, policy, judge),
        Commands::Projects { dir } => cmd_projects(&paths, dir),
    }
}

fn cmd_results(paths: &AppPaths, project: &Path, sort: SortArg, policy: PolicyArg, json: bool) -> Result<()> {
    let session = open_session(paths, project)?;
    let options = ResultsOptions { sort: sort.into(), policy: policy.into(), ..Default::default() };
    let table = session.results(options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    let name = session.project().map(|p| p.name.as_str()).unwrap_or("");
    println!("Project: {} ({} clips, {} judges)", name, table.rows.len(), table.judges.len());
    if session.hide_totals() {
        println!("Totals are hidden until every clip is scored.");
    }
    println!();

    let judge_header: Vec<String> = table.judges.iter().map(|j| format!("{:>10}", truncate(&j.judge_name, 10))).collect();
    println!("{:<30}  {}  {:>8}", "Clip", judge_header.join("  "), "Average");
    println!("{}", "-".repeat(42 + 12 * table.judges.len()));

    for row in &table.rows {
        let label = match &row.clip.author {
            Some(author) => format!("{} - {}", author, row.clip.display_name),
            None => row.clip.display_name.clone(),
        };
        let totals: Vec<String> = row.judge_totals.iter().map(|t| format!("{:>10}", format_number(*t))).collect();
        println!("{:<30}  {}  {:>8}", truncate(&label, 30), totals.join("  "), format_number(row.average_total));
    }

    Ok(())
}

fn cmd_check(paths: &AppPaths, project: &Path) -> Result<()> {
    let session = open_session(paths, project)?;
    let bareme = session
        .current_bareme()
        .ok_or_else(|| anyhow::anyhow!("No bareme available for this project"))?;

    let progress = session.progress();
    println!("Bareme: {} ({} points)", bareme.name, format_number(bareme.total_points()));
    println!(
        "Progress: {}/{} clips scored ({}%), {} remaining",
        progress.scored, progress.total, progress.percentage, progress.remaining
    );

    let incomplete: Vec<_> = session
        .clips()
        .iter()
        .filter(|c| !session.store().is_clip_complete(&c.id))
        .collect();
    if !incomplete.is_empty() {
        println!();
        println!("Incomplete clips:");
        for clip in incomplete {
            println!("  {} ({})", clip.display_name, clip.file_name);
        }
    }

    let mut problems = 0;
    for judge in session.imported_judges() {
        for entry in audit_imported_judge(judge, bareme) {
            if problems == 0 {
                println!();
                println!("Invalid imported scores:");
            }
            problems += 1;
            println!("  {} / {} / {}: {}", judge.judge_name, entry.clip_id, entry.criterion_id, entry.errors.join(", "));
        }
    }

    if problems == 0 {
        println!();
        println!("No invalid imported scores.");
    }
    Ok(())
}

fn cmd_bareme_validate(file: &Path) -> Result<()> {
    let content = fs::read_to_string(file)?;
    let raw: serde_json::Value = serde_json::from_str(&content)?;
    let bareme = parse_bareme(&raw)?;
    print_bareme(&bareme);
    Ok(())
}

fn cmd_bareme_list(paths: &AppPaths, dir: Option<PathBuf>) -> Result<()> {
    let folder = dir.unwrap_or_else(|| baremes_folder(paths));
    let mut registry = BaremeRegistry::new();
    let custom = registry.load_custom(&load_bareme_files(&folder)?);

    println!("{:<24}  {:<30}  {:>8}  {:>6}", "ID", "Name", "Criteria", "Points");
    println!("{}", "-".repeat(74));
    for bareme in registry.available() {
        println!(
            "{:<24}  {:<30}  {:>8}  {:>6}",
            truncate(&bareme.id, 24),
            truncate(&bareme.name, 30),
            bareme.criteria().len(),
            format_number(bareme.total_points())
        );
    }
    println!();
    println!("{} custom baremes in {}", custom, folder.display());
    Ok(())
}

fn cmd_bareme_show_official() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&Bareme::official())?);
    Ok(())
}

fn cmd_export(paths: &AppPaths, project: &Path, output: &Path, policy: PolicyArg, judge: Option<usize>) -> Result<()> {
    let session = open_session(paths, project)?;
    let options = ResultsOptions { policy: policy.into(), ..Default::default() };
    let export = session.export_results(options, judge)?;
    export_json_file(output, &export)?;
    println!("Exported {} ranked clips to {}", export.rows.len(), output.display());
    Ok(())
}

fn cmd_projects(paths: &AppPaths, dir: Option<PathBuf>) -> Result<()> {
    let folder = dir.unwrap_or_else(|| paths.root().join(PROJECTS_FOLDER));
    let projects = list_projects(&folder)?;

    if projects.is_empty() {
        println!("No projects found in {}", folder.display());
        return Ok(());
    }

    println!("{:<30}  {:<16}  {:>10}  {:>12}", "Name", "Judge", "Scored", "Updated");
    println!("{}", "-".repeat(74));
    for p in projects {
        let updated = p.updated_at.split('T').next().unwrap_or(&p.updated_at).to_string();
        println!(
            "{:<30}  {:<16}  {:>10}  {:>12}",
            truncate(&p.name, 30),
            truncate(&p.judge_name, 16),
            format!("{}/{}", p.scored_count, p.clip_count),
            updated
        );
    }
    Ok(())
}

// --- Helper Functions ---

fn resolve_paths(home: Option<PathBuf>) -> Result<AppPaths> {
    match home {
        Some(path) => Ok(AppPaths::at(path)),
        None => Ok(AppPaths::default_location()?),
    }
}

/// Rubrics folder without creating it
fn baremes_folder(paths: &AppPaths) -> PathBuf {
    paths.root().join(PROJECTS_FOLDER).join(BAREMES_FOLDER)
}

/// Session over a project file, with the project's folder and the app folder searched for rubrics
fn open_session(paths: &AppPaths, project: &Path) -> Result<NotationSession> {
    if !project.exists() {
        anyhow::bail!("Project file not found: {}", project.display());
    }

    let mut items = load_bareme_files(&baremes_folder(paths))?;
    if let Some(dir) = project.parent() {
        items.extend(load_bareme_files(&dir.join(BAREMES_FOLDER))?);
    }
    let mut registry = BaremeRegistry::new();
    registry.load_custom(&items);

    let mut session = NotationSession::with_store(NotationStore::with_registry(registry));
    session.load_project_file(project)?;
    Ok(session)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
