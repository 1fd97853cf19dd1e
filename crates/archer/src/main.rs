//! Binary entry point for the archer CLI.
//!
//! Loads a dataset, builds filters from the command line and prints JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Projects on a dependency path from web to api, at most two edges long
//! archer projects -i 'web -2-> api'
//!
//! # Dependency edges, dropping anything under the legacy group
//! archer deps -e 'root:legacy'
//!
//! # Files of the core project touched by Ana
//! archer files --proj core --person ana
//!
//! # Validate a rule without loading data
//! archer check --rule 're:^org: | *-api'
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info};

use archer_core::config::{CliOverrides, ResolvedConfig};
use archer_core::error::{ArcherError, OutputErrorCode};
use archer_core::filter::{
    filter_dependencies, filter_projects, CommitFilter, FileFilter, ParseOptions, Policy,
    ProjectFilter, ProjectFilterSet,
};
use archer_core::model::{Dataset, ListMode, PersonId, Projects};
use archer_core::output::{
    emit_response, CheckResponse, CommitInfo, CommitsResponse, DependenciesResponse,
    DependencyInfo, ErrorResponse, FileInfo, FilesResponse, PeopleResponse, PersonInfo,
    ProjectInfo, ProjectsResponse, ReposResponse, RepositoryInfo,
};
use archer_core::query::{Query, QueryParams};

// ============================================================================
// CLI Structure
// ============================================================================

/// Slice software-project metadata with a small filter DSL.
///
/// All output is JSON on stdout; logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "archer", version, about = "Slice project metadata with filter rules")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Workspace root directory (default: current directory).
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Dataset file (default: archer.json in the workspace).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Depth bound for edge rules that give none (default: unbounded).
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Format of the log lines written to stderr.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

/// Format of the log lines written to stderr.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Project rule flags shared by `projects` and `deps`.
#[derive(clap::Args, Debug, Default)]
struct ProjectArgs {
    /// Keep projects matching this rule (repeatable).
    #[arg(short = 'i', long = "include")]
    include: Vec<String>,
    /// Drop projects matching this rule (repeatable).
    #[arg(short = 'e', long = "exclude")]
    exclude: Vec<String>,
    /// Keep only projects under one of these group names (repeatable).
    #[arg(short = 'r', long = "root")]
    roots: Vec<String>,
    /// Keep external library projects.
    #[arg(long = "external")]
    external: bool,
}

/// Cross-entity selection flags shared by the history listings.
#[derive(clap::Args, Debug, Default)]
struct QueryArgs {
    /// File rule.
    #[arg(long)]
    file: Option<String>,
    /// Project rule.
    #[arg(long)]
    proj: Option<String>,
    /// Repository name term.
    #[arg(long)]
    repo: Option<String>,
    /// Person name or email term.
    #[arg(long)]
    person: Option<String>,
    /// Person id; wins over --person.
    #[arg(long)]
    person_id: Option<u32>,
    /// Commit rule.
    #[arg(long)]
    commit: Option<String>,
}

impl QueryArgs {
    fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(ref rule) = self.file {
            params = params.file(rule.as_str());
        }
        if let Some(ref rule) = self.proj {
            params = params.proj(rule.as_str());
        }
        if let Some(ref term) = self.repo {
            params = params.repo(term.as_str());
        }
        if let Some(ref term) = self.person {
            params = params.person(term.as_str());
        }
        if let Some(id) = self.person_id {
            params = params.person_id(PersonId::new(id));
        }
        if let Some(ref rule) = self.commit {
            params = params.commit(rule.as_str());
        }
        params
    }
}

/// Entity kind a rule is checked against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum RuleKind {
    #[default]
    Project,
    File,
    Commit,
}

impl RuleKind {
    fn as_str(self) -> &'static str {
        match self {
            RuleKind::Project => "project",
            RuleKind::File => "file",
            RuleKind::Commit => "commit",
        }
    }
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// List projects kept by the rules.
    Projects {
        #[command(flatten)]
        rules: ProjectArgs,
    },
    /// List dependency edges kept by the rules.
    Deps {
        #[command(flatten)]
        rules: ProjectArgs,
    },
    /// List files.
    Files {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List repositories.
    Repos {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List commits.
    Commits {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// List people.
    People {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Parse a rule and report the result without loading data.
    Check {
        /// Rule to parse.
        #[arg(long)]
        rule: String,
        /// Entity kind the rule is for.
        #[arg(long, value_enum, default_value = "project")]
        kind: RuleKind,
    },
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level, cli.global.log_format);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON like every other response.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel, format: LogFormat) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), ArcherError> {
    match cli.command {
        Command::Projects { rules } => execute_projects(&cli.global, &rules),
        Command::Deps { rules } => execute_deps(&cli.global, &rules),
        Command::Files { query } => execute_files(&cli.global, &query),
        Command::Repos { query } => execute_repos(&cli.global, &query),
        Command::Commits { query } => execute_commits(&cli.global, &query),
        Command::People { query } => execute_people(&cli.global, &query),
        Command::Check { rule, kind } => execute_check(&rule, kind),
    }
}

// ============================================================================
// Shared Setup
// ============================================================================

/// Resolved configuration plus the dataset it points at.
struct Loaded {
    config: ResolvedConfig,
    dataset: Dataset,
}

impl Loaded {
    fn open(global: &GlobalArgs, rules: Option<&ProjectArgs>) -> Result<Self, ArcherError> {
        let workspace = match global.workspace {
            Some(ref dir) => dir.clone(),
            None => std::env::current_dir()
                .map_err(|e| ArcherError::internal(format!("cannot read current dir: {}", e)))?,
        };

        let overrides = CliOverrides {
            data: global.data.clone(),
            max_depth: global.max_depth,
            keep_external: rules.is_some_and(|r| r.external),
            roots: rules.map(|r| r.roots.clone()).unwrap_or_default(),
        };
        let config = ResolvedConfig::resolve(&workspace, &overrides)?;

        info!(
            data = %config.data.value.display(),
            source = ?config.data.source,
            "loading dataset"
        );
        let dataset = Dataset::load(&config.data.value)?;
        Ok(Loaded { config, dataset })
    }

    fn parse_options(&self) -> ParseOptions {
        self.config.parse_options()
    }

    fn list_mode(&self) -> ListMode {
        if self.config.keep_external.value {
            ListMode::All
        } else {
            ListMode::ExcludeExternal
        }
    }

    fn project_filter(&self, rules: &ProjectArgs) -> Result<ProjectFilter, ArcherError> {
        let filter = ProjectFilterSet::new()
            .includes(rules.include.iter().cloned())
            .excludes(rules.exclude.iter().cloned())
            .roots(self.config.root_terms())
            .keep_external(self.config.keep_external.value)
            .options(self.parse_options())
            .build(&self.dataset.projects)?;
        Ok(filter)
    }

    fn query(&self, args: &QueryArgs) -> Result<Query<'_>, ArcherError> {
        Query::new(&self.dataset, &args.to_params(), &self.parse_options())
    }
}

fn emit<T: Serialize>(response: &T) -> Result<(), ArcherError> {
    emit_response(response, &mut io::stdout()).map_err(|e| ArcherError::internal(e.to_string()))?;
    let _ = io::stdout().flush();
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn execute_projects(global: &GlobalArgs, rules: &ProjectArgs) -> Result<(), ArcherError> {
    let loaded = Loaded::open(global, Some(rules))?;
    let filter = loaded.project_filter(rules)?;

    let projects: Vec<ProjectInfo> =
        filter_projects(&filter, &loaded.dataset.projects, loaded.list_mode())
            .into_iter()
            .map(ProjectInfo::from)
            .collect();
    debug!(count = projects.len(), "projects kept");

    emit(&ProjectsResponse::new(projects))
}

fn execute_deps(global: &GlobalArgs, rules: &ProjectArgs) -> Result<(), ArcherError> {
    let loaded = Loaded::open(global, Some(rules))?;
    let filter = loaded.project_filter(rules)?;

    let dependencies: Vec<DependencyInfo> =
        filter_dependencies(&filter, &loaded.dataset.projects, loaded.list_mode())
            .iter()
            .map(DependencyInfo::from)
            .collect();
    debug!(count = dependencies.len(), "dependencies kept");

    emit(&DependenciesResponse::new(dependencies))
}

fn execute_files(global: &GlobalArgs, args: &QueryArgs) -> Result<(), ArcherError> {
    let loaded = Loaded::open(global, None)?;
    let query = loaded.query(args)?;
    let files = query.files().into_iter().map(FileInfo::from).collect();
    emit(&FilesResponse::new(files))
}

fn execute_repos(global: &GlobalArgs, args: &QueryArgs) -> Result<(), ArcherError> {
    let loaded = Loaded::open(global, None)?;
    let query = loaded.query(args)?;
    let repositories = query
        .repositories()
        .into_iter()
        .map(RepositoryInfo::from)
        .collect();
    emit(&ReposResponse::new(repositories))
}

fn execute_commits(global: &GlobalArgs, args: &QueryArgs) -> Result<(), ArcherError> {
    let loaded = Loaded::open(global, None)?;
    let query = loaded.query(args)?;
    let commits = query
        .commits()
        .into_iter()
        .map(|(repo, commit)| CommitInfo::new(repo, commit))
        .collect();
    emit(&CommitsResponse::new(commits))
}

fn execute_people(global: &GlobalArgs, args: &QueryArgs) -> Result<(), ArcherError> {
    let loaded = Loaded::open(global, None)?;
    let query = loaded.query(args)?;
    let people = query.people().into_iter().map(PersonInfo::from).collect();
    emit(&PeopleResponse::new(people))
}

/// Parse `rule` against an empty graph; edge rules resolve to no paths.
fn execute_check(rule: &str, kind: RuleKind) -> Result<(), ArcherError> {
    let leaves = match kind {
        RuleKind::Project => {
            ProjectFilter::parse(&Projects::new(), rule, Policy::Include)
                .map_err(|e| ArcherError::invalid_rule(kind.as_str(), e))?
                .tree()
                .leaf_count()
        }
        RuleKind::File => FileFilter::parse(rule, Policy::Include)
            .map_err(|e| ArcherError::invalid_rule(kind.as_str(), e))?
            .tree()
            .leaf_count(),
        RuleKind::Commit => CommitFilter::parse(rule, Policy::Include)
            .map_err(|e| ArcherError::invalid_rule(kind.as_str(), e))?
            .tree()
            .leaf_count(),
    };
    emit(&CheckResponse::new(kind.as_str(), rule, leaves))
}

// ============================================================================
// Tests
// ============================================================================
