use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use diffstage::{
    Algorithm, DEFAULT_CONTEXT_LINES, DiffOptions, DiffStageError, FileStaging, compute_hunks_with,
    generate_patch, parse_selection, read_revision,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "diffstage")]
#[command(about = "Split file diffs into stageable change groups and build patches for them")]
struct Cli {
    /// Context lines around each change
    #[arg(long, global = true, default_value_t = DEFAULT_CONTEXT_LINES)]
    context: usize,

    /// Line diff algorithm
    #[arg(long, global = true, value_enum, default_value_t = Algorithm::Myers)]
    algorithm: Algorithm,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hunks between two revisions as JSON
    Hunks {
        original: PathBuf,
        modified: PathBuf,
    },
    /// Print the change groups between two revisions as JSON
    Groups {
        original: PathBuf,
        modified: PathBuf,
        /// Staged revision to reconcile the groups against
        #[arg(long)]
        staged: Option<PathBuf>,
    },
    /// Print a patch for the selected hunks (e.g. "0,2..4")
    Patch {
        original: PathBuf,
        modified: PathBuf,
        /// Path written into the patch headers (defaults to MODIFIED)
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        select: String,
    },
    /// Print a patch that applies a single change group
    GroupPatch {
        original: PathBuf,
        modified: PathBuf,
        /// Path written into the patch headers (defaults to MODIFIED)
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        group: usize,
    },
    /// Generate shell completions
    Completions { shell: Shell },
    /// Generate a man page
    Man,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), DiffStageError> {
    let options = DiffOptions {
        context_lines: cli.context,
        algorithm: cli.algorithm,
    };

    match cli.command {
        Commands::Hunks { original, modified } => {
            let hunks = compute_hunks_with(
                &read_revision(&original)?,
                &read_revision(&modified)?,
                &label(&modified),
                &options,
            );
            print_json(&hunks)
        }
        Commands::Groups {
            original,
            modified,
            staged,
        } => {
            let base = read_revision(&original)?;
            let working = read_revision(&modified)?;
            // Without a staged revision every group is reported unstaged
            let staged = match staged {
                Some(staged) => read_revision(&staged)?,
                None => base.clone(),
            };
            let staging = FileStaging::new(label(&modified), &base, &working, &staged, &options);
            print_json(staging.groups())
        }
        Commands::Patch {
            original,
            modified,
            path,
            select,
        } => {
            let indices = parse_selection(&select)?;
            let path = path.unwrap_or_else(|| label(&modified));
            let hunks = compute_hunks_with(
                &read_revision(&original)?,
                &read_revision(&modified)?,
                &path,
                &options,
            );
            print_text(&generate_patch(&path, &hunks, &indices))
        }
        Commands::GroupPatch {
            original,
            modified,
            path,
            group,
        } => {
            let base = read_revision(&original)?;
            let staging = FileStaging::new(
                path.unwrap_or_else(|| label(&modified)),
                &base,
                &read_revision(&modified)?,
                &base,
                &options,
            );
            print_text(&staging.stage_group_patch(group)?)
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "diffstage", &mut io::stdout());
            Ok(())
        }
        Commands::Man => clap_mangen::Man::new(Cli::command())
            .render(&mut io::stdout())
            .map_err(|e| DiffStageError::OutputFailed {
                message: e.to_string(),
            }),
    }
}

fn label(path: &Path) -> String {
    path.display().to_string()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), DiffStageError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| DiffStageError::OutputFailed {
        message: e.to_string(),
    })?;
    print_text(&format!("{json}\n"))
}

fn print_text(text: &str) -> Result<(), DiffStageError> {
    io::stdout()
        .write_all(text.as_bytes())
        .map_err(|e| DiffStageError::OutputFailed {
            message: e.to_string(),
        })
}
