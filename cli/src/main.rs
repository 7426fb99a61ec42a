mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::{EnvFilter, fmt};

use docfix::Document;
use rewriter::{Mode, Outcome, Recipe, RewriteError};

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

const DONE_MESSAGE: &str = "Duplicate removed and schema reference updated!";

#[derive(Parser)]
#[command(
    name = "docfix",
    version,
    about = "Remove duplicated API doc blocks and point their schema at a shared reference"
)]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log what each pass does to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite a documentation file in place
    Run(RunArgs),

    /// Run .fixture test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Documentation file to rewrite
    #[arg(default_value = rewriter::DEFAULT_TARGET)]
    file: String,

    /// TOML recipe replacing the built-in order-status one
    #[arg(short, long)]
    recipe: Option<String>,

    /// Don't write anything; exit 1 if the file would change
    #[arg(long, conflicts_with = "stdout")]
    check: bool,

    /// Print the rewritten text instead of writing it back
    #[arg(long)]
    stdout: bool,

    /// Suppress the confirmation message
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .fixture file or a directory containing them
    path: String,

    /// Run only fixtures in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let args = with_default_subcommand(std::env::args().collect());
    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose, cli.no_color);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// `docfix` and `docfix file.js` mean `docfix run ...`.
fn with_default_subcommand(mut args: Vec<String>) -> Vec<String> {
    let first_pos = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let wants_info = first_pos.is_none()
        && args
            .iter()
            .skip(1)
            .any(|a| matches!(a.as_str(), "-h" | "--help" | "-V" | "--version"));
    if !wants_info && first_pos.is_none_or(|p| !SUBCOMMANDS.contains(&p.as_str())) {
        args.insert(1, "run".to_string());
    }
    args
}

/// Logs go to stderr so `--stdout` output stays clean. Warnings are rendered
/// as diagnostics, so the default filter only lets errors through.
fn init_tracing(verbose: bool, no_color: bool) {
    let default = if verbose { "debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .without_time()
        .init();
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let recipe = match &args.recipe {
        Some(path) => match Recipe::load(Path::new(path)) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        None => Recipe::order_status(),
    };

    let path = Path::new(&args.file);
    let source = match rewriter::read_source(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());
    let document = Document::parse(&source);

    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let rewrite = match rewriter::apply(&recipe, &document) {
        Ok(r) => r,
        Err(error) => {
            emit_rewrite_error(&writer, &config, &files, &document, file_id, &error);
            process::exit(1);
        }
    };

    for warning in &rewrite.report.warnings {
        emit(&writer, &config, &files, &warning.to_diagnostic(&document, file_id));
    }

    let outcome = match rewriter::commit(path, &source, rewrite, mode_for(&args)) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    let done = finish(&args, &outcome);
    if let Some(text) = &done.stdout {
        print!("{}", text);
    }
    if let Some(notice) = &done.stderr {
        eprintln!("{}", notice);
    }
    if done.exit_code != 0 {
        process::exit(done.exit_code);
    }
}

/// What a finished run prints and how it exits.
#[derive(Debug, PartialEq, Eq)]
struct Finish {
    stdout: Option<String>,
    stderr: Option<String>,
    exit_code: i32,
}

fn mode_for(args: &RunArgs) -> Mode {
    if args.check || args.stdout {
        Mode::DryRun
    } else {
        Mode::Write
    }
}

fn finish(args: &RunArgs, outcome: &Outcome) -> Finish {
    if args.stdout {
        return Finish {
            stdout: Some(outcome.output.clone()),
            stderr: None,
            exit_code: 0,
        };
    }

    if args.check {
        if outcome.changed {
            let schema = if outcome.report.rewritten.is_some() {
                "replaced"
            } else {
                "untouched"
            };
            return Finish {
                stdout: None,
                stderr: Some(format!(
                    "{}: would be rewritten ({} duplicate block(s), schema {})",
                    args.file,
                    outcome.report.removed.len(),
                    schema
                )),
                exit_code: 1,
            };
        }
        return Finish {
            stdout: None,
            stderr: Some(format!("ok: {} needs no changes", args.file)),
            exit_code: 0,
        };
    }

    Finish {
        stdout: (!args.quiet).then(|| format!("{}\n", DONE_MESSAGE)),
        stderr: None,
        exit_code: 0,
    }
}

fn emit(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    diagnostic: &Diagnostic<usize>,
) {
    let _ = term::emit_to_write_style(&mut writer.lock(), config, files, diagnostic);
}

fn emit_rewrite_error(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    document: &Document,
    file_id: usize,
    error: &RewriteError,
) {
    match error.as_splice() {
        Some(splice) => emit(writer, config, files, &splice.to_diagnostic(document, file_id)),
        None => eprintln!("error: {}", error),
    }
}
