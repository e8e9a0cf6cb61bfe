mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use log::{debug, warn};

use quizgraph::{CompileError, Compiler, QuizGraph, QuizKind};

const SUBCOMMANDS: &[&str] = &["compile", "test", "help"];

#[derive(Parser)]
#[command(name = "quizgraph", version, about = "Compile annotated Markdown into a quiz graph")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log compiler progress (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile annotated Markdown files into one graph
    Compile(CompileArgs),

    /// Run .test.md fixtures
    Test(TestArgs),
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Markdown files, compiled in order into a shared graph
    #[arg(required = true)]
    files: Vec<String>,

    /// Skip blocks that fail to compile instead of stopping at the first one
    #[arg(short, long)]
    keep_going: bool,

    /// Print the whole graph
    #[arg(long)]
    dump: bool,

    /// Only report errors (exit 0 if every block compiles)
    #[arg(long)]
    check: bool,

    /// List each raw source key with the ids it produced
    #[arg(long)]
    raws: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `quizgraph notes.md` means `quizgraph compile notes.md`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args.iter().skip(1).position(|a| !a.starts_with('-')) {
        if !SUBCOMMANDS.contains(&args[pos + 1].as_str()) {
            args.insert(pos + 1, "compile".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(cli.verbose);

    match cli.command {
        Command::Compile(compile_args) => do_compile(compile_args, cli.no_color),
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

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn do_compile(args: CompileArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let mut files = SimpleFiles::new();
    let mut graph = QuizGraph::new();
    let mut errors: Vec<CompileError> = Vec::new();

    for path in &args.files {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path, e);
                process::exit(1);
            }
        };
        let file_id = files.add(path.clone(), source.clone());
        let compiler = Compiler::new(source, file_id);
        debug!("compiling {}", path);

        if args.keep_going {
            for block in compiler.blocks() {
                if let Err(e) = compiler.compile_block(&mut graph, &block) {
                    warn!("skipping block in {}: {}", path, e);
                    errors.push(e);
                }
            }
        } else if let Err(e) = compiler.compile_into(&mut graph) {
            errors.push(e);
            break;
        }
    }

    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for error in &errors {
        let diagnostic = error.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
    }

    let failed = !errors.is_empty();
    // a graph cut short by an error is not worth printing
    let stopped_early = failed && !args.keep_going;
    if args.check {
        if !failed {
            eprintln!("ok: {} file(s) compiled", args.files.len());
        }
    } else if !stopped_early {
        if args.dump {
            println!("{:#?}", graph);
        } else if args.raws {
            print_raws(&graph);
        } else {
            print_summary(&graph);
        }
    }

    if failed {
        process::exit(1);
    }
}

fn print_summary(graph: &QuizGraph) {
    println!(
        "nodes: {} ({} cards, {} clozes, {} matches)",
        graph.len(),
        graph.count_kind(QuizKind::Card),
        graph.count_kind(QuizKind::Cloze),
        graph.count_kind(QuizKind::Match)
    );
    println!(
        "edges: {} from {} parent(s)",
        graph.edge_count(),
        graph.edges.len()
    );
}

fn print_raws(graph: &QuizGraph) {
    for (raw, ids) in &graph.raws {
        println!("{}", raw.replace('\n', " | "));
        for id in ids {
            println!("  {}", id);
        }
    }
}
