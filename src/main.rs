use clap::{Parser as ClapParser, Subcommand};
use quill_expr::cli::{self, CheckOptions, CheckResult, CliError, StreamOptions};
use std::io::{self, BufReader, Cursor, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "quill")]
#[command(about = "Quill - compile a typed expression once and map it over JSON elements")]
#[command(version)]
struct Cli {
    /// Log build details to stderr (overrides QUILL_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an expression and evaluate it against one JSON input
    Check {
        /// The expression to evaluate
        expression: String,

        /// Type of the input element, e.g. int, long?, DateTime[]
        #[arg(short = 't', long, default_value = "object")]
        input_type: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't bind or execute
        #[arg(long)]
        syntax_only: bool,
    },

    /// Evaluate an expression for every line of newline-delimited JSON
    Stream {
        /// The expression to evaluate
        expression: String,

        /// Type of each input element
        #[arg(short = 't', long, default_value = "object")]
        input_type: String,

        /// Newline-delimited JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Stop at the first element that faults
        #[arg(long)]
        fail_fast: bool,
    },

    /// List library types
    Types,

    /// Show the members of a library type
    Describe {
        /// Type name, e.g. string, Math, int[]
        name: String,
    },

    /// List documentation categories
    Docs,

    /// Show documentation for a specific category
    Doc {
        /// Category name (use 'quill docs' to list categories)
        category: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("QUILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            expression,
            input_type,
            input,
            pretty,
            syntax_only,
        } => run_check(CheckOptions {
            expression,
            input_type,
            input,
            pretty,
            syntax_only,
        }),
        Commands::Stream {
            expression,
            input_type,
            input,
            fail_fast,
        } => run_stream(
            StreamOptions {
                expression,
                input_type,
                fail_fast,
            },
            input,
        ),
        Commands::Types => {
            print!("{}", cli::list_types());
            Ok(())
        }
        Commands::Describe { name } => cli::describe_type(&name).map(|text| print!("{}", text)),
        Commands::Docs => {
            print!("{}", cli::get_docs_overview());
            Ok(())
        }
        Commands::Doc { category } => {
            cli::get_doc_category(&category).map(|content| print!("{}", content))
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// Reads all of stdin unless it is a terminal.
fn read_stdin() -> Result<Option<String>, CliError> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(Some(buffer))
}

fn run_check(mut options: CheckOptions) -> Result<(), CliError> {
    if options.input.is_none() && !options.syntax_only {
        options.input = read_stdin()?;
    }

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success { value, .. } => {
            let json = if options.pretty {
                serde_json::to_string_pretty(&value)?
            } else {
                serde_json::to_string(&value)?
            };
            println!("{}", json);
        }
    }
    Ok(())
}

fn run_stream(options: StreamOptions, input: Option<String>) -> Result<(), CliError> {
    let stdout = io::stdout().lock();
    let stderr = io::stderr().lock();

    let summary = match input {
        Some(text) => cli::execute_stream(&options, Cursor::new(text), stdout, stderr)?,
        None if !atty::is(atty::Stream::Stdin) => {
            cli::execute_stream(&options, BufReader::new(io::stdin().lock()), stdout, stderr)?
        }
        None => return Err(CliError::NoInput),
    };

    if summary.faulted > 0 {
        return Err(CliError::Faulted {
            processed: summary.processed,
            faulted: summary.faulted,
        });
    }
    Ok(())
}
