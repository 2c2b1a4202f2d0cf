use std::{
    io::{self, Read},
    path::PathBuf,
};

use binding_expr::cli::{self, CliError, CompileOptions, EvalOptions};
use clap::{Parser as ClapParser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "bexpr")]
#[command(about = "Compile JS-like binding expressions into accessor calls and dependency paths")]
#[command(version)]
struct Cli {
    /// Log pipeline stages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an expression and print its code and watchers
    Compile {
        /// The expression (or template with --template)
        expression: String,

        /// JSON config file (symbols, default, call, dollar)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Treat the input as a `${...}` template
        #[arg(short, long)]
        template: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Compile and evaluate an expression against JSON data
    Eval {
        expression: String,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        template: bool,

        /// JSON object keyed by type tag and direct symbol (reads from stdin if not provided)
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Print the token stream of an expression
    Tokens { expression: String },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,binding_expr=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Compile {
            expression,
            config,
            template,
            pretty,
        } => run_compile(expression, config, template, pretty),
        Commands::Eval {
            expression,
            config,
            template,
            data,
        } => run_eval(expression, config, template, data),
        Commands::Tokens { expression } => cli::execute_tokens(&expression).map(|lines| {
            for line in lines {
                println!("{}", line);
            }
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

fn run_compile(
    expression: String,
    config: Option<PathBuf>,
    template: bool,
    pretty: bool,
) -> Result<(), CliError> {
    let config = cli::load_config(config.as_deref())?;
    let options = CompileOptions {
        expression,
        template,
    };
    print_json(&cli::execute_compile(&options, &config)?, pretty)
}

fn run_eval(
    expression: String,
    config: Option<PathBuf>,
    template: bool,
    data: Option<String>,
) -> Result<(), CliError> {
    let config = cli::load_config(config.as_deref())?;
    let data = match data {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = EvalOptions {
        expression,
        template,
        data,
    };
    print_json(&cli::execute_eval(&options, &config)?, false)
}
