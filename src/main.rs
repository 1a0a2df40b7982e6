use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::{debug, error, LevelFilter};

use cmmc::{compiler, lexer, parser};
use cmmc::err::{CmmErr, FullCmmErr};
use cmmc::grammar::cmm::GRAMMAR;
use cmmc::lexer::token::TokenKind;
use cmmc::parser::sets::Sets;
use cmmc::parser::table::Automaton;
use cmmc::parser::TABLE;

/// A compiler front end for C--.
#[derive(Parser)]
#[command(name = "cmmc", version)]
struct Cli {
    /// Raise the log level (-v debug, -vv trace). RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command
}

#[derive(Subcommand)]
enum Command {
    /// Print the token listing of a file
    Lex {
        file: PathBuf
    },
    /// Parse a file and print its AST
    Parse {
        file: PathBuf,
        /// Also print every step of the shift-reduce driver
        #[arg(long)]
        trace: bool,
        /// Use the recursive descent parser instead of the SLR(1) tables
        #[arg(long, conflicts_with = "trace")]
        descent: bool
    },
    /// Generate the IR of a file
    Ir {
        file: PathBuf,
        /// Write the IR here instead of standard output
        #[arg(short, long)]
        out: Option<PathBuf>
    },
    /// Print the grammar, its FIRST/FOLLOW sets, and the table conflicts
    Table {
        /// Also print the LR(0) item sets
        #[arg(long)]
        states: bool
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn print_errs<E: CmmErr>(errs: &[FullCmmErr<E>], code: &str) {
    for e in errs {
        eprintln!("{}", e.full_msg(code));
    }
}

fn read(file: &Path) -> Result<String, ExitCode> {
    fs::read_to_string(file).map_err(|e| {
        eprintln!("could not read {}: {e}", file.display());
        ExitCode::FAILURE
    })
}

fn run(cli: Cli) -> Result<(), ExitCode> {
    macro_rules! unwrap_or_exit {
        ($r:expr, $code:expr) => {
            match $r {
                Ok(t) => t,
                Err(fe) => {
                    eprintln!("{}", fe.full_msg($code));
                    return Err(ExitCode::FAILURE);
                }
            }
        }
    }
    macro_rules! tokenize_or_exit {
        ($code:expr) => {
            match lexer::tokenize($code) {
                Ok(t) => t,
                Err(errs) => {
                    print_errs(&errs, $code);
                    return Err(ExitCode::FAILURE);
                }
            }
        }
    }

    match cli.command {
        Command::Lex { file } => {
            let code = read(&file)?;
            let lx = lexer::Lexer::new(&code);

            // the listing is printed even if some tokens were bad
            for t in lx.lex().iter().filter(|t| t.kind != TokenKind::Eof) {
                println!("{t}");
            }
            tokenize_or_exit!(&code);
        },
        Command::Parse { file, trace, descent } => {
            let code = read(&file)?;
            let tokens = tokenize_or_exit!(&code);

            let ast = if descent {
                unwrap_or_exit!(parser::descent::parse(tokens), &code)
            } else if trace {
                let (result, steps) = parser::parse_traced(&tokens);
                for step in steps {
                    println!("{step}");
                }
                println!();
                unwrap_or_exit!(result, &code)
            } else {
                unwrap_or_exit!(parser::parse(&tokens), &code)
            };

            print!("{ast}");
        },
        Command::Ir { file, out } => {
            let code = read(&file)?;
            let tokens = tokenize_or_exit!(&code);
            let ast = unwrap_or_exit!(parser::parse(&tokens), &code);

            let (module, errors) = compiler::codegen(&ast);
            if let Err(e) = module.verify() {
                error!("generated IR does not verify: {e}");
            }

            match out {
                Some(out) => fs::write(&out, module.to_string()).map_err(|e| {
                    eprintln!("could not write {}: {e}", out.display());
                    ExitCode::FAILURE
                })?,
                None => print!("{module}"),
            }

            if !errors.is_empty() {
                print_errs(&errors, &code);
                return Err(ExitCode::FAILURE);
            }
        },
        Command::Table { states } => {
            let sets = Sets::compute(&GRAMMAR);
            debug!("{} states in the C-- automaton", TABLE.state_count());

            println!("{}", *GRAMMAR);
            println!("{sets}");
            println!("states: {}", TABLE.state_count());
            println!("conflicts: {}", TABLE.conflicts().len());
            for c in TABLE.conflicts() {
                println!("    {c}");
            }

            if states {
                let automaton = Automaton::build(&GRAMMAR);
                for (i, set) in automaton.states.iter().enumerate() {
                    println!();
                    println!("I{i}:");
                    for item in set {
                        println!("    {}", item.display(&GRAMMAR));
                    }
                }
            }
        },
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => code,
    }
}
