use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use j2cpp::parser::{parse_java, Lexer};
use j2cpp::Config;

#[derive(Parser)]
#[command(name = "j2cpp")]
#[command(about = "Java-to-C++ source translator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate the manifest classes under a source directory
    Translate {
        /// Directory holding one <Class>.java per manifest entry
        #[arg(value_name = "SRC_DIR")]
        src: PathBuf,

        /// Output directory for the generated .h/.cpp files
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Write the interned-atom list to this file
        #[arg(long, value_name = "FILE")]
        atom_list: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report manifest classes with no source file
    Check {
        #[arg(value_name = "SRC_DIR")]
        src: PathBuf,
    },

    /// Parse one Java file and show the AST
    Parse {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Lexically analyze one Java file
    Lex {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Show token locations
        #[arg(short, long)]
        locations: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Translate {
            src,
            output,
            atom_list,
            verbose,
        } => {
            let mut config = Config::new(src, output);
            if let Some(atom_list) = atom_list {
                config = config.with_atom_list(atom_list);
            }
            let summary = j2cpp::run_manifest(&config)?;
            if *verbose {
                println!(
                    "Translated {} headers, {} implementation files, {} atoms",
                    summary.headers_written, summary.bodies_written, summary.atoms_written
                );
            }
        }
        Commands::Check { src } => {
            let config = Config::new(src, ".");
            let missing = j2cpp::driver::check(&config)?;
            if missing.is_empty() {
                println!("All manifest classes have sources.");
            } else {
                for class in &missing {
                    println!("missing: {}.java", class);
                }
                std::process::exit(1);
            }
        }
        Commands::Parse { input } => {
            let source = fs::read_to_string(input)?;
            let unit = parse_java(&source)?;
            println!("{:#?}", unit);
        }
        Commands::Lex { input, locations } => {
            let source = fs::read_to_string(input)?;
            let tokens = Lexer::new(&source)
                .tokenize()
                .map_err(|e| anyhow::anyhow!("Lexical error: {}", e))?;
            for token in tokens {
                if *locations {
                    println!(
                        "{:?} at {}:{}",
                        token.token_type(),
                        token.location().line,
                        token.location().column
                    );
                } else {
                    println!("{:?}: '{}'", token.token_type(), token.lexeme());
                }
            }
        }
    }

    Ok(())
}
