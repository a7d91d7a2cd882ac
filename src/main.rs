//! Jack Compiler CLI
//!
//! Walks one or more input paths, compiles every `.jack` file found to an
//! adjacent `.vm` file, and reports failures without stopping early — every
//! input gets a chance, and the process exits non-zero if any of them
//! failed (spec's §6 CLI contract).

use clap::Parser as ClapParser;
use jackc::JackError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "jackc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiler for the Jack programming language, targeting Hack VM stack-machine code", long_about = None)]
struct Cli {
    /// .jack source files, or directories containing them (one directory is
    /// one compilation unit; not searched recursively, matching the
    /// Nand2Tetris convention of one class per directory entry)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Dump each file's parse tree instead of compiling it (debug only; no
    /// .vm file is written)
    #[arg(long)]
    print_tree: bool,
}

fn main() {
    let cli = Cli::parse();

    let mut jack_files = Vec::new();
    for path in &cli.paths {
        if path.is_dir() {
            jack_files.extend(collect_jack_files(path));
        } else if path.exists() {
            jack_files.push(path.clone());
        } else {
            eprintln!("Warning: {} does not exist", path.display());
        }
    }

    if jack_files.is_empty() {
        eprintln!("no .jack files found");
        process::exit(1);
    }

    let mut had_error = false;
    for file in &jack_files {
        let result = if cli.print_tree {
            print_tree_for(file)
        } else {
            compile_one(file)
        };

        if let Err(e) = result {
            eprintln!("Error in {}: {}", file.display(), e);
            had_error = true;
        }
    }

    if had_error {
        process::exit(1);
    }
}

/// Non-recursive directory listing of `*.jack` files, sorted for
/// deterministic compilation order across runs.
fn collect_jack_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    match fs::read_dir(dir) {
        Ok(entries) => {
            for entry in entries {
                match entry {
                    Ok(entry) => {
                        let path = entry.path();
                        if path.extension().is_some_and(|e| e == "jack") {
                            files.push(path);
                        }
                    }
                    Err(e) => {
                        eprintln!("Warning: could not read directory entry in {}: {}", dir.display(), e);
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("Warning: could not read directory {}: {}", dir.display(), e);
        }
    }
    files.sort();
    files
}

fn compile_one(input: &Path) -> Result<(), JackError> {
    let output = input.with_extension("vm");
    jackc::compile_file(input, &output)?;
    println!("Compiled {} -> {}", input.display(), output.display());
    Ok(())
}

fn print_tree_for(input: &Path) -> Result<(), JackError> {
    let source = fs::read_to_string(input)
        .map_err(|e| JackError::Io(format!("failed to read '{}': {e}", input.display())))?;
    let tokens = jackc::tokenize(&source)?;
    let class = jackc::parse(tokens)?;
    print!("{}", jackc::print_tree(&class));
    Ok(())
}
