//! fparse - Fortran source parser and semantic analyzer

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use fparse::parse::block::BlockNode;
use fparse::parse::stmt::Stmt;
use fparse::parse::{parse_source, render_tree, Parsed};
use fparse::sema::analyze;
use fparse::source::Dialect;
use fparse::{parse_args, CliArgs, Config, Result};
use glob::Pattern;
use rayon::prelude::*;
use walkdir::WalkDir;

fn main() -> Result<()> {
    let args = parse_args();

    let use_stdin =
        args.inputs.is_empty() || (args.inputs.len() == 1 && args.inputs[0].as_os_str() == "-");

    if args.inputs.is_empty() && io::stdin().is_terminal() {
        build_cli_usage();
        return Ok(());
    }

    let config = build_config(&args)?;

    if use_stdin {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        let dialect = config
            .dialect
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or(Dialect::Free90);
        let counters = Counters::default();
        process_source(Path::new("<stdin>"), &text, dialect, &config, &args, &counters);
        counters.summary();
        return Ok(());
    }

    if let Some(jobs) = args.jobs {
        if jobs > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
            {
                eprintln!("Warning: failed to configure thread pool: {e}");
            }
        }
    }

    let excludes: Vec<Pattern> = args
        .exclude
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                eprintln!("Warning: invalid exclude pattern `{p}`: {e}");
                None
            }
        })
        .collect();

    let files = collect_files(&args.inputs, &config, &excludes);
    if files.is_empty() {
        eprintln!("No Fortran files found to parse.");
        return Ok(());
    }

    let counters = Counters::default();
    files.par_iter().for_each(|path| {
        process_file(path, &config, &args, &counters);
    });
    counters.summary();
    Ok(())
}

fn build_cli_usage() {
    println!("Usage: fparse [OPTIONS] [FILES/DIRECTORIES]...");
    println!();
    println!("Parses Fortran source (fixed-form 77, free-form 90/95, signature");
    println!("files) into a statement tree and reports diagnostics.");
    println!();
    println!("Run `fparse --help` for the full option list.");
    println!("Config is read from fparse.toml in parent directories or the home");
    println!("directory unless --config is given.");
}

fn build_config(args: &CliArgs) -> Result<Config> {
    let mut config = if let Some(path) = &args.config {
        Config::from_toml_file(path)?
    } else {
        let start = args
            .inputs
            .first()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."));
        match Config::discover(&start) {
            Some(found) => Config::from_toml_file(&found)?,
            None => Config::default(),
        }
    };
    if let Some(dialect) = &args.dialect {
        dialect.parse::<Dialect>().map_err(anyhow::Error::msg)?;
        config.dialect = Some(dialect.clone());
    }
    if let Some(depth) = args.max_depth {
        config.max_nesting_depth = depth;
    }
    Ok(config)
}

fn collect_files(inputs: &[PathBuf], config: &Config, excludes: &[Pattern]) -> Vec<PathBuf> {
    let excluded = |path: &Path| {
        excludes
            .iter()
            .any(|pattern| pattern.matches_path(path))
    };
    let mut files = Vec::new();
    for input in inputs {
        if input.is_file() {
            if !excluded(input) {
                files.push(input.clone());
            }
        } else if input.is_dir() {
            for entry in WalkDir::new(input)
                .into_iter()
                .filter_map(std::result::Result::ok)
            {
                let path = entry.path();
                if path.is_file() && config.handles_path(path) && !excluded(path) {
                    files.push(path.to_path_buf());
                }
            }
        } else {
            eprintln!("Warning: skipping `{}`: not a file or directory", input.display());
        }
    }
    files.sort();
    files.dedup();
    files
}

#[derive(Default)]
struct Counters {
    files: AtomicUsize,
    diagnostics: AtomicUsize,
    errors: AtomicUsize,
    failed: AtomicUsize,
}

impl Counters {
    fn summary(&self) {
        eprintln!(
            "Parsed {} file(s): {} diagnostic(s), {} error(s), {} failed",
            self.files.load(Ordering::Relaxed),
            self.diagnostics.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        );
    }
}

fn process_file(path: &Path, config: &Config, args: &CliArgs, counters: &Counters) {
    let Some(dialect) = config.dialect_for_path(path) else {
        eprintln!(
            "Warning: skipping `{}`: unknown dialect (use --dialect)",
            path.display()
        );
        return;
    };
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{}: error: {e}", path.display());
            counters.failed.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };
    process_source(path, &text, dialect, config, args, counters);
}

fn process_source(
    path: &Path,
    text: &str,
    dialect: Dialect,
    config: &Config,
    args: &CliArgs,
    counters: &Counters,
) {
    let mut parsed: Parsed = match parse_source(text, dialect, config) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{}: fatal: {e}", path.display());
            counters.failed.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };
    analyze(&mut parsed);

    counters.files.fetch_add(1, Ordering::Relaxed);
    counters
        .diagnostics
        .fetch_add(parsed.diagnostics.len(), Ordering::Relaxed);
    counters
        .errors
        .fetch_add(parsed.diagnostics.error_count(), Ordering::Relaxed);

    if !args.quiet {
        for diag in &parsed.diagnostics {
            eprintln!("{}:{diag}", path.display());
        }
    }

    if args.tree || args.canonical || args.symbols {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if args.tree {
            let _ = writeln!(out, "=== {} ===", path.display());
            print_tree(&mut out, &parsed.root, 0);
        }
        if args.canonical {
            let _ = write!(out, "{}", render_tree(&parsed.root));
        }
        if args.symbols {
            let _ = writeln!(out, "=== {} symbols ===", path.display());
            print_symbols(&mut out, &parsed.root, 0);
        }
    }
}

fn print_tree(out: &mut impl Write, block: &BlockNode, indent: usize) {
    let pad = "  ".repeat(indent);
    for child in &block.children {
        match &child.stmt {
            Stmt::Block(b) => {
                let _ = writeln!(out, "{pad}[{}] {}", b.kind, b.render_header());
                print_tree(out, b, indent + 1);
            }
            stmt => {
                let _ = writeln!(out, "{pad}{}", stmt.render());
            }
        }
    }
}

fn print_symbols(out: &mut impl Write, block: &BlockNode, indent: usize) {
    let pad = "  ".repeat(indent);
    if let Some(scope) = &block.scope {
        let title = if block.kind == fparse::parse::block::BlockKind::Unit {
            "file".to_string()
        } else {
            format!("{} {}", block.kind, block.name)
        };
        let _ = writeln!(out, "{pad}{title}:");
        let mut names: Vec<&String> = scope.variables.keys().collect();
        names.sort();
        for name in names {
            let var = &scope.variables[name];
            let ty = var
                .typespec
                .as_ref()
                .map_or_else(|| "<implicit>".to_string(), fparse::parse::typedecl::TypeSpec::render);
            let mut notes = Vec::new();
            if var.is_dummy {
                notes.push("dummy");
            }
            if var.is_result {
                notes.push("result");
            }
            let notes = if notes.is_empty() {
                String::new()
            } else {
                format!(" ({})", notes.join(", "))
            };
            let _ = writeln!(out, "{pad}  {name}: {ty}{notes}");
        }
        for use_info in scope.used_modules() {
            match &use_info.only {
                Some(only) => {
                    let _ = writeln!(out, "{pad}  use {}, only: {}", use_info.module, only.join(", "));
                }
                None => {
                    let _ = writeln!(out, "{pad}  use {}", use_info.module);
                }
            }
        }
    }
    for child in block.child_blocks() {
        print_symbols(out, child, indent + 1);
    }
}
