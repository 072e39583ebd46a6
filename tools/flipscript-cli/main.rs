use clap::Parser;
use flipscript::prelude::*;
use std::fs;
use std::time::Instant;

/// Compiles a block graph project into a Flipper Zero C application
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the project JSON file
    project_path: String,

    /// Write the generated C source here instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Load block kinds from this catalog instead of the built-in one
    #[arg(long)]
    catalog: Option<String>,

    /// Accept an extra kind name, as `user_kind=registered_kind`
    #[arg(long = "alias", value_name = "USER=KIND")]
    aliases: Vec<String>,

    /// Only run the checks and report diagnostics
    #[arg(long)]
    validate_only: bool,

    /// Print the linearized statement tree
    #[arg(long)]
    tree: bool,

    /// Print diagnostics as JSON
    #[arg(long)]
    json: bool,

    /// Fail on warnings as well as errors
    #[arg(long)]
    deny_warnings: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    run(cli);
}

fn run(cli: Cli) {
    let total_start = Instant::now();

    // --- 1. Registry ---
    let registry = match &cli.catalog {
        Some(path) => {
            let json = fs::read_to_string(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to read catalog file '{}': {}", path, e))
            });
            BlockRegistry::from_json(&json)
        }
        None => BlockRegistry::standard(),
    }
    .unwrap_or_else(|e| exit_with_error(&format!("Failed to load block registry: {}", e)));

    // --- 2. Project ---
    let project_json = fs::read_to_string(&cli.project_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read project file '{}': {}",
            &cli.project_path, e
        ))
    });
    let project = Project::from_json(&project_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse project: {}", e)));

    let mut builder = Compiler::builder(&registry);
    for alias in &cli.aliases {
        let Some((user_kind, kind)) = alias.split_once('=') else {
            exit_with_error(&format!("Alias '{}' is not of the form USER=KIND", alias));
        };
        builder = builder.with_kind_alias(user_kind.trim(), kind.trim());
    }
    if cli.deny_warnings {
        builder = builder.deny_warnings();
    }
    let compiler = builder.build();

    // --- 3. Validation and linearization ---
    let analysis = match compiler.analyze(&project) {
        Ok(analysis) => analysis,
        Err(CompileError::Invalid(diagnostics)) => {
            report(&diagnostics, cli.json);
            std::process::exit(1);
        }
        Err(e) => exit_with_error(&format!("Compilation failed: {}", e)),
    };
    report(&analysis.warnings, cli.json);

    if cli.tree {
        eprintln!("{}", visualize(&analysis.tree, &analysis.graph));
    }
    if cli.validate_only {
        eprintln!(
            "Project '{}' is valid ({} warning(s)).",
            project.manifest.name,
            analysis.warnings.len()
        );
        return;
    }

    // --- 4. Emission ---
    let program = emit(
        &analysis.tree,
        &analysis.graph,
        compiler.registry(),
        &project.manifest,
    )
    .unwrap_or_else(|e| exit_with_error(&format!("Code generation failed: {}", e)));

    match &cli.output {
        Some(path) => {
            fs::write(path, &program.source).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to write output file '{}': {}", path, e))
            });
            eprintln!(
                "Wrote {} ({} bytes, {} declarations) in {:?}",
                path,
                program.source.len(),
                program.declarations.len(),
                total_start.elapsed()
            );
        }
        None => print!("{}", program.source),
    }
}

fn report(diagnostics: &[Diagnostic], json: bool) {
    if diagnostics.is_empty() {
        return;
    }
    if json {
        match serde_json::to_string_pretty(diagnostics) {
            Ok(text) => println!("{}", text),
            Err(e) => exit_with_error(&format!("Failed to serialize diagnostics: {}", e)),
        }
    } else {
        for diagnostic in diagnostics {
            eprintln!("{}", diagnostic);
        }
    }
}

/// Prints an error message to stderr and exits the process.
fn exit_with_error(message: &str) -> ! {
    eprintln!("\n[ERROR] {}", message);
    std::process::exit(1);
}
