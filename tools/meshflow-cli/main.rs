use clap::Parser;
use meshflow::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Runs a saved meshflow project and writes the tables it produces
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the project file
    project_path: PathBuf,

    /// Directory the project's data files are read from
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Directory the CSV tables are written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Run only this node (and what it depends on) instead of every sink
    #[arg(short, long)]
    node: Option<usize>,

    /// CSV column separator
    #[arg(long, default_value_t = ';')]
    separator: char,

    /// Show debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let total_start = Instant::now();
    let project = ProjectDefinition::from_file(&cli.project_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read project file '{}': {}",
            cli.project_path.display(),
            e
        ))
    });

    let mut graph = Graph::builder()
        .with_sources(JsonSources::new(&cli.data_dir))
        .with_progress(|node, percent| log::debug!("Node {node}: {percent:.0}%"))
        .build();
    graph
        .load(&project)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load project: {}", e)));

    let targets = match cli.node {
        Some(index) => vec![NodeId(index)],
        None => graph.sinks(),
    };

    println!("Running {} node(s)...", targets.len());
    for &target in &targets {
        if let Err(e) = graph.run(target) {
            eprintln!("  -> Node {}: {}", target, e);
        }
    }

    println!("\n--- Node Summary ---");
    for id in graph.node_ids() {
        let name = graph.name(id).unwrap_or("?");
        let state = graph
            .state(id)
            .map_or_else(|e| e.to_string(), |state| state.to_string());
        let message = graph.message(id).unwrap_or_default();
        println!("{:>4}  {:<26} {:<15} {}", id, name, state, message);
    }

    std::fs::create_dir_all(&cli.output_dir).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to create output directory '{}': {}",
            cli.output_dir.display(),
            e
        ))
    });
    for &target in &targets {
        let Ok(Some(Payload::Table(table))) = graph.output(target) else {
            continue;
        };
        for warning in &table.warnings {
            println!("  -> Node {}: {}", target, warning);
        }
        let path = cli.output_dir.join(format!("node_{}.csv", target));
        table
            .write_csv(&path, cli.separator)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path.display(), e)));
        println!("  -> Wrote {} rows to '{}'", table.rows.len(), path.display());
    }

    println!("\nTotal Execution: {:?}", total_start.elapsed());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
