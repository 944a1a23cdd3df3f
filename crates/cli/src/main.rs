//! CLI for loading layered configuration files.
//!
//! Pipeline: read file -> resolve imports -> load + merge each -> print.

use clap::{Parser, Subcommand};
use persist_core::{Dump, FileGraph, Load};
use persist_loader::load::absolute;
use persist_loader::FileLoader;
use std::collections::BTreeSet;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "persist", version, about = "Load configuration files with imports")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the merged document as JSON.
    Load {
        file: PathBuf,

        #[arg(long, env = "PERSIST_PRETTY", default_value_t = false)]
        pretty: bool,
    },

    /// Print the dependency graph (file -> files it imports) as JSON.
    Graph { file: PathBuf },

    /// List the files that must be reloaded when any of CHANGED change.
    Affected {
        file: PathBuf,

        #[arg(required = true)]
        changed: Vec<PathBuf>,
    },

    /// Load a file and write the merged result in the format of OUT.
    Convert { file: PathBuf, out: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(e.as_ref());
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    let loader = FileLoader::new();

    match command {
        Commands::Load { file, pretty } => {
            let loaded = loader.load(&file)?;
            let text = if pretty {
                serde_json::to_string_pretty(&loaded.content)?
            } else {
                serde_json::to_string(&loaded.content)?
            };
            println!("{text}");
        }
        Commands::Graph { file } => {
            let loaded = loader.load(&file)?;
            println!("{}", serde_json::to_string_pretty(&loaded.graph)?);
        }
        Commands::Affected { file, changed } => {
            let loaded = loader.load(&file)?;
            let affected = affected_files(&loaded.graph, &changed);
            tracing::info!(changed = changed.len(), affected = affected.len(), "computed");
            for path in affected {
                println!("{}", path.display());
            }
        }
        Commands::Convert { file, out } => {
            let loaded = loader.load(&file)?;
            loader.dump(&out, &loaded.content)?;
            tracing::info!(from = %file.display(), to = %out.display(), "converted");
        }
    }

    Ok(())
}

/// Files to reload when any of `changed` change. Relative paths are taken
/// from the working directory, like the graph's own keys.
fn affected_files(graph: &FileGraph, changed: &[PathBuf]) -> BTreeSet<PathBuf> {
    changed
        .iter()
        .flat_map(|path| graph.affected_by(&absolute(path)))
        .collect()
}

/// The error and every cause below it, outermost first.
fn cause_chain(error: &(dyn Error + 'static)) -> Vec<String> {
    std::iter::successors(Some(error), |&e| e.source())
        .map(|e| e.to_string())
        .collect()
}

fn report(error: &(dyn Error + 'static)) {
    let chain = cause_chain(error);
    if let Some((top, causes)) = chain.split_first() {
        eprintln!("error: {top}");
        for cause in causes {
            eprintln!("  caused by: {cause}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn affected_resolves_relative_changes_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let app = cwd.join("app.json");
        let db = cwd.join("conf/db.json");
        let mut graph = FileGraph::with_root(&app);
        graph.add_import(&app, &db);
        graph.union(FileGraph::with_root(&db));

        let affected = affected_files(&graph, &[PathBuf::from("./conf/../conf/db.json")]);
        assert_eq!(affected, BTreeSet::from([app.clone(), db.clone()]));

        let affected = affected_files(&graph, &[PathBuf::from("unrelated.json")]);
        assert!(affected.is_empty());
    }

    #[test]
    fn nested_failure_reports_full_cause_chain() {
        let dir = tempfile::tempdir().unwrap();
        let outer = dir.path().join("outer.json");
        fs::write(&outer, r#"{"@import": ["missing.json"]}"#).unwrap();
        let main = dir.path().join("main.json");
        fs::write(&main, r#"{"@import": ["outer.json"]}"#).unwrap();

        let err = run(Commands::Graph { file: main }).unwrap_err();
        let chain = cause_chain(err.as_ref());
        assert_eq!(chain.len(), 2);
        assert!(chain[0].contains("Unable to load"));
        assert!(chain[0].contains(&outer.display().to_string()));
        assert!(chain[1].contains("missing.json"));
        assert!(chain[1].contains("file not exists"));
    }

    #[test]
    fn convert_writes_merged_document_in_target_format() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.json"), r#"{"server": {"host": "0.0.0.0", "port": 80}}"#)
            .unwrap();
        let main = dir.path().join("main.json");
        fs::write(&main, r#"{"@import": ["base.json"], "server": {"port": 8080}}"#).unwrap();
        let out = dir.path().join("out/app.toml");

        run(Commands::Convert {
            file: main,
            out: out.clone(),
        })
        .unwrap();

        let loaded = FileLoader::new().load(&out).unwrap();
        assert_eq!(
            loaded.content,
            serde_json::json!({"server": {"host": "0.0.0.0", "port": 8080}})
        );
    }
}
