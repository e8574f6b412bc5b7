use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use tabular_qa_engine::ingestion::load_csv_into;
use tabular_qa_engine::pipeline::QueryPipeline;
use tabular_qa_engine::storage::DatasetStore;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = Arc::new(DatasetStore::new());
    for path in std::env::args().skip(1) {
        let id = load_csv_into(&store, &path, None)?;
        println!("Loaded '{}' from {}", id, path);
    }

    let pipeline = QueryPipeline::new(Arc::clone(&store));

    println!("Tabular Q&A Engine");
    println!("{}", "=".repeat(60));
    println!("Ask questions about the loaded data.");
    println!("Commands: \\load <file.csv> [id], \\datasets, \\quit");
    println!();

    let stdin = io::stdin();
    loop {
        print!("qa> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('\\') {
            let mut parts = command.split_whitespace();
            match parts.next() {
                Some("quit") | Some("q") | Some("exit") => break,
                Some("datasets") => {
                    let stats = store.stats();
                    if stats.total_datasets == 0 {
                        println!("No datasets loaded.");
                    } else {
                        for id in &stats.dataset_ids {
                            println!("- {}", id);
                        }
                        println!("{} rows total", stats.total_rows);
                    }
                }
                Some("load") => match parts.next() {
                    Some(path) => {
                        match load_csv_into(&store, path, parts.next()) {
                            Ok(id) => println!("Loaded '{}'", id),
                            Err(e) => eprintln!("Load failed: {}", e),
                        }
                    }
                    None => eprintln!("Usage: \\load <file.csv> [id]"),
                },
                other => eprintln!("Unknown command: \\{}", other.unwrap_or("")),
            }
            continue;
        }

        let response = pipeline.process(input, None);
        println!("{}", response.answer);
        println!(
            "  [intent: {}, confidence: {:.2}{}]",
            response.intent,
            response.confidence,
            if response.is_ambiguous { ", ambiguous" } else { "" }
        );
        println!();
    }

    Ok(())
}
