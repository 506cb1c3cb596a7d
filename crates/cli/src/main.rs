use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::Table;
use context::{AppContext, CountParams, SearchParams};
use query::plan::SortDirection;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{error, warn};

/// Debug REPL for issuing Karp-s queries directly against a configured
/// database, bypassing the HTTP layer and its access control.
#[derive(Parser, Debug)]
#[command(name = "karps-cli")]
#[command(about = "Karp-s query debug console", long_about = None)]
struct Args {
    /// Execute a single command and exit
    #[arg(short, long)]
    exec: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
                .add_directive("rustyline=error".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let ctx = AppContext::new(args.config.as_deref()).await?;

    if let Some(command) = args.exec {
        run_command(&ctx, &command).await;
        return Ok(());
    }

    println!("Karp-s query console");
    println!("Type 'exit' or 'quit' to exit, '\\h' for help\n");

    let history_file = history_file_path();
    let mut rl = DefaultEditor::new().context("failed to create readline editor")?;
    if history_file.exists() {
        rl.load_history(&history_file).context("failed to load history file")?;
    }

    loop {
        let readline = rl.readline("karps> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    save_history(&mut rl, &history_file);
                    println!("Goodbye!");
                    break;
                }
                if line == "\\h" {
                    print_help();
                    continue;
                }

                run_command(&ctx, line).await;
            }
            Err(ReadlineError::Interrupted) => {
                save_history(&mut rl, &history_file);
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                save_history(&mut rl, &history_file);
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                save_history(&mut rl, &history_file);
                error!("readline error: {:?}", err);
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

async fn run_command(ctx: &AppContext, line: &str) {
    let mut parts = line.splitn(2, char::is_whitespace);
    let verb = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("");
    let fields = parse_fields(rest);

    let result = match verb {
        "search" => run_search(ctx, &fields).await,
        "count" => run_count(ctx, &fields).await,
        other => Err(anyhow::anyhow!("unknown command \"{}\" (try \\h)", other)),
    };

    if let Err(e) = result {
        error!("command failed: {}", e);
        eprintln!("Error: {}", e);
    }
}

/// All resources are reachable from the console; there is no caller identity
/// to restrict against.
fn unrestricted(ctx: &AppContext) -> HashSet<String> {
    ctx.resources.iter().map(|r| r.resource_id.clone()).collect()
}

async fn run_search(ctx: &AppContext, fields: &std::collections::HashMap<String, String>) -> Result<()> {
    let resources = fields.get("resources").map(|s| split_csv(s));
    let params = SearchParams {
        query: fields.get("q").cloned().unwrap_or_default(),
        resources,
        fields: fields.get("fields").map(|s| split_csv(s)),
        sort: fields.get("sort").map(|s| parse_sort(s)).transpose()?.unwrap_or_default(),
        from: fields.get("from").and_then(|s| s.parse().ok()).unwrap_or(0),
        size: fields.get("size").and_then(|s| s.parse().ok()).unwrap_or(25),
        allowed_resources: unrestricted(ctx),
    };

    let result = context::search::search(ctx, params).await?;
    println!("total: {}", result.total);
    print_hits(&result);
    Ok(())
}

async fn run_count(ctx: &AppContext, fields: &std::collections::HashMap<String, String>) -> Result<()> {
    let resources = fields.get("resources").map(|s| split_csv(s));
    let compile = fields.get("compile").map(|s| split_csv(s)).unwrap_or_default();
    if compile.is_empty() {
        anyhow::bail!("count requires compile=<field[,field...]>");
    }
    let params = CountParams {
        query: fields.get("q").cloned().unwrap_or_default(),
        resources,
        compile,
        columns_raw: fields.get("columns").cloned().unwrap_or_else(|| "resource_id=_count".to_string()),
        sort: fields.get("sort").map(|s| parse_sort(s)).transpose()?.unwrap_or_default(),
        allowed_resources: unrestricted(ctx),
    };

    let result = context::count::count(ctx, params).await?;
    print_count_result(&result);
    Ok(())
}

fn print_hits(result: &storage::SearchResult) {
    let mut table = Table::new();
    table.set_header(vec!["resource_id", "entry"]);
    for hit in &result.hits {
        table.add_row(vec![hit.resource_id.clone(), serde_json::to_string(&hit.entry).unwrap_or_default()]);
    }
    println!("{table}");
}

fn print_count_result(result: &storage::CountResult) {
    let mut table = Table::new();
    let headers: Vec<String> = result.headers.iter().map(header_label).collect();
    table.set_header(headers);
    for row in &result.rows {
        table.add_row(row.iter().map(count_cell_label).collect::<Vec<_>>());
    }
    table.add_row(result.total.iter().map(count_cell_label).collect::<Vec<_>>());
    println!("{table}");
}

fn header_label(header: &storage::Header) -> String {
    match header {
        storage::Header::Compile { column_field } => column_field.clone(),
        storage::Header::Total => "total".to_string(),
        storage::Header::Value { header_value, .. } => header_value.to_string(),
        storage::Header::Count { header_value, .. } => header_value.to_string(),
    }
}

fn count_cell_label(cell: &storage::CountCell) -> String {
    match &cell.value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
        None => cell.count.to_string(),
    }
}

fn parse_fields(rest: &str) -> std::collections::HashMap<String, String> {
    rest.split_whitespace()
        .filter_map(|part| part.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())))
        .collect()
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

fn parse_sort(raw: &str) -> Result<Vec<(String, SortDirection)>> {
    raw.split(',')
        .map(|part| {
            let part = part.trim();
            match part.split_once('|') {
                Some((field, "asc")) => Ok((field.to_string(), SortDirection::Asc)),
                Some((field, "desc")) => Ok((field.to_string(), SortDirection::Desc)),
                Some((_, other)) => anyhow::bail!("unknown sort order \"{}\"", other),
                None => Ok((part.to_string(), SortDirection::Asc)),
            }
        })
        .collect()
}

fn history_file_path() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        home.join(".karps_cli_history")
    } else {
        PathBuf::from(".karps_cli_history")
    }
}

fn save_history(rl: &mut DefaultEditor, history_file: &PathBuf) {
    rl.save_history(history_file).context("failed to save history file").unwrap_or_else(|e| {
        warn!("could not save history: {}", e);
        eprintln!("Warning: could not save history: {}", e);
    });
}

fn print_help() {
    println!("Karp-s console commands:");
    println!("  exit, quit                                - exit the console");
    println!("  \\h                                         - show this help message");
    println!("  search resources=<csv> q=<query> [fields=<csv>] [sort=<spec>] [from=<n>] [size=<n>]");
    println!("  count  resources=<csv> compile=<csv> q=<query> [columns=<field=cell>] [sort=<spec>]");
    println!("\nExamples:");
    println!("  search resources=places q=\"entry_word|equals|Stockholm\"");
    println!("  count  resources=places compile=pos columns=resource_id=_count");
}
