//! # sheetlink-cli
//!
//! Command-line interface for the sheetlink spreadsheet client.

mod formats;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;

use sheetlink_client::{load_token, SheetsClient};
use sheetlink_core::{expand_range_to_cells, CellData, WriteIntent};

/// sheetlink - minimal command-line client for the spreadsheet backend
#[derive(Parser)]
#[command(name = "sheetlink")]
#[command(author, version, about = "Read and write spreadsheets from the command line", long_about = None)]
struct Cli {
    /// Token file to load credentials from
    #[arg(long, value_name = "PATH", global = true)]
    token_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read cell values
    Read {
        spreadsheet_id: String,
        /// Cells or ranges (A1, A1:B10, Sheet1!A1). Reads every sheet when omitted.
        ranges: Vec<String>,
    },
    /// Write cell values
    Write {
        spreadsheet_id: String,
        /// Alternating cell/range and value pairs; stdin when omitted
        pairs: Vec<String>,
    },
    /// Read spreadsheet structure and properties
    MetaRead { spreadsheet_id: String },
    /// Apply structural operations from JSON on stdin
    MetaWrite { spreadsheet_id: String },
    /// Create a new spreadsheet
    Create { title: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .init();
    }

    let token = load_token(cli.token_file.as_deref())?;
    let client = SheetsClient::new(token)?;

    match cli.command {
        Command::Read {
            spreadsheet_id,
            ranges,
        } => cmd_read(&client, &spreadsheet_id, ranges).await,
        Command::Write {
            spreadsheet_id,
            pairs,
        } => cmd_write(&client, &spreadsheet_id, pairs).await,
        Command::MetaRead { spreadsheet_id } => cmd_meta_read(&client, &spreadsheet_id).await,
        Command::MetaWrite { spreadsheet_id } => cmd_meta_write(&client, &spreadsheet_id).await,
        Command::Create { title } => cmd_create(&client, &title).await,
    }
}

/// Read values and print `address value` lines.
///
/// With no ranges, reads structure first to discover every sheet, then
/// reads each whole sheet.
async fn cmd_read(client: &SheetsClient, spreadsheet_id: &str, ranges: Vec<String>) -> Result<()> {
    let ranges = if ranges.is_empty() {
        let meta = client.meta_read(spreadsheet_id).await?;
        let titles = sheet_titles(&meta);
        if titles.is_empty() {
            bail!("no sheets found in spreadsheet");
        }
        titles
    } else {
        ranges
    };

    let response = client
        .read(spreadsheet_id, &ranges, CellData::VALUE | CellData::FORMULA)
        .await?;

    let mut cells = IndexMap::new();
    if let Some(values) = value_rows(&response) {
        // Single-range response carries values at the top level.
        let range = response["range"].as_str().unwrap_or_default();
        cells.extend(expand_range_to_cells(range, &values)?);
    } else if let Some(value_ranges) = response["valueRanges"].as_array() {
        for value_range in value_ranges {
            let range = value_range["range"].as_str().unwrap_or_default();
            let values = value_rows(value_range).unwrap_or_default();
            cells.extend(expand_range_to_cells(range, &values)?);
        }
    }

    println!("{}", formats::format_cell_value_pairs(&cells));
    Ok(())
}

/// Write cells from command-line pairs or piped input.
async fn cmd_write(
    client: &SheetsClient,
    spreadsheet_id: &str,
    pairs: Vec<String>,
) -> Result<()> {
    let intents: Vec<WriteIntent> = if pairs.is_empty() {
        let input = formats::read_stdin()?;
        if input.is_empty() {
            bail!("no input provided; pass cell/value pairs or pipe data to stdin");
        }
        formats::parse_input(&input)?
    } else {
        if pairs.len() % 2 != 0 {
            bail!("expected alternating cell/range and value pairs");
        }
        pairs
            .chunks(2)
            .map(|pair| {
                WriteIntent::values(
                    pair[0].clone(),
                    vec![vec![JsonValue::String(pair[1].clone())]],
                )
            })
            .collect()
    };

    let response = client.write(spreadsheet_id, &intents).await?;
    if let Some(count) = response.total_updated_cells() {
        eprintln!("Updated {count} cells");
    }
    Ok(())
}

async fn cmd_meta_read(client: &SheetsClient, spreadsheet_id: &str) -> Result<()> {
    let meta = client.meta_read(spreadsheet_id).await?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}

/// Apply structural operations read as JSON from stdin: either
/// `{"requests": [...]}` or a bare array of requests.
async fn cmd_meta_write(client: &SheetsClient, spreadsheet_id: &str) -> Result<()> {
    let input = formats::read_stdin()?;
    if input.is_empty() {
        bail!("no input provided; pipe JSON to stdin");
    }

    let parsed: JsonValue = serde_json::from_str(&input)?;
    let requests = match parsed {
        JsonValue::Object(mut object) => match object.remove("requests") {
            Some(JsonValue::Array(requests)) => requests,
            _ => bail!("expected JSON with a 'requests' array"),
        },
        JsonValue::Array(requests) => requests,
        _ => bail!("expected JSON with a 'requests' array or an array of requests"),
    };

    let reply = client.meta_write(spreadsheet_id, &requests).await?;
    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}

/// Create a spreadsheet, with optional sheet descriptors piped as JSON.
async fn cmd_create(client: &SheetsClient, title: &str) -> Result<()> {
    let input = formats::read_stdin()?;
    let sheets: Option<Vec<JsonValue>> = if input.is_empty() {
        None
    } else {
        match serde_json::from_str::<JsonValue>(&input)? {
            JsonValue::Object(mut object) => match object.remove("sheets") {
                Some(JsonValue::Array(sheets)) => Some(sheets),
                _ => None,
            },
            JsonValue::Array(sheets) => Some(sheets),
            _ => None,
        }
    };

    let created = client.create(title, sheets.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

/// Sheet titles from a structure read, in sheet order.
fn sheet_titles(meta: &JsonValue) -> Vec<String> {
    meta["sheets"]
        .as_array()
        .map(|sheets| {
            sheets
                .iter()
                .filter_map(|sheet| sheet["properties"]["title"].as_str())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Extract the 2-D values array from a values-surface response, if present.
fn value_rows(response: &JsonValue) -> Option<Vec<Vec<JsonValue>>> {
    let rows = response.get("values")?.as_array()?;
    Some(
        rows.iter()
            .map(|row| row.as_array().cloned().unwrap_or_default())
            .collect(),
    )
}
