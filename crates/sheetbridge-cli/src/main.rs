//! sheetbridge CLI - run workbook documents against a backend

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sheetbridge::prelude::*;
use sheetbridge::{read_config, resolve, BookDocument, RunSummary, Transport};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetbridge")]
#[command(
    author,
    version,
    about = "Send workbook documents to a compute backend and apply its actions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the payload a run would send
    Payload {
        /// Workbook document (JSON)
        input: PathBuf,

        #[command(flatten)]
        sheets: SheetFilter,
    },

    /// Run one round trip and write the updated workbook
    Run {
        /// Workbook document (JSON)
        input: PathBuf,

        /// Backend URL (default: URL from the xlwings.conf sheet)
        #[arg(long)]
        url: Option<String>,

        /// Authorization header value
        #[arg(long)]
        auth: Option<String>,

        #[command(flatten)]
        sheets: SheetFilter,

        /// Extra request header, repeatable
        #[arg(short = 'H', long = "header", value_name = "KEY=VALUE")]
        headers: Vec<String>,

        /// Output document (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List all sheets in a workbook document
    Sheets {
        /// Workbook document (JSON)
        input: PathBuf,
    },
}

#[derive(Args)]
struct SheetFilter {
    /// Comma-separated sheets to send; all others are excluded
    #[arg(long)]
    include: Option<String>,

    /// Comma-separated sheets to leave out
    #[arg(long)]
    exclude: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Payload { input, sheets } => show_payload(&input, sheets),
        Commands::Run {
            input,
            url,
            auth,
            sheets,
            headers,
            output,
        } => {
            let mut options = filter_options(sheets);
            options.url = url;
            options.auth = auth;
            for header in &headers {
                let (name, value) = parse_header(header)?;
                options.headers.insert(name, value);
            }
            run(&input, &options, output.as_deref())
        }
        Commands::Sheets { input } => list_sheets(&input),
    }
}

fn filter_options(filter: SheetFilter) -> RunOptions {
    RunOptions {
        include: filter.include,
        exclude: filter.exclude,
        ..RunOptions::default()
    }
}

fn parse_header(header: &str) -> Result<(&str, &str)> {
    match header.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("Invalid header '{}', expected KEY=VALUE", header),
    }
}

fn load_host(input: &Path) -> Result<MemoryHost> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;
    let doc: BookDocument = serde_json::from_str(&text)
        .with_context(|| format!("'{}' is not a workbook document", input.display()))?;
    MemoryHost::from_document(&doc)
        .with_context(|| format!("Failed to load workbook from '{}'", input.display()))
}

fn write_json(value: &impl serde::Serialize, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    match output {
        Some(path) => std::fs::write(path, text + "\n")
            .with_context(|| format!("Failed to write '{}'", path.display())),
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", text).context("Failed to write to stdout")
        }
    }
}

fn show_payload(input: &Path, filter: SheetFilter) -> Result<()> {
    let host = load_host(input)?;
    let config = read_config(&host)?;
    let settings = resolve(&config, &filter_options(filter), &host.sheet_names()?)?;
    let payload = build_payload(
        &host,
        &settings.exclude,
        host.client_name(),
        env!("CARGO_PKG_VERSION"),
    )?;
    write_json(&payload, None)
}

fn run(input: &Path, options: &RunOptions, output: Option<&Path>) -> Result<()> {
    let mut host = load_host(input)?;
    let client = Client::new(ClientConfig::default()).context("Failed to create HTTP client")?;
    let summary = run_host(&client, &mut host, options)?;
    eprintln!("Applied {} actions", summary.actions_applied);
    write_json(&host.to_document(), output)
}

/// Run against a loaded workbook, echoing every alert it raised
///
/// A failed run is also shown as an "Error" alert before it is returned.
fn run_host<T: Transport>(
    client: &Client<T>,
    host: &mut MemoryHost,
    options: &RunOptions,
) -> Result<RunSummary> {
    let result = client.run_and_report(host, options);
    for alert in host.alerts() {
        eprintln!("[{}] {}: {}", alert.mode.as_str(), alert.title, alert.prompt);
    }
    result.context("Run failed")
}

fn list_sheets(input: &Path) -> Result<()> {
    let host = load_host(input)?;
    let active = host.active_sheet_index()?;
    for (i, name) in host.sheet_names()?.iter().enumerate() {
        let marker = if i == active { "*" } else { "" };
        println!("{}\t{}{}", i, name, marker);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header("X-Team=quant").unwrap(), ("X-Team", "quant"));
        assert_eq!(parse_header("Token=a=b").unwrap(), ("Token", "a=b"));
        assert!(parse_header("novalue").is_err());
        assert!(parse_header("=x").is_err());
    }

    #[test]
    fn test_document_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.json");
        std::fs::write(
            &input,
            r#"{"name": "Book1.xlsx", "sheets": [{"name": "Data", "values": [["a", 1]]}]}"#,
        )
        .unwrap();

        let host = load_host(&input).unwrap();
        let output = dir.path().join("out.json");
        write_json(&host.to_document(), Some(&output)).unwrap();

        let reloaded = load_host(&output).unwrap();
        assert_eq!(reloaded.sheet_names().unwrap(), vec!["Data".to_string()]);
        assert_eq!(
            reloaded.workbook().sheet(0).unwrap().cell_value("B1").unwrap(),
            &CellValue::Number(1.0)
        );
    }

    struct Unavailable;

    impl Transport for Unavailable {
        fn post(
            &self,
            _url: &str,
            _headers: &sheetbridge::Headers,
            _payload: &sheetbridge::Payload,
        ) -> sheetbridge::Result<sheetbridge::ActionResponse> {
            Err(Error::Remote {
                status: 503,
                body: "backend down".to_string(),
            })
        }
    }

    #[test]
    fn test_failed_run_raises_error_alert() {
        let mut host = MemoryHost::new(Workbook::new("Book1.xlsx"));
        let config = ClientConfig {
            url: Some("http://backend.test/run".to_string()),
            ..ClientConfig::default()
        };
        let client = Client::with_transport(config, Unavailable);

        let err = run_host(&client, &mut host, &RunOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("backend down"));

        let alerts = host.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "Error");
        assert_eq!(alerts[0].prompt, "backend down");
        assert_eq!(alerts[0].mode.as_str(), "critical");
    }

    #[test]
    fn test_missing_file_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_host(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
