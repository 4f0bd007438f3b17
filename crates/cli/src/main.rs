use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use packnorm_api::{survey, Eligibility, Node, NormalizeReport, Normalizer, Record};
use packnorm_crm::Roster;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "packnormctl", version, about = "Normalize decoded result documents")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a JSON document as a Roster result and normalize it
    Normalize {
        /// Path to the document ("-" reads stdin)
        file: PathBuf,
    },
    /// Print the Roster field table and how each field is treated
    Fields,
}

fn init_tracing() {
    let env = std::env::var("PACKNORM_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

const DEFAULT_MAX_ELEMENTS: usize = 1_000_000;

fn max_elements() -> usize {
    parse_max_elements(std::env::var("PACKNORM_MAX_ELEMENTS").ok().as_deref())
}

fn parse_max_elements(raw: Option<&str>) -> usize {
    let Some(raw) = raw else { return DEFAULT_MAX_ELEMENTS };
    match raw.trim().parse::<usize>() {
        Ok(n) => n,
        Err(e) => {
            warn!(value = %raw, error = %e, default = DEFAULT_MAX_ELEMENTS, "invalid PACKNORM_MAX_ELEMENTS; using default");
            DEFAULT_MAX_ELEMENTS
        }
    }
}

fn read_input(file: &Path) -> Result<Vec<u8>> {
    if file.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut std::io::stdin(), &mut buf).context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read(file).with_context(|| format!("reading {}", file.display()))
}

#[derive(Serialize)]
struct FieldRow {
    name: &'static str,
    treatment: String,
}

#[derive(Serialize)]
struct NormalizeOutput<'a> {
    result: &'a Roster,
    report: &'a NormalizeReport,
}

fn describe(e: &Eligibility) -> String {
    match e {
        Eligibility::Constant => "constant (skipped)".to_string(),
        Eligibility::Scalar => "scalar".to_string(),
        Eligibility::Absent => "absent container".to_string(),
        Eligibility::Candidate { shape, len, nodes } => format!("candidate: {} with {} elements ({} nodes)", shape, len, nodes),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { file } => {
            let bytes = read_input(&file)?;
            let value: serde_json::Value = serde_json::from_slice(&bytes).context("parsing document")?;
            let mut roster = Roster::decode(&Node::new(value), max_elements()).context("decoding roster")?;
            let report = Normalizer::new().run(&mut roster).context("normalizing roster")?;
            info!(
                record = %report.record,
                fields_remapped = report.fields_remapped,
                converted = report.elements_converted,
                "normalized"
            );
            match cli.output {
                Output::Human => {
                    println!("{} ({})", roster.name, Roster::record_name());
                    for u in roster.users.values() {
                        println!("  user {} <{}>", u.id.unwrap_or_default(), u.email.as_deref().unwrap_or("-"));
                    }
                    if let Some(admins) = &roster.admins {
                        println!("  admins: {}", admins.len());
                    }
                    println!("  tags: {}", roster.tags.values().cloned().collect::<Vec<_>>().join(", "));
                    println!("  pending: {:?}", roster.pending.values().collect::<Vec<_>>());
                    println!(
                        "remapped {} fields, converted {} elements, passed through {}",
                        report.fields_remapped, report.elements_converted, report.elements_passed_through
                    );
                }
                Output::Json => {
                    let out = NormalizeOutput { result: &roster, report: &report };
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
            }
        }
        Commands::Fields => {
            let mut sample = Roster::default();
            let rows: Vec<FieldRow> = survey(&mut sample)?
                .into_iter()
                .map(|(name, e)| FieldRow { name, treatment: describe(&e) })
                .collect();
            match cli.output {
                Output::Human => {
                    for (row, field) in rows.iter().zip(Roster::fields()) {
                        let element = format!("{:?}", field.element_type());
                        println!("{:<10} {:<12} {}", row.name, element, row.treatment);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
            }
        }
    }
    Ok(())
}
