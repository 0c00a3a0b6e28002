use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use optinote_core::{
    constants::PATIENT_REF_FIELD, resolve_code_catalogue_path, ClinicianSettings, CodeRecord,
    CodeSearch, Condition, ConditionCatalogue, NoteFields, NoteGenerator, NoteHeader, SelectedCodes,
    ToggleState,
};
use optinote_soap::{SoapConfig, SoapFormatter};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "optinote")]
#[command(about = "OptiNote ophthalmology note assistant CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List conditions with their fields and toggle groups ([x] marks the default)
    Conditions,
    /// Generate a clinical note
    Note {
        /// Condition tag: DR, AMD, Glaucoma, ROP or Cataract
        condition: String,
        /// Free-text field as key=value (repeatable)
        #[arg(long = "field", value_parser = parse_key_val)]
        fields: Vec<(String, String)>,
        /// Toggle selection as group=value (repeatable)
        #[arg(long = "toggle", value_parser = parse_key_val)]
        toggles: Vec<(String, String)>,
        /// Patient reference for the header
        #[arg(long)]
        patient_ref: Option<String>,
        /// Note date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Search ICD-10 codes by symptom or condition name
    Search {
        query: String,
        /// Add a result to the selected codes by code (repeatable)
        #[arg(long = "select")]
        select: Vec<String>,
    },
    /// Reformat free-text notes into SOAP structure
    Soap {
        text: String,
        /// Clinical context label, e.g. "Glaucoma clinic"
        #[arg(long)]
        context: Option<String>,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn settings_from_env() -> ClinicianSettings {
    ClinicianSettings::from_values(
        std::env::var("OPTINOTE_CLINICIAN_NAME").ok(),
        std::env::var("OPTINOTE_DEPARTMENT").ok(),
        std::env::var("GROQ_API_KEY").ok(),
    )
}

fn print_conditions(catalogue: &ConditionCatalogue) {
    for schema in catalogue.schemas() {
        println!("{} — {}", schema.condition(), schema.title());
        println!("  fields: {}", schema.fields().join(", "));
        for group in schema.groups() {
            let values: Vec<String> = group
                .domain()
                .iter()
                .map(|v| {
                    if v == group.default_value() {
                        format!("[{v}]")
                    } else {
                        v.clone()
                    }
                })
                .collect();
            println!("  {}: {}", group.key(), values.join(", "));
        }
    }
}

/// One search listing line; codes already in `selected` are marked.
fn result_line(record: &CodeRecord, selected: &SelectedCodes) -> String {
    let mark = if selected.contains(&record.code) { "✓" } else { " " };
    match &record.condition {
        Some(condition) => format!("{mark} {}  {}  ({})", record.code, record.description, condition),
        None => format!("{mark} {}  {}", record.code, record.description),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("optinote=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Conditions) => {
            let catalogue = ConditionCatalogue::builtin()?;
            print_conditions(&catalogue);
        }
        Some(Commands::Note {
            condition,
            fields,
            toggles,
            patient_ref,
            date,
        }) => {
            let catalogue = Arc::new(ConditionCatalogue::builtin()?);
            let condition = match Condition::parse(&condition) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(());
                }
            };
            let toggles = match ToggleState::from_selections(&catalogue, condition, toggles) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(());
                }
            };
            let fields: NoteFields = fields.into_iter().collect();
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let patient_ref = patient_ref
                .as_deref()
                .or_else(|| fields.get(PATIENT_REF_FIELD));
            let header = NoteHeader::compose(date, patient_ref, &settings_from_env());

            match NoteGenerator::new(catalogue).generate(condition, &fields, &toggles, &header) {
                Ok(note) => println!("{}", note),
                Err(e) => eprintln!("Error generating note: {}", e),
            }
        }
        Some(Commands::Search { query, select }) => {
            let override_path = std::env::var("OPTINOTE_CODE_CATALOGUE")
                .ok()
                .map(PathBuf::from);
            let search = match resolve_code_catalogue_path(override_path) {
                Ok(path) => CodeSearch::load(&path),
                Err(e) => CodeSearch::unavailable(e.to_string()),
            };
            let results = match search.search(&query) {
                Ok(results) => results,
                Err(e) => {
                    eprintln!("Error searching codes: {}", e);
                    return Ok(());
                }
            };

            let mut selected = SelectedCodes::new();
            for code in &select {
                match results.records().iter().find(|r| &r.code == code) {
                    Some(record) => {
                        selected.add(record.clone());
                    }
                    None => eprintln!("Code {} is not in the results", code),
                }
            }

            if let Some(message) = results.no_results_message() {
                println!("{}", message);
            }
            for record in results.records() {
                println!("{}", result_line(record, &selected));
            }
            if results.truncated() {
                println!(
                    "Showing {} of {} matches; refine the query to see more.",
                    results.records().len(),
                    results.total_matches()
                );
            }
            if let Some(export) = selected.serialize() {
                println!("\nSelected codes:\n{}", export);
            }
        }
        Some(Commands::Soap { text, context }) => {
            let config = SoapConfig::from_overrides(
                std::env::var("OPTINOTE_SOAP_ENDPOINT").ok(),
                std::env::var("OPTINOTE_SOAP_MODEL").ok(),
            );
            let settings = settings_from_env();
            let formatter = SoapFormatter::new(config)?;
            match formatter
                .format(&text, context.as_deref(), settings.api_key.as_ref())
                .await
            {
                Ok(soap) => println!("{}", soap),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
        None => {
            println!("Use 'optinote --help' for commands");
        }
    }

    Ok(())
}
