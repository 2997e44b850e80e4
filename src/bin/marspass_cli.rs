//! Marspass CLI - registration and ticket export front door
//!
//! Commands: register, ticket, export
//! Outputs JSON to stdout
//! Returns non-zero on validation or export failure

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use marspass::{
    export::ExportPipeline,
    registration::{submit, RegistrationForm, RegistrationOutcome},
    store::{load_ticket_view, JsonFileStore, LoadOutcome, SessionStore},
    ticket::render_ticket,
    AttendeeRecord, EventProfile, PageSpec, Viewport,
};

#[derive(Parser)]
#[command(name = "marspass-cli")]
#[command(about = "Marspass CLI - Event Ticket Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session directory holding the handoff record
    #[arg(short, long, default_value = ".marspass")]
    session_dir: PathBuf,

    /// Optional event profile JSON (defaults are used when absent)
    #[arg(short, long)]
    event: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a registration form and store the resulting record
    Register {
        /// JSON payload (RegistrationForm)
        #[arg(short, long)]
        payload: String,
    },

    /// Render the stored ticket card as SVG
    Ticket {
        /// Write the SVG here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Export the ticket as a PDF document
    Export {
        /// Record JSON; the stored record is used when omitted
        #[arg(short, long)]
        payload: Option<String>,

        /// Logical viewport width, drives the capture scale
        #[arg(long, default_value_t = 1280.0)]
        viewport_width: f32,

        /// Directory the document is saved into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let event = match EventProfile::load_or_default(cli.event.as_deref()) {
        Ok(e) => e,
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to load event profile: {}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };

    let mut store = JsonFileStore::new(&cli.session_dir);

    match cli.command {
        Commands::Register { payload } => register(&payload, &mut store),
        Commands::Ticket { out } => ticket(&store, &event, out),
        Commands::Export {
            payload,
            viewport_width,
            out_dir,
        } => export(payload.as_deref(), &store, event, viewport_width, &out_dir),
    }
}

fn register(payload: &str, store: &mut JsonFileStore) -> ExitCode {
    let form: RegistrationForm = match serde_json::from_str(payload) {
        Ok(f) => f,
        Err(e) => {
            println!(r#"{{"accepted": false, "error": "Invalid payload: {}"}}"#, e);
            return ExitCode::FAILURE;
        }
    };

    match submit(&form) {
        RegistrationOutcome::Accepted(record) => {
            if let Err(e) = store.put(&record) {
                println!(r#"{{"accepted": false, "error": "{}"}}"#, e);
                return ExitCode::FAILURE;
            }
            let output = serde_json::json!({
                "accepted": true,
                "record": record,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            ExitCode::SUCCESS
        }
        RegistrationOutcome::Rejected(violations) => {
            let output = serde_json::json!({
                "accepted": false,
                "violations": violations,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            ExitCode::from(2) // Validation failure
        }
    }
}

fn ticket(store: &JsonFileStore, event: &EventProfile, out: Option<PathBuf>) -> ExitCode {
    let record = match view_record(store) {
        Ok(r) => r,
        Err(code) => return code,
    };

    match render_ticket(&record, event) {
        Ok(region) => {
            if let Some(path) = out {
                if let Err(e) = std::fs::write(&path, &region.svg) {
                    println!(r#"{{"error": "Failed to write {}: {}"}}"#, path.display(), e);
                    return ExitCode::FAILURE;
                }
                let output = serde_json::json!({
                    "ticketId": record.ticket_id,
                    "width": region.width,
                    "height": region.height,
                    "out": path,
                });
                println!("{}", serde_json::to_string_pretty(&output).unwrap());
            } else {
                println!("{}", region.svg);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!(r#"{{"error": "{}"}}"#, e);
            ExitCode::FAILURE
        }
    }
}

fn export(
    payload: Option<&str>,
    store: &JsonFileStore,
    event: EventProfile,
    viewport_width: f32,
    out_dir: &std::path::Path,
) -> ExitCode {
    let record: AttendeeRecord = match payload {
        Some(json) => match serde_json::from_str(json) {
            Ok(r) => r,
            Err(e) => {
                println!(r#"{{"success": false, "error": "Invalid payload: {}"}}"#, e);
                return ExitCode::FAILURE;
            }
        },
        None => match view_record(store) {
            Ok(r) => r,
            Err(code) => return code,
        },
    };

    let pipeline = ExportPipeline::new(event, PageSpec::default());
    let viewport = Viewport::new(viewport_width, viewport_width * 0.625);

    match pipeline.export_for(&record, viewport) {
        Ok(exported) => {
            let path = match exported.save_to(out_dir) {
                Ok(p) => p,
                Err(e) => {
                    println!(r#"{{"success": false, "error": "{}"}}"#, e);
                    return ExitCode::FAILURE;
                }
            };
            let output = serde_json::json!({
                "success": true,
                "path": path,
                "ticket": exported,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            ExitCode::SUCCESS
        }
        Err(e) => {
            let output = serde_json::json!({
                "success": false,
                "error": e.to_string(),
            });
            println!("{}", serde_json::to_string(&output).unwrap());
            ExitCode::from(2) // Export failure
        }
    }
}

/// Resolve the stored record the way the ticket view does: absence is a
/// redirect back to registration, not an error.
fn view_record(store: &JsonFileStore) -> Result<AttendeeRecord, ExitCode> {
    match load_ticket_view(store) {
        Ok(LoadOutcome::Ready { record }) => Ok(record),
        Ok(LoadOutcome::RedirectToRegistration { target }) => {
            let output = serde_json::json!({ "redirect": target });
            println!("{}", serde_json::to_string(&output).unwrap());
            Err(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!(r#"{{"error": "{}"}}"#, e);
            Err(ExitCode::FAILURE)
        }
    }
}
