//! Purpose: `remote-model` CLI entry point.
//! Role: Binary crate root; parses args, reads one model snapshot, emits JSON on stdout.
//! Invariants: Errors are emitted as JSON on stderr; stdout carries only results.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod snapshot_json;

use remote_model::api::{
    AccessorOptions, DbusBus, Error, ErrorKind, ModelAccessor, Schema, resolve_object_path,
    to_exit_code,
};
use snapshot_json::snapshot_json;

#[derive(Parser, Debug)]
#[command(
    name = "remote-model",
    version,
    about = "Read snapshots of shared models exposed on D-Bus"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the model's current rows as JSON.
    Get(GetArgs),
    /// Print the object path a service identifier resolves to.
    Path {
        /// Service identifier, e.g. com.example.Contacts
        service: String,
    },
}

#[derive(Args, Debug)]
struct GetArgs {
    /// Service identifier owning the model, e.g. com.example.Contacts
    #[arg(long)]
    service: String,
    /// Column to surface, as INDEX=NAME; repeat for each column.
    #[arg(long = "column", value_name = "INDEX=NAME", required = true, value_parser = parse_column)]
    columns: Vec<(u32, String)>,
    /// Fail unless the model is at exactly this seqnum.
    #[arg(long)]
    seqnum: Option<u64>,
    /// Give up on the Clone call after this many milliseconds.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,
    #[arg(long, value_enum, default_value_t = BusKind::Session)]
    bus: BusKind,
    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum BusKind {
    Session,
    System,
}

fn parse_column(raw: &str) -> Result<(u32, String), Error> {
    Schema::parse_column(raw)
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(()) => 0,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();
    match cli.command {
        Command::Path { service } => {
            println!("{}", resolve_object_path(&service));
            Ok(())
        }
        Command::Get(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to start runtime")
                        .with_source(err)
                })?;
            runtime.block_on(get(args))
        }
    }
}

async fn get(args: GetArgs) -> Result<(), Error> {
    let bus = match args.bus {
        BusKind::Session => DbusBus::session().await?,
        BusKind::System => DbusBus::system().await?,
    };
    let mut options = AccessorOptions::new();
    if let Some(timeout_ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(timeout_ms));
    }
    let accessor = ModelAccessor::builder()
        .bus(&bus)
        .service(args.service)
        .schema(Schema::new(args.columns))
        .options(options)
        .build()?;

    let snapshot = accessor.fetch_snapshot(args.seqnum).await?;
    let value = snapshot_json(&snapshot);
    let encoded = if args.pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode snapshot json")
            .with_source(err)
    })?;
    println!("{encoded}");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn emit_error(err: &Error) {
    let json = serde_json::to_string(&error_json(err)).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Configuration => "invalid accessor configuration".to_string(),
        ErrorKind::Transport => "bus call failed".to_string(),
        ErrorKind::StaleSnapshot => "model snapshot is stale".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(service) = err.service() {
        inner.insert("service".to_string(), json!(service));
    }
    if let Some(expected) = err.expected_seqnum() {
        inner.insert("expected_seqnum".to_string(), json!(expected));
    }
    if let Some(actual) = err.actual_seqnum() {
        inner.insert("actual_seqnum".to_string(), json!(actual));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}
