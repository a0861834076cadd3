//! Heartwise: Heart disease risk assessment client
//!
//! Main entry point for the command-line application.
//!
//! # Usage
//!
//! ```bash
//! heartwise [--api-url <url>] predict [--sample] [--report] [field=value ...]
//! heartwise [--api-url <url>] batch <file.csv>
//! heartwise [--api-url <url>] health | model-info | features
//! heartwise [--api-url <url>] session
//! ```

use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use heartwise::adapters::sanitize::SanitizingMakeWriter;
use heartwise::adapters::HttpPredictionClient;
use heartwise::application::report::{
    export_history, render_dashboard, render_record_report, save_record_report,
};
use heartwise::application::{
    DashboardSummary, HistoryEvent, HistoryStore, PredictionProgress, PredictionService,
    PredictionWorker, TimeRange,
};
use heartwise::config::ClientConfig;
use heartwise::domain::{PredictionForm, PredictionRecord, FIELD_SPECS};
use heartwise::HeartwiseError;

type Service = PredictionService<HttpPredictionClient>;

const USAGE: &str = "Usage: heartwise [--api-url <url>] <command>
  heartwise predict [--sample] [--report] [field=value ...]
  heartwise batch <file.csv>
  heartwise health | model-info | features
  heartwise session";

const SESSION_HELP: &str = "Commands:
  predict [--sample] [field=value ...]   submit a prediction
  dashboard [all|7days|30days]           show history analytics
  report [file]                          print or save the latest prediction report
  export <file.json>                     save the history as JSON
  history                                list predictions, newest first
  fields                                 list clinical fields and ranges
  clear                                  empty the history
  help | quit";

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let api_url = take_option(&mut args, "--api-url")?;
    let command = args.first().map_or("session", String::as_str);

    // Logs go to a file while a session owns the terminal
    let _guard = init_logging(command == "session" && std::io::stdin().is_terminal())?;

    tracing::info!("Starting Heartwise...");

    let config = match api_url {
        Some(url) => ClientConfig::from_env()
            .with_api_url(&url)
            .map_err(user_error)?,
        None => ClientConfig::from_env(),
    };
    let client = HttpPredictionClient::new(config).map_err(user_error)?;
    tracing::info!("Prediction service at {}", client.config().api_url);
    let history = Arc::new(HistoryStore::new());
    let service = Arc::new(PredictionService::new(Arc::new(client), history));

    let rest = args.get(1..).unwrap_or_default();
    let outcome = match command {
        "predict" => cmd_predict(&service, rest),
        "batch" => cmd_batch(&service, rest),
        "health" => cmd_health(&service),
        "model-info" => print_json(service.model_info().map_err(user_error)?),
        "features" => print_json(service.features().map_err(user_error)?),
        "session" => run_session(&service),
        "help" | "--help" | "-h" => {
            println!("{USAGE}");
            Ok(())
        }
        other => Err(anyhow!("Unknown command '{other}'\n{USAGE}")),
    };

    tracing::info!("Heartwise shutdown complete.");
    outcome
}

/// Install the tracing subscriber.
///
/// `HEARTWISE_LOG_MODE`: `file`, `stderr`, or `auto` (file when
/// `prefer_file`, otherwise stderr). Stdout is reserved for command output.
fn init_logging(prefer_file: bool) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_mode = std::env::var("HEARTWISE_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let use_file = match log_mode.as_str() {
        "file" => true,
        "stderr" => false,
        // auto
        _ => prefer_file,
    };

    let (writer, guard) = if use_file {
        let log_file = std::env::var("HEARTWISE_LOG_FILE").unwrap_or_else(|_| {
            std::env::temp_dir()
                .join("heartwise.log")
                .to_string_lossy()
                .into_owned()
        });

        if let Some(parent) = Path::new(&log_file).parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Cannot open log file {log_file}"))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

/// Remove `name <value>` from the argument list.
fn take_option(args: &mut Vec<String>, name: &str) -> Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    args.remove(pos);
    if pos >= args.len() {
        bail!("{name} requires a value");
    }
    Ok(Some(args.remove(pos)))
}

fn user_error(e: impl Into<HeartwiseError>) -> anyhow::Error {
    anyhow!(e.into().user_message())
}

/// Split `--flags` from `field=value` pairs and build the form.
fn parse_form(args: &[String]) -> Result<(PredictionForm, Vec<&str>)> {
    let mut flags = Vec::new();
    let mut pairs = Vec::new();
    for arg in args {
        if arg.starts_with("--") {
            flags.push(arg.as_str());
        } else if let Some((name, value)) = arg.split_once('=') {
            pairs.push((name.trim(), value));
        } else {
            bail!("Expected field=value, got '{arg}'");
        }
    }

    let form = if flags.contains(&"--sample") {
        let mut form = PredictionForm::default();
        form.load_sample_data();
        form.apply_pairs(pairs).map(|()| form)
    } else {
        PredictionForm::from_pairs(pairs)
    };
    Ok((form.map_err(user_error)?, flags))
}

fn print_warnings(form: &PredictionForm) {
    if let Ok(input) = form.to_clinical_input() {
        for warning in Service::range_warnings(&input) {
            eprintln!("warning: {warning}");
        }
    }
}

fn print_record(record: &PredictionRecord) {
    let risk = record
        .risk_level()
        .map_or_else(|| "Unknown".to_string(), ToString::to_string);
    println!("Prediction {}: {} Risk", record.id(), risk);
    if let Some(p) = record.probability() {
        println!("  Probability: {:.1}%", p * 100.0);
    }
    if let Some(confidence) = record.confidence() {
        println!("  Confidence:  {confidence}");
    }
    if let Some(level) = record.risk_level() {
        println!("  {}", level.description());
    }
    if record.is_partial() {
        println!("  (incomplete response from the service)");
    }
    for (name, weight) in record.top_features(3) {
        println!("  {name:<10} {weight:+.3}");
    }
    for rec in record.personalized_recommendations() {
        println!("  - {rec}");
    }
}

fn print_json(value: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn cmd_predict(service: &Service, args: &[String]) -> Result<()> {
    let (mut form, flags) = parse_form(args)?;
    print_warnings(&form);

    let result = service.submit(&form);
    form.clear_sensitive();
    let record = result.map_err(user_error)?;

    print_record(&record);
    if flags.contains(&"--report") {
        println!();
        print!("{}", render_record_report(&record, chrono::Utc::now()));
    }
    Ok(())
}

fn cmd_batch(service: &Service, args: &[String]) -> Result<()> {
    let [path] = args else {
        bail!("Usage: heartwise batch <file.csv>");
    };
    let body = service.submit_batch(Path::new(path)).map_err(user_error)?;
    print_json(body)
}

fn cmd_health(service: &Service) -> Result<()> {
    let health = service.health().map_err(user_error)?;
    println!(
        "{} ({})",
        health.status,
        health.timestamp.as_deref().unwrap_or("no timestamp")
    );
    if !health.is_healthy() {
        bail!("Prediction service is not healthy");
    }
    Ok(())
}

/// Submit through the background worker, reporting progress.
fn session_predict(service: &Arc<Service>, args: &[String]) -> Result<()> {
    let (mut form, _) = parse_form(args)?;
    print_warnings(&form);

    let input = form.to_clinical_input();
    form.clear_sensitive();
    let input = input.map_err(user_error)?;

    let handle = PredictionWorker::spawn(Arc::clone(service), input);
    loop {
        match handle.recv_timeout(Duration::from_millis(250)) {
            Some(PredictionProgress::Submitting) => println!("Analyzing..."),
            Some(PredictionProgress::Complete(record)) => {
                print_record(&record);
                return Ok(());
            }
            Some(PredictionProgress::Failed(message)) => bail!(message),
            None => {
                print!(".");
                let _ = std::io::stdout().flush();
            }
        }
    }
}

fn run_session(service: &Arc<Service>) -> Result<()> {
    let history = Arc::clone(service.history());
    let subscription = history.subscribe(|event| match event {
        HistoryEvent::Added(id) => tracing::debug!("History gained prediction {}", id),
        HistoryEvent::Cleared { removed } => tracing::debug!("History cleared ({} removed)", removed),
    });

    println!("Heartwise session. Type 'help' for commands.");
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let words: Vec<String> = line?.split_whitespace().map(str::to_string).collect();
        let Some((cmd, rest)) = words.split_first() else {
            continue;
        };

        let outcome = match cmd.as_str() {
            "predict" => session_predict(service, rest),
            "dashboard" => rest
                .first()
                .map_or(Ok(TimeRange::All), |r| r.parse::<TimeRange>())
                .map_err(|e| anyhow!(e))
                .map(|range| {
                    let summary = DashboardSummary::compute(&history.get_all(), range);
                    print!("{}", render_dashboard(&summary));
                }),
            "report" => match (history.latest(), rest.first()) {
                (None, _) => Err(anyhow!("No predictions yet")),
                (Some(record), None) => {
                    print!("{}", render_record_report(&record, chrono::Utc::now()));
                    Ok(())
                }
                (Some(record), Some(path)) => {
                    save_record_report(&record, Path::new(path), chrono::Utc::now())
                        .map(|()| println!("Report saved to {path}"))
                        .map_err(user_error)
                }
            },
            "export" => match rest.first() {
                Some(path) => {
                    let records = history.get_all();
                    export_history(&records, Path::new(path))
                        .map(|()| println!("Exported {} predictions to {path}", records.len()))
                        .map_err(user_error)
                }
                None => Err(anyhow!("Usage: export <file.json>")),
            },
            "history" => {
                for record in history.get_all() {
                    let risk = record.risk_level().map_or("-", |level| level.as_str());
                    println!(
                        "{:<6} {}  {:<7} {}",
                        record.id().to_string(),
                        record.timestamp().format("%Y-%m-%d %H:%M:%S"),
                        risk,
                        record
                            .probability()
                            .map_or_else(|| "N/A".to_string(), |p| format!("{:.1}%", p * 100.0))
                    );
                }
                Ok(())
            }
            "fields" => {
                for spec in &FIELD_SPECS {
                    println!("{:<10} {:<26} {}", spec.name, spec.label, spec.hint);
                }
                Ok(())
            }
            "clear" => {
                println!("Removed {} predictions", history.clear_predictions());
                Ok(())
            }
            "help" => {
                println!("{SESSION_HELP}");
                Ok(())
            }
            "quit" | "exit" => break,
            other => Err(anyhow!("Unknown command '{other}'. Type 'help'.")),
        };

        if let Err(e) = outcome {
            eprintln!("{e}");
        }
    }

    history.unsubscribe(subscription);
    Ok(())
}
