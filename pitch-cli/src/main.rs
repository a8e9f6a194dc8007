//! pitch-cli: command-line client for the pitch HTTP API
//!
//! # Subcommands
//! - `generate <idea> [--save] [--json]`: generate a pitch, optionally saving it
//! - `list [--json]`                    : the caller's saved pitches, newest first
//! - `show <id> [--json]`               : one saved pitch
//! - `status`                           : show server health

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8787";

/// Generation waits on the webhook, which may take up to a minute.
const GENERATE_TIMEOUT_SECS: u64 = 90;
const REQUEST_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "pitch-cli", version, about = "Generate and browse startup pitches")]
struct Cli {
    /// Pitch HTTP server URL (overrides PITCH_HTTP_URL env var)
    #[arg(long, env = "PITCH_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// Access token sent as `Authorization: Bearer` (overrides PITCH_TOKEN env var)
    #[arg(long, env = "PITCH_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a pitch from an idea
    Generate {
        /// Free-text description of the idea
        idea: String,

        /// Save the generated pitch to your history
        #[arg(long)]
        save: bool,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// List your saved pitches
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one saved pitch
    Show {
        /// Pitch id
        id: String,

        #[arg(long)]
        json: bool,
    },

    /// Show pitch server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

/// The seven pitch sections as returned by the server
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PitchView {
    pub title: String,
    pub description: String,
    pub problem: String,
    pub solution: String,
    pub target_market: String,
    pub revenue_model: String,
    pub call_to_action: String,
}

/// A saved pitch
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub id: String,
    pub idea: String,
    pub content: PitchView,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ListEnvelope {
    pitches: Vec<RecordView>,
}

// ============================================================================
// Formatting
// ============================================================================

/// Render a pitch as labelled sections.
pub fn render_pitch(p: &PitchView) -> String {
    let sections = [
        ("Description", &p.description),
        ("Problem", &p.problem),
        ("Solution", &p.solution),
        ("Target Market", &p.target_market),
        ("Revenue Model", &p.revenue_model),
        ("Call to Action", &p.call_to_action),
    ];

    let mut out = format!("# {}\n", p.title);
    for (label, text) in sections {
        out.push_str(&format!("\n{}:\n  {}\n", label, text.trim()));
    }
    out
}

/// One line per record: short id, date, title.
pub fn summary_line(r: &RecordView) -> String {
    let short_id: String = r.id.chars().take(8).collect();
    let date = r.created_at.get(..10).unwrap_or(&r.created_at);
    let title: String = r.content.title.chars().take(60).collect();
    format!("{}  {}  {}", short_id, date, title)
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

struct Api {
    client: reqwest::blocking::Client,
    server: String,
    token: Option<String>,
}

impl Api {
    fn new(server: &str, token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            server: server.to_string(),
            token,
        })
    }

    fn authorized(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        }
    }

    /// Send and return the parsed body. Exits on connection or HTTP failure.
    fn send(&self, builder: reqwest::blocking::RequestBuilder, url: &str) -> serde_json::Value {
        let resp = match self.authorized(builder).send() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("pitch-cli: connection failed to {}: {}", url, e);
                std::process::exit(1);
            }
        };

        let status = resp.status();
        let body: serde_json::Value = resp.json().unwrap_or_default();
        if !status.is_success() {
            let message = body["error"].as_str().unwrap_or("no details");
            eprintln!("pitch-cli: server returned {}: {}", status, message);
            std::process::exit(1);
        }
        body
    }

    fn get(&self, path: &str) -> serde_json::Value {
        let url = format!("{}{}", self.server, path);
        self.send(self.client.get(&url), &url)
    }

    fn post(&self, path: &str, body: &serde_json::Value) -> serde_json::Value {
        let url = format!("{}{}", self.server, path);
        self.send(self.client.post(&url).json(body), &url)
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn do_generate(api: &Api, idea: &str, save: bool, json_output: bool) -> anyhow::Result<()> {
    let generated = api.post("/api/pitch/generate", &serde_json::json!({ "idea": idea }));

    let saved = if save {
        // Resubmit the content we already have; the server does not regenerate it.
        Some(api.post(
            "/api/pitch/create",
            &serde_json::json!({ "idea": idea, "content": generated["data"] }),
        ))
    } else {
        None
    };

    if json_output {
        return print_json(saved.as_ref().unwrap_or(&generated));
    }

    let envelope: DataEnvelope<PitchView> = serde_json::from_value(generated)?;
    println!("{}", render_pitch(&envelope.data));
    if let Some(saved) = saved {
        let record: DataEnvelope<RecordView> = serde_json::from_value(saved)?;
        println!("Saved as {}", record.data.id);
    }
    Ok(())
}

fn do_list(api: &Api, json_output: bool) -> anyhow::Result<()> {
    let body = api.get("/api/pitches");
    if json_output {
        return print_json(&body);
    }

    let list: ListEnvelope = serde_json::from_value(body)?;
    if list.pitches.is_empty() {
        eprintln!("No saved pitches yet");
        return Ok(());
    }
    for record in &list.pitches {
        println!("{}", summary_line(record));
    }
    Ok(())
}

fn do_show(api: &Api, id: &str, json_output: bool) -> anyhow::Result<()> {
    let body = api.get(&format!("/api/pitches/{}", id));
    if json_output {
        return print_json(&body);
    }

    let record: DataEnvelope<RecordView> = serde_json::from_value(body)?;
    println!("Idea: {}\nSaved: {}\n", record.data.idea, record.data.created_at);
    println!("{}", render_pitch(&record.data.content));
    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let url = format!("{}/health", server);
    match client.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Pitch server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:      {}", body["version"].as_str().unwrap_or("?"));
            println!("Store:        {}", body["store"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            eprintln!("pitch-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("pitch-cli: cannot reach {}: {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let timeout = match cli.command {
        Commands::Generate { .. } => GENERATE_TIMEOUT_SECS,
        _ => REQUEST_TIMEOUT_SECS,
    };

    let result = Api::new(&server, cli.token, timeout).and_then(|api| match cli.command {
        Commands::Generate { idea, save, json } => do_generate(&api, &idea, save, json),
        Commands::List { json } => do_list(&api, json),
        Commands::Show { id, json } => do_show(&api, &id, json),
        Commands::Status => do_status(&server),
    });

    if let Err(e) = result {
        eprintln!("pitch-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
