//! `confkeep` CLI: command-line client for the confkeep server.
//!
//! A standalone HTTP client. No internal crate dependencies; everything goes
//! through the REST API under `/api`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod keys;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value, json};

use keys::{Applied, KeyEdit};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// confkeep: per-project key/value configuration.
#[derive(Parser)]
#[command(
    name = "confkeep",
    version,
    about = "confkeep CLI: manage projects, keys, cookie records and raw queries",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         CONFKEEP_ADDR       Server address (default: http://127.0.0.1:3001)\n  \
         CONFKEEP_PASSWORD   Shared access password\n\n\
         {DIM}Examples:{RESET}\n  \
         confkeep project add myapp\n  \
         confkeep key add myapp db_host 10.0.0.1\n  \
         confkeep config get --output backup.json\n  \
         confkeep query 'SELECT * FROM cookies'"
    ),
)]
struct Cli {
    /// confkeep server address.
    #[arg(long, env = "CONFKEEP_ADDR", default_value = "http://127.0.0.1:3001")]
    addr: String,

    /// Shared access password.
    #[arg(long, env = "CONFKEEP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Whole-document operations.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Project operations.
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Key operations inside a project.
    Key {
        #[command(subcommand)]
        action: KeyCommands,
    },
    /// Per-project cookie record operations.
    Cookie {
        #[command(subcommand)]
        action: CookieCommands,
    },
    /// Run a raw SQL statement against the record database.
    Query {
        /// The statement to execute.
        sql: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the whole configuration document.
    Get {
        /// Write the document to a file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Replace the whole configuration document with a file's contents.
    Save {
        /// Path to a JSON document.
        file: PathBuf,
    },
    /// Delete a key from the legacy top-level `project` mapping.
    DeleteKey {
        /// Key to delete.
        key: String,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List projects.
    List,
    /// Show one project's keys.
    Show {
        /// Project name.
        name: String,
    },
    /// Create a project.
    Add {
        /// Project name.
        name: String,
        /// Initial data as a JSON object (default: `{}`).
        #[arg(long)]
        data: Option<String>,
    },
    /// Delete a project.
    Rm {
        /// Project name.
        name: String,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Add a new key (fails if it already exists).
    Add {
        project: String,
        key: String,
        value: String,
    },
    /// Change the value of an existing key.
    Set {
        project: String,
        key: String,
        value: String,
    },
    /// Copy a key's value to a new key.
    Copy {
        project: String,
        from: String,
        to: String,
    },
    /// Delete a key.
    Rm { project: String, key: String },
}

#[derive(Subcommand)]
enum CookieCommands {
    /// Create or overwrite a project's record.
    Put {
        project: String,
        key: String,
        value: String,
    },
    /// Update the key and/or value of a project's record.
    Update {
        project: String,
        /// New key.
        #[arg(long)]
        key: Option<String>,
        /// New value.
        #[arg(long)]
        value: Option<String>,
    },
    /// Show a project's record.
    Get { project: String },
}

impl KeyCommands {
    fn into_edit(self) -> (String, KeyEdit) {
        match self {
            Self::Add {
                project,
                key,
                value,
            } => (project, KeyEdit::Add { key, value }),
            Self::Set {
                project,
                key,
                value,
            } => (project, KeyEdit::Set { key, value }),
            Self::Copy { project, from, to } => (project, KeyEdit::Copy { from, to }),
            Self::Rm { project, key } => (project, KeyEdit::Remove { key }),
        }
    }
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn print_json(value: &Value) {
    if value.is_null() {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to format JSON: {e}"),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn print_project(name: &str, data: &Value) {
    header("📦", &format!("Project: {name}"));
    match data.as_object() {
        Some(obj) if obj.is_empty() => println!("  {DIM}(empty){RESET}"),
        Some(obj) => {
            for (k, v) in obj {
                kv_line(k, &display_value(v));
            }
        }
        None => print_json(data),
    }
    println!();
}

fn print_project_list(projects: &Map<String, Value>) {
    header("📂", "Projects");
    if projects.is_empty() {
        println!("  {DIM}(empty){RESET}");
    } else {
        for (name, data) in projects {
            let count = data.as_object().map_or(0, Map::len);
            println!("  {CYAN}├─{RESET} {name} {DIM}({count} keys){RESET}");
        }
    }
    println!();
}

fn print_cookie(resp: &Value) {
    header("🍪", "Cookie record");
    for field in ["id", "project", "key", "value", "updated_at"] {
        if let Some(v) = resp.get(field) {
            kv_line(field, &display_value(v));
        }
    }
    println!();
}

fn print_query_results(rows: &[Value]) {
    header("🔎", &format!("{} row(s)", rows.len()));
    for row in rows {
        print_json(row);
    }
    println!();
}

fn server_message(resp: &Value, fallback: &str) -> String {
    resp.get("message")
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_owned()
}

// ── HTTP client ──────────────────────────────────────────────────────

/// Header carrying the shared password.
const AUTH_HEADER: &str = "x-auth-password";

struct Client {
    http: reqwest::Client,
    addr: String,
    password: Option<String>,
}

impl Client {
    fn new(addr: String, password: Option<String>) -> Self {
        let http = reqwest::Client::new();
        Self {
            http,
            addr,
            password,
        }
    }

    /// Build a URL from path segments, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.addr)
            .with_context(|| format!("invalid server address: {}", self.addr))?;
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid server address: {}", self.addr))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn password(&self) -> Result<&str> {
        self.password
            .as_deref()
            .ok_or_else(|| anyhow!("no password provided, set CONFKEEP_PASSWORD or use --password"))
    }

    async fn send(
        &self,
        method: reqwest::Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Value> {
        let password = self.password()?;
        let mut request = self
            .http
            .request(method, self.url(segments)?)
            .header(AUTH_HEADER, password);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await.context("request failed")?;
        handle_response(resp).await
    }

    async fn get(&self, segments: &[&str]) -> Result<Value> {
        self.send(reqwest::Method::GET, segments, None).await
    }

    async fn post(&self, segments: &[&str], body: &Value) -> Result<Value> {
        self.send(reqwest::Method::POST, segments, Some(body)).await
    }

    async fn put(&self, segments: &[&str], body: &Value) -> Result<Value> {
        self.send(reqwest::Method::PUT, segments, Some(body)).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<Value> {
        self.send(reqwest::Method::DELETE, segments, None).await
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    if status == reqwest::StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let body = resp.text().await.context("failed to read response body")?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or(body);
        bail!("server returned {status}: {message}");
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).context("failed to parse response JSON")
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let client = Client::new(cli.addr, cli.password);

    match run(client, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(client: Client, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Config { action } => cmd_config(&client, action).await,
        Commands::Project { action } => cmd_project(&client, action).await,
        Commands::Key { action } => cmd_key(&client, action).await,
        Commands::Cookie { action } => cmd_cookie(&client, action).await,
        Commands::Query { sql } => cmd_query(&client, &sql).await,
    }
}

// ── Config commands ──────────────────────────────────────────────────

async fn cmd_config(client: &Client, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Get { output } => {
            let doc = client.get(&["api", "config"]).await?;
            match output {
                Some(path) => {
                    let pretty = serde_json::to_string_pretty(&doc)
                        .context("failed to serialize document")?;
                    tokio::fs::write(&path, pretty)
                        .await
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    success(&format!("Config written to {BOLD}{}{RESET}", path.display()));
                }
                None => print_json(&doc),
            }
        }
        ConfigCommands::Save { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let doc: Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let resp = client.post(&["api", "config"], &doc).await?;
            println!();
            success(&server_message(&resp, "Config updated"));
            println!();
        }
        ConfigCommands::DeleteKey { key } => {
            let resp = client.delete(&["api", "config", &key]).await?;
            println!();
            success(&server_message(&resp, "Key deleted"));
            println!();
        }
    }
    Ok(())
}

// ── Project commands ─────────────────────────────────────────────────

async fn cmd_project(client: &Client, action: ProjectCommands) -> Result<()> {
    match action {
        ProjectCommands::List => {
            let projects = fetch_projects(client).await?;
            println!();
            print_project_list(&projects);
        }
        ProjectCommands::Show { name } => {
            let data = client.get(&["api", "project", &name]).await?;
            println!();
            print_project(&name, &data);
        }
        ProjectCommands::Add { name, data } => {
            let mut body = json!({ "name": name });
            if let Some(raw) = data {
                let parsed: Value =
                    serde_json::from_str(&raw).context("--data is not valid JSON")?;
                if !parsed.is_object() {
                    bail!("--data must be a JSON object");
                }
                body["data"] = parsed;
            }
            client.post(&["api", "project"], &body).await?;
            println!();
            success(&format!("Project {BOLD}{name}{RESET} created."));
            println!();
        }
        ProjectCommands::Rm { name } => {
            client.delete(&["api", "project", &name]).await?;
            println!();
            success(&format!("Project {BOLD}{name}{RESET} deleted."));
            println!();
        }
    }
    Ok(())
}

async fn fetch_projects(client: &Client) -> Result<Map<String, Value>> {
    match client.get(&["api", "project"]).await? {
        Value::Object(projects) => Ok(projects),
        Value::Null => Ok(Map::new()),
        other => bail!("unexpected project list: {other}"),
    }
}

// ── Key commands ─────────────────────────────────────────────────────

async fn cmd_key(client: &Client, action: KeyCommands) -> Result<()> {
    let (project, edit) = action.into_edit();

    let mut projects = fetch_projects(client).await?;
    let mut data = match projects.remove(&project) {
        Some(Value::Object(data)) => data,
        Some(_) => bail!("project '{project}' is not a key/value mapping"),
        None => bail!("project '{project}' not found"),
    };

    match edit.apply(&mut data)? {
        Applied::Unchanged => {
            println!();
            warning("Nothing to change.");
            println!();
        }
        Applied::Changed => {
            client
                .put(&["api", "project", &project], &json!({ "data": data }))
                .await?;
            println!();
            success(&format!("Project {BOLD}{project}{RESET} updated."));
            println!();
        }
    }
    Ok(())
}

// ── Cookie commands ──────────────────────────────────────────────────

async fn cmd_cookie(client: &Client, action: CookieCommands) -> Result<()> {
    match action {
        CookieCommands::Put {
            project,
            key,
            value,
        } => {
            let body = json!({ "project": project, "key": key, "value": value });
            let resp = client.post(&["api", "cookies"], &body).await?;
            println!();
            success(&server_message(&resp, "Cookie record saved"));
            if let Some(id) = resp.get("id") {
                kv_line("id", &display_value(id));
            }
            println!();
        }
        CookieCommands::Update {
            project,
            key,
            value,
        } => {
            if key.is_none() && value.is_none() {
                bail!("nothing to update, pass --key and/or --value");
            }
            let mut body = Map::new();
            if let Some(key) = key {
                body.insert("key".to_owned(), Value::String(key));
            }
            if let Some(value) = value {
                body.insert("value".to_owned(), Value::String(value));
            }
            let resp = client
                .put(&["api", "cookies", &project], &Value::Object(body))
                .await?;
            println!();
            success(&server_message(&resp, "Cookie record updated"));
            println!();
        }
        CookieCommands::Get { project } => {
            let resp = client.get(&["api", "cookies", &project]).await?;
            println!();
            print_cookie(&resp);
        }
    }
    Ok(())
}

// ── Query command ────────────────────────────────────────────────────

async fn cmd_query(client: &Client, sql: &str) -> Result<()> {
    let resp = client.post(&["api", "query"], &json!({ "query": sql })).await?;
    println!();
    if let Some(rows) = resp.get("results").and_then(Value::as_array) {
        print_query_results(rows);
    } else {
        success(&server_message(&resp, "Query executed"));
        if let Some(changes) = resp.get("changes") {
            kv_line("changes", &display_value(changes));
        }
        println!();
    }
    Ok(())
}
