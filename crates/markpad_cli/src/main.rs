//! Command-line client for the Markpad API.

mod client;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use client::{ApiClient, ClientError, RetryPolicy};
use markpad_core::ai::{ApplyMode, GenerateRequest, StreamFrame};
use markpad_core::DEFAULT_CLI_SERVER_URL;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "mdpad", about = "Markpad CLI", version)]
struct Cli {
    /// Server URL (can also be set via MD_SERVER env var)
    #[arg(short, long, env = "MD_SERVER")]
    server: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Print timing for API requests
    #[arg(long, global = true)]
    timing: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Share a Markdown document and print its link token
    Share {
        /// File to share (reads stdin when omitted)
        #[arg(short, long)]
        file: Option<String>,
        /// Document title (derived from content when omitted)
        #[arg(long)]
        title: Option<String>,
    },
    /// Fetch a shared document by token
    Get { token: String },
    /// Stream AI-generated Markdown
    Generate {
        /// What to write
        prompt: String,
        /// Current document to send as context
        #[arg(short, long)]
        file: Option<String>,
        /// Replace the document instead of appending to it
        #[arg(long)]
        replace: bool,
        /// Print the whole resulting document instead of only the generated text
        #[arg(long)]
        apply: bool,
    },
    /// Upload an image and print its URL
    UploadImage {
        file: String,
        /// Content type (inferred from the file extension when omitted)
        #[arg(long)]
        content_type: Option<String>,
    },
}

fn log_timing(timing: bool, label: &str, duration: Duration) {
    if timing {
        eprintln!(
            "[timing] {}: {:.1} ms",
            label,
            duration.as_secs_f64() * 1000.0
        );
    }
}

fn normalize_server(server: String) -> String {
    if let Ok(mut url) = reqwest::Url::parse(&server) {
        let should_normalize_localhost =
            url.scheme().eq_ignore_ascii_case("http") && url.host_str() == Some("localhost");
        if should_normalize_localhost && url.set_host(Some("127.0.0.1")).is_err() {
            return server;
        }
        let mut normalized = url.to_string();
        while normalized.ends_with('/') {
            normalized.pop();
        }
        return normalized;
    }
    server
}

fn resolve_server(server: Option<String>) -> String {
    server
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CLI_SERVER_URL.to_string())
}

fn image_type_for_path(path: &str) -> Option<&'static str> {
    let extension = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn share_link(server: &str, token: &str) -> String {
    client::api_url(server, &["api", "documents", token])
        .map(|url| url.to_string())
        .unwrap_or_else(|_| token.to_string())
}

fn format_share_output(server: &str, response: &Value, json: bool) -> Result<String, String> {
    if json {
        return serde_json::to_string_pretty(response)
            .map_err(|err| format!("response encoding error: {}", err));
    }
    let token = response
        .get("share_token")
        .and_then(Value::as_str)
        .ok_or_else(|| "response missing 'share_token' field".to_string())?;
    let reused = response
        .pointer("/_meta/isReused")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let note = if reused { " (existing share reused)" } else { "" };
    Ok(format!("{}  {}{}", token, share_link(server, token), note))
}

fn format_get_output(document: &Value, json: bool) -> Result<String, String> {
    if json {
        return serde_json::to_string_pretty(document)
            .map_err(|err| format!("response encoding error: {}", err));
    }

    document
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| "response missing 'content' field".to_string())
}

fn format_image_output(response: &Value, json: bool) -> Result<String, String> {
    if json {
        return serde_json::to_string_pretty(response)
            .map_err(|err| format!("response encoding error: {}", err));
    }
    response
        .get("url")
        .and_then(Value::as_str)
        .map(|url| markpad_core::editor::mutation::image_markdown("image", url))
        .ok_or_else(|| "response missing 'url' field".to_string())
}

fn exit_with(action: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("{} failed: {}", action, message);
    std::process::exit(1);
}

fn read_input(file: Option<&str>) -> io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn unwrap_or_exit<T>(result: Result<T, ClientError>, action: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => exit_with(action, err),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        server,
        json,
        timing,
        timeout,
        command,
    } = Cli::parse();

    if let Commands::Completions { shell } = &command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout))
        .build()?;
    let server = normalize_server(resolve_server(server));
    let api = ApiClient::new(http, server, RetryPolicy::default());

    match command {
        Commands::Completions { .. } => {}
        Commands::Share { file, title } => {
            let content = read_input(file.as_deref())?;
            let start = Instant::now();
            let response = unwrap_or_exit(api.share(title.as_deref(), &content).await, "Share");
            log_timing(timing, "share", start.elapsed());
            match format_share_output(api.server(), &response, json) {
                Ok(output) => println!("{}", output),
                Err(message) => exit_with("Share", message),
            }
        }
        Commands::Get { token } => {
            let start = Instant::now();
            let document = unwrap_or_exit(api.get(&token).await, "Get");
            log_timing(timing, "get", start.elapsed());
            match format_get_output(&document, json) {
                Ok(output) => println!("{}", output),
                Err(message) => exit_with("Get", message),
            }
        }
        Commands::Generate {
            prompt,
            file,
            replace,
            apply,
        } => {
            let current_markdown = match file.as_deref() {
                Some(path) => std::fs::read_to_string(path)?,
                None => String::new(),
            };
            let request = GenerateRequest {
                current_markdown,
                replace_mode: replace,
                user_prompt: prompt,
            };
            let stream_live = !json && !apply;
            let start = Instant::now();
            let buffer = unwrap_or_exit(
                api.generate(&request, |frame: &StreamFrame| {
                    if !stream_live {
                        return;
                    }
                    if let Some(content) = frame.content.as_deref() {
                        print!("{}", content);
                        let _ = io::stdout().flush();
                    }
                })
                .await,
                "Generate",
            );
            log_timing(timing, "generate", start.elapsed());

            if let Some(error) = buffer.error() {
                if stream_live {
                    println!();
                }
                exit_with("Generate", error);
            }
            if json {
                let output = serde_json::json!({
                    "content": buffer.content(),
                    "done": buffer.is_done(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else if apply {
                let mode = if replace {
                    ApplyMode::Replace
                } else {
                    ApplyMode::Append
                };
                println!("{}", buffer.applied_to(&request.current_markdown, mode));
            } else {
                println!();
            }
        }
        Commands::UploadImage { file, content_type } => {
            let content_type = match content_type.as_deref().or_else(|| image_type_for_path(&file)) {
                Some(value) => value.to_string(),
                None => exit_with(
                    "Upload",
                    "cannot infer image type; pass --content-type",
                ),
            };
            let bytes = std::fs::read(&file)?;
            let start = Instant::now();
            let response =
                unwrap_or_exit(api.upload_image(bytes, &content_type).await, "Upload");
            log_timing(timing, "upload-image", start.elapsed());
            match format_image_output(&response, json) {
                Ok(output) => println!("{}", output),
                Err(message) => exit_with("Upload", message),
            }
        }
    }

    Ok(())
}
