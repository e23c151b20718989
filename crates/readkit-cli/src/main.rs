//! ReadKit CLI - Readwise tools from the command line or as an MCP server

mod mcp;

use clap::{Parser, Subcommand};
use readkit::{ReaderError, Tool, ToolBuilder, TOOL_LLMTXT};
use serde_json::Value;
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// ReadKit - AI-friendly Readwise and Reader tools
#[derive(Parser, Debug)]
#[command(name = "readkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full help with examples (llmtxt)
    #[arg(long)]
    llmtxt: bool,

    /// Readwise access token
    #[arg(long, env = "READWISE_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// API root URL
    #[arg(long, env = "READWISE_API_BASE", global = true)]
    api_base: Option<String>,

    /// Rendering proxy base URL
    #[arg(long, env = "READKIT_PROXY_BASE", global = true)]
    proxy_base: Option<String>,

    /// Custom User-Agent
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp,
    /// Print tool definitions as JSON
    Tools,
    /// Call one tool and print its response
    Call {
        /// Tool name, e.g. readwise_list_documents
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Check that the access token is accepted
    Auth,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing();

    // Handle --llmtxt flag
    if cli.llmtxt {
        writeln_safe(TOOL_LLMTXT);
        std::process::exit(0);
    }

    match &cli.command {
        Some(Commands::Mcp) => {
            let tool = build_tool_or_exit(&cli);
            mcp::run_server(tool).await;
        }
        Some(Commands::Tools) => {
            let json = serde_json::to_string_pretty(&Tool::definitions()).unwrap_or_default();
            writeln_safe(&json);
        }
        Some(Commands::Call { tool: name, args }) => {
            let args = parse_call_args(args).unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(2);
            });
            let tool = build_tool_or_exit(&cli);
            match tool.call(name, args).await {
                Ok(output) => writeln_safe(&output.render()),
                Err(e) => exit_with(&e),
            }
        }
        Some(Commands::Auth) => {
            let tool = build_tool_or_exit(&cli);
            match tool.client().validate_auth().await {
                Ok(()) => writeln_safe("Token is valid"),
                Err(e) => exit_with(&e),
            }
        }
        None => {
            eprintln!("Usage: readkit mcp");
            eprintln!("   or: readkit call <TOOL> --args '<JSON>'");
            eprintln!("   or: readkit tools");
            eprintln!("   or: readkit --help");
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr; stdout carries tool output and JSON-RPC
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn builder_from(cli: &Cli) -> ToolBuilder {
    let mut builder = Tool::builder().timeout(Duration::from_secs(cli.timeout));
    if let Some(token) = &cli.token {
        builder = builder.token(token.clone());
    }
    if let Some(base) = &cli.api_base {
        builder = builder.api_base(base.clone());
    }
    if let Some(base) = &cli.proxy_base {
        builder = builder.proxy_base(base.clone());
    }
    if let Some(ua) = &cli.user_agent {
        builder = builder.user_agent(ua.clone());
    }
    builder
}

fn build_tool_or_exit(cli: &Cli) -> Tool {
    builder_from(cli).build().unwrap_or_else(|e| exit_with(&e))
}

fn exit_with(err: &ReaderError) -> ! {
    eprintln!("Error: {}", err);
    std::process::exit(1);
}

/// Parse `--args`; must be a JSON object
fn parse_call_args(raw: &str) -> Result<Value, String> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| format!("Invalid --args JSON: {}", e))?;
    if value.is_object() {
        Ok(value)
    } else {
        Err("--args must be a JSON object".to_string())
    }
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_args() {
        assert_eq!(
            parse_call_args(r#"{"id": "abc"}"#).unwrap(),
            serde_json::json!({"id": "abc"})
        );
        assert!(parse_call_args("[1, 2]").is_err());
        assert!(parse_call_args("{not json").is_err());
    }

    #[test]
    fn test_cli_call_subcommand() {
        let cli = Cli::try_parse_from([
            "readkit",
            "call",
            "readwise_list_tags",
            "--token",
            "tok",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.token.as_deref(), Some("tok"));
        assert_eq!(cli.timeout, 5);
        match cli.command {
            Some(Commands::Call { tool, args }) => {
                assert_eq!(tool, "readwise_list_tags");
                assert_eq!(args, "{}");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_builder_from_cli() {
        let cli = Cli::try_parse_from([
            "readkit",
            "--token",
            "tok",
            "--api-base",
            "http://localhost:1/api",
            "auth",
        ])
        .unwrap();
        assert!(builder_from(&cli).build().is_ok());
    }
}
