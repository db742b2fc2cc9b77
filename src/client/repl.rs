//! Interactive read-eval loop of the test client.

use std::io::Write;

use rmcp::model::Tool;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use super::agent::{AgentReply, GeminiAgent};
use super::error::ClientResult;
use super::session::{McpSession, ToolOutcome};

const PROMPT: &str = "spotify>> ";

const HELP: &str = "\
Commands:
  /tools                  list the server's tools
  /call <name> [json]     call a tool directly, e.g. /call search_spotify {\"query\": \"creep\"}
  /reset                  forget the agent conversation
  /help                   show this help
  /quit                   exit (an empty line also exits)
Anything else is sent to the agent.";

/// A parsed line of input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    Help,
    Tools,
    Reset,
    Call { name: String, arguments: Value },
    Ask(String),
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Quit);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Command::Ask(line.to_string()));
    };

    let (head, rest) = command
        .split_once(char::is_whitespace)
        .map(|(h, r)| (h, r.trim()))
        .unwrap_or((command, ""));

    match head {
        "quit" | "exit" => Ok(Command::Quit),
        "help" => Ok(Command::Help),
        "tools" => Ok(Command::Tools),
        "reset" => Ok(Command::Reset),
        "call" => {
            let (name, json) = rest
                .split_once(char::is_whitespace)
                .map(|(n, j)| (n, j.trim()))
                .unwrap_or((rest, ""));
            if name.is_empty() {
                return Err("usage: /call <name> [json-args]".to_string());
            }
            let arguments = if json.is_empty() {
                Value::Object(Map::new())
            } else {
                serde_json::from_str(json).map_err(|e| format!("invalid JSON arguments: {}", e))?
            };
            Ok(Command::Call {
                name: name.to_string(),
                arguments,
            })
        }
        other => Err(format!("unknown command '/{}', try /help", other)),
    }
}

/// One line per tool: name and the first line of its description.
pub fn format_tool_list(tools: &[Tool]) -> String {
    tools
        .iter()
        .map(|tool| {
            let summary = tool
                .description
                .as_deref()
                .and_then(|d| d.lines().next())
                .unwrap_or_default();
            format!("  {:<28} {}", tool.name, summary)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_outcome(outcome: &ToolOutcome) -> String {
    let body = serde_json::to_string_pretty(&outcome.payload).unwrap_or_else(|_| outcome.payload.to_string());
    if outcome.is_error {
        format!("Tool error:\n{}", body)
    } else {
        body
    }
}

pub struct Repl {
    session: McpSession,
    agent: Option<GeminiAgent>,
}

impl Repl {
    pub fn new(session: McpSession, agent: Option<GeminiAgent>) -> Self {
        Self { session, agent }
    }

    /// Read commands from stdin until `/quit`, an empty line or end of input.
    pub async fn run(mut self) -> ClientResult<()> {
        println!("Connected. {} tools available:", self.session.tools().len());
        println!("{}", format_tool_list(self.session.tools()));
        if self.agent.is_none() {
            println!("GOOGLE_API_KEY is not set: agent disabled, use /call to invoke tools.");
        }
        println!("Type /help for commands.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{}", PROMPT);
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            match parse_command(&line) {
                Ok(Command::Quit) => break,
                Ok(command) => self.handle(command).await,
                Err(message) => println!("{}", message),
            }
        }

        self.session.close().await
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Help => println!("{}", HELP),
            Command::Tools => println!("{}", format_tool_list(self.session.tools())),
            Command::Reset => {
                if let Some(agent) = self.agent.as_mut() {
                    agent.reset();
                }
                println!("Conversation cleared.");
            }
            Command::Call { name, arguments } => match self.session.call(&name, arguments).await {
                Ok(outcome) => println!("{}", format_outcome(&outcome)),
                Err(e) => println!("Error: {}", e),
            },
            Command::Ask(prompt) => {
                let Some(agent) = self.agent.as_mut() else {
                    println!("Agent disabled (no GOOGLE_API_KEY). Use /call <name> [json].");
                    return;
                };
                match agent.ask(&self.session, &prompt).await {
                    Ok(reply) => print_reply(&reply),
                    Err(e) => {
                        warn!("Agent failed: {}", e);
                        println!("Error: {}", e);
                    }
                }
            }
            Command::Quit => {}
        }
    }
}

fn print_reply(reply: &AgentReply) {
    for call in reply.tool_calls.iter().filter(|c| c.failed()) {
        match &call.outcome {
            Ok(outcome) => println!("[{} failed] {}", call.name, outcome.payload),
            Err(message) => println!("[{} failed] {}", call.name, message),
        }
    }
    if reply.text.is_empty() {
        println!("(no answer)");
    } else {
        println!("{}", reply.text);
    }
}
