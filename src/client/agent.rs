//! Gemini-driven agent that answers prompts by calling MCP tools.
//!
//! The agent keeps the conversation history, advertises the server's tools as
//! Gemini function declarations and loops: every function call the model
//! makes is executed through the MCP session and its result (or error) is
//! sent back, until the model answers with text.
//! See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rmcp::model::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::error::{ClientError, ClientResult};
use super::session::{McpSession, ToolOutcome};

const SYSTEM_PROMPT: &str = "You are a Spotify lookup assistant. Answer the user's requests by \
calling the available tools against their Spotify account and Last.fm. Look up ids with the search \
and listing tools before using tools that need them. Present results in a compact, readable format.";

/// Something that can execute a tool call for the agent.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn call_tool(&self, name: &str, arguments: Value) -> ClientResult<ToolOutcome>;
}

#[async_trait]
impl ToolExecutor for McpSession {
    async fn call_tool(&self, name: &str, arguments: Value) -> ClientResult<ToolOutcome> {
        self.call(name, arguments).await
    }
}

/// Settings of the Gemini agent.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_steps: usize,
    pub request_timeout: Duration,
}

/// One tool call made while answering a prompt.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: Value,
    pub outcome: Result<ToolOutcome, String>,
}

impl ToolCallRecord {
    pub fn failed(&self) -> bool {
        !matches!(self.outcome, Ok(ToolOutcome { is_error: false, .. }))
    }
}

/// The agent's answer to a prompt.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub text: String,
    pub tool_calls: Vec<ToolCallRecord>,
}

pub struct GeminiAgent {
    http: Client,
    settings: AgentSettings,
    declarations: Vec<FunctionDeclaration>,
    history: Vec<Content>,
}

impl GeminiAgent {
    pub fn new(settings: AgentSettings, tools: &[Tool]) -> ClientResult<Self> {
        let http = Client::builder().timeout(settings.request_timeout).build()?;
        Ok(Self {
            http,
            declarations: function_declarations(tools),
            settings,
            history: Vec::new(),
        })
    }

    /// Forget the conversation so far.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Answer `prompt`, calling tools through `executor` as the model asks.
    ///
    /// On failure the conversation is rolled back to before the prompt.
    pub async fn ask(&mut self, executor: &dyn ToolExecutor, prompt: &str) -> ClientResult<AgentReply> {
        let checkpoint = self.history.len();
        let result = self.run_turn(executor, prompt).await;
        if result.is_err() {
            self.history.truncate(checkpoint);
        }
        result
    }

    async fn run_turn(&mut self, executor: &dyn ToolExecutor, prompt: &str) -> ClientResult<AgentReply> {
        self.history.push(Content::user(vec![Part::text(prompt)]));
        let mut tool_calls = Vec::new();

        for step in 0..=self.settings.max_steps {
            let content = self.generate().await?;
            let calls = content.function_calls();
            let text = content.text();
            self.history.push(content);

            if calls.is_empty() {
                return Ok(AgentReply { text, tool_calls });
            }
            if step == self.settings.max_steps {
                break;
            }

            let mut responses = Vec::with_capacity(calls.len());
            for call in calls {
                debug!("Model requested {}", call.name);
                let outcome = executor
                    .call_tool(&call.name, call.args.clone())
                    .await
                    .map_err(|e| e.to_string());

                let response = match &outcome {
                    Ok(ToolOutcome { is_error: false, payload }) => json!({ "result": payload }),
                    Ok(ToolOutcome { payload, .. }) => json!({ "error": payload }),
                    Err(message) => json!({ "error": message }),
                };
                responses.push(Part::function_response(&call.name, response));
                tool_calls.push(ToolCallRecord {
                    name: call.name,
                    arguments: call.args,
                    outcome,
                });
            }
            self.history.push(Content::user(responses));
        }

        Err(ClientError::TooManySteps(self.settings.max_steps))
    }

    async fn generate(&self) -> ClientResult<Content> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        );
        let system = Content {
            role: None,
            parts: vec![Part::text(SYSTEM_PROMPT)],
        };
        let tools = [GeminiTool {
            function_declarations: &self.declarations,
        }];
        let body = GenerateRequest {
            contents: &self.history,
            tools: if self.declarations.is_empty() {
                &tools[..0]
            } else {
                &tools[..]
            },
            system_instruction: &system,
        };

        let response = self
            .http
            .post(url)
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            warn!("Gemini request failed: {} {}", status, message);
            return Err(ClientError::Gemini {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        let candidate = parsed.candidates.into_iter().next();
        match candidate {
            Some(Candidate {
                content: Some(mut content),
                ..
            }) => {
                content.role = Some(Role::Model);
                Ok(content)
            }
            Some(Candidate { finish_reason, .. }) => Err(ClientError::Gemini {
                status: status.as_u16(),
                message: format!(
                    "model returned no content (finish reason: {})",
                    finish_reason.as_deref().unwrap_or("unknown")
                ),
            }),
            None => Err(ClientError::Gemini {
                status: status.as_u16(),
                message: "model returned no candidates".to_string(),
            }),
        }
    }
}

/// Gemini function declarations for the MCP tools.
pub fn function_declarations(tools: &[Tool]) -> Vec<FunctionDeclaration> {
    tools
        .iter()
        .map(|tool| FunctionDeclaration {
            name: tool.name.to_string(),
            description: tool
                .description
                .as_ref()
                .map(|d| d.to_string())
                .unwrap_or_default(),
            parameters_json_schema: Value::Object((*tool.input_schema).clone()),
        })
        .collect()
}

// --- Gemini API Request/Response Types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: &'a [Content],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [GeminiTool<'a>],
    system_instruction: &'a Content,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool<'a> {
    function_declarations: &'a [FunctionDeclaration],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters_json_schema: Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some(Role::User),
            parts,
        }
    }

    fn function_calls(&self) -> Vec<FunctionCall> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionCall { function_call, .. } => Some(function_call.clone()),
                _ => None,
            })
            .collect()
    }

    /// Visible text of the content, without thought summaries.
    fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text {
                    thought: None | Some(false),
                    text,
                } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
enum Part {
    FunctionCall {
        // Must be echoed back for thinking models
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
        function_call: FunctionCall,
    },
    FunctionResponse {
        function_response: FunctionResponse,
    },
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thought: Option<bool>,
        text: String,
    },
    Other(Value),
}

impl Part {
    fn text(text: &str) -> Self {
        Self::Text {
            thought: None,
            text: text.to_string(),
        }
    }

    fn function_response(name: &str, response: Value) -> Self {
        Self::FunctionResponse {
            function_response: FunctionResponse {
                name: name.to_string(),
                response,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}
