//! Messenger interfaces connecting users to the pipeline.
//!
//! A messenger never drives turns itself: the pipeline hands it a
//! turn-runner callback at connect time, and the messenger invokes the
//! callback once per incoming request.

use crate::context::Context;
use crate::core::Message;
use crate::errors::PipelineError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// The callback a messenger invokes to process one turn.
///
/// Arguments are the incoming request, the conversation key and
/// optional auxiliary-data overrides; the result is the updated
/// context, whose `last_response` is the reply to deliver.
pub type TurnRunner = Arc<
    dyn Fn(
            Message,
            Option<String>,
            Option<HashMap<String, serde_json::Value>>,
        ) -> BoxFuture<'static, Result<Context, PipelineError>>
        + Send
        + Sync,
>;

/// Registration contract between the pipeline and a transport.
#[async_trait]
pub trait MessengerInterface: Send + Sync {
    /// Accepts the turn runner and serves requests until the transport
    /// closes.
    async fn connect(&self, runner: TurnRunner) -> Result<(), PipelineError>;
}

/// A console messenger: reads requests from stdin line by line and
/// prints each turn's response.
#[derive(Debug, Clone)]
pub struct CliMessengerInterface {
    ctx_id: String,
    request_prompt: String,
    response_prompt: String,
}

impl Default for CliMessengerInterface {
    fn default() -> Self {
        Self {
            ctx_id: uuid::Uuid::new_v4().to_string(),
            request_prompt: "request: ".to_string(),
            response_prompt: "response: ".to_string(),
        }
    }
}

impl CliMessengerInterface {
    /// Creates a console messenger with a fresh conversation key.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the request/response prompts.
    #[must_use]
    pub fn with_prompts(
        mut self,
        request_prompt: impl Into<String>,
        response_prompt: impl Into<String>,
    ) -> Self {
        self.request_prompt = request_prompt.into();
        self.response_prompt = response_prompt.into();
        self
    }
}

#[async_trait]
impl MessengerInterface for CliMessengerInterface {
    async fn connect(&self, runner: TurnRunner) -> Result<(), PipelineError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            print!("{}", self.request_prompt);
            let _ = std::io::stdout().flush();

            let line = lines
                .next_line()
                .await
                .map_err(|err| PipelineError::Messenger(err.to_string()))?;
            let Some(line) = line else {
                return Ok(());
            };

            let ctx = runner(
                Message::from(line.trim()),
                Some(self.ctx_id.clone()),
                None,
            )
            .await?;
            if let Some(response) = ctx.last_response() {
                println!("{}{response}", self.response_prompt);
            }
        }
    }
}
