//! Scripted brain - plays back a fixed sequence of replies.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use brain_core::{Brain, BrainError, BrainReply, ToolCallRequest, ToolDefinition, Turn};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

static NEXT_CALL_ID: AtomicUsize = AtomicUsize::new(1);

/// A brain that answers each `respond` call with the next queued reply.
///
/// Once the queue runs dry every call fails with
/// [`BrainError::ProcessingFailed`].
#[derive(Debug, Default)]
pub struct ScriptedBrain {
    replies: Mutex<VecDeque<BrainReply>>,
    transcripts: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedBrain {
    /// Create a brain that will play back `replies` in order.
    pub fn new(replies: Vec<BrainReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    /// A reply requesting one tool call. `arguments` should be a JSON object;
    /// anything else is sent as an empty argument bag.
    pub fn tool_call(name: &str, arguments: Value) -> BrainReply {
        BrainReply::call_tools(vec![Self::request(name, arguments)])
    }

    /// A single tool call request with a fresh id.
    pub fn request(name: &str, arguments: Value) -> ToolCallRequest {
        let arguments: HashMap<String, Value> = match arguments {
            Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        let id = format!("call-{}", NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed));
        ToolCallRequest::new(id, name, arguments)
    }

    /// Queue another reply.
    pub async fn push(&self, reply: BrainReply) {
        self.replies.lock().await.push_back(reply);
    }

    /// Replies not yet played.
    pub async fn remaining(&self) -> usize {
        self.replies.lock().await.len()
    }

    /// Number of `respond` calls so far.
    pub async fn call_count(&self) -> usize {
        self.transcripts.lock().await.len()
    }

    /// The transcript seen by each `respond` call.
    pub async fn transcripts(&self) -> Vec<Vec<Turn>> {
        self.transcripts.lock().await.clone()
    }
}

#[async_trait]
impl Brain for ScriptedBrain {
    async fn respond(
        &self,
        transcript: &[Turn],
        _tools: &[ToolDefinition],
    ) -> Result<BrainReply, BrainError> {
        self.transcripts.lock().await.push(transcript.to_vec());

        let reply = self.replies.lock().await.pop_front();
        debug!("ScriptedBrain reply: {:?}", reply.as_ref().map(|r| &r.action));
        reply.ok_or_else(|| BrainError::ProcessingFailed("script exhausted".to_string()))
    }

    fn name(&self) -> &str {
        "ScriptedBrain"
    }
}
