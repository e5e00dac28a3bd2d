//! Tool registry and dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use brain_core::ToolDefinition;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ToolError;
use crate::ledger::{CostLedger, CostRates};
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Per-call environment handed to [`ToolRegistry::dispatch`].
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    /// Ledger that receives the call's cost entry.
    pub ledger: &'a CostLedger,
    /// Upper bound on the call's duration.
    pub deadline: Option<Duration>,
    /// Token that aborts the call when cancelled.
    pub cancel: Option<&'a CancellationToken>,
    /// Session the call's cost entry is attributed to.
    pub session: Option<&'a str>,
}

impl<'a> DispatchContext<'a> {
    /// Context with no deadline and no cancellation.
    pub fn new(ledger: &'a CostLedger) -> Self {
        Self {
            ledger,
            deadline: None,
            cancel: None,
            session: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_cancel(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_session(mut self, session: &'a str) -> Self {
        self.session = Some(session);
        self
    }
}

/// Registry for managing tools.
///
/// Holds the operation catalog in registration order and dispatches
/// execution requests to the matching tool by name. Every dispatch of a
/// registered tool is billed exactly once, whether it succeeds or not.
pub struct ToolRegistry {
    /// Registered tools by name.
    tools: IndexMap<String, Arc<dyn Tool>>,
    rates: CostRates,
}

impl ToolRegistry {
    /// Create a new empty registry with default rates.
    pub fn new() -> Self {
        Self::with_rates(CostRates::default())
    }

    /// Create an empty registry billing with `rates`.
    pub fn with_rates(rates: CostRates) -> Self {
        Self {
            tools: IndexMap::new(),
            rates,
        }
    }

    /// Register a tool.
    ///
    /// If a tool with the same name already exists, it will be replaced.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        info!("Registering tool: {}", name);
        self.tools.insert(name, tool);
    }

    /// Registered tool names, in registration order.
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a tool is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// The operation catalog as model-facing function definitions.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters()))
            .collect()
    }

    /// The rates used for billing.
    pub fn rates(&self) -> &CostRates {
        &self.rates
    }

    /// Execute a tool by name.
    ///
    /// Operation failures, timeouts and cancellations come back as a failed
    /// [`ToolOutput`]. Only an unknown operation name returns `Err`, and it
    /// is not billed.
    pub async fn dispatch(
        &self,
        name: &str,
        params: HashMap<String, Value>,
        ctx: &DispatchContext<'_>,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownOperation(name.to_string()))?;

        debug!("Executing tool '{}' with {} params", name, params.len());

        let result = run_guarded(tool.as_ref(), ToolArgs::new(params), ctx).await;
        self.bill(name, ctx).await;

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                warn!("Tool '{}' failed ({:?}): {}", name, e.kind(), e);
                ToolOutput::failure(&e)
            }
        };

        debug!("Tool '{}' completed: success={}", name, output.success);
        Ok(output)
    }

    /// Append the cost entry for one dispatch of `name`.
    async fn bill(&self, name: &str, ctx: &DispatchContext<'_>) {
        let mut entry = self.rates.tool_entry(name);
        if let Some(session) = ctx.session {
            entry = entry.for_session(session);
        }
        ctx.ledger.push(entry).await;
    }

    /// Execute a tool with a JSON arguments string.
    ///
    /// Malformed JSON for a known tool is billed and reported as a failed
    /// output like any other validation error.
    pub async fn dispatch_json(
        &self,
        name: &str,
        args_json: &str,
        ctx: &DispatchContext<'_>,
    ) -> Result<ToolOutput, ToolError> {
        if !self.has_tool(name) {
            return Err(ToolError::UnknownOperation(name.to_string()));
        }

        let trimmed = args_json.trim();
        if trimmed.is_empty() {
            return self.dispatch(name, HashMap::new(), ctx).await;
        }

        match serde_json::from_str::<HashMap<String, Value>>(trimmed) {
            Ok(params) => self.dispatch(name, params, ctx).await,
            Err(e) => {
                self.bill(name, ctx).await;
                let err = ToolError::from(e);
                warn!("Tool '{}' got malformed arguments: {}", name, err);
                Ok(ToolOutput::failure(&err))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_guarded(
    tool: &dyn Tool,
    args: ToolArgs,
    ctx: &DispatchContext<'_>,
) -> Result<ToolOutput, ToolError> {
    let call = async {
        match ctx.deadline {
            Some(limit) => match timeout(limit, tool.execute(args)).await {
                Ok(result) => result,
                Err(_) => Err(ToolError::Timeout(limit)),
            },
            None => tool.execute(args).await,
        }
    };

    match ctx.cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(ToolError::Cancelled),
                result = call => result,
            }
        }
        None => call.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes back the input"
        }

        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"message": {"type": "string"}},
                "required": ["message"]
            })
        }

        async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
            let message = args.get_string("message")?;
            Ok(ToolOutput::success(message.clone(), json!({"echo": message})))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Never finishes in time"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: ToolArgs) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ToolOutput::success("done", Value::Null))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        registry.register(SlowTool);
        registry
    }

    fn params(value: Value) -> HashMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_registry_catalog() {
        let registry = registry();
        assert!(registry.has_tool("echo"));
        assert!(!registry.has_tool("nonexistent"));
        assert_eq!(registry.list_tools(), vec!["echo", "slow"]);

        let defs = registry.definitions();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].name(), "echo");
        assert_eq!(defs[0].tool_type, "function");
        assert_eq!(defs[0].function.parameters["required"], json!(["message"]));
    }

    #[tokio::test]
    async fn test_dispatch_success_is_billed_once() {
        let registry = registry();
        let ledger = CostLedger::new();
        let ctx = DispatchContext::new(&ledger);

        let output = registry
            .dispatch("echo", params(json!({"message": "hello"})), &ctx)
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.payload["echo"], "hello");
        assert_eq!(ledger.len().await, 1);
        assert_eq!(ledger.snapshot().await.entries[0].service, "echo");
    }

    #[tokio::test]
    async fn test_dispatch_attributes_cost_to_session() {
        let registry = registry();
        let ledger = CostLedger::new();

        registry
            .dispatch(
                "echo",
                params(json!({"message": "a"})),
                &DispatchContext::new(&ledger).with_session("call-a"),
            )
            .await
            .unwrap();
        registry
            .dispatch_json("echo", "{not json", &DispatchContext::new(&ledger).with_session("call-b"))
            .await
            .unwrap();

        assert_eq!(ledger.len().await, 2);
        assert_eq!(ledger.snapshot_for("call-a").await.count_for("echo"), 1);
        assert_eq!(ledger.snapshot_for("call-b").await.count_for("echo"), 1);
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_enveloped_and_billed() {
        let registry = registry();
        let ledger = CostLedger::new();
        let ctx = DispatchContext::new(&ledger);

        let output = registry.dispatch("echo", HashMap::new(), &ctx).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.error_kind, Some(ErrorKind::Validation));
        assert!(output.error.unwrap().contains("message"));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_operation_is_hard_error_and_unbilled() {
        let registry = registry();
        let ledger = CostLedger::new();
        let ctx = DispatchContext::new(&ledger);

        let result = registry.dispatch("nonexistent", HashMap::new(), &ctx).await;
        assert!(matches!(result, Err(ToolError::UnknownOperation(_))));
        let result = registry.dispatch_json("nonexistent", "{}", &ctx).await;
        assert!(matches!(result, Err(ToolError::UnknownOperation(_))));
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_dispatch_json() {
        let registry = registry();
        let ledger = CostLedger::new();
        let ctx = DispatchContext::new(&ledger);

        let output = registry
            .dispatch_json("echo", r#"{"message": "world"}"#, &ctx)
            .await
            .unwrap();
        assert!(output.success);

        let output = registry.dispatch_json("echo", "{not json", &ctx).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.error_kind, Some(ErrorKind::Validation));
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_yields_timeout_failure() {
        let registry = registry();
        let ledger = CostLedger::new();
        let ctx = DispatchContext::new(&ledger).with_deadline(Some(Duration::from_millis(50)));

        let output = registry.dispatch("slow", HashMap::new(), &ctx).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.error_kind, Some(ErrorKind::Timeout));
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn test_cancellation_yields_cancelled_failure() {
        let registry = registry();
        let ledger = CostLedger::new();
        let token = CancellationToken::new();
        let ctx = DispatchContext::new(&ledger).with_cancel(&token);

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let output = registry.dispatch("slow", HashMap::new(), &ctx).await.unwrap();
        assert!(!output.success);
        assert_eq!(output.error_kind, Some(ErrorKind::Cancelled));
        assert_eq!(ledger.len().await, 1);
    }
}
