//! Billing telemetry for external calls.
//!
//! Every dispatched operation, model call and summarizer call appends one
//! [`CostEntry`] to a [`CostLedger`]. The ledger is append-only; totals and
//! breakdowns are computed on demand from a [`CostSnapshot`].

use std::collections::{BTreeMap, HashMap};
use std::env;

use brain_core::TokenUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

/// How a cost is metered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostUnit {
    #[serde(rename = "per_request")]
    PerRequest,
    #[serde(rename = "per_1k_tokens")]
    Per1kTokens,
    #[serde(rename = "per_minute")]
    PerMinute,
    #[serde(rename = "per_character")]
    PerCharacter,
}

/// One billed unit of external-service usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    /// Service tag, e.g. the operation name or `llm`.
    pub service: String,
    /// Cost in USD.
    pub cost: f64,
    pub unit: CostUnit,
    /// Session the cost is attributed to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl CostEntry {
    pub fn new(service: impl Into<String>, cost: f64, unit: CostUnit) -> Self {
        Self {
            service: service.into(),
            cost,
            unit,
            session_id: None,
        }
    }

    /// Attribute this entry to a session.
    pub fn for_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// Read-only view of a ledger at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSnapshot {
    pub entries: Vec<CostEntry>,
    pub total: f64,
    /// Summed cost per service tag.
    pub by_service: BTreeMap<String, f64>,
}

impl CostSnapshot {
    fn from_entries(entries: Vec<CostEntry>) -> Self {
        let mut by_service = BTreeMap::new();
        for entry in &entries {
            *by_service.entry(entry.service.clone()).or_insert(0.0) += entry.cost;
        }
        let total = entries.iter().map(|e| e.cost).sum();
        Self {
            entries,
            total,
            by_service,
        }
    }

    /// Number of entries tagged with `service`.
    pub fn count_for(&self, service: &str) -> usize {
        self.entries.iter().filter(|e| e.service == service).count()
    }

    /// JSON form stored with conversation summaries.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Append-only list of billed operations.
///
/// Safe to share between sessions behind an `Arc`; appends are serialized
/// by an internal lock.
#[derive(Debug, Default)]
pub struct CostLedger {
    entries: Mutex<Vec<CostEntry>>,
}

impl CostLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub async fn push(&self, entry: CostEntry) {
        self.entries.lock().await.push(entry);
    }

    /// Append an entry built from its parts.
    pub async fn record(&self, service: impl Into<String>, cost: f64, unit: CostUnit) {
        self.push(CostEntry::new(service, cost, unit)).await;
    }

    /// Sum of all entries.
    pub async fn total(&self) -> f64 {
        self.entries.lock().await.iter().map(|e| e.cost).sum()
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Copy the current entries with totals.
    pub async fn snapshot(&self) -> CostSnapshot {
        CostSnapshot::from_entries(self.entries.lock().await.clone())
    }

    /// Copy the entries attributed to `session_id`, with totals.
    ///
    /// On a ledger shared between sessions this is one session's breakdown;
    /// untagged entries belong to no session and are left out.
    pub async fn snapshot_for(&self, session_id: &str) -> CostSnapshot {
        let entries = self
            .entries
            .lock()
            .await
            .iter()
            .filter(|e| e.session_id.as_deref() == Some(session_id))
            .cloned()
            .collect();
        CostSnapshot::from_entries(entries)
    }

    /// Drop all entries. Only for test isolation or a fresh top-level run.
    pub async fn reset(&self) {
        self.entries.lock().await.clear();
    }
}

/// Default per-request cost of a tool dispatch.
const DEFAULT_TOOL_COST: f64 = 0.0001;

/// Default cost per 1k model tokens.
const DEFAULT_LLM_PER_1K: f64 = 0.002;

/// Default cost per 1k summarizer tokens.
const DEFAULT_SUMMARY_PER_1K: f64 = 0.002;

/// Price list used to turn calls into ledger entries.
#[derive(Debug, Clone)]
pub struct CostRates {
    /// Per-request cost overrides by operation name.
    pub tools: HashMap<String, f64>,
    /// Per-request cost of operations without an override.
    pub default_tool_cost: f64,
    /// Cost per 1k model tokens.
    pub llm_per_1k_tokens: f64,
    /// Cost per 1k summarizer tokens.
    pub summary_per_1k_tokens: f64,
}

impl Default for CostRates {
    fn default() -> Self {
        let mut tools = HashMap::new();
        tools.insert("end_conversation".to_string(), 0.0);
        Self {
            tools,
            default_tool_cost: DEFAULT_TOOL_COST,
            llm_per_1k_tokens: DEFAULT_LLM_PER_1K,
            summary_per_1k_tokens: DEFAULT_SUMMARY_PER_1K,
        }
    }
}

impl CostRates {
    /// Load rates from environment variables.
    ///
    /// `SCHEDULER_COST_<OPERATION>` overrides a single operation (for example
    /// `SCHEDULER_COST_BOOK_APPOINTMENT`), `SCHEDULER_COST_DEFAULT_TOOL`,
    /// `SCHEDULER_COST_LLM_PER_1K` and `SCHEDULER_COST_SUMMARY_PER_1K` set
    /// the remaining rates.
    pub fn from_env() -> Self {
        let mut rates = Self::default();

        if let Some(value) = env_f64("SCHEDULER_COST_DEFAULT_TOOL") {
            rates.default_tool_cost = value;
        }
        if let Some(value) = env_f64("SCHEDULER_COST_LLM_PER_1K") {
            rates.llm_per_1k_tokens = value;
        }
        if let Some(value) = env_f64("SCHEDULER_COST_SUMMARY_PER_1K") {
            rates.summary_per_1k_tokens = value;
        }

        for tool in crate::tools::OPERATION_NAMES {
            let key = format!("SCHEDULER_COST_{}", tool.to_uppercase());
            if let Some(value) = env_f64(&key) {
                rates.tools.insert(tool.to_string(), value);
            }
        }

        rates
    }

    /// Override the cost of one operation.
    pub fn with_tool_cost(mut self, tool: impl Into<String>, cost: f64) -> Self {
        self.tools.insert(tool.into(), cost);
        self
    }

    /// Entry for one dispatch of `tool`.
    pub fn tool_entry(&self, tool: &str) -> CostEntry {
        let cost = self
            .tools
            .get(tool)
            .copied()
            .unwrap_or(self.default_tool_cost);
        CostEntry::new(tool, cost, CostUnit::PerRequest)
    }

    /// Entry for one model call.
    pub fn llm_entry(&self, usage: TokenUsage) -> CostEntry {
        CostEntry::new(
            "llm",
            per_1k(usage, self.llm_per_1k_tokens),
            CostUnit::Per1kTokens,
        )
    }

    /// Entry for one summarizer call.
    pub fn summary_entry(&self, usage: TokenUsage) -> CostEntry {
        CostEntry::new(
            "summarizer",
            per_1k(usage, self.summary_per_1k_tokens),
            CostUnit::Per1kTokens,
        )
    }
}

fn per_1k(usage: TokenUsage, rate: f64) -> f64 {
    f64::from(usage.total()) / 1000.0 * rate
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_total_matches_entries() {
        let ledger = CostLedger::new();
        assert!(ledger.is_empty().await);

        ledger.record("fetch_slots", 0.0001, CostUnit::PerRequest).await;
        ledger.record("llm", 0.003, CostUnit::Per1kTokens).await;
        ledger.record("tts", 0.015, CostUnit::PerCharacter).await;

        let snapshot = ledger.snapshot().await;
        let sum: f64 = snapshot.entries.iter().map(|e| e.cost).sum();
        assert_eq!(snapshot.entries.len(), 3);
        assert!((snapshot.total - sum).abs() < 1e-12);
        assert!((ledger.total().await - sum).abs() < 1e-12);
        assert_eq!(snapshot.count_for("llm"), 1);
    }

    #[tokio::test]
    async fn test_breakdown_by_service() {
        let ledger = CostLedger::new();
        ledger.record("book_appointment", 0.0001, CostUnit::PerRequest).await;
        ledger.record("book_appointment", 0.0001, CostUnit::PerRequest).await;
        ledger.record("stt", 0.01, CostUnit::PerMinute).await;

        let snapshot = ledger.snapshot().await;
        assert!((snapshot.by_service["book_appointment"] - 0.0002).abs() < 1e-12);
        assert!((snapshot.by_service["stt"] - 0.01).abs() < 1e-12);

        let value = snapshot.to_value();
        assert_eq!(value["entries"][2]["unit"], "per_minute");
    }

    #[tokio::test]
    async fn test_reset_and_snapshot_isolation() {
        let ledger = CostLedger::new();
        ledger.record("fetch_slots", 0.0001, CostUnit::PerRequest).await;
        let before = ledger.snapshot().await;

        ledger.reset().await;
        assert_eq!(ledger.len().await, 0);
        assert_eq!(ledger.total().await, 0.0);
        assert_eq!(before.entries.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_for_one_session() {
        let ledger = CostLedger::new();
        ledger
            .push(CostEntry::new("fetch_slots", 0.0001, CostUnit::PerRequest).for_session("a"))
            .await;
        ledger
            .push(CostEntry::new("llm", 0.002, CostUnit::Per1kTokens).for_session("b"))
            .await;
        ledger.record("stt", 0.01, CostUnit::PerMinute).await;

        let a = ledger.snapshot_for("a").await;
        assert_eq!(a.entries.len(), 1);
        assert_eq!(a.entries[0].session_id.as_deref(), Some("a"));
        assert!((a.total - 0.0001).abs() < 1e-12);
        assert!(!a.by_service.contains_key("llm"));
        assert!(ledger.snapshot_for("missing").await.entries.is_empty());
        assert_eq!(ledger.len().await, 3);

        let value = a.to_value();
        assert_eq!(value["entries"][0]["session_id"], "a");
        assert!(ledger.snapshot().await.to_value()["entries"][2]
            .get("session_id")
            .is_none());
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        let ledger = Arc::new(CostLedger::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    ledger.record("fetch_slots", 0.5, CostUnit::PerRequest).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(ledger.len().await, 160);
        assert_eq!(ledger.total().await, 80.0);
    }

    #[test]
    fn test_rates() {
        let rates = CostRates::default().with_tool_cost("book_appointment", 0.01);
        assert_eq!(rates.tool_entry("book_appointment").cost, 0.01);
        assert_eq!(rates.tool_entry("fetch_slots").cost, DEFAULT_TOOL_COST);
        assert_eq!(rates.tool_entry("end_conversation").cost, 0.0);

        let entry = rates.llm_entry(TokenUsage::new(1500, 500));
        assert_eq!(entry.service, "llm");
        assert_eq!(entry.unit, CostUnit::Per1kTokens);
        assert!((entry.cost - 0.004).abs() < 1e-12);
    }
}
