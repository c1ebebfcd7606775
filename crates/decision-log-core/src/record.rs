//! Decision records and the builder that fills them from an evaluation outcome.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::{classify, ClassifiedError};
use crate::error::EvalError;
use crate::metrics::Metrics;

/// Handle of the storage snapshot a query ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxnId(pub u64);

/// Revision of a single bundle at decision time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleInfo {
    #[serde(rename = "Revision")]
    pub revision: String,
}

/// What the evaluation engine hands back for one query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvalOutcome {
    pub decision_id: String,

    #[serde(default)]
    pub txn: Option<TxnId>,

    /// Top-level policy revision.
    #[serde(default)]
    pub revision: String,

    /// Revision per bundle name.
    #[serde(default)]
    pub revisions: BTreeMap<String, String>,

    /// The decision payload; `None` when the query produced nothing.
    #[serde(default)]
    pub decision: Option<Value>,

    #[serde(skip)]
    pub metrics: Arc<Metrics>,
}

impl EvalOutcome {
    pub fn new(decision_id: impl Into<String>) -> Self {
        Self {
            decision_id: decision_id.into(),
            ..Default::default()
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn with_bundle(mut self, name: impl Into<String>, revision: impl Into<String>) -> Self {
        self.revisions.insert(name.into(), revision.into());
        self
    }

    pub fn with_decision(mut self, decision: Value) -> Self {
        self.decision = Some(decision);
        self
    }

    pub fn with_txn(mut self, txn: TxnId) -> Self {
        self.txn = Some(txn);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Audit entry for a single policy decision.
///
/// Request context (`path`, `query`, `remote_addr`, `input`, `timestamp`) is
/// filled by the caller; the remaining fields come from [`populate`].
///
/// [`populate`]: DecisionRecord::populate
#[derive(Debug, Clone, Default, Serialize)]
pub struct DecisionRecord {
    pub decision_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub revision: String,

    pub bundles: BTreeMap<String, BundleInfo>,

    #[serde(skip)]
    pub txn: Option<TxnId>,

    #[serde(skip_serializing_if = "no_metrics")]
    pub metrics: Option<Arc<Metrics>>,

    /// `Some(Value::Null)` records a query that evaluated to nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ClassifiedError>,
}

fn no_metrics(metrics: &Option<Arc<Metrics>>) -> bool {
    metrics.as_ref().map_or(true, |m| m.is_empty())
}

impl DecisionRecord {
    /// Empty record stamped with the current time.
    pub fn new(decision_id: impl Into<String>) -> Self {
        Self {
            decision_id: decision_id.into(),
            timestamp: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Build a fresh record from an outcome.
    pub fn build(outcome: &EvalOutcome, error: Option<EvalError>) -> Self {
        let mut record = Self::default();
        record.populate(outcome, error);
        record
    }

    /// Fill the outcome-derived fields in place.
    ///
    /// With an error, the classified error is attached and any result is
    /// cleared. Without one, the decision (or `null`) is attached and any
    /// error is cleared.
    pub fn populate(&mut self, outcome: &EvalOutcome, error: Option<EvalError>) {
        self.revision = outcome.revision.clone();
        self.bundles = outcome
            .revisions
            .iter()
            .map(|(name, rev)| (name.clone(), BundleInfo { revision: rev.clone() }))
            .collect();
        self.decision_id = outcome.decision_id.clone();
        self.metrics = Some(Arc::clone(&outcome.metrics));
        self.txn = outcome.txn;

        match error {
            Some(err) => {
                self.error = Some(classify(err));
                self.result = None;
            }
            None => {
                self.result = Some(outcome.decision.clone().unwrap_or(Value::Null));
                self.error = None;
            }
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CANCEL_MESSAGE;
    use crate::error::{EngineError, Interruption, StorageError, StorageErrorCode};
    use serde_json::json;

    fn outcome() -> EvalOutcome {
        EvalOutcome::new("abc")
            .with_revision("r1")
            .with_bundle("b1", "r2")
            .with_decision(json!({"allow": true}))
            .with_txn(TxnId(7))
    }

    #[test]
    fn test_build_with_decision() {
        let record = DecisionRecord::build(&outcome(), None);

        assert_eq!(record.decision_id, "abc");
        assert_eq!(record.txn, Some(TxnId(7)));
        assert_eq!(record.result, Some(json!({"allow": true})));
        assert!(record.error.is_none());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["result"], json!({"allow": true}));
        assert_eq!(value["revision"], "r1");
        assert_eq!(value["bundles"], json!({"b1": {"Revision": "r2"}}));
        assert!(value.get("error").is_none());
        assert!(value.get("txn").is_none());
    }

    #[test]
    fn test_build_with_generic_error() {
        let record = DecisionRecord::build(&outcome(), Some(EvalError::msg("disk full")));

        assert!(record.result.is_none());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["error"], json!({"message": "disk full"}));
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_build_with_cancelled_query() {
        let err = EngineError::interrupted_by(Interruption::DeadlineExceeded);
        let record = DecisionRecord::build(&outcome(), Some(err.into()));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["error"]["code"], "eval_cancel_error");
        assert_eq!(value["error"]["message"], CANCEL_MESSAGE);
    }

    #[test]
    fn test_missing_decision_is_null_result() {
        let outcome = EvalOutcome::new("empty");
        let record = DecisionRecord::build(&outcome, None);

        assert_eq!(record.result, Some(Value::Null));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value.get("result"), Some(&Value::Null));
    }

    #[test]
    fn test_empty_bundles_serialized() {
        let record = DecisionRecord::build(&EvalOutcome::new("x"), None);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["bundles"], json!({}));
        assert!(value.get("revision").is_none());
    }

    #[test]
    fn test_populate_replaces_previous_slot() {
        let mut record = DecisionRecord::new("abc").with_path("envoy/authz/allow");
        record.populate(&outcome(), None);
        assert!(record.result.is_some());

        let err = StorageError::new(StorageErrorCode::NotFound, "missing");
        record.populate(&outcome(), Some(err.into()));
        assert!(record.result.is_none());
        assert!(record.error.is_some());
        assert_eq!(record.path.as_deref(), Some("envoy/authz/allow"));
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_metrics_shared_not_copied() {
        let metrics = Arc::new(Metrics::new());
        let outcome = outcome().with_metrics(Arc::clone(&metrics));
        let record = DecisionRecord::build(&outcome, None);

        metrics.incr_counter("late");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["metrics"], json!({"counter_late": 1}));
    }

    #[test]
    fn test_empty_metrics_omitted() {
        let record = DecisionRecord::build(&outcome(), None);
        assert!(record.metrics.is_some());

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("metrics").is_none());
    }

    #[test]
    fn test_outcome_from_yaml() {
        let yaml = r#"
decision_id: d-1
revision: r9
revisions:
  authz: r10
decision:
  allow: false
"#;
        let outcome: EvalOutcome = crate::yaml::unmarshal_as(yaml.as_bytes()).unwrap();
        assert_eq!(outcome.decision_id, "d-1");
        assert_eq!(outcome.revisions.get("authz").map(String::as_str), Some("r10"));
        assert_eq!(outcome.decision.unwrap()["allow"], false);
    }
}
