//! Soroban RPC client: polls `getEvents` and decodes marketplace events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//! * JSON-RPC codes `-32600` / `-32601` are treated as hard failures.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, MarketEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn is_hard(&self) -> bool {
        self.code == -32600 || self.code == -32601
    }
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// RPC event id (paging token), unique per event.
    pub id: Option<String>,
    /// Topics as stellar-xdr JSON `ScVal`s, present when `xdrFormat` is `json`.
    #[serde(rename = "topicJson", default)]
    pub topic_json: Vec<Value>,
    /// Event data as a stellar-xdr JSON `ScVal`.
    #[serde(rename = "valueJson", default)]
    pub value_json: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
}

/// One page of `getEvents` output.
#[derive(Debug)]
pub struct EventPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

/// Doubling retry delay capped at [`MAX_BACKOFF_SECS`].
struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Backoff {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    async fn wait(&mut self) {
        tokio::time::sleep(Duration::from_secs(self.secs)).await;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
    }
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`      : optional opaque pagination cursor from a previous response.
/// * `limit`       : maximum number of events to return.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventPage> {
    let mut backoff = Backoff::new();
    let params = build_params(contract_id, start_ledger, cursor, limit);

    loop {
        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!("RPC request failed (will retry in {}s): {e}", backoff.secs);
                backoff.wait().await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {}s)", backoff.secs);
            backoff.wait().await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            if err.is_hard() {
                return Err(IndexerError::EventParse(format!(
                    "RPC hard error {}: {}",
                    err.code, err.message
                )));
            }
            warn!(
                "RPC soft error (will retry in {}s): {} {}",
                backoff.secs, err.code, err.message
            );
            backoff.wait().await;
            continue;
        }

        let result = body
            .result
            .ok_or_else(|| IndexerError::EventParse("Empty result from getEvents".to_string()))?;

        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );

        return Ok(EventPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode a list of raw RPC events into [`MarketEvent`] structs.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<MarketEvent> {
    raw.iter()
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<MarketEvent> {
    let Some(event_id) = raw.id.clone() else {
        warn!("Skipping event without an id at ledger {:?}", raw.ledger);
        return None;
    };

    let topics: Vec<Option<String>> = raw
        .topic_json
        .iter()
        .map(|t| scalar_text(&flatten_scval(t)))
        .collect();
    let kind = topics
        .first()?
        .as_deref()
        .map(EventKind::from_topic)
        .unwrap_or(EventKind::Unknown);

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let second = topics.get(1).cloned().flatten();
    let third = topics.get(2).cloned().flatten();

    let project_id = if kind.is_project_scoped() {
        second.clone()
    } else {
        None
    };
    let milestone_id = if kind.is_milestone_scoped() {
        third
    } else {
        None
    };

    let value = flatten_scval(&raw.value_json);
    let (actor, amount) = decode_data(&value, kind, second.as_deref());

    Some(MarketEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        project_id,
        milestone_id,
        actor,
        amount,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Pull the actor and amount out of an event's flattened data.
///
/// The actor is the principal the event is *about*: the client for a new
/// project, the provider for a bid, the caller for milestone transitions and
/// the target principal for user events.
fn decode_data(
    value: &Value,
    kind: EventKind,
    address_topic: Option<&str>,
) -> (Option<String>, Option<String>) {
    match kind {
        EventKind::Initialized => (scalar_text(value), None),
        EventKind::UserRegistered | EventKind::RoleAssigned | EventKind::ApprovalSet => {
            let actor = address_topic
                .map(String::from)
                .or_else(|| extract_field(value, &["principal", "target"]));
            (actor, None)
        }
        EventKind::ProjectCreated => (
            extract_field(value, &["client"]),
            extract_field(value, &["total_amount"]),
        ),
        EventKind::BidSubmitted => (
            extract_field(value, &["provider"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::MilestoneCompleted
        | EventKind::AmendmentRequested
        | EventKind::MilestoneApproved => (extract_field(value, &["caller"]), None),
        EventKind::PaymentReleased => (
            extract_field(value, &["caller"]),
            extract_field(value, &["amount"]),
        ),
        EventKind::Unknown => (None, None),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| scalar_text(value.get(key)?))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Flatten a stellar-xdr JSON `ScVal` into plain JSON.
///
/// Symbols, strings and addresses become JSON strings, 64- and 128-bit
/// integers become decimal strings, `vec` becomes an array and `map` becomes
/// an object keyed by the flattened key. Contract structs arrive as `map`.
fn flatten_scval(value: &Value) -> Value {
    let Value::Object(obj) = value else {
        // Unit variants serialise as bare strings.
        return match value {
            Value::String(s) if s == "void" => Value::Null,
            other => other.clone(),
        };
    };
    let Some((tag, inner)) = obj.iter().next().filter(|_| obj.len() == 1) else {
        return value.clone();
    };

    match tag.as_str() {
        "symbol" | "string" | "address" | "bytes" | "bool" | "u32" | "i32" => inner.clone(),
        "u64" | "i64" | "timepoint" | "duration" => Value::String(number_text(inner)),
        "u128" => Value::String(wide_int_text(inner, false)),
        "i128" => Value::String(wide_int_text(inner, true)),
        "vec" => Value::Array(
            inner
                .as_array()
                .map(|items| items.iter().map(flatten_scval).collect())
                .unwrap_or_default(),
        ),
        "map" => {
            let mut out = serde_json::Map::new();
            for entry in inner.as_array().into_iter().flatten() {
                let (Some(key), Some(val)) = (entry.get("key"), entry.get("val")) else {
                    continue;
                };
                if let Some(key) = scalar_text(&flatten_scval(key)) {
                    out.insert(key, flatten_scval(val));
                }
            }
            Value::Object(out)
        }
        _ => value.clone(),
    }
}

fn number_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a 128-bit integer given either as a decimal or as `{"hi", "lo"}` parts.
fn wide_int_text(value: &Value, signed: bool) -> String {
    if let Value::Object(parts) = value {
        let hi = parts.get("hi").map(number_text);
        let lo = parts
            .get("lo")
            .map(number_text)
            .and_then(|s| s.parse::<u64>().ok());
        if let (Some(hi), Some(lo)) = (hi, lo) {
            let joined = if signed {
                hi.parse::<i64>()
                    .ok()
                    .map(|h| ((i128::from(h) << 64) | i128::from(lo)).to_string())
            } else {
                hi.parse::<u64>()
                    .ok()
                    .map(|h| ((u128::from(h) << 64) | u128::from(lo)).to_string())
            };
            if let Some(text) = joined {
                return text;
            }
        }
    }
    number_text(value)
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT: &str = "GCLIENTAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    const PROVIDER: &str = "GPROVIDERAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn sym(s: &str) -> Value {
        json!({ "symbol": s })
    }

    fn field(name: &str, val: Value) -> Value {
        json!({ "key": { "symbol": name }, "val": val })
    }

    fn raw_event(topic: Vec<Value>, value: Value, ledger: u64) -> RawEvent {
        RawEvent {
            id: Some(format!("{ledger:019}-0000000001")),
            topic_json: topic,
            value_json: value,
            contract_id: Some("CONTRACT1".to_string()),
            tx_hash: Some(format!("TX{ledger}")),
            ledger: Some(ledger),
            ledger_closed_at: Some("2024-01-01T00:00:00Z".to_string()),
        }
    }

    #[test]
    fn event_kind_from_topic() {
        assert_eq!(EventKind::from_topic("init"), EventKind::Initialized);
        assert_eq!(EventKind::from_topic("user_reg"), EventKind::UserRegistered);
        assert_eq!(EventKind::from_topic("role_set"), EventKind::RoleAssigned);
        assert_eq!(EventKind::from_topic("appr_set"), EventKind::ApprovalSet);
        assert_eq!(EventKind::from_topic("created"), EventKind::ProjectCreated);
        assert_eq!(EventKind::from_topic("bid"), EventKind::BidSubmitted);
        assert_eq!(EventKind::from_topic("ms_done"), EventKind::MilestoneCompleted);
        assert_eq!(EventKind::from_topic("amend"), EventKind::AmendmentRequested);
        assert_eq!(EventKind::from_topic("ms_ok"), EventKind::MilestoneApproved);
        assert_eq!(EventKind::from_topic("released"), EventKind::PaymentReleased);
        assert_eq!(EventKind::from_topic("something_else"), EventKind::Unknown);
    }

    #[test]
    fn event_kind_as_str() {
        assert_eq!(EventKind::ProjectCreated.as_str(), "project_created");
        assert_eq!(EventKind::BidSubmitted.as_str(), "bid_submitted");
        assert_eq!(EventKind::MilestoneCompleted.as_str(), "milestone_completed");
        assert_eq!(EventKind::PaymentReleased.as_str(), "payment_released");
        assert_eq!(EventKind::RoleAssigned.as_str(), "role_assigned");
    }

    #[test]
    fn flatten_scalars() {
        assert_eq!(flatten_scval(&sym("bid")), json!("bid"));
        assert_eq!(flatten_scval(&json!({ "u64": 42 })), json!("42"));
        assert_eq!(flatten_scval(&json!({ "u64": "42" })), json!("42"));
        assert_eq!(flatten_scval(&json!({ "u32": 2 })), json!(2));
        assert_eq!(flatten_scval(&json!({ "address": CLIENT })), json!(CLIENT));
        assert_eq!(flatten_scval(&json!("void")), Value::Null);
    }

    #[test]
    fn flatten_wide_integers() {
        assert_eq!(flatten_scval(&json!({ "u128": "900" })), json!("900"));
        assert_eq!(
            flatten_scval(&json!({ "u128": { "hi": 1, "lo": 5 } })),
            json!("18446744073709551621")
        );
        assert_eq!(
            flatten_scval(&json!({ "i128": { "hi": -1, "lo": 18446744073709551615u64 } })),
            json!("-1")
        );
    }

    #[test]
    fn flatten_struct_map_and_enum_vec() {
        let value = json!({ "map": [
            field("role", json!({ "vec": [sym("Admin")] })),
            field("review_deadline", json!("void")),
        ]});
        assert_eq!(
            flatten_scval(&value),
            json!({ "role": ["Admin"], "review_deadline": null })
        );
    }

    #[test]
    fn decode_project_created_from_rpc_payload() {
        // Shape of a `getEvents` entry requested with `xdrFormat: "json"`.
        let payload = json!({
            "type": "contract",
            "ledger": 1000,
            "ledgerClosedAt": "2024-01-01T00:00:00Z",
            "contractId": "CONTRACT1",
            "id": "0000004294967296000-0000000001",
            "pagingToken": "0000004294967296000-0000000001",
            "inSuccessfulContractCall": true,
            "txHash": "abc123",
            "topicJson": [{ "symbol": "created" }, { "u64": "7" }],
            "valueJson": { "map": [
                { "key": { "symbol": "client" }, "val": { "address": CLIENT } },
                { "key": { "symbol": "milestone_count" }, "val": { "u32": 2 } },
                { "key": { "symbol": "project_id" }, "val": { "u64": "7" } },
                { "key": { "symbol": "total_amount" }, "val": { "u128": "1000" } }
            ]}
        });
        let raw: RawEvent = serde_json::from_value(payload).unwrap();

        let events = decode_events(&[raw], "CONTRACT1");
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.event_id, "0000004294967296000-0000000001");
        assert_eq!(ev.event_type, "project_created");
        assert_eq!(ev.project_id.as_deref(), Some("7"));
        assert_eq!(ev.milestone_id, None);
        assert_eq!(ev.actor.as_deref(), Some(CLIENT));
        assert_eq!(ev.amount.as_deref(), Some("1000"));
        assert_eq!(ev.tx_hash.as_deref(), Some("abc123"));
        assert_eq!(ev.timestamp, 1_704_067_200);
    }

    #[test]
    fn decode_bid_event() {
        let raw = raw_event(
            vec![sym("bid"), json!({ "u64": 3 })],
            json!({ "map": [
                field("amount", json!({ "u128": { "hi": 0, "lo": 900 } })),
                field("project_id", json!({ "u64": 3 })),
                field("provider", json!({ "address": PROVIDER })),
            ]}),
            1000,
        );

        let ev = &decode_events(&[raw], "CONTRACT1")[0];
        assert_eq!(ev.event_type, "bid_submitted");
        assert_eq!(ev.project_id.as_deref(), Some("3"));
        assert_eq!(ev.actor.as_deref(), Some(PROVIDER));
        assert_eq!(ev.amount.as_deref(), Some("900"));
        assert_eq!(ev.ledger, 1000);
    }

    #[test]
    fn decode_payment_released_event() {
        let raw = raw_event(
            vec![sym("released"), json!({ "u64": 0 }), json!({ "u64": 5 })],
            json!({ "map": [
                field("amount", json!({ "u128": "100" })),
                field("caller", json!({ "address": CLIENT })),
                field("milestone_id", json!({ "u64": 5 })),
                field("project_id", json!({ "u64": 0 })),
            ]}),
            1001,
        );

        let ev = &decode_events(&[raw], "CONTRACT1")[0];
        assert_eq!(ev.event_type, "payment_released");
        assert_eq!(ev.project_id.as_deref(), Some("0"));
        assert_eq!(ev.milestone_id.as_deref(), Some("5"));
        assert_eq!(ev.actor.as_deref(), Some(CLIENT));
        assert_eq!(ev.amount.as_deref(), Some("100"));
    }

    #[test]
    fn decode_role_event_uses_target_topic() {
        let raw = raw_event(
            vec![sym("role_set"), json!({ "address": PROVIDER })],
            json!({ "map": [
                field("by", json!({ "address": CLIENT })),
                field("role", json!({ "vec": [sym("Admin")] })),
                field("target", json!({ "address": PROVIDER })),
            ]}),
            1002,
        );

        let ev = &decode_events(&[raw], "CONTRACT1")[0];
        assert_eq!(ev.event_type, "role_assigned");
        assert_eq!(ev.project_id, None);
        assert_eq!(ev.actor.as_deref(), Some(PROVIDER));
    }

    #[test]
    fn decode_init_event_reads_bare_address() {
        let raw = raw_event(vec![sym("init")], json!({ "address": CLIENT }), 1003);
        let ev = &decode_events(&[raw], "CONTRACT1")[0];
        assert_eq!(ev.event_type, "initialized");
        assert_eq!(ev.actor.as_deref(), Some(CLIENT));
    }

    #[test]
    fn decode_unknown_event_is_kept() {
        let raw = raw_event(vec![sym("mystery")], json!("void"), 1004);
        let ev = &decode_events(&[raw], "CONTRACT1")[0];
        assert_eq!(ev.event_type, "unknown");
        assert_eq!(ev.actor, None);
    }

    #[test]
    fn events_without_topics_or_id_are_skipped() {
        let no_topics = raw_event(vec![], json!("void"), 1005);
        let mut no_id = raw_event(vec![sym("bid")], json!("void"), 1006);
        no_id.id = None;
        assert!(decode_events(&[no_topics, no_id], "CONTRACT1").is_empty());
    }

    #[test]
    fn build_params_requests_json_xdr() {
        let with_cursor = build_params("C1", 10, Some("abc"), 50);
        assert_eq!(with_cursor["xdrFormat"], "json");
        assert_eq!(with_cursor["pagination"]["cursor"], "abc");
        assert!(with_cursor.get("startLedger").is_none());

        let fresh = build_params("C1", 10, None, 50);
        assert_eq!(fresh["xdrFormat"], "json");
        assert_eq!(fresh["startLedger"], 10);
        assert_eq!(fresh["pagination"]["limit"], 50);
    }

    #[test]
    fn parse_iso_timestamp() {
        let ts = parse_iso_to_unix("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, 1_704_067_200);
    }
}
