//! Read-only queries against the committed view.
//!
//! | path               | key                                   | value                      |
//! |--------------------|---------------------------------------|----------------------------|
//! | `/balance`         | address                               | amount                     |
//! | `/stake`           | holder                                | `Stake`                    |
//! | `/delegate`        | delegator                             | `Delegate`                 |
//! | `/parcel`          | parcel id (hex)                       | `Parcel`                   |
//! | `/request`         | `{"buyer", "target"}`                 | `Request`                  |
//! | `/usage`           | `{"grantee", "target"}`               | `Usage`                    |
//! | `/udc`             | udc id                                | `Udc`                      |
//! | `/udc_balance`     | `{"udc", "address"}`                  | amount                     |
//! | `/udc_lock`        | `{"udc", "address"}`                  | amount                     |
//! | `/hibernate`       | holder                                | `Hibernate`                |
//! | `/inc_height`      | height                                | incentive records          |
//! | `/inc_address`     | address                               | incentive records          |
//! | `/penalty_height`  | height                                | penalty records            |
//! | `/penalty_address` | address                               | penalty records            |
//! | `/validators`      | none                                  | current validator set      |
//! | `/app_state`       | none                                  | height, version, app hash  |
//! | `/config`          | none                                  | `AppConfig`                |
//!
//! Keys are JSON (a string, number or object) or a bare string such as an
//! unquoted hex address. Bare keys are never read as numbers; heights and
//! udc ids accept both forms.

use serde::Serialize;
use serde_json::Value;
use strata_engine::validator_set;
use strata_primitives::types::hash_to_hex;
use strata_primitives::{Address, BlockHeight, QueryCode};
use strata_store::{AuditKind, LedgerStore, StoreError};

use crate::config::AppConfig;
use crate::state::AppState;

/// Outcome of a query. `value` is JSON when `code` is `Ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResponse {
    pub code: QueryCode,
    pub value: Vec<u8>,
    pub log: String,
}

impl QueryResponse {
    fn ok(value: Vec<u8>) -> Self {
        Self {
            code: QueryCode::Ok,
            value,
            log: String::new(),
        }
    }

    fn fail(code: QueryCode, log: impl Into<String>) -> Self {
        Self {
            code,
            value: Vec::new(),
            log: log.into(),
        }
    }

    /// Decode the value as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_slice(&self.value).ok()
    }
}

enum QueryFailure {
    Code(QueryCode, String),
    Store(StoreError),
}

impl From<StoreError> for QueryFailure {
    fn from(err: StoreError) -> Self {
        QueryFailure::Store(err)
    }
}

type QueryResult = Result<Vec<u8>, QueryFailure>;

fn fail<T>(code: QueryCode, log: &str) -> Result<T, QueryFailure> {
    Err(QueryFailure::Code(code, log.to_string()))
}

#[derive(Serialize)]
struct AppStateView {
    height: BlockHeight,
    protocol_version: u32,
    app_hash: String,
}

pub fn handle(
    store: &LedgerStore,
    state: &AppState,
    config: &AppConfig,
    path: &str,
    data: &[u8],
) -> QueryResponse {
    let result = match path {
        "/app_state" => encode(&AppStateView {
            height: state.height,
            protocol_version: state.protocol_version,
            app_hash: hash_to_hex(&state.last_app_hash),
        }),
        "/config" => encode(config),
        "/validators" => validator_set::stored_set(store, true)
            .map_err(QueryFailure::from)
            .and_then(|set| encode(&set)),
        _ => keyed(store, path, data),
    };
    match result {
        Ok(value) => QueryResponse::ok(value),
        Err(QueryFailure::Code(code, log)) => {
            tracing::debug!(path, %code, log = %log, "query failed");
            QueryResponse::fail(code, log)
        }
        Err(QueryFailure::Store(err)) => {
            tracing::error!(path, error = %err, "store failure during query");
            QueryResponse::fail(QueryCode::NoMatch, err.to_string())
        }
    }
}

fn keyed(store: &LedgerStore, path: &str, data: &[u8]) -> QueryResult {
    const C: bool = true;
    match path {
        "/balance" => encode(&store.balance(&address(&key(data)?)?, C)?),
        "/stake" => found(store.stake(&address(&key(data)?)?, C)?),
        "/delegate" => found(store.delegate(&address(&key(data)?)?, C)?),
        "/parcel" => found(store.parcel(&bytes(&key(data)?)?, C)?),
        "/request" => {
            let k = key(data)?;
            let buyer = address(field(&k, "buyer")?)?;
            found(store.request(&buyer, &bytes(field(&k, "target")?)?, C)?)
        }
        "/usage" => {
            let k = key(data)?;
            let grantee = address(field(&k, "grantee")?)?;
            found(store.usage(&grantee, &bytes(field(&k, "target")?)?, C)?)
        }
        "/udc" => found(store.udc(udc_id(&key(data)?)?, C)?),
        "/udc_balance" => {
            let k = key(data)?;
            let id = udc_id(field(&k, "udc")?)?;
            encode(&store.udc_balance(id, &address(field(&k, "address")?)?, C)?)
        }
        "/udc_lock" => {
            let k = key(data)?;
            let id = udc_id(field(&k, "udc")?)?;
            encode(&store.udc_lock(id, &address(field(&k, "address")?)?, C)?)
        }
        "/hibernate" => found(store.hibernate(&address(&key(data)?)?, C)?),
        "/inc_height" => records(store.distributions_at(AuditKind::Incentive, height(&key(data)?)?, C)?),
        "/inc_address" => records(store.distributions_of(AuditKind::Incentive, &address(&key(data)?)?, C)?),
        "/penalty_height" => records(store.distributions_at(AuditKind::Penalty, height(&key(data)?)?, C)?),
        "/penalty_address" => records(store.distributions_of(AuditKind::Penalty, &address(&key(data)?)?, C)?),
        _ => fail(QueryCode::BadPath, &format!("unknown path {path}")),
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> QueryResult {
    serde_json::to_vec(value).map_err(|e| QueryFailure::Store(StoreError::Encode(e.to_string())))
}

fn found<T: Serialize>(value: Option<T>) -> QueryResult {
    match value {
        Some(v) => encode(&v),
        None => fail(QueryCode::NoMatch, "not found"),
    }
}

fn records<T: Serialize>(list: Vec<T>) -> QueryResult {
    if list.is_empty() {
        return fail(QueryCode::NoMatch, "no records");
    }
    encode(&list)
}

/// Parse query data: JSON if possible, otherwise a bare string.
fn key(data: &[u8]) -> Result<Value, QueryFailure> {
    let text = std::str::from_utf8(data).map_err(|_| QueryFailure::Code(QueryCode::BadKey, "key is not UTF-8".into()))?;
    let text = text.trim();
    if text.is_empty() {
        return fail(QueryCode::NoKey, "missing key");
    }
    match text.as_bytes()[0] {
        b'{' | b'"' | b'[' => serde_json::from_str(text)
            .map_err(|e| QueryFailure::Code(QueryCode::BadKey, e.to_string())),
        // bare keys stay text so hex ids keep their leading zeros
        _ => Ok(Value::String(text.to_string())),
    }
}

fn field<'a>(key: &'a Value, name: &str) -> Result<&'a Value, QueryFailure> {
    match key.get(name) {
        Some(v) => Ok(v),
        None => fail(QueryCode::NoKey, &format!("missing field {name}")),
    }
}

fn address(key: &Value) -> Result<Address, QueryFailure> {
    key.as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| QueryFailure::Code(QueryCode::BadKey, "expected a hex address".into()))
}

fn bytes(key: &Value) -> Result<Vec<u8>, QueryFailure> {
    key.as_str()
        .and_then(|s| hex::decode(s).ok())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| QueryFailure::Code(QueryCode::BadKey, "expected hex bytes".into()))
}

fn number(key: &Value) -> Option<u64> {
    match key {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn udc_id(key: &Value) -> Result<u32, QueryFailure> {
    number(key)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| QueryFailure::Code(QueryCode::BadKey, "expected a udc id".into()))
}

fn height(key: &Value) -> Result<BlockHeight, QueryFailure> {
    number(key).ok_or_else(|| QueryFailure::Code(QueryCode::BadKey, "expected a height".into()))
}
