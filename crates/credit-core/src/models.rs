//! Data models for the scoring pipeline
//!
//! Events flow through three shapes: the loosely typed [`RawEvent`] as it
//! arrives from an export, the canonical [`NormalizedEvent`], and the
//! per-wallet [`WalletAggregate`] that carries the final credit score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// Input Records
// =============================================================================

/// A transaction event exactly as it appears in a lending protocol export.
///
/// Only the fields the scorer needs are captured; anything else in the record
/// (`txHash`, `network`, `protocol`, ...) is ignored on deserialization.
/// A record without a wallet field is rejected; a wallet or action of the
/// wrong type is kept as text so one odd record cannot fail a batch.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    /// Wallet address. Exports name this field `userWallet`.
    #[serde(alias = "userWallet", deserialize_with = "lenient_string")]
    pub wallet: String,

    /// Action kind (e.g., "deposit", "borrow", "liquidationcall")
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: String,

    /// Action payload, either a structured object or its textual encoding
    #[serde(rename = "actionData", alias = "action_data", default)]
    pub action_data: Value,

    /// Seconds since the Unix epoch, as a number or numeric string
    #[serde(default)]
    pub timestamp: Value,
}

/// Strings pass through, `null` becomes empty, anything else its JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

// =============================================================================
// Normalized Events
// =============================================================================

/// Lending action kind.
///
/// The vocabulary is open: unrecognized actions are kept verbatim in
/// [`Action::Other`] and still count toward a wallet's transaction total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum Action {
    Deposit,
    Borrow,
    Repay,
    RedeemUnderlying,
    LiquidationCall,
    Other(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Deposit => "deposit",
            Action::Borrow => "borrow",
            Action::Repay => "repay",
            Action::RedeemUnderlying => "redeemunderlying",
            Action::LiquidationCall => "liquidationcall",
            Action::Other(action) => action,
        }
    }
}

impl From<&str> for Action {
    /// Case-sensitive: "Deposit" is not a deposit.
    fn from(s: &str) -> Self {
        match s {
            "deposit" => Action::Deposit,
            "borrow" => Action::Borrow,
            "repay" => Action::Repay,
            "redeemunderlying" => Action::RedeemUnderlying,
            "liquidationcall" => Action::LiquidationCall,
            other => Action::Other(other.to_string()),
        }
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical form of a single event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvent {
    pub wallet: String,
    pub action: Action,

    /// Token amount in whole units (base units / 1,000,000), never negative
    pub amount: f64,

    pub timestamp: DateTime<Utc>,

    /// True iff the action is a liquidation call
    pub is_liquidation: bool,
}

impl NormalizedEvent {
    pub fn new(
        wallet: impl Into<String>,
        action: Action,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let is_liquidation = action == Action::LiquidationCall;
        Self {
            wallet: wallet.into(),
            action,
            amount,
            timestamp,
            is_liquidation,
        }
    }
}

// =============================================================================
// Wallet Aggregates
// =============================================================================

/// Behavioral statistics for one wallet, reduced from all of its events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletAggregate {
    pub wallet: String,

    pub num_transactions: usize,
    pub num_deposits: usize,
    pub num_borrows: usize,
    pub num_repays: usize,
    pub num_redeems: usize,
    pub num_liquidations: usize,

    pub total_deposit_amount: f64,
    pub total_borrow_amount: f64,
    pub total_repay_amount: f64,
    pub total_redeem_amount: f64,

    pub first_tx_time: DateTime<Utc>,
    pub last_tx_time: DateTime<Utc>,

    /// Repaid amount over borrowed amount (borrowed floored at 1 when zero)
    pub repay_borrow_ratio: f64,
    pub deposit_redeem_ratio: f64,
    pub borrow_deposit_ratio: f64,

    /// Seconds between first and last event divided by the event count
    pub avg_time_between_txs: f64,

    pub is_liquidated: bool,

    /// Final score (0-1000, higher = lower risk)
    pub credit_score: u16,
}
