//! End-to-end scoring pipeline
//!
//! raw events -> normalized events -> per-wallet aggregates -> scores.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::aggregate::group_by_wallet;
use crate::error::{CreditError, CreditResult};
use crate::models::{RawEvent, WalletAggregate};
use crate::normalizer::normalize_event;

/// Parse a JSON document holding an array of raw events.
///
/// This is the only structural check in the pipeline: the document must be
/// an array of objects and each object must carry a wallet field. Badly typed
/// fields inside a record are left to the normalizer.
pub fn parse_events(json: &str) -> CreditResult<Vec<RawEvent>> {
    let document: Value = serde_json::from_str(json)?;
    let Value::Array(records) = document else {
        return Err(CreditError::InvalidInput(
            "expected a JSON array of transaction events".to_string(),
        ));
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(record).map_err(|e| CreditError::InvalidEvent {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Normalize, group and aggregate every wallet in `raw_events`.
///
/// Aggregates come back ordered by wallet address.
pub fn compute_wallet_aggregates(raw_events: &[RawEvent]) -> Vec<WalletAggregate> {
    let groups = group_by_wallet(raw_events.iter().map(normalize_event));

    let aggregates: Vec<WalletAggregate> = groups
        .iter()
        .map(|(wallet, events)| WalletAggregate::from_events(wallet.as_str(), events))
        .collect();

    tracing::info!(
        events = raw_events.len(),
        wallets = aggregates.len(),
        "Scored wallets"
    );

    aggregates
}

/// Compute the `wallet -> credit score` mapping for a batch of raw events.
pub fn compute_credit_scores(raw_events: &[RawEvent]) -> BTreeMap<String, u16> {
    compute_wallet_aggregates(raw_events)
        .into_iter()
        .map(|aggregate| (aggregate.wallet, aggregate.credit_score))
        .collect()
}
