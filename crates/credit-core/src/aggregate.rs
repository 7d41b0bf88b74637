//! Per-wallet aggregation
//!
//! Events are grouped by wallet and each group is reduced independently into
//! a [`WalletAggregate`]: counts, bucketed sums, the activity window and the
//! derived ratios the scorer works from.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{Action, NormalizedEvent, WalletAggregate};
use crate::scoring::score_wallet;

/// Partition events by wallet.
pub fn group_by_wallet(
    events: impl IntoIterator<Item = NormalizedEvent>,
) -> BTreeMap<String, Vec<NormalizedEvent>> {
    let mut groups: BTreeMap<String, Vec<NormalizedEvent>> = BTreeMap::new();
    for event in events {
        groups.entry(event.wallet.clone()).or_default().push(event);
    }
    groups
}

/// Canonical event order within a wallet: time, then action, then amount.
///
/// Reducing in this order keeps floating-point sums identical however the
/// input was shuffled.
fn canonical_order(a: &NormalizedEvent, b: &NormalizedEvent) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.action.as_str().cmp(b.action.as_str()))
        .then_with(|| a.amount.total_cmp(&b.amount))
}

impl WalletAggregate {
    /// Reduce one wallet's events into its aggregate and score it.
    pub fn from_events(wallet: impl Into<String>, events: &[NormalizedEvent]) -> Self {
        let mut ordered: Vec<&NormalizedEvent> = events.iter().collect();
        ordered.sort_by(|a, b| canonical_order(a, b));

        let mut aggregate = WalletAggregate {
            wallet: wallet.into(),
            num_transactions: ordered.len(),
            num_deposits: 0,
            num_borrows: 0,
            num_repays: 0,
            num_redeems: 0,
            num_liquidations: 0,
            total_deposit_amount: 0.0,
            total_borrow_amount: 0.0,
            total_repay_amount: 0.0,
            total_redeem_amount: 0.0,
            first_tx_time: ordered
                .first()
                .map(|e| e.timestamp)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            last_tx_time: ordered
                .last()
                .map(|e| e.timestamp)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            repay_borrow_ratio: 0.0,
            deposit_redeem_ratio: 0.0,
            borrow_deposit_ratio: 0.0,
            avg_time_between_txs: 0.0,
            is_liquidated: false,
            credit_score: 0,
        };

        for event in &ordered {
            match event.action {
                Action::Deposit => {
                    aggregate.num_deposits += 1;
                    aggregate.total_deposit_amount += event.amount;
                }
                Action::Borrow => {
                    aggregate.num_borrows += 1;
                    aggregate.total_borrow_amount += event.amount;
                }
                Action::Repay => {
                    aggregate.num_repays += 1;
                    aggregate.total_repay_amount += event.amount;
                }
                Action::RedeemUnderlying => {
                    aggregate.num_redeems += 1;
                    aggregate.total_redeem_amount += event.amount;
                }
                Action::LiquidationCall | Action::Other(_) => {}
            }
            if event.is_liquidation {
                aggregate.num_liquidations += 1;
            }
        }

        aggregate.derive_ratios();
        aggregate.credit_score = score_wallet(&aggregate).score;

        tracing::debug!(
            wallet = %aggregate.wallet,
            transactions = aggregate.num_transactions,
            liquidations = aggregate.num_liquidations,
            credit_score = aggregate.credit_score,
            "Aggregated wallet"
        );

        aggregate
    }

    fn derive_ratios(&mut self) {
        // No borrows: repayments are measured against 1 rather than 0.
        let borrow_base = if self.total_borrow_amount == 0.0 {
            1.0
        } else {
            self.total_borrow_amount
        };
        self.repay_borrow_ratio = self.total_repay_amount / borrow_base;
        self.deposit_redeem_ratio = self.total_deposit_amount / (self.total_redeem_amount + 1.0);
        self.borrow_deposit_ratio = self.total_borrow_amount / (self.total_deposit_amount + 1.0);

        let active_seconds = (self.last_tx_time - self.first_tx_time).num_seconds() as f64;
        self.avg_time_between_txs = active_seconds / self.num_transactions.max(1) as f64;

        self.is_liquidated = self.num_liquidations > 0;
    }
}
