//! Rule-based credit scoring
//!
//! Every wallet starts at [`BASE_SCORE`] and loses a fixed amount for each
//! rule it trips. Rules are independent of each other and of every other
//! wallet; the result is clamped to `[MIN_SCORE, MAX_SCORE]`.

use serde::Serialize;

use crate::models::WalletAggregate;

pub const BASE_SCORE: i32 = 1000;
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 1000;

pub const MIN_REPAY_BORROW_RATIO: f64 = 0.8;
pub const MAX_BORROW_DEPOSIT_RATIO: f64 = 1.2;
pub const MIN_TRANSACTIONS: usize = 3;
pub const MIN_TOTAL_DEPOSIT: f64 = 500.0;

/// A scoring rule that fired for a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    /// At least one liquidation call
    Liquidated,
    /// Repaid less than 80% of what was borrowed
    LowRepayment,
    /// Borrowed more than 1.2x the deposited amount
    HighLeverage,
    /// Fewer than 3 transactions
    LowActivity,
    /// Deposited less than 500 in total
    LowDeposits,
}

impl Penalty {
    /// Points deducted when this rule fires.
    pub fn points(&self) -> i32 {
        match self {
            Penalty::Liquidated => 200,
            Penalty::LowRepayment => 150,
            Penalty::HighLeverage => 100,
            Penalty::LowActivity => 50,
            Penalty::LowDeposits => 50,
        }
    }
}

/// A wallet's score and the rules that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub score: u16,
    pub penalties: Vec<Penalty>,
}

/// Score one wallet from its aggregate.
pub fn score_wallet(aggregate: &WalletAggregate) -> ScoreBreakdown {
    let mut penalties = Vec::new();

    if aggregate.is_liquidated {
        penalties.push(Penalty::Liquidated);
    }
    if aggregate.repay_borrow_ratio < MIN_REPAY_BORROW_RATIO {
        penalties.push(Penalty::LowRepayment);
    }
    if aggregate.borrow_deposit_ratio > MAX_BORROW_DEPOSIT_RATIO {
        penalties.push(Penalty::HighLeverage);
    }
    if aggregate.num_transactions < MIN_TRANSACTIONS {
        penalties.push(Penalty::LowActivity);
    }
    if aggregate.total_deposit_amount < MIN_TOTAL_DEPOSIT {
        penalties.push(Penalty::LowDeposits);
    }

    let deducted: i32 = penalties.iter().map(Penalty::points).sum();
    let score = (BASE_SCORE - deducted).clamp(MIN_SCORE, MAX_SCORE) as u16;

    ScoreBreakdown { score, penalties }
}

/// Detailed per-wallet output: the full aggregate plus the rules that fired.
#[derive(Debug, Clone, Serialize)]
pub struct WalletCreditReport {
    #[serde(flatten)]
    pub aggregate: WalletAggregate,
    pub penalties: Vec<Penalty>,
}

/// Build detailed reports for a set of scored wallets.
pub fn build_reports(aggregates: &[WalletAggregate]) -> Vec<WalletCreditReport> {
    aggregates
        .iter()
        .map(|aggregate| WalletCreditReport {
            penalties: score_wallet(aggregate).penalties,
            aggregate: aggregate.clone(),
        })
        .collect()
}
