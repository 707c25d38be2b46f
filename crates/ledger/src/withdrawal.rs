use crate::transaction::BankDetails;
use chrono::{DateTime, Utc};
use core_types::WithdrawalStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered payout account. Only verified destinations can receive withdrawals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutDestination {
    pub bank: BankDetails,
    pub verified: bool,
    pub primary: bool,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub amount: Decimal,
    pub destination: BankDetails,
    pub transaction_id: Uuid,
    pub status: WithdrawalStatus,
    pub requested_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub remarks: Option<String>,
}

/// Administrative outcome for a pending withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalDecision {
    Approve,
    Reject,
}
