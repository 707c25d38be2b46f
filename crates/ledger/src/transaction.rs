use chrono::{DateTime, Utc};
use core_types::{Direction, InstrumentId, PaymentMethod, TransactionKind, TransactionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub payment_id: String,
    pub method: PaymentMethod,
}

/// A bank account that can receive withdrawals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_holder: String,
    pub account_number: String,
    pub ifsc_code: String,
    pub bank_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDetails {
    pub instrument_id: InstrumentId,
    pub quantity: u64,
    pub unit_price: Decimal,
}

/// What a transaction is about. The kind is derived from the variant, so a
/// deposit can never carry trade details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionDetails {
    Deposit(PaymentDetails),
    Withdraw {
        destination: BankDetails,
        request_id: Uuid,
    },
    InstrumentBuy(TradeDetails),
    InstrumentSell(TradeDetails),
    IpoInvestment(TradeDetails),
    Refund { reason: String },
}

impl TransactionDetails {
    pub fn kind(&self) -> TransactionKind {
        match self {
            TransactionDetails::Deposit(_) => TransactionKind::Deposit,
            TransactionDetails::Withdraw { .. } => TransactionKind::Withdraw,
            TransactionDetails::InstrumentBuy(_) => TransactionKind::InstrumentBuy,
            TransactionDetails::InstrumentSell(_) => TransactionKind::InstrumentSell,
            TransactionDetails::IpoInvestment(_) => TransactionKind::IpoInvestment,
            TransactionDetails::Refund { .. } => TransactionKind::Refund,
        }
    }

    pub fn trade(&self) -> Option<&TradeDetails> {
        match self {
            TransactionDetails::InstrumentBuy(t)
            | TransactionDetails::InstrumentSell(t)
            | TransactionDetails::IpoInvestment(t) => Some(t),
            _ => None,
        }
    }
}

/// One entry in an account's append-only journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub reference: String,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub details: TransactionDetails,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub(crate) fn new(
        details: TransactionDetails,
        amount: Decimal,
        status: TransactionStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reference: generate_reference(now),
            amount,
            status,
            details,
            created_at: now,
            settled_at: (status == TransactionStatus::Completed).then_some(now),
        }
    }

    pub fn kind(&self) -> TransactionKind {
        self.details.kind()
    }

    /// The amount with the sign of its effect on the balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind().direction() {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }

    /// When the transaction took effect, if it did.
    pub fn effective_at(&self) -> Option<DateTime<Utc>> {
        match self.status {
            TransactionStatus::Completed => Some(self.settled_at.unwrap_or(self.created_at)),
            _ => None,
        }
    }
}

/// `TXN` + epoch millis + five upper-case alphanumerics.
pub fn generate_reference(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(5)
        .collect::<String>()
        .to_uppercase();
    format!("TXN{}{}", now.timestamp_millis(), suffix)
}

/// Query over an account's journal. Results come back newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            kind: None,
            status: None,
            from: None,
            to: None,
            page: 1,
            per_page: 20,
        }
    }
}

impl TransactionFilter {
    pub fn matches(&self, txn: &Transaction) -> bool {
        self.kind.is_none_or(|k| txn.kind() == k)
            && self.status.is_none_or(|s| txn.status == s)
            && self.from.is_none_or(|from| txn.created_at >= from)
            && self.to.is_none_or(|to| txn.created_at <= to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page)
    }
}
