use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a ledger transaction.
///
/// Every kind has a fixed effect direction on the balance; see [`TransactionKind::direction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    InstrumentBuy,
    InstrumentSell,
    IpoInvestment,
    Refund,
}

/// Whether a transaction adds to or removes from the balance once completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Credit,
    Debit,
}

impl TransactionKind {
    pub fn direction(&self) -> Direction {
        match self {
            TransactionKind::Deposit | TransactionKind::InstrumentSell | TransactionKind::Refund => {
                Direction::Credit
            }
            TransactionKind::Withdraw
            | TransactionKind::InstrumentBuy
            | TransactionKind::IpoInvestment => Direction::Debit,
        }
    }

    pub fn is_debit(&self) -> bool {
        self.direction() == Direction::Debit
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
            TransactionKind::InstrumentBuy => "INSTRUMENT_BUY",
            TransactionKind::InstrumentSell => "INSTRUMENT_SELL",
            TransactionKind::IpoInvestment => "IPO_INVESTMENT",
            TransactionKind::Refund => "REFUND",
        };
        f.write_str(label)
    }
}

/// Lifecycle of a ledger transaction. Only `Pending` can move, and only forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Returns true if `self -> next` is a legal forward transition.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(self, TransactionStatus::Pending) && next.is_terminal()
    }
}

/// Administrative trading state of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradingStatus {
    Active,
    Suspended,
    Delisted,
}

impl TradingStatus {
    /// ACTIVE and SUSPENDED are mutually reachable; DELISTED is terminal.
    pub fn can_transition_to(&self, next: TradingStatus) -> bool {
        match (self, next) {
            (TradingStatus::Delisted, _) => false,
            (current, next) => *current != next,
        }
    }
}

/// Lifecycle of an IPO window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IpoStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

/// Lifecycle of a withdrawal request. Approval pays out at once, so there is
/// no intermediate approved state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    Pending,
    Rejected,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    NetBanking,
    Upi,
    Wallet,
}

/// The side of a completed trade, as seen by the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSide {
    Buy,
    Sell,
    IpoSubscription,
}

/// Rolling windows used for volume counters, performance and history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Weekly,
    Monthly,
}

impl Timeframe {
    pub fn duration(&self) -> chrono::Duration {
        match self {
            Timeframe::Daily => chrono::Duration::hours(24),
            Timeframe::Weekly => chrono::Duration::days(7),
            Timeframe::Monthly => chrono::Duration::days(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawal_statuses_use_wire_names() {
        assert_eq!(
            serde_json::to_string(&WithdrawalStatus::Completed).unwrap(),
            "\"COMPLETED\""
        );
        assert!(serde_json::from_str::<WithdrawalStatus>("\"APPROVED\"").is_err());
    }

    #[test]
    fn credit_and_debit_kinds_are_fixed() {
        assert_eq!(TransactionKind::Deposit.direction(), Direction::Credit);
        assert_eq!(TransactionKind::InstrumentSell.direction(), Direction::Credit);
        assert_eq!(TransactionKind::Refund.direction(), Direction::Credit);
        assert!(TransactionKind::Withdraw.is_debit());
        assert!(TransactionKind::InstrumentBuy.is_debit());
        assert!(TransactionKind::IpoInvestment.is_debit());
    }

    #[test]
    fn transaction_status_only_moves_forward() {
        use TransactionStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Completed));
    }

    #[test]
    fn delisted_is_terminal() {
        use TradingStatus::*;
        assert!(Active.can_transition_to(Suspended));
        assert!(Suspended.can_transition_to(Active));
        assert!(Suspended.can_transition_to(Delisted));
        assert!(!Delisted.can_transition_to(Active));
        assert!(!Active.can_transition_to(Active));
    }

    #[test]
    fn kinds_serialize_in_screaming_case() {
        let json = serde_json::to_string(&TransactionKind::IpoInvestment).unwrap();
        assert_eq!(json, "\"IPO_INVESTMENT\"");
    }
}
