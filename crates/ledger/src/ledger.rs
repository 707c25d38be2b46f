use crate::error::LedgerError;
use crate::transaction::{
    BankDetails, Page, PaymentDetails, Transaction, TransactionDetails, TransactionFilter,
};
use crate::withdrawal::{PayoutDestination, WithdrawalDecision, WithdrawalRequest};
use chrono::{DateTime, Utc};
use configuration::WalletLimits;
use core_types::{AccountId, TransactionKind, TransactionStatus, WithdrawalStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of recomputing the balance from the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub recorded: Decimal,
    pub computed: Decimal,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.recorded == self.computed
    }
}

/// The cash side of one account: balance, journal, payout destinations and
/// withdrawal requests.
///
/// The balance always equals the signed sum of COMPLETED transactions, and it
/// only changes together with a journal append or a settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLedger {
    account_id: AccountId,
    balance: Decimal,
    transactions: Vec<Transaction>,
    limits: WalletLimits,
    destinations: Vec<PayoutDestination>,
    withdrawal_requests: Vec<WithdrawalRequest>,
    version: u64,
    created_at: DateTime<Utc>,
}

impl AccountLedger {
    pub fn new(account_id: AccountId, limits: WalletLimits, now: DateTime<Utc>) -> Self {
        Self {
            account_id,
            balance: Decimal::ZERO,
            transactions: Vec::new(),
            limits,
            destinations: Vec::new(),
            withdrawal_requests: Vec::new(),
            version: 0,
            created_at: now,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn limits(&self) -> &WalletLimits {
        &self.limits
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The full journal in commit order.
    pub fn journal(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn destinations(&self) -> &[PayoutDestination] {
        &self.destinations
    }

    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    /// Sum of withdrawals that have been requested but not yet settled.
    pub fn pending_withdrawals(&self) -> Decimal {
        self.transactions
            .iter()
            .filter(|t| t.kind() == TransactionKind::Withdraw && t.status == TransactionStatus::Pending)
            .map(|t| t.amount)
            .sum()
    }

    /// Balance not already promised to a pending withdrawal.
    pub fn available_balance(&self) -> Decimal {
        self.balance - self.pending_withdrawals()
    }

    pub fn deposit(
        &mut self,
        amount: Decimal,
        payment: PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        self.check_amount(amount, self.limits.min_deposit, "deposit")?;

        let used = self.used_today(now, TransactionKind::Deposit, false);
        if used + amount > self.limits.daily_deposit {
            return Err(LedgerError::LimitExceeded {
                limit: "deposit",
                used,
                requested: amount,
                cap: self.limits.daily_deposit,
            });
        }

        let txn = self.add_transaction(
            TransactionDetails::Deposit(payment),
            amount,
            TransactionStatus::Completed,
            now,
        )?;
        tracing::info!(account = %self.account_id, %amount, reference = %txn.reference, "Deposit completed.");
        Ok(txn)
    }

    /// Requests a withdrawal to a verified destination.
    ///
    /// The balance is untouched until the returned PENDING transaction is
    /// settled, but the amount is reserved against later withdrawals.
    pub fn withdraw(
        &mut self,
        amount: Decimal,
        destination_account_number: &str,
        now: DateTime<Utc>,
    ) -> Result<(WithdrawalRequest, Transaction), LedgerError> {
        self.check_amount(amount, self.limits.min_withdrawal, "withdrawal")?;

        let used = self.used_today(now, TransactionKind::Withdraw, true);
        if used + amount > self.limits.daily_withdrawal {
            return Err(LedgerError::LimitExceeded {
                limit: "withdrawal",
                used,
                requested: amount,
                cap: self.limits.daily_withdrawal,
            });
        }

        let destination = self
            .destinations
            .iter()
            .find(|d| d.verified && d.bank.account_number == destination_account_number)
            .map(|d| d.bank.clone())
            .ok_or_else(|| {
                LedgerError::UnverifiedDestination(destination_account_number.to_string())
            })?;

        let available = self.available_balance();
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        let request_id = Uuid::new_v4();
        let txn = self.add_transaction(
            TransactionDetails::Withdraw {
                destination: destination.clone(),
                request_id,
            },
            amount,
            TransactionStatus::Pending,
            now,
        )?;
        let request = WithdrawalRequest {
            id: request_id,
            amount,
            destination,
            transaction_id: txn.id,
            status: WithdrawalStatus::Pending,
            requested_at: now,
            processed_at: None,
            remarks: None,
        };
        self.withdrawal_requests.push(request.clone());

        tracing::info!(account = %self.account_id, %amount, request = %request_id, "Withdrawal requested.");
        Ok((request, txn))
    }

    /// Appends a transaction to the journal.
    ///
    /// A COMPLETED transaction takes effect immediately; a COMPLETED debit
    /// that would overdraw the account is rejected without appending.
    pub fn add_transaction(
        &mut self,
        details: TransactionDetails,
        amount: Decimal,
        status: TransactionStatus,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "transaction amount must be positive, got {}",
                amount
            )));
        }

        let txn = Transaction::new(details, amount, status, now);
        if status == TransactionStatus::Completed {
            self.apply_effect(&txn)?;
        }
        self.transactions.push(txn.clone());
        self.version += 1;
        Ok(txn)
    }

    /// Moves a PENDING transaction to a terminal status.
    ///
    /// If completion would overdraw the account the transaction stays PENDING.
    /// A linked withdrawal request follows the transaction.
    pub fn settle_transaction(
        &mut self,
        transaction_id: Uuid,
        new_status: TransactionStatus,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let index = self
            .transactions
            .iter()
            .position(|t| t.id == transaction_id)
            .ok_or(LedgerError::TransactionNotFound(transaction_id))?;

        let current = self.transactions[index].status;
        if !current.can_transition_to(new_status) {
            return Err(LedgerError::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        if new_status == TransactionStatus::Completed {
            let pending = self.transactions[index].clone();
            self.apply_effect(&pending)?;
        }

        let txn = &mut self.transactions[index];
        txn.status = new_status;
        txn.settled_at = Some(now);
        let settled = txn.clone();

        if let Some(request) = self
            .withdrawal_requests
            .iter_mut()
            .find(|r| r.transaction_id == transaction_id)
        {
            request.status = match new_status {
                TransactionStatus::Completed => WithdrawalStatus::Completed,
                _ => WithdrawalStatus::Rejected,
            };
            request.processed_at = Some(now);
        }

        self.version += 1;
        tracing::info!(
            account = %self.account_id,
            reference = %settled.reference,
            status = ?new_status,
            "Transaction settled."
        );
        Ok(settled)
    }

    /// Approves or rejects a pending withdrawal request.
    pub fn process_withdrawal_request(
        &mut self,
        request_id: Uuid,
        decision: WithdrawalDecision,
        remarks: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<WithdrawalRequest, LedgerError> {
        let request = self
            .withdrawal_requests
            .iter()
            .find(|r| r.id == request_id)
            .ok_or(LedgerError::WithdrawalRequestNotFound(request_id))?;
        if request.status != WithdrawalStatus::Pending {
            return Err(LedgerError::RequestAlreadyProcessed(request_id));
        }
        let transaction_id = request.transaction_id;

        let target = match decision {
            WithdrawalDecision::Approve => TransactionStatus::Completed,
            WithdrawalDecision::Reject => TransactionStatus::Cancelled,
        };
        self.settle_transaction(transaction_id, target, now)?;

        let request = self
            .withdrawal_requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or(LedgerError::WithdrawalRequestNotFound(request_id))?;
        request.remarks = remarks;
        Ok(request.clone())
    }

    /// Registers a payout destination. The first one becomes primary.
    pub fn register_destination(
        &mut self,
        bank: BankDetails,
        now: DateTime<Utc>,
    ) -> Result<PayoutDestination, LedgerError> {
        if self
            .destinations
            .iter()
            .any(|d| d.bank.account_number == bank.account_number)
        {
            return Err(LedgerError::DuplicateDestination(bank.account_number));
        }
        let destination = PayoutDestination {
            bank,
            verified: false,
            primary: self.destinations.is_empty(),
            added_at: now,
        };
        self.destinations.push(destination.clone());
        self.version += 1;
        Ok(destination)
    }

    pub fn verify_destination(&mut self, account_number: &str) -> Result<(), LedgerError> {
        let destination = self
            .destinations
            .iter_mut()
            .find(|d| d.bank.account_number == account_number)
            .ok_or_else(|| LedgerError::DestinationNotFound(account_number.to_string()))?;
        destination.verified = true;
        self.version += 1;
        Ok(())
    }

    /// Signed sum of COMPLETED transactions that took effect at or before `at`.
    pub fn balance_as_of(&self, at: DateTime<Utc>) -> Decimal {
        self.transactions
            .iter()
            .filter(|t| t.effective_at().is_some_and(|when| when <= at))
            .map(Transaction::signed_amount)
            .sum()
    }

    pub fn transactions(&self, filter: &TransactionFilter) -> Page<Transaction> {
        let matching: Vec<&Transaction> = self
            .transactions
            .iter()
            .rev()
            .filter(|t| filter.matches(t))
            .collect();
        let per_page = filter.per_page.max(1);
        let page = filter.page.max(1);
        let items = matching
            .iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .map(|t| (*t).clone())
            .collect();
        Page {
            items,
            total: matching.len(),
            page,
            per_page,
        }
    }

    /// Withdrawal requests, newest first, optionally narrowed to one status.
    pub fn withdrawal_requests(&self, status: Option<WithdrawalStatus>) -> Vec<WithdrawalRequest> {
        self.withdrawal_requests
            .iter()
            .rev()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect()
    }

    pub fn reconcile(&self) -> Reconciliation {
        let computed: Decimal = self
            .transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Completed)
            .map(Transaction::signed_amount)
            .sum();
        Reconciliation {
            recorded: self.balance,
            computed,
        }
    }

    fn apply_effect(&mut self, txn: &Transaction) -> Result<(), LedgerError> {
        let next = self.balance + txn.signed_amount();
        if next.is_sign_negative() {
            return Err(LedgerError::InsufficientFunds {
                required: txn.amount,
                available: self.balance,
            });
        }
        self.balance = next;
        Ok(())
    }

    fn check_amount(
        &self,
        amount: Decimal,
        minimum: Decimal,
        operation: &str,
    ) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "{} amount must be positive, got {}",
                operation, amount
            )));
        }
        if amount < minimum {
            return Err(LedgerError::InvalidAmount(format!(
                "minimum {} is {}, got {}",
                operation, minimum, amount
            )));
        }
        if amount > self.limits.max_per_operation {
            return Err(LedgerError::InvalidAmount(format!(
                "maximum per {} is {}, got {}",
                operation, self.limits.max_per_operation, amount
            )));
        }
        Ok(())
    }

    /// Today's (UTC) total for one kind. COMPLETED always counts; PENDING only
    /// when `include_pending` is set.
    fn used_today(&self, now: DateTime<Utc>, kind: TransactionKind, include_pending: bool) -> Decimal {
        let today = now.date_naive();
        self.transactions
            .iter()
            .filter(|t| t.kind() == kind && t.created_at.date_naive() == today)
            .filter(|t| {
                t.status == TransactionStatus::Completed
                    || (include_pending && t.status == TransactionStatus::Pending)
            })
            .map(|t| t.amount)
            .sum()
    }
}
