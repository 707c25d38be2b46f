use super::*;
use chrono::{Duration, TimeZone};
use core_types::{
    ErrorKind, EventId, ManualClock, MatchEvent, PaymentMethod, PerformanceStats, TradeSide,
    TransactionKind, TransactionStatus,
};
use events::MarketEvent;
use ledger::{BankDetails, PaymentDetails, TransactionFilter, WithdrawalDecision};
use market::NewInstrument;
use rust_decimal_macros::dec;
use std::sync::Mutex as StdMutex;

#[derive(Default)]
struct RecordingSink {
    events: StdMutex<Vec<MarketEvent>>,
}

impl RecordingSink {
    fn taken(&self) -> Vec<MarketEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, event: MarketEvent) -> Result<(), events::EventsError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

struct Harness {
    engine: TradingEngine,
    clock: Arc<ManualClock>,
    sink: Arc<RecordingSink>,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap()
}

fn harness_with(config: Config) -> Harness {
    let clock = Arc::new(ManualClock::new(start()));
    let sink = Arc::new(RecordingSink::default());
    let engine = TradingEngine::new(config, clock.clone(), sink.clone()).unwrap();
    Harness { engine, clock, sink }
}

fn harness() -> Harness {
    harness_with(Config::default())
}

fn kohli() -> InstrumentId {
    InstrumentId::new("VKOHLI")
}

fn upi() -> PaymentDetails {
    PaymentDetails {
        payment_id: "pay_test".to_string(),
        method: PaymentMethod::Upi,
    }
}

async fn list(engine: &TradingEngine, id: &InstrumentId, price: Decimal, supply: u64) {
    engine
        .list_instrument(NewInstrument {
            id: id.clone(),
            name: format!("Player {}", id),
            performer_id: format!("perf-{}", id),
            initial_price: price,
            total_supply: supply,
        })
        .await
        .unwrap();
}

async fn funded(engine: &TradingEngine, amount: Decimal) -> AccountId {
    let account = engine.open_account().await.unwrap();
    engine.deposit(account, amount, upi()).await.unwrap();
    account
}

#[tokio::test]
async fn buy_debits_cash_and_issues_units() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 10_000).await;
    let account = funded(&h.engine, dec!(10000)).await;
    h.sink.taken();

    let receipt = h.engine.buy(account, &kohli(), 5).await.unwrap();

    assert_eq!(receipt.stage, TradeStage::ReceiptIssued);
    assert_eq!(receipt.side, TradeSide::Buy);
    assert_eq!(receipt.total, dec!(5000));
    assert_eq!(receipt.balance_after, dec!(5000));
    assert_eq!(receipt.holding_after.quantity, 5);
    assert_eq!(receipt.holding_after.average_cost, dec!(1000));
    assert!(receipt.reference.starts_with("TXN"));

    assert_eq!(h.engine.balance(account).await.unwrap(), dec!(5000));
    let snapshot = h.engine.instrument_snapshot(&kohli()).await.unwrap();
    assert_eq!(snapshot.circulating_supply, 5);
    assert_eq!(snapshot.volume.daily, 5);
    assert_eq!(snapshot.market_cap, dec!(5000));

    let events = h.sink.taken();
    assert!(matches!(
        events.as_slice(),
        [MarketEvent::TradeCompleted(t)] if t.quantity == 5 && t.transaction_reference == receipt.reference
    ));
    assert!(h.engine.audit().await.is_clean());
}

#[tokio::test]
async fn sell_credits_proceeds_and_keeps_average_cost() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 10_000).await;
    let account = funded(&h.engine, dec!(10000)).await;
    h.engine.buy(account, &kohli(), 5).await.unwrap();

    let receipt = h.engine.sell(account, &kohli(), 3).await.unwrap();

    assert_eq!(receipt.balance_after, dec!(8000));
    assert_eq!(receipt.realized_pnl, Some(Decimal::ZERO));
    let holding = h.engine.holding(account, &kohli()).await.unwrap();
    assert_eq!(holding.quantity, 2);
    assert_eq!(holding.average_cost, dec!(1000));
    assert_eq!(
        h.engine
            .instrument_snapshot(&kohli())
            .await
            .unwrap()
            .circulating_supply,
        2
    );
    assert!(h.engine.audit().await.is_clean());
}

#[tokio::test]
async fn round_trip_at_unchanged_price_restores_balance() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(333.3333), 10_000).await;
    let account = funded(&h.engine, dec!(10000)).await;

    h.engine.buy(account, &kohli(), 7).await.unwrap();
    h.engine.sell(account, &kohli(), 7).await.unwrap();

    assert_eq!(h.engine.balance(account).await.unwrap(), dec!(10000));
    assert_eq!(h.engine.holding(account, &kohli()).await.unwrap().quantity, 0);
    let page = h
        .engine
        .transactions(account, &TransactionFilter::default())
        .await
        .unwrap();
    let kinds: Vec<_> = page.items.iter().map(|t| t.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            TransactionKind::InstrumentSell,
            TransactionKind::InstrumentBuy,
            TransactionKind::Deposit
        ]
    );
}

#[tokio::test]
async fn realized_pnl_follows_price_moves() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 10_000).await;
    let account = funded(&h.engine, dec!(10000)).await;
    h.engine.buy(account, &kohli(), 5).await.unwrap();

    h.engine
        .apply_match_event(&MatchEvent {
            event_id: EventId::new("M1"),
            instrument_id: kohli(),
            stats: PerformanceStats {
                runs: Some(100),
                ..Default::default()
            },
        })
        .await
        .unwrap();

    let receipt = h.engine.sell(account, &kohli(), 2).await.unwrap();
    assert_eq!(receipt.unit_price, dec!(1100));
    assert_eq!(receipt.realized_pnl, Some(dec!(200)));
    assert!(h.engine.audit().await.is_clean());
}

#[tokio::test]
async fn rejected_buys_leave_no_trace() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 10_000).await;
    let account = funded(&h.engine, dec!(4999)).await;

    let err = h.engine.buy(account, &kohli(), 5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    let err = h.engine.buy(account, &kohli(), 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAmount);

    let err = h.engine.buy(account, &kohli(), 1001).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);

    assert_eq!(h.engine.balance(account).await.unwrap(), dec!(4999));
    assert_eq!(h.engine.holding(account, &kohli()).await.unwrap().quantity, 0);
    let snapshot = h.engine.instrument_snapshot(&kohli()).await.unwrap();
    assert_eq!(snapshot.circulating_supply, 0);
    assert_eq!(snapshot.volume.daily, 0);
    let journal = h
        .engine
        .transactions(account, &TransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(journal.total, 1);
}

#[tokio::test]
async fn buys_cannot_exceed_total_supply() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(10), 8).await;
    let account = funded(&h.engine, dec!(1000)).await;

    h.engine.buy(account, &kohli(), 6).await.unwrap();
    let err = h.engine.buy(account, &kohli(), 3).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientSupply);
    assert_eq!(h.engine.balance(account).await.unwrap(), dec!(940));
}

#[tokio::test]
async fn overselling_is_rejected() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(100), 1000).await;
    let account = funded(&h.engine, dec!(1000)).await;
    h.engine.buy(account, &kohli(), 2).await.unwrap();

    let err = h.engine.sell(account, &kohli(), 3).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientHoldings);
    assert_eq!(h.engine.balance(account).await.unwrap(), dec!(800));
}

#[tokio::test]
async fn suspended_instruments_do_not_trade() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(100), 1000).await;
    let account = funded(&h.engine, dec!(1000)).await;
    h.engine.buy(account, &kohli(), 2).await.unwrap();
    h.sink.taken();

    let previous = h
        .engine
        .set_trading_status(&kohli(), TradingStatus::Suspended)
        .await
        .unwrap();
    assert_eq!(previous, TradingStatus::Active);
    assert!(matches!(
        h.sink.taken().as_slice(),
        [MarketEvent::TradingStatusChanged(c)] if c.current == TradingStatus::Suspended
    ));

    for err in [
        h.engine.buy(account, &kohli(), 1).await.unwrap_err(),
        h.engine.sell(account, &kohli(), 1).await.unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::TradingSuspended);
    }

    h.engine
        .set_trading_status(&kohli(), TradingStatus::Active)
        .await
        .unwrap();
    h.engine.sell(account, &kohli(), 1).await.unwrap();
}

#[tokio::test]
async fn zero_priced_instruments_reject_trades() {
    let h = harness();
    list(&h.engine, &kohli(), Decimal::ZERO, 1000).await;
    let account = funded(&h.engine, dec!(1000)).await;
    let err = h.engine.buy(account, &kohli(), 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPrice);
}

#[tokio::test]
async fn daily_volume_cap_is_shared_across_accounts() {
    let mut config = Config::default();
    config.trading.max_daily_volume = 10;
    let h = harness_with(config);
    list(&h.engine, &kohli(), dec!(10), 1000).await;
    let a = funded(&h.engine, dec!(1000)).await;
    let b = funded(&h.engine, dec!(1000)).await;

    h.engine.buy(a, &kohli(), 6).await.unwrap();
    let err = h.engine.buy(b, &kohli(), 5).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LimitExceeded);

    assert_eq!(h.engine.reset_volume(Timeframe::Daily).await, 1);
    h.engine.buy(b, &kohli(), 5).await.unwrap();
}

#[tokio::test]
async fn match_event_moves_price_and_notifies() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 1000).await;
    let event = MatchEvent {
        event_id: EventId::new("IPL-2026-M12"),
        instrument_id: kohli(),
        stats: PerformanceStats {
            runs: Some(82),
            strike_rate: Some(dec!(151.9)),
            catches: 1,
            ..Default::default()
        },
    };

    let record = h.engine.apply_match_event(&event).await.unwrap();
    assert_eq!(record.resulting_price, dec!(1102.38));
    h.engine.apply_match_event(&event).await.unwrap();

    let snapshot = h.engine.instrument_snapshot(&kohli()).await.unwrap();
    assert_eq!(snapshot.current_price, dec!(1102.38));
    let events = h.sink.taken();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        MarketEvent::PriceChanged(p) if p.previous_price == dec!(1000) && p.new_price == dec!(1102.38)
    ));

    let history = h
        .engine
        .price_history(&kohli(), Timeframe::Daily)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert!(h.engine.audit().await.is_clean());
}

#[tokio::test]
async fn redelivered_match_event_keeps_later_impacts() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 1000).await;
    let century = PerformanceStats {
        runs: Some(100),
        ..Default::default()
    };
    let first = MatchEvent {
        event_id: EventId::new("IPL-2026-M12"),
        instrument_id: kohli(),
        stats: century.clone(),
    };
    let second = MatchEvent {
        event_id: EventId::new("IPL-2026-M13"),
        instrument_id: kohli(),
        stats: century,
    };

    h.engine.apply_match_event(&first).await.unwrap();
    h.clock.advance(Duration::minutes(30));
    h.engine.apply_match_event(&second).await.unwrap();
    h.clock.advance(Duration::minutes(30));
    h.engine.apply_match_event(&first).await.unwrap();

    let snapshot = h.engine.instrument_snapshot(&kohli()).await.unwrap();
    assert_eq!(snapshot.current_price, dec!(1210));
    assert_eq!(snapshot.previous_price, dec!(1100));

    // One notification per net price move.
    let prices: Vec<_> = h
        .sink
        .taken()
        .into_iter()
        .filter_map(|e| match e {
            MarketEvent::PriceChanged(p) => Some(p.new_price),
            _ => None,
        })
        .collect();
    assert_eq!(prices, vec![dec!(1100), dec!(1210)]);

    let history = h
        .engine
        .price_history(&kohli(), Timeframe::Daily)
        .await
        .unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history.last().map(|p| p.price), Some(dec!(1210)));
    assert!(h.engine.audit().await.is_clean());
}

#[tokio::test]
async fn match_results_skip_unknown_instruments() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 1000).await;
    let fifty = PerformanceStats {
        runs: Some(50),
        ..Default::default()
    };

    let outcome = h
        .engine
        .apply_match_results(
            &EventId::new("M9"),
            vec![
                (kohli(), fifty.clone()),
                (InstrumentId::new("GHOST"), fifty),
            ],
        )
        .await;

    assert_eq!(outcome.applied.len(), 1);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].1.kind(), ErrorKind::NotFound);
    assert_eq!(
        h.engine.instrument_snapshot(&kohli()).await.unwrap().current_price,
        dec!(1050)
    );
}

#[tokio::test]
async fn ipo_subscription_buys_at_base_price() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 1000).await;
    let event = EventId::new("IPL-2026-M1");
    h.engine
        .open_ipo(
            &kohli(),
            IpoTerms {
                event_id: event.clone(),
                base_price: dec!(800),
                max_price: dec!(1200),
                units: 100,
                opens_at: start(),
                closes_at: start() + Duration::hours(2),
            },
        )
        .await
        .unwrap();
    let account = funded(&h.engine, dec!(10000)).await;

    let receipt = h
        .engine
        .participate_in_ipo(account, &kohli(), &event, 10)
        .await
        .unwrap();
    assert_eq!(receipt.side, TradeSide::IpoSubscription);
    assert_eq!(receipt.unit_price, dec!(800));
    assert_eq!(receipt.balance_after, dec!(2000));
    assert_eq!(receipt.holding_after.quantity, 10);

    let window = h.engine.ipo_details(&kohli()).await.unwrap().unwrap();
    assert_eq!(window.sold_units, 10);
    assert_eq!(window.available_units, 90);
    assert!(h.engine.audit().await.is_clean());
}

#[tokio::test]
async fn unaffordable_ipo_subscription_releases_its_allocation() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 1000).await;
    let event = EventId::new("IPL-2026-M1");
    h.engine
        .open_ipo(
            &kohli(),
            IpoTerms {
                event_id: event.clone(),
                base_price: dec!(800),
                max_price: dec!(800),
                units: 100,
                opens_at: start(),
                closes_at: start() + Duration::hours(2),
            },
        )
        .await
        .unwrap();
    let account = funded(&h.engine, dec!(1000)).await;

    let err = h
        .engine
        .participate_in_ipo(account, &kohli(), &event, 2)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    let window = h.engine.ipo_details(&kohli()).await.unwrap().unwrap();
    assert_eq!(window.sold_units, 0);
    assert_eq!(window.available_units, 100);
    assert_eq!(h.engine.balance(account).await.unwrap(), dec!(1000));
    assert!(h.engine.audit().await.is_clean());
}

#[tokio::test]
async fn ipo_windows_follow_the_clock_and_status() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 1000).await;
    let event = EventId::new("M1");
    let terms = IpoTerms {
        event_id: event.clone(),
        base_price: dec!(500),
        max_price: dec!(600),
        units: 50,
        opens_at: start() + Duration::hours(1),
        closes_at: start() + Duration::hours(3),
    };
    h.engine.open_ipo(&kohli(), terms.clone()).await.unwrap();
    let overlapping = IpoTerms {
        event_id: EventId::new("M2"),
        opens_at: start() + Duration::hours(2),
        closes_at: start() + Duration::hours(4),
        ..terms
    };
    assert_eq!(
        h.engine.open_ipo(&kohli(), overlapping).await.unwrap_err().kind(),
        ErrorKind::InvalidWindow
    );

    let account = funded(&h.engine, dec!(10000)).await;
    let err = h
        .engine
        .participate_in_ipo(account, &kohli(), &event, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoActiveWindow);

    h.clock.advance(Duration::minutes(90));
    h.engine
        .set_trading_status(&kohli(), TradingStatus::Delisted)
        .await
        .unwrap();
    let err = h
        .engine
        .participate_in_ipo(account, &kohli(), &event, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TradingSuspended);
}

#[tokio::test]
async fn cancelled_ipo_refuses_subscriptions() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(1000), 1000).await;
    let event = EventId::new("M1");
    h.engine
        .open_ipo(
            &kohli(),
            IpoTerms {
                event_id: event.clone(),
                base_price: dec!(500),
                max_price: dec!(500),
                units: 50,
                opens_at: start(),
                closes_at: start() + Duration::hours(1),
            },
        )
        .await
        .unwrap();
    h.engine.cancel_ipo(&kohli(), &event).await.unwrap();

    let account = funded(&h.engine, dec!(10000)).await;
    let err = h
        .engine
        .participate_in_ipo(account, &kohli(), &event, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoActiveWindow);
    assert!(h.engine.ipo_details(&kohli()).await.unwrap().is_none());
}

#[tokio::test]
async fn withdrawal_to_unverified_destination_is_rejected() {
    let h = harness();
    let account = funded(&h.engine, dec!(5000)).await;
    h.engine
        .register_payout_destination(
            account,
            BankDetails {
                account_holder: "A. Holder".into(),
                account_number: "50100012345".into(),
                ifsc_code: "HDFC0000123".into(),
                bank_name: "HDFC Bank".into(),
            },
        )
        .await
        .unwrap();

    let err = h
        .engine
        .withdraw(account, dec!(1000), "50100012345")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnverifiedDestination);
    assert_eq!(h.engine.balance(account).await.unwrap(), dec!(5000));
    assert_eq!(
        h.engine
            .transactions(account, &TransactionFilter::default())
            .await
            .unwrap()
            .total,
        1
    );

    h.engine
        .verify_payout_destination(account, "50100012345")
        .await
        .unwrap();
    let (request, txn) = h
        .engine
        .withdraw(account, dec!(1000), "50100012345")
        .await
        .unwrap();
    assert_eq!(txn.status, TransactionStatus::Pending);
    assert_eq!(h.engine.balance(account).await.unwrap(), dec!(5000));

    h.engine
        .process_withdrawal_request(account, request.id, WithdrawalDecision::Approve, None)
        .await
        .unwrap();
    assert_eq!(h.engine.balance(account).await.unwrap(), dec!(4000));
    assert!(
        h.engine
            .withdrawal_requests(account, Some(WithdrawalStatus::Pending))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn settling_a_pending_withdrawal_directly() {
    let h = harness();
    let account = funded(&h.engine, dec!(5000)).await;
    h.engine
        .register_payout_destination(
            account,
            BankDetails {
                account_holder: "A. Holder".into(),
                account_number: "1".into(),
                ifsc_code: "X".into(),
                bank_name: "Y".into(),
            },
        )
        .await
        .unwrap();
    h.engine.verify_payout_destination(account, "1").await.unwrap();
    let (_, txn) = h.engine.withdraw(account, dec!(500), "1").await.unwrap();

    h.clock.advance(Duration::hours(1));
    let settled = h
        .engine
        .settle_transaction(account, txn.id, TransactionStatus::Failed)
        .await
        .unwrap();
    assert_eq!(settled.status, TransactionStatus::Failed);
    assert_eq!(
        h.engine
            .withdrawal_requests(account, Some(WithdrawalStatus::Rejected))
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        h.engine.balance_as_of(account, start()).await.unwrap(),
        dec!(5000)
    );
}

#[tokio::test]
async fn portfolio_summary_values_holdings_at_market() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(100), 1000).await;
    list(&h.engine, &InstrumentId::new("JBUMRAH"), dec!(50), 1000).await;
    let account = funded(&h.engine, dec!(1000)).await;
    h.engine.buy(account, &kohli(), 2).await.unwrap();
    h.engine
        .buy(account, &InstrumentId::new("JBUMRAH"), 4)
        .await
        .unwrap();
    h.engine
        .apply_match_event(&MatchEvent {
            event_id: EventId::new("M1"),
            instrument_id: kohli(),
            stats: PerformanceStats {
                catches: 10,
                ..Default::default()
            },
        })
        .await
        .unwrap();

    let summary = h.engine.portfolio_summary(account).await.unwrap();
    assert_eq!(summary.cash_balance, dec!(600));
    assert_eq!(summary.valuation.market_value, dec!(420));
    assert_eq!(summary.valuation.unrealized_pnl, dec!(20));
    assert_eq!(summary.total_value, dec!(1020));
}

#[tokio::test]
async fn instrument_listing_and_filters() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(100), 1000).await;
    list(&h.engine, &InstrumentId::new("JBUMRAH"), dec!(50), 1000).await;

    let err = h
        .engine
        .list_instrument(NewInstrument {
            id: kohli(),
            name: "dup".into(),
            performer_id: "dup".into(),
            initial_price: dec!(1),
            total_supply: 1,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Duplicate);

    h.engine
        .set_trading_status(&kohli(), TradingStatus::Suspended)
        .await
        .unwrap();
    let active = h
        .engine
        .list_instruments(&InstrumentFilter {
            status: Some(TradingStatus::Active),
            ..Default::default()
        })
        .await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id.as_str(), "JBUMRAH");

    let by_name = h
        .engine
        .list_instruments(&InstrumentFilter {
            name_contains: Some("vkoh".into()),
            ..Default::default()
        })
        .await;
    assert_eq!(by_name.len(), 1);
    assert_eq!(h.engine.list_instruments(&InstrumentFilter::default()).await.len(), 2);
}

#[tokio::test]
async fn unknown_accounts_and_instruments_are_not_found() {
    let h = harness();
    list(&h.engine, &kohli(), dec!(100), 1000).await;
    let stranger = AccountId::new();

    assert_eq!(
        h.engine.buy(stranger, &kohli(), 1).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    let account = funded(&h.engine, dec!(1000)).await;
    assert_eq!(
        h.engine
            .buy(account, &InstrumentId::new("NOPE"), 1)
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        h.engine.register_account(account).await.unwrap_err().kind(),
        ErrorKind::Duplicate
    );
}

#[tokio::test]
async fn inconsistent_trading_limits_are_a_configuration_error() {
    let mut config = Config::default();
    config.trading.min_quantity_per_trade = 50;
    config.trading.max_quantity_per_trade = 10;
    let err = TradingEngine::new(
        config,
        Arc::new(ManualClock::new(start())),
        Arc::new(RecordingSink::default()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, EngineError::Configuration(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
