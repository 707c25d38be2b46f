//! Invariants that must hold when many requests hit the engine at once.

use chrono::{Duration, TimeZone, Utc};
use configuration::Config;
use core_types::{
    AccountId, ErrorKind, EventId, InstrumentId, ManualClock, MatchEvent, PaymentMethod,
    PerformanceStats,
};
use engine::{IpoTerms, TradingEngine};
use events::NullSink;
use futures::future::join_all;
use ledger::PaymentDetails;
use market::NewInstrument;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn engine() -> Arc<TradingEngine> {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap(),
    ));
    Arc::new(TradingEngine::new(Config::default(), clock, Arc::new(NullSink)).unwrap())
}

async fn list(engine: &TradingEngine, id: &str, price: Decimal, supply: u64) -> InstrumentId {
    let id = InstrumentId::new(id);
    engine
        .list_instrument(NewInstrument {
            id: id.clone(),
            name: id.to_string(),
            performer_id: id.to_string(),
            initial_price: price,
            total_supply: supply,
        })
        .await
        .unwrap();
    id
}

async fn funded_accounts(engine: &TradingEngine, n: usize, amount: Decimal) -> Vec<AccountId> {
    let mut accounts = Vec::with_capacity(n);
    for _ in 0..n {
        let account = engine.open_account().await.unwrap();
        engine
            .deposit(
                account,
                amount,
                PaymentDetails {
                    payment_id: "seed".to_string(),
                    method: PaymentMethod::NetBanking,
                },
            )
            .await
            .unwrap();
        accounts.push(account);
    }
    accounts
}

async fn open_window(engine: &TradingEngine, id: &InstrumentId, event: &EventId, units: u64) {
    let now = engine.now();
    engine
        .open_ipo(
            id,
            IpoTerms {
                event_id: event.clone(),
                base_price: dec!(100),
                max_price: dec!(100),
                units,
                opens_at: now,
                closes_at: now + Duration::hours(1),
            },
        )
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_oversized_ipo_requests_get_exactly_one_fill() {
    let engine = engine();
    let id = list(&engine, "RPANT", dec!(120), 10_000).await;
    let event = EventId::new("M1");
    open_window(&engine, &id, &event, 100).await;
    let accounts = funded_accounts(&engine, 2, dec!(10000)).await;

    let handles = accounts.iter().map(|&account| {
        let engine = Arc::clone(&engine);
        let id = id.clone();
        let event = event.clone();
        tokio::spawn(async move { engine.participate_in_ipo(account, &id, &event, 60).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let filled = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(filled, 1);
    let rejected = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(rejected.kind(), ErrorKind::InsufficientSupply);

    let window = engine.ipo_details(&id).await.unwrap().unwrap();
    assert_eq!(window.sold_units, 60);
    assert_eq!(window.available_units, 40);
    assert!(engine.audit().await.is_clean());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn oversubscribed_ipo_distributes_exactly_what_fits() {
    let engine = engine();
    let id = list(&engine, "SGILL", dec!(100), 10_000).await;
    let event = EventId::new("M2");
    open_window(&engine, &id, &event, 100).await;
    let accounts = funded_accounts(&engine, 20, dec!(5000)).await;

    let handles = accounts.iter().map(|&account| {
        let engine = Arc::clone(&engine);
        let id = id.clone();
        let event = event.clone();
        tokio::spawn(async move { engine.participate_in_ipo(account, &id, &event, 7).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let filled = results.iter().filter(|r| r.is_ok()).count() as u64;
    assert_eq!(filled, 14);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| e.kind() == ErrorKind::InsufficientSupply)
    );

    let window = engine.ipo_details(&id).await.unwrap().unwrap();
    assert_eq!(window.sold_units, 98);
    assert!(window.sold_units <= window.total_units);

    let mut subscribed = 0;
    for account in &accounts {
        subscribed += engine.holding(*account, &id).await.unwrap().quantity;
    }
    assert_eq!(subscribed, 98);
    assert!(engine.audit().await.is_clean());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_buyers_never_exceed_total_supply() {
    let engine = engine();
    let id = list(&engine, "HPANDYA", dec!(10), 50).await;
    let accounts = funded_accounts(&engine, 10, dec!(1000)).await;

    let handles = accounts.iter().map(|&account| {
        let engine = Arc::clone(&engine);
        let id = id.clone();
        tokio::spawn(async move { engine.buy(account, &id, 10).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 5);
    let snapshot = engine.instrument_snapshot(&id).await.unwrap();
    assert_eq!(snapshot.circulating_supply, 50);
    assert!(engine.audit().await.is_clean());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn mixed_trading_and_match_events_conserve_cash_and_shares() {
    let engine = engine();
    let instruments = vec![
        list(&engine, "AAA", dec!(100), 100_000).await,
        list(&engine, "BBB", dec!(250.5), 100_000).await,
        list(&engine, "CCC", dec!(42.42), 100_000).await,
    ];
    let accounts = funded_accounts(&engine, 8, dec!(20000)).await;

    let mut handles = Vec::new();
    for (i, &account) in accounts.iter().enumerate() {
        let engine = Arc::clone(&engine);
        let instruments = instruments.clone();
        handles.push(tokio::spawn(async move {
            // A small deterministic walk per account.
            let mut seed = (i as u64 + 1) * 7919;
            for step in 0..40u64 {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let id = &instruments[(seed >> 33) as usize % instruments.len()];
                let quantity = 1 + (seed >> 40) % 5;
                let _ = if step % 3 == 2 {
                    engine.sell(account, id, quantity).await
                } else {
                    engine.buy(account, id, quantity).await
                };
            }
        }));
    }
    for (n, id) in instruments.iter().enumerate() {
        let engine = Arc::clone(&engine);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            for round in 0..5 {
                let event = MatchEvent {
                    event_id: EventId::new(format!("E{}-{}", n, round)),
                    instrument_id: id.clone(),
                    stats: PerformanceStats {
                        runs: Some(10 * round),
                        catches: n as u32,
                        ..Default::default()
                    },
                };
                engine.apply_match_event(&event).await.unwrap();
            }
        }));
    }
    for joined in join_all(handles).await {
        joined.unwrap();
    }

    let report = engine.audit().await;
    assert!(report.is_clean(), "{:?}", report.discrepancies);
    assert_eq!(report.accounts_checked, 8);
    assert_eq!(report.instruments_checked, 3);

    for account in &accounts {
        let balance = engine.balance(*account).await.unwrap();
        assert!(balance >= Decimal::ZERO);
        assert_eq!(
            engine.balance_as_of(*account, engine.now()).await.unwrap(),
            balance
        );
    }
}
