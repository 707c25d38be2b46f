use anyhow::Context;
use chrono::Duration;
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use configuration::{Config, LogFormat, init_tracing, load_config};
use core_types::{
    AccountId, EventId, InstrumentId, MatchEvent, PaymentMethod, PerformanceStats, SystemClock,
};
use engine::{AuditReport, InstrumentFilter, IpoTerms, TradingEngine};
use events::{BroadcastSink, run_relay, to_json_line};
use futures::future::join_all;
use ledger::PaymentDetails;
use market::{InstrumentSnapshot, NewInstrument, compute_impact, price_after_impact};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The main entry point for the Crease exchange core.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    // Held until exit so the file appender flushes.
    let _log_guard = init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Demo => handle_demo(config).await,
        Commands::Impact(args) => handle_impact(args),
        Commands::Replay(args) => handle_replay(args, config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// An in-memory exchange core for athlete-linked shares.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Missing files fall back to defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `logging.format`.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Overrides `logging.level` (still superseded by RUST_LOG).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session: listings, deposits, trades, an IPO and a match event.
    Demo,
    /// Print the price impact of one performer's statistics.
    Impact(ImpactArgs),
    /// List instruments from a seed file and replay match events against them.
    Replay(ReplayArgs),
}

#[derive(Parser)]
struct ImpactArgs {
    #[arg(long)]
    runs: Option<u32>,

    #[arg(long)]
    strike_rate: Option<Decimal>,

    #[arg(long)]
    wickets: Option<u32>,

    #[arg(long)]
    economy: Option<Decimal>,

    #[arg(long, default_value_t = 0)]
    catches: u32,

    #[arg(long, default_value_t = 0)]
    runouts: u32,

    #[arg(long, default_value_t = 0)]
    stumpings: u32,

    /// The price the impact is applied to.
    #[arg(long, default_value = "100")]
    base_price: Decimal,
}

#[derive(Parser)]
struct ReplayArgs {
    /// TOML file with an `[[instruments]]` array to list before replaying.
    #[arg(long)]
    seed: PathBuf,

    /// JSON array of match events.
    #[arg(long)]
    events: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    instruments: Vec<NewInstrument>,
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_demo(config: Config) -> anyhow::Result<()> {
    let sink = Arc::new(BroadcastSink::new(config.notifications.channel_capacity));
    let relay = tokio::spawn(run_relay(sink.subscribe(), |event| {
        let line = to_json_line(event)?;
        tracing::info!(target: "crease::notifications", "{}", line);
        Ok(())
    }));

    let engine = Arc::new(TradingEngine::new(
        config,
        Arc::new(SystemClock),
        sink.clone(),
    )?);

    for (id, name, price, supply) in [
        ("VKOHLI", "Virat Kohli", dec!(1050), 10_000),
        ("JBUMRAH", "Jasprit Bumrah", dec!(820), 8_000),
        ("RJADEJA", "Ravindra Jadeja", dec!(500), 5_000),
    ] {
        engine
            .list_instrument(NewInstrument {
                id: InstrumentId::new(id),
                name: name.to_string(),
                performer_id: id.to_lowercase(),
                initial_price: price,
                total_supply: supply,
            })
            .await?;
    }

    // --- Secondary trading ---
    let trader = open_funded_account(&engine, dec!(40000)).await?;
    let kohli = InstrumentId::new("VKOHLI");
    let bumrah = InstrumentId::new("JBUMRAH");
    engine.buy(trader, &kohli, 20).await?;
    engine.buy(trader, &bumrah, 15).await?;
    let sale = engine.sell(trader, &kohli, 5).await?;
    println!(
        "Sold 5 {} at {} (realized P&L {}).",
        sale.instrument_id,
        sale.unit_price,
        sale.realized_pnl.unwrap_or_default()
    );

    // --- IPO with competing subscribers ---
    let jadeja = InstrumentId::new("RJADEJA");
    let event_id = EventId::new("IPL-2026-M14");
    let now = engine.now();
    engine
        .open_ipo(
            &jadeja,
            IpoTerms {
                event_id: event_id.clone(),
                base_price: dec!(480),
                max_price: dec!(520),
                units: 100,
                opens_at: now - Duration::minutes(1),
                closes_at: now + Duration::hours(2),
            },
        )
        .await?;

    let mut subscribers = Vec::new();
    for _ in 0..5 {
        subscribers.push(open_funded_account(&engine, dec!(20000)).await?);
    }
    let tasks: Vec<_> = subscribers
        .into_iter()
        .map(|account| {
            let engine = Arc::clone(&engine);
            let jadeja = jadeja.clone();
            let event_id = event_id.clone();
            tokio::spawn(async move {
                engine
                    .participate_in_ipo(account, &jadeja, &event_id, 40)
                    .await
            })
        })
        .collect();

    let mut filled = 0;
    for result in join_all(tasks).await {
        match result? {
            Ok(_) => filled += 1,
            Err(e) => println!("IPO request rejected: {}", e),
        }
    }
    println!("{} of 5 IPO requests filled.", filled);
    if let Some(window) = engine.ipo_details(&jadeja).await? {
        println!(
            "Window {}: {} sold, {} available.",
            window.event_id, window.sold_units, window.available_units
        );
    }

    // --- Match result ---
    engine
        .apply_match_event(&MatchEvent {
            event_id: event_id.clone(),
            instrument_id: jadeja.clone(),
            stats: PerformanceStats {
                runs: Some(45),
                strike_rate: Some(dec!(140)),
                wickets: Some(3),
                economy: Some(dec!(5.5)),
                catches: 1,
                ..Default::default()
            },
        })
        .await?;

    print_instruments(&engine.list_instruments(&InstrumentFilter::default()).await);
    print_portfolio(&engine, trader).await?;
    print_audit(&engine.audit().await);

    // Closing the channel lets the relay drain and exit.
    drop(engine);
    drop(sink);
    let delivered = relay.await?;
    println!("{} notifications delivered.", delivered);
    Ok(())
}

fn handle_impact(args: ImpactArgs) -> anyhow::Result<()> {
    let stats = PerformanceStats {
        runs: args.runs,
        strike_rate: args.strike_rate,
        wickets: args.wickets,
        economy: args.economy,
        catches: args.catches,
        runouts: args.runouts,
        stumpings: args.stumpings,
        ..Default::default()
    };
    stats.validate()?;

    let breakdown = compute_impact(&stats);
    let mut table = new_table(vec!["Component", "Impact %"]);
    table.add_row(vec!["Batting".to_string(), breakdown.batting.to_string()]);
    table.add_row(vec!["Bowling".to_string(), breakdown.bowling.to_string()]);
    table.add_row(vec!["Fielding".to_string(), breakdown.fielding.to_string()]);
    table.add_row(vec!["Total (clamped)".to_string(), breakdown.total.to_string()]);
    println!("{table}");
    println!(
        "{} -> {}",
        args.base_price,
        price_after_impact(args.base_price, breakdown.total)
    );
    Ok(())
}

async fn handle_replay(args: ReplayArgs, config: Config) -> anyhow::Result<()> {
    let seed = read_seed(&args.seed)?;
    let raw = std::fs::read_to_string(&args.events)
        .with_context(|| format!("failed to read {}", args.events.display()))?;
    let match_events: Vec<MatchEvent> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse match events in {}", args.events.display()))?;

    let sink = Arc::new(BroadcastSink::new(config.notifications.channel_capacity));
    let engine = TradingEngine::new(config, Arc::new(SystemClock), sink)?;
    for params in seed.instruments {
        engine.list_instrument(params).await?;
    }

    let mut failed = 0;
    for event in &match_events {
        if let Err(e) = engine.apply_match_event(event).await {
            failed += 1;
            tracing::warn!(event = %event.event_id, instrument = %event.instrument_id, error = %e, "Match event skipped.");
        }
    }
    println!(
        "Replayed {} match events ({} skipped).",
        match_events.len() - failed,
        failed
    );
    print_instruments(&engine.list_instruments(&InstrumentFilter::default()).await);
    Ok(())
}

// ==============================================================================
// Helpers
// ==============================================================================

async fn open_funded_account(engine: &TradingEngine, amount: Decimal) -> anyhow::Result<AccountId> {
    let account = engine.open_account().await?;
    engine
        .deposit(
            account,
            amount,
            PaymentDetails {
                payment_id: format!("pay_{}", uuid::Uuid::new_v4().simple()),
                method: PaymentMethod::Upi,
            },
        )
        .await?;
    Ok(account)
}

fn read_seed(path: &Path) -> anyhow::Result<SeedFile> {
    let seed = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .and_then(|c| c.try_deserialize::<SeedFile>())
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    Ok(seed)
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_instruments(snapshots: &[InstrumentSnapshot]) {
    let mut table = new_table(vec![
        "Instrument", "Name", "Price", "Previous", "Day %", "Circulating", "Market Cap", "Status",
    ]);
    for s in snapshots {
        table.add_row(vec![
            s.id.to_string(),
            s.name.clone(),
            s.current_price.to_string(),
            s.previous_price.to_string(),
            s.performance.daily.to_string(),
            format!("{}/{}", s.circulating_supply, s.total_supply),
            s.market_cap.to_string(),
            format!("{:?}", s.status),
        ]);
    }
    println!("{table}");
}

async fn print_portfolio(engine: &TradingEngine, account: AccountId) -> anyhow::Result<()> {
    let summary = engine.portfolio_summary(account).await?;
    let mut table = new_table(vec!["Instrument", "Qty", "Avg Cost", "Price", "Value", "Unrealized"]);
    for p in &summary.valuation.positions {
        table.add_row(vec![
            p.instrument_id.to_string(),
            p.quantity.to_string(),
            p.average_cost.round_dp(2).to_string(),
            p.price.to_string(),
            p.market_value.round_dp(2).to_string(),
            p.unrealized_pnl.round_dp(2).to_string(),
        ]);
    }
    println!("Account {}", summary.account_id);
    println!("{table}");
    println!(
        "Cash {} + holdings {} = {}",
        summary.cash_balance,
        summary.valuation.market_value.round_dp(2),
        summary.total_value.round_dp(2)
    );
    Ok(())
}

fn print_audit(report: &AuditReport) {
    if report.is_clean() {
        println!(
            "Audit clean: {} accounts, {} instruments.",
            report.accounts_checked, report.instruments_checked
        );
        return;
    }
    for discrepancy in &report.discrepancies {
        eprintln!("Audit discrepancy: {:?}", discrepancy);
    }
}
