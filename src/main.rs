//! remit-pricing CLI
//!
//! Break down and compare remittance costs from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show the provider table
//! remit-pricing providers
//!
//! # Decompose one provider's cost at a given mid rate
//! remit-pricing breakdown --provider bank --amount 100000 --rate 4.9876
//!
//! # Rank every provider using rates from a file
//! remit-pricing compare --amount 10000 --rates rates.json --regime optimized
//!
//! # Sweep send amounts and report where the ranking flips
//! remit-pricing sweep --from 100 --to 20000 --step 100 --rates rates.json
//! ```

use chrono::{DateTime, Utc};
use remit_pricing::core::currency::{CurrencyCode, CurrencyPair, FxError};
use remit_pricing::core::error::PricingError;
use remit_pricing::core::provider::ProviderId;
use remit_pricing::core::quote::{Confidence, MarketQuote, PricingMode};
use remit_pricing::core::rates::FxRateTable;
use remit_pricing::pricing::calculator::{compute_breakdown, BreakdownOptions};
use remit_pricing::pricing::comparison::{ComparisonEngine, ComparisonOptions};
use remit_pricing::pricing::model::IofRegime;
use remit_pricing::pricing::registry::ProviderRegistry;
use remit_pricing::simulation::sweep::{sweep_amounts, SweepConfig};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"remit-pricing: remittance cost decomposition and provider comparison

USAGE:
    remit-pricing [--providers <FILE>] <COMMAND> [OPTIONS]

COMMANDS:
    providers   List the provider cost models
    breakdown   Decompose one provider's cost at a given mid rate
    compare     Rank every provider for one amount
    sweep       Compare across a range of amounts
    help        Show this message

GLOBAL OPTIONS:
    --providers <FILE>  JSON provider table replacing the built-in one

OPTIONS (breakdown):
    --provider <ID>         bank, wise or coins
    --amount <N>            Amount in the sending currency
    --rate <MID>            Mid-market rate, sending -> receiving
    --regime <R>            standard (default) or optimized
    --spread <BPS>          Override the provider's FX spread
    --reference-rate <R>    Rate for fees quoted in a third currency

OPTIONS (compare):
    --amount <N>            Amount in the sending currency
    --rates <FILE>          JSON rates file
    --regime <R>            standard (default) or optimized
    --mode <M>              indicative (default, mid) or conservative (bid per leg)
    --source <CODE>         Sending currency (default: GBP)
    --destination <CODE>    Receiving currency (default: BRL)

OPTIONS (sweep):
    --from <N> --to <N> --step <N>
    --rates <FILE> --regime <R> --mode <M> --source <CODE> --destination <CODE>

All of breakdown, compare and sweep accept --format text (default) or json.

EXAMPLES:
    remit-pricing breakdown --provider bank --amount 100000 --rate 4.9876
    remit-pricing compare --amount 10000 --rates rates.json --format json
    remit-pricing --providers table.json compare --amount 500 --rates rates.json
    remit-pricing sweep --from 100 --to 20000 --step 100 --rates rates.json"#
    );
}

/// JSON schema for a rates file.
#[derive(serde::Deserialize)]
struct RatesFile {
    as_of: Option<DateTime<Utc>>,
    quotes: Vec<QuoteInput>,
}

#[derive(serde::Deserialize)]
struct QuoteInput {
    pair: CurrencyPair,
    bid: Option<Decimal>,
    ask: Option<Decimal>,
    mid: Option<Decimal>,
    confidence: Option<Confidence>,
}

/// JSON output schema for the provider table.
#[derive(serde::Serialize)]
struct ProviderOutput {
    id: String,
    name: String,
    fx_spread_bps: String,
    fee: String,
    iof: String,
    settlement_layers: u32,
}

fn fail(err: PricingError) -> ! {
    eprintln!("Error: {}", err);
    process::exit(1);
}

fn load_rates(path: &str) -> Result<FxRateTable, PricingError> {
    let content = fs::read_to_string(path)
        .map_err(|e| PricingError::Config(format!("cannot read '{}': {}", path, e)))?;
    let file: RatesFile = serde_json::from_str(&content)?;
    let as_of = file.as_of.unwrap_or_else(Utc::now);

    let mut table = FxRateTable::new().with_as_of(as_of);
    for input in file.quotes {
        let quote = if input.bid.is_some() || input.ask.is_some() {
            MarketQuote::from_sides(input.pair, input.bid, input.ask)
        } else if let Some(mid) = input.mid {
            MarketQuote::indicative(input.pair, mid)
        } else {
            return Err(PricingError::Config(format!(
                "quote for {} has neither bid/ask nor mid",
                input.pair
            )));
        };
        let quote = match input.confidence {
            Some(c) => quote.with_confidence(c),
            None => quote,
        };
        table.insert(quote.with_as_of(as_of).with_source(path));
    }
    log::debug!("loaded {} quotes from {}", table.len(), path);
    Ok(table)
}

fn load_registry(path: Option<&str>) -> ProviderRegistry {
    match path {
        None => ProviderRegistry::canonical(),
        Some(path) => {
            let content = fs::read_to_string(path).unwrap_or_else(|e| {
                eprintln!("Error reading file '{}': {}", path, e);
                process::exit(1);
            });
            ProviderRegistry::from_json(&content).unwrap_or_else(|e| fail(e))
        }
    }
}

/// Collect `--flag value` pairs, rejecting anything not in `allowed`.
fn parse_flags(args: &[String], allowed: &[&str]) -> HashMap<String, String> {
    let mut flags = HashMap::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if !allowed.contains(&flag) {
            eprintln!("Unknown option: {}", flag);
            process::exit(1);
        }
        i += 1;
        let value = args.get(i).cloned().unwrap_or_else(|| {
            eprintln!("{} requires a value", flag);
            process::exit(1);
        });
        flags.insert(flag.to_string(), value);
        i += 1;
    }
    flags
}

fn required<'a>(flags: &'a HashMap<String, String>, flag: &str) -> &'a str {
    flags.get(flag).map(String::as_str).unwrap_or_else(|| {
        eprintln!("Error: {} is required", flag);
        process::exit(1);
    })
}

fn decimal_flag(flags: &HashMap<String, String>, flag: &str) -> Option<Decimal> {
    flags.get(flag).map(|raw| {
        raw.parse().unwrap_or_else(|e| {
            eprintln!("Invalid number '{}' for {}: {}", raw, flag, e);
            process::exit(1);
        })
    })
}

fn required_decimal(flags: &HashMap<String, String>, flag: &str) -> Decimal {
    decimal_flag(flags, flag).unwrap_or_else(|| {
        eprintln!("Error: {} is required", flag);
        process::exit(1);
    })
}

fn regime_flag(flags: &HashMap<String, String>) -> Option<IofRegime> {
    flags
        .get("--regime")
        .map(|raw| raw.parse().unwrap_or_else(|e| fail(e)))
}

fn comparison_options(flags: &HashMap<String, String>) -> ComparisonOptions {
    let mut options = ComparisonOptions::default();
    if let Some(code) = flags.get("--source") {
        options.source = CurrencyCode::new(code);
    }
    if let Some(code) = flags.get("--destination") {
        options.destination = CurrencyCode::new(code);
    }
    if let Some(regime) = regime_flag(flags) {
        options = options.with_regime(regime);
    }
    if let Some(raw) = flags.get("--mode") {
        let mode: PricingMode = raw.parse().unwrap_or_else(|e: FxError| fail(e.into()));
        options = options.with_pricing_mode(mode);
    }
    options
}

fn is_json(flags: &HashMap<String, String>) -> bool {
    match flags.get("--format").map(String::as_str) {
        None | Some("text") => false,
        Some("json") => true,
        Some(other) => {
            eprintln!("--format requires 'text' or 'json', got '{}'", other);
            process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e.into()),
    }
}

fn cmd_providers(registry: &ProviderRegistry, args: &[String]) {
    let flags = parse_flags(args, &["--format"]);

    if is_json(&flags) {
        let output: Vec<ProviderOutput> = registry
            .iter()
            .map(|m| ProviderOutput {
                id: m.provider_id.to_string(),
                name: m.provider_id.display_name().to_string(),
                fx_spread_bps: m.fx_spread_bps.to_string(),
                fee: m.fee.to_string(),
                iof: m.iof.to_string(),
                settlement_layers: m.settlement_layers,
            })
            .collect();
        print_json(&output);
    } else {
        println!(
            "{:<8} {:<18} {:>8} {:>14} {:>24} {:>7}",
            "ID", "NAME", "SPREAD", "FEE", "IOF", "LAYERS"
        );
        for m in registry.iter() {
            println!(
                "{:<8} {:<18} {:>8} {:>14} {:>24} {:>7}",
                m.provider_id.as_str(),
                m.provider_id.display_name(),
                format!("{} bps", m.fx_spread_bps),
                m.fee.to_string(),
                m.iof.to_string(),
                m.settlement_layers
            );
        }
    }
}

fn cmd_breakdown(registry: &ProviderRegistry, args: &[String]) {
    let flags = parse_flags(
        args,
        &[
            "--provider",
            "--amount",
            "--rate",
            "--regime",
            "--spread",
            "--reference-rate",
            "--format",
        ],
    );

    let provider: ProviderId = required(&flags, "--provider")
        .parse()
        .unwrap_or_else(|e| fail(e));
    let model = registry.get(provider).unwrap_or_else(|e| fail(e));
    let amount = required_decimal(&flags, "--amount");
    let rate = required_decimal(&flags, "--rate");

    let mut options = BreakdownOptions::new();
    if let Some(regime) = regime_flag(&flags) {
        options = options.with_regime(regime);
    }
    if let Some(bps) = decimal_flag(&flags, "--spread") {
        options = options.with_spread_override(bps);
    }
    if let Some(reference) = decimal_flag(&flags, "--reference-rate") {
        options = options.with_reference_rate(reference);
    }

    let breakdown = compute_breakdown(amount, rate, model, &options).unwrap_or_else(|e| fail(e));

    if is_json(&flags) {
        print_json(&breakdown);
    } else {
        println!("{}", breakdown);
    }
}

fn cmd_compare(registry: &ProviderRegistry, args: &[String]) {
    let flags = parse_flags(
        args,
        &[
            "--amount",
            "--rates",
            "--regime",
            "--mode",
            "--source",
            "--destination",
            "--format",
        ],
    );

    let amount = required_decimal(&flags, "--amount");
    let rates = load_rates(required(&flags, "--rates")).unwrap_or_else(|e| fail(e));
    let options = comparison_options(&flags);

    let engine = ComparisonEngine::with_registry(registry.clone());
    let result = engine
        .compare(amount, &rates, &options)
        .unwrap_or_else(|e| fail(e));

    if is_json(&flags) {
        print_json(&result);
    } else {
        println!("{}", result);
    }
}

fn cmd_sweep(registry: &ProviderRegistry, args: &[String]) {
    let flags = parse_flags(
        args,
        &[
            "--from",
            "--to",
            "--step",
            "--rates",
            "--regime",
            "--mode",
            "--source",
            "--destination",
            "--format",
        ],
    );

    let defaults = SweepConfig::default();
    let config = SweepConfig {
        from: decimal_flag(&flags, "--from").unwrap_or(defaults.from),
        to: decimal_flag(&flags, "--to").unwrap_or(defaults.to),
        step: decimal_flag(&flags, "--step").unwrap_or(defaults.step),
    };
    let rates = load_rates(required(&flags, "--rates")).unwrap_or_else(|e| fail(e));
    let options = comparison_options(&flags);

    let engine = ComparisonEngine::with_registry(registry.clone());
    let points = sweep_amounts(&engine, &config, &rates, &options).unwrap_or_else(|e| fail(e));

    if is_json(&flags) {
        print_json(&points);
        return;
    }

    println!(
        "{:>12} {:>8} {:>16} {:>16} {:>16}",
        "AMOUNT", "BEST", "BANK", "WISE", "COINS"
    );
    let mut flips = Vec::new();
    let mut previous: Option<ProviderId> = None;
    for point in &points {
        let cell = |id: ProviderId| {
            point
                .final_amounts
                .get(&id)
                .map(|v| v.round_dp(2).to_string())
                .unwrap_or_default()
        };
        println!(
            "{:>12} {:>8} {:>16} {:>16} {:>16}",
            point.amount,
            point.best_provider_id.as_str(),
            cell(ProviderId::Bank),
            cell(ProviderId::Wise),
            cell(ProviderId::Coins)
        );
        if let Some(prev) = previous {
            if prev != point.best_provider_id {
                flips.push((point.amount, prev, point.best_provider_id));
            }
        }
        previous = Some(point.best_provider_id);
    }

    if flips.is_empty() {
        println!("\nNo ranking change across the range.");
    } else {
        println!();
        for (amount, from, to) in flips {
            println!("Best provider changes from {} to {} by {}", from, to, amount);
        }
    }
}

fn main() {
    env_logger::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let mut providers_path = None;
    if let Some(pos) = args.iter().position(|a| a == "--providers") {
        if pos + 1 >= args.len() {
            eprintln!("--providers requires a file path");
            process::exit(1);
        }
        providers_path = Some(args.remove(pos + 1));
        args.remove(pos);
    }

    if args.is_empty() {
        print_usage();
        process::exit(1);
    }

    let command = args[0].as_str();
    let rest = &args[1..];
    let registry = load_registry(providers_path.as_deref());

    match command {
        "providers" => cmd_providers(&registry, rest),
        "breakdown" => cmd_breakdown(&registry, rest),
        "compare" => cmd_compare(&registry, rest),
        "sweep" => cmd_sweep(&registry, rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
