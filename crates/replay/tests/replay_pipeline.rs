use async_trait::async_trait;
use config_crate::RoutingPolicy;
use models::{Protocol, QuoteAmount, RouteQuery, RouteResult};
use parking_lot::Mutex;
use replay::{
    pipeline::{pair_settings_for_inputs, run_dataset, PairSettings},
    ChainDataClient, ReplayEngine, ReplayError, RouteOracle,
};
use models::ComparisonOutcome;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const UNI: &str = "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984";
const AAVE: &str = "0x7fc66500c84a76ad7e9c93437bfc5ac33e2ddae9";
const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
const BOND: &str = "0x0391d2021f89dc339f60fff84546ea23e337750f";
const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";

/// tx_hash -> 区块号，未登记的交易返回 ChainLookup
struct StubChain {
    blocks: HashMap<String, u64>,
    head_lookups: Arc<AtomicUsize>,
}

#[async_trait]
impl ChainDataClient for StubChain {
    async fn block_number_for_tx(&self, tx_hash: &str) -> Result<u64, ReplayError> {
        self.blocks
            .get(tx_hash)
            .copied()
            .ok_or_else(|| ReplayError::ChainLookup {
                tx_hash: tx_hash.to_string(),
                reason: "receipt not found".to_string(),
            })
    }

    async fn current_block_number(&self) -> Result<u64, ReplayError> {
        self.head_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(16_000_000)
    }
}

#[derive(Clone)]
enum StubQuote {
    Quote(&'static str),
    NoRoute,
    ServiceError,
}

/// 区块号 -> (普通报价, 混合报价)，并记录所有查询
struct StubOracle {
    quotes: HashMap<u64, (StubQuote, StubQuote)>,
    queries: Mutex<Vec<RouteQuery>>,
}

impl StubOracle {
    fn new(quotes: Vec<(u64, StubQuote, StubQuote)>) -> Self {
        Self {
            quotes: quotes
                .into_iter()
                .map(|(block, baseline, mixed)| (block, (baseline, mixed)))
                .collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<RouteQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl RouteOracle for StubOracle {
    async fn route(&self, query: &RouteQuery) -> Result<Option<RouteResult>, ReplayError> {
        self.queries.lock().push(query.clone());

        let (baseline, mixed) = self
            .quotes
            .get(&query.block_number)
            .cloned()
            .unwrap_or((StubQuote::NoRoute, StubQuote::NoRoute));
        let quote = if query.allows(Protocol::Mixed) { mixed } else { baseline };

        match quote {
            StubQuote::Quote(amount) => Ok(Some(RouteResult::new(
                QuoteAmount::from_exact(amount, query.token_out.decimals).unwrap(),
                format!("stub route @{}", query.block_number),
            ))),
            StubQuote::NoRoute => Ok(None),
            StubQuote::ServiceError => Err(ReplayError::Oracle("503 Service Unavailable".to_string())),
        }
    }
}

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("replay-test-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// 以 `\x` 前缀写出数据集，与导出数据一致
///
/// 数量超出 u64，不能经过 `serde_json::Value`，直接拼接 JSON 文本。
fn record(token_a: &str, token_b: &str, tx_hash: &str) -> String {
    let escape = |s: &str| s.replacen("0x", "\\\\x", 1);
    format!(
        r#"{{"data": {{"token_a_address": "{}", "token_a_amount_raw": 250000000000000000000, "token_b_address": "{}", "token_b_amount_raw": 3100000000000000000, "usd_amount": 1523.75, "tx_hash": "{}"}}}}"#,
        escape(token_a),
        escape(token_b),
        escape(tx_hash)
    )
}

fn write_dataset(dir: &Path, records: &[String]) -> PathBuf {
    write_named_dataset(dir, "uni-aave-100.json", records)
}

fn write_named_dataset(dir: &Path, name: &str, records: &[String]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("[{}]", records.join(","))).unwrap();
    path
}

fn pair_settings() -> PairSettings {
    PairSettings {
        symbol_a: "UNI".to_string(),
        symbol_b: "AAVE".to_string(),
        ..PairSettings::default()
    }
}

fn engine(chain: StubChain, oracle: Arc<StubOracle>) -> ReplayEngine {
    ReplayEngine::new(Arc::new(chain), oracle, RoutingPolicy::default())
}

fn chain(entries: &[(&str, u64)]) -> StubChain {
    StubChain {
        blocks: entries.iter().map(|(tx, b)| (tx.to_string(), *b)).collect(),
        head_lookups: Arc::new(AtomicUsize::new(0)),
    }
}

fn read_output(path: &Path) -> Vec<Value> {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_three_trade_scenario() {
    let dir = temp_dir();
    let input = write_dataset(
        &dir,
        &[
            record(UNI, AAVE, "0x01"),
            record(UNI, AAVE, "0x02"),
            record(UNI, AAVE, "0x03"),
        ],
    );
    let output = dir.join("results").join("out.json");

    let oracle = Arc::new(StubOracle::new(vec![
        (15_000_001, StubQuote::Quote("100"), StubQuote::Quote("110")),
        (15_000_002, StubQuote::Quote("90"), StubQuote::Quote("90")),
    ]));
    let engine = engine(chain(&[("0x01", 15_000_001), ("0x02", 15_000_002)]), oracle.clone());

    let run = run_dataset(&engine, &input, &output, &pair_settings(), false).await.unwrap();

    assert_eq!(run.outcomes.len(), 1);
    assert_eq!(run.outcomes[0].delta, "10");
    assert_eq!(run.outcomes[0].data.tx_hash, "0x01");
    assert_eq!(run.stats.total_records, 3);
    assert_eq!(run.stats.improved, 1);
    assert_eq!(run.stats.not_better, 1);
    assert_eq!(run.stats.chain_lookup_failures, 1);

    let written = read_output(&output);
    assert_eq!(written.len(), 1);
    assert_eq!(written[0]["mixedRouteQuote"], "110");
    assert_eq!(written[0]["oldQuote"], "100");
    assert_eq!(written[0]["delta"], "10");
    assert_eq!(written[0]["data"]["token_a_address"], UNI);
    assert_eq!(written[0]["data"]["tx_hash"], "0x01");

    let typed: Vec<ComparisonOutcome> =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(typed[0].data.token_a_amount_raw, 250_000_000_000_000_000_000);
    assert_eq!(typed[0].data.token_b_amount_raw, 3_100_000_000_000_000_000);

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_both_queries_pinned_to_same_block() {
    let dir = temp_dir();
    let input = write_dataset(&dir, &[record(UNI, AAVE, "0x01"), record(UNI, AAVE, "0x02")]);
    let output = dir.join("out.json");

    let oracle = Arc::new(StubOracle::new(vec![
        (15_000_001, StubQuote::Quote("100"), StubQuote::Quote("101")),
        (15_000_777, StubQuote::Quote("5"), StubQuote::Quote("4")),
    ]));
    let engine = engine(chain(&[("0x01", 15_000_001), ("0x02", 15_000_777)]), oracle.clone());

    run_dataset(&engine, &input, &output, &pair_settings(), false).await.unwrap();

    let queries = oracle.queries();
    assert_eq!(queries.len(), 4);
    for pair in queries.chunks(2) {
        let (baseline, mixed) = (&pair[0], &pair[1]);
        assert_eq!(baseline.block_number, mixed.block_number);
        assert_eq!(baseline.amount_in, mixed.amount_in);
        assert_eq!(baseline.token_out, mixed.token_out);

        assert_eq!(baseline.protocols, vec![Protocol::V2, Protocol::V3]);
        assert!(!baseline.force_mixed_routes);
        assert_eq!(mixed.protocols, vec![Protocol::V2, Protocol::V3, Protocol::Mixed]);
        assert!(mixed.force_mixed_routes);
    }
    assert_eq!(queries[0].block_number, 15_000_001);
    assert_eq!(queries[2].block_number, 15_000_777);
    assert_eq!(queries[0].amount_in.raw, 250_000_000_000_000_000_000);

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_empty_dataset_writes_empty_array() {
    let dir = temp_dir();
    let input = write_dataset(&dir, &[]);
    let output = dir.join("out.json");

    let oracle = Arc::new(StubOracle::new(Vec::new()));
    let stub_chain = chain(&[]);
    let head_lookups = stub_chain.head_lookups.clone();
    let engine = engine(stub_chain, oracle.clone());

    let run = run_dataset(&engine, &input, &output, &pair_settings(), false).await.unwrap();

    assert!(run.outcomes.is_empty());
    assert_eq!(run.stats.total_records, 0);
    assert_eq!(run.stats.improved, 0);
    assert_eq!(run.stats.pair, "-");
    assert_eq!(head_lookups.load(Ordering::SeqCst), 1);
    assert!(read_output(&output).is_empty());
    assert!(oracle.queries().is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_missing_mixed_routes_yield_empty_result() {
    let dir = temp_dir();
    let input = write_dataset(&dir, &[record(UNI, AAVE, "0x01"), record(UNI, AAVE, "0x02")]);
    let output = dir.join("out.json");

    let oracle = Arc::new(StubOracle::new(vec![
        (1, StubQuote::Quote("100"), StubQuote::NoRoute),
        (2, StubQuote::Quote("1"), StubQuote::NoRoute),
    ]));
    let engine = engine(chain(&[("0x01", 1), ("0x02", 2)]), oracle.clone());

    let run = run_dataset(&engine, &input, &output, &pair_settings(), false).await.unwrap();

    assert!(run.outcomes.is_empty());
    assert_eq!(run.stats.no_mixed_route, 2);
    assert!(read_output(&output).is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_missing_baseline_skips_mixed_query() {
    let dir = temp_dir();
    let input = write_dataset(&dir, &[record(UNI, AAVE, "0x01")]);
    let output = dir.join("out.json");

    let oracle = Arc::new(StubOracle::new(vec![(1, StubQuote::NoRoute, StubQuote::Quote("100"))]));
    let engine = engine(chain(&[("0x01", 1)]), oracle.clone());

    let run = run_dataset(&engine, &input, &output, &pair_settings(), false).await.unwrap();

    assert!(run.outcomes.is_empty());
    assert_eq!(run.stats.no_baseline_route, 1);
    assert_eq!(oracle.queries().len(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_results_follow_input_order() {
    let dir = temp_dir();
    let hashes = ["0x05", "0x01", "0x04", "0x02", "0x03"];
    let records: Vec<String> = hashes.iter().map(|h| record(UNI, AAVE, h)).collect();
    let input = write_dataset(&dir, &records);
    let output = dir.join("out.json");

    let oracle = Arc::new(StubOracle::new(vec![
        (5, StubQuote::Quote("1"), StubQuote::Quote("2")),
        (1, StubQuote::Quote("1"), StubQuote::Quote("500")),
        (4, StubQuote::Quote("3"), StubQuote::Quote("1")),
        (2, StubQuote::Quote("1"), StubQuote::Quote("1.5")),
        (3, StubQuote::Quote("2"), StubQuote::Quote("2")),
    ]));
    let engine = engine(
        chain(&[("0x05", 5), ("0x01", 1), ("0x04", 4), ("0x02", 2), ("0x03", 3)]),
        oracle,
    );

    let run = run_dataset(&engine, &input, &output, &pair_settings(), false).await.unwrap();

    let order: Vec<_> = run.outcomes.iter().map(|o| o.data.tx_hash.as_str()).collect();
    assert_eq!(order, vec!["0x05", "0x01", "0x02"]);
    let deltas: Vec<_> = run.outcomes.iter().map(|o| o.delta.as_str()).collect();
    assert_eq!(deltas, vec!["1", "499", "0.5"]);
    assert_eq!(run.stats.total_gain.unwrap().to_exact(), "500.5");

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_rerun_is_deterministic() {
    let dir = temp_dir();
    let input = write_dataset(
        &dir,
        &[record(UNI, AAVE, "0x01"), record(UNI, AAVE, "0x02"), record(UNI, AAVE, "0x09")],
    );

    let quotes = || {
        vec![
            (1, StubQuote::Quote("100"), StubQuote::Quote("110")),
            (2, StubQuote::Quote("7"), StubQuote::Quote("7.25")),
        ]
    };

    let first_out = dir.join("first.json");
    let first = run_dataset(
        &engine(chain(&[("0x01", 1), ("0x02", 2)]), Arc::new(StubOracle::new(quotes()))),
        &input,
        &first_out,
        &pair_settings(),
        false,
    )
    .await
    .unwrap();

    let second_out = dir.join("second.json");
    let second = run_dataset(
        &engine(chain(&[("0x01", 1), ("0x02", 2)]), Arc::new(StubOracle::new(quotes()))),
        &input,
        &second_out,
        &pair_settings(),
        false,
    )
    .await
    .unwrap();

    assert_eq!(first.outcomes, second.outcomes);
    assert_eq!(first.stats, second.stats);
    assert_eq!(
        fs::read_to_string(&first_out).unwrap(),
        fs::read_to_string(&second_out).unwrap()
    );

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_service_error_halts_run() {
    let dir = temp_dir();
    let input = write_dataset(&dir, &[record(UNI, AAVE, "0x01"), record(UNI, AAVE, "0x02")]);
    let output = dir.join("out.json");

    let oracle = Arc::new(StubOracle::new(vec![
        (1, StubQuote::Quote("100"), StubQuote::Quote("110")),
        (2, StubQuote::ServiceError, StubQuote::Quote("1")),
    ]));
    let engine = engine(chain(&[("0x01", 1), ("0x02", 2)]), oracle);

    let err = run_dataset(&engine, &input, &output, &pair_settings(), false).await.unwrap_err();

    assert!(matches!(err, ReplayError::Oracle(_)));
    assert!(!output.exists());

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_malformed_dataset_is_fatal() {
    let dir = temp_dir();
    let input = dir.join("broken.json");
    fs::write(&input, r#"[{"data": {"token_a_address": "\\x01"}}]"#).unwrap();
    let output = dir.join("out.json");

    let oracle = Arc::new(StubOracle::new(Vec::new()));
    let engine = engine(chain(&[]), oracle.clone());

    let err = run_dataset(&engine, &input, &output, &pair_settings(), false).await.unwrap_err();

    assert!(matches!(err, ReplayError::MalformedInput { .. }));
    assert!(!output.exists());
    assert!(oracle.queries().is_empty());

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_records_outside_pair_are_skipped() {
    let dir = temp_dir();
    let input = write_dataset(
        &dir,
        &[
            record(UNI, AAVE, "0x01"),
            record(UNI, WETH, "0x02"),
            record(AAVE, UNI, "0x03"),
        ],
    );
    let output = dir.join("out.json");

    let oracle = Arc::new(StubOracle::new(vec![
        (1, StubQuote::Quote("1"), StubQuote::Quote("2")),
        (2, StubQuote::Quote("1"), StubQuote::Quote("2")),
        (3, StubQuote::Quote("1"), StubQuote::Quote("2")),
    ]));
    let engine = engine(chain(&[("0x01", 1), ("0x02", 2), ("0x03", 3)]), oracle.clone());

    let run = run_dataset(&engine, &input, &output, &pair_settings(), false).await.unwrap();

    assert_eq!(run.outcomes.len(), 1);
    assert_eq!(run.stats.pair_mismatches, 2);
    assert_eq!(oracle.queries().len(), 2);

    fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_each_dataset_uses_its_own_pair() {
    let dir = temp_dir();
    let uni_aave = write_named_dataset(&dir, "uni-aave-100.json", &[record(UNI, AAVE, "0x01")]);
    let bond_usdc = write_named_dataset(&dir, "bond-usdc-100.json", &[record(BOND, USDC, "0x02")]);

    let pairs = pair_settings_for_inputs(
        2,
        vec!["UNI:18,AAVE:18".parse().unwrap(), "BOND:18,USDC:6".parse().unwrap()],
        None,
    )
    .unwrap();

    let oracle = Arc::new(StubOracle::new(vec![
        (1, StubQuote::Quote("100"), StubQuote::Quote("110")),
        (2, StubQuote::Quote("2500.25"), StubQuote::Quote("2500.750001")),
    ]));
    let engine = engine(chain(&[("0x01", 1), ("0x02", 2)]), oracle.clone());

    let mut runs = Vec::new();
    for (input, settings) in [uni_aave, bond_usdc].iter().zip(&pairs) {
        let output = dir.join(format!("{}-out.json", settings.symbol_a));
        let run = run_dataset(&engine, input, &output, settings, false).await.unwrap();
        assert_eq!(read_output(&output).len(), 1);
        runs.push(run);
    }

    assert_eq!(runs[0].stats.pair, "UNI/AAVE");
    assert_eq!(runs[0].outcomes[0].delta, "10");
    assert_eq!(runs[1].stats.pair, "BOND/USDC");
    assert_eq!(runs[1].outcomes[0].old_quote, "2500.25");
    assert_eq!(runs[1].outcomes[0].delta, "0.500001");
    assert_eq!(runs[1].outcomes[0].data.token_b_address, USDC);

    let queries = oracle.queries();
    assert_eq!(queries.len(), 4);
    assert_eq!(queries[0].token_out.decimals, 18);
    assert_eq!(queries[2].token_out.symbol, "USDC");
    assert_eq!(queries[2].token_out.decimals, 6);
    assert_eq!(queries[3].token_out.decimals, 6);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_single_pair_flags_rejected_for_several_datasets() {
    let err = pair_settings_for_inputs(2, Vec::new(), Some(pair_settings())).unwrap_err();
    assert!(matches!(err, ReplayError::InvalidPairSettings(_)));
}
