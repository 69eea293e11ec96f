//! 数据集回放流程
//!
//! 读取 → 清洗 → 以第一条记录确定交易对 → 逐条回放 → 输出统计 → 写出结果

use ethers::types::Address;
use indicatif::{ProgressBar, ProgressStyle};
use models::{AssetIdentity, AssetPair, ComparisonOutcome, TradeRecord, DEFAULT_DECIMALS};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::accumulator::ResultAccumulator;
use crate::dataset::load_trades;
use crate::engine::{ReplayEngine, TradeVerdict};
use crate::error::ReplayError;
use crate::report::{format_summary, write_results, ReplayStatistics};

/// 默认结果目录
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// 代币精度上限 (与命令行参数范围一致)
pub const MAX_TOKEN_DECIMALS: u8 = 36;

/// 交易对的符号和精度 (地址取自数据集第一条记录)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairSettings {
    pub symbol_a: String,
    pub symbol_b: String,
    pub decimals_a: u8,
    pub decimals_b: u8,
    pub chain_id: u64,
}

impl Default for PairSettings {
    fn default() -> Self {
        Self {
            symbol_a: "TOKEN_A".to_string(),
            symbol_b: "TOKEN_B".to_string(),
            decimals_a: DEFAULT_DECIMALS,
            decimals_b: DEFAULT_DECIMALS,
            chain_id: 1,
        }
    }
}

impl PairSettings {
    /// 用第一条记录的地址构造交易对
    pub fn resolve(&self, first: &TradeRecord) -> Result<AssetPair, ReplayError> {
        let asset_a = AssetIdentity::new(
            parse_address(&first.token_a_address)?,
            self.decimals_a,
            self.symbol_a.clone(),
            self.chain_id,
        );
        let asset_b = AssetIdentity::new(
            parse_address(&first.token_b_address)?,
            self.decimals_b,
            self.symbol_b.clone(),
            self.chain_id,
        );
        Ok(AssetPair::new(asset_a, asset_b))
    }
}

/// 解析 `UNI:18,AAVE:18`，精度可省略 (`UNI,AAVE` 使用默认 18 位)
impl FromStr for PairSettings {
    type Err = ReplayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ReplayError::InvalidPairSettings(format!("{:?}: {}", value, reason));

        let (side_a, side_b) = value
            .split_once(',')
            .ok_or_else(|| invalid("expected SYM_A[:DEC_A],SYM_B[:DEC_B]"))?;
        let (symbol_a, decimals_a) = parse_side(side_a).map_err(|reason| invalid(&reason))?;
        let (symbol_b, decimals_b) = parse_side(side_b).map_err(|reason| invalid(&reason))?;

        Ok(Self {
            symbol_a,
            symbol_b,
            decimals_a,
            decimals_b,
            ..Self::default()
        })
    }
}

fn parse_side(side: &str) -> Result<(String, u8), String> {
    let (symbol, decimals) = match side.split_once(':') {
        Some((symbol, decimals)) => {
            let decimals: u8 = decimals
                .trim()
                .parse()
                .map_err(|_| format!("invalid decimals {:?}", decimals))?;
            (symbol.trim(), decimals)
        }
        None => (side.trim(), DEFAULT_DECIMALS),
    };

    if symbol.is_empty() || symbol.contains(',') {
        return Err(format!("invalid symbol {:?}", symbol));
    }
    if decimals > MAX_TOKEN_DECIMALS {
        return Err(format!("decimals {} exceeds {}", decimals, MAX_TOKEN_DECIMALS));
    }
    Ok((symbol.to_string(), decimals))
}

/// 为每个数据集确定交易对参数
///
/// - `pairs` 非空时必须与数据集一一对应，且不能再使用单独的符号/精度参数
/// - 否则 `single` (或默认值) 用于所有数据集；单独参数只允许搭配一个数据集
pub fn pair_settings_for_inputs(
    input_count: usize,
    pairs: Vec<PairSettings>,
    single: Option<PairSettings>,
) -> Result<Vec<PairSettings>, ReplayError> {
    if !pairs.is_empty() {
        if single.is_some() {
            return Err(ReplayError::InvalidPairSettings(
                "--pair cannot be combined with --symbol-*/--decimals-*".to_string(),
            ));
        }
        if pairs.len() != input_count {
            return Err(ReplayError::InvalidPairSettings(format!(
                "{} --pair values for {} --input files",
                pairs.len(),
                input_count
            )));
        }
        return Ok(pairs);
    }

    match single {
        Some(_) if input_count > 1 => Err(ReplayError::InvalidPairSettings(
            "--symbol-*/--decimals-* apply to a single --input; use one --pair per --input".to_string(),
        )),
        single => Ok(vec![single.unwrap_or_default(); input_count]),
    }
}

fn parse_address(value: &str) -> Result<Address, ReplayError> {
    value.parse::<Address>().map_err(|e| ReplayError::InvalidAsset {
        address: value.to_string(),
        reason: e.to_string(),
    })
}

/// 记录是否属于固定的交易对
fn trade_matches_pair(trade: &TradeRecord, pair: &AssetPair) -> bool {
    match (
        trade.token_a_address.parse::<Address>(),
        trade.token_b_address.parse::<Address>(),
    ) {
        (Ok(token_in), Ok(token_out)) => pair.matches(token_in, token_out),
        _ => false,
    }
}

/// `data/uni-aave-100.json` -> `results/uni-aave-100-results.json`
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "replay".to_string());
    Path::new(DEFAULT_RESULTS_DIR).join(format!("{}-results.json", stem))
}

/// 单个数据集的回放结果
#[derive(Debug, Clone)]
pub struct DatasetRun {
    pub outcomes: Vec<ComparisonOutcome>,
    pub stats: ReplayStatistics,
}

/// 逐条回放，结果顺序与输入顺序一致
///
/// 区块查询失败的记录跳过，其余错误终止回放。
pub async fn replay_trades(
    engine: &ReplayEngine,
    trades: &[TradeRecord],
    pair: &AssetPair,
    stats: &mut ReplayStatistics,
    progress: &ProgressBar,
) -> Result<ResultAccumulator, ReplayError> {
    let mut results = ResultAccumulator::new();

    for trade in trades {
        stats.total_records += 1;

        if !trade_matches_pair(trade, pair) {
            warn!("交易对不一致 (期望 {}), 跳过交易 {:?}", pair.name(), trade);
            stats.pair_mismatches += 1;
            progress.inc(1);
            continue;
        }

        match engine.evaluate(trade, &pair.asset_a, &pair.asset_b).await {
            Ok(verdict) => {
                stats.record_verdict(&verdict);
                if let TradeVerdict::Improved { outcome, .. } = verdict {
                    info!(
                        target: utils::OUTCOME_TARGET,
                        "tx={} mixed={} old={} delta={}",
                        outcome.data.tx_hash,
                        outcome.mixed_route_quote,
                        outcome.old_quote,
                        outcome.delta
                    );
                    results.add(outcome);
                }
            }
            Err(e) if e.is_record_local() => {
                warn!("{}, 跳过交易 {:?}", e, trade);
                stats.chain_lookup_failures += 1;
            }
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        }

        progress.inc(1);
    }

    Ok(results)
}

fn progress_bar(len: u64, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} 回放交易...")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// 回放一个数据集并写出结果
pub async fn run_dataset(
    engine: &ReplayEngine,
    input: &Path,
    output: &Path,
    settings: &PairSettings,
    show_progress: bool,
) -> Result<DatasetRun, ReplayError> {
    let trades = load_trades(input)?;
    info!("已加载 {} 笔交易: {:?}", trades.len(), input);

    let dataset = input.display().to_string();

    // 仅用于日志
    match engine.current_block_number().await {
        Ok(block_number) => info!("当前区块: {}", block_number),
        Err(e) => warn!("获取当前区块失败: {}", e),
    }

    let (outcomes, stats) = match trades.first() {
        Some(first) => {
            let pair = settings.resolve(first)?;
            info!(
                "交易对: {} ({} -> {})",
                pair.name(),
                pair.asset_a.address_hex(),
                pair.asset_b.address_hex()
            );

            let mut stats = ReplayStatistics::new(&dataset, &pair.name());
            let progress = progress_bar(trades.len() as u64, show_progress);
            let results = replay_trades(engine, &trades, &pair, &mut stats, &progress).await?;
            progress.finish_and_clear();
            (results.into_inner(), stats)
        }
        None => {
            warn!("数据集为空: {:?}", input);
            (Vec::new(), ReplayStatistics::new(&dataset, "-"))
        }
    };

    info!(
        "共回放 {} 笔交易，其中 {} 笔混合路由优于链上执行时的路由",
        stats.total_records, stats.improved
    );
    info!("{}", format_summary(&stats, &utils::now_shanghai_str()));

    write_results(output, &outcomes)?;

    Ok(DatasetRun { outcomes, stats })
}
