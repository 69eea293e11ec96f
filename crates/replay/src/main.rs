//! 混合路由历史回放工具
//!
//! 使用方法:
//!   # 回放数据集
//!   cargo run -p replay -- run --input data/uni-aave-100.json --symbol-a UNI --symbol-b AAVE
//!
//!   # 多个数据集 (--pair 按顺序对应 --input，结果输出到 results/<name>-results.json)
//!   cargo run -p replay -- run -i data/uni-aave-100.json --pair UNI:18,AAVE:18 \
//!       -i data/bond-weth-100.json --pair BOND:18,WETH:18
//!
//!   # 查看清洗后的数据
//!   cargo run -p replay -- show --input data/uni-aave-100.json

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use config_crate::{log_dir_from_env, ReplayConfig, RoutingPolicy};
use replay::{
    dataset::load_trades,
    pipeline::{default_output_path, pair_settings_for_inputs, run_dataset, PairSettings},
    EthersChainClient, ReplayEngine, RoutingApiClient,
};
use utils::LoggerManager;

#[derive(Parser)]
#[command(name = "replay")]
#[command(about = "混合路由历史回放工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 回放数据集并比较普通路由与混合路由报价
    Run {
        /// 数据集文件 (可重复)
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// 结果文件 (仅单个数据集时可用，默认 results/<name>-results.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 交易对 SYM_A[:DEC_A],SYM_B[:DEC_B] (可重复，按顺序对应 --input)
        #[arg(long, value_parser = clap::value_parser!(PairSettings))]
        pair: Vec<PairSettings>,

        /// 卖出代币符号 (仅单个数据集，默认 TOKEN_A)
        #[arg(long)]
        symbol_a: Option<String>,

        /// 买入代币符号 (仅单个数据集，默认 TOKEN_B)
        #[arg(long)]
        symbol_b: Option<String>,

        /// 卖出代币精度 (仅单个数据集，默认 18)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=36))]
        decimals_a: Option<u8>,

        /// 买入代币精度 (仅单个数据集，默认 18)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=36))]
        decimals_b: Option<u8>,

        /// 不显示进度条
        #[arg(long, default_value = "false")]
        no_progress: bool,
    },

    /// 显示清洗后的交易记录
    Show {
        /// 数据集文件
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let cli = Cli::parse();

    // 初始化日志
    let _logger = LoggerManager::init(log_dir_from_env());

    match cli.command {
        Commands::Run {
            input,
            output,
            pair,
            symbol_a,
            symbol_b,
            decimals_a,
            decimals_b,
            no_progress,
        } => {
            if output.is_some() && input.len() > 1 {
                bail!("--output 只能用于单个数据集");
            }

            let single = single_pair_flags(symbol_a, symbol_b, decimals_a, decimals_b);
            let pairs = pair_settings_for_inputs(input.len(), pair, single)?;

            // 加载并校验配置
            let config = ReplayConfig::from_env()?;
            let policy = RoutingPolicy::default();
            policy.validate()?;

            let chain = Arc::new(EthersChainClient::new(&config.eth_rpc_url)?);
            let oracle = Arc::new(RoutingApiClient::new(
                &config.routing_api_url,
                config.routing_api_key.clone(),
            ));
            let engine = ReplayEngine::new(chain, oracle, policy);

            for (path, settings) in input.iter().zip(pairs) {
                let settings = PairSettings {
                    chain_id: config.chain_id,
                    ..settings
                };
                let output_path = output.clone().unwrap_or_else(|| default_output_path(path));
                info!(
                    "=== 回放数据集: {:?} ({}/{}) ===",
                    path, settings.symbol_a, settings.symbol_b
                );

                let run = run_dataset(&engine, path, &output_path, &settings, !no_progress).await?;

                println!(
                    "Found {} trades where mixed routes were better than the swaps executed on chain",
                    run.outcomes.len()
                );
                println!("{}", serde_json::to_string_pretty(&run.outcomes)?);
            }
        }

        Commands::Show { input } => {
            let trades = load_trades(&input)?;

            println!("\n=== 交易记录 ({} 笔) ===", trades.len());
            println!("{:-<150}", "");
            println!(
                "{:<68} {:<44} {:>26} {:>12}",
                "交易哈希", "卖出代币", "卖出数量", "USD"
            );
            println!("{:-<150}", "");
            for trade in &trades {
                println!(
                    "{:<68} {:<44} {:>26} {:>12.2}",
                    trade.tx_hash, trade.token_a_address, trade.token_a_amount_raw, trade.usd_amount
                );
            }
        }
    }

    Ok(())
}

/// 单独的符号/精度参数，全部未指定时返回 None
fn single_pair_flags(
    symbol_a: Option<String>,
    symbol_b: Option<String>,
    decimals_a: Option<u8>,
    decimals_b: Option<u8>,
) -> Option<PairSettings> {
    if symbol_a.is_none() && symbol_b.is_none() && decimals_a.is_none() && decimals_b.is_none() {
        return None;
    }

    let defaults = PairSettings::default();
    Some(PairSettings {
        symbol_a: symbol_a.unwrap_or(defaults.symbol_a),
        symbol_b: symbol_b.unwrap_or(defaults.symbol_b),
        decimals_a: decimals_a.unwrap_or(defaults.decimals_a),
        decimals_b: decimals_b.unwrap_or(defaults.decimals_b),
        chain_id: defaults.chain_id,
    })
}
