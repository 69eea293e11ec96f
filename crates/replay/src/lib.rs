//! 混合路由历史回放
//!
//! 功能：
//! 1. 读取并清洗链上成交数据集
//! 2. 对每笔成交在其所在区块分别请求普通路由和强制混合路由报价
//! 3. 记录混合路由报价更优的成交并输出 JSON 结果

pub mod accumulator;
pub mod chain;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod oracle;
pub mod pipeline;
pub mod report;

pub use accumulator::ResultAccumulator;
pub use chain::{ChainDataClient, EthersChainClient};
pub use engine::{ReplayEngine, RouteLeg, TradeVerdict};
pub use error::ReplayError;
pub use oracle::{RouteOracle, RoutingApiClient};
pub use pipeline::{run_dataset, DatasetRun, PairSettings};
pub use report::ReplayStatistics;
