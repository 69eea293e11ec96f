use anyhow::{bail, Context, Result};
use std::env;

mod policy;

pub use policy::*;

/// 以太坊主网 Chain ID
pub const MAINNET_CHAIN_ID: u64 = 1;

/// 默认日志目录
pub const DEFAULT_LOG_DIR: &str = "logs";

/// 回放工具配置
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// 以太坊 RPC URL (用于查询交易所在区块)
    pub eth_rpc_url: String,
    /// 路由报价服务地址
    pub routing_api_url: String,
    /// 路由报价服务 API Key (可选)
    pub routing_api_key: Option<String>,
    pub chain_id: u64,
}

impl ReplayConfig {
    /// 从 .env 和环境变量加载配置
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 通过给定的查找函数加载配置，并在启动时校验
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // ETH_RPC_URL 优先，其次使用 INFURA_KEY 拼接主网地址
        let eth_rpc_url = match (var("ETH_RPC_URL"), var("INFURA_KEY")) {
            (Some(url), _) => url,
            (None, Some(key)) => format!(
                "https://mainnet.infura.io/v3/{}",
                urlencoding::encode(&key)
            ),
            (None, None) => bail!("ETH_RPC_URL or INFURA_KEY must be set"),
        };
        validate_http_url("ETH_RPC_URL", &eth_rpc_url)?;

        let routing_api_url = var("ROUTING_API_URL").context("ROUTING_API_URL not set")?;
        validate_http_url("ROUTING_API_URL", &routing_api_url)?;

        let chain_id = match var("CHAIN_ID") {
            Some(v) => v.parse().context("Invalid CHAIN_ID")?,
            None => MAINNET_CHAIN_ID,
        };

        Ok(Self {
            eth_rpc_url,
            routing_api_url: routing_api_url.trim_end_matches('/').to_string(),
            routing_api_key: var("ROUTING_API_KEY"),
            chain_id,
        })
    }
}

/// 日志目录 (在加载完整配置之前初始化日志时使用)
pub fn log_dir_from_env() -> String {
    dotenv::dotenv().ok();
    env::var("LOG_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())
}

fn validate_http_url(name: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value).with_context(|| format!("Invalid {}: {}", name, value))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("Invalid {}: unsupported scheme {}", name, other),
    }
}
