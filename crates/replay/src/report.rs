//! 回放统计和结果输出

use models::{ComparisonOutcome, QuoteAmount};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::engine::{RouteLeg, TradeVerdict};
use crate::error::ReplayError;

/// 回放统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayStatistics {
    pub dataset: String,
    pub pair: String,
    /// 数据集中的记录数
    pub total_records: u64,
    /// 混合路由更优
    pub improved: u64,
    /// 混合路由不优于普通路由
    pub not_better: u64,
    pub no_baseline_route: u64,
    pub no_mixed_route: u64,
    pub chain_lookup_failures: u64,
    /// 与固定交易对不一致的记录
    pub pair_mismatches: u64,
    /// 所有胜出交易的收益之和 (以买入代币计)
    pub total_gain: Option<QuoteAmount>,
    /// 收益之和溢出 U256，total_gain 停止累加
    pub gain_overflowed: bool,
}

impl ReplayStatistics {
    pub fn new(dataset: &str, pair: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            pair: pair.to_string(),
            ..Self::default()
        }
    }

    pub fn record_verdict(&mut self, verdict: &TradeVerdict) {
        match verdict {
            TradeVerdict::Improved { gain, .. } => {
                self.improved += 1;
                self.total_gain = match self.total_gain {
                    None => Some(*gain),
                    Some(total) => match total.checked_add(gain) {
                        Some(sum) => Some(sum),
                        None => {
                            if !self.gain_overflowed {
                                warn!("总收益溢出 (当前 {}, 新增 {}), 之后的收益不再累加", total, gain);
                            }
                            self.gain_overflowed = true;
                            Some(total)
                        }
                    },
                };
            }
            TradeVerdict::NotBetter { .. } => self.not_better += 1,
            TradeVerdict::NoRoute(RouteLeg::Baseline) => self.no_baseline_route += 1,
            TradeVerdict::NoRoute(RouteLeg::Mixed) => self.no_mixed_route += 1,
        }
    }

    /// 完成两次报价比较的记录数
    pub fn compared(&self) -> u64 {
        self.improved + self.not_better
    }

    pub fn skipped(&self) -> u64 {
        self.no_baseline_route + self.no_mixed_route + self.chain_lookup_failures + self.pair_mismatches
    }

    pub fn improved_percent(&self) -> f64 {
        if self.compared() > 0 {
            self.improved as f64 / self.compared() as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// 写出结果 JSON (覆盖已有文件)
pub fn write_results(path: &Path, outcomes: &[ComparisonOutcome]) -> Result<(), ReplayError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReplayError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(outcomes)?;
    fs::write(path, json).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("结果已保存: {:?} ({} 条)", path, outcomes.len());
    Ok(())
}

/// 格式化文本摘要
pub fn format_summary(stats: &ReplayStatistics, generated_at: &str) -> String {
    let mut report = String::new();

    report.push_str(&"=".repeat(80));
    report.push('\n');
    report.push_str("混合路由历史回放报告\n");
    report.push_str(&"=".repeat(80));
    report.push_str("\n\n");

    report.push_str("【数据集】\n");
    report.push_str(&format!("  文件: {}\n", stats.dataset));
    report.push_str(&format!("  交易对: {}\n", stats.pair));
    report.push_str(&format!("  生成时间: {} (上海时间)\n", generated_at));
    report.push('\n');

    report.push_str("【回放统计】\n");
    report.push_str(&format!("  总记录数: {}\n", stats.total_records));
    report.push_str(&format!("  完成比较: {}\n", stats.compared()));
    report.push_str(&format!("  混合路由更优: {}\n", stats.improved));
    report.push_str(&format!("  混合路由不优: {}\n", stats.not_better));
    report.push_str(&format!("  更优比例: {:.2}%\n", stats.improved_percent()));
    report.push('\n');

    report.push_str("【跳过记录】\n");
    report.push_str(&format!("  无普通路由报价: {}\n", stats.no_baseline_route));
    report.push_str(&format!("  无混合路由报价: {}\n", stats.no_mixed_route));
    report.push_str(&format!("  交易区块查询失败: {}\n", stats.chain_lookup_failures));
    report.push_str(&format!("  交易对不一致: {}\n", stats.pair_mismatches));
    report.push('\n');

    report.push_str(&"=".repeat(80));
    report.push('\n');
    report.push_str("【结论】\n");
    match stats.total_gain {
        Some(total) if stats.improved > 0 => {
            report.push_str(&format!(
                "\n✅ 发现 {} 笔交易混合路由优于链上执行时可用的路由\n",
                stats.improved
            ));
            if stats.gain_overflowed {
                report.push_str(&format!("  总收益: >= {} (累加溢出)\n", total));
            } else {
                report.push_str(&format!("  总收益: {}\n", total));
            }
        }
        _ => {
            report.push_str("\n❌ 未发现混合路由更优的交易\n");
        }
    }
    report.push_str(&"=".repeat(80));
    report.push('\n');

    report
}
