//! 回放结果收集

use models::ComparisonOutcome;

/// 按回放顺序追加的结果序列
#[derive(Debug, Clone, Default)]
pub struct ResultAccumulator {
    outcomes: Vec<ComparisonOutcome>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outcome: ComparisonOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn all(&self) -> &[ComparisonOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn into_inner(self) -> Vec<ComparisonOutcome> {
        self.outcomes
    }
}
