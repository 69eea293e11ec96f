use ethers::types::U256;
use std::cmp::Ordering;
use std::fmt;

/// U256 可表示的最大十进制精度
pub const MAX_DECIMALS: u8 = 77;

/// 以最小单位保存的报价金额
///
/// 只有精度相同的金额才可以比较或相减，精度不同时 `partial_cmp` 返回 `None`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuoteAmount {
    raw: U256,
    decimals: u8,
}

impl QuoteAmount {
    pub fn from_raw(raw: U256, decimals: u8) -> Self {
        Self {
            raw,
            decimals: decimals.min(MAX_DECIMALS),
        }
    }

    pub fn zero(decimals: u8) -> Self {
        Self::from_raw(U256::zero(), decimals)
    }

    /// 从十进制字符串解析 (如 "110.25")，小数位超过精度时返回 None
    pub fn from_exact(value: &str, decimals: u8) -> Option<Self> {
        let decimals = decimals.min(MAX_DECIMALS);
        let value = value.trim();
        let (int_part, frac_part) = match value.split_once('.') {
            Some((i, f)) => (i, f),
            None => (value, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
            || frac_part.len() > decimals as usize
        {
            return None;
        }

        let digits = format!(
            "{}{}{}",
            if int_part.is_empty() { "0" } else { int_part },
            frac_part,
            "0".repeat(decimals as usize - frac_part.len())
        );
        let raw = U256::from_dec_str(&digits).ok()?;

        Some(Self { raw, decimals })
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// 相减，精度不同或结果为负时返回 None
    pub fn checked_sub(&self, other: &QuoteAmount) -> Option<QuoteAmount> {
        if self.decimals != other.decimals {
            return None;
        }
        self.raw
            .checked_sub(other.raw)
            .map(|raw| Self::from_raw(raw, self.decimals))
    }

    pub fn checked_add(&self, other: &QuoteAmount) -> Option<QuoteAmount> {
        if self.decimals != other.decimals {
            return None;
        }
        self.raw
            .checked_add(other.raw)
            .map(|raw| Self::from_raw(raw, self.decimals))
    }

    /// 精确十进制表示，去掉小数末尾的 0 (如 "10", "0.5")
    pub fn to_exact(&self) -> String {
        let base = U256::exp10(self.decimals as usize);
        let int_part = self.raw / base;
        let frac_part = self.raw % base;

        if frac_part.is_zero() {
            return int_part.to_string();
        }

        let mut frac = format!(
            "{:0>width$}",
            frac_part.to_string(),
            width = self.decimals as usize
        );
        while frac.ends_with('0') {
            frac.pop();
        }

        format!("{}.{}", int_part, frac)
    }
}

impl PartialOrd for QuoteAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.decimals != other.decimals {
            return None;
        }
        Some(self.raw.cmp(&other.raw))
    }
}

impl fmt::Display for QuoteAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_exact())
    }
}
