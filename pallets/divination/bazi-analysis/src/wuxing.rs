//! # 五行占比
//!
//! 统计四柱五行力量并换算为整数百分比（总和恒为 100）。
//!
//! ## 计分
//!
//! - 天干：每个 1000‰
//! - 地支藏干：按藏干权重（‰）
//! - 地支本气：环境加权 500‰
//!
//! 百分比采用最大余数法取整，保证总和为 100 且结果确定。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_arithmetic::traits::IntegerSquareRoot;
use sp_std::prelude::*;

use crate::chart::ChartModel;
use crate::constants::{WangXiang, PERMILLE};
use crate::types::WuXing;

/// 地支本气环境加权（‰）
const BRANCH_ENV_WEIGHT: u32 = 500;

/// 偏旺判定线（%）
pub const STRONG_ELEMENT_PCT: u8 = 30;

/// 偏弱判定线（%）
pub const WEAK_ELEMENT_PCT: u8 = 10;

/// 五行分布
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WuXingDistribution {
    /// 按 木火土金水 排列的百分比
    pub percentages: [u8; 5],
    /// 月令下各五行的旺相休囚死
    pub wang_xiang: [WangXiang; 5],
}

impl Default for WuXingDistribution {
    fn default() -> Self {
        Self { percentages: [20; 5], wang_xiang: [WangXiang::Xiu; 5] }
    }
}

impl WuXingDistribution {
    pub fn percent(&self, element: WuXing) -> u8 {
        self.percentages[element.index()]
    }

    pub fn state(&self, element: WuXing) -> WangXiang {
        self.wang_xiang[element.index()]
    }

    /// 占比 ≥ 30% 的五行
    pub fn strong_elements(&self) -> Vec<WuXing> {
        WuXing::ALL.into_iter().filter(|e| self.percent(*e) >= STRONG_ELEMENT_PCT).collect()
    }

    /// 占比 ≤ 10% 的五行
    pub fn weak_elements(&self) -> Vec<WuXing> {
        WuXing::ALL.into_iter().filter(|e| self.percent(*e) <= WEAK_ELEMENT_PCT).collect()
    }

    /// 五行占比标准差（放大 10 倍，整数）
    pub fn std_dev_x10(&self) -> u32 {
        let variance_x100: u32 = self
            .percentages
            .iter()
            .map(|p| {
                let diff = (*p as i32 - 20).unsigned_abs();
                diff * diff * 100
            })
            .sum::<u32>()
            / 5;
        variance_x100.integer_sqrt()
    }

    /// 平衡度：100 − 5 × 标准差
    pub fn balance(&self) -> u8 {
        let penalty = self.std_dev_x10() * 5 / 10;
        100u32.saturating_sub(penalty) as u8
    }
}

/// 计算五行分布
pub fn analyze(chart: &ChartModel) -> WuXingDistribution {
    let mut raw = [0u32; 5];
    for (_, pillar) in chart.pillars() {
        raw[pillar.stem().to_wuxing().index()] += PERMILLE;
        for hidden in pillar.hidden_stems.iter() {
            raw[hidden.gan.to_wuxing().index()] += hidden.weight as u32;
        }
        raw[pillar.branch().to_wuxing().index()] += BRANCH_ENV_WEIGHT;
    }

    let month_branch = chart.month_branch();
    let mut wang_xiang = [WangXiang::Xiu; 5];
    for element in WuXing::ALL {
        wang_xiang[element.index()] = WangXiang::of(element, month_branch);
    }

    WuXingDistribution { percentages: to_percentages(&raw), wang_xiang }
}

/// 最大余数法换算百分比，余数相同时按 木火土金水 顺序优先
pub fn to_percentages(raw: &[u32; 5]) -> [u8; 5] {
    let total: u64 = raw.iter().map(|v| *v as u64).sum();
    if total == 0 {
        return [20; 5];
    }

    let mut result = [0u8; 5];
    let mut remainders = [(0u64, 0usize); 5];
    let mut assigned: u32 = 0;
    for (i, value) in raw.iter().enumerate() {
        let scaled = *value as u64 * 100;
        result[i] = (scaled / total) as u8;
        remainders[i] = (scaled % total, i);
        assigned += result[i] as u32;
    }

    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (_, i) in remainders.iter().take(100u32.saturating_sub(assigned) as usize) {
        result[*i] += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::chart_of;

    #[test]
    fn test_percentages_sum_to_hundred() {
        assert_eq!(to_percentages(&[1, 1, 1, 0, 0]), [34, 33, 33, 0, 0]);
        assert_eq!(to_percentages(&[0; 5]), [20; 5]);
        let p = to_percentages(&[3700, 1200, 4550, 900, 2300]);
        assert_eq!(p.iter().map(|v| *v as u32).sum::<u32>(), 100);
    }

    #[test]
    fn test_analyze_wood_heavy_chart() {
        // 甲寅年 丙寅月 甲寅日 乙亥时
        let chart = chart_of([(0, 2), (2, 2), (0, 2), (1, 11)]);
        let wx = analyze(&chart);
        assert_eq!(wx.percentages.iter().map(|v| *v as u32).sum::<u32>(), 100);
        assert!(wx.percent(WuXing::Mu) >= STRONG_ELEMENT_PCT);
        assert_eq!(wx.strong_elements(), vec![WuXing::Mu]);
        assert!(wx.weak_elements().contains(&WuXing::Jin));
        assert_eq!(wx.state(WuXing::Mu), WangXiang::Wang);
    }

    #[test]
    fn test_balance_of_even_distribution() {
        let even = WuXingDistribution::default();
        assert_eq!(even.std_dev_x10(), 0);
        assert_eq!(even.balance(), 100);

        let skewed = WuXingDistribution { percentages: [60, 10, 10, 10, 10], ..Default::default() };
        // 方差 400，标准差 20
        assert_eq!(skewed.std_dev_x10(), 200);
        assert_eq!(skewed.balance(), 0);
    }
}
