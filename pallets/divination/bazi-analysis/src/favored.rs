//! # 喜用神 / 忌神
//!
//! - 身强：喜泄耗克（食伤、财、官杀），忌印比
//! - 身弱：喜生扶（印、比劫），忌财官食伤
//! - 从强：顺从我党（印比），忌财官食伤
//! - 从弱：顺从对方（财官食伤），忌印比
//! - 身偏强 / 身偏弱：同身强 / 身弱，但官杀仅在占比 ≥ 25% 或为十神主导类时列为忌
//! - 平衡：喜食伤、财，忌官杀
//!
//! "杀重身弱"的命局（官杀 ≥30%、印 ≥22%、日主无强根、日主+印 ≤65%）在
//! 身偏强 / 平衡 / 身偏弱 三档时按身弱取用。
//!
//! 排序：稀缺者在前，占比超过 35% 的五行排到最后；占比相同时十神权重低者在前。

use codec::{Decode, Encode};
use scale_info::TypeInfo;
use sp_std::{prelude::*, vec};

use crate::chart::ChartModel;
use crate::constants::{WangXiang, LU_SHEN, YANG_REN};
use crate::strength::{StrengthAnalysis, StrengthBand};
use crate::structure::AttributeWeights;
use crate::types::{ShiShenGroup, WuXing};
use crate::wuxing::WuXingDistribution;

/// 极旺线（%），超过者排到最后
const OVERFLOW_PCT: u8 = 35;

/// 官杀明确列忌的占比线（%）
const CONTROLLER_AVOID_PCT: u8 = 25;

/// 喜忌结果
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct FavoredAvoid {
    /// 实际取用的强弱档位（可能因杀重身弱而下调）
    pub effective_band: StrengthBand,
    pub kill_heavy_weak: bool,
    /// 喜用五行（稀缺在前）
    pub favored: Vec<WuXing>,
    /// 忌神五行
    pub avoid: Vec<WuXing>,
    /// 喜用对应的十神类
    pub favored_groups: Vec<ShiShenGroup>,
    pub wang_xiang: [WangXiang; 5],
}

impl FavoredAvoid {
    pub fn is_favored(&self, element: WuXing) -> bool {
        self.favored.contains(&element)
    }

    pub fn is_avoided(&self, element: WuXing) -> bool {
        self.avoid.contains(&element)
    }
}

/// 推导喜用 / 忌神
pub fn analyze(
    chart: &ChartModel,
    strength: &StrengthAnalysis,
    weights: &AttributeWeights,
    wuxing: &WuXingDistribution,
) -> FavoredAvoid {
    let me = chart.day_master.to_wuxing();
    let leak = me.generates();
    let controlled = me.controls();
    let controller = me.controlled_by();
    let producer = me.generated_by();

    let kill_heavy_weak = is_kill_heavy_weak(chart, wuxing);
    let effective_band = match strength.band {
        StrengthBand::PianQiang | StrengthBand::PingHeng | StrengthBand::PianRuo
            if kill_heavy_weak =>
        {
            log::debug!(target: crate::LOG_TARGET, "🔮 杀重身弱，按身弱取用");
            StrengthBand::ShenRuo
        },
        band => band,
    };

    let controller_heavy = wuxing.percent(controller) >= CONTROLLER_AVOID_PCT ||
        weights.dominant == ShiShenGroup::GuanSha;
    let (mut favored, mut avoid) = match effective_band {
        StrengthBand::CongQiang | StrengthBand::ShenRuo =>
            (vec![me, producer], vec![leak, controlled, controller]),
        StrengthBand::CongRuo | StrengthBand::ShenQiang =>
            (vec![leak, controlled, controller], vec![me, producer]),
        StrengthBand::PianQiang => {
            let mut avoid = vec![me, producer];
            if controller_heavy {
                avoid.push(controller);
            }
            (vec![leak, controlled], avoid)
        },
        StrengthBand::PianRuo => {
            let mut avoid = vec![leak, controlled];
            if controller_heavy {
                avoid.push(controller);
            }
            (vec![me, producer], avoid)
        },
        StrengthBand::PingHeng => (vec![leak, controlled], vec![controller]),
    };

    sort_by_scarcity(&mut favored, me, weights, wuxing);
    sort_by_scarcity(&mut avoid, me, weights, wuxing);
    let favored_groups = favored.iter().map(|e| ShiShenGroup::of_element(me, *e)).collect();

    FavoredAvoid {
        effective_band,
        kill_heavy_weak,
        favored,
        avoid,
        favored_groups,
        wang_xiang: wuxing.wang_xiang,
    }
}

/// 稀缺优先，极旺（>35%）排最后
fn sort_by_scarcity(
    elements: &mut [WuXing],
    me: WuXing,
    weights: &AttributeWeights,
    wuxing: &WuXingDistribution,
) {
    elements.sort_by_key(|e| {
        let pct = wuxing.percent(*e);
        (pct > OVERFLOW_PCT, pct, weights.group(ShiShenGroup::of_element(me, *e)))
    });
}

/// 日主是否有强根：临官 / 帝旺之地，或地支本气同五行
fn has_strong_root(chart: &ChartModel) -> bool {
    let dm = chart.day_master;
    let me = dm.to_wuxing();
    let lu = LU_SHEN[(dm.0 % 10) as usize];
    let ren = YANG_REN[(dm.0 % 10) as usize];
    chart.branches().iter().any(|zhi| zhi.0 == lu || ren == Some(zhi.0) || zhi.to_wuxing() == me)
}

fn is_kill_heavy_weak(chart: &ChartModel, wuxing: &WuXingDistribution) -> bool {
    let me = chart.day_master.to_wuxing();
    let self_side = wuxing.percent(me) as u32 + wuxing.percent(me.generated_by()) as u32;
    wuxing.percent(me.controlled_by()) >= 30
        && wuxing.percent(me.generated_by()) >= 22
        && !has_strong_root(chart)
        && self_side <= 65
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::chart_of;
    use crate::strength::StrengthDetail;

    fn strength_with(band: StrengthBand) -> StrengthAnalysis {
        StrengthAnalysis { score: 50, score_permille: 500, band, detail: StrengthDetail::default() }
    }

    fn no_weights() -> AttributeWeights {
        AttributeWeights::default()
    }

    fn distribution(percentages: [u8; 5]) -> WuXingDistribution {
        WuXingDistribution { percentages, ..Default::default() }
    }

    #[test]
    fn test_strong_favors_output_wealth_officer() {
        // 甲木日主
        let chart = chart_of([(0, 0), (2, 2), (0, 6), (6, 6)]);
        let wx = distribution([40, 25, 10, 15, 10]);
        let result = analyze(&chart, &strength_with(StrengthBand::ShenQiang), &no_weights(), &wx);
        // 土 10 < 金 15 < 火 25
        assert_eq!(result.favored, vec![WuXing::Tu, WuXing::Jin, WuXing::Huo]);
        // 水 10，木 40 极旺排最后
        assert_eq!(result.avoid, vec![WuXing::Shui, WuXing::Mu]);
        assert_eq!(
            result.favored_groups,
            vec![ShiShenGroup::Cai, ShiShenGroup::GuanSha, ShiShenGroup::ShiShang]
        );
    }

    #[test]
    fn test_balanced_avoids_controller() {
        let chart = chart_of([(0, 0), (2, 2), (0, 6), (6, 6)]);
        let wx = distribution([20, 20, 20, 20, 20]);
        let result = analyze(&chart, &strength_with(StrengthBand::PingHeng), &no_weights(), &wx);
        assert_eq!(result.favored, vec![WuXing::Huo, WuXing::Tu]);
        assert_eq!(result.avoid, vec![WuXing::Jin]);
        assert!(!result.kill_heavy_weak);
    }

    #[test]
    fn test_partial_bands_list_controller_only_when_heavy() {
        let chart = chart_of([(0, 0), (2, 2), (0, 6), (6, 6)]);
        let band = strength_with(StrengthBand::PianQiang);
        let light = analyze(&chart, &band, &no_weights(), &distribution([30, 20, 20, 15, 15]));
        assert!(!light.is_avoided(WuXing::Jin));
        let heavy = analyze(&chart, &band, &no_weights(), &distribution([30, 10, 10, 35, 15]));
        assert!(heavy.is_avoided(WuXing::Jin));
        // 占比不高，但官杀是十神主导类
        let officer_led = AttributeWeights { dominant: ShiShenGroup::GuanSha, ..Default::default() };
        let led = analyze(&chart, &band, &officer_led, &distribution([30, 20, 20, 15, 15]));
        assert!(led.is_avoided(WuXing::Jin));
    }

    #[test]
    fn test_kill_heavy_weak_downgrade() {
        // 甲申 壬申 甲子 壬申：金重、水印撑身，木无根
        let chart = chart_of([(0, 8), (8, 8), (0, 0), (8, 8)]);
        let wx = distribution([18, 0, 8, 40, 34]);
        let result = analyze(&chart, &strength_with(StrengthBand::PingHeng), &no_weights(), &wx);
        assert!(result.kill_heavy_weak);
        assert_eq!(result.effective_band, StrengthBand::ShenRuo);
        assert!(result.is_favored(WuXing::Mu));
        assert!(result.is_favored(WuXing::Shui));
        assert!(result.is_avoided(WuXing::Jin));
    }

    #[test]
    fn test_equal_shares_break_ties_by_weight() {
        use crate::dogong::tests::weights_of;
        use crate::types::ShiShen as S;
        let chart = chart_of([(0, 0), (2, 2), (0, 6), (6, 6)]);
        let wx = distribution([40, 15, 15, 15, 15]);
        let w = weights_of(&[(S::ShangGuan, 2000), (S::ZhengCai, 6000), (S::QiSha, 4000)]);
        let result = analyze(&chart, &strength_with(StrengthBand::ShenQiang), &w, &wx);
        // 火(食伤 2000) < 金(官杀 4000) < 土(财 6000)
        assert_eq!(result.favored, vec![WuXing::Huo, WuXing::Jin, WuXing::Tu]);
    }
}
