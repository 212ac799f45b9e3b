//! # 十神权重与格局
//!
//! ## 十神权重 (W)
//!
//! 遍历四柱天干（日干除外）与藏干，每个干的贡献为
//! `权重 × 位置(月 1.30 / 日 1.15 / 其余 1.00) × (0.7 + 0.6 × 季节) × 透干(1.20)`，
//! 再除以五类中最大的一类总和，使主导类恰为 10000，其余均落在 0~10000。
//!
//! ## 格局候选（优先级从高到低）
//!
//! 1. 化气格（日干与月干/时干五合，化神当令且成势）
//! 2. 专旺格（从强 + 得令 + 三柱以上同气 + 官杀弱）
//! 3. 从格（从弱：从财 / 从杀 / 从儿 / 从势）
//! 4. 月令主格（透干优先，正八格）
//! 5. 建禄 / 阳刃 / 月劫
//! 6. 十神组合（食神生财、伤官配印、财官双美、杀印相生、官印相生）
//!
//! 先按优先级、再按成格度排序选出主格，主格不足 60 分时为平格。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_arithmetic::Permill;
use sp_std::prelude::*;

use crate::chart::ChartModel;
use crate::constants::{season_weight, tiangan_he, BPS, LU_SHEN, PERMILLE};
use crate::strength::{symbol_weight, StrengthAnalysis, StrengthBand};
use crate::types::{ChangSheng, PillarPosition, ShiShen, ShiShenGroup, WuXing};

/// 透干加权（‰）
const VISIBLE_BOOST: u32 = 1200;

/// 主导类并列判定：差距在 2% 以内
const DOMINANT_TIE_PERCENT: u64 = 2;

// ============================================================================
// 十神权重
// ============================================================================

/// 十神权重向量（万分比）
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeWeights {
    /// 按 `ShiShen` 索引
    pub values: [u16; 10],
    /// 主导类
    pub dominant: ShiShenGroup,
    /// 是否透干（按 `ShiShen` 索引）
    pub revealed: [bool; 10],
}

impl AttributeWeights {
    pub fn get(&self, shishen: ShiShen) -> u32 {
        self.values[shishen.index()] as u32
    }

    /// 类总和（恒 ≤ 10000）
    pub fn group(&self, group: ShiShenGroup) -> u32 {
        group.members().iter().map(|s| self.get(*s)).sum()
    }

    pub fn is_revealed(&self, shishen: ShiShen) -> bool {
        self.revealed[shishen.index()]
    }

    pub fn group_revealed(&self, group: ShiShenGroup) -> bool {
        group.members().iter().any(|s| self.is_revealed(*s))
    }

    /// 正官在官杀中的占比（‰），印同理
    fn zheng_ratio(&self, group: ShiShenGroup) -> u32 {
        let total = self.group(group);
        if total == 0 {
            return 0;
        }
        self.get(group.members()[1]) * PERMILLE / total
    }
}

/// 计算十神权重
pub fn resolve_weights(chart: &ChartModel) -> AttributeWeights {
    let dm = chart.day_master;
    let month_branch = chart.month_branch();
    let mut raw = [0u64; 10];
    let mut revealed = [false; 10];
    let mut nearest = [u8::MAX; 5];

    for (position, pillar) in chart.pillars() {
        let place = position.place_weight();
        let mut visit = |shishen: ShiShen, weight: u32| {
            raw[shishen.index()] += weight as u64;
            let slot = &mut nearest[shishen.group().index()];
            *slot = (*slot).min(position.distance_to_day());
        };

        if position != PillarPosition::Day {
            let shishen = pillar.stem_category(dm);
            let w = symbol_weight(dm, pillar.stem(), PERMILLE, place, month_branch);
            visit(shishen, w * VISIBLE_BOOST / PERMILLE);
            revealed[shishen.index()] = true;
        }
        for (hidden, shishen) in pillar.hidden_categories(dm) {
            visit(shishen, symbol_weight(dm, hidden.gan, hidden.weight as u32, place, month_branch));
        }
    }

    let group_sums: Vec<u64> =
        ShiShenGroup::ALL.iter().map(|g| g.members().iter().map(|s| raw[s.index()]).sum()).collect();
    let max_group = group_sums.iter().copied().max().unwrap_or(0);

    // 按类取整，保证主导类恰为 10000
    let mut values = [0u16; 10];
    if max_group > 0 {
        for group in ShiShenGroup::ALL {
            let [pian, zheng] = group.members();
            let total = group_sums[group.index()] * BPS as u64 / max_group;
            let first = raw[pian.index()] * BPS as u64 / max_group;
            values[pian.index()] = first as u16;
            values[zheng.index()] = (total - first) as u16;
        }
    }

    // 主导类：近乎并列时取离日柱更近者
    let mut dominant = ShiShenGroup::BiJie;
    let mut best: Option<(u64, u8)> = None;
    for group in ShiShenGroup::ALL {
        let sum = group_sums[group.index()];
        let distance = nearest[group.index()];
        let better = match best {
            None => true,
            Some((best_sum, best_distance)) => {
                let tied = sum.abs_diff(best_sum) * 100 <= best_sum.max(sum) * DOMINANT_TIE_PERCENT;
                if tied {
                    distance < best_distance
                } else {
                    sum > best_sum
                }
            },
        };
        if better && sum > 0 {
            dominant = group;
            best = Some((sum, distance));
        }
    }

    AttributeWeights { values, dominant, revealed }
}

// ============================================================================
// 格局
// ============================================================================

/// 格局
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Pattern {
    /// 平格（未成主象）
    #[default]
    PingGe,
    // 正八格
    ZhengGuan,
    QiSha,
    ZhengCai,
    PianCai,
    ShiShen,
    ShangGuan,
    ZhengYin,
    /// 枭印格
    PianYin,
    // 外格
    JianLu,
    YangRen,
    YueJie,
    // 十神组合
    ShiShenShengCai,
    ShangGuanPeiYin,
    CaiGuanShuangMei,
    ShaYinXiangSheng,
    GuanYinXiangSheng,
    // 从格
    CongCai,
    CongSha,
    CongEr,
    CongShi,
    /// 专旺格（曲直 / 炎上 / 稼穑 / 从革 / 润下）
    ZhuanWang(WuXing),
    /// 化气格（化神五行）
    HuaQi(WuXing),
}

/// 格局类别
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PatternCategory {
    /// 化气 / 专旺 / 从格
    Special,
    /// 正八格
    Regular,
    /// 建禄 / 阳刃 / 月劫
    Base,
    Combination,
    Ordinary,
}

impl Pattern {
    pub fn category(&self) -> PatternCategory {
        match self {
            Self::HuaQi(_) | Self::ZhuanWang(_) | Self::CongCai | Self::CongSha | Self::CongEr |
            Self::CongShi => PatternCategory::Special,
            Self::ZhengGuan | Self::QiSha | Self::ZhengCai | Self::PianCai | Self::ShiShen |
            Self::ShangGuan | Self::ZhengYin | Self::PianYin => PatternCategory::Regular,
            Self::JianLu | Self::YangRen | Self::YueJie => PatternCategory::Base,
            Self::ShiShenShengCai | Self::ShangGuanPeiYin | Self::CaiGuanShuangMei |
            Self::ShaYinXiangSheng | Self::GuanYinXiangSheng => PatternCategory::Combination,
            Self::PingGe => PatternCategory::Ordinary,
        }
    }

    pub fn is_special(&self) -> bool {
        self.category() == PatternCategory::Special
    }

    fn priority(&self) -> u8 {
        match self.category() {
            PatternCategory::Special => 100,
            PatternCategory::Regular => 80,
            PatternCategory::Base => 60,
            _ => 0,
        }
    }

    /// 月令十神对应的正格
    fn regular_of(shishen: ShiShen) -> Option<Self> {
        match shishen {
            ShiShen::ZhengGuan => Some(Pattern::ZhengGuan),
            ShiShen::QiSha => Some(Pattern::QiSha),
            ShiShen::ZhengCai => Some(Pattern::ZhengCai),
            ShiShen::PianCai => Some(Pattern::PianCai),
            ShiShen::ShiShen => Some(Pattern::ShiShen),
            ShiShen::ShangGuan => Some(Pattern::ShangGuan),
            ShiShen::ZhengYin => Some(Pattern::ZhengYin),
            ShiShen::PianYin => Some(Pattern::PianYin),
            ShiShen::BiJian | ShiShen::JieCai => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PingGe => "平格",
            Self::ZhengGuan => "正官格",
            Self::QiSha => "七杀格",
            Self::ZhengCai => "正财格",
            Self::PianCai => "偏财格",
            Self::ShiShen => "食神格",
            Self::ShangGuan => "伤官格",
            Self::ZhengYin => "正印格",
            Self::PianYin => "枭印格",
            Self::JianLu => "建禄格",
            Self::YangRen => "阳刃格",
            Self::YueJie => "月劫格",
            Self::ShiShenShengCai => "食神生财",
            Self::ShangGuanPeiYin => "伤官配印",
            Self::CaiGuanShuangMei => "财官双美",
            Self::ShaYinXiangSheng => "杀印相生",
            Self::GuanYinXiangSheng => "官印相生",
            Self::CongCai => "从财格",
            Self::CongSha => "从杀格",
            Self::CongEr => "从儿格",
            Self::CongShi => "从势格",
            Self::ZhuanWang(WuXing::Mu) => "曲直仁寿格",
            Self::ZhuanWang(WuXing::Huo) => "炎上格",
            Self::ZhuanWang(WuXing::Tu) => "稼穑格",
            Self::ZhuanWang(WuXing::Jin) => "从革格",
            Self::ZhuanWang(WuXing::Shui) => "润下格",
            Self::HuaQi(WuXing::Tu) => "甲己化土格",
            Self::HuaQi(WuXing::Jin) => "乙庚化金格",
            Self::HuaQi(WuXing::Shui) => "丙辛化水格",
            Self::HuaQi(WuXing::Mu) => "丁壬化木格",
            Self::HuaQi(WuXing::Huo) => "戊癸化火格",
        }
    }
}

/// 格局候选（成格度 0~100）
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PatternCandidate {
    pub pattern: Pattern,
    pub score: u8,
}

/// 格局分析结果
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct StructureAnalysis {
    pub weights: AttributeWeights,
    /// 主格
    pub pattern: Pattern,
    /// 主格成格度（0~100），平格为 0
    pub score: u8,
    /// 置信度（%，60~90）
    pub confidence: u8,
    /// 副格
    pub secondary: Option<Pattern>,
}

impl StructureAnalysis {
    pub fn confidence_ratio(&self) -> Permill {
        Permill::from_percent(self.confidence as u32)
    }
}

/// 选格阈值
const WEAK: u8 = 50;
const MODERATE: u8 = 60;
const NO_MAIN_SECONDARY_MIN: u8 = 55;
const MAIN_SECONDARY_GAP: u8 = 20;

/// 判定格局
pub fn determine_pattern(
    chart: &ChartModel,
    weights: AttributeWeights,
    strength: &StrengthAnalysis,
) -> StructureAnalysis {
    let candidates = collect_candidates(chart, &weights, strength);
    for c in candidates.iter() {
        log::debug!(target: crate::LOG_TARGET, "🔮 格局候选: {} {}", c.pattern.name(), c.score);
    }

    let (main, secondary) = select_main(candidates);
    let (pattern, score) = main.map(|m| (m.pattern, m.score)).unwrap_or((Pattern::PingGe, 0));
    let confidence = match main {
        Some(m) => (62 + m.score as u32 * 20 / 100).clamp(60, 90) as u8,
        None => 60,
    };

    StructureAnalysis { weights, pattern, score, confidence, secondary }
}

/// 主格 / 副格选择
pub fn select_main(
    mut candidates: Vec<PatternCandidate>,
) -> (Option<PatternCandidate>, Option<Pattern>) {
    candidates.retain(|c| c.score >= WEAK);
    candidates.sort_by(|a, b| {
        b.pattern.priority().cmp(&a.pattern.priority()).then(b.score.cmp(&a.score))
    });

    let Some(first) = candidates.first().copied() else {
        return (None, None);
    };

    // 正格优先级高于建禄/月劫，排序后即已让位
    if first.score < MODERATE {
        let secondary =
            candidates.iter().find(|c| c.score >= NO_MAIN_SECONDARY_MIN).map(|c| c.pattern);
        return (None, secondary);
    }

    let main = candidates[0];
    let secondary = candidates
        .iter()
        .skip(1)
        .find(|c| {
            c.score >= MODERATE
                && main.score.saturating_sub(c.score) <= MAIN_SECONDARY_GAP
                && !c.pattern.is_special()
        })
        .map(|c| c.pattern);
    (Some(main), secondary)
}

fn collect_candidates(
    chart: &ChartModel,
    w: &AttributeWeights,
    strength: &StrengthAnalysis,
) -> Vec<PatternCandidate> {
    let mut out = Vec::new();
    let mut push = |pattern: Pattern, score: u32| {
        if score > 0 {
            out.push(PatternCandidate { pattern, score: score.min(100) as u8 });
        }
    };

    if let Some(element) = check_hua_qi(chart) {
        push(Pattern::HuaQi(element), 91);
    }
    if strength.band == StrengthBand::CongQiang && is_zhuan_wang(chart, w) {
        push(Pattern::ZhuanWang(chart.day_master.to_wuxing()), 92);
    }
    if strength.band == StrengthBand::CongRuo {
        let (pattern, score) = cong_ruo_subtype(w);
        push(pattern, score);
    }
    if let Some((pattern, score)) = month_main_pattern(chart, w) {
        push(pattern, score);
    }

    let bi = w.group(ShiShenGroup::BiJie);
    let cai = w.group(ShiShenGroup::Cai);
    let guan = w.group(ShiShenGroup::GuanSha);
    let yin = w.group(ShiShenGroup::Yin);

    // 印星独立成格
    for (shishen, pattern, other) in
        [(ShiShen::PianYin, Pattern::PianYin, ShiShen::ZhengYin), (ShiShen::ZhengYin, Pattern::ZhengYin, ShiShen::PianYin)]
    {
        let own = w.get(shishen);
        if own >= 6000 || (own >= 5000 && w.is_revealed(shishen)) {
            let mut score = (own * 120 / 100 / 100).min(80);
            if w.is_revealed(shishen) {
                score += 10;
            }
            if own * 10 > w.get(other) * 12 {
                score += 5;
            }
            push(pattern, score.min(95));
        }
    }

    if w.get(ShiShen::ShiShen) >= 5000 && cai >= 5000 {
        let mut s = w.get(ShiShen::ShiShen).min(cai * 98 / 100) / 100;
        if guan >= 8000 {
            s = s.saturating_sub(5);
        }
        if bi >= 7000 {
            s = s.saturating_sub(5);
        }
        push(Pattern::ShiShenShengCai, s);
    }
    if w.get(ShiShen::ShangGuan) >= 5000 && yin >= 5000 && guan < 6000 {
        let mut s = w.get(ShiShen::ShangGuan).min(yin * 97 / 100) / 100;
        if cai >= 7500 {
            s = s.saturating_sub(5);
        }
        push(Pattern::ShangGuanPeiYin, s);
    }
    let balanced_or_strong = matches!(
        strength.band,
        StrengthBand::ShenQiang | StrengthBand::PianQiang | StrengthBand::PingHeng
    );
    if balanced_or_strong && cai >= 6000 && guan >= 5000 {
        let mut s = cai.min(guan) * 98 / 100 / 100;
        if bi >= 7000 {
            s = s.saturating_sub(10);
        }
        push(Pattern::CaiGuanShuangMei, s);
    }
    if w.get(ShiShen::QiSha) >= 6000 && yin >= 5000 {
        let mut s = w.get(ShiShen::QiSha).min(yin * 97 / 100) / 100;
        if w.get(ShiShen::ShangGuan) >= 5500 {
            s = s.saturating_sub(8);
        }
        push(Pattern::ShaYinXiangSheng, s);
    }
    let visible = w.group_revealed(ShiShenGroup::GuanSha) || w.group_revealed(ShiShenGroup::Yin);
    let clean = w.get(ShiShen::ShangGuan) < 5000 && cai < 7000;
    let ratio = w.zheng_ratio(ShiShenGroup::GuanSha).max(w.zheng_ratio(ShiShenGroup::Yin));
    if guan >= 6000
        && yin >= 6000
        && visible
        && clean
        && ratio >= 350
        && strength.band != StrengthBand::CongQiang
    {
        let mut s = guan.min(yin) * 97 / 100;
        if ratio >= 700 {
            s = s * 105 / 100;
        }
        if s > 4000 {
            push(Pattern::GuanYinXiangSheng, s / 100);
        }
    }

    out
}

/// 柱中含某五行（天干或地支本气）的柱数
fn pillars_with_element(chart: &ChartModel, element: WuXing) -> usize {
    chart
        .pillars()
        .iter()
        .filter(|(_, p)| p.stem().to_wuxing() == element || p.branch().to_wuxing() == element)
        .count()
}

/// 化气格：日干与月干或时干五合，化神当令、成势，返回化神五行
fn check_hua_qi(chart: &ChartModel) -> Option<WuXing> {
    let dm = chart.day_master;
    let month_branch = chart.month_branch();
    [chart.month.stem(), chart.hour.stem()].into_iter().find_map(|other| {
        let element = tiangan_he(dm, other)?;
        let season = season_weight(element, month_branch);
        let count = pillars_with_element(chart, element);
        if season < 700 || count < 3 {
            return None;
        }

        let mut purity: u32 = 55;
        match pillars_with_element(chart, element.controlled_by()) {
            0 => purity += 20,
            1 => purity += 10,
            _ => {},
        }
        match pillars_with_element(chart, element.generated_by()) {
            0 => {},
            1 => purity += 8,
            _ => purity += 15,
        }
        // 化神透干（合化双方之外）
        let revealed = chart
            .pillars()
            .iter()
            .any(|(pos, p)| *pos != PillarPosition::Day && p.stem() != other && p.stem().to_wuxing() == element);
        if revealed {
            purity += 10;
        }
        (purity >= 70).then_some(element)
    })
}

/// 专旺格条件
fn is_zhuan_wang(chart: &ChartModel, w: &AttributeWeights) -> bool {
    let dm_element = chart.day_master.to_wuxing();
    season_weight(dm_element, chart.month_branch()) >= 700
        && pillars_with_element(chart, dm_element) >= 3
        && w.group(ShiShenGroup::GuanSha) < 3000
}

/// 从弱细分：单一旺神（超出次强 50%）取从财/从杀/从儿，否则从势
fn cong_ruo_subtype(w: &AttributeWeights) -> (Pattern, u32) {
    let mut gods = [
        (ShiShenGroup::Cai, w.group(ShiShenGroup::Cai)),
        (ShiShenGroup::GuanSha, w.group(ShiShenGroup::GuanSha)),
        (ShiShenGroup::ShiShang, w.group(ShiShenGroup::ShiShang)),
    ];
    gods.sort_by(|a, b| b.1.cmp(&a.1));
    let (dominant, strength) = gods[0];
    if strength * 2 <= gods[1].1 * 3 {
        return (Pattern::CongShi, 88);
    }

    let bi = w.group(ShiShenGroup::BiJie);
    let yin = w.group(ShiShenGroup::Yin);
    match dominant {
        ShiShenGroup::Cai => {
            let score = if bi < 1500 && yin < 1000 && w.group(ShiShenGroup::ShiShang) >= 3000 {
                92
            } else if bi >= 1500 || yin >= 1000 {
                85
            } else {
                90
            };
            (Pattern::CongCai, score)
        },
        ShiShenGroup::GuanSha => {
            let controlled = yin >= 3000 || w.get(ShiShen::ShangGuan) >= 3000;
            (Pattern::CongSha, if controlled { 85 } else { 92 })
        },
        _ => {
            let pure = w.group(ShiShenGroup::Cai) >= 5000
                && yin < 2000
                && w.group(ShiShenGroup::GuanSha) < 3000;
            (Pattern::CongEr, if pure { 92 } else { 85 })
        },
    }
}

/// 月令主格：透干者优先，否则取本气
fn month_main_pattern(chart: &ChartModel, w: &AttributeWeights) -> Option<(Pattern, u32)> {
    let dm = chart.day_master;
    let month = &chart.month;
    let heads = [chart.year.stem(), month.stem(), chart.hour.stem()];
    let revealed = month.hidden_categories(dm).find(|(h, _)| heads.contains(&h.gan));
    let (_, shishen) = revealed.or_else(|| month.hidden_categories(dm).next())?;

    if let Some(pattern) = Pattern::regular_of(shishen) {
        let score = if revealed.is_some() { 90 } else { 85 };
        return Some((pattern, score));
    }

    let month_branch = chart.month_branch();
    if LU_SHEN[(dm.0 % 10) as usize] == month_branch.0 {
        let mut score: u32 = 85;
        if w.group(ShiShenGroup::Yin) >= 5000 {
            score += 5;
        }
        if w.group(ShiShenGroup::GuanSha) >= 4000 {
            score += 5;
        }
        if w.group(ShiShenGroup::Cai) >= 5000 {
            score += 3;
        }
        return Some((Pattern::JianLu, score.min(95)));
    }

    let main_qi = month.hidden_categories(dm).next().map(|(_, shishen)| shishen);
    if month.stage(dm) == ChangSheng::DiWang && main_qi == Some(ShiShen::JieCai) {
        return Some((Pattern::YangRen, 90));
    }
    Some((Pattern::YueJie, 80))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::chart_of;
    use crate::strength::{self, StrengthConfig};

    fn structure_of(sizhu: [(u8, u8); 4]) -> StructureAnalysis {
        let chart = chart_of(sizhu);
        let strength = strength::analyze(&chart, &StrengthConfig::ZI_PING);
        determine_pattern(&chart, resolve_weights(&chart), &strength)
    }

    #[test]
    fn test_weights_are_normalized() {
        let chart = chart_of([(6, 8), (1, 9), (0, 8), (6, 6)]);
        let w = resolve_weights(&chart);
        assert_eq!(w.dominant, ShiShenGroup::GuanSha);
        assert_eq!(w.group(ShiShenGroup::GuanSha), 10000);
        for group in ShiShenGroup::ALL {
            assert!(w.group(group) <= 10000);
        }
        assert!(w.is_revealed(ShiShen::QiSha));
        assert!(!w.is_revealed(ShiShen::BiJian));
    }

    #[test]
    fn test_absent_categories_are_zero() {
        // 甲寅 丙寅 甲寅 乙亥：无金
        let chart = chart_of([(0, 2), (2, 2), (0, 2), (1, 11)]);
        let w = resolve_weights(&chart);
        assert_eq!(w.group(ShiShenGroup::GuanSha), 0);
        assert_eq!(w.dominant, ShiShenGroup::BiJie);
        assert_eq!(w.group(ShiShenGroup::BiJie), 10000);
    }

    #[test]
    fn test_supplied_categories_feed_weights() {
        let mut chart = chart_of([(0, 0), (2, 2), (0, 6), (6, 6)]);
        let derived = resolve_weights(&chart);
        // 藏干十神缺失时重新推导，结果不变
        chart.month.sub_categories = Default::default();
        assert_eq!(resolve_weights(&chart), derived);

        // 盘中无辛金，正官原为零；调用方把月干标成正官后计入
        assert_eq!(derived.get(ShiShen::ZhengGuan), 0);
        chart.month.category = Some(ShiShen::ZhengGuan);
        let supplied = resolve_weights(&chart);
        assert!(supplied.get(ShiShen::ZhengGuan) > 0);
        assert!(supplied.is_revealed(ShiShen::ZhengGuan));
    }

    #[test]
    fn test_month_revealed_regular_pattern() {
        // 庚申 乙酉 甲申 庚午：酉藏辛（正官），未透；月令本气取正官格
        let s = structure_of([(6, 8), (1, 9), (0, 8), (6, 6)]);
        assert_eq!(s.pattern, Pattern::ZhengGuan);
        assert_eq!(s.score, 85);
        assert_eq!(s.confidence, 62 + 17);
        assert_eq!(s.confidence_ratio(), Permill::from_percent(79));
    }

    #[test]
    fn test_month_revealed_stem_wins() {
        // 丙子 庚寅 甲午 丙寅：寅中甲未透、丙透 → 食神格
        let s = structure_of([(2, 0), (6, 2), (0, 6), (2, 2)]);
        assert_eq!(s.pattern, Pattern::ShiShen);
        assert_eq!(s.score, 90);
    }

    #[test]
    fn test_jian_lu_pattern() {
        // 甲子 丙寅 甲午 庚午：寅为甲禄，甲透于年干
        let s = structure_of([(0, 0), (2, 2), (0, 6), (6, 6)]);
        assert_eq!(s.pattern, Pattern::JianLu);
        assert!(s.score >= 85);
    }

    #[test]
    fn test_select_main_rules() {
        let c = |pattern, score| PatternCandidate { pattern, score };
        assert_eq!(select_main(vec![]), (None, None));
        // 低于 60 不成主格
        assert_eq!(
            select_main(vec![c(Pattern::ZhengGuan, 58)]),
            (None, Some(Pattern::ZhengGuan))
        );
        // 正格排在月劫之前
        let (main, secondary) =
            select_main(vec![c(Pattern::YueJie, 88), c(Pattern::ZhengCai, 85)]);
        assert_eq!(main.map(|m| m.pattern), Some(Pattern::ZhengCai));
        assert_eq!(secondary, Some(Pattern::YueJie));
        // 特殊格不做副格
        let (main, secondary) =
            select_main(vec![c(Pattern::CongCai, 92), c(Pattern::ZhengCai, 85)]);
        assert_eq!(main.map(|m| m.pattern), Some(Pattern::CongCai));
        assert_eq!(secondary, Some(Pattern::ZhengCai));
    }

    #[test]
    fn test_base_pattern_yields_to_major() {
        let c = |pattern, score| PatternCandidate { pattern, score };
        // 建禄分数更高也让位于已成格的正格，自己退作副格
        let (main, secondary) =
            select_main(vec![c(Pattern::JianLu, 90), c(Pattern::ZhengGuan, 82)]);
        assert_eq!(main.map(|m| m.pattern), Some(Pattern::ZhengGuan));
        assert_eq!(secondary, Some(Pattern::JianLu));
        // 建禄与枭印并存
        let (main, secondary) =
            select_main(vec![c(Pattern::JianLu, 85), c(Pattern::PianYin, 80)]);
        assert_eq!(main.map(|m| m.pattern), Some(Pattern::PianYin));
        assert_eq!(secondary, Some(Pattern::JianLu));
        // 分差超出副格范围时建禄不再列出
        let (main, secondary) =
            select_main(vec![c(Pattern::YangRen, 95), c(Pattern::ShiShen, 70)]);
        assert_eq!(main.map(|m| m.pattern), Some(Pattern::ShiShen));
        assert_eq!(secondary, Some(Pattern::YangRen));
    }

    #[test]
    fn test_pattern_names() {
        assert_eq!(Pattern::ZhuanWang(WuXing::Huo).name(), "炎上格");
        assert_eq!(Pattern::HuaQi(WuXing::Tu).name(), "甲己化土格");
        assert!(Pattern::CongShi.is_special());
        assert_eq!(Pattern::default().name(), "平格");
    }
}
