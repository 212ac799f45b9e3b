//! # 行运节奏
//!
//! 按年龄把命盘映射到大运时间轴上，每次调用由 `(命盘, 当前年龄, 当前年份, 大运表)`
//! 重新推导，不保存任何状态。
//!
//! ## 阶段
//!
//! - `PreCycle`：尚未起运，返回固定描述（打基础、主学习与家庭），不做流年
//! - `WithinCycle(i)`：处于第 i 步大运
//! - `BeyondCycles`：超出大运表或大运表为空，返回默认描述
//!
//! 大运首尾相接：第 i 步的结束年龄即第 i+1 步的起始年龄。
//!
//! ## 大运判定
//!
//! 1. 大运天干五行对照喜忌 → 用神 / 中性 / 忌神
//! 2. 大运地支与原局四支的六冲数
//! 3. 力度 `50 + 20(用神) − 10(忌神) + 10/20(一冲/多冲) + 10(身弱)`
//! 4. 由 (十神类, 喜忌, 冲数) 查表得阶段、基调、主领域

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame_support::{
    traits::{ConstU32, Get},
    BoundedVec,
};
use scale_info::TypeInfo;
use sp_std::{prelude::*, vec};

use crate::chart::ChartModel;
use crate::constants::is_dizhi_liuchong;
use crate::favored::FavoredAvoid;
use crate::strength::StrengthAnalysis;
use crate::structure::AttributeWeights;
use crate::types::{DiZhi, GanZhi, Gender, ShiShen, ShiShenGroup, TianGan};

/// 大运最多步数
pub type MaxLuckCycles = ConstU32<12>;

/// 每步大运年数
pub const CYCLE_YEARS: u8 = 10;

// ============================================================================
// 大运表
// ============================================================================

/// 一步大运
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LuckCycle {
    pub ganzhi: GanZhi,
    /// 含
    pub start_age: u8,
    /// 不含
    pub end_age: u8,
    /// 大运天干相对日主的十神
    pub shishen: ShiShen,
}

/// 排大运：阳年男、阴年女顺排，反之逆排，从月柱起
pub fn build_luck_cycles(
    chart: &ChartModel,
    gender: Gender,
    start_age: u8,
    count: u32,
) -> BoundedVec<LuckCycle, MaxLuckCycles> {
    let forward = chart.year.stem().is_yang() == (gender == Gender::Male);
    let count = count.min(MaxLuckCycles::get());

    let mut cycles = Vec::new();
    let mut ganzhi = chart.month.ganzhi;
    let mut age = start_age;
    for _ in 0..count {
        ganzhi = if forward { ganzhi.next() } else { ganzhi.prev() };
        let end = age.saturating_add(CYCLE_YEARS);
        cycles.push(LuckCycle {
            ganzhi,
            start_age: age,
            end_age: end,
            shishen: ShiShen::from_gan(chart.day_master, ganzhi.gan),
        });
        age = end;
    }
    BoundedVec::truncate_from(cycles)
}

/// 首尾相接且每步长度为正
pub fn is_contiguous(cycles: &[LuckCycle]) -> bool {
    cycles.iter().all(|c| c.start_age < c.end_age) &&
        cycles.windows(2).all(|w| w[0].end_age == w[1].start_age)
}

/// 年龄所处阶段
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum LuckPhase {
    /// 未起运
    PreCycle,
    WithinCycle(u8),
    /// 超出大运表（或无大运表）
    #[default]
    BeyondCycles,
}

pub fn phase_at(cycles: &[LuckCycle], age: u8) -> LuckPhase {
    match cycles.first() {
        None => LuckPhase::BeyondCycles,
        Some(first) if age < first.start_age => LuckPhase::PreCycle,
        Some(_) => cycles
            .iter()
            .position(|c| c.start_age <= age && age < c.end_age)
            .map(|i| LuckPhase::WithinCycle(i as u8))
            .unwrap_or(LuckPhase::BeyondCycles),
    }
}

// ============================================================================
// 判定表
// ============================================================================

/// 喜忌
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Favour {
    /// 用神
    Useful,
    #[default]
    Neutral,
    /// 忌神
    Avoid,
}

impl Favour {
    fn of(stem: TianGan, favored: &FavoredAvoid) -> Self {
        let element = stem.to_wuxing();
        if favored.is_favored(element) {
            Favour::Useful
        } else if favored.is_avoided(element) {
            Favour::Avoid
        } else {
            Favour::Neutral
        }
    }
}

/// 人生阶段
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum LifeStage {
    /// 打基础期
    #[default]
    Foundation,
    /// 拓展冲刺期
    Expansion,
    /// 调整转折期
    Transition,
    /// 沉淀收获期
    Consolidation,
}

impl LifeStage {
    pub fn name(&self) -> &'static str {
        match self {
            LifeStage::Foundation => "打基础期",
            LifeStage::Expansion => "拓展冲刺期",
            LifeStage::Transition => "调整转折期",
            LifeStage::Consolidation => "沉淀收获期",
        }
    }

    /// 流年标签的阶段修正（‰）
    fn highlight_factor(&self) -> i32 {
        match self {
            LifeStage::Foundation => 900,
            LifeStage::Expansion => 1100,
            LifeStage::Transition => 800,
            LifeStage::Consolidation => 1000,
        }
    }
}

/// 基调
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Tone {
    /// 内修
    Inward,
    /// 外拓
    #[default]
    Outward,
}

/// 节奏强弱
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Intensity {
    /// 偏平稳
    #[default]
    Steady,
    /// 起伏感较强
    Fluctuating,
    /// 变动明显
    Marked,
}

/// 主领域
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum LifeDomain {
    Career,
    Wealth,
    Family,
    Study,
    SelfGrowth,
}

/// 尚未起运时的主领域
pub const PRE_CYCLE_DOMAINS: [LifeDomain; 2] = [LifeDomain::Study, LifeDomain::Family];

/// 一步大运的判定结果
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleAnalysis {
    pub index: u8,
    pub cycle: LuckCycle,
    pub favour: Favour,
    /// 与原局四支的六冲数
    pub clash_count: u8,
    /// 力度（%）
    pub strength: u8,
    pub intensity: Intensity,
    pub stage: LifeStage,
    pub tone: Tone,
    pub domains: Vec<LifeDomain>,
}

struct RhythmContext<'a> {
    chart: &'a ChartModel,
    favored: &'a FavoredAvoid,
    weights: &'a AttributeWeights,
    weak_day_master: bool,
    /// 日主强弱 0~100
    dm_score: u8,
}

impl RhythmContext<'_> {
    fn natal_clashes(&self, zhi: DiZhi) -> u8 {
        self.chart.branches().iter().filter(|b| is_dizhi_liuchong(zhi, **b)).count() as u8
    }

    fn analyze_cycle(&self, index: u8, cycle: LuckCycle) -> CycleAnalysis {
        let favour = Favour::of(cycle.ganzhi.gan, self.favored);
        let clash_count = self.natal_clashes(cycle.ganzhi.zhi);

        let mut strength: i32 = 50;
        strength += match favour {
            Favour::Useful => 20,
            Favour::Avoid => -10,
            Favour::Neutral => 0,
        };
        strength += match clash_count {
            0 => 0,
            1 => 10,
            _ => 20,
        };
        if self.weak_day_master {
            strength += 10;
        }
        let strength = strength.clamp(0, 100) as u8;

        let group = cycle.shishen.group();
        let stage = match (group, favour) {
            (ShiShenGroup::Yin | ShiShenGroup::BiJie, Favour::Useful) => LifeStage::Foundation,
            (ShiShenGroup::Cai | ShiShenGroup::GuanSha, Favour::Useful) => LifeStage::Expansion,
            (ShiShenGroup::ShiShang, Favour::Useful) => LifeStage::Consolidation,
            _ if clash_count >= 2 || favour == Favour::Avoid => LifeStage::Transition,
            _ if self.dm_score < 80 => LifeStage::Foundation,
            _ => LifeStage::Consolidation,
        };

        let intensity = if strength >= 70 || clash_count >= 2 {
            Intensity::Marked
        } else if strength >= 40 {
            Intensity::Fluctuating
        } else {
            Intensity::Steady
        };

        let tone = match group {
            ShiShenGroup::Yin | ShiShenGroup::BiJie => Tone::Inward,
            _ => Tone::Outward,
        };

        let mut domains = match group {
            ShiShenGroup::Cai => vec![LifeDomain::Wealth, LifeDomain::Career],
            ShiShenGroup::GuanSha => vec![LifeDomain::Career, LifeDomain::Family],
            ShiShenGroup::ShiShang | ShiShenGroup::Yin => vec![LifeDomain::Study, LifeDomain::SelfGrowth],
            ShiShenGroup::BiJie => Vec::new(),
        };
        if self.weights.group(ShiShenGroup::Cai) > 3000 && !domains.contains(&LifeDomain::Wealth) {
            domains.push(LifeDomain::Wealth);
        }

        CycleAnalysis {
            index,
            cycle,
            favour,
            clash_count,
            strength,
            intensity,
            stage,
            tone,
            domains,
        }
    }

    /// 流年评分：喜忌 ±30、十神 ±10、冲日支 −10
    fn year_score(&self, ganzhi: GanZhi) -> i32 {
        let mut score = match Favour::of(ganzhi.gan, self.favored) {
            Favour::Useful => 30,
            Favour::Avoid => -30,
            Favour::Neutral => 0,
        };
        score += match ShiShen::from_gan(self.chart.day_master, ganzhi.gan) {
            ShiShen::ZhengCai | ShiShen::PianCai | ShiShen::ZhengGuan | ShiShen::ZhengYin => 10,
            ShiShen::QiSha | ShiShen::ShangGuan | ShiShen::JieCai => -10,
            _ => 0,
        };
        if is_dizhi_liuchong(ganzhi.zhi, self.chart.day.branch()) {
            score -= 10;
        }
        score.clamp(-100, 100)
    }
}

// ============================================================================
// 流年
// ============================================================================

/// 流年吉凶
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum FavourLevel {
    Good,
    Mixed,
    Bad,
    #[default]
    Neutral,
}

impl FavourLevel {
    pub fn from_score(score: i32) -> Self {
        if score >= 30 {
            FavourLevel::Good
        } else if score >= 10 {
            FavourLevel::Mixed
        } else if score <= -30 {
            FavourLevel::Bad
        } else if score <= -10 {
            FavourLevel::Mixed
        } else {
            FavourLevel::Neutral
        }
    }
}

/// 流年标签；最负面只到 `Trial`
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum HighlightTag {
    Opportunity,
    Smooth,
    #[default]
    Adjust,
    Trial,
}

impl HighlightTag {
    fn of(score: i32, favoured: bool, stage: LifeStage) -> Self {
        let adjusted = score * stage.highlight_factor() / 1000;
        if adjusted >= 30 && favoured {
            HighlightTag::Opportunity
        } else if adjusted >= 10 && favoured {
            HighlightTag::Smooth
        } else if adjusted <= -20 {
            HighlightTag::Trial
        } else {
            HighlightTag::Adjust
        }
    }
}

/// 流年简表条目
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnualBrief {
    pub year: u32,
    pub ganzhi: GanZhi,
    pub shishen: ShiShen,
    pub score: i8,
    pub favour_level: FavourLevel,
    pub highlight: HighlightTag,
    /// 该年所处大运序号
    pub luck_index: Option<u8>,
    pub in_current_luck: bool,
    pub is_current_year: bool,
}

/// 流年作用
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum YearEffect {
    /// 推动
    #[default]
    Push,
    /// 减速
    SlowDown,
    /// 提醒调整
    Adjust,
}

impl YearEffect {
    fn of(favour: Favour) -> Self {
        match favour {
            Favour::Useful => YearEffect::Push,
            Favour::Neutral => YearEffect::SlowDown,
            Favour::Avoid => YearEffect::Adjust,
        }
    }
}

#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct CurrentYear {
    pub year: u32,
    pub ganzhi: GanZhi,
    pub effect: YearEffect,
}

/// 未来几年走势
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ComingTrend {
    /// 整体偏顺
    Rising,
    /// 以调整为主
    Adjusting,
    /// 有起伏
    #[default]
    Undulating,
}

// ============================================================================
// 结果
// ============================================================================

/// 相邻大运摘要
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleSummary {
    pub ganzhi: GanZhi,
    pub shishen: ShiShen,
    pub favour: Favour,
    pub stage: LifeStage,
}

impl From<&CycleAnalysis> for CycleSummary {
    fn from(a: &CycleAnalysis) -> Self {
        Self { ganzhi: a.cycle.ganzhi, shishen: a.cycle.shishen, favour: a.favour, stage: a.stage }
    }
}

/// 阶段转换
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct StageShift {
    pub from: LifeStage,
    pub to: LifeStage,
}

#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum RhythmNote {
    /// 大运配合用神
    UsefulCycle,
    /// 大运冲原局
    NatalClash(u8),
    /// 处于调整转折期
    InTransition,
}

/// 行运节奏
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct LuckRhythm {
    pub phase: LuckPhase,
    pub current: Option<CycleAnalysis>,
    pub stage: LifeStage,
    pub tone: Tone,
    pub main_domains: Vec<LifeDomain>,
    pub prev: Option<CycleSummary>,
    pub next: Option<CycleSummary>,
    pub stage_shift: Option<StageShift>,
    pub current_year: Option<CurrentYear>,
    pub coming_trend: Option<ComingTrend>,
    pub notes: Vec<RhythmNote>,
    pub annual_brief: Vec<AnnualBrief>,
}

impl LuckRhythm {
    /// 未起运的固定描述
    pub fn pre_cycle() -> Self {
        Self {
            phase: LuckPhase::PreCycle,
            stage: LifeStage::Foundation,
            tone: Tone::Outward,
            main_domains: PRE_CYCLE_DOMAINS.to_vec(),
            ..Default::default()
        }
    }
}

/// "现在"与窗口，全部由调用方传入
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RhythmParams {
    pub current_age: u8,
    pub current_year: u32,
    /// 流年简表年数
    pub annual_window: u32,
    /// 走势统计年数
    pub coming_years: u32,
}

/// 推导行运节奏
pub fn analyze(
    chart: &ChartModel,
    strength: &StrengthAnalysis,
    weights: &AttributeWeights,
    favored: &FavoredAvoid,
    cycles: &[LuckCycle],
    params: &RhythmParams,
) -> LuckRhythm {
    if !is_contiguous(cycles) {
        log::warn!(target: crate::LOG_TARGET, "⚠️ 大运表不连续，按首个命中的大运处理");
    }

    let index = match phase_at(cycles, params.current_age) {
        LuckPhase::PreCycle => return LuckRhythm::pre_cycle(),
        LuckPhase::BeyondCycles => {
            log::debug!(target: crate::LOG_TARGET, "🔮 超出大运表，年龄 {}", params.current_age);
            return LuckRhythm { phase: LuckPhase::BeyondCycles, ..Default::default() };
        },
        LuckPhase::WithinCycle(i) => i,
    };

    let ctx = RhythmContext {
        chart,
        favored,
        weights,
        weak_day_master: strength.score < 50,
        dm_score: strength.score,
    };
    let i = index as usize;
    let current = ctx.analyze_cycle(index, cycles[i]);
    let prev = i.checked_sub(1).map(|p| ctx.analyze_cycle(p as u8, cycles[p]));
    let next = cycles.get(i + 1).map(|c| ctx.analyze_cycle(index + 1, *c));

    let stage_shift = match (&prev, &next) {
        (Some(p), Some(n)) if p.stage != current.stage && n.stage != current.stage =>
            Some(StageShift { from: p.stage, to: n.stage }),
        (Some(p), Some(_)) if p.stage != current.stage =>
            Some(StageShift { from: p.stage, to: current.stage }),
        (Some(_), Some(n)) if n.stage != current.stage =>
            Some(StageShift { from: current.stage, to: n.stage }),
        _ => None,
    };

    let year_ganzhi = GanZhi::from_year(params.current_year);
    let current_year = CurrentYear {
        year: params.current_year,
        ganzhi: year_ganzhi,
        effect: YearEffect::of(Favour::of(year_ganzhi.gan, favored)),
    };

    let coming: Vec<YearEffect> = (1..=params.coming_years)
        .map(|k| {
            let ganzhi = GanZhi::from_year(params.current_year.saturating_add(k));
            YearEffect::of(Favour::of(ganzhi.gan, favored))
        })
        .collect();
    let pushes = coming.iter().filter(|e| **e == YearEffect::Push).count();
    let adjusts = coming.iter().filter(|e| **e == YearEffect::Adjust).count();
    let coming_trend = if pushes >= 2 {
        ComingTrend::Rising
    } else if adjusts >= 2 {
        ComingTrend::Adjusting
    } else {
        ComingTrend::Undulating
    };

    let mut notes = Vec::new();
    if current.favour == Favour::Useful {
        notes.push(RhythmNote::UsefulCycle);
    }
    if current.clash_count > 0 {
        notes.push(RhythmNote::NatalClash(current.clash_count));
    }
    if current.stage == LifeStage::Transition {
        notes.push(RhythmNote::InTransition);
    }

    // 年份溢出处截断，保证逐年严格递增
    let annual_brief = (0..params.annual_window)
        .map_while(|k| params.current_year.checked_add(k).map(|year| (k, year)))
        .map(|(k, year)| {
            let ganzhi = GanZhi::from_year(year);
            let score = ctx.year_score(ganzhi);
            let favoured = favored.is_favored(ganzhi.gan.to_wuxing());
            let age = params.current_age.saturating_add(k.min(u8::MAX as u32) as u8);
            let luck_index = match phase_at(cycles, age) {
                LuckPhase::WithinCycle(j) => Some(j),
                _ => None,
            };
            AnnualBrief {
                year,
                ganzhi,
                shishen: ShiShen::from_gan(chart.day_master, ganzhi.gan),
                score: score as i8,
                favour_level: FavourLevel::from_score(score),
                highlight: HighlightTag::of(score, favoured, current.stage),
                luck_index,
                in_current_luck: luck_index == Some(index),
                is_current_year: k == 0,
            }
        })
        .collect();

    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 行运: 第 {} 步 {} 力度 {}",
        index,
        current.stage.name(),
        current.strength
    );

    LuckRhythm {
        phase: LuckPhase::WithinCycle(index),
        stage: current.stage,
        tone: current.tone,
        main_domains: current.domains.clone(),
        prev: prev.as_ref().map(CycleSummary::from),
        next: next.as_ref().map(CycleSummary::from),
        stage_shift,
        current_year: Some(current_year),
        coming_trend: Some(coming_trend),
        notes,
        annual_brief,
        current: Some(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::chart_of;
    use crate::types::WuXing;

    // 甲子 丙寅 甲午 庚午，甲木日主
    fn chart() -> ChartModel {
        chart_of([(0, 0), (2, 2), (0, 6), (6, 6)])
    }

    fn favored() -> FavoredAvoid {
        FavoredAvoid {
            favored: vec![WuXing::Huo, WuXing::Tu],
            avoid: vec![WuXing::Shui, WuXing::Mu],
            ..Default::default()
        }
    }

    fn params(current_age: u8, current_year: u32) -> RhythmParams {
        RhythmParams { current_age, current_year, annual_window: 10, coming_years: 3 }
    }

    fn run(cycles: &[LuckCycle], current_age: u8, current_year: u32) -> LuckRhythm {
        let strength = StrengthAnalysis { score: 60, ..Default::default() };
        analyze(
            &chart(),
            &strength,
            &AttributeWeights::default(),
            &favored(),
            cycles,
            &params(current_age, current_year),
        )
    }

    #[test]
    fn test_build_cycles_direction() {
        // 甲年阳干：男顺女逆
        let male = build_luck_cycles(&chart(), Gender::Male, 3, 8);
        assert_eq!(male.len(), 8);
        assert_eq!(male[0].ganzhi, GanZhi { gan: TianGan(3), zhi: DiZhi(3) });
        assert_eq!(male[1].ganzhi, GanZhi { gan: TianGan(4), zhi: DiZhi(4) });
        assert_eq!(male[0].shishen, ShiShen::ShangGuan);
        assert_eq!((male[0].start_age, male[0].end_age), (3, 13));

        let female = build_luck_cycles(&chart(), Gender::Female, 3, 8);
        assert_eq!(female[0].ganzhi, GanZhi { gan: TianGan(1), zhi: DiZhi(1) });

        assert_eq!(build_luck_cycles(&chart(), Gender::Male, 3, 40).len(), 12);
    }

    #[test]
    fn test_cycles_are_gapless() {
        let cycles = build_luck_cycles(&chart(), Gender::Male, 7, 12);
        assert!(is_contiguous(&cycles));
        for age in 0..=u8::MAX {
            let hits = cycles.iter().filter(|c| c.start_age <= age && age < c.end_age).count();
            if age < 7 {
                assert_eq!(hits, 0);
                assert_eq!(phase_at(&cycles, age), LuckPhase::PreCycle);
            } else if age < 127 {
                assert_eq!(hits, 1);
                assert_eq!(phase_at(&cycles, age), LuckPhase::WithinCycle((age - 7) / 10));
            } else {
                assert_eq!(phase_at(&cycles, age), LuckPhase::BeyondCycles);
            }
        }
        assert_eq!(phase_at(&[], 30), LuckPhase::BeyondCycles);
    }

    #[test]
    fn test_pre_cycle_descriptor() {
        let cycles = build_luck_cycles(&chart(), Gender::Male, 5, 8);
        let rhythm = run(&cycles, 4, 2024);
        assert_eq!(rhythm.phase, LuckPhase::PreCycle);
        assert_eq!(rhythm.main_domains, PRE_CYCLE_DOMAINS.to_vec());
        assert_eq!(rhythm.stage, LifeStage::Foundation);
        assert!(rhythm.current.is_none());
        assert!(rhythm.annual_brief.is_empty());
    }

    #[test]
    fn test_within_cycle_analysis() {
        // 第一步 丁卯：伤官，丁火为用
        let cycles = build_luck_cycles(&chart(), Gender::Male, 3, 8);
        let rhythm = run(&cycles, 5, 2026);
        let current = rhythm.current.clone().expect("within cycle");
        assert_eq!(rhythm.phase, LuckPhase::WithinCycle(0));
        assert_eq!(current.favour, Favour::Useful);
        assert_eq!(current.clash_count, 0);
        assert_eq!(current.strength, 70);
        assert_eq!(current.intensity, Intensity::Marked);
        assert_eq!(rhythm.stage, LifeStage::Consolidation);
        assert_eq!(rhythm.tone, Tone::Outward);
        assert_eq!(rhythm.main_domains, vec![LifeDomain::Study, LifeDomain::SelfGrowth]);
        assert!(rhythm.prev.is_none());
        // 第二步 戊辰：偏财，戊土为用
        let next = rhythm.next.expect("has next");
        assert_eq!(next.shishen, ShiShen::PianCai);
        assert_eq!(next.stage, LifeStage::Expansion);
        assert_eq!(rhythm.notes, vec![RhythmNote::UsefulCycle]);
    }

    #[test]
    fn test_avoid_cycle_with_clash_is_transition() {
        // 壬子运：壬水为忌，子冲日支与时支两个午
        let cycle = LuckCycle {
            ganzhi: GanZhi { gan: TianGan(8), zhi: DiZhi(0) },
            start_age: 0,
            end_age: 10,
            shishen: ShiShen::PianYin,
        };
        let rhythm = run(&[cycle], 3, 2026);
        let current = rhythm.current.expect("within cycle");
        assert_eq!(current.favour, Favour::Avoid);
        assert_eq!(current.clash_count, 2);
        assert_eq!(current.stage, LifeStage::Transition);
        assert_eq!(rhythm.notes, vec![RhythmNote::NatalClash(2), RhythmNote::InTransition]);
    }

    #[test]
    fn test_annual_brief_scoring() {
        let cycles = build_luck_cycles(&chart(), Gender::Male, 3, 8);
        let rhythm = run(&cycles, 5, 2024);
        let brief = &rhythm.annual_brief;
        assert_eq!(brief.len(), 10);
        for pair in brief.windows(2) {
            assert!(pair[0].year < pair[1].year);
        }

        // 2024 甲辰：比肩，木为忌
        assert_eq!((brief[0].score, brief[0].favour_level), (-30, FavourLevel::Bad));
        assert_eq!(brief[0].highlight, HighlightTag::Trial);
        // 2026 丙午：食神，火为用
        assert_eq!((brief[2].score, brief[2].favour_level), (30, FavourLevel::Good));
        assert_eq!(brief[2].highlight, HighlightTag::Opportunity);
        // 2027 丁未：伤官
        assert_eq!((brief[3].score, brief[3].favour_level), (20, FavourLevel::Mixed));
        assert_eq!(brief[3].highlight, HighlightTag::Smooth);
        // 2030 庚戌：七杀
        assert_eq!((brief[6].score, brief[6].favour_level), (-10, FavourLevel::Mixed));
        assert_eq!(brief[6].highlight, HighlightTag::Adjust);
        // 2032 壬子：水为忌，子冲日支午
        assert_eq!(brief[8].score, -40);

        // 5 岁起第 0 步大运至 13 岁止
        assert!(brief[0].is_current_year && !brief[1].is_current_year);
        assert_eq!(brief[7].luck_index, Some(0));
        assert!(brief[7].in_current_luck);
        assert_eq!(brief[8].luck_index, Some(1));
        assert!(!brief[8].in_current_luck);
    }

    #[test]
    fn test_current_year_and_trend() {
        let cycles = build_luck_cycles(&chart(), Gender::Male, 3, 8);
        let rhythm = run(&cycles, 5, 2026);
        assert_eq!(rhythm.current_year.map(|y| y.effect), Some(YearEffect::Push));
        // 2027 丁、2028 戊、2029 己 皆为用
        assert_eq!(rhythm.coming_trend, Some(ComingTrend::Rising));

        let rhythm = run(&cycles, 5, 2031);
        // 2031 辛亥：金为中性
        assert_eq!(rhythm.current_year.map(|y| y.effect), Some(YearEffect::SlowDown));
        // 2032 壬、2033 癸、2034 甲 皆为忌
        assert_eq!(rhythm.coming_trend, Some(ComingTrend::Adjusting));
    }

    #[test]
    fn test_year_arithmetic_stops_at_overflow() {
        let cycles = build_luck_cycles(&chart(), Gender::Male, 3, 8);
        let rhythm = run(&cycles, 5, u32::MAX - 2);
        let years: Vec<u32> = rhythm.annual_brief.iter().map(|b| b.year).collect();
        assert_eq!(years, vec![u32::MAX - 2, u32::MAX - 1, u32::MAX]);
        assert!(rhythm.coming_trend.is_some());
    }

    #[test]
    fn test_favour_level_thresholds() {
        assert_eq!(FavourLevel::from_score(30), FavourLevel::Good);
        assert_eq!(FavourLevel::from_score(9), FavourLevel::Neutral);
        assert_eq!(FavourLevel::from_score(-10), FavourLevel::Mixed);
        assert_eq!(FavourLevel::from_score(-30), FavourLevel::Bad);
    }
}
