//! # 格局纯度（成败救应）
//!
//! 1. 逐条检查破格因素，互不短路；
//! 2. 按主格筛掉与之无关的破格（伤官见官只论带官之格，比劫夺财只论带财之格……），
//!    通用破格（官杀混杂、印重身埋、财多身弱、食伤过旺、比劫成群、根气受损）各格皆论；
//! 3. 正官、财、印诸格另查用神天干：透出而被合（官星被合、财星被合、印星被合），
//!    正官透出而地支无根（官星无根）；
//! 4. 只针对已成立的破格寻找救应，同一救应只记一次。
//!
//! `纯度 = 基准 − Σ破格扣分 + min(Σ救应加分, 50)`，截断到 0~100。
//! 基准 100，特殊格局 95。救应方力量未过有效线时，加分打六折。
//!
//! 所有判定都基于十神权重（万分比，主导类为 10000）。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_std::prelude::*;

use crate::chart::ChartModel;
use crate::constants::{is_dizhi_liuchong, tiangan_he};
use crate::dogong::FlowTemplate;
use crate::strength::StrengthAnalysis;
use crate::structure::{AttributeWeights, Pattern, StructureAnalysis};
use crate::types::{PillarPosition, ShiShen, ShiShenGroup, TianGan};

const BASE_SCORE: u32 = 100;
const SPECIAL_BASE_SCORE: u32 = 95;
const MAX_RESCUE_BONUS: u32 = 50;
/// 救应不足时的加分折扣（%）
const PARTIAL_RESCUE_RATIO: u32 = 60;

// ============================================================================
// 破格 / 救应目录
// ============================================================================

/// 破格因素
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum BreakingFactor {
    ShangGuanJianGuan,
    GuanShaHunZa,
    ShaZhongWuZhi,
    XiaoShenDuoShi,
    BiJieDuoCai,
    CaiXingHuaiYin,
    GenQiShouSun,
    YinZhongShenMai,
    CaiDuoShenRuo,
    ShiShangGuoWang,
    BiJieChengQun,
    /// 七杀格专论
    ZhiShaTaiGuo,
    /// 七杀格专论
    ShaRuoShenQiang,
    GuanXingBeiHe,
    GuanXingWuGen,
    CaiXingBeiHe,
    YinXingBeiHe,
}

impl BreakingFactor {
    pub const ALL: [BreakingFactor; 17] = [
        BreakingFactor::ShangGuanJianGuan,
        BreakingFactor::GuanShaHunZa,
        BreakingFactor::ShaZhongWuZhi,
        BreakingFactor::XiaoShenDuoShi,
        BreakingFactor::BiJieDuoCai,
        BreakingFactor::CaiXingHuaiYin,
        BreakingFactor::GenQiShouSun,
        BreakingFactor::YinZhongShenMai,
        BreakingFactor::CaiDuoShenRuo,
        BreakingFactor::ShiShangGuoWang,
        BreakingFactor::BiJieChengQun,
        BreakingFactor::ZhiShaTaiGuo,
        BreakingFactor::ShaRuoShenQiang,
        BreakingFactor::GuanXingBeiHe,
        BreakingFactor::GuanXingWuGen,
        BreakingFactor::CaiXingBeiHe,
        BreakingFactor::YinXingBeiHe,
    ];

    pub fn penalty(&self) -> u32 {
        match self {
            BreakingFactor::ShangGuanJianGuan |
            BreakingFactor::GuanShaHunZa |
            BreakingFactor::ShaZhongWuZhi => 10,
            BreakingFactor::XiaoShenDuoShi => 9,
            BreakingFactor::BiJieDuoCai |
            BreakingFactor::CaiXingHuaiYin |
            BreakingFactor::ZhiShaTaiGuo => 8,
            BreakingFactor::GuanXingBeiHe | BreakingFactor::CaiXingBeiHe => 7,
            BreakingFactor::GenQiShouSun |
            BreakingFactor::ShaRuoShenQiang |
            BreakingFactor::GuanXingWuGen |
            BreakingFactor::YinXingBeiHe => 6,
            BreakingFactor::YinZhongShenMai | BreakingFactor::CaiDuoShenRuo => 3,
            BreakingFactor::ShiShangGuoWang | BreakingFactor::BiJieChengQun => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BreakingFactor::ShangGuanJianGuan => "伤官见官",
            BreakingFactor::GuanShaHunZa => "官杀混杂",
            BreakingFactor::ShaZhongWuZhi => "杀重无制",
            BreakingFactor::XiaoShenDuoShi => "枭神夺食",
            BreakingFactor::BiJieDuoCai => "比劫夺财",
            BreakingFactor::CaiXingHuaiYin => "财星坏印",
            BreakingFactor::GenQiShouSun => "根气受损",
            BreakingFactor::YinZhongShenMai => "印重身埋",
            BreakingFactor::CaiDuoShenRuo => "财多身弱",
            BreakingFactor::ShiShangGuoWang => "食伤过旺",
            BreakingFactor::BiJieChengQun => "比劫成群",
            BreakingFactor::ZhiShaTaiGuo => "制杀太过",
            BreakingFactor::ShaRuoShenQiang => "杀弱身强",
            BreakingFactor::GuanXingBeiHe => "官星被合",
            BreakingFactor::GuanXingWuGen => "官星无根",
            BreakingFactor::CaiXingBeiHe => "财星被合",
            BreakingFactor::YinXingBeiHe => "印星被合",
        }
    }

    /// 是否与主格相关
    pub fn applies_to(&self, pattern: Pattern) -> bool {
        let special = pattern.is_special();
        match self {
            BreakingFactor::ShangGuanJianGuan => !special && carries_officer(pattern),
            BreakingFactor::BiJieDuoCai => !special && carries_wealth(pattern),
            BreakingFactor::CaiXingHuaiYin => !special && carries_seal(pattern),
            BreakingFactor::XiaoShenDuoShi =>
                matches!(pattern, Pattern::ShiShen | Pattern::ShiShenShengCai),
            BreakingFactor::ShaZhongWuZhi |
            BreakingFactor::ZhiShaTaiGuo |
            BreakingFactor::ShaRuoShenQiang => pattern == Pattern::QiSha,
            BreakingFactor::GuanXingBeiHe | BreakingFactor::GuanXingWuGen =>
                pattern == Pattern::ZhengGuan,
            BreakingFactor::CaiXingBeiHe => matches!(pattern, Pattern::ZhengCai | Pattern::PianCai),
            BreakingFactor::YinXingBeiHe => matches!(pattern, Pattern::ZhengYin | Pattern::PianYin),
            BreakingFactor::GuanShaHunZa |
            BreakingFactor::GenQiShouSun |
            BreakingFactor::YinZhongShenMai |
            BreakingFactor::CaiDuoShenRuo |
            BreakingFactor::ShiShangGuoWang |
            BreakingFactor::BiJieChengQun => true,
        }
    }

    fn detect(&self, ctx: &Context) -> bool {
        let w = ctx.weights;
        let sha = w.get(ShiShen::QiSha);
        match self {
            BreakingFactor::ShangGuanJianGuan =>
                w.get(ShiShen::ShangGuan) >= 5000 && w.get(ShiShen::ZhengGuan) >= 3000,
            BreakingFactor::GuanShaHunZa => w.get(ShiShen::ZhengGuan) >= 5000 && sha >= 5000,
            BreakingFactor::ShaZhongWuZhi => sha >= 7000 && w.get(ShiShen::ShiShen) < 3000,
            BreakingFactor::XiaoShenDuoShi =>
                w.get(ShiShen::PianYin) >= 6000 && w.get(ShiShen::ShiShen) >= 3000,
            BreakingFactor::BiJieDuoCai => ctx.bi >= 7000 && ctx.cai >= 3000,
            BreakingFactor::CaiXingHuaiYin => ctx.cai >= 8000 && ctx.yin >= 3000,
            BreakingFactor::GenQiShouSun => ctx.clashes >= 2,
            BreakingFactor::YinZhongShenMai => ctx.yin >= 9000 && ctx.bi < 3000,
            BreakingFactor::CaiDuoShenRuo => ctx.cai >= 9000 && ctx.weak,
            BreakingFactor::ShiShangGuoWang => ctx.shi >= 9000 && ctx.strength_score < 50,
            BreakingFactor::BiJieChengQun => ctx.bi >= 9000 && ctx.cai < 2000 && ctx.guan < 2000,
            BreakingFactor::ZhiShaTaiGuo =>
                sha >= 5000 &&
                    (w.get(ShiShen::ShiShen) * 2 > sha * 3 || ctx.yin * 2 > sha * 3),
            BreakingFactor::ShaRuoShenQiang => sha < 3000 && ctx.strength_score > 70,
            BreakingFactor::GuanXingBeiHe |
            BreakingFactor::CaiXingBeiHe |
            BreakingFactor::YinXingBeiHe => key_star(ctx.pattern)
                .and_then(|star| revealed_stem(ctx.chart, star))
                .map_or(false, |stem| is_combined(ctx.chart, stem)),
            BreakingFactor::GuanXingWuGen => revealed_stem(ctx.chart, ShiShen::ZhengGuan)
                .map_or(false, |stem| !has_root(ctx.chart, stem)),
        }
    }

    /// 针对本破格的救应，返回 (救应, 是否有效)
    fn rescue(&self, ctx: &Context, present: &[BreakingFactor]) -> Option<(RescueFactor, bool)> {
        // 本身过旺的一方不能再去救人
        let shi_usable = !present.contains(&BreakingFactor::ShiShangGuoWang);
        let yin_usable = !present.contains(&BreakingFactor::YinZhongShenMai);
        let bi_usable = !present.contains(&BreakingFactor::BiJieChengQun);
        let cai_usable = !present.contains(&BreakingFactor::CaiDuoShenRuo);
        match self {
            BreakingFactor::ShangGuanJianGuan if yin_usable && ctx.yin > 5000 =>
                Some((RescueFactor::YinZhiShang, ctx.yin > 7000)),
            // 印化杀不受印旺限制
            BreakingFactor::GuanShaHunZa if ctx.yin > 6000 => Some((RescueFactor::YinHuaSha, true)),
            BreakingFactor::GuanShaHunZa if shi_usable && ctx.shi * 10 > ctx.guan * 8 =>
                Some((RescueFactor::ShiShangZhiGuan, true)),
            BreakingFactor::BiJieDuoCai if ctx.guan > 5000 =>
                Some((RescueFactor::GuanXingZhiJie, ctx.guan > 7000)),
            BreakingFactor::CaiXingHuaiYin if bi_usable && ctx.bi > 5000 =>
                Some((RescueFactor::BiJieJieWei, ctx.bi > 7000)),
            BreakingFactor::CaiXingHuaiYin if ctx.guan > 5000 =>
                Some((RescueFactor::GuanXingShengYin, ctx.guan > 7000)),
            BreakingFactor::CaiDuoShenRuo
                if shi_usable && carries_wealth(ctx.pattern) && ctx.shi > 5000 =>
                Some((RescueFactor::ShiShangShengCai, ctx.shi > 7000)),
            BreakingFactor::XiaoShenDuoShi if cai_usable && ctx.cai > 5000 =>
                Some((RescueFactor::CaiXingZhiYin, ctx.cai > 7000)),
            BreakingFactor::ShaZhongWuZhi if shi_usable && ctx.shi > 5000 =>
                Some((RescueFactor::ShiShenZhiSha, ctx.shi > 7000)),
            BreakingFactor::ShaZhongWuZhi if yin_usable && ctx.yin > 5000 =>
                Some((RescueFactor::YinHuaSha, ctx.yin > 7000)),
            BreakingFactor::BiJieChengQun if shi_usable && ctx.shi > 4000 =>
                Some((RescueFactor::ShiShangXieXiu, ctx.shi > 6000)),
            BreakingFactor::YinZhongShenMai
                if shi_usable && ctx.shi > 4000 && ctx.strength_score > 50 =>
                Some((RescueFactor::ShiShangXieXiu, ctx.shi > 6000)),
            _ => None,
        }
    }
}

/// 主格名里带官（伤官格亦在此列）
fn carries_officer(pattern: Pattern) -> bool {
    matches!(
        pattern,
        Pattern::ZhengGuan |
            Pattern::ShangGuan |
            Pattern::ShangGuanPeiYin |
            Pattern::CaiGuanShuangMei |
            Pattern::GuanYinXiangSheng
    )
}

fn carries_wealth(pattern: Pattern) -> bool {
    matches!(
        pattern,
        Pattern::ZhengCai | Pattern::PianCai | Pattern::ShiShenShengCai | Pattern::CaiGuanShuangMei
    )
}

/// 正官、财、印诸格的用神
fn key_star(pattern: Pattern) -> Option<ShiShen> {
    match pattern {
        Pattern::ZhengGuan => Some(ShiShen::ZhengGuan),
        Pattern::ZhengCai => Some(ShiShen::ZhengCai),
        Pattern::PianCai => Some(ShiShen::PianCai),
        Pattern::ZhengYin => Some(ShiShen::ZhengYin),
        Pattern::PianYin => Some(ShiShen::PianYin),
        _ => None,
    }
}

/// 某十神透出的天干（年、月、时干依次找）
fn revealed_stem(chart: &ChartModel, star: ShiShen) -> Option<TianGan> {
    chart
        .pillars()
        .into_iter()
        .filter(|(position, _)| *position != PillarPosition::Day)
        .find(|(_, pillar)| pillar.stem_category(chart.day_master) == star)
        .map(|(_, pillar)| pillar.stem())
}

/// 与四柱任一天干五合
fn is_combined(chart: &ChartModel, stem: TianGan) -> bool {
    chart.pillars().iter().any(|(_, pillar)| tiangan_he(stem, pillar.stem()).is_some())
}

/// 四支藏干中有同一天干
fn has_root(chart: &ChartModel, stem: TianGan) -> bool {
    chart
        .pillars()
        .iter()
        .any(|(_, pillar)| pillar.hidden_stems.iter().any(|hidden| hidden.gan == stem))
}

fn carries_seal(pattern: Pattern) -> bool {
    matches!(
        pattern,
        Pattern::ZhengYin |
            Pattern::PianYin |
            Pattern::ShangGuanPeiYin |
            Pattern::ShaYinXiangSheng |
            Pattern::GuanYinXiangSheng
    )
}

/// 救应因素
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum RescueFactor {
    YinZhiShang,
    YinHuaSha,
    ShiShenZhiSha,
    ShiShangXieXiu,
    ShiShangZhiGuan,
    GuanXingZhiJie,
    CaiXingZhiYin,
    BiJieJieWei,
    GuanXingShengYin,
    ShiShangShengCai,
}

impl RescueFactor {
    pub fn bonus(&self) -> u32 {
        match self {
            RescueFactor::YinZhiShang | RescueFactor::YinHuaSha | RescueFactor::ShiShenZhiSha => 10,
            RescueFactor::ShiShangXieXiu | RescueFactor::ShiShangZhiGuan => 9,
            RescueFactor::GuanXingZhiJie | RescueFactor::CaiXingZhiYin => 8,
            RescueFactor::BiJieJieWei |
            RescueFactor::GuanXingShengYin |
            RescueFactor::ShiShangShengCai => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RescueFactor::YinZhiShang => "印星制伤",
            RescueFactor::YinHuaSha => "印星化杀",
            RescueFactor::ShiShenZhiSha => "食神制杀",
            RescueFactor::ShiShangXieXiu => "食伤泄秀",
            RescueFactor::ShiShangZhiGuan => "食伤制官",
            RescueFactor::GuanXingZhiJie => "官星制劫",
            RescueFactor::CaiXingZhiYin => "财星制印",
            RescueFactor::BiJieJieWei => "比劫解围",
            RescueFactor::GuanXingShengYin => "官星生印",
            RescueFactor::ShiShangShengCai => "食伤生财",
        }
    }

    /// 对应的做功模板
    pub fn template(&self) -> Option<FlowTemplate> {
        match self {
            RescueFactor::YinZhiShang => Some(FlowTemplate::ShangGuanPeiYin),
            RescueFactor::YinHuaSha => Some(FlowTemplate::YinHuaSha),
            RescueFactor::ShiShenZhiSha => Some(FlowTemplate::ShiShenZhiSha),
            RescueFactor::ShiShangXieXiu => Some(FlowTemplate::ShiShangXieXiu),
            RescueFactor::GuanXingZhiJie => Some(FlowTemplate::GuanXingZhiJie),
            RescueFactor::BiJieJieWei => Some(FlowTemplate::YinBiHuShen),
            RescueFactor::GuanXingShengYin => Some(FlowTemplate::GuanYinXiangSheng),
            RescueFactor::ShiShangShengCai => Some(FlowTemplate::ShiShangShengCai),
            RescueFactor::ShiShangZhiGuan | RescueFactor::CaiXingZhiYin => None,
        }
    }
}

/// 救应命中
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct RescueHit {
    pub factor: RescueFactor,
    /// 所救的破格
    pub target: BreakingFactor,
    /// 救应方过有效线
    pub effective: bool,
}

impl RescueHit {
    pub fn bonus(&self) -> u32 {
        if self.effective {
            self.factor.bonus()
        } else {
            self.factor.bonus() * PARTIAL_RESCUE_RATIO / 100
        }
    }
}

// ============================================================================
// 结果
// ============================================================================

/// 成败等级（由低到高）
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, PartialOrd, Ord,
    Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PurityLevel {
    /// 破格
    Broken,
    /// 有病
    Flawed,
    /// 平常
    #[default]
    Moderate,
    /// 有救
    Rescued,
    /// 真格
    Genuine,
}

impl PurityLevel {
    pub fn name(&self) -> &'static str {
        match self {
            PurityLevel::Broken => "破格",
            PurityLevel::Flawed => "格局有病",
            PurityLevel::Moderate => "格局平常",
            PurityLevel::Rescued => "败中有救",
            PurityLevel::Genuine => "真格",
        }
    }
}

/// 清浊
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Clarity {
    ShangQing,
    ZhongShangQing,
    ZhongQing,
    #[default]
    ZhongXiaQing,
    ZhongZhuo,
    XiaZhuo,
}

impl Clarity {
    pub fn from_score(score: u8) -> Self {
        if score >= 95 {
            Clarity::ShangQing
        } else if score >= 85 {
            Clarity::ZhongShangQing
        } else if score >= 75 {
            Clarity::ZhongQing
        } else if score >= 65 {
            Clarity::ZhongXiaQing
        } else if score >= 45 {
            Clarity::ZhongZhuo
        } else {
            Clarity::XiaZhuo
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Clarity::ShangQing => "上清",
            Clarity::ZhongShangQing => "中上清",
            Clarity::ZhongQing => "中清",
            Clarity::ZhongXiaQing => "中下清",
            Clarity::ZhongZhuo => "中浊",
            Clarity::XiaZhuo => "下浊",
        }
    }
}

/// 格局纯度
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternPurity {
    pub score: u8,
    pub level: PurityLevel,
    pub clarity: Clarity,
    pub breaking_factors: Vec<BreakingFactor>,
    pub rescue_factors: Vec<RescueHit>,
    pub penalty: u32,
    pub bonus: u32,
}

impl PatternPurity {
    pub fn has_breaking(&self, factor: BreakingFactor) -> bool {
        self.breaking_factors.contains(&factor)
    }

    pub fn has_rescue(&self, factor: RescueFactor) -> bool {
        self.rescue_factors.iter().any(|hit| hit.factor == factor)
    }

    /// 命中救应对应的做功模板
    pub fn rescue_templates(&self) -> impl Iterator<Item = FlowTemplate> + '_ {
        self.rescue_factors.iter().filter_map(|hit| hit.factor.template())
    }
}

// ============================================================================
// 计算
// ============================================================================

struct Context<'a> {
    chart: &'a ChartModel,
    pattern: Pattern,
    weights: &'a AttributeWeights,
    bi: u32,
    shi: u32,
    cai: u32,
    guan: u32,
    yin: u32,
    weak: bool,
    strength_score: u8,
    clashes: usize,
}

/// 计算格局纯度
pub fn analyze(
    chart: &ChartModel,
    structure: &StructureAnalysis,
    strength: &StrengthAnalysis,
) -> PatternPurity {
    let w = &structure.weights;
    let branches = chart.branches();
    let mut clashes = 0;
    for i in 0..branches.len() {
        for j in i + 1..branches.len() {
            if is_dizhi_liuchong(branches[i], branches[j]) {
                clashes += 1;
            }
        }
    }
    let ctx = Context {
        chart,
        pattern: structure.pattern,
        weights: w,
        bi: w.group(ShiShenGroup::BiJie),
        shi: w.group(ShiShenGroup::ShiShang),
        cai: w.group(ShiShenGroup::Cai),
        guan: w.group(ShiShenGroup::GuanSha),
        yin: w.group(ShiShenGroup::Yin),
        weak: strength.band.is_weak_side(),
        strength_score: strength.score,
        clashes,
    };

    let breaking_factors: Vec<BreakingFactor> = BreakingFactor::ALL
        .into_iter()
        .filter(|f| f.applies_to(ctx.pattern) && f.detect(&ctx))
        .collect();
    let mut rescue_factors: Vec<RescueHit> = Vec::new();
    for target in &breaking_factors {
        if let Some((factor, effective)) = target.rescue(&ctx, &breaking_factors) {
            if !rescue_factors.iter().any(|hit| hit.factor == factor) {
                rescue_factors.push(RescueHit { factor, target: *target, effective });
            }
        }
    }

    let base = if structure.pattern.is_special() { SPECIAL_BASE_SCORE } else { BASE_SCORE };
    let penalty: u32 = breaking_factors.iter().map(|f| f.penalty()).sum();
    let bonus: u32 = rescue_factors.iter().map(|h| h.bonus()).sum::<u32>().min(MAX_RESCUE_BONUS);
    let score = (base + bonus).saturating_sub(penalty).min(100) as u8;
    let level = level_of(&breaking_factors, &rescue_factors, penalty, bonus);

    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 格局纯度: {} {} (破 {} 救 {})",
        score,
        level.name(),
        breaking_factors.len(),
        rescue_factors.len()
    );

    PatternPurity {
        score,
        level,
        clarity: Clarity::from_score(score),
        breaking_factors,
        rescue_factors,
        penalty,
        bonus,
    }
}

/// 无破格为平常；破格皆被有效救应且加分多于扣分为真格（去病得药）
fn level_of(breaking: &[BreakingFactor], rescues: &[RescueHit], penalty: u32, bonus: u32) -> PurityLevel {
    if breaking.is_empty() {
        return PurityLevel::Moderate;
    }
    let all_cured = breaking
        .iter()
        .all(|f| rescues.iter().any(|hit| hit.target == *f && hit.effective));
    if all_cured && bonus > penalty {
        PurityLevel::Genuine
    } else if bonus == 0 {
        PurityLevel::Broken
    } else if bonus * 10 >= penalty * 8 {
        PurityLevel::Rescued
    } else {
        PurityLevel::Flawed
    }
}
