//! # 官财格局
//!
//! 由十神权重、格局纯度与做功路径推导事业 / 财富维度的分类：
//! 官星类型与结构、官财力度、财星类型与根气、收入模式、稳定性、风险与助力。
//!
//! 纯查表 / 阈值逻辑，不做搜索。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_std::prelude::*;

use crate::chart::ChartModel;
use crate::dogong::{FlowTemplate, WorkPath};
use crate::favored::FavoredAvoid;
use crate::purity::{BreakingFactor, PatternPurity, RescueFactor};
use crate::strength::StrengthAnalysis;
use crate::structure::AttributeWeights;
use crate::types::{ShenSha, ShiShen, ShiShenGroup};

/// 官星混杂判定：正官与七杀差距占官杀总量不足 25%
const MIXED_OFFICER_GAP_PCT: u32 = 25;

const MAX_RELATED_LINES: usize = 3;

// ============================================================================
// 分类
// ============================================================================

/// 官星类型
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum OfficerType {
    /// 无官杀
    #[default]
    Absent,
    /// 官杀混杂
    Mixed,
    ZhengGuanLed,
    QiShaLed,
    /// 官杀微弱
    Faint,
}

/// 官星结构
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum OfficerStructure {
    GuanShaHunZa,
    ShangGuanJianGuan,
    ShiShenZhiSha,
    ShaYinXiangSheng,
    GuanYinXiangSheng,
    CaiShengGuan,
    #[default]
    Plain,
}

/// 力度等级
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, PartialOrd, Ord,
    Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerLevel {
    #[default]
    Weak,
    Moderate,
    Solid,
    Strong,
}

impl PowerLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            PowerLevel::Strong
        } else if score >= 65 {
            PowerLevel::Solid
        } else if score >= 50 {
            PowerLevel::Moderate
        } else {
            PowerLevel::Weak
        }
    }
}

/// 财星类型
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WealthType {
    ZhengCaiLed,
    PianCaiLed,
    /// 比劫夺财
    RobbedByPeers,
    #[default]
    Weak,
    /// 财官均衡
    BalancedWithOfficer,
}

/// 财星根气
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WealthRooting {
    /// 地支本气为财
    Rooted,
    /// 仅中气 / 余气藏财
    Partial,
    #[default]
    Rootless,
}

/// 收入模式
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum IncomeMode {
    #[default]
    StableSalary,
    Performance,
    Opportunity,
    Entrepreneurial,
}

impl IncomeMode {
    pub fn name(&self) -> &'static str {
        match self {
            IncomeMode::StableSalary => "稳定薪资",
            IncomeMode::Performance => "绩效提成",
            IncomeMode::Opportunity => "机会收入",
            IncomeMode::Entrepreneurial => "创业经营",
        }
    }
}

#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum IncomeTag {
    SalaryBased,
    SkillMonetization,
    Windfall,
    Management,
    /// 驿马：奔波、异地求财
    OnTheMove,
}

/// 稳定性
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Stability {
    Stable,
    #[default]
    Fluctuating,
    Volatile,
}

impl Stability {
    fn of(purity_score: u8, relevant_breaking: usize) -> Self {
        if purity_score >= 75 && relevant_breaking == 0 {
            Stability::Stable
        } else if purity_score >= 55 && relevant_breaking <= 1 {
            Stability::Fluctuating
        } else {
            Stability::Volatile
        }
    }
}

#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum CareerRisk {
    PeerCompetition,
    ConflictWithAuthority,
    PressureOverload,
    CashflowStrain,
    ScatteredDirection,
    /// 身旺带阳刃，行事过刚
    Headstrong,
    /// 月柱落日旬空，事业根基虚浮
    HollowFoundation,
}

#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum CareerSupport {
    MentorSupport,
    SkillLeverage,
    WealthBacksOfficer,
    PeerSupport,
    /// 天乙贵人
    NobleHelp,
}

/// 官财格局
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GuancaiPattern {
    pub officer_type: OfficerType,
    pub officer_structure: OfficerStructure,
    pub officer_score: u8,
    pub officer_level: PowerLevel,
    pub wealth_type: WealthType,
    pub wealth_rooting: WealthRooting,
    pub wealth_score: u8,
    pub wealth_level: PowerLevel,
    pub income_mode: IncomeMode,
    pub income_tags: Vec<IncomeTag>,
    pub career_stability: Stability,
    pub wealth_stability: Stability,
    pub risk_tags: Vec<CareerRisk>,
    pub support_tags: Vec<CareerSupport>,
    /// 主做功线的模板
    pub main_line: Option<FlowTemplate>,
    /// 其余涉及官财的模板
    pub related_lines: Vec<FlowTemplate>,
}

// ============================================================================
// 计算
// ============================================================================

const CAREER_BREAKING: [BreakingFactor; 6] = [
    BreakingFactor::GuanShaHunZa,
    BreakingFactor::ShangGuanJianGuan,
    BreakingFactor::ShaZhongWuZhi,
    BreakingFactor::GenQiShouSun,
    BreakingFactor::GuanXingBeiHe,
    BreakingFactor::GuanXingWuGen,
];

const WEALTH_BREAKING: [BreakingFactor; 5] = [
    BreakingFactor::BiJieDuoCai,
    BreakingFactor::CaiXingHuaiYin,
    BreakingFactor::CaiDuoShenRuo,
    BreakingFactor::XiaoShenDuoShi,
    BreakingFactor::CaiXingBeiHe,
];

/// 组合官财格局
pub fn compose(
    chart: &ChartModel,
    weights: &AttributeWeights,
    strength: &StrengthAnalysis,
    favored: &FavoredAvoid,
    purity: &PatternPurity,
    paths: &[WorkPath],
) -> GuancaiPattern {
    let w = weights;
    let bi = w.group(ShiShenGroup::BiJie);
    let shi = w.group(ShiShenGroup::ShiShang);
    let cai = w.group(ShiShenGroup::Cai);
    let guan = w.group(ShiShenGroup::GuanSha);
    let yin = w.group(ShiShenGroup::Yin);

    let officer_type = officer_type(w);
    let officer_structure = officer_structure(purity, guan, cai, yin);

    let mut officer_score = guan / 100;
    if w.group_revealed(ShiShenGroup::GuanSha) {
        officer_score += 10;
    }
    if yin >= 3000 {
        officer_score += 5;
    }
    if w.get(ShiShen::ShangGuan) >= 5000 {
        officer_score = officer_score.saturating_sub(10);
    }
    let officer_score = officer_score.min(100) as u8;

    let mut wealth_score = cai / 100;
    if w.group_revealed(ShiShenGroup::Cai) {
        wealth_score += 10;
    }
    if shi >= 3000 {
        wealth_score += 5;
    }
    if bi >= 7000 {
        wealth_score = wealth_score.saturating_sub(10);
    }
    let wealth_score = wealth_score.min(100) as u8;

    let wealth_type = if purity.has_breaking(BreakingFactor::BiJieDuoCai) {
        WealthType::RobbedByPeers
    } else if cai < 3000 {
        WealthType::Weak
    } else if cai >= 5000 && guan >= 5000 && cai.abs_diff(guan) <= 2000 {
        WealthType::BalancedWithOfficer
    } else if w.get(ShiShen::ZhengCai) >= w.get(ShiShen::PianCai) {
        WealthType::ZhengCaiLed
    } else {
        WealthType::PianCaiLed
    };

    let main_line = paths.first().and_then(|p| p.template);
    let income_mode = income_mode(w, strength, main_line);
    let mut income_tags = Vec::new();
    if w.get(ShiShen::ZhengGuan) >= 4000 || w.get(ShiShen::ZhengCai) >= 4000 {
        income_tags.push(IncomeTag::SalaryBased);
    }
    if shi >= 5000 {
        income_tags.push(IncomeTag::SkillMonetization);
    }
    if w.get(ShiShen::PianCai) >= 5000 {
        income_tags.push(IncomeTag::Windfall);
    }
    if w.get(ShiShen::QiSha) >= 5000 && strength.band.is_strong_side() {
        income_tags.push(IncomeTag::Management);
    }
    if chart.has_marker(ShenSha::YiMa) {
        income_tags.push(IncomeTag::OnTheMove);
    }

    let count = |list: &[BreakingFactor]| list.iter().filter(|f| purity.has_breaking(**f)).count();
    let career_stability = Stability::of(purity.score, count(&CAREER_BREAKING[..]));
    let wealth_stability = Stability::of(purity.score, count(&WEALTH_BREAKING[..]));

    let mut risk_tags: Vec<CareerRisk> = [
        (BreakingFactor::BiJieDuoCai, CareerRisk::PeerCompetition),
        (BreakingFactor::ShangGuanJianGuan, CareerRisk::ConflictWithAuthority),
        (BreakingFactor::ShaZhongWuZhi, CareerRisk::PressureOverload),
        (BreakingFactor::CaiDuoShenRuo, CareerRisk::CashflowStrain),
        (BreakingFactor::GuanShaHunZa, CareerRisk::ScatteredDirection),
    ]
    .into_iter()
    .filter(|(factor, _)| purity.has_breaking(*factor))
    .map(|(_, tag)| tag)
    .collect();
    if chart.has_marker(ShenSha::YangRen) && strength.band.is_strong_side() {
        risk_tags.push(CareerRisk::Headstrong);
    }
    if chart.month.void_flags.day_void {
        risk_tags.push(CareerRisk::HollowFoundation);
    }

    let mut support_tags = Vec::new();
    if yin >= 4000 && favored.favored_groups.contains(&ShiShenGroup::Yin) {
        support_tags.push(CareerSupport::MentorSupport);
    }
    if purity.has_rescue(RescueFactor::ShiShangXieXiu) || purity.has_rescue(RescueFactor::ShiShenZhiSha) {
        support_tags.push(CareerSupport::SkillLeverage);
    }
    if cai >= 4000 && guan >= 4000 {
        support_tags.push(CareerSupport::WealthBacksOfficer);
    }
    if bi >= 4000 && strength.band.is_weak_side() {
        support_tags.push(CareerSupport::PeerSupport);
    }
    if chart.has_marker(ShenSha::TianYiGuiRen) {
        support_tags.push(CareerSupport::NobleHelp);
    }

    let mut related_lines: Vec<FlowTemplate> = Vec::new();
    for template in paths.iter().skip(1).filter_map(|p| p.template) {
        if related_lines.len() >= MAX_RELATED_LINES {
            break;
        }
        if Some(template) != main_line && is_career_wealth(template) && !related_lines.contains(&template) {
            related_lines.push(template);
        }
    }

    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 官财: 官 {} 财 {} 收入 {}",
        officer_score,
        wealth_score,
        income_mode.name()
    );

    GuancaiPattern {
        officer_type,
        officer_structure,
        officer_score,
        officer_level: PowerLevel::from_score(officer_score),
        wealth_type,
        wealth_rooting: wealth_rooting(chart),
        wealth_score,
        wealth_level: PowerLevel::from_score(wealth_score),
        income_mode,
        income_tags,
        career_stability,
        wealth_stability,
        risk_tags,
        support_tags,
        main_line,
        related_lines,
    }
}

fn officer_type(w: &AttributeWeights) -> OfficerType {
    let total = w.group(ShiShenGroup::GuanSha);
    let zheng = w.get(ShiShen::ZhengGuan);
    let sha = w.get(ShiShen::QiSha);
    if total < 1000 {
        OfficerType::Absent
    } else if total < 3000 {
        OfficerType::Faint
    } else if zheng.abs_diff(sha) * 100 < total * MIXED_OFFICER_GAP_PCT {
        OfficerType::Mixed
    } else if zheng > sha {
        OfficerType::ZhengGuanLed
    } else {
        OfficerType::QiShaLed
    }
}

fn officer_structure(purity: &PatternPurity, guan: u32, cai: u32, yin: u32) -> OfficerStructure {
    if purity.has_breaking(BreakingFactor::GuanShaHunZa) {
        OfficerStructure::GuanShaHunZa
    } else if purity.has_breaking(BreakingFactor::ShangGuanJianGuan) {
        OfficerStructure::ShangGuanJianGuan
    } else if purity.has_rescue(RescueFactor::ShiShenZhiSha) {
        OfficerStructure::ShiShenZhiSha
    } else if purity.has_rescue(RescueFactor::YinHuaSha) {
        OfficerStructure::ShaYinXiangSheng
    } else if guan >= 4000 && yin >= 4000 {
        OfficerStructure::GuanYinXiangSheng
    } else if guan >= 4000 && cai >= 4000 {
        OfficerStructure::CaiShengGuan
    } else {
        OfficerStructure::Plain
    }
}

fn income_mode(
    w: &AttributeWeights,
    strength: &StrengthAnalysis,
    main_line: Option<FlowTemplate>,
) -> IncomeMode {
    let pian = w.get(ShiShen::PianCai);
    let zheng = w.get(ShiShen::ZhengCai);
    let strong = strength.band.is_strong_side();
    let output_to_wealth = main_line == Some(FlowTemplate::ShiShangShengCai);

    if strong && (pian >= 5000 || w.get(ShiShen::QiSha) >= 5000) && pian >= zheng {
        IncomeMode::Entrepreneurial
    } else if output_to_wealth ||
        (w.group(ShiShenGroup::ShiShang) >= 6000 && w.group(ShiShenGroup::Cai) >= 4000)
    {
        IncomeMode::Performance
    } else if pian > zheng {
        IncomeMode::Opportunity
    } else {
        IncomeMode::StableSalary
    }
}

/// 地支本气为财则有根，仅藏于中余气为部分有根
fn wealth_rooting(chart: &ChartModel) -> WealthRooting {
    let dm = chart.day_master;
    let mut partial = false;
    for (_, pillar) in chart.pillars() {
        for (i, (_, shishen)) in pillar.hidden_categories(dm).enumerate() {
            if shishen.group() == ShiShenGroup::Cai {
                if i == 0 {
                    return WealthRooting::Rooted;
                }
                partial = true;
            }
        }
    }
    if partial {
        WealthRooting::Partial
    } else {
        WealthRooting::Rootless
    }
}

fn is_career_wealth(template: FlowTemplate) -> bool {
    matches!(
        template,
        FlowTemplate::ShiShangShengCai |
            FlowTemplate::CaiShengGuan |
            FlowTemplate::GuanYinXiangSheng |
            FlowTemplate::ShiShenZhiSha |
            FlowTemplate::YinHuaSha |
            FlowTemplate::GuanXingZhiJie |
            FlowTemplate::ShangGuanJianGuan |
            FlowTemplate::BiJieDuoCai |
            FlowTemplate::GuanShaKeShen |
            FlowTemplate::ShenKeCai
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::chart_of;
    use crate::dogong::tests::weights_of;
    use crate::dogong::PathKind;
    use crate::purity::RescueHit;
    use crate::strength::StrengthBand;
    use crate::types::ShiShen as S;

    fn band(band: StrengthBand) -> StrengthAnalysis {
        StrengthAnalysis { band, ..Default::default() }
    }

    fn line(template: FlowTemplate) -> WorkPath {
        WorkPath { kind: PathKind::Productive, template: Some(template), ..Default::default() }
    }

    // 甲子 丙子 甲子 乙亥：四支皆无财
    fn no_wealth_chart() -> ChartModel {
        chart_of([(0, 0), (2, 0), (0, 0), (1, 11)])
    }

    #[test]
    fn test_officer_type_classification() {
        assert_eq!(officer_type(&AttributeWeights::default()), OfficerType::Absent);
        assert_eq!(officer_type(&weights_of(&[(S::ZhengGuan, 2000)])), OfficerType::Faint);
        assert_eq!(
            officer_type(&weights_of(&[(S::ZhengGuan, 5000), (S::QiSha, 4000)])),
            OfficerType::Mixed
        );
        assert_eq!(
            officer_type(&weights_of(&[(S::ZhengGuan, 7000), (S::QiSha, 1000)])),
            OfficerType::ZhengGuanLed
        );
        assert_eq!(officer_type(&weights_of(&[(S::QiSha, 6000)])), OfficerType::QiShaLed);
    }

    #[test]
    fn test_wealth_rooting() {
        assert_eq!(wealth_rooting(&no_wealth_chart()), WealthRooting::Rootless);
        // 甲木日主，辰本气戊土为财
        assert_eq!(wealth_rooting(&chart_of([(0, 4), (2, 2), (0, 2), (1, 11)])), WealthRooting::Rooted);
        // 寅中戊土为余气
        let chart = chart_of([(0, 0), (2, 2), (0, 0), (2, 2)]);
        assert_eq!(wealth_rooting(&chart), WealthRooting::Partial);
    }

    #[test]
    fn test_salary_profile() {
        let w = weights_of(&[(S::ZhengGuan, 6000), (S::ZhengCai, 5000), (S::ZhengYin, 4500)]);
        let result = compose(
            &no_wealth_chart(),
            &w,
            &band(StrengthBand::PingHeng),
            &FavoredAvoid::default(),
            &PatternPurity { score: 100, ..Default::default() },
            &[line(FlowTemplate::GuanYinXiangSheng), line(FlowTemplate::CaiShengGuan)],
        );
        assert_eq!(result.income_mode, IncomeMode::StableSalary);
        assert!(result.income_tags.contains(&IncomeTag::SalaryBased));
        assert_eq!(result.officer_type, OfficerType::ZhengGuanLed);
        assert_eq!(result.officer_structure, OfficerStructure::GuanYinXiangSheng);
        assert_eq!(result.wealth_type, WealthType::BalancedWithOfficer);
        assert_eq!(result.career_stability, Stability::Stable);
        assert_eq!(result.main_line, Some(FlowTemplate::GuanYinXiangSheng));
        assert_eq!(result.related_lines, vec![FlowTemplate::CaiShengGuan]);
        assert!(result.support_tags.contains(&CareerSupport::WealthBacksOfficer));
    }

    #[test]
    fn test_entrepreneurial_and_robbed_wealth() {
        let w = weights_of(&[(S::PianCai, 6000), (S::JieCai, 8000), (S::QiSha, 2000)]);
        let purity = PatternPurity {
            score: 52,
            breaking_factors: vec![BreakingFactor::BiJieDuoCai],
            ..Default::default()
        };
        let result = compose(
            &no_wealth_chart(),
            &w,
            &band(StrengthBand::ShenQiang),
            &FavoredAvoid::default(),
            &purity,
            &[],
        );
        assert_eq!(result.income_mode, IncomeMode::Entrepreneurial);
        assert_eq!(result.wealth_type, WealthType::RobbedByPeers);
        assert_eq!(result.risk_tags, vec![CareerRisk::PeerCompetition]);
        assert_eq!(result.wealth_stability, Stability::Volatile);
        assert_eq!(result.main_line, None);
        // 财 60 + 透干 0 − 比劫重 10
        assert_eq!(result.wealth_score, 50);
        assert_eq!(result.wealth_level, PowerLevel::Moderate);
    }

    #[test]
    fn test_performance_from_output_line() {
        let w = weights_of(&[(S::ShangGuan, 5000), (S::ZhengCai, 3000)]);
        let purity = PatternPurity {
            score: 90,
            rescue_factors: vec![RescueHit {
                factor: RescueFactor::ShiShangXieXiu,
                target: BreakingFactor::BiJieChengQun,
                effective: true,
            }],
            ..Default::default()
        };
        let result = compose(
            &no_wealth_chart(),
            &w,
            &band(StrengthBand::PianRuo),
            &FavoredAvoid::default(),
            &purity,
            &[line(FlowTemplate::ShiShangShengCai)],
        );
        assert_eq!(result.income_mode, IncomeMode::Performance);
        assert!(result.support_tags.contains(&CareerSupport::SkillLeverage));
        assert_eq!(result.officer_type, OfficerType::Absent);
    }

    #[test]
    fn test_markers_and_void_month() {
        // 辛丑 乙亥 甲子 丁卯：丑为天乙，卯为阳刃，亥为驿马且落甲子旬空
        let chart = chart_of([(7, 1), (1, 11), (0, 0), (3, 3)]);
        let run = |strength: StrengthBand| {
            compose(
                &chart,
                &AttributeWeights::default(),
                &band(strength),
                &FavoredAvoid::default(),
                &PatternPurity::default(),
                &[],
            )
        };
        let strong = run(StrengthBand::ShenQiang);
        assert!(strong.support_tags.contains(&CareerSupport::NobleHelp));
        assert!(strong.income_tags.contains(&IncomeTag::OnTheMove));
        assert_eq!(strong.risk_tags, vec![CareerRisk::Headstrong, CareerRisk::HollowFoundation]);

        let weak = run(StrengthBand::ShenRuo);
        assert_eq!(weak.risk_tags, vec![CareerRisk::HollowFoundation]);
    }
}
