//! # 能量流通
//!
//! 汇总五行平衡、做功路径与格局纯度，给出 0~100 的流通分：
//!
//! `流通 = 0.3 × 平衡 + 0.4 × 生产 + 0.2 × 救应 − 0.3 × 冲突`
//!
//! - 平衡：100 − 5 × 五行占比标准差
//! - 生产：前 3 条生产路径做功力均值
//! - 救应：救应路径条数 × 15，封顶 100
//! - 冲突：前 2 条冲突路径做功力均值
//!
//! 路径拆成核心（≤3 条）与次要；只要有路径，核心就不为空。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_std::prelude::*;

use crate::dogong::{PathKind, WorkPath};
use crate::purity::PatternPurity;
use crate::strength::{StrengthAnalysis, StrengthBand};
use crate::structure::AttributeWeights;
use crate::types::{ShiShenGroup, WuXing};
use crate::wuxing::WuXingDistribution;

/// 核心路径上限
pub const MAX_CORE_PATHS: usize = 3;

/// 核心路径做功力线（万分比）
const CORE_FORCE: u16 = 7000;

/// 每条救应路径的得分
const RESCUE_PER_PATH: u32 = 15;

const MAX_MAIN_FLOWS: usize = 2;

/// 流通等级
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowLevel {
    /// 流通顺畅
    Smooth,
    /// 基本流通
    #[default]
    Adequate,
    /// 流通受阻
    Blocked,
}

impl FlowLevel {
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            FlowLevel::Smooth
        } else if score >= 40 {
            FlowLevel::Adequate
        } else {
            FlowLevel::Blocked
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlowLevel::Smooth => "流通顺畅",
            FlowLevel::Adequate => "基本流通",
            FlowLevel::Blocked => "流通受阻",
        }
    }
}

/// 风险提示
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum RiskFlag {
    ThinkMoreActLess,
    SelfDepletion,
    EnergyStuck,
    OutputWithoutOutlet,
    ExcessiveControl,
}

impl RiskFlag {
    pub fn name(&self) -> &'static str {
        match self {
            RiskFlag::ThinkMoreActLess => "思考多行动少",
            RiskFlag::SelfDepletion => "易过度自我消耗",
            RiskFlag::EnergyStuck => "能量容易卡在某个环节",
            RiskFlag::OutputWithoutOutlet => "输出过多但缺少承接",
            RiskFlag::ExcessiveControl => "控制欲过强",
        }
    }
}

/// 主流向
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowDirection {
    /// 食伤→财→官
    OutputWealthOfficer,
    /// 官→印→日主
    OfficerResourceSelf,
    /// 印比→食伤→财
    SelfOutputWealth,
    /// 由核心路径首尾推出
    Between(ShiShenGroup, ShiShenGroup),
}

/// 能量流通结果
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct EnergyFlow {
    pub flow_score: u8,
    pub flow_level: FlowLevel,
    pub balance: u8,
    pub productive: u8,
    pub rescue: u8,
    pub conflict_penalty: u8,
    pub core_paths: Vec<WorkPath>,
    pub secondary_paths: Vec<WorkPath>,
    pub risk_flags: Vec<RiskFlag>,
    pub main_flows: Vec<FlowDirection>,
    pub strength_band: StrengthBand,
    pub strong_elements: Vec<WuXing>,
    pub weak_elements: Vec<WuXing>,
}

/// 组合流通分析
pub fn compose(
    weights: &AttributeWeights,
    paths: &[WorkPath],
    purity: &PatternPurity,
    wuxing: &WuXingDistribution,
    strength: &StrengthAnalysis,
) -> EnergyFlow {
    let balance = wuxing.balance() as u32;
    let productive = mean_force(paths, PathKind::Productive, 3);
    let rescue = (paths.iter().filter(|p| p.kind == PathKind::Rescue).count() as u32 * RESCUE_PER_PATH)
        .min(100);
    let conflict_penalty = mean_force(paths, PathKind::Conflict, 2);

    let positive = 3 * balance + 4 * productive + 2 * rescue;
    let flow_score = (positive.saturating_sub(3 * conflict_penalty) / 10).min(100) as u8;
    let flow_level = FlowLevel::from_score(flow_score);

    let (core_paths, secondary_paths) = split_core(paths, purity);
    let risk_flags = risk_flags(weights, paths);
    let main_flows = main_flows(weights, &core_paths);

    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 能量流通: {} {} (核心 {} 次要 {} 风险 {})",
        flow_score,
        flow_level.name(),
        core_paths.len(),
        secondary_paths.len(),
        risk_flags.len()
    );

    EnergyFlow {
        flow_score,
        flow_level,
        balance: balance as u8,
        productive: productive as u8,
        rescue: rescue as u8,
        conflict_penalty: conflict_penalty as u8,
        core_paths,
        secondary_paths,
        risk_flags,
        main_flows,
        strength_band: strength.band,
        strong_elements: wuxing.strong_elements(),
        weak_elements: wuxing.weak_elements(),
    }
}

/// 某性质前 `n` 条路径的做功力均值（0~100），路径已按做功力降序
fn mean_force(paths: &[WorkPath], kind: PathKind, n: usize) -> u32 {
    let top: Vec<u32> =
        paths.iter().filter(|p| p.kind == kind).take(n).map(|p| p.force_score()).collect();
    if top.is_empty() {
        return 0;
    }
    top.iter().sum::<u32>() / top.len() as u32
}

/// 核心：做功力 ≥ 0.7 或模板与命中救应一致者，最多 3 条
fn split_core(paths: &[WorkPath], purity: &PatternPurity) -> (Vec<WorkPath>, Vec<WorkPath>) {
    let tagged = |path: &WorkPath| {
        path.template.map(|t| purity.rescue_templates().any(|r| r == t)).unwrap_or(false)
    };

    let mut core = Vec::new();
    let mut secondary = Vec::new();
    for path in paths {
        if core.len() < MAX_CORE_PATHS && (path.work_force >= CORE_FORCE || tagged(path)) {
            core.push(path.clone());
        } else {
            secondary.push(path.clone());
        }
    }

    if core.is_empty() && !secondary.is_empty() {
        core.push(secondary.remove(0));
    }
    (core, secondary)
}

fn risk_flags(weights: &AttributeWeights, paths: &[WorkPath]) -> Vec<RiskFlag> {
    let shi = weights.group(ShiShenGroup::ShiShang);
    let cai = weights.group(ShiShenGroup::Cai);
    let guan = weights.group(ShiShenGroup::GuanSha);
    let yin = weights.group(ShiShenGroup::Yin);
    let conflicts = paths.iter().filter(|p| p.kind == PathKind::Conflict).count();
    let productive = paths.iter().any(|p| p.kind == PathKind::Productive);

    let mut flags = Vec::new();
    if shi > 5000 && (cai < 3000 || guan < 3000) {
        flags.push(RiskFlag::ThinkMoreActLess);
    }
    if conflicts >= 2 {
        flags.push(RiskFlag::SelfDepletion);
    }
    if !productive {
        flags.push(RiskFlag::EnergyStuck);
    }
    if shi >= 6000 && cai < 3000 {
        flags.push(RiskFlag::OutputWithoutOutlet);
    }
    if guan > 6000 && yin < 2000 {
        flags.push(RiskFlag::ExcessiveControl);
    }
    flags
}

/// 主流向：先查三条经典链，不足时取核心路径首尾
fn main_flows(weights: &AttributeWeights, core: &[WorkPath]) -> Vec<FlowDirection> {
    let present = |group: ShiShenGroup| weights.group(group) >= 3000;
    let mut flows = Vec::new();
    if present(ShiShenGroup::ShiShang) && present(ShiShenGroup::Cai) && present(ShiShenGroup::GuanSha) {
        flows.push(FlowDirection::OutputWealthOfficer);
    }
    if present(ShiShenGroup::GuanSha) && present(ShiShenGroup::Yin) {
        flows.push(FlowDirection::OfficerResourceSelf);
    }
    let supported = present(ShiShenGroup::Yin) || present(ShiShenGroup::BiJie);
    if supported && present(ShiShenGroup::ShiShang) && present(ShiShenGroup::Cai) {
        flows.push(FlowDirection::SelfOutputWealth);
    }

    for path in core.iter().take(2) {
        let groups = path.groups();
        if let (Some(first), Some(last)) = (groups.first(), groups.last()) {
            let direction = FlowDirection::Between(*first, *last);
            if first != last && !flows.contains(&direction) {
                flows.push(direction);
            }
        }
    }
    flows.truncate(MAX_MAIN_FLOWS);
    flows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dogong::tests::weights_of;
    use crate::dogong::{FlowTemplate, Node};
    use crate::purity::{BreakingFactor, RescueFactor, RescueHit};
    use crate::types::ShiShen as S;

    fn path(kind: PathKind, work_force: u16) -> WorkPath {
        WorkPath { kind, work_force, ..Default::default() }
    }

    fn strong() -> StrengthAnalysis {
        StrengthAnalysis { score: 85, band: StrengthBand::ShenQiang, ..Default::default() }
    }

    #[test]
    fn test_flow_score_formula() {
        let paths = vec![
            path(PathKind::Productive, 8000),
            path(PathKind::Productive, 6000),
            path(PathKind::Rescue, 5000),
            path(PathKind::Conflict, 4000),
        ];
        let flow = compose(
            &AttributeWeights::default(),
            &paths,
            &PatternPurity::default(),
            &WuXingDistribution::default(),
            &strong(),
        );
        // 平衡 100，生产 70，救应 15，冲突 40
        assert_eq!((flow.balance, flow.productive, flow.rescue, flow.conflict_penalty), (100, 70, 15, 40));
        // (300 + 280 + 30 − 120) / 10
        assert_eq!(flow.flow_score, 49);
        assert_eq!(flow.flow_level, FlowLevel::Adequate);
    }

    #[test]
    fn test_flow_score_clamped() {
        let conflicts = vec![path(PathKind::Conflict, 10000), path(PathKind::Conflict, 10000)];
        let skewed = WuXingDistribution { percentages: [60, 10, 10, 10, 10], ..Default::default() };
        let flow =
            compose(&AttributeWeights::default(), &conflicts, &PatternPurity::default(), &skewed, &strong());
        assert_eq!(flow.flow_score, 0);
        assert_eq!(flow.flow_level, FlowLevel::Blocked);
        assert!(flow.risk_flags.contains(&RiskFlag::SelfDepletion));
        assert!(flow.risk_flags.contains(&RiskFlag::EnergyStuck));

        let best = vec![path(PathKind::Productive, 10000); 3];
        let flow = compose(
            &AttributeWeights::default(),
            &best,
            &PatternPurity::default(),
            &WuXingDistribution::default(),
            &strong(),
        );
        assert_eq!(flow.flow_score, 70);
        assert_eq!(flow.flow_level, FlowLevel::Smooth);
    }

    #[test]
    fn test_core_split_bounds() {
        let many = vec![path(PathKind::Productive, 9000); 5];
        let (core, secondary) = split_core(&many, &PatternPurity::default());
        assert_eq!(core.len(), MAX_CORE_PATHS);
        assert_eq!(secondary.len(), 2);

        // 无路径达标时最强一条仍为核心
        let weak = vec![path(PathKind::Control, 3000), path(PathKind::Control, 2000)];
        let (core, secondary) = split_core(&weak, &PatternPurity::default());
        assert_eq!(core, vec![path(PathKind::Control, 3000)]);
        assert_eq!(secondary.len(), 1);

        let (core, secondary) = split_core(&[], &PatternPurity::default());
        assert!(core.is_empty() && secondary.is_empty());
    }

    #[test]
    fn test_rescue_template_tags_core() {
        let purity = PatternPurity {
            rescue_factors: vec![RescueHit {
                factor: RescueFactor::ShiShenZhiSha,
                target: BreakingFactor::ShaZhongWuZhi,
                effective: true,
            }],
            ..Default::default()
        };
        let tagged = WorkPath { template: Some(FlowTemplate::ShiShenZhiSha), ..path(PathKind::Rescue, 3000) };
        let paths = vec![path(PathKind::Productive, 8000), path(PathKind::Control, 4000), tagged.clone()];
        let (core, _) = split_core(&paths, &purity);
        assert_eq!(core.len(), 2);
        assert_eq!(core[1], tagged);
    }

    #[test]
    fn test_high_output_low_wealth_flag() {
        let w = weights_of(&[(S::ShiShen, 7000), (S::PianCai, 2000), (S::ZhengGuan, 4000)]);
        let flow = compose(
            &w,
            &[path(PathKind::Productive, 8000)],
            &PatternPurity::default(),
            &WuXingDistribution::default(),
            &strong(),
        );
        assert!(flow.risk_flags.contains(&RiskFlag::OutputWithoutOutlet));
        assert!(flow.risk_flags.contains(&RiskFlag::ThinkMoreActLess));
        assert!(!flow.risk_flags.contains(&RiskFlag::EnergyStuck));
    }

    #[test]
    fn test_main_flows() {
        let w = weights_of(&[(S::ShiShen, 7000), (S::ZhengCai, 5000), (S::ZhengGuan, 4000)]);
        assert_eq!(main_flows(&w, &[]), vec![FlowDirection::OutputWealthOfficer]);

        // 无经典链时由核心路径推出
        let core = WorkPath {
            nodes: vec![Node::DayMaster, Node::Category(S::ShiShen)],
            ..path(PathKind::Productive, 8000)
        };
        assert_eq!(
            main_flows(&AttributeWeights::default(), &[core]),
            vec![FlowDirection::Between(ShiShenGroup::BiJie, ShiShenGroup::ShiShang)]
        );
    }
}
