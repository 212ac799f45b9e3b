//! # 体用承载度
//!
//! 体：比劫、食伤、印（自身能力与资源）；用：财、官杀（外部目标）。
//!
//! `承载度 = 体势 × 通关度 × (1 − 破坏扣分)`，全部为万分比。
//!
//! - 体势 = min(1, Σ体 / 2)，用势 = min(1, Σ用 / 2)
//! - 通关度：做功图上 食伤→财(生)、财→官杀(生)、官杀→印(生)、比劫→财(克) 四类边，
//!   每对十神取两端权重几何平均再乘类别系数，除以全部十神对都满分时的总和
//! - 破坏：官杀→比劫(克)、财→印(克)、比劫→食伤(生) 三类边，两端权重相乘再乘系数，封顶 1

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_arithmetic::traits::IntegerSquareRoot;
use sp_std::prelude::*;

use crate::constants::BPS;
use crate::dogong::{Node, Relation, WorkPathGraph};
use crate::structure::AttributeWeights;
use crate::types::{ShiShen, ShiShenGroup};

/// 通关边：(起, 止, 关系, 系数 ×10)
const PASS_THROUGH: [(ShiShenGroup, ShiShenGroup, Relation, u32); 4] = [
    (ShiShenGroup::ShiShang, ShiShenGroup::Cai, Relation::Generate, 12),
    (ShiShenGroup::Cai, ShiShenGroup::GuanSha, Relation::Generate, 10),
    (ShiShenGroup::GuanSha, ShiShenGroup::Yin, Relation::Generate, 9),
    (ShiShenGroup::BiJie, ShiShenGroup::Cai, Relation::Control, 8),
];

/// 破坏边：(起, 止, 关系, 系数 ×10)
const DESTRUCTION: [(ShiShenGroup, ShiShenGroup, Relation, u32); 3] = [
    (ShiShenGroup::GuanSha, ShiShenGroup::BiJie, Relation::Control, 12),
    (ShiShenGroup::Cai, ShiShenGroup::Yin, Relation::Control, 10),
    (ShiShenGroup::BiJie, ShiShenGroup::ShiShang, Relation::Generate, 8),
];

/// 承载度等级
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, PartialOrd, Ord,
    Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum CapacityLevel {
    #[default]
    VeryLow,
    Low,
    LowerMiddle,
    Middle,
    UpperMiddle,
    High,
    VeryHigh,
}

impl CapacityLevel {
    pub fn of(capacity: u32) -> Self {
        match capacity {
            8500.. => CapacityLevel::VeryHigh,
            7000.. => CapacityLevel::High,
            5500.. => CapacityLevel::UpperMiddle,
            4000.. => CapacityLevel::Middle,
            2500.. => CapacityLevel::LowerMiddle,
            1000.. => CapacityLevel::Low,
            _ => CapacityLevel::VeryLow,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CapacityLevel::VeryHigh => "极高",
            CapacityLevel::High => "高",
            CapacityLevel::UpperMiddle => "中上",
            CapacityLevel::Middle => "中等",
            CapacityLevel::LowerMiddle => "中下",
            CapacityLevel::Low => "低",
            CapacityLevel::VeryLow => "极低",
        }
    }
}

/// 体用平衡
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum TiYongBalance {
    BodyStrong,
    UseStrong,
    #[default]
    Harmonious,
    Unbalanced,
}

impl TiYongBalance {
    /// 一方超过另一方 1.2 倍为强；差距不足 15% 为相协
    pub fn of(body: u32, use_: u32) -> Self {
        if body * 10 > use_ * 12 {
            TiYongBalance::BodyStrong
        } else if use_ * 10 > body * 12 {
            TiYongBalance::UseStrong
        } else if body.abs_diff(use_) < 1500 {
            TiYongBalance::Harmonious
        } else {
            TiYongBalance::Unbalanced
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TiYongBalance::BodyStrong => "体强用弱",
            TiYongBalance::UseStrong => "体弱用强",
            TiYongBalance::Harmonious => "体用相协",
            TiYongBalance::Unbalanced => "体用失衡",
        }
    }
}

/// 图上命中的一对十神
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct TiYongLink {
    pub from: ShiShen,
    pub to: ShiShen,
    pub relation: Relation,
    /// 未乘系数的强度（万分比）
    pub score: u32,
}

/// 体用分析结果
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct TiYong {
    pub body_strength: u32,
    pub use_strength: u32,
    pub pass_through: u32,
    pub destruction: u32,
    pub carrying_capacity: u32,
    pub level: CapacityLevel,
    pub balance: TiYongBalance,
    pub pass_links: Vec<TiYongLink>,
    pub destruction_links: Vec<TiYongLink>,
}

/// 图上存在 from→to 的指定关系时返回两端权重
fn link_weights(graph: &WorkPathGraph, from: ShiShen, to: ShiShen, relation: Relation) -> Option<(u32, u32)> {
    let (a, b) = (Node::Category(from), Node::Category(to));
    graph
        .out_edges(a)
        .any(|edge| edge.to == b && edge.relation == relation)
        .then(|| (graph.weight(a), graph.weight(b)))
}

/// 体用承载度
pub fn analyze(weights: &AttributeWeights, graph: &WorkPathGraph) -> TiYong {
    let body_raw = weights.group(ShiShenGroup::BiJie) +
        weights.group(ShiShenGroup::ShiShang) +
        weights.group(ShiShenGroup::Yin);
    let use_raw = weights.group(ShiShenGroup::Cai) + weights.group(ShiShenGroup::GuanSha);
    let body_strength = (body_raw / 2).min(BPS);
    let use_strength = (use_raw / 2).min(BPS);

    let mut pass_links = Vec::new();
    let mut pass_total: u32 = 0;
    let mut pass_max: u32 = 0;
    for (from_group, to_group, relation, factor) in PASS_THROUGH {
        for from in from_group.members() {
            for to in to_group.members() {
                pass_max += factor;
                if let Some((a, b)) = link_weights(graph, from, to, relation) {
                    let score = (a * b).integer_sqrt();
                    pass_total += score * factor;
                    pass_links.push(TiYongLink { from, to, relation, score });
                }
            }
        }
    }
    let pass_through = pass_total / pass_max;

    let mut destruction_links = Vec::new();
    let mut destruction_total: u32 = 0;
    for (from_group, to_group, relation, factor) in DESTRUCTION {
        for from in from_group.members() {
            for to in to_group.members() {
                if let Some((a, b)) = link_weights(graph, from, to, relation) {
                    let score = a * b / BPS;
                    destruction_total += score * factor / 10;
                    destruction_links.push(TiYongLink { from, to, relation, score });
                }
            }
        }
    }
    let destruction = destruction_total.min(BPS);

    let carrying_capacity = body_strength * pass_through / BPS * (BPS - destruction) / BPS;
    let level = CapacityLevel::of(carrying_capacity);
    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 体用承载度: {} ({}) 通关 {} 破坏 {}",
        carrying_capacity,
        level.name(),
        pass_through,
        destruction
    );

    TiYong {
        body_strength,
        use_strength,
        pass_through,
        destruction,
        carrying_capacity,
        level,
        balance: TiYongBalance::of(body_strength, use_strength),
        pass_links,
        destruction_links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dogong::build_graph;
    use crate::dogong::tests::weights_of;
    use crate::types::ShiShen as S;

    #[test]
    fn test_capacity_from_graph() {
        let w = weights_of(&[
            (S::ShiShen, 6000),
            (S::ZhengCai, 5000),
            (S::ZhengGuan, 3000),
            (S::BiJian, 4000),
        ]);
        let t = analyze(&w, &build_graph(&w, 5000));

        assert_eq!((t.body_strength, t.use_strength), (5000, 4000));
        assert_eq!(
            t.pass_links,
            vec![
                TiYongLink { from: S::ShiShen, to: S::ZhengCai, relation: Relation::Generate, score: 5477 },
                TiYongLink { from: S::ZhengCai, to: S::ZhengGuan, relation: Relation::Generate, score: 3872 },
                TiYongLink { from: S::BiJian, to: S::ZhengCai, relation: Relation::Control, score: 4472 },
            ]
        );
        // (5477×12 + 3872×10 + 4472×8) / 156
        assert_eq!(t.pass_through, 898);
        // 官克比肩 1200×1.2 + 比肩生食神 2400×0.8
        assert_eq!(t.destruction, 3360);
        assert_eq!(t.carrying_capacity, 298);
        assert_eq!(t.level, CapacityLevel::VeryLow);
        assert_eq!(t.balance, TiYongBalance::BodyStrong);
    }

    #[test]
    fn test_empty_chart_carries_nothing() {
        let w = AttributeWeights::default();
        let t = analyze(&w, &build_graph(&w, 5000));
        assert_eq!(t.pass_through, 0);
        assert_eq!(t.carrying_capacity, 0);
        assert!(t.pass_links.is_empty() && t.destruction_links.is_empty());
        assert_eq!(t.balance, TiYongBalance::Harmonious);
    }

    #[test]
    fn test_levels_and_balance() {
        assert_eq!(CapacityLevel::of(BPS), CapacityLevel::VeryHigh);
        assert_eq!(CapacityLevel::of(5500), CapacityLevel::UpperMiddle);
        assert_eq!(CapacityLevel::of(999), CapacityLevel::VeryLow);
        assert_eq!(TiYongBalance::of(3000, 6000), TiYongBalance::UseStrong);
        assert_eq!(TiYongBalance::of(5000, 5000), TiYongBalance::Harmonious);
        assert_eq!(TiYongBalance::of(9000, 7500), TiYongBalance::Unbalanced);
    }
}
