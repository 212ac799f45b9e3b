//! # 做功图
//!
//! 以日主与十神为节点、生克为边的有向图，从日主出发搜索最强做功路径。
//!
//! ## 图
//!
//! 节点采用定长数组：下标 0 为日主，1~10 依次为十神（比肩 … 正印）。
//! 边为 `(from, to, 生/克)` 三元组，在建图时一次性确定性质（生产 / 救应 / 冲突 / 控制）。
//!
//! - 十神之间：两端权重都不低于 1000（万分比）且五类存在生克关系，即连边
//! - 日主：恒有 印→日主、比劫→日主、日主→比劫 三组边；食伤、财、官杀在场时
//!   另加 日主→食伤、日主→财、官杀→日主
//!
//! ## 路径
//!
//! 从日主深度优先搜索，最多 4 个节点，不重复经过。
//!
//! `做功力 = 最弱环节 × 0.85^(边数−1) × 清纯度`
//!
//! 清纯度：生克交替越多越浊；路径主神被场内其他十神所克（且不在路径上）时再扣
//! 最大克神权重的 40%。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_std::{cmp::Ordering, prelude::*, vec};

use crate::constants::BPS;
use crate::structure::AttributeWeights;
use crate::types::{ShiShen, ShiShenGroup};

/// 节点在场线（万分比）
pub const PRESENCE_THRESHOLD: u16 = 1000;

/// 单条路径最多节点数
pub const MAX_PATH_NODES: usize = 4;

/// 每多一条边的衰减（‰）
const LENGTH_DECAY: u32 = 850;

/// 克神对清纯度的扣减比例（%）
const DIRT_RATIO: u32 = 40;

const NODE_COUNT: usize = 11;

// ============================================================================
// 节点与边
// ============================================================================

/// 图节点
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    #[default]
    DayMaster,
    Category(ShiShen),
}

impl Node {
    pub fn index(&self) -> usize {
        match self {
            Node::DayMaster => 0,
            Node::Category(shishen) => shishen.index() + 1,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Node::DayMaster,
            i => Node::Category(ShiShen::ALL[(i - 1) % 10]),
        }
    }

    /// 日主按比劫归类
    pub fn group(&self) -> ShiShenGroup {
        match self {
            Node::DayMaster => ShiShenGroup::BiJie,
            Node::Category(shishen) => shishen.group(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Node::DayMaster => "日主",
            Node::Category(shishen) => shishen.name(),
        }
    }
}

/// 生 / 克
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    #[default]
    Generate,
    Control,
}

/// 做功性质
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PathKind {
    /// 顺生做功
    #[default]
    Productive,
    /// 制化救应
    Rescue,
    /// 相战
    Conflict,
    /// 一般克制
    Control,
}

impl PathKind {
    pub fn name(&self) -> &'static str {
        match self {
            PathKind::Productive => "生产",
            PathKind::Rescue => "救应",
            PathKind::Conflict => "冲突",
            PathKind::Control => "控制",
        }
    }
}

/// 做功模板（经典组合的名称）
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowTemplate {
    ShiShangXieXiu,
    ShiShangShengCai,
    CaiShengGuan,
    GuanYinXiangSheng,
    YinBiHuShen,
    ShiShenZhiSha,
    YinHuaSha,
    ShangGuanPeiYin,
    GuanXingZhiJie,
    ShangGuanJianGuan,
    BiJieDuoCai,
    CaiXingHuaiYin,
    XiaoShenDuoShi,
    GuanShaKeShen,
    ShenKeCai,
}

impl FlowTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            FlowTemplate::ShiShangXieXiu => "食伤泄秀",
            FlowTemplate::ShiShangShengCai => "食伤生财",
            FlowTemplate::CaiShengGuan => "财生官",
            FlowTemplate::GuanYinXiangSheng => "官印相生",
            FlowTemplate::YinBiHuShen => "印比护身",
            FlowTemplate::ShiShenZhiSha => "食神制杀",
            FlowTemplate::YinHuaSha => "印星化杀",
            FlowTemplate::ShangGuanPeiYin => "伤官配印",
            FlowTemplate::GuanXingZhiJie => "官星制劫",
            FlowTemplate::ShangGuanJianGuan => "伤官见官",
            FlowTemplate::BiJieDuoCai => "比劫夺财",
            FlowTemplate::CaiXingHuaiYin => "财星坏印",
            FlowTemplate::XiaoShenDuoShi => "枭神夺食",
            FlowTemplate::GuanShaKeShen => "官杀克身",
            FlowTemplate::ShenKeCai => "身克财星",
        }
    }
}

/// 有向边
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub from: Node,
    pub to: Node,
    pub relation: Relation,
    pub kind: PathKind,
    pub template: Option<FlowTemplate>,
}

impl Edge {
    fn new(from: Node, to: Node, relation: Relation) -> Self {
        let (kind, template) = classify(from, to, relation);
        Self { from, to, relation, kind, template }
    }
}

/// 边的性质与模板
fn classify(from: Node, to: Node, relation: Relation) -> (PathKind, Option<FlowTemplate>) {
    use Node::{Category as C, DayMaster as Dm};

    let (fg, tg) = (from.group(), to.group());
    match relation {
        Relation::Generate => {
            let template = match (from, to) {
                (C(ShiShen::QiSha), _) if tg == ShiShenGroup::Yin =>
                    return (PathKind::Rescue, Some(FlowTemplate::YinHuaSha)),
                (C(ShiShen::ZhengGuan), _) if tg == ShiShenGroup::Yin => Some(FlowTemplate::GuanYinXiangSheng),
                (_, Dm) if fg == ShiShenGroup::Yin => Some(FlowTemplate::YinBiHuShen),
                _ => match (fg, tg) {
                    (ShiShenGroup::BiJie, ShiShenGroup::ShiShang) => Some(FlowTemplate::ShiShangXieXiu),
                    (ShiShenGroup::ShiShang, ShiShenGroup::Cai) => Some(FlowTemplate::ShiShangShengCai),
                    (ShiShenGroup::Cai, ShiShenGroup::GuanSha) => Some(FlowTemplate::CaiShengGuan),
                    (ShiShenGroup::Yin, ShiShenGroup::BiJie) => Some(FlowTemplate::YinBiHuShen),
                    _ => None,
                },
            };
            (PathKind::Productive, template)
        },
        Relation::Control => match (from, to) {
            (C(ShiShen::ShiShen), C(ShiShen::QiSha)) => (PathKind::Rescue, Some(FlowTemplate::ShiShenZhiSha)),
            (_, C(ShiShen::ShangGuan)) if fg == ShiShenGroup::Yin =>
                (PathKind::Rescue, Some(FlowTemplate::ShangGuanPeiYin)),
            (C(ShiShen::ZhengGuan), C(ShiShen::JieCai)) => (PathKind::Rescue, Some(FlowTemplate::GuanXingZhiJie)),
            (C(ShiShen::ShangGuan), C(ShiShen::ZhengGuan)) =>
                (PathKind::Conflict, Some(FlowTemplate::ShangGuanJianGuan)),
            (C(ShiShen::PianYin), C(ShiShen::ShiShen)) => (PathKind::Conflict, Some(FlowTemplate::XiaoShenDuoShi)),
            (C(_), C(_)) if fg == ShiShenGroup::BiJie && tg == ShiShenGroup::Cai =>
                (PathKind::Conflict, Some(FlowTemplate::BiJieDuoCai)),
            (C(_), C(_)) if fg == ShiShenGroup::Cai && tg == ShiShenGroup::Yin =>
                (PathKind::Conflict, Some(FlowTemplate::CaiXingHuaiYin)),
            (_, Dm) => (PathKind::Control, Some(FlowTemplate::GuanShaKeShen)),
            (Dm, _) => (PathKind::Control, Some(FlowTemplate::ShenKeCai)),
            _ => (PathKind::Control, None),
        },
    }
}

// ============================================================================
// 建图
// ============================================================================

/// 做功图
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct WorkPathGraph {
    /// 节点权重（万分比），按 `Node::index` 排列
    pub weights: [u16; NODE_COUNT],
    pub edges: Vec<Edge>,
}

impl WorkPathGraph {
    pub fn weight(&self, node: Node) -> u32 {
        self.weights[node.index()] as u32
    }

    pub fn is_present(&self, node: Node) -> bool {
        self.weights[node.index()] >= PRESENCE_THRESHOLD
    }

    pub fn out_edges(&self, node: Node) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |e| e.from == node)
    }

    pub fn has_day_master_edges(&self) -> bool {
        self.out_edges(Node::DayMaster).next().is_some()
    }
}

/// 建图；日主节点恒存在且至少有 日主→比肩 / 日主→劫财 两条出边
pub fn build_graph(weights: &AttributeWeights, day_master_weight: u32) -> WorkPathGraph {
    let mut graph = WorkPathGraph::default();
    graph.weights[0] = day_master_weight.min(BPS) as u16;
    for shishen in ShiShen::ALL {
        graph.weights[Node::Category(shishen).index()] = weights.get(shishen).min(BPS) as u16;
    }

    // 日主
    for shishen in ShiShen::ALL {
        let node = Node::Category(shishen);
        let present = graph.is_present(node);
        let edge = match shishen.group() {
            ShiShenGroup::Yin => Some(Edge::new(node, Node::DayMaster, Relation::Generate)),
            ShiShenGroup::BiJie => {
                graph.edges.push(Edge::new(node, Node::DayMaster, Relation::Generate));
                Some(Edge::new(Node::DayMaster, node, Relation::Generate))
            },
            ShiShenGroup::ShiShang if present =>
                Some(Edge::new(Node::DayMaster, node, Relation::Generate)),
            ShiShenGroup::Cai if present => Some(Edge::new(Node::DayMaster, node, Relation::Control)),
            ShiShenGroup::GuanSha if present =>
                Some(Edge::new(node, Node::DayMaster, Relation::Control)),
            _ => None,
        };
        graph.edges.extend(edge);
    }

    // 十神之间
    for from in ShiShen::ALL {
        for to in ShiShen::ALL {
            let (a, b) = (Node::Category(from), Node::Category(to));
            if from == to || !graph.is_present(a) || !graph.is_present(b) {
                continue;
            }
            let relation = if from.group().generates() == to.group() {
                Relation::Generate
            } else if from.group().controls() == to.group() {
                Relation::Control
            } else {
                continue;
            };
            graph.edges.push(Edge::new(a, b, relation));
        }
    }

    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 做功图: 日主 {} 边 {}",
        graph.weights[0],
        graph.edges.len()
    );
    graph
}

// ============================================================================
// 路径搜索
// ============================================================================

/// 做功路径
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkPath {
    /// 以日主开头
    pub nodes: Vec<Node>,
    pub relations: Vec<Relation>,
    /// 做功力（万分比）
    pub work_force: u16,
    pub kind: PathKind,
    /// 清纯度（万分比）
    pub cleanliness: u16,
    pub template: Option<FlowTemplate>,
}

impl WorkPath {
    /// 做功力折算为 0~100
    pub fn force_score(&self) -> u32 {
        self.work_force as u32 * 100 / BPS
    }

    /// 路径涉及的五类（日主按比劫）
    pub fn groups(&self) -> Vec<ShiShenGroup> {
        let mut out: Vec<ShiShenGroup> = Vec::new();
        for node in self.nodes.iter() {
            let group = node.group();
            if !out.contains(&group) {
                out.push(group);
            }
        }
        out
    }

    fn node_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().map(|n| n.index())
    }
}

/// 从日主出发搜索最强的 `max_paths` 条路径
///
/// 日主没有出边时返回空序列。
pub fn find_strongest_paths(
    graph: &WorkPathGraph,
    weights: &AttributeWeights,
    max_paths: usize,
) -> Vec<WorkPath> {
    if !graph.has_day_master_edges() {
        log::warn!(target: crate::LOG_TARGET, "⚠️ 日主无出边，无主做功路径");
        return Vec::new();
    }

    let mut paths = Vec::new();
    let mut stack: Vec<&Edge> = Vec::new();
    let mut visited = [false; NODE_COUNT];
    visited[0] = true;
    walk(graph, weights, Node::DayMaster, &mut stack, &mut visited, &mut paths);

    paths.sort_by(rank);
    paths.truncate(max_paths);

    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 做功路径 {} 条，最强 {}",
        paths.len(),
        paths.first().map(|p| p.work_force).unwrap_or(0)
    );
    paths
}

fn walk<'a>(
    graph: &'a WorkPathGraph,
    weights: &AttributeWeights,
    at: Node,
    stack: &mut Vec<&'a Edge>,
    visited: &mut [bool; NODE_COUNT],
    out: &mut Vec<WorkPath>,
) {
    if stack.len() + 1 >= MAX_PATH_NODES {
        return;
    }
    for edge in graph.out_edges(at) {
        let next = edge.to.index();
        if visited[next] {
            continue;
        }
        stack.push(edge);
        visited[next] = true;
        if let Some(path) = evaluate(graph, weights, stack) {
            out.push(path);
        }
        walk(graph, weights, edge.to, stack, visited, out);
        visited[next] = false;
        stack.pop();
    }
}

/// 计算单条路径；做功力为零者丢弃
fn evaluate(graph: &WorkPathGraph, weights: &AttributeWeights, edges: &[&Edge]) -> Option<WorkPath> {
    let mut nodes = vec![Node::DayMaster];
    nodes.extend(edges.iter().map(|e| e.to));
    let relations: Vec<Relation> = edges.iter().map(|e| e.relation).collect();

    let weakest = edges
        .iter()
        .map(|e| graph.weight(e.from).min(graph.weight(e.to)))
        .min()
        .unwrap_or(0);
    if weakest == 0 {
        return None;
    }

    let mut force = weakest;
    for _ in 1..edges.len() {
        force = force * LENGTH_DECAY / 1000;
    }
    let cleanliness = cleanliness(graph, weights, &nodes, &relations);
    let force = force * cleanliness / BPS;
    if force == 0 {
        return None;
    }

    let kind = if edges.iter().any(|e| e.kind == PathKind::Conflict) {
        PathKind::Conflict
    } else if edges.iter().any(|e| e.kind == PathKind::Rescue) {
        PathKind::Rescue
    } else {
        let productive = relations.iter().filter(|r| **r == Relation::Generate).count();
        if productive * 2 >= relations.len() {
            PathKind::Productive
        } else {
            PathKind::Control
        }
    };
    let template = edges
        .iter()
        .find(|e| e.kind == kind && e.template.is_some())
        .or_else(|| edges.iter().find(|e| e.template.is_some()))
        .and_then(|e| e.template);

    Some(WorkPath {
        nodes,
        relations,
        work_force: force as u16,
        kind,
        cleanliness: cleanliness as u16,
        template,
    })
}

/// 清纯度（万分比）
fn cleanliness(
    graph: &WorkPathGraph,
    weights: &AttributeWeights,
    nodes: &[Node],
    relations: &[Relation],
) -> u32 {
    let alternations = relations.windows(2).filter(|w| w[0] != w[1]).count() as u32;
    let alternation_cost = alternations * BPS / (2 * relations.len().max(1) as u32);

    // 路径主神：权重最大的十神
    let dominant = nodes
        .iter()
        .filter_map(|n| match n {
            Node::Category(s) => Some(*s),
            Node::DayMaster => None,
        })
        .max_by_key(|s| weights.get(*s));
    let dirt = dominant
        .map(|dominant| {
            ShiShen::ALL
                .iter()
                .filter(|s| s.group().controls() == dominant.group())
                .filter(|s| !nodes.contains(&Node::Category(**s)))
                .filter(|s| graph.is_present(Node::Category(**s)))
                .map(|s| weights.get(*s))
                .max()
                .unwrap_or(0)
        })
        .unwrap_or(0);

    BPS.saturating_sub(alternation_cost).saturating_sub(dirt * DIRT_RATIO / 100)
}

/// 做功力 → 清纯度 → 更短 → 节点序
fn rank(a: &WorkPath, b: &WorkPath) -> Ordering {
    b.work_force
        .cmp(&a.work_force)
        .then(b.cleanliness.cmp(&a.cleanliness))
        .then(a.nodes.len().cmp(&b.nodes.len()))
        .then_with(|| a.node_indices().cmp(b.node_indices()))
}

/// 主做功线
pub fn core_line(paths: &[WorkPath]) -> Option<&WorkPath> {
    paths.first()
}

/// 各性质路径计数
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct KindSummary {
    pub productive: u8,
    pub rescue: u8,
    pub conflict: u8,
    pub control: u8,
}

pub fn summarize_by_kind(paths: &[WorkPath]) -> KindSummary {
    let mut summary = KindSummary::default();
    for path in paths {
        let slot = match path.kind {
            PathKind::Productive => &mut summary.productive,
            PathKind::Rescue => &mut summary.rescue,
            PathKind::Conflict => &mut summary.conflict,
            PathKind::Control => &mut summary.control,
        };
        *slot = slot.saturating_add(1);
    }
    summary
}
