//! # 八字命盘分析引擎
//!
//! 把四柱命盘转成一组互相引用的分析结果：十神权重与格局、日主强弱、喜用忌神、
//! 做功路径、格局纯度、能量流通、官财格局与行运节奏。
//!
//! ## 数据流
//!
//! ```text
//! ChartInput ─resolve→ ChartModel
//!     ├─ wuxing        五行占比 / 旺相休囚死
//!     ├─ structure     十神权重 W + 格局
//!     ├─ strength      日主强弱（子平 / 盲派）
//!     ├─ favored       喜用 / 忌神
//!     ├─ dogong        做功图与最强路径
//!     ├─ tiyong        体用承载度
//!     ├─ tiaohou       调候
//!     ├─ palaces       命宫 / 胎元 / 身宫
//!     ├─ purity        破格 / 救应 / 纯度
//!     ├─ energy_flow   流通评分
//!     ├─ guancai       官财格局
//!     └─ luck_rhythm   大运 / 流年节奏
//! ```
//!
//! 引擎是纯函数：不读存储、不取系统时间，"现在"（当前年龄、当前年份）由调用方传入，
//! 全部数值为整数（基点或 0~100），相同输入得到逐字节相同的 SCALE 编码输出。

#![cfg_attr(not(feature = "std"), no_std)]

pub mod chart;
pub mod constants;
pub mod dogong;
pub mod energy_flow;
pub mod favored;
pub mod guancai;
pub mod luck_rhythm;
pub mod palaces;
pub mod purity;
pub mod strength;
pub mod structure;
pub mod tiaohou;
pub mod tiyong;
pub mod types;
pub mod wuxing;

pub use chart::{AnalysisError, ChartInput, ChartModel, MissingField, Pillar};
pub use dogong::{core_line, KindSummary, PathKind, WorkPath};
pub use energy_flow::EnergyFlow;
pub use favored::FavoredAvoid;
pub use guancai::GuancaiPattern;
pub use luck_rhythm::{build_luck_cycles, LuckCycle, LuckRhythm, MaxLuckCycles};
pub use palaces::Palaces;
pub use purity::PatternPurity;
pub use strength::{StrengthAnalysis, StrengthConfig};
pub use structure::{AttributeWeights, StructureAnalysis};
pub use tiaohou::Tiaohou;
pub use tiyong::TiYong;
pub use types::*;
pub use wuxing::WuXingDistribution;

use codec::{Decode, Encode};
use frame_support::{
    traits::{ConstU32, Get},
    BoundedVec,
};
use scale_info::TypeInfo;
use sp_std::prelude::*;

use luck_rhythm::RhythmParams;

/// 日志 target
pub const LOG_TARGET: &str = "bazi-analysis";

/// 分析参数
pub trait AnalysisConfig {
    /// 输出的做功路径数上限
    type MaxPaths: Get<u32>;
    /// 流年简表年数
    type AnnualWindow: Get<u32>;
    /// 走势统计的未来年数
    type ComingYears: Get<u32>;
}

/// 默认参数：5 条路径、10 年流年、3 年走势
pub struct DefaultAnalysisConfig;

impl AnalysisConfig for DefaultAnalysisConfig {
    type MaxPaths = ConstU32<5>;
    type AnnualWindow = ConstU32<10>;
    type ComingYears = ConstU32<3>;
}

/// 分析请求
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug)]
pub struct AnalysisRequest {
    pub input: ChartInput,
    pub school: School,
    pub current_age: u8,
    pub current_year: u32,
    pub luck_cycles: BoundedVec<LuckCycle, MaxLuckCycles>,
}

/// 完整分析结果
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartAnalysis {
    pub structure: StructureAnalysis,
    pub strength_analysis: StrengthAnalysis,
    pub favored_avoid: FavoredAvoid,
    pub wuxing: WuXingDistribution,
    pub pattern_purity: PatternPurity,
    /// 按做功力度降序
    pub work_paths: Vec<WorkPath>,
    pub work_summary: KindSummary,
    pub tiyong: TiYong,
    pub tiaohou: Tiaohou,
    pub palaces: Palaces,
    pub energy_flow: EnergyFlow,
    pub guancai_pattern: GuancaiPattern,
    pub luck_rhythm: LuckRhythm,
    pub missing_fields: Vec<MissingField>,
}

impl ChartAnalysis {
    /// 主线：最强的一条做功路径
    pub fn core_line(&self) -> Option<&WorkPath> {
        core_line(&self.work_paths)
    }
}

/// 按默认参数分析
pub fn analyze_chart(request: &AnalysisRequest) -> Result<ChartAnalysis, AnalysisError> {
    analyze_chart_with::<DefaultAnalysisConfig>(request)
}

/// 按给定参数分析；只有命盘结构非法时返回错误
pub fn analyze_chart_with<C: AnalysisConfig>(
    request: &AnalysisRequest,
) -> Result<ChartAnalysis, AnalysisError> {
    let (chart, missing) = request.input.resolve()?;

    let wuxing = wuxing::analyze(chart);
    let weights = structure::resolve_weights(chart);
    let strength_analysis =
        strength::analyze(chart, &StrengthConfig::for_school(request.school));
    let structure = structure::determine_pattern(chart, weights, &strength_analysis);

    let mut analysis = compose::<C>(chart, request, structure, strength_analysis, wuxing);
    analysis.missing_fields = missing.to_vec();

    log::debug!(
        target: LOG_TARGET,
        "🔮 命盘分析完成: {} 强弱 {} 纯度 {} 流通 {}",
        analysis.structure.pattern.name(),
        analysis.strength_analysis.score,
        analysis.pattern_purity.score,
        analysis.energy_flow.flow_score
    );
    Ok(analysis)
}

/// 强弱与格局确定之后的各段：喜忌、做功、体用、调候、宫位、纯度、流通、官财、行运
///
/// 做功路径先按 `MaxPaths` 截断，流通与官财看到的就是输出的那几条。
fn compose<C: AnalysisConfig>(
    chart: &ChartModel,
    request: &AnalysisRequest,
    structure: StructureAnalysis,
    strength_analysis: StrengthAnalysis,
    wuxing: WuXingDistribution,
) -> ChartAnalysis {
    let favored_avoid = favored::analyze(chart, &strength_analysis, &structure.weights, &wuxing);

    let graph = dogong::build_graph(&structure.weights, strength_analysis.score as u32 * 100);
    let paths =
        dogong::find_strongest_paths(&graph, &structure.weights, C::MaxPaths::get() as usize);
    let work_summary = dogong::summarize_by_kind(&paths);
    let tiyong = tiyong::analyze(&structure.weights, &graph);
    let tiaohou = tiaohou::analyze(chart);
    let palaces = palaces::analyze(chart);

    let pattern_purity = purity::analyze(chart, &structure, &strength_analysis);
    let energy_flow = energy_flow::compose(
        &structure.weights,
        &paths,
        &pattern_purity,
        &wuxing,
        &strength_analysis,
    );
    let guancai_pattern = guancai::compose(
        chart,
        &structure.weights,
        &strength_analysis,
        &favored_avoid,
        &pattern_purity,
        &paths,
    );
    let luck_rhythm = luck_rhythm::analyze(
        chart,
        &strength_analysis,
        &structure.weights,
        &favored_avoid,
        &request.luck_cycles,
        &RhythmParams {
            current_age: request.current_age,
            current_year: request.current_year,
            annual_window: C::AnnualWindow::get(),
            coming_years: C::ComingYears::get(),
        },
    );

    ChartAnalysis {
        structure,
        strength_analysis,
        favored_avoid,
        wuxing,
        pattern_purity,
        work_paths: paths,
        work_summary,
        tiyong,
        tiaohou,
        palaces,
        energy_flow,
        guancai_pattern,
        luck_rhythm,
        missing_fields: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::chart_of;
    use crate::dogong::tests::weights_of;
    use crate::energy_flow::RiskFlag;
    use crate::luck_rhythm::{LuckPhase, PRE_CYCLE_DOMAINS};
    use crate::strength::StrengthBand;
    use crate::types::ShiShen as S;

    fn samples() -> Vec<ChartModel> {
        vec![
            // 甲子 丙寅 甲午 庚午
            chart_of([(0, 0), (2, 2), (0, 6), (6, 6)]),
            // 甲寅 丙寅 甲寅 乙亥
            chart_of([(0, 2), (2, 2), (0, 2), (1, 11)]),
            // 庚申 乙酉 甲申 辛未
            chart_of([(6, 8), (1, 9), (0, 8), (7, 7)]),
            // 壬子 壬子 丙子 癸巳
            chart_of([(8, 0), (8, 0), (2, 0), (9, 5)]),
            // 戊辰 己未 己丑 戊辰
            chart_of([(4, 4), (5, 7), (5, 1), (4, 4)]),
        ]
    }

    fn request(chart: ChartModel, current_age: u8) -> AnalysisRequest {
        let luck_cycles = build_luck_cycles(&chart, Gender::Male, 6, 8);
        AnalysisRequest {
            input: ChartInput::Complete(chart),
            school: School::ZiPing,
            current_age,
            current_year: 2026,
            luck_cycles,
        }
    }

    #[test]
    fn test_pipeline_bounds() {
        for chart in samples() {
            let analysis = analyze_chart(&request(chart, 30)).expect("valid chart");
            let flow = &analysis.energy_flow;
            assert!(flow.flow_score <= 100);
            assert!(flow.core_paths.len() <= 3);
            if !analysis.work_paths.is_empty() {
                assert!(!flow.core_paths.is_empty());
            }
            assert!(analysis.work_paths.len() <= 5);
            assert!(analysis.pattern_purity.score <= 100);
            assert!(analysis.strength_analysis.score <= 100);
            assert_eq!(analysis.wuxing.percentages.iter().map(|p| *p as u32).sum::<u32>(), 100);
            for pair in analysis.work_paths.windows(2) {
                assert!(pair[0].work_force >= pair[1].work_force);
            }
            assert_eq!(analysis.luck_rhythm.phase, LuckPhase::WithinCycle(2));
            assert_eq!(analysis.luck_rhythm.annual_brief.len(), 10);
        }
    }

    #[test]
    fn test_deterministic_output() {
        for chart in samples() {
            let req = request(chart, 30);
            let a = analyze_chart(&req).expect("valid chart");
            let b = analyze_chart(&req).expect("valid chart");
            assert_eq!(a.encode(), b.encode());
        }
    }

    #[test]
    fn test_pre_cycle_through_pipeline() {
        let analysis = analyze_chart(&request(samples()[0].clone(), 5)).expect("valid chart");
        assert_eq!(analysis.luck_rhythm.phase, LuckPhase::PreCycle);
        assert_eq!(analysis.luck_rhythm.main_domains, PRE_CYCLE_DOMAINS.to_vec());
        assert!(analysis.luck_rhythm.annual_brief.is_empty());
    }

    #[test]
    fn test_empty_cycles_are_beyond() {
        let mut req = request(samples()[1].clone(), 30);
        req.luck_cycles = BoundedVec::default();
        let analysis = analyze_chart(&req).expect("valid chart");
        assert_eq!(analysis.luck_rhythm, LuckRhythm {
            phase: LuckPhase::BeyondCycles,
            ..Default::default()
        });
    }

    #[test]
    fn test_partial_input_is_reported() {
        let chart = samples()[0].clone();
        let missing = vec![MissingField::BirthHour];
        let req = AnalysisRequest {
            input: ChartInput::Partial(chart, missing.clone()),
            ..request(samples()[0].clone(), 30)
        };
        let analysis = analyze_chart(&req).expect("partial chart still analyzes");
        assert_eq!(analysis.missing_fields, missing);
    }

    #[test]
    fn test_invalid_chart_is_rejected() {
        let mut chart = samples()[0].clone();
        // 甲丑：阴阳不配
        chart.day.ganzhi.zhi = DiZhi(1);
        let req = AnalysisRequest { input: ChartInput::Complete(chart), ..request(samples()[0].clone(), 30) };
        assert_eq!(
            analyze_chart(&req),
            Err(AnalysisError::MismatchedPolarity(PillarPosition::Day))
        );

        let mut chart = samples()[0].clone();
        chart.day_master = TianGan(2);
        let req = AnalysisRequest { input: ChartInput::Complete(chart), ..request(samples()[0].clone(), 30) };
        assert_eq!(analyze_chart(&req), Err(AnalysisError::DayMasterMismatch));
    }

    #[test]
    fn test_config_bounds_outputs() {
        struct Narrow;
        impl AnalysisConfig for Narrow {
            type MaxPaths = ConstU32<1>;
            type AnnualWindow = ConstU32<3>;
            type ComingYears = ConstU32<3>;
        }
        let analysis =
            analyze_chart_with::<Narrow>(&request(samples()[0].clone(), 30)).expect("valid chart");
        assert!(analysis.work_paths.len() <= 1);
        assert_eq!(analysis.luck_rhythm.annual_brief.len(), 3);
        assert_eq!(analysis.core_line(), analysis.work_paths.first());
    }

    #[test]
    fn test_supplementary_blocks() {
        for chart in samples() {
            let analysis = analyze_chart(&request(chart, 30)).expect("valid chart");
            assert!(analysis.tiaohou.score <= 100);
            assert!(analysis.tiyong.carrying_capacity <= constants::BPS);
            let tai_yuan = analysis.palaces.tai_yuan;
            assert!(GanZhi::new(tai_yuan.gan, tai_yuan.zhi).is_some());
        }
        // 壬子 壬子 丙子 癸巳：冬水寒湿
        let analysis = analyze_chart(&request(samples()[3].clone(), 30)).expect("valid chart");
        assert_eq!(analysis.tiaohou.label, tiaohou::TiaohouLabel::ColdNeedsFire);
    }

    /// 跳过强弱与取格，直接注入权重和强弱跑后半段
    fn compose_injected(weights: AttributeWeights, score: u8, band: StrengthBand) -> ChartAnalysis {
        let chart = samples()[0].clone();
        let req = request(chart.clone(), 30);
        let structure = StructureAnalysis { weights, ..Default::default() };
        let strength = StrengthAnalysis { score, band, ..Default::default() };
        compose::<DefaultAnalysisConfig>(&chart, &req, structure, strength, wuxing::analyze(&chart))
    }

    #[test]
    fn test_strong_output_without_wealth_is_flagged() {
        let w = weights_of(&[(S::BiJian, 10000), (S::ShiShen, 7000), (S::PianCai, 2000)]);
        let analysis = compose_injected(w, 85, StrengthBand::ShenQiang);
        assert!(analysis.energy_flow.risk_flags.contains(&RiskFlag::OutputWithoutOutlet));
    }

    #[test]
    fn test_dead_day_master_degrades_gracefully() {
        let analysis = compose_injected(AttributeWeights::default(), 0, StrengthBand::CongRuo);
        assert!(analysis.work_paths.is_empty());
        assert!(analysis.core_line().is_none());
        assert!(analysis.energy_flow.core_paths.is_empty());
        assert!(analysis.energy_flow.secondary_paths.is_empty());
        assert!(analysis.energy_flow.risk_flags.contains(&RiskFlag::EnergyStuck));
        assert_eq!(analysis.guancai_pattern.main_line, None);
    }

    #[test]
    fn test_flow_sees_the_reported_paths() {
        struct Single;
        impl AnalysisConfig for Single {
            type MaxPaths = ConstU32<1>;
            type AnnualWindow = ConstU32<10>;
            type ComingYears = ConstU32<3>;
        }
        for chart in samples() {
            let analysis = analyze_chart_with::<Single>(&request(chart, 30)).expect("valid chart");
            let flow = &analysis.energy_flow;
            assert_eq!(flow.core_paths.len() + flow.secondary_paths.len(), analysis.work_paths.len());
            for path in flow.core_paths.iter().chain(flow.secondary_paths.iter()) {
                assert!(analysis.work_paths.contains(path));
            }
            assert_eq!(flow.core_paths.first(), analysis.core_line());
            assert_eq!(
                analysis.guancai_pattern.main_line,
                analysis.core_line().and_then(|p| p.template)
            );
        }
    }
}
