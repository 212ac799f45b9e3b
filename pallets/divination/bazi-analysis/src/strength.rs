//! # 日主强弱
//!
//! ## 算法
//!
//! 1. 得令：日主五行在月令的季节系数
//! 2. 得地：日主在各支藏干中的通根（同干 ×1.0、同五行 ×0.6），外加日支旺地加成
//! 3. 得助：比劫（×0.8）与印星（×0.85）帮身
//! 4. 耗身：官杀 ×0.85、财 ×0.75、食伤 ×0.55，印星可化解一部分（最多 30%）
//!
//! `score = base + k_season·得令 + k_root·norm(得地) + k_help·norm(得助) − k_drain·norm(耗身)`
//!
//! 全部以千分比（‰）整数运算，结果截断到 0~1000，对外给出 0~100 分与七档强弱。
//!
//! ## 分档
//!
//! | 分数 | 档位 |
//! |------|------|
//! | ≥85 | 从强（需过闸门，否则身强） |
//! | ≥62 | 身强 |
//! | ≥50 | 身偏强（帮 > 1.2×耗）或平衡 |
//! | ≥45 | 平衡 |
//! | ≥35 | 身偏弱（耗 > 1.2×帮）或身弱 |
//! | ≥22 | 身弱 |
//! | <22 | 从弱（需过闸门，否则身弱） |

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

use crate::chart::ChartModel;
use crate::constants::{season_weight, PERMILLE};
use crate::types::{DiZhi, PillarPosition, School, ShiShen, ShiShenGroup, TianGan};

// ============================================================================
// 学派系数
// ============================================================================

/// 强弱评分系数（均为 ‰）
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct StrengthConfig {
    pub k_season: u32,
    pub k_root: u32,
    pub k_help: u32,
    pub drain_coef: u32,
    /// 印星化耗系数
    pub print_mitigate: u32,
    pub month_boost: u32,
    pub day_boost: u32,
    /// 日支旺地加成缩放
    pub root_bonus_scale: u32,
    pub norm_root: u32,
    pub norm_help: u32,
    pub norm_drain: u32,
    pub base_bonus: u32,
}

impl StrengthConfig {
    /// 子平
    pub const ZI_PING: Self = Self {
        k_season: 450,
        k_root: 350,
        k_help: 250,
        drain_coef: 350,
        print_mitigate: 350,
        month_boost: 1300,
        day_boost: 1150,
        root_bonus_scale: 500,
        norm_root: 1500,
        norm_help: 3500,
        norm_drain: 1500,
        base_bonus: 120,
    };

    /// 盲派
    pub const MANG_PAI: Self = Self {
        k_season: 450,
        k_root: 350,
        k_help: 200,
        drain_coef: 500,
        print_mitigate: 300,
        month_boost: 1150,
        day_boost: 1100,
        root_bonus_scale: 900,
        norm_root: 1500,
        norm_help: 2000,
        norm_drain: 1500,
        base_bonus: 80,
    };

    pub fn for_school(school: School) -> Self {
        match school {
            School::ZiPing => Self::ZI_PING,
            School::MangPai => Self::MANG_PAI,
        }
    }

    fn place_boost(&self, position: PillarPosition) -> u32 {
        match position {
            PillarPosition::Month => self.month_boost,
            PillarPosition::Day => self.day_boost,
            _ => PERMILLE,
        }
    }
}

/// 印星化耗上限（‰）
const MAX_PRINT_MITIGATION: u32 = 300;

/// 余气以下的藏干不算官杀之根（‰）
const CONTROLLER_ROOT_MIN_WEIGHT: u16 = 200;

// ============================================================================
// 结果
// ============================================================================

/// 日主强弱七档
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum StrengthBand {
    /// 从强
    CongQiang = 0,
    /// 身强
    ShenQiang = 1,
    /// 身偏强
    PianQiang = 2,
    /// 平衡
    #[default]
    PingHeng = 3,
    /// 身偏弱
    PianRuo = 4,
    /// 身弱
    ShenRuo = 5,
    /// 从弱
    CongRuo = 6,
}

impl StrengthBand {
    /// 日主一方偏弱（身偏弱及以下）
    pub fn is_weak_side(&self) -> bool {
        matches!(self, StrengthBand::PianRuo | StrengthBand::ShenRuo | StrengthBand::CongRuo)
    }

    pub fn is_strong_side(&self) -> bool {
        matches!(self, StrengthBand::CongQiang | StrengthBand::ShenQiang | StrengthBand::PianQiang)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrengthBand::CongQiang => "从强",
            StrengthBand::ShenQiang => "身强",
            StrengthBand::PianQiang => "身偏强",
            StrengthBand::PingHeng => "平衡",
            StrengthBand::PianRuo => "身偏弱",
            StrengthBand::ShenRuo => "身弱",
            StrengthBand::CongRuo => "从弱",
        }
    }
}

/// 强弱分项（‰）
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct StrengthDetail {
    /// 得令
    pub season: u32,
    /// 得地
    pub root: u32,
    /// 比劫之力
    pub bi_power: u32,
    /// 印星之力
    pub print_power: u32,
    /// 印星化解后的耗身之力
    pub drain: u32,
}

impl StrengthDetail {
    pub fn help(&self) -> u32 {
        self.bi_power + self.print_power
    }
}

/// 日主强弱结果
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct StrengthAnalysis {
    /// 0~100
    pub score: u8,
    /// 0~1000，分档依据
    pub score_permille: u16,
    pub band: StrengthBand,
    pub detail: StrengthDetail,
}

// ============================================================================
// 计算
// ============================================================================

/// 计算日主强弱
pub fn analyze(chart: &ChartModel, config: &StrengthConfig) -> StrengthAnalysis {
    let dm = chart.day_master;
    let dm_element = dm.to_wuxing();
    let month_branch = chart.month_branch();

    // 1. 得令
    let season = season_weight(dm_element, month_branch) as u32;

    // 2. 得地
    let mut root: u32 = 0;
    for (_, pillar) in chart.pillars() {
        for hidden in pillar.hidden_stems.iter() {
            if hidden.gan == dm {
                root += hidden.weight as u32;
            } else if hidden.gan.to_wuxing() == dm_element {
                root += hidden.weight as u32 * 600 / PERMILLE;
            }
        }
    }
    root += chart.day.stage(dm).root_bonus() * config.root_bonus_scale / PERMILLE;

    // 3. 帮身 / 耗身
    let mut bi_power: u32 = 0;
    let mut print_power: u32 = 0;
    let mut drain: u32 = 0;
    for (position, pillar) in chart.pillars() {
        let place = config.place_boost(position);
        let stems = core::iter::once((pillar.stem(), PERMILLE))
            .chain(pillar.hidden_stems.iter().map(|h| (h.gan, h.weight as u32)));
        for (gan, weight) in stems {
            let w = symbol_weight(dm, gan, weight, place, month_branch);
            match ShiShen::from_gan(dm, gan).group() {
                ShiShenGroup::BiJie => bi_power += w * 800 / PERMILLE,
                ShiShenGroup::Yin => print_power += w * 850 / PERMILLE,
                ShiShenGroup::GuanSha => drain += w * 850 / PERMILLE,
                ShiShenGroup::Cai => drain += w * 750 / PERMILLE,
                ShiShenGroup::ShiShang => drain += w * 550 / PERMILLE,
            }
        }
    }

    let mitigation = (print_power * config.print_mitigate / PERMILLE).min(MAX_PRINT_MITIGATION);
    let drain = drain * (PERMILLE - mitigation) / PERMILLE;
    let help = bi_power + print_power;

    // 4. 综合
    let positive = config.k_season * season
        + config.k_root * norm(root, config.norm_root)
        + config.k_help * norm(help, config.norm_help)
        + config.base_bonus * PERMILLE;
    let negative = config.drain_coef * norm(drain, config.norm_drain);
    let raw = (positive.saturating_sub(negative) / PERMILLE).min(PERMILLE);

    let detail = StrengthDetail { season, root, bi_power, print_power, drain };
    let band = gate_band(raw_band(raw, &detail), &detail, chart);

    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 日主强弱: {}‰ {} (令 {} 根 {} 助 {} 耗 {})",
        raw,
        band.name(),
        season,
        root,
        help,
        drain
    );

    StrengthAnalysis { score: (raw / 10) as u8, score_permille: raw as u16, band, detail }
}

/// 单个干的综合权重：权重 × 位置 × (0.7 + 0.6 × 季节)
pub(crate) fn symbol_weight(
    dm: TianGan,
    gan: TianGan,
    weight: u32,
    place: u32,
    month_branch: DiZhi,
) -> u32 {
    let element = ShiShen::from_gan(dm, gan).element(dm);
    let season_boost = 700 + 600 * season_weight(element, month_branch) as u32 / PERMILLE;
    weight * place / PERMILLE * season_boost / PERMILLE
}

/// 软归一化：x / scale，截断到 1000‰
fn norm(x: u32, scale: u32) -> u32 {
    if scale == 0 {
        return 0;
    }
    (x as u64 * PERMILLE as u64 / scale as u64).min(PERMILLE as u64) as u32
}

fn raw_band(raw: u32, detail: &StrengthDetail) -> StrengthBand {
    let help = detail.help();
    let drain = detail.drain;
    if raw >= 850 {
        StrengthBand::CongQiang
    } else if raw >= 620 {
        StrengthBand::ShenQiang
    } else if raw >= 500 {
        if help * 10 > drain * 12 {
            StrengthBand::PianQiang
        } else {
            StrengthBand::PingHeng
        }
    } else if raw >= 450 {
        StrengthBand::PingHeng
    } else if raw >= 350 {
        if drain * 10 > help * 12 {
            StrengthBand::PianRuo
        } else {
            StrengthBand::ShenRuo
        }
    } else if raw >= 220 {
        StrengthBand::ShenRuo
    } else {
        StrengthBand::CongRuo
    }
}

/// 从格闸门
///
/// - 从强：帮 ≥ 1.6×耗、耗 ≤ 0.55、得令 ≥ 0.7 或得地 ≥ 0.9、官杀无根；否则降为身强
/// - 从弱：耗 ≥ 1.6×帮、帮 ≤ 0.45、得令 ≤ 0.4、得地 ≤ 0.6；否则升为身弱
fn gate_band(band: StrengthBand, detail: &StrengthDetail, chart: &ChartModel) -> StrengthBand {
    let help = detail.help();
    let drain = detail.drain;
    match band {
        StrengthBand::CongQiang => {
            let passes = help * 10 >= drain * 16
                && drain <= 550
                && (detail.season >= 700 || detail.root >= 900)
                && !has_controller_root(chart);
            if passes {
                band
            } else {
                StrengthBand::ShenQiang
            }
        },
        StrengthBand::CongRuo => {
            let passes = drain * 10 >= help * 16
                && help <= 450
                && detail.season <= 400
                && detail.root <= 600;
            if passes {
                band
            } else {
                log::warn!(target: crate::LOG_TARGET, "⚠️ 从弱闸门未通过，上调为身弱");
                StrengthBand::ShenRuo
            }
        },
        other => other,
    }
}

/// 官杀是否有通根（地支本气或非余气藏干）
fn has_controller_root(chart: &ChartModel) -> bool {
    let controller = chart.day_master.to_wuxing().controlled_by();
    chart.pillars().iter().any(|(_, pillar)| {
        pillar.branch().to_wuxing() == controller
            || pillar.hidden_stems.iter().any(|h| {
                h.gan.to_wuxing() == controller && h.weight >= CONTROLLER_ROOT_MIN_WEIGHT
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::tests::chart_of;

    #[test]
    fn test_school_config_selection() {
        assert_eq!(StrengthConfig::for_school(School::ZiPing).k_help, 250);
        assert_eq!(StrengthConfig::for_school(School::MangPai).drain_coef, 500);
    }

    #[test]
    fn test_wood_in_spring_is_strong() {
        // 甲寅年 丙寅月 甲寅日 乙亥时：木旺当令，满盘比劫
        let chart = chart_of([(0, 2), (2, 2), (0, 2), (1, 11)]);
        let result = analyze(&chart, &StrengthConfig::ZI_PING);
        assert!(result.score >= 62, "score = {}", result.score);
        assert!(result.band.is_strong_side());
        assert_eq!(result.detail.season, 1000);
    }

    #[test]
    fn test_wood_in_autumn_is_weak() {
        // 庚申年 乙酉月 甲申日 庚午时：金旺克木，日主无根
        let chart = chart_of([(6, 8), (1, 9), (0, 8), (6, 6)]);
        let result = analyze(&chart, &StrengthConfig::ZI_PING);
        assert!(result.score < 45, "score = {}", result.score);
        assert!(result.band.is_weak_side());
    }

    #[test]
    fn test_day_stage_feeds_root() {
        // 甲午日：甲木死于午，无长生加成
        let mut chart = chart_of([(0, 0), (2, 2), (0, 6), (6, 6)]);
        let derived = analyze(&chart, &StrengthConfig::ZI_PING);
        chart.day.stage_of_life = None;
        assert_eq!(analyze(&chart, &StrengthConfig::ZI_PING), derived);

        chart.day.stage_of_life = Some(crate::types::ChangSheng::DiWang);
        let supplied = analyze(&chart, &StrengthConfig::ZI_PING);
        assert!(supplied.detail.root > derived.detail.root);
    }

    #[test]
    fn test_schools_disagree_within_bounds() {
        let chart = chart_of([(0, 0), (2, 2), (0, 6), (6, 6)]);
        let zp = analyze(&chart, &StrengthConfig::ZI_PING);
        let mp = analyze(&chart, &StrengthConfig::MANG_PAI);
        assert!(zp.score <= 100 && mp.score <= 100);
        assert_eq!(zp.detail.season, mp.detail.season);
    }

    #[test]
    fn test_cong_ruo_gate_lifts_to_shen_ruo() {
        // 得令过高时即使分数很低也不能从弱
        let detail = StrengthDetail { season: 1000, root: 0, bi_power: 0, print_power: 0, drain: 2000 };
        let chart = chart_of([(6, 8), (1, 9), (0, 8), (6, 6)]);
        assert_eq!(gate_band(StrengthBand::CongRuo, &detail, &chart), StrengthBand::ShenRuo);

        let detail = StrengthDetail { season: 200, root: 0, bi_power: 100, print_power: 0, drain: 2000 };
        assert_eq!(gate_band(StrengthBand::CongRuo, &detail, &chart), StrengthBand::CongRuo);
    }

    #[test]
    fn test_band_split_by_help_ratio() {
        let helped = StrengthDetail { season: 0, root: 0, bi_power: 1300, print_power: 0, drain: 1000 };
        assert_eq!(raw_band(550, &helped), StrengthBand::PianQiang);
        let even = StrengthDetail { season: 0, root: 0, bi_power: 1000, print_power: 0, drain: 1000 };
        assert_eq!(raw_band(550, &even), StrengthBand::PingHeng);
        assert_eq!(raw_band(400, &even), StrengthBand::ShenRuo);
        let drained = StrengthDetail { season: 0, root: 0, bi_power: 500, print_power: 0, drain: 1000 };
        assert_eq!(raw_band(400, &drained), StrengthBand::PianRuo);
    }
}
