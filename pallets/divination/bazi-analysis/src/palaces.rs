//! # 命宫、胎元、身宫
//!
//! - 命宫：寅宫起正月顺数到生月，再由月宫起子时逆数到生时
//! - 身宫：同上，但由月宫起子时顺数
//! - 胎元：月干进一位，月支进三位
//! - 宫位天干按年干五虎遁：甲己丙作首、乙庚戊为头、丙辛寻庚起、丁壬壬寅顺、戊癸甲寅求

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

use crate::chart::ChartModel;
use crate::types::{DiZhi, GanZhi, TianGan};

/// 寅
const YIN: u8 = 2;

/// 命身关系
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum MingShenRelation {
    /// 命身同宫
    SamePalace,
    /// 命宫生身宫
    MingShengShen,
    /// 命宫克身宫
    MingKeShen,
    /// 命身比和
    BiHe,
    /// 各有侧重
    #[default]
    Divergent,
}

impl MingShenRelation {
    pub fn of(ming: DiZhi, shen: DiZhi) -> Self {
        let (a, b) = (ming.to_wuxing(), shen.to_wuxing());
        if ming == shen {
            MingShenRelation::SamePalace
        } else if a.generates() == b {
            MingShenRelation::MingShengShen
        } else if a.controls() == b {
            MingShenRelation::MingKeShen
        } else if a == b {
            MingShenRelation::BiHe
        } else {
            MingShenRelation::Divergent
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MingShenRelation::SamePalace => "命身同宫",
            MingShenRelation::MingShengShen => "命宫生身宫",
            MingShenRelation::MingKeShen => "命宫克身宫",
            MingShenRelation::BiHe => "命身比和",
            MingShenRelation::Divergent => "命身各有侧重",
        }
    }
}

/// 三宫
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Palaces {
    pub ming_gong: GanZhi,
    pub tai_yuan: GanZhi,
    pub shen_gong: GanZhi,
    pub relation: MingShenRelation,
}

/// 五虎遁：年干定寅宫天干，再顺推到目标地支
pub fn palace_stem(year_stem: TianGan, zhi: DiZhi) -> TianGan {
    let yin_stem = (year_stem.0 % 5) * 2 + 2;
    let offset = (zhi.0 % 12 + 12 - YIN) % 12;
    TianGan((yin_stem + offset) % 10)
}

fn palace(year_stem: TianGan, zhi: DiZhi) -> GanZhi {
    GanZhi { gan: palace_stem(year_stem, zhi), zhi }
}

/// 计算三宫
pub fn analyze(chart: &ChartModel) -> Palaces {
    let year_stem = chart.year.stem();
    let month = chart.month.ganzhi;
    let hour = chart.hour.branch().0 % 12;
    let month_zhi = month.zhi.0 % 12;

    let ming_zhi = DiZhi((month_zhi + 12 - hour) % 12);
    let shen_zhi = DiZhi((month_zhi + hour) % 12);
    let tai_yuan = GanZhi { gan: TianGan((month.gan.0 + 1) % 10), zhi: DiZhi((month_zhi + 3) % 12) };

    let palaces = Palaces {
        ming_gong: palace(year_stem, ming_zhi),
        tai_yuan,
        shen_gong: palace(year_stem, shen_zhi),
        relation: MingShenRelation::of(ming_zhi, shen_zhi),
    };
    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 命宫 {}{} 身宫 {}{} {}",
        palaces.ming_gong.gan.name(),
        palaces.ming_gong.zhi.name(),
        palaces.shen_gong.gan.name(),
        palaces.shen_gong.zhi.name(),
        palaces.relation.name()
    );
    palaces
}
