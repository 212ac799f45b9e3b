//! # 命盘模型
//!
//! 四柱 + 日主构成的不可变命盘（ChartModel），以及调用方传入的
//! `ChartInput`（完整 / 部分缺失）。
//!
//! ## 构造方式
//!
//! - `ChartModel::from_sizhu`：只给四组干支，其余字段（藏干、十神、长生、
//!   空亡、神煞）全部由本模块推导
//! - `ChartModel::from_pillars`：调用方已排好盘，直接校验后使用；
//!   调用方给出的十神、长生优先于推导值，缺失时再按干支推导
//!
//! 只有结构性错误（不足四柱、干支越界、阴阳不配、日主与日干不符）才会
//! 返回 `AnalysisError`，其余缺失字段一律按空值降级处理。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame_support::{traits::ConstU32, BoundedVec};
use scale_info::TypeInfo;
use sp_std::prelude::*;

use crate::constants::{
    hidden_stems_of, sanhe_group, HUA_GAI, LU_SHEN, TAO_HUA, TIAN_YI_GUI_REN, WEN_CHANG,
    YANG_REN, YI_MA,
};
use crate::types::{
    CangGan, ChangSheng, DiZhi, GanZhi, PillarPosition, ShenSha, ShiShen, TianGan,
};

// ============================================================================
// 错误类型
// ============================================================================

/// 命盘结构错误（引擎唯一的硬错误）
#[derive(Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, PartialEq, Eq, Debug)]
pub enum AnalysisError {
    /// 不足四柱
    IncompletePillars { found: u8 },
    /// 天干越界
    InvalidStem(PillarPosition),
    /// 地支越界
    InvalidBranch(PillarPosition),
    /// 干支阴阳不配（如甲丑）
    MismatchedPolarity(PillarPosition),
    /// 日主与日柱天干不一致
    DayMasterMismatch,
}

// ============================================================================
// 柱
// ============================================================================

/// 空亡标记
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
pub struct VoidFlags {
    /// 落日柱旬空
    pub day_void: bool,
    /// 落年柱旬空
    pub year_void: bool,
}

/// 单柱
#[derive(Clone, Encode, Decode, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default)]
pub struct Pillar {
    pub ganzhi: GanZhi,
    /// 地支藏干（本气在前，最多 3 个）
    pub hidden_stems: BoundedVec<CangGan, ConstU32<3>>,
    /// 天干十神，日柱天干即日主本身，为 None
    pub category: Option<ShiShen>,
    /// 藏干十神，与 `hidden_stems` 一一对应；为空时按藏干重新推导
    pub sub_categories: BoundedVec<ShiShen, ConstU32<3>>,
    /// 日主在本柱地支的长生阶段
    pub stage_of_life: Option<ChangSheng>,
    pub void_flags: VoidFlags,
    pub special_markers: BoundedVec<ShenSha, ConstU32<8>>,
}

impl Pillar {
    /// 由干支推导整柱信息
    pub fn derive(
        position: PillarPosition,
        ganzhi: GanZhi,
        day: GanZhi,
        year: GanZhi,
    ) -> Self {
        let day_master = day.gan;
        let hidden: Vec<CangGan> = hidden_stems_of(ganzhi.zhi)
            .map(|(gan, weight)| CangGan { gan, weight })
            .collect();
        let sub: Vec<ShiShen> =
            hidden.iter().map(|h| ShiShen::from_gan(day_master, h.gan)).collect();
        let category = match position {
            PillarPosition::Day => None,
            _ => Some(ShiShen::from_gan(day_master, ganzhi.gan)),
        };

        let (day_void_a, day_void_b) = day.xun_kong();
        let (year_void_a, year_void_b) = year.xun_kong();
        let void_flags = VoidFlags {
            day_void: position != PillarPosition::Day
                && (ganzhi.zhi == day_void_a || ganzhi.zhi == day_void_b),
            year_void: position != PillarPosition::Year
                && (ganzhi.zhi == year_void_a || ganzhi.zhi == year_void_b),
        };

        Self {
            ganzhi,
            hidden_stems: BoundedVec::truncate_from(hidden),
            category,
            sub_categories: BoundedVec::truncate_from(sub),
            stage_of_life: Some(ChangSheng::of(day_master, ganzhi.zhi)),
            void_flags,
            special_markers: BoundedVec::truncate_from(special_markers_of(
                ganzhi.zhi,
                day,
                year.zhi,
            )),
        }
    }

    pub fn stem(&self) -> TianGan {
        self.ganzhi.gan
    }

    pub fn branch(&self) -> DiZhi {
        self.ganzhi.zhi
    }

    /// 天干十神：调用方给出的优先，缺失时由天干推导
    pub fn stem_category(&self, day_master: TianGan) -> ShiShen {
        self.category.unwrap_or_else(|| ShiShen::from_gan(day_master, self.stem()))
    }

    /// 藏干及其十神
    pub fn hidden_categories(
        &self,
        day_master: TianGan,
    ) -> impl Iterator<Item = (&CangGan, ShiShen)> + '_ {
        self.hidden_stems.iter().enumerate().map(move |(i, hidden)| {
            let category = self
                .sub_categories
                .get(i)
                .copied()
                .unwrap_or_else(|| ShiShen::from_gan(day_master, hidden.gan));
            (hidden, category)
        })
    }

    /// 日主在本柱的长生阶段，缺失时重新推导
    pub fn stage(&self, day_master: TianGan) -> ChangSheng {
        self.stage_of_life.unwrap_or_else(|| ChangSheng::of(day_master, self.branch()))
    }

    pub fn has_marker(&self, marker: ShenSha) -> bool {
        self.special_markers.contains(&marker)
    }
}

/// 计算地支上的常用神煞
///
/// - 天乙贵人、文昌、禄神、阳刃：以日干查
/// - 桃花、驿马、华盖：以日支、年支三合局查
fn special_markers_of(zhi: DiZhi, day: GanZhi, year_zhi: DiZhi) -> Vec<ShenSha> {
    let dm = (day.gan.0 % 10) as usize;
    let z = zhi.0 % 12;
    let mut markers = Vec::new();

    let (gui_a, gui_b) = TIAN_YI_GUI_REN[dm];
    if z == gui_a || z == gui_b {
        markers.push(ShenSha::TianYiGuiRen);
    }
    if z == WEN_CHANG[dm] {
        markers.push(ShenSha::WenChang);
    }
    if z == LU_SHEN[dm] {
        markers.push(ShenSha::LuShen);
    }
    if YANG_REN[dm] == Some(z) {
        markers.push(ShenSha::YangRen);
    }

    let trines = [sanhe_group(day.zhi), sanhe_group(year_zhi)];
    if trines.iter().any(|g| TAO_HUA[*g] == z) {
        markers.push(ShenSha::TaoHua);
    }
    if trines.iter().any(|g| YI_MA[*g] == z) {
        markers.push(ShenSha::YiMa);
    }
    if trines.iter().any(|g| HUA_GAI[*g] == z) {
        markers.push(ShenSha::HuaGai);
    }
    markers
}

// ============================================================================
// 命盘
// ============================================================================

/// 四柱命盘（创建后不可变）
#[derive(Clone, Encode, Decode, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default)]
pub struct ChartModel {
    pub year: Pillar,
    pub month: Pillar,
    pub day: Pillar,
    pub hour: Pillar,
    pub day_master: TianGan,
}

impl ChartModel {
    /// 由四组干支排出完整命盘
    pub fn from_sizhu(
        year: GanZhi,
        month: GanZhi,
        day: GanZhi,
        hour: GanZhi,
    ) -> Result<Self, AnalysisError> {
        let ganzhis = [year, month, day, hour];
        for (position, gz) in PillarPosition::ALL.iter().zip(ganzhis.iter()) {
            validate_ganzhi(*position, *gz)?;
        }

        let build = |position: PillarPosition, gz: GanZhi| Pillar::derive(position, gz, day, year);
        Ok(Self {
            year: build(PillarPosition::Year, year),
            month: build(PillarPosition::Month, month),
            day: build(PillarPosition::Day, day),
            hour: build(PillarPosition::Hour, hour),
            day_master: day.gan,
        })
    }

    /// 由调用方提供的柱序列构造（年、月、日、时），不足四柱返回错误
    pub fn from_pillars(pillars: &[Pillar]) -> Result<Self, AnalysisError> {
        match pillars {
            [year, month, day, hour, ..] => {
                let chart = Self {
                    year: year.clone(),
                    month: month.clone(),
                    day: day.clone(),
                    hour: hour.clone(),
                    day_master: day.ganzhi.gan,
                };
                chart.validate()?;
                Ok(chart)
            },
            _ => Err(AnalysisError::IncompletePillars { found: pillars.len().min(4) as u8 }),
        }
    }

    /// 结构校验
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (position, pillar) in self.pillars() {
            validate_ganzhi(position, pillar.ganzhi)?;
        }
        if self.day_master != self.day.ganzhi.gan {
            return Err(AnalysisError::DayMasterMismatch);
        }
        Ok(())
    }

    /// 按 年、月、日、时 顺序遍历
    pub fn pillars(&self) -> [(PillarPosition, &Pillar); 4] {
        [
            (PillarPosition::Year, &self.year),
            (PillarPosition::Month, &self.month),
            (PillarPosition::Day, &self.day),
            (PillarPosition::Hour, &self.hour),
        ]
    }

    pub fn pillar(&self, position: PillarPosition) -> &Pillar {
        match position {
            PillarPosition::Year => &self.year,
            PillarPosition::Month => &self.month,
            PillarPosition::Day => &self.day,
            PillarPosition::Hour => &self.hour,
        }
    }

    /// 月令地支
    pub fn month_branch(&self) -> DiZhi {
        self.month.ganzhi.zhi
    }

    pub fn branches(&self) -> [DiZhi; 4] {
        [self.year.branch(), self.month.branch(), self.day.branch(), self.hour.branch()]
    }

    /// 任一柱带某神煞
    pub fn has_marker(&self, marker: ShenSha) -> bool {
        self.pillars().iter().any(|(_, p)| p.has_marker(marker))
    }
}

fn validate_ganzhi(position: PillarPosition, gz: GanZhi) -> Result<(), AnalysisError> {
    if !gz.gan.is_valid() {
        return Err(AnalysisError::InvalidStem(position));
    }
    if !gz.zhi.is_valid() {
        return Err(AnalysisError::InvalidBranch(position));
    }
    if gz.gan.0 % 2 != gz.zhi.0 % 2 {
        return Err(AnalysisError::MismatchedPolarity(position));
    }
    Ok(())
}

// ============================================================================
// 输入
// ============================================================================

/// 缺失字段
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum MissingField {
    /// 藏干缺失（按空序列处理）
    HiddenStems(PillarPosition),
    /// 十神缺失（按"未知"处理，分析时由天干重新推导）
    Category(PillarPosition),
    /// 长生阶段缺失
    StageOfLife(PillarPosition),
    /// 神煞缺失
    SpecialMarkers(PillarPosition),
    /// 出生时辰不详（时柱为占位）
    BirthHour,
}

/// 命盘输入
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug)]
pub enum ChartInput {
    /// 全部字段齐备
    Complete(ChartModel),
    /// 部分字段缺失，缺失项已按空值填充
    Partial(ChartModel, Vec<MissingField>),
}

impl ChartInput {
    pub fn chart(&self) -> &ChartModel {
        match self {
            ChartInput::Complete(chart) | ChartInput::Partial(chart, _) => chart,
        }
    }

    pub fn missing_fields(&self) -> &[MissingField] {
        match self {
            ChartInput::Complete(_) => &[],
            ChartInput::Partial(_, missing) => missing,
        }
    }

    /// 校验并拆出命盘与缺失字段
    pub fn resolve(&self) -> Result<(&ChartModel, &[MissingField]), AnalysisError> {
        let chart = self.chart();
        chart.validate()?;
        for field in self.missing_fields() {
            log::warn!(
                target: crate::LOG_TARGET,
                "🔮 命盘字段缺失，按空值降级: {:?}",
                field
            );
        }
        Ok((chart, self.missing_fields()))
    }
}
