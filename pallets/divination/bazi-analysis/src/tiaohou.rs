//! # 调候
//!
//! 寒则暖之、热则寒之、湿则燥之、燥则湿之。
//!
//! ## 气候指数（放大 10 倍）
//!
//! - 月令底色：亥子 寒30 湿10；丑 寒20 湿20；巳午 热30 燥10；未 热20 燥20；辰 湿20；戌 燥20
//! - 四柱天干与地支本气逐个计数：
//!   寒 += 水×10 + 金×7，热 += 火×10 + 木×7，湿 += 水×10 + 木×7，燥 += 火×10 + 土×7 + 金×3
//!
//! ## 评分（0~100）
//!
//! 调候用神到位 0~40、寒暖平衡 0~30、燥湿平衡 0~30。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_std::prelude::*;

use crate::chart::ChartModel;
use crate::types::{DiZhi, WuXing};

/// 主次矛盾成立所需的差值
const CONTRAST: u16 = 20;
/// 某一气候算"重"的下限
const HEAVY: u16 = 30;

/// 季节
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Season {
    #[default]
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// 寅卯辰春、巳午未夏、申酉戌秋、亥子丑冬
    pub fn of(month: DiZhi) -> Self {
        match month.0 % 12 {
            2..=4 => Season::Spring,
            5..=7 => Season::Summer,
            8..=10 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Spring => "春",
            Season::Summer => "夏",
            Season::Autumn => "秋",
            Season::Winter => "冬",
        }
    }
}

/// 寒热湿燥
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Climate {
    Cold,
    Hot,
    Wet,
    Dry,
}

impl Climate {
    pub fn name(&self) -> &'static str {
        match self {
            Climate::Cold => "寒",
            Climate::Hot => "热",
            Climate::Wet => "湿",
            Climate::Dry => "燥",
        }
    }
}

/// 程度
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, PartialOrd, Ord,
    Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ClimateLevel {
    #[default]
    None,
    Slight,
    Heavy,
    Extreme,
}

impl ClimateLevel {
    pub fn of(score: u16) -> Self {
        if score >= 60 {
            ClimateLevel::Extreme
        } else if score >= HEAVY {
            ClimateLevel::Heavy
        } else if score >= 10 {
            ClimateLevel::Slight
        } else {
            ClimateLevel::None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClimateLevel::None => "无",
            ClimateLevel::Slight => "稍",
            ClimateLevel::Heavy => "重",
            ClimateLevel::Extreme => "极",
        }
    }
}

/// 命局小气候
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ClimateScores {
    pub cold: u16,
    pub hot: u16,
    pub wet: u16,
    pub dry: u16,
}

impl ClimateScores {
    pub fn score(&self, climate: Climate) -> u16 {
        match climate {
            Climate::Cold => self.cold,
            Climate::Hot => self.hot,
            Climate::Wet => self.wet,
            Climate::Dry => self.dry,
        }
    }

    pub fn level(&self, climate: Climate) -> ClimateLevel {
        ClimateLevel::of(self.score(climate))
    }

    /// 主倾向与次倾向；全为 0 时无主倾向，次倾向需超过 10
    pub fn ranked(&self) -> (Option<Climate>, Option<Climate>) {
        let mut pairs = [
            (Climate::Cold, self.cold),
            (Climate::Hot, self.hot),
            (Climate::Wet, self.wet),
            (Climate::Dry, self.dry),
        ];
        // 稳定排序，同分按 寒热湿燥
        pairs.sort_by(|a, b| b.1.cmp(&a.1));
        let dominant = (pairs[0].1 > 0).then_some(pairs[0].0);
        let second = (pairs[1].1 > 10).then_some(pairs[1].0);
        (dominant, second)
    }
}

/// 调候标签
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum TiaohouLabel {
    ColdNeedsFire,
    HeatNeedsWater,
    DryNeedsWater,
    DampNeedsFire,
    #[default]
    Mild,
}

impl TiaohouLabel {
    pub fn name(&self) -> &'static str {
        match self {
            TiaohouLabel::ColdNeedsFire => "寒重喜火",
            TiaohouLabel::HeatNeedsWater => "热重喜水",
            TiaohouLabel::DryNeedsWater => "燥重喜水",
            TiaohouLabel::DampNeedsFire => "湿重喜火",
            TiaohouLabel::Mild => "平和可补",
        }
    }
}

/// 调候结果
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Tiaohou {
    pub season: Season,
    pub climate: ClimateScores,
    pub dominant: Option<Climate>,
    pub second: Option<Climate>,
    /// 调候所需五行，按 木火土金水 排列
    pub need: Vec<WuXing>,
    /// 调候所忌五行
    pub avoid: Vec<WuXing>,
    pub label: TiaohouLabel,
    /// 调候用神到位（0~40）
    pub season_score: u8,
    /// 寒暖平衡（0~30）
    pub temperature_score: u8,
    /// 燥湿平衡（0~30）
    pub humidity_score: u8,
    pub score: u8,
}

/// 五行集合
#[derive(Clone, Copy, Default)]
struct ElementSet([bool; 5]);

impl ElementSet {
    fn add(&mut self, element: WuXing) {
        self.0[element.index()] = true;
    }

    fn is_empty(&self) -> bool {
        !self.0.iter().any(|v| *v)
    }

    fn to_vec(self) -> Vec<WuXing> {
        WuXing::ALL.into_iter().filter(|e| self.0[e.index()]).collect()
    }
}

/// 四柱天干 + 地支本气的五行计数
fn element_counts(chart: &ChartModel) -> [u16; 5] {
    let mut counts = [0u16; 5];
    for (_, pillar) in chart.pillars() {
        counts[pillar.stem().to_wuxing().index()] += 1;
        counts[pillar.branch().to_wuxing().index()] += 1;
    }
    counts
}

/// 月令底色 + 全局五行修正
pub fn climate_of(chart: &ChartModel) -> ClimateScores {
    let mut c = match chart.month_branch().0 % 12 {
        11 | 0 => ClimateScores { cold: 30, wet: 10, ..Default::default() },
        1 => ClimateScores { cold: 20, wet: 20, ..Default::default() },
        5 | 6 => ClimateScores { hot: 30, dry: 10, ..Default::default() },
        7 => ClimateScores { hot: 20, dry: 20, ..Default::default() },
        4 => ClimateScores { wet: 20, ..Default::default() },
        10 => ClimateScores { dry: 20, ..Default::default() },
        _ => ClimateScores::default(),
    };

    let n = element_counts(chart);
    let [mu, huo, tu, jin, shui] = n;
    c.cold += shui * 10 + jin * 7;
    c.hot += huo * 10 + mu * 7;
    c.wet += shui * 10 + mu * 7;
    c.dry += huo * 10 + tu * 7 + jin * 3;
    c
}

/// 寒热为主矛盾、燥湿为次矛盾定出 need / avoid，再按季节与日主细调
fn rules(c: &ClimateScores, season: Season, day_master: WuXing) -> (ElementSet, ElementSet) {
    let mut need = ElementSet::default();
    let mut avoid = ElementSet::default();

    if c.cold >= c.hot + CONTRAST && c.cold >= HEAVY {
        need.add(WuXing::Huo);
        need.add(WuXing::Tu);
        avoid.add(WuXing::Shui);
    } else if c.hot >= c.cold + CONTRAST && c.hot >= HEAVY {
        need.add(WuXing::Shui);
        need.add(WuXing::Jin);
        avoid.add(WuXing::Huo);
    }

    if c.wet >= c.dry + CONTRAST && c.wet >= HEAVY {
        need.add(WuXing::Huo);
        need.add(WuXing::Tu);
        avoid.add(WuXing::Shui);
    } else if c.dry >= c.wet + CONTRAST && c.dry >= HEAVY {
        need.add(WuXing::Shui);
        need.add(WuXing::Tu);
        avoid.add(WuXing::Huo);
    }

    // 都不严重时给个温和的微调
    if need.is_empty() && avoid.is_empty() {
        if c.cold + c.wet > c.hot + c.dry {
            need.add(WuXing::Huo);
            need.add(WuXing::Tu);
        } else if c.hot + c.dry > c.cold + c.wet {
            need.add(WuXing::Shui);
            need.add(WuXing::Jin);
        }
    }

    match (season, day_master) {
        (Season::Winter, WuXing::Mu | WuXing::Tu | WuXing::Jin | WuXing::Shui) => need.add(WuXing::Huo),
        (Season::Summer, WuXing::Jin | WuXing::Huo | WuXing::Tu) => need.add(WuXing::Shui),
        (Season::Autumn, WuXing::Jin) => {
            need.add(WuXing::Huo);
            need.add(WuXing::Shui);
        },
        (Season::Spring, WuXing::Mu) => {
            need.add(WuXing::Jin);
            need.add(WuXing::Huo);
        },
        _ => {},
    }
    (need, avoid)
}

fn label_of(c: &ClimateScores, need: &[WuXing], dominant: Option<Climate>) -> TiaohouLabel {
    let needs = |e: WuXing| need.contains(&e);
    if c.cold >= HEAVY && needs(WuXing::Huo) {
        return TiaohouLabel::ColdNeedsFire;
    }
    if c.hot >= HEAVY && needs(WuXing::Shui) {
        return TiaohouLabel::HeatNeedsWater;
    }
    if c.dry >= HEAVY && needs(WuXing::Shui) {
        return TiaohouLabel::DryNeedsWater;
    }
    if c.wet >= HEAVY && needs(WuXing::Huo) {
        return TiaohouLabel::DampNeedsFire;
    }
    if c.cold.abs_diff(c.hot) < CONTRAST && c.wet.abs_diff(c.dry) < CONTRAST {
        return TiaohouLabel::Mild;
    }
    match dominant {
        Some(Climate::Cold) => TiaohouLabel::ColdNeedsFire,
        Some(Climate::Hot) => TiaohouLabel::HeatNeedsWater,
        Some(Climate::Dry) => TiaohouLabel::DryNeedsWater,
        Some(Climate::Wet) => TiaohouLabel::DampNeedsFire,
        None => TiaohouLabel::Mild,
    }
}

/// 失衡扣分：差 ≥40 扣 20，≥20 扣 10；当季本气再偏一层扣 5
fn balance_score(a: u16, b: u16, seasonal_excess: bool) -> u8 {
    let diff = a.abs_diff(b);
    let mut score: u16 = 30;
    if diff >= 40 {
        score -= 20;
    } else if diff >= 20 {
        score -= 10;
    }
    if seasonal_excess {
        score -= 5;
    }
    score as u8
}

/// 调候分析
pub fn analyze(chart: &ChartModel) -> Tiaohou {
    let season = Season::of(chart.month_branch());
    let climate = climate_of(chart);
    let (dominant, second) = climate.ranked();
    let (need_set, avoid_set) = rules(&climate, season, chart.day_master.to_wuxing());
    let need = need_set.to_vec();
    let avoid = avoid_set.to_vec();

    let counts = element_counts(chart);
    let present = |e: WuXing| counts[e.index()] > 0;
    let mut season_score: u16 = need.iter().filter(|e| present(**e)).count() as u16 * 20;
    season_score += avoid
        .iter()
        .filter(|e| !present(**e) || present(e.controlled_by()))
        .count() as u16 *
        10;
    let season_score = season_score.min(40) as u8;

    let temperature_score = balance_score(
        climate.cold,
        climate.hot,
        (season == Season::Winter && climate.cold > climate.hot + CONTRAST) ||
            (season == Season::Summer && climate.hot > climate.cold + CONTRAST),
    );
    let humidity_score = balance_score(
        climate.wet,
        climate.dry,
        (season == Season::Spring && climate.wet > climate.dry + CONTRAST) ||
            (season == Season::Autumn && climate.dry > climate.wet + CONTRAST),
    );

    let label = label_of(&climate, &need, dominant);
    let score = season_score + temperature_score + humidity_score;
    log::debug!(
        target: crate::LOG_TARGET,
        "🔮 调候: {}季 {} 得分 {}",
        season.name(),
        label.name(),
        score
    );

    Tiaohou {
        season,
        climate,
        dominant,
        second,
        need,
        avoid,
        label,
        season_score,
        temperature_score,
        humidity_score,
        score,
    }
}
