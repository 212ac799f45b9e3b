//! # 八字常量表
//!
//! 藏干、旺相休囚死、合冲、禄刃、神煞等查表数据。
//!
//! ## 天干地支索引
//!
//! - 天干: 甲(0) 乙(1) 丙(2) 丁(3) 戊(4) 己(5) 庚(6) 辛(7) 壬(8) 癸(9)
//! - 地支: 子(0) 丑(1) 寅(2) 卯(3) 辰(4) 巳(5) 午(6) 未(7) 申(8) 酉(9) 戌(10) 亥(11)
//!
//! 所有表都是只读 `const`，权重统一使用千分比（‰）。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

use crate::types::{DiZhi, TianGan, WuXing};

/// 千分比基数
pub const PERMILLE: u32 = 1000;

/// 万分比基数（W 向量、做功力度等使用）
pub const BPS: u32 = 10_000;

// ============================================================================
// 藏干
// ============================================================================

/// 地支藏干表：(天干索引, 权重‰)，按 本气 / 中气 / 余气 排列，0 权重表示空位
pub const HIDDEN_STEMS: [[(u8, u16); 3]; 12] = [
    [(9, 1000), (0, 0), (0, 0)],     // 子: 癸
    [(5, 600), (9, 300), (7, 100)],  // 丑: 己 癸 辛
    [(0, 600), (2, 300), (4, 100)],  // 寅: 甲 丙 戊
    [(1, 1000), (0, 0), (0, 0)],     // 卯: 乙
    [(4, 600), (1, 300), (9, 100)],  // 辰: 戊 乙 癸
    [(2, 600), (6, 300), (4, 100)],  // 巳: 丙 庚 戊
    [(3, 700), (5, 300), (0, 0)],    // 午: 丁 己
    [(5, 600), (3, 300), (1, 100)],  // 未: 己 丁 乙
    [(6, 600), (8, 300), (4, 100)],  // 申: 庚 壬 戊
    [(7, 1000), (0, 0), (0, 0)],     // 酉: 辛
    [(4, 600), (7, 300), (3, 100)],  // 戌: 戊 辛 丁
    [(8, 700), (0, 300), (0, 0)],    // 亥: 壬 甲
];

/// 获取地支藏干（跳过空位）
pub fn hidden_stems_of(zhi: DiZhi) -> impl Iterator<Item = (TianGan, u16)> {
    let row = HIDDEN_STEMS[(zhi.0 % 12) as usize];
    row.into_iter()
        .filter(|(_, weight)| *weight > 0)
        .map(|(gan, weight)| (TianGan(gan), weight))
}

// ============================================================================
// 旺相休囚死
// ============================================================================

/// 旺相休囚死系数（‰）：旺 / 相 / 休 / 囚 / 死
pub const SEASON_COEFFICIENTS: [u16; 5] = [1000, 800, 550, 350, 200];

/// 五行在某月令下的季节系数（‰）
///
/// - 同月令五行为旺
/// - 月令所生为相
/// - 生月令者为休
/// - 克月令者为囚
/// - 月令所克为死
pub fn season_weight(element: WuXing, month_zhi: DiZhi) -> u16 {
    SEASON_COEFFICIENTS[WangXiang::of(element, month_zhi) as usize]
}

/// 旺相休囚死状态
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WangXiang {
    /// 旺
    Wang = 0,
    /// 相
    Xiang = 1,
    /// 休
    #[default]
    Xiu = 2,
    /// 囚
    Qiu = 3,
    /// 死
    Si = 4,
}

impl WangXiang {
    /// 计算五行在月令下的旺衰状态
    pub fn of(element: WuXing, month_zhi: DiZhi) -> Self {
        let season = month_zhi.to_wuxing();
        if element == season {
            WangXiang::Wang
        } else if season.generates() == element {
            WangXiang::Xiang
        } else if element.generates() == season {
            WangXiang::Xiu
        } else if element.controls() == season {
            WangXiang::Qiu
        } else {
            WangXiang::Si
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WangXiang::Wang => "旺",
            WangXiang::Xiang => "相",
            WangXiang::Xiu => "休",
            WangXiang::Qiu => "囚",
            WangXiang::Si => "死",
        }
    }
}

// ============================================================================
// 合冲
// ============================================================================

/// 天干五合对照表：(干, 干, 化神五行)
/// 甲己合土、乙庚合金、丙辛合水、丁壬合木、戊癸合火
pub const TIANGAN_HE_PAIRS: [(u8, u8, WuXing); 5] = [
    (0, 5, WuXing::Tu),
    (1, 6, WuXing::Jin),
    (2, 7, WuXing::Shui),
    (3, 8, WuXing::Mu),
    (4, 9, WuXing::Huo),
];

/// 地支六冲对照表
/// 子午冲、丑未冲、寅申冲、卯酉冲、辰戌冲、巳亥冲
pub const DIZHI_LIUCHONG_PAIRS: [(u8, u8); 6] = [
    (0, 6),   // 子午冲
    (1, 7),   // 丑未冲
    (2, 8),   // 寅申冲
    (3, 9),   // 卯酉冲
    (4, 10),  // 辰戌冲
    (5, 11),  // 巳亥冲
];

/// 检查天干是否五合，返回化神五行
pub fn tiangan_he(stem1: TianGan, stem2: TianGan) -> Option<WuXing> {
    TIANGAN_HE_PAIRS
        .iter()
        .find(|(a, b, _)| (stem1.0 == *a && stem2.0 == *b) || (stem1.0 == *b && stem2.0 == *a))
        .map(|(_, _, element)| *element)
}

/// 检查地支是否六冲
pub fn is_dizhi_liuchong(branch1: DiZhi, branch2: DiZhi) -> bool {
    for (a, b) in DIZHI_LIUCHONG_PAIRS.iter() {
        if (branch1.0 == *a && branch2.0 == *b) || (branch1.0 == *b && branch2.0 == *a) {
            return true;
        }
    }
    false
}

// ============================================================================
// 禄刃 / 长生
// ============================================================================

/// 禄位（临官）：甲寅 乙卯 丙巳 丁午 戊巳 己午 庚申 辛酉 壬亥 癸子
pub const LU_SHEN: [u8; 10] = [2, 3, 5, 6, 5, 6, 8, 9, 11, 0];

/// 阳刃（帝旺，仅阳干）：甲卯 丙午 戊午 庚酉 壬子
pub const YANG_REN: [Option<u8>; 10] = [
    Some(3), None, Some(6), None, Some(6), None, Some(9), None, Some(0), None,
];

/// 十二长生起点：阳干顺行、阴干逆行
/// 甲亥 乙午 丙寅 丁酉 戊寅 己酉 庚巳 辛子 壬申 癸卯
pub const CHANG_SHENG_START: [u8; 10] = [11, 6, 2, 9, 2, 9, 5, 0, 8, 3];

// ============================================================================
// 神煞
// ============================================================================

/// 天乙贵人（按日干）：甲戊庚牛羊、乙己鼠猴乡、丙丁猪鸡位、壬癸兔蛇藏、辛逢虎马
pub const TIAN_YI_GUI_REN: [(u8, u8); 10] = [
    (1, 7),  // 甲: 丑未
    (0, 8),  // 乙: 子申
    (11, 9), // 丙: 亥酉
    (11, 9), // 丁: 亥酉
    (1, 7),  // 戊: 丑未
    (0, 8),  // 己: 子申
    (1, 7),  // 庚: 丑未
    (2, 6),  // 辛: 寅午
    (3, 5),  // 壬: 卯巳
    (3, 5),  // 癸: 卯巳
];

/// 文昌（按日干）：甲巳 乙午 丙申 丁酉 戊申 己酉 庚亥 辛子 壬寅 癸卯
pub const WEN_CHANG: [u8; 10] = [5, 6, 8, 9, 8, 9, 11, 0, 2, 3];

/// 三合局序号：申子辰(0) 寅午戌(1) 巳酉丑(2) 亥卯未(3)
pub fn sanhe_group(zhi: DiZhi) -> usize {
    match zhi.0 % 12 {
        8 | 0 | 4 => 0,
        2 | 6 | 10 => 1,
        5 | 9 | 1 => 2,
        _ => 3,
    }
}

/// 桃花（按三合局）：申子辰酉、寅午戌卯、巳酉丑午、亥卯未子
pub const TAO_HUA: [u8; 4] = [9, 3, 6, 0];

/// 驿马（按三合局）：申子辰寅、寅午戌申、巳酉丑亥、亥卯未巳
pub const YI_MA: [u8; 4] = [2, 8, 11, 5];

/// 华盖（按三合局）：申子辰辰、寅午戌戌、巳酉丑丑、亥卯未未
pub const HUA_GAI: [u8; 4] = [4, 10, 1, 7];

#[cfg(test)]
mod tests {
    use super::*;

    const ZI: DiZhi = DiZhi(0);
    const YIN: DiZhi = DiZhi(2);
    const WU: DiZhi = DiZhi(6);
    const CHEN: DiZhi = DiZhi(4);

    #[test]
    fn test_hidden_stems_skip_empty_slots() {
        let zi: sp_std::vec::Vec<_> = hidden_stems_of(ZI).collect();
        assert_eq!(zi, sp_std::vec![(TianGan(9), 1000)]);

        let yin: sp_std::vec::Vec<_> = hidden_stems_of(YIN).collect();
        assert_eq!(yin.len(), 3);
        assert_eq!(yin[0], (TianGan(0), 600));
    }

    #[test]
    fn test_hidden_stem_weights_sum_to_one() {
        for zhi in 0..12u8 {
            let total: u32 = hidden_stems_of(DiZhi(zhi)).map(|(_, w)| w as u32).sum();
            assert_eq!(total, PERMILLE);
        }
    }

    #[test]
    fn test_wangxiang_in_spring() {
        // 寅月木旺、火相、水休、金囚、土死
        assert_eq!(WangXiang::of(WuXing::Mu, YIN), WangXiang::Wang);
        assert_eq!(WangXiang::of(WuXing::Huo, YIN), WangXiang::Xiang);
        assert_eq!(WangXiang::of(WuXing::Shui, YIN), WangXiang::Xiu);
        assert_eq!(WangXiang::of(WuXing::Jin, YIN), WangXiang::Qiu);
        assert_eq!(WangXiang::of(WuXing::Tu, YIN), WangXiang::Si);
        assert_eq!(season_weight(WuXing::Mu, YIN), 1000);
        assert_eq!(season_weight(WuXing::Tu, CHEN), 1000);
    }

    #[test]
    fn test_he_and_chong() {
        assert_eq!(tiangan_he(TianGan(0), TianGan(5)), Some(WuXing::Tu));
        assert_eq!(tiangan_he(TianGan(8), TianGan(3)), Some(WuXing::Mu));
        assert_eq!(tiangan_he(TianGan(0), TianGan(1)), None);
        assert!(is_dizhi_liuchong(ZI, WU));
        assert!(!is_dizhi_liuchong(ZI, YIN));
    }
}
