//! # 基础类型定义
//!
//! 天干、地支、五行、干支、十神、十二长生、神煞等分析引擎共享的值类型。
//!
//! 全部为 `Copy` 的小型值对象，可 SCALE 编码，用于链下服务与链上存储之间传递。

use codec::{Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;

use crate::constants::{CHANG_SHENG_START, PERMILLE};

// ============================================================================
// 五行
// ============================================================================

/// 五行
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WuXing {
    /// 木
    #[default]
    Mu = 0,
    /// 火
    Huo = 1,
    /// 土
    Tu = 2,
    /// 金
    Jin = 3,
    /// 水
    Shui = 4,
}

impl WuXing {
    /// 按相生顺序排列的全部五行
    pub const ALL: [WuXing; 5] = [WuXing::Mu, WuXing::Huo, WuXing::Tu, WuXing::Jin, WuXing::Shui];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 5]
    }

    /// 我生者
    pub fn generates(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// 我克者
    pub fn controls(&self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// 生我者
    pub fn generated_by(&self) -> Self {
        Self::from_index(self.index() + 4)
    }

    /// 克我者
    pub fn controlled_by(&self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn name(&self) -> &'static str {
        match self {
            WuXing::Mu => "木",
            WuXing::Huo => "火",
            WuXing::Tu => "土",
            WuXing::Jin => "金",
            WuXing::Shui => "水",
        }
    }
}

/// 检查五行是否相生
pub fn is_wuxing_sheng(from: WuXing, to: WuXing) -> bool {
    from.generates() == to
}

/// 检查五行是否相克
pub fn is_wuxing_ke(from: WuXing, to: WuXing) -> bool {
    from.controls() == to
}

// ============================================================================
// 天干地支
// ============================================================================

/// 天干：甲(0) 乙(1) 丙(2) 丁(3) 戊(4) 己(5) 庚(6) 辛(7) 壬(8) 癸(9)
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct TianGan(pub u8);

impl TianGan {
    pub fn is_valid(&self) -> bool {
        self.0 < 10
    }

    /// 甲乙木、丙丁火、戊己土、庚辛金、壬癸水
    pub fn to_wuxing(&self) -> WuXing {
        WuXing::from_index((self.0 % 10 / 2) as usize)
    }

    pub fn is_yang(&self) -> bool {
        self.0 % 2 == 0
    }

    pub fn name(&self) -> &'static str {
        const NAMES: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];
        NAMES[(self.0 % 10) as usize]
    }
}

/// 地支：子(0) 丑(1) 寅(2) 卯(3) 辰(4) 巳(5) 午(6) 未(7) 申(8) 酉(9) 戌(10) 亥(11)
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct DiZhi(pub u8);

impl DiZhi {
    pub fn is_valid(&self) -> bool {
        self.0 < 12
    }

    /// 地支本气五行（月令亦以此论季节：寅卯木、巳午火、申酉金、亥子水、四库土）
    pub fn to_wuxing(&self) -> WuXing {
        const ELEMENTS: [WuXing; 12] = [
            WuXing::Shui, WuXing::Tu, WuXing::Mu, WuXing::Mu, WuXing::Tu, WuXing::Huo,
            WuXing::Huo, WuXing::Tu, WuXing::Jin, WuXing::Jin, WuXing::Tu, WuXing::Shui,
        ];
        ELEMENTS[(self.0 % 12) as usize]
    }

    pub fn is_yang(&self) -> bool {
        self.0 % 2 == 0
    }

    pub fn name(&self) -> &'static str {
        const NAMES: [&str; 12] =
            ["子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥"];
        NAMES[(self.0 % 12) as usize]
    }
}

/// 干支组合
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GanZhi {
    pub gan: TianGan,
    pub zhi: DiZhi,
}

impl GanZhi {
    /// 构造干支，阴阳不配（如甲丑）或越界返回 None
    pub fn new(gan: TianGan, zhi: DiZhi) -> Option<Self> {
        if gan.is_valid() && zhi.is_valid() && gan.0 % 2 == zhi.0 % 2 {
            Some(Self { gan, zhi })
        } else {
            None
        }
    }

    /// 从六十甲子序号构造（0 = 甲子）
    pub fn from_index(index: u8) -> Self {
        let index = index % 60;
        Self { gan: TianGan(index % 10), zhi: DiZhi(index % 12) }
    }

    /// 六十甲子序号
    pub fn index(&self) -> u8 {
        // 满足 i ≡ gan (mod 10) 且 i ≡ zhi (mod 12) 的唯一解
        ((6 * self.gan.0 as u16 + 60 * 5 - 5 * self.zhi.0 as u16) % 60) as u8
    }

    pub fn next(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn prev(&self) -> Self {
        Self::from_index(self.index() + 59)
    }

    /// 公历年份对应的流年干支（以立春为界由调用方换算年份，公元 4 年为甲子）
    pub fn from_year(year: u32) -> Self {
        Self::from_index(((year % 60 + 56) % 60) as u8)
    }

    /// 旬空：本旬缺失的两个地支
    pub fn xun_kong(&self) -> (DiZhi, DiZhi) {
        let head = (self.zhi.0 + 12 - self.gan.0 % 12) % 12;
        (DiZhi((head + 10) % 12), DiZhi((head + 11) % 12))
    }
}

// ============================================================================
// 十神
// ============================================================================

/// 十神（相对日主的关系类别）
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ShiShen {
    /// 比肩
    #[default]
    BiJian = 0,
    /// 劫财
    JieCai = 1,
    /// 食神
    ShiShen = 2,
    /// 伤官
    ShangGuan = 3,
    /// 偏财
    PianCai = 4,
    /// 正财
    ZhengCai = 5,
    /// 七杀
    QiSha = 6,
    /// 正官
    ZhengGuan = 7,
    /// 偏印
    PianYin = 8,
    /// 正印
    ZhengYin = 9,
}

impl ShiShen {
    pub const ALL: [ShiShen; 10] = [
        ShiShen::BiJian,
        ShiShen::JieCai,
        ShiShen::ShiShen,
        ShiShen::ShangGuan,
        ShiShen::PianCai,
        ShiShen::ZhengCai,
        ShiShen::QiSha,
        ShiShen::ZhengGuan,
        ShiShen::PianYin,
        ShiShen::ZhengYin,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// 计算某天干相对日主的十神
    ///
    /// 同五行论比劫，我生论食伤，我克论财，克我论官杀，生我论印；
    /// 阴阳相同取偏（比肩/食神/偏财/七杀/偏印），相异取正。
    pub fn from_gan(day_master: TianGan, other: TianGan) -> Self {
        let me = day_master.to_wuxing();
        let it = other.to_wuxing();
        let same_polarity = day_master.is_yang() == other.is_yang();
        let group = if it == me {
            ShiShenGroup::BiJie
        } else if me.generates() == it {
            ShiShenGroup::ShiShang
        } else if me.controls() == it {
            ShiShenGroup::Cai
        } else if it.controls() == me {
            ShiShenGroup::GuanSha
        } else {
            ShiShenGroup::Yin
        };
        let [pian, zheng] = group.members();
        if same_polarity {
            pian
        } else {
            zheng
        }
    }

    /// 所属五类
    pub fn group(&self) -> ShiShenGroup {
        ShiShenGroup::ALL[self.index() / 2]
    }

    /// 该十神对应的五行
    pub fn element(&self, day_master: TianGan) -> WuXing {
        self.group().element(day_master.to_wuxing())
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShiShen::BiJian => "比肩",
            ShiShen::JieCai => "劫财",
            ShiShen::ShiShen => "食神",
            ShiShen::ShangGuan => "伤官",
            ShiShen::PianCai => "偏财",
            ShiShen::ZhengCai => "正财",
            ShiShen::QiSha => "七杀",
            ShiShen::ZhengGuan => "正官",
            ShiShen::PianYin => "偏印",
            ShiShen::ZhengYin => "正印",
        }
    }
}

/// 十神五类（比劫、食伤、财、官杀、印），按相生顺序排列
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ShiShenGroup {
    #[default]
    BiJie = 0,
    ShiShang = 1,
    Cai = 2,
    GuanSha = 3,
    Yin = 4,
}

impl ShiShenGroup {
    pub const ALL: [ShiShenGroup; 5] = [
        ShiShenGroup::BiJie,
        ShiShenGroup::ShiShang,
        ShiShenGroup::Cai,
        ShiShenGroup::GuanSha,
        ShiShenGroup::Yin,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// 类内成员：[偏, 正]
    pub fn members(&self) -> [ShiShen; 2] {
        let base = self.index() * 2;
        [ShiShen::ALL[base], ShiShen::ALL[base + 1]]
    }

    /// 比劫生食伤、食伤生财、财生官、官生印、印生比劫
    pub fn generates(&self) -> Self {
        Self::ALL[(self.index() + 1) % 5]
    }

    /// 比劫克财、食伤克官、财克印、官克比劫、印克食伤
    pub fn controls(&self) -> Self {
        Self::ALL[(self.index() + 2) % 5]
    }

    /// 该类对应的五行（相对日主五行）
    pub fn element(&self, day_master: WuXing) -> WuXing {
        WuXing::from_index(day_master.index() + self.index())
    }

    /// 某五行相对日主五行属于哪一类
    pub fn of_element(day_master: WuXing, element: WuXing) -> Self {
        Self::ALL[(element.index() + 5 - day_master.index()) % 5]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShiShenGroup::BiJie => "比劫",
            ShiShenGroup::ShiShang => "食伤",
            ShiShenGroup::Cai => "财星",
            ShiShenGroup::GuanSha => "官杀",
            ShiShenGroup::Yin => "印星",
        }
    }
}

// ============================================================================
// 十二长生
// ============================================================================

/// 十二长生
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangSheng {
    #[default]
    ChangSheng = 0,
    MuYu = 1,
    GuanDai = 2,
    LinGuan = 3,
    DiWang = 4,
    Shuai = 5,
    Bing = 6,
    Si = 7,
    Mu = 8,
    Jue = 9,
    Tai = 10,
    Yang = 11,
}

impl ChangSheng {
    const ALL: [ChangSheng; 12] = [
        ChangSheng::ChangSheng,
        ChangSheng::MuYu,
        ChangSheng::GuanDai,
        ChangSheng::LinGuan,
        ChangSheng::DiWang,
        ChangSheng::Shuai,
        ChangSheng::Bing,
        ChangSheng::Si,
        ChangSheng::Mu,
        ChangSheng::Jue,
        ChangSheng::Tai,
        ChangSheng::Yang,
    ];

    /// 天干在地支上的长生阶段（阳干顺行、阴干逆行）
    pub fn of(gan: TianGan, zhi: DiZhi) -> Self {
        let start = CHANG_SHENG_START[(gan.0 % 10) as usize];
        let zhi = zhi.0 % 12;
        let step = if gan.is_yang() { (zhi + 12 - start) % 12 } else { (start + 12 - zhi) % 12 };
        Self::ALL[step as usize]
    }

    /// 长生、临官、帝旺视为通根有力之地
    pub fn is_strong_root(&self) -> bool {
        matches!(self, ChangSheng::ChangSheng | ChangSheng::LinGuan | ChangSheng::DiWang)
    }

    /// 日支旺地加成（‰）：临官/帝旺 800，长生/墓库（余气） 400
    pub fn root_bonus(&self) -> u32 {
        match self {
            ChangSheng::LinGuan | ChangSheng::DiWang => 800,
            ChangSheng::ChangSheng | ChangSheng::Mu => 400,
            _ => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChangSheng::ChangSheng => "长生",
            ChangSheng::MuYu => "沐浴",
            ChangSheng::GuanDai => "冠带",
            ChangSheng::LinGuan => "临官",
            ChangSheng::DiWang => "帝旺",
            ChangSheng::Shuai => "衰",
            ChangSheng::Bing => "病",
            ChangSheng::Si => "死",
            ChangSheng::Mu => "墓",
            ChangSheng::Jue => "绝",
            ChangSheng::Tai => "胎",
            ChangSheng::Yang => "养",
        }
    }
}

// ============================================================================
// 神煞
// ============================================================================

/// 常用神煞标记
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum ShenSha {
    /// 天乙贵人
    #[default]
    TianYiGuiRen = 0,
    /// 文昌
    WenChang = 1,
    /// 禄神
    LuShen = 2,
    /// 阳刃
    YangRen = 3,
    /// 桃花
    TaoHua = 4,
    /// 驿马
    YiMa = 5,
    /// 华盖
    HuaGai = 6,
}

// ============================================================================
// 柱位 / 藏干
// ============================================================================

/// 四柱位置
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PillarPosition {
    #[default]
    Year = 0,
    Month = 1,
    Day = 2,
    Hour = 3,
}

impl PillarPosition {
    pub const ALL: [PillarPosition; 4] =
        [PillarPosition::Year, PillarPosition::Month, PillarPosition::Day, PillarPosition::Hour];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// 格局取用的位置加权（‰）：月令 1.30、日支 1.15、其余 1.00
    pub fn place_weight(&self) -> u32 {
        match self {
            PillarPosition::Month => 1300,
            PillarPosition::Day => 1150,
            _ => PERMILLE,
        }
    }

    /// 与日柱的距离（年 2、月 1、日 0、时 1）
    pub fn distance_to_day(&self) -> u8 {
        match self {
            PillarPosition::Year => 2,
            PillarPosition::Month | PillarPosition::Hour => 1,
            PillarPosition::Day => 0,
        }
    }
}

/// 藏干（天干 + 权重‰）
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
pub struct CangGan {
    pub gan: TianGan,
    pub weight: u16,
}

/// 命主性别（用于排大运顺逆）
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Gender {
    #[default]
    Male = 0,
    Female = 1,
}

/// 学派（影响日主强弱系数）
#[derive(
    Clone, Copy, Encode, Decode, DecodeWithMemTracking, TypeInfo, MaxEncodedLen, PartialEq, Eq, Debug, Default,
)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum School {
    /// 子平
    #[default]
    ZiPing = 0,
    /// 盲派
    MangPai = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    // TianGan: 甲(0) 乙(1) 丙(2) 丁(3) 戊(4) 己(5) 庚(6) 辛(7) 壬(8) 癸(9)
    const JIA: TianGan = TianGan(0);
    const YI: TianGan = TianGan(1);
    const BING: TianGan = TianGan(2);
    const WU: TianGan = TianGan(4);
    const GENG: TianGan = TianGan(6);
    const XIN: TianGan = TianGan(7);
    const REN: TianGan = TianGan(8);
    const GUI: TianGan = TianGan(9);

    #[test]
    fn test_wuxing_cycle() {
        assert!(is_wuxing_sheng(WuXing::Mu, WuXing::Huo));
        assert!(is_wuxing_sheng(WuXing::Shui, WuXing::Mu));
        assert!(is_wuxing_ke(WuXing::Mu, WuXing::Tu));
        assert!(is_wuxing_ke(WuXing::Jin, WuXing::Mu));
        assert_eq!(WuXing::Mu.generated_by(), WuXing::Shui);
        assert_eq!(WuXing::Mu.controlled_by(), WuXing::Jin);
    }

    #[test]
    fn test_shishen_from_gan() {
        assert_eq!(ShiShen::from_gan(JIA, JIA), ShiShen::BiJian);
        assert_eq!(ShiShen::from_gan(JIA, YI), ShiShen::JieCai);
        assert_eq!(ShiShen::from_gan(JIA, BING), ShiShen::ShiShen);
        assert_eq!(ShiShen::from_gan(JIA, WU), ShiShen::PianCai);
        assert_eq!(ShiShen::from_gan(JIA, GENG), ShiShen::QiSha);
        assert_eq!(ShiShen::from_gan(JIA, XIN), ShiShen::ZhengGuan);
        assert_eq!(ShiShen::from_gan(JIA, REN), ShiShen::PianYin);
        assert_eq!(ShiShen::from_gan(JIA, GUI), ShiShen::ZhengYin);
        assert_eq!(ShiShen::from_gan(YI, BING), ShiShen::ShangGuan);
    }

    #[test]
    fn test_shishen_group_relations() {
        assert_eq!(ShiShen::QiSha.group(), ShiShenGroup::GuanSha);
        assert_eq!(ShiShenGroup::BiJie.controls(), ShiShenGroup::Cai);
        assert_eq!(ShiShenGroup::GuanSha.generates(), ShiShenGroup::Yin);
        assert_eq!(ShiShenGroup::Cai.element(WuXing::Mu), WuXing::Tu);
        assert_eq!(ShiShenGroup::of_element(WuXing::Mu, WuXing::Jin), ShiShenGroup::GuanSha);
        assert_eq!(ShiShen::ZhengYin.element(JIA), WuXing::Shui);
    }

    #[test]
    fn test_ganzhi_index_round_trip() {
        for i in 0..60u8 {
            assert_eq!(GanZhi::from_index(i).index(), i);
        }
        assert!(GanZhi::new(JIA, DiZhi(1)).is_none());
        assert_eq!(GanZhi::from_index(59).next(), GanZhi::from_index(0));
        assert_eq!(GanZhi::from_index(0).prev(), GanZhi::from_index(59));
    }

    #[test]
    fn test_ganzhi_from_year() {
        // 1984 甲子、2024 甲辰、2026 丙午
        assert_eq!(GanZhi::from_year(1984), GanZhi { gan: JIA, zhi: DiZhi(0) });
        assert_eq!(GanZhi::from_year(2024), GanZhi { gan: JIA, zhi: DiZhi(4) });
        assert_eq!(GanZhi::from_year(2026), GanZhi { gan: BING, zhi: DiZhi(6) });
    }

    #[test]
    fn test_xun_kong() {
        // 甲子旬空戌亥，甲戌旬空申酉
        assert_eq!(GanZhi::from_index(0).xun_kong(), (DiZhi(10), DiZhi(11)));
        assert_eq!(GanZhi::from_index(10).xun_kong(), (DiZhi(8), DiZhi(9)));
        // 癸亥属甲寅旬，空子丑
        assert_eq!(GanZhi::from_index(59).xun_kong(), (DiZhi(0), DiZhi(1)));
    }

    #[test]
    fn test_chang_sheng() {
        assert_eq!(ChangSheng::of(JIA, DiZhi(11)), ChangSheng::ChangSheng);
        assert_eq!(ChangSheng::of(JIA, DiZhi(2)), ChangSheng::LinGuan);
        assert_eq!(ChangSheng::of(JIA, DiZhi(3)), ChangSheng::DiWang);
        assert_eq!(ChangSheng::of(YI, DiZhi(3)), ChangSheng::LinGuan);
        assert_eq!(ChangSheng::of(YI, DiZhi(6)), ChangSheng::ChangSheng);
        assert_eq!(ChangSheng::of(GENG, DiZhi(9)), ChangSheng::DiWang);
    }
}
