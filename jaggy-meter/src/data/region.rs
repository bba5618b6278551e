use crate::consts::NO_DATA;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::num::NonZeroU32;

/// 脑区编号.
///
/// 编号必然非零: "无数据" 哨兵值 [`NO_DATA`] 无法被构造为 `RegionId`,
/// 因此它永远不会进入筛选、调度与统计流程.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(NonZeroU32);

impl RegionId {
    /// 从原始标注值创建. 若 `raw` 为 [`NO_DATA`], 返回 `None`.
    #[inline]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// 原始标注值.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl Display for RegionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RegionId> for u32 {
    #[inline]
    fn from(id: RegionId) -> Self {
        id.get()
    }
}

/// 单个体素的标注类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Label {
    /// "无数据" 体素, 原始值为 [`NO_DATA`].
    NoData,

    /// 属于某个脑区的体素.
    Region(RegionId),
}

impl Label {
    /// 是否为 "无数据" 体素.
    #[inline]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// 获取体素所属脑区. "无数据" 体素返回 `None`.
    #[inline]
    pub const fn region(self) -> Option<RegionId> {
        match self {
            Self::NoData => None,
            Self::Region(id) => Some(id),
        }
    }
}

impl From<u32> for Label {
    #[inline]
    fn from(raw: u32) -> Self {
        match RegionId::new(raw) {
            Some(id) => Self::Region(id),
            None => Self::NoData,
        }
    }
}

impl From<Label> for u32 {
    #[inline]
    fn from(label: Label) -> Self {
        match label {
            Label::NoData => NO_DATA,
            Label::Region(id) => id.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Label, RegionId};
    use crate::consts::NO_DATA;

    #[test]
    fn test_no_data_is_not_a_region() {
        assert!(RegionId::new(NO_DATA).is_none());
        assert!(Label::from(NO_DATA).is_no_data());
        assert_eq!(Label::from(NO_DATA).region(), None);
        assert_eq!(u32::from(Label::NoData), NO_DATA);
    }

    #[test]
    fn test_region_label() {
        let id = RegionId::new(614454277).unwrap();
        assert_eq!(id.get(), 614454277);
        assert_eq!(Label::from(614454277), Label::Region(id));
        assert_eq!(id.to_string(), "614454277");
        assert!(RegionId::new(3) < RegionId::new(20));
    }
}
