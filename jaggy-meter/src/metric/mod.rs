//! 单脑区锯齿度 (差异比) 计算.
//!
//! 对脑区 `id`, 第 `i` 层的差异比定义为
//!
//! ```text
//! ratio[i] = diff[i] / (count[i] + count[i + 1])
//! ```
//!
//! 其中 `diff[i]` 为第 `i` 层与第 `i + 1` 层掩码取值不同的体素个数,
//! `count[i]` 为第 `i` 层掩码中属于该脑区的体素个数. 分母为 0 时差异比为 0.
//!
//! 以下情况强制置 0, 不计入锯齿度:
//!
//! 1. `ratio[i] == 1`: 脑区在一侧完全存在、另一侧完全不存在, 即脑区的出现或消失;
//! 2. 第一层和最后一层: 最后一层的 "下一层" 由循环平移回绕到第 0 层, 没有物理意义.

mod stats;

pub use stats::Summary;

use crate::{LabeledVolume, RegionId, RegionMask, SweepAxis};
use serde::{Deserialize, Serialize};

/// 单个脑区沿扫掠轴的逐层差异比序列. 长度等于扫掠轴长度, 取值在 `[0, 1)` 中.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceRatios(Vec<f64>);

impl SliceRatios {
    /// 由逐层计数求差异比.
    ///
    /// `diff`, `here`, `next` 分别为逐层差异体素数、本层体素数和下一层 (循环) 体素数,
    /// 三者长度必须一致, 否则程序 panic.
    pub fn from_counts(diff: &[u64], here: &[u64], next: &[u64]) -> Self {
        assert_eq!(diff.len(), here.len(), "逐层计数长度不一致");
        assert_eq!(diff.len(), next.len(), "逐层计数长度不一致");

        let mut ratios: Vec<f64> = diff
            .iter()
            .zip(here.iter().zip(next.iter()))
            .map(|(&d, (&a, &b))| match a + b {
                0 => 0.0,
                denom => d as f64 / denom as f64,
            })
            .map(|r| if r == 1.0 { 0.0 } else { r })
            .collect();

        if let Some(first) = ratios.first_mut() {
            *first = 0.0;
        }
        if let Some(last) = ratios.last_mut() {
            *last = 0.0;
        }
        Self(ratios)
    }

    /// 序列长度, 即扫掠轴长度.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 序列是否为空 (扫掠轴长度为 0).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 获取底层数据.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// 迭代非零差异比.
    #[inline]
    pub fn nonzero(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied().filter(|r| *r > 0.0)
    }
}

/// 计算脑区 `id` 沿 `axis` 的逐层差异比.
///
/// 脑区为空或退化时不会出错, 只会得到全 0 序列.
pub fn slice_ratios(volume: &LabeledVolume, axis: SweepAxis, id: RegionId) -> SliceRatios {
    let mask = RegionMask::build(volume, id);
    let rolled = mask.rolled(axis);
    let diff = mask.diff_counts(&rolled, axis);
    let here = mask.per_slice_counts(axis);
    let next = rolled.per_slice_counts(axis);
    SliceRatios::from_counts(&diff, &here, &next)
}

/// 单个脑区的统计量. 若该脑区不存在任何非零差异比, 则所有统计量为 `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStats {
    /// 非零差异比的均值.
    pub mean: Option<f64>,

    /// 非零差异比的总体标准差.
    pub std: Option<f64>,

    /// 非零差异比的中位数.
    pub median: Option<f64>,

    /// 完整的逐层差异比序列. 仅在要求长报告时保留.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_ratios: Option<Vec<f64>>,
}

impl RegionStats {
    /// 由差异比序列求统计量. `keep_ratios` 为 `true` 时同时保留完整序列.
    pub fn from_ratios(ratios: &SliceRatios, keep_ratios: bool) -> Self {
        let summary = Summary::of_nonzero(ratios.nonzero());
        Self {
            mean: summary.map(|s| s.mean),
            std: summary.map(|s| s.std),
            median: summary.map(|s| s.median),
            diff_ratios: keep_ratios.then(|| ratios.as_slice().to_vec()),
        }
    }

    /// 是否为退化脑区 (没有任何非零差异比样本).
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.mean.is_none()
    }
}

/// 单个脑区的计算结果.
#[derive(Clone, Debug)]
pub struct RegionMetric {
    /// 脑区编号.
    pub id: RegionId,

    /// 逐层差异比.
    pub ratios: SliceRatios,

    /// 统计量.
    pub stats: RegionStats,
}

/// 计算脑区 `id` 的逐层差异比及其统计量. 该函数是纯函数, 不修改任何共享状态.
pub fn measure_region(
    volume: &LabeledVolume,
    axis: SweepAxis,
    id: RegionId,
    keep_ratios: bool,
) -> RegionMetric {
    let ratios = slice_ratios(volume, axis, id);
    let stats = RegionStats::from_ratios(&ratios, keep_ratios);
    if stats.is_degenerate() {
        log::debug!("region {id}: no jagged transition");
    } else {
        log::debug!(
            "region {id}: {} jagged transition(s), mean ratio {:.4}",
            ratios.nonzero().count(),
            stats.mean.unwrap_or_default()
        );
    }
    RegionMetric { id, ratios, stats }
}

#[cfg(test)]
mod tests {
    use super::{measure_region, slice_ratios, RegionStats, SliceRatios};
    use crate::{LabeledVolume, RegionId, SweepAxis};
    use ndarray::{s, Array3};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    fn id(raw: u32) -> RegionId {
        RegionId::new(raw).unwrap()
    }

    #[test]
    fn test_from_counts_rules() {
        // 第 1 层: 普通差异; 第 2 层: 完全消失 (1.0 -> 0); 第 3 层: 分母为 0.
        let r = SliceRatios::from_counts(&[3, 1, 4, 0, 2], &[0, 3, 4, 0, 1], &[3, 2, 0, 0, 3]);
        assert_eq!(r.len(), 5);
        assert_eq!(r.as_slice()[0], 0.0);
        assert!(f64_eq(r.as_slice()[1], 0.2));
        assert_eq!(r.as_slice()[2], 0.0);
        assert_eq!(r.as_slice()[3], 0.0);
        assert_eq!(r.as_slice()[4], 0.0);
        assert_eq!(r.nonzero().count(), 1);
    }

    #[test]
    fn test_from_counts_empty() {
        let r = SliceRatios::from_counts(&[], &[], &[]);
        assert!(r.is_empty());
        let s = RegionStats::from_ratios(&r, false);
        assert!(s.is_degenerate());
    }

    /// 第 1 层 2 个体素, 第 2 层 3 个体素, 多出的 1 个造成 1 / 5 的差异.
    #[test]
    fn test_small_jagged_region() {
        let mut data = Array3::<u32>::zeros((4, 3, 3));
        data[(1, 0, 0)] = 2;
        data[(1, 0, 1)] = 2;
        data[(2, 0, 0)] = 2;
        data[(2, 0, 1)] = 2;
        data[(2, 0, 2)] = 2;
        let v = LabeledVolume::from_array(data);

        let r = slice_ratios(&v, SweepAxis::default(), id(2));
        assert_eq!(r.len(), 4);
        assert!(f64_eq(r.as_slice()[1], 0.2));
        assert_eq!(r.nonzero().count(), 1);

        let m = measure_region(&v, SweepAxis::default(), id(2), true);
        assert_eq!(m.id, id(2));
        assert!(f64_eq(m.stats.mean.unwrap(), 0.2));
        assert!(f64_eq(m.stats.median.unwrap(), 0.2));
        assert_eq!(m.stats.std, Some(0.0));
        assert_eq!(m.stats.diff_ratios.as_deref(), Some(m.ratios.as_slice()));
    }

    /// 形状稳定地占据第 5..=10 层的脑区: 内部无变化, 边界被 `ratio == 1` 规则清零.
    #[test]
    fn test_stable_run_is_not_jagged() {
        let mut data = Array3::<u32>::zeros((16, 4, 4));
        data.slice_mut(s![5..=10, 1..3, 0..3]).fill(7);
        data.slice_mut(s![.., 3, ..]).fill(8);
        let v = LabeledVolume::from_array(data);

        let m = measure_region(&v, SweepAxis::default(), id(7), false);
        assert!(m.ratios.as_slice().iter().all(|r| *r == 0.0));
        assert!(m.stats.is_degenerate());
        assert_eq!(m.stats.std, None);
        assert_eq!(m.stats.median, None);
        assert_eq!(m.stats.diff_ratios, None);
    }

    #[test]
    fn test_single_slice_volume() {
        let mut data = Array3::<u32>::zeros((1, 4, 4));
        data.slice_mut(s![0, 0..2, 0..2]).fill(3);
        let v = LabeledVolume::from_array(data);

        let r = slice_ratios(&v, SweepAxis::default(), id(3));
        assert_eq!(r.as_slice(), &[0.0]);
        assert!(RegionStats::from_ratios(&r, false).is_degenerate());
    }

    #[test]
    fn test_other_axis() {
        // 沿第 2 轴: 第 1 层 1 个体素, 第 2 层 3 个体素, 第 3 层 3 个体素 (位置有变).
        let mut data = Array3::<u32>::zeros((3, 3, 5));
        data[(0, 0, 1)] = 4;
        data[(0, 0, 2)] = 4;
        data[(1, 0, 2)] = 4;
        data[(2, 0, 2)] = 4;
        data[(0, 0, 3)] = 4;
        data[(1, 0, 3)] = 4;
        data[(1, 1, 3)] = 4;
        let v = LabeledVolume::from_array(data);
        let axis = SweepAxis::new(2).unwrap();

        let r = slice_ratios(&v, axis, id(4));
        assert_eq!(r.len(), 5);
        // 第 1 层 {(0,0)} vs 第 2 层 {(0,0),(1,0),(2,0)}: 2 / 4
        assert!(f64_eq(r.as_slice()[1], 0.5));
        // 第 2 层 vs 第 3 层 {(0,0),(1,0),(1,1)}: 2 / 6
        assert!(f64_eq(r.as_slice()[2], 1.0 / 3.0));
        // 第 3 层 vs 第 4 层 (空): 1.0 -> 0
        assert_eq!(r.as_slice()[3], 0.0);
    }
}
