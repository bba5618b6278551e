//! 可视化体积导出.
//!
//! 将已经算好的逐脑区或逐切片统计量回填到与原标注体积同形状的 `f32` 体积中,
//! 便于在常见的医学影像查看器里叠加显示. 这里只做查表, 不做任何统计.

use crate::aggregate::SliceStats;
use crate::data::VolumeFormat;
use crate::error::{JaggyError, JaggyResult};
use crate::metric::{RegionStats, Summary};
use crate::{Label, LabeledVolume, RegionId, SweepAxis};
use ndarray::{Array3, Zip};
use nifti::writer::WriterOptions;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

/// 要导出的统计量.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    /// 均值.
    #[default]
    Mean,

    /// 中位数.
    Median,

    /// 总体标准差.
    Std,

    /// 最小值. 仅逐切片统计可用.
    Min,

    /// 最大值. 仅逐切片统计可用.
    Max,
}

impl Metric {
    /// 统计量名称, 与报告中的字段名一致.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Std => "std",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    /// 从 [`Summary`] 中取出该统计量.
    #[inline]
    pub fn of_summary(self, s: &Summary) -> f64 {
        match self {
            Self::Mean => s.mean,
            Self::Median => s.median,
            Self::Std => s.std,
            Self::Min => s.min,
            Self::Max => s.max,
        }
    }

    /// 从 [`RegionStats`] 中取出该统计量.
    ///
    /// 逐脑区统计没有 `min`/`max`, 此时返回 `Err(JaggyError::UnsupportedMetric)`.
    pub fn of_region(self, s: &RegionStats) -> JaggyResult<Option<f64>> {
        self.check_region_level()?;
        Ok(match self {
            Self::Mean => s.mean,
            Self::Median => s.median,
            _ => s.std,
        })
    }

    /// 检查该统计量能否用于逐脑区回填. `min`/`max` 返回 `Err(JaggyError::UnsupportedMetric)`.
    pub fn check_region_level(self) -> JaggyResult<()> {
        match self {
            Self::Min | Self::Max => Err(JaggyError::UnsupportedMetric {
                metric: self.name(),
                level: "per-region",
            }),
            _ => Ok(()),
        }
    }
}

impl FromStr for Metric {
    type Err = JaggyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "std" => Ok(Self::Std),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            _ => Err(JaggyError::UnknownMetric(s.to_string())),
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 按脑区回填: 属于脑区 `R` 的体素取 `R` 的 `metric` 统计量,
/// 其余体素 (包括 "无数据" 体素、不在 `per_region` 中的脑区) 为 0.
/// 统计量为 `None` 的脑区同样回填 0.
pub fn paint_regions(
    volume: &LabeledVolume,
    per_region: &BTreeMap<RegionId, RegionStats>,
    metric: Metric,
) -> JaggyResult<Array3<f32>> {
    metric.check_region_level()?;
    let lookup = per_region
        .iter()
        .map(|(id, s)| Ok((*id, metric.of_region(s)?.unwrap_or(0.0) as f32)))
        .collect::<JaggyResult<HashMap<_, _>>>()?;

    Ok(volume.data().mapv(|raw| {
        Label::from(raw)
            .region()
            .and_then(|id| lookup.get(&id).copied())
            .unwrap_or(0.0)
    }))
}

/// 按切片回填: 沿 `axis` 的第 `i` 层中, 非 "无数据" 体素取第 `i` 层的 `metric` 统计量,
/// 其余体素为 0. 统计量为 `None` 的切片同样回填 0.
///
/// `per_slice` 的长度必须等于体积沿 `axis` 的切片数,
/// 否则返回 `Err(JaggyError::SliceCountMismatch)`.
pub fn paint_slices(
    volume: &LabeledVolume,
    per_slice: &SliceStats,
    axis: SweepAxis,
    metric: Metric,
) -> JaggyResult<Array3<f32>> {
    let expected = volume.len_along(axis);
    if per_slice.len() != expected {
        return Err(JaggyError::SliceCountMismatch {
            expected,
            found: per_slice.len(),
        });
    }

    let mut out = Array3::<f32>::zeros(volume.data().raw_dim());
    for (i, (mut dst, src)) in out
        .axis_iter_mut(axis.axis())
        .zip(volume.slice_iter(axis))
        .enumerate()
    {
        let value = per_slice.get(i).map_or(0.0, |s| metric.of_summary(s)) as f32;
        Zip::from(&mut dst).and(&src).for_each(|d, &raw| {
            if !Label::from(raw).is_no_data() {
                *d = value;
            }
        });
    }
    Ok(out)
}

/// 保存导出的体积. 格式由 `path` 的扩展名决定:
///
/// - NIfTI: 以 `reference` 的空间元信息为模板 (数据类型和维度会被替换), 保持空间一致性;
/// - npy: 只保存数组本身.
pub fn save_volume<P: AsRef<Path>>(
    path: P,
    data: &Array3<f32>,
    reference: &LabeledVolume,
) -> JaggyResult<()> {
    let path = path.as_ref();
    match VolumeFormat::from_path(path)? {
        VolumeFormat::Nifti => WriterOptions::new(path)
            .reference_header(reference.header())
            .write_nifti(data)?,
        VolumeFormat::Npy => ndarray_npy::write_npy(path, data)?,
    }
    log::info!("saved volume to {}", path.display());
    Ok(())
}
