//! 运行时错误.

use crate::RegionId;
use std::path::PathBuf;
use thiserror::Error;

/// 锯齿度计算及其周边 I/O 的运行时错误.
///
/// 注意 "退化脑区" (没有任何非零差异比样本) 不属于错误,
/// 它只会在报告中表现为 `null` 统计量.
#[derive(Debug, Error)]
pub enum JaggyError {
    /// 筛选后没有任何可处理的脑区. 不会产生任何报告.
    #[error("none of the requested regions are present in the volume")]
    EmptySelection,

    /// 扫掠轴不是体积的合法轴索引.
    #[error("invalid sweep axis {0}, expected 0, 1 or 2")]
    InvalidAxis(usize),

    /// 某个脑区的计算发生意外故障 (失败即中止策略下).
    ///
    /// `id` 是按任务顺序第一个失败的脑区, `failed` 是失败的脑区总数.
    #[error("worker failed on region {id} ({failed} failure(s) in total): {reason}")]
    WorkerFailure {
        /// 第一个失败的脑区.
        id: RegionId,
        /// 失败总数.
        failed: usize,
        /// 失败原因.
        reason: String,
    },

    /// 差异比序列长度与扫掠轴长度不一致.
    #[error("ratio vector of region {id} has {found} entries, expected {expected}")]
    ShapeMismatch {
        /// 出错的脑区.
        id: RegionId,
        /// 扫掠轴长度.
        expected: usize,
        /// 实际长度.
        found: usize,
    },

    /// 逐切片统计的长度与体积沿扫掠轴的切片数不一致.
    #[error("per-slice statistics cover {found} slices, the volume has {expected}")]
    SliceCountMismatch {
        /// 体积沿扫掠轴的切片数.
        expected: usize,
        /// 逐切片统计的长度.
        found: usize,
    },

    /// 标注值无法表示为 `u32` (负数或过大).
    #[error("label value {0} does not fit in u32")]
    LabelOutOfRange(i128),

    /// 体积文件不是三维数据.
    #[error("expected a 3D volume, found shape {0:?}")]
    NotVolume3d(Vec<usize>),

    /// 无法根据扩展名判断体积文件格式.
    #[error("unsupported volume format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// 该统计量在此层级上不存在 (例如逐脑区统计没有 `min`/`max`).
    #[error("metric `{metric}` is not available for {level} statistics")]
    UnsupportedMetric {
        /// 统计量名称.
        metric: &'static str,
        /// 统计层级.
        level: &'static str,
    },

    /// 无法解析的脑区筛选表达式.
    #[error("invalid region selection `{0}`")]
    InvalidSelection(String),

    /// 无法解析的工作线程数.
    #[error("invalid worker count `{0}`, expected AUTO or an integer >= 1")]
    InvalidWorkers(String),

    /// 未知统计量名称.
    #[error("unknown metric `{0}`, expected mean, median, std, min or max")]
    UnknownMetric(String),

    /// 读写 NIfTI 文件错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// 读取 npy 文件错误.
    #[error(transparent)]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    /// 写入 npy 文件错误.
    #[error(transparent)]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    /// 报告序列化错误.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// 其他底层 I/O 错误.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 锯齿度计算运行时结果.
pub type JaggyResult<T> = Result<T, JaggyError>;
