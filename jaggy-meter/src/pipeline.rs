//! 端到端计算流程: 枚举 -> 调度 -> 统计 -> 组装.

use crate::aggregate::RatioMatrix;
use crate::error::JaggyResult;
use crate::metric::measure_region;
use crate::report::Report;
use crate::schedule::{FailurePolicy, RegionFailure, WorkScheduler, Workers};
use crate::select::{self, Selection, VoxelCountTable};
use crate::{LabeledVolume, SweepAxis};
use std::collections::BTreeMap;

/// 计算参数.
#[derive(Clone, Debug, Default)]
pub struct ComputeOptions {
    /// 扫掠轴.
    pub axis: SweepAxis,

    /// 脑区筛选方式.
    pub selection: Selection,

    /// 工作线程数.
    pub workers: Workers,

    /// 单脑区失败时的处理策略.
    pub failure_policy: FailurePolicy,

    /// 是否在逐脑区统计中保留完整的差异比序列 (长报告).
    pub keep_ratios: bool,
}

/// 计算结果. 除报告外, 还携带非致命的附加信息.
#[derive(Clone, Debug)]
pub struct Outcome {
    /// 锯齿度报告.
    pub report: Report,

    /// 显式请求了但不存在于体积中的原始标注值.
    pub dropped: Vec<u32>,

    /// 被跳过的脑区 (仅 [`FailurePolicy::SkipAndRecord`] 下可能非空).
    pub failures: Vec<RegionFailure>,
}

/// 计算 `volume` 的锯齿度报告.
///
/// 该函数会先扫描整个体积统计各脑区体素数. 若同一体积需要计算多次,
/// 请使用 [`compute_with_table`] 复用统计结果.
///
/// # 返回值
///
/// - 筛选结果为空时, 在任何计算开始前返回 `Err(JaggyError::EmptySelection)`;
/// - 失败即中止策略下, 任一脑区失败都会返回 `Err(JaggyError::WorkerFailure)`.
///
/// [`JaggyError::EmptySelection`]: crate::JaggyError::EmptySelection
/// [`JaggyError::WorkerFailure`]: crate::JaggyError::WorkerFailure
pub fn compute(volume: &LabeledVolume, options: &ComputeOptions) -> JaggyResult<Outcome> {
    #[cfg(feature = "rayon")]
    let table = volume.par_voxel_counts();
    #[cfg(not(feature = "rayon"))]
    let table = volume.voxel_counts();

    compute_with_table(volume, &table, options)
}

/// 与 [`compute`] 相同, 但使用预先统计好的脑区体素数表 `table`.
///
/// `table` 必须来自同一个 `volume`, 否则结果无意义.
pub fn compute_with_table(
    volume: &LabeledVolume,
    table: &VoxelCountTable,
    options: &ComputeOptions,
) -> JaggyResult<Outcome> {
    let axis = options.axis;
    let set = select::enumerate(table, &options.selection)?;
    log::info!(
        "computing jaggedness of {} region(s) along axis {}",
        set.ids.len(),
        axis.index()
    );

    let scheduler = WorkScheduler::new(options.workers, options.failure_policy);
    let scheduled = scheduler.run(&set.ids, |id| {
        Ok(measure_region(volume, axis, id, options.keep_ratios))
    })?;

    let mut matrix = RatioMatrix::with_rows(volume.len_along(axis));
    let mut per_region = BTreeMap::new();
    for (id, metric) in scheduled.done {
        matrix.push_column(id, &metric.ratios)?;
        per_region.insert(id, metric.stats);
    }
    debug_assert_eq!(matrix.cols(), per_region.len());

    let report = Report::assemble(per_region, matrix.per_slice(), matrix.global());
    log::info!(
        "done: {} region(s) in report, {} skipped",
        report.per_region.len(),
        scheduled.failures.len()
    );
    Ok(Outcome {
        report,
        dropped: set.dropped,
        failures: scheduled.failures,
    })
}
