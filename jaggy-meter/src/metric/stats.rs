//! 描述性统计.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// 一组非零样本的描述性统计量.
///
/// 标准差为总体标准差 (除以 `n`, 而非 `n - 1`).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// 均值.
    pub mean: f64,

    /// 中位数. 样本数为偶数时取中间两个值的平均.
    pub median: f64,

    /// 总体标准差.
    pub std: f64,

    /// 最小值.
    pub min: f64,

    /// 最大值.
    pub max: f64,
}

impl Summary {
    /// 仅对 `it` 中大于 0 的样本求统计量. 若不存在这样的样本, 返回 `None`.
    ///
    /// 样本会先排序再累加, 因此结果与输入顺序无关 (逐位一致).
    pub fn of_nonzero<I: IntoIterator<Item = f64>>(it: I) -> Option<Self> {
        let mut v: Vec<OrderedFloat<f64>> = it
            .into_iter()
            .filter(|x| *x > 0.0)
            .map(OrderedFloat)
            .collect();
        if v.is_empty() {
            return None;
        }
        v.sort_unstable();

        let n = v.len() as f64;
        let mean = v.iter().map(|x| x.0).sum::<f64>() / n;
        let var = v.iter().map(|x| (x.0 - mean).powi(2)).sum::<f64>() / n;
        let mid = v.len() / 2;
        let median = if v.len() % 2 == 1 {
            v[mid].0
        } else {
            (v[mid - 1].0 + v[mid].0) / 2.0
        };

        Some(Self {
            mean,
            median,
            std: var.sqrt(),
            min: v[0].0,
            max: v[v.len() - 1].0,
        })
    }
}
