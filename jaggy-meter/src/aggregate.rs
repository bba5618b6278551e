//! 逐切片统计与全局统计.
//!
//! 所有已处理脑区的差异比序列按列拼接成 [`RatioMatrix`]
//! (行 = 扫掠轴切片, 列 = 脑区). 统计时只考虑非零差异比.

use crate::error::{JaggyError, JaggyResult};
use crate::metric::{SliceRatios, Summary};
use crate::RegionId;
use ndarray::{Array2, ArrayView1, Axis};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// 差异比矩阵. 行数等于扫掠轴长度, 列数等于成功处理的脑区数.
///
/// 每一列对应的脑区被显式记录, 不依赖列的位置推断.
#[derive(Clone, Debug)]
pub struct RatioMatrix {
    data: Array2<f64>,
    regions: Vec<RegionId>,
}

impl RatioMatrix {
    /// 创建 `rows` 行、0 列的空矩阵.
    #[inline]
    pub fn with_rows(rows: usize) -> Self {
        Self {
            data: Array2::zeros((rows, 0)),
            regions: vec![],
        }
    }

    /// 追加脑区 `id` 的差异比序列作为新的一列.
    ///
    /// 序列长度与行数不一致时返回 `Err(JaggyError::ShapeMismatch)`, 矩阵保持不变.
    pub fn push_column(&mut self, id: RegionId, ratios: &SliceRatios) -> JaggyResult<()> {
        let mismatch = JaggyError::ShapeMismatch {
            id,
            expected: self.rows(),
            found: ratios.len(),
        };
        if ratios.len() != self.rows() {
            return Err(mismatch);
        }
        self.data
            .push_column(ArrayView1::from(ratios.as_slice()))
            .map_err(|_| mismatch)?;
        self.regions.push(id);
        Ok(())
    }

    /// 行数 (扫掠轴长度).
    #[inline]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// 列数 (脑区数).
    #[inline]
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// 第 `col` 列对应的脑区. 越界时返回 `None`.
    #[inline]
    pub fn region_at(&self, col: usize) -> Option<RegionId> {
        self.regions.get(col).copied()
    }

    /// 脑区 `id` 所在的列. 不存在时返回 `None`.
    #[inline]
    pub fn column_of(&self, id: RegionId) -> Option<usize> {
        self.regions.iter().position(|r| *r == id)
    }

    /// 获取 (切片, 列) 处的差异比. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, slice: usize, col: usize) -> Option<f64> {
        self.data.get((slice, col)).copied()
    }

    /// 逐切片统计: 对每一行的非零差异比求统计量, 没有非零值的行为 `None`.
    pub fn per_slice(&self) -> SliceStats {
        SliceStats(
            self.data
                .axis_iter(Axis(0))
                .map(|row| Summary::of_nonzero(row.iter().copied()))
                .collect(),
        )
    }

    /// 全局统计: 对整个矩阵的非零差异比求统计量. 没有非零值时为 `None`.
    #[inline]
    pub fn global(&self) -> GlobalStats {
        GlobalStats(Summary::of_nonzero(self.data.iter().copied()))
    }
}

/// 逐切片统计结果, 长度等于扫掠轴长度.
///
/// 序列化为五个平行序列: `{"mean": [..], "median": [..], "std": [..], "min": [..], "max": [..]}`.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceStats(pub Vec<Option<Summary>>);

impl SliceStats {
    /// 切片个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 第 `index` 层切片的统计量. 越界或该层没有非零样本时返回 `None`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Summary> {
        self.0.get(index).and_then(Option::as_ref)
    }

    /// 按 `pick` 取出每一层切片的某个统计量.
    pub fn column<F: Fn(&Summary) -> f64>(&self, pick: F) -> Vec<Option<f64>> {
        self.0.iter().map(|s| s.as_ref().map(&pick)).collect()
    }
}

impl Serialize for SliceStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("SliceStats", 5)?;
        st.serialize_field("mean", &self.column(|s| s.mean))?;
        st.serialize_field("median", &self.column(|s| s.median))?;
        st.serialize_field("std", &self.column(|s| s.std))?;
        st.serialize_field("min", &self.column(|s| s.min))?;
        st.serialize_field("max", &self.column(|s| s.max))?;
        st.end()
    }
}

/// 全局统计结果.
///
/// 序列化为 `{"mean", "median", "std", "min", "max"}`, 没有样本时各项均为 `null`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GlobalStats(pub Option<Summary>);

impl Serialize for GlobalStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = self.0.as_ref();
        let mut st = serializer.serialize_struct("GlobalStats", 5)?;
        st.serialize_field("mean", &s.map(|s| s.mean))?;
        st.serialize_field("median", &s.map(|s| s.median))?;
        st.serialize_field("std", &s.map(|s| s.std))?;
        st.serialize_field("min", &s.map(|s| s.min))?;
        st.serialize_field("max", &s.map(|s| s.max))?;
        st.end()
    }
}
