//! 脑区枚举与筛选.
//!
//! 从体积中发现候选脑区, 再按显式列表或体素数排名 ("最大 N 个" / "最小 N 个") 筛选.

use crate::error::{JaggyError, JaggyResult};
use crate::RegionId;
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::str::FromStr;

/// 脑区编号 -> 体素个数 对照表, 按编号升序存储.
///
/// 构建该表需要扫描整个体积. 对同一体积多次计算时, 可以复用同一张表
/// (参见 [`crate::compute_with_table`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoxelCountTable {
    counts: BTreeMap<RegionId, u64>,
}

impl VoxelCountTable {
    /// 从 (原始标注值, 体素个数) 对构建. "无数据" 值会被忽略,
    /// 重复出现的标注值累加计数.
    pub fn from_pairs<I: IntoIterator<Item = (u32, u64)>>(it: I) -> Self {
        let mut counts = BTreeMap::new();
        for (raw, n) in it {
            if let Some(id) = RegionId::new(raw) {
                *counts.entry(id).or_insert(0) += n;
            }
        }
        Self { counts }
    }

    /// 脑区个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// 是否没有任何脑区.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 获取脑区 `id` 的体素个数. 不存在时返回 `None`.
    #[inline]
    pub fn get(&self, id: RegionId) -> Option<u64> {
        self.counts.get(&id).copied()
    }

    /// 脑区是否存在于体积中.
    #[inline]
    pub fn contains(&self, id: RegionId) -> bool {
        self.counts.contains_key(&id)
    }

    /// 按升序迭代所有脑区.
    #[inline]
    pub fn ids(&self) -> impl ExactSizeIterator<Item = RegionId> + '_ {
        self.counts.keys().copied()
    }

    /// 按编号升序迭代 (脑区, 体素个数).
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (RegionId, u64)> + '_ {
        self.counts.iter().map(|(id, n)| (*id, *n))
    }
}

/// 脑区筛选方式.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    /// 体积中出现的所有脑区.
    #[default]
    All,

    /// 显式给出的原始标注值列表. 不存在于体积中的值会被丢弃.
    Explicit(Vec<u32>),

    /// 体素数最多的 `n` 个脑区.
    Largest(usize),

    /// 体素数最少的 `n` 个脑区.
    Smallest(usize),
}

/// 解析筛选表达式:
///
/// - 空串或 `ALL`: [`Selection::All`];
/// - `LARGEST,N` / `SMALLEST,N`: 按体素数排名;
/// - `id1,id2,...`: 显式列表.
///
/// 关键字不区分大小写, 允许各项两侧有空白.
impl FromStr for Selection {
    type Err = JaggyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || JaggyError::InvalidSelection(s.to_string());
        let parts = s.split(',').map(str::trim).collect_vec();

        match parts.as_slice() {
            [""] => Ok(Self::All),
            [kw] if kw.eq_ignore_ascii_case("all") => Ok(Self::All),
            [kw, n] if kw.eq_ignore_ascii_case("largest") => {
                n.parse().map(Self::Largest).map_err(|_| invalid())
            }
            [kw, n] if kw.eq_ignore_ascii_case("smallest") => {
                n.parse().map(Self::Smallest).map_err(|_| invalid())
            }
            ids => ids
                .iter()
                .map(|p| p.parse::<u32>())
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Explicit)
                .map_err(|_| invalid()),
        }
    }
}

/// 筛选结果.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSet {
    /// 最终要处理的脑区, 按编号升序, 无重复, 非空.
    pub ids: Vec<RegionId>,

    /// 显式请求了但被丢弃的原始标注值 (不存在于体积中, 或是 "无数据" 值), 按升序.
    pub dropped: Vec<u32>,
}

/// 按 `selection` 从 `table` 中筛选脑区.
///
/// # 返回值
///
/// - 筛选后没有剩余脑区时, 返回 `Err(JaggyError::EmptySelection)`;
/// - 显式列表中部分值不存在时, 以缩减后的集合继续, 并在 [`RegionSet::dropped`] 中报告.
///
/// # 排名的并列规则
///
/// 体素数相同的脑区按编号升序排列, 因此 `Largest`/`Smallest` 的结果是确定的.
pub fn enumerate(table: &VoxelCountTable, selection: &Selection) -> JaggyResult<RegionSet> {
    let (ids, dropped) = match selection {
        Selection::All => (table.ids().collect_vec(), vec![]),
        Selection::Explicit(raw) => {
            let (kept, dropped): (Vec<_>, Vec<_>) = raw
                .iter()
                .copied()
                .sorted_unstable()
                .dedup()
                .partition(|&r| RegionId::new(r).is_some_and(|id| table.contains(id)));
            let kept = kept.into_iter().filter_map(RegionId::new).collect_vec();
            (kept, dropped)
        }
        Selection::Largest(n) => (rank(table, *n, |(id, cnt)| (Reverse(cnt), id)), vec![]),
        Selection::Smallest(n) => (rank(table, *n, |(id, cnt)| (cnt, id)), vec![]),
    };

    if !dropped.is_empty() {
        log::warn!(
            "only {} of the requested regions are present in the volume, dropped: {:?}",
            ids.len(),
            dropped
        );
    }
    if ids.is_empty() {
        return Err(JaggyError::EmptySelection);
    }
    Ok(RegionSet { ids, dropped })
}

/// 按 `key` 升序排序后取前 `n` 个脑区, 结果再按编号升序排列.
fn rank<K, F>(table: &VoxelCountTable, n: usize, key: F) -> Vec<RegionId>
where
    K: Ord,
    F: Fn((RegionId, u64)) -> K,
{
    table
        .iter()
        .sorted_by_key(|e| key(*e))
        .take(n)
        .map(|(id, _)| id)
        .sorted()
        .collect()
}
