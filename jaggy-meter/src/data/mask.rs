use super::{LabeledVolume, RegionId, SweepAxis};
use ndarray::{Array3, Zip};

/// 单个脑区的三维二值掩码, 与原标注体积同形状.
///
/// 掩码由构建它的 worker 独占, 用完即丢弃.
#[derive(Debug, Clone)]
pub struct RegionMask {
    id: RegionId,
    data: Array3<bool>,
}

impl RegionMask {
    /// 构建脑区 `id` 的掩码: 体素值等于 `id` 处为 `true`, 其余为 `false`.
    pub fn build(volume: &LabeledVolume, id: RegionId) -> Self {
        let raw = id.get();
        Self {
            id,
            data: volume.data().mapv(|v| v == raw),
        }
    }

    /// 掩码对应的脑区.
    #[inline]
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// 掩码形状.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// 掩码中 `true` 体素总数.
    pub fn voxel_count(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }

    /// 沿 `axis` 向后循环平移一格的掩码副本.
    ///
    /// 副本的第 `i` 层切片等于原掩码的第 `i + 1` 层切片,
    /// 最后一层回绕为原掩码的第 `0` 层.
    pub fn rolled(&self, axis: SweepAxis) -> Self {
        let ax = axis.index();
        let n = self.data.len_of(axis.axis());
        // n == 0 时形状中没有元素, 闭包不会被调用.
        let data = Array3::from_shape_fn(self.data.raw_dim(), |(z, h, w)| {
            let mut idx = [z, h, w];
            idx[ax] = (idx[ax] + 1) % n;
            self.data[idx]
        });
        Self { id: self.id, data }
    }

    /// 沿 `axis` 统计每一层切片上的 `true` 体素个数.
    pub fn per_slice_counts(&self, axis: SweepAxis) -> Vec<u64> {
        self.data
            .axis_iter(axis.axis())
            .map(|s| s.iter().filter(|&&b| b).count() as u64)
            .collect()
    }

    /// 沿 `axis` 逐层比较 `self` 与 `other`, 统计每一层上取值不同的体素个数.
    ///
    /// 两个掩码形状必须一致, 否则程序 panic.
    pub fn diff_counts(&self, other: &RegionMask, axis: SweepAxis) -> Vec<u64> {
        assert_eq!(self.shape(), other.shape(), "掩码形状不一致");
        self.data
            .axis_iter(axis.axis())
            .zip(other.data.axis_iter(axis.axis()))
            .map(|(a, b)| Zip::from(&a).and(&b).fold(0u64, |acc, x, y| acc + u64::from(x != y)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::RegionMask;
    use crate::{LabeledVolume, RegionId, SweepAxis};
    use ndarray::Array3;

    /// 3 x 2 x 2 的体积, 脑区 `5` 在第 0, 1 层各占 1 个和 2 个体素.
    fn tiny() -> LabeledVolume {
        let mut data = Array3::<u32>::zeros((3, 2, 2));
        data[(0, 0, 0)] = 5;
        data[(1, 0, 0)] = 5;
        data[(1, 1, 1)] = 5;
        data[(2, 0, 1)] = 9;
        LabeledVolume::from_array(data)
    }

    #[test]
    fn test_build_and_count() {
        let v = tiny();
        let m = RegionMask::build(&v, RegionId::new(5).unwrap());
        assert_eq!(m.voxel_count(), 3);
        assert_eq!(m.per_slice_counts(SweepAxis::default()), vec![1, 2, 0]);
        assert_eq!(m.per_slice_counts(SweepAxis::new(1).unwrap()), vec![2, 1]);
    }

    #[test]
    fn test_rolled_wraps_around() {
        let v = tiny();
        let axis = SweepAxis::default();
        let m = RegionMask::build(&v, RegionId::new(5).unwrap());
        let r = m.rolled(axis);
        assert_eq!(r.id(), m.id());
        assert_eq!(r.per_slice_counts(axis), vec![2, 0, 1]);
        // 0 vs 1: (1, 1) 不同; 1 vs 2: 两个体素均消失; 2 vs 0: (0, 0) 出现.
        assert_eq!(m.diff_counts(&r, axis), vec![1, 2, 1]);
    }

    #[test]
    fn test_rolled_single_slice_is_identity() {
        let mut data = Array3::<u32>::zeros((1, 3, 3));
        data[(0, 1, 1)] = 4;
        let v = LabeledVolume::from_array(data);
        let axis = SweepAxis::default();
        let m = RegionMask::build(&v, RegionId::new(4).unwrap());
        let r = m.rolled(axis);
        assert_eq!(m.diff_counts(&r, axis), vec![0]);
        assert_eq!(r.per_slice_counts(axis), vec![1]);
    }
}
