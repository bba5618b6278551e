use std::collections::HashMap;
use std::ffi::OsStr;
use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayD, ArrayView, ArrayView2, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::consts::ext;
use crate::error::{JaggyError, JaggyResult};
use crate::select::VoxelCountTable;
use crate::Idx3d;

mod axis;
mod mask;
mod region;

pub use axis::SweepAxis;
pub use mask::RegionMask;
pub use region::{Label, RegionId};

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 体积文件格式. 由文件扩展名决定.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum VolumeFormat {
    /// `.nii` 或 `.nii.gz`.
    Nifti,

    /// `.npy`.
    Npy,
}

impl VolumeFormat {
    /// 根据扩展名判断格式. 无法识别时返回 `Err(JaggyError::UnsupportedFormat)`.
    pub(crate) fn from_path(path: &Path) -> JaggyResult<Self> {
        match path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some(ext::NII | ext::GZ) => Ok(Self::Nifti),
            Some(ext::NPY) => Ok(Self::Npy),
            _ => Err(JaggyError::UnsupportedFormat(path.to_owned())),
        }
    }
}

/// 读取 npy 标注数据. 非 `u32` 的整数类型会被转换为 `u32`,
/// 存在无法表示为 `u32` 的标注值时返回 `Err(JaggyError::LabelOutOfRange)`.
fn read_npy_labels(path: &Path) -> JaggyResult<ArrayD<u32>> {
    use ndarray_npy::{read_npy, ReadNpyError};

    /// 以 `T` 读取, 数据类型不匹配时返回 `Ok(None)`.
    fn try_read<T>(path: &Path) -> JaggyResult<Option<ArrayD<u32>>>
    where
        T: ndarray_npy::ReadableElement + Copy + Into<i128>,
    {
        let a = match read_npy::<_, ArrayD<T>>(path) {
            Ok(a) => a,
            Err(ReadNpyError::WrongDescriptor(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let narrow = |v: T| u32::try_from(v.into()).ok();
        if let Some(&bad) = a.iter().find(|v| narrow(**v).is_none()) {
            return Err(JaggyError::LabelOutOfRange(bad.into()));
        }
        Ok(Some(a.mapv(|v| narrow(v).unwrap_or_default())))
    }

    if let Some(a) = try_read::<u32>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read::<u16>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read::<u8>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read::<i32>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read::<i64>(path)? {
        return Ok(a);
    }
    if let Some(a) = try_read::<u64>(path)? {
        return Ok(a);
    }
    // 其余数据类型按 `u32` 读取以得到原始的类型错误.
    Ok(read_npy(path)?)
}

/// 动态维度数组 -> 三维数组.
fn into_3d<T>(data: ArrayD<T>) -> JaggyResult<Array3<T>> {
    let shape = data.shape().to_vec();
    data.into_dimensionality::<Ix3>()
        .map_err(|_| JaggyError::NotVolume3d(shape))
}

/// 三维脑图谱标注体积, 包括空间元信息 (header) 和体素标注. 标注值以 `u32` 保存.
///
/// 该结构只读: 计算流程中的所有 worker 共享同一份实体, 不需要加锁.
/// 元信息对计算而言是不透明的, 仅在导出可视化体积时原样传递.
#[derive(Debug, Clone)]
pub struct LabeledVolume {
    header: BoxedHeader,
    data: Array3<u32>,
}

impl Index<Idx3d> for LabeledVolume {
    type Output = u32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl LabeledVolume {
    /// 打开标注体积文件. 支持 `.nii`, `.nii.gz` 和 `.npy`.
    ///
    /// 数据轴按文件中的顺序保留, 不做任何转置. 如果打开成功,
    /// 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> JaggyResult<Self> {
        let path = path.as_ref();
        match VolumeFormat::from_path(path)? {
            VolumeFormat::Nifti => {
                let obj = ReaderOptions::new().read_file(path)?;
                let header = Box::new(obj.header().clone());
                let data = into_3d(obj.into_volume().into_ndarray::<u32>()?)?;
                Ok(Self { header, data })
            }
            VolumeFormat::Npy => Ok(Self::from_array(into_3d(read_npy_labels(path)?)?)),
        }
    }

    /// 根据裸标注数据直接创建, 空间元信息取默认值.
    #[inline]
    pub fn from_array(data: Array3<u32>) -> Self {
        Self {
            header: Box::default(),
            data,
        }
    }

    /// 根据裸标注数据和已有的空间元信息直接创建.
    ///
    /// # 注意
    ///
    /// 该方法不检查 `header` 与 `data` 的一致性.
    #[inline]
    pub fn with_header(header: &NiftiHeader, data: Array3<u32>) -> Self {
        Self {
            header: Box::new(header.clone()),
            data,
        }
    }

    /// 获取空间元信息.
    #[inline]
    pub fn header(&self) -> &NiftiHeader {
        &self.header
    }

    /// 获取数据形状大小.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取数据体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 获取沿扫掠轴 `axis` 的切片个数.
    #[inline]
    pub fn len_along(&self, axis: SweepAxis) -> usize {
        self.data.len_of(axis.axis())
    }

    /// 获取 `pos` 处体素的标注类型. 越界时 panic.
    #[inline]
    pub fn label_at(&self, pos: Idx3d) -> Label {
        Label::from(self[pos])
    }

    /// 获取沿 `axis` 的第 `index` 层切片视图.
    ///
    /// 当 `index` 越界时 panic.
    #[inline]
    pub fn slice_along(&self, axis: SweepAxis, index: usize) -> ArrayView2<'_, u32> {
        self.data.index_axis(axis.axis(), index)
    }

    /// 获取能按升序迭代沿 `axis` 各层切片的迭代器.
    #[inline]
    pub fn slice_iter(
        &self,
        axis: SweepAxis,
    ) -> impl ExactSizeIterator<Item = ArrayView2<'_, u32>> {
        self.data.axis_iter(axis.axis())
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView<'_, u32, Ix3> {
        self.data.view()
    }

    /// 获取脑区 `id` 的体素个数.
    #[inline]
    pub fn count(&self, id: RegionId) -> usize {
        let raw = id.get();
        self.data.iter().filter(|p| **p == raw).count()
    }

    /// 统计体积中每个脑区的体素个数. "无数据" 体素不计入.
    pub fn voxel_counts(&self) -> VoxelCountTable {
        VoxelCountTable::from_pairs(tally(self.data.iter().copied()))
    }

    /// 获取体积中出现的所有脑区, 按升序排列.
    #[inline]
    pub fn region_ids(&self) -> Vec<RegionId> {
        self.voxel_counts().ids().collect()
    }
}

/// 统计原始标注值出现的次数.
fn tally<I: IntoIterator<Item = u32>>(it: I) -> HashMap<u32, u64> {
    let mut ans = HashMap::new();
    for raw in it {
        *ans.entry(raw).or_insert(0u64) += 1;
    }
    ans
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
        use ndarray::Axis;
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl LabeledVolume {
    /// 借助 `rayon`, 按第 0 轴切分后并行地统计每个脑区的体素个数.
    ///
    /// 结果与 [`Self::voxel_counts`] 完全一致.
    pub fn par_voxel_counts(&self) -> VoxelCountTable {
        let counts = self
            .data
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|slab| tally(slab.iter().copied()))
            .reduce(HashMap::new, |mut acc, part| {
                for (raw, n) in part {
                    *acc.entry(raw).or_insert(0) += n;
                }
                acc
            });
        VoxelCountTable::from_pairs(counts)
    }
}
