//! 通用常量.

/// 标注体积中 "无数据" 体素的原始值. 该值永远不会被当作脑区处理.
pub const NO_DATA: u32 = 0;

/// 默认扫掠轴 (一般对应冠状面方向).
pub const DEFAULT_SWEEP_AXIS: usize = 0;

/// 标注体积的维数.
pub const VOLUME_NDIM: usize = 3;

/// 体积文件扩展名.
pub mod ext {
    /// NIfTI-1 单文件格式.
    pub const NII: &str = "nii";

    /// gzip 压缩的 NIfTI-1 单文件格式 (仅匹配最后一段扩展名).
    pub const GZ: &str = "gz";

    /// numpy 数组格式.
    pub const NPY: &str = "npy";
}
