//! 最终报告.
//!
//! 报告只做组合, 不做任何计算. 脑区编号在内存中为整数,
//! 序列化为 JSON 时统一表示为十进制字符串键, 按编号升序排列.

use crate::aggregate::{GlobalStats, SliceStats};
use crate::error::JaggyResult;
use crate::RegionId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub use crate::metric::RegionStats;

/// 锯齿度报告: `{perRegion, perSlice, global}`.
///
/// 所有统计量要么为 `None` (序列化为 `null`), 要么在 `[0, 1]` 中.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// 逐脑区统计. 键集合恰好等于筛选后成功处理的脑区集合.
    pub per_region: BTreeMap<RegionId, RegionStats>,

    /// 逐切片统计, 长度等于扫掠轴长度.
    pub per_slice: SliceStats,

    /// 全局统计.
    pub global: GlobalStats,
}

impl Report {
    /// 组合三部分统计结果.
    #[inline]
    pub fn assemble(
        per_region: BTreeMap<RegionId, RegionStats>,
        per_slice: SliceStats,
        global: GlobalStats,
    ) -> Self {
        Self {
            per_region,
            per_slice,
            global,
        }
    }

    /// 以带缩进的 JSON 格式写入 `w`.
    pub fn to_json_writer<W: Write>(&self, w: W) -> JaggyResult<()> {
        serde_json::to_writer_pretty(w, self)?;
        Ok(())
    }

    /// 以带缩进的 JSON 格式保存到 `path`.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> JaggyResult<()> {
        let mut w = BufWriter::new(File::create(path.as_ref())?);
        self.to_json_writer(&mut w)?;
        w.flush()?;
        Ok(())
    }
}
