#![warn(missing_docs)]

//! 核心库. 量化三维脑图谱标注体积 (labeled atlas volume) 中,
//! 每个脑区沿扫掠轴 (sweep axis) 方向相邻切片之间的不一致程度, 即 "锯齿度".
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 计算流程
//!
//! 1. [`select`]: 枚举体积中存在的脑区, 并按显式列表或体素数排名筛选;
//! 2. [`metric`]: 对单个脑区构建掩码, 计算逐切片差异比 (diff ratio) 及其统计量;
//! 3. [`schedule`]: 以固定大小的工作线程池并发地处理所有脑区;
//! 4. [`aggregate`]: 将各脑区的差异比拼接为矩阵, 求逐切片统计与全局统计;
//! 5. [`report`]: 组装最终报告, 可序列化为 JSON.
//!
//! 入口为 [`compute`] / [`compute_with_table`].
//!
//! # 开发计划
//!
//! ### 单脑区差异比计算 ✅
//!
//! 实现位于 `jaggy-meter/src/metric`.
//!
//! ### 工作线程池 + 任务队列调度, 支持失败即取消 ✅
//!
//! 原先 "按批 join" 的调度方式会被单个大脑区拖慢整批任务, 现已替换为线程池.
//!
//! 实现位于 `jaggy-meter/src/schedule.rs`.
//!
//! ### 逐切片 / 全局统计 ✅
//!
//! 实现位于 `jaggy-meter/src/aggregate.rs`.
//!
//! ### 可视化体积导出 ✅
//!
//! 将逐脑区或逐切片的统计量回填为与原体积同形状的 `f32` 体积.
//!
//! 实现位于 `jaggy-meter/src/export.rs`.
//!
//! ### 同时扫掠多个轴 ❌
//!
//! 不在计划内. 需要多个轴时请分别运行.

/// 三维索引.
pub type Idx3d = (usize, usize, usize);

/// 标注体积及其基础数据结构.
mod data;

pub use data::{Label, LabeledVolume, RegionId, RegionMask, SweepAxis};

pub mod aggregate;
pub mod consts;
pub mod error;
pub mod export;
pub mod metric;
mod pipeline;
pub mod prelude;
pub mod report;
pub mod schedule;
pub mod select;

pub use error::{JaggyError, JaggyResult};
pub use pipeline::{compute, compute_with_table, ComputeOptions, Outcome};
