//! 🧠欢迎光临📐
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::{Label, LabeledVolume, RegionId, RegionMask, SweepAxis};
pub use crate::{JaggyError, JaggyResult};

pub use crate::consts::NO_DATA;
pub use crate::metric::{measure_region, slice_ratios, RegionStats, SliceRatios, Summary};
pub use crate::aggregate::{GlobalStats, RatioMatrix, SliceStats};
pub use crate::report::Report;
pub use crate::schedule::{FailurePolicy, RegionFailure, WorkScheduler, Workers};
pub use crate::select::{RegionSet, Selection, VoxelCountTable};

pub use crate::{compute, compute_with_table, ComputeOptions, Outcome};
