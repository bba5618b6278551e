use crate::consts::{DEFAULT_SWEEP_AXIS, VOLUME_NDIM};
use crate::error::{JaggyError, JaggyResult};
use ndarray::Axis;

/// 扫掠轴. 相邻切片沿该轴进行比较.
///
/// 只能通过 [`SweepAxis::new`] 创建, 因此其值总是合法的三维轴索引.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SweepAxis(usize);

impl SweepAxis {
    /// 创建扫掠轴. `axis` 不在 `0..3` 中时返回 `Err(JaggyError::InvalidAxis)`.
    pub fn new(axis: usize) -> JaggyResult<Self> {
        if axis < VOLUME_NDIM {
            Ok(Self(axis))
        } else {
            Err(JaggyError::InvalidAxis(axis))
        }
    }

    /// 轴索引.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// 对应的 `ndarray` 轴.
    #[inline]
    pub const fn axis(self) -> Axis {
        Axis(self.0)
    }
}

impl Default for SweepAxis {
    #[inline]
    fn default() -> Self {
        Self(DEFAULT_SWEEP_AXIS)
    }
}

impl TryFrom<usize> for SweepAxis {
    type Error = JaggyError;

    #[inline]
    fn try_from(axis: usize) -> Result<Self, Self::Error> {
        Self::new(axis)
    }
}

#[cfg(test)]
mod tests {
    use super::SweepAxis;
    use crate::JaggyError;

    #[test]
    fn test_sweep_axis_init_err() {
        assert!(matches!(SweepAxis::new(3), Err(JaggyError::InvalidAxis(3))));
        assert!(matches!(
            SweepAxis::try_from(usize::MAX),
            Err(JaggyError::InvalidAxis(usize::MAX))
        ));
    }

    #[test]
    fn test_sweep_axis_valid() {
        assert_eq!(SweepAxis::default().index(), 0);
        for i in 0..3 {
            assert_eq!(SweepAxis::new(i).unwrap().index(), i);
        }
    }
}
