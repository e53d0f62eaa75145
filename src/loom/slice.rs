use std::{
    ops::{Range, RangeFull, RangeInclusive, RangeTo},
    sync::Arc,
};

use casey::snake;
use derive_more::{Deref, Display, From, Into};
use itertools::Itertools;

/// How one axis is indexed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Axis {
    /// Keeps the axis whole.
    #[default]
    #[display("..")]
    Full,
    /// Fixes the axis at one position and removes it.
    #[display("{_0}")]
    One(usize),
    /// Keeps the half-open range `start..end` of the axis.
    #[display("{_0}..{_1}")]
    Range(usize, usize),
}

impl From<usize> for Axis {
    #[inline]
    fn from(value: usize) -> Self {
        Self::One(value)
    }
}

impl From<RangeFull> for Axis {
    #[inline]
    fn from(_: RangeFull) -> Self {
        Self::Full
    }
}

impl From<Range<usize>> for Axis {
    #[inline]
    fn from(value: Range<usize>) -> Self {
        Self::Range(value.start, value.end)
    }
}

impl From<RangeInclusive<usize>> for Axis {
    #[inline]
    fn from(value: RangeInclusive<usize>) -> Self {
        let (start, end) = value.into_inner();
        Self::Range(start, end + 1)
    }
}

impl From<RangeTo<usize>> for Axis {
    #[inline]
    fn from(value: RangeTo<usize>) -> Self {
        Self::Range(0, value.end)
    }
}

/// An index specification with one [`Axis`] per axis of the indexed tensor.
///
/// Fixed when the kernel is written; never derived from data.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Deref, From, Into, Display)]
#[display("[{}]", _0.iter().format(", "))]
pub struct Slice(Arc<[Axis]>);

impl From<Vec<Axis>> for Slice {
    #[inline]
    fn from(value: Vec<Axis>) -> Self {
        Self(value.into())
    }
}

macro_rules! impl_slice_from {
    ($t:ident) => {
        impl<$t: Into<Axis>> From<$t> for Slice {
            #[inline]
            fn from(snake!($t): $t) -> Self {
                Self([snake!($t).into()].into())
            }
        }
    };
    ($($t:ident),+) => {
        impl<$($t),+> From<($($t),+)> for Slice
        where
            $($t: Into<Axis>),+
        {
            #[inline]
            fn from(($(snake!($t)),+): ($($t),+)) -> Self {
                Self([$(snake!($t).into()),+].into())
            }
        }
    };
}

impl_slice_from!(T0);
impl_slice_from!(T0, T1);
impl_slice_from!(T0, T1, T2);
impl_slice_from!(T0, T1, T2, T3);
impl_slice_from!(T0, T1, T2, T3, T4);
impl_slice_from!(T0, T1, T2, T3, T4, T5);
impl_slice_from!(T0, T1, T2, T3, T4, T5, T6);
impl_slice_from!(T0, T1, T2, T3, T4, T5, T6, T7);

impl Slice {
    /// Creates a slice keeping all `rank` axes whole.
    #[inline]
    pub fn full(rank: usize) -> Self {
        Self::from(vec![Axis::Full; rank])
    }

    /// Returns `true` if the slice contains only full axes.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.iter().all(|&axis| matches!(axis, Axis::Full))
    }

    /// Number of axes the slice keeps, i.e. the rank of the result.
    #[inline]
    pub fn rank(&self) -> usize {
        self.iter()
            .filter(|axis| !matches!(axis, Axis::One(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::{Axis, Slice};

    #[test]
    fn test_slice_from() {
        let slice = Slice::from((.., 1, 2..4));
        assert_eq!(
            slice,
            Slice::from(vec![Axis::Full, Axis::One(1), Axis::Range(2, 4)])
        );
        assert_eq!(slice.rank(), 2);
        assert_eq!(slice.to_string(), "[.., 1, 2..4]");

        assert_eq!(Slice::from(..3), Slice::from(vec![Axis::Range(0, 3)]));
        assert_eq!(Slice::from(1..=2), Slice::from(vec![Axis::Range(1, 3)]));
        assert_eq!(Slice::from(10), Slice::from(vec![Axis::One(10)]));
        assert_eq!(Slice::from(10).rank(), 0);
    }

    #[test]
    fn test_full() {
        assert!(Slice::full(3).is_full());
        assert!(!Slice::from((.., 0)).is_full());
    }
}
