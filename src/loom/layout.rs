use std::iter::FusedIterator;

use derive_more::{Deref, Display, From, Into};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{
    slice::{Axis, Slice},
    tensor::TensorError,
};

/// Extents of each axis, outermost first. An empty shape denotes a scalar.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, Hash, Deref, From, Into, Display, Serialize, Deserialize,
)]
#[display("[{}]", _0.iter().format(", "))]
pub struct Shape(Vec<usize>);

impl<const N: usize> From<[usize; N]> for Shape {
    #[inline]
    fn from(value: [usize; N]) -> Self {
        Self(value.to_vec())
    }
}

impl From<&[usize]> for Shape {
    #[inline]
    fn from(value: &[usize]) -> Self {
        Self(value.to_vec())
    }
}

impl Shape {
    #[inline]
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    #[inline]
    pub fn scalar() -> Self {
        Self(vec![])
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of elements. A scalar holds one element.
    #[inline]
    pub fn size(&self) -> usize {
        self.0.iter().product()
    }

    /// Row-major strides of a contiguous tensor of this shape, in elements.
    pub fn contiguous_strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.rank()];
        for axis in (1..self.rank()).rev() {
            strides[axis - 1] = strides[axis] * self.0[axis];
        }
        strides
    }

    /// Computes the shape both operands broadcast to.
    ///
    /// Shapes are aligned from the innermost axis; each pair of extents must be equal or
    /// one of them must be 1. Missing leading axes count as 1.
    pub fn broadcast(&self, other: &Shape) -> Result<Shape, TensorError> {
        let rank = self.rank().max(other.rank());
        let extent = |shape: &Shape, axis: usize| match axis + shape.rank() < rank {
            true => 1,
            false => shape[axis + shape.rank() - rank],
        };
        (0..rank)
            .map(|axis| match (extent(self, axis), extent(other, axis)) {
                (x, y) if x == y => Ok(x),
                (1, y) => Ok(y),
                (x, 1) => Ok(x),
                _ => Err(TensorError::ShapeMismatch(self.clone(), other.clone())),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Shape)
    }
}

pub trait IntoLayout {
    fn into_layout(self) -> Layout;
}

impl IntoLayout for Layout {
    #[inline]
    fn into_layout(self) -> Layout {
        self
    }
}

impl IntoLayout for Shape {
    #[inline]
    fn into_layout(self) -> Layout {
        Layout::from_shape(self)
    }
}

impl IntoLayout for Vec<usize> {
    #[inline]
    fn into_layout(self) -> Layout {
        Layout::from_shape(self)
    }
}

impl<const N: usize> IntoLayout for [usize; N] {
    #[inline]
    fn into_layout(self) -> Layout {
        Layout::from_shape(self)
    }
}

/// Maps a logical index to an element offset: `offset + Σ index[i] * strides[i]`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display("{shape}:[{}]+{offset}", strides.iter().format(", "))]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
    offset: usize,
}

impl Layout {
    /// A contiguous row-major layout.
    #[inline]
    pub fn from_shape(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let strides = shape.contiguous_strides();
        Self {
            shape,
            strides,
            offset: 0,
        }
    }

    /// A strided layout. Strides are counted in elements, one per axis.
    pub fn from_parts(
        shape: impl Into<Shape>,
        strides: impl Into<Vec<usize>>,
        offset: usize,
    ) -> Result<Self, TensorError> {
        let shape = shape.into();
        let strides = strides.into();
        if shape.rank() != strides.len() {
            return Err(TensorError::Rank(shape, strides.len()));
        }
        Ok(Self {
            shape,
            strides,
            offset,
        })
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.strides == self.shape.contiguous_strides()
    }

    /// One past the largest element offset the layout addresses, or 0 if it addresses none.
    ///
    /// `None` if the offset does not fit into `usize`.
    pub fn span(&self) -> Option<usize> {
        if self.shape.contains(&0) {
            return Some(0);
        }
        itertools::izip!(self.shape.iter(), self.strides.iter())
            .try_fold(self.offset, |acc, (&dim, &stride)| {
                (dim - 1).checked_mul(stride)?.checked_add(acc)
            })?
            .checked_add(1)
    }

    /// Views the layout as `shape`, repeating it along broadcast axes with stride 0.
    ///
    /// Broadcasting is one-directional: every axis of `self` must be 1 or equal to its
    /// counterpart in `shape`.
    pub fn broadcast_to(&self, shape: &Shape) -> Result<Layout, TensorError> {
        let error = || TensorError::ShapeMismatch(self.shape.clone(), shape.clone());
        if self.rank() > shape.rank() {
            return Err(error());
        }
        let leading = shape.rank() - self.rank();
        let strides = shape
            .iter()
            .enumerate()
            .map(|(axis, &dim)| match axis.checked_sub(leading) {
                None => Ok(0),
                Some(axis) if self.shape[axis] == dim => Ok(self.strides[axis]),
                Some(axis) if self.shape[axis] == 1 => Ok(0),
                Some(_) => Err(error()),
            })
            .collect::<Result<_, _>>()?;
        Ok(Layout {
            shape: shape.clone(),
            strides,
            offset: self.offset,
        })
    }

    /// Narrows the layout by an index specification with one entry per axis.
    ///
    /// Axes indexed by a single position are removed; ranges resize their axis.
    pub fn slice(&self, slice: &Slice) -> Result<Layout, TensorError> {
        if slice.len() != self.rank() {
            return Err(TensorError::Rank(self.shape.clone(), slice.len()));
        }
        let error = || TensorError::OutOfBounds(self.shape.clone(), slice.clone());

        let mut offset = self.offset;
        let mut shape = vec![];
        let mut strides = vec![];
        for (&axis, &dim, &stride) in itertools::izip!(slice.iter(), self.shape.iter(), &self.strides)
        {
            match axis {
                Axis::Full => {
                    shape.push(dim);
                    strides.push(stride);
                }
                Axis::One(index) if index < dim => offset += index * stride,
                Axis::Range(start, end) if start <= end && end <= dim => {
                    offset += start * stride;
                    shape.push(end - start);
                    strides.push(stride);
                }
                _ => return Err(error()),
            }
        }
        Ok(Layout {
            shape: Shape(shape),
            strides,
            offset,
        })
    }

    /// Keeps only the axes for which `keep` returns `true`, in their original order.
    pub fn select(&self, keep: impl Fn(usize) -> bool) -> Layout {
        let (shape, strides) = itertools::izip!(self.shape.iter(), &self.strides)
            .enumerate()
            .filter(|&(axis, _)| keep(axis))
            .map(|(_, (&dim, &stride))| (dim, stride))
            .unzip();
        Layout {
            shape: Shape(shape),
            strides,
            offset: self.offset,
        }
    }

    /// Element offsets of the layout in row-major order of its logical shape.
    #[inline]
    pub fn offsets(&self) -> Offsets {
        Offsets {
            shape: self.shape.to_vec(),
            strides: self.strides.clone(),
            index: vec![0; self.rank()],
            offset: self.offset,
            remaining: self.size(),
        }
    }
}

/// Row-major iterator over the element offsets of a [`Layout`].
#[derive(Debug, Clone)]
pub struct Offsets {
    shape: Vec<usize>,
    strides: Vec<usize>,
    index: Vec<usize>,
    offset: usize,
    remaining: usize,
}

impl Iterator for Offsets {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.offset;
        self.remaining -= 1;
        if self.remaining > 0 {
            for axis in (0..self.shape.len()).rev() {
                self.index[axis] += 1;
                self.offset += self.strides[axis];
                if self.index[axis] < self.shape[axis] {
                    break;
                }
                self.offset -= self.strides[axis] * self.shape[axis];
                self.index[axis] = 0;
            }
        }
        Some(current)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Offsets {}

impl FusedIterator for Offsets {}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use itertools::Itertools;

    use super::{Layout, Shape};
    use crate::loom::{
        slice::{Axis, Slice},
        tensor::TensorError,
    };

    #[test]
    fn test_shape() {
        let shape = Shape::from([2, 3, 4]);
        assert_eq!(shape.size(), 24);
        assert_eq!(shape.contiguous_strides(), vec![12, 4, 1]);
        assert_eq!(shape.to_string(), "[2, 3, 4]");

        let scalar = Shape::scalar();
        assert_eq!(scalar.size(), 1);
        assert!(scalar.contiguous_strides().is_empty());
    }

    #[test]
    fn test_broadcast() -> Result<(), Box<dyn Error>> {
        let a = Shape::from([4, 1, 3]);
        let b = Shape::from([2, 1]);
        assert_eq!(a.broadcast(&b)?, Shape::from([4, 2, 3]));
        assert_eq!(Shape::scalar().broadcast(&a)?, a);

        let c = Shape::from([2, 2]);
        assert!(matches!(
            a.broadcast(&c),
            Err(TensorError::ShapeMismatch(_, _))
        ));
        Ok(())
    }

    #[test]
    fn test_offsets() -> Result<(), Box<dyn Error>> {
        let layout = Layout::from_shape([2, 3]);
        assert_eq!(layout.offsets().collect_vec(), (0..6).collect_vec());

        // a transposed view of a 3x2 buffer
        let layout = Layout::from_parts([2, 3], [1, 2], 0)?;
        assert_eq!(layout.offsets().collect_vec(), [0, 2, 4, 1, 3, 5]);
        assert_eq!(layout.span(), Some(6));

        let layout = Layout::from_shape(Shape::scalar());
        assert_eq!(layout.offsets().collect_vec(), [0]);

        let layout = Layout::from_shape([3, 0]);
        assert_eq!(layout.offsets().count(), 0);
        assert_eq!(layout.span(), Some(0));

        let layout = Layout::from_parts([2], [usize::MAX], 0)?;
        assert_eq!(layout.span(), None);
        let layout = Layout::from_parts([2, 2], [1, usize::MAX / 2], usize::MAX / 2)?;
        assert_eq!(layout.span(), None);
        Ok(())
    }

    #[test]
    fn test_broadcast_to() -> Result<(), Box<dyn Error>> {
        let layout = Layout::from_shape([3]).broadcast_to(&Shape::from([2, 3]))?;
        assert_eq!(layout.offsets().collect_vec(), [0, 1, 2, 0, 1, 2]);

        let layout = Layout::from_shape([2, 1]).broadcast_to(&Shape::from([2, 3]))?;
        assert_eq!(layout.offsets().collect_vec(), [0, 0, 0, 1, 1, 1]);

        let layout = Layout::from_shape([2, 3]);
        assert!(layout.broadcast_to(&Shape::from([3])).is_err());
        assert!(layout.broadcast_to(&Shape::from([2, 4])).is_err());
        Ok(())
    }

    #[test]
    fn test_slice() -> Result<(), Box<dyn Error>> {
        let layout = Layout::from_shape([4, 2, 3]);

        let sliced = layout.slice(&Slice::from((.., 1, ..)))?;
        assert_eq!(sliced.shape(), &Shape::from([4, 3]));
        assert_eq!(sliced.offsets().take(4).collect_vec(), [3, 4, 5, 9]);

        let sliced = layout.slice(&Slice::from((1..3, .., 2)))?;
        assert_eq!(sliced.shape(), &Shape::from([2, 2]));
        assert_eq!(sliced.offsets().collect_vec(), [8, 11, 14, 17]);

        let slice = Slice::from((Axis::Full, 2, Axis::Full));
        assert!(matches!(
            layout.slice(&slice),
            Err(TensorError::OutOfBounds(_, _))
        ));
        assert!(matches!(
            layout.slice(&Slice::from((.., ..))),
            Err(TensorError::Rank(_, 2))
        ));
        Ok(())
    }

    #[test]
    fn test_select() {
        let layout = Layout::from_shape([2, 3, 4]);
        let kept = layout.select(|axis| axis != 1);
        assert_eq!(kept.shape(), &Shape::from([2, 4]));
        assert_eq!(kept.strides(), &[12, 1]);
    }
}
