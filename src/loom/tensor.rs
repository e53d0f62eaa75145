use bytemuck::AnyBitPattern;
use thiserror::Error;

use super::{
    layout::{IntoLayout, Layout, Offsets, Shape},
    num::{DataType, Element, Scalar, dispatch_type},
    slice::Slice,
    value::{Data, visit_data},
};

#[derive(Debug, Error)]
pub enum TensorError {
    #[error("shape mismatch: {0} is not compatible with {1}")]
    ShapeMismatch(Shape, Shape),
    #[error("type mismatch: operator {op} is not defined on data type {data_type}")]
    TypeMismatch {
        op: &'static str,
        data_type: DataType,
    },
    #[error("type mismatch: data type {0} cannot be converted into {1}")]
    Cast(DataType, DataType),
    #[error("index out of bounds: slice {1} is not compatible with shape {0}")]
    OutOfBounds(Shape, Slice),
    #[error("axis out of bounds: axis {0} does not exist in shape {1}")]
    Axis(usize, Shape),
    #[error("rank mismatch: shape {0} is indexed with {1} axes")]
    Rank(Shape, usize),
    #[error("overflow: scalar {0} does not fit into data type {1}")]
    Overflow(Element, DataType),
    #[error("capacity exceeded: {0} elements do not fit into {1} registers")]
    CapacityExceeded(usize, usize),
    #[error("division by zero: integer division of data type {0}")]
    DivisionByZero(DataType),
    #[error("tensor creation error: layout {0} does not fit into data len {1}")]
    Create(Layout, usize),
    #[error("config error: {0}")]
    Config(&'static str),
}

/// A read-only tensor over caller-owned memory.
///
/// The view never owns or frees the buffer; it only records how elements are laid out in it.
#[derive(Debug, Clone)]
pub struct TensorRef<'a> {
    bytes: &'a [u8],
    r#type: DataType,
    layout: Layout,
}

impl<'a> TensorRef<'a> {
    /// Views a typed buffer. Fails if the layout addresses elements past the end of `data`.
    #[inline]
    pub fn new<T: Scalar>(data: &'a [T], layout: impl IntoLayout) -> Result<Self, TensorError> {
        Self::from_bytes(bytemuck::cast_slice(data), T::DATA_TYPE, layout)
    }

    /// Views raw native-endian bytes as elements of `r#type`.
    pub fn from_bytes(
        bytes: &'a [u8],
        r#type: DataType,
        layout: impl IntoLayout,
    ) -> Result<Self, TensorError> {
        let layout = layout.into_layout();
        check_span(&layout, bytes.len(), r#type)?;
        Ok(Self {
            bytes,
            r#type,
            layout,
        })
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.r#type
    }

    /// Narrows the view to a sub-tensor. The memory is shared.
    #[inline]
    pub fn slice(&self, slice: impl Into<Slice>) -> Result<Self, TensorError> {
        let layout = self.layout.slice(&slice.into())?;
        Ok(Self {
            bytes: self.bytes,
            r#type: self.r#type,
            layout,
        })
    }

    /// Reads every element in row-major order of the logical shape.
    pub(crate) fn gather(&self) -> Data {
        let size = self.r#type.size();
        dispatch_type!(self.r#type, T => T::into_data(
            self.layout
                .offsets()
                .map(|offset| T::read(&self.bytes[offset * size..][..size]))
                .collect()
        ))
    }
}

/// A writable tensor over caller-owned memory.
///
/// Holding a `TensorMut` borrows the buffer uniquely, so no two stores can race on it.
#[derive(Debug)]
pub struct TensorMut<'a> {
    bytes: &'a mut [u8],
    r#type: DataType,
    layout: Layout,
}

impl<'a> TensorMut<'a> {
    /// Views a typed buffer. Fails if the layout addresses elements past the end of `data`.
    #[inline]
    pub fn new<T: Scalar + AnyBitPattern>(
        data: &'a mut [T],
        layout: impl IntoLayout,
    ) -> Result<Self, TensorError> {
        Self::from_bytes(bytemuck::cast_slice_mut(data), T::DATA_TYPE, layout)
    }

    /// Views raw native-endian bytes as elements of `r#type`.
    ///
    /// This is the way to write `Bool` tensors: one byte per element, written as 0 or 1.
    pub fn from_bytes(
        bytes: &'a mut [u8],
        r#type: DataType,
        layout: impl IntoLayout,
    ) -> Result<Self, TensorError> {
        let layout = layout.into_layout();
        check_span(&layout, bytes.len(), r#type)?;
        Ok(Self {
            bytes,
            r#type,
            layout,
        })
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.r#type
    }

    /// Reborrows the view as read-only.
    #[inline]
    pub fn as_ref(&self) -> TensorRef<'_> {
        TensorRef {
            bytes: &*self.bytes,
            r#type: self.r#type,
            layout: self.layout.clone(),
        }
    }

    /// Narrows the view to a sub-tensor, reborrowing the memory.
    #[inline]
    pub fn slice(&mut self, slice: impl Into<Slice>) -> Result<TensorMut<'_>, TensorError> {
        let layout = self.layout.slice(&slice.into())?;
        Ok(TensorMut {
            bytes: &mut *self.bytes,
            r#type: self.r#type,
            layout,
        })
    }

    /// Writes `data[source[i]]` to the `i`-th element in row-major order of the logical shape.
    ///
    /// `data` must already be of the tensor's data type.
    pub(crate) fn scatter(&mut self, data: &Data, source: Offsets) {
        debug_assert_eq!(data.data_type(), self.r#type);
        let size = self.r#type.size();
        let bytes = &mut *self.bytes;
        let target = self.layout.offsets();
        visit_data!(data, xs => {
            for (target, source) in target.zip(source) {
                xs[source].write(&mut bytes[target * size..][..size]);
            }
        })
    }
}

fn check_span(layout: &Layout, len: usize, r#type: DataType) -> Result<(), TensorError> {
    let size = r#type.size();
    match layout.span().and_then(|span| span.checked_mul(size)) {
        Some(bytes) if bytes <= len => Ok(()),
        _ => Err(TensorError::Create(layout.clone(), len / size)),
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use itertools::Itertools;

    use super::{TensorError, TensorMut, TensorRef};
    use crate::loom::{
        layout::{Layout, Shape},
        num::{DataType, Scalar},
        value::Data,
    };

    #[test]
    fn test_create() -> Result<(), Box<dyn Error>> {
        let data = (0..12).map(|x| x as f32).collect_vec();
        let tensor = TensorRef::new(&data, [3, 4])?;
        assert_eq!(tensor.shape(), &Shape::from([3, 4]));
        assert_eq!(tensor.data_type(), DataType::F32);

        assert!(matches!(
            TensorRef::new(&data, [4, 4]),
            Err(TensorError::Create(_, 12))
        ));

        let layout = Layout::from_parts([2, 2], [6, 1], 7)?;
        assert!(TensorRef::new(&data, layout.clone()).is_err());
        let layout = Layout::from_parts([2, 2], [6, 1], 4)?;
        assert!(TensorRef::new(&data, layout).is_ok());

        // strides whose offsets overflow are rejected instead of wrapping
        let bytes = [0u8; 4];
        let layout = Layout::from_parts([2], [usize::MAX], 0)?;
        assert!(matches!(
            TensorRef::new(&bytes, layout),
            Err(TensorError::Create(_, 4))
        ));
        let layout = Layout::from_parts([2], [usize::MAX / 4 + 1], 0)?;
        assert!(matches!(
            TensorRef::new(&data, layout),
            Err(TensorError::Create(_, 12))
        ));
        Ok(())
    }

    #[test]
    fn test_gather_strided() -> Result<(), Box<dyn Error>> {
        let data = (0..6).map(|x| x as i32).collect_vec();
        // transposed view of a 2x3 buffer
        let layout = Layout::from_parts([3, 2], [1, 3], 0)?;
        let tensor = TensorRef::new(&data, layout)?;
        let gathered = tensor.gather();
        assert_eq!(i32::from_data(&gathered), Some(&[0, 3, 1, 4, 2, 5][..]));

        let row = tensor.slice((1, ..))?;
        assert_eq!(i32::from_data(&row.gather()), Some(&[1, 4][..]));
        Ok(())
    }

    #[test]
    fn test_bool_bytes() -> Result<(), Box<dyn Error>> {
        let flags = [true, false, true];
        let tensor = TensorRef::new(&flags, [3])?;
        assert_eq!(bool::from_data(&tensor.gather()), Some(&flags[..]));

        let mut bytes = [7u8, 0, 0];
        let mut tensor = TensorMut::from_bytes(&mut bytes, DataType::Bool, [3])?;
        let data = Data::Bool([false, true, true].into());
        tensor.scatter(&data, Layout::from_shape([3]).offsets());
        assert_eq!(bytes, [0, 1, 1]);
        Ok(())
    }
}
