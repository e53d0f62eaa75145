use std::{fmt, sync::Arc};

use derive_more::{Display, From};
use half::{bf16, f16};

use super::{
    layout::{Layout, Shape},
    num::{DataType, Element, Scalar, dispatch_type, visit_element},
    tensor::TensorError,
};

/// Typed, contiguous, row-major storage of a [`Value`].
#[derive(Debug, Clone, PartialEq, From)]
pub enum Data {
    Bool(Arc<[bool]>),
    U8(Arc<[u8]>),
    U16(Arc<[u16]>),
    U32(Arc<[u32]>),
    U64(Arc<[u64]>),
    I8(Arc<[i8]>),
    I16(Arc<[i16]>),
    I32(Arc<[i32]>),
    I64(Arc<[i64]>),
    F16(Arc<[f16]>),
    BF16(Arc<[bf16]>),
    F32(Arc<[f32]>),
    F64(Arc<[f64]>),
}

/// Expands `$body` once per [`Data`] variant, with `$xs` bound to the stored elements.
macro_rules! visit_data {
    ($data:expr, $xs:ident => $body:expr) => {
        $crate::loom::value::visit!($data; [
            Bool, U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64
        ]; $xs => $body; _ => unreachable!())
    };
}

/// Expands `$body` for the listed [`Data`] variants and `$other` for the rest.
macro_rules! visit {
    ($data:expr; [$($v:ident),+ $(,)?]; $xs:ident => $body:expr; _ => $other:expr) => {
        match $data {
            $($crate::loom::value::Data::$v($xs) => $body,)+
            #[allow(unreachable_patterns)]
            _ => $other,
        }
    };
}

/// Expands `$body` for pairs of the same listed [`Data`] variant and `$other` for the rest.
macro_rules! visit_pair {
    ($x:expr, $y:expr; [$($v:ident),+ $(,)?]; $a:ident, $b:ident => $body:expr; _ => $other:expr) => {
        match ($x, $y) {
            $(($crate::loom::value::Data::$v($a), $crate::loom::value::Data::$v($b)) => $body,)+
            #[allow(unreachable_patterns)]
            _ => $other,
        }
    };
}

pub(crate) use {visit, visit_data, visit_pair};

impl Data {
    #[inline]
    pub fn data_type(&self) -> DataType {
        visit_data!(self, xs => xs.first().copied().unwrap_or_default().data_type())
    }

    #[inline]
    pub fn len(&self) -> usize {
        visit_data!(self, xs => xs.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at a flat position.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Element> {
        visit_data!(self, xs => xs.get(index).map(|x| x.into_element()))
    }

    /// Picks elements at the given flat positions, in order.
    pub fn gather(&self, offsets: impl Iterator<Item = usize>) -> Data {
        visit_data!(self, xs => Data::from(offsets.map(|offset| xs[offset]).collect::<Arc<[_]>>()))
    }

    /// Converts every element into `r#type`, following [`Element::cast`].
    pub fn cast(&self, r#type: DataType) -> Data {
        if self.data_type() == r#type {
            return self.clone();
        }
        dispatch_type!(r#type, U => visit_data!(self, xs => U::into_data(
            xs.iter().map(|&x| super::num::convert::<_, U>(x)).collect()
        )))
    }

    /// Repeats one element `len` times.
    pub fn full(x: Element, len: usize) -> Data {
        visit_element!(x, x => Data::from(vec![x; len]))
    }
}

macro_rules! impl_data_from_vec {
    ($($t:ty),+) => {$(
        impl From<Vec<$t>> for Data {
            #[inline]
            fn from(value: Vec<$t>) -> Self {
                Self::from(Arc::<[$t]>::from(value))
            }
        }
    )+};
}

impl_data_from_vec!(bool, u8, u16, u32, u64, i8, i16, i32, i64, f16, bf16, f32, f64);

/// An immutable register-resident value of fixed shape and data type.
///
/// Values are created by loading tensors, by constructors, or as results of operators.
/// None of their methods mutate; cloning shares the underlying storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    shape: Shape,
    data: Data,
}

impl Value {
    /// Assembles a value. The data must hold exactly `shape.size()` elements.
    #[inline]
    pub(crate) fn from_parts(shape: Shape, data: Data) -> Self {
        debug_assert_eq!(shape.size(), data.len());
        Self { shape, data }
    }

    /// Creates a value from row-major elements.
    pub fn from_vec<T: Scalar>(shape: impl Into<Shape>, data: Vec<T>) -> Result<Self, TensorError> {
        let shape = shape.into();
        if shape.size() != data.len() {
            return Err(TensorError::Create(Layout::from_shape(shape), data.len()));
        }
        let data = T::into_data(data.into());
        Ok(Self { shape, data })
    }

    /// Creates a value of empty shape holding one element.
    #[inline]
    pub fn scalar(x: impl Into<Element>) -> Self {
        Self::full(Shape::scalar(), x)
    }

    /// Creates a value of `shape` with every element equal to `x`.
    #[inline]
    pub fn full(shape: impl Into<Shape>, x: impl Into<Element>) -> Self {
        let shape = shape.into();
        let data = Data::full(x.into(), shape.size());
        Self { shape, data }
    }

    #[inline]
    pub fn zeros(shape: impl Into<Shape>, r#type: DataType) -> Self {
        Self::full(shape, Element::I32(0).cast(r#type))
    }

    /// Creates the `I32` vector `[start, start + 1, ..., end - 1]`; empty if `end <= start`.
    pub fn arange(start: i32, end: i32) -> Self {
        let data: Vec<i32> = (start..end).collect();
        let shape = Shape::from([data.len()]);
        let data = data.into();
        Self { shape, data }
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data.data_type()
    }

    #[inline]
    pub fn data(&self) -> &Data {
        &self.data
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_scalar()
    }

    /// Returns the element at a multi-dimensional index, or `None` if out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<Element> {
        let inside = itertools::izip!(index, self.shape.iter()).all(|(i, n)| i < n);
        if index.len() != self.rank() || !inside {
            return None;
        }
        let offset = itertools::izip!(index, self.shape.contiguous_strides())
            .map(|(i, stride)| i * stride)
            .sum();
        self.data.get(offset)
    }

    /// Copies out the elements in row-major order. Fails if `T` is not the value's data type.
    pub fn to_vec<T: Scalar>(&self) -> Result<Vec<T>, TensorError> {
        T::from_data(&self.data)
            .map(|xs| xs.to_vec())
            .ok_or(TensorError::Cast(self.data_type(), T::DATA_TYPE))
    }

    /// Dynamically typed elements in row-major order.
    pub fn elements(&self) -> Vec<Element> {
        (0..self.len()).filter_map(|index| self.data.get(index)).collect()
    }

    /// Converts every element into `r#type`, following [`Element::cast`].
    #[inline]
    pub fn cast(&self, r#type: DataType) -> Value {
        let shape = self.shape.clone();
        let data = self.data.cast(r#type);
        Self { shape, data }
    }

    /// Reinterprets the row-major elements with another shape of the same size.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Value, TensorError> {
        let shape = shape.into();
        if shape.size() != self.len() {
            return Err(TensorError::ShapeMismatch(self.shape.clone(), shape));
        }
        let data = self.data.clone();
        Ok(Self { shape, data })
    }

    /// Repeats the value along broadcast axes until it has `shape`.
    pub fn broadcast_to(&self, shape: impl Into<Shape>) -> Result<Value, TensorError> {
        let shape = shape.into();
        let layout = Layout::from_shape(self.shape.clone()).broadcast_to(&shape)?;
        let data = self.data.gather(layout.offsets());
        Ok(Self { shape, data })
    }

    /// Resolves the value into a [`Term`]: a scalar if the shape is empty, otherwise itself.
    pub fn into_term(self) -> Term {
        match (self.is_scalar(), self.data.get(0)) {
            (true, Some(x)) => Term::Scalar(x),
            _ => Term::Value(self),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_axis(
            f: &mut fmt::Formatter<'_>,
            shape: &[usize],
            elements: &mut impl Iterator<Item = Element>,
        ) -> fmt::Result {
            let Some((&len, shape)) = shape.split_first() else {
                return match elements.next() {
                    Some(x) => write!(f, "{x}"),
                    None => Ok(()),
                };
            };
            write!(f, "[")?;
            for index in 0..len {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write_axis(f, shape, elements)?;
            }
            write!(f, "]")
        }

        let mut elements = (0..self.len()).filter_map(|index| self.data.get(index));
        write_axis(f, &self.shape, &mut elements)
    }
}

/// Either a [`Value`] or a single [`Element`].
///
/// Indexing and reductions that remove every axis produce scalars. As an operand,
/// a scalar is weakly typed: it adapts to the data type of the value it combines with.
#[derive(Debug, Clone, PartialEq, Display, From)]
pub enum Term {
    Value(Value),
    Scalar(Element),
}

impl From<&Value> for Term {
    #[inline]
    fn from(value: &Value) -> Self {
        Self::Value(value.clone())
    }
}

impl From<Term> for Value {
    #[inline]
    fn from(value: Term) -> Self {
        match value {
            Term::Value(value) => value,
            Term::Scalar(x) => Value::scalar(x),
        }
    }
}

macro_rules! impl_term_from {
    ($($t:ty),+) => {$(
        impl From<$t> for Term {
            #[inline]
            fn from(value: $t) -> Self {
                Self::Scalar(value.into())
            }
        }
    )+};
}

impl_term_from!(bool, u8, u16, u32, u64, i8, i16, i32, i64, f16, bf16, f32, f64);

impl Term {
    #[inline]
    pub fn shape(&self) -> Shape {
        match self {
            Term::Value(value) => value.shape().clone(),
            Term::Scalar(_) => Shape::scalar(),
        }
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        match self {
            Term::Value(value) => value.data_type(),
            Term::Scalar(x) => x.data_type(),
        }
    }

    #[inline]
    pub fn into_value(self) -> Option<Value> {
        match self {
            Term::Value(value) => Some(value),
            Term::Scalar(_) => None,
        }
    }

    #[inline]
    pub fn into_scalar(self) -> Option<Element> {
        match self {
            Term::Value(_) => None,
            Term::Scalar(x) => Some(x),
        }
    }
}
