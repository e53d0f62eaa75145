use itertools::Itertools;

use super::{
    cpu,
    ops::{BinaryOp, MathOp, Profile, ReduceOp, UnaryOp},
};
use crate::loom::{
    layout::Layout,
    num::{DataType, Element, Scalar},
    slice::Slice,
    tensor::TensorError,
    value::{Term, Value},
};

/// Data type two operands are converted to before they are combined.
///
/// A scalar operand is weakly typed and adapts to the value it is combined with.
fn promote(x: &Term, y: &Term) -> Result<DataType, TensorError> {
    match (x, y) {
        (Term::Value(x), &Term::Scalar(y)) | (&Term::Scalar(y), Term::Value(x)) => {
            promote_scalar(x.data_type(), y)
        }
        (x, y) => Ok(x.data_type().promote(y.data_type())),
    }
}

/// Data type a value of `r#type` and a weakly typed `scalar` are converted to.
///
/// An integer scalar only adapts to an integer type that holds it. Otherwise both promote
/// as if the scalar were a value of its own type, and fail if that type cannot hold it either.
fn promote_scalar(r#type: DataType, scalar: Element) -> Result<DataType, TensorError> {
    let weak = r#type.promote_weak(scalar.data_type());
    if weak.is_float() || scalar.fits(weak) {
        return Ok(weak);
    }
    let strong = r#type.promote(scalar.data_type());
    match scalar.fits(strong) {
        true => Ok(strong),
        false => Err(TensorError::Overflow(scalar, r#type)),
    }
}

macro_rules! impl_binary_fn {
    ($($(#[$attr:meta])* $name:ident => $op:ident),+ $(,)?) => {$(
        $(#[$attr])*
        #[inline]
        pub fn $name(&self, rhs: impl Into<Term>) -> Result<Value, TensorError> {
            self.binary(BinaryOp::$op, rhs)
        }
    )+};
}

macro_rules! impl_math_fn {
    ($($name:ident => $op:ident),+ $(,)?) => {$(
        #[inline]
        pub fn $name(&self) -> Result<Value, TensorError> {
            self.unary(MathOp::$op)
        }
    )+};
}

impl Value {
    /// # Element-wise Binary Operator (`binary`)
    /// Combines two operands element by element.
    ///
    /// ## Arguments
    /// * `self` - The first operand.
    /// * `rhs` - The second operand: a value, or a weakly typed scalar.
    ///
    /// ## Returns
    /// * `Result<Value, TensorError>` - A new value of the broadcast shape of both operands.
    ///   Comparisons yield `Bool` values; other operators yield the promoted data type.
    ///   Fails if the shapes do not broadcast, if the operator is not defined on the
    ///   promoted data type, or on integer division by zero.
    pub fn binary(&self, op: BinaryOp, rhs: impl Into<Term>) -> Result<Value, TensorError> {
        let lhs = Term::from(self);
        let rhs = rhs.into();
        let r#type = op.operand_type(promote(&lhs, &rhs)?)?;
        let rhs = Value::from(rhs);

        let shape = self.shape().broadcast(rhs.shape())?;
        let xo = cpu::broadcast_offsets(self.shape(), &shape)?;
        let yo = cpu::broadcast_offsets(rhs.shape(), &shape)?;

        let x = self.data().cast(r#type);
        let y = rhs.data().cast(r#type);
        let data = cpu::binary::binary(op, &x, &y, [&xo, &yo])?;
        Ok(Value::from_parts(shape, data))
    }

    impl_binary_fn!(
        try_add => Add,
        try_sub => Sub,
        try_mul => Mul,
        /// True division. Integer and boolean operands promote to floats.
        try_div => Div,
        /// Division rounding towards negative infinity.
        try_floor_div => FloorDiv,
        /// Remainder of [`Value::try_floor_div`], with the sign of the divisor.
        try_rem => Rem,
        try_maximum => Maximum,
        try_minimum => Minimum,
        try_gt => Gt,
        try_ge => Ge,
        try_lt => Lt,
        try_le => Le,
        try_eq => Eq,
        try_ne => Ne,
        try_and => And,
        try_or => Or,
        try_xor => Xor,
    );

    /// Applies an element-wise function, producing a new value of the same shape.
    ///
    /// Math functions convert integer and boolean operands to floats first.
    /// Domain errors produce NaN rather than failing.
    pub fn unary(&self, op: impl Into<UnaryOp>) -> Result<Value, TensorError> {
        let op = op.into();
        let r#type = op.operand_type(self.data_type())?;
        let data = cpu::unary::unary(op, &self.data().cast(r#type))?;
        Ok(Value::from_parts(self.shape().clone(), data))
    }

    #[inline]
    pub fn try_neg(&self) -> Result<Value, TensorError> {
        self.unary(UnaryOp::Neg)
    }

    #[inline]
    pub fn try_not(&self) -> Result<Value, TensorError> {
        self.unary(UnaryOp::Not)
    }

    #[inline]
    pub fn try_abs(&self) -> Result<Value, TensorError> {
        self.unary(UnaryOp::Abs)
    }

    impl_math_fn!(
        sqrt => Sqrt,
        rsqrt => Rsqrt,
        exp => Exp,
        exp2 => Exp2,
        log => Log,
        log2 => Log2,
        sin => Sin,
        cos => Cos,
        tanh => Tanh,
        floor => Floor,
        ceil => Ceil,
        sigmoid => Sigmoid,
    );

    /// # Indexing (`index`)
    /// Extracts a sub-value.
    ///
    /// ## Arguments
    /// * `slice` - One [`Axis`](crate::Axis) per axis of `self`. Single positions remove
    ///   their axis; ranges resize it.
    ///
    /// ## Returns
    /// * `Result<Term, TensorError>` - A scalar if every axis is removed, otherwise a value.
    ///   Fails if the slice has the wrong number of axes or exceeds an extent.
    pub fn index(&self, slice: impl Into<Slice>) -> Result<Term, TensorError> {
        let layout = Layout::from_shape(self.shape().clone()).slice(&slice.into())?;
        let data = self.data().gather(layout.offsets());
        Ok(Value::from_parts(layout.shape().clone(), data).into_term())
    }

    /// # Reduction (`reduce`)
    /// Collapses the axes marked [`Mode::Reduce`](crate::Mode) in `profile`.
    ///
    /// ## Arguments
    /// * `op` - How collapsed elements are combined.
    /// * `init` - The accumulator's initial value, combined as an implicit leading element.
    ///   It is weakly typed like scalar operands.
    /// * `profile` - One mode per axis of `self`.
    ///
    /// ## Returns
    /// * `Result<Term, TensorError>` - A scalar if every axis is reduced, otherwise a value of
    ///   the kept axes in their original order. Elements are accumulated in row-major order.
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub fn reduce(
        &self,
        op: ReduceOp,
        init: impl Into<Element>,
        profile: impl Into<Profile>,
    ) -> Result<Term, TensorError> {
        let init = init.into();
        let profile = profile.into();
        if profile.len() != self.rank() {
            return Err(TensorError::Rank(self.shape().clone(), profile.len()));
        }
        log::trace!("reduce {op} {} over {profile}", self.shape());

        let r#type = match self.data_type() {
            DataType::Bool => DataType::I32,
            r#type => r#type,
        };
        let r#type = promote_scalar(r#type, init)?;

        let layout = Layout::from_shape(self.shape().clone());
        let outer = layout.select(|axis| !profile.is_reduced(axis));
        let inner = layout.select(|axis| profile.is_reduced(axis));
        let data = cpu::reduce::reduce(
            op,
            &self.data().cast(r#type),
            init.cast(r#type),
            &outer.offsets().collect_vec(),
            &inner.offsets().collect_vec(),
        )?;
        Ok(Value::from_parts(outer.shape().clone(), data).into_term())
    }

    /// Reduces one axis, or all axes if `axis` is `None`, seeded with the identity of `op`.
    pub fn reduce_axis(&self, op: ReduceOp, axis: Option<usize>) -> Result<Term, TensorError> {
        let rank = self.rank();
        let profile = match axis {
            None => Profile::reduce(rank),
            Some(axis) if axis < rank => Profile::reduce_axis(rank, axis),
            Some(axis) => return Err(TensorError::Axis(axis, self.shape().clone())),
        };
        let r#type = match self.data_type() {
            DataType::Bool => DataType::I32,
            r#type => r#type,
        };
        self.reduce(op, op.identity(r#type), profile)
    }

    #[inline]
    pub fn sum(&self, axis: Option<usize>) -> Result<Term, TensorError> {
        self.reduce_axis(ReduceOp::Add, axis)
    }

    #[inline]
    pub fn prod(&self, axis: Option<usize>) -> Result<Term, TensorError> {
        self.reduce_axis(ReduceOp::Mul, axis)
    }

    #[inline]
    pub fn max(&self, axis: Option<usize>) -> Result<Term, TensorError> {
        self.reduce_axis(ReduceOp::Max, axis)
    }

    #[inline]
    pub fn min(&self, axis: Option<usize>) -> Result<Term, TensorError> {
        self.reduce_axis(ReduceOp::Min, axis)
    }

    /// Picks elements of `x` where `self` is `true` and of `y` elsewhere.
    ///
    /// `self` must be a `Bool` value. All three operands broadcast together.
    pub fn select(&self, x: impl Into<Term>, y: impl Into<Term>) -> Result<Value, TensorError> {
        let cond = bool::from_data(self.data()).ok_or(TensorError::TypeMismatch {
            op: "select",
            data_type: self.data_type(),
        })?;
        let (x, y) = (x.into(), y.into());
        let r#type = promote(&x, &y)?;
        let (x, y) = (Value::from(x), Value::from(y));

        let shape = self.shape().broadcast(x.shape())?.broadcast(y.shape())?;
        let co = cpu::broadcast_offsets(self.shape(), &shape)?;
        let xo = cpu::broadcast_offsets(x.shape(), &shape)?;
        let yo = cpu::broadcast_offsets(y.shape(), &shape)?;

        let x = x.data().cast(r#type);
        let y = y.data().cast(r#type);
        let data = cpu::select::select(cond, &x, &y, [&co, &xo, &yo])?;
        Ok(Value::from_parts(shape, data))
    }
}

macro_rules! impl_binary_op {
    ($($trait:ident, $method:ident => $f:ident);+ $(;)?) => {$(
        impl<R: Into<Term>> std::ops::$trait<R> for Value {
            type Output = Value;

            fn $method(self, rhs: R) -> Self::Output {
                self.$f(rhs).unwrap_or_else(|err| panic!("{err}"))
            }
        }

        impl<R: Into<Term>> std::ops::$trait<R> for &Value {
            type Output = Value;

            fn $method(self, rhs: R) -> Self::Output {
                self.$f(rhs).unwrap_or_else(|err| panic!("{err}"))
            }
        }
    )+};
}

impl_binary_op!(
    Add, add => try_add;
    Sub, sub => try_sub;
    Mul, mul => try_mul;
    Div, div => try_div;
    Rem, rem => try_rem;
    BitAnd, bitand => try_and;
    BitOr, bitor => try_or;
    BitXor, bitxor => try_xor;
);

macro_rules! impl_unary_op {
    ($($trait:ident, $method:ident => $f:ident);+ $(;)?) => {$(
        impl std::ops::$trait for Value {
            type Output = Value;

            fn $method(self) -> Self::Output {
                self.$f().unwrap_or_else(|err| panic!("{err}"))
            }
        }

        impl std::ops::$trait for &Value {
            type Output = Value;

            fn $method(self) -> Self::Output {
                self.$f().unwrap_or_else(|err| panic!("{err}"))
            }
        }
    )+};
}

impl_unary_op!(
    Neg, neg => try_neg;
    Not, not => try_not;
);

#[cfg(test)]
mod tests {
    use std::error::Error;

    use itertools::Itertools;

    use crate::{
        hal::ops::{Mode, Profile, ReduceOp},
        loom::{
            layout::Shape,
            num::{DataType, Element},
            slice::Axis,
            tensor::TensorError,
            value::{Term, Value},
        },
    };

    fn matrix() -> Result<Value, TensorError> {
        Value::from_vec([2, 3], vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])
    }

    #[test]
    fn test_reduce() -> Result<(), Box<dyn Error>> {
        let x = matrix()?;

        let output = x.reduce(ReduceOp::Add, 0.0f32, Profile::reduce(2))?;
        assert_eq!(output, Term::Scalar(Element::F32(21.0)));

        let output = x.reduce(ReduceOp::Add, 0.0f32, [Mode::Keep, Mode::Reduce])?;
        let output = output.into_value().ok_or("expected a value")?;
        assert_eq!(output.to_vec::<f32>()?, [6.0, 15.0]);

        let output = x.reduce(ReduceOp::Add, 1.0f32, [Mode::Reduce, Mode::Keep])?;
        let output = output.into_value().ok_or("expected a value")?;
        assert_eq!(output.shape(), &Shape::from([3]));
        assert_eq!(output.to_vec::<f32>()?, [6.0, 8.0, 10.0]);

        let x = Value::from_vec([2], vec![3.0f64, 4.0])?;
        let output = x.reduce(ReduceOp::Add, 1.0f64, [Mode::Reduce])?;
        assert_eq!(output, Term::Scalar(Element::F64(8.0)));

        assert!(matches!(
            x.reduce(ReduceOp::Add, 0.0f64, [Mode::Reduce, Mode::Reduce]),
            Err(TensorError::Rank(_, 2))
        ));
        Ok(())
    }

    #[test]
    fn test_reduce_shorthand() -> Result<(), Box<dyn Error>> {
        let x = matrix()?;
        assert_eq!(x.max(None)?, Term::Scalar(Element::F32(6.0)));
        assert_eq!(x.min(Some(0))?.into_value().ok_or("value")?.to_vec::<f32>()?, [1.0, 2.0, 3.0]);
        assert_eq!(x.prod(Some(1))?.into_value().ok_or("value")?.to_vec::<f32>()?, [6.0, 120.0]);
        assert!(matches!(x.sum(Some(2)), Err(TensorError::Axis(2, _))));

        let flags = Value::from_vec([4], vec![true, false, true, true])?;
        assert_eq!(flags.sum(None)?, Term::Scalar(Element::I32(3)));

        let x = Value::from_vec([3], vec![2u8, 200, 100])?;
        assert_eq!(x.sum(None)?, Term::Scalar(Element::U8(46)));
        assert_eq!(x.sum(None)?.data_type(), DataType::U8);
        Ok(())
    }

    #[test]
    fn test_index() -> Result<(), Box<dyn Error>> {
        let x = Value::arange(0, 24).cast(DataType::F32).reshape([4, 2, 3])?;

        let output = x.index((.., 1, ..))?;
        assert_eq!(output.shape(), Shape::from([4, 3]));
        let output = output.into_value().ok_or("expected a value")?;
        assert_eq!(output.to_vec::<f32>()?[..4], [3.0, 4.0, 5.0, 9.0]);

        let flat = x.reshape([24])?;
        assert_eq!(flat.index(10)?, Term::Scalar(Element::F32(10.0)));
        assert_eq!(x.index((1, 1, 1))?, Term::Scalar(Element::F32(10.0)));

        let output = x.index((1..3, Axis::Full, 0))?;
        assert_eq!(output.shape(), Shape::from([2, 2]));

        let r#ref = x.clone();
        assert!(matches!(
            x.index((.., 2, ..)),
            Err(TensorError::OutOfBounds(_, _))
        ));
        assert!(matches!(flat.index(24), Err(TensorError::OutOfBounds(_, _))));
        assert!(matches!(x.index((0, 0)), Err(TensorError::Rank(_, 2))));
        assert_eq!(x, r#ref);
        Ok(())
    }

    #[test]
    fn test_compare() -> Result<(), Box<dyn Error>> {
        let x = Value::from_vec([3], vec![1i32, 2, 3])?;
        let y = Value::from_vec([3], vec![2i32, 1, 4])?;

        let output = x.try_gt(&y)?;
        assert_eq!(output.data_type(), DataType::Bool);
        assert_eq!(output.to_vec::<bool>()?, [false, true, false]);

        assert_eq!(x.try_le(2)?.to_vec::<bool>()?, [true, true, false]);
        assert_eq!(x.try_eq(&y.cast(DataType::F64))?.to_vec::<bool>()?, [false; 3]);
        assert_eq!(x.try_ne(&x)?.to_vec::<bool>()?, [false; 3]);
        Ok(())
    }

    #[test]
    fn test_bitwise() -> Result<(), Box<dyn Error>> {
        let x = Value::from_vec([3], vec![1i32, 2, 3])?;
        let y = Value::from_vec([3], vec![2i32, 2, 4])?;
        assert_eq!((&x ^ &y).to_vec::<i32>()?, [3, 0, 7]);
        assert_eq!((&x & &y).to_vec::<i32>()?, [0, 2, 0]);
        assert_eq!((&x | 8).to_vec::<i32>()?, [9, 10, 11]);
        assert_eq!((!&x).to_vec::<i32>()?, [-2, -3, -4]);

        let x = x.cast(DataType::F32);
        let y = y.cast(DataType::F32);
        let r#ref = (x.clone(), y.clone());
        assert!(matches!(
            x.try_xor(&y),
            Err(TensorError::TypeMismatch { op: "xor", .. })
        ));
        assert!(matches!(
            x.try_not(),
            Err(TensorError::TypeMismatch { op: "not", .. })
        ));
        assert_eq!((x, y), r#ref);
        Ok(())
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn test_bitwise_overload_panics() {
        let x = Value::full([2], 1.0f32);
        let _ = x ^ 1;
    }

    #[test]
    fn test_broadcast() -> Result<(), Box<dyn Error>> {
        let x = Value::from_vec([2, 1], vec![10i64, 20])?;
        let y = Value::from_vec([3], vec![1i64, 2, 3])?;
        let output = x.try_add(&y)?;
        assert_eq!(output.shape(), &Shape::from([2, 3]));
        assert_eq!(output.to_vec::<i64>()?, [11, 12, 13, 21, 22, 23]);

        let z = Value::from_vec([2], vec![1i64, 2])?;
        assert!(matches!(
            y.try_add(&z),
            Err(TensorError::ShapeMismatch(_, _))
        ));
        Ok(())
    }

    #[test]
    fn test_promotion() -> Result<(), Box<dyn Error>> {
        let x = Value::from_vec([2], vec![250u8, 3])?;
        assert_eq!((&x + 10).to_vec::<u8>()?, [4, 13]);
        assert_eq!((&x * 0.5f64).to_vec::<f32>()?, [125.0, 1.5]);

        let y = Value::from_vec([2], vec![-1i16, 1])?;
        assert_eq!(x.try_add(&y)?.to_vec::<i16>()?, [249, 4]);

        let flags = Value::from_vec([2], vec![true, false])?;
        assert_eq!((&flags + true).to_vec::<i32>()?, [2, 1]);
        assert_eq!((&flags + 3).to_vec::<i32>()?, [4, 3]);
        assert!(flags.try_neg().is_err());

        let x = Value::from_vec([2], vec![1i32, 2])?;
        assert_eq!((&x / 2).to_vec::<f32>()?, [0.5, 1.0]);
        let x = Value::from_vec([2], vec![1i64, 2])?;
        assert_eq!((&x / 2).data_type(), DataType::F64);
        Ok(())
    }

    #[test]
    fn test_scalar_out_of_range() -> Result<(), Box<dyn Error>> {
        let x = Value::from_vec([2], vec![200u8, 255])?;
        assert_eq!(x.try_gt(300)?.to_vec::<bool>()?, [false, false]);
        assert_eq!(x.try_lt(300)?.to_vec::<bool>()?, [true, true]);
        assert_eq!(x.try_eq(-1)?.to_vec::<bool>()?, [false, false]);
        assert_eq!(x.try_ne(-1)?.to_vec::<bool>()?, [true, true]);

        let output = Value::from_vec([1], vec![10u8])?.try_floor_div(-1)?;
        assert_eq!(output.data_type(), DataType::I32);
        assert_eq!(output.to_vec::<i32>()?, [-10]);
        assert_eq!((&x - 1).to_vec::<u8>()?, [199, 254]);

        // no type holds both operands
        let x = Value::from_vec([2], vec![5u64, 6])?;
        assert!(matches!(
            x.try_add(-1),
            Err(TensorError::Overflow(Element::I32(-1), DataType::U64))
        ));

        let flags = Value::from_vec([2], vec![true, true])?;
        assert_eq!(flags.try_add(1i64 << 40)?.data_type(), DataType::I64);

        let x = Value::from_vec([3], vec![2u8, 200, 100])?;
        let output = x.reduce(ReduceOp::Add, 1000, [Mode::Reduce])?;
        assert_eq!(output, Term::Scalar(Element::I32(1302)));
        let output = x.reduce(ReduceOp::Max, -1, [Mode::Reduce])?;
        assert_eq!(output, Term::Scalar(Element::I32(200)));
        Ok(())
    }

    #[test]
    fn test_arithmetic_properties() -> Result<(), Box<dyn Error>> {
        let random = |len| (0..len).map(|_| fastrand::f32() * 200.0 - 100.0).collect_vec();
        let a = Value::from_vec([5, 7], random(35))?;
        let b = Value::from_vec([5, 7], random(35))?;

        assert_eq!(&a + &b, &b + &a);
        assert_eq!(&a * &b, &b * &a);
        assert_eq!(&a - &b, -(&b - &a));

        let random = |len| (0..len).map(|_| fastrand::i32(-1000..1000)).collect_vec();
        let a = Value::from_vec([64], random(64))?;
        let divisors = (0..64)
            .map(|_| match fastrand::bool() {
                true => fastrand::i32(1..50),
                false => -fastrand::i32(1..50),
            })
            .collect_vec();
        let b = Value::from_vec([64], divisors)?;
        let q = a.try_floor_div(&b)?;
        let r = a.try_rem(&b)?;
        assert_eq!(&(&q * &b) + &r, a);
        Ok(())
    }

    #[test]
    fn test_negative_division() -> Result<(), Box<dyn Error>> {
        let a = Value::from_vec([4], vec![7i32, -7, 7, -7])?;
        let b = Value::from_vec([4], vec![2i32, 2, -2, -2])?;
        assert_eq!(a.try_floor_div(&b)?.to_vec::<i32>()?, [3, -4, -4, 3]);
        assert_eq!(a.try_rem(&b)?.to_vec::<i32>()?, [1, 1, -1, -1]);

        let a = a.cast(DataType::F64);
        let b = b.cast(DataType::F64);
        assert_eq!(a.try_floor_div(&b)?.to_vec::<f64>()?, [3.0, -4.0, -4.0, 3.0]);
        assert_eq!((&a % &b).to_vec::<f64>()?, [1.0, 1.0, -1.0, -1.0]);

        let a = Value::from_vec([2], vec![5u32, 6])?;
        assert!(matches!(
            a.try_rem(0),
            Err(TensorError::DivisionByZero(DataType::U32))
        ));
        let output = a.cast(DataType::F32).try_floor_div(0)?;
        assert_eq!(output.to_vec::<f32>()?, [f32::INFINITY; 2]);
        Ok(())
    }

    #[test]
    fn test_math() -> Result<(), Box<dyn Error>> {
        let x = Value::from_vec([3], vec![4i32, 0, -1])?;
        let output = x.sqrt()?;
        assert_eq!(output.data_type(), DataType::F32);
        let output = output.to_vec::<f32>()?;
        assert_eq!(output[..2], [2.0, 0.0]);
        assert!(output[2].is_nan());

        let x = Value::from_vec([2], vec![0.0f64, 3.0])?;
        assert_eq!(x.exp2()?.to_vec::<f64>()?, [1.0, 8.0]);
        assert_eq!(x.sin()?.to_vec::<f64>()?[0], 0.0);
        assert_eq!((-&x).try_abs()?, x);
        assert_eq!(x.try_maximum(1.0)?.to_vec::<f64>()?, [1.0, 3.0]);
        assert_eq!(x.try_minimum(1.0)?.to_vec::<f64>()?, [0.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_select() -> Result<(), Box<dyn Error>> {
        let cond = Value::from_vec([2, 1], vec![true, false])?;
        let x = Value::from_vec([3], vec![1.0f32, 2.0, 3.0])?;
        let output = cond.select(&x, 0)?;
        assert_eq!(output.shape(), &Shape::from([2, 3]));
        assert_eq!(output.to_vec::<f32>()?, [1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);

        assert!(matches!(
            x.select(1, 2),
            Err(TensorError::TypeMismatch { op: "select", .. })
        ));
        Ok(())
    }
}
