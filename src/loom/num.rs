use std::{fmt, sync::Arc};

use bytemuck::NoUninit;
use derive_more::{Display, From};
use half::{bf16, f16};
use serde::{Deserialize, Serialize};

use super::value::Data;
use crate::hal::ops::MathOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F16,
    BF16,
    F32,
    F64,
}

impl DataType {
    /// Returns the size of one element in memory, in bytes.
    pub const fn size(self) -> usize {
        match self {
            DataType::Bool | DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 | DataType::F16 | DataType::BF16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::U64 | DataType::I64 | DataType::F64 => 8,
        }
    }

    #[inline]
    pub const fn is_bool(self) -> bool {
        matches!(self, DataType::Bool)
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            DataType::F16 | DataType::BF16 | DataType::F32 | DataType::F64
        )
    }

    /// Returns `true` for integer types. `Bool` is not an integer.
    #[inline]
    pub const fn is_integer(self) -> bool {
        !self.is_bool() && !self.is_float()
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            DataType::I8 | DataType::I16 | DataType::I32 | DataType::I64
        )
    }

    /// Common type both operands of a binary operator are converted to.
    pub fn promote(self, other: Self) -> Self {
        match (self, other) {
            (x, y) if x == y => x,
            (DataType::Bool, x) | (x, DataType::Bool) => x,
            (x, y) if x.is_float() && y.is_float() => match x.size().cmp(&y.size()) {
                std::cmp::Ordering::Greater => x,
                std::cmp::Ordering::Less => y,
                // `F16` and `BF16` have no common 16-bit type
                std::cmp::Ordering::Equal => DataType::F32,
            },
            (x, _) if x.is_float() => x,
            (_, y) if y.is_float() => y,
            (x, y) if x.is_signed() == y.is_signed() => match x.size() >= y.size() {
                true => x,
                false => y,
            },
            (x, y) => {
                let (signed, unsigned) = match x.is_signed() {
                    true => (x, y),
                    false => (y, x),
                };
                match signed.size() > unsigned.size() {
                    true => signed,
                    false => unsigned,
                }
            }
        }
    }

    /// Type of a vector of `self` combined with a weakly typed scalar of `scalar`.
    ///
    /// The vector keeps its type unless the scalar belongs to a wider kind:
    /// float scalars promote integer and boolean vectors to `F32`,
    /// integer scalars promote boolean vectors to `I32`.
    pub fn promote_weak(self, scalar: Self) -> Self {
        match (self, scalar) {
            (x, y) if y.is_float() && !x.is_float() => DataType::F32,
            (DataType::Bool, y) if y.is_integer() => DataType::I32,
            (x, _) => x,
        }
    }

    /// The float type integer operands are promoted to by float-only operators.
    pub fn to_float(self) -> Self {
        match self {
            x if x.is_float() => x,
            x if x.size() >= 8 => DataType::F64,
            _ => DataType::F32,
        }
    }
}

/// Expands `$body` once per data type, with `$T` aliased to the element type of `$t`.
macro_rules! dispatch_type {
    ($t:expr, $T:ident => $body:expr) => {
        match $t {
            $crate::loom::num::DataType::Bool => {
                type $T = bool;
                $body
            }
            $crate::loom::num::DataType::U8 => {
                type $T = u8;
                $body
            }
            $crate::loom::num::DataType::U16 => {
                type $T = u16;
                $body
            }
            $crate::loom::num::DataType::U32 => {
                type $T = u32;
                $body
            }
            $crate::loom::num::DataType::U64 => {
                type $T = u64;
                $body
            }
            $crate::loom::num::DataType::I8 => {
                type $T = i8;
                $body
            }
            $crate::loom::num::DataType::I16 => {
                type $T = i16;
                $body
            }
            $crate::loom::num::DataType::I32 => {
                type $T = i32;
                $body
            }
            $crate::loom::num::DataType::I64 => {
                type $T = i64;
                $body
            }
            $crate::loom::num::DataType::F16 => {
                type $T = ::half::f16;
                $body
            }
            $crate::loom::num::DataType::BF16 => {
                type $T = ::half::bf16;
                $body
            }
            $crate::loom::num::DataType::F32 => {
                type $T = f32;
                $body
            }
            $crate::loom::num::DataType::F64 => {
                type $T = f64;
                $body
            }
        }
    };
}

pub(crate) use dispatch_type;

/// A dynamically typed scalar.
#[derive(Debug, Clone, Copy, PartialEq, Display, From)]
pub enum Element {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F16(f16),
    BF16(bf16),
    F32(f32),
    F64(f64),
}

/// Expands `$body` once per [`Element`] variant, with `$v` bound to the contained scalar.
macro_rules! visit_element {
    ($x:expr, $v:ident => $body:expr) => {
        match $x {
            $crate::loom::num::Element::Bool($v) => $body,
            $crate::loom::num::Element::U8($v) => $body,
            $crate::loom::num::Element::U16($v) => $body,
            $crate::loom::num::Element::U32($v) => $body,
            $crate::loom::num::Element::U64($v) => $body,
            $crate::loom::num::Element::I8($v) => $body,
            $crate::loom::num::Element::I16($v) => $body,
            $crate::loom::num::Element::I32($v) => $body,
            $crate::loom::num::Element::I64($v) => $body,
            $crate::loom::num::Element::F16($v) => $body,
            $crate::loom::num::Element::BF16($v) => $body,
            $crate::loom::num::Element::F32($v) => $body,
            $crate::loom::num::Element::F64($v) => $body,
        }
    };
}

pub(crate) use visit_element;

impl Element {
    #[inline]
    pub fn data_type(self) -> DataType {
        visit_element!(self, x => Scalar::data_type(x))
    }

    /// Converts the scalar into another data type. Integers wrap, floats narrow,
    /// floats saturate into integers (NaN becomes zero), and non-zero values are `true`.
    #[inline]
    pub fn cast(self, r#type: DataType) -> Self {
        dispatch_type!(r#type, U => U::from_element(self).into_element())
    }

    /// Whether the scalar converts into `r#type` and back unchanged.
    #[inline]
    pub fn fits(self, r#type: DataType) -> bool {
        self.cast(r#type).cast(self.data_type()) == self
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        visit_element!(self, x => x.to_f64())
    }

    /// Decodes one element of `r#type` from its native-endian bytes.
    #[inline]
    pub(crate) fn read(r#type: DataType, bytes: &[u8]) -> Self {
        dispatch_type!(r#type, T => T::read(bytes).into_element())
    }
}

/// Converts one scalar type into another, following [`Element::cast`].
#[inline]
pub fn convert<T: Scalar, U: Scalar>(x: T) -> U {
    match T::DATA_TYPE.is_float() {
        true => U::from_f64(x.to_f64()),
        false => U::from_i128(x.to_i128()),
    }
}

pub trait Zero {
    fn zero() -> Self;
}

pub trait One {
    fn one() -> Self;
}

pub trait Scalar:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + NoUninit
    + Zero
    + One
    + Send
    + Sync
    + 'static
    + sealed::Sealed
{
    const DATA_TYPE: DataType;
    /// The smallest value of the type, `-inf` for floats.
    const LOWEST: Self;
    /// The largest value of the type, `inf` for floats.
    const HIGHEST: Self;

    fn into_element(self) -> Element;
    fn into_data(data: Arc<[Self]>) -> Data;
    fn from_data(data: &Data) -> Option<&[Self]>;

    fn to_f64(self) -> f64;
    fn to_i128(self) -> i128;
    fn from_f64(x: f64) -> Self;
    fn from_i128(x: i128) -> Self;

    /// Decodes one element from exactly [`DataType::size`] native-endian bytes.
    fn read(bytes: &[u8]) -> Self;

    /// Encodes the element into exactly [`DataType::size`] native-endian bytes.
    #[inline]
    fn write(self, bytes: &mut [u8]) {
        bytes.copy_from_slice(bytemuck::bytes_of(&self))
    }

    #[inline]
    fn data_type(self) -> DataType {
        Self::DATA_TYPE
    }

    #[inline]
    fn from_element(x: Element) -> Self {
        visit_element!(x, v => convert(v))
    }
}

/// Arithmetic kernels shared by integers and floats.
pub trait Number: Scalar {
    /// Addition. Integers wrap on overflow.
    fn plus(self, rhs: Self) -> Self;
    /// Subtraction. Integers wrap on overflow.
    fn minus(self, rhs: Self) -> Self;
    /// Multiplication. Integers wrap on overflow.
    fn times(self, rhs: Self) -> Self;
    /// Division rounding towards negative infinity. `None` on integer division by zero.
    fn floor_div(self, rhs: Self) -> Option<Self>;
    /// Remainder with the sign of the divisor. `None` on integer division by zero.
    fn floor_rem(self, rhs: Self) -> Option<Self>;
    fn negate(self) -> Self;
    fn magnitude(self) -> Self;
    /// Maximum of two values. Propagates NaN.
    fn larger(self, rhs: Self) -> Self;
    /// Minimum of two values. Propagates NaN.
    fn smaller(self, rhs: Self) -> Self;
}

/// Bitwise kernels of integers and booleans.
pub trait Integer: Scalar {
    fn bit_and(self, rhs: Self) -> Self;
    fn bit_or(self, rhs: Self) -> Self;
    fn bit_xor(self, rhs: Self) -> Self;
    fn bit_not(self) -> Self;
}

/// Kernels only floats define.
pub trait Float: Number {
    /// IEEE 754 division: division by zero yields signed infinity or NaN.
    fn divide(self, rhs: Self) -> Self;
    /// Applies an element-wise math function. Domain errors yield NaN.
    fn math(self, op: MathOp) -> Self;
}

impl Zero for bool {
    fn zero() -> Self {
        false
    }
}

impl One for bool {
    fn one() -> Self {
        true
    }
}

impl Scalar for bool {
    const DATA_TYPE: DataType = DataType::Bool;
    const LOWEST: Self = false;
    const HIGHEST: Self = true;

    #[inline]
    fn into_element(self) -> Element {
        Element::Bool(self)
    }

    #[inline]
    fn into_data(data: Arc<[Self]>) -> Data {
        Data::Bool(data)
    }

    #[inline]
    fn from_data(data: &Data) -> Option<&[Self]> {
        match data {
            Data::Bool(data) => Some(data),
            _ => None,
        }
    }

    #[inline]
    fn to_f64(self) -> f64 {
        u8::from(self) as f64
    }

    #[inline]
    fn to_i128(self) -> i128 {
        self as i128
    }

    #[inline]
    fn from_f64(x: f64) -> Self {
        x != 0.0
    }

    #[inline]
    fn from_i128(x: i128) -> Self {
        x != 0
    }

    #[inline]
    fn read(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

macro_rules! impl_scalar {
    ($($t:ty => $variant:ident),+ $(,)?) => {$(
        impl Scalar for $t {
            const DATA_TYPE: DataType = DataType::$variant;
            const LOWEST: Self = <$t>::MIN;
            const HIGHEST: Self = <$t>::MAX;

            #[inline]
            fn into_element(self) -> Element {
                Element::$variant(self)
            }

            #[inline]
            fn into_data(data: Arc<[Self]>) -> Data {
                Data::$variant(data)
            }

            #[inline]
            fn from_data(data: &Data) -> Option<&[Self]> {
                match data {
                    Data::$variant(data) => Some(data),
                    _ => None,
                }
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }

            #[inline]
            fn from_f64(x: f64) -> Self {
                x as $t
            }

            #[inline]
            fn from_i128(x: i128) -> Self {
                x as $t
            }

            #[inline]
            fn read(bytes: &[u8]) -> Self {
                bytemuck::pod_read_unaligned(bytes)
            }
        }
    )+};
}

macro_rules! impl_int {
    ($($t:ty),+) => {$(
        impl Zero for $t {
            fn zero() -> Self {
                0
            }
        }

        impl One for $t {
            fn one() -> Self {
                1
            }
        }

        impl Integer for $t {
            #[inline]
            fn bit_and(self, rhs: Self) -> Self {
                self & rhs
            }

            #[inline]
            fn bit_or(self, rhs: Self) -> Self {
                self | rhs
            }

            #[inline]
            fn bit_xor(self, rhs: Self) -> Self {
                self ^ rhs
            }

            #[inline]
            fn bit_not(self) -> Self {
                !self
            }
        }
    )+};
}

macro_rules! impl_signed {
    ($($t:ty),+) => {$(
        impl Number for $t {
            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn minus(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline]
            fn times(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }

            #[inline]
            fn floor_div(self, rhs: Self) -> Option<Self> {
                if rhs == 0 {
                    return None;
                }
                let (q, r) = (self.wrapping_div(rhs), self.wrapping_rem(rhs));
                match r != 0 && (r < 0) != (rhs < 0) {
                    true => Some(q.wrapping_sub(1)),
                    false => Some(q),
                }
            }

            #[inline]
            fn floor_rem(self, rhs: Self) -> Option<Self> {
                if rhs == 0 {
                    return None;
                }
                let r = self.wrapping_rem(rhs);
                match r != 0 && (r < 0) != (rhs < 0) {
                    true => Some(r.wrapping_add(rhs)),
                    false => Some(r),
                }
            }

            #[inline]
            fn negate(self) -> Self {
                self.wrapping_neg()
            }

            #[inline]
            fn magnitude(self) -> Self {
                self.wrapping_abs()
            }

            #[inline]
            fn larger(self, rhs: Self) -> Self {
                Ord::max(self, rhs)
            }

            #[inline]
            fn smaller(self, rhs: Self) -> Self {
                Ord::min(self, rhs)
            }
        }
    )+};
}

macro_rules! impl_unsigned {
    ($($t:ty),+) => {$(
        impl Number for $t {
            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            #[inline]
            fn minus(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline]
            fn times(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }

            #[inline]
            fn floor_div(self, rhs: Self) -> Option<Self> {
                self.checked_div(rhs)
            }

            #[inline]
            fn floor_rem(self, rhs: Self) -> Option<Self> {
                self.checked_rem(rhs)
            }

            #[inline]
            fn negate(self) -> Self {
                self.wrapping_neg()
            }

            #[inline]
            fn magnitude(self) -> Self {
                self
            }

            #[inline]
            fn larger(self, rhs: Self) -> Self {
                Ord::max(self, rhs)
            }

            #[inline]
            fn smaller(self, rhs: Self) -> Self {
                Ord::min(self, rhs)
            }
        }
    )+};
}

/// Floored quotient and remainder of two floats, derived from the same `fmod` so that
/// `q * y + r` reproduces `x` up to rounding. Division by zero follows IEEE 754.
macro_rules! float_divmod {
    ($x:expr, $y:expr) => {{
        let (x, y) = ($x, $y);
        let r = x % y;
        match y == 0.0 {
            true => ((x / y).floor(), r),
            false => {
                let q = (x - r) / y;
                let (q, r) = match r != 0.0 && (r < 0.0) != (y < 0.0) {
                    true => (q - 1.0, r + y),
                    false => (q, r),
                };
                let r = match r == 0.0 {
                    true => r.copysign(y),
                    false => r,
                };
                // `q` is within rounding of an integer; snap it to the nearest one
                let q = match q == 0.0 {
                    true => q.copysign(x / y),
                    false => match q - q.floor() > 0.5 {
                        true => q.floor() + 1.0,
                        false => q.floor(),
                    },
                };
                (q, r)
            }
        }
    }};
}

macro_rules! impl_float {
    ($($t:ty => $variant:ident),+) => {$(
        impl Zero for $t {
            fn zero() -> Self {
                0.0
            }
        }

        impl One for $t {
            fn one() -> Self {
                1.0
            }
        }

        impl Scalar for $t {
            const DATA_TYPE: DataType = DataType::$variant;
            const LOWEST: Self = <$t>::NEG_INFINITY;
            const HIGHEST: Self = <$t>::INFINITY;

            #[inline]
            fn into_element(self) -> Element {
                Element::$variant(self)
            }

            #[inline]
            fn into_data(data: Arc<[Self]>) -> Data {
                Data::$variant(data)
            }

            #[inline]
            fn from_data(data: &Data) -> Option<&[Self]> {
                match data {
                    Data::$variant(data) => Some(data),
                    _ => None,
                }
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }

            #[inline]
            fn to_i128(self) -> i128 {
                self as i128
            }

            #[inline]
            fn from_f64(x: f64) -> Self {
                x as $t
            }

            #[inline]
            fn from_i128(x: i128) -> Self {
                x as $t
            }

            #[inline]
            fn read(bytes: &[u8]) -> Self {
                bytemuck::pod_read_unaligned(bytes)
            }
        }

        impl Number for $t {
            #[inline]
            fn plus(self, rhs: Self) -> Self {
                self + rhs
            }

            #[inline]
            fn minus(self, rhs: Self) -> Self {
                self - rhs
            }

            #[inline]
            fn times(self, rhs: Self) -> Self {
                self * rhs
            }

            #[inline]
            fn floor_div(self, rhs: Self) -> Option<Self> {
                Some(float_divmod!(self, rhs).0)
            }

            #[inline]
            fn floor_rem(self, rhs: Self) -> Option<Self> {
                Some(float_divmod!(self, rhs).1)
            }

            #[inline]
            fn negate(self) -> Self {
                -self
            }

            #[inline]
            fn magnitude(self) -> Self {
                self.abs()
            }

            #[inline]
            fn larger(self, rhs: Self) -> Self {
                match self.is_nan() || rhs.is_nan() {
                    true => <$t>::NAN,
                    false => self.max(rhs),
                }
            }

            #[inline]
            fn smaller(self, rhs: Self) -> Self {
                match self.is_nan() || rhs.is_nan() {
                    true => <$t>::NAN,
                    false => self.min(rhs),
                }
            }
        }

        impl Float for $t {
            #[inline]
            fn divide(self, rhs: Self) -> Self {
                self / rhs
            }

            fn math(self, op: MathOp) -> Self {
                match op {
                    MathOp::Sqrt => self.sqrt(),
                    MathOp::Rsqrt => self.sqrt().recip(),
                    MathOp::Exp => self.exp(),
                    MathOp::Exp2 => self.exp2(),
                    MathOp::Log => self.ln(),
                    MathOp::Log2 => self.log2(),
                    MathOp::Sin => self.sin(),
                    MathOp::Cos => self.cos(),
                    MathOp::Tanh => self.tanh(),
                    MathOp::Floor => self.floor(),
                    MathOp::Ceil => self.ceil(),
                    MathOp::Sigmoid => (1.0 + (-self).exp()).recip(),
                }
            }
        }
    )+};
}

/// Half-precision floats compute in `f32` and round back.
macro_rules! impl_half {
    ($($t:ty => $variant:ident),+) => {$(
        impl Zero for $t {
            fn zero() -> Self {
                Self::ZERO
            }
        }

        impl One for $t {
            fn one() -> Self {
                Self::ONE
            }
        }

        impl Scalar for $t {
            const DATA_TYPE: DataType = DataType::$variant;
            const LOWEST: Self = <$t>::NEG_INFINITY;
            const HIGHEST: Self = <$t>::INFINITY;

            #[inline]
            fn into_element(self) -> Element {
                Element::$variant(self)
            }

            #[inline]
            fn into_data(data: Arc<[Self]>) -> Data {
                Data::$variant(data)
            }

            #[inline]
            fn from_data(data: &Data) -> Option<&[Self]> {
                match data {
                    Data::$variant(data) => Some(data),
                    _ => None,
                }
            }

            #[inline]
            fn to_f64(self) -> f64 {
                <$t>::to_f64(self)
            }

            #[inline]
            fn to_i128(self) -> i128 {
                <$t>::to_f64(self) as i128
            }

            #[inline]
            fn from_f64(x: f64) -> Self {
                <$t>::from_f64(x)
            }

            #[inline]
            fn from_i128(x: i128) -> Self {
                <$t>::from_f64(x as f64)
            }

            #[inline]
            fn read(bytes: &[u8]) -> Self {
                bytemuck::pod_read_unaligned(bytes)
            }
        }

        impl Number for $t {
            #[inline]
            fn plus(self, rhs: Self) -> Self {
                Self::from_f32(self.to_f32().plus(rhs.to_f32()))
            }

            #[inline]
            fn minus(self, rhs: Self) -> Self {
                Self::from_f32(self.to_f32().minus(rhs.to_f32()))
            }

            #[inline]
            fn times(self, rhs: Self) -> Self {
                Self::from_f32(self.to_f32().times(rhs.to_f32()))
            }

            #[inline]
            fn floor_div(self, rhs: Self) -> Option<Self> {
                self.to_f32().floor_div(rhs.to_f32()).map(Self::from_f32)
            }

            #[inline]
            fn floor_rem(self, rhs: Self) -> Option<Self> {
                self.to_f32().floor_rem(rhs.to_f32()).map(Self::from_f32)
            }

            #[inline]
            fn negate(self) -> Self {
                -self
            }

            #[inline]
            fn magnitude(self) -> Self {
                Self::from_f32(self.to_f32().abs())
            }

            #[inline]
            fn larger(self, rhs: Self) -> Self {
                Self::from_f32(self.to_f32().larger(rhs.to_f32()))
            }

            #[inline]
            fn smaller(self, rhs: Self) -> Self {
                Self::from_f32(self.to_f32().smaller(rhs.to_f32()))
            }
        }

        impl Float for $t {
            #[inline]
            fn divide(self, rhs: Self) -> Self {
                Self::from_f32(self.to_f32() / rhs.to_f32())
            }

            #[inline]
            fn math(self, op: MathOp) -> Self {
                Self::from_f32(self.to_f32().math(op))
            }
        }
    )+};
}

impl Integer for bool {
    #[inline]
    fn bit_and(self, rhs: Self) -> Self {
        self & rhs
    }

    #[inline]
    fn bit_or(self, rhs: Self) -> Self {
        self | rhs
    }

    #[inline]
    fn bit_xor(self, rhs: Self) -> Self {
        self ^ rhs
    }

    #[inline]
    fn bit_not(self) -> Self {
        !self
    }
}

impl_scalar!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
);
impl_int!(u8, u16, u32, u64, i8, i16, i32, i64);
impl_signed!(i8, i16, i32, i64);
impl_unsigned!(u8, u16, u32, u64);
impl_float!(f32 => F32, f64 => F64);
impl_half!(f16 => F16, bf16 => BF16);

mod sealed {
    use half::{bf16, f16};

    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
    impl Sealed for u64 {}
    impl Sealed for i8 {}
    impl Sealed for i16 {}
    impl Sealed for i32 {}
    impl Sealed for i64 {}
    impl Sealed for f16 {}
    impl Sealed for bf16 {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
