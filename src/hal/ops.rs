use std::{fmt, sync::Arc};

use derive_more::{Deref, Display, From, Into};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::loom::{
    num::{DataType, Element, One, Scalar, Zero, dispatch_type},
    tensor::TensorError,
};

/// Element-wise operators of two operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// True division.
    Div,
    /// Division rounding towards negative infinity.
    FloorDiv,
    /// Remainder of [`BinaryOp::FloorDiv`]; takes the sign of the divisor.
    Rem,
    Maximum,
    Minimum,
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub const fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::FloorDiv => "floor_div",
            BinaryOp::Rem => "rem",
            BinaryOp::Maximum => "maximum",
            BinaryOp::Minimum => "minimum",
            BinaryOp::Gt => "gt",
            BinaryOp::Ge => "ge",
            BinaryOp::Lt => "lt",
            BinaryOp::Le => "le",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }

    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    #[inline]
    pub const fn is_bitwise(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }

    /// The data type the kernel runs in, given the promoted type of both operands.
    pub fn operand_type(self, r#type: DataType) -> Result<DataType, TensorError> {
        let op = self.name();
        match self {
            _ if self.is_comparison() => Ok(r#type),
            _ if self.is_bitwise() && r#type.is_float() => Err(TensorError::TypeMismatch {
                op,
                data_type: r#type,
            }),
            _ if self.is_bitwise() => Ok(r#type),
            BinaryOp::Div => Ok(r#type.to_float()),
            _ if r#type.is_bool() => Ok(DataType::I32),
            _ => Ok(r#type),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Element-wise functions defined on floats only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MathOp {
    Sqrt,
    /// Reciprocal square root.
    Rsqrt,
    Exp,
    Exp2,
    /// Natural logarithm.
    Log,
    Log2,
    Sin,
    Cos,
    Tanh,
    Floor,
    Ceil,
    Sigmoid,
}

impl MathOp {
    pub const fn name(self) -> &'static str {
        match self {
            MathOp::Sqrt => "sqrt",
            MathOp::Rsqrt => "rsqrt",
            MathOp::Exp => "exp",
            MathOp::Exp2 => "exp2",
            MathOp::Log => "log",
            MathOp::Log2 => "log2",
            MathOp::Sin => "sin",
            MathOp::Cos => "cos",
            MathOp::Tanh => "tanh",
            MathOp::Floor => "floor",
            MathOp::Ceil => "ceil",
            MathOp::Sigmoid => "sigmoid",
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Element-wise operators of one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    #[display("neg")]
    Neg,
    /// Logical negation of booleans, bitwise complement of integers.
    #[display("not")]
    Not,
    #[display("abs")]
    Abs,
    #[display("{_0}")]
    Math(MathOp),
}

impl From<MathOp> for UnaryOp {
    #[inline]
    fn from(value: MathOp) -> Self {
        Self::Math(value)
    }
}

impl UnaryOp {
    pub const fn name(self) -> &'static str {
        match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Not => "not",
            UnaryOp::Abs => "abs",
            UnaryOp::Math(op) => op.name(),
        }
    }

    /// The data type the kernel runs in, given the type of the operand.
    pub fn operand_type(self, r#type: DataType) -> Result<DataType, TensorError> {
        let op = self.name();
        let error = || TensorError::TypeMismatch {
            op,
            data_type: r#type,
        };
        match self {
            UnaryOp::Neg | UnaryOp::Abs if r#type.is_bool() => Err(error()),
            UnaryOp::Not if r#type.is_float() => Err(error()),
            UnaryOp::Math(_) => Ok(r#type.to_float()),
            _ => Ok(r#type),
        }
    }
}

/// Operators combining elements along reduced axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceOp {
    #[display("add")]
    Add,
    #[display("mul")]
    Mul,
    #[display("max")]
    Max,
    #[display("min")]
    Min,
}

impl ReduceOp {
    /// The value that leaves every element unchanged when combined with it.
    pub fn identity(self, r#type: DataType) -> Element {
        dispatch_type!(r#type, T => match self {
            ReduceOp::Add => T::zero().into_element(),
            ReduceOp::Mul => T::one().into_element(),
            ReduceOp::Max => T::LOWEST.into_element(),
            ReduceOp::Min => T::HIGHEST.into_element(),
        })
    }
}

/// Whether a reduction keeps or collapses an axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    #[display("keep")]
    Keep,
    #[display("reduce")]
    Reduce,
}

/// A reduction profile: one [`Mode`] per axis of the reduced value.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Deref, From, Into, Display)]
#[display("[{}]", _0.iter().format(", "))]
pub struct Profile(Arc<[Mode]>);

impl From<Vec<Mode>> for Profile {
    #[inline]
    fn from(value: Vec<Mode>) -> Self {
        Self(value.into())
    }
}

impl<const N: usize> From<[Mode; N]> for Profile {
    #[inline]
    fn from(value: [Mode; N]) -> Self {
        Self(value.into())
    }
}

impl Profile {
    pub fn from_fn(rank: usize, f: impl Fn(usize) -> Mode) -> Self {
        (0..rank).map(f).collect_vec().into()
    }

    /// Keeps all `rank` axes.
    #[inline]
    pub fn keep(rank: usize) -> Self {
        Self::from(vec![Mode::Keep; rank])
    }

    /// Collapses all `rank` axes.
    #[inline]
    pub fn reduce(rank: usize) -> Self {
        Self::from(vec![Mode::Reduce; rank])
    }

    /// Collapses only `axis` out of `rank` axes.
    #[inline]
    pub fn reduce_axis(rank: usize, axis: usize) -> Self {
        Self::from_fn(rank, |index| match index == axis {
            true => Mode::Reduce,
            false => Mode::Keep,
        })
    }

    #[inline]
    pub fn is_reduced(&self, axis: usize) -> bool {
        matches!(self.get(axis), Some(Mode::Reduce))
    }
}
