//! `vreg` models the values a tensor kernel holds in registers.
//!
//! A [`Value`] is produced by loading an addressable tensor through a [`RegisterFile`],
//! combined with other values through element-wise operators, slicing and reductions,
//! and finally stored back to memory. Values are immutable: every operator yields a new one.
//!
//! ```
//! use vreg::{RegisterFile, TensorMut, TensorRef, Value};
//!
//! # fn main() -> Result<(), vreg::TensorError> {
//! let registers = RegisterFile::new();
//! let data: Vec<f32> = (0..6).map(|x| x as f32).collect();
//! let x = registers.load(&TensorRef::new(&data, [2, 3])?)?;
//!
//! let y = (&x + 1.0f32).try_mul(&x)?;
//! let mut output = vec![0.0f32; 6];
//! registers.store(&mut TensorMut::new(&mut output, [2, 3])?, &y)?;
//! assert_eq!(output, [0.0, 2.0, 6.0, 12.0, 20.0, 30.0]);
//! # Ok(())
//! # }
//! ```

pub mod hal;
pub mod loom;

pub use hal::ops::{BinaryOp, MathOp, Mode, Profile, ReduceOp, UnaryOp};
pub use loom::{
    layout::{IntoLayout, Layout, Shape},
    num::{DataType, Element, Scalar},
    registers::{CastPolicy, Config, RegisterFile, RegisterFileBuilder},
    slice::{Axis, Slice},
    tensor::{TensorError, TensorMut, TensorRef},
    value::{Term, Value},
};
