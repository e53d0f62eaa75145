use super::map;
use crate::{
    hal::ops::UnaryOp,
    loom::{
        num::{Float, Integer, Number},
        tensor::TensorError,
        value::{Data, visit},
    },
};

/// Applies `op` to every element. The operand must already be of the op's operand type.
pub fn unary(op: UnaryOp, x: &Data) -> Result<Data, TensorError> {
    let mismatch = || TensorError::TypeMismatch {
        op: op.name(),
        data_type: x.data_type(),
    };
    match op {
        UnaryOp::Neg => visit!(x; [U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64];
            x => Ok(map(x, |a| a.negate()));
            _ => Err(mismatch())),
        UnaryOp::Abs => visit!(x; [U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64];
            x => Ok(map(x, |a| a.magnitude()));
            _ => Err(mismatch())),
        UnaryOp::Not => visit!(x; [Bool, U8, U16, U32, U64, I8, I16, I32, I64];
            x => Ok(map(x, |a| a.bit_not()));
            _ => Err(mismatch())),
        UnaryOp::Math(op) => visit!(x; [F16, BF16, F32, F64];
            x => Ok(map(x, |a| a.math(op)));
            _ => Err(mismatch())),
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use half::f16;

    use super::unary;
    use crate::{
        hal::ops::{MathOp, UnaryOp},
        loom::{num::Scalar, tensor::TensorError, value::Data},
    };

    #[test]
    fn test_unary() -> Result<(), Box<dyn Error>> {
        let x = Data::from(vec![1u8, 0, 255]);
        assert_eq!(unary(UnaryOp::Neg, &x)?, Data::from(vec![255u8, 0, 1]));
        assert_eq!(unary(UnaryOp::Not, &x)?, Data::from(vec![254u8, 255, 0]));

        let x = Data::from(vec![-4i8, i8::MIN]);
        assert_eq!(unary(UnaryOp::Abs, &x)?, Data::from(vec![4i8, i8::MIN]));

        let x = Data::from(vec![true, false]);
        assert_eq!(unary(UnaryOp::Not, &x)?, Data::from(vec![false, true]));
        assert!(matches!(
            unary(UnaryOp::Neg, &x),
            Err(TensorError::TypeMismatch { op: "neg", .. })
        ));
        Ok(())
    }

    #[test]
    fn test_math() -> Result<(), Box<dyn Error>> {
        let x = Data::from(vec![4.0f32, -1.0, 0.0]);
        let output = unary(MathOp::Sqrt.into(), &x)?;
        let output = f32::from_data(&output).ok_or("not f32")?;
        assert_eq!(output[0], 2.0);
        assert!(output[1].is_nan());
        assert_eq!(output[2], 0.0);

        let x = Data::from(vec![f16::from_f32(3.0)]);
        let output = unary(MathOp::Exp2.into(), &x)?;
        assert_eq!(output, Data::from(vec![f16::from_f32(8.0)]));

        let output = unary(MathOp::Sigmoid.into(), &Data::from(vec![0.0f64]))?;
        assert_eq!(output, Data::from(vec![0.5f64]));

        assert!(unary(MathOp::Sin.into(), &Data::from(vec![1i32])).is_err());
        Ok(())
    }
}
