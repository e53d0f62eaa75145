use super::{try_zip_map, zip_map};
use crate::{
    hal::ops::BinaryOp,
    loom::{
        num::{Float, Integer, Number},
        tensor::TensorError,
        value::{Data, visit_pair},
    },
};

/// Applies `op` element-wise. Both operands must already be of the op's operand type.
///
/// `offsets` hold, for each output element, the positions of its operands in `x` and `y`.
pub fn binary(
    op: BinaryOp,
    x: &Data,
    y: &Data,
    offsets: [&[usize]; 2],
) -> Result<Data, TensorError> {
    let r#type = x.data_type();
    let mismatch = || TensorError::TypeMismatch {
        op: op.name(),
        data_type: r#type,
    };
    let division_by_zero = || TensorError::DivisionByZero(r#type);

    macro_rules! number {
        ($f:expr) => {
            visit_pair!(x, y; [U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64];
                x, y => Ok(zip_map(x, y, offsets, $f));
                _ => Err(mismatch()))
        };
    }

    macro_rules! try_number {
        ($f:expr) => {
            visit_pair!(x, y; [U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64];
                x, y => try_zip_map(x, y, offsets, $f);
                _ => Err(mismatch()))
        };
    }

    macro_rules! compare {
        ($f:expr) => {
            visit_pair!(x, y; [Bool, U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64];
                x, y => Ok(zip_map(x, y, offsets, $f));
                _ => Err(mismatch()))
        };
    }

    macro_rules! bitwise {
        ($f:expr) => {
            visit_pair!(x, y; [Bool, U8, U16, U32, U64, I8, I16, I32, I64];
                x, y => Ok(zip_map(x, y, offsets, $f));
                _ => Err(mismatch()))
        };
    }

    match op {
        BinaryOp::Add => number!(|a, b| a.plus(b)),
        BinaryOp::Sub => number!(|a, b| a.minus(b)),
        BinaryOp::Mul => number!(|a, b| a.times(b)),
        BinaryOp::Div => visit_pair!(x, y; [F16, BF16, F32, F64];
            x, y => Ok(zip_map(x, y, offsets, |a, b| a.divide(b)));
            _ => Err(mismatch())),
        BinaryOp::FloorDiv => try_number!(|a, b| a.floor_div(b).ok_or_else(division_by_zero)),
        BinaryOp::Rem => try_number!(|a, b| a.floor_rem(b).ok_or_else(division_by_zero)),
        BinaryOp::Maximum => number!(|a, b| a.larger(b)),
        BinaryOp::Minimum => number!(|a, b| a.smaller(b)),
        BinaryOp::Gt => compare!(|a, b| a > b),
        BinaryOp::Ge => compare!(|a, b| a >= b),
        BinaryOp::Lt => compare!(|a, b| a < b),
        BinaryOp::Le => compare!(|a, b| a <= b),
        BinaryOp::Eq => compare!(|a, b| a == b),
        BinaryOp::Ne => compare!(|a, b| a != b),
        BinaryOp::And => bitwise!(|a, b| a.bit_and(b)),
        BinaryOp::Or => bitwise!(|a, b| a.bit_or(b)),
        BinaryOp::Xor => bitwise!(|a, b| a.bit_xor(b)),
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::binary;
    use crate::{
        hal::ops::BinaryOp,
        loom::{num::DataType, tensor::TensorError, value::Data},
    };

    const IDENTITY: [usize; 4] = [0, 1, 2, 3];

    #[test]
    fn test_division() -> Result<(), Box<dyn Error>> {
        let x = Data::from(vec![7i32, -7, 7, -7]);
        let y = Data::from(vec![2i32, 2, -2, -2]);
        let offsets = [&IDENTITY[..], &IDENTITY[..]];

        let output = binary(BinaryOp::FloorDiv, &x, &y, offsets)?;
        assert_eq!(output, Data::from(vec![3i32, -4, -4, 3]));
        let output = binary(BinaryOp::Rem, &x, &y, offsets)?;
        assert_eq!(output, Data::from(vec![1i32, 1, -1, -1]));

        let y = Data::from(vec![2i32, 0, 1, 1]);
        assert!(matches!(
            binary(BinaryOp::Rem, &x, &y, offsets),
            Err(TensorError::DivisionByZero(DataType::I32))
        ));

        let x = Data::from(vec![1.0f32, -1.0, 0.0, 3.0]);
        let y = Data::from(vec![0.0f32, 0.0, 0.0, 2.0]);
        let output = binary(BinaryOp::Div, &x, &y, offsets)?;
        let Data::F32(output) = output else {
            unreachable!()
        };
        assert_eq!(output[0], f32::INFINITY);
        assert_eq!(output[1], f32::NEG_INFINITY);
        assert!(output[2].is_nan());
        assert_eq!(output[3], 1.5);

        let y = y.cast(DataType::I32);
        assert!(binary(BinaryOp::Div, &y, &y, offsets).is_err());
        Ok(())
    }

    #[test]
    fn test_type_mismatch() {
        let x = Data::from(vec![1.0f64]);
        let offsets = [&IDENTITY[..1], &IDENTITY[..1]];
        assert!(matches!(
            binary(BinaryOp::Xor, &x, &x, offsets),
            Err(TensorError::TypeMismatch { op: "xor", data_type: DataType::F64 })
        ));

        let y = Data::from(vec![1u8]);
        assert!(binary(BinaryOp::Add, &x, &y, offsets).is_err());
    }
}
