use crate::loom::{
    num::Scalar,
    platform,
    tensor::TensorError,
    value::{Data, visit_pair},
};

/// Picks `x[i]` where `cond[i]` holds and `y[i]` elsewhere.
///
/// `x` and `y` must be of the same data type; `offsets` address `cond`, `x` and `y` in turn.
pub fn select(
    cond: &[bool],
    x: &Data,
    y: &Data,
    offsets: [&[usize]; 3],
) -> Result<Data, TensorError> {
    visit_pair!(x, y; [Bool, U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64];
        x, y => Ok(choose(cond, x, y, offsets));
        _ => Err(TensorError::TypeMismatch {
            op: "select",
            data_type: y.data_type(),
        }))
}

fn choose<T: Scalar>(cond: &[bool], x: &[T], y: &[T], offsets: [&[usize]; 3]) -> Data {
    let [co, xo, yo] = offsets;
    let output = platform::map_indexed(co.len(), |index| match cond[co[index]] {
        true => x[xo[index]],
        false => y[yo[index]],
    });
    T::into_data(output.into())
}
