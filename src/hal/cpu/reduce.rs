use crate::{
    hal::ops::ReduceOp,
    loom::{
        num::{Element, Number},
        platform,
        tensor::TensorError,
        value::{Data, visit},
    },
};

/// Folds `x` along the reduced axes.
///
/// For every output element `i`, combines `init` with `x[outer[i] + j]` for each `j` in
/// `inner`, in order. `init` must already be of the data type of `x`.
pub fn reduce(
    op: ReduceOp,
    x: &Data,
    init: Element,
    outer: &[usize],
    inner: &[usize],
) -> Result<Data, TensorError> {
    visit!(x; [U8, U16, U32, U64, I8, I16, I32, I64, F16, BF16, F32, F64];
        x => Ok(fold(op, x, init, outer, inner));
        _ => Err(TensorError::TypeMismatch {
            op: "reduce",
            data_type: x.data_type(),
        }))
}

fn fold<T: Number>(op: ReduceOp, x: &[T], init: Element, outer: &[usize], inner: &[usize]) -> Data {
    let init = T::from_element(init);
    let combine = |acc: T, x: T| match op {
        ReduceOp::Add => acc.plus(x),
        ReduceOp::Mul => acc.times(x),
        ReduceOp::Max => acc.larger(x),
        ReduceOp::Min => acc.smaller(x),
    };
    let output = platform::map_indexed(outer.len(), |index| {
        let base = outer[index];
        inner
            .iter()
            .fold(init, |acc, &offset| combine(acc, x[base + offset]))
    });
    T::into_data(output.into())
}
