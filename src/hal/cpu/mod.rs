//! Element kernels over the typed storage of values.
//!
//! Kernels read their operands through precomputed element offsets, so broadcasting and
//! strided reads share one code path. Every output element is computed independently;
//! with the `rayon` feature they are computed in parallel.

use crate::loom::{
    layout::{Layout, Shape},
    num::Scalar,
    platform,
    tensor::TensorError,
    value::Data,
};

pub mod binary;
pub mod reduce;
pub mod select;
pub mod unary;

/// Offsets into a contiguous value of shape `from` for every element of `to`, in row-major order.
pub(crate) fn broadcast_offsets(from: &Shape, to: &Shape) -> Result<Vec<usize>, TensorError> {
    let layout = Layout::from_shape(from.clone()).broadcast_to(to)?;
    Ok(layout.offsets().collect())
}

#[inline]
pub(crate) fn map<T, U, F>(x: &[T], f: F) -> Data
where
    T: Scalar,
    U: Scalar,
    F: Fn(T) -> U + Send + Sync,
{
    let output = platform::map_indexed(x.len(), |index| f(x[index]));
    U::into_data(output.into())
}

#[inline]
pub(crate) fn zip_map<T, U, F>(x: &[T], y: &[T], offsets: [&[usize]; 2], f: F) -> Data
where
    T: Scalar,
    U: Scalar,
    F: Fn(T, T) -> U + Send + Sync,
{
    let [xo, yo] = offsets;
    let output = platform::map_indexed(xo.len(), |index| f(x[xo[index]], y[yo[index]]));
    U::into_data(output.into())
}

#[inline]
pub(crate) fn try_zip_map<T, U, F>(
    x: &[T],
    y: &[T],
    offsets: [&[usize]; 2],
    f: F,
) -> Result<Data, TensorError>
where
    T: Scalar,
    U: Scalar,
    F: Fn(T, T) -> Result<U, TensorError> + Send + Sync,
{
    let [xo, yo] = offsets;
    let output = platform::try_map_indexed(xo.len(), |index| f(x[xo[index]], y[yo[index]]))?;
    Ok(U::into_data(output.into()))
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{broadcast_offsets, zip_map};
    use crate::loom::{layout::Shape, num::Scalar};

    #[test]
    fn test_zip_map_broadcast() -> Result<(), Box<dyn Error>> {
        let shape = Shape::from([2, 3]);
        let xo = broadcast_offsets(&Shape::from([2, 1]), &shape)?;
        let yo = broadcast_offsets(&Shape::from([3]), &shape)?;

        let x = [10, 20];
        let y = [1, 2, 3];
        let output = zip_map(&x, &y, [&xo, &yo], |a: i32, b| a + b);
        assert_eq!(i32::from_data(&output), Some(&[11, 12, 13, 21, 22, 23][..]));
        Ok(())
    }
}
