/// Evaluates `f` at every index of `0..len` and collects the results in order.
///
/// With the `rayon` feature the indices are evaluated in parallel.
#[cfg(not(feature = "rayon"))]
#[inline]
pub fn map_indexed<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
{
    (0..len).map(f).collect()
}

#[cfg(feature = "rayon")]
#[inline]
pub fn map_indexed<T, F>(len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Send + Sync,
{
    use rayon::prelude::*;
    (0..len).into_par_iter().map(f).collect()
}

/// Like [`map_indexed`], but fails if any index fails.
///
/// Sequentially this is the error of the lowest failing index. With the `rayon` feature it is
/// the error of whichever failing index is evaluated first, and evaluation stops early.
#[cfg(not(feature = "rayon"))]
#[inline]
pub fn try_map_indexed<T, E, F>(len: usize, f: F) -> Result<Vec<T>, E>
where
    T: Send,
    E: Send,
    F: Fn(usize) -> Result<T, E> + Send + Sync,
{
    (0..len).map(f).collect()
}

#[cfg(feature = "rayon")]
#[inline]
pub fn try_map_indexed<T, E, F>(len: usize, f: F) -> Result<Vec<T>, E>
where
    T: Send,
    E: Send,
    F: Fn(usize) -> Result<T, E> + Send + Sync,
{
    use rayon::prelude::*;
    (0..len).into_par_iter().map(f).collect()
}
