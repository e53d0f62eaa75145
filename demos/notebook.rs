use std::error::Error;

use vreg::{DataType, Mode, ReduceOp, RegisterFile, TensorMut, TensorRef, Value};

fn main() -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "trace")]
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let registers = RegisterFile::new();

    // load a 4x2x3 block, compute on it in registers, and store the result back
    let data: Vec<f32> = (0..24).map(|x| x as f32).collect();
    let mut output = vec![0.0f32; 24];
    let x = registers.load(&TensorRef::new(&data, [4, 2, 3])?)?;
    let y = (&x * 2.0f32 + 1.0f32).sqrt()?;
    registers.store(&mut TensorMut::new(&mut output, [4, 2, 3])?, &y)?;
    println!("sqrt(2x + 1) = {y}");
    println!("stored: {output:?}");

    // indexing keeps ranges, removes single positions, and yields a scalar once every axis is gone
    println!("x[:, 1, :] = {}", x.index((.., 1, ..))?);
    println!("x[1, 1, 1] = {}", x.index((1, 1, 1))?);

    // comparisons produce booleans, bitwise operators need integers
    let a = Value::from_vec([3], vec![1i32, 2, 3])?;
    let b = Value::from_vec([3], vec![2i32, 1, 4])?;
    println!("{a} > {b} = {}", a.try_gt(&b)?);
    println!("{a} ^ {b} = {}", &a ^ &b);
    match a.cast(DataType::F32).try_xor(&b) {
        Ok(value) => println!("unexpected: {value}"),
        Err(err) => println!("xor on floats: {err}"),
    }

    // floor division and modulo follow the divisor's sign
    let c = Value::from_vec([4], vec![7i32, -7, 7, -7])?;
    let d = Value::from_vec([4], vec![2i32, 2, -2, -2])?;
    println!("{c} // {d} = {}", c.try_floor_div(&d)?);
    println!("{c} % {d} = {}", &c % &d);

    // reductions accumulate in row-major order, starting from `init`
    let m = Value::from_vec([2, 3], vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])?;
    println!("sum = {}", m.reduce(ReduceOp::Add, 0.0f32, [Mode::Reduce, Mode::Reduce])?);
    println!("row sums = {}", m.reduce(ReduceOp::Add, 0.0f32, [Mode::Keep, Mode::Reduce])?);
    println!("column sums + 1 = {}", m.reduce(ReduceOp::Add, 1.0f32, [Mode::Reduce, Mode::Keep])?);
    println!("max = {}", m.max(None)?);

    // stores convert to the destination's data type
    let mut bytes = vec![0u8; 6];
    registers.store(&mut TensorMut::new(&mut bytes, [2, 3])?, &(&m * 50.0f32))?;
    println!("as u8: {bytes:?}");

    Ok(())
}
