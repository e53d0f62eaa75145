//! The `loom` module provides the foundational abstractions for register-resident tensor values.
//!
//! ## Key Components
//! 1. **Numerical System**:
//!    - Data types (`DataType`) and dynamically typed scalars (`Element`).
//!    - Sealed element traits (`Scalar`, `Number`, `Integer`, `Float`) with per-type kernels.
//!
//! 2. **Layouts**:
//!    - Shapes, strides and offsets (`Layout`), broadcasting and row-major traversal.
//!    - Index specifications (`Slice`) shared by values and memory views.
//!
//! 3. **Memory Bridge**:
//!    - Borrowed views (`TensorRef`, `TensorMut`) over caller-owned buffers.
//!    - A register file (`RegisterFile`) that loads views into values and stores them back.
//!
//! 4. **Values**:
//!    - Immutable values (`Value`) and value-or-scalar results (`Term`).

pub mod layout;
pub mod num;
pub mod platform;
pub mod registers;
pub mod slice;
pub mod tensor;
pub mod value;
