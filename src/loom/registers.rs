use serde::{Deserialize, Serialize};

use super::{
    layout::Layout,
    tensor::{TensorError, TensorMut, TensorRef},
    value::Value,
};

/// Default number of elements a single load may materialize.
pub const MAX_CAPACITY: usize = 1 << 20;

/// How [`RegisterFile::store`] treats a value whose data type differs from the destination's.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastPolicy {
    /// Converts with wrap-around, narrowing and saturation.
    /// Only conversions into `Bool` are refused.
    #[default]
    Lossy,
    /// Refuses any conversion.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of elements a single load may materialize.
    pub capacity: usize,
    pub cast: CastPolicy,
}

impl Default for Config {
    fn default() -> Self {
        let cast = match cfg!(feature = "strict") {
            true => CastPolicy::Strict,
            false => CastPolicy::Lossy,
        };
        Self {
            capacity: MAX_CAPACITY,
            cast,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RegisterFileBuilder {
    pub config: Config,
}

impl RegisterFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    pub fn cast(mut self, cast: CastPolicy) -> Self {
        self.config.cast = cast;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<RegisterFile, TensorError> {
        if self.config.capacity == 0 {
            return Err(TensorError::Config("register capacity must be positive"));
        }
        log::debug!(
            "register file: capacity {}, cast policy {:?}",
            self.config.capacity,
            self.config.cast
        );
        let config = self.config;
        Ok(RegisterFile { config })
    }
}

/// The bridge between addressable tensors and register-resident [`Value`]s.
#[derive(Debug, Default, Clone)]
pub struct RegisterFile {
    config: Config,
}

impl RegisterFile {
    /// A register file with the default [`Config`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn from_config(config: Config) -> Result<Self, TensorError> {
        RegisterFileBuilder::new().config(config).build()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Materializes every element of `tensor` in row-major order of its logical shape.
    ///
    /// Fails with [`TensorError::CapacityExceeded`] if the tensor holds more elements than
    /// the configured capacity. The tensor itself is never modified.
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub fn load(&self, tensor: &TensorRef) -> Result<Value, TensorError> {
        let size = tensor.shape().size();
        if size > self.capacity() {
            return Err(TensorError::CapacityExceeded(size, self.capacity()));
        }
        log::trace!("load {} {}", tensor.data_type(), tensor.layout());
        let data = tensor.gather();
        Ok(Value::from_parts(tensor.shape().clone(), data))
    }

    /// Writes `value` into `tensor` in row-major order of the tensor's logical shape.
    ///
    /// The value's shape must broadcast to the tensor's; a scalar fills the whole tensor.
    /// Data types are converted according to the configured [`CastPolicy`].
    /// Nothing is written if the store fails.
    #[cfg_attr(feature = "trace", tracing::instrument(skip_all))]
    pub fn store(&self, tensor: &mut TensorMut, value: &Value) -> Result<(), TensorError> {
        let source = Layout::from_shape(value.shape().clone()).broadcast_to(tensor.shape())?;

        let (from, to) = (value.data_type(), tensor.data_type());
        let data = match (self.config.cast, from, to) {
            (_, from, to) if from == to => value.data().clone(),
            (CastPolicy::Strict, from, to) => return Err(TensorError::Cast(from, to)),
            (CastPolicy::Lossy, from, to) if to.is_bool() => {
                return Err(TensorError::Cast(from, to));
            }
            (CastPolicy::Lossy, _, to) => value.data().cast(to),
        };

        log::trace!("store {} {} into {}", from, value.shape(), tensor.layout());
        tensor.scatter(&data, source.offsets());
        Ok(())
    }
}
