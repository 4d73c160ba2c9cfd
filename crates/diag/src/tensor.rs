//! Minimal numeric array type that reports itself to the census
//!
//! Every [`Tensor`] is registered with a [`TensorRegistry`] when it is
//! created. Cloning a `Tensor` hands out another handle to the same object;
//! [`Tensor::reshape`] and [`Tensor::to_device`] create new objects.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::census::GroupKey;
use crate::error::{Result, SystemError};
use crate::registry::{TensorRegistry, Tracked};

/// Where a tensor's storage lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Device {
    /// Host memory
    #[default]
    Cpu,
    /// Accelerator with an ordinal
    Cuda(u32),
    /// Shape-only tensor without storage
    Meta,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Cuda(index) => write!(f, "cuda:{index}"),
            Self::Meta => f.write_str("meta"),
        }
    }
}

impl FromStr for Device {
    type Err = SystemError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "meta" => Ok(Self::Meta),
            "cuda" => Ok(Self::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|index| index.parse().ok())
                .map(Self::Cuda)
                .ok_or_else(|| SystemError::InvalidInput(format!("unknown device '{s}'"))),
        }
    }
}

/// Element type of a tensor
///
/// Ordered by [`name`](DType::name), so census lines sort by the text they print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DType {
    /// 1-byte boolean
    Bool,
    /// Unsigned 8-bit integer
    UInt8,
    /// Signed 8-bit integer
    Int8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// IEEE half precision
    Float16,
    /// Brain floating point
    BFloat16,
    /// IEEE single precision
    Float32,
    /// IEEE double precision
    Float64,
}

impl DType {
    /// Size of one element in bytes
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::UInt8 | Self::Int8 => 1,
            Self::Int16 | Self::Float16 | Self::BFloat16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }

    /// Identifier printed in census lines
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::UInt8 => "uint8",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float16 => "float16",
            Self::BFloat16 => "bfloat16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Whether this is a floating point type
    pub const fn is_floating_point(self) -> bool {
        matches!(
            self,
            Self::Float16 | Self::BFloat16 | Self::Float32 | Self::Float64
        )
    }
}

impl Ord for DType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name().cmp(other.name())
    }
}

impl PartialOrd for DType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = SystemError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "bool" => Self::Bool,
            "uint8" | "u8" => Self::UInt8,
            "int8" | "i8" => Self::Int8,
            "int16" | "i16" | "short" => Self::Int16,
            "int32" | "i32" | "int" => Self::Int32,
            "int64" | "i64" | "long" => Self::Int64,
            "float16" | "f16" | "half" => Self::Float16,
            "bfloat16" | "bf16" => Self::BFloat16,
            "float32" | "f32" | "float" => Self::Float32,
            "float64" | "f64" | "double" => Self::Float64,
            _ => return Err(SystemError::InvalidInput(format!("unknown dtype '{s}'"))),
        })
    }
}

/// Ordered dimension sizes
///
/// Compares lexicographically, so `(2,)` sorts before `(2, 3)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Zero-dimensional shape
    pub const fn scalar() -> Self {
        Self(Vec::new())
    }

    /// Dimension sizes
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Number of elements (1 for a scalar), `None` when it overflows `usize`
    pub fn checked_numel(&self) -> Option<usize> {
        if self.0.contains(&0) {
            return Some(0);
        }
        self.0.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }

    /// Number of elements (1 for a scalar), saturating at `usize::MAX`
    pub fn numel(&self) -> usize {
        self.checked_numel().unwrap_or(usize::MAX)
    }

    /// Bytes needed to hold this shape of `dtype` elements
    pub fn byte_len(&self, dtype: DType) -> Result<usize> {
        self.checked_numel()
            .and_then(|numel| numel.checked_mul(dtype.size()))
            .ok_or_else(|| {
                SystemError::InvalidInput(format!("{dtype} tensor of shape {self} overflows usize"))
            })
    }
}

/// Tuple notation: `()`, `(4,)`, `(2, 3)`
impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("()"),
            [only] => write!(f, "({only},)"),
            [first, rest @ ..] => {
                write!(f, "({first}")?;
                for dim in rest {
                    write!(f, ", {dim}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl FromStr for Shape {
    type Err = SystemError;

    /// Parses `2,3`, `(2, 3)`, `(4,)` or `()`.
    fn from_str(s: &str) -> Result<Self> {
        let body = s.trim().trim_start_matches('(').trim_end_matches(')');
        body.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<usize>()
                    .map_err(|e| SystemError::parse("shape", s, e))
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }
}

/// Host element types a tensor can be built from
pub trait Element: Copy + Send + Sync + 'static {
    /// Matching tensor element type
    const DTYPE: DType;

    /// Append the little-endian encoding of `self`
    fn extend_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                fn extend_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_element! {
    u8 => UInt8,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn extend_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }
}

#[derive(Debug)]
struct Storage {
    bytes: Vec<u8>,
}

/// The tracked object behind one or more [`Tensor`] handles
#[derive(Debug)]
pub(crate) struct TensorObject {
    device: Device,
    dtype: DType,
    shape: Shape,
    storage: Arc<Storage>,
}

impl Tracked for TensorObject {
    fn census_key(&self) -> Option<GroupKey> {
        Some(GroupKey::new(
            self.device.to_string(),
            self.dtype,
            self.shape.clone(),
        ))
    }
}

/// Handle to a registered numeric array
#[derive(Debug, Clone)]
pub struct Tensor {
    object: Arc<TensorObject>,
    registry: TensorRegistry,
}

impl Tensor {
    /// Zero-filled tensor registered with the global registry
    pub fn zeros(shape: impl Into<Shape>, dtype: DType, device: Device) -> Result<Self> {
        TensorRegistry::global().zeros(shape, dtype, device)
    }

    /// Tensor over host data, registered with the global registry
    pub fn from_vec<T: Element>(data: Vec<T>, shape: impl Into<Shape>) -> Result<Self> {
        TensorRegistry::global().from_vec(data, shape)
    }

    /// Scalar (zero-dimensional) tensor on the CPU
    pub fn scalar<T: Element>(value: T) -> Self {
        let mut bytes = Vec::with_capacity(T::DTYPE.size());
        value.extend_le(&mut bytes);
        Self::build(
            TensorRegistry::global(),
            Device::Cpu,
            T::DTYPE,
            Shape::scalar(),
            Arc::new(Storage { bytes }),
        )
    }

    pub(crate) fn zeros_in(
        registry: &TensorRegistry,
        shape: Shape,
        dtype: DType,
        device: Device,
    ) -> Result<Self> {
        // meta tensors never allocate, so any shape is accepted
        let len = match device {
            Device::Meta => 0,
            _ => shape.byte_len(dtype)?,
        };
        Ok(Self::build(
            registry,
            device,
            dtype,
            shape,
            Arc::new(Storage {
                bytes: vec![0; len],
            }),
        ))
    }

    pub(crate) fn from_vec_in<T: Element>(
        registry: &TensorRegistry,
        data: Vec<T>,
        shape: Shape,
    ) -> Result<Self> {
        if shape.checked_numel() != Some(data.len()) {
            return Err(SystemError::InvalidInput(format!(
                "{} elements do not fill shape {shape}",
                data.len()
            )));
        }
        let mut bytes = Vec::with_capacity(data.len() * T::DTYPE.size());
        for value in data {
            value.extend_le(&mut bytes);
        }
        Ok(Self::build(
            registry,
            Device::Cpu,
            T::DTYPE,
            shape,
            Arc::new(Storage { bytes }),
        ))
    }

    fn build(
        registry: &TensorRegistry,
        device: Device,
        dtype: DType,
        shape: Shape,
        storage: Arc<Storage>,
    ) -> Self {
        let object = Arc::new(TensorObject {
            device,
            dtype,
            shape,
            storage,
        });
        registry.register(&object);
        Self {
            object,
            registry: registry.clone(),
        }
    }

    /// Device the storage lives on
    pub fn device(&self) -> Device {
        self.object.device
    }

    /// Element type
    pub fn dtype(&self) -> DType {
        self.object.dtype
    }

    /// Shape
    pub fn shape(&self) -> &Shape {
        &self.object.shape
    }

    /// Number of elements
    pub fn numel(&self) -> usize {
        self.object.shape.numel()
    }

    /// Logical size in bytes, saturating at `usize::MAX`
    pub fn nbytes(&self) -> usize {
        self.numel().saturating_mul(self.dtype().size())
    }

    /// Raw little-endian storage (empty on the meta device)
    pub fn as_bytes(&self) -> &[u8] {
        &self.object.storage.bytes
    }

    /// Whether both handles refer to the same tracked object
    pub fn same_object(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }

    /// Whether both tensors read the same storage
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object.storage, &other.object.storage)
    }

    /// View with a new shape over the same storage.
    ///
    /// The view is a distinct object and is counted separately.
    pub fn reshape(&self, shape: impl Into<Shape>) -> Result<Self> {
        let shape = shape.into();
        let (Some(new), Some(old)) = (shape.checked_numel(), self.shape().checked_numel()) else {
            return Err(SystemError::InvalidInput(format!(
                "cannot reshape {} into {shape}: element count overflows usize",
                self.shape()
            )));
        };
        if new != old {
            return Err(SystemError::InvalidInput(format!(
                "cannot reshape {} into {shape}",
                self.shape()
            )));
        }
        Ok(Self::build(
            &self.registry,
            self.device(),
            self.dtype(),
            shape,
            Arc::clone(&self.object.storage),
        ))
    }

    /// Copy to another device; returns `self` when already there.
    ///
    /// Materialising a meta tensor fails when its size overflows `usize`.
    pub fn to_device(&self, device: Device) -> Result<Self> {
        if device == self.device() {
            return Ok(self.clone());
        }
        let bytes = match (self.device(), device) {
            (_, Device::Meta) => Vec::new(),
            (Device::Meta, _) => vec![0; self.shape().byte_len(self.dtype())?],
            _ => self.object.storage.bytes.clone(),
        };
        Ok(Self::build(
            &self.registry,
            device,
            self.dtype(),
            self.shape().clone(),
            Arc::new(Storage { bytes }),
        ))
    }

    /// Key this tensor is grouped under in a census
    pub fn census_key(&self) -> GroupKey {
        GroupKey::new(self.device().to_string(), self.dtype(), self.shape().clone())
    }
}
