//! Model invocation seam.
//!
//! The services only see [`TensorModel`] and [`ModelLoader`]; the tract-onnx
//! backed implementation lives in [`onnx`].

pub mod onnx;
pub mod tensor;

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

pub use onnx::{OnnxLoader, OnnxModel};
pub use tensor::InputTensor;

/// A loaded network that maps one input tensor to its output tensors.
#[cfg_attr(test, mockall::automock)]
pub trait TensorModel: Send + Sync {
    /// Run one forward pass. Every output is flattened, in graph order.
    fn run(&self, input: &InputTensor) -> Result<Vec<Vec<f32>>>;
}

/// Loads a model artifact specialized to a fixed input shape.
#[cfg_attr(test, mockall::automock)]
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path, input_shape: &[usize]) -> Result<Arc<dyn TensorModel>>;
}
