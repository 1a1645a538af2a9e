//! ONNX inference wrapper (pure Rust via `tract-onnx`).
//!
//! Both services ship their Keras models exported to ONNX, so the same
//! wrapper serves the image classifier (`[1, 224, 224, 3]` input, one output)
//! and the eating-pattern model (`[1, 14, 9]` input, two outputs).

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use tract_onnx::prelude::*;

use crate::error::{Result, SmartfoodError};
use crate::ml::{InputTensor, ModelLoader, TensorModel};

pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: Vec<usize>,
    output_dims: Vec<usize>,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_shape", &self.input_shape)
            .field("output_dims", &self.output_dims)
            .finish()
    }
}

impl OnnxModel {
    /// Load an ONNX model and specialize it to a fixed `f32` tensor input.
    ///
    /// `input_shape` must include the batch dimension (typically `1`).
    pub fn load_for_tensor_input(path: &Path, input_shape: &[usize]) -> Result<Self> {
        if input_shape.is_empty() || input_shape.iter().any(|d| *d == 0) {
            return Err(SmartfoodError::InternalInconsistency(format!(
                "invalid model input shape {input_shape:?}"
            )));
        }

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| SmartfoodError::Configuration(format!("onnx load failed: {e}")))?;

        let shape: TVec<usize> = input_shape.iter().copied().collect();
        let model = model
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))
            .map_err(|e| SmartfoodError::Configuration(format!("onnx input fact failed: {e}")))?;

        let plan = model
            .into_optimized()
            .map_err(|e| SmartfoodError::Configuration(format!("onnx optimize failed: {e}")))?
            .into_runnable()
            .map_err(|e| SmartfoodError::Configuration(format!("onnx runnable failed: {e}")))?;

        // Run a dummy forward pass so shape mismatches surface at load time.
        let dummy = tract_ndarray::ArrayD::<f32>::zeros(tract_ndarray::IxDyn(input_shape))
            .into_tvalue();
        let outputs = plan
            .run(tvec!(dummy))
            .map_err(|e| SmartfoodError::Configuration(format!("onnx warmup failed: {e}")))?;
        if outputs.is_empty() {
            return Err(SmartfoodError::Configuration(
                "onnx produced no outputs".to_string(),
            ));
        }
        let output_dims = outputs.iter().map(|o| o.len()).collect::<Vec<_>>();
        debug!(path = %path.display(), ?input_shape, ?output_dims, "onnx model ready");

        Ok(Self {
            plan,
            input_shape: input_shape.to_vec(),
            output_dims,
        })
    }
}

impl TensorModel for OnnxModel {
    fn run(&self, input: &InputTensor) -> Result<Vec<Vec<f32>>> {
        if input.shape() != self.input_shape.as_slice() {
            return Err(SmartfoodError::InternalInconsistency(format!(
                "onnx input shape mismatch: got {:?}, expected {:?}",
                input.shape(),
                self.input_shape
            )));
        }

        let tensor = tract_ndarray::ArrayD::<f32>::from_shape_vec(
            tract_ndarray::IxDyn(input.shape()),
            input.data().to_vec(),
        )
        .map_err(|e| SmartfoodError::Processing(format!("onnx input reshape failed: {e}")))?
        .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(tensor))
            .map_err(|e| SmartfoodError::Processing(format!("onnx run failed: {e}")))?;
        if outputs.is_empty() {
            return Err(SmartfoodError::Processing(
                "onnx produced no outputs".to_string(),
            ));
        }

        outputs
            .iter()
            .map(|out| {
                out.to_array_view::<f32>()
                    .map(|arr| arr.iter().copied().collect())
                    .map_err(|e| {
                        SmartfoodError::Processing(format!("onnx output decode failed: {e}"))
                    })
            })
            .collect()
    }
}

/// [`ModelLoader`] that reads ONNX files with tract.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxLoader;

impl ModelLoader for OnnxLoader {
    fn load(&self, path: &Path, input_shape: &[usize]) -> Result<Arc<dyn TensorModel>> {
        let model = OnnxModel::load_for_tensor_input(path, input_shape)?;
        Ok(Arc::new(model))
    }
}
