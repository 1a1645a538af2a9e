//! Wire payload to model input tensors.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::imageops::FilterType;
use serde_json::Value;

use crate::error::{Result, SmartfoodError};
use crate::ml::InputTensor;

/// Side length of the square classifier input.
pub const IMAGE_SIZE: u32 = 224;
pub const IMAGE_CHANNELS: usize = 3;

/// Time steps per eating-pattern sequence.
pub const SEQUENCE_STEPS: usize = 14;
/// Features per time step.
pub const SEQUENCE_FEATURES: usize = 9;

pub const IMAGE_INPUT_SHAPE: [usize; 4] = [1, IMAGE_SIZE as usize, IMAGE_SIZE as usize, IMAGE_CHANNELS];
pub const SEQUENCE_INPUT_SHAPE: [usize; 3] = [1, SEQUENCE_STEPS, SEQUENCE_FEATURES];

/// Decode a base64 image into a `[1, 224, 224, 3]` tensor scaled to `[0, 1]`.
///
/// The image is stretched to the square, never cropped. A `data:` URL prefix
/// and embedded whitespace are tolerated.
pub fn decode_image(encoded: &str) -> Result<InputTensor> {
    let bytes = decode_base64(encoded)?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| SmartfoodError::Decode(format!("cannot identify image: {e}")))?;

    let rgb = img
        .resize_exact(IMAGE_SIZE, IMAGE_SIZE, FilterType::CatmullRom)
        .to_rgb8();
    let data = rgb
        .into_raw()
        .into_iter()
        .map(|c| c as f32 / 255.0)
        .collect();

    InputTensor::new(IMAGE_INPUT_SHAPE.to_vec(), data)
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let trimmed = encoded.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(SmartfoodError::Decode("empty image payload".to_string()));
    }

    BASE64
        .decode(compact.as_bytes())
        .map_err(|e| SmartfoodError::Decode(format!("invalid base64: {e}")))
}

/// Validate a `14 x 9` numeric sequence and wrap it as a `[1, 14, 9]` tensor.
pub fn decode_sequence(value: &Value) -> Result<InputTensor> {
    let steps = value.as_array().ok_or_else(|| {
        SmartfoodError::Validation("sequence must be an array of time steps".to_string())
    })?;
    if steps.len() != SEQUENCE_STEPS {
        return Err(SmartfoodError::Validation(format!(
            "sequence must have {SEQUENCE_STEPS} time steps, got {}",
            steps.len()
        )));
    }

    let mut data = Vec::with_capacity(SEQUENCE_STEPS * SEQUENCE_FEATURES);
    for (step_idx, step) in steps.iter().enumerate() {
        let features = step.as_array().ok_or_else(|| {
            SmartfoodError::Validation(format!("time step {step_idx} must be an array"))
        })?;
        if features.len() != SEQUENCE_FEATURES {
            return Err(SmartfoodError::Validation(format!(
                "time step {step_idx} must have {SEQUENCE_FEATURES} features, got {}",
                features.len()
            )));
        }
        for (feature_idx, feature) in features.iter().enumerate() {
            let x = feature
                .as_f64()
                .filter(|x| x.is_finite())
                .ok_or_else(|| {
                    SmartfoodError::Validation(format!(
                        "feature {feature_idx} of time step {step_idx} is not a number: {feature}"
                    ))
                })?;
            data.push(x as f32);
        }
    }

    InputTensor::new(SEQUENCE_INPUT_SHAPE.to_vec(), data)
}

/// Parse the CLI form of a sequence (JSON text) and validate it.
pub fn decode_sequence_json(raw: &str) -> Result<InputTensor> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| SmartfoodError::Validation(format!("sequence is not valid JSON: {e}")))?;
    decode_sequence(&value)
}
