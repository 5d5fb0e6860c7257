/// Person detector running a COCO-trained YOLO model through `ort`.
///
/// Handles letterbox preprocessing of the grayscale variant, inference, and
/// support-counting NMS that mirrors rectangle grouping semantics.
use std::path::Path;

use crate::detection::domain::person_detector::{HogParams, PersonDetector};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::execution_provider::preferred_execution_providers;
use super::math::bbox_iou;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence floor for person candidates.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// COCO class index for "person".
const PERSON_CLASS: usize = 0;

/// Boxes overlapping above this IoU are grouped into one detection.
const GROUP_IOU_THRESH: f64 = 0.45;

/// Proposals scoring at least this fraction of the confidence floor count
/// as support for a neighboring detection without being kept themselves.
const SUPPORT_FLOOR_RATIO: f64 = 0.4;

pub struct OnnxPersonDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxPersonDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (expecting NCHW).
    /// Falls back to 640 if the shape is dynamic or unreadable.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl PersonDetector for OnnxPersonDetector {
    fn detect(
        &mut self,
        gray: &Frame,
        params: &HogParams,
    ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        if params.use_mean_shift {
            return Err("Mean-shift grouping is not supported by the ONNX person detector".into());
        }
        if gray.is_empty() {
            return Ok(Vec::new());
        }

        let (input_tensor, scale, pad_x, pad_y) = letterbox(gray, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Person model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let keep_floor = self.confidence.max(params.hit_threshold);
        let placement = Placement {
            scale,
            pad_x,
            pad_y,
            width: gray.width(),
            height: gray.height(),
        };
        let mut candidates = decode_candidates(
            data,
            tensor.shape(),
            keep_floor * SUPPORT_FLOOR_RATIO,
            &placement,
        )?;

        let grouped = group_candidates(
            &mut candidates,
            GROUP_IOU_THRESH,
            params.group_threshold,
            keep_floor,
        );
        log::debug!(
            "Person detection: {} candidates, {} kept",
            candidates.len(),
            grouped.len()
        );

        Ok(grouped
            .iter()
            .map(|c| Region::from_corners(c.bbox[0], c.bbox[1], c.bbox[2], c.bbox[3]))
            .collect())
    }
}

/// Where the source frame sits inside the letterboxed model input.
#[derive(Clone, Copy, Debug)]
struct Placement {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
    width: u32,
    height: u32,
}

/// Collects person proposals scoring at least `min_score` from a raw YOLO
/// output, mapped back to source-frame corners.
///
/// Output is `[1, 4 + classes, proposals]` (transposed) or
/// `[1, proposals, 4 + classes]`. A proposal whose best class is not
/// "person" is dropped.
fn decode_candidates(
    data: &[f32],
    shape: &[usize],
    min_score: f64,
    placement: &Placement,
) -> Result<Vec<Candidate>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected person model output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats <= 4 + PERSON_CLASS {
        return Err(format!("Person model output has too few features: {num_feats}").into());
    }
    if data.len() < num_dets * num_feats {
        return Err(format!(
            "Person model output holds {} values, shape {shape:?} needs {}",
            data.len(),
            num_dets * num_feats
        )
        .into());
    }

    let Placement {
        scale,
        pad_x,
        pad_y,
        width,
        height,
    } = *placement;

    let mut candidates = Vec::new();
    for i in 0..num_dets {
        let feat = |f: usize| -> f64 {
            if transposed {
                data[f * num_dets + i] as f64
            } else {
                data[i * num_feats + f] as f64
            }
        };

        let person_score = feat(4 + PERSON_CLASS);
        if person_score < min_score {
            continue;
        }
        let best_other = (4..num_feats)
            .filter(|&f| f != 4 + PERSON_CLASS)
            .map(feat)
            .fold(0.0f64, f64::max);
        if best_other > person_score {
            continue;
        }

        let (cx, cy, w, h) = (feat(0), feat(1), feat(2), feat(3));
        candidates.push(Candidate {
            bbox: [
                (((cx - w / 2.0) - pad_x as f64) / scale).max(0.0),
                (((cy - h / 2.0) - pad_y as f64) / scale).max(0.0),
                (((cx + w / 2.0) - pad_x as f64) / scale).min(width as f64),
                (((cy + h / 2.0) - pad_y as f64) / scale).min(height as f64),
            ],
            confidence: person_score,
        });
    }
    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox-resize a single- or three-channel frame to `target_size` × `target_size`.
///
/// Single-channel input is replicated across the three model channels.
/// Returns `(NCHW float32 tensor, scale, pad_x, pad_y)`.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    // Padding is 114/255 gray, YOLO convention
    let fill = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), fill);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let src_c = frame.channels() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                let sc = if src_c == 1 { 0 } else { c };
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, sc]] as f32 / 255.0;
            }
        }
    }

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Candidate {
    bbox: [f64; 4],
    confidence: f64,
}

/// Greedy NMS that also counts how many raw candidates each kept box absorbed.
///
/// This is the network-side reading of sliding-window rectangle grouping:
/// there, every window above the hit threshold is a raw hit and a cluster is
/// reported only when more than `group_threshold` hits fall into it. Here the
/// raw hits are all proposals down to the support floor, including weak
/// ones on neighboring grid cells and strides, so one person normally
/// gathers well over the default threshold of 8. Only proposals scoring at
/// least `keep_floor` may represent a cluster; a kept box survives when its
/// support (itself plus absorbed neighbors) is strictly greater than
/// `group_threshold`.
fn group_candidates(
    candidates: &mut [Candidate],
    iou_thresh: f64,
    group_threshold: u32,
    keep_floor: f64,
) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; candidates.len()];

    for i in 0..candidates.len() {
        // Sorted descending, so no later proposal can represent a cluster.
        if candidates[i].confidence < keep_floor {
            break;
        }
        if suppressed[i] {
            continue;
        }
        let mut support: u32 = 1;
        for j in (i + 1)..candidates.len() {
            if suppressed[j] {
                continue;
            }
            if bbox_iou(&candidates[i].bbox, &candidates[j].bbox) > iou_thresh {
                suppressed[j] = true;
                support += 1;
            }
        }
        if support > group_threshold {
            keep.push(candidates[i].clone());
        }
    }
    keep
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
