pub const FACE_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const FACE_MODEL_URL: &str =
    "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin";

/// COCO-trained YOLO model; no public mirror is pinned, so it must be supplied or cached.
pub const PERSON_MODEL_NAME: &str = "yolov8n.onnx";

/// Directory under the user cache dir holding resolved models.
pub const APP_DIR_NAME: &str = "HumanMark";

/// Separator of the composite blob key; field 1 is the output file name.
pub const KEY_SEPARATOR: char = ',';
pub const KEY_NAME_FIELD: usize = 1;

pub const OUTLINE_THICKNESS: u32 = 2;

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

pub const DEFAULT_QUEUE_CAPACITY: usize = 8;
