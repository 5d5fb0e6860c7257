use crate::annotation::domain::frame_builder::DetectionVariants;
use crate::annotation::domain::frame_painter::FramePainter;
use crate::detection::domain::face_detector::{CascadeParams, FaceDetector};
use crate::detection::domain::person_detector::{HogParams, PersonDetector};
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

/// Runs both detectors over the detection variants and draws every result
/// onto the color image in native coordinates.
///
/// Pass order is fixed: face on the grayscale variant, face on the mirrored
/// variant, person on the grayscale variant. All passes finish before any
/// pixel is painted, so a failing detector leaves the image untouched.
/// Face boxes from the two passes are not deduplicated.
pub struct AnnotationEngine {
    face_params: CascadeParams,
    person_params: HogParams,
    painter: Box<dyn FramePainter>,
}

impl AnnotationEngine {
    pub fn new(
        face_params: CascadeParams,
        person_params: HogParams,
        painter: Box<dyn FramePainter>,
    ) -> Self {
        Self {
            face_params,
            person_params,
            painter,
        }
    }

    /// Detects on the variants and paints the results onto `image`.
    ///
    /// Returns the detections that were drawn, in pass order.
    pub fn annotate(
        &self,
        image: &mut Frame,
        variants: &DetectionVariants,
        face: &mut dyn FaceDetector,
        person: &mut dyn PersonDetector,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let detections = self.detect(image.width(), variants, face, person)?;
        self.painter.paint(image, &detections)?;
        Ok(detections)
    }

    /// Runs the three detection passes and maps every rectangle to native
    /// coordinates of an image `image_width` pixels wide.
    pub fn detect(
        &self,
        image_width: u32,
        variants: &DetectionVariants,
        face: &mut dyn FaceDetector,
        person: &mut dyn PersonDetector,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let faces = face.detect(&variants.gray, &self.face_params)?;
        let mirrored_faces = face.detect(&variants.mirrored, &self.face_params)?;
        let people = person.detect(&variants.gray, &self.person_params)?;

        let mut detections = Vec::with_capacity(faces.len() + mirrored_faces.len() + people.len());
        detections.extend(faces.into_iter().map(Detection::face));
        detections.extend(
            mirrored_faces
                .into_iter()
                .map(|r| Detection::face(r.mirrored(image_width))),
        );
        detections.extend(people.into_iter().map(Detection::person));
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::domain::frame_builder::FrameBuilder;
    use crate::annotation::infrastructure::outline_painter::OutlinePainter;
    use crate::shared::detection::DetectionClass;
    use crate::shared::region::Region;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Returns scripted results per call and records which frames it saw.
    struct ScriptedFaceDetector {
        results: VecDeque<Result<Vec<Region>, String>>,
        seen: Arc<Mutex<Vec<Frame>>>,
    }

    impl ScriptedFaceDetector {
        fn new(gray: Vec<Region>, mirrored: Vec<Region>) -> Self {
            Self {
                results: VecDeque::from([Ok(gray), Ok(mirrored)]),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FaceDetector for ScriptedFaceDetector {
        fn detect(
            &mut self,
            gray: &Frame,
            params: &CascadeParams,
        ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            assert_eq!(*params, CascadeParams::default());
            self.seen.lock().unwrap().push(gray.clone());
            match self.results.pop_front() {
                Some(Ok(regions)) => Ok(regions),
                Some(Err(e)) => Err(e.into()),
                None => Ok(Vec::new()),
            }
        }
    }

    struct StubPersonDetector {
        result: Result<Vec<Region>, String>,
        calls: Arc<Mutex<usize>>,
    }

    impl StubPersonDetector {
        fn returning(regions: Vec<Region>) -> Self {
            Self {
                result: Ok(regions),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
                calls: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl PersonDetector for StubPersonDetector {
        fn detect(
            &mut self,
            _gray: &Frame,
            params: &HogParams,
        ) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            assert_eq!(*params, HogParams::default());
            *self.calls.lock().unwrap() += 1;
            self.result.clone().map_err(|e| e.into())
        }
    }

    // --- Helpers ---

    fn engine() -> AnnotationEngine {
        AnnotationEngine::new(
            CascadeParams::default(),
            HogParams::default(),
            Box::new(OutlinePainter::default()),
        )
    }

    fn make_frame(w: u32, h: u32) -> Frame {
        Frame::new(vec![128; (w * h * 3) as usize], w, h, 3)
    }

    fn red_pixels(frame: &Frame) -> usize {
        frame
            .data()
            .chunks_exact(3)
            .filter(|px| *px == [255, 0, 0])
            .count()
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let arr = frame.as_ndarray();
        [arr[[y, x, 0]], arr[[y, x, 1]], arr[[y, x, 2]]]
    }

    // --- Tests ---

    #[test]
    fn test_no_detections_leaves_image_unchanged() {
        let mut image = make_frame(100, 100);
        let original = image.clone();
        let variants = FrameBuilder::new().build_variants(&image).unwrap();

        let dets = engine()
            .annotate(
                &mut image,
                &variants,
                &mut ScriptedFaceDetector::new(vec![], vec![]),
                &mut StubPersonDetector::returning(vec![]),
            )
            .unwrap();

        assert!(dets.is_empty());
        assert_eq!(image, original);
    }

    #[test]
    fn test_gray_pass_face_drawn_at_native_coordinates() {
        let mut image = make_frame(100, 100);
        let variants = FrameBuilder::new().build_variants(&image).unwrap();

        let dets = engine()
            .annotate(
                &mut image,
                &variants,
                &mut ScriptedFaceDetector::new(vec![Region::new(10, 10, 20, 20)], vec![]),
                &mut StubPersonDetector::returning(vec![]),
            )
            .unwrap();

        assert_eq!(dets, vec![Detection::face(Region::new(10, 10, 20, 20))]);
        assert_eq!(pixel(&image, 10, 10), [255, 0, 0]);
        assert_eq!(pixel(&image, 30, 30), [255, 0, 0]);
        assert_eq!(red_pixels(&image), 152);
    }

    #[test]
    fn test_mirrored_pass_face_is_flipped_back() {
        let mut image = make_frame(100, 100);
        let variants = FrameBuilder::new().build_variants(&image).unwrap();

        let dets = engine()
            .annotate(
                &mut image,
                &variants,
                &mut ScriptedFaceDetector::new(vec![], vec![Region::new(10, 10, 20, 20)]),
                &mut StubPersonDetector::returning(vec![]),
            )
            .unwrap();

        // 100 - 10 - 20 = 70
        assert_eq!(dets, vec![Detection::face(Region::new(70, 10, 20, 20))]);
        assert_eq!(pixel(&image, 70, 10), [255, 0, 0]);
        assert_eq!(pixel(&image, 90, 30), [255, 0, 0]);
        assert_eq!(pixel(&image, 10, 10), [128, 128, 128]);
        assert_eq!(red_pixels(&image), 152);
    }

    #[test]
    fn test_both_passes_kept_without_dedup() {
        let mut image = make_frame(100, 100);
        let variants = FrameBuilder::new().build_variants(&image).unwrap();

        // Same face seen by both passes: native (40,10,20,20) mirrors to (40,10,20,20)
        let dets = engine()
            .annotate(
                &mut image,
                &variants,
                &mut ScriptedFaceDetector::new(
                    vec![Region::new(40, 10, 20, 20)],
                    vec![Region::new(40, 10, 20, 20)],
                ),
                &mut StubPersonDetector::returning(vec![]),
            )
            .unwrap();

        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0], dets[1]);
    }

    #[test]
    fn test_person_detections_drawn_green() {
        let mut image = make_frame(100, 100);
        let variants = FrameBuilder::new().build_variants(&image).unwrap();

        let dets = engine()
            .annotate(
                &mut image,
                &variants,
                &mut ScriptedFaceDetector::new(vec![], vec![]),
                &mut StubPersonDetector::returning(vec![Region::new(20, 5, 30, 80)]),
            )
            .unwrap();

        assert_eq!(dets[0].class, DetectionClass::Person);
        assert_eq!(pixel(&image, 20, 5), [0, 255, 0]);
        assert_eq!(pixel(&image, 50, 85), [0, 255, 0]);
    }

    #[test]
    fn test_detection_order_is_gray_mirrored_person() {
        let image = make_frame(100, 50);
        let variants = FrameBuilder::new().build_variants(&image).unwrap();

        let dets = engine()
            .detect(
                image.width(),
                &variants,
                &mut ScriptedFaceDetector::new(
                    vec![Region::new(1, 1, 5, 5)],
                    vec![Region::new(2, 2, 5, 5)],
                ),
                &mut StubPersonDetector::returning(vec![Region::new(3, 3, 5, 5)]),
            )
            .unwrap();

        assert_eq!(
            dets,
            vec![
                Detection::face(Region::new(1, 1, 5, 5)),
                Detection::face(Region::new(93, 2, 5, 5)),
                Detection::person(Region::new(3, 3, 5, 5)),
            ]
        );
    }

    #[test]
    fn test_face_detector_sees_gray_then_mirrored() {
        let mut data = vec![0u8; 12];
        data[0..3].copy_from_slice(&[255, 255, 255]); // leftmost pixel white
        let mut image = Frame::new(data, 4, 1, 3);
        let variants = FrameBuilder::new().build_variants(&image).unwrap();
        let face = ScriptedFaceDetector::new(vec![], vec![]);
        let seen = face.seen.clone();
        let mut face = face;

        engine()
            .annotate(
                &mut image,
                &variants,
                &mut face,
                &mut StubPersonDetector::returning(vec![]),
            )
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].data(), &[255, 0, 0, 0]);
        assert_eq!(seen[1].data(), &[0, 0, 0, 255]);
    }

    #[test]
    fn test_detector_failure_leaves_image_untouched() {
        let mut image = make_frame(60, 60);
        let original = image.clone();
        let variants = FrameBuilder::new().build_variants(&image).unwrap();

        let result = engine().annotate(
            &mut image,
            &variants,
            &mut ScriptedFaceDetector::new(vec![Region::new(5, 5, 10, 10)], vec![]),
            &mut StubPersonDetector::failing("model exploded"),
        );

        assert!(result.unwrap_err().to_string().contains("model exploded"));
        assert_eq!(image, original);
    }

    #[test]
    fn test_mirrored_pass_failure_propagates() {
        let image = make_frame(60, 60);
        let variants = FrameBuilder::new().build_variants(&image).unwrap();
        let mut face = ScriptedFaceDetector {
            results: VecDeque::from([Ok(vec![]), Err("mirrored failed".to_string())]),
            seen: Arc::new(Mutex::new(Vec::new())),
        };
        let person = StubPersonDetector::returning(vec![]);
        let calls = person.calls.clone();
        let mut person = person;

        let result = engine().detect(image.width(), &variants, &mut face, &mut person);

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_repeated_annotation_yields_identical_detections() {
        let image = make_frame(80, 80);
        let variants = FrameBuilder::new().build_variants(&image).unwrap();
        let engine = engine();

        let run = |engine: &AnnotationEngine| {
            let mut img = image.clone();
            let dets = engine
                .annotate(
                    &mut img,
                    &variants,
                    &mut ScriptedFaceDetector::new(
                        vec![Region::new(5, 5, 10, 10)],
                        vec![Region::new(7, 9, 12, 12)],
                    ),
                    &mut StubPersonDetector::returning(vec![Region::new(30, 10, 20, 60)]),
                )
                .unwrap();
            (dets, img)
        };

        let (dets_a, img_a) = run(&engine);
        let (dets_b, img_b) = run(&engine);
        assert_eq!(dets_a, dets_b);
        assert_eq!(img_a, img_b);
    }

    #[test]
    fn test_annotation_preserves_dimensions() {
        let mut image = make_frame(37, 23);
        let variants = FrameBuilder::new().build_variants(&image).unwrap();
        engine()
            .annotate(
                &mut image,
                &variants,
                &mut ScriptedFaceDetector::new(vec![Region::new(-10, -10, 100, 100)], vec![]),
                &mut StubPersonDetector::returning(vec![Region::new(30, 20, 50, 50)]),
            )
            .unwrap();
        assert_eq!(image.width(), 37);
        assert_eq!(image.height(), 23);
        assert_eq!(image.data().len(), 37 * 23 * 3);
    }
}
