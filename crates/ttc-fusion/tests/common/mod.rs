#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ttc_fusion::core::{Calibration, CalibrationConfig, Detection, Keypoint, PixelRect, Point3D};
use ttc_fusion::replay::{PointSource, RecordedFeatures, RecordedFrame};
use ttc_fusion::{Descriptors, FusionConfig, Recording, SweepConfig};

pub const CENTER: (f32, f32) = (600.0, 225.0);

/// Pinhole camera co-located with the range sensor.
pub fn config() -> FusionConfig {
    FusionConfig {
        calibration: Some(CalibrationConfig::from(&Calibration::from_intrinsics(
            700.0, 700.0, 600.0, 200.0,
        ))),
        sweep: SweepConfig {
            detectors: vec!["FAST".into(), "SURF".into()],
            descriptors: vec!["BRIEF".into(), "AKAZE".into()],
        },
        ..FusionConfig::default()
    }
}

pub fn rear_returns(x: f32) -> Vec<[f32; 4]> {
    (0..9)
        .map(|i| [x, -1.0 + 0.25 * i as f32, -1.2, 0.6])
        .collect()
}

fn to_points(raw: &[[f32; 4]]) -> Vec<Point3D> {
    raw.iter()
        .map(|p| Point3D::new(p[0] as f64, p[1] as f64, p[2] as f64, p[3] as f64))
        .collect()
}

fn write_bin(path: &Path, raw: &[[f32; 4]]) {
    let bytes: Vec<u8> = raw
        .iter()
        .flat_map(|p| p.iter().flat_map(|v| v.to_le_bytes()))
        .collect();
    fs::write(path, bytes).expect("write scan");
}

/// Square of half-side `half` around the centre plus a centre keypoint shifted by `shift`.
pub fn keypoints(half: f32, shift: f32) -> Vec<Keypoint> {
    let (cx, cy) = CENTER;
    vec![
        Keypoint::at(cx - half, cy - half),
        Keypoint::at(cx + half, cy - half),
        Keypoint::at(cx + half, cy + half),
        Keypoint::at(cx - half, cy + half),
        Keypoint::at(cx + shift, cy),
    ]
}

fn detections() -> Vec<Detection> {
    vec![
        Detection {
            rect: PixelRect::new(350, 50, 500, 300),
            class_id: 2,
            confidence: 0.9,
        },
        // Duplicate of the lead vehicle, removed by NMS.
        Detection {
            rect: PixelRect::new(355, 50, 500, 300),
            class_id: 2,
            confidence: 0.5,
        },
        // Below the confidence threshold.
        Detection {
            rect: PixelRect::new(0, 0, 100, 80),
            class_id: 0,
            confidence: 0.1,
        },
    ]
}

fn frame(index: usize, image: &str, points: PointSource, kps: Vec<Keypoint>) -> RecordedFrame {
    // Each keypoint gets a distinct single-bit descriptor, so matching is i -> i.
    let descriptors = Descriptors::Binary((0..kps.len()).map(|i| vec![1u8 << i]).collect());
    let mut features = BTreeMap::new();
    features.insert(
        "FAST/BRIEF".to_string(),
        RecordedFeatures {
            keypoints: kps,
            descriptors,
            matches: None,
            matches_from: None,
        },
    );
    RecordedFrame {
        index,
        image: Some(image.into()),
        points,
        detections: detections(),
        features,
    }
}

/// Writes a four-frame recording into `dir` and returns its path.
///
/// The lead vehicle closes from 20 m to 18 m to 16.2 m (frame 2 has no image
/// file and is skipped) while its keypoints spread by 5 % per usable frame,
/// so every tracked pair has a range TTC of 0.9 s and a visual TTC of 2.0 s.
pub fn write_recording(dir: &Path) -> std::path::PathBuf {
    fs::create_dir_all(dir.join("images")).expect("mkdir images");
    fs::create_dir_all(dir.join("velodyne")).expect("mkdir velodyne");
    for i in [0, 1, 3] {
        image::GrayImage::new(1242, 375)
            .save(dir.join(format!("images/{i:010}.png")))
            .expect("write image");
    }
    write_bin(&dir.join("velodyne/0000000000.bin"), &rear_returns(20.0));

    let recording = Recording {
        frames: vec![
            frame(
                0,
                "images/0000000000.png",
                PointSource::File("velodyne/0000000000.bin".into()),
                keypoints(100.0, 0.0),
            ),
            frame(
                1,
                "images/0000000001.png",
                PointSource::Inline(to_points(&rear_returns(18.0))),
                keypoints(105.0, 40.0),
            ),
            frame(
                2,
                "images/0000000002.png",
                PointSource::Inline(to_points(&rear_returns(17.0))),
                keypoints(107.0, 40.0),
            ),
            frame(
                3,
                "images/0000000003.png",
                PointSource::Inline(to_points(&rear_returns(16.2))),
                keypoints(110.25, 80.0),
            ),
        ],
    };
    let path = dir.join("recording.json");
    recording.write_json(&path).expect("write recording");
    path
}
