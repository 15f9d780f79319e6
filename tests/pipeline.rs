// 该文件是 Qingniao （青鸟） 项目的一部分。
// tests/pipeline.rs - 管线端到端测试
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Muyang Chen <muyang@qingniao.vision>

use std::convert::Infallible;

use image::RgbImage;

use qingniao::detector::{Detector, DetectorConfig, DetectorError, iou};
use qingniao::engine::{RawOutput, ReplayEngine, TensorEngine};
use qingniao::frame::Frame;
use qingniao::labels::LabelTable;

/// 固定输出引擎：每次推理回放同一份张量
#[derive(Debug)]
struct FixedEngine {
  output: RawOutput,
}

impl TensorEngine for FixedEngine {
  type Error = Infallible;

  fn num_classes(&self) -> usize {
    self.output.num_classes()
  }

  fn infer(&self, _frame: &Frame) -> Result<RawOutput, Self::Error> {
    Ok(self.output.clone())
  }
}

/// 始终失败的引擎，模拟单帧推理故障
struct FailingEngine;

impl TensorEngine for FailingEngine {
  type Error = std::io::Error;

  fn num_classes(&self) -> usize {
    2
  }

  fn infer(&self, _frame: &Frame) -> Result<RawOutput, Self::Error> {
    Err(std::io::Error::other("推理引擎不可用"))
  }
}

fn frame(width: u32, height: u32) -> Frame {
  Frame::new(RgbImage::new(width, height), 0, 0)
}

fn person_car_labels() -> LabelTable {
  LabelTable::from_lines("person\ncar")
}

/// 三行张量：两个重叠的 person（IoU 约 0.7）和一个不相交的 car。
/// 坐标均为图像像素（Auto 启发式下原样使用）。
fn scenario_tensor() -> RawOutput {
  #[rustfmt::skip]
  let data = vec![
    // cx, cy, w, h, objectness, person, car
    50.0, 50.0, 100.0, 100.0, 0.9, 1.0, 0.0,
    67.65, 50.0, 100.0, 100.0, 0.6, 1.0, 0.0,
    400.0, 400.0, 80.0, 80.0, 0.5, 0.0, 1.0,
  ];
  RawOutput::new(data, 3, 2).unwrap()
}

#[test]
fn end_to_end_scenario_keeps_best_person_and_the_car() {
  let engine = FixedEngine {
    output: scenario_tensor(),
  };
  let detector = Detector::new(engine, DetectorConfig::default(), person_car_labels()).unwrap();

  let detections = detector.process_frame(&frame(640, 640)).unwrap();

  // 重叠的 0.6 person 被抑制，0.9 person 和不相交的 car 保留
  assert_eq!(detections.len(), 2);
  assert_eq!(detections[0].label, "person");
  assert!((detections[0].confidence - 0.9).abs() < 1e-4);
  assert_eq!(detections[1].label, "car");
  assert!((detections[1].confidence - 0.5).abs() < 1e-4);
}

#[test]
fn final_set_has_no_same_class_overlap_above_threshold() {
  let engine = FixedEngine {
    output: scenario_tensor(),
  };
  let detector = Detector::new(engine, DetectorConfig::default(), person_car_labels()).unwrap();
  let config_threshold = detector.config().iou_threshold;

  let detections = detector.process_frame(&frame(640, 640)).unwrap();
  for i in 0..detections.len() {
    for j in (i + 1)..detections.len() {
      if detections[i].label == detections[j].label {
        assert!(iou(&detections[i].bbox, &detections[j].bbox) <= config_threshold);
      }
    }
  }
}

#[test]
fn identical_input_produces_identical_output() {
  let engine = FixedEngine {
    output: scenario_tensor(),
  };
  let detector = Detector::new(engine, DetectorConfig::default(), person_car_labels()).unwrap();

  let first = detector.process_frame(&frame(640, 640)).unwrap();
  let second = detector.process_frame(&frame(640, 640)).unwrap();
  assert_eq!(first, second);
}

#[test]
fn engine_failure_yields_empty_set_and_pipeline_continues() {
  let detector =
    Detector::new(FailingEngine, DetectorConfig::default(), person_car_labels()).unwrap();

  // 失败帧返回空结果而不是崩溃，下一帧照常处理
  let detections = detector.process_frame(&frame(640, 640)).unwrap();
  assert!(detections.is_empty());
  let detections = detector.process_frame(&frame(640, 640)).unwrap();
  assert!(detections.is_empty());
}

#[test]
fn label_class_count_mismatch_fails_at_construction() {
  let engine = FixedEngine {
    output: scenario_tensor(),
  };
  let err = Detector::new(
    engine,
    DetectorConfig::default(),
    LabelTable::from_lines("person"),
  )
  .unwrap_err();
  assert!(matches!(
    err,
    DetectorError::LabelMismatch {
      classes: 2,
      labels: 1
    }
  ));
}

#[test]
fn replay_engine_round_trip_through_detector() {
  let text = r#"{
    "num_classes": 2,
    "predictions": [
      [0.5, 0.5, 0.2, 0.2, 0.9, 1.0, 0.0],
      [400.0, 400.0, 80.0, 80.0, 0.5, 0.0, 1.0]
    ]
  }"#;
  let path = std::env::temp_dir().join("qingniao_pipeline_replay.json");
  std::fs::write(&path, text).unwrap();

  let engine = ReplayEngine::from_file(&path).unwrap();
  let detector = Detector::new(engine, DetectorConfig::default(), person_car_labels()).unwrap();

  // 1280x720 图像：归一化行按图像宽高缩放，像素行原样使用
  let detections = detector.process_frame(&frame(1280, 720)).unwrap();
  assert_eq!(detections.len(), 2);

  let person = &detections[0];
  assert_eq!(person.label, "person");
  assert!((person.bbox.left - 512.0).abs() < 1e-3);
  assert!((person.bbox.top - 288.0).abs() < 1e-3);
  assert!((person.bbox.right - 768.0).abs() < 1e-3);
  assert!((person.bbox.bottom - 432.0).abs() < 1e-3);

  let car = &detections[1];
  assert_eq!(car.label, "car");
  assert!((car.bbox.left - 360.0).abs() < 1e-3);
}
