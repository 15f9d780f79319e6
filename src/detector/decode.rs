// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/detector/decode.rs - 原始输出张量解码
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

use tracing::debug;

use crate::detector::geometry::BBox;
use crate::detector::{CoordinateSpace, Detection, DetectorConfig, DetectorError};
use crate::engine::RawOutput;
use crate::labels::LabelTable;

/// 将原始输出张量解码为候选检测列表。
///
/// 每行布局为 `[cx, cy, w, h, objectness, class_0, ..., class_{C-1}]`。
/// 置信度 = objectness * 最高类别分数，低于阈值的行直接丢弃；
/// N 往往是数万而真实目标只有几个，绝大多数行都在这里被过滤，
/// 所以类别扫描只维护一个运行中的最大值，不分配中间列表。
pub fn decode(
  raw: &RawOutput,
  labels: &LabelTable,
  image_width: u32,
  image_height: u32,
  config: &DetectorConfig,
) -> Result<Vec<Detection>, DetectorError> {
  if raw.num_classes() != labels.len() {
    return Err(DetectorError::LabelMismatch {
      classes: raw.num_classes(),
      labels: labels.len(),
    });
  }

  let img_w = image_width as f32;
  let img_h = image_height as f32;
  let num_classes = raw.num_classes();
  let mut candidates = Vec::new();

  for row in raw.rows() {
    let objectness = row[4];

    // objectness 是置信度的上界，先用它做廉价的提前过滤
    if objectness < config.conf_threshold {
      continue;
    }

    // 稳定的最左 argmax：并列时取第一个达到最大值的索引
    let mut class_id = 0usize;
    let mut class_score = row[5];
    for c in 1..num_classes {
      let score = row[5 + c];
      if score > class_score {
        class_score = score;
        class_id = c;
      }
    }

    let confidence = objectness * class_score;
    if confidence < config.conf_threshold {
      continue;
    }

    // 换算到图像像素空间
    let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
    let (cx, cy, w, h) = match config.coordinate_space {
      CoordinateSpace::Normalized => (cx * img_w, cy * img_h, w * img_w, h * img_h),
      CoordinateSpace::Absolute => {
        let sx = img_w / config.input_size as f32;
        let sy = img_h / config.input_size as f32;
        (cx * sx, cy * sy, w * sx, h * sy)
      }
      CoordinateSpace::Auto => {
        if cx <= 1.0 && cy <= 1.0 && w <= 1.0 && h <= 1.0 {
          (cx * img_w, cy * img_h, w * img_w, h * img_h)
        } else {
          (cx, cy, w, h)
        }
      }
    };

    candidates.push(Detection {
      class_id,
      label: labels.get(class_id).to_string(),
      confidence,
      bbox: BBox::from_center_size(cx, cy, w, h),
    });
  }

  debug!("解码得到 {} 个候选框", candidates.len());
  Ok(candidates)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn raw_single_row(row: Vec<f32>, num_classes: usize) -> RawOutput {
    RawOutput::new(row, 1, num_classes).unwrap()
  }

  fn labels(names: &[&str]) -> LabelTable {
    LabelTable::from_lines(&names.join("\n"))
  }

  fn config(conf: f32, space: CoordinateSpace) -> DetectorConfig {
    DetectorConfig {
      conf_threshold: conf,
      coordinate_space: space,
      ..DetectorConfig::default()
    }
  }

  #[test]
  fn all_emitted_candidates_pass_confidence_threshold() {
    // 三行：0.9*0.9 通过，0.5*0.5 低于阈值，objectness 低被提前过滤
    let data = vec![
      0.5, 0.5, 0.2, 0.2, 0.9, 0.9, //
      0.5, 0.5, 0.2, 0.2, 0.5, 0.5, //
      0.5, 0.5, 0.2, 0.2, 0.1, 1.0,
    ];
    let raw = RawOutput::new(data, 3, 1).unwrap();
    let out = decode(&raw, &labels(&["object"]), 640, 640, &config(0.35, CoordinateSpace::Auto))
      .unwrap();
    assert_eq!(out.len(), 1);
    for det in &out {
      assert!(det.confidence >= 0.35);
    }
  }

  #[test]
  fn normalized_prediction_scales_by_image_dimensions() {
    // 归一化的 cx=0.5, cy=0.5, w=0.2, h=0.2 映射到 1280x720 图像；
    // 缩放顺序固定为直接乘以图像宽高
    let raw = raw_single_row(vec![0.5, 0.5, 0.2, 0.2, 0.9, 0.9], 1);
    let out = decode(
      &raw,
      &labels(&["object"]),
      1280,
      720,
      &config(0.35, CoordinateSpace::Normalized),
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    let bbox = &out[0].bbox;
    assert!((bbox.left - 512.0).abs() < 1e-3);
    assert!((bbox.top - 288.0).abs() < 1e-3);
    assert!((bbox.right - 768.0).abs() < 1e-3);
    assert!((bbox.bottom - 432.0).abs() < 1e-3);
  }

  #[test]
  fn auto_heuristic_detects_normalized_rows() {
    let raw = raw_single_row(vec![0.5, 0.5, 0.2, 0.2, 0.9, 0.9], 1);
    let out = decode(&raw, &labels(&["object"]), 1280, 720, &config(0.35, CoordinateSpace::Auto))
      .unwrap();
    assert!((out[0].bbox.left - 512.0).abs() < 1e-3);
  }

  #[test]
  fn auto_heuristic_passes_absolute_rows_through() {
    // 任一分量大于 1.0 即视为图像像素坐标，原样使用
    let raw = raw_single_row(vec![320.0, 240.0, 100.0, 50.0, 0.9, 0.9], 1);
    let out = decode(&raw, &labels(&["object"]), 1280, 720, &config(0.35, CoordinateSpace::Auto))
      .unwrap();
    let bbox = &out[0].bbox;
    assert!((bbox.left - 270.0).abs() < 1e-3);
    assert!((bbox.top - 215.0).abs() < 1e-3);
    assert!((bbox.right - 370.0).abs() < 1e-3);
    assert!((bbox.bottom - 265.0).abs() < 1e-3);
  }

  #[test]
  fn explicit_absolute_rescales_from_model_input() {
    // 640 输入空间中心 (320, 320)，映射到 1280x720：横向 x2，纵向 x1.125
    let raw = raw_single_row(vec![320.0, 320.0, 100.0, 100.0, 0.9, 0.9], 1);
    let out = decode(
      &raw,
      &labels(&["object"]),
      1280,
      720,
      &config(0.35, CoordinateSpace::Absolute),
    )
    .unwrap();
    let bbox = &out[0].bbox;
    assert!((bbox.left - (640.0 - 100.0)).abs() < 1e-3);
    assert!((bbox.top - (360.0 - 56.25)).abs() < 1e-3);
  }

  #[test]
  fn argmax_tie_breaks_to_leftmost_class() {
    let raw = raw_single_row(vec![0.5, 0.5, 0.2, 0.2, 0.9, 0.7, 0.7, 0.3], 3);
    let out = decode(
      &raw,
      &labels(&["person", "car", "dog"]),
      640,
      640,
      &config(0.35, CoordinateSpace::Auto),
    )
    .unwrap();
    assert_eq!(out[0].class_id, 0);
    assert_eq!(out[0].label, "person");
  }

  #[test]
  fn label_count_mismatch_is_fatal() {
    let raw = raw_single_row(vec![0.5, 0.5, 0.2, 0.2, 0.9, 0.9], 1);
    let err = decode(
      &raw,
      &labels(&["person", "car"]),
      640,
      640,
      &config(0.35, CoordinateSpace::Auto),
    )
    .unwrap_err();
    assert!(matches!(
      err,
      DetectorError::LabelMismatch { classes: 1, labels: 2 }
    ));
  }
}
