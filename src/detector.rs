// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/detector.rs - 检测后处理管线
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

pub mod decode;
pub mod geometry;
pub mod nms;

pub use decode::decode;
pub use geometry::{BBox, iou};
pub use nms::non_max_suppression;

use thiserror::Error;
use tracing::{info, warn};

use crate::engine::TensorEngine;
use crate::frame::Frame;
use crate::labels::LabelTable;

/// 默认置信度阈值
pub const DEFAULT_CONF_THRESHOLD: f32 = 0.35;
/// 默认 NMS IoU 阈值
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;
/// 默认模型方形输入边长（像素）
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// 原始预测的坐标空间
///
/// 由模型元数据显式指定；仅在元数据缺失时使用 `Auto` 按行启发式判断。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSpace {
  /// 归一化到 [0,1]，按图像宽高直接缩放
  Normalized,
  /// 模型方形输入的像素坐标，按 图像尺寸 / 输入边长 缩放
  Absolute,
  /// 启发式：cx, cy, w, h 均不超过 1.0 视为归一化，否则按图像像素原样使用。
  /// 靠近原点的真实像素框会被误判，已知的模糊点，元数据可用时应显式指定。
  #[default]
  Auto,
}

/// 检测器配置
///
/// 启动时设置一次，之后只读共享，逐帧路径保持纯函数。
#[derive(Debug, Clone)]
pub struct DetectorConfig {
  /// 置信度阈值 (0.0 - 1.0)
  pub conf_threshold: f32,
  /// NMS IoU 阈值 (0.0 - 1.0)
  pub iou_threshold: f32,
  /// 原始预测的坐标空间
  pub coordinate_space: CoordinateSpace,
  /// 模型方形输入边长（像素）
  pub input_size: u32,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self {
      conf_threshold: DEFAULT_CONF_THRESHOLD,
      iou_threshold: DEFAULT_IOU_THRESHOLD,
      coordinate_space: CoordinateSpace::default(),
      input_size: DEFAULT_INPUT_SIZE,
    }
  }
}

/// 单个检测结果
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
  /// 类别索引
  pub class_id: usize,
  /// 类别名称
  pub label: String,
  /// 置信度 = objectness * 最高类别分数
  pub confidence: f32,
  /// 边界框，图像像素坐标
  pub bbox: BBox,
}

#[derive(Error, Debug)]
pub enum DetectorError {
  #[error("标签数量与模型类别数量不匹配: 类别 {classes}, 标签 {labels}")]
  LabelMismatch { classes: usize, labels: usize },
  #[error("输出张量形状无效: 期望长度 {expected}, 实际长度 {actual}")]
  MalformedTensor { expected: usize, actual: usize },
}

/// 检测后处理管线
///
/// 持有黑盒推理引擎、只读配置和标签表。
/// 逐帧执行 解码 -> NMS，自身无任何跨帧可变状态。
#[derive(Debug)]
pub struct Detector<E> {
  engine: E,
  config: DetectorConfig,
  labels: LabelTable,
}

impl<E: TensorEngine> Detector<E> {
  /// 创建检测器。
  /// 标签数量与模型类别数量不匹配属于致命配置错误，
  /// 在任何帧处理开始前暴露，绝不带着无法触达的标签索引运行。
  pub fn new(engine: E, config: DetectorConfig, labels: LabelTable) -> Result<Self, DetectorError> {
    let classes = engine.num_classes();
    if classes != labels.len() {
      return Err(DetectorError::LabelMismatch {
        classes,
        labels: labels.len(),
      });
    }

    info!(
      "检测器就绪: {} 个类别, 置信度阈值 {}, IoU 阈值 {}, 坐标空间 {:?}",
      classes, config.conf_threshold, config.iou_threshold, config.coordinate_space
    );

    Ok(Self {
      engine,
      config,
      labels,
    })
  }

  pub fn config(&self) -> &DetectorConfig {
    &self.config
  }

  pub fn labels(&self) -> &LabelTable {
    &self.labels
  }

  /// 处理一帧：推理 -> 解码 -> NMS。
  ///
  /// 推理失败是可恢复的逐帧状况，本帧返回空结果并继续；
  /// 张量形状不匹配则属于配置错误，作为错误传播。
  pub fn process_frame(&self, frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
    let raw = match self.engine.infer(frame) {
      Ok(raw) => raw,
      Err(e) => {
        warn!("第 {} 帧推理失败，返回空结果: {}", frame.index, e);
        return Ok(Vec::new());
      }
    };

    let candidates = decode(
      &raw,
      &self.labels,
      frame.width(),
      frame.height(),
      &self.config,
    )?;

    Ok(non_max_suppression(candidates, self.config.iou_threshold))
  }
}
