// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/engine.rs - 推理引擎接口与张量回放
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

use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::detector::DetectorError;
use crate::frame::Frame;

/// 原始输出张量，形状 [1, N, 5+C]
///
/// 保存为扁平连续缓冲区，一帧内产生并消费。
/// 构建时校验总长度，过短的缓冲区属于配置/编程错误，立即失败，
/// 绝不静默截断。
#[derive(Debug, Clone)]
pub struct RawOutput {
  data: Box<[f32]>,
  num_predictions: usize,
  num_classes: usize,
}

impl RawOutput {
  pub fn new(
    data: Vec<f32>,
    num_predictions: usize,
    num_classes: usize,
  ) -> Result<Self, DetectorError> {
    let expected = num_predictions * (5 + num_classes);
    if data.len() != expected {
      return Err(DetectorError::MalformedTensor {
        expected,
        actual: data.len(),
      });
    }

    Ok(Self {
      data: data.into_boxed_slice(),
      num_predictions,
      num_classes,
    })
  }

  pub fn num_predictions(&self) -> usize {
    self.num_predictions
  }

  pub fn num_classes(&self) -> usize {
    self.num_classes
  }

  /// 每行长度：cx, cy, w, h, objectness + C 个类别分数
  pub fn row_len(&self) -> usize {
    5 + self.num_classes
  }

  /// 逐行迭代，不复制
  pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
    self.data.chunks_exact(self.row_len())
  }
}

/// 黑盒推理引擎接口
///
/// 对预处理后的一帧同步产出固定形状的输出张量。
/// 模型加载、推理后端都在该接口之后，本核心不涉及。
pub trait TensorEngine {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 模型的类别数量，用于启动时与标签表核对
  fn num_classes(&self) -> usize;

  fn infer(&self, frame: &Frame) -> Result<RawOutput, Self::Error>;
}

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("无法读取张量文件: {0}")]
  Io(#[from] std::io::Error),
  #[error("张量文件解析失败: {0}")]
  Json(#[from] serde_json::Error),
  #[error("张量文件缺少字段: {0}")]
  MissingField(&'static str),
  #[error("预测行长度不一致: 第 {row} 行长度 {actual}, 期望 {expected}")]
  RaggedRow {
    row: usize,
    expected: usize,
    actual: usize,
  },
  #[error("张量内容无效: {0}")]
  Shape(#[from] DetectorError),
}

/// 张量回放引擎
///
/// 从 JSON 转储加载一份录制好的模型输出，每次推理原样回放，
/// 让整条管线可以在没有 NPU 的机器上跑通。
/// 文件格式: {"num_classes": C, "predictions": [[cx, cy, w, h, obj, c0, ...], ...]}
#[derive(Debug)]
pub struct ReplayEngine {
  output: RawOutput,
}

impl ReplayEngine {
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
    let path = path.as_ref();
    info!("加载张量转储文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let engine = Self::from_json(&text)?;
    info!(
      "张量转储加载完成: {} 行预测, {} 个类别",
      engine.output.num_predictions(),
      engine.output.num_classes()
    );
    Ok(engine)
  }

  pub fn from_json(text: &str) -> Result<Self, ReplayError> {
    let value: Value = serde_json::from_str(text)?;

    let num_classes = value
      .get("num_classes")
      .and_then(Value::as_u64)
      .ok_or(ReplayError::MissingField("num_classes"))? as usize;
    let predictions = value
      .get("predictions")
      .and_then(Value::as_array)
      .ok_or(ReplayError::MissingField("predictions"))?;

    let row_len = 5 + num_classes;
    let mut data = Vec::with_capacity(predictions.len() * row_len);
    for (i, row) in predictions.iter().enumerate() {
      let row = row
        .as_array()
        .ok_or(ReplayError::MissingField("predictions"))?;
      if row.len() != row_len {
        return Err(ReplayError::RaggedRow {
          row: i,
          expected: row_len,
          actual: row.len(),
        });
      }
      for v in row {
        data.push(v.as_f64().unwrap_or(0.0) as f32);
      }
    }

    debug!("解析 {} 行预测", predictions.len());
    let output = RawOutput::new(data, predictions.len(), num_classes)?;
    Ok(Self { output })
  }
}

impl TensorEngine for ReplayEngine {
  type Error = ReplayError;

  fn num_classes(&self) -> usize {
    self.output.num_classes()
  }

  fn infer(&self, _frame: &Frame) -> Result<RawOutput, Self::Error> {
    Ok(self.output.clone())
  }
}
