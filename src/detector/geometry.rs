// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/detector/geometry.rs - 边界框几何运算
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

/// IoU 分母中的 epsilon，避免两个零面积框相除为零
pub const IOU_EPSILON: f32 = 1e-6;

/// 轴对齐边界框，图像像素坐标
///
/// 原始预测可能产生退化框（right < left 或 bottom < top），
/// 面积运算将其按零面积处理，不视为错误。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
  pub left: f32,
  pub top: f32,
  pub right: f32,
  pub bottom: f32,
}

impl BBox {
  pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
    Self {
      left,
      top,
      right,
      bottom,
    }
  }

  /// 由中心点和宽高构建四角坐标
  pub fn from_center_size(cx: f32, cy: f32, w: f32, h: f32) -> Self {
    Self {
      left: cx - w / 2.0,
      top: cy - h / 2.0,
      right: cx + w / 2.0,
      bottom: cy + h / 2.0,
    }
  }

  /// 面积；负宽或负高按零计
  pub fn area(&self) -> f32 {
    (self.right - self.left).max(0.0) * (self.bottom - self.top).max(0.0)
  }
}

/// 交并比 (Intersection over Union)
pub fn iou(a: &BBox, b: &BBox) -> f32 {
  let left = a.left.max(b.left);
  let top = a.top.max(b.top);
  let right = a.right.min(b.right);
  let bottom = a.bottom.min(b.bottom);

  let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
  intersection / (a.area() + b.area() - intersection + IOU_EPSILON)
}
