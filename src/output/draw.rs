// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use tracing::debug;

use crate::detector::Detection;
use crate::frame::Frame;
use crate::output::{OutputError, Render};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const BORDER_COLOR: [u8; 3] = [0, 255, 0]; // 绿色
const BORDER_THICKNESS: i32 = 2;

/// 检测框绘制器
///
/// 默认只画边框；提供字体文件后在框上方绘制 "标签 置信度" 文本。
pub struct Draw {
  border_color: [u8; 3],
  border_thickness: i32,
  font: Option<FontVec>,
  font_size: f32,
  label_char_width: f32,
  label_text_height: i32,
  label_text_vertical_padding: i32,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      border_color: BORDER_COLOR,
      border_thickness: BORDER_THICKNESS,
      font: None,
      font_size: LABEL_FONT_SIZE,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
    }
  }
}

impl Draw {
  pub fn with_border_color(mut self, color: [u8; 3]) -> Self {
    self.border_color = color;
    self
  }

  /// 加载标签字体文件
  pub fn with_font_file(mut self, path: impl AsRef<Path>) -> Result<Self, OutputError> {
    let data = std::fs::read(path.as_ref())?;
    self.font = Some(FontVec::try_from_vec(data)?);
    Ok(self)
  }

  /// 在图像上绘制全部检测框
  pub fn draw_detections_on_image(&self, image: &mut RgbImage, detections: &[Detection]) {
    for detection in detections {
      self.draw_detection(image, detection);
    }
  }

  fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
    let (w, h) = (image.width() as i32, image.height() as i32);

    let mut x_min = detection.bbox.left.floor() as i32;
    let mut y_min = detection.bbox.top.floor() as i32;
    let mut x_max = detection.bbox.right.ceil() as i32;
    let mut y_max = detection.bbox.bottom.ceil() as i32;

    // 裁剪到图像范围
    x_min = x_min.clamp(0, w - 1);
    y_min = y_min.clamp(0, h - 1);
    x_max = x_max.clamp(0, w - 1);
    y_max = y_max.clamp(0, h - 1);

    if x_min >= x_max || y_min >= y_max {
      debug!("跳过退化检测框: {:?}", detection.bbox);
      return;
    }

    let color = Rgb(self.border_color);
    for thickness in 0..self.border_thickness {
      let x_min_t = (x_min + thickness).min(w - 1);
      let y_min_t = (y_min + thickness).min(h - 1);
      let x_max_t = (x_max - thickness).max(0);
      let y_max_t = (y_max - thickness).max(0);

      // 上下边
      for x in x_min_t..=x_max_t {
        *image.get_pixel_mut(x as u32, y_min_t as u32) = color;
        *image.get_pixel_mut(x as u32, y_max_t as u32) = color;
      }

      // 左右边
      for y in y_min_t..=y_max_t {
        *image.get_pixel_mut(x_min_t as u32, y as u32) = color;
        *image.get_pixel_mut(x_max_t as u32, y as u32) = color;
      }
    }

    if let Some(font) = &self.font {
      self.draw_label(image, detection, x_min, y_min, font);
    }
  }

  fn draw_label(
    &self,
    image: &mut RgbImage,
    detection: &Detection,
    x_min: i32,
    y_min: i32,
    font: &FontVec,
  ) {
    let label = format!("{} {:.2}", detection.label, detection.confidence);

    let scale = PxScale::from(self.font_size);
    let text_color = Rgb([255u8, 255u8, 255u8]); // 白色文本

    // 估算文本大小（粗略估计）
    let text_width = (label.len() as f32 * self.label_char_width) as i32;
    let text_height = self.label_text_height;

    // 标签背景在边框上方
    let label_x = x_min.max(0);
    let label_y = (y_min - text_height).max(0);

    // 确保标签不超出图像边界
    let max_width = (image.width() as i32 - label_x).max(0);
    let label_width = text_width.min(max_width) as u32;
    let label_height = text_height as u32;

    if label_width > 0 && label_height > 0 {
      let rect = imageproc::rect::Rect::at(label_x, label_y).of_size(label_width, label_height);
      draw_filled_rect_mut(image, rect, Rgb(self.border_color));

      draw_text_mut(
        image,
        text_color,
        label_x,
        label_y + self.label_text_vertical_padding,
        scale,
        font,
        &label,
      );
    }
  }
}

/// 图像文件输出
///
/// 把标注后的帧保存为图片文件。
pub struct ImageFileOutput {
  draw: Draw,
  path: PathBuf,
}

impl ImageFileOutput {
  pub fn new(draw: Draw, path: impl Into<PathBuf>) -> Self {
    Self {
      draw,
      path: path.into(),
    }
  }
}

impl Render for ImageFileOutput {
  type Error = OutputError;

  fn render_result(&mut self, frame: &Frame, detections: &[Detection]) -> Result<(), Self::Error> {
    let mut image = frame.image.clone();
    self.draw.draw_detections_on_image(&mut image, detections);
    image.save(&self.path)?;
    debug!("标注图像已保存: {}", self.path.display());
    Ok(())
  }
}
