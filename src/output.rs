// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/output.rs - 输出模块
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

mod announce;
#[cfg(feature = "save_image_file")]
mod draw;
#[cfg(feature = "directory_record")]
mod record;

pub use announce::announce_top_detection;
#[cfg(feature = "save_image_file")]
pub use draw::{Draw, ImageFileOutput};
#[cfg(feature = "directory_record")]
pub use record::Record;

use thiserror::Error;

use crate::detector::Detection;
use crate::frame::Frame;

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("输出写入失败: {0}")]
  Io(#[from] std::io::Error),
  #[error("图像保存失败: {0}")]
  Image(#[from] image::ImageError),
  #[cfg(feature = "save_image_file")]
  #[error("字体文件无效: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 渲染输出 trait
///
/// 任务循环每处理完一帧调用一次。结果若要交给 UI 或语音层，
/// 由实现方负责切换到持有该资源的线程。
pub trait Render {
  type Error: std::error::Error + Send + Sync + 'static;

  fn render_result(&mut self, frame: &Frame, detections: &[Detection]) -> Result<(), Self::Error>;
}
