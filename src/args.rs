// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::{Parser, ValueEnum};

use qingniao::detector::CoordinateSpace;

/// Qingniao 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型输出张量转储文件（JSON）
  #[arg(long, value_name = "FILE")]
  pub tensor: String,

  /// 输入图像路径 (*.jpg, *.jpeg, *.png)
  #[arg(long, value_name = "IMAGE")]
  pub image: String,

  /// 标签文件路径（按行分隔，一行一个标签）
  #[arg(long, default_value = "labels/coco.txt", value_name = "FILE")]
  pub labels: String,

  /// 标注结果输出图像路径
  #[cfg(feature = "save_image_file")]
  #[arg(long, value_name = "OUTPUT")]
  pub output: Option<String>,

  /// 标签字体文件（提供时在检测框上绘制文字）
  #[cfg(feature = "save_image_file")]
  #[arg(long, value_name = "FILE")]
  pub font: Option<String>,

  /// 检测记录输出路径
  #[cfg(feature = "directory_record")]
  #[arg(long, value_name = "FILE")]
  pub record: Option<String>,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.35", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// NMS IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.45", value_name = "THRESHOLD")]
  pub nms_threshold: f32,

  /// 原始预测的坐标空间；模型元数据已知时显式指定，未知时用 auto 启发式
  #[arg(long, value_enum, default_value_t = CoordSpaceArg::Auto)]
  pub coord_space: CoordSpaceArg,

  /// 模型方形输入边长（像素）
  #[arg(long, default_value = "640", value_name = "SIZE")]
  pub input_size: u32,

  /// 重复处理帧数（模拟连续帧流，0 表示单帧）
  #[arg(long, default_value = "0", value_name = "COUNT")]
  pub repeat: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CoordSpaceArg {
  Auto,
  Normalized,
  Absolute,
}

impl From<CoordSpaceArg> for CoordinateSpace {
  fn from(arg: CoordSpaceArg) -> Self {
    match arg {
      CoordSpaceArg::Auto => CoordinateSpace::Auto,
      CoordSpaceArg::Normalized => CoordinateSpace::Normalized,
      CoordSpaceArg::Absolute => CoordinateSpace::Absolute,
    }
  }
}
