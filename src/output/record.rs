// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/output/record.rs - 检测记录落盘
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

use crate::detector::Detection;

/// 检测记录写入器
///
/// 每帧一个文本文件：首行为时间戳，其后每行一条
/// `标签, 置信度, left, top, right, bottom` 记录。
pub struct Record {
  /// 记录类别名称而不是类别索引
  pub label_with_name: bool,
}

impl Default for Record {
  fn default() -> Self {
    Self {
      label_with_name: true,
    }
  }
}

impl Record {
  pub fn record(&self, detections: &[Detection], path: &Path) -> Result<(), std::io::Error> {
    let mut records = Vec::with_capacity(detections.len() + 1);
    records.push(format!("# {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));

    for detection in detections {
      let name = if self.label_with_name {
        detection.label.clone()
      } else {
        format!("{}", detection.class_id)
      };
      records.push(format!(
        "{}, {:.4}, {:.1}, {:.1}, {:.1}, {:.1}",
        name,
        detection.confidence,
        detection.bbox.left,
        detection.bbox.top,
        detection.bbox.right,
        detection.bbox.bottom
      ));
    }

    std::fs::write(path.with_extension("txt"), records.join("\n"))?;
    Ok(())
  }
}
