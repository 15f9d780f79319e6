// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/labels.rs - 类别标签表
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

use tracing::{info, warn};

/// 标签资源缺失或为空时的兜底标签
pub const DEFAULT_LABEL: &str = "object";

/// 类别标签表
///
/// 启动时从按行分隔的文本资源加载一次，之后只读共享。
/// 表中第 i 行对应模型的第 i 个类别。
#[derive(Debug, Clone)]
pub struct LabelTable {
  labels: Vec<String>,
}

impl LabelTable {
  /// 从按行分隔的文本构建标签表：逐行去除首尾空白，跳过空行。
  /// 没有任何有效行时退化为单一的 `"object"` 标签。
  pub fn from_lines(text: &str) -> Self {
    let labels: Vec<String> = text
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(str::to_string)
      .collect();

    if labels.is_empty() {
      warn!("标签资源为空，使用兜底标签 \"{}\"", DEFAULT_LABEL);
      return Self::fallback();
    }

    Self { labels }
  }

  /// 从标签文件加载。文件不可读时记录警告并退化为兜底标签表，
  /// 真正致命的配置错误（标签数量与模型类别数量不匹配）
  /// 在检测器构建时统一检查。
  pub fn from_file(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
      Ok(text) => {
        let table = Self::from_lines(&text);
        info!("从 {} 加载 {} 个标签", path.display(), table.len());
        table
      }
      Err(e) => {
        warn!(
          "无法读取标签文件 {}: {}，使用兜底标签 \"{}\"",
          path.display(),
          e,
          DEFAULT_LABEL
        );
        Self::fallback()
      }
    }
  }

  fn fallback() -> Self {
    Self {
      labels: vec![DEFAULT_LABEL.to_string()],
    }
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  /// 按类别索引取标签；越界时返回兜底标签而不是崩溃
  pub fn get(&self, class_id: usize) -> &str {
    self
      .labels
      .get(class_id)
      .map(String::as_str)
      .unwrap_or(DEFAULT_LABEL)
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.labels.iter().map(String::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_trimmed_non_blank_lines() {
    let table = LabelTable::from_lines("person\n  car  \n\n\tdog\n");
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(0), "person");
    assert_eq!(table.get(1), "car");
    assert_eq!(table.get(2), "dog");
  }

  #[test]
  fn empty_resource_falls_back_to_default_label() {
    let table = LabelTable::from_lines("\n   \n\n");
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0), DEFAULT_LABEL);
  }

  #[test]
  fn missing_file_falls_back_to_default_label() {
    let table = LabelTable::from_file("/nonexistent/labels.txt");
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(0), DEFAULT_LABEL);
  }

  #[test]
  fn out_of_range_index_returns_default_label() {
    let table = LabelTable::from_lines("person");
    assert_eq!(table.get(42), DEFAULT_LABEL);
  }
}
