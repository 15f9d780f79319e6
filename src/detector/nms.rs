// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/detector/nms.rs - 非极大值抑制
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

use crate::detector::Detection;
use crate::detector::geometry::iou;

/// 按类别的贪婪非极大值抑制。
///
/// 同一类别内按置信度降序（稳定排序，并列保持输入顺序）贪婪扫描：
/// 每个未被标记的候选入选，并标记其后所有 IoU 超过阈值的同类候选。
/// 类别分组保持首次出现的顺序，相同输入必得相同输出。
/// 对固定阈值幂等：suppress(suppress(X)) == suppress(X)。
pub fn non_max_suppression(candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
  // 分组用小向量线性查找：阈值过滤后每类候选只有个位数到几十个，
  // 也避免了热路径上的字符串哈希
  let mut groups: Vec<Vec<Detection>> = Vec::new();
  for candidate in candidates {
    match groups.iter_mut().find(|g| g[0].label == candidate.label) {
      Some(group) => group.push(candidate),
      None => groups.push(vec![candidate]),
    }
  }

  let mut kept = Vec::new();
  for mut group in groups {
    group.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut suppressed = vec![false; group.len()];
    for i in 0..group.len() {
      if suppressed[i] {
        continue;
      }
      for j in (i + 1)..group.len() {
        if suppressed[j] {
          continue;
        }
        if iou(&group[i].bbox, &group[j].bbox) > iou_threshold {
          suppressed[j] = true;
        }
      }
    }

    for (candidate, dropped) in group.into_iter().zip(suppressed) {
      if !dropped {
        kept.push(candidate);
      }
    }
  }

  kept
}
