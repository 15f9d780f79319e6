// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/output/announce.rs - 语音播报文本生成
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

/// 为语音播报层生成文本：置信度最高的检测的标签加取整百分比，
/// 例如 "person 87%"。空结果返回 None。TTS 引擎本身在本核心之外。
pub fn announce_top_detection(detections: &[Detection]) -> Option<String> {
  let top = detections
    .iter()
    .max_by(|a, b| a.confidence.total_cmp(&b.confidence))?;
  Some(format!("{} {:.0}%", top.label, top.confidence * 100.0))
}
