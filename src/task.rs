// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/task.rs - 任务循环
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

use std::sync::mpsc::Receiver;
use std::{thread, time::Duration};

use tracing::{debug, info, warn};

use crate::detector::Detector;
use crate::engine::TensorEngine;
use crate::frame::Frame;
use crate::output::Render;

/// 单帧任务：一帧走完整条管线并输出，带耗时日志
pub struct OneShotTask;

impl OneShotTask {
  pub fn run_task<E: TensorEngine, R: Render>(
    self,
    frame: &Frame,
    detector: &Detector<E>,
    output: &mut R,
  ) -> anyhow::Result<()> {
    info!("开始任务...");
    let now = std::time::Instant::now();
    let detections = detector.process_frame(frame)?;
    let elapsed = now.elapsed();
    info!(
      "后处理完成，耗时: {:.2?}，检测到 {} 个目标",
      elapsed,
      detections.len()
    );
    output.render_result(frame, &detections)?;
    info!("渲染完成，耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 连续任务：从通道取帧，丢弃积压只处理最新一帧
///
/// 帧生产相对于处理是异步的；上一帧还没处理完时新帧到达，
/// 旧帧直接丢弃而不是排队，端到端延迟因此有界（最新帧优先）。
/// 核心不提供取消原语，取消即是不再对过期帧调用管线。
#[derive(Default, Debug)]
pub struct LatestFrameTask {
  max_frames: Option<usize>,
}

impl LatestFrameTask {
  pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
    self.max_frames = max_frames;
    self
  }

  pub fn run_task<E: TensorEngine, R: Render>(
    self,
    frames: Receiver<Frame>,
    detector: &Detector<E>,
    output: &mut R,
  ) -> anyhow::Result<()> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;

    let mut processed = 0usize;
    loop {
      // 发送端关闭即任务结束
      let frame = match frames.recv() {
        Ok(frame) => frame,
        Err(_) => break,
      };
      let (frame, dropped) = drain_to_latest(&frames, frame);
      if dropped > 0 {
        debug!("丢弃 {} 个过期帧", dropped);
      }

      let now = std::time::Instant::now();
      let detections = detector.process_frame(&frame)?;
      output.render_result(&frame, &detections)?;
      info!(
        "第 {} 帧处理完成，耗时 {:.2?}，检测到 {} 个目标",
        frame.index,
        now.elapsed(),
        detections.len()
      );

      processed += 1;
      if self.max_frames.map(|n| processed >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", processed);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，退出");
    Ok(())
  }
}

/// 清空通道中积压的帧，只保留最新一帧；返回保留的帧和丢弃数量
fn drain_to_latest(frames: &Receiver<Frame>, mut latest: Frame) -> (Frame, usize) {
  let mut dropped = 0usize;
  while let Ok(newer) = frames.try_recv() {
    latest = newer;
    dropped += 1;
  }
  (latest, dropped)
}
