// 该文件是 Qingniao （青鸟） 项目的一部分。
// src/main.rs - 项目主程序
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;

use qingniao::detector::{Detection, Detector, DetectorConfig};
use qingniao::engine::ReplayEngine;
use qingniao::frame::Frame;
use qingniao::labels::LabelTable;
use qingniao::output::{OutputError, Render, announce_top_detection};
use qingniao::task::{LatestFrameTask, OneShotTask};

/// 控制台报告输出，按配置附带图像标注与检测记录
struct ReportOutput {
  #[cfg(feature = "save_image_file")]
  image_output: Option<qingniao::output::ImageFileOutput>,
  #[cfg(feature = "directory_record")]
  record_path: Option<std::path::PathBuf>,
}

impl ReportOutput {
  fn from_args(args: &args::Args) -> Result<Self> {
    #[cfg(feature = "save_image_file")]
    let image_output = match &args.output {
      Some(path) => {
        let mut draw = qingniao::output::Draw::default();
        if let Some(font) = &args.font {
          draw = draw
            .with_font_file(font)
            .with_context(|| format!("无法加载字体文件: {}", font))?;
        }
        Some(qingniao::output::ImageFileOutput::new(draw, path))
      }
      None => None,
    };

    Ok(Self {
      #[cfg(feature = "save_image_file")]
      image_output,
      #[cfg(feature = "directory_record")]
      record_path: args.record.as_ref().map(std::path::PathBuf::from),
    })
  }
}

impl Render for ReportOutput {
  type Error = OutputError;

  fn render_result(&mut self, frame: &Frame, detections: &[Detection]) -> Result<(), Self::Error> {
    println!(
      "帧 {} (时间: {}ms): 检测到 {} 个目标",
      frame.index,
      frame.timestamp_ms,
      detections.len()
    );
    for det in detections {
      println!(
        "  - {}: {:.2}% at ({:.0}, {:.0}, {:.0}, {:.0})",
        det.label,
        det.confidence * 100.0,
        det.bbox.left,
        det.bbox.top,
        det.bbox.right,
        det.bbox.bottom
      );
    }
    if let Some(message) = announce_top_detection(detections) {
      println!("  语音播报: {}", message);
    }

    #[cfg(feature = "save_image_file")]
    if let Some(image_output) = &mut self.image_output {
      image_output.render_result(frame, detections)?;
    }

    #[cfg(feature = "directory_record")]
    if let Some(path) = &self.record_path {
      qingniao::output::Record::default().record(detections, path)?;
    }

    Ok(())
  }
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();
  let args = args::Args::parse();

  println!("Qingniao 检测后处理管线");
  println!("======================");
  println!("张量转储: {}", args.tensor);
  println!("输入图像: {}", args.image);
  println!("标签文件: {}", args.labels);
  println!("置信度阈值: {}", args.confidence);
  println!("NMS 阈值: {}", args.nms_threshold);
  println!();

  // 标签与回放引擎只在启动时加载一次
  let labels = LabelTable::from_file(&args.labels);
  let engine = ReplayEngine::from_file(&args.tensor)
    .with_context(|| format!("无法加载张量转储: {}", args.tensor))?;

  let config = DetectorConfig {
    conf_threshold: args.confidence,
    iou_threshold: args.nms_threshold,
    coordinate_space: args.coord_space.into(),
    input_size: args.input_size,
  };
  let detector = Detector::new(engine, config, labels).context("检测器初始化失败")?;

  let image = image::open(&args.image)
    .with_context(|| format!("无法读取图像: {}", args.image))?
    .to_rgb8();
  println!("图像尺寸: {}x{}", image.width(), image.height());
  println!();

  let frame = Frame::new(image, 0, 0);
  let mut output = ReportOutput::from_args(&args)?;

  if args.repeat > 0 {
    // 模拟连续帧流：生产端快速发帧，任务循环按最新帧优先处理
    let (tx, rx) = std::sync::mpsc::channel();
    let template = frame;
    let repeat = args.repeat;
    std::thread::spawn(move || {
      for i in 0..repeat {
        let mut frame = template.clone();
        frame.index = i;
        frame.timestamp_ms = i * 33;
        if tx.send(frame).is_err() {
          break;
        }
      }
    });
    LatestFrameTask::default().run_task(rx, &detector, &mut output)?;
  } else {
    OneShotTask.run_task(&frame, &detector, &mut output)?;
  }

  println!();
  println!("处理完成!");
  Ok(())
}
