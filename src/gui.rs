// 该文件是 Renying （人影） 项目的一部分。
// src/gui.rs - 桌面文件选择界面
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use tracing::{info, warn};

use crate::{
  frame::RgbNhwcFrame,
  input::ImageSource,
  model::{DetectResult, Model},
  pipeline::{Outcome, Pipeline, PipelineError},
};

const WINDOW_TITLE: &str = "Object Detection";
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];

/// 弹出文件选择框，返回 `None` 表示用户取消
pub fn pick_image() -> Option<PathBuf> {
  FileDialog::new()
    .set_title("选择一张图像")
    .add_filter("图像", IMAGE_EXTENSIONS)
    .pick_file()
}

/// 生成结果提示文本
pub fn summary(result: &Result<Outcome, PipelineError>) -> (MessageLevel, String) {
  match result {
    Ok(outcome) => {
      let mut text = format!(
        "检测到 {} 个目标\n结果已保存到: {}",
        outcome.detections.len(),
        outcome.path.display()
      );
      for item in outcome.detections.items.iter() {
        text.push_str(&format!("\n  {}: {}%", item.label, (item.score * 100.0) as i32));
      }
      (MessageLevel::Info, text)
    }
    Err(e) => (MessageLevel::Error, format!("检测失败: {}", e)),
  }
}

/// 选择文件 → 检测 → 提示结果，直到用户取消
pub fn run<M>(pipeline: &Pipeline<M>)
where
  M: Model<Input = RgbNhwcFrame, Output = DetectResult>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  while let Some(path) = pick_image() {
    info!("选择图像: {}", path.display());
    let result = pipeline.run(&ImageSource::Local(path));
    if let Err(e) = &result {
      warn!("检测失败: {}", e);
    }

    let (level, text) = summary(&result);
    let answer = MessageDialog::new()
      .set_title(WINDOW_TITLE)
      .set_level(level)
      .set_description(format!("{}\n\n继续检测其他图像？", text))
      .set_buttons(MessageButtons::YesNo)
      .show();

    if answer != MessageDialogResult::Yes {
      break;
    }
  }
  info!("界面关闭");
}
