// 该文件是 Renying （人影） 项目的一部分。
// src/pipeline.rs - 检测流程
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

//! # 检测流程
//!
//! 读取 → 推理 → 过滤 → 绘制 → 保存，三个前端共用同一个 [`Pipeline`]。
//! 模型在进程启动时加载一次，之后只读共享。

use std::{path::PathBuf, time::Instant};

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
  config::{AppConfig, InputConfig},
  frame::RgbNhwcFrame,
  input::{ImageSource, InputError, ResolvedImage, SourceKind, fit_image},
  model::{DetectResult, Model},
  output::{OutputDirectory, OutputError, draw::Draw},
};

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error(transparent)]
  Input(#[from] InputError),
  #[error("推理失败: {0}")]
  Inference(Box<dyn std::error::Error + Send + Sync>),
  #[error(transparent)]
  Output(#[from] OutputError),
}

/// 面向用户的错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Fetch,
  Inference,
  Io,
  InvalidInput,
}

impl PipelineError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      PipelineError::Input(InputError::NotFound(_)) => ErrorKind::NotFound,
      PipelineError::Input(
        InputError::Fetch(_) | InputError::FetchStatus { .. } | InputError::TooLarge { .. },
      ) => ErrorKind::Fetch,
      PipelineError::Input(InputError::Io(_)) => ErrorKind::Io,
      PipelineError::Input(_) => ErrorKind::InvalidInput,
      PipelineError::Inference(_) => ErrorKind::Inference,
      PipelineError::Output(_) => ErrorKind::Io,
    }
  }
}

/// 单次检测的结果
#[derive(Debug, Clone)]
pub struct Outcome {
  pub path: PathBuf,
  /// 写入 `path` 的 JPEG 字节
  pub jpeg: Vec<u8>,
  pub image: RgbImage,
  pub detections: DetectResult,
}

pub struct Pipeline<M> {
  model: M,
  draw: Draw,
  output: OutputDirectory,
  staging: Option<OutputDirectory>,
  classes: Vec<String>,
  min_score: f32,
  max_boxes: usize,
  fit: Option<[u32; 2]>,
  limits: InputConfig,
}

impl<M> Pipeline<M>
where
  M: Model<Input = RgbNhwcFrame, Output = DetectResult>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  pub fn new(model: M, config: &AppConfig) -> Result<Self, PipelineError> {
    Ok(Pipeline {
      model,
      draw: Draw::new()?,
      output: OutputDirectory::new(&config.output.dir, config.output.jpeg_quality)
        .with_record(config.output.record),
      staging: config
        .output
        .staging_dir
        .as_ref()
        .map(|dir| OutputDirectory::new(dir, config.output.jpeg_quality)),
      classes: config.detector.classes.clone(),
      min_score: config.detector.min_score,
      max_boxes: config.detector.max_boxes,
      fit: config.preprocess.fit,
      limits: config.input.clone(),
    })
  }

  pub fn model(&self) -> &M {
    &self.model
  }

  /// 读取来源图像，供需要提前校验输入的前端使用
  pub fn resolve(&self, source: &ImageSource) -> Result<ResolvedImage, PipelineError> {
    Ok(source.resolve(&self.limits)?)
  }

  /// 由路径字符串与类型标记执行完整流程
  pub fn detect(&self, location: &str, kind: SourceKind) -> Result<Outcome, PipelineError> {
    let source = ImageSource::new(location, kind)?;
    self.run(&source)
  }

  pub fn run(&self, source: &ImageSource) -> Result<Outcome, PipelineError> {
    info!("开始任务: {} ({})", source, source.kind());
    let resolved = self.resolve(source)?;
    self.process(&resolved)
  }

  /// 对已读取的图像执行推理、过滤、绘制与保存
  pub fn process(&self, resolved: &ResolvedImage) -> Result<Outcome, PipelineError> {
    let mut image = resolved.decode()?;
    if let Some([width, height]) = self.fit {
      debug!("裁剪缩放图像到 {}x{}", width, height);
      image = fit_image(&image, width, height);
    }

    if let Some(staging) = &self.staging {
      staging.save_image(&image, resolved)?;
    }

    let frame = RgbNhwcFrame::from(&image);
    info!("开始推理...");
    let now = Instant::now();
    let raw = self
      .model
      .infer(&frame)
      .map_err(|e| PipelineError::Inference(Box::new(e)))?;
    info!(
      "推理完成，共 {} 个候选，耗时: {:.2?}",
      raw.len(),
      now.elapsed()
    );

    let detections = raw.retain_classes(&self.classes, self.min_score, self.max_boxes);
    for item in detections.items.iter() {
      info!(
        "  - {}: {:.2}% at [{:.3}, {:.3}, {:.3}, {:.3}]",
        item.label,
        item.score * 100.0,
        item.bbox[0],
        item.bbox[1],
        item.bbox[2],
        item.bbox[3]
      );
    }

    let rendered = self.draw.render(&image, &detections);
    let saved = self.output.save_result(&rendered, resolved, &detections)?;
    info!("检测到 {} 个目标，结果: {}", detections.len(), saved.path.display());

    Ok(Outcome {
      path: saved.path,
      jpeg: saved.jpeg,
      image: rendered,
      detections,
    })
  }
}
