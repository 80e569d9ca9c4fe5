// 该文件是 Renying （人影） 项目的一部分。
// src/model/ssd_mobilenet.rs - SSD MobileNet 检测模型
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

//! # SSD MobileNet 检测模型
//!
//! 加载导出为 ONNX 的 SSD MobileNet V2（Open Images V4）模型，使用 ONNX Runtime 推理。
//!
//! 模型约定：
//! - 输入：`[1, H, W, 3]` 的 `f32` 张量，RGB，数值范围 `[0, 1]`
//! - `detection_boxes`：`[N, 4]`，归一化的 `[y_min, x_min, y_max, x_max]`
//! - `detection_scores`：`[N]`
//! - `detection_class_labels`：`[N]`，类别编号（整数或浮点）
//!
//! 输出张量名称可以在配置文件中修改，允许带有批次维度。

use std::{
  path::PathBuf,
  time::Instant,
};

use ndarray::CowArray;
use ort::session::{
  Session,
  builder::{GraphOptimizationLevel, SessionBuilder},
};
use ort::value::DynValue;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
  config::ModelConfig,
  frame::RgbNhwcFrame,
  model::{DetectItem, DetectResult, LabelMap, Model},
};

#[derive(Error, Debug)]
pub enum SsdMobilenetError {
  #[error("模型加载错误: {0}: {1}")]
  ModelLoadError(PathBuf, std::io::Error),
  #[error("标签文件加载错误: {0}: {1}")]
  LabelLoadError(PathBuf, std::io::Error),
  #[error("ONNX Runtime 错误: {0}")]
  OrtError(#[from] ort::Error),
  #[error("模型缺少输出: {0}")]
  MissingOutput(String),
  #[error("模型输出形状不匹配: {0}")]
  ShapeMismatch(String),
}

pub struct SsdMobilenetBuilder {
  model_path: PathBuf,
  labels_path: PathBuf,
  intra_threads: usize,
  boxes_output: String,
  scores_output: String,
  classes_output: String,
}

impl From<&ModelConfig> for SsdMobilenetBuilder {
  fn from(config: &ModelConfig) -> Self {
    SsdMobilenetBuilder {
      model_path: config.path.clone(),
      labels_path: config.labels.clone(),
      intra_threads: config.intra_threads,
      boxes_output: config.boxes_output.clone(),
      scores_output: config.scores_output.clone(),
      classes_output: config.classes_output.clone(),
    }
  }
}

impl SsdMobilenetBuilder {
  pub fn build(self) -> Result<SsdMobilenet, SsdMobilenetError> {
    let now = Instant::now();

    info!("加载模型文件: {}", self.model_path.display());
    let metadata = std::fs::metadata(&self.model_path)
      .map_err(|e| SsdMobilenetError::ModelLoadError(self.model_path.clone(), e))?;
    debug!(
      "模型文件大小: {:.2} MB",
      metadata.len() as f64 / (1024.0 * 1024.0)
    );

    let labels = LabelMap::load(&self.labels_path)
      .map_err(|e| SsdMobilenetError::LabelLoadError(self.labels_path.clone(), e))?;

    info!("创建 ONNX Runtime 推理会话");
    let mut builder =
      SessionBuilder::new()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
    if self.intra_threads > 0 {
      builder = builder.with_intra_threads(self.intra_threads)?;
    }
    let session = builder.commit_from_file(&self.model_path)?;

    for input in session.inputs.iter() {
      debug!("模型输入: {} {:?}", input.name, input.input_type);
    }
    for output in session.outputs.iter() {
      debug!("模型输出: {} {:?}", output.name, output.output_type);
    }

    for name in [&self.boxes_output, &self.scores_output, &self.classes_output] {
      if !session.outputs.iter().any(|o| &o.name == name) {
        error!("模型缺少输出: {}", name);
        return Err(SsdMobilenetError::MissingOutput(name.clone()));
      }
    }

    info!(
      "模型加载完成，{} 个类别，耗时: {:.2?}",
      labels.len(),
      now.elapsed()
    );

    Ok(SsdMobilenet {
      session,
      labels,
      boxes_output: self.boxes_output,
      scores_output: self.scores_output,
      classes_output: self.classes_output,
    })
  }
}

pub struct SsdMobilenet {
  session: Session,
  labels: LabelMap,
  boxes_output: String,
  scores_output: String,
  classes_output: String,
}

/// 类别输出可能被导出为整数或浮点
fn extract_class_ids(value: &DynValue) -> Result<Vec<i64>, SsdMobilenetError> {
  if let Ok(ids) = value.try_extract_tensor::<i64>() {
    return Ok(ids.iter().copied().collect());
  }
  if let Ok(ids) = value.try_extract_tensor::<i32>() {
    return Ok(ids.iter().map(|&id| id as i64).collect());
  }
  let ids = value.try_extract_tensor::<f32>()?;
  Ok(ids.iter().map(|&id| id.round() as i64).collect())
}

/// 将扁平化的模型输出转换为检测结果
///
/// `boxes` 每 4 个数为一组 `[y_min, x_min, y_max, x_max]`，转换为 `[x_min, y_min, x_max, y_max]`
/// 并截断到 `[0, 1]`。
pub fn decode_detections(
  boxes: &[f32],
  scores: &[f32],
  class_ids: &[i64],
  labels: &LabelMap,
) -> Result<DetectResult, SsdMobilenetError> {
  if boxes.len() != scores.len() * 4 || class_ids.len() != scores.len() {
    return Err(SsdMobilenetError::ShapeMismatch(format!(
      "检测框 {} 个数值, 置信度 {} 个, 类别 {} 个",
      boxes.len(),
      scores.len(),
      class_ids.len()
    )));
  }

  let items = boxes
    .chunks_exact(4)
    .zip(scores)
    .zip(class_ids)
    .map(|((b, &score), &id)| DetectItem {
      label: labels.name(id).to_string(),
      score,
      bbox: [
        b[1].clamp(0.0, 1.0),
        b[0].clamp(0.0, 1.0),
        b[3].clamp(0.0, 1.0),
        b[2].clamp(0.0, 1.0),
      ],
    })
    .collect::<Vec<_>>();

  Ok(DetectResult::from(items))
}

impl Model for SsdMobilenet {
  type Input = RgbNhwcFrame;
  type Output = DetectResult;
  type Error = SsdMobilenetError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入: {}x{}", input.width(), input.height());
    let tensor = CowArray::from(input.to_normalized_tensor().into_dyn());

    debug!("执行模型推理");
    let outputs = self.session.run(ort::inputs![tensor.view()]?)?;

    debug!("获取模型输出");
    let get = |name: &String| {
      outputs
        .get(name.as_str())
        .ok_or_else(|| SsdMobilenetError::MissingOutput(name.clone()))
    };

    let boxes = get(&self.boxes_output)?.try_extract_tensor::<f32>()?;
    let scores = get(&self.scores_output)?.try_extract_tensor::<f32>()?;
    let class_ids = extract_class_ids(get(&self.classes_output)?)?;

    let boxes = boxes.iter().copied().collect::<Vec<_>>();
    let scores = scores.iter().copied().collect::<Vec<_>>();

    let result = decode_detections(&boxes, &scores, &class_ids, &self.labels)?;
    debug!("模型返回 {} 个候选检测", result.len());
    Ok(result)
  }
}
