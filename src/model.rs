// 该文件是 Renying （人影） 项目的一部分。
// src/model.rs - 模型
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

use serde::Serialize;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectItem {
  pub label: String,
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，归一化坐标
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// 在模型输出的前 `max_boxes` 项中，保留目标类别且置信度不低于 `min_score` 的检测项
  ///
  /// 排在前面的其他类别同样占用名额。保持模型输出的顺序，不做额外的框合并。
  pub fn retain_classes<S: AsRef<str>>(
    &self,
    classes: &[S],
    min_score: f32,
    max_boxes: usize,
  ) -> DetectResult {
    let items = self
      .items
      .iter()
      .take(max_boxes)
      .filter(|item| classes.iter().any(|c| c.as_ref() == item.label))
      .filter(|item| item.score >= min_score)
      .cloned()
      .collect::<Vec<_>>();

    DetectResult {
      items: items.into_boxed_slice(),
    }
  }
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(items: Vec<DetectItem>) -> Self {
    DetectResult {
      items: items.into_boxed_slice(),
    }
  }
}

mod labels;
pub use self::labels::LabelMap;

mod ssd_mobilenet;
pub use self::ssd_mobilenet::{SsdMobilenet, SsdMobilenetBuilder, SsdMobilenetError, decode_detections};
