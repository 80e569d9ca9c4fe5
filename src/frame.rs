// 该文件是 Renying （人影） 项目的一部分。
// src/frame.rs - NHWC 帧定义
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

use image::RgbImage;
use ndarray::Array4;

const RGB_CHANNELS: usize = 3;

/// 模型输入帧，按 NHWC 排列的 RGB 字节
///
/// 尺寸随输入图像变化，SSD MobileNet 接受任意尺寸的输入。
#[derive(Debug, Clone)]
pub struct RgbNhwcFrame {
  width: usize,
  height: usize,
  data: Box<[u8]>,
}

impl RgbNhwcFrame {
  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn channels(&self) -> usize {
    RGB_CHANNELS
  }

  /// 转为 `[1, H, W, 3]` 的浮点张量，数值缩放到 `[0, 1]`
  pub fn to_normalized_tensor(&self) -> Array4<f32> {
    let data = &self.data;
    let width = self.width;
    Array4::from_shape_fn((1, self.height, self.width, RGB_CHANNELS), |(_, h, w, c)| {
      data[(h * width + w) * RGB_CHANNELS + c] as f32 / 255.0
    })
  }
}

impl From<&RgbImage> for RgbNhwcFrame {
  fn from(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    // RgbImage 的内存布局本身就是 HWC
    Self {
      width: width as usize,
      height: height as usize,
      data: image.as_raw().clone().into_boxed_slice(),
    }
  }
}
