// 该文件是 Renying （人影） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
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

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
  drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size},
  rect::Rect,
};

use crate::{
  model::{DetectItem, DetectResult},
  output::OutputError,
};

static FONT_DATA: &[u8] = include_bytes!("../../assets/font.ttf");

// 绘制常量
const BOX_THICKNESS: i32 = 4;
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_MARGIN_RATIO: f32 = 0.05;
const LABEL_TEXT_COLOR: [u8; 3] = [0, 0, 0]; // 黑色
const PALETTE_SIZE: usize = 24;

pub struct Draw {
  font: FontRef<'static>,
  font_size: f32,
  thickness: i32,
  colors: Vec<Rgb<u8>>,
}

impl Draw {
  pub fn new() -> Result<Self, OutputError> {
    let font = FontRef::try_from_slice(FONT_DATA).map_err(|_| OutputError::FontError)?;

    let colors = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        hsv_to_rgb(hue, 0.8, 0.95)
      })
      .collect();

    Ok(Self {
      font,
      font_size: LABEL_FONT_SIZE,
      thickness: BOX_THICKNESS,
      colors,
    })
  }

  /// 同一类别总是使用同一种颜色
  pub fn color_for(&self, label: &str) -> Rgb<u8> {
    self.colors[(fnv1a(label.as_bytes()) % self.colors.len() as u64) as usize]
  }

  /// 在原图的副本上绘制检测结果
  pub fn render(&self, image: &RgbImage, result: &DetectResult) -> RgbImage {
    let mut canvas = image.clone();
    self.draw_detections_on_image(&mut canvas, result);
    canvas
  }

  pub fn draw_detections_on_image(&self, image: &mut RgbImage, result: &DetectResult) {
    for item in result.items.iter() {
      self.draw_bbox_with_label(image, item);
    }
  }

  // bbox 为归一化坐标 [x_min, y_min, x_max, y_max]
  fn draw_bbox_with_label(&self, image: &mut RgbImage, item: &DetectItem) {
    let DetectItem { label, score, bbox } = item;
    let (w, h) = (image.width() as f32, image.height() as f32);

    let x_min = ((bbox[0] * w).floor() as i32).clamp(0, w as i32 - 1);
    let y_min = ((bbox[1] * h).floor() as i32).clamp(0, h as i32 - 1);
    let x_max = ((bbox[2] * w).ceil() as i32).clamp(0, w as i32 - 1);
    let y_max = ((bbox[3] * h).ceil() as i32).clamp(0, h as i32 - 1);

    if x_min >= x_max || y_min >= y_max {
      return;
    }

    let color = self.color_for(label);

    // 由外向内逐层绘制边框
    for t in 0..self.thickness {
      let width = x_max - x_min - 2 * t + 1;
      let height = y_max - y_min - 2 * t + 1;
      if width <= 0 || height <= 0 {
        break;
      }
      let rect = Rect::at(x_min + t, y_min + t).of_size(width as u32, height as u32);
      draw_hollow_rect_mut(image, rect, color);
    }

    let text = format!("{}: {}%", label, (score * 100.0) as i32);
    let scale = PxScale::from(self.font_size);
    let (text_width, text_height) = text_size(scale, &self.font, &text);
    let margin = (LABEL_MARGIN_RATIO * text_height as f32).ceil() as i32;
    let label_height = text_height as i32 + 2 * margin;
    let label_width = text_width as i32 + 2 * margin;

    // 上方放不下标签时，画在边框内侧
    let label_y = if y_min >= label_height {
      y_min - label_height
    } else {
      y_min
    };

    if label_width > 0 && label_height > 0 {
      let rect = Rect::at(x_min, label_y).of_size(label_width as u32, label_height as u32);
      draw_filled_rect_mut(image, rect, color);
      draw_text_mut(
        image,
        Rgb(LABEL_TEXT_COLOR),
        x_min + margin,
        label_y + margin,
        scale,
        &self.font,
        &text,
      );
    }
  }
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
  let c = v * s;
  let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
  let m = v - c;

  let (r, g, b) = if h < 60.0 {
    (c, x, 0.0)
  } else if h < 120.0 {
    (x, c, 0.0)
  } else if h < 180.0 {
    (0.0, c, x)
  } else if h < 240.0 {
    (0.0, x, c)
  } else if h < 300.0 {
    (x, 0.0, c)
  } else {
    (c, 0.0, x)
  };

  Rgb([
    ((r + m) * 255.0) as u8,
    ((g + m) * 255.0) as u8,
    ((b + m) * 255.0) as u8,
  ])
}

// 与进程无关的稳定哈希
fn fnv1a(bytes: &[u8]) -> u64 {
  bytes.iter().fold(0xcbf29ce484222325, |hash, &b| {
    (hash ^ b as u64).wrapping_mul(0x100000001b3)
  })
}
