// 该文件是 Renying （人影） 项目的一部分。
// tests/common/mod.rs - 集成测试公共工具
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

#![allow(dead_code)]

use std::{
  convert::Infallible,
  io::{BufRead, BufReader, Cursor, Write},
  net::TcpListener,
  path::{Path, PathBuf},
  sync::Mutex,
};

use image::{Rgb, RgbImage};

use renying::{
  config::AppConfig,
  frame::RgbNhwcFrame,
  model::{DetectItem, DetectResult, Model},
  pipeline::Pipeline,
};

/// 返回固定检测结果的模型，并记录最近一次输入的尺寸
pub struct ScriptedModel {
  items: Vec<DetectItem>,
  last_input: Mutex<Option<(usize, usize)>>,
}

impl ScriptedModel {
  pub fn new(items: Vec<DetectItem>) -> Self {
    ScriptedModel {
      items,
      last_input: Mutex::new(None),
    }
  }

  /// 混合了目标类别与其他类别的候选
  pub fn street() -> Self {
    Self::new(vec![
      item("Man", 0.92, [0.10, 0.20, 0.40, 0.90]),
      item("Car", 0.88, [0.50, 0.50, 0.95, 0.95]),
      item("Woman", 0.61, [0.55, 0.15, 0.80, 0.85]),
      item("Person", 0.70, [0.00, 0.00, 0.30, 0.30]),
      item("Woman", 0.05, [0.30, 0.30, 0.40, 0.40]),
    ])
  }

  pub fn last_input(&self) -> Option<(usize, usize)> {
    *self.last_input.lock().unwrap()
  }
}

impl Model for ScriptedModel {
  type Input = RgbNhwcFrame;
  type Output = DetectResult;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    *self.last_input.lock().unwrap() = Some((input.width(), input.height()));
    Ok(DetectResult::from(self.items.clone()))
  }
}

pub fn item(label: &str, score: f32, bbox: [f32; 4]) -> DetectItem {
  DetectItem {
    label: label.to_string(),
    score,
    bbox,
  }
}

/// 在目录中写入一张渐变 PNG
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
  let image = RgbImage::from_fn(width, height, |x, y| {
    Rgb([(x % 256) as u8, (y % 256) as u8, 128])
  });
  let path = dir.join(name);
  image.save(&path).unwrap();
  path
}

/// 编码一张渐变 PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
  let image = RgbImage::from_fn(width, height, |x, y| {
    Rgb([(x % 256) as u8, (y % 256) as u8, 64])
  });
  let mut bytes = Cursor::new(Vec::new());
  image
    .write_to(&mut bytes, image::ImageFormat::Png)
    .unwrap();
  bytes.into_inner()
}

/// 在本机启动只应答一次的 HTTP 服务，返回图像地址
pub fn serve_once(status: &str, content_type: &str, body: Vec<u8>) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();
  let head = format!(
    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
    status,
    content_type,
    body.len()
  );
  std::thread::spawn(move || {
    let (stream, _) = listener.accept().unwrap();
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    while reader.read_line(&mut line).unwrap() > 2 {
      line.clear();
    }
    let mut stream = reader.into_inner();
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
  });
  format!("http://{}/people.png", addr)
}

/// 输出目录位于给定目录下的默认配置
pub fn config_in(dir: &Path) -> AppConfig {
  let mut config = AppConfig::default();
  config.output.dir = dir.join("output");
  config.input.timeout_secs = 2;
  config
}

pub fn pipeline_in(dir: &Path) -> Pipeline<ScriptedModel> {
  Pipeline::new(ScriptedModel::street(), &config_in(dir)).unwrap()
}
