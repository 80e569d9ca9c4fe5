// 该文件是 Renying （人影） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::{io::Cursor, path::PathBuf};

use image::{RgbImage, codecs::jpeg::JpegEncoder};
use tracing::{info, warn};

use crate::{input::ResolvedImage, model::DetectResult, output::OutputError};

/// 已写入磁盘的图像，以及写入的 JPEG 字节
#[derive(Debug, Clone)]
pub struct SavedImage {
  pub path: PathBuf,
  pub jpeg: Vec<u8>,
}

/// 按来源类型分目录保存图像：`<root>/<local|online>/<标识>.jpg`
#[derive(Debug, Clone)]
pub struct OutputDirectory {
  root: PathBuf,
  jpeg_quality: u8,
  record: bool,
}

impl OutputDirectory {
  pub fn new(root: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
    OutputDirectory {
      root: root.into(),
      jpeg_quality,
      record: false,
    }
  }

  /// 同时写入 JSON 检测记录
  pub fn with_record(mut self, record: bool) -> Self {
    self.record = record;
    self
  }

  pub fn target_path(&self, source: &ResolvedImage) -> PathBuf {
    self
      .root
      .join(source.kind.as_str())
      .join(format!("{}.jpg", source.identifier))
  }

  pub fn encode(&self, image: &RgbImage) -> Result<Vec<u8>, OutputError> {
    let mut jpeg = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality);
    image.write_with_encoder(encoder)?;
    Ok(jpeg.into_inner())
  }

  /// 先写入同目录下的临时文件再重命名，同名输出的并发写入不会读到截断的文件
  pub fn save_image(
    &self,
    image: &RgbImage,
    source: &ResolvedImage,
  ) -> Result<SavedImage, OutputError> {
    let path = self.target_path(source);
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).inspect_err(|e| {
        warn!("无法创建输出目录 {}: {}", parent.display(), e);
      })?;
    }

    let jpeg = self.encode(image)?;
    let partial = path.with_extension(format!("{}.part", uuid::Uuid::new_v4().simple()));
    std::fs::write(&partial, &jpeg)?;
    std::fs::rename(&partial, &path).inspect_err(|_| {
      let _ = std::fs::remove_file(&partial);
    })?;

    info!("保存图像到文件: {}", path.display());
    Ok(SavedImage { path, jpeg })
  }

  /// 保存结果图像，按需在旁边写入 `<标识>.json` 检测记录
  pub fn save_result(
    &self,
    image: &RgbImage,
    source: &ResolvedImage,
    result: &DetectResult,
  ) -> Result<SavedImage, OutputError> {
    let saved = self.save_image(image, source)?;
    if self.record {
      let record = saved.path.with_extension("json");
      std::fs::write(&record, serde_json::to_vec_pretty(result)?)?;
      info!("保存检测记录: {}", record.display());
    }
    Ok(saved)
  }
}
