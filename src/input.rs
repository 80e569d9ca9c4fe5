// 该文件是 Renying （人影） 项目的一部分。
// src/input.rs - 图像输入
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

use std::{fmt, path::PathBuf, str::FromStr};

use image::{RgbImage, imageops::FilterType};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{FromUrl, config::InputConfig};

mod local_file;
mod remote_url;

pub use self::local_file::read_local_image;
pub use self::remote_url::fetch_remote_image;

#[derive(Error, Debug)]
pub enum InputError {
  #[error("图像文件不存在: {0}")]
  NotFound(PathBuf),
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("下载图像失败: {0}")]
  Fetch(#[from] reqwest::Error),
  #[error("下载图像失败: {url} 返回状态 {status}")]
  FetchStatus { url: String, status: u16 },
  #[error("网络图像过大: {url} 超过 {limit} 字节")]
  TooLarge { url: String, limit: u64 },
  #[error("无效的 URL: {0}")]
  InvalidUrl(#[from] url::ParseError),
  #[error("URI scheme mismatch: {0}")]
  SchemeMismatch(String),
  #[error("无法识别的图像类型 '{0}'，请使用 'online' 或 'local'")]
  UnknownKind(String),
  #[error("图像解码失败: {0}")]
  Decode(#[from] image::ImageError),
}

/// 图像来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
  Local,
  Online,
}

impl SourceKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      SourceKind::Local => "local",
      SourceKind::Online => "online",
    }
  }
}

impl fmt::Display for SourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SourceKind {
  type Err = InputError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "local" => Ok(SourceKind::Local),
      "online" => Ok(SourceKind::Online),
      other => Err(InputError::UnknownKind(other.to_string())),
    }
  }
}

/// 图像来源：本地文件或网络地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
  Local(PathBuf),
  Online(Url),
}

impl ImageSource {
  /// 由路径字符串与类型标记构造
  pub fn new(location: &str, kind: SourceKind) -> Result<Self, InputError> {
    match kind {
      SourceKind::Local => Ok(ImageSource::Local(PathBuf::from(location))),
      SourceKind::Online => Self::from_url(&Url::parse(location)?),
    }
  }

  pub fn kind(&self) -> SourceKind {
    match self {
      ImageSource::Local(_) => SourceKind::Local,
      ImageSource::Online(_) => SourceKind::Online,
    }
  }

  /// 读取或下载原始图像字节
  pub fn resolve(&self, limits: &InputConfig) -> Result<ResolvedImage, InputError> {
    match self {
      ImageSource::Local(path) => read_local_image(path),
      ImageSource::Online(url) => fetch_remote_image(url, limits),
    }
  }
}

impl fmt::Display for ImageSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ImageSource::Local(path) => write!(f, "{}", path.display()),
      ImageSource::Online(url) => write!(f, "{}", url),
    }
  }
}

impl FromUrl for ImageSource {
  type Error = InputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      "http" | "https" => Ok(ImageSource::Online(url.clone())),
      "file" => url
        .to_file_path()
        .map(ImageSource::Local)
        .map_err(|_| InputError::SchemeMismatch(url.to_string())),
      other => Err(InputError::SchemeMismatch(other.to_string())),
    }
  }
}

/// 已读取的图像字节，以及用于命名输出文件的标识
#[derive(Debug, Clone)]
pub struct ResolvedImage {
  pub bytes: Vec<u8>,
  pub identifier: String,
  pub kind: SourceKind,
}

impl ResolvedImage {
  /// 解码为 RGB 图像
  pub fn decode(&self) -> Result<RgbImage, InputError> {
    let image = image::load_from_memory(&self.bytes)?;
    debug!(
      "图像解码完成: {}x{} ({})",
      image.width(),
      image.height(),
      self.identifier
    );
    Ok(image.to_rgb8())
  }
}

/// 居中裁剪并缩放到指定尺寸
pub fn fit_image(image: &RgbImage, width: u32, height: u32) -> RgbImage {
  if image.dimensions() == (width, height) {
    return image.clone();
  }
  image::DynamicImage::ImageRgb8(image.clone())
    .resize_to_fill(width, height, FilterType::Lanczos3)
    .to_rgb8()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn source_kind_parses_only_known_tags() {
    assert_eq!("local".parse::<SourceKind>().unwrap(), SourceKind::Local);
    assert_eq!("online".parse::<SourceKind>().unwrap(), SourceKind::Online);
    assert!(matches!(
      "Online".parse::<SourceKind>(),
      Err(InputError::UnknownKind(_))
    ));
    assert!(matches!(
      "remote".parse::<SourceKind>(),
      Err(InputError::UnknownKind(_))
    ));
  }

  #[test]
  fn online_source_requires_http_url() {
    let source = ImageSource::new("https://example.com/a.jpg", SourceKind::Online).unwrap();
    assert_eq!(source.kind(), SourceKind::Online);

    assert!(matches!(
      ImageSource::new("not a url", SourceKind::Online),
      Err(InputError::InvalidUrl(_))
    ));
    assert!(matches!(
      ImageSource::new("ftp://example.com/a.jpg", SourceKind::Online),
      Err(InputError::SchemeMismatch(_))
    ));
  }

  #[test]
  fn file_url_maps_to_local_source() {
    let url = Url::parse("file:///tmp/people.jpg").unwrap();
    let source = ImageSource::from_url(&url).unwrap();
    assert_eq!(source, ImageSource::Local(PathBuf::from("/tmp/people.jpg")));
  }

  #[test]
  fn fit_produces_requested_size() {
    let image = RgbImage::new(100, 50);
    let fitted = fit_image(&image, 640, 480);
    assert_eq!(fitted.dimensions(), (640, 480));
  }

  #[test]
  fn undecodable_bytes_are_decode_error() {
    let resolved = ResolvedImage {
      bytes: b"definitely not an image".to_vec(),
      identifier: "junk".to_string(),
      kind: SourceKind::Local,
    };
    assert!(matches!(resolved.decode(), Err(InputError::Decode(_))));
  }
}
