// 该文件是 Renying （人影） 项目的一部分。
// src/input/local_file.rs - 本地图像文件输入
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

use std::{io::ErrorKind, path::Path};

use tracing::{error, info};

use super::{InputError, ResolvedImage, SourceKind};

/// 读取本地图像文件，输出文件以源文件名（不含扩展名）命名
pub fn read_local_image(path: &Path) -> Result<ResolvedImage, InputError> {
  let bytes = match std::fs::read(path) {
    Ok(bytes) => bytes,
    Err(e) if e.kind() == ErrorKind::NotFound => {
      error!("图像文件不存在: {}", path.display());
      return Err(InputError::NotFound(path.to_path_buf()));
    }
    Err(e) => return Err(InputError::Io(e)),
  };

  let identifier = path
    .file_stem()
    .and_then(|s| s.to_str())
    .filter(|s| !s.is_empty())
    .map(String::from)
    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

  info!("读取本地图像: {} ({} 字节)", path.display(), bytes.len());

  Ok(ResolvedImage {
    bytes,
    identifier,
    kind: SourceKind::Local,
  })
}
