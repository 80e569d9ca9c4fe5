// 该文件是 Renying （人影） 项目的一部分。
// src/model/labels.rs - 类别标签表
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

use std::path::Path;

use tracing::debug;

const UNKNOWN_LABEL: &str = "???";

/// 类别编号到名称的映射，文件中第 N 行（从 0 开始）即编号 N
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
  names: Vec<String>,
}

impl LabelMap {
  pub fn load(path: &Path) -> Result<Self, std::io::Error> {
    let text = std::fs::read_to_string(path)?;
    let map = Self::parse(&text);
    debug!("加载标签文件: {} ({} 个类别)", path.display(), map.len());
    Ok(map)
  }

  pub fn parse(text: &str) -> Self {
    LabelMap {
      names: text.lines().map(|line| line.trim().to_string()).collect(),
    }
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn name(&self, id: i64) -> &str {
    usize::try_from(id)
      .ok()
      .and_then(|i| self.names.get(i))
      .map(String::as_str)
      .unwrap_or(UNKNOWN_LABEL)
  }
}

impl<S: Into<String>> FromIterator<S> for LabelMap {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    LabelMap {
      names: iter.into_iter().map(Into::into).collect(),
    }
  }
}
