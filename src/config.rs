// 该文件是 Renying （人影） 项目的一部分。
// src/config.rs - 配置文件
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

//! # 配置
//!
//! 配置使用 TOML 格式，查找顺序：
//! 1. 命令行 `--config` 指定的文件（必须存在）
//! 2. 当前目录下的 `renying.toml`
//! 3. 内置默认值
//!
//! 环境变量 `RENYING_MODEL` 可以覆盖 `[model] path`。
//!
//! ```toml
//! [model]
//! path = "models/ssd_mobilenet_v2_oidv4.onnx"
//! labels = "models/oidv4_labels.txt"
//!
//! [detector]
//! classes = ["Man", "Woman"]
//! min_score = 0.1
//! max_boxes = 10
//!
//! [input]
//! timeout_secs = 30
//! max_bytes = 33554432
//!
//! [preprocess]
//! fit = [640, 480]
//!
//! [output]
//! dir = "output"
//! jpeg_quality = 90
//! ```

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// 当前目录下默认的配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "renying.toml";

/// 覆盖模型路径的环境变量
pub const MODEL_PATH_ENV: &str = "RENYING_MODEL";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("配置文件不存在: {0}")]
  NotFound(PathBuf),
  #[error("读取配置文件失败: {0}")]
  Io(#[from] std::io::Error),
  #[error("配置文件格式错误: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("配置项无效: {0}")]
  Invalid(String),
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub model: ModelConfig,
  pub detector: DetectorConfig,
  pub input: InputConfig,
  pub preprocess: PreprocessConfig,
  pub output: OutputConfig,
  pub web: WebConfig,
}

/// 模型文件与输出张量名称
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
  /// ONNX 模型文件路径
  pub path: PathBuf,
  /// 标签文件路径，每行一个类别名，行号即类别编号
  pub labels: PathBuf,
  /// 推理线程数，0 表示由运行时决定
  pub intra_threads: usize,
  pub boxes_output: String,
  pub scores_output: String,
  pub classes_output: String,
}

impl Default for ModelConfig {
  fn default() -> Self {
    Self {
      path: PathBuf::from("models/ssd_mobilenet_v2_oidv4.onnx"),
      labels: PathBuf::from("models/oidv4_labels.txt"),
      intra_threads: 0,
      boxes_output: "detection_boxes".to_string(),
      scores_output: "detection_scores".to_string(),
      classes_output: "detection_class_labels".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
  /// 保留的类别
  pub classes: Vec<String>,
  /// 最低置信度
  pub min_score: f32,
  /// 单张图像最多保留的检测框数量
  pub max_boxes: usize,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self {
      classes: vec!["Man".to_string(), "Woman".to_string()],
      min_score: 0.1,
      max_boxes: 10,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
  /// 网络图像下载超时（秒）
  pub timeout_secs: u64,
  /// 网络图像最大字节数
  pub max_bytes: u64,
}

impl Default for InputConfig {
  fn default() -> Self {
    Self {
      timeout_secs: 30,
      max_bytes: 32 * 1024 * 1024,
    }
  }
}

impl InputConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs)
  }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
  /// 推理前裁剪缩放到固定尺寸 `[宽, 高]`，不设置则保持原尺寸
  pub fit: Option<[u32; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
  /// 结果图像根目录
  pub dir: PathBuf,
  /// 推理前图像的暂存目录，不设置则不保存
  pub staging_dir: Option<PathBuf>,
  pub jpeg_quality: u8,
  /// 在结果图像旁写入 JSON 检测记录
  pub record: bool,
}

impl Default for OutputConfig {
  fn default() -> Self {
    Self {
      dir: PathBuf::from("output"),
      staging_dir: None,
      jpeg_quality: 90,
      record: false,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
  pub bind: String,
}

impl Default for WebConfig {
  fn default() -> Self {
    Self {
      bind: "0.0.0.0:3000".to_string(),
    }
  }
}

impl AppConfig {
  /// 按查找顺序加载配置并校验
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let mut config = match explicit {
      Some(path) => {
        if !path.exists() {
          return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::from_file(path)?
      }
      None => {
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
          Self::from_file(local)?
        } else {
          debug!("未找到配置文件，使用默认配置");
          Self::default()
        }
      }
    };

    if let Ok(model) = std::env::var(MODEL_PATH_ENV)
      && !model.is_empty()
    {
      info!("使用环境变量 {} 指定的模型: {}", MODEL_PATH_ENV, model);
      config.model.path = PathBuf::from(model);
    }

    config.validate()?;
    Ok(config)
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    info!("加载配置文件: {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Self::from_toml(&text)
  }

  pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(text)?)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&self.detector.min_score) {
      return Err(ConfigError::Invalid(format!(
        "detector.min_score 必须在 0.0-1.0 之间, 实际为 {}",
        self.detector.min_score
      )));
    }
    if self.detector.classes.is_empty() {
      return Err(ConfigError::Invalid("detector.classes 不能为空".to_string()));
    }
    if !(1..=100).contains(&self.output.jpeg_quality) {
      return Err(ConfigError::Invalid(format!(
        "output.jpeg_quality 必须在 1-100 之间, 实际为 {}",
        self.output.jpeg_quality
      )));
    }
    if self.input.max_bytes == 0 {
      return Err(ConfigError::Invalid("input.max_bytes 不能为 0".to_string()));
    }
    if let Some([w, h]) = self.preprocess.fit
      && (w == 0 || h == 0)
    {
      return Err(ConfigError::Invalid(format!(
        "preprocess.fit 尺寸不能为 0, 实际为 {}x{}",
        w, h
      )));
    }
    Ok(())
  }
}
