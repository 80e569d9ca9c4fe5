// 该文件是 Renying （人影） 项目的一部分。
// src/args.rs - 命令行参数
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use clap::Parser;

use renying::input::SourceKind;

/// Renying 人像检测
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 图像的本地路径或网络地址
  #[arg(short, long, value_name = "IMAGE")]
  pub image: String,

  /// 图像来源类型: local 或 online
  #[arg(short = 't', long = "type", value_name = "TYPE")]
  pub kind: SourceKind,

  /// 配置文件路径，缺省时查找当前目录下的 renying.toml
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// 日志详细程度，可重复
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,
}
