// 该文件是 Renying （人影） 项目的一部分。
// src/bin/gui.rs - 桌面界面主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use renying::{config::AppConfig, model::SsdMobilenetBuilder, pipeline::Pipeline};

/// Renying 桌面界面
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 配置文件路径
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// 日志详细程度，可重复
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,
}

fn main() -> Result<()> {
  let args = Args::parse();
  renying::init_tracing(args.verbose);

  let config = AppConfig::load(args.config.as_deref()).context("无法加载配置")?;
  let model = SsdMobilenetBuilder::from(&config.model)
    .build()
    .context("无法加载模型")?;
  let pipeline = Pipeline::new(model, &config)?;

  renying::gui::run(&pipeline);
  Ok(())
}
