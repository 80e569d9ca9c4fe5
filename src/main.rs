// 该文件是 Renying （人影） 项目的一部分。
// src/main.rs - 命令行主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

mod args;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use renying::{
  config::AppConfig,
  input::ImageSource,
  model::SsdMobilenetBuilder,
  pipeline::{Outcome, Pipeline},
};

fn main() -> ExitCode {
  let args = args::Args::parse();
  renying::init_tracing(args.verbose);

  match run(&args) {
    Ok(outcome) => {
      println!("检测到 {} 个目标", outcome.detections.len());
      for item in outcome.detections.items.iter() {
        println!("  {}: {}%", item.label, (item.score * 100.0) as i32);
      }
      println!("结果已保存到: {}", outcome.path.display());
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("error: {:#}", e);
      ExitCode::FAILURE
    }
  }
}

fn run(args: &args::Args) -> Result<Outcome> {
  let config = AppConfig::load(args.config.as_deref()).context("无法加载配置")?;

  info!("输入来源: {} ({})", args.image, args.kind);
  let source = ImageSource::new(&args.image, args.kind)?;
  // 先读取输入，模型加载较慢，输入有误时尽早失败
  let resolved = source.resolve(&config.input)?;

  info!("模型文件路径: {}", config.model.path.display());
  let model = SsdMobilenetBuilder::from(&config.model)
    .build()
    .context("无法加载模型")?;

  let pipeline = Pipeline::new(model, &config)?;
  Ok(pipeline.process(&resolved)?)
}
