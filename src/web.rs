// 该文件是 Renying （人影） 项目的一部分。
// src/web.rs - Web 服务
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

//! # Web 服务
//!
//! - `GET /`：服务说明
//! - `GET /detect?url=<路径或地址>&url_type=<local|online>`：返回标注后的 JPEG 图像，
//!   同时保存到输出目录
//!
//! 检测流程是阻塞的，每个请求在阻塞线程池中执行，模型通过 `Arc` 共享。

use std::sync::Arc;

use axum::{
  Router,
  extract::{Query, State},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
  routing::get,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
  frame::RgbNhwcFrame,
  input::SourceKind,
  model::{DetectResult, Model},
  pipeline::{ErrorKind, Pipeline, PipelineError},
};

pub const DISPLAY_MSG: &str = "Renying 人像检测服务 - GET /detect?url=<路径或地址>&url_type=<local|online>";

/// 下载时使用的文件名
pub const ATTACHMENT_NAME: &str = "output_image.jpg";

#[derive(Debug, Deserialize)]
pub struct DetectQuery {
  pub url: Option<String>,
  pub url_type: Option<String>,
}

pub fn router<M>(pipeline: Arc<Pipeline<M>>) -> Router
where
  M: Model<Input = RgbNhwcFrame, Output = DetectResult> + Send + Sync + 'static,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/", get(home))
    .route("/detect", get(detect::<M>))
    .with_state(pipeline)
}

pub async fn serve<M>(pipeline: Arc<Pipeline<M>>, bind: &str) -> std::io::Result<()>
where
  M: Model<Input = RgbNhwcFrame, Output = DetectResult> + Send + Sync + 'static,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  let listener = tokio::net::TcpListener::bind(bind).await?;
  info!("Web 服务已启动: http://{}", listener.local_addr()?);
  axum::serve(listener, router(pipeline)).await
}

async fn home() -> &'static str {
  DISPLAY_MSG
}

async fn detect<M>(
  State(pipeline): State<Arc<Pipeline<M>>>,
  Query(query): Query<DetectQuery>,
) -> Response
where
  M: Model<Input = RgbNhwcFrame, Output = DetectResult> + Send + Sync + 'static,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  let (Some(url), Some(url_type)) = (query.url, query.url_type) else {
    warn!("请求缺少 url 或 url_type 参数");
    return (
      StatusCode::BAD_REQUEST,
      "请在路由中正确指定 ?url= 与 ?url_type=",
    )
      .into_response();
  };

  let kind = match url_type.parse::<SourceKind>() {
    Ok(kind) => kind,
    Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
  };

  // 返回本次请求编码的字节，不回读输出文件
  let task = tokio::task::spawn_blocking(move || pipeline.detect(&url, kind));

  match task.await {
    Ok(Ok(outcome)) => (
      [
        (header::CONTENT_TYPE, "image/jpeg".to_string()),
        (
          header::CONTENT_DISPOSITION,
          format!("attachment; filename=\"{}\"", ATTACHMENT_NAME),
        ),
      ],
      outcome.jpeg,
    )
      .into_response(),
    Ok(Err(e)) => error_response(&e),
    Err(e) => {
      error!("检测任务异常退出: {}", e);
      (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
    }
  }
}

fn error_response(err: &PipelineError) -> Response {
  let status = match err.kind() {
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Fetch => StatusCode::BAD_GATEWAY,
    ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
    ErrorKind::Inference | ErrorKind::Io => StatusCode::INTERNAL_SERVER_ERROR,
  };
  error!("检测失败 ({}): {}", status, err);
  (status, err.to_string()).into_response()
}
