// 该文件是 Renying （人影） 项目的一部分。
// tests/web.rs - Web 服务测试
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

#![cfg(feature = "web")]

mod common;

use std::sync::Arc;

use axum::{
  body::{Body, to_bytes},
  http::{Request, StatusCode, header},
};
use tower::ServiceExt;

use renying::web::{DISPLAY_MSG, router};

use common::*;

fn detect_uri(url: &str, url_type: &str) -> String {
  let encoded: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
  format!("/detect?url={}&url_type={}", encoded, url_type)
}

async fn get(dir: &std::path::Path, uri: &str) -> axum::response::Response {
  let app = router(Arc::new(pipeline_in(dir)));
  app
    .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
    .await
    .unwrap()
}

#[tokio::test]
async fn home_shows_banner() {
  let dir = tempfile::tempdir().unwrap();
  let response = get(dir.path(), "/").await;
  assert_eq!(response.status(), StatusCode::OK);

  let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  assert_eq!(body, DISPLAY_MSG.as_bytes());
}

#[tokio::test]
async fn missing_parameters_are_bad_request() {
  let dir = tempfile::tempdir().unwrap();
  let response = get(dir.path(), "/detect?url=people.jpg").await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);

  let response = get(dir.path(), "/detect").await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_type_is_bad_request() {
  let dir = tempfile::tempdir().unwrap();
  let response = get(dir.path(), &detect_uri("people.jpg", "ftp")).await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_file_is_not_found() {
  let dir = tempfile::tempdir().unwrap();
  let missing = dir.path().join("nobody.jpg");
  let response = get(dir.path(), &detect_uri(missing.to_str().unwrap(), "local")).await;
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unreachable_url_is_bad_gateway() {
  let dir = tempfile::tempdir().unwrap();
  let response = get(dir.path(), &detect_uri("http://127.0.0.1:9/a.jpg", "online")).await;
  assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn error_status_is_bad_gateway() {
  let dir = tempfile::tempdir().unwrap();
  let url = serve_once("404 Not Found", "text/plain", Vec::new());
  let response = get(dir.path(), &detect_uri(&url, "online")).await;
  assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn online_image_returns_jpeg() {
  let dir = tempfile::tempdir().unwrap();
  let url = serve_once("200 OK", "image/png", png_bytes(80, 60));
  let response = get(dir.path(), &detect_uri(&url, "online")).await;
  assert_eq!(response.status(), StatusCode::OK);

  let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let decoded = image::load_from_memory(&body).unwrap();
  assert_eq!((decoded.width(), decoded.height()), (80, 60));
  assert_eq!(std::fs::read_dir(dir.path().join("output").join("online")).unwrap().count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_for_same_file_return_whole_images() {
  let dir = tempfile::tempdir().unwrap();
  let input = write_png(dir.path(), "crowd.png", 1024, 768);
  let app = router(Arc::new(pipeline_in(dir.path())));
  let uri = detect_uri(input.to_str().unwrap(), "local");

  let request = |app: axum::Router| {
    let uri = uri.clone();
    async move {
      let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
      assert_eq!(response.status(), StatusCode::OK);
      to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }
  };

  let handles: Vec<_> = (0..4).map(|_| tokio::spawn(request(app.clone()))).collect();
  for handle in handles {
    let body = handle.await.unwrap();
    let decoded = image::load_from_memory(&body).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1024, 768));
  }

  // 输出文件同样完整
  let saved = image::open(dir.path().join("output").join("local").join("crowd.jpg")).unwrap();
  assert_eq!((saved.width(), saved.height()), (1024, 768));
}

#[tokio::test]
async fn local_image_returns_annotated_jpeg() {
  let dir = tempfile::tempdir().unwrap();
  let input = write_png(dir.path(), "people.png", 120, 90);
  let response = get(dir.path(), &detect_uri(input.to_str().unwrap(), "local")).await;

  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
  assert_eq!(
    response.headers()[header::CONTENT_DISPOSITION],
    "attachment; filename=\"output_image.jpg\""
  );

  let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let decoded = image::load_from_memory(&body).unwrap();
  assert_eq!((decoded.width(), decoded.height()), (120, 90));
  assert!(dir.path().join("output").join("local").join("people.jpg").exists());
}
