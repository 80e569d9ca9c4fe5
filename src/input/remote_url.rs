// 该文件是 Renying （人影） 项目的一部分。
// src/input/remote_url.rs - 网络图像输入
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

use std::{io::Read, time::Instant};

use tracing::{error, info};
use url::Url;

use super::{InputError, ResolvedImage, SourceKind};
use crate::config::InputConfig;

const USER_AGENT: &str = concat!("renying/", env!("CARGO_PKG_VERSION"));

/// 下载网络图像，输出文件以随机 UUID 命名
///
/// 阻塞调用；在异步上下文中需放到阻塞线程池执行。
/// 响应体超过 `limits.max_bytes` 时报错，不论服务端是否声明了长度。
pub fn fetch_remote_image(url: &Url, limits: &InputConfig) -> Result<ResolvedImage, InputError> {
  info!("下载图像: {}", url);
  let now = Instant::now();

  let client = reqwest::blocking::Client::builder()
    .timeout(limits.timeout())
    .user_agent(USER_AGENT)
    .build()?;

  let response = client.get(url.as_str()).send().inspect_err(|e| {
    error!("下载图像失败: {}: {}", url, e);
  })?;

  if !response.status().is_success() {
    error!("下载图像失败: {} 返回状态 {}", url, response.status());
    return Err(InputError::FetchStatus {
      url: url.to_string(),
      status: response.status().as_u16(),
    });
  }

  let too_large = || InputError::TooLarge {
    url: url.to_string(),
    limit: limits.max_bytes,
  };

  if let Some(length) = response.content_length()
    && length > limits.max_bytes
  {
    error!("网络图像过大: {} 声明 {} 字节", url, length);
    return Err(too_large());
  }

  let mut bytes = Vec::new();
  response
    .take(limits.max_bytes + 1)
    .read_to_end(&mut bytes)?;
  if bytes.len() as u64 > limits.max_bytes {
    error!("网络图像过大: {}", url);
    return Err(too_large());
  }

  info!(
    "下载完成: {} 字节，耗时: {:.2?}",
    bytes.len(),
    now.elapsed()
  );

  Ok(ResolvedImage {
    bytes,
    identifier: uuid::Uuid::new_v4().to_string(),
    kind: SourceKind::Online,
  })
}

#[cfg(test)]
mod tests {
  use std::{
    io::{BufRead, BufReader, Write},
    net::TcpListener,
  };

  use super::*;

  fn limits() -> InputConfig {
    InputConfig {
      timeout_secs: 2,
      ..InputConfig::default()
    }
  }

  /// 本机上只应答一次的 HTTP 服务，返回其地址
  fn answer_once(head: &'static str, body: Vec<u8>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
      let (stream, _) = listener.accept().unwrap();
      let mut reader = BufReader::new(stream);
      let mut line = String::new();
      while reader.read_line(&mut line).unwrap() > 2 {
        line.clear();
      }
      let mut stream = reader.into_inner();
      let _ = stream.write_all(head.as_bytes());
      let _ = stream.write_all(&body);
    });
    Url::parse(&format!("http://{}/people.png", addr)).unwrap()
  }

  #[test]
  fn unreachable_host_is_fetch_error() {
    // 端口 9 (discard) 在本机上通常没有监听
    let url = Url::parse("http://127.0.0.1:9/people.jpg").unwrap();
    let err = fetch_remote_image(&url, &limits()).unwrap_err();
    assert!(matches!(err, InputError::Fetch(_)));
  }

  #[test]
  fn error_status_is_reported() {
    let url = answer_once(
      "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
      Vec::new(),
    );
    let err = fetch_remote_image(&url, &limits()).unwrap_err();
    assert!(matches!(err, InputError::FetchStatus { status: 404, .. }));
  }

  #[test]
  fn body_is_returned_with_uuid_identifier() {
    let url = answer_once(
      "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\n",
      b"bytes".to_vec(),
    );
    let resolved = fetch_remote_image(&url, &limits()).unwrap();
    assert_eq!(resolved.bytes, b"bytes");
    assert_eq!(resolved.kind, SourceKind::Online);
    assert!(uuid::Uuid::parse_str(&resolved.identifier).is_ok());
  }

  #[test]
  fn declared_length_over_limit_is_rejected() {
    let url = answer_once(
      "HTTP/1.1 200 OK\r\nContent-Length: 64\r\nConnection: close\r\n\r\n",
      vec![0; 64],
    );
    let limits = InputConfig {
      max_bytes: 16,
      ..limits()
    };
    let err = fetch_remote_image(&url, &limits).unwrap_err();
    assert!(matches!(err, InputError::TooLarge { limit: 16, .. }));
  }

  #[test]
  fn undeclared_body_over_limit_is_rejected() {
    // 无 Content-Length，以关闭连接结束响应体
    let url = answer_once(
      "HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n",
      vec![0; 64],
    );
    let limits = InputConfig {
      max_bytes: 16,
      ..limits()
    };
    let err = fetch_remote_image(&url, &limits).unwrap_err();
    assert!(matches!(err, InputError::TooLarge { .. }));
  }
}
