//! 멀티파트 요청 본문 캡처
//!
//! 앞 단계가 요청 스트림을 소비해 버려도 업스트림이 같은 바이트를 받을 수 있도록
//! `multipart/form-data` 본문을 끝까지 읽어 [`RequestBody::Captured`]로 보관합니다.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use http_body_util::BodyExt;
use hyper::header::{self, HeaderMap};
use hyper::Method;
use tracing::{debug, instrument, warn};

use crate::body::{BoxError, GatewayBody, ReplayBody};
use crate::context::{RequestBody, RequestContext};
use crate::logging::{CaptureRecord, EventSink, GatewayEvent};
use crate::middleware::{Middleware, MiddlewareError};

/// 본문을 읽은 결과
pub enum ReadOutcome {
    Complete(Bytes),
    /// 제한을 넘은 시점까지 읽은 바이트 수
    TooLarge(usize),
    /// 읽기 도중 스트림 오류. 이미 읽은 바이트와 남은 스트림을 함께 돌려줍니다.
    Interrupted {
        read: Bytes,
        error: BoxError,
        rest: GatewayBody,
    },
}

pub struct CaptureMiddleware {
    max_bytes: usize,
    sink: Arc<EventSink>,
}

impl CaptureMiddleware {
    pub fn new(max_bytes: usize, sink: Arc<EventSink>) -> Self {
        Self { max_bytes, sink }
    }

    /// 캡처 대상인지 확인: POST/PUT/PATCH 이면서 `multipart/form-data`
    pub fn applies_to(method: &Method, headers: &HeaderMap) -> bool {
        let method_matches = *method == Method::POST || *method == Method::PUT || *method == Method::PATCH;
        method_matches
            && headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_ascii_lowercase().contains("multipart/form-data"))
                .unwrap_or(false)
    }

    #[instrument(skip_all, fields(request_id = %ctx.request_id))]
    pub async fn maybe_capture(&self, mut ctx: RequestContext) -> Result<RequestContext, MiddlewareError> {
        if !Self::applies_to(ctx.method(), ctx.headers()) {
            return Ok(ctx);
        }

        let declared = declared_length(ctx.headers());
        if let Some(length) = declared {
            if length > self.max_bytes as u64 {
                warn!(declared = length, limit = self.max_bytes, "선언된 본문 크기가 캡처 제한을 초과");
                return Err(MiddlewareError::PayloadTooLarge {
                    limit: self.max_bytes,
                    received: Some(length),
                });
            }
        }

        let body = match std::mem::replace(&mut ctx.body, RequestBody::Captured(Bytes::new())) {
            RequestBody::Streaming(body) => body,
            other => {
                // 이미 다른 단계가 본문을 처리했습니다
                ctx.body = other;
                return Ok(ctx);
            }
        };

        match read_bounded(body, self.max_bytes).await {
            ReadOutcome::Complete(bytes) => {
                debug!(body_len = bytes.len(), "멀티파트 본문 캡처 완료");
                let record = CaptureRecord::new(
                    &ctx.request_id,
                    ctx.method(),
                    ctx.uri().path(),
                    ctx.headers(),
                    &bytes,
                );
                let _ = self.sink.record(&GatewayEvent::Capture(record)).await;
                ctx.body = RequestBody::Captured(bytes);
                Ok(ctx)
            }
            ReadOutcome::TooLarge(read) => {
                warn!(read, limit = self.max_bytes, "본문이 캡처 제한을 초과");
                Err(MiddlewareError::PayloadTooLarge {
                    limit: self.max_bytes,
                    received: declared,
                })
            }
            ReadOutcome::Interrupted { read, error, rest } => {
                let record = CaptureRecord::new(
                    &ctx.request_id,
                    ctx.method(),
                    ctx.uri().path(),
                    ctx.headers(),
                    &read,
                )
                .aborted(&error);
                let _ = self.sink.record(&GatewayEvent::Capture(record)).await;
                ctx.body = RequestBody::Resumed(ReplayBody::new(read, Some(error), rest));
                Ok(ctx)
            }
        }
    }
}

#[async_trait]
impl Middleware for CaptureMiddleware {
    fn name(&self) -> &str {
        "capture"
    }

    async fn handle_request(&self, ctx: RequestContext) -> Result<RequestContext, MiddlewareError> {
        self.maybe_capture(ctx).await
    }
}

fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// 최대 `limit` 바이트까지 본문을 읽습니다.
pub async fn read_bounded(mut body: GatewayBody, limit: usize) -> ReadOutcome {
    let mut buf = BytesMut::new();

    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                // 트레일러 프레임은 버립니다
                let Ok(data) = frame.into_data() else {
                    continue;
                };
                if buf.len() + data.len() > limit {
                    return ReadOutcome::TooLarge(buf.len() + data.len());
                }
                buf.extend_from_slice(&data);
            }
            Err(error) => {
                return ReadOutcome::Interrupted {
                    read: buf.freeze(),
                    error,
                    rest: body,
                };
            }
        }
    }

    ReadOutcome::Complete(buf.freeze())
}
