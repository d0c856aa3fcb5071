//! 게이트웨이 전체에서 쓰는 HTTP 본문 타입과 헬퍼

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::{combinators::BoxBody, BodyExt, Empty, Full};
use hyper::{header, Response, StatusCode};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 요청과 응답 양쪽에서 쓰는 단일 본문 타입
pub type GatewayBody = BoxBody<Bytes, BoxError>;

pub fn full(data: impl Into<Bytes>) -> GatewayBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed()
}

pub fn empty() -> GatewayBody {
    Empty::<Bytes>::new().map_err(|never| match never {}).boxed()
}

pub fn boxed<B>(body: B) -> GatewayBody
where
    B: Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed()
}

/// 짧은 `text/plain` 응답. 클라이언트에 내부 오류 내용을 노출하지 않을 때 씁니다.
pub fn text_response(status: StatusCode, message: &str) -> Response<GatewayBody> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(full(message.to_string()))
        .unwrap_or_else(|_| {
            let mut response = Response::new(full("Internal Server Error"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        })
}

/// 이미 읽어 버린 앞부분을 되돌려 놓은 본문
///
/// 먼저 `prefix`를 내보내고, 읽는 도중 난 오류가 있었다면 그 오류를, 그다음
/// 남은 스트림을 이어서 내보냅니다. 업스트림은 원래 스트림과 같은 바이트를 받습니다.
pub struct ReplayBody {
    prefix: Option<Bytes>,
    pending_error: Option<BoxError>,
    rest: GatewayBody,
}

impl ReplayBody {
    pub fn new(prefix: Bytes, pending_error: Option<BoxError>, rest: GatewayBody) -> Self {
        Self {
            prefix: (!prefix.is_empty()).then_some(prefix),
            pending_error,
            rest,
        }
    }

    pub fn prefix_len(&self) -> usize {
        self.prefix.as_ref().map_or(0, Bytes::len)
    }
}

impl std::fmt::Debug for ReplayBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayBody")
            .field("prefix_len", &self.prefix_len())
            .field("pending_error", &self.pending_error.is_some())
            .finish()
    }
}

impl Body for ReplayBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if let Some(prefix) = this.prefix.take() {
            return Poll::Ready(Some(Ok(Frame::data(prefix))));
        }
        if let Some(error) = this.pending_error.take() {
            return Poll::Ready(Some(Err(error)));
        }
        Pin::new(&mut this.rest).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.prefix.is_none() && self.pending_error.is_none() && self.rest.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        let rest = self.rest.size_hint();
        let prefix = self.prefix_len() as u64;

        let mut hint = SizeHint::new();
        hint.set_lower(rest.lower() + prefix);
        if let Some(upper) = rest.upper() {
            hint.set_upper(upper + prefix);
        }
        hint
    }
}
