//! 빌드된 SPA 정적 파일 서빙
//!
//! 라우트에 걸리지 않은 요청은 모두 여기로 옵니다. 파일이 있으면 그대로 돌려주고,
//! 없으면 `index.html`을 돌려주어 클라이언트 라우터가 경로를 처리하게 합니다.

use std::io;
use std::path::{Component, Path, PathBuf};

use hyper::header::{self, HeaderValue};
use hyper::{Method, Response, StatusCode, Uri};
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};

use crate::body::{self, text_response, GatewayBody};

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    index_file: String,
}

/// 정적 응답의 출처
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    File,
    Fallback,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, index_file: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            index_file: index_file.into(),
        }
    }

    pub async fn serve(&self, method: &Method, uri: &Uri) -> Response<GatewayBody> {
        if method != Method::GET && method != Method::HEAD {
            let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
            response.headers_mut().insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }
        let head_only = method == Method::HEAD;

        if let Some(relative) = normalize_path(uri.path()) {
            match self.read_candidate(&relative).await {
                Ok(Some((path, contents))) => {
                    return self.file_response(&path, contents, head_only, Served::File);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(path = %relative.display(), error = %e, "정적 파일 읽기 실패");
                    return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                }
            }
        } else {
            debug!(path = %uri.path(), "허용되지 않는 정적 경로");
        }

        // SPA fallback
        let index = self.root.join(&self.index_file);
        match tokio::fs::read(&index).await {
            Ok(contents) => self.file_response(&index, contents, head_only, Served::Fallback),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %index.display(), error = %e, "인덱스 문서 읽기 실패");
                }
                text_response(StatusCode::NOT_FOUND, "Not Found")
            }
        }
    }

    /// 파일이 없으면 `Ok(None)`. 디렉토리는 그 안의 인덱스 문서를 찾습니다.
    async fn read_candidate(&self, relative: &Path) -> io::Result<Option<(PathBuf, Vec<u8>)>> {
        let mut path = self.root.join(relative);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => path.push(&self.index_file),
            Ok(_) => {}
            Err(e) if is_missing(&e) => return Ok(None),
            Err(e) => return Err(e),
        }

        match tokio::fs::read(&path).await {
            Ok(contents) => Ok(Some((path, contents))),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn file_response(&self, path: &Path, contents: Vec<u8>, head_only: bool, served: Served) -> Response<GatewayBody> {
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let is_index = path.file_name().map(|n| n == self.index_file.as_str()).unwrap_or(false);
        let length = contents.len();

        let body = if head_only { body::empty() } else { body::full(contents) };
        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, mime.as_ref())
            .header(header::CONTENT_LENGTH, length);
        if is_index {
            builder = builder.header(header::CACHE_CONTROL, "no-cache");
        }

        debug!(path = %path.display(), ?served, length, "정적 파일 응답");
        builder
            .body(body)
            .unwrap_or_else(|_| text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))
    }
}

fn is_missing(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

/// URL 경로를 루트 기준 상대 경로로 바꿉니다. 루트를 벗어나려 하면 `None`.
pub fn normalize_path(path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    if decoded.contains('\0') || decoded.contains('\\') {
        return None;
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::CurDir | Component::RootDir => {}
            Component::Normal(segment) => normalized.push(segment),
            Component::ParentDir | Component::Prefix(_) => return None,
        }
    }
    Some(normalized)
}
