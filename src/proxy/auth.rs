//! 서비스 자격 증명 주입
//!
//! 호출자가 `Authorization`을 보냈다면 절대 건드리지 않고, 없을 때만 설정된
//! 서비스 토큰으로 `Bearer` 헤더를 하나 붙입니다.

use hyper::header::{self, HeaderMap, HeaderValue};

use crate::settings::ServiceToken;

pub fn has_authorization(inbound: &HeaderMap) -> bool {
    inbound.contains_key(header::AUTHORIZATION)
}

/// 토큰을 주입해야 하는지 여부
pub fn should_inject(inbound: &HeaderMap, token: Option<&ServiceToken>) -> bool {
    token.is_some() && !has_authorization(inbound)
}

pub fn bearer_value(token: &ServiceToken) -> Option<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose())).ok()?;
    value.set_sensitive(true);
    Some(value)
}

/// 업스트림으로 나갈 헤더에 인증 헤더를 붙입니다.
pub fn decorate(mut outbound: HeaderMap, inbound: &HeaderMap, token: Option<&ServiceToken>) -> HeaderMap {
    if has_authorization(inbound) {
        return outbound;
    }

    if let Some(value) = token.and_then(bearer_value) {
        outbound.insert(header::AUTHORIZATION, value);
    }
    outbound
}
