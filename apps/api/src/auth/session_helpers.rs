use axum::http::HeaderMap;
use dashgate_application::RequestContext;

use crate::api_config::ProxyFixSettings;

/// Builds the request context, trusting only as many `X-Forwarded-For`
/// hops as there are reverse proxies in front of the service.
pub(super) fn extract_request_context(
    headers: &HeaderMap,
    proxy_fix: &ProxyFixSettings,
) -> RequestContext {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| trusted_forwarded_for(value, proxy_fix.x_for));

    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    RequestContext {
        ip_address,
        user_agent,
    }
}

fn trusted_forwarded_for(header: &str, trusted_hops: usize) -> Option<String> {
    if trusted_hops == 0 {
        return None;
    }

    let hops: Vec<&str> = header.split(',').map(str::trim).collect();
    let index = hops.len().checked_sub(trusted_hops)?;

    hops.get(index)
        .filter(|value| !value.is_empty())
        .map(|value| (*value).to_owned())
}
