use crate::catalog::ApiDescriptor;

use super::models::RunOptions;

/// Query parameter names a credential is attached under. The engine cannot know
/// which one a given API reads, so it sends all of them.
pub const CREDENTIAL_ALIASES: [&str; 4] = ["appid", "api_key", "key", "access_key"];

pub fn inject_credential(endpoint: &str, credential: &str) -> String {
    let encoded = urlencoding::encode(credential);
    let query = CREDENTIAL_ALIASES
        .iter()
        .map(|alias| format!("{alias}={encoded}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{endpoint}{}{query}", query_separator(endpoint))
}

pub fn wrap_in_proxy(proxy_base: &str, target: &str) -> String {
    format!(
        "{proxy_base}{}url={}",
        query_separator(proxy_base),
        urlencoding::encode(target)
    )
}

/// The URL actually requested for a network-path invocation.
pub fn build_request_url(descriptor: &ApiDescriptor, options: &RunOptions, proxy_base: &str) -> String {
    let url = match options.credential() {
        Some(credential) => inject_credential(&descriptor.endpoint, credential),
        None => descriptor.endpoint.clone(),
    };

    if options.proxy_enabled {
        wrap_in_proxy(proxy_base, &url)
    } else {
        url
    }
}

fn query_separator(url: &str) -> char {
    if url.contains('?') {
        '&'
    } else {
        '?'
    }
}
