// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化商家网站地址
///
/// 返回带 http(s) 协议的完整 URL；空值、非 http(s) 协议或无法解析时返回 `None`。
/// 地图页面上的 `/url?q=...` 跳转链接会被展开为真实目标。
pub fn normalize_website(raw: &str, base_url: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let url = if raw.starts_with('/') {
        resolve_url(base_url, raw).ok()?
    } else {
        match Url::parse(raw) {
            Ok(url) => url,
            // bare host such as "example.co.uk/contact"
            Err(ParseError::RelativeUrlWithoutBase) => {
                Url::parse(&format!("https://{}", raw)).ok()?
            }
            Err(_) => return None,
        }
    };

    let url = unwrap_redirect(url)?;

    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = url.host_str()?;
    if !host.contains('.') && host != "localhost" {
        return None;
    }

    Some(url.to_string())
}

/// 展开 Google 的 `/url?q=` 跳转链接；其他站点的 `/url` 路径原样保留
fn unwrap_redirect(url: Url) -> Option<Url> {
    if url.path() != "/url" || !url.host_str().is_some_and(is_google_host) {
        return Some(url);
    }

    let target = url
        .query_pairs()
        .find(|(key, _)| key == "q" || key == "url")
        .map(|(_, value)| value.into_owned())?;

    Url::parse(&target).ok()
}

/// `google.com`、`www.google.co.uk` 等
fn is_google_host(host: &str) -> bool {
    let host = host.strip_prefix("www.").unwrap_or(host);
    host.starts_with("google.") || host.contains(".google.")
}
