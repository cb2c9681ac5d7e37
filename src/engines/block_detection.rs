// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;

/// 反自动化拦截页面的文本特征
const CONTENT_MARKERS: &[(&str, &str)] = &[
    ("our systems have detected unusual traffic", "unusual traffic interstitial"),
    ("unusual traffic from your computer network", "unusual traffic interstitial"),
    ("id=\"captcha-form\"", "captcha form"),
    ("class=\"g-recaptcha\"", "reCAPTCHA challenge"),
    ("www.google.com/recaptcha/api", "reCAPTCHA challenge"),
    ("to continue, please type the characters", "captcha prompt"),
    ("please verify you are a human", "human verification prompt"),
];

/// 检查页面是否为反自动化拦截页
///
/// # 参数
///
/// * `url` - 当前页面地址
/// * `html` - 当前渲染后的 HTML
///
/// # 返回值
///
/// 命中拦截特征时返回原因，否则返回 `None`
pub fn detect_block(url: Option<&str>, html: &str) -> Option<String> {
    if let Some(parsed) = url.and_then(|u| Url::parse(u).ok()) {
        // https://www.google.com/sorry/index?continue=...
        if parsed.path().starts_with("/sorry") {
            return Some(format!("redirected to {}", parsed.path()));
        }
    }

    let lowered = html.to_lowercase();
    CONTENT_MARKERS
        .iter()
        .find(|(marker, _)| lowered.contains(marker))
        .map(|(_, reason)| reason.to_string())
}
