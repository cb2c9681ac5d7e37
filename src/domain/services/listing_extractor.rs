// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::lead::Candidate;
use crate::utils::errors::ExtractionError;
use crate::utils::url_utils::normalize_website;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must be valid")
}

// 结果列表
static FEED: Lazy<Selector> = Lazy::new(|| selector("div[role='feed']"));
static CARD: Lazy<Selector> = Lazy::new(|| selector("div.Nv2PK"));
static PLACE_LINK: Lazy<Selector> = Lazy::new(|| selector("a.hfpxzc"));
static CARD_NAME: Lazy<Selector> = Lazy::new(|| selector(".qBF1Pd, .fontHeadlineSmall"));
static INFO_ROW: Lazy<Selector> = Lazy::new(|| selector("div.W4Efsd"));
static CARD_PHONE: Lazy<Selector> = Lazy::new(|| selector("span.UsdlK"));
static RATING: Lazy<Selector> = Lazy::new(|| selector("span.MW4etd"));
static REVIEWS: Lazy<Selector> = Lazy::new(|| selector("span.UY7F9"));
static RATING_LABEL: Lazy<Selector> = Lazy::new(|| selector("span[role='img'][aria-label]"));
// 评分行：星级图标、评分或评论数
static RATING_ROW_MARKER: Lazy<Selector> =
    Lazy::new(|| selector("span[role='img'], span.MW4etd, span.UY7F9"));
static WEBSITE: Lazy<Selector> = Lazy::new(|| {
    selector("a[data-value='Website'], a[data-item-id='authority'], a[aria-label^='Website']")
});

// 单个地点详情面板
static DETAIL_PANEL: Lazy<Selector> = Lazy::new(|| selector("div[role='main']"));
static DETAIL_NAME: Lazy<Selector> = Lazy::new(|| selector("h1.DUwDvf, h1.fontHeadlineLarge"));
static DETAIL_CATEGORY: Lazy<Selector> = Lazy::new(|| selector("button.DkEaL"));
static DETAIL_ADDRESS: Lazy<Selector> =
    Lazy::new(|| selector("button[data-item-id='address']"));
static DETAIL_PHONE: Lazy<Selector> =
    Lazy::new(|| selector("button[data-item-id^='phone']"));

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s().\-]{7,}$").expect("static regex"));
static HOURS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(open|opens|closed|closes|temporarily closed|permanently closed)\b")
        .expect("static regex")
});
static NO_REVIEWS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^no reviews?$").expect("static regex"));
// "££", "$$$", "£10–20"
static PRICE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[£$€¥₹]{1,4}$|^[£$€¥₹]\d+\s*[–\-]\s*\d+\+?$").expect("static regex")
});
static RATING_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d(?:[.,]\d)?\s*(?:\([\d,.\s]+\))?$").expect("static regex"));
static RATING_LABEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d(?:[.,]\d)?)\s*stars?(?:\s+([\d,.]+)\s+reviews?)?").expect("static regex")
});

/// 提取报告
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// 按页面顺序排列的候选线索
    pub candidates: Vec<Candidate>,
    /// 被跳过的条目
    pub skipped: Vec<ExtractionError>,
    /// 页面上识别到的条目总数
    pub listings_seen: usize,
}

/// 商家条目提取器
///
/// 从渲染后的地图页面中解析商家条目。页面结构经常变化，
/// 因此按顺序尝试多种定位策略：结果卡片、地点链接的父元素、单个地点详情面板。
pub struct ListingExtractor {
    base_url: Url,
    query: String,
}

impl ListingExtractor {
    /// 创建提取器
    ///
    /// # 参数
    ///
    /// * `base_url` - 用于解析相对链接的页面地址
    /// * `query` - 规范化查询，写入每条候选线索
    pub fn new(base_url: Url, query: impl Into<String>) -> Self {
        Self {
            base_url,
            query: query.into(),
        }
    }

    /// 提取所有商家条目
    ///
    /// 单个条目的失败只会被记录，不会影响其他条目。
    pub fn extract(&self, html: &str) -> ExtractionReport {
        let document = Html::parse_document(html);
        let (listings, strategy) = locate_listings(&document);

        info!(
            strategy,
            listings = listings.len(),
            "Located listing elements"
        );

        let mut report = ExtractionReport {
            listings_seen: listings.len(),
            ..Default::default()
        };

        for (index, listing) in listings.into_iter().enumerate() {
            match self.extract_listing(index, listing) {
                Ok(candidate) => {
                    debug!(index, name = %candidate.name, "Extracted listing");
                    report.candidates.push(candidate);
                }
                Err(e) => {
                    warn!(index, error = %e, "Skipping listing");
                    report.skipped.push(e);
                }
            }
        }

        report
    }

    fn extract_listing(
        &self,
        index: usize,
        listing: ElementRef<'_>,
    ) -> Result<Candidate, ExtractionError> {
        let name = listing_name(listing).ok_or(ExtractionError::MissingName { index })?;
        let info = InfoSegments::collect(listing);

        let mut candidate = Candidate::new(name, self.query.clone());
        candidate.category = first_text(listing, &DETAIL_CATEGORY).or(info.category);
        candidate.address = labelled_value(listing, &DETAIL_ADDRESS, "Address:").or(info.address);
        candidate.phone = first_text(listing, &CARD_PHONE)
            .or_else(|| labelled_value(listing, &DETAIL_PHONE, "Phone:"))
            .or(info.phone);
        candidate.website = listing
            .select(&WEBSITE)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| normalize_website(href, &self.base_url));
        let (rating, review_count) = rating_and_reviews(listing);
        candidate.rating = rating;
        candidate.review_count = review_count;

        Ok(candidate)
    }
}

/// 定位页面中的商家条目元素
fn locate_listings(document: &Html) -> (Vec<ElementRef<'_>>, &'static str) {
    let cards: Vec<_> = document.select(&CARD).collect();
    if !cards.is_empty() {
        return (cards, "result cards");
    }

    // Links placed directly in the feed stand for their own listing
    let mut seen = HashSet::new();
    let link_parents: Vec<_> = document
        .select(&PLACE_LINK)
        .map(|link| match link.parent().and_then(ElementRef::wrap) {
            Some(parent) if !FEED.matches(&parent) => parent,
            _ => link,
        })
        .filter(|listing| seen.insert(listing.id()))
        .collect();
    if !link_parents.is_empty() {
        return (link_parents, "place link parents");
    }

    // A query that matches exactly one place renders its details panel instead of a feed
    if document.select(&FEED).next().is_none() {
        if let Some(panel) = document
            .select(&DETAIL_PANEL)
            .find(|panel| panel.select(&DETAIL_NAME).next().is_some())
        {
            return (vec![panel], "place details");
        }
    }

    (Vec::new(), "none")
}

fn listing_name(listing: ElementRef<'_>) -> Option<String> {
    first_text(listing, &CARD_NAME)
        .or_else(|| {
            std::iter::once(listing)
                .filter(|element| PLACE_LINK.matches(element))
                .chain(listing.select(&PLACE_LINK))
                .filter_map(|a| a.value().attr("aria-label"))
                .find_map(|label| clean_text([label]))
        })
        .or_else(|| first_text(listing, &DETAIL_NAME))
}

/// 卡片信息行中的类别、地址和电话
#[derive(Debug, Default)]
struct InfoSegments {
    category: Option<String>,
    address: Option<String>,
    phone: Option<String>,
}

impl InfoSegments {
    /// 解析 `W4Efsd` 信息行
    ///
    /// 信息行以 `·` 分隔，常见形式为 "Plumber · 12 High St" 和
    /// "Open 24 hours · 0161 123 4567"。
    fn collect(listing: ElementRef<'_>) -> Self {
        let mut info = Self::default();

        for row in listing
            .select(&INFO_ROW)
            .filter(|row| is_leaf_row(*row) && !is_rating_row(*row))
        {
            let Some(text) = clean_text(row.text()) else {
                continue;
            };

            for segment in text.split(['·', '⋅']).filter_map(|s| clean_text([s])) {
                if PHONE_PATTERN.is_match(&segment) && count_digits(&segment) >= 7 {
                    info.phone.get_or_insert(segment);
                } else if HOURS_PATTERN.is_match(&segment)
                    || RATING_PATTERN.is_match(&segment)
                    || NO_REVIEWS_PATTERN.is_match(&segment)
                    || PRICE_PATTERN.is_match(&segment)
                {
                    continue;
                } else if info.category.is_none()
                    && info.address.is_none()
                    && !looks_like_address(&segment)
                {
                    info.category = Some(segment);
                } else if info.address.is_none() {
                    info.address = Some(segment);
                }
            }
        }

        info
    }
}

fn is_leaf_row(row: ElementRef<'_>) -> bool {
    !row.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|e| e.value().classes().any(|class| class == "W4Efsd"))
}

fn is_rating_row(row: ElementRef<'_>) -> bool {
    row.select(&RATING_ROW_MARKER).next().is_some()
}

fn looks_like_address(segment: &str) -> bool {
    segment.contains(',') || segment.chars().any(|c| c.is_ascii_digit())
}

fn count_digits(value: &str) -> usize {
    value.chars().filter(char::is_ascii_digit).count()
}

fn rating_and_reviews(listing: ElementRef<'_>) -> (Option<f64>, Option<i32>) {
    let rating = first_text(listing, &RATING).and_then(|text| parse_rating(&text));
    let reviews = first_text(listing, &REVIEWS).and_then(|text| parse_count(&text));

    if rating.is_some() {
        return (rating, reviews);
    }

    // aria-label="4.5 stars 87 Reviews"
    let labelled = listing
        .select(&RATING_LABEL)
        .filter_map(|e| e.value().attr("aria-label"))
        .find_map(|label| RATING_LABEL_PATTERN.captures(label));

    match labelled {
        Some(caps) => (
            caps.get(1).and_then(|m| parse_rating(m.as_str())),
            reviews.or_else(|| caps.get(2).and_then(|m| parse_count(m.as_str()))),
        ),
        None => (None, reviews),
    }
}

fn parse_rating(text: &str) -> Option<f64> {
    text.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|rating| (0.0..=5.0).contains(rating))
}

fn parse_count(text: &str) -> Option<i32> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// 读取带前缀 aria-label 的按钮值，例如 "Address: 12 High St"
fn labelled_value(listing: ElementRef<'_>, selector: &Selector, prefix: &str) -> Option<String> {
    let element = listing.select(selector).next()?;
    element
        .value()
        .attr("aria-label")
        .and_then(|label| clean_text([label.trim().trim_start_matches(prefix)]))
        .or_else(|| clean_text(element.text()))
}

fn first_text(listing: ElementRef<'_>, selector: &Selector) -> Option<String> {
    listing
        .select(selector)
        .find_map(|element| clean_text(element.text()))
}

/// 合并文本片段，折叠空白并去掉图标字体使用的私有区字符
fn clean_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let joined: String = parts
        .into_iter()
        .flat_map(str::chars)
        .filter(|c| !('\u{e000}'..='\u{f8ff}').contains(c))
        .collect();
    let text = joined.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
