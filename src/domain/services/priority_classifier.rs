// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::lead::Candidate;

/// 根据网站是否存在标记线索优先级
///
/// 没有网站的商家是高优先级线索
pub fn classify(mut candidate: Candidate) -> Candidate {
    candidate.has_website = candidate.website.is_some();
    candidate
}
