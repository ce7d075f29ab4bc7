//! 题目发现 - 业务能力层
//!
//! 扫描报告页，按文档顺序收集题目批改页链接并补全为绝对地址。

use std::collections::HashSet;

use scraper::{Html, Selector};
use tracing::debug;

use crate::config::PortalSelectors;
use crate::error::Result;
use crate::models::QuestionRef;
use crate::services::{parse_selector, url_resolver};

pub struct QuestionDiscovery {
    link: Selector,
    token: String,
    base_url: String,
}

impl QuestionDiscovery {
    pub fn new(selectors: &PortalSelectors, base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            link: parse_selector(&selectors.question_link)?,
            token: selectors.marking_page_token.clone(),
            base_url: base_url.into(),
        })
    }

    /// 报告页上的全部题目（题号从 1 开始）
    ///
    /// 只合并 `href` 原文完全相同的链接；写法不同的链接各算一道题。
    pub fn discover(&self, html: &str) -> Vec<QuestionRef> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut questions = Vec::new();

        for anchor in document.select(&self.link) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !href.contains(&self.token) {
                continue;
            }
            if !seen.insert(href) {
                debug!("重复的题目链接，已忽略: {}", href);
                continue;
            }
            let url = url_resolver::resolve(href, &self.base_url);
            if url.is_empty() {
                continue;
            }
            questions.push(QuestionRef::new(questions.len() + 1, url));
        }

        questions
    }
}
