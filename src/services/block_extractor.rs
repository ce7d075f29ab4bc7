//! 学生答案块提取 - 业务能力层
//!
//! 在题目批改页的 HTML 快照中找到所有已批改的学生答案块，逐块读取五个字段。
//! 每个字段都是独立的可选查找，缺失时使用默认值，不会影响同一块的其他字段。

use scraper::{ElementRef, Html, Selector};

use crate::config::PortalSelectors;
use crate::error::Result;
use crate::models::StudentAnswerRecord;
use crate::services::parse_selector;

/// 渲染时会换行的元素
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "tr", "table", "h1", "h2", "h3", "h4", "h5", "h6", "pre",
    "blockquote", "section",
];

pub struct BlockExtractor {
    block: Selector,
    label: Selector,
    student_id: Selector,
    answer: Selector,
    mark: Selector,
    option: Selector,
    comment: Selector,
}

impl BlockExtractor {
    pub fn new(selectors: &PortalSelectors) -> Result<Self> {
        Ok(Self {
            block: parse_selector(&selectors.student_block)?,
            label: parse_selector(&selectors.label)?,
            student_id: parse_selector(&selectors.student_id)?,
            answer: parse_selector(&selectors.answer)?,
            mark: parse_selector(&selectors.mark)?,
            option: parse_selector("option")?,
            comment: parse_selector(&selectors.comment)?,
        })
    }

    /// 提取页面上的全部记录（按 DOM 顺序）
    ///
    /// 分数保持原文，由调用方归一化。
    pub fn extract(&self, html: &str, question_number: usize) -> Vec<StudentAnswerRecord> {
        let document = Html::parse_document(html);

        document
            .select(&self.block)
            .enumerate()
            .map(|(i, block)| StudentAnswerRecord {
                question_number,
                student_id: self.student_id_of(block).unwrap_or_default(),
                student_label: self
                    .label_of(block)
                    .unwrap_or_else(|| format!("Student {}", i + 1)),
                mark: self.mark_of(block).unwrap_or_default(),
                comment: self.comment_of(block).unwrap_or_default(),
                student_answer: self.answer_of(block).unwrap_or_default(),
            })
            .collect()
    }

    /// 标签，空白视为缺失
    fn label_of(&self, block: ElementRef<'_>) -> Option<String> {
        let el = block.select(&self.label).next()?;
        let text = rendered_text(el);
        (!text.is_empty()).then_some(text)
    }

    /// 隐藏输入框的值，原样保留
    fn student_id_of(&self, block: ElementRef<'_>) -> Option<String> {
        let el = block.select(&self.student_id).next()?;
        el.value().attr("value").map(str::to_string)
    }

    fn answer_of(&self, block: ElementRef<'_>) -> Option<String> {
        block.select(&self.answer).next().map(rendered_text)
    }

    /// 选中的选项文本；没有标记 selected 时取第一项（与浏览器单选下拉框一致）
    fn mark_of(&self, block: ElementRef<'_>) -> Option<String> {
        let select = block.select(&self.mark).next()?;
        let mut options = select.select(&self.option);
        let first = options.next()?;
        let chosen = std::iter::once(first)
            .chain(options)
            .find(|o| o.value().attr("selected").is_some())
            .unwrap_or(first);
        Some(rendered_text(chosen))
    }

    fn comment_of(&self, block: ElementRef<'_>) -> Option<String> {
        let el = block.select(&self.comment).next()?;
        Some(normalize_newlines(&el.text().collect::<String>()).trim().to_string())
    }
}

/// 近似浏览器 innerText：空白折叠，`<br>` 和块级元素换行
pub(crate) fn rendered_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_text(el, &mut out);
    out.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn push_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            push_collapsed(text, out);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if name == "br" {
                out.push('\n');
                continue;
            }
            if matches!(name, "script" | "style") {
                continue;
            }
            let is_block = BLOCK_TAGS.contains(&name);
            if is_block && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            push_text(child_el, out);
            if is_block && !out.ends_with('\n') {
                out.push('\n');
            }
        }
    }
}

fn push_collapsed(text: &str, out: &mut String) {
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() && !out.ends_with([' ', '\n']) {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    if pending_space && !out.is_empty() && !out.ends_with([' ', '\n']) {
        out.push(' ');
    }
}

/// `\r\n` / `\r` → `\n`
pub(crate) fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
