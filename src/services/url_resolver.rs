//! 链接地址解析
//!
//! 报告页里的题目链接大多是相对路径，这里按门户的固定目录结构补全为绝对地址。

/// 题目批改页文件名
pub const MARKING_PAGE_NAME: &str = "textbox_marking";

/// 把 href 解析为以 `base` 为根的绝对地址
///
/// 规则按优先级：
/// 1. 已带协议 → 原样返回
/// 2. `//host/...` → 补 `https:`
/// 3. `/path` → base + path
/// 4. `../path` → base + `/reports/` + path（门户约定，相对链接总是指向 reports 目录）
/// 5. `reports/path` → base + `/` + path
/// 6. 批改页文件名开头 → base + `/reports/` + path
/// 7. 其他 → base + `/` + path
///
/// 空链接返回空字符串。
pub fn resolve(href: &str, base: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return String::new();
    }
    if has_scheme(href) {
        return href.to_string();
    }
    if let Some(rest) = href.strip_prefix("//") {
        return format!("https://{rest}");
    }

    let base = base.trim().trim_end_matches('/');

    if href.starts_with('/') {
        return format!("{base}{href}");
    }
    if href.starts_with("../") {
        let mut rest = href;
        while let Some(stripped) = rest.strip_prefix("../") {
            rest = stripped;
        }
        return format!("{base}/reports/{rest}");
    }
    if href.starts_with("reports/") {
        return format!("{base}/{href}");
    }
    if href.starts_with(MARKING_PAGE_NAME) {
        return format!("{base}/reports/{href}");
    }
    format!("{base}/{}", href.trim_start_matches('/'))
}

/// RFC 3986 scheme: 字母开头，后接字母、数字、`+`、`-`、`.`，以 `:` 结束
fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}
