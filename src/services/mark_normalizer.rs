//! 分数格式归一化
//!
//! 门户用 `½` 等字形显示半分，Excel 打开 CSV 时会出问题，这里统一转成十进制字符串。

use std::sync::LazyLock;

use phf::phf_map;
use regex::Regex;
use tracing::debug;

/// 分数字形 → 小数部分
static FRACTION_GLYPHS: phf::Map<char, f64> = phf_map! {
    '½' => 0.5,
    '¼' => 0.25,
    '¾' => 0.75,
};

static TEXT_FRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*/\s*(\d+)$").expect("静态正则"));

static PLAIN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("静态正则"));

/// 把分数文本转换为十进制字符串
///
/// - 空白 → `""`
/// - `½` → `"0.5"`，`2½` / `2 ½` / `12½` → `"2.5"` / `"2.5"` / `"12.5"`
/// - `3/2` → `"1.5"`（分母为 0 时原样返回）
/// - `4`、`2.75` → 原样返回
/// - 其他 → 原样返回
pub fn normalize(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }

    if let Some(value) = parse_glyph(s) {
        return format_decimal(value);
    }

    if let Some(caps) = TEXT_FRACTION.captures(s) {
        let numerator = caps[1].parse::<f64>().ok();
        let denominator = caps[2].parse::<f64>().ok();
        return match (numerator, denominator) {
            (Some(n), Some(d)) if d != 0.0 => format_decimal(n / d),
            _ => {
                debug!("分母为 0，原样保留: {}", raw);
                raw.to_string()
            }
        };
    }

    if PLAIN_NUMBER.is_match(s) {
        return s.to_string();
    }

    debug!("无法识别的分数格式，原样保留: {}", raw);
    raw.to_string()
}

/// `<整数><字形>` 或单独字形
fn parse_glyph(s: &str) -> Option<f64> {
    let glyph = s.chars().last()?;
    let fraction = *FRACTION_GLYPHS.get(&glyph)?;
    let whole = s[..s.len() - glyph.len_utf8()].trim();

    if whole.is_empty() {
        return Some(fraction);
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    whole.parse::<u64>().ok().map(|w| w as f64 + fraction)
}

fn format_decimal(value: f64) -> String {
    format!("{}", value)
}
