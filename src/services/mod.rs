pub mod block_extractor;
pub mod csv_sink;
pub mod discovery;
pub mod mark_normalizer;
pub mod navigator;
pub mod url_resolver;

pub use block_extractor::BlockExtractor;
pub use csv_sink::CsvSink;
pub use discovery::QuestionDiscovery;
pub use navigator::PageNavigator;

use scraper::Selector;

use crate::error::{ExtractError, Result};

/// 解析 CSS 选择器，失败时带上原始文本
pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}
