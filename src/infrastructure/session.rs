//! 浏览会话抽象
//!
//! 编排层只通过这个 trait 操作浏览器，生产环境由 [`ChromeSession`](super::ChromeSession)
//! 实现，测试中可以用内存页面替代。

use anyhow::Result;

/// 一个已登录的浏览会话（单标签页）
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    /// 导航到地址，等待初始文档解析完成
    async fn goto(&self, url: &str) -> Result<()>;

    /// 当前页面标题
    async fn title(&self) -> Result<Option<String>>;

    /// 当前页面是否存在匹配选择器的元素
    async fn exists(&self, selector: &str) -> Result<bool>;

    /// 当前页面的 HTML 快照，表单控件的实时值（文本框内容、选中项）已写回标记
    async fn snapshot(&self) -> Result<String>;

    /// 释放会话
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
