//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use anyhow::Result;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// 克隆文档并把表单控件的实时状态写回克隆体，返回完整 HTML
///
/// 不修改页面本身。
const SNAPSHOT_SCRIPT: &str = r#"
(() => {
    const live = document.documentElement;
    const copy = live.cloneNode(true);

    const liveAreas = live.querySelectorAll('textarea');
    const copyAreas = copy.querySelectorAll('textarea');
    liveAreas.forEach((el, i) => {
        if (copyAreas[i]) copyAreas[i].textContent = el.value;
    });

    const liveSelects = live.querySelectorAll('select');
    const copySelects = copy.querySelectorAll('select');
    liveSelects.forEach((el, i) => {
        const target = copySelects[i];
        if (!target) return;
        Array.from(el.options).forEach((opt, j) => {
            const o = target.options[j];
            if (!o) return;
            if (opt.selected) o.setAttribute('selected', 'selected');
            else o.removeAttribute('selected');
        });
    });

    const liveInputs = live.querySelectorAll('input');
    const copyInputs = copy.querySelectorAll('input');
    liveInputs.forEach((el, i) => {
        if (copyInputs[i] && el.value != null) copyInputs[i].setAttribute('value', el.value);
    });

    return '<!DOCTYPE html>' + copy.outerHTML;
})()
"#;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识题目 / 学生
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航等操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> Result<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 页面中是否存在匹配选择器的元素
    pub async fn query_exists(&self, selector: &str) -> Result<bool> {
        let js_code = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        self.eval_as(js_code).await
    }

    /// 带实时表单状态的 HTML 快照
    pub async fn snapshot_html(&self) -> Result<String> {
        self.eval_as(SNAPSHOT_SCRIPT).await
    }
}
