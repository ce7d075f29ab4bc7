pub mod chrome_session;
pub mod js_executor;
pub mod session;

pub use chrome_session::ChromeSession;
pub use js_executor::JsExecutor;
pub use session::BrowserSession;
