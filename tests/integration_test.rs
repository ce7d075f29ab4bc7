use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use examsys_saq_extractor::events::CollectingEventSink;
use examsys_saq_extractor::{
    BrowserSession, CancelFlag, ChromeSession, Config, EventSink, ExtractError, ExtractionEvent,
    ExtractionOrchestrator, RunStatus, StudentAnswerRecord,
};
use scraper::{Html, Selector};

const BASE: &str = "https://examsys.test";
const REPORT: &str = "https://examsys.test/reports/textbox_select_q.php?paperID=42";
const HEADER: &str = "question_number,student_id,student_label,mark,comment,student_answer\n";

// ========== 内存门户 ==========

/// 测试观察到的会话行为
#[derive(Clone, Default)]
struct Probe {
    visits: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl Probe {
    fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// 以地址 → HTML 表示的门户；未登记的地址导航失败
struct FakePortal {
    pages: HashMap<String, String>,
    current: Mutex<Option<String>>,
    probe: Probe,
}

impl FakePortal {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current: Mutex::new(None),
            probe: Probe::default(),
        }
    }

    fn page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    fn probe(&self) -> Probe {
        self.probe.clone()
    }

    fn current_html(&self) -> Result<String> {
        let current = self.current.lock().unwrap();
        let url = current.as_ref().ok_or_else(|| anyhow!("没有打开的页面"))?;
        Ok(self.pages[url].clone())
    }
}

impl BrowserSession for FakePortal {
    async fn goto(&self, url: &str) -> Result<()> {
        self.probe.visits.lock().unwrap().push(url.to_string());
        let mut current = self.current.lock().unwrap();
        if !self.pages.contains_key(url) {
            *current = None;
            bail!("net::ERR_ABORTED at {}", url);
        }
        *current = Some(url.to_string());
        Ok(())
    }

    async fn title(&self) -> Result<Option<String>> {
        Ok(Some("Primary Mark by Question".to_string()))
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        let html = self.current_html()?;
        let selector = Selector::parse(selector).map_err(|e| anyhow!("{:?}", e))?;
        Ok(Html::parse_document(&html).select(&selector).next().is_some())
    }

    async fn snapshot(&self) -> Result<String> {
        self.current_html()
    }

    async fn close(&mut self) -> Result<()> {
        self.probe.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ========== 页面构造 ==========

fn question_url(n: usize) -> String {
    format!("{}/reports/textbox_marking.php?paperID=42&q_id={}", BASE, n)
}

fn report_page(questions: usize) -> String {
    let links: String = (1..=questions)
        .map(|n| format!(r#"<tr><td><a href="textbox_marking.php?paperID=42&amp;q_id={n}">Q{n}</a></td></tr>"#))
        .collect();
    format!("<html><head><title>Primary Mark by Question</title></head><body><table>{links}</table></body></html>")
}

fn question_page(blocks: &[String]) -> String {
    format!("<html><body><h1>Marking</h1>{}</body></html>", blocks.concat())
}

fn block(id: &str, label: &str, mark: Option<&str>, answer: &str, comment: &str) -> String {
    let mark = mark
        .map(|m| format!(r#"<select id="mark_{id}"><option>-</option><option selected>{m}</option></select>"#))
        .unwrap_or_default();
    format!(
        r#"<div class="student-answer-block marked">
            <p class="theme">{label}</p>
            <input type="hidden" id="username_{id}" value="{id}">
            <div class="student_ans">{answer}</div>
            {mark}
            <textarea id="comment_{id}">{comment}</textarea>
        </div>"#
    )
}

fn test_config() -> Config {
    Config {
        portal_base_url: BASE.to_string(),
        ready_timeout_ms: 50,
        poll_interval_ms: 5,
        ..Config::default()
    }
}

fn output_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("examsys_it_{}_{}", std::process::id(), name))
        .join("feedback.csv")
}

fn read_rows(path: &Path) -> Vec<StudentAnswerRecord> {
    csv::Reader::from_path(path)
        .unwrap()
        .deserialize()
        .collect::<std::result::Result<Vec<_>, _>>()
        .unwrap()
}

fn cleanup(path: &Path) {
    if let Some(dir) = path.parent() {
        let _ = fs::remove_dir_all(dir);
    }
}

/// 第 `index` 题写完后请求停止
struct CancelAfter {
    index: usize,
    cancel: CancelFlag,
    inner: CollectingEventSink,
}

impl EventSink for CancelAfter {
    fn emit(&self, event: ExtractionEvent) {
        if matches!(event, ExtractionEvent::StudentsFound { index, .. } if index == self.index) {
            self.cancel.cancel();
        }
        self.inner.emit(event);
    }
}

// ========== 测试 ==========

#[tokio::test]
async fn extracts_rows_and_skips_question_without_blocks() {
    let portal = FakePortal::new()
        .page(REPORT, report_page(2))
        .page(
            question_url(1),
            question_page(&[
                block("s1001", "Ada Lovelace", Some("2"), "Engines compute", "Clear"),
                block("s1002", "Alan Turing", None, "Machines think", ""),
            ]),
        )
        .page(question_url(2), question_page(&[]));
    let probe = portal.probe();
    let events = CollectingEventSink::new();
    let output = output_path("end_to_end");

    let orchestrator = ExtractionOrchestrator::new(portal, events.clone(), &test_config()).unwrap();
    let summary = orchestrator
        .run(REPORT, &output, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.questions_discovered, 2);
    assert_eq!(summary.rows_written, 2);
    assert_eq!(summary.questions_processed, 1);
    assert_eq!(summary.questions_skipped, 1);
    assert_eq!(summary.students_seen, 2);
    assert!(!summary.cancelled);

    let rows = read_rows(&output);
    assert_eq!(
        rows,
        vec![
            StudentAnswerRecord {
                question_number: 1,
                student_id: "s1001".to_string(),
                student_label: "Ada Lovelace".to_string(),
                mark: "2".to_string(),
                comment: "Clear".to_string(),
                student_answer: "Engines compute".to_string(),
            },
            StudentAnswerRecord {
                question_number: 1,
                student_id: "s1002".to_string(),
                student_label: "Alan Turing".to_string(),
                mark: String::new(),
                comment: String::new(),
                student_answer: "Machines think".to_string(),
            },
        ]
    );

    let events = events.events();
    assert_eq!(
        events.first(),
        Some(&ExtractionEvent::PageTitleObserved {
            title: "Primary Mark by Question".to_string()
        })
    );
    assert!(events.contains(&ExtractionEvent::QuestionsDiscovered { count: 2 }));
    assert!(events.contains(&ExtractionEvent::StudentsFound { index: 1, count: 2 }));
    assert!(matches!(events.last(), Some(ExtractionEvent::RunComplete { rows: 2, .. })));
    assert!(probe.closed());

    cleanup(&output);
}

#[tokio::test]
async fn question_that_never_becomes_ready_is_skipped() {
    let unmarked = r#"<div class="student-answer-block"><p class="theme">Pending</p></div>"#;
    let portal = FakePortal::new()
        .page(REPORT, report_page(3))
        .page(question_url(1), question_page(&[block("s1", "One", Some("1"), "a", "")]))
        .page(question_url(2), question_page(&[unmarked.to_string()]))
        .page(question_url(3), question_page(&[block("s3", "Three", Some("0"), "c", "")]));
    let events = CollectingEventSink::new();
    let output = output_path("skip");

    let orchestrator = ExtractionOrchestrator::new(portal, events.clone(), &test_config()).unwrap();
    let summary = orchestrator
        .run(REPORT, &output, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.questions_skipped, 1);
    let numbers: Vec<usize> = read_rows(&output).iter().map(|r| r.question_number).collect();
    assert_eq!(numbers, vec![1, 3]);

    let failures: Vec<_> = events
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ExtractionEvent::QuestionFailed { index, url, .. } => Some((index, url)),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![(2, question_url(2))]);

    cleanup(&output);
}

#[tokio::test]
async fn unreachable_question_page_is_skipped() {
    let portal = FakePortal::new()
        .page(REPORT, report_page(2))
        .page(question_url(2), question_page(&[block("s9", "Nine", Some("3"), "z", "")]));
    let output = output_path("unreachable");

    let orchestrator =
        ExtractionOrchestrator::new(portal, CollectingEventSink::new(), &test_config()).unwrap();
    let summary = orchestrator
        .run(REPORT, &output, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(summary.questions_skipped, 1);
    assert_eq!(summary.rows_written, 1);
    assert_eq!(read_rows(&output)[0].question_number, 2);

    cleanup(&output);
}

#[tokio::test]
async fn report_without_questions_is_fatal_and_leaves_header_only() {
    let portal = FakePortal::new().page(REPORT, "<html><body><p>No questions</p></body></html>");
    let probe = portal.probe();
    let events = CollectingEventSink::new();
    let output = output_path("zero");

    let orchestrator = ExtractionOrchestrator::new(portal, events.clone(), &test_config()).unwrap();
    let err = orchestrator
        .run(REPORT, &output, &CancelFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::NoQuestionsFound { ref report_url } if report_url == REPORT));
    assert_eq!(fs::read_to_string(&output).unwrap(), HEADER);
    assert!(matches!(events.events().last(), Some(ExtractionEvent::RunFailed { .. })));
    assert!(probe.closed());

    cleanup(&output);
}

#[tokio::test]
async fn unreachable_report_page_is_fatal() {
    let portal = FakePortal::new();
    let probe = portal.probe();
    let output = output_path("no_report");

    let orchestrator =
        ExtractionOrchestrator::new(portal, CollectingEventSink::new(), &test_config()).unwrap();
    let err = orchestrator
        .run(REPORT, &output, &CancelFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::ReportUnavailable { ref url, .. } if url == REPORT));
    assert!(probe.closed());

    cleanup(&output);
}

#[tokio::test]
async fn unwritable_output_fails_before_navigation() {
    let blocker = std::env::temp_dir().join(format!("examsys_it_{}_blocker", std::process::id()));
    fs::write(&blocker, "not a directory").unwrap();
    let output = blocker.join("feedback.csv");

    let portal = FakePortal::new().page(REPORT, report_page(1));
    let probe = portal.probe();

    let orchestrator =
        ExtractionOrchestrator::new(portal, CollectingEventSink::new(), &test_config()).unwrap();
    let err = orchestrator
        .run(REPORT, &output, &CancelFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::SinkOpen { .. }));
    assert!(probe.visits().is_empty());
    assert!(probe.closed());

    let _ = fs::remove_file(&blocker);
}

#[tokio::test]
async fn cancellation_stops_between_questions() {
    let portal = FakePortal::new()
        .page(REPORT, report_page(3))
        .page(question_url(1), question_page(&[block("s1", "One", Some("1"), "a", "")]))
        .page(question_url(2), question_page(&[block("s2", "Two", Some("1"), "b", "")]))
        .page(question_url(3), question_page(&[block("s3", "Three", Some("1"), "c", "")]));
    let probe = portal.probe();
    let cancel = CancelFlag::new();
    let sink = CancelAfter {
        index: 1,
        cancel: cancel.clone(),
        inner: CollectingEventSink::new(),
    };
    let output = output_path("cancel");

    let orchestrator = ExtractionOrchestrator::new(portal, sink, &test_config()).unwrap();
    let summary = orchestrator.run(REPORT, &output, &cancel).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert!(summary.cancelled);
    assert_eq!(summary.questions_processed, 1);
    assert_eq!(summary.rows_written, 1);
    assert_eq!(read_rows(&output).len(), 1);
    assert!(!probe.visits().contains(&question_url(2)));

    cleanup(&output);
}

#[tokio::test]
async fn cancelled_before_start_writes_no_rows() {
    let portal = FakePortal::new()
        .page(REPORT, report_page(1))
        .page(question_url(1), question_page(&[block("s1", "One", Some("1"), "a", "")]));
    let cancel = CancelFlag::new();
    cancel.cancel();
    let output = output_path("cancel_early");

    let orchestrator =
        ExtractionOrchestrator::new(portal, CollectingEventSink::new(), &test_config()).unwrap();
    let summary = orchestrator.run(REPORT, &output, &cancel).await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.questions_discovered, 1);
    assert_eq!(summary.rows_written, 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), HEADER);

    cleanup(&output);
}

#[tokio::test]
async fn marks_are_normalized_in_output() {
    let portal = FakePortal::new().page(REPORT, report_page(1)).page(
        question_url(1),
        question_page(&[
            block("s1", "Half", Some("½"), "a", ""),
            block("s2", "Two and a half", Some("2½"), "b", ""),
            block("s3", "Fraction", Some("3/4"), "c", ""),
            block("s4", "Plain", Some("1.50"), "d", ""),
        ]),
    );
    let output = output_path("marks");

    let orchestrator =
        ExtractionOrchestrator::new(portal, CollectingEventSink::new(), &test_config()).unwrap();
    orchestrator
        .run(REPORT, &output, &CancelFlag::new())
        .await
        .unwrap();

    let marks: Vec<String> = read_rows(&output).into_iter().map(|r| r.mark).collect();
    assert_eq!(marks, vec!["0.5", "2.5", "0.75", "1.50"]);

    cleanup(&output);
}

#[tokio::test]
async fn multiline_fields_survive_csv_round_trip() {
    let portal = FakePortal::new().page(REPORT, report_page(1)).page(
        question_url(1),
        question_page(&[block(
            "s1",
            "Quote \"Me\"",
            Some("1"),
            "first line<br>second, with comma",
            "line one\r\nline two",
        )]),
    );
    let output = output_path("multiline");

    let orchestrator =
        ExtractionOrchestrator::new(portal, CollectingEventSink::new(), &test_config()).unwrap();
    orchestrator
        .run(REPORT, &output, &CancelFlag::new())
        .await
        .unwrap();

    let rows = read_rows(&output);
    assert_eq!(rows[0].student_label, "Quote \"Me\"");
    assert_eq!(rows[0].student_answer, "first line\nsecond, with comma");
    assert_eq!(rows[0].comment, "line one\nline two");

    cleanup(&output);
}

#[tokio::test]
async fn returns_to_report_between_questions() {
    let portal = FakePortal::new()
        .page(REPORT, report_page(2))
        .page(question_url(1), question_page(&[block("s1", "One", Some("1"), "a", "")]))
        .page(question_url(2), question_page(&[block("s2", "Two", Some("1"), "b", "")]));
    let probe = portal.probe();
    let config = Config {
        return_to_report: true,
        ..test_config()
    };
    let output = output_path("return");

    let orchestrator = ExtractionOrchestrator::new(portal, CollectingEventSink::new(), &config).unwrap();
    orchestrator
        .run(REPORT, &output, &CancelFlag::new())
        .await
        .unwrap();

    assert_eq!(
        probe.visits(),
        vec![
            REPORT.to_string(),
            question_url(1),
            REPORT.to_string(),
            question_url(2),
        ]
    );

    cleanup(&output);
}

#[tokio::test]
async fn invalid_selector_is_rejected_before_any_io() {
    let mut config = test_config();
    config.selectors.student_block = "div[[".to_string();

    let result = ExtractionOrchestrator::new(FakePortal::new(), CollectingEventSink::new(), &config);
    assert!(matches!(result, Err(ExtractError::InvalidSelector { .. })));
}

#[tokio::test]
#[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
async fn test_live_browser_extraction() {
    // 加载配置
    let config = Config::from_env();

    // 连接浏览器（需先登录并打开报告页）
    let session = ChromeSession::attach(config.browser_debug_port, config.report_url.as_deref())
        .await
        .expect("连接浏览器失败");
    let report_url = match &config.report_url {
        Some(url) => url.clone(),
        None => session
            .current_url()
            .await
            .expect("读取地址失败")
            .expect("没有打开的页面"),
    };

    let output = output_path("live");
    let orchestrator = ExtractionOrchestrator::new(session, CollectingEventSink::new(), &config)
        .expect("配置无效");
    let summary = orchestrator
        .run(&report_url, &output, &CancelFlag::new())
        .await
        .expect("提取失败");

    assert!(summary.questions_discovered > 0, "应该至少发现一道题目");
    assert_eq!(read_rows(&output).len(), summary.rows_written);
}
