//! End-to-end client flows exercised against a scripted fake DOM.
//!
//! The fake driver resolves marker waits from a scripted set of "present"
//! selectors and records every interaction, so these tests pin down the
//! observable contract of the client: which markers are probed, which
//! elements are touched in which order, and how failures degrade.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::FutureExt;

use whatsapp_rs::browser::{DriverError, LaunchPlan, WaitCondition, WhatsappDriver};
use whatsapp_rs::config::Verbosity;
use whatsapp_rs::logging::{LogCallback, LogLevel, LogRecord};
use whatsapp_rs::{LocatorSet, MediaKind, UiRole, WhatsappClient, WhatsappConfig, WhatsappError};

/// Driver backed by a scripted fake DOM.
#[derive(Default)]
struct FakeDriver {
    present: Mutex<HashSet<String>>,
    wait_queue: Mutex<HashMap<String, VecDeque<bool>>>,
    fail_launch: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl FakeDriver {
    fn with_present(selectors: impl IntoIterator<Item = String>) -> Arc<Self> {
        let driver = Arc::new(FakeDriver::default());
        driver.present.lock().unwrap().extend(selectors);
        driver
    }

    fn queue_wait_results(&self, selector: &str, results: &[bool]) {
        self.wait_queue
            .lock()
            .unwrap()
            .insert(selector.to_string(), results.iter().copied().collect());
    }

    fn refuse_launch(&self) {
        *self.fail_launch.lock().unwrap() = true;
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call_index(&self, prefix: &str) -> Option<usize> {
        self.calls()
            .iter()
            .position(|call| call.starts_with(prefix))
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WhatsappDriver for FakeDriver {
    async fn launch(&self, _plan: &LaunchPlan) -> Result<(), DriverError> {
        self.record("launch".to_string());
        if *self.fail_launch.lock().unwrap() {
            return Err(DriverError::Launch("no usable browser".to_string()));
        }
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        self.record(format!("goto:{url}"));
        Ok(())
    }

    async fn wait_for(
        &self,
        selector: &str,
        condition: WaitCondition,
        timeout_ms: u64,
    ) -> Result<(), DriverError> {
        self.record(format!("wait:{condition:?}:{selector}"));

        if condition == WaitCondition::Visible {
            if let Some(queued) = self
                .wait_queue
                .lock()
                .unwrap()
                .get_mut(selector)
                .and_then(VecDeque::pop_front)
            {
                if queued {
                    self.present.lock().unwrap().insert(selector.to_string());
                    return Ok(());
                }
                return Err(DriverError::Timeout {
                    selector: selector.to_string(),
                    timeout_ms,
                });
            }
        }

        let present = self.present.lock().unwrap().contains(selector);
        let satisfied = match condition {
            WaitCondition::Visible => present,
            WaitCondition::Detached => !present,
        };
        if satisfied {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                selector: selector.to_string(),
                timeout_ms,
            })
        }
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        self.record(format!("click:{selector}"));
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        self.record(format!("fill:{selector}:{text}"));
        Ok(())
    }

    async fn press(&self, selector: &str, key: &str) -> Result<(), DriverError> {
        self.record(format!("press:{selector}:{key}"));
        Ok(())
    }

    async fn set_files(&self, selector: &str, file: &Path) -> Result<(), DriverError> {
        self.record(format!("files:{selector}:{}", file.display()));
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), DriverError> {
        self.record("shutdown".to_string());
        Ok(())
    }
}

fn capture_logs() -> (LogCallback, Arc<Mutex<Vec<LogRecord>>>) {
    let records = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&records);
    let callback: LogCallback = Arc::new(move |record: &LogRecord| {
        sink.lock().unwrap().push(record.clone());
    });
    (callback, records)
}

fn test_config(logger: LogCallback) -> WhatsappConfig {
    WhatsappConfig {
        timeout_ms: 50,
        settle_delay_ms: 0,
        verbose: Verbosity::Detailed,
        logger: Some(logger),
        ..WhatsappConfig::default()
    }
}

fn selector(role: UiRole) -> String {
    LocatorSet::default().selector(role).to_string()
}

fn logged_in_dom() -> Arc<FakeDriver> {
    FakeDriver::with_present([
        selector(UiRole::ConversationSearch),
        selector(UiRole::MessageInput),
    ])
}

#[tokio::test]
async fn scenario_a_login_with_search_marker_present() {
    let driver = FakeDriver::with_present([selector(UiRole::ConversationSearch)]);
    let (callback, records) = capture_logs();
    let client = WhatsappClient::new(test_config(callback), driver.clone());

    assert!(client.login().await.expect("login"));

    let records = records.lock().unwrap();
    assert!(records.iter().any(|r| r.message.contains("Logged in")));
    assert!(!records.iter().any(|r| r.message.contains("QR")));
}

#[tokio::test]
async fn scenario_b_qr_marker_then_search_marker() {
    let driver = FakeDriver::with_present([selector(UiRole::QrCode)]);
    driver.queue_wait_results(&selector(UiRole::ConversationSearch), &[false, true]);
    let (callback, records) = capture_logs();
    let client = WhatsappClient::new(test_config(callback), driver.clone());

    assert!(client.login().await.expect("login"));

    let records = records.lock().unwrap();
    let qr_prompts = records
        .iter()
        .filter(|r| r.level == LogLevel::Info && r.message.contains("QR"))
        .count();
    assert_eq!(qr_prompts, 1);
}

#[tokio::test]
async fn login_with_no_markers_raises_once() {
    let driver = Arc::new(FakeDriver::default());
    let (callback, records) = capture_logs();
    let client = WhatsappClient::new(test_config(callback), driver.clone());

    let err = client.login().await.expect_err("login should fail");
    assert!(matches!(err, WhatsappError::LoginTimeout { .. }));

    let error_count = records
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.level == LogLevel::Error)
        .count();
    assert_eq!(error_count, 1);
}

#[tokio::test]
async fn scenario_c_send_text_success_logs_contact_and_message() {
    let driver = logged_in_dom();
    let (callback, records) = capture_logs();
    let client = WhatsappClient::new(test_config(callback), driver.clone());

    assert!(client.send_text("Alice", "hi").await);

    let records = records.lock().unwrap();
    let success: Vec<_> = records
        .iter()
        .filter(|r| r.level == LogLevel::Info && r.message.contains("sent to"))
        .collect();
    assert_eq!(success.len(), 1);
    assert!(success[0].message.contains("Alice"));
    assert!(success[0].message.contains("hi"));

    let calls = driver.calls();
    assert!(calls.contains(&format!("click:{}", selector(UiRole::SendButton))));
    assert!(
        calls.contains(&format!(
            "wait:Detached:{}",
            selector(UiRole::SendingIndicator)
        ))
    );

    let metrics = client.metrics();
    assert_eq!(metrics.texts_sent, 1);
    assert_eq!(metrics.texts_failed, 0);
}

#[tokio::test]
async fn scenario_d_send_document_with_caption() {
    let driver = logged_in_dom();
    let (callback, _records) = capture_logs();
    let client = WhatsappClient::new(test_config(callback), driver.clone());

    assert!(
        client
            .send_file(
                Path::new("doc.pdf"),
                "Bob",
                Some("see attached"),
                MediaKind::Document,
            )
            .await
    );

    let calls = driver.calls();
    assert!(calls.contains(&format!("click:{}", selector(UiRole::DocumentOption))));
    assert!(!calls.contains(&format!("click:{}", selector(UiRole::ImageOption))));
    assert!(calls.contains(&format!(
        "files:{}:doc.pdf",
        selector(UiRole::DocumentFileInput)
    )));

    // The caption goes into the message input before the attach menu opens.
    let caption_index = driver
        .call_index(&format!(
            "fill:{}:see attached",
            selector(UiRole::MessageInput)
        ))
        .expect("caption fill");
    let attach_index = driver
        .call_index(&format!("click:{}", selector(UiRole::AttachMenu)))
        .expect("attach click");
    assert!(caption_index < attach_index);

    assert_eq!(client.metrics().files_sent, 1);
}

#[tokio::test]
async fn send_file_without_contact_degrades_to_false() {
    let driver = FakeDriver::with_present([selector(UiRole::ConversationSearch)]);
    let (callback, records) = capture_logs();
    let client = WhatsappClient::new(test_config(callback), driver.clone());

    assert!(
        !client
            .send_file(Path::new("photo.jpg"), "Carol", None, MediaKind::Image)
            .await
    );

    let records = records.lock().unwrap();
    assert!(
        records
            .iter()
            .any(|r| r.level == LogLevel::Warn && r.message.contains("Carol"))
    );

    // No attachment interaction happened.
    let calls = driver.calls();
    assert!(!calls.iter().any(|call| call.starts_with("files:")));
    assert_eq!(client.metrics().files_failed, 1);
}

#[tokio::test]
async fn sending_indicator_that_never_detaches_fails_the_send() {
    let driver = FakeDriver::with_present([
        selector(UiRole::ConversationSearch),
        selector(UiRole::MessageInput),
        selector(UiRole::SendingIndicator),
    ]);
    let (callback, records) = capture_logs();
    let client = WhatsappClient::new(test_config(callback), driver.clone());

    assert!(!client.send_text("Alice", "hi").await);

    let records = records.lock().unwrap();
    assert!(
        records
            .iter()
            .any(|r| r.level == LogLevel::Warn && r.message.contains("Failed to send"))
    );
}

#[tokio::test]
async fn scoped_session_shuts_down_after_success() {
    let driver = logged_in_dom();
    let (callback, _records) = capture_logs();

    let sent = WhatsappClient::scoped(test_config(callback), driver.clone(), |client| {
        async move { client.send_text("Alice", "hi").await }.boxed()
    })
    .await
    .expect("scoped session");

    assert!(sent);
    let calls = driver.calls();
    assert_eq!(calls.first().map(String::as_str), Some("launch"));
    assert_eq!(calls.last().map(String::as_str), Some("shutdown"));
}

#[tokio::test]
async fn scoped_session_shuts_down_after_startup_failure() {
    let driver = Arc::new(FakeDriver::default());
    driver.refuse_launch();
    let (callback, _records) = capture_logs();

    let result = WhatsappClient::scoped(test_config(callback), driver.clone(), |client| {
        async move { client.send_text("Alice", "hi").await }.boxed()
    })
    .await;

    assert!(matches!(
        result,
        Err(WhatsappError::Driver(DriverError::Launch(_)))
    ));
    assert!(driver.calls().contains(&"shutdown".to_string()));
}
