//! Per-operation accounting for the WhatsApp client.
//!
//! Counters only, no timing: how many logins completed, how many QR prompts
//! were surfaced, and how many sends succeeded or degraded to a failure
//! result.

use serde::{Deserialize, Serialize};

/// Send operations tracked by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendKind {
    Text,
    File,
}

/// Aggregated counters across a client's lifetime.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WhatsappMetrics {
    pub logins_completed: u64,
    pub qr_prompts_issued: u64,

    pub texts_sent: u64,
    pub texts_failed: u64,

    pub files_sent: u64,
    pub files_failed: u64,
}

impl WhatsappMetrics {
    /// Merge the values from another metrics instance into this one.
    pub fn merge(&mut self, other: &WhatsappMetrics) {
        self.logins_completed += other.logins_completed;
        self.qr_prompts_issued += other.qr_prompts_issued;
        self.texts_sent += other.texts_sent;
        self.texts_failed += other.texts_failed;
        self.files_sent += other.files_sent;
        self.files_failed += other.files_failed;
    }

    /// Record the outcome of a send operation.
    pub fn record_send(&mut self, kind: SendKind, delivered: bool) {
        match (kind, delivered) {
            (SendKind::Text, true) => self.texts_sent += 1,
            (SendKind::Text, false) => self.texts_failed += 1,
            (SendKind::File, true) => self.files_sent += 1,
            (SendKind::File, false) => self.files_failed += 1,
        }
    }

    pub fn record_login(&mut self) {
        self.logins_completed += 1;
    }

    pub fn record_qr_prompt(&mut self) {
        self.qr_prompts_issued += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_send_updates_matching_counter() {
        let mut metrics = WhatsappMetrics::default();
        metrics.record_send(SendKind::Text, true);
        metrics.record_send(SendKind::Text, false);
        metrics.record_send(SendKind::File, true);
        metrics.record_send(SendKind::File, true);

        assert_eq!(metrics.texts_sent, 1);
        assert_eq!(metrics.texts_failed, 1);
        assert_eq!(metrics.files_sent, 2);
        assert_eq!(metrics.files_failed, 0);
    }

    #[test]
    fn merge_combines_two_instances() {
        let mut a = WhatsappMetrics::default();
        a.record_login();
        a.record_send(SendKind::Text, true);

        let mut b = WhatsappMetrics::default();
        b.record_login();
        b.record_qr_prompt();
        b.record_send(SendKind::File, false);

        a.merge(&b);
        assert_eq!(a.logins_completed, 2);
        assert_eq!(a.qr_prompts_issued, 1);
        assert_eq!(a.texts_sent, 1);
        assert_eq!(a.files_failed, 1);
    }
}
