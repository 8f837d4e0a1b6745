//! Publishes the outcome of a config-DB write back into APPL_STATE_DB and the
//! matching response notification channel.
//!
//! Mirrors the role of orchagent's response publisher: once an Orch has acted
//! on an intent written to APPL_DB, the publisher records what actually landed
//! (the "state") in APPL_STATE_DB and notifies anyone waiting on the synchronous
//! response channel for that table.

use crate::redis_backend::{RedisConfig, RedisDatabase};
use crate::task::{TaskError, TaskResult};
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;

pub use crate::redis_backend::RedisBackendError as ResponsePublisherError;

/// Result type for response publisher operations.
pub type Result<T> = std::result::Result<T, ResponsePublisherError>;

const NULL_FIELD: &str = "NULL";
const NULL_VALUE: &str = "NULL";

fn err_str_prefix(outcome: &TaskResult<()>) -> &'static str {
    match outcome {
        Ok(_) => "",
        Err(TaskError::SaiError { .. }) => "[SAI] ",
        Err(_) => "[OrchAgent] ",
    }
}

fn status_code_str(outcome: &TaskResult<()>) -> String {
    match outcome {
        Ok(_) => "SWSS_RC_SUCCESS".to_string(),
        Err(TaskError::InvalidEntry { .. }) => "SWSS_RC_INVALID_PARAM".to_string(),
        Err(TaskError::NeedRetry { .. }) => "SWSS_RC_RETRY".to_string(),
        Err(TaskError::WaitingForDependency { .. }) => "SWSS_RC_RETRY".to_string(),
        Err(TaskError::Ignored { .. }) => "SWSS_RC_IGNORE".to_string(),
        Err(TaskError::SaiError { .. }) => "SWSS_RC_UNKNOWN".to_string(),
        Err(TaskError::Internal { .. }) => "SWSS_RC_INTERNAL".to_string(),
    }
}

enum PendingOp {
    Write {
        table: String,
        key: String,
        fields: Vec<(String, String)>,
        replace: bool,
    },
    Delete {
        table: String,
        key: String,
    },
}

/// Writes intent outcomes to APPL_STATE_DB and fires response notifications.
///
/// When `buffered`, DB writes queue up and are only applied on [`flush`](Self::flush);
/// this lets an Orch batch a whole `do_task` pass into one round-trip.
pub struct ResponsePublisher {
    db: RedisDatabase,
    buffered: bool,
    pending: Vec<PendingOp>,
    record: bool,
    record_path: Option<PathBuf>,
    record_file: Option<File>,
}

impl ResponsePublisher {
    /// Connects to APPL_STATE_DB and creates a publisher.
    pub async fn new(config: RedisConfig, buffered: bool) -> Result<Self> {
        let db = RedisDatabase::new(config).await?;
        Ok(Self {
            db,
            buffered,
            pending: Vec::new(),
            record: false,
            record_path: None,
            record_file: None,
        })
    }

    /// Enables or disables write buffering.
    pub fn set_buffered(&mut self, buffered: bool) {
        self.buffered = buffered;
    }

    /// Enables response/write recording to a file, opening it for append.
    pub fn set_record(&mut self, record: bool, path: impl Into<PathBuf>) -> Result<()> {
        self.record = record;
        if record {
            let path = path.into();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    ResponsePublisherError::ConfigError(format!(
                        "failed to open record file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            self.record_path = Some(path);
            self.record_file = Some(file);
        } else {
            self.record_path = None;
            self.record_file = None;
        }
        Ok(())
    }

    /// Closes and reopens the record file, e.g. after external log rotation.
    pub fn perform_log_rotate(&mut self) -> Result<()> {
        if let Some(path) = self.record_path.clone() {
            self.record_file = None;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    ResponsePublisherError::ConfigError(format!(
                        "failed to reopen record file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            self.record_file = Some(file);
        }
        Ok(())
    }

    /// Publishes the outcome of a write, deriving `state_attrs` from `intent_attrs`
    /// on success and leaving them empty on failure.
    pub async fn publish(
        &mut self,
        table: &str,
        key: &str,
        intent_attrs: &[(String, String)],
        outcome: &TaskResult<()>,
        replace: bool,
    ) -> Result<()> {
        let state_attrs: Vec<(String, String)> = if outcome.is_ok() {
            intent_attrs.to_vec()
        } else {
            Vec::new()
        };
        self.publish_with_state(table, key, intent_attrs, outcome, &state_attrs, replace)
            .await
    }

    /// Publishes the outcome of a write with explicit state attributes, for cases
    /// where what landed differs from what was requested (e.g. a partial apply).
    pub async fn publish_with_state(
        &mut self,
        table: &str,
        key: &str,
        intent_attrs: &[(String, String)],
        outcome: &TaskResult<()>,
        state_attrs: &[(String, String)],
        replace: bool,
    ) -> Result<()> {
        let is_write = !intent_attrs.is_empty() && !state_attrs.is_empty();
        let is_successful_delete = outcome.is_ok() && intent_attrs.is_empty();

        if is_write || is_successful_delete {
            if intent_attrs.is_empty() {
                self.write_to_db(table, key, &[], false, replace).await?;
            } else {
                self.write_to_db(table, key, state_attrs, true, replace)
                    .await?;
            }
        }

        let channel = format!("APPL_DB_{}_RESPONSE_CHANNEL", table);
        let err_str = format!("{}{}", err_str_prefix(outcome), status_code_str(outcome));

        let mut notify_attrs = vec![("err_str".to_string(), err_str.clone())];
        notify_attrs.extend(state_attrs.iter().cloned());

        let message = encode_notification(&status_code_str(outcome), key, &notify_attrs);
        self.db.publish(&channel, &message).await?;

        self.record_response(&channel, key, &status_code_str(outcome), &notify_attrs);

        Ok(())
    }

    async fn write_to_db(
        &mut self,
        table: &str,
        key: &str,
        values: &[(String, String)],
        is_set: bool,
        replace: bool,
    ) -> Result<()> {
        if !is_set {
            if self.buffered {
                self.pending.push(PendingOp::Delete {
                    table: table.to_string(),
                    key: key.to_string(),
                });
            } else {
                self.db.delete_entry(table, key).await?;
            }
            self.record_db_write(table, key, "DEL", &[]);
            return Ok(());
        }

        if replace {
            self.db.delete_entry(table, key).await?;
        }

        let mut fields: Vec<(String, String)> = values.to_vec();
        if fields.is_empty() {
            fields.push((NULL_FIELD.to_string(), NULL_VALUE.to_string()));
        }

        let existing = self.db.get_entry(table, key).await?;
        let fields = match existing {
            None => fields,
            Some(_) => {
                let stripped: Vec<(String, String)> = fields
                    .into_iter()
                    .filter(|(f, _)| f != NULL_FIELD)
                    .collect();
                if stripped.is_empty() {
                    return Ok(());
                }
                stripped
            }
        };

        if self.buffered {
            self.pending.push(PendingOp::Write {
                table: table.to_string(),
                key: key.to_string(),
                fields: fields.clone(),
                replace: false,
            });
        } else {
            self.db.set_entry(table, key, &fields).await?;
        }

        self.record_db_write(table, key, "SET", &fields);
        Ok(())
    }

    /// Applies any buffered DB writes.
    pub async fn flush(&mut self) -> Result<()> {
        for op in std::mem::take(&mut self.pending) {
            match op {
                PendingOp::Write {
                    table,
                    key,
                    fields,
                    replace,
                } => {
                    if replace {
                        self.db.delete_entry(&table, &key).await?;
                    }
                    self.db.set_entry(&table, &key, &fields).await?;
                }
                PendingOp::Delete { table, key } => {
                    self.db.delete_entry(&table, &key).await?;
                }
            }
        }
        Ok(())
    }

    fn record_db_write(&mut self, table: &str, key: &str, op: &str, fields: &[(String, String)]) {
        if !self.record {
            return;
        }
        let line = encode_record(table, key, op, fields);
        self.write_record_line(&line);
    }

    fn record_response(
        &mut self,
        channel: &str,
        key: &str,
        status: &str,
        fields: &[(String, String)],
    ) {
        if !self.record {
            return;
        }
        let mut line = format!("{}|{}|{}:{}", timestamp(), channel, key, status);
        for (f, v) in fields {
            line.push('|');
            line.push_str(f);
            line.push(':');
            line.push_str(v);
        }
        self.write_record_line(&line);
    }

    fn write_record_line(&mut self, line: &str) {
        if let Some(file) = self.record_file.as_mut() {
            let _ = writeln!(file, "{}", line);
        }
    }
}

fn encode_record(table: &str, key: &str, op: &str, fields: &[(String, String)]) -> String {
    let mut line = format!("{}|{}:{}|{}", timestamp(), table, key, op);
    for (f, v) in fields {
        line.push('|');
        line.push_str(f);
        line.push(':');
        line.push_str(v);
    }
    line
}

fn encode_notification(status: &str, key: &str, fields: &[(String, String)]) -> String {
    let mut parts = vec![status.to_string(), key.to_string()];
    for (f, v) in fields {
        parts.push(format!("{}={}", f, v));
    }
    parts.join("|")
}

/// Monotonic, `chrono`-free timestamp placeholder; callers outside tests should
/// prefer recording via the system clock at the call site if wall time matters.
fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn err_str_prefix_distinguishes_sai_from_orch_errors() {
        let ok: TaskResult<()> = Ok(());
        assert_eq!(err_str_prefix(&ok), "");

        let sai: TaskResult<()> = Err(TaskError::sai_error("boom"));
        assert_eq!(err_str_prefix(&sai), "[SAI] ");

        let invalid: TaskResult<()> = Err(TaskError::invalid_entry("bad key"));
        assert_eq!(err_str_prefix(&invalid), "[OrchAgent] ");
    }

    #[test]
    fn encode_notification_prepends_err_str_and_joins_fields() {
        let fields = vec![
            ("err_str".to_string(), "SWSS_RC_SUCCESS".to_string()),
            ("admin_status".to_string(), "up".to_string()),
        ];
        let msg = encode_notification("SWSS_RC_SUCCESS", "Ethernet0", &fields);
        assert_eq!(
            msg,
            "SWSS_RC_SUCCESS|Ethernet0|err_str=SWSS_RC_SUCCESS|admin_status=up"
        );
    }

    #[test]
    fn status_code_str_maps_every_task_error_variant() {
        let need_retry: TaskResult<()> = Err(TaskError::need_retry("x"));
        assert_eq!(status_code_str(&need_retry), "SWSS_RC_RETRY");

        let ignored: TaskResult<()> = Err(TaskError::ignored("dup"));
        assert_eq!(status_code_str(&ignored), "SWSS_RC_IGNORE");
    }
}
