use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLogMode {
    Full,
    Diffed,
}

/// NDJSON record of every exchange with the cloud API, scoped to one session.
pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous: HashMap<String, Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            mode,
            file,
            previous: HashMap::new(),
        })
    }

    pub fn log_request(&mut self, method: &str, path: &str, body: Option<&Value>) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
            "body": body,
        });
        self.write_line(&entry);
    }

    pub fn log_response(&mut self, path: &str, status: u16, body: Option<&Value>) {
        let Some(body) = body else {
            let entry = json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "resp",
                "path": path,
                "status": status,
            });
            self.write_line(&entry);
            return;
        };

        let entry = match self.mode {
            MessageLogMode::Full => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "resp",
                "path": path,
                "status": status,
                "body": body,
            }),
            MessageLogMode::Diffed => {
                let keyed = key_by_device_id(body);
                let entry = match self.previous.get(path) {
                    None => json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "resp",
                        "path": path,
                        "status": status,
                        "full": true,
                        "body": body,
                    }),
                    Some(prev) => {
                        let mut changes = Vec::new();
                        diff_json(prev, &keyed, "", &mut changes);
                        let changes: Vec<Value> = changes
                            .into_iter()
                            .map(|(path, old, new)| json!({ "path": path, "old": old, "new": new }))
                            .collect();
                        json!({
                            "ts": Utc::now().to_rfc3339(),
                            "dir": "resp",
                            "path": path,
                            "status": status,
                            "changes": changes,
                        })
                    }
                };
                self.previous.insert(path.to_string(), keyed);
                entry
            }
        };
        self.write_line(&entry);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write message log entry: {e}");
        }
    }
}

/// Device lists are diffed per device rather than per array index.
fn key_by_device_id(body: &Value) -> Value {
    let Value::Array(items) = body else {
        return body.clone();
    };
    let mut keyed = Map::new();
    for (idx, item) in items.iter().enumerate() {
        let key = item
            .get("deviceId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| idx.to_string());
        keyed.insert(key, item.clone());
    }
    Value::Object(keyed)
}

fn diff_json(previous: &Value, current: &Value, prefix: &str, changes: &mut Vec<(String, Value, Value)>) {
    match (previous, current) {
        (Value::Object(prev), Value::Object(curr)) => {
            for (key, curr_val) in curr {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                let prev_val = prev.get(key).unwrap_or(&Value::Null);
                diff_json(prev_val, curr_val, &path, changes);
            }
            for (key, prev_val) in prev {
                if !curr.contains_key(key) {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    changes.push((path, prev_val.clone(), Value::Null));
                }
            }
        }
        (Value::Null, Value::Object(_)) => {
            diff_json(&Value::Object(Map::new()), current, prefix, changes);
        }
        (prev, curr) if prev != curr => {
            changes.push((prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}
