// Copyright (c) 2024 Huawei Technologies Co.,Ltd. All rights reserved.
//
// lxcmgr is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//! Operator-facing audit trail. Unlike the diagnostic logger, every entry
//! here corresponds to an operation with a visible effect on a container.

use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use super::{open_append, LxcmgrErr};

pub const DEFAULT_ACTIVITY_LOG: &str = "/var/log/lxcmgr/activity.log";
pub const ACTIVITY_LOG_ENV: &str = "LXCMGR_ACTIVITY_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{}", tag)
    }
}

#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub time: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

impl ActivityEntry {
    pub fn now(severity: Severity, message: &str) -> Self {
        Self {
            time: Local::now(),
            severity,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.severity,
            self.message
        )
    }
}

/// Sink for activity entries.
///
/// Managers treat an append failure as non-fatal: they log it and carry on
/// with the operation.
pub trait ActivityRecorder {
    fn append(&mut self, severity: Severity, message: &str) -> Result<()>;
}

/// Appends one line per entry to a file. The file is opened for every append
/// so nothing is held open between operations.
pub struct FileRecorder {
    path: PathBuf,
}

impl FileRecorder {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Path from `LXCMGR_ACTIVITY_LOG`, falling back to the default location.
    pub fn default_path() -> PathBuf {
        match std::env::var(ACTIVITY_LOG_ENV) {
            Ok(p) if !p.is_empty() => PathBuf::from(p),
            _ => PathBuf::from(DEFAULT_ACTIVITY_LOG),
        }
    }
}

impl ActivityRecorder for FileRecorder {
    fn append(&mut self, severity: Severity, message: &str) -> Result<()> {
        let mut file = open_append(&self.path)?;
        let entry = ActivityEntry::now(severity, message);
        writeln!(file, "{}", entry)
            .with_context(|| LxcmgrErr::WriteFile(self.path.display().to_string()))?;
        Ok(())
    }
}

impl<R: ActivityRecorder + ?Sized> ActivityRecorder for Box<R> {
    fn append(&mut self, severity: Severity, message: &str) -> Result<()> {
        (**self).append(severity, message)
    }
}

/// Keeps entries in memory, used where no audit file is wanted.
#[derive(Default)]
pub struct MemoryRecorder {
    pub entries: Vec<ActivityEntry>,
}

#[cfg(test)]
impl MemoryRecorder {
    pub fn messages(&self, severity: Severity) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.as_str())
            .collect()
    }
}

impl ActivityRecorder for MemoryRecorder {
    fn append(&mut self, severity: Severity, message: &str) -> Result<()> {
        self.entries.push(ActivityEntry::now(severity, message));
        Ok(())
    }
}
