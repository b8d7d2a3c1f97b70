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

use std::{
    fs::{remove_file, rename},
    io::{stderr, Write},
    num::Wrapping,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Local};
use log::{set_boxed_logger, set_max_level, Level, LevelFilter, Log, Metadata, Record};
use nix::unistd::getpid;

use super::open_append;

pub const LOG_LEVEL_ENV: &str = "LXCMGR_LOG_LEVEL";

// Maximum size of log file is 100MB.
const LOG_ROTATE_SIZE_MAX: usize = 100 * 1024 * 1024;
// Logs are retained for seven days at most.
const LOG_ROTATE_CNT_MAX: u8 = 7;

struct Sink {
    writer: Box<dyn Write + Send>,
    path: Option<PathBuf>,
    size: Wrapping<usize>,
    day: u32,
}

impl Sink {
    fn stderr() -> Self {
        Self {
            writer: Box::new(stderr()),
            path: None,
            size: Wrapping(0),
            day: 0,
        }
    }

    fn file(path: &Path) -> Result<Self> {
        let file = open_append(path)?;
        let metadata = file.metadata().with_context(|| "Failed to get metadata")?;
        let modified = metadata
            .modified()
            .with_context(|| "Failed to get modify time")?;

        Ok(Self {
            writer: Box::new(file),
            path: Some(path.to_path_buf()),
            size: Wrapping(metadata.len() as usize),
            day: DateTime::<Local>::from(modified).day(),
        })
    }

    fn backup_name(path: &Path, index: u8) -> PathBuf {
        if index == 0 {
            return path.to_path_buf();
        }
        PathBuf::from(format!("{}{}", path.display(), index))
    }

    fn rotate(&mut self, written: usize) -> Result<()> {
        let path = match &self.path {
            Some(p) => p.clone(),
            None => return Ok(()),
        };

        self.size += Wrapping(written);
        let today = Local::now().day();
        if self.size < Wrapping(LOG_ROTATE_SIZE_MAX) && self.day == today {
            return Ok(());
        }

        let oldest = Self::backup_name(&path, LOG_ROTATE_CNT_MAX - 1);
        if oldest.exists() {
            remove_file(&oldest).with_context(|| "Failed to delete oldest log")?;
        }

        // Shift "log5" to "log6", ..., "log" to "log1".
        for index in (0..LOG_ROTATE_CNT_MAX - 1).rev() {
            let from = Self::backup_name(&path, index);
            let to = Self::backup_name(&path, index + 1);
            if from.exists() {
                rename(&from, &to).with_context(|| {
                    format!("Failed to rename {} to {}", from.display(), to.display())
                })?;
            }
        }

        self.writer = Box::new(open_append(&path)?);
        self.size = Wrapping(0);
        self.day = today;
        Ok(())
    }
}

struct Logger {
    sink: Mutex<Sink>,
    level: Level,
}

impl Logger {
    fn new(path: &Option<PathBuf>, level: Level) -> Result<Self> {
        let sink = match path {
            Some(p) => Sink::file(p)?,
            None => Sink::stderr(),
        };
        Ok(Self {
            sink: Mutex::new(sink),
            level,
        })
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!(
            "{}: [{}][{}: {}]:{}: {}\n",
            Local::now().format("%Y-%m-%dT%H:%M:%S%.9f"),
            getpid(),
            record.file().unwrap_or(""),
            record.line().unwrap_or(0),
            record.level(),
            record.args()
        );

        let mut sink = match self.sink.lock() {
            Ok(s) => s,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = sink.writer.write_all(line.as_bytes()) {
            eprintln!("Failed to log message: {:?}", e);
            return;
        }
        if let Err(e) = sink.rotate(line.len()) {
            eprintln!("Failed to rotate log files: {:?}", e);
        }
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.writer.flush();
        }
    }
}

fn level_from_env() -> Level {
    match std::env::var(LOG_LEVEL_ENV) {
        Ok(level) => match level.to_lowercase().as_str() {
            "error" => Level::Error,
            "warn" => Level::Warn,
            "debug" => Level::Debug,
            "trace" => Level::Trace,
            _ => Level::Info,
        },
        _ => Level::Info,
    }
}

pub fn init(path: &Option<PathBuf>, debug: bool) -> Result<()> {
    let level = if debug {
        Level::Debug
    } else {
        level_from_env()
    };

    let logger = Box::new(Logger::new(path, level)?);
    set_boxed_logger(logger)
        .map(|_| set_max_level(LevelFilter::Trace))
        .with_context(|| "Logger has been already set")?;
    Ok(())
}
