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

mod command;
mod error;
mod resource;

pub use command::CommandSpec;
pub use error::{ManagerError, Step, UNKNOWN_ERROR};
pub use resource::{decode_value, encode_value, ResourceCategory, RESOURCE_VALUE_CAPACITY};

use std::{
    fmt,
    io::{stderr, stdin, stdout},
    os::fd::{AsRawFd, RawFd},
};

use libc::pid_t;
use serde::Serialize;

/// Ask the runtime for the first free tty slot.
pub const FIRST_AVAILABLE_TTY: i32 = -1;
/// Ctrl-a, followed by `q` to leave a console session.
pub const ESCAPE_CTRL_A: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Undefined,
    Stopped,
    Running,
}

impl ContainerState {
    /// Ask the runtime for the current state of `handle`.
    pub fn query<H: RuntimeHandle + ?Sized>(handle: &H) -> Self {
        if handle.is_running() {
            ContainerState::Running
        } else if handle.is_defined() {
            ContainerState::Stopped
        } else {
            ContainerState::Undefined
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ContainerState::Undefined => "UNDEFINED",
            ContainerState::Stopped => "STOPPED",
            ContainerState::Running => "RUNNING",
        };
        write!(f, "{}", state)
    }
}

/// Address family of a `get_ip` lookup. Only IPv4 is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Inet,
}

/// Template used to build the root filesystem of a new container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub args: Vec<String>,
}

impl Template {
    pub fn download(dist: &str, release: &str, arch: &str) -> Self {
        Self {
            name: String::from("download"),
            args: vec![
                String::from("-d"),
                dist.to_string(),
                String::from("-r"),
                release.to_string(),
                String::from("-a"),
                arch.to_string(),
            ],
        }
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::download("ubuntu", "focal", "amd64")
    }
}

/// File descriptors wired into a console session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleStdio {
    pub stdin: RawFd,
    pub stdout: RawFd,
    pub stderr: RawFd,
}

impl ConsoleStdio {
    /// The standard streams of the current process.
    pub fn inherit() -> Self {
        Self {
            stdin: stdin().as_raw_fd(),
            stdout: stdout().as_raw_fd(),
            stderr: stderr().as_raw_fd(),
        }
    }
}

/// One container as seen through the runtime.
///
/// The shape follows liblxc: mutating calls report success as a bool and
/// leave the reason in `error_string`. A handle is released when dropped.
pub trait RuntimeHandle {
    fn name(&self) -> &str;

    fn is_defined(&self) -> bool;

    fn is_running(&self) -> bool;

    fn init_pid(&self) -> Option<pid_t>;

    fn create(&mut self, template: &Template) -> bool;

    fn start(&mut self) -> bool;

    fn stop(&mut self) -> bool;

    fn destroy(&mut self) -> bool;

    /// Run `exe` with `argv` inside the container and wait for it. Returns
    /// the exit status, or a negative value if it could not be run.
    fn attach_run_wait(&mut self, exe: &str, argv: &[String]) -> i32;

    /// Attach `stdio` to a console of the container until the session is
    /// left. Returns a negative value on failure.
    fn console_attach(&mut self, tty: i32, stdio: &ConsoleStdio, escape: u8) -> i32;

    fn set_cgroup_item(&mut self, key: &str, value: &str) -> bool;

    /// Copy the value of `key` into `buf`. Returns the full length of the
    /// value, which exceeds `buf.len()` when it did not fit, or a negative
    /// value on failure.
    fn get_cgroup_item(&mut self, key: &str, buf: &mut [u8]) -> i32;

    fn get_ip(&self, iface: &str, family: AddressFamily, index: usize) -> Option<String>;

    fn error_string(&self) -> Option<String>;
}

pub trait Provider {
    type Handle: RuntimeHandle;

    /// Set up a handle for `name`. The container does not have to exist.
    fn open(&self, name: &str) -> Option<Self::Handle>;

    /// Handles of all running containers, with the count reported by the
    /// runtime. A negative count means enumeration failed.
    fn list_active(&self) -> (i32, Vec<Self::Handle>);
}

/// Provider diagnostic for the last failed call on `handle`.
pub fn diagnostic<H: RuntimeHandle + ?Sized>(handle: &H) -> String {
    handle
        .error_string()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| String::from(UNKNOWN_ERROR))
}
