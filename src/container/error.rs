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

use std::fmt;

use thiserror::Error;

use super::{ContainerState, ResourceCategory};

/// Diagnostic used when the provider fails without saying why.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// The provider call, or local check, an operation was at when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Open,
    Lookup,
    Create,
    Start,
    Stop,
    Destroy,
    Exec,
    Console,
    SetLimit,
    GetLimit,
    Pid,
    Enumerate,
    Parse,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Open => "open",
            Step::Lookup => "lookup",
            Step::Create => "create",
            Step::Start => "start",
            Step::Stop => "stop",
            Step::Destroy => "destroy",
            Step::Exec => "exec",
            Step::Console => "console",
            Step::SetLimit => "set limit",
            Step::GetLimit => "get limit",
            Step::Pid => "pid",
            Step::Enumerate => "enumerate",
            Step::Parse => "parse",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    #[error("Failed to set up container handle for {name}")]
    HandleUnavailable { name: String },
    #[error("Container {name} does not exist")]
    NotFound { name: String },
    #[error("Container {name} already exists")]
    AlreadyExists { name: String },
    #[error("Failed to create container {name} rootfs: {reason}")]
    CreateFailed { name: String, reason: String },
    #[error("Failed to start container {name}: {reason}")]
    StartFailed {
        name: String,
        reason: String,
        left: ContainerState,
    },
    #[error("Failed to stop container {name}: {reason}")]
    StopFailed { name: String, reason: String },
    #[error("Failed to destroy container {name}: {reason}")]
    DestroyFailed { name: String, reason: String },
    #[error("Failed to execute \"{command}\" in container {name}: {reason}")]
    ExecFailed {
        name: String,
        command: String,
        reason: String,
    },
    #[error("Failed to attach console of container {name}: {reason}")]
    ConsoleFailed { name: String, reason: String },
    #[error("Failed to set {category} of container {name} to {value}: {reason}")]
    SetLimitFailed {
        name: String,
        category: ResourceCategory,
        value: String,
        reason: String,
    },
    #[error("Failed to get {category} of container {name}: {reason}")]
    GetLimitFailed {
        name: String,
        category: ResourceCategory,
        reason: String,
    },
    #[error("Failed to get init pid of running container {name}")]
    PidUnavailable { name: String },
    #[error("Failed to list active containers: provider returned {count}")]
    EnumerationFailed { count: i32 },
    #[error("Command is empty")]
    EmptyCommand,
    #[error("Command has {count} arguments, at most {max} are allowed")]
    TooManyArguments { count: usize, max: usize },
    #[error("Invalid resource category {0}")]
    InvalidCategory(String),
}

impl ManagerError {
    pub fn step(&self) -> Step {
        match self {
            ManagerError::HandleUnavailable { .. } => Step::Open,
            ManagerError::NotFound { .. } | ManagerError::AlreadyExists { .. } => Step::Lookup,
            ManagerError::CreateFailed { .. } => Step::Create,
            ManagerError::StartFailed { .. } => Step::Start,
            ManagerError::StopFailed { .. } => Step::Stop,
            ManagerError::DestroyFailed { .. } => Step::Destroy,
            ManagerError::ExecFailed { .. } => Step::Exec,
            ManagerError::ConsoleFailed { .. } => Step::Console,
            ManagerError::SetLimitFailed { .. } => Step::SetLimit,
            ManagerError::GetLimitFailed { .. } => Step::GetLimit,
            ManagerError::PidUnavailable { .. } => Step::Pid,
            ManagerError::EnumerationFailed { .. } => Step::Enumerate,
            ManagerError::EmptyCommand
            | ManagerError::TooManyArguments { .. }
            | ManagerError::InvalidCategory(_) => Step::Parse,
        }
    }

    /// Name of the container the failed operation targeted, if any.
    pub fn container(&self) -> Option<&str> {
        match self {
            ManagerError::HandleUnavailable { name }
            | ManagerError::NotFound { name }
            | ManagerError::AlreadyExists { name }
            | ManagerError::CreateFailed { name, .. }
            | ManagerError::StartFailed { name, .. }
            | ManagerError::StopFailed { name, .. }
            | ManagerError::DestroyFailed { name, .. }
            | ManagerError::ExecFailed { name, .. }
            | ManagerError::ConsoleFailed { name, .. }
            | ManagerError::SetLimitFailed { name, .. }
            | ManagerError::GetLimitFailed { name, .. }
            | ManagerError::PidUnavailable { name } => Some(name),
            _ => None,
        }
    }

    /// State a failed create or start left the container in.
    pub fn state_left(&self) -> Option<ContainerState> {
        match self {
            ManagerError::CreateFailed { .. } => Some(ContainerState::Undefined),
            ManagerError::StartFailed { left, .. } => Some(*left),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_step_and_container() {
        let err = ManagerError::StartFailed {
            name: String::from("c1"),
            reason: String::from(UNKNOWN_ERROR),
            left: ContainerState::Stopped,
        };
        assert_eq!(err.step(), Step::Start);
        assert_eq!(err.container(), Some("c1"));
        assert_eq!(err.state_left(), Some(ContainerState::Stopped));
        assert_eq!(
            err.to_string(),
            "Failed to start container c1: unknown error"
        );

        let err = ManagerError::TooManyArguments { count: 200, max: 128 };
        assert_eq!(err.step(), Step::Parse);
        assert_eq!(err.container(), None);
        assert_eq!(err.state_left(), None);
    }

    #[test]
    fn test_create_failure_leaves_undefined() {
        let err = ManagerError::CreateFailed {
            name: String::from("c1"),
            reason: String::from("template not found"),
        };
        assert_eq!(err.step(), Step::Create);
        assert_eq!(err.state_left(), Some(ContainerState::Undefined));
    }
}
