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

use log::{error, info};

use super::ContainerManager;
use crate::{
    container::{
        diagnostic, CommandSpec, ConsoleStdio, ManagerError, Provider, RuntimeHandle,
        ESCAPE_CTRL_A, FIRST_AVAILABLE_TTY,
    },
    utils::{ActivityRecorder, Severity},
};

impl<P: Provider, R: ActivityRecorder> ContainerManager<P, R> {
    /// Run `raw` inside `name` and wait for it to exit, starting the
    /// container first if needed. Returns the exit status of the command.
    pub fn run_command(&mut self, name: &str, raw: &str) -> Result<i32, ManagerError> {
        let command = match CommandSpec::parse(raw) {
            Ok(command) => command,
            Err(e) => {
                error!("Rejected command \"{}\" for container {}: {}", raw, name, e);
                self.record(Severity::Error, &e.to_string());
                return Err(e);
            }
        };

        let result = self.attach_and_run(name, &command);
        match &result {
            Ok(status) => self.record(
                Severity::Info,
                &format!(
                    "Executed \"{}\" in container {}, exit status {}",
                    command.raw(),
                    name,
                    status
                ),
            ),
            Err(e) => self.record(Severity::Error, &e.to_string()),
        }
        result
    }

    fn attach_and_run(&mut self, name: &str, command: &CommandSpec) -> Result<i32, ManagerError> {
        let mut handle = self.open(name)?;
        self.ensure_running(&mut handle)?;

        info!("Executing {:?} in container {}", command.argv(), name);
        let status = handle.attach_run_wait(command.program(), command.argv());
        if status < 0 {
            let reason = diagnostic(&handle);
            error!(
                "Failed to execute \"{}\" in container {}: {}",
                command.raw(),
                name,
                reason
            );
            return Err(ManagerError::ExecFailed {
                name: name.to_string(),
                command: command.raw().to_string(),
                reason,
            });
        }
        info!("Command in container {} exited with {}", name, status);
        Ok(status)
    }

    /// Attach the terminal of this process to a console of `name`, starting
    /// it first if needed. Blocks until the operator leaves the session.
    pub fn start_console(&mut self, name: &str) -> Result<(), ManagerError> {
        let mut handle = self.open(name)?;
        self.ensure_running(&mut handle)?;

        info!(
            "Attaching console of container {}, type <Ctrl+a q> to exit",
            name
        );
        let stdio = ConsoleStdio::inherit();
        if handle.console_attach(FIRST_AVAILABLE_TTY, &stdio, ESCAPE_CTRL_A) < 0 {
            let reason = diagnostic(&handle);
            error!("Failed to attach console of container {}: {}", name, reason);
            return Err(ManagerError::ConsoleFailed {
                name: name.to_string(),
                reason,
            });
        }
        self.record(
            Severity::Info,
            &format!("Console session with container {} closed", name),
        );
        Ok(())
    }
}
