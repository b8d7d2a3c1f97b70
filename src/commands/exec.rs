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

use std::io::Write;

use anyhow::{Context, Result};
use clap::{builder::NonEmptyStringValueParser, Parser};

use crate::{container::Provider, manager::ContainerManager, utils::ActivityRecorder};

/// Run a command inside a container and wait for it to exit
#[derive(Parser, Debug)]
pub struct Exec {
    /// Name of the container
    #[arg(value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub name: String,
    /// Command line to run, split on single spaces
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Exec {
    pub fn run<P: Provider, R: ActivityRecorder, W: Write>(
        &self,
        manager: &mut ContainerManager<P, R>,
        out: &mut W,
    ) -> Result<()> {
        let raw = self.command.join(" ");
        let status = manager
            .run_command(&self.name, &raw)
            .with_context(|| format!("Exec failed for container {}", self.name))?;
        writeln!(out, "Command exited with status {}", status)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{container::tests::FakeProvider, utils::MemoryRecorder};

    #[test]
    fn test_exec_parse() {
        let exec = Exec::try_parse_from(["exec", "c1", "ls", "-l", "/tmp"]).unwrap();
        assert_eq!(exec.name, "c1");
        assert_eq!(exec.command, vec!["ls", "-l", "/tmp"]);

        assert!(Exec::try_parse_from(["exec", "c1"]).is_err());
    }

    #[test]
    fn test_exec_run() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        provider.world.borrow_mut().exec_status = 3;
        let mut manager = ContainerManager::new(provider.clone(), MemoryRecorder::default());
        let exec = Exec::try_parse_from(["exec", "c1", "uname", "-a"]).unwrap();

        let mut out = Vec::new();
        exec.run(&mut manager, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Command exited with status 3\n");
        let (exe, argv) = provider.world.borrow().last_exec.clone().unwrap();
        assert_eq!(exe, "uname");
        assert_eq!(argv, vec!["uname", "-a"]);
    }
}
