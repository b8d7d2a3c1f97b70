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

/// Attach the terminal to a console of a container
#[derive(Parser, Debug)]
pub struct Console {
    /// Name of the container
    #[arg(value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub name: String,
}

impl Console {
    pub fn run<P: Provider, R: ActivityRecorder, W: Write>(
        &self,
        manager: &mut ContainerManager<P, R>,
        out: &mut W,
    ) -> Result<()> {
        writeln!(
            out,
            "Connecting to container {}, type <Ctrl+a q> to exit",
            self.name
        )?;
        out.flush()?;
        manager
            .start_console(&self.name)
            .with_context(|| format!("Console failed for container {}", self.name))?;
        writeln!(out, "Console of container {} closed", self.name)?;
        Ok(())
    }
}
