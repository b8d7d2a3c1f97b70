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

use crate::{
    container::{Provider, Template},
    manager::ContainerManager,
    utils::ActivityRecorder,
};

const DOWNLOAD_TEMPLATE: &str = "download";

/// Create a container and start it
#[derive(Parser, Debug)]
pub struct Create {
    /// Template used to build the root filesystem
    #[arg(short, long, default_value = DOWNLOAD_TEMPLATE)]
    pub template: String,
    /// Distribution fetched by the download template
    #[arg(long, default_value = "ubuntu")]
    pub dist: String,
    /// Release fetched by the download template
    #[arg(long, default_value = "focal")]
    pub release: String,
    /// Architecture fetched by the download template
    #[arg(long, default_value = "amd64")]
    pub arch: String,
    /// Name of the container to create
    #[arg(value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub name: String,
}

impl Create {
    pub fn new(name: &str) -> Self {
        let template = Template::default();
        Self {
            template: template.name,
            dist: String::from("ubuntu"),
            release: String::from("focal"),
            arch: String::from("amd64"),
            name: name.to_string(),
        }
    }

    fn template(&self) -> Template {
        if self.template == DOWNLOAD_TEMPLATE {
            return Template::download(&self.dist, &self.release, &self.arch);
        }
        Template {
            name: self.template.clone(),
            args: Vec::new(),
        }
    }

    pub fn run<P: Provider, R: ActivityRecorder, W: Write>(
        &self,
        manager: &mut ContainerManager<P, R>,
        out: &mut W,
    ) -> Result<()> {
        let created = manager
            .create_container(&self.name, &self.template())
            .with_context(|| format!("Create failed for container {}", self.name))?;
        writeln!(out, "Container {} created", self.name)?;
        match created.pid {
            Some(pid) => writeln!(out, "State: {}, PID: {}", created.state, pid)?,
            None => writeln!(out, "State: {}", created.state)?,
        }
        Ok(())
    }
}
