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
    container::{Provider, ResourceCategory},
    manager::ContainerManager,
    utils::ActivityRecorder,
};

fn parse_category(s: &str) -> Result<ResourceCategory> {
    Ok(s.parse::<ResourceCategory>()?)
}

/// Set a resource limit of a container
#[derive(Parser, Debug)]
pub struct SetLimit {
    /// Name of the container
    #[arg(value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub name: String,
    /// Resource category: cpu, memory, blkio or net_cls
    #[arg(value_parser = parse_category)]
    pub category: ResourceCategory,
    /// Value written to the control file of the category
    #[arg(allow_hyphen_values = true)]
    pub value: String,
}

impl SetLimit {
    pub fn run<P: Provider, R: ActivityRecorder, W: Write>(
        &self,
        manager: &mut ContainerManager<P, R>,
        out: &mut W,
    ) -> Result<()> {
        manager
            .set_limit(&self.name, self.category, &self.value)
            .with_context(|| format!("Set limit failed for container {}", self.name))?;
        writeln!(
            out,
            "Set {} of container {} to {}",
            self.category,
            self.name,
            self.value.trim()
        )?;
        Ok(())
    }
}

/// Read a resource limit of a container
#[derive(Parser, Debug)]
pub struct GetLimit {
    /// Name of the container
    #[arg(value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub name: String,
    /// Resource category: cpu, memory, blkio or net_cls
    #[arg(value_parser = parse_category)]
    pub category: ResourceCategory,
}

impl GetLimit {
    pub fn run<P: Provider, R: ActivityRecorder, W: Write>(
        &self,
        manager: &mut ContainerManager<P, R>,
        out: &mut W,
    ) -> Result<()> {
        let reading = manager
            .get_limit(&self.name, self.category)
            .with_context(|| format!("Get limit failed for container {}", self.name))?;
        writeln!(
            out,
            "Container {} (PID {}) {}: {}",
            self.name, reading.pid, reading.category, reading.value
        )?;
        Ok(())
    }
}
