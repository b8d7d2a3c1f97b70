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
    io::Write,
    path::{Component, Path, PathBuf},
    process::Command,
};

use anyhow::{bail, Context, Result};
use clap::{builder::NonEmptyStringValueParser, Parser};
use log::{error, info};

use crate::{
    container::Provider,
    lxc::LxcContainer,
    manager::ContainerManager,
    utils::{ActivityRecorder, LxcmgrErr, Severity},
};

/// Copy a host file into the root filesystem of a container
#[derive(Parser, Debug)]
pub struct CopyFile {
    /// Name of the container
    #[arg(value_parser = NonEmptyStringValueParser::new(), required = true)]
    pub name: String,
    /// File on the host
    pub src: PathBuf,
    /// Destination path inside the container
    pub dest: PathBuf,
}

impl CopyFile {
    /// Host path `dest` resolves to under the rootfs of the container.
    fn target(&self, lxcpath: &Path) -> Result<PathBuf> {
        if self.name.is_empty() || self.name.contains('/') {
            bail!("Invalid container name \"{}\"", self.name);
        }
        let rootfs = LxcContainer::rootfs(lxcpath, &self.name);
        if !rootfs.is_dir() {
            bail!(
                "Root filesystem of container {} not found at {}",
                self.name,
                rootfs.display()
            );
        }
        if self.dest.components().any(|c| c == Component::ParentDir) {
            bail!("Destination {} leaves the container", self.dest.display());
        }
        let relative = self.dest.strip_prefix("/").unwrap_or(self.dest.as_path());
        Ok(rootfs.join(relative))
    }

    pub fn run<P: Provider, R: ActivityRecorder, W: Write>(
        &self,
        manager: &mut ContainerManager<P, R>,
        lxcpath: &Path,
        out: &mut W,
    ) -> Result<()> {
        if !self.src.is_file() {
            bail!("{} is not a file", self.src.display());
        }
        let target = self.target(lxcpath)?;

        let mut cmd = Command::new("cp");
        cmd.arg("--").arg(&self.src).arg(&target);
        info!("Run {:?}", cmd);
        let status = cmd
            .status()
            .with_context(|| LxcmgrErr::RunTool(String::from("cp")))?;
        if !status.success() {
            error!("cp exited with {}", status);
            bail!(
                "Failed to copy {} to {}: cp exited with {}",
                self.src.display(),
                target.display(),
                status
            );
        }

        let message = format!(
            "Copied {} to {} in container {}",
            self.src.display(),
            self.dest.display(),
            self.name
        );
        manager.record(Severity::Info, &message);
        writeln!(out, "{}", message)?;
        Ok(())
    }
}
