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

mod commands;
mod container;
mod lxc;
mod manager;
mod utils;

use std::{
    io::stdout,
    path::{Path, PathBuf},
    process::exit,
};

use anyhow::{Context, Result};
use clap::{crate_description, Args, Parser, Subcommand};
use log::{info, warn};
use nix::unistd::geteuid;

use crate::{
    commands::{Console, CopyFile, Create, Exec, GetLimit, List, Menu, Remove, SetLimit},
    container::Provider,
    lxc::{LxcTools, DEFAULT_LXCPATH},
    manager::ContainerManager,
    utils::{logger, ActivityRecorder, FileRecorder, MemoryRecorder},
};

// Options shared by every command and the menu.
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Directory holding the containers, defaults to the LXC configured path.
    #[arg(short = 'P', long)]
    lxcpath: Option<PathBuf>,
    /// Path of log file.
    #[arg(short, long)]
    log: Option<PathBuf>,
    /// Enable debug log level.
    #[arg(short, long)]
    debug: bool,
    /// Path of the activity log, defaults to $LXCMGR_ACTIVITY_LOG or
    /// /var/log/lxcmgr/activity.log.
    #[arg(short, long)]
    activity_log: Option<PathBuf>,
    /// Keep the activity log in memory only.
    #[arg(long, conflicts_with = "activity_log")]
    no_activity_log: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    Create(Create),
    Remove(Remove),
    List(List),
    Exec(Exec),
    Console(Console),
    SetLimit(SetLimit),
    GetLimit(GetLimit),
    #[command(name = "copy")]
    CopyFile(CopyFile),
    Menu(Menu),
}

#[derive(Parser, Debug)]
#[command(version, author, about = crate_description!())]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,
    /// Runs the interactive menu when omitted.
    #[command(subcommand)]
    cmd: Option<Command>,
}

fn cmd_run<P: Provider, R: ActivityRecorder>(
    command: Option<Command>,
    manager: &mut ContainerManager<P, R>,
    lxcpath: &Path,
) -> Result<()> {
    let mut out = stdout();
    match command {
        Some(Command::Create(create)) => {
            info!("Run command: {:?}", create);
            create.run(manager, &mut out)?
        }
        Some(Command::Remove(remove)) => {
            info!("Run command: {:?}", remove);
            remove.run(manager, &mut out)?
        }
        Some(Command::List(list)) => {
            info!("Run command: {:?}", list);
            list.run(manager, &mut out)?
        }
        Some(Command::Exec(exec)) => {
            info!("Run command: {:?}", exec);
            exec.run(manager, &mut out)?
        }
        Some(Command::Console(console)) => {
            info!("Run command: {:?}", console);
            console.run(manager, &mut out)?
        }
        Some(Command::SetLimit(set_limit)) => {
            info!("Run command: {:?}", set_limit);
            set_limit.run(manager, &mut out)?
        }
        Some(Command::GetLimit(get_limit)) => {
            info!("Run command: {:?}", get_limit);
            get_limit.run(manager, &mut out)?
        }
        Some(Command::CopyFile(copy)) => {
            info!("Run command: {:?}", copy);
            copy.run(manager, lxcpath, &mut out)?
        }
        Some(Command::Menu(menu)) => {
            info!("Run command: {:?}", menu);
            menu.run(manager, lxcpath)?
        }
        None => {
            info!("Run interactive menu");
            Menu::default().run(manager, lxcpath)?
        }
    }
    Ok(())
}

fn real_main() -> Result<()> {
    let cli = Cli::parse();

    logger::init(&cli.global.log, cli.global.debug).with_context(|| "Failed to init logger")?;

    if !geteuid().is_root() {
        warn!("Not running as root, unprivileged containers need a configured idmap");
    }

    let recorder: Box<dyn ActivityRecorder> = if cli.global.no_activity_log {
        Box::<MemoryRecorder>::default()
    } else {
        let path = cli
            .global
            .activity_log
            .unwrap_or_else(FileRecorder::default_path);
        info!("Recording activity to {}", path.display());
        Box::new(FileRecorder::new(&path))
    };

    let lxcpath = cli
        .global
        .lxcpath
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LXCPATH));
    let mut manager = ContainerManager::new(LxcTools::new(cli.global.lxcpath), recorder);
    cmd_run(cli.cmd, &mut manager, &lxcpath)
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("ERROR: {:?}", e);
        exit(1);
    }
    exit(0);
}
