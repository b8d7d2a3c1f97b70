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
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use super::{
    report_failure, Console, CopyFile, Create, Exec, GetLimit, List, Remove, SetLimit,
};
use crate::{
    container::{ManagerError, Provider, ResourceCategory},
    manager::ContainerManager,
    utils::{ActivityRecorder, LxcmgrErr},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Create,
    Remove,
    List,
    Exec,
    SetLimit,
    GetLimit,
    Console,
    CopyFile,
    Exit,
}

impl Choice {
    const ALL: [Choice; 9] = [
        Choice::Create,
        Choice::Remove,
        Choice::List,
        Choice::Exec,
        Choice::SetLimit,
        Choice::GetLimit,
        Choice::Console,
        Choice::CopyFile,
        Choice::Exit,
    ];

    fn label(&self) -> &'static str {
        match self {
            Choice::Create => "Create a container",
            Choice::Remove => "Remove a container",
            Choice::List => "List active containers",
            Choice::Exec => "Execute a command in a container",
            Choice::SetLimit => "Set a resource limit",
            Choice::GetLimit => "Get a resource limit",
            Choice::Console => "Attach to a container console",
            Choice::CopyFile => "Copy a file into a container",
            Choice::Exit => "Exit",
        }
    }

    /// Parse a 1-based menu number.
    fn parse(input: &str) -> Option<Choice> {
        let number = input.trim().parse::<usize>().ok()?;
        Self::ALL.get(number.checked_sub(1)?).copied()
    }
}

/// Run the interactive menu
#[derive(Parser, Debug, Default)]
pub struct Menu {}

impl Menu {
    pub fn run<P: Provider, R: ActivityRecorder>(
        &self,
        manager: &mut ContainerManager<P, R>,
        lxcpath: &Path,
    ) -> Result<()> {
        let stdin = io::stdin();
        let mut session = Session {
            input: stdin.lock(),
            out: io::stdout(),
        };
        session.run(manager, lxcpath)
    }
}

struct Session<I: BufRead, W: Write> {
    input: I,
    out: W,
}

impl<I: BufRead, W: Write> Session<I, W> {
    /// Prompt for one line. None once the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;

        let mut line = String::new();
        let len = self
            .input
            .read_line(&mut line)
            .with_context(|| LxcmgrErr::ReadInput)?;
        if len == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    fn show_menu(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "LXC container manager")?;
        for (i, choice) in Choice::ALL.iter().enumerate() {
            writeln!(self.out, "  {}. {}", i + 1, choice.label())?;
        }
        Ok(())
    }

    fn read_category(&mut self) -> Result<Option<ResourceCategory>> {
        for (i, category) in ResourceCategory::ALL.iter().enumerate() {
            writeln!(self.out, "  {}. {}", i + 1, category)?;
        }
        let Some(input) = self.read_line("Resource category: ")? else {
            return Ok(None);
        };
        let category = match input.trim().parse::<usize>() {
            Ok(number) => number
                .checked_sub(1)
                .and_then(|index| ResourceCategory::from_index(index).ok())
                .ok_or_else(|| ManagerError::InvalidCategory(input.trim().to_string()))?,
            Err(_) => input.parse::<ResourceCategory>()?,
        };
        Ok(Some(category))
    }

    pub fn run<P: Provider, R: ActivityRecorder>(
        &mut self,
        manager: &mut ContainerManager<P, R>,
        lxcpath: &Path,
    ) -> Result<()> {
        loop {
            self.show_menu()?;
            let Some(input) = self.read_line("Enter your choice: ")? else {
                writeln!(self.out)?;
                return Ok(());
            };
            let Some(choice) = Choice::parse(&input) else {
                writeln!(
                    self.out,
                    "Invalid choice \"{}\", enter a number from 1 to {}",
                    input.trim(),
                    Choice::ALL.len()
                )?;
                continue;
            };
            debug!("Menu choice {:?}", choice);
            if choice == Choice::Exit {
                info!("Leaving menu");
                return Ok(());
            }

            match self.dispatch(choice, manager, lxcpath) {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(e) => report_failure(&mut self.out, &e)?,
            }
        }
    }

    /// Gather the arguments of `choice` and run it. Returns false when the
    /// input ended before all arguments were read.
    fn dispatch<P: Provider, R: ActivityRecorder>(
        &mut self,
        choice: Choice,
        manager: &mut ContainerManager<P, R>,
        lxcpath: &Path,
    ) -> Result<bool> {
        if choice == Choice::List {
            List::default().run(manager, &mut self.out)?;
            return Ok(true);
        }

        let Some(name) = self.read_line("Container name: ")? else {
            return Ok(false);
        };
        let name = name.trim().to_string();
        match choice {
            Choice::Create => Create::new(&name).run(manager, &mut self.out)?,
            Choice::Remove => Remove { name }.run(manager, &mut self.out)?,
            Choice::Exec => {
                let Some(command) = self.read_line("Command: ")? else {
                    return Ok(false);
                };
                Exec {
                    name,
                    command: vec![command],
                }
                .run(manager, &mut self.out)?
            }
            Choice::SetLimit => {
                let Some(category) = self.read_category()? else {
                    return Ok(false);
                };
                let Some(value) = self.read_line("Value: ")? else {
                    return Ok(false);
                };
                SetLimit {
                    name,
                    category,
                    value,
                }
                .run(manager, &mut self.out)?
            }
            Choice::GetLimit => {
                let Some(category) = self.read_category()? else {
                    return Ok(false);
                };
                GetLimit { name, category }.run(manager, &mut self.out)?
            }
            Choice::Console => Console { name }.run(manager, &mut self.out)?,
            Choice::CopyFile => {
                let Some(src) = self.read_line("Source file: ")? else {
                    return Ok(false);
                };
                let Some(dest) = self.read_line("Destination in container: ")? else {
                    return Ok(false);
                };
                CopyFile {
                    name,
                    src: PathBuf::from(src.trim()),
                    dest: PathBuf::from(dest.trim()),
                }
                .run(manager, lxcpath, &mut self.out)?
            }
            Choice::List | Choice::Exit => {}
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        container::{tests::FakeProvider, ContainerState},
        utils::{MemoryRecorder, Severity},
    };

    fn session(
        provider: &FakeProvider,
        input: &str,
    ) -> (String, ContainerManager<FakeProvider, MemoryRecorder>) {
        let mut manager = ContainerManager::new(provider.clone(), MemoryRecorder::default());
        let mut session = Session {
            input: input.as_bytes(),
            out: Vec::new(),
        };
        session
            .run(&mut manager, Path::new("/tmp/lxcmgr_test_menu"))
            .unwrap();
        (String::from_utf8(session.out).unwrap(), manager)
    }

    #[test]
    fn test_choice_parse() {
        assert_eq!(Choice::parse("1"), Some(Choice::Create));
        assert_eq!(Choice::parse(" 9 "), Some(Choice::Exit));
        assert_eq!(Choice::parse("0"), None);
        assert_eq!(Choice::parse("10"), None);
        assert_eq!(Choice::parse("list"), None);
    }

    #[test]
    fn test_menu_exit_and_eof() {
        let provider = FakeProvider::new();
        let (out, _) = session(&provider, "9\n");
        assert_eq!(out.matches("Enter your choice: ").count(), 1);
        assert!(out.contains("  8. Copy a file into a container"));

        let (out, _) = session(&provider, "");
        assert_eq!(out.matches("Enter your choice: ").count(), 1);
        assert_eq!(provider.total_calls(), 0);
    }

    #[test]
    fn test_menu_redisplays_after_invalid_choice() {
        let provider = FakeProvider::new();
        let (out, _) = session(&provider, "abc\n42\n9\n");
        assert!(out.contains("Invalid choice \"abc\", enter a number from 1 to 9"));
        assert!(out.contains("Invalid choice \"42\", enter a number from 1 to 9"));
        assert_eq!(out.matches("LXC container manager").count(), 3);
    }

    #[test]
    fn test_menu_create_exec_and_list() {
        let provider = FakeProvider::new();
        let (out, manager) = session(&provider, "1\nc1\n4\nc1\necho hi  there\n3\n9\n");

        assert!(out.contains("Container c1 created"));
        assert!(out.contains("Command exited with status 0"));
        assert!(out.lines().any(|l| l.starts_with("c1 ")));
        assert_eq!(provider.state("c1"), ContainerState::Running);
        assert_eq!(
            manager.recorder().messages(Severity::Info),
            vec![
                "Container c1 created",
                "Container c1 started",
                "Executed \"echo hi  there\" in container c1, exit status 0",
                "Listed 1 active containers",
            ]
        );
    }

    #[test]
    fn test_menu_limits() {
        let provider = FakeProvider::new();
        provider.add("c1", true, None);
        let (out, _) = session(&provider, "5\nc1\n2\n512M\n6\nc1\nmemory\n9\n");

        assert!(out.contains("Set memory limit (memory.limit_in_bytes) of container c1 to 512M"));
        assert!(out.contains("memory limit (memory.limit_in_bytes): 512M"));
    }

    #[test]
    fn test_menu_reports_failures_and_continues() {
        let provider = FakeProvider::new();
        provider.add("c1", false, None);
        provider.fail("start", Some("no rootfs"));
        let (out, manager) = session(&provider, "2\nghost\n5\nc1\n7\n6\nc1\n1\n9\n");

        assert!(out.contains(
            "Error: Remove failed for container ghost: Container ghost does not exist"
        ));
        assert!(out.contains("Error: Invalid resource category 7"));
        assert!(out.contains(
            "Error: Get limit failed for container c1: Failed to start container c1: no rootfs"
        ));
        assert!(out.contains("Container is left STOPPED"));
        assert_eq!(out.matches("Enter your choice: ").count(), 4);
        assert!(manager.recorder().entries.is_empty());
        assert!(provider.balanced());
    }
}
