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

// Every runtime primitive maps onto one invocation of the stock LXC tools:
//
//      is_defined          lxc-ls -1
//      is_running          lxc-info -s -H
//      init_pid            lxc-info -p -H
//      create              lxc-create -q -t <template> -- <template args>
//      start/stop/destroy  lxc-start / lxc-stop / lxc-destroy
//      attach_run_wait     lxc-attach -- <exe> <args>
//      console_attach      lxc-console [-t <tty>] -e <escape>
//      cgroup items        lxc-cgroup <key> [<value>]
//      list_active         lxc-ls --active -1
//      get_ip              lxc-attach -- ip -o <family> addr show dev <iface>
//
// lxc-attach exits 1 both when the attach fails and when the command does.
// The two are told apart by the "lxc-attach: " prefix lxc puts on its own
// diagnostics on stderr.

use std::{
    io::{stderr, Write},
    net::IpAddr,
    os::unix::process::ExitStatusExt,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Output, Stdio},
};

use libc::pid_t;
use log::{debug, warn};

use super::terminal::{connect_stdio, escape_notation};
use crate::{
    container::{AddressFamily, ConsoleStdio, Provider, RuntimeHandle, Template},
    utils::LxcmgrErr,
};

const STATE_RUNNING: &str = "RUNNING";
const ATTACH_ERROR_PREFIX: &str = "lxc-attach: ";

fn tool_command(tool: &str, lxcpath: &Option<PathBuf>) -> Command {
    let mut cmd = Command::new(tool);
    if let Some(path) = lxcpath {
        cmd.arg("-P").arg(path);
    }
    cmd
}

fn spawn_error(cmd: &Command, e: std::io::Error) -> String {
    format!("{}: {}", LxcmgrErr::RunTool(format!("{:?}", cmd)), e)
}

fn output_of(mut cmd: Command) -> Result<Output, String> {
    debug!("Run {:?}", cmd);
    cmd.stdin(Stdio::null());
    cmd.output().map_err(|e| spawn_error(&cmd, e))
}

/// Diagnostic for a tool that exited unsuccessfully: its stderr, or the exit
/// status when it printed nothing.
fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

/// First diagnostic lxc-attach printed about the attach itself.
fn attach_error(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .find(|line| line.starts_with(ATTACH_ERROR_PREFIX))
        .map(|line| line.trim().to_string())
}

fn parse_names(stdout: &str) -> Vec<String> {
    stdout.split_whitespace().map(String::from).collect()
}

/// Pick the `index`-th address out of `ip -o addr show` output.
fn parse_address(stdout: &str, family: AddressFamily, index: usize) -> Option<String> {
    let keyword = match family {
        AddressFamily::Inet => "inet",
    };
    stdout
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            tokens.find(|t| *t == keyword)?;
            let cidr = tokens.next()?;
            let addr = cidr.split('/').next()?;
            addr.parse::<IpAddr>().ok().map(|a| a.to_string())
        })
        .nth(index)
}

/// Provider backed by the LXC command line tools.
pub struct LxcTools {
    lxcpath: Option<PathBuf>,
}

impl LxcTools {
    pub fn new(lxcpath: Option<PathBuf>) -> Self {
        Self { lxcpath }
    }

    fn active_names(&self) -> Option<Vec<String>> {
        let mut cmd = tool_command("lxc-ls", &self.lxcpath);
        cmd.args(["--active", "-1"]);
        match output_of(cmd) {
            Ok(output) if output.status.success() => {
                Some(parse_names(&String::from_utf8_lossy(&output.stdout)))
            }
            Ok(output) => {
                warn!("lxc-ls failed: {}", failure_reason(&output));
                None
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    fn container(&self, name: &str) -> LxcContainer {
        LxcContainer {
            name: name.to_string(),
            lxcpath: self.lxcpath.clone(),
            last_error: None,
        }
    }
}

impl Provider for LxcTools {
    type Handle = LxcContainer;

    fn open(&self, name: &str) -> Option<LxcContainer> {
        if name.is_empty() || name.contains('/') {
            return None;
        }
        if let Some(path) = &self.lxcpath {
            if !path.is_dir() {
                warn!("lxcpath {} is not a directory", path.display());
                return None;
            }
        }
        Some(self.container(name))
    }

    fn list_active(&self) -> (i32, Vec<LxcContainer>) {
        match self.active_names() {
            Some(names) => {
                let handles: Vec<LxcContainer> =
                    names.iter().map(|n| self.container(n)).collect();
                (handles.len() as i32, handles)
            }
            None => (-1, Vec::new()),
        }
    }
}

pub struct LxcContainer {
    name: String,
    lxcpath: Option<PathBuf>,
    last_error: Option<String>,
}

impl LxcContainer {
    fn command(&self, tool: &str) -> Command {
        let mut cmd = tool_command(tool, &self.lxcpath);
        cmd.arg("-n").arg(&self.name);
        cmd
    }

    /// Run a tool to completion, keeping its diagnostic on failure.
    fn run(&mut self, cmd: Command) -> bool {
        match output_of(cmd) {
            Ok(output) if output.status.success() => {
                self.last_error = None;
                true
            }
            Ok(output) => {
                self.last_error = Some(failure_reason(&output));
                false
            }
            Err(e) => {
                self.last_error = Some(e);
                false
            }
        }
    }

    /// Stdout of a query tool, or None when it failed.
    fn query(&self, cmd: Command) -> Option<String> {
        match output_of(cmd) {
            Ok(output) if output.status.success() => {
                Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
            }
            Ok(output) => {
                debug!("Query on {} failed: {}", self.name, failure_reason(&output));
                None
            }
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }

    fn exit_code(&mut self, status: ExitStatus) -> i32 {
        match status.code() {
            Some(code) => code,
            None => {
                let signal = status.signal().unwrap_or(0);
                self.last_error = Some(format!("terminated by signal {}", signal));
                -1
            }
        }
    }

    fn status_of(&mut self, mut cmd: Command) -> i32 {
        debug!("Run {:?}", cmd);
        match cmd.status() {
            Ok(status) => self.exit_code(status),
            Err(e) => {
                self.last_error = Some(spawn_error(&cmd, e));
                -1
            }
        }
    }

    pub fn rootfs(lxcpath: &Path, name: &str) -> PathBuf {
        lxcpath.join(name).join("rootfs")
    }
}

impl RuntimeHandle for LxcContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_defined(&self) -> bool {
        let mut cmd = tool_command("lxc-ls", &self.lxcpath);
        cmd.arg("-1");
        self.query(cmd)
            .map_or(false, |out| parse_names(&out).iter().any(|n| n == &self.name))
    }

    fn is_running(&self) -> bool {
        let mut cmd = self.command("lxc-info");
        cmd.args(["-s", "-H"]);
        self.query(cmd).map_or(false, |state| state == STATE_RUNNING)
    }

    fn init_pid(&self) -> Option<pid_t> {
        let mut cmd = self.command("lxc-info");
        cmd.args(["-p", "-H"]);
        self.query(cmd)?.parse::<pid_t>().ok().filter(|pid| *pid > 0)
    }

    fn create(&mut self, template: &Template) -> bool {
        let mut cmd = self.command("lxc-create");
        cmd.arg("-q").arg("-t").arg(&template.name);
        if !template.args.is_empty() {
            cmd.arg("--").args(&template.args);
        }
        self.run(cmd)
    }

    fn start(&mut self) -> bool {
        let cmd = self.command("lxc-start");
        self.run(cmd)
    }

    fn stop(&mut self) -> bool {
        // liblxc reports success for a container which is already stopped,
        // lxc-stop does not.
        if !self.is_running() {
            self.last_error = None;
            return true;
        }
        let cmd = self.command("lxc-stop");
        self.run(cmd)
    }

    fn destroy(&mut self) -> bool {
        let cmd = self.command("lxc-destroy");
        self.run(cmd)
    }

    fn attach_run_wait(&mut self, exe: &str, argv: &[String]) -> i32 {
        let mut cmd = self.command("lxc-attach");
        cmd.arg("--").arg(exe).args(argv.iter().skip(1));
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped());
        debug!("Run {:?}", cmd);
        let output = match cmd.output() {
            Ok(output) => output,
            Err(e) => {
                self.last_error = Some(spawn_error(&cmd, e));
                return -1;
            }
        };

        // Stderr is held back until exit so attach diagnostics can be found.
        if let Err(e) = stderr().write_all(&output.stderr) {
            warn!("Failed to forward stderr of {}: {}", self.name, e);
        }
        match self.exit_code(output.status) {
            0 => 0,
            code if code > 0 => {
                match attach_error(&String::from_utf8_lossy(&output.stderr)) {
                    Some(reason) => {
                        self.last_error = Some(reason);
                        -1
                    }
                    None => code,
                }
            }
            code => code,
        }
    }

    fn console_attach(&mut self, tty: i32, stdio: &ConsoleStdio, escape: u8) -> i32 {
        let child_stdio = match connect_stdio(stdio) {
            Ok(s) => s,
            Err(e) => {
                self.last_error = Some(format!("{:?}", e));
                return -1;
            }
        };

        let mut cmd = self.command("lxc-console");
        if tty >= 0 {
            cmd.arg("-t").arg(tty.to_string());
        }
        if let Some(notation) = escape_notation(escape) {
            cmd.arg("-e").arg(notation);
        }
        cmd.stdin(child_stdio.stdin)
            .stdout(child_stdio.stdout)
            .stderr(child_stdio.stderr);
        match self.status_of(cmd) {
            0 => 0,
            code if code > 0 => {
                self.last_error = Some(format!("lxc-console exited with {}", code));
                -1
            }
            code => code,
        }
    }

    fn set_cgroup_item(&mut self, key: &str, value: &str) -> bool {
        let mut cmd = self.command("lxc-cgroup");
        cmd.arg(key).arg(value);
        self.run(cmd)
    }

    fn get_cgroup_item(&mut self, key: &str, buf: &mut [u8]) -> i32 {
        let mut cmd = self.command("lxc-cgroup");
        cmd.arg(key);
        let output = match output_of(cmd) {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                self.last_error = Some(failure_reason(&o));
                return -1;
            }
            Err(e) => {
                self.last_error = Some(e);
                return -1;
            }
        };

        let value = output.stdout;
        let len = value.len().min(buf.len());
        buf[..len].copy_from_slice(&value[..len]);
        i32::try_from(value.len()).unwrap_or(i32::MAX)
    }

    fn get_ip(&self, iface: &str, family: AddressFamily, index: usize) -> Option<String> {
        let family_flag = match family {
            AddressFamily::Inet => "-4",
        };
        let mut cmd = self.command("lxc-attach");
        cmd.args(["--", "ip", "-o", family_flag, "addr", "show", "dev", iface]);
        let out = self.query(cmd)?;
        parse_address(&out, family, index)
    }

    fn error_string(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, remove_dir_all};

    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_names("c1\nc2\n\n"), vec!["c1", "c2"]);
        assert!(parse_names("").is_empty());
    }

    #[test]
    fn test_parse_address() {
        let out = "2: eth0    inet 10.0.3.15/24 brd 10.0.3.255 scope global dynamic eth0\\       valid_lft 3550sec preferred_lft 3550sec\n\
                   2: eth0    inet 10.0.3.16/24 scope global secondary eth0\\       valid_lft forever preferred_lft forever";
        assert_eq!(
            parse_address(out, AddressFamily::Inet, 0).unwrap(),
            "10.0.3.15"
        );
        assert_eq!(
            parse_address(out, AddressFamily::Inet, 1).unwrap(),
            "10.0.3.16"
        );
        assert!(parse_address(out, AddressFamily::Inet, 2).is_none());
        assert!(parse_address("", AddressFamily::Inet, 0).is_none());

        let out6 = "2: eth0    inet6 fe80::216:3eff:fe2a:1b2c/64 scope link \\       valid_lft forever";
        assert!(parse_address(out6, AddressFamily::Inet, 0).is_none());
    }

    #[test]
    fn test_tool_command_lxcpath() {
        let cmd = tool_command("lxc-ls", &Some(PathBuf::from("/srv/lxc")));
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, vec!["-P", "/srv/lxc"]);

        let cmd = tool_command("lxc-ls", &None);
        assert_eq!(cmd.get_args().count(), 0);
    }

    #[test]
    fn test_open_validates_name_and_lxcpath() {
        let tools = LxcTools::new(None);
        assert!(tools.open("").is_none());
        assert!(tools.open("../etc").is_none());
        assert_eq!(tools.open("c1").unwrap().name(), "c1");

        let missing = LxcTools::new(Some(PathBuf::from("/tmp/lxcmgr_no_such_lxcpath")));
        assert!(missing.open("c1").is_none());

        let dir = PathBuf::from("/tmp/lxcmgr_lxcpath");
        create_dir_all(&dir).unwrap();
        let tools = LxcTools::new(Some(dir.clone()));
        assert!(tools.open("c1").is_some());
        remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_rootfs_path() {
        assert_eq!(
            LxcContainer::rootfs(Path::new("/var/lib/lxc"), "c1"),
            PathBuf::from("/var/lib/lxc/c1/rootfs")
        );
    }

    #[test]
    fn test_attach_error() {
        let out = "ls: cannot access '/nope': No such file or directory\n\
                   lxc-attach: c1: attach.c: lxc_attach: 1099 Failed to get init pid\n";
        assert_eq!(
            attach_error(out).unwrap(),
            "lxc-attach: c1: attach.c: lxc_attach: 1099 Failed to get init pid"
        );
        assert!(attach_error("ls: cannot access '/nope': No such file or directory").is_none());
        assert!(attach_error("").is_none());
    }

    #[test]
    fn test_exit_code_of_signalled_tool() {
        let mut container = LxcTools::new(None).container("c1");
        let status = Command::new("sh")
            .args(["-c", "kill -9 $$"])
            .status()
            .unwrap();
        assert_eq!(container.exit_code(status), -1);
        assert_eq!(container.error_string().unwrap(), "terminated by signal 9");

        let status = Command::new("sh").args(["-c", "exit 1"]).status().unwrap();
        assert_eq!(container.exit_code(status), 1);
    }

    #[test]
    fn test_failure_reason() {
        let output = Command::new("sh")
            .args(["-c", "echo boom >&2; exit 3"])
            .output()
            .unwrap();
        assert_eq!(failure_reason(&output), "boom");

        let output = Command::new("sh").args(["-c", "exit 3"]).output().unwrap();
        assert_eq!(failure_reason(&output), "exited with exit status: 3");
    }
}
