//! Scripted stand-in for a Debian host
//!
//! Simulates just enough of apt, dpkg, useradd, systemctl and createdb for
//! resources and the engine to run end to end. Every command line is
//! logged; individual command lines can be scripted to return a fixed
//! output instead.

use declarative::{CommandOutput, CommandRunner};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Default)]
struct HostState {
    packages: BTreeSet<String>,
    users: BTreeSet<String>,
    databases: BTreeSet<String>,
    enabled: BTreeSet<String>,
    active: BTreeSet<String>,
}

#[derive(Default)]
pub struct FakeHost {
    state: RefCell<HostState>,
    scripted: RefCell<HashMap<String, CommandOutput>>,
    log: RefCell<Vec<String>>,
    sources_dir: Option<PathBuf>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `add-apt-repository` write a sources file into `dir`
    pub fn with_sources_dir(mut self, dir: &Path) -> Self {
        self.sources_dir = Some(dir.to_path_buf());
        self
    }

    /// Return `output` whenever exactly `command` is run
    pub fn script(&self, command: &str, output: CommandOutput) {
        self.scripted
            .borrow_mut()
            .insert(command.to_string(), output);
    }

    /// Every command line run so far
    pub fn commands(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    /// Number of command lines starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Position of the first command line starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.log.borrow().iter().position(|c| c.starts_with(prefix))
    }

    pub fn install(&self, package: &str) {
        self.state.borrow_mut().packages.insert(package.to_string());
    }

    pub fn is_installed(&self, package: &str) -> bool {
        self.state.borrow().packages.contains(package)
    }

    pub fn add_user(&self, name: &str) {
        self.state.borrow_mut().users.insert(name.to_string());
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.state.borrow().users.contains(name)
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.state.borrow().databases.contains(name)
    }

    pub fn start_service(&self, unit: &str) {
        let mut state = self.state.borrow_mut();
        state.enabled.insert(unit.to_string());
        state.active.insert(unit.to_string());
    }

    fn simulate(&self, cmd: &str, args: &[&str]) -> CommandOutput {
        let last = args.last().copied().unwrap_or_default();
        let mut state = self.state.borrow_mut();
        match (cmd, args) {
            ("id", ["-u", name]) => {
                if state.users.contains(*name) {
                    CommandOutput::ok("1001\n")
                } else {
                    CommandOutput::failed(1, format!("id: '{name}': no such user\n"))
                }
            }
            ("useradd", _) => {
                if state.users.insert(last.to_string()) {
                    CommandOutput::ok("")
                } else {
                    CommandOutput::failed(9, format!("useradd: user '{last}' already exists\n"))
                }
            }
            ("dpkg-query", _) => {
                if state.packages.contains(last) {
                    CommandOutput::ok("install ok installed")
                } else {
                    CommandOutput::failed(
                        1,
                        format!("dpkg-query: no packages found matching {last}\n"),
                    )
                }
            }
            ("apt-get", ["update", ..]) => CommandOutput::ok("Reading package lists... Done\n"),
            ("apt-get", ["install", ..]) => {
                if state.packages.insert(last.to_string()) {
                    CommandOutput::ok(format!("Setting up {last} ...\n"))
                } else {
                    CommandOutput::ok(format!("{last} is already the newest version.\n"))
                }
            }
            ("add-apt-repository", _) => {
                let Some(dir) = &self.sources_dir else {
                    return CommandOutput::ok("");
                };
                let Some((owner, archive)) = last
                    .strip_prefix("ppa:")
                    .and_then(|rest| rest.split_once('/'))
                else {
                    return CommandOutput::failed(1, format!("ERROR: invalid PPA {last}\n"));
                };
                let body = format!(
                    "Types: deb\nURIs: https://ppa.launchpadcontent.net/{owner}/{archive}/ubuntu/\nSuites: jammy\nComponents: main\n"
                );
                let file = dir.join(format!("{owner}-ubuntu-{archive}-jammy.sources"));
                match fs::create_dir_all(dir).and_then(|()| fs::write(&file, body)) {
                    Ok(()) => CommandOutput::ok(""),
                    Err(e) => CommandOutput::failed(1, e.to_string()),
                }
            }
            ("systemctl", ["is-enabled", .., unit]) => status(state.enabled.contains(*unit)),
            ("systemctl", ["is-active", .., unit]) => status(state.active.contains(*unit)),
            ("systemctl", ["enable", "--now", unit]) => {
                state.enabled.insert((*unit).to_string());
                state.active.insert((*unit).to_string());
                CommandOutput::ok("")
            }
            ("systemctl", ["daemon-reload" | "restart", ..]) => CommandOutput::ok(""),
            ("sudo", ["-u", _, "createdb", ..]) => {
                if state.databases.insert(last.to_string()) {
                    CommandOutput::ok("")
                } else {
                    CommandOutput::failed(
                        1,
                        format!(
                            "createdb: error: database creation failed: ERROR:  database \"{last}\" already exists\n"
                        ),
                    )
                }
            }
            _ => CommandOutput::failed(127, format!("fake host: unknown command {cmd}\n")),
        }
    }
}

fn status(ok: bool) -> CommandOutput {
    if ok {
        CommandOutput::ok("")
    } else {
        CommandOutput::failed(1, "")
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, cmd: &str, args: &[&str]) -> anyhow::Result<CommandOutput> {
        let line = std::iter::once(cmd)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.log.borrow_mut().push(line.clone());

        if let Some(output) = self.scripted.borrow().get(&line) {
            return Ok(output.clone());
        }
        Ok(self.simulate(cmd, args))
    }
}
