// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HMC CLI command builder.
//!
//! Commands and their options are symbolic ([`Command`], [`Opt`]). The
//! literal program names and flags live in one constant table, so a
//! command line can only be assembled from options the table lists for
//! that command. Everything the builder rejects is reported before any
//! remote call is made.
//!
//! Argument shapes:
//! - `--filter "k=v,k=v"` where a value containing a comma is quoted on
//!   its own: `--filter "k=v,\"k=a,b\""`;
//! - `-i "k=v,k+=v,k-=v"` where a caller value with a leading `+` or `-`
//!   selects increment or decrement;
//! - `-F a,b,c` which also fixes the attribute list used to decode the
//!   output positionally.

use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// HMC CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Lssyscfg,
    Mksyscfg,
    Chsyscfg,
    Rmsyscfg,
    Chsysstate,
    Lshmc,
    Hmcshutdown,
    Updhmc,
    Getupgfiles,
    Saveupgdata,
    Chhmc,
    Lshmcusr,
    Mkhmcusr,
    Chhmcusr,
    Rmhmcusr,
    Lspwdpolicy,
    Mkpwdpolicy,
    Chpwdpolicy,
    Rmpwdpolicy,
    Lshmcencr,
}

/// Symbolic command options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opt {
    Resource,
    System,
    Name,
    Operation,
    Profile,
    Fields,
    Filter,
    Attributes,
    Type,
    Restart,
    Host,
    User,
    Password,
    File,
    Directory,
    MountLocation,
    Change,
    State,
    Mode,
    Immediate,
    Component,
    Version,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Switch,
    Value,
}

#[derive(Debug)]
struct OptionSpec {
    opt: Opt,
    flag: &'static str,
    arity: Arity,
}

const fn value(opt: Opt, flag: &'static str) -> OptionSpec {
    OptionSpec {
        opt,
        flag,
        arity: Arity::Value,
    }
}

const fn switch(opt: Opt, flag: &'static str) -> OptionSpec {
    OptionSpec {
        opt,
        flag,
        arity: Arity::Switch,
    }
}

#[derive(Debug)]
struct CommandSpec {
    command: Command,
    program: &'static str,
    options: &'static [OptionSpec],
}

const COMMAND_TABLE: &[CommandSpec] = &[
    CommandSpec {
        command: Command::Lssyscfg,
        program: "lssyscfg",
        options: &[
            value(Opt::Resource, "-r"),
            value(Opt::System, "-m"),
            value(Opt::Fields, "-F"),
            value(Opt::Filter, "--filter"),
        ],
    },
    CommandSpec {
        command: Command::Mksyscfg,
        program: "mksyscfg",
        options: &[
            value(Opt::Resource, "-r"),
            value(Opt::System, "-m"),
            value(Opt::Attributes, "-i"),
        ],
    },
    CommandSpec {
        command: Command::Chsyscfg,
        program: "chsyscfg",
        options: &[
            value(Opt::Resource, "-r"),
            value(Opt::System, "-m"),
            value(Opt::Attributes, "-i"),
        ],
    },
    CommandSpec {
        command: Command::Rmsyscfg,
        program: "rmsyscfg",
        options: &[
            value(Opt::Resource, "-r"),
            value(Opt::System, "-m"),
            value(Opt::Name, "-n"),
        ],
    },
    CommandSpec {
        command: Command::Chsysstate,
        program: "chsysstate",
        options: &[
            value(Opt::Resource, "-r"),
            value(Opt::System, "-m"),
            value(Opt::Name, "-n"),
            value(Opt::Operation, "-o"),
            value(Opt::Profile, "-f"),
            switch(Opt::Immediate, "--immed"),
        ],
    },
    CommandSpec {
        command: Command::Lshmc,
        program: "lshmc",
        options: &[
            switch(Opt::Version, "-V"),
            switch(Opt::Network, "-n"),
            value(Opt::Fields, "-F"),
        ],
    },
    CommandSpec {
        command: Command::Hmcshutdown,
        program: "hmcshutdown",
        options: &[value(Opt::Type, "-t"), switch(Opt::Restart, "-r")],
    },
    CommandSpec {
        command: Command::Updhmc,
        program: "updhmc",
        options: &[
            value(Opt::Type, "-t"),
            value(Opt::Host, "-h"),
            value(Opt::User, "-u"),
            value(Opt::Password, "--passwd"),
            value(Opt::File, "-f"),
            value(Opt::MountLocation, "-l"),
            switch(Opt::Restart, "-r"),
        ],
    },
    CommandSpec {
        command: Command::Getupgfiles,
        program: "getupgfiles",
        options: &[
            value(Opt::Resource, "-r"),
            value(Opt::Host, "-h"),
            value(Opt::User, "-u"),
            value(Opt::Password, "--passwd"),
            value(Opt::Directory, "-d"),
            value(Opt::MountLocation, "-l"),
        ],
    },
    CommandSpec {
        command: Command::Saveupgdata,
        program: "saveupgdata",
        options: &[value(Opt::Resource, "-r")],
    },
    CommandSpec {
        command: Command::Chhmc,
        program: "chhmc",
        options: &[
            value(Opt::Change, "-c"),
            value(Opt::State, "-s"),
            value(Opt::Mode, "--mode"),
        ],
    },
    CommandSpec {
        command: Command::Lshmcusr,
        program: "lshmcusr",
        options: &[value(Opt::Fields, "-F"), value(Opt::Filter, "--filter")],
    },
    CommandSpec {
        command: Command::Mkhmcusr,
        program: "mkhmcusr",
        options: &[value(Opt::Attributes, "-i")],
    },
    CommandSpec {
        command: Command::Chhmcusr,
        program: "chhmcusr",
        options: &[value(Opt::Attributes, "-i")],
    },
    CommandSpec {
        command: Command::Rmhmcusr,
        program: "rmhmcusr",
        options: &[value(Opt::User, "-u")],
    },
    CommandSpec {
        command: Command::Lspwdpolicy,
        program: "lspwdpolicy",
        options: &[
            value(Opt::Type, "-t"),
            value(Opt::Fields, "-F"),
            value(Opt::Filter, "--filter"),
        ],
    },
    CommandSpec {
        command: Command::Mkpwdpolicy,
        program: "mkpwdpolicy",
        options: &[value(Opt::Attributes, "-i")],
    },
    CommandSpec {
        command: Command::Chpwdpolicy,
        program: "chpwdpolicy",
        options: &[
            value(Opt::Operation, "-o"),
            value(Opt::Name, "-n"),
            value(Opt::Attributes, "-i"),
        ],
    },
    CommandSpec {
        command: Command::Rmpwdpolicy,
        program: "rmpwdpolicy",
        options: &[value(Opt::Name, "-n")],
    },
    CommandSpec {
        command: Command::Lshmcencr,
        program: "lshmcencr",
        options: &[value(Opt::Component, "-c"), value(Opt::Type, "-t")],
    },
];

impl Command {
    fn spec(self) -> &'static CommandSpec {
        COMMAND_TABLE
            .iter()
            .find(|spec| spec.command == self)
            .unwrap_or_else(|| unreachable!("every command has a table entry"))
    }

    /// Program name on the HMC.
    #[must_use]
    pub fn program(self) -> &'static str {
        self.spec().program
    }
}

/// Command line assembly errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// Option is not accepted by the command.
    UnsupportedOption { program: &'static str, option: Opt },
    /// Option takes a value but was used as a switch, or the other way round.
    WrongArity { program: &'static str, option: Opt },
    /// `-i` or `--filter` without any pairs.
    EmptyPairs { program: &'static str, option: Opt },
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::UnsupportedOption { program, option } => {
                write!(f, "{program}: option {option:?} is not supported")
            }
            Self::WrongArity { program, option } => {
                write!(f, "{program}: option {option:?} used with wrong arity")
            }
            Self::EmptyPairs { program, option } => {
                write!(f, "{program}: option {option:?} needs at least one key=value pair")
            }
        }
    }
}

impl StdError for BuildError {}

/// Assembled command line.
///
/// `Display` renders the command with password values masked; use
/// [`CommandLine::as_str`] for the text sent to the HMC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    text: String,
    redacted: String,
    fields: Option<Vec<String>>,
}

impl CommandLine {
    /// Command text to execute.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Attribute names requested with `-F`, if any.
    #[must_use]
    pub fn fields(&self) -> Option<Vec<&str>> {
        self.fields
            .as_ref()
            .map(|fields| fields.iter().map(String::as_str).collect())
    }
}

impl Display for CommandLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.redacted.fmt(f)
    }
}

/// Builder of a [`CommandLine`].
///
/// ```
/// use hmc_core::command::{Command, CommandBuilder, Opt};
///
/// # fn main() -> Result<(), hmc_core::command::BuildError> {
/// let cmd = CommandBuilder::new(Command::Lssyscfg)
///     .opt(Opt::Resource, "lpar")?
///     .opt(Opt::System, "Server-8286-42A-SN1234")?
///     .filter(&[("lpar_names", "lpar1")])?
///     .fields(&["name", "state"])?
///     .build();
/// assert_eq!(
///     cmd.as_str(),
///     "lssyscfg -r lpar -m Server-8286-42A-SN1234 --filter \"lpar_names=lpar1\" -F name,state"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CommandBuilder {
    spec: &'static CommandSpec,
    text: Vec<String>,
    redacted: Vec<String>,
    fields: Option<Vec<String>>,
}

impl CommandBuilder {
    #[must_use]
    pub fn new(command: Command) -> Self {
        let spec = command.spec();
        Self {
            spec,
            text: vec![spec.program.to_string()],
            redacted: vec![spec.program.to_string()],
            fields: None,
        }
    }

    /// Option with a value. The value is quoted for the remote shell when
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the option is not a value option of the command.
    pub fn opt(self, opt: Opt, value: impl AsRef<str>) -> Result<Self, BuildError> {
        let quoted = shell_quote(value.as_ref());
        let shown = if opt == Opt::Password {
            String::from("********")
        } else {
            quoted.clone()
        };
        self.push(opt, Arity::Value, Some((quoted, shown)))
    }

    /// Option without a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the option is not a switch of the command.
    pub fn flag(self, opt: Opt) -> Result<Self, BuildError> {
        self.push(opt, Arity::Switch, None)
    }

    /// `--filter` from key/value pairs. No pairs, no filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the command does not accept filters.
    pub fn filter(self, pairs: &[(&str, &str)]) -> Result<Self, BuildError> {
        if pairs.is_empty() {
            return Ok(self);
        }
        let joined = pairs
            .iter()
            .map(|(k, v)| quote_pair(&format!("{k}={v}"), v))
            .collect::<Vec<_>>()
            .join(",");
        let arg = format!("\"{joined}\"");
        self.push(Opt::Filter, Arity::Value, Some((arg.clone(), arg)))
    }

    /// `-i` attribute assignments. A value starting with `+` or `-` is
    /// emitted as `k+=v` or `k-=v`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command does not accept `-i` or `pairs` is
    /// empty.
    pub fn attributes<K, V>(self, pairs: &[(K, V)]) -> Result<Self, BuildError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if pairs.is_empty() {
            return Err(BuildError::EmptyPairs {
                program: self.spec.program,
                option: Opt::Attributes,
            });
        }
        let render = |mask: bool| {
            pairs
                .iter()
                .map(|(k, v)| {
                    let (k, v) = (k.as_ref(), v.as_ref());
                    if mask && k.contains("passwd") {
                        format!("{k}=********")
                    } else {
                        attribute_assignment(k, v)
                    }
                })
                .collect::<Vec<_>>()
                .join(",")
        };
        let text = format!("\"{}\"", render(false));
        let shown = format!("\"{}\"", render(true));
        self.push(Opt::Attributes, Arity::Value, Some((text, shown)))
    }

    /// `-F` field selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the command does not accept `-F`.
    pub fn fields(self, names: &[&str]) -> Result<Self, BuildError> {
        let joined = names.join(",");
        let mut this = self.push(Opt::Fields, Arity::Value, Some((joined.clone(), joined)))?;
        this.fields = Some(names.iter().map(ToString::to_string).collect());
        Ok(this)
    }

    #[must_use]
    pub fn build(self) -> CommandLine {
        CommandLine {
            text: self.text.join(" "),
            redacted: self.redacted.join(" "),
            fields: self.fields,
        }
    }

    fn push(
        mut self,
        opt: Opt,
        arity: Arity,
        value: Option<(String, String)>,
    ) -> Result<Self, BuildError> {
        let program = self.spec.program;
        let option = self
            .spec
            .options
            .iter()
            .find(|o| o.opt == opt)
            .ok_or(BuildError::UnsupportedOption {
                program,
                option: opt,
            })?;
        if option.arity != arity {
            return Err(BuildError::WrongArity {
                program,
                option: opt,
            });
        }
        self.text.push(option.flag.to_string());
        self.redacted.push(option.flag.to_string());
        if let Some((text, shown)) = value {
            self.text.push(text);
            self.redacted.push(shown);
        }
        Ok(self)
    }
}

/// Render one `-i` assignment: `+v` becomes `k+=v`, `-v` becomes `k-=v`,
/// anything else `k=v`. Assignments whose value contains a comma are
/// quoted. The result is meant for the inside of a double-quoted shell
/// argument, so `"`, `\`, `$` and backtick are escaped.
#[must_use]
pub fn attribute_assignment(key: &str, value: &str) -> String {
    let (operator, value) = if let Some(rest) = value.strip_prefix('+') {
        ("+=", rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        ("-=", rest)
    } else {
        ("=", value)
    };
    quote_pair(&format!("{key}{operator}{value}"), value)
}

fn quote_pair(pair: &str, value: &str) -> String {
    let pair = escape_double_quoted(pair);
    if value.contains(',') {
        format!("\\\"{pair}\\\"")
    } else {
        pair
    }
}

/// Escape the characters the shell still interprets between double quotes.
fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@+%,".contains(c));
    if plain {
        return value.to_string();
    }
    format!("\"{}\"", escape_double_quoted(value))
}
