#![allow(dead_code)]

use std::collections::BTreeMap;

use publink::config::{
    CommandSection, ConfigFile, MonitorSection, PatternSection, RawConfigFile,
};
use publink::types::ExitPolicy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                command: CommandSection {
                    shell: None,
                    argv: None,
                    cwd: None,
                    env: BTreeMap::new(),
                },
                pattern: PatternSection::default(),
                monitor: MonitorSection::default(),
            },
        }
    }

    pub fn shell(mut self, cmd: &str) -> Self {
        self.config.command.shell = Some(cmd.to_string());
        self
    }

    pub fn argv(mut self, argv: &[&str]) -> Self {
        self.config.command.argv = Some(argv.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config
            .command
            .env
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn separator(mut self, sep: &str) -> Self {
        self.config.pattern.separator = Some(sep.to_string());
        self
    }

    pub fn regex(mut self, re: &str) -> Self {
        self.config.pattern.regex = Some(re.to_string());
        self
    }

    pub fn timeout(mut self, dur: &str) -> Self {
        self.config.monitor.timeout = Some(dur.to_string());
        self
    }

    pub fn exit_policy(mut self, policy: ExitPolicy) -> Self {
        self.config.monitor.on_exit_without_match = policy;
        self
    }

    pub fn exit_on_match(mut self, val: bool) -> Self {
        self.config.monitor.exit_on_match = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
