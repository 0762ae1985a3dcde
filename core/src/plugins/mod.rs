//! plugins: extension model.
//!
//! A plugin names one pipeline component (`PluginTarget`) and gets a
//! `ComponentRef` to it in `apply`, usually to register hook callbacks.
//! Targets are a closed set; an unknown tag is a config error.

pub mod id;
pub mod localtime;
pub mod logger;
pub mod user_agent;

pub use id::IdPlugin;
pub use localtime::LocaltimePlugin;
pub use logger::LoggerPlugin;
pub use user_agent::UserAgentPlugin;

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

use crate::aggregator::Aggregator;
use crate::config::ConfigManager;
use crate::enrich::Enricher;
use crate::sender::Sender;
use crate::types::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginTarget {
    ConfigManager,
    Monitor,
    Builder,
    Sender,
}

impl PluginTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginTarget::ConfigManager => "configManager",
            PluginTarget::Monitor => "monitor",
            PluginTarget::Builder => "builder",
            PluginTarget::Sender => "sender",
        }
    }
}

impl fmt::Display for PluginTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluginTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "configManager" => Ok(PluginTarget::ConfigManager),
            "monitor" => Ok(PluginTarget::Monitor),
            "builder" => Ok(PluginTarget::Builder),
            "sender" => Ok(PluginTarget::Sender),
            other => Err(ConfigError::UnknownPluginTarget(other.to_string())),
        }
    }
}

/// Borrowed view of the component a plugin targets.
#[derive(Clone, Copy)]
pub enum ComponentRef<'a> {
    ConfigManager(&'a ConfigManager),
    Monitor(&'a Aggregator),
    Builder(&'a Enricher),
    Sender(&'a Sender),
}

impl<'a> ComponentRef<'a> {
    pub fn target(&self) -> PluginTarget {
        match self {
            ComponentRef::ConfigManager(_) => PluginTarget::ConfigManager,
            ComponentRef::Monitor(_) => PluginTarget::Monitor,
            ComponentRef::Builder(_) => PluginTarget::Builder,
            ComponentRef::Sender(_) => PluginTarget::Sender,
        }
    }

    pub fn config_manager(self) -> anyhow::Result<&'a ConfigManager> {
        match self {
            ComponentRef::ConfigManager(c) => Ok(c),
            other => Err(mismatch(PluginTarget::ConfigManager, other.target())),
        }
    }

    pub fn monitor(self) -> anyhow::Result<&'a Aggregator> {
        match self {
            ComponentRef::Monitor(m) => Ok(m),
            other => Err(mismatch(PluginTarget::Monitor, other.target())),
        }
    }

    pub fn builder(self) -> anyhow::Result<&'a Enricher> {
        match self {
            ComponentRef::Builder(b) => Ok(b),
            other => Err(mismatch(PluginTarget::Builder, other.target())),
        }
    }

    pub fn sender(self) -> anyhow::Result<&'a Sender> {
        match self {
            ComponentRef::Sender(s) => Ok(s),
            other => Err(mismatch(PluginTarget::Sender, other.target())),
        }
    }
}

fn mismatch(wanted: PluginTarget, got: PluginTarget) -> anyhow::Error {
    anyhow!("expected the {wanted} component, got {got}")
}

/// Object-style plugin.
pub trait ApplyPlugin: Send + Sync {
    fn name(&self) -> &str;
    fn target(&self) -> PluginTarget;
    fn apply(&self, component: ComponentRef<'_>) -> anyhow::Result<()>;
}

pub type PluginFn = Box<dyn Fn(ComponentRef<'_>) -> anyhow::Result<()> + Send + Sync>;

pub enum Plugin {
    Callable { name: String, target: PluginTarget, apply: PluginFn },
    Object(Box<dyn ApplyPlugin>),
}

impl Plugin {
    pub fn callable<F>(name: impl Into<String>, target: PluginTarget, apply: F) -> Self
    where
        F: Fn(ComponentRef<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Plugin::Callable { name: name.into(), target, apply: Box::new(apply) }
    }

    /// Like `callable`, with the target given by its tag (`"builder"`, ...).
    pub fn from_tag<F>(name: impl Into<String>, tag: &str, apply: F) -> Result<Self, ConfigError>
    where
        F: Fn(ComponentRef<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Ok(Self::callable(name, tag.parse()?, apply))
    }

    pub fn object(plugin: impl ApplyPlugin + 'static) -> Self {
        Plugin::Object(Box::new(plugin))
    }

    pub fn name(&self) -> &str {
        match self {
            Plugin::Callable { name, .. } => name,
            Plugin::Object(p) => p.name(),
        }
    }

    pub fn target(&self) -> PluginTarget {
        match self {
            Plugin::Callable { target, .. } => *target,
            Plugin::Object(p) => p.target(),
        }
    }

    pub fn apply(&self, component: ComponentRef<'_>) -> anyhow::Result<()> {
        match self {
            Plugin::Callable { apply, .. } => apply(component),
            Plugin::Object(p) => p.apply(component),
        }
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin").field("name", &self.name()).field("target", &self.target()).finish()
    }
}
