//! plugins/user_agent.rs
//! Host descriptor attached as `userAgent`.

use sysinfo::System;

use crate::constants::hook_names::builder::BEFORE_BUILD;
use crate::event::DeviceDescriptor;
use crate::plugins::{ApplyPlugin, ComponentRef, PluginTarget};

const UNKNOWN: &str = "unknown";

/// Collected once; every message gets a copy.
pub fn device_descriptor() -> DeviceDescriptor {
    DeviceDescriptor {
        os_name: System::name().unwrap_or_else(|| UNKNOWN.into()),
        os_version: System::os_version().unwrap_or_else(|| UNKNOWN.into()),
        kernel_version: System::kernel_version().unwrap_or_else(|| UNKNOWN.into()),
        host_name: System::host_name().unwrap_or_else(|| UNKNOWN.into()),
        arch: std::env::consts::ARCH.to_string(),
        cpu_count: num_cpus::get(),
        agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
    }
}

#[derive(Debug)]
pub struct UserAgentPlugin {
    enabled: bool,
}

impl UserAgentPlugin {
    /// `enabled = false` registers nothing (`builder.deviceInfo`).
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl ApplyPlugin for UserAgentPlugin {
    fn name(&self) -> &str {
        "userAgent"
    }

    fn target(&self) -> PluginTarget {
        PluginTarget::Builder
    }

    fn apply(&self, component: ComponentRef<'_>) -> anyhow::Result<()> {
        let builder = component.builder()?;
        if !self.enabled {
            return Ok(());
        }

        let descriptor = device_descriptor();
        builder.hooks().tap_sync(BEFORE_BUILD, move |message| {
            message.user_agent = Some(descriptor.clone());
            Ok(())
        })?;
        Ok(())
    }
}
