use crate::constants::hook_names::builder::BEFORE_BUILD;
use crate::plugins::{ApplyPlugin, ComponentRef, PluginTarget};
use crate::utils::now_millis;

/// Stamps `reportTimeStamp` on every message.
#[derive(Debug, Default)]
pub struct LocaltimePlugin;

impl ApplyPlugin for LocaltimePlugin {
    fn name(&self) -> &str {
        "localtime"
    }

    fn target(&self) -> PluginTarget {
        PluginTarget::Builder
    }

    fn apply(&self, component: ComponentRef<'_>) -> anyhow::Result<()> {
        component.builder()?.hooks().tap_sync(BEFORE_BUILD, |message| {
            message.report_time_stamp = Some(now_millis());
            Ok(())
        })?;
        Ok(())
    }
}
