use tracing::debug;

use crate::constants::hook_names::sender::AFTER_SEND;
use crate::plugins::{ApplyPlugin, ComponentRef, PluginTarget};

/// Debug-logs every delivered message, off the delivery path.
#[derive(Debug, Default)]
pub struct LoggerPlugin;

impl ApplyPlugin for LoggerPlugin {
    fn name(&self) -> &str {
        "logger"
    }

    fn target(&self) -> PluginTarget {
        PluginTarget::Sender
    }

    fn apply(&self, component: ComponentRef<'_>) -> anyhow::Result<()> {
        component.sender()?.hooks().tap_deferred(AFTER_SEND, |message| {
            let body = message.to_json()?;
            debug!(target: "river::plugins::logger", kind = %message.kind(), sub_type = message.sub_type(), %body, "sent");
            Ok(())
        })?;
        Ok(())
    }
}
