use std::fmt;

use tracing::error;

use crate::types::StateError;

/// Per-message lifecycle.
///
/// ```text
/// Created -> Enriching -> Enriched -> Sending -> Delivered
///                 |                      |
///                 v                      v
///            EnrichFailed         FallbackSending -> Delivered
///                                        |
///                                        v
///                                  DeliveryFailed
/// ```
///
/// `Sending -> DeliveryFailed` is also legal when no fallback exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeliveryState {
    Created,
    Enriching,
    EnrichFailed,
    Enriched,
    Sending,
    FallbackSending,
    Delivered,
    DeliveryFailed,
}

impl DeliveryState {
    pub fn can_advance(self, to: DeliveryState) -> bool {
        use DeliveryState::*;
        matches!(
            (self, to),
            (Created, Enriching)
                | (Enriching, Enriched)
                | (Enriching, EnrichFailed)
                | (Enriched, Sending)
                | (Sending, Delivered)
                | (Sending, FallbackSending)
                | (Sending, DeliveryFailed)
                | (FallbackSending, Delivered)
                | (FallbackSending, DeliveryFailed)
        )
    }

    pub fn advance(&mut self, to: DeliveryState) -> Result<(), StateError> {
        if !self.can_advance(to) {
            return Err(StateError::IllegalTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }

    /// `advance` for call sites where an illegal transition is a bug: logged,
    /// state left unchanged.
    pub(crate) fn advance_logged(&mut self, to: DeliveryState) {
        if let Err(e) = self.advance(to) {
            error!(target: "river::event", error = %e, "delivery state machine violated");
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryState::Delivered | DeliveryState::DeliveryFailed | DeliveryState::EnrichFailed)
    }
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeliveryState::Created => "created",
            DeliveryState::Enriching => "enriching",
            DeliveryState::EnrichFailed => "enrich-failed",
            DeliveryState::Enriched => "enriched",
            DeliveryState::Sending => "sending",
            DeliveryState::FallbackSending => "fallback-sending",
            DeliveryState::Delivered => "delivered",
            DeliveryState::DeliveryFailed => "delivery-failed",
        };
        f.write_str(s)
    }
}
