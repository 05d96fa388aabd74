//! Firing policy for the link's close notification.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Decides when the one-shot close notification may fire.
///
/// The observed behaviour of polled links is [`CloseEventPolicy::WhenNotOpen`]:
/// the notification fires the first time it is polled while the link is not
/// open, which includes a link that has never connected. Hosts that only care
/// about genuine disconnects select [`CloseEventPolicy::OnDisconnect`].
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CloseEventPolicy {
    /// Fire whenever the link is observed not open.
    #[default]
    WhenNotOpen,
    /// Fire only after a connection that reached the open state has ended.
    OnDisconnect,
}

/// Errors encountered while parsing a [`CloseEventPolicy`] from text.
pub type CloseEventPolicyParseError = strum::ParseError;
