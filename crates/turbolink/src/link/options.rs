//! Behaviour knobs for a link, projected from the shared configuration.

use turbolink_config::{CloseEventPolicy, Config, DEFAULT_CLOSE_CODE, DEFAULT_CLOSE_REASON};

/// Close handshake values and close-notification policy for a [`Link`](crate::Link).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOptions {
    close_code: u16,
    close_reason: String,
    close_event: CloseEventPolicy,
}

impl LinkOptions {
    /// Projects the engine-relevant subset of `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            close_code: config.close_code(),
            close_reason: config.close_reason().to_owned(),
            close_event: config.close_event(),
        }
    }

    /// Sets the code sent by [`Link::close`](crate::Link::close).
    #[must_use]
    pub const fn with_close_code(mut self, code: u16) -> Self {
        self.close_code = code;
        self
    }

    /// Sets the reason sent by [`Link::close`](crate::Link::close).
    #[must_use]
    pub fn with_close_reason(mut self, reason: impl Into<String>) -> Self {
        self.close_reason = reason.into();
        self
    }

    /// Sets the close-notification policy.
    #[must_use]
    pub const fn with_close_event(mut self, policy: CloseEventPolicy) -> Self {
        self.close_event = policy;
        self
    }

    /// Code sent when the host closes the link.
    #[must_use]
    pub const fn close_code(&self) -> u16 {
        self.close_code
    }

    /// Reason sent when the host closes the link.
    #[must_use]
    pub fn close_reason(&self) -> &str {
        &self.close_reason
    }

    /// Close-notification policy.
    #[must_use]
    pub const fn close_event(&self) -> CloseEventPolicy {
        self.close_event
    }
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            close_code: DEFAULT_CLOSE_CODE,
            close_reason: DEFAULT_CLOSE_REASON.to_owned(),
            close_event: CloseEventPolicy::default(),
        }
    }
}
