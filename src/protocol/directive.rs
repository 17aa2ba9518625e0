//! Inbound directive model.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The only audio format the remote session sends for speech.
pub const AUDIO_MPEG: &str = "AUDIO_MPEG";

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Header shared by directives and events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub namespace: String,
    pub name: String,
    /// Absent on pulled state reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// Ties a directive to the recognition dialog that produced it.  Some
    /// servers omit it entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialog_request_id: Option<String>,
}

impl Header {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            message_id: None,
            dialog_request_id: None,
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn with_dialog_request_id(mut self, id: impl Into<String>) -> Self {
        self.dialog_request_id = Some(id.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Directive
// ---------------------------------------------------------------------------

/// A command from the remote session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub header: Header,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Directive {
    pub fn new(header: Header, payload: serde_json::Value) -> Self {
        Self { header, payload }
    }

    /// Decode the payload into the handler's typed representation.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }

    /// `true` when the header names `namespace.name`.
    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.header.namespace == namespace && self.header.name == name
    }
}

// ---------------------------------------------------------------------------
// SpeakPayload
// ---------------------------------------------------------------------------

/// Payload of `SpeechSynthesizer.Speak`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakPayload {
    /// `cid:<content-id>` reference to an attachment delivered alongside the
    /// directive.
    pub url: String,
    #[serde(default = "default_format")]
    pub format: String,
    pub token: String,
}

fn default_format() -> String {
    AUDIO_MPEG.into()
}
