/// One logical send, as received from the API surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRequest {
    pub message_id: Option<String>,
    pub recipient: Option<String>,
    pub text: Option<String>,
    pub attachment_path: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    /// The id was seen before; nothing was sent.
    Duplicate,
}

impl DispatchOutcome {
    pub fn is_duplicate(self) -> bool {
        matches!(self, Self::Duplicate)
    }
}
