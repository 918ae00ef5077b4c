/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_html: bool,
    /// Hard per-message limit, in characters.
    pub max_message_len: usize,
}
