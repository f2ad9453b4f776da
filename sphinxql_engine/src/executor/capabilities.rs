/// What a statement handle can do beyond forward-only fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleCapabilities {
    /// The handle can seek back to an earlier row (or an earlier statement,
    /// for batch handles).
    pub rewindable: bool,
    /// Rows already live in client memory, so eager buffering costs no
    /// extra round trips.
    pub client_buffered: bool,
}

impl HandleCapabilities {
    /// Forward-only, server-side cursor.
    pub fn forward_only() -> Self {
        Self {
            rewindable: false,
            client_buffered: false,
        }
    }

    pub fn with_rewind(mut self, rewindable: bool) -> Self {
        self.rewindable = rewindable;
        self
    }

    pub fn with_client_buffer(mut self, client_buffered: bool) -> Self {
        self.client_buffered = client_buffered;
        self
    }
}

impl Default for HandleCapabilities {
    fn default() -> Self {
        Self {
            rewindable: false,
            client_buffered: true,
        }
    }
}
