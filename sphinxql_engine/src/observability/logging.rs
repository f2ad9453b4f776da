use log::Level;

/// Key=value event logger for cursor state changes.
#[derive(Debug, Clone, Copy)]
pub struct EventLogger {
    enabled: bool,
}

impl EventLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log_transition(
        &self,
        component: &str,
        from: &str,
        to: &str,
        metadata: &[(&str, String)],
    ) {
        if !self.enabled {
            return;
        }

        let mut message = format!("{} {} -> {}", component, from, to);
        append_metadata(&mut message, metadata);

        log::debug!("{}", message);
    }

    pub fn log_fetch(&self, component: &str, position: usize) {
        if !self.enabled {
            return;
        }

        log::trace!("{} fetched row {}", component, position);
    }

    pub fn log_event(
        &self,
        level: Level,
        component: &str,
        event: &str,
        metadata: &[(&str, String)],
    ) {
        if !self.enabled {
            return;
        }

        let mut message = format!("{}: {}", component, event);
        append_metadata(&mut message, metadata);

        log::log!(level, "{}", message);
    }

    pub fn log_error(&self, component: &str, error: &str) {
        if !self.enabled {
            return;
        }

        log::error!("{} error: {}", component, error);
    }
}

impl Default for EventLogger {
    fn default() -> Self {
        Self::new(true)
    }
}

fn append_metadata(message: &mut String, metadata: &[(&str, String)]) {
    for (key, value) in metadata {
        message.push_str(&format!(", {}={}", key, value));
    }
}
