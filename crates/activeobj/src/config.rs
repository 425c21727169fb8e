//! Worker thread configuration.

/// Configuration applied when an [`ActiveObject`](crate::ActiveObject) spawns
/// its worker thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveObjectConfig {
    /// OS-visible thread name, also used as the log label.
    pub name: Option<String>,
    /// Worker stack size in bytes; the platform default when unset.
    pub stack_size: Option<usize>,
}

impl ActiveObjectConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ActiveObjectConfigBuilder {
        ActiveObjectConfigBuilder::default()
    }

    pub(crate) fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| String::from("active-object"))
    }
}

/// Builder for ergonomic [`ActiveObjectConfig`] construction.
#[derive(Debug, Clone, Default)]
pub struct ActiveObjectConfigBuilder {
    config: ActiveObjectConfig,
}

impl ActiveObjectConfigBuilder {
    /// Sets the worker thread name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    /// Sets the worker stack size in bytes.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ActiveObjectConfig {
        self.config
    }
}
