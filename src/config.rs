//! Registry configuration.

/// Configuration for a [`Registry`](crate::Registry).
///
/// # Example
///
/// ```rust
/// use mediator::RegistryConfig;
///
/// let config = RegistryConfig::new().with_name("orders").verbose();
///
/// assert_eq!(config.name(), "orders");
/// assert!(config.is_verbose());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Registry name, attached to log records
    pub name: Option<String>,
    /// Log registration events at info level instead of debug
    pub verbose: bool,
}

impl RegistryConfig {
    /// Create a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the registry name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enable verbose output.
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Returns the registry name.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("default")
    }

    /// Returns whether verbose output is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Validates the configuration.
    ///
    /// Returns Ok(()) if valid, or an error message describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        match &self.name {
            Some(name) if name.trim().is_empty() => {
                Err("registry name must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }
}
