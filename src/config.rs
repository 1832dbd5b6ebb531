//! Registry configuration

/// What happens when a type name is defined a second time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedefinitionPolicy {
    /// Fail with `TYPE_REDEFINED`
    #[default]
    Reject,
    /// Replace the earlier type; the last definition wins
    Replace,
}

/// Configuration for a [`TypeRegistry`](crate::registry::TypeRegistry).
///
/// The process-wide registry always uses the default.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Policy for reused type names.
    pub redefinition: RedefinitionPolicy,
}

impl RegistryConfig {
    /// Create config that rejects reused names.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Create config where the last definition of a name wins.
    pub fn permissive() -> Self {
        Self {
            redefinition: RedefinitionPolicy::Replace,
        }
    }

    /// Check if reused names replace earlier types.
    pub fn allows_redefinition(&self) -> bool {
        self.redefinition == RedefinitionPolicy::Replace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_rejects() {
        let config = RegistryConfig::default();
        assert_eq!(config.redefinition, RedefinitionPolicy::Reject);
        assert!(!config.allows_redefinition());
    }

    #[test]
    fn test_config_permissive() {
        assert!(RegistryConfig::permissive().allows_redefinition());
        assert!(!RegistryConfig::strict().allows_redefinition());
    }
}
