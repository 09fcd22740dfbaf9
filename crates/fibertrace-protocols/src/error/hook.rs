//! Hook installation and renderer admission errors.

use thiserror::Error;

use crate::renderer::RendererId;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("No compatible renderer registered after {attempts} detection attempts")]
    HookUnavailable { attempts: u32 },

    #[error("Global hook slot is occupied by an incompatible hook: {0}")]
    InstallConflict(String),

    #[error("Refusing to instrument renderer {renderer} ({package}): production build without override")]
    InstrumentationUnsafe { renderer: RendererId, package: String },

    #[error("Renderer registration failed: {0}")]
    Registration(String),

    #[error("Engine is disabled")]
    Disabled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_unavailable_error() {
        let err = HookError::HookUnavailable { attempts: 20 };
        let display = err.to_string();
        assert!(display.contains("20"));
        assert!(display.contains("No compatible renderer"));
    }

    #[test]
    fn test_install_conflict_error() {
        let err = HookError::InstallConflict("legacy hook v3".to_string());
        assert!(err.to_string().contains("legacy hook v3"));
    }

    #[test]
    fn test_instrumentation_unsafe_error() {
        let err = HookError::InstrumentationUnsafe {
            renderer: RendererId(2),
            package: "react-dom".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("react-dom"));
        assert!(display.contains("production"));
    }

    #[test]
    fn test_error_debug() {
        let err = HookError::Disabled;
        assert!(format!("{:?}", err).contains("Disabled"));
    }
}
