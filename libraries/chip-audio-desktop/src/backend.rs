// Audio backend selection
//
// The platform default is right for almost everyone; JACK is offered behind
// a feature for pro-audio setups.

use crate::error::AudioError;
use serde::{Deserialize, Serialize};

/// Audio backend / driver selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    /// System default backend (WASAPI on Windows, CoreAudio on macOS, ALSA on Linux)
    #[default]
    Default,

    /// JACK Audio Connection Kit - Professional routing, low-latency
    #[cfg(feature = "jack")]
    Jack,
}

impl AudioBackend {
    /// Get human-readable name of backend
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => {
                #[cfg(target_os = "windows")]
                return "WASAPI";

                #[cfg(target_os = "macos")]
                return "CoreAudio";

                #[cfg(target_os = "linux")]
                return "ALSA";

                #[cfg(not(any(
                    target_os = "windows",
                    target_os = "macos",
                    target_os = "linux"
                )))]
                return "Default";
            }

            #[cfg(feature = "jack")]
            Self::Jack => "JACK",
        }
    }

    /// Convert backend to CPAL host
    pub fn to_cpal_host(&self) -> Result<cpal::Host, AudioError> {
        match self {
            Self::Default => Ok(cpal::default_host()),

            #[cfg(feature = "jack")]
            Self::Jack => {
                let host_id = cpal::available_hosts()
                    .into_iter()
                    .find(|id| matches!(id, cpal::HostId::Jack))
                    .ok_or(AudioError::BackendUnavailable(self.name()))?;

                cpal::host_from_id(host_id)
                    .map_err(|_| AudioError::BackendUnavailable(self.name()))
            }
        }
    }

    /// Check if backend is available on current system
    pub fn is_available(&self) -> bool {
        self.to_cpal_host().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_has_a_name() {
        assert!(!AudioBackend::Default.name().is_empty());
    }

    #[test]
    fn default_backend_resolves_to_a_host() {
        assert!(AudioBackend::Default.to_cpal_host().is_ok());
    }
}
