use serde::{Deserialize, Serialize};

/// Limits applied while decoding descriptors from untrusted bytes.
///
/// Missing fields take their default, so hosts can embed this in their own settings files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireLimits {
    /// Actions per descriptor (nested descriptors count separately).
    pub max_actions: usize,
    pub max_string_bytes: usize,
    /// Pixels per bitmap.
    pub max_bitmap_pixels: usize,
    /// How deep `AddView` descriptors may nest.
    pub max_nesting_depth: usize,
}

impl Default for WireLimits {
    fn default() -> WireLimits {
        WireLimits {
            max_actions: 4096,
            max_string_bytes: 1 << 20,
            max_bitmap_pixels: 16 << 20,
            max_nesting_depth: 8,
        }
    }
}

/// Settings for a [`HostContext`](crate::HostContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Bytes of decoded URI images kept between applies.
    pub uri_cache_bytes: usize,
}

impl Default for HostConfig {
    fn default() -> HostConfig {
        HostConfig {
            uri_cache_bytes: 32 << 20,
        }
    }
}

#[test]
fn test_limits_from_toml() {
    let limits: WireLimits = toml::from_str(
        r#"
        max_actions = 16
        max_nesting_depth = 2
        "#,
    )
    .unwrap();
    assert_eq!(limits.max_actions, 16);
    assert_eq!(limits.max_nesting_depth, 2);
    assert_eq!(limits.max_string_bytes, WireLimits::default().max_string_bytes);

    let empty: WireLimits = toml::from_str("").unwrap();
    assert_eq!(empty, WireLimits::default());
}

#[test]
fn test_host_config_from_toml() {
    let config: HostConfig = toml::from_str("uri_cache_bytes = 1024").unwrap();
    assert_eq!(config.uri_cache_bytes, 1024);
    assert_eq!(toml::from_str::<HostConfig>("").unwrap(), HostConfig::default());
}
