//! Codec lookup by name

use super::{CodecDescriptor, RAW};
use crate::error::{AudioError, AudioResult};
use log::debug;

#[cfg(feature = "mp3")]
static REGISTRY: &[&CodecDescriptor] = &[&super::MP3, &RAW];
#[cfg(not(feature = "mp3"))]
static REGISTRY: &[&CodecDescriptor] = &[&RAW];

/// All registered codecs, in preference order
pub fn registered() -> &'static [&'static CodecDescriptor] {
    REGISTRY
}

/// Unrestricted lookup of a registered codec
pub fn encoder_by_name(name: &str) -> Option<&'static CodecDescriptor> {
    REGISTRY.iter().copied().find(|d| d.name() == name)
}

/// Pick the codec to use for `requested`
///
/// `allowed` narrows the eligible codecs; `None` or an empty list allows any registered one.
/// `"auto"` and `"default"` pick the first registered entry of `allowed`. Without an
/// allow-list there is nothing to prefer, so they fail like an unknown name; callers wanting
/// a global default must handle it themselves, as they must any `"none"` value.
pub fn select_encoder(
    requested: &str,
    allowed: Option<&[&str]>,
) -> AudioResult<&'static CodecDescriptor> {
    let allowed = allowed.filter(|list| !list.is_empty());

    let selected = if requested == "auto" || requested == "default" {
        allowed.and_then(|list| list.iter().find_map(|name| encoder_by_name(name)))
    } else {
        encoder_by_name(requested)
            .filter(|_| allowed.map(|list| list.contains(&requested)).unwrap_or(true))
    };

    match selected {
        Some(descriptor) => {
            debug!("selected encoder '{}' for '{}'", descriptor.name(), requested);
            Ok(descriptor)
        }
        None => Err(AudioError::NotFound(requested.to_string())),
    }
}
