// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Transform directory entries and selection.
//!
//! The platform enumerator hands the adapter a list of available encoder
//! transforms with name/identifier/capability metadata; the adapter picks
//! one by identifier (falling back to the first entry) and activates it.

use std::fmt;

use crate::error::{EncoderError, Result};
use crate::transform::Transform;

type Activator = Box<dyn Fn() -> anyhow::Result<Box<dyn Transform>> + Send + Sync>;

/// One entry in the transform directory.
pub struct TransformDescriptor {
    name: String,
    guid: String,
    is_async: bool,
    is_hardware: bool,
    activator: Activator,
}

impl TransformDescriptor {
    pub fn new(
        name: impl Into<String>,
        guid: impl Into<String>,
        is_async: bool,
        is_hardware: bool,
        activator: Activator,
    ) -> Self {
        Self {
            name: name.into(),
            guid: guid.into(),
            is_async,
            is_hardware,
            activator,
        }
    }

    /// Friendly name reported by the platform.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique identifier string (CLSID-style).
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Whether the transform uses the asynchronous event/credit protocol.
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Whether the transform is hardware-accelerated.
    pub fn is_hardware(&self) -> bool {
        self.is_hardware
    }

    /// Hardware vendor, when the identifier is a known vendor transform.
    pub fn vendor(&self) -> Option<&'static str> {
        vendor_for_guid(&self.guid)
    }

    /// Instantiate the underlying transform.
    pub fn activate(&self) -> Result<Box<dyn Transform>> {
        let transform = (self.activator)().map_err(|err| {
            tracing::error!(name = %self.name, guid = %self.guid, error = %err,
                "transform activation failed");
            EncoderError::Activation(err.to_string())
        })?;
        tracing::info!(name = %self.name, guid = %self.guid,
            hardware = self.is_hardware, r#async = self.is_async,
            "activated H.264 transform");
        Ok(transform)
    }
}

impl fmt::Debug for TransformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformDescriptor")
            .field("name", &self.name)
            .field("guid", &self.guid)
            .field("is_async", &self.is_async)
            .field("is_hardware", &self.is_hardware)
            .finish_non_exhaustive()
    }
}

/// Pick the descriptor matching `guid`, falling back to the first entry.
/// Returns `None` only for an empty directory.
pub fn select_transform<'a>(
    descriptors: &'a [TransformDescriptor],
    guid: &str,
) -> Option<&'a TransformDescriptor> {
    descriptors
        .iter()
        .find(|d| d.guid.eq_ignore_ascii_case(guid))
        .or_else(|| descriptors.first())
}

/// Select by `guid` and activate in one step. An empty directory is
/// [`EncoderError::NoTransform`].
pub fn activate_selected(
    descriptors: &[TransformDescriptor],
    guid: &str,
) -> Result<Box<dyn Transform>> {
    let descriptor = select_transform(descriptors, guid).ok_or(EncoderError::NoTransform)?;
    descriptor.activate()
}

/// Well-known H.264 encoder transform identifiers.
const VENDOR_GUIDS: &[(&str, &str)] = &[
    // Microsoft software H.264 encoder MFT.
    ("{6CA50344-051A-4DED-9779-A43305165E35}", "Microsoft"),
    // Intel Quick Sync Video H.264 encoder MFT.
    ("{4BE8D3C0-0515-4A37-AD55-E4BAE19AF471}", "Intel"),
    // NVIDIA NVENC H.264 encoder MFT.
    ("{60F44560-5A20-4857-BFEF-D29773CB8040}", "NVIDIA"),
    // AMD VCE H.264 encoder MFT.
    ("{ADC9BC80-0F41-46C6-AB75-D693D793597D}", "AMD"),
];

/// Vendor name for a known transform identifier.
pub fn vendor_for_guid(guid: &str) -> Option<&'static str> {
    VENDOR_GUIDS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(guid))
        .map(|(_, vendor)| *vendor)
}
