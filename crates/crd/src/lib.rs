// Copyright 2026 Platform Operator Maintainers
// SPDX-License-Identifier: Apache-2.0

//! Custom resource definitions for the platform operator.
//!
//! The `PlatformCluster` resource is served in three schema versions:
//! * [`v2`] — the nested, typed storage version,
//! * [`v1`] — the legacy flat version, converted at the webhook boundary,
//! * [`v2alpha1`] — a historical version kept only for conversion.

pub mod common;
pub mod v1;
pub mod v2;
pub mod v2alpha1;

/// CRD group shared by every version of `PlatformCluster`.
pub const GROUP: &str = "platform.dev";

/// Serde helper: skip serializing values equal to their type default.
#[must_use]
pub fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// Serde helper: skip serializing `false` booleans.
#[allow(clippy::trivially_copy_pass_by_ref)]
#[must_use]
pub fn is_false(value: &bool) -> bool {
    !*value
}
