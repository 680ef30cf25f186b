//! Bidirectional, information-preserving `PlatformCluster` schema
//! conversion.
//!
//! Two independent engines share only the annotation side-channel protocol:
//! [`v1_v2`] for the current v1 ↔ v2 pair and [`v2alpha1`] for the
//! historical v1 ↔ v2alpha1 pair. Each conversion pre-seeds the destination
//! spec from the side-channel annotation carried by the source (restoring
//! fields the source schema cannot express), applies the deterministic field
//! map, then stores the source spec in the destination's side-channel and
//! strips the annotation matching the destination's own schema.

pub mod v1_v2;
pub mod v2alpha1;

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::ObjectMeta;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Read a side-channel payload from the metadata, if present.
pub(crate) fn read_side_channel<T: DeserializeOwned>(
    meta: &ObjectMeta,
    annotation: &str,
) -> Result<Option<T>> {
    let Some(payload) = meta
        .annotations
        .as_ref()
        .and_then(|a| a.get(annotation))
    else {
        return Ok(None);
    };
    serde_yaml::from_str(payload)
        .map(Some)
        .map_err(|source| Error::CorruptedAnnotation {
            annotation: annotation.to_string(),
            source,
        })
}

/// Store a side-channel payload and drop the destination's own-schema
/// annotation.
pub(crate) fn write_side_channel<T: serde::Serialize>(
    meta: &mut ObjectMeta,
    annotation: &str,
    own_annotation: &str,
    spec: &T,
) -> Result<()> {
    let payload = serde_yaml::to_string(spec)?;
    let annotations = meta.annotations.get_or_insert_with(BTreeMap::new);
    annotations.insert(annotation.to_string(), payload);
    annotations.remove(own_annotation);
    Ok(())
}

/// Parse a comma-joined `k=v` string into a map. Tokens without `=` are
/// dropped.
pub(crate) fn parse_kv_string(raw: &str) -> BTreeMap<String, String> {
    raw.split(',')
        .filter_map(|token| {
            let (k, v) = token.split_once('=')?;
            let k = k.trim();
            if k.is_empty() {
                return None;
            }
            Some((k.to_string(), v.trim().to_string()))
        })
        .collect()
}

/// Emit a map as a comma-joined `k=v` string in key-sorted order.
pub(crate) fn format_kv_string(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split an image reference at the last `:`; no `:` means an empty tag.
pub(crate) fn split_image(reference: &str) -> (String, String) {
    match reference.rsplit_once(':') {
        Some((image, tag)) => (image.to_string(), tag.to_string()),
        None => (reference.to_string(), String::new()),
    }
}

/// Join an image and tag back into a reference.
pub(crate) fn join_image(image: &str, tag: &str) -> String {
    if image.is_empty() {
        String::new()
    } else if tag.is_empty() {
        image.to_string()
    } else {
        format!("{image}:{tag}")
    }
}

/// The canonical string of a quantity; zero and unset are elided.
pub(crate) fn quantity_string(quantity: Option<&Quantity>) -> String {
    match quantity {
        Some(q) if !q.0.is_empty() && q.0 != "0" => q.0.clone(),
        _ => String::new(),
    }
}

/// Parse a quantity string; empty and zero yield `None`.
pub(crate) fn parse_quantity(raw: &str) -> Option<Quantity> {
    if raw.is_empty() || raw == "0" {
        None
    } else {
        Some(Quantity(raw.to_string()))
    }
}

/// Split a separator-joined list; empty input yields an empty list.
pub(crate) fn split_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Join a list with a separator.
pub(crate) fn join_list(items: &[String], separator: char) -> String {
    items.join(&separator.to_string())
}
