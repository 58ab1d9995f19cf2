//! Vehicles and their editable attributes.

use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::fuel::FuelEntry;
use super::maintenance::MaintenanceEntry;
use crate::error::{Error, Result};

/// Color assigned to a vehicle when none is given.
pub const DEFAULT_COLOR: &str = "#2563eb";

/// Named colors offered when creating a vehicle.
pub const PRESET_COLORS: &[(&str, &str)] = &[
    ("Royal blue", "#2563eb"),
    ("Red", "#ef4444"),
    ("Green", "#22c55e"),
    ("Orange", "#f97316"),
    ("Purple", "#8b5cf6"),
    ("Black", "#111827"),
];

fn color_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("color pattern is valid")
    })
}

/// A vehicle in a ledger, with its fuel and maintenance history.
///
/// Both entry lists are kept most-recent-first: new entries are inserted at
/// the head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Opaque unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// License plate, possibly empty.
    #[serde(default)]
    pub plate: String,
    /// Model and year label, possibly empty.
    #[serde(default)]
    pub model: String,
    /// Identification color as a hex string.
    #[serde(default = "default_color")]
    pub color: String,
    /// Photo as a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Fuel entries, most recent first.
    #[serde(default)]
    pub entries: Vec<FuelEntry>,
    /// Maintenance entries, most recent first.
    #[serde(default)]
    pub maintenance_entries: Vec<MaintenanceEntry>,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// The user-editable fields of a vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleAttrs {
    /// Display name; must not be blank.
    pub name: String,
    /// License plate; stored upper-cased.
    pub plate: String,
    /// Model and year label.
    pub model: String,
    /// Hex color (`#rgb` or `#rrggbb`).
    pub color: String,
    /// Photo as a data URL.
    pub photo: Option<String>,
}

impl VehicleAttrs {
    /// Attributes with only a name; everything else defaulted.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plate: String::new(),
            model: String::new(),
            color: DEFAULT_COLOR.to_string(),
            photo: None,
        }
    }

    /// Check and normalize the attributes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a blank name, a malformed color or a
    /// photo that is not a base64 data URL.
    pub fn validated(self) -> Result<Self> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("name", "must not be empty"));
        }

        let color = self.color.trim().to_string();
        if !color_pattern().is_match(&color) {
            return Err(Error::validation(
                "color",
                format!("'{color}' is not a hex color like #2563eb"),
            ));
        }

        if let Some(photo) = &self.photo {
            validate_photo(photo)?;
        }

        Ok(Self {
            name,
            plate: self.plate.trim().to_uppercase(),
            model: self.model.trim().to_string(),
            color: color.to_lowercase(),
            photo: self.photo,
        })
    }
}

impl Vehicle {
    /// Build a vehicle from already validated attributes.
    pub(crate) fn from_attrs(id: String, attrs: VehicleAttrs) -> Self {
        Self {
            id,
            name: attrs.name,
            plate: attrs.plate,
            model: attrs.model,
            color: attrs.color,
            photo: attrs.photo,
            entries: Vec::new(),
            maintenance_entries: Vec::new(),
        }
    }

    /// Replace the editable fields, keeping id and history.
    pub(crate) fn apply_attrs(&mut self, attrs: VehicleAttrs) {
        self.name = attrs.name;
        self.plate = attrs.plate;
        self.model = attrs.model;
        self.color = attrs.color;
        self.photo = attrs.photo;
    }

    /// The current editable fields.
    #[must_use]
    pub fn attrs(&self) -> VehicleAttrs {
        VehicleAttrs {
            name: self.name.clone(),
            plate: self.plate.clone(),
            model: self.model.clone(),
            color: self.color.clone(),
            photo: self.photo.clone(),
        }
    }

    /// Look up a fuel entry by id.
    #[must_use]
    pub fn fuel_entry(&self, id: &str) -> Option<&FuelEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Look up a maintenance entry by id.
    #[must_use]
    pub fn maintenance_entry(&self, id: &str) -> Option<&MaintenanceEntry> {
        self.maintenance_entries.iter().find(|e| e.id == id)
    }

    /// Resolve an exact id or unique id prefix to a fuel entry id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if nothing or more than one entry
    /// matches.
    pub fn resolve_fuel_entry(&self, reference: &str) -> Result<String> {
        resolve_id(self.entries.iter().map(|e| e.id.as_str()), reference)
    }

    /// Resolve an exact id or unique id prefix to a maintenance entry id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if nothing or more than one entry
    /// matches.
    pub fn resolve_maintenance_entry(&self, reference: &str) -> Result<String> {
        resolve_id(
            self.maintenance_entries.iter().map(|e| e.id.as_str()),
            reference,
        )
    }
}

fn resolve_id<'a>(ids: impl Iterator<Item = &'a str> + Clone, reference: &str) -> Result<String> {
    if let Some(exact) = ids.clone().find(|id| *id == reference) {
        return Ok(exact.to_string());
    }
    let mut matches = ids.filter(|id| !reference.is_empty() && id.starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Ok(only.to_string()),
        _ => Err(Error::entry_not_found(reference)),
    }
}

/// Encode raw image bytes as a data URL suitable for [`Vehicle::photo`].
#[must_use]
pub fn photo_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Guess an image MIME type from a file extension.
#[must_use]
pub fn image_mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "image/jpeg",
    }
}

/// Check that a photo is a `data:<mime>;base64,<payload>` URL.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the prefix is missing or the payload is
/// not valid base64.
pub fn validate_photo(photo: &str) -> Result<()> {
    let payload = photo
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload)
        .ok_or_else(|| Error::validation("photo", "must be a base64 data URL"))?;

    STANDARD
        .decode(payload)
        .map_err(|e| Error::validation("photo", format!("invalid base64 payload: {e}")))?;
    Ok(())
}
