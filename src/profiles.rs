// SPDX-License-Identifier: GPL-3.0-only

//! Output profiles
//!
//! An [`OutputProfile`] names one output of a capture: where the file goes,
//! how much the frame is scaled, and how hard it is compressed. Every capture
//! request applies each profile of an [`OutputProfileSet`] in insertion order.

use crate::constants::{self, quality};
use crate::errors::TransformError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path};

/// Storage root a profile writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Destination {
    /// Application cache directory (may be purged by the system)
    #[default]
    Cache,
    /// Application-private data directory
    Private,
    /// User-visible pictures directory
    Public,
}

impl Destination {
    /// All destinations, in declaration order
    pub const ALL: [Destination; 3] = [
        Destination::Cache,
        Destination::Private,
        Destination::Public,
    ];

    /// Lowercase name used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Cache => "cache",
            Destination::Private => "private",
            Destination::Public => "public",
        }
    }

    /// Parse a destination case-insensitively, falling back to `Cache`
    pub fn from_name(text: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(text.trim()))
            .unwrap_or_default()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Destination {
    fn from(text: String) -> Self {
        Destination::from_name(&text)
    }
}

impl From<Destination> for String {
    fn from(destination: Destination) -> Self {
        destination.as_str().to_string()
    }
}

/// Requested orientation of the output
///
/// Carried through configuration but not consulted by the transform: output
/// orientation is decided by the buffer's shape alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Automatic,
    Portrait,
    Landscape,
}

/// One named transform and destination policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputProfile {
    name: String,
    /// Storage root for this output
    #[serde(default)]
    pub destination: Destination,
    /// Declared orientation (inert)
    #[serde(default)]
    pub rotation: RotationPolicy,
    /// Multiplier applied to both width and height; 1.0 keeps the size
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Compression quality in [0.0, 1.0]
    #[serde(default = "default_quality")]
    pub quality: f64,
}

fn default_scale() -> f64 {
    1.0
}

fn default_quality() -> f64 {
    1.0
}

impl OutputProfile {
    /// Create a profile with the given name and transform settings
    pub fn new(name: impl Into<String>, destination: Destination, scale: f64, quality: f64) -> Self {
        Self {
            name: name.into(),
            destination,
            rotation: RotationPolicy::default(),
            scale,
            quality,
        }
    }

    /// Create a profile that keeps the frame as-is and writes it to the cache
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, Destination::Cache, default_scale(), default_quality())
    }

    /// Profile name, used as the result key and the output file stem
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check that the profile can drive a transform
    pub fn validate(&self) -> Result<(), TransformError> {
        if self.name.trim().is_empty() {
            return Err(TransformError::InvalidProfile(
                "profile name is empty".to_string(),
            ));
        }
        if !is_plain_file_name(&self.name) {
            return Err(TransformError::InvalidProfile(format!(
                "profile name '{}' must be a plain file name",
                self.name
            )));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(TransformError::InvalidProfile(format!(
                "profile '{}' has scale {}, expected a positive number",
                self.name, self.scale
            )));
        }
        if self.quality.is_nan() {
            return Err(TransformError::InvalidProfile(format!(
                "profile '{}' has no quality value",
                self.name
            )));
        }
        Ok(())
    }

    /// Encoder quality in [0, 100]
    ///
    /// Out-of-range values are clamped; NaN is rejected.
    pub fn jpeg_quality(&self) -> Result<u8, TransformError> {
        if self.quality.is_nan() {
            return Err(TransformError::InvalidProfile(format!(
                "profile '{}' has no quality value",
                self.name
            )));
        }
        let mapped = (self.quality.clamp(0.0, 1.0) * 100.0).round();
        Ok((mapped as u8).clamp(quality::MIN, quality::MAX))
    }

    /// Output size for a source of the given size
    pub fn target_dimensions(&self, width: u32, height: u32) -> Result<(u32, u32), TransformError> {
        self.validate()?;

        let scaled = |dimension: u32| (dimension as f64 * self.scale).round();
        let (target_width, target_height) = (scaled(width), scaled(height));

        if target_width < 1.0
            || target_height < 1.0
            || target_width * target_height > constants::MAX_OUTPUT_PIXELS as f64
        {
            return Err(TransformError::InvalidDimensions {
                width: target_width.clamp(0.0, u32::MAX as f64) as u32,
                height: target_height.clamp(0.0, u32::MAX as f64) as u32,
            });
        }

        Ok((target_width as u32, target_height as u32))
    }

    /// File name with the JPEG suffix forced on
    pub fn file_name(&self) -> String {
        let suffix = format!(".{}", constants::JPEG_EXTENSION);
        if self.name.to_ascii_lowercase().ends_with(&suffix) {
            self.name.clone()
        } else {
            format!("{}{}", self.name, suffix)
        }
    }
}

/// A single normal path component without separators
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Ordered collection of profiles without duplicates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<OutputProfile>", into = "Vec<OutputProfile>")]
pub struct OutputProfileSet {
    profiles: Vec<OutputProfile>,
}

impl OutputProfileSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a list, dropping repeated profiles
    pub fn from_profiles(profiles: impl IntoIterator<Item = OutputProfile>) -> Self {
        let mut set = Self::new();
        for profile in profiles {
            set.add(profile);
        }
        set
    }

    /// Profile at `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<&OutputProfile> {
        self.profiles.get(index)
    }

    /// Mutable profile at `index`
    pub fn get_mut(&mut self, index: usize) -> Option<&mut OutputProfile> {
        self.profiles.get_mut(index)
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Remove every profile
    pub fn clear(&mut self) {
        self.profiles.clear();
    }

    /// Append a profile unless an equal one is already present
    ///
    /// Returns `true` when the profile was added.
    pub fn add(&mut self, profile: OutputProfile) -> bool {
        if self.profiles.contains(&profile) {
            return false;
        }
        self.profiles.push(profile);
        true
    }

    /// Profiles in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, OutputProfile> {
        self.profiles.iter()
    }
}

impl From<Vec<OutputProfile>> for OutputProfileSet {
    fn from(profiles: Vec<OutputProfile>) -> Self {
        Self::from_profiles(profiles)
    }
}

impl From<OutputProfileSet> for Vec<OutputProfile> {
    fn from(set: OutputProfileSet) -> Self {
        set.profiles
    }
}

impl FromIterator<OutputProfile> for OutputProfileSet {
    fn from_iter<I: IntoIterator<Item = OutputProfile>>(iter: I) -> Self {
        Self::from_profiles(iter)
    }
}

impl<'a> IntoIterator for &'a OutputProfileSet {
    type Item = &'a OutputProfile;
    type IntoIter = std::slice::Iter<'a, OutputProfile>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Profiles used when no configuration is supplied: a quarter-size thumbnail
/// in the cache and a full-size copy in private storage
pub fn default_profiles() -> Vec<OutputProfile> {
    use constants::profiles::*;
    vec![
        OutputProfile::new(THUMB_NAME, Destination::Cache, THUMB_SCALE, THUMB_QUALITY),
        OutputProfile::new(FULL_NAME, Destination::Private, FULL_SCALE, FULL_QUALITY),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_from_name() {
        assert_eq!(Destination::from_name("PRIVATE"), Destination::Private);
        assert_eq!(Destination::from_name("public"), Destination::Public);
        assert_eq!(Destination::from_name("Cache"), Destination::Cache);
        // Unknown text falls back to the cache
        assert_eq!(Destination::from_name("sdcard"), Destination::Cache);
    }

    #[test]
    fn test_quality_mapping() {
        let mut profile = OutputProfile::named("q");
        profile.quality = 0.5;
        assert_eq!(profile.jpeg_quality(), Ok(50));
        profile.quality = 1.0;
        assert_eq!(profile.jpeg_quality(), Ok(100));
        profile.quality = 0.0;
        assert_eq!(profile.jpeg_quality(), Ok(0));
    }

    #[test]
    fn test_quality_clamped() {
        let mut profile = OutputProfile::named("q");
        profile.quality = 1.7;
        assert_eq!(profile.jpeg_quality(), Ok(100));
        profile.quality = -0.3;
        assert_eq!(profile.jpeg_quality(), Ok(0));
        profile.quality = f64::NAN;
        assert!(profile.jpeg_quality().is_err());
    }

    #[test]
    fn test_target_dimensions() {
        let profile = OutputProfile::new("t", Destination::Cache, 0.25, 0.5);
        assert_eq!(profile.target_dimensions(640, 480), Ok((160, 120)));

        let identity = OutputProfile::named("full");
        assert_eq!(identity.target_dimensions(640, 480), Ok((640, 480)));

        // Rounds to nearest rather than truncating
        let odd = OutputProfile::new("odd", Destination::Cache, 0.5, 1.0);
        assert_eq!(odd.target_dimensions(5, 3), Ok((3, 2)));
    }

    #[test]
    fn test_target_dimensions_rejects_bad_scale() {
        let zero = OutputProfile::new("z", Destination::Cache, 0.0, 1.0);
        assert!(matches!(
            zero.target_dimensions(10, 10),
            Err(TransformError::InvalidProfile(_))
        ));

        let tiny = OutputProfile::new("tiny", Destination::Cache, 0.01, 1.0);
        assert_eq!(
            tiny.target_dimensions(10, 10),
            Err(TransformError::InvalidDimensions {
                width: 0,
                height: 0
            })
        );
    }

    #[test]
    fn test_target_dimensions_capped() {
        let huge = OutputProfile::new("huge", Destination::Cache, 100_000.0, 1.0);
        assert_eq!(
            huge.target_dimensions(640, 480),
            Err(TransformError::InvalidDimensions {
                width: 64_000_000,
                height: 48_000_000
            })
        );

        // 10000x10000 is exactly at the limit
        let edge = OutputProfile::new("edge", Destination::Cache, 10.0, 1.0);
        assert_eq!(edge.target_dimensions(1000, 1000), Ok((10_000, 10_000)));
        assert!(edge.target_dimensions(1001, 1000).is_err());
    }

    #[test]
    fn test_name_must_be_plain_file_name() {
        for name in ["/abs/x", "../x", "a/b", "a\\b", "..", "."] {
            assert!(
                matches!(
                    OutputProfile::named(name).validate(),
                    Err(TransformError::InvalidProfile(_))
                ),
                "{name} accepted"
            );
        }
        assert!(OutputProfile::named("shot.v2.jpg").validate().is_ok());
        assert!(OutputProfile::named("..hidden").validate().is_ok());
    }

    #[test]
    fn test_file_name_suffix() {
        assert_eq!(OutputProfile::named("thumb").file_name(), "thumb.jpg");
        assert_eq!(OutputProfile::named("full.jpg").file_name(), "full.jpg");
        assert_eq!(OutputProfile::named("FULL.JPG").file_name(), "FULL.JPG");
        assert_eq!(OutputProfile::named("a.jpg.bak").file_name(), "a.jpg.bak.jpg");
    }

    #[test]
    fn test_set_drops_duplicates() {
        let a = OutputProfile::named("a");
        let b = OutputProfile::named("b");
        let mut set = OutputProfileSet::from_profiles([a.clone(), b.clone(), a.clone()]);
        assert_eq!(set.len(), 2);
        assert!(!set.add(b));
        assert!(set.add(OutputProfile::named("c")));
        assert_eq!(set.get(2).map(|p| p.name()), Some("c"));
        assert!(set.get(3).is_none());

        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn test_set_preserves_order() {
        let set: OutputProfileSet = ["c", "a", "b"]
            .into_iter()
            .map(OutputProfile::named)
            .collect();
        let names: Vec<_> = set.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn test_profile_json_defaults() {
        let profile: OutputProfile =
            serde_json::from_str(r#"{"name":"x","destination":"PUBLIC"}"#).unwrap();
        assert_eq!(profile.name(), "x");
        assert_eq!(profile.destination, Destination::Public);
        assert_eq!(profile.rotation, RotationPolicy::Automatic);
        assert_eq!(profile.scale, 1.0);
        assert_eq!(profile.quality, 1.0);
    }
}
