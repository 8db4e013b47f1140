// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Loading an [`OrthoSystem`] from an INI config.
//!
//! ```ini
//! DownTiltPerThousand = 500
//! PixelsPerTile = 32
//! ```
//!
//! The tilt is given in positive thousandths and negated, so 500 means a
//! camera tilt of -0.5.

use crate::error::LoadError;
use crate::ini::IniDocument;
use isoworld_core::ortho::OrthoSystem;
use std::path::Path;

/// Key holding the downward tilt in thousandths.
pub const DOWN_TILT_KEY: &str = "DownTiltPerThousand";

/// Key holding the tile size in pixels.
pub const PIXELS_PER_TILE_KEY: &str = "PixelsPerTile";

/// Builds a projection system from INI text.
pub fn ortho_from_ini(text: &str) -> Result<OrthoSystem, LoadError> {
    let doc = IniDocument::parse(text)?;
    let down_tilt: i64 = doc.parse_value(DOWN_TILT_KEY)?;
    let pixels_per_tile: f32 = doc.parse_value(PIXELS_PER_TILE_KEY)?;
    let camera_tilt = -(down_tilt as f64 / 1000.0) as f32;
    Ok(OrthoSystem::new(camera_tilt, pixels_per_tile)?)
}

/// Reads and parses a projection config file.
pub fn load_ortho_config(path: &Path) -> Result<OrthoSystem, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ortho = ortho_from_ini(&text)?;
    log::debug!(
        "Loaded ortho config {}: tilt {}, {} pixels per tile",
        path.display(),
        ortho.camera_tilt(),
        ortho.pixels_per_tile()
    );
    Ok(ortho)
}

/// Formats a projection system as INI text readable by [`ortho_from_ini`].
pub fn ortho_to_ini(ortho: &OrthoSystem) -> String {
    let down_tilt = (-ortho.camera_tilt() as f64 * 1000.0).round() as i64;
    format!(
        "{DOWN_TILT_KEY}={down_tilt}\n{PIXELS_PER_TILE_KEY}={}\n",
        ortho.pixels_per_tile()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ortho_from_ini() {
        let ortho = ortho_from_ini("; camera\nDownTiltPerThousand = 500\nPixelsPerTile = 32\n")
            .expect("valid config");
        assert_abs_diff_eq!(ortho.camera_tilt(), -0.5);
        assert_eq!(ortho.pixels_per_tile(), 32.0);
        let again = ortho_from_ini(&ortho_to_ini(&ortho)).expect("round trip");
        assert_eq!(again, ortho);
    }

    #[test]
    fn test_ortho_config_errors() {
        assert!(matches!(
            ortho_from_ini("PixelsPerTile=32"),
            Err(LoadError::MissingKey(key)) if key == DOWN_TILT_KEY
        ));
        assert!(matches!(
            ortho_from_ini("DownTiltPerThousand=0\nPixelsPerTile=32"),
            Err(LoadError::Ortho(_))
        ));
    }

    #[test]
    fn test_load_ortho_config_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("ortho.ini");
        std::fs::write(&path, "DownTiltPerThousand=1000\nPixelsPerTile=16").expect("write config");
        let ortho = load_ortho_config(&path).expect("load config");
        assert_abs_diff_eq!(ortho.camera_tilt(), -1.0);
        assert!(matches!(
            load_ortho_config(&dir.path().join("missing.ini")),
            Err(LoadError::Io { .. })
        ));
    }
}
