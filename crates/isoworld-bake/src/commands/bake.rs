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

use anyhow::{Context, Result};
use isoworld_io::obj::load_obj_mesh;
use isoworld_io::{generate_sprite_from_model, load_ortho_config, BakeOutcome};
use std::path::Path;

/// Bakes one model and reports which files changed.
pub fn run(
    obj: &Path,
    shadow: Option<&Path>,
    ortho: &Path,
    angles: usize,
    out: &Path,
    debug: bool,
) -> Result<()> {
    let ortho = load_ortho_config(ortho)
        .with_context(|| format!("Failed to load projection config {}", ortho.display()))?;
    let visible =
        load_obj_mesh(obj).with_context(|| format!("Failed to load mesh {}", obj.display()))?;
    let shadow = shadow
        .map(|path| {
            load_obj_mesh(path)
                .with_context(|| format!("Failed to load shadow mesh {}", path.display()))
        })
        .transpose()?;

    let outcome = generate_sprite_from_model(&visible, shadow.as_ref(), &ortho, out, angles, debug)
        .with_context(|| format!("Failed to bake {}", out.display()))?;
    match outcome {
        BakeOutcome::Baked(report) => {
            println!(
                "{}: {} ({}), {} ({})",
                out.display(),
                report.png_path.display(),
                if report.png_written { "written" } else { "unchanged" },
                report.ini_path.display(),
                if report.ini_written { "written" } else { "unchanged" },
            );
        }
        BakeOutcome::Skipped(reason) => {
            println!("{}: skipped, {reason}", out.display());
        }
    }
    Ok(())
}
