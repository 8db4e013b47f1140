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

//! Isoworld Bake - renders meshes into sprite atlases and previews them.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Sprite baker for isometric worlds
#[derive(Parser)]
#[command(name = "isoworld-bake")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake an OBJ model into `<out>.png` and `<out>.ini`
    Bake {
        /// Visible mesh
        #[arg(long)]
        obj: PathBuf,

        /// Optional low-detail shadow mesh
        #[arg(long)]
        shadow: Option<PathBuf>,

        /// Projection config with DownTiltPerThousand and PixelsPerTile
        #[arg(long)]
        ortho: PathBuf,

        /// Number of camera angles, from 1 to 8
        #[arg(long, default_value = "8")]
        angles: usize,

        /// Output path without extension
        #[arg(long)]
        out: PathBuf,

        /// Also write the uncropped renders
        #[arg(long)]
        debug: bool,
    },

    /// Render a baked sprite once per angle into a PNG strip
    Preview {
        /// Atlas path without extension
        #[arg(long)]
        sprite: PathBuf,

        /// Projection config
        #[arg(long)]
        ortho: PathBuf,

        /// Output PNG
        #[arg(long)]
        out: PathBuf,

        /// Side length of each rendered angle in pixels
        #[arg(long, default_value = "256")]
        size: u32,
    },
}

fn main() -> anyhow::Result<()> {
    use env_logger::{Builder, Env};

    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Commands::Bake {
            obj,
            shadow,
            ortho,
            angles,
            out,
            debug,
        } => commands::bake::run(&obj, shadow.as_deref(), &ortho, angles, &out, debug),
        Commands::Preview {
            sprite,
            ortho,
            out,
            size,
        } => commands::preview::run(&sprite, &ortho, &out, size),
    }
}
