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

//! Error types for loading and baking.

use isoworld_core::ortho::OrthoError;
use std::path::PathBuf;
use thiserror::Error;

/// A syntax error in INI text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IniError {
    /// A `[block]` header without its closing bracket.
    #[error("Line {line}: unterminated block header")]
    UnterminatedBlock {
        /// One-based line number.
        line: usize,
    },

    /// A line that is neither a comment, a header nor an assignment.
    #[error("Line {line}: expected `key = value`")]
    MissingEquals {
        /// One-based line number.
        line: usize,
    },
}

/// Failure to load a configuration, atlas or mesh.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading a file failed.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The INI text is malformed.
    #[error("Invalid INI: {0}")]
    Ini(#[from] IniError),

    /// A required key is absent.
    #[error("Missing key `{0}`")]
    MissingKey(String),

    /// A value could not be parsed.
    #[error("Invalid value `{value}` for key `{key}`")]
    InvalidValue {
        /// The key holding the value.
        key: String,
        /// The raw value.
        value: String,
    },

    /// A coordinate or index list has a count that is not a multiple of three,
    /// or references points that do not exist.
    #[error("Malformed list `{key}` with {count} elements")]
    MalformedList {
        /// The key holding the list.
        key: String,
        /// The number of elements found.
        count: usize,
    },

    /// The atlas dimensions do not match the declared frame layout.
    #[error("Atlas of {width}x{height} pixels cannot hold {rows} rows of {columns} columns")]
    AtlasLayout {
        /// Atlas width.
        width: u32,
        /// Atlas height.
        height: u32,
        /// Declared frame rows.
        rows: u32,
        /// Declared property columns.
        columns: u32,
    },

    /// Decoding an image failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Parsing an OBJ file failed.
    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),

    /// Projection parameters are invalid.
    #[error("Projection error: {0}")]
    Ortho(#[from] OrthoError),
}

/// Failure to write baked sprite files.
#[derive(Debug, Error)]
pub enum BakeError {
    /// Writing or creating a file failed.
    #[error("Failed to write {path}: {source}")]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// Encoding the atlas failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
