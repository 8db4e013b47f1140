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

//! # INI Reader
//!
//! A small INI dialect: `;` starts a comment anywhere on a line, `[block]`
//! lines open a block, and every other non-empty line is `key = value` with
//! surrounding whitespace trimmed. Blocks are reported but keys are looked up
//! without them, so a file reads the same whether or not it uses blocks.

use crate::error::{IniError, LoadError};
use isoworld_core::math::Vec3;
use std::str::FromStr;

/// Calls `callback(block, key, value)` for every assignment in order.
pub fn parse_ini<F>(text: &str, mut callback: F) -> Result<(), IniError>
where
    F: FnMut(&str, &str, &str),
{
    let mut block = String::new();
    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.split(';').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or(IniError::UnterminatedBlock { line: index + 1 })?;
            block = name.trim().to_string();
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or(IniError::MissingEquals { line: index + 1 })?;
        callback(&block, key.trim(), value.trim());
    }
    Ok(())
}

/// Parses a comma-separated list, ignoring empty items.
pub fn parse_list<T: FromStr>(key: &str, value: &str) -> Result<Vec<T>, LoadError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse().map_err(|_| LoadError::InvalidValue {
                key: key.to_string(),
                value: item.to_string(),
            })
        })
        .collect()
}

/// Parses a comma-separated list of floats.
pub fn parse_float_list(key: &str, value: &str) -> Result<Vec<f32>, LoadError> {
    parse_list(key, value)
}

/// Parses a comma-separated list of integers.
pub fn parse_int_list(key: &str, value: &str) -> Result<Vec<i64>, LoadError> {
    parse_list(key, value)
}

/// All assignments of an INI text, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniDocument {
    entries: Vec<(String, String, String)>,
}

impl IniDocument {
    /// Parses INI text.
    pub fn parse(text: &str) -> Result<Self, IniError> {
        let mut entries = Vec::new();
        parse_ini(text, |block, key, value| {
            entries.push((block.to_string(), key.to_string(), value.to_string()));
        })?;
        Ok(Self { entries })
    }

    /// The last value assigned to `key` in any block.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(_, k, _)| k == key)
            .map(|(_, _, v)| v.as_str())
    }

    /// The value of a key that must exist.
    pub fn require(&self, key: &str) -> Result<&str, LoadError> {
        self.get(key).ok_or_else(|| LoadError::MissingKey(key.to_string()))
    }

    /// Parses a required scalar.
    pub fn parse_value<T: FromStr>(&self, key: &str) -> Result<T, LoadError> {
        let value = self.require(key)?;
        value.parse().map_err(|_| LoadError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// Parses a required `x, y, z` triple.
    pub fn parse_vec3(&self, key: &str) -> Result<Vec3, LoadError> {
        let values = parse_float_list(key, self.require(key)?)?;
        match values.as_slice() {
            [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
            _ => Err(LoadError::MalformedList {
                key: key.to_string(),
                count: values.len(),
            }),
        }
    }

    /// Iterates over `(block, key, value)` triples.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.entries
            .iter()
            .map(|(b, k, v)| (b.as_str(), k.as_str(), v.as_str()))
    }
}

fn split_tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c| c == '=' || c == ',').map(str::trim)
}

/// Compares two INI texts line by line, allowing numeric tokens to differ by
/// up to `tolerance` while every other token must match exactly.
pub fn ini_text_matches(a: &str, b: &str, tolerance: f64) -> bool {
    let lines_a: Vec<&str> = a.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let lines_b: Vec<&str> = b.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines_a.len() != lines_b.len() {
        return false;
    }
    lines_a.iter().zip(&lines_b).all(|(line_a, line_b)| {
        let tokens_a: Vec<&str> = split_tokens(line_a).collect();
        let tokens_b: Vec<&str> = split_tokens(line_b).collect();
        tokens_a.len() == tokens_b.len()
            && tokens_a.iter().zip(&tokens_b).all(|(ta, tb)| {
                match (ta.parse::<f64>(), tb.parse::<f64>()) {
                    (Ok(x), Ok(y)) => (x - y).abs() <= tolerance,
                    _ => ta == tb,
                }
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ini_blocks_comments_and_whitespace() {
        let text = "; header comment\n[Sprite]\n  CenterX = 12 ; trailing\n\nName=tree\n[Other]\nKey =  a b \n";
        let mut seen = Vec::new();
        parse_ini(text, |block, key, value| {
            seen.push((block.to_string(), key.to_string(), value.to_string()));
        })
        .expect("valid ini");
        assert_eq!(
            seen,
            vec![
                ("Sprite".into(), "CenterX".into(), "12".into()),
                ("Sprite".into(), "Name".into(), "tree".into()),
                ("Other".into(), "Key".into(), "a b".into()),
            ]
        );
    }

    #[test]
    fn test_parse_ini_errors() {
        assert_eq!(
            parse_ini("a=1\nnot an assignment", |_, _, _| {}),
            Err(IniError::MissingEquals { line: 2 })
        );
        assert_eq!(
            parse_ini("[open", |_, _, _| {}),
            Err(IniError::UnterminatedBlock { line: 1 })
        );
    }

    #[test]
    fn test_document_lookup() {
        let doc = IniDocument::parse("MinBound = -1, 0, 2.5\nFrameRows=4\nBad=x").expect("valid ini");
        assert_eq!(doc.parse_value::<u32>("FrameRows").expect("int"), 4);
        assert_eq!(doc.parse_vec3("MinBound").expect("vec3"), Vec3::new(-1.0, 0.0, 2.5));
        assert!(matches!(doc.require("Missing"), Err(LoadError::MissingKey(_))));
        assert!(matches!(
            doc.parse_value::<u32>("Bad"),
            Err(LoadError::InvalidValue { .. })
        ));
        assert!(matches!(
            doc.parse_vec3("FrameRows"),
            Err(LoadError::MalformedList { count: 1, .. })
        ));
    }

    #[test]
    fn test_lists() {
        assert_eq!(parse_float_list("P", "1, 2.5,-3,").expect("floats"), vec![1.0, 2.5, -3.0]);
        assert_eq!(parse_int_list("T", " 0,1 ,2").expect("ints"), vec![0, 1, 2]);
        assert!(parse_int_list("T", "0,x").is_err());
        assert!(parse_float_list("P", "").expect("empty").is_empty());
    }

    #[test]
    fn test_ini_text_matches_tolerance() {
        let a = "CenterX=10\nMinBound=0.5,1,-0.25\n; comment\n";
        assert!(ini_text_matches(a, "CenterX=10\nMinBound=0.50001,1,-0.25\n; comment", 0.00002));
        assert!(!ini_text_matches(a, "CenterX=10\nMinBound=0.5001,1,-0.25\n; comment", 0.00002));
        assert!(!ini_text_matches(a, "CenterY=10\nMinBound=0.5,1,-0.25\n; comment", 0.00002));
        assert!(!ini_text_matches(a, "CenterX=10\n", 0.00002));
    }
}
