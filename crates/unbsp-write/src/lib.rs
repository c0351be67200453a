// lib.rs — multi-dialect map text serialization.
//
// Each dialect module owns one grammar. The shapes are inherited contracts:
// editors parse them with hand-written scanners, so structure (indentation,
// quoting, per-side line layout) is reproduced exactly, not redesigned.

pub mod doomedit;
pub mod fire;
pub mod gearcraft;
pub mod moh;
pub mod radiant;
pub mod vmf;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use unbsp_bsp::format::{BspFamily, BspVariant};
use unbsp_common::map::MapDocument;
use unbsp_common::math::Vec3;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("input path has no file stem: {0}")]
    BadInputPath(PathBuf),
}

pub type Result<T> = std::result::Result<T, WriteError>;

/// One target text grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Vmf,
    Gearcraft,
    Radiant,
    MohRadiant,
    DoomEdit,
}

impl Dialect {
    pub fn extension(self) -> &'static str {
        match self {
            Dialect::Vmf => "vmf",
            _ => "map",
        }
    }

    /// Filename suffix used to disambiguate outputs when several dialects
    /// are emitted from one run.
    pub fn suffix(self) -> &'static str {
        match self {
            Dialect::Vmf => "_hammer",
            Dialect::Gearcraft => "_gearcraft",
            Dialect::Radiant => "_radiant",
            Dialect::MohRadiant => "_moh",
            Dialect::DoomEdit => "_doomedit",
        }
    }

    /// The one dialect "auto" mode picks for a detected variant.
    pub fn auto_for(variant: BspVariant) -> Dialect {
        if variant.is_nightfire() {
            Dialect::Gearcraft
        } else if variant.is_moh() {
            Dialect::MohRadiant
        } else if variant.family() == BspFamily::Source {
            Dialect::Vmf
        } else {
            Dialect::Radiant
        }
    }
}

/// Writer-side settings: which grammars to emit and where.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub dialects: Vec<Dialect>,
    /// Output directory; the input file's directory when absent.
    pub output_dir: Option<PathBuf>,
    /// Run per-dialect entity post-processing (legacy fire remapping).
    pub entity_correction: bool,
}

/// Serialize one document into one dialect's grammar. The document is
/// cloned first when post-processing applies, so a caller emitting several
/// dialects never sees one grammar's rewrites leak into another.
pub fn serialize(doc: &MapDocument, dialect: Dialect, entity_correction: bool) -> String {
    match dialect {
        Dialect::Vmf => {
            let mut copy = doc.clone();
            if entity_correction {
                fire::correct_entities(&mut copy);
            }
            vmf::serialize(&copy)
        }
        Dialect::Gearcraft => gearcraft::serialize(doc),
        Dialect::Radiant => radiant::serialize(doc),
        Dialect::MohRadiant => moh::serialize(doc),
        Dialect::DoomEdit => doomedit::serialize(doc),
    }
}

/// Write every requested dialect next to the input (or into the override
/// directory) and return the paths written.
pub fn write_all(doc: &MapDocument, input: &Path, options: &WriteOptions) -> Result<Vec<PathBuf>> {
    let stem = input
        .file_stem()
        .ok_or_else(|| WriteError::BadInputPath(input.to_path_buf()))?;
    let dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => input.parent().unwrap_or(Path::new(".")).to_path_buf(),
    };
    let multi = options.dialects.len() > 1;

    let mut written = Vec::with_capacity(options.dialects.len());
    for &dialect in &options.dialects {
        let suffix = if multi { dialect.suffix() } else { "" };
        let mut name = stem.to_os_string();
        name.push(suffix);
        let path = dir.join(name).with_extension(dialect.extension());

        let text = serialize(doc, dialect, options.entity_correction);
        std::fs::write(&path, text).map_err(|source| WriteError::Io {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), ?dialect, "wrote map");
        written.push(path);
    }
    Ok(written)
}

/// Shortest-form float used by every dialect: integral values print with no
/// fraction, which is what the historical editors emit.
pub(crate) fn num(value: f32) -> String {
    format!("{}", value)
}

pub(crate) fn point(p: Vec3) -> String {
    format!("( {} {} {} )", num(p.x), num(p.y), num(p.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_dialect_per_family() {
        assert_eq!(Dialect::auto_for(BspVariant::Source20), Dialect::Vmf);
        assert_eq!(Dialect::auto_for(BspVariant::Nightfire), Dialect::Gearcraft);
        assert_eq!(Dialect::auto_for(BspVariant::Mohaa), Dialect::MohRadiant);
        assert_eq!(Dialect::auto_for(BspVariant::Quake3), Dialect::Radiant);
        assert_eq!(Dialect::auto_for(BspVariant::Quake), Dialect::Radiant);
    }

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(64.0), "64");
        assert_eq!(num(-0.5), "-0.5");
        assert_eq!(num(1.25), "1.25");
    }
}
