//! Run configuration
//!
//! A TOML file names the exception tables and mapping files and sets the
//! classifier and sweep options. Every section is optional; relative paths
//! resolve against the directory of the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::codec::CodecSet;
use crate::exceptions::ExceptionTables;
use crate::kubun::ClassifierOptions;
use crate::sweep::SweepOptions;
use crate::tables::{read_text, MappingTable};
use crate::{Encoding, Error, Result};

/// Exception table files
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TablePaths {
    /// Variant table
    pub variants: Option<PathBuf>,
    /// Kanji usage level table
    pub kanji: Option<PathBuf>,
}

/// Mapping files of the table-driven codecs
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingPaths {
    /// Shift_JIS-2004 table in x0213.org format
    pub shift_jis_2004: Option<PathBuf>,
    /// IBM-942 `.ucm`
    pub ibm_942: Option<PathBuf>,
    /// IBM-943 `.ucm`
    pub ibm_943: Option<PathBuf>,
    /// IBM-930 `.ucm`
    pub ibm_930: Option<PathBuf>,
    /// IBM-939 `.ucm`
    pub ibm_939: Option<PathBuf>,
}

impl MappingPaths {
    fn code_pages(&self) -> [(Encoding, Option<&PathBuf>); 4] {
        [
            (Encoding::IBM_942, self.ibm_942.as_ref()),
            (Encoding::IBM_943, self.ibm_943.as_ref()),
            (Encoding::IBM_930, self.ibm_930.as_ref()),
            (Encoding::IBM_939, self.ibm_939.as_ref()),
        ]
    }
}

/// Everything a run needs besides the command
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Exception tables
    pub tables: TablePaths,
    /// Codec mapping files
    pub mappings: MappingPaths,
    /// Classifier settings
    pub classifier: ClassifierOptions,
    /// Sweep settings
    pub sweep: SweepOptions,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl Config {
    /// Parse a configuration; relative paths stay relative to the working
    /// directory
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_toml(&read_text(path)?)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolve a configured path against the configuration's directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Load the exception tables; missing entries give empty tables
    pub fn exception_tables(&self) -> Result<ExceptionTables> {
        let variants = self.tables.variants.as_deref().map(|p| self.resolve(p));
        let kanji = self.tables.kanji.as_deref().map(|p| self.resolve(p));
        ExceptionTables::load(variants.as_deref(), kanji.as_deref())
    }

    /// Build the codec set, loading every configured mapping file
    pub fn codecs(&self) -> Result<CodecSet> {
        let mut codecs = CodecSet::builtin();
        match &self.mappings.shift_jis_2004 {
            Some(path) => {
                let table = MappingTable::read_x0213(&self.resolve(path))?;
                codecs = codecs.with_table(Encoding::SHIFT_JIS_2004, table);
            }
            None => warn!("no Shift_JIS-2004 table configured, using the JIS X 0208 subset"),
        }
        for (encoding, path) in self.mappings.code_pages() {
            match path {
                Some(path) => {
                    let table = MappingTable::read_ucm(&self.resolve(path))?;
                    codecs = codecs.with_table(encoding, table);
                }
                None => debug!(%encoding, "code page not configured"),
            }
        }
        Ok(codecs)
    }
}
