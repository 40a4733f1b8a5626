//! Locating, building and loading the external COBOL tree-sitter grammar.
//!
//! The grammar is not linked into this crate. It is a shared library built
//! from a tree-sitter grammar checkout (`src/parser.c` plus an optional
//! external scanner) that exports a `tree_sitter_<lang>` constructor.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use libloading::{Library, Symbol};
use tracing::{debug, info, warn};
use tree_sitter::Language;

use crate::config::GrammarConfig;

pub struct Grammar {
    language: Language,
    path: PathBuf,
    // Keeps the code behind `language` mapped.
    _library: Library,
}

impl Grammar {
    pub fn load(path: &Path, symbol: &str) -> Result<Self> {
        // SAFETY: the library is a tree-sitter grammar; its initialisers do
        // nothing beyond static data setup.
        let library = unsafe { Library::new(path) }
            .with_context(|| format!("opening grammar library {}", path.display()))?;

        // SAFETY: tree-sitter grammars export `const TSLanguage *tree_sitter_x(void)`,
        // which `Language` wraps transparently.
        let language = unsafe {
            let constructor: Symbol<unsafe extern "C" fn() -> Language> = library
                .get(symbol.as_bytes())
                .with_context(|| format!("{} does not export `{symbol}`", path.display()))?;
            constructor()
        };

        let version = language.version();
        if !(tree_sitter::MIN_COMPATIBLE_LANGUAGE_VERSION..=tree_sitter::LANGUAGE_VERSION)
            .contains(&version)
        {
            bail!(
                "grammar {} has ABI version {version}, supported range is {}..={}",
                path.display(),
                tree_sitter::MIN_COMPATIBLE_LANGUAGE_VERSION,
                tree_sitter::LANGUAGE_VERSION
            );
        }

        debug!(path = %path.display(), version, "loaded COBOL grammar");
        Ok(Self {
            language,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// File names probed inside the build directory, most specific first.
pub fn library_names() -> Vec<String> {
    let ext = std::env::consts::DLL_EXTENSION;
    vec![format!("libtree-sitter-cobol.{ext}"), format!("cobol.{ext}")]
}

pub fn locate(config: &GrammarConfig) -> Option<PathBuf> {
    if let Some(explicit) = &config.library {
        if explicit.is_file() {
            return Some(explicit.clone());
        }
        warn!(path = %explicit.display(), "configured grammar library not found");
    }

    library_names()
        .into_iter()
        .map(|name| config.build_dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Resolve a usable grammar artifact: whatever [`locate`] finds, otherwise a
/// fresh build from the configured grammar sources.
pub fn ensure(config: &GrammarConfig) -> Result<Option<PathBuf>> {
    if let Some(found) = locate(config) {
        return Ok(Some(found));
    }
    match &config.source_dir {
        Some(src_dir) => {
            let out = config.build_dir.join(&library_names()[0]);
            build(src_dir, &out).map(Some)
        }
        None => Ok(None),
    }
}

/// Compile a grammar checkout into a shared library at `out`.
///
/// Skipped when `out` is newer than every source file.
pub fn build(src_dir: &Path, out: &Path) -> Result<PathBuf> {
    let src = src_dir.join("src");
    let parser_c = src.join("parser.c");
    if !parser_c.is_file() {
        bail!(
            "{} is not a tree-sitter grammar checkout (missing src/parser.c)",
            src_dir.display()
        );
    }

    let mut sources = vec![parser_c];
    let scanner_c = src.join("scanner.c");
    let scanner_cc = src.join("scanner.cc");
    let cpp = !scanner_c.is_file() && scanner_cc.is_file();
    if scanner_c.is_file() {
        sources.push(scanner_c);
    } else if cpp {
        sources.push(scanner_cc);
    }

    if is_up_to_date(out, &sources)? {
        debug!(out = %out.display(), "grammar artifact is up to date");
        return Ok(out.to_path_buf());
    }

    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let compiler = if cpp {
        std::env::var("CXX").unwrap_or_else(|_| "c++".to_string())
    } else {
        std::env::var("CC").unwrap_or_else(|_| "cc".to_string())
    };

    let mut cmd = Command::new(&compiler);
    cmd.args(["-shared", "-fPIC", "-O2", "-w"]).arg("-I").arg(&src);
    for source in &sources {
        let lang = match source.extension().and_then(|e| e.to_str()) {
            Some("cc") => "c++",
            _ => "c",
        };
        cmd.arg("-x").arg(lang).arg(source);
    }
    cmd.arg("-o").arg(out);

    info!(compiler = %compiler, out = %out.display(), "building COBOL grammar");
    let output = cmd
        .output()
        .with_context(|| format!("running compiler `{compiler}`"))?;
    if !output.status.success() {
        bail!(
            "grammar build failed ({}):\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(out.to_path_buf())
}

fn is_up_to_date(out: &Path, sources: &[PathBuf]) -> Result<bool> {
    let Ok(meta) = std::fs::metadata(out) else {
        return Ok(false);
    };
    let built = meta.modified()?;
    for source in sources {
        let modified: SystemTime = std::fs::metadata(source)
            .and_then(|m| m.modified())
            .with_context(|| format!("reading {}", source.display()))?;
        if modified > built {
            return Ok(false);
        }
    }
    Ok(true)
}
