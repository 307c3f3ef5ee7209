//! Minimal CLI: walk configured headers → bindings schema document
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::assemble;
use crate::config::Config;
use crate::diag;
use crate::filter::InclusionFilter;
use crate::frontend::{DeclSource, DumpedAstSource};
use crate::materialize;
use crate::walker::ExtractPass;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// extract the configured binding surface from C++ declaration dumps and emit
/// the op_structs/op_enums schema document
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// walk every configured header and write the bindings document
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// root of the C++ client source tree (configured header paths are
    /// relative to this)
    #[arg(long)]
    source_root: PathBuf,

    /// directory of per-header declaration-tree dumps
    /// (`<header path>.json`, produced by the external front-end)
    #[arg(long)]
    ast_root: PathBuf,

    /// extraction config (JSON); built-in configuration if omitted
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let document = target.input_settings.extract()?;
                let document_src = document.to_json_string()?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)
                            .with_context(|| format!("creating {}", parent.display()))?;
                    }
                    std::fs::write(out, &document_src)
                        .with_context(|| format!("writing {}", out.display()))?;
                } else {
                    println!("{document_src}");
                }
                Ok(())
            }
        }
    }
}

impl InputSettings {
    /// Everything up to the first header is fatal; per-file trouble degrades.
    fn extract(&self) -> anyhow::Result<assemble::SchemaDocument> {
        let config = match self.config.as_ref() {
            Some(path) => Config::load(path)?,
            None => Config::builtin(),
        };
        let filter = InclusionFilter::new(&config.allow_patterns)?;
        let files = config.expand_files(&self.source_root)?;
        let source = DumpedAstSource::new(self.ast_root.clone(), self.source_root.clone())?;

        let mut pass = ExtractPass::new();
        for file in &files {
            let origin = origin_name(file, &self.source_root);
            diag::info(format!("processing {origin}"));
            let parsed = match source.load(file) {
                Ok(p) => p,
                Err(err) => {
                    // the front-end produced nothing for this header; the
                    // rest of the run is unaffected
                    diag::warn(err.to_string());
                    continue;
                }
            };
            for message in &parsed.diagnostics {
                diag::warn(format!("{origin}: {message}"));
            }
            pass.walk_file(&filter, &parsed.root, &origin);
            materialize::run(&mut pass, &config.template_specs);
        }

        Ok(assemble::assemble(pass))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Header path as the front-end stamps it on declarations: relative to the
/// source root.
fn origin_name(file: &Path, source_root: &Path) -> String {
    file.strip_prefix(source_root)
        .unwrap_or(file)
        .to_string_lossy()
        .into_owned()
}
