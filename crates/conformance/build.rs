//! Generates Rust bindings for every spec under `specs/` into `OUT_DIR`.

use modgen_core::emit::Emitter;
use modgen_core::emit::rust::RustEmitter;
use modgen_core::ir::build_module;
use modgen_core::parser::parse_unit;
use modgen_core::resolver::resolve;
use std::env;
use std::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

const SPECS_DIR: &str = "specs";

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let specs_dir = manifest_dir.join(SPECS_DIR);
    println!("cargo:rerun-if-changed={}", specs_dir.display());

    let mut entries = fs::read_dir(&specs_dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    let mut units = Vec::new();
    for path in entries.iter().filter(|p| p.extension().is_some_and(|ext| ext == "ts")) {
        println!("cargo:rerun-if-changed={}", path.display());
        let source = fs::read_to_string(path)?;
        let id = format!(
            "{SPECS_DIR}/{}",
            path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        );
        let unit = parse_unit(&id, &source).map_err(|e| e.display_with_source(&source))?;
        units.push(unit);
    }

    let resolution = resolve(&units);
    if let Some((unit, err)) = resolution.errors.first() {
        return Err(format!("{unit}: {err}").into());
    }

    let mut bindings = String::new();
    for module in &resolution.modules {
        let ir = build_module(module).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        })?;
        for file in RustEmitter.emit_module(&ir)? {
            let path = out_dir.join(&file.path);
            fs::write(&path, &file.contents)?;
            let stem = file
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(
                bindings,
                "/// Bindings for the `{}` module declared in `{}`.\n#[path = {:?}]\npub mod {stem};",
                ir.name,
                ir.source,
                path.display().to_string()
            )?;
        }
    }
    fs::write(out_dir.join("bindings.rs"), bindings)?;
    Ok(())
}
