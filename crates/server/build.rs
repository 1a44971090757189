//! Zips `assets-src/` into `$OUT_DIR/assets.zip` at build time. The archive
//! is embedded via `include_bytes!` in `src/archive.rs` and never touches
//! disk again at runtime.

use std::{env, fs, io::Write as _, path::Path};

fn main() {
    let assets_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets-src");
    println!("cargo:rerun-if-changed={}", assets_dir.display());

    let out_dir = env::var("OUT_DIR").unwrap_or_else(|e| panic!("OUT_DIR not set: {e}"));
    let zip_path = Path::new(&out_dir).join("assets.zip");
    let file = fs::File::create(&zip_path).unwrap_or_else(|e| panic!("create {}: {e}", zip_path.display()));
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut entries: Vec<_> = fs::read_dir(&assets_dir)
        .unwrap_or_else(|e| panic!("read {}: {e}", assets_dir.display()))
        .filter_map(Result::ok)
        .collect();
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().into_string().unwrap_or_else(|n| panic!("non-utf8 asset filename: {n:?}"));
        writer.start_file(name, options).unwrap_or_else(|e| panic!("start zip entry: {e}"));
        let bytes = fs::read(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
        writer.write_all(&bytes).unwrap_or_else(|e| panic!("write zip entry: {e}"));
    }

    writer.finish().unwrap_or_else(|e| panic!("finish assets.zip: {e}"));
}
