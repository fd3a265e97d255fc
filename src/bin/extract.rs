/// Extract files from an EDSK image, optionally stripping +3DOS headers
/// and writing JSON metadata sidecars
use std::path::PathBuf;
use std::process::ExitCode;

use plus3dsk::{filesystem, plus3dos, DskError, DskImage};
use serde::Serialize;

#[derive(Serialize)]
struct ExtentJson {
    extent: u16,
    rc: u8,
    blocks: Vec<u16>,
}

#[derive(Serialize)]
struct FileMetaJson {
    user: u8,
    name: String,
    ext: String,
    total_bytes_from_rc: usize,
    extents: Vec<ExtentJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    plus3_header: Option<plus3dos::Plus3DosMeta>,
    output_name: String,
    output_size: usize,
    header_kept: bool,
}

fn main() -> ExitCode {
    let mut keep_header = false;
    let mut write_meta = false;
    let mut positional = Vec::new();

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-keepheader" => keep_header = true,
            "-meta" => write_meta = true,
            other => positional.push(other.to_string()),
        }
    }

    let (image_path, output_folder) = match positional.as_slice() {
        [image, folder] => (image.clone(), PathBuf::from(folder)),
        _ => {
            eprintln!(
                "{}",
                DskError::usage("plus3dsk-extract [-keepheader] [-meta] <image.dsk> <output-folder>")
            );
            return ExitCode::from(2);
        }
    };

    let image = match DskImage::open(&image_path) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    let result = match filesystem::read(&image) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    if let Err(err) = std::fs::create_dir_all(&output_folder) {
        eprintln!("error: {err}");
        return ExitCode::from(1);
    }

    for (entry, bytes) in &result.files {
        let (body, header_meta, present) = plus3dos::peel(bytes);
        let header_kept = present && keep_header;
        let final_bytes = if present && !keep_header { body } else { bytes.clone() };

        let base = entry.name_str();
        let base = if base.is_empty() { "NONAME".to_string() } else { base };
        let ext = entry.ext_str();
        let output_name = if ext.is_empty() { base } else { format!("{base}.{ext}") };

        let output_path = output_folder.join(&output_name);
        if let Err(err) = std::fs::write(&output_path, &final_bytes) {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }

        if write_meta {
            let total_bytes_from_rc = entry.extents.iter().map(|e| e.rc as usize * 128).sum();
            let extents = entry
                .extents
                .iter()
                .map(|e| ExtentJson { extent: e.extent_number, rc: e.rc, blocks: e.blocks.clone() })
                .collect();

            let meta_json = FileMetaJson {
                user: entry.user,
                name: entry.name_str(),
                ext: entry.ext_str(),
                total_bytes_from_rc,
                extents,
                plus3_header: header_meta,
                output_name: output_name.clone(),
                output_size: final_bytes.len(),
                header_kept,
            };

            let json_path = output_folder.join(format!("{output_name}.json"));
            match serde_json::to_vec_pretty(&meta_json) {
                Ok(bytes) => {
                    if let Err(err) = std::fs::write(&json_path, bytes) {
                        eprintln!("error: {err}");
                        return ExitCode::from(1);
                    }
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    return ExitCode::from(1);
                }
            }
        }
    }

    ExitCode::SUCCESS
}
