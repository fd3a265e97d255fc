/// Build an EDSK image from a folder of host files
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use plus3dsk::{filesystem, DiskProfile, DskError, FileItem};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input_folder, output_path) = match args.as_slice() {
        [input, output] => (PathBuf::from(input), PathBuf::from(output)),
        _ => {
            eprintln!("{}", DskError::usage("plus3dsk-build <input-folder> <output.dsk>"));
            return ExitCode::from(2);
        }
    };

    let items = match collect_items(&input_folder) {
        Ok(items) => items,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    let (image, diagnostics) = filesystem::build(&DiskProfile::plus3(), &items);
    for diagnostic in &diagnostics {
        eprintln!("{diagnostic}");
    }

    if let Err(err) = image.save(&output_path) {
        eprintln!("error: {err}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn collect_items(folder: &Path) -> std::io::Result<Vec<FileItem>> {
    let mut items = Vec::new();
    visit(folder, &mut items)?;
    Ok(items)
}

fn visit(dir: &Path, items: &mut Vec<FileItem>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            visit(&path, items)?;
        } else if file_type.is_file() {
            let host_name = entry.file_name().to_string_lossy().to_string();
            let body = std::fs::read(&path)?;
            items.push(FileItem { host_name, body });
        }
    }
    Ok(())
}
