/// Print a human-readable summary of an EDSK image
use std::process::ExitCode;

use plus3dsk::{filesystem, DskError, DskImage};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let image_path = match args.as_slice() {
        [path] => path,
        _ => {
            eprintln!("{}", DskError::usage("plus3dsk-inspect <image.dsk>"));
            return ExitCode::from(2);
        }
    };

    let image = match DskImage::open(image_path) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    println!("dialect:   {}", image.dialect);
    println!("cylinders: {}", image.cylinders);
    println!("sides:     {}", image.sides);

    let result = match filesystem::read(&image) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(1);
        }
    };

    println!("+3 signature present: {}", result.plus3_layout);
    println!();
    println!("{:<4}{:<9}{:<4}{:<7}{:<4}blocks", "usr", "name", "ext", "extent", "rc");

    for (entry, _) in &result.files {
        for extent in &entry.extents {
            let blocks = extent
                .blocks
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(",");
            println!(
                "{:<4}{:<9}{:<4}{:<7}{:<4}{}",
                entry.user,
                entry.name_str(),
                entry.ext_str(),
                extent.extent_number,
                extent.rc,
                blocks
            );
        }
    }

    report_sector_errors(&image);

    ExitCode::SUCCESS
}

/// Print any sector whose FDC status bytes (ST1/ST2) are non-zero.
fn report_sector_errors(image: &DskImage) {
    let mut reported = false;
    for (side, disk) in image.disks().iter().enumerate() {
        for (cyl, track) in disk.tracks().iter().enumerate() {
            let Some(track) = track else { continue };
            for sector in track.sectors() {
                if sector.has_error() {
                    if !reported {
                        println!();
                        println!("sector errors:");
                        reported = true;
                    }
                    println!(
                        "  side {side} track {cyl} sector {}: ST1={:#04x} ST2={:#04x}",
                        sector.id.sector, sector.fdc_status1, sector.fdc_status2
                    );
                }
            }
        }
    }
}
