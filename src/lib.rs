/*!
# plus3dsk

A Rust library for reading and writing EDSK disk image files holding ZX
Spectrum +3 / Amstrad PCW-180K CP/M 2.2 + "+3DOS" filesystems.

## Features

- Parse and emit Standard and Extended EDSK containers
- Track and sector abstraction with FDC status codes
- Build and read the CP/M +3 directory/allocation layer
- Synthesize and strip +3DOS file headers
- Idiomatic Rust API with comprehensive error handling

## Quick Start

```rust,no_run
use plus3dsk::{DiskProfile, DskImage, filesystem, FileItem};

// Open an existing image and list its files
let image = DskImage::open("disk.dsk")?;
let result = filesystem::read(&image)?;
for (entry, bytes) in &result.files {
    println!("{}: {} bytes", entry.display_name(), bytes.len());
}

// Build a new image from host files
let items = vec![FileItem { host_name: "hello.bas".into(), body: b"10 PRINT 1\n".to_vec() }];
let (new_image, diagnostics) = filesystem::build(&DiskProfile::plus3(), &items);
for d in &diagnostics {
    eprintln!("{d}");
}
new_image.save("out.dsk")?;
# Ok::<(), plus3dsk::DskError>(())
```

## Modules

- `format`: EDSK container dialects and the +3 disk profile
- `image`: Core image data structures (`DskImage`, `Disk`, `Track`, `Sector`)
- `io`: EDSK container parsing and emission
- `filesystem`: The CP/M +3 directory/allocation layer
- `plus3dos`: +3DOS 128-byte file header codec
- `diagnostics`: Non-fatal build-time conditions
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Non-fatal build-time conditions
pub mod diagnostics;
/// Error types and Result alias
pub mod error;
/// The CP/M +3 directory/allocation layer
pub mod filesystem;
/// EDSK container dialects and the +3 disk profile
pub mod format;
/// Core image data structures (DskImage, Track, Sector)
pub mod image;
/// EDSK container parsing and emission
pub mod io;
/// +3DOS 128-byte file header codec
pub mod plus3dos;

pub use diagnostics::Diagnostic;
pub use error::{DskError, Result};
pub use filesystem::{build, read, DirEntry, ExtentRecord, FileItem, ReadResult};
pub use format::{Dialect, DiskProfile};
pub use image::{Disk, DskImage, DskImageBuilder, Sector, SectorId, Track};
pub use plus3dos::{FileType, Plus3DosMeta};
