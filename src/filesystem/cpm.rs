/// `build` and `read` against a [`DskImage`] using the CP/M +3 directory layout
use std::collections::HashMap;

use crate::diagnostics::Diagnostic;
use crate::error::{DskError, Result};
use crate::filesystem::{normalize_8_3, resolve_collision, FileItem};
use crate::format::profile::{BLOCK_SIZE, DIRECTORY_ENTRY_SIZE, FIRST_FILE_BLOCK, MAX_EXTENT_BYTES};
use crate::format::DiskProfile;
use crate::image::DskImage;
use crate::plus3dos;

/// One on-disk directory extent belonging to a file: its extent number, CP/M
/// record count, and the non-zero allocation blocks it claims, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtentRecord {
    /// Extent number, `(S1 << 5) | EX`
    pub extent_number: u16,
    /// Record count: number of 128-byte records valid in this extent
    pub rc: u8,
    /// Non-zero allocation block numbers claimed by this extent, in order
    pub blocks: Vec<u16>,
}

/// A logical file as reconstructed from the directory: its identity plus
/// every extent that makes it up, in extent order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// CP/M user number (always 0 on this profile)
    pub user: u8,
    /// Raw 8-byte name field, space padded
    pub name: [u8; 8],
    /// Raw 3-byte extension field, space padded
    pub ext: [u8; 3],
    /// The file's extents, in extent-number order
    pub extents: Vec<ExtentRecord>,
}

impl DirEntry {
    /// The name field with trailing spaces trimmed
    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(&self.name).trim_end().to_string()
    }

    /// The extension field with trailing spaces trimmed
    pub fn ext_str(&self) -> String {
        String::from_utf8_lossy(&self.ext).trim_end().to_string()
    }

    /// `NAME.EXT`, or just `NAME` if the extension is empty
    pub fn display_name(&self) -> String {
        let ext = self.ext_str();
        if ext.is_empty() {
            self.name_str()
        } else {
            format!("{}.{}", self.name_str(), ext)
        }
    }
}

/// The in-memory 2 KiB CP/M directory: `DIRECTORY_ENTRY_COUNT` 32-byte slots,
/// each either a live entry or `0xE5`-filled filler.
struct Plus3Directory {
    slots: Vec<u8>,
}

impl Plus3Directory {
    /// An all-filler directory with room for `capacity` entries
    fn empty(capacity: usize) -> Self {
        Self { slots: vec![0xE5u8; capacity * DIRECTORY_ENTRY_SIZE] }
    }

    /// Wrap an already-assembled directory buffer read off disk
    fn from_bytes(slots: Vec<u8>) -> Self {
        Self { slots }
    }

    fn write_entry(&mut self, slot: usize, key_bytes: &[u8], extent_index: u16, rc: u8, blocks: &[u16]) {
        let base = slot * DIRECTORY_ENTRY_SIZE;
        let buf = &mut self.slots;
        buf[base] = 0; // user
        buf[base + 1..base + 9].copy_from_slice(&key_bytes[0..8]);
        buf[base + 9..base + 12].copy_from_slice(&key_bytes[8..11]);
        buf[base + 12] = (extent_index & 0x1F) as u8; // EX
        buf[base + 13] = ((extent_index >> 5) & 0x07) as u8; // S1
        buf[base + 14] = 0; // S2, reserved
        buf[base + 15] = rc;
        for i in 0..16 {
            buf[base + 16 + i] = blocks.get(i).map_or(0, |&ab| ab as u8);
        }
    }

    /// Raw 32-byte entry slots, in directory order
    fn raw_entries(&self) -> impl Iterator<Item = &[u8]> {
        self.slots.chunks(DIRECTORY_ENTRY_SIZE)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.slots
    }
}

/// Result of reading a +3 filesystem off an image
#[derive(Debug, Clone)]
pub struct ReadResult {
    /// Whether the disk parameter block matched the +3/PCW signature
    pub plus3_layout: bool,
    /// Each logical file, paired with its fully assembled bytes (+3DOS
    /// header still attached, if one was written)
    pub files: Vec<(DirEntry, Vec<u8>)>,
}

/// Build a +3 CP/M image from a list of host file items.
///
/// Items are sorted case-insensitively by host name, normalised to 8.3 names
/// with collision resolution, prefixed with a synthesized +3DOS header, split
/// into extents of at most 16 KiB, and allocated sequentially starting at
/// allocation block 2. Returns the built image together with any non-fatal
/// diagnostics (directory-full or disk-full conditions).
pub fn build(profile: &DiskProfile, items: &[FileItem]) -> (DskImage, Vec<Diagnostic>) {
    let mut image = crate::image::DskImageBuilder::new().profile(*profile).build();
    let mut diagnostics = Vec::new();

    let dir_capacity = profile.directory_entries();
    let total_ab = profile.total_allocation_blocks();
    let mut directory = Plus3Directory::empty(dir_capacity);
    let mut dir_slot = 0usize;
    let mut next_ab = FIRST_FILE_BLOCK;
    let mut used_keys: std::collections::HashSet<String> = std::collections::HashSet::new();

    let mut sorted: Vec<&FileItem> = items.iter().collect();
    sorted.sort_by_key(|item| item.host_name.to_lowercase());

    for item in sorted {
        let candidate = normalize_8_3(&item.host_name);
        let key = match resolve_collision(&candidate, &used_keys) {
            Some(k) => k,
            None => {
                diagnostics.push(Diagnostic::DirectoryFull { name: item.host_name.clone() });
                continue;
            }
        };
        used_keys.insert(key.clone());
        let key_bytes = key.as_bytes();

        let (file_type, param1, param2) = plus3dos::derive_type_params(&item.host_name);
        let header = plus3dos::synthesize(&item.body, file_type, param1, param2);
        let mut payload = header.to_vec();
        payload.extend_from_slice(&item.body);

        let total = payload.len();
        if total == 0 {
            if dir_slot >= dir_capacity {
                diagnostics.push(Diagnostic::DirectoryFull { name: item.host_name.clone() });
                continue;
            }
            directory.write_entry(dir_slot, key_bytes, 0, 0, &[]);
            dir_slot += 1;
            continue;
        }

        let mut offset = 0usize;
        let mut remaining = total;
        let mut extent_index: u16 = 0;

        while remaining > 0 {
            let bytes_this = remaining.min(MAX_EXTENT_BYTES);
            let need = bytes_this.div_ceil(BLOCK_SIZE) as u16;

            if next_ab + need > total_ab {
                diagnostics.push(Diagnostic::DiskFull { name: item.host_name.clone() });
                break;
            }

            let reserved: Vec<u16> = (0..need).map(|i| next_ab + i).collect();
            next_ab += need;

            for (i, &ab) in reserved.iter().enumerate() {
                let block_start = offset + i * BLOCK_SIZE;
                let block_len = BLOCK_SIZE.min(total.saturating_sub(block_start));
                let mut block_buf = vec![0xE5u8; BLOCK_SIZE];
                if block_len > 0 {
                    block_buf[..block_len].copy_from_slice(&payload[block_start..block_start + block_len]);
                }
                write_block(&mut image, profile, ab, &block_buf);
            }

            if dir_slot >= dir_capacity {
                diagnostics.push(Diagnostic::DirectoryFull { name: item.host_name.clone() });
                break;
            }

            let rc = bytes_this.div_ceil(128).min(128) as u8;
            directory.write_entry(dir_slot, key_bytes, extent_index, rc, &reserved);
            dir_slot += 1;

            offset += bytes_this;
            remaining -= bytes_this;
            extent_index += 1;
        }
    }

    write_directory(&mut image, profile, directory.as_bytes());
    (image, diagnostics)
}

fn write_block(image: &mut DskImage, profile: &DiskProfile, ab: u16, data: &[u8]) {
    let sectors = profile.block_to_sectors(ab);
    let sector_size = profile.sector_size();
    for (i, (cyl, sector)) in sectors.iter().enumerate() {
        let chunk = &data[i * sector_size..(i + 1) * sector_size];
        image.set_sector_data(0, *cyl, *sector, chunk);
    }
}

fn write_directory(image: &mut DskImage, profile: &DiskProfile, directory: &[u8]) {
    let sector_size = profile.sector_size();
    let dir_sectors = (profile.directory_entries() * DIRECTORY_ENTRY_SIZE).div_ceil(sector_size);
    for i in 0..dir_sectors {
        let chunk = &directory[i * sector_size..(i + 1) * sector_size];
        image.set_sector_data(0, profile.reserved_tracks, (i + 1) as u8, chunk);
    }
}

struct RawEntry {
    user: u8,
    name: [u8; 8],
    ext: [u8; 3],
    extent_number: u16,
    rc: u8,
    blocks: Vec<u16>,
}

fn parse_raw_entry(chunk: &[u8]) -> RawEntry {
    let mut name = [0u8; 8];
    name.copy_from_slice(&chunk[1..9]);
    let mut ext = [0u8; 3];
    ext.copy_from_slice(&chunk[9..12]);

    let ex = chunk[12] as u16 & 0x1F;
    let s1 = chunk[13] as u16 & 0x07;
    let extent_number = (s1 << 5) | ex;
    let rc = chunk[15];
    let blocks = chunk[16..32].iter().map(|&b| b as u16).collect();

    RawEntry { user: chunk[0], name, ext, extent_number, rc, blocks }
}

/// Read every file off a +3 CP/M image.
///
/// Reads the disk parameter block at track 0 sector 1, the 2 KiB directory at
/// track `reserved_tracks` sectors 1..N, groups raw entries by `(user, name,
/// ext)`, and reassembles each file's bytes by walking its extents in order,
/// truncating each extent's tail to `rc * 128` bytes.
pub fn read(image: &DskImage) -> Result<ReadResult> {
    let (profile, plus3_layout) = DiskProfile::read_from(image)?;

    let sector_size = profile.sector_size();
    let dir_sectors = (profile.directory_entries() * DIRECTORY_ENTRY_SIZE).div_ceil(sector_size);
    let mut dir_buf = Vec::with_capacity(dir_sectors * sector_size);
    for i in 0..dir_sectors {
        let data = image
            .sector_data(0, profile.reserved_tracks, (i + 1) as u8)
            .ok_or_else(|| {
                DskError::MissingDirectory(format!(
                    "track {} sector {} absent",
                    profile.reserved_tracks,
                    i + 1
                ))
            })?;
        if data.len() != sector_size {
            return Err(DskError::ShortDirectorySector(data.len()));
        }
        dir_buf.extend_from_slice(data);
    }
    let directory = Plus3Directory::from_bytes(dir_buf);

    let mut groups: HashMap<(u8, [u8; 8], [u8; 3]), Vec<RawEntry>> = HashMap::new();
    for chunk in directory.raw_entries() {
        if chunk[0] == 0xE5 {
            continue;
        }
        let entry = parse_raw_entry(chunk);
        groups.entry((entry.user, entry.name, entry.ext)).or_default().push(entry);
    }

    let total_ab = profile.total_allocation_blocks();
    let mut files = Vec::new();

    let mut keys: Vec<_> = groups.keys().cloned().collect();
    keys.sort();

    for key in keys {
        let mut extents = groups.remove(&key).unwrap();
        extents.sort_by_key(|e| e.extent_number);

        let mut assembled = Vec::new();
        let mut extent_records = Vec::new();

        for extent in &extents {
            let mut extent_bytes = Vec::new();
            let mut used_blocks = Vec::new();
            for &ab in &extent.blocks {
                if ab == 0 {
                    continue;
                }
                // A malformed AB truncates this extent alone; the rest of the
                // directory still aggregates.
                if ab < FIRST_FILE_BLOCK || ab >= total_ab {
                    break;
                }

                let sectors = profile.block_to_sectors(ab);
                let mut block_bytes = Vec::with_capacity(profile.block_size());
                let mut sectors_ok = true;
                for (cyl, sector) in sectors {
                    match image.sector_data(0, cyl, sector) {
                        Some(data) => block_bytes.extend_from_slice(data),
                        None => {
                            sectors_ok = false;
                            break;
                        }
                    }
                }
                if !sectors_ok || block_bytes.len() != profile.block_size() {
                    break;
                }

                used_blocks.push(ab);
                extent_bytes.extend_from_slice(&block_bytes);
            }

            extent_bytes.truncate(extent.rc as usize * 128);
            assembled.extend_from_slice(&extent_bytes);

            extent_records.push(ExtentRecord {
                extent_number: extent.extent_number,
                rc: extent.rc,
                blocks: used_blocks,
            });
        }

        let (user, name, ext) = key;
        files.push((DirEntry { user, name, ext, extents: extent_records }, assembled));
    }

    files.sort_by(|a, b| a.0.display_name().cmp(&b.0.display_name()));
    Ok(ReadResult { plus3_layout, files })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_then_read_round_trip() {
        let profile = DiskProfile::plus3();
        let items = vec![FileItem {
            host_name: "hello.bas".to_string(),
            body: b"10 PRINT \"HI\"\n".to_vec(),
        }];
        let (image, diagnostics) = build(&profile, &items);
        assert!(diagnostics.is_empty());

        let result = read(&image).unwrap();
        assert!(result.plus3_layout);
        assert_eq!(result.files.len(), 1);
        let (entry, bytes) = &result.files[0];
        assert_eq!(entry.display_name(), "HELLO.BAS");
        assert_eq!(entry.extents.len(), 1);

        let (body, meta, present) = plus3dos::peel(bytes);
        assert!(present);
        assert!(meta.unwrap().checksum_ok);
        assert_eq!(body, b"10 PRINT \"HI\"\n");
    }

    #[test]
    fn test_large_file_splits_into_extents() {
        let profile = DiskProfile::plus3();
        let body = vec![0x42u8; 30 * 1024];
        let items = vec![FileItem { host_name: "big.bin".to_string(), body }];
        let (image, diagnostics) = build(&profile, &items);
        assert!(diagnostics.is_empty());

        let result = read(&image).unwrap();
        let (entry, bytes) = &result.files[0];
        assert!(entry.extents.len() >= 2);
        assert_eq!(bytes.len(), 30 * 1024 + plus3dos::HEADER_SIZE);
    }

    #[test]
    fn test_directory_full_diagnostic() {
        let profile = DiskProfile::plus3();
        let items: Vec<FileItem> = (0..65)
            .map(|i| FileItem { host_name: format!("f{i}.txt"), body: vec![1, 2, 3] })
            .collect();
        let (image, diagnostics) = build(&profile, &items);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(&diagnostics[0], Diagnostic::DirectoryFull { .. }));

        let result = read(&image).unwrap();
        assert_eq!(result.files.len(), 64);
    }

    #[test]
    fn test_disk_full_diagnostic() {
        let profile = DiskProfile::plus3();
        let items = vec![FileItem {
            host_name: "huge.bin".to_string(),
            body: vec![0xAAu8; 200 * 1024],
        }];
        let (_, diagnostics) = build(&profile, &items);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(&diagnostics[0], Diagnostic::DiskFull { .. }));
    }

    #[test]
    fn test_name_collision_gets_digit_suffix() {
        let profile = DiskProfile::plus3();
        let items = vec![
            FileItem { host_name: "game.bin".to_string(), body: vec![1] },
            FileItem { host_name: "GAME.BIN".to_string(), body: vec![2] },
        ];
        let (image, diagnostics) = build(&profile, &items);
        assert!(diagnostics.is_empty());

        let result = read(&image).unwrap();
        assert_eq!(result.files.len(), 2);
        let names: Vec<String> = result.files.iter().map(|(e, _)| e.display_name()).collect();
        assert!(names.contains(&"GAME.BIN".to_string()));
        assert!(names.iter().any(|n| n.starts_with("GAME") && n != "GAME.BIN"));
    }

    #[test]
    fn test_malformed_extent_truncates_without_aborting_aggregation() {
        let profile = DiskProfile::plus3();
        let items = vec![
            FileItem { host_name: "a.bin".to_string(), body: vec![1u8; 10] },
            FileItem { host_name: "b.bin".to_string(), body: vec![2u8; 10] },
        ];
        let (mut image, diagnostics) = build(&profile, &items);
        assert!(diagnostics.is_empty());

        let sector_size = profile.sector_size();
        let total_ab = profile.total_allocation_blocks();
        let dir_sectors = (profile.directory_entries() * DIRECTORY_ENTRY_SIZE).div_ceil(sector_size);
        'search: for i in 0..dir_sectors {
            let sector_num = (i + 1) as u8;
            let data = image.sector_data(0, profile.reserved_tracks, sector_num).unwrap().to_vec();
            for chunk_start in (0..data.len()).step_by(DIRECTORY_ENTRY_SIZE) {
                let chunk = &data[chunk_start..chunk_start + DIRECTORY_ENTRY_SIZE];
                if chunk[0] == 0xE5 {
                    continue;
                }
                let name = String::from_utf8_lossy(&chunk[1..9]).to_string();
                if name.starts_with("B") {
                    let mut patched = data.clone();
                    // Corrupt the first AB slot with a block number past the end of the disk.
                    patched[chunk_start + 16] = (total_ab + 10) as u8;
                    image.set_sector_data(0, profile.reserved_tracks, sector_num, &patched);
                    break 'search;
                }
            }
        }

        let result = read(&image).unwrap();
        assert_eq!(result.files.len(), 2);
        let a = result.files.iter().find(|(e, _)| e.display_name() == "A.BIN").unwrap();
        let b = result.files.iter().find(|(e, _)| e.display_name() == "B.BIN").unwrap();

        let (a_body, ..) = plus3dos::peel(&a.1);
        assert_eq!(a_body, vec![1u8; 10]);

        assert!(b.0.extents[0].blocks.is_empty());
        assert!(b.1.len() < a.1.len());
    }
}
