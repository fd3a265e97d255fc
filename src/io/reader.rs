/// EDSK container parser

use crate::error::{DskError, Result};
use crate::format::constants::*;
use crate::format::Dialect;
use crate::image::{Disk, DskImage, Sector, SectorId, Track};

/// Parse a complete EDSK byte stream into a [`DskImage`].
///
/// Tracks are indexed cylinder-major, side-minor, matching the on-disk
/// per-track size table. A declared track size of 0 (extended dialect
/// only) yields an absent track rather than an error.
pub fn parse(bytes: &[u8]) -> Result<DskImage> {
    if bytes.len() < DISK_INFO_BLOCK_SIZE {
        return Err(DskError::TruncatedInput {
            expected: DISK_INFO_BLOCK_SIZE,
            found: bytes.len(),
        });
    }
    let disk_info = &bytes[..DISK_INFO_BLOCK_SIZE];

    let dialect = Dialect::detect(disk_info).ok_or_else(|| {
        DskError::unknown_container("disk info block prefix matched neither EDSK dialect")
    })?;

    let cylinders = disk_info[DISK_INFO_TRACK_COUNT_OFFSET];
    let sides = disk_info[DISK_INFO_SIDE_COUNT_OFFSET];
    if cylinders == 0 || sides == 0 {
        return Err(DskError::bad_geometry(format!(
            "cylinders={cylinders} sides={sides}"
        )));
    }

    let track_slots = cylinders as usize * sides as usize;
    let track_sizes = match dialect {
        Dialect::Extended => (0..track_slots)
            .map(|i| {
                let offset = DISK_INFO_EXT_TRACK_SIZE_OFFSET + i;
                disk_info.get(offset).copied().unwrap_or(0) as usize * 256
            })
            .collect::<Vec<_>>(),
        Dialect::Standard => {
            let raw = u16::from_le_bytes([
                disk_info[DISK_INFO_TRACK_SIZE_OFFSET],
                disk_info[DISK_INFO_TRACK_SIZE_OFFSET + 1],
            ]);
            let uniform = if raw == 0 { 0x1300 } else { raw as usize };
            vec![uniform; track_slots]
        }
    };

    let mut disks: Vec<Disk> = (0..sides).map(Disk::new).collect();
    let mut cursor = DISK_INFO_BLOCK_SIZE;

    for (index, &size) in track_sizes.iter().enumerate() {
        let cyl = (index / sides as usize) as u8;
        let side = (index % sides as usize) as u8;

        if size == 0 {
            disks[side as usize].set_track(cyl, None);
            continue;
        }

        if cursor + size > bytes.len() {
            return Err(DskError::TruncatedInput {
                expected: size,
                found: bytes.len().saturating_sub(cursor),
            });
        }
        let track_bytes = &bytes[cursor..cursor + size];
        let track = parse_track(index, cyl, side, track_bytes)?;
        disks[side as usize].set_track(cyl, Some(track));
        cursor += size;
    }

    Ok(DskImage::new(dialect, cylinders, sides, disks))
}

fn parse_track(index: usize, cyl: u8, side: u8, data: &[u8]) -> Result<Track> {
    if data.len() < TRACK_INFO_BLOCK_SIZE {
        return Err(DskError::bad_track(index, "track block shorter than 256 bytes"));
    }
    if !data.starts_with(TRACK_INFO_MARKER) {
        return Err(DskError::bad_track(index, "missing Track-Info marker"));
    }

    let sector_count = data[0x15];
    if sector_count == 0 {
        return Err(DskError::bad_track(index, "sector count is zero"));
    }

    let mut track = Track::new(cyl, side);
    track.gap3_length = data[0x16];
    track.filler_byte = data[0x17];

    let mut payload_cursor = TRACK_INFO_BLOCK_SIZE;
    for i in 0..sector_count as usize {
        let sib_offset = 0x18 + i * SECTOR_INFO_SIZE;
        if sib_offset + SECTOR_INFO_SIZE > data.len() {
            return Err(DskError::bad_track(index, "sector-info table runs past track block"));
        }
        let sib = &data[sib_offset..sib_offset + SECTOR_INFO_SIZE];

        let sector_track = sib[0];
        let sector_side = sib[1];
        let sector_id = sib[2];
        let size_code = sib[3];
        let st1 = sib[4];
        let st2 = sib[5];
        let declared_len = u16::from_le_bytes([sib[6], sib[7]]) as usize;
        let actual_len = if declared_len > 0 {
            declared_len
        } else {
            128usize << size_code
        };

        if payload_cursor + actual_len > data.len() {
            return Err(DskError::OversizedTrack(index));
        }
        let payload = data[payload_cursor..payload_cursor + actual_len].to_vec();
        payload_cursor += actual_len;

        let id = SectorId::new(sector_track, sector_side, sector_id, size_code);
        let sector = Sector::with_status(id, st1, st2, payload);
        track.add_sector(sector);
    }

    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::writer::emit;
    use crate::image::DskImageBuilder;

    #[test]
    fn test_unknown_container() {
        let bytes = vec![0u8; 256];
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, DskError::UnknownContainer(_)));
    }

    #[test]
    fn test_truncated_disk_info() {
        let bytes = vec![0u8; 100];
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, DskError::TruncatedInput { .. }));
    }

    #[test]
    fn test_zero_geometry_is_bad_geometry() {
        let mut disk_info = vec![0u8; 256];
        disk_info[..EXTENDED_DSK_SIGNATURE.len()].copy_from_slice(EXTENDED_DSK_SIGNATURE);
        let err = parse(&disk_info).unwrap_err();
        assert!(matches!(err, DskError::BadGeometry(_)));
    }

    #[test]
    fn test_round_trip_via_builder() {
        let image = DskImageBuilder::new().build();
        let bytes = emit(&image).unwrap();
        let parsed = parse(&bytes).unwrap();
        assert_eq!(parsed.cylinders, image.cylinders);
        assert_eq!(parsed.sides, image.sides);
        assert_eq!(
            parsed.sector_data(0, 1, 1).unwrap(),
            image.sector_data(0, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_absent_track_roundtrip() {
        let mut image = DskImageBuilder::new().build();
        image.get_disk_mut(0).unwrap().set_track(5, None);
        let bytes = emit(&image).unwrap();
        let parsed = parse(&bytes).unwrap();
        assert!(parsed.get_disk(0).unwrap().get_track(5).is_none());
        assert!(parsed.get_disk(0).unwrap().get_track(4).is_some());
    }
}
