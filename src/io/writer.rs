/// EDSK container emitter

use crate::error::{DskError, Result};
use crate::format::constants::*;
use crate::format::Dialect;
use crate::image::{DskImage, Track};

/// Emit a [`DskImage`] to a complete EDSK byte stream in its own dialect.
///
/// Cylinder-major, side-minor track order, matching [`crate::io::reader::parse`].
/// An absent track contributes no bytes and a 0 entry in the track-size table.
pub fn emit(image: &DskImage) -> Result<Vec<u8>> {
    let cylinders = image.cylinders;
    let sides = image.sides;

    let mut track_blocks: Vec<Option<Vec<u8>>> = Vec::with_capacity(cylinders as usize * sides as usize);
    for cyl in 0..cylinders {
        for side in 0..sides {
            let block = match image.get_disk(side).and_then(|d| d.get_track(cyl)) {
                Some(track) => Some(emit_track(track)?),
                None => None,
            };
            track_blocks.push(block);
        }
    }

    let mut disk_info = vec![0u8; DISK_INFO_BLOCK_SIZE];
    let magic = image.dialect.magic_bytes();
    disk_info[..magic.len()].copy_from_slice(magic);

    let creator_len = CREATOR_SIGNATURE.len().min(14);
    disk_info[DISK_INFO_CREATOR_OFFSET..DISK_INFO_CREATOR_OFFSET + creator_len]
        .copy_from_slice(&CREATOR_SIGNATURE[..creator_len]);

    disk_info[DISK_INFO_TRACK_COUNT_OFFSET] = cylinders;
    disk_info[DISK_INFO_SIDE_COUNT_OFFSET] = sides;

    match image.dialect {
        Dialect::Extended => {
            for (i, block) in track_blocks.iter().enumerate() {
                let size = block.as_ref().map(|b| b.len()).unwrap_or(0);
                let units = size.div_ceil(256).min(255) as u8;
                let offset = DISK_INFO_EXT_TRACK_SIZE_OFFSET + i;
                if offset < disk_info.len() {
                    disk_info[offset] = units;
                }
            }
        }
        Dialect::Standard => {
            let uniform = track_blocks
                .iter()
                .filter_map(|b| b.as_ref().map(|x| x.len()))
                .max()
                .unwrap_or(TRACK_INFO_BLOCK_SIZE);
            let size_bytes = (uniform as u16).to_le_bytes();
            disk_info[DISK_INFO_TRACK_SIZE_OFFSET] = size_bytes[0];
            disk_info[DISK_INFO_TRACK_SIZE_OFFSET + 1] = size_bytes[1];
        }
    }

    let mut out = disk_info;
    for block in track_blocks.into_iter().flatten() {
        out.extend_from_slice(&block);
    }
    Ok(out)
}

fn emit_track(track: &Track) -> Result<Vec<u8>> {
    let sector_count = track.sector_count();
    let total: usize = TRACK_INFO_BLOCK_SIZE + track.sectors().iter().map(|s| s.actual_size()).sum::<usize>();
    let mut buf = vec![0u8; total];

    buf[..TRACK_INFO_MARKER.len()].copy_from_slice(TRACK_INFO_MARKER);
    buf[0x10] = track.track_number;
    buf[0x11] = track.side_number;
    buf[0x14] = track.sectors().first().map(|s| s.id.size_code).unwrap_or(2);
    buf[0x15] = sector_count as u8;
    buf[0x16] = track.gap3_length;
    buf[0x17] = track.filler_byte;

    let mut payload_cursor = TRACK_INFO_BLOCK_SIZE;
    for (i, sector) in track.sectors().iter().enumerate() {
        let sib_offset = 0x18 + i * SECTOR_INFO_SIZE;
        if sib_offset + SECTOR_INFO_SIZE > TRACK_INFO_BLOCK_SIZE {
            return Err(DskError::bad_track(
                track.track_number as usize,
                "too many sectors to fit one track-info block",
            ));
        }

        buf[sib_offset] = sector.id.track;
        buf[sib_offset + 1] = sector.id.side;
        buf[sib_offset + 2] = sector.id.sector;
        buf[sib_offset + 3] = sector.id.size_code;
        buf[sib_offset + 4] = sector.fdc_status1;
        buf[sib_offset + 5] = sector.fdc_status2;
        let len_bytes = (sector.actual_size() as u16).to_le_bytes();
        buf[sib_offset + 6] = len_bytes[0];
        buf[sib_offset + 7] = len_bytes[1];

        let data = sector.data();
        buf[payload_cursor..payload_cursor + data.len()].copy_from_slice(data);
        payload_cursor += data.len();
    }

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DskImageBuilder;

    #[test]
    fn test_disk_header_magic_and_geometry() {
        let image = DskImageBuilder::new().build();
        let bytes = emit(&image).unwrap();
        assert!(bytes.starts_with(EXTENDED_DSK_SIGNATURE));
        assert_eq!(bytes[DISK_INFO_TRACK_COUNT_OFFSET], 40);
        assert_eq!(bytes[DISK_INFO_SIDE_COUNT_OFFSET], 1);
    }

    #[test]
    fn test_track_size_units_are_0x13() {
        let image = DskImageBuilder::new().build();
        let bytes = emit(&image).unwrap();
        assert_eq!(bytes[DISK_INFO_EXT_TRACK_SIZE_OFFSET], 0x13);
    }

    #[test]
    fn test_track_header_layout() {
        let image = DskImageBuilder::new().build();
        let bytes = emit(&image).unwrap();
        let track0 = &bytes[DISK_INFO_BLOCK_SIZE..DISK_INFO_BLOCK_SIZE + TRACK_INFO_BLOCK_SIZE];
        assert!(track0.starts_with(TRACK_INFO_MARKER));
        assert_eq!(track0[0x10], 0);
        assert_eq!(track0[0x11], 0);
        assert_eq!(track0[0x14], 2);
        assert_eq!(track0[0x15], 9);
        assert_eq!(track0[0x16], 0x52);
        assert_eq!(track0[0x17], 0xE5);
    }

    #[test]
    fn test_absent_track_contributes_zero_bytes() {
        let mut image = DskImageBuilder::new().build();
        image.get_disk_mut(0).unwrap().set_track(10, None);
        let bytes = emit(&image).unwrap();
        assert_eq!(bytes[DISK_INFO_EXT_TRACK_SIZE_OFFSET + 10], 0);
    }
}
