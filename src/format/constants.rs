/// EDSK container magic bytes and layout offsets

/// Standard EDSK dialect signature
pub const STANDARD_DSK_SIGNATURE: &[u8] = b"MV - CPCEMU Disk-File\r\nDisk-Info\r\n";

/// Extended EDSK dialect signature
pub const EXTENDED_DSK_SIGNATURE: &[u8] = b"EXTENDED CPC DSK File\r\nDisk-Info\r\n";

/// Track-Info block marker
pub const TRACK_INFO_MARKER: &[u8] = b"Track-Info\r\n";

/// Creator signature written into newly built images
pub const CREATOR_SIGNATURE: &[u8] = b"plus3dsk v0.1\0\0\0";

/// Size of the disk info block
pub const DISK_INFO_BLOCK_SIZE: usize = 256;

/// Size of the track info block
pub const TRACK_INFO_BLOCK_SIZE: usize = 256;

/// Size of one sector info entry within a track info block
pub const SECTOR_INFO_SIZE: usize = 8;

/// FDC sector size code to actual byte size mapping (index = N, value = 128 << N)
pub const FDC_SECTOR_SIZES: [usize; 9] = [
    128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768,
];

/// Convert an FDC size code (N) to its advertised byte size
#[inline]
pub fn fdc_size_to_bytes(size_code: u8) -> usize {
    FDC_SECTOR_SIZES
        .get(size_code as usize)
        .copied()
        .unwrap_or(512)
}

/// Offset of cylinder count in the disk info block
pub const DISK_INFO_TRACK_COUNT_OFFSET: usize = 0x30;

/// Offset of side count in the disk info block
pub const DISK_INFO_SIDE_COUNT_OFFSET: usize = 0x31;

/// Offset of the uniform track size (standard dialect) in the disk info block
pub const DISK_INFO_TRACK_SIZE_OFFSET: usize = 0x32;

/// Offset of the per-track size table (extended dialect) in the disk info block
pub const DISK_INFO_EXT_TRACK_SIZE_OFFSET: usize = 0x34;

/// Offset of the optional 14-byte creator tag in the disk info block
pub const DISK_INFO_CREATOR_OFFSET: usize = 0x22;
