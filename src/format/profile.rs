/// The +3/PCW-180K disk-parameter profile
///
/// This toolkit targets a single CP/M profile: a single-sided 40-track,
/// 9-sectors-per-track, 512-byte-sector floppy with a 1-track reserved
/// area and a 2-block (2 KiB, 64-entry) directory. All geometry and
/// allocation constants live here rather than behind hidden globals, per
/// the "Global state" design note in the specification this toolkit
/// implements.
use crate::error::{DskError, Result};
use crate::image::DskImage;

/// Number of bytes in one CP/M allocation block on this profile
pub const BLOCK_SIZE: usize = 1024;

/// Number of sectors per allocation block on this profile
pub const SECTORS_PER_BLOCK: usize = 2;

/// Directory capacity: 64 entries of 32 bytes = 2 KiB = 2 allocation blocks
pub const DIRECTORY_ENTRY_COUNT: usize = 64;

/// Size of one directory entry, in bytes
pub const DIRECTORY_ENTRY_SIZE: usize = 32;

/// First allocation block number available for file data (0 and 1 hold the directory)
pub const FIRST_FILE_BLOCK: u16 = 2;

/// Maximum bytes held by a single directory extent (16 AB slots x 1024 bytes)
pub const MAX_EXTENT_BYTES: usize = 16 * BLOCK_SIZE;

/// The 16-byte disk parameter block describing this profile, as laid out at
/// track 0, sector 1 of every image this toolkit writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskProfile {
    /// Reserved, always 0 on this profile
    pub spec_byte: u8,
    /// Side indicator (0 or 1)
    pub side_indicator: u8,
    /// Tracks per side
    pub tracks: u8,
    /// Sectors per track
    pub sectors_per_track: u8,
    /// Sector size shift: sector size = 128 << psh
    pub psh: u8,
    /// Reserved tracks at the start of the disk
    pub reserved_tracks: u8,
    /// Block size shift: block size = 128 << bsh
    pub bsh: u8,
    /// Number of allocation blocks occupied by the directory
    pub dir_blocks: u8,
    /// Read/write gap length
    pub gap_rw: u8,
    /// Format gap length
    pub gap_fmt: u8,
}

impl DiskProfile {
    /// The canonical ZX Spectrum +3 / Amstrad PCW-180K profile
    pub const fn plus3() -> Self {
        Self {
            spec_byte: 0,
            side_indicator: 0,
            tracks: 40,
            sectors_per_track: 9,
            psh: 2,
            reserved_tracks: 1,
            bsh: 3,
            dir_blocks: 2,
            gap_rw: 0x2A,
            gap_fmt: 0x52,
        }
    }

    /// Sector size in bytes (derived from `psh`)
    pub fn sector_size(&self) -> usize {
        128usize << self.psh
    }

    /// Allocation block size in bytes (derived from `bsh`)
    pub fn block_size(&self) -> usize {
        128usize << self.bsh
    }

    /// Total allocation blocks on the data area, including the directory's own blocks
    ///
    /// `(cylinders - reserved) * sectors_per_track / sectors_per_block`
    pub fn total_allocation_blocks(&self) -> u16 {
        let sectors_per_block = self.block_size() / self.sector_size();
        let usable_tracks = (self.tracks - self.reserved_tracks) as usize;
        let usable_sectors = usable_tracks * self.sectors_per_track as usize;
        (usable_sectors / sectors_per_block) as u16
    }

    /// Directory capacity in 32-byte entries
    pub fn directory_entries(&self) -> usize {
        (self.dir_blocks as usize * self.block_size()) / DIRECTORY_ENTRY_SIZE
    }

    /// Serialize to the exact 16-byte disk parameter block
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0] = self.spec_byte;
        buf[1] = self.side_indicator;
        buf[2] = self.tracks;
        buf[3] = self.sectors_per_track;
        buf[4] = self.psh;
        buf[5] = self.reserved_tracks;
        buf[6] = self.bsh;
        buf[7] = self.dir_blocks;
        buf[8] = self.gap_rw;
        buf[9] = self.gap_fmt;
        buf
    }

    /// Parse a disk parameter block from 16 bytes, without validating it
    /// against the +3 profile's expected values.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 16 {
            return None;
        }
        Some(Self {
            spec_byte: data[0],
            side_indicator: data[1],
            tracks: data[2],
            sectors_per_track: data[3],
            psh: data[4],
            reserved_tracks: data[5],
            bsh: data[6],
            dir_blocks: data[7],
            gap_rw: data[8],
            gap_fmt: data[9],
        })
    }

    /// Whether `data` matches the +3/PCW signature: side indicator 0/1,
    /// tracks >= 40, sectors/track >= 9, psh=2, reserved=1, bsh=3, dir_blocks=2.
    pub fn matches_plus3_signature(&self) -> bool {
        (self.side_indicator == 0 || self.side_indicator == 1)
            && self.tracks >= 40
            && self.sectors_per_track >= 9
            && self.psh == 2
            && self.reserved_tracks == 1
            && self.bsh == 3
            && self.dir_blocks == 2
    }

    /// Map an absolute allocation block number to its two backing sectors,
    /// expressed as (cylinder, sector_id) pairs in on-disk order.
    ///
    /// Absolute from the start of the data area (track = `reserved_tracks`,
    /// sector = 1): advance `ab * sectors_per_block` sectors, then take the
    /// next `sectors_per_block` in order, wrapping into subsequent cylinders.
    pub fn block_to_sectors(&self, ab: u16) -> [(u8, u8); SECTORS_PER_BLOCK] {
        let spt = self.sectors_per_track as usize;
        let first_logical_sector = ab as usize * SECTORS_PER_BLOCK;
        let mut out = [(0u8, 0u8); SECTORS_PER_BLOCK];
        for (i, slot) in out.iter_mut().enumerate() {
            let logical = first_logical_sector + i;
            let cyl = self.reserved_tracks as usize + logical / spt;
            let sector = (logical % spt) + 1;
            *slot = (cyl as u8, sector as u8);
        }
        out
    }

    /// Read the disk parameter block from track 0, sector 1 of `image`.
    ///
    /// Returns the parsed profile and whether it matched the +3 signature.
    /// A mismatch is not an error: best-effort directory parsing continues
    /// with the parsed (possibly bogus) values, per the read-path contract.
    pub fn read_from(image: &DskImage) -> Result<(Self, bool)> {
        let data = image
            .sector_data(0, 0, 1)
            .ok_or_else(|| DskError::MissingDirectory("track 0 sector 1 absent".into()))?;
        let profile = Self::from_bytes(data)
            .ok_or_else(|| DskError::ShortDirectorySector(data.len()))?;
        let matched = profile.matches_plus3_signature();
        Ok((profile, matched))
    }
}

impl Default for DiskProfile {
    fn default() -> Self {
        Self::plus3()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus3_dpb_bytes() {
        let profile = DiskProfile::plus3();
        assert_eq!(
            profile.to_bytes(),
            [0, 0, 40, 9, 2, 1, 3, 2, 0x2A, 0x52, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_block_size_and_count() {
        let profile = DiskProfile::plus3();
        assert_eq!(profile.block_size(), 1024);
        assert_eq!(profile.sector_size(), 512);
        assert_eq!(profile.total_allocation_blocks(), 175);
        assert_eq!(profile.directory_entries(), 64);
    }

    #[test]
    fn test_block_to_sectors_ab0_ab1_are_directory() {
        let profile = DiskProfile::plus3();
        assert_eq!(profile.block_to_sectors(0), [(1, 1), (1, 2)]);
        assert_eq!(profile.block_to_sectors(1), [(1, 3), (1, 4)]);
        assert_eq!(profile.block_to_sectors(2), [(1, 5), (1, 6)]);
    }

    #[test]
    fn test_block_to_sectors_wraps_cylinders() {
        let profile = DiskProfile::plus3();
        // AB 4 -> logical sector 8 -> (track 1, sector 9) then wraps to track 2 sector 1
        assert_eq!(profile.block_to_sectors(4), [(1, 9), (2, 1)]);
    }

    #[test]
    fn test_round_trip_bytes() {
        let profile = DiskProfile::plus3();
        let bytes = profile.to_bytes();
        let parsed = DiskProfile::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, profile);
        assert!(parsed.matches_plus3_signature());
    }

    #[test]
    fn test_mismatched_signature() {
        let mut profile = DiskProfile::plus3();
        profile.bsh = 4;
        assert!(!profile.matches_plus3_signature());
    }
}
