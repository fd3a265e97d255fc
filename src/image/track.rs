/// Track data structures

use crate::image::sector::Sector;
use std::collections::HashMap;

/// A disk track: a cylinder/side pair carrying an ordered list of sectors
#[derive(Debug, Clone)]
pub struct Track {
    /// Physical cylinder number
    pub track_number: u8,
    /// Physical side number (0 or 1)
    pub side_number: u8,
    /// GAP#3 length used when formatting this track
    pub gap3_length: u8,
    /// Filler byte used for unwritten portions of this track
    pub filler_byte: u8,
    /// Sectors in on-media order (need not be sorted by ID)
    sectors: Vec<Sector>,
    /// Map from sector ID (R) to index in `sectors`, for fast lookup
    sector_map: HashMap<u8, usize>,
}

impl Track {
    /// Create a new, empty track with the default +3 gap and filler values
    pub fn new(track_number: u8, side_number: u8) -> Self {
        Self {
            track_number,
            side_number,
            gap3_length: 0x52,
            filler_byte: 0xE5,
            sectors: Vec::new(),
            sector_map: HashMap::new(),
        }
    }

    /// Append a sector, keyed by its sector ID for lookup
    pub fn add_sector(&mut self, sector: Sector) {
        let sector_id = sector.id.sector;
        let index = self.sectors.len();
        self.sectors.push(sector);
        self.sector_map.insert(sector_id, index);
    }

    /// All sectors, in on-media order
    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    /// All sectors, in on-media order, mutably
    pub fn sectors_mut(&mut self) -> &mut [Sector] {
        &mut self.sectors
    }

    /// Look up a sector by its ID (R)
    pub fn get_sector(&self, sector_id: u8) -> Option<&Sector> {
        self.sector_map
            .get(&sector_id)
            .and_then(|&idx| self.sectors.get(idx))
    }

    /// Look up a sector by its ID (R), mutably
    pub fn get_sector_mut(&mut self, sector_id: u8) -> Option<&mut Sector> {
        self.sector_map
            .get(&sector_id)
            .and_then(|&idx| self.sectors.get_mut(idx))
    }

    /// Number of sectors on this track
    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    /// Total bytes occupied by this track's sector payloads (not including the track header)
    pub fn total_data_size(&self) -> usize {
        self.sectors.iter().map(|s| s.actual_size()).sum()
    }

    /// Sector IDs in on-media order
    pub fn sector_ids(&self) -> Vec<u8> {
        self.sectors.iter().map(|s| s.id.sector).collect()
    }

    /// Whether a sector with the given ID exists on this track
    pub fn has_sector(&self, sector_id: u8) -> bool {
        self.sector_map.contains_key(&sector_id)
    }
}
