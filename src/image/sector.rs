/// Sector data structures

use crate::format::constants::fdc_size_to_bytes;

/// Sector ID (CHRN) - addressing information for a sector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorId {
    /// C - Cylinder/Track number
    pub track: u8,
    /// H - Head/Side number
    pub side: u8,
    /// R - Sector ID/Record number
    pub sector: u8,
    /// N - Size code (0=128, 1=256, 2=512, 3=1024, 4=2048, etc.)
    pub size_code: u8,
}

impl SectorId {
    /// Create a new sector ID
    pub fn new(track: u8, side: u8, sector: u8, size_code: u8) -> Self {
        Self {
            track,
            side,
            sector,
            size_code,
        }
    }

    /// Get the advertised sector size in bytes based on size code
    pub fn size_bytes(&self) -> usize {
        fdc_size_to_bytes(self.size_code)
    }
}

/// A disk sector containing data and metadata
#[derive(Debug, Clone)]
pub struct Sector {
    /// Sector addressing information (CHRN)
    pub id: SectorId,
    /// FDC Status Register 1 (ST1); 0 means good
    pub fdc_status1: u8,
    /// FDC Status Register 2 (ST2); 0 means good
    pub fdc_status2: u8,
    /// Actual data length (may differ from advertised size in extended format)
    pub data_length: u16,
    /// Sector data
    data: Vec<u8>,
}

impl Sector {
    /// Create a new sector
    pub fn new(id: SectorId) -> Self {
        let size = id.size_bytes();
        Self {
            id,
            fdc_status1: 0,
            fdc_status2: 0,
            data_length: size as u16,
            data: vec![0xE5; size], // Default CP/M filler byte
        }
    }

    /// Create a new sector with specific data
    pub fn with_data(id: SectorId, data: Vec<u8>) -> Self {
        let data_length = data.len() as u16;
        Self {
            id,
            fdc_status1: 0,
            fdc_status2: 0,
            data_length,
            data,
        }
    }

    /// Create a new sector with FDC status
    pub fn with_status(id: SectorId, fdc_status1: u8, fdc_status2: u8, data: Vec<u8>) -> Self {
        let data_length = data.len() as u16;
        Self {
            id,
            fdc_status1,
            fdc_status2,
            data_length,
            data,
        }
    }

    /// Get a reference to the sector data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the sector data
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Set the sector data
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data_length = data.len() as u16;
        self.data = data;
    }

    /// Check if this sector has any FDC errors (either status byte non-zero)
    pub fn has_error(&self) -> bool {
        self.fdc_status1 != 0 || self.fdc_status2 != 0
    }

    /// Get the advertised size from the size code
    pub fn advertised_size(&self) -> usize {
        self.id.size_bytes()
    }

    /// Get the actual data size
    pub fn actual_size(&self) -> usize {
        self.data_length as usize
    }

    /// Check if the actual size matches the advertised size
    pub fn has_size_mismatch(&self) -> bool {
        self.actual_size() != self.advertised_size()
    }

    /// Fill the sector with a specific byte value
    pub fn fill(&mut self, byte: u8) {
        self.data.fill(byte);
    }

    /// Resize the sector data
    pub fn resize(&mut self, new_size: usize, fill_byte: u8) {
        self.data.resize(new_size, fill_byte);
        self.data_length = new_size as u16;
    }
}
