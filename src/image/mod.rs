/// EDSK image data structures

/// Builder for pre-filled +3 profile images
pub mod builder;
/// Disk (side) structure
pub mod disk;
/// Sector definition and status
pub mod sector;
/// Track definition
pub mod track;

pub use builder::DskImageBuilder;
pub use disk::Disk;
pub use sector::{Sector, SectorId};
pub use track::Track;

use crate::error::Result;
use crate::format::Dialect;
use std::path::Path;

/// An EDSK disk image: a dialect tag, geometry, and one [`Disk`] per side
#[derive(Debug, Clone)]
pub struct DskImage {
    /// Container dialect this image was parsed as / will be emitted as
    pub dialect: Dialect,
    /// Cylinder count
    pub cylinders: u8,
    /// Side count
    pub sides: u8,
    /// One [`Disk`] per side
    disks: Vec<Disk>,
}

impl DskImage {
    /// Construct an image from its disks directly
    pub fn new(dialect: Dialect, cylinders: u8, sides: u8, disks: Vec<Disk>) -> Self {
        Self {
            dialect,
            cylinders,
            sides,
            disks,
        }
    }

    /// Read and parse an `.dsk` file from the filesystem
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        crate::io::reader::parse(&bytes)
    }

    /// Emit this image and write it to an `.dsk` file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = crate::io::writer::emit(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Build a blank, filler-initialised image using the +3 disk profile
    pub fn builder() -> DskImageBuilder {
        DskImageBuilder::new()
    }

    /// All disk sides
    pub fn disks(&self) -> &[Disk] {
        &self.disks
    }

    /// All disk sides, mutably
    pub fn disks_mut(&mut self) -> &mut [Disk] {
        &mut self.disks
    }

    /// Get a disk side by number
    pub fn get_disk(&self, side: u8) -> Option<&Disk> {
        self.disks.get(side as usize)
    }

    /// Get a disk side by number, mutably
    pub fn get_disk_mut(&mut self, side: u8) -> Option<&mut Disk> {
        self.disks.get_mut(side as usize)
    }

    /// Read a sector's payload by (side, cylinder, sector id), if present
    pub fn sector_data(&self, side: u8, track: u8, sector_id: u8) -> Option<&[u8]> {
        self.get_disk(side)?
            .get_track(track)?
            .get_sector(sector_id)
            .map(|s| s.data())
    }

    /// Write a sector's payload by (side, cylinder, sector id); returns
    /// `false` if the addressed sector does not exist.
    pub fn set_sector_data(&mut self, side: u8, track: u8, sector_id: u8, data: &[u8]) -> bool {
        let Some(disk) = self.get_disk_mut(side) else {
            return false;
        };
        let Some(track) = disk.get_track_mut(track) else {
            return false;
        };
        let Some(sector) = track.get_sector_mut(sector_id) else {
            return false;
        };
        sector.set_data(data.to_vec());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_produces_plus3_geometry() {
        let image = DskImage::builder().build();
        assert_eq!(image.cylinders, 40);
        assert_eq!(image.sides, 1);
        assert_eq!(image.disks().len(), 1);
        assert_eq!(image.get_disk(0).unwrap().track_count(), 40);
    }

    #[test]
    fn test_sector_data_round_trip() {
        let mut image = DskImage::builder().build();
        assert!(image.set_sector_data(0, 1, 1, &[0xAAu8; 512]));
        assert_eq!(image.sector_data(0, 1, 1).unwrap(), &[0xAAu8; 512][..]);
    }

    #[test]
    fn test_sector_data_missing() {
        let image = DskImage::builder().build();
        assert!(image.sector_data(1, 0, 1).is_none());
        assert!(image.sector_data(0, 0, 99).is_none());
    }
}
