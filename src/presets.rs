use crate::format::{Density, DiskFormat};

/// Named factory for one of the stock disk formats.
pub struct DiskFormatPreset {
    pub name: &'static str,
    pub description: &'static str,
    builder: fn() -> DiskFormat,
}

impl DiskFormatPreset {
    pub fn format(&self) -> DiskFormat {
        (self.builder)()
    }
}

/// Insertion-ordered catalog of the stock formats.
pub struct PresetCatalog {
    presets: Vec<DiskFormatPreset>,
}

// The standard layout shared by every stock format: VIB at 0, FDI at 1,
// 32 FDR sectors from 2, data from 34.
fn layout(
    total_sectors: u16,
    sectors_per_track: u8,
    tracks_per_side: u8,
    sides: u8,
    density: Density,
    sectors_per_cluster: u16,
) -> DiskFormat {
    DiskFormat {
        total_sectors,
        sectors_per_track,
        tracks_per_side,
        sides,
        density,
        vib_sector: 0,
        fdi_sector: 1,
        first_fdr_sector: 2,
        fdr_sector_count: 32,
        first_data_sector: 34,
        sectors_per_cluster,
    }
}

fn sssd() -> DiskFormat {
    layout(360, 9, 40, 1, Density::SD, 1)
}

fn dssd() -> DiskFormat {
    layout(720, 9, 40, 2, Density::SD, 1)
}

fn dsdd() -> DiskFormat {
    layout(1440, 18, 40, 2, Density::DD, 1)
}

fn dssd80() -> DiskFormat {
    layout(1440, 9, 80, 2, Density::SD, 1)
}

fn dsdd80() -> DiskFormat {
    layout(2880, 18, 80, 2, Density::DD, 4)
}

fn hfdc_qd() -> DiskFormat {
    layout(5760, 36, 80, 2, Density::HD, 4)
}

impl PresetCatalog {
    pub fn standard() -> Self {
        PresetCatalog {
            presets: vec![
                DiskFormatPreset {
                    name: "SSSD",
                    description: "40 tracks, 1 side, 9 sectors/track (TI FDC), 90K",
                    builder: sssd,
                },
                DiskFormatPreset {
                    name: "DSSD",
                    description: "40 tracks, 2 sides, 9 sectors/track, 180K",
                    builder: dssd,
                },
                DiskFormatPreset {
                    name: "DSDD",
                    description: "40 tracks, 2 sides, 18 sectors/track, 360K",
                    builder: dsdd,
                },
                DiskFormatPreset {
                    name: "DSSD 80",
                    description: "80 tracks, 2 sides, 9 sectors/track, 360K",
                    builder: dssd80,
                },
                DiskFormatPreset {
                    name: "DSDD 80",
                    description: "80 tracks, 2 sides, 18 sectors/track, 720K",
                    builder: dsdd80,
                },
                DiskFormatPreset {
                    name: "HFDC QD",
                    description: "80 tracks, 2 sides, 36 sectors/track, 1440K",
                    builder: hfdc_qd,
                },
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&DiskFormatPreset> {
        self.presets
            .iter()
            .find(|preset| preset.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiskFormatPreset> {
        self.presets.iter()
    }

    /// Find the preset whose physical geometry matches the given VIB
    /// fields. Used when decoding an image that only records geometry.
    pub fn match_geometry(
        &self,
        total_sectors: u16,
        sectors_per_track: u8,
        tracks_per_side: u8,
        sides: u8,
    ) -> Option<DiskFormat> {
        self.presets
            .iter()
            .map(|preset| preset.format())
            .find(|format| {
                format.total_sectors == total_sectors
                    && format.sectors_per_track == sectors_per_track
                    && format.tracks_per_side == tracks_per_side
                    && format.sides == sides
            })
    }
}
