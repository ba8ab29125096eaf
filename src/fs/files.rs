use log::debug;

use crate::error::{DskError, Result};
use crate::format::SECTOR_SIZE;
use crate::fs::{ClusterAllocator, FilesystemImage};
use crate::record::{names_match, normalize_name, FileDescriptor, FileStatus, Timestamp};
use crate::sector::{SectorView, SectorViewMut};

/// File content as handed in by a caller.
///
/// Program and variable-record files carry their bytes as-is; a
/// fixed-record file is a list of records that the service lays out
/// into sectors itself.
#[derive(Debug, Clone)]
pub enum FilePayload {
    Program(Vec<u8>),
    Fixed {
        record_length: u8,
        records: Vec<Vec<u8>>,
    },
    Variable {
        record_length: u8,
        content: Vec<u8>,
    },
}

/// Everything needed to create or replace one file.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub internal: bool,
    pub protected: bool,
    pub payload: FilePayload,
}

impl NewFile {
    pub fn program(name: &str, content: Vec<u8>) -> Self {
        NewFile {
            name: name.to_string(),
            internal: false,
            protected: false,
            payload: FilePayload::Program(content),
        }
    }

    pub fn fixed(name: &str, record_length: u8, records: Vec<Vec<u8>>) -> Self {
        NewFile {
            name: name.to_string(),
            internal: false,
            protected: false,
            payload: FilePayload::Fixed {
                record_length,
                records,
            },
        }
    }

    pub fn variable(name: &str, record_length: u8, content: Vec<u8>) -> Self {
        NewFile {
            name: name.to_string(),
            internal: false,
            protected: false,
            payload: FilePayload::Variable {
                record_length,
                content,
            },
        }
    }
}

fn status_for(file: &NewFile) -> FileStatus {
    FileStatus {
        program: matches!(file.payload, FilePayload::Program(_)),
        internal: file.internal,
        protected: file.protected,
        backup: false,
        emulated: false,
        variable: matches!(file.payload, FilePayload::Variable { .. }),
    }
}

/// Flatten a payload into sector-aligned bytes.
///
/// Fixed-record files place `256 / record_length` records per sector
/// and never split a record across a sector boundary; the unused sector
/// tail is zero. Program and variable content is stored verbatim.
fn pack_payload(payload: &FilePayload) -> Result<Vec<u8>> {
    match payload {
        FilePayload::Program(content) => Ok(content.clone()),
        FilePayload::Variable { record_length, content } => {
            if *record_length == 0 {
                return Err(DskError::InvalidArgument(
                    "variable-record files need a positive record length".to_string(),
                ));
            }
            Ok(content.clone())
        }
        FilePayload::Fixed {
            record_length,
            records,
        } => {
            let length = *record_length as usize;
            if length == 0 {
                return Err(DskError::InvalidArgument(
                    "fixed-record files need a positive record length".to_string(),
                ));
            }
            let per_sector = SECTOR_SIZE / length;
            if per_sector > u8::MAX as usize {
                return Err(DskError::InvalidArgument(format!(
                    "record length {} packs more records per sector than the descriptor can hold",
                    length
                )));
            }
            let mut data = Vec::new();
            for sector_records in records.chunks(per_sector) {
                let sector_start = data.len();
                for record in sector_records {
                    if record.len() > length {
                        return Err(DskError::InvalidArgument(format!(
                            "record of {} bytes exceeds the record length {}",
                            record.len(),
                            length
                        )));
                    }
                    data.extend_from_slice(record);
                    data.resize(data.len() + length - record.len(), 0);
                }
                data.resize(sector_start + SECTOR_SIZE, 0);
            }
            Ok(data)
        }
    }
}

/// Records-per-sector, logical record length and Level-3 record count
/// for the descriptor, by payload type.
fn payload_metadata(payload: &FilePayload, data_len: usize) -> (u8, u8, u16) {
    match payload {
        FilePayload::Program(_) => (0, 0, 0),
        FilePayload::Fixed {
            record_length,
            records,
        } => (
            (SECTOR_SIZE / *record_length as usize) as u8,
            *record_length,
            records.len() as u16,
        ),
        FilePayload::Variable { record_length, .. } => {
            let sectors = (data_len + SECTOR_SIZE - 1) / SECTOR_SIZE;
            (1, *record_length, sectors as u16)
        }
    }
}

fn needed_clusters(data_len: usize, cluster_bytes: usize) -> usize {
    ((data_len + cluster_bytes - 1) / cluster_bytes).max(1)
}

/// Copy packed data into the given clusters in order, zero-padding the
/// tail of the last one.
fn write_clusters(fs: &mut FilesystemImage, clusters: &[u16], data: &[u8]) -> Result<()> {
    let per_cluster = fs.format.sectors_per_cluster as usize;
    for (i, cluster) in clusters.iter().enumerate() {
        let first = fs.format.cluster_to_sector(*cluster)?;
        for s in 0..per_cluster {
            let offset = (i * per_cluster + s) * SECTOR_SIZE;
            let mut image = [0u8; SECTOR_SIZE];
            if offset < data.len() {
                let take = (data.len() - offset).min(SECTOR_SIZE);
                image[..take].copy_from_slice(&data[offset..offset + take]);
            }
            SectorViewMut::new(&mut fs.buffer, first as usize + s)?.overwrite(&image);
        }
    }
    Ok(())
}

fn encode_to_sector_image(fdr: &FileDescriptor) -> Result<[u8; SECTOR_SIZE]> {
    let mut image = [0u8; SECTOR_SIZE];
    let mut view = SectorViewMut::new(&mut image, 0)?;
    fdr.encode(&mut view)?;
    Ok(image)
}

/// Create a new file.
///
/// Every fallible step runs against scratch state first; the image is
/// only touched once the whole operation is known to succeed.
pub fn create(fs: &mut FilesystemImage, file: &NewFile) -> Result<()> {
    let name = file.name.trim();
    if name.is_empty() {
        return Err(DskError::InvalidArgument(
            "file name must not be blank".to_string(),
        ));
    }
    if fs.find(name).is_some() {
        return Err(DskError::AlreadyExists(format!(
            "a file named \"{}\" is already present",
            name
        )));
    }

    let data = pack_payload(&file.payload)?;
    let needed = needed_clusters(data.len(), fs.format.cluster_bytes());

    let mut staged = fs.bitmap.clone();
    let mut allocator = ClusterAllocator::new(&fs.format, &mut staged);
    let clusters = allocator.allocate_clusters(needed)?;
    let fdr_sector = allocator.allocate_fdr_sector(&fs.index)?;
    let slot = fs
        .free_fdi_slot()
        .ok_or_else(|| DskError::OutOfSpace("every FDI slot is taken".to_string()))?;

    let (records_per_sector, record_length, level3_records) =
        payload_metadata(&file.payload, data.len());
    let stamp = Timestamp::now().pack();
    let fdr = FileDescriptor {
        name: normalize_name(name),
        extended_record_length: 0,
        status: status_for(file),
        records_per_sector,
        total_sectors: needed as u16 * fs.format.sectors_per_cluster,
        eof_offset: (data.len() % SECTOR_SIZE) as u8,
        record_length,
        level3_records,
        created: stamp,
        updated: stamp,
        clusters: clusters.clone(),
    };
    let fdr_image = encode_to_sector_image(&fdr)?;

    // Commit.
    write_clusters(fs, &clusters, &data)?;
    SectorViewMut::new(&mut fs.buffer, fdr_sector as usize)?.overwrite(&fdr_image);
    fs.index.set(slot, fdr_sector)?;
    fs.flush_fdi()?;
    fs.bitmap = staged;
    fs.flush_vib()?;
    fs.files.push((fdr, fdr_sector));
    debug!(
        "created \"{}\": {} clusters, FDR at sector {}",
        name, needed, fdr_sector
    );
    Ok(())
}

/// Read a file's content through its descriptor.
pub fn read(fs: &FilesystemImage, fdr: &FileDescriptor) -> Result<Vec<u8>> {
    let mut data = Vec::with_capacity(fdr.clusters.len() * fs.format.cluster_bytes());
    for cluster in &fdr.clusters {
        for sector in fs.format.cluster_sectors(*cluster)? {
            data.extend_from_slice(SectorView::new(&fs.buffer, sector as usize)?.as_bytes());
        }
    }
    data.truncate(fdr.file_length());
    Ok(data)
}

/// Read a file's content by name.
pub fn read_named(fs: &FilesystemImage, name: &str) -> Result<Vec<u8>> {
    let fdr = fs
        .find(name)
        .ok_or_else(|| DskError::NotFound(format!("no file named \"{}\"", name.trim())))?;
    read(fs, fdr)
}

/// Replace a file's content and metadata in place.
///
/// The existing clusters are released and the byte-level work of
/// `create` is redone against the same FDR sector; the FDI entry is
/// left alone.
pub fn update(fs: &mut FilesystemImage, name: &str, file: &NewFile) -> Result<()> {
    let position = fs
        .position(name)
        .ok_or_else(|| DskError::NotFound(format!("no file named \"{}\"", name.trim())))?;
    let (old_fdr, fdr_sector) = fs.files[position].clone();

    let new_name = file.name.trim();
    if new_name.is_empty() {
        return Err(DskError::InvalidArgument(
            "file name must not be blank".to_string(),
        ));
    }
    if !names_match(&old_fdr.name, new_name) && fs.find(new_name).is_some() {
        return Err(DskError::AlreadyExists(format!(
            "a file named \"{}\" is already present",
            new_name
        )));
    }

    let data = pack_payload(&file.payload)?;
    let needed = needed_clusters(data.len(), fs.format.cluster_bytes());

    let mut staged = fs.bitmap.clone();
    let mut allocator = ClusterAllocator::new(&fs.format, &mut staged);
    allocator.free_clusters(&old_fdr.clusters)?;
    let clusters = allocator.allocate_clusters(needed)?;

    let (records_per_sector, record_length, level3_records) =
        payload_metadata(&file.payload, data.len());
    let stamp = Timestamp::now().pack();
    let fdr = FileDescriptor {
        name: normalize_name(new_name),
        extended_record_length: 0,
        status: status_for(file),
        records_per_sector,
        total_sectors: needed as u16 * fs.format.sectors_per_cluster,
        eof_offset: (data.len() % SECTOR_SIZE) as u8,
        record_length,
        level3_records,
        created: stamp,
        updated: stamp,
        clusters: clusters.clone(),
    };
    let fdr_image = encode_to_sector_image(&fdr)?;

    // Commit.
    write_clusters(fs, &clusters, &data)?;
    SectorViewMut::new(&mut fs.buffer, fdr_sector as usize)?.overwrite(&fdr_image);
    fs.bitmap = staged;
    fs.flush_vib()?;
    fs.files[position] = (fdr, fdr_sector);
    debug!("updated \"{}\" in {} clusters", new_name, needed);
    Ok(())
}

/// Remove a file and reclaim everything it occupied.
pub fn delete(fs: &mut FilesystemImage, name: &str) -> Result<()> {
    let position = fs
        .position(name)
        .ok_or_else(|| DskError::NotFound(format!("no file named \"{}\"", name.trim())))?;
    let (fdr, fdr_sector) = fs.files[position].clone();
    if fdr.status.protected {
        return Err(DskError::InvalidArgument(format!(
            "\"{}\" is protected",
            fdr.name_str()
        )));
    }

    let mut staged = fs.bitmap.clone();
    ClusterAllocator::new(&fs.format, &mut staged).free_clusters(&fdr.clusters)?;
    staged.free(fdr_sector)?;

    // Commit.
    SectorViewMut::new(&mut fs.buffer, fdr_sector as usize)?.fill(0);
    if let Some(slot) = fs.index.slot_of(fdr_sector) {
        fs.index.set(slot, 0)?;
    }
    fs.flush_fdi()?;
    fs.bitmap = staged;
    fs.flush_vib()?;
    fs.files.remove(position);
    debug!("deleted \"{}\", freed FDR sector {}", name.trim(), fdr_sector);
    Ok(())
}

/// Rename a file. Only the descriptor sector changes; the FDI is a bare
/// sector list and needs no rewrite.
pub fn rename(fs: &mut FilesystemImage, old: &str, new: &str) -> Result<()> {
    let new_name = new.trim();
    if new_name.is_empty() {
        return Err(DskError::InvalidArgument(
            "file name must not be blank".to_string(),
        ));
    }
    let position = fs
        .position(old)
        .ok_or_else(|| DskError::NotFound(format!("no file named \"{}\"", old.trim())))?;
    let (old_fdr, fdr_sector) = fs.files[position].clone();
    if old_fdr.status.protected {
        return Err(DskError::InvalidArgument(format!(
            "\"{}\" is protected",
            old_fdr.name_str()
        )));
    }
    if !names_match(&old_fdr.name, new_name) && fs.find(new_name).is_some() {
        return Err(DskError::AlreadyExists(format!(
            "a file named \"{}\" is already present",
            new_name
        )));
    }

    let mut fdr = old_fdr;
    fdr.name = normalize_name(new_name);
    let fdr_image = encode_to_sector_image(&fdr)?;
    SectorViewMut::new(&mut fs.buffer, fdr_sector as usize)?.overwrite(&fdr_image);
    fs.files[position] = (fdr, fdr_sector);
    debug!("renamed \"{}\" to \"{}\"", old.trim(), new_name);
    Ok(())
}

/// Flip the protected flag on a file and rewrite its descriptor.
pub fn set_protected(fs: &mut FilesystemImage, name: &str, protected: bool) -> Result<()> {
    let position = fs
        .position(name)
        .ok_or_else(|| DskError::NotFound(format!("no file named \"{}\"", name.trim())))?;
    let (mut fdr, fdr_sector) = fs.files[position].clone();
    fdr.status.protected = protected;
    let fdr_image = encode_to_sector_image(&fdr)?;
    SectorViewMut::new(&mut fs.buffer, fdr_sector as usize)?.overwrite(&fdr_image);
    fs.files[position] = (fdr, fdr_sector);
    Ok(())
}
