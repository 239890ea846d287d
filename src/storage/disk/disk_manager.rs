use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::common::constants::{INVALID_PAGE_ID, PAGE_SIZE};
use crate::common::Result;

/// Identifies a page within a single-file page store. `INVALID_PAGE_ID`
/// (-1) is never a valid argument to `read_page`/`write_page`.
pub type PageId = i64;

/// Manages reads and writes of pages on disk.
///
/// This is the minimal collaborator the buffer pool needs: a single
/// page-addressed file. It does not implement write-ahead logging,
/// checkpointing, or multi-file storage -- recovery is out of scope.
#[derive(Debug)]
pub struct DiskManager {
    path: PathBuf,
    file: File,
    next_page_id: PageId,
}

impl DiskManager {
    /// Opens (creating if necessary) the database file at `path`. The next
    /// fresh `page_id` is derived from the file's current length, so
    /// reopening a file resumes allocation where it left off.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<DiskManager> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let file_len = file.metadata()?.len();
        let next_page_id = (file_len / PAGE_SIZE as u64) as PageId;

        Ok(DiskManager {
            path,
            file,
            next_page_id,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages currently allocated in the file.
    pub fn num_pages(&self) -> PageId {
        self.next_page_id
    }

    /// Allocates and returns a fresh page id, extending the file to hold it.
    pub fn allocate_new_page(&mut self) -> PageId {
        let page_id = self.next_page_id;
        self.next_page_id += 1;
        let new_len = (page_id as u64 + 1) * PAGE_SIZE as u64;
        self.file
            .set_len(new_len)
            .expect("failed to extend database file");
        trace!("allocated page {page_id}");
        page_id
    }

    /// Logically deallocates `page_id`. This reference implementation does
    /// not reclaim file space (no free-space map); it exists so the buffer
    /// pool has a real collaborator to call on `DeletePage`, per the
    /// external-interfaces contract.
    pub fn deallocate_page(&mut self, page_id: PageId) {
        debug!("deallocated page {page_id}");
    }

    /// Reads exactly `PAGE_SIZE` bytes for `page_id`. Reading a page that
    /// was allocated but never written returns a zeroed buffer.
    pub fn read_page(&mut self, page_id: PageId) -> [u8; PAGE_SIZE] {
        assert_ne!(page_id, INVALID_PAGE_ID, "cannot read the invalid page id");
        let offset = page_id as u64 * PAGE_SIZE as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .expect("failed to seek to page offset");

        let mut buf = [0u8; PAGE_SIZE];
        match self.file.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // Page was allocated (file extended) but never written.
            }
            Err(e) => panic!("failed to read page {page_id}: {e}"),
        }
        buf
    }

    /// Writes exactly `PAGE_SIZE` bytes for `page_id`.
    pub fn write_page(&mut self, page_id: PageId, data: &[u8; PAGE_SIZE]) {
        assert_ne!(page_id, INVALID_PAGE_ID, "cannot write the invalid page id");
        let offset = page_id as u64 * PAGE_SIZE as u64;
        self.file
            .seek(SeekFrom::Start(offset))
            .expect("failed to seek to page offset");
        self.file
            .write_all(data)
            .expect("failed to write page to disk");
    }

    /// Flushes buffered writes to the underlying file.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_db() -> (DiskManager, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        (DiskManager::new(&path).unwrap(), dir)
    }

    #[test]
    fn allocate_grows_sequential_ids() {
        let (mut dm, _dir) = temp_db();
        assert_eq!(dm.allocate_new_page(), 0);
        assert_eq!(dm.allocate_new_page(), 1);
        assert_eq!(dm.num_pages(), 2);
    }

    #[test]
    fn unwritten_page_reads_as_zeroed() {
        let (mut dm, _dir) = temp_db();
        let pid = dm.allocate_new_page();
        let data = dm.read_page(pid);
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn write_then_read_round_trips() {
        let (mut dm, _dir) = temp_db();
        let pid = dm.allocate_new_page();
        let mut data = [0u8; PAGE_SIZE];
        data[0] = 7;
        data[PAGE_SIZE - 1] = 42;
        dm.write_page(pid, &data);

        let read_back = dm.read_page(pid);
        assert_eq!(read_back[0], 7);
        assert_eq!(read_back[PAGE_SIZE - 1], 42);
    }

    #[test]
    fn reopening_resumes_allocation_and_preserves_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");

        let pid = {
            let mut dm = DiskManager::new(&path).unwrap();
            let pid = dm.allocate_new_page();
            let mut data = [0u8; PAGE_SIZE];
            data[0..4].copy_from_slice(&[1, 2, 3, 4]);
            dm.write_page(pid, &data);
            dm.sync().unwrap();
            pid
        };

        let mut dm2 = DiskManager::new(&path).unwrap();
        assert_eq!(dm2.num_pages(), 1);
        let data = dm2.read_page(pid);
        assert_eq!(&data[0..4], &[1, 2, 3, 4]);

        let new_pid = dm2.allocate_new_page();
        assert_eq!(new_pid, 1);
    }

    #[test]
    #[should_panic]
    fn reading_invalid_page_id_panics() {
        let (mut dm, _dir) = temp_db();
        dm.read_page(INVALID_PAGE_ID);
    }
}
