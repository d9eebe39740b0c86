use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{PageFileError, PageFileResult};
use super::header::{FileHeader, HEADER_SIZE};
use super::{PAGE_SIZE, PageNum};

/// An open page file: a 32-byte header followed by `total_pages` pages of
/// exactly `PAGE_SIZE` bytes each.
///
/// The handle owns the underlying file exclusively. Closing it writes the
/// live page count back into the header; a handle that was never closed does
/// the same writeback on drop, best-effort.
pub struct PageFile {
    /// Owned copy of the path the file was opened with
    path: PathBuf,
    /// Number of valid pages currently in the file
    total_pages: usize,
    /// Page number of the last successful read or write
    cur_page: PageNum,
    /// Underlying file; `None` once the handle has been closed
    file: Option<File>,
}

impl PageFile {
    /// Create a new page file containing a header and one zero-filled page.
    ///
    /// An existing file at `path` is overwritten; that case is logged as a
    /// warning, not treated as an error.
    pub fn create<P: AsRef<Path>>(path: P) -> PageFileResult<()> {
        let path = path.as_ref();

        if path.exists() {
            warn!(path = %path.display(), "file already exists, overwriting");
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| PageFileError::CreateFailed(format!("{}: {}", path.display(), e)))?;

        let mut image = vec![0u8; HEADER_SIZE + PAGE_SIZE];
        image[..HEADER_SIZE].copy_from_slice(&FileHeader::new(1).encode());

        // The file is released on every exit path, including a short write.
        file.write_all(&image)
            .map_err(|e| PageFileError::WriteFailed(format!("initial page: {}", e)))?;

        debug!(path = %path.display(), "created page file");
        Ok(())
    }

    /// Open an existing page file for reading and writing.
    ///
    /// The file length is the canonical page count; the header's page_count
    /// field must agree with it exactly, otherwise the file is rejected as
    /// corrupt.
    pub fn open<P: AsRef<Path>>(path: P) -> PageFileResult<Self> {
        let path = path.as_ref();

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|_| PageFileError::NotFound(path.display().to_string()))?;

        let mut head = [0u8; HEADER_SIZE];
        file.read_exact(&mut head)
            .map_err(|e| PageFileError::CorruptHeader(format!("short header: {}", e)))?;

        let header = FileHeader::decode(&head)?;
        header.validate()?;

        let len = file
            .metadata()
            .map_err(|e| PageFileError::CorruptHeader(format!("file length unavailable: {}", e)))?
            .len();
        let data_len = len - HEADER_SIZE as u64;
        if data_len % PAGE_SIZE as u64 != 0 {
            return Err(PageFileError::CorruptHeader(format!(
                "file length {} is not a header plus whole pages",
                len
            )));
        }
        let total_pages = (data_len / PAGE_SIZE as u64) as usize;
        if total_pages != header.page_count as usize {
            return Err(PageFileError::CorruptHeader(format!(
                "header records {} pages but file holds {}",
                header.page_count, total_pages
            )));
        }

        debug!(path = %path.display(), total_pages, "opened page file");

        Ok(Self {
            path: path.to_path_buf(),
            total_pages,
            cur_page: 0,
            file: Some(file),
        })
    }

    /// Close the file, writing the current page count back into the header.
    ///
    /// The handle becomes inert even when the writeback fails; the writeback
    /// error is still returned.
    pub fn close(&mut self) -> PageFileResult<()> {
        let mut file = self.file.take().ok_or(PageFileError::NotInitialized)?;

        let result = write_back_page_count(&mut file, self.total_pages);

        self.total_pages = 0;
        self.cur_page = 0;
        debug!(path = %self.path.display(), "closed page file");
        result
    }

    /// Remove a page file from disk.
    ///
    /// Destroying a path that still has an open handle is the caller's
    /// responsibility.
    pub fn destroy<P: AsRef<Path>>(path: P) -> PageFileResult<()> {
        let path = path.as_ref();
        fs::remove_file(path).map_err(|_| PageFileError::NotFound(path.display().to_string()))
    }

    /// Read page `page_num` into `buf` and move the cursor there.
    ///
    /// Out-of-range page numbers and I/O failures during the seek/read are
    /// not distinguished; both report the page as non-existing.
    pub fn read_block(&mut self, page_num: PageNum, buf: &mut [u8]) -> PageFileResult<()> {
        let file = self.file.as_mut().ok_or(PageFileError::NotInitialized)?;
        if buf.len() != PAGE_SIZE {
            return Err(PageFileError::InvalidPageSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }
        if page_num >= self.total_pages {
            return Err(PageFileError::NonExistingPage(page_num as i64));
        }

        let offset = (HEADER_SIZE + PAGE_SIZE * page_num) as u64;
        file.seek(SeekFrom::Start(offset))
            .map_err(|_| PageFileError::NonExistingPage(page_num as i64))?;
        file.read_exact(buf)
            .map_err(|_| PageFileError::NonExistingPage(page_num as i64))?;

        self.cur_page = page_num;
        Ok(())
    }

    pub fn read_first_block(&mut self, buf: &mut [u8]) -> PageFileResult<()> {
        self.read_block(0, buf)
    }

    pub fn read_previous_block(&mut self, buf: &mut [u8]) -> PageFileResult<()> {
        if self.file.is_none() {
            return Err(PageFileError::NotInitialized);
        }
        let page = self
            .cur_page
            .checked_sub(1)
            .ok_or(PageFileError::NonExistingPage(self.cur_page as i64 - 1))?;
        self.read_block(page, buf)
    }

    pub fn read_current_block(&mut self, buf: &mut [u8]) -> PageFileResult<()> {
        self.read_block(self.cur_page, buf)
    }

    pub fn read_next_block(&mut self, buf: &mut [u8]) -> PageFileResult<()> {
        self.read_block(self.cur_page + 1, buf)
    }

    pub fn read_last_block(&mut self, buf: &mut [u8]) -> PageFileResult<()> {
        if self.file.is_none() {
            return Err(PageFileError::NotInitialized);
        }
        let page = self
            .total_pages
            .checked_sub(1)
            .ok_or(PageFileError::NonExistingPage(-1))?;
        self.read_block(page, buf)
    }

    /// Write `buf` to page `page_num` and move the cursor there.
    ///
    /// `page_num == total_pages()` is allowed and appends a fresh page
    /// first. The cursor moves only once the write has landed.
    pub fn write_block(&mut self, page_num: PageNum, buf: &[u8]) -> PageFileResult<()> {
        if self.file.is_none() {
            return Err(PageFileError::NotInitialized);
        }
        if buf.len() != PAGE_SIZE {
            return Err(PageFileError::InvalidPageSize {
                expected: PAGE_SIZE,
                actual: buf.len(),
            });
        }
        if page_num > self.total_pages {
            return Err(PageFileError::NonExistingPage(page_num as i64));
        }

        // Writing one page past the end grows the file first; an append
        // failure surfaces before any byte of `buf` is written.
        if page_num == self.total_pages {
            self.append_empty_block()?;
        }

        let file = self.file.as_mut().ok_or(PageFileError::NotInitialized)?;
        let offset = (HEADER_SIZE + PAGE_SIZE * page_num) as u64;
        file.seek(SeekFrom::Start(offset))
            .map_err(|_| PageFileError::NonExistingPage(page_num as i64))?;
        file.write_all(buf)
            .map_err(|_| PageFileError::NonExistingPage(page_num as i64))?;

        self.cur_page = page_num;
        Ok(())
    }

    pub fn write_current_block(&mut self, buf: &[u8]) -> PageFileResult<()> {
        self.write_block(self.cur_page, buf)
    }

    /// Append one zero-filled page at the end of the file.
    ///
    /// Does not move the cursor.
    pub fn append_empty_block(&mut self) -> PageFileResult<()> {
        let file = self.file.as_mut().ok_or(PageFileError::NotInitialized)?;

        file.seek(SeekFrom::End(0))
            .map_err(|e| PageFileError::WriteFailed(format!("seek to end: {}", e)))?;

        let zero_page = vec![0u8; PAGE_SIZE];
        file.write_all(&zero_page)
            .map_err(|e| PageFileError::WriteFailed(format!("append page: {}", e)))?;

        self.total_pages += 1;
        Ok(())
    }

    /// Grow the file until it holds at least `target_pages` pages.
    ///
    /// Pages appended before a failure remain; no rollback.
    pub fn ensure_capacity(&mut self, target_pages: usize) -> PageFileResult<()> {
        if self.file.is_none() {
            return Err(PageFileError::NotInitialized);
        }
        if self.total_pages >= target_pages {
            return Ok(());
        }

        let missing = target_pages - self.total_pages;
        for _ in 0..missing {
            self.append_empty_block()?;
        }
        Ok(())
    }

    /// Current cursor position, without any I/O.
    ///
    /// `None` on a closed handle.
    pub fn block_pos(&self) -> Option<PageNum> {
        self.file.as_ref().map(|_| self.cur_page)
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for PageFile {
    fn drop(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(err) = write_back_page_count(&mut file, self.total_pages) {
                warn!(path = %self.path.display(), %err, "header writeback failed on drop");
            }
        }
    }
}

/// Patch the page_count field of an already-written header in place.
fn write_back_page_count(file: &mut File, total_pages: usize) -> PageFileResult<()> {
    file.seek(SeekFrom::Start(FileHeader::PAGE_COUNT_OFFSET))
        .map_err(|e| PageFileError::WriteFailed(format!("header seek: {}", e)))?;
    file.write_all(&(total_pages as u32).to_le_bytes())
        .map_err(|e| PageFileError::WriteFailed(format!("header update: {}", e)))?;
    Ok(())
}
