//! The current-archive slot
//!
//! Some hooks (the script runtime's file-open callback) have no way to be
//! handed an [`Archive`]. For those, one archive can be installed into a
//! per-thread slot for an explicit lifetime: [`install`] puts it there and
//! the returned guard removes and closes it. The slot is never filled
//! implicitly. Code that can take an `&mut Archive` should do so instead.

use crate::archive::Archive;
use crate::error::{PackError, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::marker::PhantomData;
use std::path::Path;

thread_local! {
    static CURRENT: RefCell<Option<Archive>> = const { RefCell::new(None) };
}

/// Keeps an archive installed as current; uninstalls and closes it on drop
#[must_use = "dropping the guard uninstalls the archive immediately"]
pub struct CurrentArchiveGuard {
    _not_send: PhantomData<*const ()>,
}

impl CurrentArchiveGuard {
    /// Uninstall the archive and hand it back instead of closing it
    pub fn take(self) -> Option<Archive> {
        let archive = uninstall();
        std::mem::forget(self);
        archive
    }
}

impl Drop for CurrentArchiveGuard {
    fn drop(&mut self) {
        if let Some(archive) = uninstall() {
            archive.close();
        }
    }
}

/// Install `archive` as the current archive of this thread
///
/// Only one archive can be current; installing a second one fails and
/// closes the archive that was passed in.
pub fn install(archive: Archive) -> Result<CurrentArchiveGuard> {
    let rejected = CURRENT.with(|slot| match slot.try_borrow_mut() {
        Ok(mut slot) if slot.is_none() => {
            tracing::debug!("Installed `{}` as current archive", archive.path().display());
            *slot = Some(archive);
            None
        }
        Ok(_) => Some((archive, PackError::CurrentArchiveInstalled)),
        Err(_) => Some((archive, PackError::CurrentArchiveBusy)),
    });

    match rejected {
        None => Ok(CurrentArchiveGuard {
            _not_send: PhantomData,
        }),
        Some((archive, err)) => {
            archive.close();
            Err(err)
        }
    }
}

fn uninstall() -> Option<Archive> {
    CURRENT.with(|slot| slot.try_borrow_mut().ok().and_then(|mut slot| slot.take()))
}

/// True while an archive is installed on this thread
pub fn is_installed() -> bool {
    CURRENT.with(|slot| slot.try_borrow().map(|s| s.is_some()).unwrap_or(true))
}

/// Run `f` against the current archive
///
/// Calls may not nest; a nested call fails with
/// [`PackError::CurrentArchiveBusy`].
pub fn with_current<T>(f: impl FnOnce(&mut Archive) -> Result<T>) -> Result<T> {
    CURRENT.with(|slot| {
        let mut slot = slot
            .try_borrow_mut()
            .map_err(|_| PackError::CurrentArchiveBusy)?;
        let archive = slot.as_mut().ok_or(PackError::NoCurrentArchive)?;
        f(archive)
    })
}

/// A file opened through [`open_read`]
#[derive(Debug)]
pub enum ScriptSource {
    /// Bytes of a packed resource
    Packed(Cursor<Vec<u8>>),
    /// A file on the host filesystem
    Disk(BufReader<File>),
}

impl Read for ScriptSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ScriptSource::Packed(cursor) => cursor.read(buf),
            ScriptSource::Disk(file) => file.read(buf),
        }
    }
}

/// File-open hook for the script runtime
///
/// Resolves `path` in the current archive first. The resource is read
/// through the archive's stream so the shared cursor is not left mid-read
/// when the hook returns. Paths not in the pack fall back to the host
/// filesystem.
pub fn open_read(path: &str) -> Result<ScriptSource> {
    let packed = with_current(|archive| match archive.lookup(path) {
        Ok(id) => {
            let mut stream = archive.stream_resource(id)?;
            let mut data = Vec::new();
            data.try_reserve_exact(stream.size() as usize)
                .map_err(|e| PackError::oom("script source", e))?;
            stream.read_to_end(&mut data)?;
            Ok(Some(data))
        }
        Err(e) if e.is_missing_key() => Ok(None),
        Err(e) => Err(e),
    })?;

    match packed {
        Some(data) => Ok(ScriptSource::Packed(Cursor::new(data))),
        None => {
            tracing::debug!("`{}` is not packed, opening from disk", path);
            let file = File::open(Path::new(path))?;
            Ok(ScriptSource::Disk(BufReader::new(file)))
        }
    }
}
