//! Hash verifier pool: hashes candidate files and forwards only the ones
//! that mismatch on to the fetcher.
//!
//! `distribute` is the moral equivalent of the original's single forked
//! `md5sum_verifier` helper, generalized from "one worker" to a small pool:
//! each inbound record is handed to whichever worker's inbox is currently
//! empty, or, if every worker is busy and the pool hasn't reached
//! `max_workers` yet, a new worker is spun up. `flume::Sender::is_empty`
//! gives a cheap "is this one free" signal without needing any extra
//! bookkeeping channel back from the workers.

use apt_diff_types::hash::Hash;
use apt_diff_types::pipeline::FetchRecord;
use apt_diff_types::pipeline::HashCheckRecord;
use std::io::Read;
use std::path::Path;
use std::thread::Scope;

pub(super) fn spawn_pool<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    input: flume::Receiver<HashCheckRecord>,
    max_workers: usize,
) -> flume::Receiver<FetchRecord> {
    let (out_tx, out_rx) = flume::unbounded();
    scope.spawn(move || distribute(scope, input, out_tx, max_workers.max(1)));
    out_rx
}

fn distribute<'scope, 'env>(
    scope: &'scope Scope<'scope, 'env>,
    input: flume::Receiver<HashCheckRecord>,
    out_tx: flume::Sender<FetchRecord>,
    max_workers: usize,
) {
    let mut workers: Vec<flume::Sender<HashCheckRecord>> = Vec::new();
    let mut round_robin = 0usize;
    for record in input.iter() {
        let free_worker = workers.iter().position(flume::Sender::is_empty);
        let idx = match free_worker {
            Some(idx) => idx,
            None if workers.len() < max_workers => {
                let (worker_tx, worker_rx) = flume::unbounded();
                let worker_out = out_tx.clone();
                scope.spawn(move || run_worker(worker_rx, worker_out));
                workers.push(worker_tx);
                workers.len() - 1
            }
            None => {
                round_robin = (round_robin + 1) % workers.len();
                round_robin
            }
        };
        if workers[idx].send(record).is_err() {
            tracing::error!("hash verifier worker {idx} disappeared");
        }
    }
    // Dropping `workers` here closes every worker's inbox; each worker then
    // drains what it has left and drops its clone of `out_tx`. The merged
    // output channel only closes once every clone (including this
    // function's own `out_tx`, dropped when it returns) is gone.
}

fn run_worker(input: flume::Receiver<HashCheckRecord>, out: flume::Sender<FetchRecord>) {
    for record in input.iter() {
        match hash_mismatches(&record.path, record.hash) {
            Ok(false) => {}
            Ok(true) => {
                let fetch = FetchRecord {
                    pkg: record.pkg,
                    path: record.path,
                };
                if out.send(fetch).is_err() {
                    break;
                }
            }
            Err(err) => {
                tracing::error!("failed to hash {}: {err}", record.path.display());
            }
        }
    }
}

fn hash_mismatches(path: &Path, expected: Hash) -> std::io::Result<bool> {
    Ok(compute_md5(path)? != expected)
}

/// Hash `path`'s contents, memory-mapping non-empty regular files and
/// falling back to streamed reads when mapping isn't possible (empty files,
/// or filesystems/files that refuse `mmap`, e.g. some virtual filesystems).
fn compute_md5(path: &Path) -> std::io::Result<Hash> {
    let file = std::fs::File::open(path)?;
    let len = file.metadata()?.len();
    if len > 0 {
        // SAFETY: the file is opened read-only and not modified by us while
        // mapped; if another process truncates or rewrites it concurrently
        // the mapping may become invalid, a risk inherent to mmap'd files
        // whose size can change underneath the mapping.
        if let Ok(mmap) = unsafe { memmap2::Mmap::map(&file) } {
            return Ok(md5_of(&mmap));
        }
    }
    md5_stream(file)
}

fn md5_stream(mut file: std::fs::File) -> std::io::Result<Hash> {
    use md5::Digest;
    let mut hasher = md5::Md5::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(ref err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(finalize(hasher))
}

fn md5_of(bytes: &[u8]) -> Hash {
    use md5::Digest;
    let mut hasher = md5::Md5::new();
    hasher.update(bytes);
    finalize(hasher)
}

fn finalize(hasher: md5::Md5) -> Hash {
    use md5::Digest;
    let digest = hasher.finalize();
    let mut buf = [0u8; 16];
    buf.copy_from_slice(digest.as_slice());
    Hash(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_hashes_to_the_well_known_md5() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();
        let hash = compute_md5(&path).unwrap();
        assert_eq!(hash.to_string(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn mmap_and_stream_paths_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello");
        std::fs::write(&path, b"hello world\n").unwrap();
        let file = std::fs::File::open(&path).unwrap();
        // SAFETY: `path` is a freshly written, untouched-by-anyone-else temp file.
        let mapped = md5_of(&unsafe { memmap2::Mmap::map(&file) }.unwrap());
        let streamed = md5_stream(std::fs::File::open(&path).unwrap()).unwrap();
        assert_eq!(mapped, streamed);
    }
}
