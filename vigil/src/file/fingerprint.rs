use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;
use crate::common::constants::FINGERPRINT_CHUNK_LEN;
use crate::common::hash::{AlgorithmSet, DigestMap, HashAlgorithm};

/// Defines errors that can occur while fingerprinting a file.
//
// // 定义在计算文件指纹时可能发生的错误。
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// The file could not be opened, or a read failed partway.
    //
    // // 文件无法打开，或读取中途失败。
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The digests of one file together with the number of bytes they cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub digests: DigestMap,
    pub bytes_read: u64,
}

/// 单个算法的增量哈希状态
enum DigestState {
    Sha256(Sha256),
    Sha1(Sha1),
    Md5(Md5),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => DigestState::Sha256(Sha256::new()),
            HashAlgorithm::Sha1 => DigestState::Sha1(Sha1::new()),
            HashAlgorithm::Md5 => DigestState::Md5(Md5::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            DigestState::Sha256(h) => h.update(chunk),
            DigestState::Sha1(h) => h.update(chunk),
            DigestState::Md5(h) => h.update(chunk),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            DigestState::Sha256(h) => hex::encode(h.finalize()),
            DigestState::Sha1(h) => hex::encode(h.finalize()),
            DigestState::Md5(h) => hex::encode(h.finalize()),
        }
    }
}

/// Computes every requested digest of `reader` in a single pass.
///
/// Content is consumed in fixed-size chunks, so memory use does not depend on
/// the length of the stream.
pub fn fingerprint_reader<R: Read>(mut reader: R, algorithms: &AlgorithmSet) -> io::Result<Fingerprint> {
    let mut states: Vec<(HashAlgorithm, DigestState)> = algorithms
        .iter()
        .map(|a| (a, DigestState::new(a)))
        .collect();
    let mut buffer = vec![0u8; FINGERPRINT_CHUNK_LEN];
    let mut bytes_read: u64 = 0;

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for (_, state) in states.iter_mut() {
            state.update(&buffer[..n]);
        }
        bytes_read += n as u64;
    }

    let digests = states
        .into_iter()
        .map(|(algorithm, state)| (algorithm, state.finalize_hex()))
        .collect();
    Ok(Fingerprint { digests, bytes_read })
}

/// Opens `path` and fingerprints its full content.
///
/// # Errors
/// Returns `FingerprintError::Read` when the file cannot be opened or a read
/// fails. Callers scanning a tree treat this as "skip this file".
pub fn fingerprint_file(path: &Path, algorithms: &AlgorithmSet) -> Result<Fingerprint, FingerprintError> {
    let read_error = |source: io::Error| FingerprintError::Read {
        path: path.to_path_buf(),
        source,
    };
    let file = open_regular(path).map_err(read_error)?;
    fingerprint_reader(file, algorithms).map_err(read_error)
}

/// 打开文件并确认它仍是普通文件。在 Unix 上以非阻塞方式打开，
/// 被替换为 FIFO 的路径不会阻塞工作线程。
fn open_regular(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NONBLOCK);
    }
    let file = options.open(path)?;
    if !file.metadata()?.is_file() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
    }
    Ok(file)
}
