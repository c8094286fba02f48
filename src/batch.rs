use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::Arc;

use rand::RngCore;
use thiserror::Error;
use tracing::{debug, error, info};
use workerpool::thunk::{Thunk, ThunkWorker};
use workerpool::Pool;

use crypto::{CipherConfig, CipherError};

pub const ENCRYPTED_EXTENSION: &str = "enc";
pub const DECRYPTED_EXTENSION: &str = "dec";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("cannot read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("{}: {source}", .path.display())]
    Cipher { path: PathBuf, source: CipherError },

    #[error("{} is shorter than its IV block", .0.display())]
    MissingIv(PathBuf),

    #[error("{} has no file name", .0.display())]
    IncorrectFilePath(PathBuf),

    #[error("{} maps to an output already produced by another input", .0.display())]
    DuplicateTarget(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// Encrypts or decrypts many files on a worker pool. Every job builds its own
/// context, so workers never contend on a lock.
pub struct Batch {
    config: CipherConfig,
    key: Arc<Vec<u8>>,
    n_workers: usize,
}

impl Batch {
    pub fn new(config: CipherConfig, key: Vec<u8>, n_workers: usize) -> Self {
        Self {
            config,
            key: Arc::new(key),
            n_workers: n_workers.max(1),
        }
    }

    /// Processes every file under `sources` (directories are walked) into
    /// `output_dir`, keeping each file's path relative to its source root.
    /// Returns the output path or the error for each input file.
    pub fn run(&self, direction: Direction, sources: &[PathBuf], output_dir: &Path) -> Result<Vec<Result<PathBuf, BatchError>>, BatchError> {
        fs::create_dir_all(output_dir).map_err(|source| BatchError::Write { path: output_dir.to_owned(), source })?;

        let mut jobs = Vec::new();
        for source in sources {
            if source.is_dir() {
                let files = collect_files(source).map_err(|e| BatchError::Read { path: source.clone(), source: e })?;
                for file in files {
                    let relative = file.strip_prefix(source).map(Path::to_path_buf).unwrap_or_else(|_| file.clone());
                    jobs.push((file, relative));
                }
            } else {
                jobs.push((source.clone(), PathBuf::new()));
            }
        }

        // two inputs must never race on one output file
        let mut results = Vec::new();
        let mut targets = Vec::new();
        let mut seen = HashSet::new();
        for (path, relative) in jobs {
            let target = match target_path(direction, &path, &relative, output_dir) {
                Ok(target) => target,
                Err(e) => {
                    results.push(Err(e));
                    continue;
                }
            };

            if seen.insert(target.clone()) {
                targets.push((path, target));
            } else {
                results.push(Err(BatchError::DuplicateTarget(path)));
            }
        }

        let n_jobs = targets.len();
        info!(files = n_jobs, workers = self.n_workers, config = %self.config, ?direction, "batch started");

        let workers = Pool::<ThunkWorker<Result<PathBuf, BatchError>>>::new(self.n_workers);
        let (tx, rx) = channel();

        for (path, target) in targets {
            let config = self.config;
            let key = Arc::clone(&self.key);

            workers.execute_to(tx.clone(), Thunk::of(move || {
                match direction {
                    Direction::Encrypt => worker_encrypt(&path, &target, &config, &key),
                    Direction::Decrypt => worker_decrypt(&path, &target, &config, &key),
                }
            }));
        }

        let mut finished = 0;
        let processed: Vec<Result<PathBuf, BatchError>> = rx.iter()
            .take(n_jobs)
            .inspect(|result| match result {
                Ok(path) => {
                    finished += 1;
                    debug!(finished, total = n_jobs, path = %path.display(), "file done");
                }
                Err(e) => error!(error = %e, "file failed"),
            })
            .collect();

        for e in results.iter().filter_map(|r| r.as_ref().err()) {
            error!(error = %e, "file skipped");
        }
        info!(succeeded = finished, failed = n_jobs + results.len() - finished, "batch finished");

        results.extend(processed);
        Ok(results)
    }
}

/// Output file for `path`: its walk-relative directory under `output_dir`,
/// with `.enc` appended on encrypt and stripped (or `.dec` appended) on decrypt.
fn target_path(direction: Direction, path: &Path, relative: &Path, output_dir: &Path) -> Result<PathBuf, BatchError> {
    let name = file_name(path)?;
    let dir = match relative.parent() {
        Some(parent) => output_dir.join(parent),
        None => output_dir.to_owned(),
    };

    let target = match direction {
        Direction::Encrypt => dir.join(format!("{name}.{ENCRYPTED_EXTENSION}")),
        Direction::Decrypt => match name.strip_suffix(&format!(".{ENCRYPTED_EXTENSION}")) {
            Some(stem) if !stem.is_empty() => dir.join(stem),
            _ => dir.join(format!("{name}.{DECRYPTED_EXTENSION}")),
        },
    };

    Ok(target)
}

fn worker_encrypt(path: &Path, target: &Path, config: &CipherConfig, key: &[u8]) -> Result<PathBuf, BatchError> {
    let body = fs::read(path).map_err(|source| BatchError::Read { path: path.to_owned(), source })?;
    let cipher_err = |source| BatchError::Cipher { path: path.to_owned(), source };

    let mut iv = vec![0u8; config.algorithm.block_size()];
    rand::thread_rng().fill_bytes(&mut iv);

    let ctx = config.build(key, &iv).map_err(cipher_err)?;
    let ciphertext = ctx.encrypt(&body).map_err(cipher_err)?;

    // IV travels as the first block
    let mut output = iv;
    output.extend_from_slice(&ciphertext);
    write_target(target, &output)?;

    Ok(target.to_owned())
}

fn worker_decrypt(path: &Path, target: &Path, config: &CipherConfig, key: &[u8]) -> Result<PathBuf, BatchError> {
    let body = fs::read(path).map_err(|source| BatchError::Read { path: path.to_owned(), source })?;
    let cipher_err = |source| BatchError::Cipher { path: path.to_owned(), source };

    let block_size = config.algorithm.block_size();
    if body.len() < block_size {
        return Err(BatchError::MissingIv(path.to_owned()));
    }

    let (iv, ciphertext) = body.split_at(block_size);
    let ctx = config.build(key, iv).map_err(cipher_err)?;
    let plaintext = ctx.decrypt(ciphertext).map_err(cipher_err)?;
    write_target(target, &plaintext)?;

    Ok(target.to_owned())
}

fn write_target(target: &Path, body: &[u8]) -> Result<(), BatchError> {
    let write_err = |source| BatchError::Write { path: target.to_owned(), source };

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(target, body).map_err(write_err)
}

fn file_name(path: &Path) -> Result<String, BatchError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| BatchError::IncorrectFilePath(path.to_owned()))
}

/// Regular files below `dir`, symlinks skipped.
pub fn collect_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type()?.is_symlink() {
            continue;
        }

        if path.is_dir() {
            paths.extend(collect_files(&path)?);
        } else {
            paths.push(path);
        }
    }

    Ok(paths)
}


#[cfg(test)]
mod batch_test {
    use super::*;
    use crypto::{Algorithm, Mode, Padding};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("blockcrypt-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn batch(mode: Mode) -> Batch {
        let config = CipherConfig::new(Algorithm::Twofish, mode, Padding::Pkcs7);
        Batch::new(config, b"0123456789abcdef0123456789abcdef".to_vec(), 3)
    }

    #[test]
    fn encrypt_decrypt_many_files() {
        let dir = scratch_dir("roundtrip");
        let src = dir.join("src");
        fs::create_dir_all(src.join("nested")).unwrap();

        let files = [
            (src.join("empty.txt"), Vec::new()),
            (src.join("short.txt"), b"hello".to_vec()),
            (src.join("nested").join("long.bin"), (0..5000u32).map(|i| (i % 251) as u8).collect()),
        ];
        for (path, body) in &files {
            fs::write(path, body).unwrap();
        }

        let b = batch(Mode::Cbc);
        let encrypted = b.run(Direction::Encrypt, &[src.clone()], &dir.join("enc")).unwrap();
        assert_eq!(encrypted.len(), 3);

        let encrypted: Vec<PathBuf> = encrypted.into_iter().map(|r| r.unwrap()).collect();
        for path in &encrypted {
            let len = fs::metadata(path).unwrap().len() as usize;
            assert_eq!(len % 16, 0);
            assert!(len >= 32);
        }

        let decrypted = b.run(Direction::Decrypt, &encrypted, &dir.join("dec")).unwrap();
        assert!(decrypted.iter().all(|r| r.is_ok()));

        for (path, body) in &files {
            let restored = fs::read(dir.join("dec").join(path.file_name().unwrap())).unwrap();
            assert_eq!(&restored, body);
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn same_file_gets_fresh_iv() {
        let dir = scratch_dir("fresh-iv");
        let src = dir.join("plain.txt");
        fs::write(&src, b"identical content").unwrap();

        let b = batch(Mode::Ctr);
        let first = b.run(Direction::Encrypt, &[src.clone()], &dir.join("a")).unwrap();
        let second = b.run(Direction::Encrypt, &[src.clone()], &dir.join("b")).unwrap();

        let first = fs::read(first[0].as_ref().unwrap()).unwrap();
        let second = fs::read(second[0].as_ref().unwrap()).unwrap();
        assert_ne!(first[..16], second[..16]);
        assert_ne!(first[16..], second[16..]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn errors_are_reported_per_file() {
        let dir = scratch_dir("errors");
        let tiny = dir.join("tiny.enc");
        let misaligned = dir.join("misaligned.enc");
        fs::write(&tiny, [1u8; 5]).unwrap();
        fs::write(&misaligned, [1u8; 20]).unwrap();

        let b = batch(Mode::Cbc);
        let results = b.run(Direction::Decrypt, &[tiny, misaligned, dir.join("missing.enc")], &dir.join("out")).unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().any(|r| matches!(r, Err(BatchError::MissingIv(_)))));
        assert!(results.iter().any(|r| matches!(r, Err(BatchError::Read { .. }))));
        assert!(results.iter().any(|r| matches!(
            r,
            Err(BatchError::Cipher { source: CipherError::InvalidInputLength { .. }, .. })
        )));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn wrong_key_fails_or_garbles() {
        let dir = scratch_dir("wrong-key");
        let src = dir.join("secret.txt");
        fs::write(&src, b"attack at dawn").unwrap();

        let encrypted = batch(Mode::Cbc).run(Direction::Encrypt, &[src], &dir.join("enc")).unwrap();
        let encrypted = vec![encrypted.into_iter().next().unwrap().unwrap()];

        let config = CipherConfig::new(Algorithm::Twofish, Mode::Cbc, Padding::Pkcs7);
        let other = Batch::new(config, b"a completely different key 1234!".to_vec(), 1);
        let results = other.run(Direction::Decrypt, &encrypted, &dir.join("dec")).unwrap();

        match &results[0] {
            Ok(path) => assert_ne!(fs::read(path).unwrap(), b"attack at dawn"),
            Err(e) => assert!(matches!(e, BatchError::Cipher { .. })),
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn same_name_in_sibling_directories() {
        let dir = scratch_dir("siblings");
        let src = dir.join("src");
        fs::create_dir_all(src.join("a")).unwrap();
        fs::create_dir_all(src.join("b")).unwrap();
        fs::write(src.join("a").join("x.txt"), b"from a").unwrap();
        fs::write(src.join("b").join("x.txt"), b"from b, a bit longer").unwrap();

        let b = batch(Mode::Ofb);
        let encrypted = b.run(Direction::Encrypt, &[src.clone()], &dir.join("enc")).unwrap();
        assert_eq!(encrypted.len(), 2);
        assert!(encrypted.iter().all(|r| r.is_ok()));
        assert!(dir.join("enc").join("a").join("x.txt.enc").is_file());
        assert!(dir.join("enc").join("b").join("x.txt.enc").is_file());

        let decrypted = b.run(Direction::Decrypt, &[dir.join("enc")], &dir.join("dec")).unwrap();
        assert!(decrypted.iter().all(|r| r.is_ok()));
        assert_eq!(fs::read(dir.join("dec").join("a").join("x.txt")).unwrap(), b"from a");
        assert_eq!(fs::read(dir.join("dec").join("b").join("x.txt")).unwrap(), b"from b, a bit longer");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn colliding_explicit_files_are_refused() {
        let dir = scratch_dir("collide");
        fs::create_dir_all(dir.join("a")).unwrap();
        fs::create_dir_all(dir.join("b")).unwrap();
        fs::write(dir.join("a").join("x.txt"), b"first").unwrap();
        fs::write(dir.join("b").join("x.txt"), b"second").unwrap();

        let sources = [dir.join("a").join("x.txt"), dir.join("b").join("x.txt")];
        let results = batch(Mode::Cbc).run(Direction::Encrypt, &sources, &dir.join("enc")).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(r, Err(BatchError::DuplicateTarget(p)) if p == &sources[1])));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn target_names() {
        let out = Path::new("out");

        let t = target_path(Direction::Encrypt, Path::new("src/a/x.txt"), Path::new("a/x.txt"), out).unwrap();
        assert_eq!(t, Path::new("out/a/x.txt.enc"));

        let t = target_path(Direction::Decrypt, Path::new("enc/x.txt.enc"), Path::new(""), out).unwrap();
        assert_eq!(t, Path::new("out/x.txt"));

        let t = target_path(Direction::Decrypt, Path::new("enc/.enc"), Path::new(""), out).unwrap();
        assert_eq!(t, Path::new("out/.enc.dec"));

        let r = target_path(Direction::Encrypt, Path::new(".."), Path::new(""), out);
        assert!(matches!(r, Err(BatchError::IncorrectFilePath(_))));
    }

    #[test]
    fn collect_files_walks_tree() {
        let dir = scratch_dir("walk");
        fs::create_dir_all(dir.join("a").join("b")).unwrap();
        fs::write(dir.join("one"), b"1").unwrap();
        fs::write(dir.join("a").join("two"), b"2").unwrap();
        fs::write(dir.join("a").join("b").join("three"), b"3").unwrap();

        let paths = collect_files(&dir).unwrap();
        assert_eq!(paths.len(), 3);
        for suffix in ["one", "a/two", "a/b/three"] {
            assert!(paths.iter().any(|p| p.ends_with(suffix)), "{suffix}");
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
