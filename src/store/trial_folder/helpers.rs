// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Retrace-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Retrace and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

trait Versioned {
    fn version(&self) -> u32;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerFileJson {
    version: u32,
    #[serde(default)]
    visits: Vec<LedgerRowJson>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct LedgerRowJson {
    screen_id: ScreenId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlagsFileJson {
    version: u32,
    #[serde(default)]
    edited: bool,
    #[serde(default)]
    is_wrong: bool,
    #[serde(default)]
    wrong_answer_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FixationsFileJson {
    version: u32,
    #[serde(default)]
    fixations: Vec<Fixation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LinesFileJson {
    version: u32,
    #[serde(default)]
    lines: Vec<LineRowJson>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct LineRowJson {
    y: i32,
}

impl Versioned for LedgerFileJson {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for FlagsFileJson {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for FixationsFileJson {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for LinesFileJson {
    fn version(&self) -> u32 {
        self.version
    }
}

fn fixations_to_json(fixations: &FixationSet) -> FixationsFileJson {
    FixationsFileJson {
        version: FORMAT_VERSION,
        fixations: fixations.fixations().to_vec(),
    }
}

fn lines_to_json(lines: &LineBoundarySet) -> LinesFileJson {
    LinesFileJson {
        version: FORMAT_VERSION,
        lines: lines
            .boundaries()
            .iter()
            .map(|y| LineRowJson { y: *y })
            .collect(),
    }
}

fn lines_from_json(path: &Path, doc: LinesFileJson) -> Result<LineBoundarySet, StoreError> {
    LineBoundarySet::new(doc.lines.into_iter().map(|row| row.y).collect()).map_err(|source| {
        StoreError::InvalidLineBoundaries {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn read_versioned<T: DeserializeOwned + Versioned>(path: &Path) -> Result<T, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: T = serde_json::from_str(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if doc.version() > FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: doc.version(),
            supported: FORMAT_VERSION,
        });
    }

    Ok(doc)
}

/// The two kinds of per-visit files kept in a screen directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssetKind {
    Fixations,
    Lines,
}

impl AssetKind {
    fn stem(self) -> &'static str {
        match self {
            Self::Fixations => "fixations",
            Self::Lines => "lines",
        }
    }

    /// Visit 0 is unsuffixed; visit `i > 0` is `<stem>_<i>.json`.
    fn file_name(self, index: usize) -> String {
        if index == 0 {
            format!("{}.json", self.stem())
        } else {
            format!("{}_{index}.json", self.stem())
        }
    }
}

fn asset_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(fixations|lines)(?:_([1-9][0-9]*))?\.json$").expect("asset file regex")
    })
}

fn parse_asset_file_name(file_name: &str) -> Option<(AssetKind, usize)> {
    let caps = asset_file_re().captures(file_name)?;
    let kind = match caps.get(1)?.as_str() {
        "fixations" => AssetKind::Fixations,
        _ => AssetKind::Lines,
    };
    let index = match caps.get(2) {
        Some(raw) => raw.as_str().parse::<usize>().ok()?,
        None => 0,
    };
    Some((kind, index))
}

fn screen_dir_name(screen_id: ScreenId) -> String {
    format!("{SCREEN_DIR_PREFIX}{screen_id}")
}

fn staging_dir_name(screen_id: ScreenId) -> String {
    format!(".{SCREEN_DIR_PREFIX}{screen_id}.staging")
}

fn backup_dir_name(screen_id: ScreenId) -> String {
    format!(".{SCREEN_DIR_PREFIX}{screen_id}.old")
}

/// Leftover directories of an interrupted staged swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwapLeftover {
    Staging(ScreenId),
    Backup(ScreenId),
}

/// Screen id as written by [`screen_dir_name`]: plain decimal digits, no sign, whitespace or
/// leading zero. Anything else names a directory this store never creates.
fn parse_dir_screen_id(raw: &str) -> Option<ScreenId> {
    if raw.starts_with('0') || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().and_then(|value| ScreenId::new(value).ok())
}

fn parse_screen_dir_name(name: &str) -> Option<ScreenId> {
    parse_dir_screen_id(name.strip_prefix(SCREEN_DIR_PREFIX)?)
}

fn parse_swap_leftover(name: &str) -> Option<SwapLeftover> {
    let rest = name.strip_prefix('.')?.strip_prefix(SCREEN_DIR_PREFIX)?;
    if let Some(id) = rest.strip_suffix(".staging") {
        return parse_dir_screen_id(id).map(SwapLeftover::Staging);
    }
    if let Some(id) = rest.strip_suffix(".old") {
        return parse_dir_screen_id(id).map(SwapLeftover::Backup);
    }
    None
}

fn refuse_symlink(path: &Path) -> Result<bool, StoreError> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => Err(StoreError::SymlinkRefused {
            path: path.to_path_buf(),
        }),
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn remove_dir_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn rename_dir(from: &Path, to: &Path) -> Result<(), StoreError> {
    fs::rename(from, to).map_err(|source| StoreError::Io {
        path: to.to_path_buf(),
        source,
    })
}

fn sync_dir(path: &Path, durability: WriteDurability) -> Result<(), StoreError> {
    if durability != WriteDurability::Durable {
        return Ok(());
    }

    #[cfg(unix)]
    {
        let dir = fs::File::open(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        dir.sync_all().map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

/// Creates `path`, which must not exist yet, with `contents`.
fn write_new_file(path: &Path, contents: &[u8], durability: WriteDurability) -> Result<(), StoreError> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    file.write_all(contents).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(())
}

fn json_bytes<T: Serialize>(path: &Path, value: &T) -> Result<Vec<u8>, StoreError> {
    let mut raw = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    raw.push(b'\n');
    Ok(raw)
}

/// Replaces `path` through a temp file in the same directory and a rename.
pub(super) fn write_atomic(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no parent"),
        });
    };

    let Some(file_name) = path.file_name() else {
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source: io::Error::other("path has no file name"),
        });
    };

    fs::create_dir_all(parent).map_err(|source| StoreError::Io {
        path: parent.to_path_buf(),
        source,
    })?;
    refuse_symlink(path)?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".retrace.tmp.{}.{}",
        file_name.to_string_lossy(),
        nanos
    ));

    write_new_file(&tmp_path, contents, durability)?;

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    sync_dir(parent, durability)
}
