use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const RTL_ARABIC_SUBTAGS: [&str; 7] = ["ar", "ur", "fa", "ps", "sd", "ug", "ckb"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageClass {
    Default,
    RtlArabicScript,
}

impl LanguageClass {
    pub fn of(language: &str) -> Self {
        let primary = language
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if RTL_ARABIC_SUBTAGS.contains(&primary.as_str()) {
            LanguageClass::RtlArabicScript
        } else {
            LanguageClass::Default
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LanguageClass::Default => "default",
            LanguageClass::RtlArabicScript => "rtl-arabic-script",
        }
    }
}

#[derive(Debug)]
pub struct FontResolver {
    font_dir: PathBuf,
    cache: Mutex<HashMap<PathBuf, Option<Arc<Vec<u8>>>>>,
}

impl FontResolver {
    pub fn new(font_dir: impl AsRef<Path>) -> Self {
        Self {
            font_dir: font_dir.as_ref().to_path_buf(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn font_dir(&self) -> &Path {
        &self.font_dir
    }

    pub fn resolve(&self, language: &str, font_size: f32) -> ResolvedFont {
        let size = if font_size.is_finite() {
            font_size.max(0.0)
        } else {
            0.0
        };
        let class = LanguageClass::of(language);
        for path in self.candidate_paths(class) {
            if let Some(data) = self.load_candidate(&path) {
                return ResolvedFont {
                    source: FontSource::File { path, data },
                    size,
                };
            }
        }
        tracing::debug!(language, "no font candidate loadable, using builtin bitmap font");
        ResolvedFont::builtin(size)
    }

    pub fn report(&self) -> FontReport {
        let mut entries: Vec<String> = fs::read_dir(&self.font_dir)
            .map(|dir| {
                dir.flatten()
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        entries.sort();

        let classes = [LanguageClass::RtlArabicScript, LanguageClass::Default]
            .into_iter()
            .map(|class| FontClassReport {
                class: class.as_str(),
                candidates: self
                    .candidate_paths(class)
                    .into_iter()
                    .map(|path| {
                        let exists = path.is_file();
                        let loadable = exists && read_face_bytes(&path).is_some();
                        FontCandidateReport {
                            path: path.display().to_string(),
                            exists,
                            loadable,
                        }
                    })
                    .collect(),
            })
            .collect();

        FontReport {
            font_dir: self.font_dir.display().to_string(),
            font_dir_exists: self.font_dir.is_dir(),
            font_dir_entries: entries,
            classes,
        }
    }

    fn candidate_paths(&self, class: LanguageClass) -> Vec<PathBuf> {
        match class {
            LanguageClass::RtlArabicScript => vec![
                self.font_dir.join("NotoNastaliqUrdu-Regular.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/noto/NotoNastaliqUrdu-Regular.ttf"),
            ],
            LanguageClass::Default => vec![
                self.font_dir.join("ARIAL.TTF"),
                self.font_dir.join("Montserrat-Regular.ttf"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
                PathBuf::from("/System/Library/Fonts/Helvetica.ttc"),
            ],
        }
    }

    fn load_candidate(&self, path: &Path) -> Option<Arc<Vec<u8>>> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(entry) = cache.get(path) {
                return entry.clone();
            }
        }
        let loaded = read_face_bytes(path);
        if loaded.is_none() {
            tracing::debug!(path = %path.display(), "font candidate skipped");
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(path.to_path_buf(), loaded.clone());
        }
        loaded
    }
}

fn read_face_bytes(path: &Path) -> Option<Arc<Vec<u8>>> {
    let bytes = fs::read(path).ok()?;
    ttf_parser::Face::parse(&bytes, 0).ok()?;
    Some(Arc::new(bytes))
}

#[derive(Debug, Clone)]
pub struct ResolvedFont {
    pub(crate) source: FontSource,
    pub(crate) size: f32,
}

#[derive(Debug, Clone)]
pub(crate) enum FontSource {
    File { path: PathBuf, data: Arc<Vec<u8>> },
    Builtin,
}

impl ResolvedFont {
    pub(crate) fn builtin(size: f32) -> Self {
        Self {
            source: FontSource::Builtin,
            size: size.max(0.0),
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.source, FontSource::Builtin)
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FontSource::File { path, .. } => Some(path),
            FontSource::Builtin => None,
        }
    }

    pub(crate) fn file_data(&self) -> Option<&[u8]> {
        match &self.source {
            FontSource::File { data, .. } => Some(data),
            FontSource::Builtin => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FontReport {
    pub font_dir: String,
    pub font_dir_exists: bool,
    pub font_dir_entries: Vec<String>,
    pub classes: Vec<FontClassReport>,
}

#[derive(Debug, Serialize)]
pub struct FontClassReport {
    pub class: &'static str,
    pub candidates: Vec<FontCandidateReport>,
}

#[derive(Debug, Serialize)]
pub struct FontCandidateReport {
    pub path: String,
    pub exists: bool,
    pub loadable: bool,
}

// Builtin bitmap font: 5x7 cells on an 8-unit em, one u8 row per scanline
// with bit 4 as the leftmost column. Last-resort fallback when no candidate
// font file loads.
pub(crate) const BUILTIN_UNITS_PER_EM: f32 = 8.0;
pub(crate) const BUILTIN_ASCENT_UNITS: f32 = 7.0;
pub(crate) const BUILTIN_ADVANCE_UNITS: f32 = 6.0;
pub(crate) const BUILTIN_GLYPH_ROWS: usize = 7;
pub(crate) const BUILTIN_GLYPH_COLS: usize = 5;

const BUILTIN_TOFU: [u8; 7] = [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F];

#[rustfmt::skip]
const BUILTIN_GLYPHS: [[u8; 7]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x04, 0x04, 0x04, 0x04, 0x00, 0x00, 0x04], // '!'
    [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00], // '"'
    [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A], // '#'
    [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04], // '$'
    [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03], // '%'
    [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D], // '&'
    [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00], // '\''
    [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02], // '('
    [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08], // ')'
    [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00], // '*'
    [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00], // '+'
    [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08], // ','
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00], // '-'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C], // '.'
    [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00], // '/'
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // '0'
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // '1'
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // '2'
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // '3'
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // '4'
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // '5'
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // '6'
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // '7'
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // '8'
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // '9'
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00], // ':'
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08], // ';'
    [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02], // '<'
    [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00], // '='
    [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08], // '>'
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04], // '?'
    [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E], // '@'
    [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11], // 'A'
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // 'B'
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // 'C'
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C], // 'D'
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // 'E'
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // 'F'
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // 'G'
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // 'H'
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // 'I'
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // 'J'
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // 'K'
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // 'L'
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // 'M'
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // 'N'
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // 'O'
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // 'P'
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // 'Q'
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // 'R'
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // 'S'
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // 'T'
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // 'U'
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // 'V'
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // 'W'
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // 'X'
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // 'Y'
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // 'Z'
    [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E], // '['
    [0x00, 0x10, 0x08, 0x04, 0x02, 0x01, 0x00], // '\\'
    [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E], // ']'
    [0x04, 0x0A, 0x11, 0x00, 0x00, 0x00, 0x00], // '^'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F], // '_'
    [0x08, 0x04, 0x02, 0x00, 0x00, 0x00, 0x00], // '`'
    [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F], // 'a'
    [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x1E], // 'b'
    [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E], // 'c'
    [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F], // 'd'
    [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E], // 'e'
    [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08], // 'f'
    [0x00, 0x0F, 0x11, 0x11, 0x0F, 0x01, 0x0E], // 'g'
    [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11], // 'h'
    [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E], // 'i'
    [0x02, 0x00, 0x06, 0x02, 0x02, 0x12, 0x0C], // 'j'
    [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12], // 'k'
    [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // 'l'
    [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11], // 'm'
    [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11], // 'n'
    [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E], // 'o'
    [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10], // 'p'
    [0x00, 0x00, 0x0D, 0x13, 0x0F, 0x01, 0x01], // 'q'
    [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10], // 'r'
    [0x00, 0x00, 0x0E, 0x10, 0x0E, 0x01, 0x1E], // 's'
    [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06], // 't'
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D], // 'u'
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04], // 'v'
    [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A], // 'w'
    [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11], // 'x'
    [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E], // 'y'
    [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F], // 'z'
    [0x02, 0x04, 0x04, 0x08, 0x04, 0x04, 0x02], // '{'
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // '|'
    [0x08, 0x04, 0x04, 0x02, 0x04, 0x04, 0x08], // '}'
    [0x00, 0x00, 0x08, 0x15, 0x02, 0x00, 0x00], // '~'
];

pub(crate) fn builtin_glyph_rows(ch: char) -> [u8; 7] {
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        return BUILTIN_GLYPHS[(code - 0x20) as usize];
    }
    if ch.is_whitespace() {
        return [0; 7];
    }
    BUILTIN_TOFU
}
