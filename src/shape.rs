use crate::font::LanguageClass;
use std::fmt;
use unicode_bidi::BidiInfo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedText(String);

impl ShapedText {
    pub fn from_raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ShapedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct TextShaper {
    enabled: bool,
}

impl TextShaper {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn shape(&self, text: &str, language: &str) -> ShapedText {
        if !self.enabled || LanguageClass::of(language) != LanguageClass::RtlArabicScript {
            return ShapedText(text.to_string());
        }
        let reshaped = reshape_arabic(text);
        ShapedText(reorder_visual(&reshaped))
    }
}

impl Default for TextShaper {
    fn default() -> Self {
        Self::new(true)
    }
}

const LAM: char = '\u{0644}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    Dual,
    Right,
    Isolated,
}

// (letter, joining class, isolated, final, initial, medial). Right-joining
// letters have no initial/medial form; the isolated/final values repeat so
// every entry carries four slots.
type FormsEntry = (char, Joining, char, char, char, char);

use Joining::{Dual, Isolated, Right};

#[rustfmt::skip]
const FORMS: &[FormsEntry] = &[
    ('\u{0621}', Isolated, '\u{FE80}', '\u{FE80}', '\u{FE80}', '\u{FE80}'), // hamza
    ('\u{0622}', Right, '\u{FE81}', '\u{FE82}', '\u{FE81}', '\u{FE82}'), // alef madda
    ('\u{0623}', Right, '\u{FE83}', '\u{FE84}', '\u{FE83}', '\u{FE84}'), // alef hamza above
    ('\u{0624}', Right, '\u{FE85}', '\u{FE86}', '\u{FE85}', '\u{FE86}'), // waw hamza
    ('\u{0625}', Right, '\u{FE87}', '\u{FE88}', '\u{FE87}', '\u{FE88}'), // alef hamza below
    ('\u{0626}', Dual, '\u{FE89}', '\u{FE8A}', '\u{FE8B}', '\u{FE8C}'), // yeh hamza
    ('\u{0627}', Right, '\u{FE8D}', '\u{FE8E}', '\u{FE8D}', '\u{FE8E}'), // alef
    ('\u{0628}', Dual, '\u{FE8F}', '\u{FE90}', '\u{FE91}', '\u{FE92}'), // beh
    ('\u{0629}', Right, '\u{FE93}', '\u{FE94}', '\u{FE93}', '\u{FE94}'), // teh marbuta
    ('\u{062A}', Dual, '\u{FE95}', '\u{FE96}', '\u{FE97}', '\u{FE98}'), // teh
    ('\u{062B}', Dual, '\u{FE99}', '\u{FE9A}', '\u{FE9B}', '\u{FE9C}'), // theh
    ('\u{062C}', Dual, '\u{FE9D}', '\u{FE9E}', '\u{FE9F}', '\u{FEA0}'), // jeem
    ('\u{062D}', Dual, '\u{FEA1}', '\u{FEA2}', '\u{FEA3}', '\u{FEA4}'), // hah
    ('\u{062E}', Dual, '\u{FEA5}', '\u{FEA6}', '\u{FEA7}', '\u{FEA8}'), // khah
    ('\u{062F}', Right, '\u{FEA9}', '\u{FEAA}', '\u{FEA9}', '\u{FEAA}'), // dal
    ('\u{0630}', Right, '\u{FEAB}', '\u{FEAC}', '\u{FEAB}', '\u{FEAC}'), // thal
    ('\u{0631}', Right, '\u{FEAD}', '\u{FEAE}', '\u{FEAD}', '\u{FEAE}'), // reh
    ('\u{0632}', Right, '\u{FEAF}', '\u{FEB0}', '\u{FEAF}', '\u{FEB0}'), // zain
    ('\u{0633}', Dual, '\u{FEB1}', '\u{FEB2}', '\u{FEB3}', '\u{FEB4}'), // seen
    ('\u{0634}', Dual, '\u{FEB5}', '\u{FEB6}', '\u{FEB7}', '\u{FEB8}'), // sheen
    ('\u{0635}', Dual, '\u{FEB9}', '\u{FEBA}', '\u{FEBB}', '\u{FEBC}'), // sad
    ('\u{0636}', Dual, '\u{FEBD}', '\u{FEBE}', '\u{FEBF}', '\u{FEC0}'), // dad
    ('\u{0637}', Dual, '\u{FEC1}', '\u{FEC2}', '\u{FEC3}', '\u{FEC4}'), // tah
    ('\u{0638}', Dual, '\u{FEC5}', '\u{FEC6}', '\u{FEC7}', '\u{FEC8}'), // zah
    ('\u{0639}', Dual, '\u{FEC9}', '\u{FECA}', '\u{FECB}', '\u{FECC}'), // ain
    ('\u{063A}', Dual, '\u{FECD}', '\u{FECE}', '\u{FECF}', '\u{FED0}'), // ghain
    ('\u{0640}', Dual, '\u{0640}', '\u{0640}', '\u{0640}', '\u{0640}'), // tatweel
    ('\u{0641}', Dual, '\u{FED1}', '\u{FED2}', '\u{FED3}', '\u{FED4}'), // feh
    ('\u{0642}', Dual, '\u{FED5}', '\u{FED6}', '\u{FED7}', '\u{FED8}'), // qaf
    ('\u{0643}', Dual, '\u{FED9}', '\u{FEDA}', '\u{FEDB}', '\u{FEDC}'), // kaf
    ('\u{0644}', Dual, '\u{FEDD}', '\u{FEDE}', '\u{FEDF}', '\u{FEE0}'), // lam
    ('\u{0645}', Dual, '\u{FEE1}', '\u{FEE2}', '\u{FEE3}', '\u{FEE4}'), // meem
    ('\u{0646}', Dual, '\u{FEE5}', '\u{FEE6}', '\u{FEE7}', '\u{FEE8}'), // noon
    ('\u{0647}', Dual, '\u{FEE9}', '\u{FEEA}', '\u{FEEB}', '\u{FEEC}'), // heh
    ('\u{0648}', Right, '\u{FEED}', '\u{FEEE}', '\u{FEED}', '\u{FEEE}'), // waw
    ('\u{0649}', Right, '\u{FEEF}', '\u{FEF0}', '\u{FEEF}', '\u{FEF0}'), // alef maksura
    ('\u{064A}', Dual, '\u{FEF1}', '\u{FEF2}', '\u{FEF3}', '\u{FEF4}'), // yeh
    ('\u{0671}', Right, '\u{FB50}', '\u{FB51}', '\u{FB50}', '\u{FB51}'), // alef wasla
    ('\u{0679}', Dual, '\u{FB66}', '\u{FB67}', '\u{FB68}', '\u{FB69}'), // tteh
    ('\u{067E}', Dual, '\u{FB56}', '\u{FB57}', '\u{FB58}', '\u{FB59}'), // peh
    ('\u{0686}', Dual, '\u{FB7A}', '\u{FB7B}', '\u{FB7C}', '\u{FB7D}'), // tcheh
    ('\u{0688}', Right, '\u{FB88}', '\u{FB89}', '\u{FB88}', '\u{FB89}'), // ddal
    ('\u{0691}', Right, '\u{FB8C}', '\u{FB8D}', '\u{FB8C}', '\u{FB8D}'), // rreh
    ('\u{0698}', Right, '\u{FB8A}', '\u{FB8B}', '\u{FB8A}', '\u{FB8B}'), // jeh
    ('\u{06A9}', Dual, '\u{FB8E}', '\u{FB8F}', '\u{FB90}', '\u{FB91}'), // keheh
    ('\u{06AF}', Dual, '\u{FB92}', '\u{FB93}', '\u{FB94}', '\u{FB95}'), // gaf
    ('\u{06BA}', Right, '\u{FB9E}', '\u{FB9F}', '\u{FB9E}', '\u{FB9F}'), // noon ghunna
    ('\u{06BB}', Dual, '\u{FBA0}', '\u{FBA1}', '\u{FBA2}', '\u{FBA3}'), // rnoon
    ('\u{06BE}', Dual, '\u{FBAA}', '\u{FBAB}', '\u{FBAC}', '\u{FBAD}'), // heh doachashmee
    ('\u{06C0}', Right, '\u{FBA4}', '\u{FBA5}', '\u{FBA4}', '\u{FBA5}'), // heh yeh above
    ('\u{06C1}', Dual, '\u{FBA6}', '\u{FBA7}', '\u{FBA8}', '\u{FBA9}'), // heh goal
    ('\u{06CC}', Dual, '\u{FBFC}', '\u{FBFD}', '\u{FBFE}', '\u{FBFF}'), // farsi yeh
    ('\u{06D2}', Right, '\u{FBAE}', '\u{FBAF}', '\u{FBAE}', '\u{FBAF}'), // yeh barree
    ('\u{06D3}', Right, '\u{FBB0}', '\u{FBB1}', '\u{FBB0}', '\u{FBB1}'), // yeh barree hamza
];

fn forms_entry(ch: char) -> Option<&'static FormsEntry> {
    FORMS
        .binary_search_by_key(&ch, |entry| entry.0)
        .ok()
        .map(|index| &FORMS[index])
}

fn is_harakat(ch: char) -> bool {
    matches!(
        ch as u32,
        0x0610..=0x061A
            | 0x064B..=0x065F
            | 0x0670
            | 0x06D6..=0x06DC
            | 0x06DF..=0x06E8
            | 0x06EA..=0x06ED
            | 0x08D4..=0x08E1
            | 0x08E3..=0x08FF
    )
}

fn lam_alef_ligature(alef: char, connects_prev: bool) -> Option<char> {
    let forms = match alef {
        '\u{0622}' => ('\u{FEF5}', '\u{FEF6}'),
        '\u{0623}' => ('\u{FEF7}', '\u{FEF8}'),
        '\u{0625}' => ('\u{FEF9}', '\u{FEFA}'),
        '\u{0627}' => ('\u{FEFB}', '\u{FEFC}'),
        _ => return None,
    };
    Some(if connects_prev { forms.1 } else { forms.0 })
}

// Contextual form substitution over the logical-order string. Letters
// without a table entry pass through untouched and break joining on both
// sides, so unsupported scripts degrade to their input.
fn reshape_arabic(text: &str) -> String {
    let letters: Vec<char> = text.chars().filter(|&ch| !is_harakat(ch)).collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < letters.len() {
        let ch = letters[i];
        let Some(&(_, kind, isolated, final_form, initial, medial)) = forms_entry(ch) else {
            out.push(ch);
            i += 1;
            continue;
        };

        let connects_prev = kind != Isolated
            && i > 0
            && forms_entry(letters[i - 1]).is_some_and(|prev| prev.1 == Dual);

        if ch == LAM && i + 1 < letters.len() {
            if let Some(ligature) = lam_alef_ligature(letters[i + 1], connects_prev) {
                out.push(ligature);
                i += 2;
                continue;
            }
        }

        let connects_next = kind == Dual
            && i + 1 < letters.len()
            && forms_entry(letters[i + 1]).is_some_and(|next| next.1 != Isolated);

        out.push(match (connects_prev, connects_next) {
            (false, false) => isolated,
            (true, false) => final_form,
            (false, true) => initial,
            (true, true) => medial,
        });
        i += 1;
    }
    out
}

// Paired punctuation swaps with its counterpart inside reversed runs so an
// opening bracket stays visually open on the left.
fn mirrored(ch: char) -> char {
    match ch {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '\u{00AB}' => '\u{00BB}',
        '\u{00BB}' => '\u{00AB}',
        _ => ch,
    }
}

// Logical to visual order: RTL runs come out reversed and mirrored so the
// downstream glyph placement can run strictly left to right.
fn reorder_visual(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let bidi = BidiInfo::new(text, None);
    let mut out = String::with_capacity(text.len());
    for paragraph in &bidi.paragraphs {
        let (levels, runs) = bidi.visual_runs(paragraph, paragraph.range.clone());
        for run in runs {
            let rtl = levels.get(run.start).is_some_and(|level| level.is_rtl());
            if rtl {
                out.extend(text[run].chars().rev().map(mirrored));
            } else {
                out.push_str(&text[run]);
            }
        }
    }
    out
}
