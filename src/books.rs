//! The 66-book Bible canon.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Testament {
    Old,
    New,
}

impl Testament {
    /// Catalog subject of the origin-language Bible for this testament.
    pub fn origin_subject(self) -> &'static str {
        match self {
            Testament::Old => "Hebrew Old Testament",
            Testament::New => "Greek New Testament",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BookInfo {
    /// Lowercase book id (`gen`, `1sa`, `tit`).
    pub id: &'static str,
    pub name: &'static str,
    pub testament: Testament,
    /// Number used in USFM file names (`01-GEN.usfm`, `41-MAT.usfm`).
    pub usfm_number: u32,
}

impl BookInfo {
    /// Conventional USFM file name, `57-TIT.usfm`.
    pub fn usfm_file_name(&self) -> String {
        format!("{:02}-{}.usfm", self.usfm_number, self.id.to_uppercase())
    }
}

macro_rules! books {
    ($($id:literal $name:literal $testament:ident $num:literal),* $(,)?) => {
        &[$(BookInfo { id: $id, name: $name, testament: Testament::$testament, usfm_number: $num }),*]
    };
}

pub static BOOKS: &[BookInfo] = books![
    "gen" "Genesis" Old 1,
    "exo" "Exodus" Old 2,
    "lev" "Leviticus" Old 3,
    "num" "Numbers" Old 4,
    "deu" "Deuteronomy" Old 5,
    "jos" "Joshua" Old 6,
    "jdg" "Judges" Old 7,
    "rut" "Ruth" Old 8,
    "1sa" "1 Samuel" Old 9,
    "2sa" "2 Samuel" Old 10,
    "1ki" "1 Kings" Old 11,
    "2ki" "2 Kings" Old 12,
    "1ch" "1 Chronicles" Old 13,
    "2ch" "2 Chronicles" Old 14,
    "ezr" "Ezra" Old 15,
    "neh" "Nehemiah" Old 16,
    "est" "Esther" Old 17,
    "job" "Job" Old 18,
    "psa" "Psalms" Old 19,
    "pro" "Proverbs" Old 20,
    "ecc" "Ecclesiastes" Old 21,
    "sng" "Song of Songs" Old 22,
    "isa" "Isaiah" Old 23,
    "jer" "Jeremiah" Old 24,
    "lam" "Lamentations" Old 25,
    "ezk" "Ezekiel" Old 26,
    "dan" "Daniel" Old 27,
    "hos" "Hosea" Old 28,
    "jol" "Joel" Old 29,
    "amo" "Amos" Old 30,
    "oba" "Obadiah" Old 31,
    "jon" "Jonah" Old 32,
    "mic" "Micah" Old 33,
    "nam" "Nahum" Old 34,
    "hab" "Habakkuk" Old 35,
    "zep" "Zephaniah" Old 36,
    "hag" "Haggai" Old 37,
    "zec" "Zechariah" Old 38,
    "mal" "Malachi" Old 39,
    "mat" "Matthew" New 41,
    "mrk" "Mark" New 42,
    "luk" "Luke" New 43,
    "jhn" "John" New 44,
    "act" "Acts" New 45,
    "rom" "Romans" New 46,
    "1co" "1 Corinthians" New 47,
    "2co" "2 Corinthians" New 48,
    "gal" "Galatians" New 49,
    "eph" "Ephesians" New 50,
    "php" "Philippians" New 51,
    "col" "Colossians" New 52,
    "1th" "1 Thessalonians" New 53,
    "2th" "2 Thessalonians" New 54,
    "1ti" "1 Timothy" New 55,
    "2ti" "2 Timothy" New 56,
    "tit" "Titus" New 57,
    "phm" "Philemon" New 58,
    "heb" "Hebrews" New 59,
    "jas" "James" New 60,
    "1pe" "1 Peter" New 61,
    "2pe" "2 Peter" New 62,
    "1jn" "1 John" New 63,
    "2jn" "2 John" New 64,
    "3jn" "3 John" New 65,
    "jud" "Jude" New 66,
    "rev" "Revelation" New 67,
];

/// Look up a book by id, case-insensitively.
pub fn book(id: &str) -> Option<&'static BookInfo> {
    let id = id.trim().to_ascii_lowercase();
    BOOKS.iter().find(|b| b.id == id)
}

pub fn is_book(id: &str) -> bool {
    book(id).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canon() {
        assert_eq!(BOOKS.len(), 66);
        assert_eq!(BOOKS.iter().filter(|b| b.testament == Testament::Old).count(), 39);
    }

    #[test]
    fn test_lookup() {
        let tit = book("TIT").unwrap();
        assert_eq!(tit.name, "Titus");
        assert_eq!(tit.usfm_file_name(), "57-TIT.usfm");
        assert_eq!(book("gen").unwrap().testament.origin_subject(), "Hebrew Old Testament");
        assert!(book("obs").is_none());
        assert!(!is_book("front"));
    }
}
