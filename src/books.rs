//! Book ids and their USFM abbreviations.

/// Lookup of the book ids a run may use.
pub trait BookRegistry: Sync {
    /// `true` if `book` is a known book id.
    fn contains(&self, book: &str) -> bool;
    /// The USFM abbreviation for a book id (e.g. `CO1` → `1CO`).
    fn usfm_abbreviation(&self, book: &str) -> Option<&str>;
    /// Every known book id in canonical order.
    fn books(&self) -> Vec<&str>;
}

/// The 66 books of the Protestant canon, as `(book id, USFM abbreviation)`.
#[rustfmt::skip]
const STANDARD_BOOKS: &[(&str, &str)] = &[
    ("GEN", "GEN"), ("EXO", "EXO"), ("LEV", "LEV"), ("NUM", "NUM"), ("DEU", "DEU"),
    ("JOS", "JOS"), ("JDG", "JDG"), ("RUT", "RUT"), ("SA1", "1SA"), ("SA2", "2SA"),
    ("KI1", "1KI"), ("KI2", "2KI"), ("CH1", "1CH"), ("CH2", "2CH"), ("EZR", "EZR"),
    ("NEH", "NEH"), ("EST", "EST"), ("JOB", "JOB"), ("PSA", "PSA"), ("PRO", "PRO"),
    ("ECC", "ECC"), ("SNG", "SNG"), ("ISA", "ISA"), ("JER", "JER"), ("LAM", "LAM"),
    ("EZE", "EZK"), ("DAN", "DAN"), ("HOS", "HOS"), ("JOL", "JOL"), ("AMO", "AMO"),
    ("OBA", "OBA"), ("JNA", "JON"), ("MIC", "MIC"), ("NAH", "NAM"), ("HAB", "HAB"),
    ("ZEP", "ZEP"), ("HAG", "HAG"), ("ZEC", "ZEC"), ("MAL", "MAL"),
    ("MAT", "MAT"), ("MRK", "MRK"), ("LUK", "LUK"), ("JHN", "JHN"), ("ACT", "ACT"),
    ("ROM", "ROM"), ("CO1", "1CO"), ("CO2", "2CO"), ("GAL", "GAL"), ("EPH", "EPH"),
    ("PHP", "PHP"), ("COL", "COL"), ("TH1", "1TH"), ("TH2", "2TH"), ("TI1", "1TI"),
    ("TI2", "2TI"), ("TIT", "TIT"), ("PHM", "PHM"), ("HEB", "HEB"), ("JAM", "JAS"),
    ("PE1", "1PE"), ("PE2", "2PE"), ("JN1", "1JN"), ("JN2", "2JN"), ("JN3", "3JN"),
    ("JDE", "JUD"), ("REV", "REV"),
];

/// The built-in registry of the 66 canonical books.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBooks;

impl BookRegistry for StandardBooks {
    fn contains(&self, book: &str) -> bool {
        STANDARD_BOOKS.iter().any(|(id, _)| *id == book)
    }

    fn usfm_abbreviation(&self, book: &str) -> Option<&str> {
        STANDARD_BOOKS
            .iter()
            .find(|(id, _)| *id == book)
            .map(|(_, usfm)| *usfm)
    }

    fn books(&self) -> Vec<&str> {
        STANDARD_BOOKS.iter().map(|(id, _)| *id).collect()
    }
}

/// Expands a filename template: `BBB` becomes the book id and `UUU` its
/// uppercase USFM abbreviation (empty if the registry has none).
pub fn expand_template(template: &str, book: &str, registry: &dyn BookRegistry) -> String {
    let usfm = registry.usfm_abbreviation(book).unwrap_or_default().to_uppercase();
    template.replace("BBB", book).replace("UUU", &usfm)
}
