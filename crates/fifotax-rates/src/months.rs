//! Header normalization for month-column tables.

/// Fold a header cell to lowercase ASCII.
///
/// Turkish letters map to their base letter so `ŞUBAT`, `Şubat` and `subat`
/// compare equal. A leading byte-order mark is dropped.
pub fn fold(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .chars()
        .map(|c| match c {
            'Ş' | 'ş' => 's',
            'Ğ' | 'ğ' => 'g',
            'Ü' | 'ü' => 'u',
            'Ö' | 'ö' => 'o',
            'Ç' | 'ç' => 'c',
            'İ' | 'ı' | 'I' => 'i',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

/// Month number for a folded header, Turkish or English.
pub fn month_number(folded: &str) -> Option<u32> {
    let n = match folded {
        "ocak" | "jan" | "january" => 1,
        "subat" | "feb" | "february" => 2,
        "mart" | "mar" | "march" => 3,
        "nisan" | "apr" | "april" => 4,
        "mayis" | "may" => 5,
        "haziran" | "jun" | "june" => 6,
        "temmuz" | "jul" | "july" => 7,
        "agustos" | "aug" | "august" => 8,
        "eylul" | "sep" | "september" => 9,
        "ekim" | "oct" | "october" => 10,
        "kasim" | "nov" | "november" => 11,
        "aralik" | "dec" | "december" => 12,
        _ => return None,
    };
    Some(n)
}
