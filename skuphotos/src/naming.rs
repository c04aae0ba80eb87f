//! Sequential photo names derived from a folder's current listing.
//!
//! No counter is persisted: the next number is `max(observed suffixes) + 1`,
//! recomputed on every call. Two captures that list the folder before either
//! upload lands will compute the same name; the store accepts duplicate names,
//! so both photos are kept under that name.

use drive_core::FileQuery;

use crate::error::EngineError;
use crate::store::RemoteStore;

const PHOTO_EXTENSION: &str = ".jpg";
const SUFFIX_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameSeparator {
    #[default]
    None,
    Underscore,
}

impl NameSeparator {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Some(NameSeparator::None),
            "underscore" | "_" => Some(NameSeparator::Underscore),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            NameSeparator::None => "",
            NameSeparator::Underscore => "_",
        }
    }
}

pub fn format_name(base: &str, separator: NameSeparator, number: u64) -> String {
    format!(
        "{base}{}{number:0width$}{PHOTO_EXTENSION}",
        separator.as_str(),
        width = SUFFIX_WIDTH
    )
}

/// Numeric suffix carried by `name`, if it was named under `base`.
///
/// Names that do not start with `base` are ignored, so photos still named
/// after a folder's previous name cannot leak that name's digits.
pub fn suffix_number(name: &str, base: &str, separator: NameSeparator) -> Option<u64> {
    let residue = name.strip_prefix(base)?;
    let residue = match separator {
        NameSeparator::Underscore => residue.strip_prefix('_').unwrap_or(residue),
        NameSeparator::None => residue,
    };
    let digits: String = residue.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().ok()
}

/// `name` moved from `old_base` to `new_base`, keeping its suffix.
/// `None` when `name` is not a sequential photo name under `old_base`.
pub fn rebased_name(
    name: &str,
    old_base: &str,
    new_base: &str,
    separator: NameSeparator,
) -> Option<String> {
    suffix_number(name, old_base, separator)?;
    let rest = name.strip_prefix(old_base)?;
    Some(format!("{new_base}{rest}"))
}

pub fn next_name_from<'a, I>(names: I, base: &str, separator: NameSeparator) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let highest = names
        .into_iter()
        .filter_map(|name| suffix_number(name, base, separator))
        .max()
        .unwrap_or(0);
    format_name(base, separator, highest.saturating_add(1))
}

pub async fn next_name(
    store: &dyn RemoteStore,
    folder_id: &str,
    base: &str,
    separator: NameSeparator,
) -> Result<String, EngineError> {
    let entries = store.list(&FileQuery::children_of(folder_id)).await?;
    let name = next_name_from(entries.iter().map(|e| e.name.as_str()), base, separator);
    tracing::debug!(folder_id, base, %name, existing = entries.len(), "computed next photo name");
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_folder_starts_at_one() {
        assert_eq!(
            next_name_from(Vec::<&str>::new(), "X", NameSeparator::None),
            "X0001.jpg"
        );
    }

    #[test]
    fn uses_max_not_count() {
        let names = ["X0001.jpg", "X0003.jpg"];
        assert_eq!(
            next_name_from(names, "X", NameSeparator::None),
            "X0004.jpg"
        );
    }

    #[test]
    fn non_numeric_entries_are_ignored() {
        let names = ["X0002.jpg", "X-notes.txt"];
        assert_eq!(
            next_name_from(names, "X", NameSeparator::None),
            "X0003.jpg"
        );
        assert_eq!(suffix_number("X-notes.txt", "X", NameSeparator::None), None);
    }

    #[test]
    fn digits_in_base_are_stripped_first() {
        let names = ["SKU-120007.jpg"];
        assert_eq!(
            next_name_from(names, "SKU-12", NameSeparator::None),
            "SKU-120008.jpg"
        );
    }

    #[test]
    fn names_under_another_base_are_ignored() {
        let names = ["SKU-120001.jpg", "IMG_4471.jpg"];
        assert_eq!(
            next_name_from(names, "SKU-13", NameSeparator::None),
            "SKU-130001.jpg"
        );
        assert_eq!(suffix_number("IMG_4471.jpg", "SKU-13", NameSeparator::None), None);
    }

    #[test]
    fn rebasing_keeps_suffix_and_extension() {
        assert_eq!(
            rebased_name("SKU-120002.png", "SKU-12", "SKU-13", NameSeparator::None).as_deref(),
            Some("SKU-130002.png")
        );
        assert_eq!(
            rebased_name("SKU_0003.jpg", "SKU", "ITEM", NameSeparator::Underscore).as_deref(),
            Some("ITEM_0003.jpg")
        );
        assert_eq!(
            rebased_name("SKU-12-notes.txt", "SKU-12", "SKU-13", NameSeparator::None),
            None
        );
        assert_eq!(
            rebased_name("cover.jpg", "SKU-12", "SKU-13", NameSeparator::None),
            None
        );
    }

    #[test]
    fn underscore_separator_round_trips() {
        let names = ["SKU_0009.jpg", "SKU_0002.jpg"];
        assert_eq!(
            next_name_from(names, "SKU", NameSeparator::Underscore),
            "SKU_0010.jpg"
        );
    }

    #[test]
    fn wide_numbers_are_not_truncated() {
        assert_eq!(
            next_name_from(["X9999.jpg"], "X", NameSeparator::None),
            "X10000.jpg"
        );
    }

    #[test]
    fn overflowing_residue_is_ignored() {
        let huge = format!("X{}.jpg", "9".repeat(40));
        assert_eq!(
            next_name_from([huge.as_str(), "X0005.jpg"], "X", NameSeparator::None),
            "X0006.jpg"
        );
    }

    #[test]
    fn separator_parsing() {
        assert_eq!(NameSeparator::parse("Underscore"), Some(NameSeparator::Underscore));
        assert_eq!(NameSeparator::parse("none"), Some(NameSeparator::None));
        assert_eq!(NameSeparator::parse("dash"), None);
    }
}
