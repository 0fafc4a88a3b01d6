use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DIGIT_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").unwrap());

static BC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bBC\b").unwrap());

static BORN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bborn\b").unwrap());

static DIED_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdied\b").unwrap());

/// Categories naming a span rather than a year, or non-human subjects.
const EXCLUDED_TERMS: [&str; 3] = ["century", "millennium", "animal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearKind {
    Birth,
    Death,
}

impl YearKind {
    /// Substring marking a category as a birth or death category.
    pub fn token(self) -> &'static str {
        match self {
            YearKind::Birth => "births",
            YearKind::Death => "deaths",
        }
    }

    /// Matches a category containing the token, or the verb as a whole word
    /// (`People born in 10 BC`).
    pub fn matches(self, category: &str) -> bool {
        let verb = match self {
            YearKind::Birth => &BORN_REGEX,
            YearKind::Death => &DIED_REGEX,
        };
        category.contains(self.token()) || verb.is_match(category)
    }
}

/// Reads a birth or death year out of a category such as `1815 births`.
///
/// The category must match the kind (see [`YearKind::matches`]) and hold
/// exactly one number.
/// A whole-word `BC` makes the year negative.
pub fn year_from_category(category: &str, kind: YearKind) -> Option<i32> {
    if !kind.matches(category) {
        return None;
    }
    if EXCLUDED_TERMS.iter().any(|term| category.contains(term)) {
        return None;
    }

    let mut runs = DIGIT_RUN_REGEX.find_iter(category);
    let year: i32 = runs.next()?.as_str().parse().ok()?;
    if runs.next().is_some() {
        return None;
    }

    if BC_REGEX.is_match(category) {
        Some(-year)
    } else {
        Some(year)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifespan {
    pub birth: Option<i32>,
    pub death: Option<i32>,
}

impl Lifespan {
    /// First birth year and first death year found among `categories`.
    pub fn from_categories<'a, I>(categories: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lifespan = Lifespan::default();
        for category in categories {
            if lifespan.birth.is_none() {
                lifespan.birth = year_from_category(category, YearKind::Birth);
            }
            if lifespan.death.is_none() {
                lifespan.death = year_from_category(category, YearKind::Death);
            }
            if lifespan.birth.is_some() && lifespan.death.is_some() {
                break;
            }
        }
        lifespan
    }

    pub fn is_known(&self) -> bool {
        self.birth.is_some() || self.death.is_some()
    }

    pub fn age(&self) -> Option<i32> {
        Some(self.death? - self.birth?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_birth_year() {
        assert_eq!(year_from_category("1815 births", YearKind::Birth), Some(1815));
    }

    #[test]
    fn plain_death_year() {
        assert_eq!(year_from_category("1990 deaths", YearKind::Death), Some(1990));
    }

    #[test]
    fn bc_year_negated() {
        assert_eq!(year_from_category("People born in 10 BC", YearKind::Birth), Some(-10));
        assert_eq!(year_from_category("10 BC births", YearKind::Birth), Some(-10));
        assert_eq!(year_from_category("399 BC deaths", YearKind::Death), Some(-399));
    }

    #[test]
    fn bc_must_be_whole_word() {
        assert_eq!(year_from_category("BCE 5 births", YearKind::Birth), Some(5));
        assert_eq!(year_from_category("5 bc births", YearKind::Birth), Some(5));
    }

    #[test]
    fn born_and_died_phrasing() {
        assert_eq!(year_from_category("People born in 1815", YearKind::Birth), Some(1815));
        assert_eq!(year_from_category("People who died in 1852", YearKind::Death), Some(1852));
    }

    #[test]
    fn verbs_must_be_whole_words() {
        assert_eq!(year_from_category("Airborne units formed in 1944", YearKind::Birth), None);
        assert_eq!(year_from_category("People who studied in 1990", YearKind::Death), None);
        assert_eq!(year_from_category("Stubborn 1990", YearKind::Birth), None);
    }

    #[test]
    fn wrong_token_rejected() {
        assert_eq!(year_from_category("1990 deaths", YearKind::Birth), None);
        assert_eq!(year_from_category("1815 births", YearKind::Death), None);
        assert_eq!(year_from_category("Mathematicians", YearKind::Birth), None);
    }

    #[test]
    fn century_rejected() {
        assert_eq!(year_from_category("19th-century births", YearKind::Birth), None);
        assert_eq!(year_from_category("1st millennium BC deaths", YearKind::Death), None);
    }

    #[test]
    fn animal_rejected() {
        assert_eq!(year_from_category("1990 animal births", YearKind::Birth), None);
    }

    #[test]
    fn several_numbers_rejected() {
        assert_eq!(year_from_category("1990s births 1991", YearKind::Birth), None);
        assert_eq!(year_from_category("births", YearKind::Birth), None);
    }

    #[test]
    fn oversized_number_rejected() {
        assert_eq!(year_from_category("99999999999 births", YearKind::Birth), None);
    }

    #[test]
    fn lifespan_keeps_first_match() {
        let lifespan = Lifespan::from_categories([
            "English mathematicians",
            "1815 births",
            "1852 deaths",
            "1900 births",
        ]);
        assert_eq!(lifespan.birth, Some(1815));
        assert_eq!(lifespan.death, Some(1852));
        assert_eq!(lifespan.age(), Some(37));
    }

    #[test]
    fn lifespan_partial() {
        let lifespan = Lifespan::from_categories(["1950 births", "Living people"]);
        assert_eq!(lifespan.birth, Some(1950));
        assert_eq!(lifespan.death, None);
        assert_eq!(lifespan.age(), None);
        assert!(lifespan.is_known());
    }

    #[test]
    fn lifespan_across_era() {
        let lifespan = Lifespan::from_categories(["63 BC births", "14 deaths"]);
        assert_eq!(lifespan.age(), Some(77));
    }

    #[test]
    fn lifespan_unknown() {
        let lifespan = Lifespan::from_categories(["Physics"]);
        assert!(!lifespan.is_known());
    }
}
