use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

// Characters a URI component keeps verbatim: ASCII alphanumerics plus
// - _ . ! ~ * ' ( ). Everything else becomes %XX, non-ASCII as UTF-8 bytes.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

// Wiki article titles keep connector words lowercase. Applied to the
// underscored form, in this order.
const WIKI_CONNECTORS: [(&str, &str); 2] = [("_The_", "_the_"), ("_Of_", "_of_")];
// Same normalization for the display name, on the spaced form.
const DISPLAY_CONNECTORS: [(&str, &str); 2] = [(" The ", " the "), (" Of ", " of ")];

/// The three spellings derived from one boss name as it appears in the data
/// feed: the wiki article link target, the thumbnail file stem, and the name
/// shown to the reader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BossSlugs {
    /// Percent-encoded wiki path segment, e.g. `Midnight_Panther`.
    pub wiki: String,
    /// Image file stem, e.g. `midnight-panther`.
    pub image: String,
    /// Reader-facing name, e.g. `Lady of the Lake`.
    pub display: String,
}

pub fn derive(name: &str) -> BossSlugs {
    // The upstream feed ships some creature names all-lowercase
    // ("midnight panther") while the wiki titles them in Title Case.
    let cased = if starts_lowercase(name) { title_case_words(name) } else { name.to_string() };
    let underscored = apply_rules(&cased.replace(' ', "_"), &WIKI_CONNECTORS);
    let wiki = utf8_percent_encode(&underscored, URI_COMPONENT).to_string();
    // Stems land inside a double-quoted src attribute, so quotes are dropped
    // along with the apostrophes and periods.
    let image = underscored.to_lowercase().replace('_', "-").replace('\'', "").replace('.', "").replace('"', "");
    let display = apply_rules(name, &DISPLAY_CONNECTORS);
    BossSlugs { wiki, image, display }
}

fn apply_rules(s: &str, rules: &[(&str, &str)]) -> String {
    rules.iter().fold(s.to_string(), |acc, (from, to)| acc.replace(from, to))
}

fn starts_lowercase(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_lowercase)
}

/// Uppercase the first letter of each word. A letter starts a word when it
/// begins the string or follows a non-alphanumeric character.
pub fn title_case_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if word_start && c.is_lowercase() { out.extend(c.to_uppercase()); } else { out.push(c); }
        word_start = !c.is_alphanumeric();
    }
    out
}
