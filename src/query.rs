/// Phrases every result should match.
const POSITIVE_TERMS: [&str; 3] = ["travel blog", "photography", "high resolution"];

/// Stock photo sources and non-photographic assets.
const NEGATIVE_TERMS: [&str; 10] = [
    "stock",
    "alamy",
    "shutterstock",
    "gettyimages",
    "depositphotos",
    "dreamstime",
    "123rf",
    "istock",
    "vector",
    "clipart",
];

/// Builds the refined search keyword for an attraction, e.g.
/// `Zion +"travel blog" +"photography" +"high resolution" -stock ... -clipart`.
pub fn search_query(interest: &str) -> String {
    let positive = POSITIVE_TERMS
        .iter()
        .map(|term| format!("+\"{term}\""))
        .collect::<Vec<_>>()
        .join(" ");
    let negative = NEGATIVE_TERMS
        .iter()
        .map(|term| format!("-{term}"))
        .collect::<Vec<_>>()
        .join(" ");

    format!("{} {positive} {negative}", interest.trim())
}
