use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref BRACKETED: Regex = Regex::new(r"\[.*?\]").expect("valid regex");
    static ref URLS: Regex = Regex::new(r"https?://\S+|www\.\S+").expect("valid regex");
    static ref HTML_TAGS: Regex = Regex::new(r"<.*?>+").expect("valid regex");
    static ref WORDS_WITH_DIGITS: Regex = Regex::new(r"\w*\d\w*").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = ENGLISH_STOPWORDS.iter().copied().collect();
}

const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "youre", "youve",
    "youll", "youd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "shes", "her", "hers", "herself", "it", "its", "itself", "they", "them", "their",
    "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "thatll", "these",
    "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "dont", "should", "shouldve", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "arent", "couldn", "couldnt", "didn",
    "didnt", "doesn", "doesnt", "hadn", "hadnt", "hasn", "hasnt", "haven", "havent", "isn",
    "isnt", "ma", "mightn", "mightnt", "mustn", "mustnt", "needn", "neednt", "shan", "shant",
    "shouldn", "shouldnt", "wasn", "wasnt", "weren", "werent", "won", "wont", "wouldn", "wouldnt",
];

/// Clean article text before TF-IDF vectorization.
///
/// Lowercases, strips bracketed spans, URLs, HTML tags, punctuation and any
/// word containing a digit, drops English stopwords and stems what remains.
pub fn clean_text(text: &str) -> String {
    let lowered = text.nfkd().collect::<String>().to_lowercase();

    let without_brackets = BRACKETED.replace_all(&lowered, "");
    let without_urls = URLS.replace_all(&without_brackets, "");
    let without_tags = HTML_TAGS.replace_all(&without_urls, "");
    let without_punctuation: String = without_tags
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    let without_digits = WORDS_WITH_DIGITS.replace_all(&without_punctuation, "");

    let stemmer = Stemmer::create(Algorithm::English);
    without_digits
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .map(|word| stemmer.stem(word).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_noise() {
        assert_eq!(
            clean_text("Read [more] at https://example.com <b>now</b>!"),
            "read"
        );
    }

    #[test]
    fn test_drops_digit_words_and_stopwords() {
        assert_eq!(clean_text("The 2019 season was a covid19 mess"), "season mess");
    }

    #[test]
    fn test_stems_remaining_words() {
        assert_eq!(clean_text("Running elections"), "run elect");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   \n "), "");
    }
}
